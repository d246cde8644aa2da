use std::ops::Range;

use crate::ast::Element;
use crate::dialect::DialectKind;
use crate::parse::Operator;

/// Split elements into simple commands: runs between control operators,
/// newlines and comments.
pub fn split(elements: &[Element]) -> Vec<Range<usize>> {
    let mut commands = Vec::new();
    let mut start = 0;
    for (i, element) in elements.iter().enumerate() {
        let ends = match element {
            Element::Operator(op) => op.separates_commands(),
            Element::Newline | Element::Comment(_) => true,
            _ => false,
        };
        if ends {
            if i > start {
                commands.push(start..i);
            }
            start = i + 1;
        }
    }
    if elements.len() > start {
        commands.push(start..elements.len());
    }
    commands
}

/// The words of one simple command, as seen by launcher detection.
#[derive(Debug, Default)]
pub struct CommandWords {
    /// Element index of each word.
    pub indices: Vec<usize>,
    /// Static text of each word, `None` where it holds expansions.
    pub texts: Vec<Option<String>>,
}

impl CommandWords {
    /// Collect the argument words of the command spanning `range`, skipping
    /// leading `NAME=value` assignments and redirection targets.
    pub fn collect(elements: &[Element], range: Range<usize>, dialect: DialectKind) -> Self {
        let assignments = matches!(
            dialect,
            DialectKind::Bash | DialectKind::Zsh | DialectKind::Fish
        );
        let mut words = Self::default();
        let mut redirect_target = false;
        for index in range {
            match &elements[index] {
                Element::Operator(Operator::Redirect(_)) => redirect_target = true,
                Element::Word(word) => {
                    if redirect_target {
                        redirect_target = false;
                        continue;
                    }
                    if assignments && words.indices.is_empty() && word.is_assignment() {
                        continue;
                    }
                    words.indices.push(index);
                    words.texts.push(word.static_text());
                }
                _ => {}
            }
        }
        words
    }
}
