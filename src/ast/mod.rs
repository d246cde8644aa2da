//! Command AST: token streams grouped into an invocation tree, with nested
//! command strings parsed under their launcher's dialect.

pub mod builder;
pub mod capture;
pub mod command;

pub use builder::Builder;

use serde::Serialize;

use crate::dialect::DialectKind;
use crate::parse::{Heredoc, Operator, Segment, Substitution, Token, VarRef, Word};

/// A command string parsed under one dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub dialect: DialectKind,
    pub elements: Vec<Element>,
    /// Whether whitespace preceded each element in the source. Missing
    /// entries count as spaced.
    pub spaced: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Element {
    Word(Word),
    /// A launcher argument holding a nested command string.
    Nested(NestedInvocation),
    Operator(Operator),
    Heredoc(Heredoc),
    Comment(String),
    Newline,
}

/// The parsed form of a launcher's command argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedInvocation {
    /// Launcher form, e.g. `bash -c` or `ssh`.
    pub launcher: String,
    /// Dialect the nested command is written in.
    pub dialect: DialectKind,
    pub invocation: Box<Invocation>,
    /// Outer variable references and substitutions found inside the
    /// argument. The nested text holds a sentinel for each one, see
    /// [`capture`].
    pub captures: Vec<Segment>,
}

impl From<Token> for Element {
    fn from(token: Token) -> Self {
        match token {
            Token::Word(word) => Element::Word(word),
            Token::Operator(op) => Element::Operator(op),
            Token::Heredoc(heredoc) => Element::Heredoc(heredoc),
            Token::Comment(text) => Element::Comment(text),
            Token::Newline => Element::Newline,
        }
    }
}

impl Invocation {
    /// True when element `index` was separated from the one before it.
    pub fn is_spaced(&self, index: usize) -> bool {
        self.spaced.get(index).copied().unwrap_or(true)
    }

    /// Number of launcher boundaries below this invocation, along its
    /// deepest path.
    pub fn depth(&self) -> usize {
        self.nested()
            .map(|n| 1 + n.invocation.depth())
            .max()
            .unwrap_or(0)
    }

    /// Nested invocations directly below this one.
    pub fn nested(&self) -> impl Iterator<Item = &NestedInvocation> {
        self.elements.iter().filter_map(|e| match e {
            Element::Nested(n) => Some(n),
            _ => None,
        })
    }

    /// Structure of the invocation with quoting cosmetics folded away.
    ///
    /// Two invocations with equal shapes hold the same words, expansions,
    /// operators, nesting and adjacency; they may differ in which quote
    /// style or escapes spell a piece of text.
    pub fn shape(&self) -> Vec<Shape> {
        let dialect = self.dialect.dialect();
        let mut out = Vec::with_capacity(self.elements.len());
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 && !self.is_spaced(i) {
                out.push(Shape::Joined);
            }
            out.push(match element {
                Element::Word(word) => Shape::Word(pieces(&word.segments, false, |c| {
                    dialect.is_pattern_char(c)
                })),
                Element::Nested(nested) => Shape::Nested {
                    launcher: nested.launcher.clone(),
                    dialect: nested.dialect,
                    captures: nested.captures.len(),
                    inner: nested.invocation.shape(),
                },
                Element::Operator(op) => Shape::Operator(op.as_str().to_string()),
                Element::Heredoc(heredoc) => Shape::Heredoc {
                    quoted: heredoc.quoted,
                    body: pieces(std::slice::from_ref(&heredoc.body), false, |_| false),
                },
                Element::Comment(text) => Shape::Comment(text.trim().to_string()),
                Element::Newline => Shape::Newline,
            });
        }
        out
    }
}

/// Normalized element, see [`Invocation::shape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Word(Vec<Piece>),
    Nested {
        launcher: String,
        dialect: DialectKind,
        captures: usize,
        inner: Vec<Shape>,
    },
    Operator(String),
    Heredoc {
        quoted: bool,
        body: Vec<Piece>,
    },
    Comment(String),
    Newline,
    /// The next element follows the previous one with no whitespace.
    Joined,
}

/// Normalized part of a word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// Text that means only itself, however it was quoted or escaped.
    Text(String),
    /// Unquoted characters that keep a pattern meaning.
    Pattern(String),
    Var { var: VarRef, quoted: bool },
    Subst { subst: Substitution, quoted: bool },
}

fn push_piece(out: &mut Vec<Piece>, piece: Piece) {
    match (out.last_mut(), piece) {
        (Some(Piece::Text(last)), Piece::Text(text)) => last.push_str(&text),
        (Some(Piece::Pattern(last)), Piece::Pattern(text)) => last.push_str(&text),
        (_, piece) => out.push(piece),
    }
}

fn pieces(
    segments: &[Segment],
    quoted: bool,
    is_pattern: impl Fn(char) -> bool + Copy,
) -> Vec<Piece> {
    let mut out = Vec::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => push_piece(&mut out, Piece::Text(text.clone())),
            Segment::EscapeSequence(c) => push_piece(&mut out, Piece::Text(c.to_string())),
            Segment::RawUnquoted(text) => {
                for c in text.chars() {
                    let piece = if !quoted && is_pattern(c) {
                        Piece::Pattern(c.to_string())
                    } else {
                        Piece::Text(c.to_string())
                    };
                    push_piece(&mut out, piece);
                }
            }
            Segment::Expandable(parts) => {
                for piece in pieces(parts, true, is_pattern) {
                    push_piece(&mut out, piece);
                }
            }
            Segment::VariableRef(var) => push_piece(
                &mut out,
                Piece::Var {
                    var: var.clone(),
                    quoted,
                },
            ),
            Segment::Substitution(subst) => push_piece(
                &mut out,
                Piece::Subst {
                    subst: subst.clone(),
                    quoted,
                },
            ),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::VarKind;

    fn word(segments: Vec<Segment>) -> Element {
        Element::Word(Word {
            segments,
            offset: 0,
        })
    }

    #[test]
    fn shape_folds_quote_styles() {
        let single = Invocation {
            dialect: DialectKind::Bash,
            elements: vec![word(vec![Segment::Literal("a b".into())])],
            spaced: vec![],
        };
        let escaped = Invocation {
            dialect: DialectKind::Bash,
            elements: vec![word(vec![
                Segment::RawUnquoted("a".into()),
                Segment::EscapeSequence(' '),
                Segment::Expandable(vec![Segment::RawUnquoted("b".into())]),
            ])],
            spaced: vec![],
        };
        assert_eq!(single.shape(), escaped.shape());
    }

    #[test]
    fn shape_keeps_globs_and_quoting_of_variables() {
        let glob = Invocation {
            dialect: DialectKind::Bash,
            elements: vec![word(vec![Segment::RawUnquoted("*.rs".into())])],
            spaced: vec![],
        };
        let quoted = Invocation {
            dialect: DialectKind::Bash,
            elements: vec![word(vec![Segment::Literal("*.rs".into())])],
            spaced: vec![],
        };
        assert_ne!(glob.shape(), quoted.shape());

        let var = VarRef::new(VarKind::Named("x".into()));
        let bare = Invocation {
            dialect: DialectKind::Bash,
            elements: vec![word(vec![Segment::VariableRef(var.clone())])],
            spaced: vec![],
        };
        let in_quotes = Invocation {
            dialect: DialectKind::Bash,
            elements: vec![word(vec![Segment::Expandable(vec![Segment::VariableRef(var)])])],
            spaced: vec![],
        };
        assert_ne!(bare.shape(), in_quotes.shape());
    }

    #[test]
    fn shape_keeps_adjacency() {
        let elements = vec![
            word(vec![Segment::RawUnquoted("a=".into())]),
            Element::Operator(Operator::Open('(')),
        ];
        let glued = Invocation {
            dialect: DialectKind::Bash,
            elements: elements.clone(),
            spaced: vec![true, false],
        };
        let apart = Invocation {
            dialect: DialectKind::Bash,
            elements,
            spaced: vec![],
        };
        assert_ne!(glued.shape(), apart.shape());
        assert!(apart.is_spaced(1));
        assert!(!glued.is_spaced(1));
    }

    #[test]
    fn depth_counts_launcher_boundaries() {
        let leaf = Invocation {
            dialect: DialectKind::Bash,
            elements: vec![],
            spaced: vec![],
        };
        let nested = |inner: Invocation| Invocation {
            dialect: DialectKind::Bash,
            elements: vec![Element::Nested(NestedInvocation {
                launcher: "bash -c".into(),
                dialect: DialectKind::Bash,
                invocation: Box::new(inner),
                captures: vec![],
            })],
            spaced: vec![],
        };
        assert_eq!(leaf.depth(), 0);
        assert_eq!(nested(nested(leaf)).depth(), 2);
    }
}
