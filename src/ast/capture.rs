//! Capture of outer expansions inside a nested command argument.
//!
//! `ssh host "tail $LOG"` expands `$LOG` on the local side before ssh runs.
//! The nested text is parsed with a private-use sentinel standing in for
//! each such expansion, so the inner tokenizer treats it as ordinary text,
//! and the emitter puts the outer expansion back when it re-wraps the
//! nested command.

use crate::dialect::Dialect;
use crate::parse::{Segment, Word};

pub const OPEN: char = '\u{E000}';
pub const CLOSE: char = '\u{E001}';

pub fn is_sentinel(c: char) -> bool {
    c == OPEN || c == CLOSE
}

pub fn sentinel(index: usize) -> String {
    format!("{OPEN}{index}{CLOSE}")
}

/// The nested command text carried by a launcher argument, with each
/// quoted outer expansion replaced by a sentinel.
///
/// Returns `None` when the argument cannot be read as one static string:
/// unquoted expansions, unquoted pattern characters, or text that already
/// contains sentinel characters.
pub fn argument_text(word: &Word, dialect: &Dialect) -> Option<(String, Vec<Segment>)> {
    let mut text = String::new();
    let mut captures = Vec::new();
    for segment in &word.segments {
        match segment {
            Segment::Literal(literal) => text.push_str(literal),
            Segment::EscapeSequence(c) => text.push(*c),
            Segment::RawUnquoted(raw) => {
                if raw.chars().any(|c| dialect.is_pattern_char(c)) {
                    return None;
                }
                text.push_str(raw);
            }
            Segment::Expandable(parts) => {
                for part in parts {
                    match part {
                        Segment::RawUnquoted(raw) => text.push_str(raw),
                        Segment::EscapeSequence(c) => text.push(*c),
                        Segment::VariableRef(_) | Segment::Substitution(_) => {
                            text.push_str(&sentinel(captures.len()));
                            captures.push(part.clone());
                        }
                        Segment::Literal(_) | Segment::Expandable(_) => return None,
                    }
                }
            }
            Segment::VariableRef(_) | Segment::Substitution(_) => return None,
        }
    }
    let sentinels = text.chars().filter(|&c| c == OPEN).count();
    if sentinels != captures.len() || text.chars().filter(|&c| c == CLOSE).count() != sentinels {
        return None;
    }
    Some((text, captures))
}

/// A run of emitted text, split at sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk<'a> {
    Text(&'a str),
    Capture(usize),
}

/// Split text at well-formed sentinels.
pub fn chunks(text: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find(OPEN) {
        let after = &rest[open + OPEN.len_utf8()..];
        let Some(close) = after.find(CLOSE) else {
            break;
        };
        let Ok(index) = after[..close].parse::<usize>() else {
            break;
        };
        if open > 0 {
            out.push(Chunk::Text(&rest[..open]));
        }
        out.push(Chunk::Capture(index));
        rest = &after[close + CLOSE.len_utf8()..];
    }
    if !rest.is_empty() {
        out.push(Chunk::Text(rest));
    }
    out
}
