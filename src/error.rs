//! Error taxonomy shared by the tokenizer, builder and emitter.

use serde::Serialize;
use thiserror::Error;

use crate::dialect::{ConstructKind, DialectKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("unknown dialect `{name}` (expected bash, zsh, fish, powershell or cmd)")]
    UnknownDialect { name: String },

    #[error("unterminated {delimiter} opened at byte offset {offset}")]
    UnterminatedQuote { offset: usize, delimiter: String },

    #[error("unterminated here-document `{delimiter}` opened at byte offset {offset}")]
    UnterminatedHeredoc { offset: usize, delimiter: String },

    /// A nested command string failed to parse under its launcher's dialect.
    /// Recorded as a diagnostic; the argument is kept as opaque text.
    #[error("nested command under {} could not be parsed: {inner}", .path.join(" > "))]
    NestedParse {
        path: Vec<String>,
        inner: Box<TranslationError>,
    },

    #[error("{construct} has no equivalent in {to} (parsed as {from})")]
    UnsupportedConstruct {
        construct: ConstructKind,
        from: DialectKind,
        to: DialectKind,
    },

    #[error("nesting depth {depth} exceeds the limit of {max_depth}")]
    NestingTooDeep { depth: usize, max_depth: usize },
}

impl TranslationError {
    /// Taxonomy name of the error.
    pub fn kind(&self) -> &'static str {
        match self {
            TranslationError::UnknownDialect { .. } => "UnknownDialectError",
            TranslationError::UnterminatedQuote { .. } => "UnterminatedQuoteError",
            TranslationError::UnterminatedHeredoc { .. } => "UnterminatedHeredocError",
            TranslationError::NestedParse { .. } => "NestedParseError",
            TranslationError::UnsupportedConstruct { .. } => "UnsupportedConstructError",
            TranslationError::NestingTooDeep { .. } => "NestingTooDeepError",
        }
    }

    /// Byte offset of the offending opener, when the error has one.
    ///
    /// For nested parse failures the offset is relative to the nested
    /// command string.
    pub fn offset(&self) -> Option<usize> {
        match self {
            TranslationError::UnterminatedQuote { offset, .. }
            | TranslationError::UnterminatedHeredoc { offset, .. } => Some(*offset),
            TranslationError::NestedParse { inner, .. } => inner.offset(),
            _ => None,
        }
    }

    /// Structured form used for JSON output and history records.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            offset: self.offset(),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    pub message: String,
}

pub type Result<T, E = TranslationError> = std::result::Result<T, E>;
