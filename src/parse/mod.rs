//! Dialect-aware tokenizer: command text to words, operators, here-documents
//! and comments.

pub mod tokenize;
pub mod types;

pub use tokenize::{tokenize, tokenize_stream};
pub use types::{
    Heredoc, Operator, Segment, Substitution, SubstitutionStyle, Token, TokenStream, VarKind,
    VarRef, Word, segments,
};
