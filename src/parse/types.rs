//! Types produced by the tokenizer and consumed by the AST builder.

use serde::Serialize;

/// Shell operator between or around words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Operator {
    /// `&&`: run next only if previous succeeded
    And,
    /// `||`: run next only if previous failed
    Or,
    /// `;`: run next unconditionally
    Semi,
    /// `;;`: case arm terminator
    DoubleSemi,
    /// `|`: pipe stdout
    Pipe,
    /// `|&` (`&|` in fish): pipe stdout+stderr
    PipeErr,
    /// `&`: background (call operator in powershell)
    Background,
    /// `(` or `{`
    Open(char),
    /// `)` or `}`
    Close(char),
    /// `,`: powershell array separator
    Comma,
    /// `@{`: powershell hashtable literal
    HashOpen,
    /// Any redirection, kept verbatim: `>`, `2>&1`, `<<<`, `&>>`.
    Redirect(String),
}

impl Operator {
    /// Classify operator text matched by the tokenizer.
    pub fn from_text(text: &str) -> Operator {
        match text {
            "&&" => Operator::And,
            "||" => Operator::Or,
            ";" => Operator::Semi,
            ";;" => Operator::DoubleSemi,
            "|" => Operator::Pipe,
            "|&" | "&|" => Operator::PipeErr,
            "&" => Operator::Background,
            "(" => Operator::Open('('),
            "{" => Operator::Open('{'),
            ")" => Operator::Close(')'),
            "}" => Operator::Close('}'),
            "," => Operator::Comma,
            "@{" => Operator::HashOpen,
            other => Operator::Redirect(other.to_string()),
        }
    }

    /// The operator's shell syntax.
    pub fn as_str(&self) -> &str {
        match self {
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Semi => ";",
            Operator::DoubleSemi => ";;",
            Operator::Pipe => "|",
            Operator::PipeErr => "|&",
            Operator::Background => "&",
            Operator::Open('{') => "{",
            Operator::Open(_) => "(",
            Operator::Close('}') => "}",
            Operator::Close(_) => ")",
            Operator::Comma => ",",
            Operator::HashOpen => "@{",
            Operator::Redirect(text) => text,
        }
    }

    /// True when the operator ends one simple command and starts another.
    pub fn separates_commands(&self) -> bool {
        !matches!(self, Operator::Redirect(_) | Operator::Comma)
    }
}

/// How a variable reference is classified, independent of spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum VarKind {
    /// A shell variable: `$name`, `${name}`.
    Named(String),
    /// An environment variable: `$env:NAME`, `%NAME%`.
    Environment(String),
    /// `$1`, `$argv[1]`, `$args[0]`, `%1`. Index 0 is the script name.
    Positional(u32),
    /// `$@`, `$*`, `$argv`, `$args`, `%*`.
    AllArguments,
    /// `$#`.
    ArgumentCount,
    /// `$?`, `$status`, `$LASTEXITCODE`, `%ERRORLEVEL%`.
    LastStatus,
    /// `$$`, `$fish_pid`, `$PID`.
    ProcessId,
    /// A dialect-specific parameter with no cross-dialect meaning: `$!`,
    /// `$-`, powershell `$?`.
    Special(String),
}

/// A variable reference. Never evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VarRef {
    pub kind: VarKind,
    /// Source text of a modifier form, spelled in the source dialect:
    /// the whole braced body for `${x:-d}`, the index for fish `$x[2]`,
    /// the `~dp` for cmd `%~dp0`.
    pub modifier: Option<String>,
}

impl VarRef {
    pub fn new(kind: VarKind) -> Self {
        Self {
            kind,
            modifier: None,
        }
    }

    pub fn named(name: &str) -> Self {
        Self::new(VarKind::Named(name.to_string()))
    }

    /// The variable's name, as the reader would say it.
    pub fn name(&self) -> String {
        match &self.kind {
            VarKind::Named(name) | VarKind::Environment(name) | VarKind::Special(name) => {
                name.clone()
            }
            VarKind::Positional(n) => n.to_string(),
            VarKind::AllArguments => "@".into(),
            VarKind::ArgumentCount => "#".into(),
            VarKind::LastStatus => "?".into(),
            VarKind::ProcessId => "$".into(),
        }
    }
}

/// Spelling of an opaque command or expression substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SubstitutionStyle {
    /// `$(…)`
    Dollar,
    /// `` `…` ``
    Backtick,
    /// `(…)` in fish and powershell
    Paren,
    /// `<(…)`
    ProcessIn,
    /// `>(…)`
    ProcessOut,
    /// `$((…))`
    Arithmetic,
    /// powershell `@(…)`
    Array,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substitution {
    pub style: SubstitutionStyle,
    /// Inner text, preserved verbatim.
    pub command: String,
}

/// A classified span of an input command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Segment {
    /// Quoted text with expansion suppressed. Holds the decoded value.
    Literal(String),
    /// Quoted text that permits expansion. Parts are `RawUnquoted` text,
    /// `VariableRef`, `EscapeSequence` and `Substitution`.
    Expandable(Vec<Segment>),
    VariableRef(VarRef),
    /// An escaped character, holding the character it stands for.
    EscapeSequence(char),
    RawUnquoted(String),
    Substitution(Substitution),
}

/// A shell word: adjacent segments with no unquoted whitespace between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Word {
    pub segments: Vec<Segment>,
    /// Byte offset of the word's first character in the tokenized text.
    pub offset: usize,
}

impl Word {
    /// Build a word from plain text, for synthesized arguments.
    pub fn literal(text: &str) -> Self {
        Self {
            segments: vec![Segment::Literal(text.to_string())],
            offset: 0,
        }
    }

    /// The word's value when it contains no expansions or patterns.
    pub fn static_text(&self) -> Option<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::EscapeSequence(c) => out.push(*c),
                Segment::RawUnquoted(text) => {
                    if text.chars().any(|c| matches!(c, '*' | '?' | '[' | '{' | '~')) {
                        return None;
                    }
                    out.push_str(text);
                }
                Segment::Expandable(parts) => {
                    for part in parts {
                        match part {
                            Segment::RawUnquoted(text) => out.push_str(text),
                            Segment::EscapeSequence(c) => out.push(*c),
                            _ => return None,
                        }
                    }
                }
                Segment::VariableRef(_) | Segment::Substitution(_) => return None,
            }
        }
        Some(out)
    }

    /// True for `NAME=value` words, which prefix a command in POSIX shells.
    pub fn is_assignment(&self) -> bool {
        let Some(Segment::RawUnquoted(first)) = self.segments.first() else {
            return false;
        };
        let Some((name, _)) = first.split_once('=') else {
            return false;
        };
        !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && name
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    }
}

/// A here-document attached to a command: `<<EOF`, `<<-'EOF'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heredoc {
    /// `<<` or `<<-`.
    pub operator: String,
    /// Delimiter with its quoting removed.
    pub delimiter: String,
    /// A quoted delimiter suppresses expansion in the body.
    pub quoted: bool,
    /// `Literal` when quoted, otherwise `Expandable`.
    pub body: Segment,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Token {
    Word(Word),
    Operator(Operator),
    Heredoc(Heredoc),
    /// Comment text after the dialect's comment marker.
    Comment(String),
    Newline,
}

impl Token {
    /// The segments this token contributes to the flat segment sequence.
    pub fn segments(&self) -> &[Segment] {
        match self {
            Token::Word(word) => &word.segments,
            Token::Heredoc(heredoc) => std::slice::from_ref(&heredoc.body),
            Token::Operator(_) | Token::Comment(_) | Token::Newline => &[],
        }
    }
}

/// Tokens in source order, with the whitespace layout between them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    /// `spaced[i]` is true when whitespace or a line start came before
    /// `tokens[i]`. `a=(1 2)` and `a= ( 1 2 )` differ only here.
    pub spaced: Vec<bool>,
}

impl From<Vec<Token>> for TokenStream {
    /// Tokens with no recorded layout are taken as whitespace-separated.
    fn from(tokens: Vec<Token>) -> Self {
        let spaced = vec![true; tokens.len()];
        Self { tokens, spaced }
    }
}

/// Flatten a token stream into its segment sequence.
pub fn segments(tokens: &[Token]) -> Vec<&Segment> {
    tokens.iter().flat_map(|t| t.segments()).collect()
}
