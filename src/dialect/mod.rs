//! Static lexical rules for each supported shell dialect.
//!
//! Dialect records are hand-authored constants. They are never loaded from
//! configuration and never mutated: changing a quoting rule means shipping a
//! new build.

pub mod table;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TranslationError;

pub use table::{ConstructKind, RenderRule, lookup};

/// Identifier of a supported shell dialect.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell", alias = "pwsh")]
    #[serde(rename = "powershell", alias = "pwsh")]
    PowerShell,
    Cmd,
}

impl DialectKind {
    /// All supported dialects, in registry order.
    pub const ALL: [DialectKind; 5] = [
        DialectKind::Bash,
        DialectKind::Zsh,
        DialectKind::Fish,
        DialectKind::PowerShell,
        DialectKind::Cmd,
    ];

    /// The dialect's canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            DialectKind::Bash => "bash",
            DialectKind::Zsh => "zsh",
            DialectKind::Fish => "fish",
            DialectKind::PowerShell => "powershell",
            DialectKind::Cmd => "cmd",
        }
    }

    /// The static rule record for this dialect.
    pub fn dialect(self) -> &'static Dialect {
        match self {
            DialectKind::Bash => &BASH,
            DialectKind::Zsh => &ZSH,
            DialectKind::Fish => &FISH,
            DialectKind::PowerShell => &POWERSHELL,
            DialectKind::Cmd => &CMD,
        }
    }

    /// Bash and zsh share their quoting rules closely enough that every
    /// construct passes through unchanged between them.
    pub fn is_posix_family(self) -> bool {
        matches!(self, DialectKind::Bash | DialectKind::Zsh)
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bash" | "sh" => Ok(DialectKind::Bash),
            "zsh" => Ok(DialectKind::Zsh),
            "fish" => Ok(DialectKind::Fish),
            "powershell" | "pwsh" => Ok(DialectKind::PowerShell),
            "cmd" | "cmd.exe" | "batch" => Ok(DialectKind::Cmd),
            _ => Err(TranslationError::UnknownDialect {
                name: s.to_string(),
            }),
        }
    }
}

/// Look up a dialect record by name.
pub fn get_dialect(name: &str) -> Result<&'static Dialect, TranslationError> {
    name.parse::<DialectKind>().map(DialectKind::dialect)
}

/// What the escape character may do inside a literal-quote span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralEscape {
    /// Nothing: the span ends at the first closing delimiter (bash, zsh).
    None,
    /// `\'` and `\\` are escapes; any other backslash is literal (fish).
    Backslash,
    /// A doubled delimiter stands for one delimiter (powershell `''`).
    DoubledQuote,
}

/// What the escape character may protect inside an expandable-quote span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandableEscape {
    /// Only the listed characters (plus newline, as a continuation).
    Only(&'static [char]),
    /// Any character, with dialect escape letters decoded (powershell).
    Any,
    /// No escaping inside quotes (cmd).
    None,
}

/// How variables are referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableSyntax {
    /// `$name`, `${name}` and dialect-specific special parameters.
    Dollar,
    /// `%name%` and `%1`, `%*`.
    Percent,
}

/// Here-document support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeredocSyntax {
    /// `<<DELIM` redirection; a quoted delimiter suppresses expansion.
    Redirect,
    /// `@'…'@` / `@"…"@` here-strings used as values.
    HereString,
}

/// The lexical rule set of one shell dialect.
#[derive(Debug)]
pub struct Dialect {
    pub kind: DialectKind,
    /// Delimiter of the quote form that suppresses expansion.
    pub literal_quote: Option<char>,
    /// Delimiter of the quote form that permits expansion.
    pub expandable_quote: char,
    pub escape: char,
    pub literal_escape: LiteralEscape,
    pub expandable_escape: ExpandableEscape,
    pub variable: VariableSyntax,
    pub heredoc: Option<HeredocSyntax>,
    /// Marker that starts a comment at the beginning of a word, matched
    /// without regard to case. A marker spelled in letters must end the word.
    pub comment: &'static str,
    /// Characters that end a word outside quotes (besides whitespace).
    pub metachars: &'static [char],
    /// Control and redirection operators, longest first.
    pub operators: &'static [&'static str],
    /// Characters that keep a pattern meaning when left unquoted.
    pub pattern_chars: &'static [char],
}

pub static BASH: Dialect = BASH_RULES;

pub static ZSH: Dialect = Dialect {
    kind: DialectKind::Zsh,
    ..BASH_RULES
};

const BASH_RULES: Dialect = Dialect {
    kind: DialectKind::Bash,
    literal_quote: Some('\''),
    expandable_quote: '"',
    escape: '\\',
    literal_escape: LiteralEscape::None,
    expandable_escape: ExpandableEscape::Only(&['$', '`', '"', '\\']),
    variable: VariableSyntax::Dollar,
    heredoc: Some(HeredocSyntax::Redirect),
    comment: "#",
    metachars: &['|', '&', ';', '<', '>', '(', ')'],
    operators: POSIX_OPERATORS,
    pattern_chars: &['*', '?', '[', ']', '{', '}', '~'],
};

const POSIX_OPERATORS: &[&str] = &[
    "&>>", "<<<", "<<-", "&&", "||", "|&", ";;", ">>", ">|", ">&", "<&", "<>", "&>", "<<", "|",
    "&", ";", "<", ">", "(", ")",
];

pub static FISH: Dialect = Dialect {
    kind: DialectKind::Fish,
    literal_quote: Some('\''),
    expandable_quote: '"',
    escape: '\\',
    literal_escape: LiteralEscape::Backslash,
    expandable_escape: ExpandableEscape::Only(&['"', '$', '\\']),
    variable: VariableSyntax::Dollar,
    heredoc: None,
    comment: "#",
    metachars: &['|', '&', ';', '<', '>', ')'],
    operators: &[
        "&>>", "&&", "||", "&|", ">>", ">?", "&>", ">&", "<&", "|", "&", ";", "<", ">", ")",
    ],
    pattern_chars: &['*', '?', '{', '}', '~'],
};

pub static POWERSHELL: Dialect = Dialect {
    kind: DialectKind::PowerShell,
    literal_quote: Some('\''),
    expandable_quote: '"',
    escape: '`',
    literal_escape: LiteralEscape::DoubledQuote,
    expandable_escape: ExpandableEscape::Any,
    variable: VariableSyntax::Dollar,
    heredoc: Some(HeredocSyntax::HereString),
    comment: "#",
    metachars: &['|', '&', ';', '<', '>', ')', '{', '}', ','],
    operators: &[
        "&&", "||", ">>", ">&", "|", "&", ";", "<", ">", ")", "{", "}", ",",
    ],
    pattern_chars: &['*', '?', '[', ']', '~'],
};

pub static CMD: Dialect = Dialect {
    kind: DialectKind::Cmd,
    literal_quote: None,
    expandable_quote: '"',
    escape: '^',
    literal_escape: LiteralEscape::None,
    expandable_escape: ExpandableEscape::None,
    variable: VariableSyntax::Percent,
    heredoc: None,
    comment: "rem",
    metachars: &['|', '&', '<', '>', '(', ')'],
    operators: &["&&", "||", ">>", ">&", "<&", "|", "&", "<", ">", "(", ")"],
    pattern_chars: &['*', '?'],
};

/// Characters cmd.exe treats specially outside quotes.
pub const CMD_SPECIALS: &[char] = &['&', '|', '<', '>', '^', '(', ')', '%', '!', '"'];

impl Dialect {
    /// True when `c` ends a word outside quotes.
    pub fn is_metachar(&self, c: char) -> bool {
        c.is_whitespace() || self.metachars.contains(&c)
    }

    pub fn is_pattern_char(&self, c: char) -> bool {
        self.pattern_chars.contains(&c)
    }

    /// The character that starts a variable reference.
    pub fn variable_prefix(&self) -> char {
        match self.variable {
            VariableSyntax::Dollar => '$',
            VariableSyntax::Percent => '%',
        }
    }

    /// True when `c` can appear unquoted and unescaped in this dialect and
    /// still mean only itself.
    pub fn is_safe_char(&self, c: char) -> bool {
        if c.is_alphanumeric() || c == '_' {
            return true;
        }
        match self.kind {
            DialectKind::Bash | DialectKind::Zsh | DialectKind::Fish => {
                matches!(c, '-' | '.' | '/' | ':' | '@' | '%' | '+' | ',' | '=')
            }
            DialectKind::PowerShell => {
                matches!(c, '-' | '.' | '/' | ':' | '\\' | '=' | '+' | '%' | '!')
            }
            DialectKind::Cmd => {
                !c.is_whitespace() && !c.is_control() && !CMD_SPECIALS.contains(&c)
            }
        }
    }

    /// True when a word made of `text` can be written without any quoting.
    pub fn is_safe_word(&self, text: &str) -> bool {
        !text.is_empty() && text.chars().all(|c| self.is_safe_char(c))
    }

    /// Decode a dialect escape letter (`\n` in fish, `` `n `` in
    /// powershell) to the control character it stands for.
    pub fn decode_escape_letter(&self, c: char) -> Option<char> {
        let decoded = match (self.kind, c) {
            (DialectKind::Fish | DialectKind::PowerShell, 'a') => '\x07',
            (DialectKind::Fish | DialectKind::PowerShell, 'b') => '\x08',
            (DialectKind::Fish | DialectKind::PowerShell, 'e') => '\x1b',
            (DialectKind::Fish | DialectKind::PowerShell, 'f') => '\x0c',
            (DialectKind::Fish | DialectKind::PowerShell, 'n') => '\n',
            (DialectKind::Fish | DialectKind::PowerShell, 'r') => '\r',
            (DialectKind::Fish | DialectKind::PowerShell, 't') => '\t',
            (DialectKind::Fish | DialectKind::PowerShell, 'v') => '\x0b',
            (DialectKind::PowerShell, '0') => '\0',
            _ => return None,
        };
        Some(decoded)
    }

    /// The escape letter that spells control character `c`, if the dialect
    /// has one.
    pub fn escape_letter_for(&self, c: char) -> Option<char> {
        let letter = match c {
            '\x07' => 'a',
            '\x08' => 'b',
            '\x1b' => 'e',
            '\x0c' => 'f',
            '\n' => 'n',
            '\r' => 'r',
            '\t' => 't',
            '\x0b' => 'v',
            '\0' if self.kind == DialectKind::PowerShell => '0',
            _ => return None,
        };
        match self.kind {
            DialectKind::Fish | DialectKind::PowerShell => Some(letter),
            _ => None,
        }
    }

    /// True when the escape character protects `c` inside expandable quotes.
    pub fn escapes_in_expandable(&self, c: char) -> bool {
        match self.expandable_escape {
            ExpandableEscape::Only(chars) => chars.contains(&c) || c == '\n',
            ExpandableEscape::Any => true,
            ExpandableEscape::None => false,
        }
    }
}
