//! Character-level quoting and escaping for each target dialect.

use crate::ast::capture::is_sentinel;
use crate::dialect::{CMD_SPECIALS, Dialect, DialectKind};

/// Powershell treats these as single quotes too.
const SMART_SINGLE_QUOTES: &[char] = &['\u{2018}', '\u{2019}', '\u{201A}', '\u{201B}'];
/// Powershell treats these as double quotes too.
const SMART_DOUBLE_QUOTES: &[char] = &['\u{201C}', '\u{201D}', '\u{201E}'];

/// True when literal `text` cannot be written bare in `target`.
///
/// Sentinel text is always quoted so the outer expansion it stands for stays
/// one word once restored.
pub fn needs_quoting(text: &str, target: &Dialect) -> bool {
    !target.is_safe_word(text) || text.chars().any(is_sentinel) || looks_like_assignment(text)
}

/// `NAME=value` written bare would become a command prefix.
fn looks_like_assignment(text: &str) -> bool {
    text.split_once('=').is_some_and(|(name, _)| crate::parse::tokenize::is_identifier(name))
}

/// Wrap `text` in the target's literal quotes. Not for cmd.
pub fn single_quote(text: &str, target: DialectKind) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match target {
            DialectKind::Fish if c == '\\' || c == '\'' => {
                out.push('\\');
                out.push(c);
            }
            DialectKind::PowerShell if c == '\'' || SMART_SINGLE_QUOTES.contains(&c) => {
                out.push(c);
                out.push(c);
            }
            DialectKind::Bash | DialectKind::Zsh if c == '\'' => out.push_str("'\\''"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Quote literal text for bash/zsh, preferring double quotes when the text
/// holds single quotes and nothing double quotes would expand.
pub fn posix_literal(text: &str) -> String {
    let expands = |c: char| matches!(c, '$' | '`' | '\\' | '"' | '!');
    if text.contains('\'') && !text.chars().any(expands) {
        format!("\"{text}\"")
    } else {
        single_quote(text, DialectKind::Bash)
    }
}

/// Escape every cmd special character with `^`, quoting whitespace runs.
///
/// The caller rejects newlines first: cmd has no way to spell one.
pub fn caret_escape(text: &str) -> String {
    if text.is_empty() {
        return "\"\"".to_string();
    }
    let mut out = String::with_capacity(text.len() * 2);
    let mut in_space = false;
    for c in text.chars() {
        let space = c.is_whitespace();
        if space != in_space {
            out.push('"');
            in_space = space;
        }
        if !space && CMD_SPECIALS.contains(&c) {
            out.push('^');
        }
        out.push(c);
    }
    if in_space {
        out.push('"');
    }
    out
}

/// Append `c` as it must appear inside the target's expandable quotes.
///
/// cmd newlines are rejected by the caller.
pub fn push_expandable_char(out: &mut String, c: char, target: &Dialect) {
    if is_sentinel(c) {
        out.push(c);
        return;
    }
    match target.kind {
        DialectKind::Bash | DialectKind::Zsh => {
            if matches!(c, '$' | '`' | '"' | '\\') {
                out.push('\\');
            }
            out.push(c);
        }
        DialectKind::Fish => {
            if matches!(c, '"' | '$' | '\\') {
                out.push('\\');
            }
            out.push(c);
        }
        DialectKind::PowerShell => {
            if let Some(letter) = target.escape_letter_for(c).filter(|_| c != '\n') {
                out.push('`');
                out.push(letter);
            } else {
                if matches!(c, '"' | '$' | '`') || SMART_DOUBLE_QUOTES.contains(&c) {
                    out.push('`');
                }
                out.push(c);
            }
        }
        DialectKind::Cmd => match c {
            '"' => out.push_str("\"^\"\""),
            '%' => out.push_str("\"^%\""),
            _ => out.push(c),
        },
    }
}

/// Escape `text` for a `"…"` wrapper around a nested command under cmd.
///
/// Inner quotes are doubled, which keeps cmd's quote state and the
/// program's own argument parser in step. A nested cmd command is taken
/// verbatim by `cmd /c`.
pub fn push_cmd_wrapped(out: &mut String, text: &str, inner: DialectKind) {
    if inner == DialectKind::Cmd {
        out.push_str(text);
        return;
    }
    for c in text.chars() {
        match c {
            '"' => out.push_str("\"\""),
            '%' => out.push_str("\"^%\""),
            _ => out.push(c),
        }
    }
}

/// The body of a control-character escape: an escape letter where the
/// target has one, otherwise a hex code.
pub fn control_code(c: char, target: DialectKind) -> String {
    let letter = match c {
        '\x07' => Some('a'),
        '\x08' => Some('b'),
        '\x1b' => Some('e'),
        '\x0c' => Some('f'),
        '\n' => Some('n'),
        '\r' => Some('r'),
        '\t' => Some('t'),
        '\x0b' => Some('v'),
        '\0' if target == DialectKind::PowerShell => Some('0'),
        _ => None,
    };
    match (letter, target) {
        (Some(letter), _) => letter.to_string(),
        (None, DialectKind::PowerShell) => format!("u{{{:x}}}", c as u32),
        (None, _) => format!("x{:02x}", c as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{BASH, CMD, FISH, POWERSHELL};

    #[test]
    fn safe_words_need_no_quotes() {
        assert!(!needs_quoting("src/main.rs", &BASH));
        assert!(needs_quoting("a b", &BASH));
        assert!(needs_quoting("", &BASH));
        assert!(needs_quoting("FOO=1", &BASH));
        assert!(!needs_quoting("--opt=1", &BASH));
        assert!(needs_quoting("a\u{E000}0\u{E001}", &BASH));
    }

    #[test]
    fn single_quotes_per_dialect() {
        assert_eq!(single_quote("it's", DialectKind::Bash), "'it'\\''s'");
        assert_eq!(single_quote("it's \\", DialectKind::Fish), "'it\\'s \\\\'");
        assert_eq!(single_quote("it's", DialectKind::PowerShell), "'it''s'");
        assert_eq!(
            single_quote("\u{2019}", DialectKind::PowerShell),
            "'\u{2019}\u{2019}'"
        );
    }

    #[test]
    fn posix_literal_prefers_double_quotes_for_apostrophes() {
        assert_eq!(posix_literal("it's"), "\"it's\"");
        assert_eq!(posix_literal("it's $5"), "'it'\\''s $5'");
        assert_eq!(posix_literal("a b"), "'a b'");
    }

    #[test]
    fn caret_escape_quotes_whitespace() {
        assert_eq!(caret_escape("a&b"), "a^&b");
        assert_eq!(caret_escape("hello world"), "hello\" \"world");
        assert_eq!(caret_escape("100%"), "100^%");
        assert_eq!(caret_escape(""), "\"\"");
    }

    #[test]
    fn expandable_chars() {
        let render = |text: &str, target: &Dialect| {
            let mut out = String::new();
            for c in text.chars() {
                push_expandable_char(&mut out, c, target);
            }
            out
        };
        assert_eq!(render("a\"$`\\", &BASH), "a\\\"\\$\\`\\\\");
        assert_eq!(render("a\"$`", &POWERSHELL), "a`\"`$``");
        assert_eq!(render("tab\there", &POWERSHELL), "tab`there");
        assert_eq!(render("$\"", &FISH), "\\$\\\"");
        assert_eq!(render("50%", &CMD), "50\"^%\"");
    }

    #[test]
    fn cmd_wrapping_doubles_quotes() {
        let mut out = String::new();
        push_cmd_wrapped(&mut out, "echo \"hi\"", DialectKind::Bash);
        assert_eq!(out, "echo \"\"hi\"\"");
        let mut out = String::new();
        push_cmd_wrapped(&mut out, "echo \"hi\"", DialectKind::Cmd);
        assert_eq!(out, "echo \"hi\"");
    }

    #[test]
    fn control_codes() {
        assert_eq!(control_code('\n', DialectKind::Bash), "n");
        assert_eq!(control_code('\x01', DialectKind::Bash), "x01");
        assert_eq!(control_code('\x01', DialectKind::PowerShell), "u{1}");
        assert_eq!(control_code('\0', DialectKind::PowerShell), "0");
    }
}
