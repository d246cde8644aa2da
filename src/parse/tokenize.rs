//! Dialect-aware tokenizer: raw command text → words of classified segments.
//!
//! One left-to-right pass with a single-character lookahead. Only one quote
//! level is ever active; quotes inside a `$(…)` body are tracked just far
//! enough to find its closing parenthesis, and the body itself stays opaque.

use super::types::{
    Heredoc, Operator, Segment, Substitution, SubstitutionStyle, Token, TokenStream, VarKind,
    VarRef, Word,
};
use crate::dialect::{Dialect, DialectKind, ExpandableEscape, HeredocSyntax, LiteralEscape};
use crate::error::{Result, TranslationError};

/// Tokenize `text` as written for `dialect`.
pub fn tokenize(text: &str, dialect: &Dialect) -> Result<Vec<Token>> {
    tokenize_stream(text, dialect).map(|stream| stream.tokens)
}

/// Tokenize `text`, keeping which tokens were separated by whitespace.
pub fn tokenize_stream(text: &str, dialect: &Dialect) -> Result<TokenStream> {
    Tokenizer::new(text, dialect, 0).run()
}

/// Scanning rules for text inside an expandable context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Between expandable quotes.
    Quoted,
    /// Unquoted here-document body: `\` only protects `$`, `` ` `` and `\`.
    Heredoc,
    /// Powershell `@"…"@` body.
    HereString,
}

struct PendingHeredoc {
    token: usize,
    delimiter: String,
    strip_tabs: bool,
    quoted: bool,
    offset: usize,
}

struct Tokenizer<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    /// Added to every reported offset when scanning a slice of a larger text.
    base: usize,
    dialect: &'a Dialect,
    tokens: Vec<Token>,
    spaced: Vec<bool>,
    /// Whitespace seen since the last token.
    gap: bool,
    word: Vec<Segment>,
    word_start: Option<usize>,
    word_spaced: bool,
    pending: Vec<PendingHeredoc>,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str, dialect: &'a Dialect, base: usize) -> Self {
        Self {
            src,
            chars: src.char_indices().collect(),
            pos: 0,
            base,
            dialect,
            tokens: Vec::new(),
            spaced: Vec::new(),
            gap: true,
            word: Vec::new(),
            word_start: None,
            word_spaced: true,
            pending: Vec::new(),
        }
    }

    fn kind(&self) -> DialectKind {
        self.dialect.kind
    }

    fn is_posix(&self) -> bool {
        self.kind().is_posix_family()
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|&(_, c)| c)
    }

    fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).map(|&(_, c)| c)
    }

    fn looking_at(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek(i) == Some(c))
    }

    fn offset_at(&self, index: usize) -> usize {
        self.base
            + self
                .chars
                .get(index)
                .map_or(self.src.len(), |&(offset, _)| offset)
    }

    fn unterminated(&self, start: usize, delimiter: &str) -> TranslationError {
        TranslationError::UnterminatedQuote {
            offset: self.offset_at(start),
            delimiter: delimiter.to_string(),
        }
    }

    // ── Word assembly ──

    fn start_word(&mut self, start: usize) {
        if self.word_start.is_none() {
            self.word_start = Some(self.offset_at(start));
            self.word_spaced = std::mem::take(&mut self.gap);
        }
    }

    fn push(&mut self, start: usize, segment: Segment) {
        self.start_word(start);
        self.word.push(segment);
    }

    fn push_raw(&mut self, start: usize, c: char) {
        self.start_word(start);
        push_text(&mut self.word, c);
    }

    fn flush_word(&mut self) {
        if let Some(offset) = self.word_start.take() {
            let segments = std::mem::take(&mut self.word);
            self.tokens.push(Token::Word(Word { segments, offset }));
            self.spaced.push(self.word_spaced);
        }
    }

    /// Push a token that is not a word.
    fn push_token(&mut self, token: Token) {
        self.tokens.push(token);
        self.spaced.push(std::mem::take(&mut self.gap));
    }

    // ── Main loop ──

    fn run(mut self) -> Result<TokenStream> {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                self.flush_word();
                self.push_token(Token::Newline);
                self.gap = true;
                self.pos += 1;
                self.read_heredoc_bodies()?;
                continue;
            }
            if c.is_whitespace() {
                self.flush_word();
                self.gap = true;
                self.pos += 1;
                continue;
            }
            if self.word_start.is_none() && self.at_comment() {
                self.read_comment()?;
                continue;
            }
            if c == self.dialect.escape {
                self.read_escape();
                continue;
            }
            if self.read_word_part()? {
                continue;
            }
            if Some(c) == self.dialect.literal_quote {
                self.read_literal()?;
                continue;
            }
            if c == self.dialect.expandable_quote {
                self.read_expandable()?;
                continue;
            }
            if self.dialect.is_metachar(c) {
                self.read_operator()?;
                continue;
            }
            self.push_raw(self.pos, c);
            self.pos += 1;
        }
        self.flush_word();
        if let Some(pending) = self.pending.first() {
            return Err(TranslationError::UnterminatedHeredoc {
                offset: pending.offset,
                delimiter: pending.delimiter.clone(),
            });
        }
        Ok(TokenStream {
            tokens: self.tokens,
            spaced: self.spaced,
        })
    }

    // ── Escapes ──

    fn read_escape(&mut self) {
        let start = self.pos;
        match self.peek(1) {
            None => {
                self.push_raw(start, self.dialect.escape);
                self.pos += 1;
            }
            // Line continuation
            Some('\n') => self.pos += 2,
            Some('\r') if self.peek(2) == Some('\n') => self.pos += 3,
            Some(next) => {
                let (value, consumed) = self.decode_escape(next);
                self.push(start, Segment::EscapeSequence(value));
                self.pos += 1 + consumed;
            }
        }
    }

    /// Decode the escape whose first character after the escape character
    /// is `next`. Returns the character and how many characters it spans
    /// after the escape character.
    fn decode_escape(&self, next: char) -> (char, usize) {
        match self.kind() {
            DialectKind::Fish => match next {
                'x' | 'X' => self.read_hex(2, 2).unwrap_or((next, 1)),
                'u' => self.read_hex(2, 4).unwrap_or((next, 1)),
                'U' => self.read_hex(2, 8).unwrap_or((next, 1)),
                _ => (self.dialect.decode_escape_letter(next).unwrap_or(next), 1),
            },
            DialectKind::PowerShell => {
                if next == 'u' && self.peek(2) == Some('{') {
                    let digits: String = (3..)
                        .map_while(|i| self.peek(i).filter(char::is_ascii_hexdigit))
                        .collect();
                    if self.peek(3 + digits.len()) == Some('}')
                        && let Some(c) = u32::from_str_radix(&digits, 16)
                            .ok()
                            .and_then(char::from_u32)
                    {
                        return (c, digits.len() + 3);
                    }
                }
                (self.dialect.decode_escape_letter(next).unwrap_or(next), 1)
            }
            _ => (next, 1),
        }
    }

    /// Read up to `max` hex digits starting `ahead` characters from the
    /// current position.
    fn read_hex(&self, ahead: usize, max: usize) -> Option<(char, usize)> {
        let digits: String = (ahead..ahead + max)
            .map_while(|i| self.peek(i).filter(char::is_ascii_hexdigit))
            .collect();
        if digits.is_empty() {
            return None;
        }
        let c = u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)?;
        Some((c, ahead - 1 + digits.len()))
    }

    // ── Quoted spans ──

    fn read_literal(&mut self) -> Result<()> {
        let start = self.pos;
        let quote = self.chars[start].1;
        let mut text = String::new();
        self.pos += 1;
        loop {
            let Some(c) = self.peek(0) else {
                return Err(self.unterminated(start, &quote.to_string()));
            };
            match self.dialect.literal_escape {
                LiteralEscape::Backslash if c == '\\' => {
                    if let Some(next @ ('\'' | '\\')) = self.peek(1) {
                        text.push(next);
                        self.pos += 2;
                        continue;
                    }
                }
                LiteralEscape::DoubledQuote if c == quote && self.peek(1) == Some(quote) => {
                    text.push(quote);
                    self.pos += 2;
                    continue;
                }
                _ => {}
            }
            self.pos += 1;
            if c == quote {
                break;
            }
            text.push(c);
        }
        self.push(start, Segment::Literal(text));
        Ok(())
    }

    /// Bash/zsh `$'…'`: backslash escapes decoded, no expansion.
    fn read_ansi_c(&mut self) -> Result<()> {
        let start = self.pos;
        let mut text = String::new();
        self.pos += 2;
        loop {
            let Some(c) = self.peek(0) else {
                return Err(self.unterminated(start, "$'"));
            };
            if c == '\'' {
                self.pos += 1;
                break;
            }
            if c == '\\' {
                let Some(next) = self.peek(1) else {
                    return Err(self.unterminated(start, "$'"));
                };
                let consumed = self.decode_ansi_c(next, &mut text);
                self.pos += 1 + consumed;
                continue;
            }
            text.push(c);
            self.pos += 1;
        }
        self.push(start, Segment::Literal(text));
        Ok(())
    }

    fn decode_ansi_c(&self, next: char, out: &mut String) -> usize {
        let simple = match next {
            'a' => Some('\x07'),
            'b' => Some('\x08'),
            'e' | 'E' => Some('\x1b'),
            'f' => Some('\x0c'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\x0b'),
            '\\' | '\'' | '"' | '?' => Some(next),
            _ => None,
        };
        if let Some(c) = simple {
            out.push(c);
            return 1;
        }
        let wide = match next {
            'x' => self.read_hex(2, 2),
            'u' => self.read_hex(2, 4),
            'U' => self.read_hex(2, 8),
            '0'..='7' => {
                let digits: String = (1..4)
                    .map_while(|i| self.peek(i).filter(|c| matches!(c, '0'..='7')))
                    .collect();
                u32::from_str_radix(&digits, 8)
                    .ok()
                    .and_then(char::from_u32)
                    .map(|c| (c, digits.len()))
            }
            _ => None,
        };
        match wide {
            Some((c, consumed)) => {
                out.push(c);
                consumed
            }
            None => {
                out.push('\\');
                out.push(next);
                1
            }
        }
    }

    fn read_expandable(&mut self) -> Result<()> {
        let start = self.pos;
        let quote = self.dialect.expandable_quote;
        let mut parts = Vec::new();
        self.pos += 1;
        loop {
            let Some(c) = self.peek(0) else {
                return Err(self.unterminated(start, &quote.to_string()));
            };
            if c == quote {
                if self.kind() == DialectKind::PowerShell && self.peek(1) == Some(quote) {
                    push_text(&mut parts, quote);
                    self.pos += 2;
                    continue;
                }
                self.pos += 1;
                break;
            }
            if self.expandable_part(&mut parts, Mode::Quoted)? {
                continue;
            }
            push_text(&mut parts, c);
            self.pos += 1;
        }
        self.push(start, Segment::Expandable(parts));
        Ok(())
    }

    /// Try to read an escape, variable or substitution inside an
    /// expandable context.
    fn expandable_part(&mut self, parts: &mut Vec<Segment>, mode: Mode) -> Result<bool> {
        let Some(c) = self.peek(0) else {
            return Ok(false);
        };
        if c == self.dialect.escape && self.dialect.expandable_escape != ExpandableEscape::None {
            let Some(next) = self.peek(1) else {
                return Ok(false);
            };
            if next == '\n' {
                if self.kind() == DialectKind::PowerShell {
                    parts.push(Segment::EscapeSequence('\n'));
                }
                self.pos += 2;
                return Ok(true);
            }
            let escapable = match mode {
                Mode::Heredoc => matches!(next, '$' | '`' | '\\'),
                Mode::Quoted | Mode::HereString => self.dialect.escapes_in_expandable(next),
            };
            if !escapable {
                return Ok(false);
            }
            let (value, consumed) = if self.kind() == DialectKind::PowerShell {
                self.decode_escape(next)
            } else {
                (next, 1)
            };
            parts.push(Segment::EscapeSequence(value));
            self.pos += 1 + consumed;
            return Ok(true);
        }
        if c == self.dialect.variable_prefix() {
            return match self.read_variable(true)? {
                Some(segment) => {
                    parts.push(segment);
                    Ok(true)
                }
                None => Ok(false),
            };
        }
        if c == '`' && self.is_posix() {
            let segment = self.read_backtick()?;
            parts.push(segment);
            return Ok(true);
        }
        Ok(false)
    }

    /// Scan a here-document or here-string body as expandable parts.
    fn scan_body(&self, body: &str, base: usize, mode: Mode) -> Result<Vec<Segment>> {
        let mut sub = Tokenizer::new(body, self.dialect, base);
        let mut parts = Vec::new();
        while let Some(c) = sub.peek(0) {
            if sub.expandable_part(&mut parts, mode)? {
                continue;
            }
            push_text(&mut parts, c);
            sub.pos += 1;
        }
        Ok(parts)
    }

    // ── Word parts that start with special sequences ──

    fn read_word_part(&mut self) -> Result<bool> {
        let start = self.pos;
        let Some(c) = self.peek(0) else {
            return Ok(false);
        };
        if self.is_posix() && self.looking_at("$'") {
            self.read_ansi_c()?;
            return Ok(true);
        }
        if self.kind() == DialectKind::PowerShell {
            if (self.looking_at("@'") || self.looking_at("@\"")) && self.at_here_string_opener() {
                self.read_here_string()?;
                return Ok(true);
            }
            if self.looking_at("@{") && self.word_start.is_none() {
                self.pos += 2;
                self.push_token(Token::Operator(Operator::HashOpen));
                return Ok(true);
            }
            if self.looking_at("@(") {
                let command = self.balanced(start + 1, '(', ')', start, "@(")?;
                self.push(
                    start,
                    Segment::Substitution(Substitution {
                        style: SubstitutionStyle::Array,
                        command,
                    }),
                );
                return Ok(true);
            }
        }
        if c == '`' && self.is_posix() {
            let segment = self.read_backtick()?;
            self.push(start, segment);
            return Ok(true);
        }
        if c == self.dialect.variable_prefix() {
            if let Some(segment) = self.read_variable(false)? {
                self.push(start, segment);
                return Ok(true);
            }
            return Ok(false);
        }
        if c == '(' && matches!(self.kind(), DialectKind::Fish | DialectKind::PowerShell) {
            let command = self.balanced(start, '(', ')', start, "(")?;
            self.push(
                start,
                Segment::Substitution(Substitution {
                    style: SubstitutionStyle::Paren,
                    command,
                }),
            );
            return Ok(true);
        }
        if self.is_posix() && matches!(c, '<' | '>') && self.peek(1) == Some('(') {
            let style = if c == '<' {
                SubstitutionStyle::ProcessIn
            } else {
                SubstitutionStyle::ProcessOut
            };
            let label = if c == '<' { "<(" } else { ">(" };
            let command = self.balanced(start + 1, '(', ')', start, label)?;
            self.flush_word();
            self.push(start, Segment::Substitution(Substitution { style, command }));
            return Ok(true);
        }
        Ok(false)
    }

    /// Scan a balanced `open`…`close` group whose opener is at `open_pos`,
    /// leaving the position after the closer. Quotes inside are tracked so
    /// that quoted parentheses do not count.
    fn balanced(
        &mut self,
        open_pos: usize,
        open: char,
        close: char,
        start: usize,
        label: &str,
    ) -> Result<String> {
        let mut depth: u32 = 1;
        let mut inner = String::new();
        let (mut sq, mut dq, mut esc) = (false, false, false);
        let mut i = open_pos + 1;
        while let Some(c) = self.char_at(i) {
            if esc {
                inner.push(c);
                esc = false;
                i += 1;
                continue;
            }
            if c == self.dialect.escape && !sq {
                esc = true;
                inner.push(c);
                i += 1;
                continue;
            }
            if Some(c) == self.dialect.literal_quote && !dq {
                sq = !sq;
            } else if c == self.dialect.expandable_quote && !sq {
                dq = !dq;
            } else if !sq && !dq {
                if c == open {
                    depth += 1;
                } else if c == close {
                    depth -= 1;
                    if depth == 0 {
                        self.pos = i + 1;
                        return Ok(inner);
                    }
                }
            }
            inner.push(c);
            i += 1;
        }
        Err(self.unterminated(start, label))
    }

    fn read_backtick(&mut self) -> Result<Segment> {
        let start = self.pos;
        let mut inner = String::new();
        let mut i = start + 1;
        while let Some(c) = self.char_at(i) {
            if c == '\\'
                && let Some(next) = self.char_at(i + 1)
            {
                inner.push(c);
                inner.push(next);
                i += 2;
                continue;
            }
            if c == '`' {
                self.pos = i + 1;
                return Ok(Segment::Substitution(Substitution {
                    style: SubstitutionStyle::Backtick,
                    command: inner,
                }));
            }
            inner.push(c);
            i += 1;
        }
        Err(self.unterminated(start, "`"))
    }

    // ── Variables ──

    /// Read a variable reference or `$(…)` substitution at the current
    /// position. Returns `None`, without moving, when the prefix is literal.
    fn read_variable(&mut self, quoted: bool) -> Result<Option<Segment>> {
        match self.kind() {
            DialectKind::Cmd => Ok(self.read_percent_variable()),
            _ => self.read_dollar_variable(quoted),
        }
    }

    fn read_dollar_variable(&mut self, quoted: bool) -> Result<Option<Segment>> {
        let start = self.pos;
        let Some(next) = self.peek(1) else {
            return Ok(None);
        };
        if next == '(' {
            if self.is_posix() && self.peek(2) == Some('(') {
                let mark = self.pos;
                let inner = self.balanced(start + 2, '(', ')', start, "$((")?;
                if self.peek(0) == Some(')') {
                    self.pos += 1;
                    return Ok(Some(Segment::Substitution(Substitution {
                        style: SubstitutionStyle::Arithmetic,
                        command: inner,
                    })));
                }
                self.pos = mark;
            }
            let command = self.balanced(start + 1, '(', ')', start, "$(")?;
            return Ok(Some(Segment::Substitution(Substitution {
                style: SubstitutionStyle::Dollar,
                command,
            })));
        }
        if next == '{' && self.kind() != DialectKind::Fish {
            let inner = self.balanced(start + 1, '{', '}', start, "${")?;
            let var = match self.kind() {
                DialectKind::PowerShell => powershell_braced(&inner),
                _ => posix_braced(&inner),
            };
            return Ok(Some(Segment::VariableRef(var)));
        }
        let var = match self.kind() {
            DialectKind::Fish => self.fish_variable(),
            DialectKind::PowerShell => self.powershell_variable(quoted),
            _ => self.posix_variable(),
        };
        Ok(var.map(Segment::VariableRef))
    }

    /// Identifier characters starting `ahead` characters from the position.
    fn identifier(&self, ahead: usize) -> String {
        (ahead..)
            .map_while(|i| self.peek(i).filter(|c| c.is_ascii_alphanumeric() || *c == '_'))
            .collect()
    }

    fn posix_variable(&mut self) -> Option<VarRef> {
        let next = self.peek(1)?;
        if let Some(digit) = next.to_digit(10) {
            self.pos += 2;
            return Some(VarRef::new(VarKind::Positional(digit)));
        }
        let kind = match next {
            c if c.is_ascii_alphabetic() || c == '_' => {
                let name = self.identifier(1);
                self.pos += 1 + name.chars().count();
                return Some(VarRef::new(VarKind::Named(name)));
            }
            '@' | '*' => VarKind::AllArguments,
            '#' => VarKind::ArgumentCount,
            '?' => VarKind::LastStatus,
            '$' => VarKind::ProcessId,
            '!' | '-' => VarKind::Special(next.to_string()),
            _ => return None,
        };
        self.pos += 2;
        Some(VarRef::new(kind))
    }

    fn fish_variable(&mut self) -> Option<VarRef> {
        let name = self.identifier(1);
        if name.is_empty() {
            return None;
        }
        self.pos += 1 + name.chars().count();
        let mut index = None;
        if self.peek(0) == Some('[') {
            let open = self.pos;
            let closing = (1..).find_map(|i| match self.peek(i) {
                Some(']') => Some(Some(i)),
                Some('\n') | None => Some(None),
                _ => None,
            });
            if let Some(Some(end)) = closing {
                index = Some(
                    self.chars[open + 1..open + end]
                        .iter()
                        .map(|&(_, c)| c)
                        .collect::<String>(),
                );
                self.pos += end + 1;
            }
        }
        let plain_index = index.as_deref().and_then(|i| i.parse::<u32>().ok());
        let var = match (name.as_str(), plain_index, &index) {
            ("argv", Some(n), _) if n > 0 => VarRef::new(VarKind::Positional(n)),
            ("argv", _, None) => VarRef::new(VarKind::AllArguments),
            ("status", _, None) => VarRef::new(VarKind::LastStatus),
            ("fish_pid", _, None) => VarRef::new(VarKind::ProcessId),
            _ => VarRef {
                kind: VarKind::Named(name),
                modifier: index.map(|i| format!("[{i}]")),
            },
        };
        Some(var)
    }

    fn powershell_variable(&mut self, quoted: bool) -> Option<VarRef> {
        let next = self.peek(1)?;
        if matches!(next, '?' | '$' | '^') {
            self.pos += 2;
            return Some(VarRef::new(VarKind::Special(next.to_string())));
        }
        let name = self.identifier(1);
        if name.is_empty() {
            return None;
        }
        self.pos += 1 + name.chars().count();
        let lower = name.to_ascii_lowercase();
        const SCOPES: &[&str] = &[
            "env", "global", "script", "local", "private", "using", "variable",
        ];
        if self.peek(0) == Some(':')
            && SCOPES.contains(&lower.as_str())
            && self.peek(1).is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        {
            let member = self.identifier(1);
            self.pos += 1 + member.chars().count();
            if lower == "env" {
                return Some(VarRef::new(VarKind::Environment(member)));
            }
            return Some(VarRef::named(&format!("{name}:{member}")));
        }
        let kind = match lower.as_str() {
            "args" => {
                if !quoted && self.peek(0) == Some('[') {
                    let digits = self.identifier(1);
                    if !digits.is_empty()
                        && digits.chars().all(|c| c.is_ascii_digit())
                        && self.peek(1 + digits.len()) == Some(']')
                        && let Ok(n) = digits.parse::<u32>()
                    {
                        self.pos += digits.len() + 2;
                        // `$args[n]` is `$n+1`; past u32 it stays an indexed `$args`
                        return Some(match n.checked_add(1) {
                            Some(n) => VarRef::new(VarKind::Positional(n)),
                            None => VarRef {
                                kind: VarKind::Named(name),
                                modifier: Some(format!("[{digits}]")),
                            },
                        });
                    }
                }
                VarKind::AllArguments
            }
            "lastexitcode" => VarKind::LastStatus,
            "pid" => VarKind::ProcessId,
            _ => VarKind::Named(name),
        };
        Some(VarRef::new(kind))
    }

    fn read_percent_variable(&mut self) -> Option<Segment> {
        let next = self.peek(1)?;
        if let Some(n) = next.to_digit(10) {
            self.pos += 2;
            return Some(Segment::VariableRef(VarRef::new(VarKind::Positional(n))));
        }
        if next == '*' {
            self.pos += 2;
            return Some(Segment::VariableRef(VarRef::new(VarKind::AllArguments)));
        }
        if next == '~' {
            let letters: String = (2..)
                .map_while(|i| self.peek(i).filter(char::is_ascii_alphabetic))
                .collect();
            let digit = self.peek(2 + letters.len())?.to_digit(10)?;
            self.pos += 3 + letters.len();
            return Some(Segment::VariableRef(VarRef {
                kind: VarKind::Positional(digit),
                modifier: Some(format!("~{letters}")),
            }));
        }
        let body: String = (1..)
            .map_while(|i| {
                self.peek(i)
                    .filter(|c| *c != '%' && *c != '"' && !c.is_whitespace())
            })
            .collect();
        let len = body.chars().count();
        if body.is_empty() || self.peek(1 + len) != Some('%') {
            return None;
        }
        self.pos += len + 2;
        let (name, modifier) = match body.split_once(':') {
            Some((name, rest)) => (name.to_string(), Some(format!(":{rest}"))),
            None => (body, None),
        };
        let kind = if name.eq_ignore_ascii_case("errorlevel") && modifier.is_none() {
            VarKind::LastStatus
        } else {
            VarKind::Environment(name)
        };
        Some(Segment::VariableRef(VarRef { kind, modifier }))
    }

    // ── Here-strings and here-documents ──

    fn at_here_string_opener(&self) -> bool {
        (2..)
            .map(|i| self.peek(i))
            .find(|c| !matches!(c, Some(' ' | '\t' | '\r')))
            .is_some_and(|c| c == Some('\n'))
    }

    fn read_here_string(&mut self) -> Result<()> {
        let start = self.pos;
        let quote = self.peek(1).unwrap_or('\'');
        let closer = format!("{quote}@");
        while self.peek(0).is_some_and(|c| c != '\n') {
            self.pos += 1;
        }
        self.pos += 1;
        let body_start = self.pos;
        let body_end = loop {
            if self.looking_at(&closer) {
                let end = self.pos;
                self.pos += 2;
                break end;
            }
            while self.peek(0).is_some_and(|c| c != '\n') {
                self.pos += 1;
            }
            if self.peek(0).is_none() {
                return Err(TranslationError::UnterminatedHeredoc {
                    offset: self.offset_at(start),
                    delimiter: closer,
                });
            }
            self.pos += 1;
        };
        // The newline before the closer is not part of the value.
        let body: String = self.chars[body_start..body_end.max(body_start)]
            .iter()
            .map(|&(_, c)| c)
            .collect();
        let body = body
            .strip_suffix('\n')
            .map(|b| b.strip_suffix('\r').unwrap_or(b))
            .unwrap_or(&body)
            .to_string();
        let segment = if quote == '\'' {
            Segment::Literal(body)
        } else {
            let offset = self.offset_at(body_start);
            Segment::Expandable(self.scan_body(&body, offset, Mode::HereString)?)
        };
        self.push(start, segment);
        Ok(())
    }

    fn read_heredoc_opener(&mut self, op: &str, start: usize) -> Result<()> {
        while matches!(self.peek(0), Some(' ' | '\t')) {
            self.pos += 1;
        }
        let mut delimiter = String::new();
        let mut quoted = false;
        while let Some(c) = self.peek(0) {
            if self.dialect.is_metachar(c) {
                break;
            }
            match c {
                '\'' | '"' => {
                    let open = self.pos;
                    quoted = true;
                    self.pos += 1;
                    loop {
                        let Some(d) = self.peek(0) else {
                            return Err(self.unterminated(open, &c.to_string()));
                        };
                        self.pos += 1;
                        if d == c {
                            break;
                        }
                        delimiter.push(d);
                    }
                }
                '\\' => {
                    quoted = true;
                    if let Some(next) = self.peek(1) {
                        delimiter.push(next);
                        self.pos += 2;
                    } else {
                        self.pos += 1;
                    }
                }
                _ => {
                    delimiter.push(c);
                    self.pos += 1;
                }
            }
        }
        if delimiter.is_empty() && !quoted {
            self.push_token(Token::Operator(Operator::Redirect(op.to_string())));
            return Ok(());
        }
        let offset = self.offset_at(start);
        self.pending.push(PendingHeredoc {
            token: self.tokens.len(),
            delimiter: delimiter.clone(),
            strip_tabs: op == "<<-",
            quoted,
            offset,
        });
        self.push_token(Token::Heredoc(Heredoc {
            operator: op.to_string(),
            delimiter,
            quoted,
            body: Segment::Literal(String::new()),
            offset,
        }));
        Ok(())
    }

    /// Read the bodies of here-documents opened on the line just ended.
    fn read_heredoc_bodies(&mut self) -> Result<()> {
        for pending in std::mem::take(&mut self.pending) {
            let body_start = self.pos;
            let mut body = String::new();
            loop {
                if self.peek(0).is_none() {
                    return Err(TranslationError::UnterminatedHeredoc {
                        offset: pending.offset,
                        delimiter: pending.delimiter,
                    });
                }
                let mut line = String::new();
                while let Some(c) = self.peek(0) {
                    self.pos += 1;
                    if c == '\n' {
                        break;
                    }
                    line.push(c);
                }
                let content = if pending.strip_tabs {
                    line.trim_start_matches('\t')
                } else {
                    line.as_str()
                };
                if content.trim_end_matches('\r') == pending.delimiter {
                    break;
                }
                body.push_str(content);
                body.push('\n');
            }
            let segment = if pending.quoted {
                Segment::Literal(body)
            } else {
                Segment::Expandable(self.scan_body(
                    &body,
                    self.offset_at(body_start),
                    Mode::Heredoc,
                )?)
            };
            if let Some(Token::Heredoc(heredoc)) = self.tokens.get_mut(pending.token) {
                heredoc.body = segment;
            }
        }
        Ok(())
    }

    // ── Operators ──

    fn read_operator(&mut self) -> Result<()> {
        let start = self.pos;
        let c = self.chars[start].1;
        let Some(op) = self
            .dialect
            .operators
            .iter()
            .copied()
            .find(|op| self.looking_at(op))
        else {
            self.push_raw(start, c);
            self.pos += 1;
            return Ok(());
        };
        let mut text = String::new();
        if op.starts_with(['<', '>'])
            && let Some(fd) = self.fd_prefix()
        {
            text.push_str(&fd);
            self.word.clear();
            self.word_start = None;
            self.gap = self.word_spaced;
        }
        self.flush_word();
        text.push_str(op);
        self.pos += op.chars().count();
        if op == ">&" || op == "<&" {
            while let Some(d) = self.peek(0).filter(|d| d.is_ascii_digit() || *d == '-') {
                text.push(d);
                self.pos += 1;
            }
        }
        if (op == "<<" || op == "<<-") && self.dialect.heredoc == Some(HeredocSyntax::Redirect) {
            return self.read_heredoc_opener(&text, start);
        }
        self.push_token(Token::Operator(Operator::from_text(&text)));
        Ok(())
    }

    /// A word of bare digits directly before a redirection is its fd.
    fn fd_prefix(&self) -> Option<String> {
        match self.word.as_slice() {
            [Segment::RawUnquoted(digits)] if digits.chars().all(|c| c.is_ascii_digit()) => {
                Some(digits.clone())
            }
            _ => None,
        }
    }

    // ── Comments ──

    fn at_command_start(&self) -> bool {
        match self.tokens.last() {
            None | Some(Token::Newline) | Some(Token::Comment(_)) => true,
            Some(Token::Operator(op)) => op.separates_commands(),
            _ => false,
        }
    }

    fn at_comment(&self) -> bool {
        match self.kind() {
            DialectKind::Cmd => {
                self.at_command_start() && (self.at_comment_marker() || self.looking_at("::"))
            }
            DialectKind::PowerShell => self.at_comment_marker() || self.looking_at("<#"),
            _ => self.at_comment_marker(),
        }
    }

    fn at_comment_marker(&self) -> bool {
        let marker = self.dialect.comment;
        let len = marker.chars().count();
        let matched = marker
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek(i).is_some_and(|p| p.eq_ignore_ascii_case(&c)));
        let word_marker = marker.chars().all(|c| c.is_ascii_alphabetic());
        matched && (!word_marker || self.peek(len).is_none_or(char::is_whitespace))
    }

    fn read_comment(&mut self) -> Result<()> {
        let start = self.pos;
        if self.kind() == DialectKind::PowerShell && self.looking_at("<#") {
            let mut text = String::new();
            self.pos += 2;
            while !self.looking_at("#>") {
                let Some(c) = self.peek(0) else {
                    return Err(self.unterminated(start, "<#"));
                };
                text.push(c);
                self.pos += 1;
            }
            self.pos += 2;
            self.push_token(Token::Comment(text));
            return Ok(());
        }
        let marker = match self.kind() {
            DialectKind::Cmd if self.looking_at("::") => 2,
            _ => self.dialect.comment.chars().count(),
        };
        self.pos += marker;
        let mut text = String::new();
        while let Some(c) = self.peek(0).filter(|c| *c != '\n') {
            text.push(c);
            self.pos += 1;
        }
        if self.kind() == DialectKind::Cmd {
            text = text.trim_start().to_string();
        }
        self.push_token(Token::Comment(text));
        Ok(())
    }
}

/// Append a character to the trailing raw text part, starting one if needed.
fn push_text(parts: &mut Vec<Segment>, c: char) {
    if let Some(Segment::RawUnquoted(text)) = parts.last_mut() {
        text.push(c);
    } else {
        parts.push(Segment::RawUnquoted(c.to_string()));
    }
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Classify the body of a bash/zsh `${…}`.
fn posix_braced(inner: &str) -> VarRef {
    if is_identifier(inner) {
        return VarRef::named(inner);
    }
    if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()) {
        return match inner.parse() {
            Ok(n) => VarRef::new(VarKind::Positional(n)),
            // too large to index; kept as written
            Err(_) => VarRef {
                kind: VarKind::Special(inner.to_string()),
                modifier: Some(inner.to_string()),
            },
        };
    }
    let kind = match inner {
        "@" | "*" => VarKind::AllArguments,
        "#" => VarKind::ArgumentCount,
        "?" => VarKind::LastStatus,
        "$" => VarKind::ProcessId,
        "!" | "-" => VarKind::Special(inner.to_string()),
        _ => {
            let name: String = inner
                .trim_start_matches(['#', '!'])
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect();
            let kind = if name.is_empty() {
                VarKind::Special(inner.to_string())
            } else {
                VarKind::Named(name)
            };
            return VarRef {
                kind,
                modifier: Some(inner.to_string()),
            };
        }
    };
    VarRef::new(kind)
}

/// Classify the body of a powershell `${…}`.
fn powershell_braced(inner: &str) -> VarRef {
    match inner.split_once(':') {
        Some((scope, name)) if scope.eq_ignore_ascii_case("env") => {
            VarRef::new(VarKind::Environment(name.to_string()))
        }
        _ => VarRef::named(inner),
    }
}
