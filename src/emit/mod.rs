//! Re-quoter: renders an [`Invocation`] as text for a target dialect.
//!
//! Each segment is spelled through the translation table. Nested
//! invocations are emitted first, in their own dialect, and the resulting
//! text is wrapped in one quote layer of the outer target, so escaping
//! compounds once per launcher boundary.

pub mod quote;

use crate::ast::capture::{self, Chunk};
use crate::ast::{Element, Invocation, NestedInvocation};
use crate::dialect::{ConstructKind, Dialect, DialectKind, RenderRule, lookup};
use crate::error::{Result, TranslationError};
use crate::parse::tokenize::is_identifier;
use crate::parse::{Heredoc, Operator, Segment, Substitution, SubstitutionStyle, VarKind, VarRef};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// Emit nested commands in the outer target dialect instead of the
    /// dialect their launcher runs.
    pub retarget_nested: bool,
}

/// Render `invocation` for `target`.
pub fn emit(invocation: &Invocation, target: DialectKind, opts: &EmitOptions) -> Result<String> {
    Emitter::new(invocation.dialect, target, *opts).invocation(invocation)
}

struct Emitter {
    source: DialectKind,
    target: DialectKind,
    opts: EmitOptions,
}

/// Output text under construction, one line at a time.
#[derive(Default)]
struct Output {
    text: String,
    /// Byte position where the current simple command starts.
    command_start: usize,
    /// Here-document bodies to write after the current line.
    bodies: Vec<String>,
    after_comment: bool,
}

impl Output {
    /// Append `piece`, separated from the line so far when `spaced`.
    fn push(&mut self, piece: &str, spaced: bool) {
        if self.after_comment {
            self.newline();
        }
        if spaced && !self.at_line_start() {
            self.text.push(' ');
        }
        self.text.push_str(piece);
    }

    fn comment(&mut self, text: &str) {
        self.push(text, true);
        self.after_comment = true;
    }

    fn at_line_start(&self) -> bool {
        self.text.is_empty() || self.text.ends_with('\n')
    }

    fn newline(&mut self) {
        self.after_comment = false;
        self.trim_end();
        self.text.push('\n');
        for body in self.bodies.drain(..) {
            self.text.push_str(&body);
        }
        self.command_start = self.text.len();
    }

    /// Mark the start of the next simple command.
    fn command_boundary(&mut self) {
        self.command_start = self.text.len();
    }

    /// Insert `prefix` in front of the current command.
    fn prefix_command(&mut self, prefix: &str) {
        let mut at = self.command_start;
        while self.text[at..].starts_with(' ') {
            at += 1;
        }
        self.text.insert_str(at, prefix);
    }

    fn trim_end(&mut self) {
        let len = self.text.trim_end_matches(' ').len();
        self.text.truncate(len);
    }

    fn finish(mut self) -> String {
        if !self.bodies.is_empty() {
            self.newline();
        }
        self.trim_end();
        self.text
    }
}

impl Emitter {
    fn new(source: DialectKind, target: DialectKind, opts: EmitOptions) -> Self {
        Self {
            source,
            target,
            opts,
        }
    }

    fn target_rules(&self) -> &'static Dialect {
        self.target.dialect()
    }

    fn rule(&self, construct: ConstructKind) -> Result<RenderRule> {
        lookup(construct, self.source, self.target)
    }

    fn unsupported(&self, construct: ConstructKind) -> TranslationError {
        TranslationError::UnsupportedConstruct {
            construct,
            from: self.source,
            to: self.target,
        }
    }

    fn same_family(&self) -> bool {
        self.source == self.target
            || (self.source.is_posix_family() && self.target.is_posix_family())
    }

    fn invocation(&self, invocation: &Invocation) -> Result<String> {
        let mut out = Output::default();
        for (i, element) in invocation.elements.iter().enumerate() {
            let spaced = invocation.is_spaced(i);
            match element {
                Element::Word(word) => out.push(&self.word(&word.segments)?, spaced),
                Element::Nested(nested) => out.push(&self.nested(nested)?, spaced),
                Element::Operator(op) => {
                    let text = self.operator(op);
                    // `2>&1 |` glued to a word would read as part of it
                    let spaced = spaced || text.starts_with(|c: char| c.is_ascii_digit());
                    out.push(&text, spaced);
                    if op.separates_commands() {
                        out.command_boundary();
                    }
                }
                Element::Heredoc(heredoc) => self.heredoc(heredoc, spaced, &mut out)?,
                Element::Comment(text) => {
                    if self.target == DialectKind::Cmd && !out.at_line_start() {
                        out.newline();
                    }
                    out.comment(&self.comment(text));
                }
                Element::Newline => out.newline(),
            }
        }
        Ok(out.finish())
    }

    fn operator(&self, op: &Operator) -> String {
        match (op, self.target) {
            (Operator::PipeErr, DialectKind::Fish) => "&|".to_string(),
            (Operator::PipeErr, DialectKind::PowerShell | DialectKind::Cmd) => "2>&1 |".to_string(),
            _ => op.as_str().to_string(),
        }
    }

    fn comment(&self, text: &str) -> String {
        let marker = self.target_rules().comment;
        match self.target {
            DialectKind::PowerShell if text.contains('\n') => format!("<#{text}#>"),
            DialectKind::Cmd => text
                .lines()
                .map(|line| format!("{marker} {}", line.trim_start()).trim_end().to_string())
                .collect::<Vec<_>>()
                .join("\n"),
            _ => format!("{marker}{}", text.replace('\n', &format!("\n{marker}"))),
        }
    }

    // ── Words ──

    fn word(&self, segments: &[Segment]) -> Result<String> {
        let segments = merge_static(segments);
        let segments = segments.as_slice();
        let mut out = String::new();
        for (i, segment) in segments.iter().enumerate() {
            let next = segments.get(i + 1);
            match segment {
                Segment::Literal(text) => out.push_str(&self.literal(text)?),
                Segment::Expandable(parts) => out.push_str(&self.expandable(parts)?),
                Segment::VariableRef(var) => {
                    out.push_str(&self.variable(var, false, self.delimits(next))?)
                }
                Segment::EscapeSequence(c) => out.push_str(&self.escape(*c)?),
                Segment::RawUnquoted(text) => out.push_str(&self.raw(text)?),
                Segment::Substitution(subst) => out.push_str(&self.substitution(subst)?),
            }
        }
        Ok(out)
    }

    /// True when a variable rendered before `next` needs delimiting.
    fn delimits(&self, next: Option<&Segment>) -> bool {
        let first = match next {
            Some(Segment::RawUnquoted(text) | Segment::Literal(text)) => text.chars().next(),
            Some(Segment::EscapeSequence(c)) => Some(*c),
            _ => None,
        };
        first.is_some_and(|c| self.continues_name(c))
    }

    /// True when `c` written right after a variable would extend its name.
    fn continues_name(&self, c: char) -> bool {
        c.is_alphanumeric()
            || c == '_'
            || match self.target {
                DialectKind::Fish | DialectKind::Zsh => c == '[',
                DialectKind::PowerShell => matches!(c, ':' | '[' | '.'),
                _ => false,
            }
    }

    fn literal(&self, text: &str) -> Result<String> {
        let target = self.target_rules();
        if !quote::needs_quoting(text, target) {
            return Ok(text.to_string());
        }
        self.quote_literal(text)
    }

    /// Literal text in the target's literal quote form, even when bare
    /// text would do.
    fn quote_literal(&self, text: &str) -> Result<String> {
        match self.rule(ConstructKind::LiteralQuote)? {
            RenderRule::CaretEscape => {
                if text.chars().any(|c| c.is_control() && c != '\t') {
                    return Err(self.unsupported(ConstructKind::ControlCharacter));
                }
                Ok(quote::caret_escape(text))
            }
            _ if self.target.is_posix_family() => Ok(quote::posix_literal(text)),
            _ => Ok(quote::single_quote(text, self.target)),
        }
    }

    fn expandable(&self, parts: &[Segment]) -> Result<String> {
        let RenderRule::Affix { prefix, suffix } = self.rule(ConstructKind::ExpandableQuote)?
        else {
            return Err(self.unsupported(ConstructKind::ExpandableQuote));
        };
        let mut out = String::from(prefix);
        self.push_expandable_parts(&mut out, parts)?;
        out.push_str(suffix);
        Ok(out)
    }

    fn push_expandable_parts(&self, out: &mut String, parts: &[Segment]) -> Result<()> {
        for (i, part) in parts.iter().enumerate() {
            match part {
                Segment::RawUnquoted(text) | Segment::Literal(text) => {
                    self.push_quoted_text(out, text)?
                }
                Segment::EscapeSequence(c) => self.push_quoted_text(out, &c.to_string())?,
                Segment::VariableRef(var) => {
                    out.push_str(&self.variable(var, true, self.delimits(parts.get(i + 1)))?)
                }
                Segment::Substitution(subst) => out.push_str(&self.substitution(subst)?),
                Segment::Expandable(inner) => self.push_expandable_parts(out, inner)?,
            }
        }
        Ok(())
    }

    fn push_quoted_text(&self, out: &mut String, text: &str) -> Result<()> {
        let target = self.target_rules();
        if target.kind == DialectKind::Cmd && text.contains(['\n', '\r']) {
            return Err(self.unsupported(ConstructKind::ControlCharacter));
        }
        for c in text.chars() {
            quote::push_expandable_char(out, c, target);
        }
        Ok(())
    }

    /// An escaped character outside quotes.
    fn escape(&self, c: char) -> Result<String> {
        let target = self.target_rules();
        if capture::is_sentinel(c) || target.is_safe_char(c) {
            return Ok(c.to_string());
        }
        if c.is_control() {
            return self.control_character(c);
        }
        self.escape_special(c)
    }

    fn escape_special(&self, c: char) -> Result<String> {
        if self.target == DialectKind::Cmd && c.is_whitespace() {
            return Ok(format!("\"{c}\""));
        }
        match self.rule(ConstructKind::Escape)? {
            RenderRule::Affix { prefix, suffix } => Ok(format!("{prefix}{c}{suffix}")),
            _ => Err(self.unsupported(ConstructKind::Escape)),
        }
    }

    fn control_character(&self, c: char) -> Result<String> {
        match self.rule(ConstructKind::ControlCharacter)? {
            RenderRule::Affix { prefix, suffix } => Ok(format!(
                "{prefix}{}{suffix}",
                quote::control_code(c, self.target)
            )),
            _ => Err(self.unsupported(ConstructKind::ControlCharacter)),
        }
    }

    /// Unquoted text. Pattern characters keep their meaning when the
    /// target shares them; everything else unsafe is escaped.
    fn raw(&self, text: &str) -> Result<String> {
        let source = self.source.dialect();
        let target = self.target_rules();
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            let keep = capture::is_sentinel(c)
                || target.is_safe_char(c)
                || (source.is_pattern_char(c) && target.is_pattern_char(c));
            if keep {
                out.push(c);
            } else if c.is_control() {
                out.push_str(&self.control_character(c)?);
            } else {
                out.push_str(&self.escape_special(c)?);
            }
        }
        Ok(out)
    }

    // ── Variables ──

    fn variable(&self, var: &VarRef, quoted: bool, delimit: bool) -> Result<String> {
        if let Some(modifier) = &var.modifier {
            self.rule(ConstructKind::ParameterModifier)?;
            return Ok(self.modifier_form(var, modifier));
        }
        match &var.kind {
            VarKind::Named(name) => self.named(ConstructKind::Variable, name, delimit),
            VarKind::Environment(name) => {
                self.named(ConstructKind::EnvironmentVariable, name, delimit)
            }
            VarKind::Positional(0) => self.fixed(ConstructKind::ScriptName, quoted, delimit),
            VarKind::Positional(n) => self.positional(*n, quoted, delimit),
            VarKind::AllArguments => self.fixed(ConstructKind::AllArguments, quoted, delimit),
            VarKind::ArgumentCount => self.fixed(ConstructKind::ArgumentCount, quoted, delimit),
            VarKind::LastStatus => self.fixed(ConstructKind::LastStatus, quoted, delimit),
            VarKind::ProcessId => self.fixed(ConstructKind::ProcessId, quoted, delimit),
            VarKind::Special(name) => {
                self.rule(ConstructKind::SpecialParameter)?;
                Ok(format!("${name}"))
            }
        }
    }

    /// A modifier form, spelled as the source family spells it.
    fn modifier_form(&self, var: &VarRef, modifier: &str) -> String {
        match (self.source, &var.kind) {
            (DialectKind::Fish | DialectKind::PowerShell, _) => {
                format!("${}{modifier}", var.name())
            }
            (DialectKind::Cmd, VarKind::Positional(n)) => format!("%{modifier}{n}"),
            (DialectKind::Cmd, _) => format!("%{}{modifier}%", var.name()),
            _ => format!("${{{modifier}}}"),
        }
    }

    fn named(&self, construct: ConstructKind, name: &str, delimit: bool) -> Result<String> {
        let RenderRule::Affix { prefix, suffix } = self.rule(construct)? else {
            return Err(self.unsupported(construct));
        };
        let plain = is_identifier(name);
        match self.target {
            DialectKind::Cmd => Ok(format!("{prefix}{name}{suffix}")),
            DialectKind::PowerShell if plain && !delimit => Ok(format!("{prefix}{name}")),
            DialectKind::PowerShell => Ok(format!("${{{}{name}}}", &prefix[1..])),
            _ if !plain => Err(self.unsupported(construct)),
            DialectKind::Fish if delimit => Ok(format!("{prefix}{name}\"\"")),
            DialectKind::Bash | DialectKind::Zsh if delimit => Ok(format!("${{{name}}}")),
            _ => Ok(format!("{prefix}{name}{suffix}")),
        }
    }

    fn positional(&self, n: u32, quoted: bool, delimit: bool) -> Result<String> {
        let construct = ConstructKind::PositionalParameter;
        let RenderRule::Indexed {
            prefix,
            suffix,
            base,
        } = self.rule(construct)?
        else {
            return Err(self.unsupported(construct));
        };
        let index = n - 1 + base;
        let text = match self.target {
            DialectKind::Cmd if index > 9 => return Err(self.unsupported(construct)),
            DialectKind::Bash | DialectKind::Zsh if index >= 10 || delimit => {
                format!("${{{index}}}")
            }
            DialectKind::PowerShell if quoted => format!("$({prefix}{index}{suffix})"),
            _ => format!("{prefix}{index}{suffix}"),
        };
        Ok(text)
    }

    fn fixed(&self, construct: ConstructKind, quoted: bool, delimit: bool) -> Result<String> {
        let RenderRule::Fixed(text) = self.rule(construct)? else {
            return Err(self.unsupported(construct));
        };
        if quoted && self.target == DialectKind::Fish && text.starts_with('(') {
            // Fish only substitutes `(…)` outside quotes.
            return Ok(format!("\"{text}\""));
        }
        if !delimit {
            return Ok(text.to_string());
        }
        let Some(name) = text.strip_prefix('$').filter(|name| is_identifier(name)) else {
            return Ok(text.to_string());
        };
        Ok(match self.target {
            DialectKind::Fish => format!("{text}\"\""),
            _ => format!("${{{name}}}"),
        })
    }

    fn substitution(&self, subst: &Substitution) -> Result<String> {
        if self.same_family() {
            return Ok(original_substitution(subst));
        }
        let construct = match subst.style {
            SubstitutionStyle::Dollar | SubstitutionStyle::Backtick | SubstitutionStyle::Paren => {
                ConstructKind::CommandSubstitution
            }
            SubstitutionStyle::ProcessIn => ConstructKind::ProcessSubstitutionIn,
            SubstitutionStyle::ProcessOut => ConstructKind::ProcessSubstitutionOut,
            SubstitutionStyle::Arithmetic => ConstructKind::ArithmeticExpansion,
            SubstitutionStyle::Array => ConstructKind::ArraySubexpression,
        };
        match self.rule(construct)? {
            RenderRule::Affix { prefix, suffix } => {
                Ok(format!("{prefix}{}{suffix}", subst.command))
            }
            _ => Ok(original_substitution(subst)),
        }
    }

    // ── Here-documents ──

    fn heredoc(&self, heredoc: &Heredoc, spaced: bool, out: &mut Output) -> Result<()> {
        let construct = if heredoc.quoted {
            ConstructKind::LiteralHeredoc
        } else {
            ConstructKind::ExpandableHeredoc
        };
        match self.rule(construct)? {
            RenderRule::PipedHereString { open, close } => {
                let body = self.here_string_body(&heredoc.body)?;
                let body = body.strip_suffix('\n').unwrap_or(&body);
                out.prefix_command(&format!("{open}\n{body}\n{close} | "));
                Ok(())
            }
            RenderRule::Native => {
                let delimiter = if heredoc.quoted {
                    format!("'{}'", heredoc.delimiter)
                } else {
                    heredoc.delimiter.clone()
                };
                out.push(&format!("{}{delimiter}", heredoc.operator), spaced);
                let mut body = self.heredoc_body(&heredoc.body)?;
                body.push_str(&heredoc.delimiter);
                body.push('\n');
                out.bodies.push(body);
                Ok(())
            }
            _ => Err(self.unsupported(construct)),
        }
    }

    /// A bash/zsh here-document body: only `$`, `` ` `` and `\` are special.
    fn heredoc_body(&self, body: &Segment) -> Result<String> {
        let mut out = String::new();
        match body {
            Segment::Expandable(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    match part {
                        Segment::EscapeSequence(c) => {
                            out.push('\\');
                            out.push(*c);
                        }
                        Segment::VariableRef(var) => out.push_str(&self.variable(
                            var,
                            true,
                            self.delimits(parts.get(i + 1)),
                        )?),
                        Segment::Substitution(subst) => out.push_str(&self.substitution(subst)?),
                        Segment::RawUnquoted(text) | Segment::Literal(text) => out.push_str(text),
                        Segment::Expandable(_) => {}
                    }
                }
            }
            Segment::Literal(text) | Segment::RawUnquoted(text) => out.push_str(text),
            _ => {}
        }
        Ok(out)
    }

    /// A powershell here-string body: in `@"…"@` only `$` and `` ` `` are
    /// special.
    fn here_string_body(&self, body: &Segment) -> Result<String> {
        let mut out = String::new();
        match body {
            Segment::Expandable(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    match part {
                        Segment::VariableRef(var) => out.push_str(&self.variable(
                            var,
                            true,
                            self.delimits(parts.get(i + 1)),
                        )?),
                        Segment::Substitution(subst) => out.push_str(&self.substitution(subst)?),
                        Segment::RawUnquoted(text) | Segment::Literal(text) => {
                            for c in text.chars() {
                                if matches!(c, '$' | '`') {
                                    out.push('`');
                                }
                                out.push(c);
                            }
                        }
                        Segment::EscapeSequence(c) => {
                            if matches!(c, '$' | '`') {
                                out.push('`');
                            }
                            out.push(*c);
                        }
                        Segment::Expandable(_) => {}
                    }
                }
            }
            Segment::Literal(text) | Segment::RawUnquoted(text) => out.push_str(text),
            _ => {}
        }
        Ok(out)
    }

    // ── Nested invocations ──

    fn nested(&self, nested: &NestedInvocation) -> Result<String> {
        let inner_target = if self.opts.retarget_nested {
            self.target
        } else {
            nested.dialect
        };
        let inner = Emitter::new(nested.dialect, inner_target, self.opts)
            .invocation(&nested.invocation)?;
        if nested.captures.is_empty() && !inner.chars().any(capture::is_sentinel) {
            return self.wrap_static(&inner, inner_target);
        }
        self.wrap_expandable(&inner, &nested.captures, inner_target)
    }

    /// Wrap nested text that needs no outer expansion.
    fn wrap_static(&self, inner: &str, inner_dialect: DialectKind) -> Result<String> {
        let target = self.target_rules();
        if target.is_safe_word(inner) {
            return Ok(inner.to_string());
        }
        if self.target == DialectKind::Cmd {
            return self.wrap_expandable(inner, &[], inner_dialect);
        }
        let singles = inner.matches('\'').count();
        let doubles = inner.matches('"').count();
        if inner.contains(target.variable_prefix()) || singles <= doubles {
            return Ok(quote::single_quote(inner, self.target));
        }
        self.wrap_expandable(inner, &[], inner_dialect)
    }

    /// Wrap nested text in the target's expandable quotes, restoring the
    /// captured outer expansions in place of their sentinels.
    fn wrap_expandable(
        &self,
        inner: &str,
        captures: &[Segment],
        inner_dialect: DialectKind,
    ) -> Result<String> {
        let chunks = capture::chunks(inner);
        let mut out = String::from("\"");
        for (i, chunk) in chunks.iter().enumerate() {
            match *chunk {
                Chunk::Text(text) => {
                    if self.target == DialectKind::Cmd {
                        quote::push_cmd_wrapped(&mut out, text, inner_dialect);
                    } else {
                        self.push_quoted_text(&mut out, text)?;
                    }
                }
                Chunk::Capture(index) => {
                    let delimit = match chunks.get(i + 1) {
                        Some(Chunk::Text(next)) => {
                            next.chars().next().is_some_and(|c| self.continues_name(c))
                        }
                        _ => false,
                    };
                    match captures.get(index) {
                        Some(Segment::VariableRef(var)) => {
                            out.push_str(&self.variable(var, true, delimit)?)
                        }
                        Some(Segment::Substitution(subst)) => {
                            out.push_str(&self.substitution(subst)?)
                        }
                        _ => {}
                    }
                }
            }
        }
        out.push('"');
        Ok(out)
    }
}

/// Join runs of quoted text and escaped characters that include quoted
/// text into one literal, so `'it'\''s'` is requoted as a whole.
fn merge_static(segments: &[Segment]) -> Vec<Segment> {
    let is_static = |segment: &Segment| match segment {
        Segment::Literal(_) => true,
        Segment::EscapeSequence(c) => !c.is_control(),
        _ => false,
    };
    let mut out = Vec::with_capacity(segments.len());
    let mut i = 0;
    while i < segments.len() {
        let end = segments[i..]
            .iter()
            .position(|s| !is_static(s))
            .map_or(segments.len(), |p| i + p);
        if end == i {
            out.push(segments[i].clone());
            i += 1;
            continue;
        }
        let run = &segments[i..end];
        if run.iter().any(|s| matches!(s, Segment::Literal(_))) {
            let mut text = String::new();
            for segment in run {
                match segment {
                    Segment::Literal(literal) => text.push_str(literal),
                    Segment::EscapeSequence(c) => text.push(*c),
                    _ => {}
                }
            }
            out.push(Segment::Literal(text));
        } else {
            out.extend(run.iter().cloned());
        }
        i = end;
    }
    out
}

/// A substitution in the spelling it was written with.
fn original_substitution(subst: &Substitution) -> String {
    let command = &subst.command;
    match subst.style {
        SubstitutionStyle::Dollar => format!("$({command})"),
        SubstitutionStyle::Backtick => format!("`{command}`"),
        SubstitutionStyle::Paren => format!("({command})"),
        SubstitutionStyle::ProcessIn => format!("<({command})"),
        SubstitutionStyle::ProcessOut => format!(">({command})"),
        SubstitutionStyle::Arithmetic => format!("$(({command}))"),
        SubstitutionStyle::Array => format!("@({command})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Builder;
    use crate::config::Config;
    use crate::launchers::LauncherRegistry;

    fn translate(command: &str, from: DialectKind, to: DialectKind) -> Result<String> {
        let registry = LauncherRegistry::from_config(&Config::default_config());
        let invocation = Builder::new(&registry, 8).parse(command, from)?;
        emit(&invocation, to, &EmitOptions::default())
    }

    fn ok(command: &str, from: DialectKind, to: DialectKind) -> String {
        translate(command, from, to).unwrap()
    }

    use DialectKind::{Bash, Cmd, Fish, PowerShell, Zsh};

    #[test]
    fn same_dialect_keeps_simple_commands() {
        assert_eq!(ok("ls -la | grep foo", Bash, Bash), "ls -la | grep foo");
        assert_eq!(ok("echo 'a b' \"$HOME\"", Bash, Bash), "echo 'a b' \"$HOME\"");
        assert_eq!(ok("cat *.rs ~/x", Bash, Zsh), "cat *.rs ~/x");
    }

    #[test]
    fn literals_are_quoted_only_when_needed() {
        assert_eq!(ok("echo 'plain'", Bash, Bash), "echo plain");
        assert_eq!(ok("echo ''", Bash, Bash), "echo ''");
        assert_eq!(ok("echo 'it'\\''s'", Bash, Bash), "echo \"it's\"");
        assert_eq!(ok("echo 'it'\\''s'", Bash, PowerShell), "echo 'it''s'");
        assert_eq!(ok("echo 'it'\\''s'", Bash, Fish), "echo 'it\\'s'");
    }

    #[test]
    fn expandable_strings_follow_the_target() {
        assert_eq!(
            ok("echo \"Value: $var\"", Bash, PowerShell),
            "echo \"Value: $var\""
        );
        assert_eq!(
            ok("echo \"cost: \\$5 for $item\"", Bash, PowerShell),
            "echo \"cost: `$5 for $item\""
        );
        assert_eq!(
            ok("Write-Host \"a`\"b\"", PowerShell, Bash),
            "Write-Host \"a\\\"b\""
        );
    }

    #[test]
    fn environment_variables() {
        assert_eq!(ok("echo %USERPROFILE%", Cmd, PowerShell), "echo $env:USERPROFILE");
        assert_eq!(ok("echo $env:PATH", PowerShell, Cmd), "echo %PATH%");
        assert_eq!(ok("echo $env:PATH", PowerShell, Bash), "echo $PATH");
    }

    #[test]
    fn variables_are_delimited_before_name_characters() {
        assert_eq!(ok("echo \"${x}y\"", Bash, Bash), "echo \"${x}y\"");
        assert_eq!(ok("echo \"${x}y\"", Bash, PowerShell), "echo \"${x}y\"");
        assert_eq!(ok("echo \"${x}y\"", Bash, Fish), "echo \"$x\"\"y\"");
    }

    #[test]
    fn positional_parameters_rebase() {
        assert_eq!(ok("echo $1", Bash, PowerShell), "echo $args[0]");
        assert_eq!(ok("echo \"$1\"", Bash, PowerShell), "echo \"$($args[0])\"");
        assert_eq!(ok("echo $argv[2]", Fish, Bash), "echo $2");
        assert_eq!(ok("echo %1", Cmd, Fish), "echo $argv[1]");
        assert_eq!(ok("echo $?", Bash, PowerShell), "echo $LASTEXITCODE");
    }

    #[test]
    fn unsupported_constructs_fail() {
        let err = translate("echo ${x:-d}", Bash, Fish).unwrap_err();
        assert_eq!(err.kind(), "UnsupportedConstructError");
        assert!(translate("echo $(date)", Bash, Cmd).is_err());
        assert!(translate("cat <<EOF\nhi\nEOF\n", Bash, Fish).is_err());
        assert_eq!(ok("echo ${x:-d}", Bash, Zsh), "echo ${x:-d}");
    }

    #[test]
    fn substitutions_keep_their_command() {
        assert_eq!(ok("echo $(date)", Bash, Bash), "echo $(date)");
        assert_eq!(ok("echo `date`", Bash, Zsh), "echo `date`");
        assert_eq!(ok("echo (date)", Fish, Bash), "echo $(date)");
        assert_eq!(ok("diff <(ls a) <(ls b)", Bash, Fish), "diff (ls a | psub) (ls b | psub)");
    }

    #[test]
    fn escapes_outside_quotes() {
        assert_eq!(ok("echo a\\ b", Bash, PowerShell), "echo a` b");
        assert_eq!(ok("echo a\\&b", Bash, Cmd), "echo a^&b");
        assert_eq!(ok("echo \\n", Fish, Bash), "echo $'\\n'");
        assert_eq!(ok("echo a,b", Bash, PowerShell), "echo a`,b");
    }

    #[test]
    fn cmd_literals_use_carets() {
        assert_eq!(ok("echo 'a & b'", Bash, Cmd), "echo a\" \"^&\" \"b");
        assert_eq!(ok("echo '50%'", Bash, Cmd), "echo 50^%");
        let err = translate("echo $'a\\nb'", Bash, Cmd).unwrap_err();
        assert_eq!(err.kind(), "UnsupportedConstructError");
    }

    #[test]
    fn oversized_positionals_keep_their_spelling() {
        assert_eq!(
            ok("echo $args[4294967295]", PowerShell, PowerShell),
            "echo $args[4294967295]"
        );
        assert_eq!(ok("echo ${99999999999}", Bash, Bash), "echo ${99999999999}");
        for (command, from, to) in [
            ("echo $args[4294967295]", PowerShell, Bash),
            ("echo ${99999999999}", Bash, Fish),
        ] {
            let err = translate(command, from, to).unwrap_err();
            assert_eq!(err.kind(), "UnsupportedConstructError", "{command:?}");
        }
    }

    #[test]
    fn adjacency_follows_the_source() {
        assert_eq!(
            ok("a=(1 2 3); echo \"${a[@]}\"", Bash, Bash),
            "a=(1 2 3); echo \"${a[@]}\""
        );
        assert_eq!(ok("$h = @{a=1}", PowerShell, PowerShell), "$h = @{a=1}");
        assert_eq!(ok("echo hi>out 2>&1", Bash, Bash), "echo hi>out 2>&1");
        assert_eq!(ok("make|&tee log", Bash, PowerShell), "make 2>&1 |tee log");
    }

    #[test]
    fn pipe_stderr_operator() {
        assert_eq!(ok("make |& tee log", Bash, Fish), "make &| tee log");
        assert_eq!(ok("make |& tee log", Bash, PowerShell), "make 2>&1 | tee log");
    }

    #[test]
    fn heredocs() {
        let quoted = "cat <<'EOF'\n$HOME stays\nEOF\n";
        assert_eq!(ok(quoted, Bash, Bash), quoted);
        assert_eq!(
            ok("cat <<EOF > out\nhi $USER\nEOF\n", Bash, PowerShell),
            "@\"\nhi $USER\n\"@ | cat > out\n"
        );
    }

    #[test]
    fn comments_change_marker() {
        assert_eq!(ok("ls # list files", Bash, Cmd), "ls\nrem list files");
        assert_eq!(ok("rem hello", Cmd, Bash), "#hello");
    }

    #[test]
    fn nested_wrapper_is_preserved() {
        assert_eq!(
            ok("ssh user@host 'echo \"hi\"'", Bash, Bash),
            "ssh user@host 'echo \"hi\"'"
        );
        assert_eq!(ok("bash -c ls", Bash, Bash), "bash -c ls");
    }

    #[test]
    fn nested_quote_style_follows_inner_text() {
        assert_eq!(ok("bash -c \"echo 'hi'\"", Bash, Bash), "bash -c 'echo hi'");
        assert_eq!(
            ok("bash -c 'echo \"it'\\''s\"'", Bash, Bash),
            "bash -c 'echo \"it'\\''s\"'"
        );
        assert_eq!(
            ok("bash -c 'echo $HOME'", Bash, PowerShell),
            "bash -c 'echo $HOME'"
        );
    }

    #[test]
    fn nested_escaping_compounds() {
        assert_eq!(
            ok("ssh host 'bash -c \"echo \\$HOME\"'", Bash, Bash),
            "ssh host 'bash -c '\\''echo $HOME'\\'''"
        );
    }

    #[test]
    fn captured_variables_cross_the_boundary() {
        assert_eq!(
            ok("ssh host \"tail -f $LOG\"", Bash, Bash),
            "ssh host \"tail -f $LOG\""
        );
        assert_eq!(
            ok("ssh host \"tail -f $LOG\"", Bash, PowerShell),
            "ssh host \"tail -f $LOG\""
        );
        assert_eq!(
            ok("ssh host \"cat '$F'\"", Bash, Bash),
            "ssh host \"cat '$F'\""
        );
    }

    #[test]
    fn nested_under_cmd_doubles_quotes() {
        assert_eq!(
            ok("ssh host 'echo \"hi there\"'", Bash, Cmd),
            "ssh host \"echo \"\"hi there\"\"\""
        );
    }

    #[test]
    fn retargeting_nested_commands() {
        let registry = LauncherRegistry::from_config(&Config::default_config());
        let invocation = Builder::new(&registry, 8)
            .parse("bash -c 'echo $1'", Bash)
            .unwrap();
        let opts = EmitOptions {
            retarget_nested: true,
        };
        assert_eq!(
            emit(&invocation, PowerShell, &opts).unwrap(),
            "bash -c 'echo $args[0]'"
        );
        assert_eq!(
            emit(&invocation, PowerShell, &EmitOptions::default()).unwrap(),
            "bash -c 'echo $1'"
        );
    }
}
