//! Dialect translation table: how each construct kind is spelled in each
//! target dialect.

use std::fmt;

use serde::Serialize;

use super::DialectKind;
use crate::error::TranslationError;

/// A construct the emitter may need to render in a target dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstructKind {
    LiteralQuote,
    ExpandableQuote,
    Escape,
    Variable,
    EnvironmentVariable,
    PositionalParameter,
    ScriptName,
    AllArguments,
    ArgumentCount,
    LastStatus,
    ProcessId,
    ParameterModifier,
    SpecialParameter,
    CommandSubstitution,
    ProcessSubstitutionIn,
    ProcessSubstitutionOut,
    ArithmeticExpansion,
    ArraySubexpression,
    LiteralHeredoc,
    ExpandableHeredoc,
    ControlCharacter,
}

impl ConstructKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstructKind::LiteralQuote => "literal quote",
            ConstructKind::ExpandableQuote => "expandable quote",
            ConstructKind::Escape => "escape",
            ConstructKind::Variable => "variable reference",
            ConstructKind::EnvironmentVariable => "environment variable",
            ConstructKind::PositionalParameter => "positional parameter",
            ConstructKind::ScriptName => "script name parameter",
            ConstructKind::AllArguments => "all-arguments parameter",
            ConstructKind::ArgumentCount => "argument count parameter",
            ConstructKind::LastStatus => "last exit status",
            ConstructKind::ProcessId => "process id parameter",
            ConstructKind::ParameterModifier => "parameter expansion modifier",
            ConstructKind::SpecialParameter => "special parameter",
            ConstructKind::CommandSubstitution => "command substitution",
            ConstructKind::ProcessSubstitutionIn => "input process substitution",
            ConstructKind::ProcessSubstitutionOut => "output process substitution",
            ConstructKind::ArithmeticExpansion => "arithmetic expansion",
            ConstructKind::ArraySubexpression => "array subexpression",
            ConstructKind::LiteralHeredoc => "literal here-document",
            ConstructKind::ExpandableHeredoc => "expandable here-document",
            ConstructKind::ControlCharacter => "control character",
        }
    }
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the emitter spells a construct in the target dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderRule {
    /// The target spells it exactly like the source.
    Native,
    /// Surround the content: quotes, `$(`…`)`, `%`…`%`.
    Affix {
        prefix: &'static str,
        suffix: &'static str,
    },
    /// A positional index rendered between affixes, rebased so the first
    /// argument is `base`.
    Indexed {
        prefix: &'static str,
        suffix: &'static str,
        base: u32,
    },
    /// A fixed spelling that replaces the construct.
    Fixed(&'static str),
    /// No quoting construct: escape every special character with the
    /// dialect escape character.
    CaretEscape,
    /// Feed the body to the command through a piped here-string.
    PipedHereString {
        open: &'static str,
        close: &'static str,
    },
}

struct TranslationEntry {
    construct: ConstructKind,
    target: DialectKind,
    rule: RenderRule,
}

const fn entry(
    construct: ConstructKind,
    target: DialectKind,
    rule: RenderRule,
) -> TranslationEntry {
    TranslationEntry {
        construct,
        target,
        rule,
    }
}

const fn affix(prefix: &'static str, suffix: &'static str) -> RenderRule {
    RenderRule::Affix { prefix, suffix }
}

use self::ConstructKind as K;
use super::DialectKind::{Bash, Cmd, Fish, PowerShell, Zsh};

static TABLE: &[TranslationEntry] = &[
    // Quoting
    entry(K::LiteralQuote, Bash, affix("'", "'")),
    entry(K::LiteralQuote, Zsh, affix("'", "'")),
    entry(K::LiteralQuote, Fish, affix("'", "'")),
    entry(K::LiteralQuote, PowerShell, affix("'", "'")),
    entry(K::LiteralQuote, Cmd, RenderRule::CaretEscape),
    entry(K::ExpandableQuote, Bash, affix("\"", "\"")),
    entry(K::ExpandableQuote, Zsh, affix("\"", "\"")),
    entry(K::ExpandableQuote, Fish, affix("\"", "\"")),
    entry(K::ExpandableQuote, PowerShell, affix("\"", "\"")),
    entry(K::ExpandableQuote, Cmd, affix("\"", "\"")),
    entry(K::Escape, Bash, affix("\\", "")),
    entry(K::Escape, Zsh, affix("\\", "")),
    entry(K::Escape, Fish, affix("\\", "")),
    entry(K::Escape, PowerShell, affix("`", "")),
    entry(K::Escape, Cmd, affix("^", "")),
    // Variables
    entry(K::Variable, Bash, affix("$", "")),
    entry(K::Variable, Zsh, affix("$", "")),
    entry(K::Variable, Fish, affix("$", "")),
    entry(K::Variable, PowerShell, affix("$", "")),
    entry(K::Variable, Cmd, affix("%", "%")),
    entry(K::EnvironmentVariable, Bash, affix("$", "")),
    entry(K::EnvironmentVariable, Zsh, affix("$", "")),
    entry(K::EnvironmentVariable, Fish, affix("$", "")),
    entry(K::EnvironmentVariable, PowerShell, affix("$env:", "")),
    entry(K::EnvironmentVariable, Cmd, affix("%", "%")),
    entry(
        K::PositionalParameter,
        Bash,
        RenderRule::Indexed {
            prefix: "$",
            suffix: "",
            base: 1,
        },
    ),
    entry(
        K::PositionalParameter,
        Zsh,
        RenderRule::Indexed {
            prefix: "$",
            suffix: "",
            base: 1,
        },
    ),
    entry(
        K::PositionalParameter,
        Fish,
        RenderRule::Indexed {
            prefix: "$argv[",
            suffix: "]",
            base: 1,
        },
    ),
    entry(
        K::PositionalParameter,
        PowerShell,
        RenderRule::Indexed {
            prefix: "$args[",
            suffix: "]",
            base: 0,
        },
    ),
    entry(
        K::PositionalParameter,
        Cmd,
        RenderRule::Indexed {
            prefix: "%",
            suffix: "",
            base: 1,
        },
    ),
    entry(K::ScriptName, Bash, RenderRule::Fixed("$0")),
    entry(K::ScriptName, Zsh, RenderRule::Fixed("$0")),
    entry(K::ScriptName, Fish, RenderRule::Fixed("(status filename)")),
    entry(K::ScriptName, PowerShell, RenderRule::Fixed("$PSCommandPath")),
    entry(K::ScriptName, Cmd, RenderRule::Fixed("%0")),
    entry(K::AllArguments, Bash, RenderRule::Fixed("$@")),
    entry(K::AllArguments, Zsh, RenderRule::Fixed("$@")),
    entry(K::AllArguments, Fish, RenderRule::Fixed("$argv")),
    entry(K::AllArguments, PowerShell, RenderRule::Fixed("$args")),
    entry(K::AllArguments, Cmd, RenderRule::Fixed("%*")),
    entry(K::ArgumentCount, Bash, RenderRule::Fixed("$#")),
    entry(K::ArgumentCount, Zsh, RenderRule::Fixed("$#")),
    entry(K::ArgumentCount, Fish, RenderRule::Fixed("(count $argv)")),
    entry(K::ArgumentCount, PowerShell, RenderRule::Fixed("$($args.Count)")),
    entry(K::LastStatus, Bash, RenderRule::Fixed("$?")),
    entry(K::LastStatus, Zsh, RenderRule::Fixed("$?")),
    entry(K::LastStatus, Fish, RenderRule::Fixed("$status")),
    entry(K::LastStatus, PowerShell, RenderRule::Fixed("$LASTEXITCODE")),
    entry(K::LastStatus, Cmd, RenderRule::Fixed("%ERRORLEVEL%")),
    entry(K::ProcessId, Bash, RenderRule::Fixed("$$")),
    entry(K::ProcessId, Zsh, RenderRule::Fixed("$$")),
    entry(K::ProcessId, Fish, RenderRule::Fixed("$fish_pid")),
    entry(K::ProcessId, PowerShell, RenderRule::Fixed("$PID")),
    // Substitutions
    entry(K::CommandSubstitution, Bash, affix("$(", ")")),
    entry(K::CommandSubstitution, Zsh, affix("$(", ")")),
    entry(K::CommandSubstitution, Fish, affix("$(", ")")),
    entry(K::CommandSubstitution, PowerShell, affix("$(", ")")),
    entry(K::ProcessSubstitutionIn, Bash, affix("<(", ")")),
    entry(K::ProcessSubstitutionIn, Zsh, affix("<(", ")")),
    entry(K::ProcessSubstitutionIn, Fish, affix("(", " | psub)")),
    entry(K::ProcessSubstitutionOut, Bash, affix(">(", ")")),
    entry(K::ProcessSubstitutionOut, Zsh, affix(">(", ")")),
    entry(K::ArithmeticExpansion, Bash, affix("$((", "))")),
    entry(K::ArithmeticExpansion, Zsh, affix("$((", "))")),
    entry(K::ArraySubexpression, PowerShell, affix("@(", ")")),
    // Here-documents
    entry(K::LiteralHeredoc, Bash, RenderRule::Native),
    entry(K::LiteralHeredoc, Zsh, RenderRule::Native),
    entry(
        K::LiteralHeredoc,
        PowerShell,
        RenderRule::PipedHereString { open: "@'", close: "'@" },
    ),
    entry(K::ExpandableHeredoc, Bash, RenderRule::Native),
    entry(K::ExpandableHeredoc, Zsh, RenderRule::Native),
    entry(
        K::ExpandableHeredoc,
        PowerShell,
        RenderRule::PipedHereString { open: "@\"", close: "\"@" },
    ),
    // Control characters outside quotes
    entry(K::ControlCharacter, Bash, affix("$'\\", "'")),
    entry(K::ControlCharacter, Zsh, affix("$'\\", "'")),
    entry(K::ControlCharacter, Fish, affix("\\", "")),
    entry(K::ControlCharacter, PowerShell, affix("\"`", "\"")),
];

/// Find the rule for rendering `construct`, parsed under `source`, in
/// `target`.
///
/// Bash and zsh pass every construct through to each other unchanged.
/// Constructs with no table entry (modifiers, special parameters) only
/// survive within their own dialect family.
pub fn lookup(
    construct: ConstructKind,
    source: DialectKind,
    target: DialectKind,
) -> Result<RenderRule, TranslationError> {
    if let Some(found) = TABLE
        .iter()
        .find(|e| e.construct == construct && e.target == target)
    {
        return Ok(found.rule);
    }
    if source == target || (source.is_posix_family() && target.is_posix_family()) {
        return Ok(RenderRule::Native);
    }
    Err(TranslationError::UnsupportedConstruct {
        construct,
        from: source,
        to: target,
    })
}
