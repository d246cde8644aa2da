//! requote: re-quotes shell commands from one dialect to another.
//!
//! A command string written for bash, zsh, fish, PowerShell or cmd is
//! tokenized under its source dialect, launcher arguments (`bash -c '…'`,
//! `ssh host '…'`, `docker exec c sh -c '…'`, `pwsh -Command "…"`,
//! `cmd /c "…"`) are parsed recursively under the dialect they run in, and
//! the tree is emitted with the quoting and escaping rules of the target
//! dialect. Nothing is executed or evaluated.
//!
//! # Architecture
//!
//! - **[`dialect`]**: static lexical rules per dialect and the translation table.
//! - **[`parse`]**: dialect-aware tokenizer producing words of classified segments.
//! - **[`launchers`]**: launcher specs that locate nested command strings.
//! - **[`ast`]**: invocation tree builder with nested parsing and a depth guard.
//! - **[`emit`]**: re-quoter for a target dialect.
//! - **[`verify`]**: optional syntax check of POSIX-family output.
//! - **[`config`]**: embedded defaults + user overlay merge.
//! - **[`logging`]**: terminal logger setup and the translation history file.

/// Invocation tree and its builder.
pub mod ast;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Dialect records and the construct translation table.
pub mod dialect;
/// Target-dialect emitter.
pub mod emit;
/// Error taxonomy.
pub mod error;
/// Launcher specs and the registry built from configuration.
pub mod launchers;
/// Stderr logger and history file.
pub mod logging;
/// Tokenizer and token types.
pub mod parse;
/// Output syntax check.
pub mod verify;

pub use dialect::DialectKind;
pub use error::{Result, TranslationError};

use ast::Builder;
use config::Config;
use emit::EmitOptions;
use launchers::LauncherRegistry;

/// Options for one translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub from: DialectKind,
    pub to: DialectKind,
    /// Maximum number of launcher boundaries crossed.
    pub max_depth: usize,
    pub retarget_nested: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            from: DialectKind::Bash,
            to: DialectKind::Bash,
            max_depth: 8,
            retarget_nested: false,
        }
    }
}

/// Result of a successful translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub output: String,
    /// Non-fatal problems, such as nested arguments that did not parse and
    /// were kept as plain words.
    pub diagnostics: Vec<TranslationError>,
}

/// A reusable translator: launcher registry plus settings.
pub struct Translator {
    registry: LauncherRegistry,
    max_depth: usize,
    retarget_nested: bool,
}

impl Translator {
    pub fn from_config(config: &Config) -> Self {
        Self {
            registry: LauncherRegistry::from_config(config),
            max_depth: config.settings.max_depth,
            retarget_nested: config.settings.retarget_nested,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_retarget_nested(mut self, retarget_nested: bool) -> Self {
        self.retarget_nested = retarget_nested;
        self
    }

    /// Parse `command` as written for `from` into its invocation tree.
    pub fn parse(
        &self,
        command: &str,
        from: DialectKind,
    ) -> Result<(ast::Invocation, Vec<TranslationError>)> {
        let mut builder = Builder::new(&self.registry, self.max_depth);
        let invocation = builder.parse(command, from)?;
        Ok((invocation, builder.into_diagnostics()))
    }

    /// Translate `command` from one dialect to another.
    pub fn translate(
        &self,
        command: &str,
        from: DialectKind,
        to: DialectKind,
    ) -> Result<Translation> {
        let (invocation, diagnostics) = self.parse(command, from)?;
        let opts = EmitOptions {
            retarget_nested: self.retarget_nested,
        };
        let output = emit::emit(&invocation, to, &opts)?;
        log::info!(
            "translated {from} -> {to}: {} nested level(s), {} diagnostic(s)",
            invocation.depth(),
            diagnostics.len()
        );
        Ok(Translation {
            output,
            diagnostics,
        })
    }
}

/// Translate with the default configuration.
///
/// This is the main entry point for tests and simple usage.
pub fn translate(
    command: &str,
    from: DialectKind,
    to: DialectKind,
    max_depth: usize,
) -> Result<String> {
    Translator::from_config(&Config::default_config())
        .with_max_depth(max_depth)
        .translate(command, from, to)
        .map(|t| t.output)
}

/// Translate with explicit options, returning diagnostics as well.
pub fn translate_with(command: &str, opts: &Options) -> Result<Translation> {
    Translator::from_config(&Config::default_config())
        .with_max_depth(opts.max_depth)
        .with_retarget_nested(opts.retarget_nested)
        .translate(command, opts.from, opts.to)
}
