//! Launcher specs: programs that run a nested command string.
//!
//! Each launcher family (posix shells, powershell, cmd, ssh, container
//! exec) has its own `LauncherSpec` that knows where the nested command
//! word sits among the program's arguments and which dialect it is
//! written in.

/// `cmd /c` and `cmd /k`.
pub mod cmd;
/// `docker exec`, `podman exec` and `kubectl exec --`, which hand off to a shell launcher.
pub mod container;
/// `powershell -Command` and `pwsh -c`.
pub mod powershell;
/// `bash -c`, `zsh -c`, `fish -c` and other posix shells.
pub mod shell;
/// `ssh [options] destination command`.
pub mod ssh;
/// Transparent wrappers (`sudo`, `env`, `nohup`, …) skipped before the program.
pub mod wrapper;

use std::collections::HashMap;

use crate::config::Config;
use crate::dialect::DialectKind;

/// A recognised launcher boundary within one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    /// Index of the nested command word among the command's words.
    pub arg: usize,
    /// Dialect the nested command is written in.
    pub dialect: DialectKind,
    /// Human-readable launcher form, used in diagnostics (`bash -c`).
    pub label: String,
}

/// The words of one command, starting at its program word.
#[derive(Debug)]
pub struct LaunchContext<'a> {
    /// Program basename, lowercased, without a `.exe` suffix.
    pub program: String,
    /// Static text of each word, `None` where the word holds expansions.
    pub words: &'a [Option<String>],
}

impl<'a> LaunchContext<'a> {
    pub fn new(words: &'a [Option<String>]) -> Option<Self> {
        let program = program_name(words.first()?.as_deref()?);
        Some(Self { program, words })
    }

    /// Words after the program.
    pub fn args(&self) -> &'a [Option<String>] {
        &self.words[1..]
    }

    /// Static text of argument `i`.
    pub fn arg(&self, i: usize) -> Option<&'a str> {
        self.args().get(i)?.as_deref()
    }

    /// A launch whose nested command is argument `arg`.
    pub fn launch(&self, arg: usize, dialect: DialectKind, label: String) -> Option<Launch> {
        (arg < self.args().len()).then_some(Launch {
            arg: arg + 1,
            dialect,
            label,
        })
    }
}

/// Normalize a program word: strip the directory, a `.exe` suffix and case.
pub fn program_name(word: &str) -> String {
    let base = word.rsplit(['/', '\\']).next().unwrap_or(word);
    let lower = base.to_ascii_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

/// Trait for launcher specs.
///
/// Each implementation recognises one launcher family and locates the
/// nested command word, or returns `None` when the arguments do not match
/// its pattern exactly.
pub trait LauncherSpec: Send + Sync {
    fn detect(&self, ctx: &LaunchContext, registry: &LauncherRegistry) -> Option<Launch>;
}

/// Registry of launcher specs, keyed by program name.
pub struct LauncherRegistry {
    specs: HashMap<String, Box<dyn LauncherSpec>>,
    wrappers: Vec<String>,
}

impl LauncherRegistry {
    /// Build the registry from configuration.
    pub fn from_config(config: &Config) -> Self {
        use self::{
            cmd::CmdSpec,
            container::{ContainerExecSpec, KubectlExecSpec},
            powershell::PowerShellSpec,
            shell::ShellSpec,
            ssh::SshSpec,
        };

        let mut specs: HashMap<String, Box<dyn LauncherSpec>> = HashMap::new();
        let launchers = &config.launchers;

        for name in &launchers.bash {
            specs.insert(name.clone(), Box::new(ShellSpec::new(DialectKind::Bash)));
        }
        for name in &launchers.zsh {
            specs.insert(name.clone(), Box::new(ShellSpec::new(DialectKind::Zsh)));
        }
        for name in &launchers.fish {
            specs.insert(name.clone(), Box::new(ShellSpec::new(DialectKind::Fish)));
        }
        for name in &launchers.powershell {
            specs.insert(name.clone(), Box::new(PowerShellSpec));
        }
        for name in &launchers.cmd {
            specs.insert(name.clone(), Box::new(CmdSpec));
        }
        for name in &launchers.ssh {
            specs.insert(
                name.clone(),
                Box::new(SshSpec::new(config.settings.ssh_remote_dialect)),
            );
        }
        for name in &launchers.container {
            specs.insert(name.clone(), Box::new(ContainerExecSpec));
        }
        for name in &launchers.kubectl {
            specs.insert(name.clone(), Box::new(KubectlExecSpec));
        }

        Self {
            specs,
            wrappers: config.wrappers.transparent.clone(),
        }
    }

    fn get(&self, name: &str) -> Option<&dyn LauncherSpec> {
        self.specs.get(name).map(|b| b.as_ref())
    }

    /// Find the launcher boundary in one command's words, if any.
    ///
    /// Leading transparent wrappers are skipped; the returned index is
    /// relative to `words`.
    pub fn detect(&self, words: &[Option<String>]) -> Option<Launch> {
        let mut start = 0;
        while let Some(Some(word)) = words.get(start) {
            let program = program_name(word);
            if !self.wrappers.contains(&program) {
                break;
            }
            start += 1 + wrapper::option_words(&program, &words[start + 1..]);
        }
        let ctx = LaunchContext::new(words.get(start..)?)?;
        let spec = self.get(&ctx.program)?;
        let launch = spec.detect(&ctx, self)?;
        log::debug!(
            "launcher `{}` found at word {}, nested dialect {}",
            launch.label,
            launch.arg + start,
            launch.dialect
        );
        Some(Launch {
            arg: launch.arg + start,
            ..launch
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::words;
    use super::*;

    fn registry() -> LauncherRegistry {
        LauncherRegistry::from_config(&Config::default_config())
    }

    #[test]
    fn program_names_normalized() {
        assert_eq!(program_name("/usr/bin/bash"), "bash");
        assert_eq!(program_name("C:\\Windows\\System32\\cmd.exe"), "cmd");
        assert_eq!(program_name("PWSH.EXE"), "pwsh");
    }

    #[test]
    fn detects_through_wrappers() {
        let launch = registry()
            .detect(&words("sudo -u root env FOO=1 bash -c 'echo hi'"))
            .unwrap();
        assert_eq!(launch.arg, 7);
        assert_eq!(launch.dialect, DialectKind::Bash);
        assert_eq!(launch.label, "bash -c");
    }

    #[test]
    fn unknown_program_is_not_a_launcher() {
        assert_eq!(registry().detect(&words("python -c 'print(1)'")), None);
    }

    #[test]
    fn dynamic_program_is_not_a_launcher() {
        let words = vec![None, Some("-c".to_string()), Some("ls".to_string())];
        assert_eq!(registry().detect(&words), None);
    }
}
