use crate::dialect::DialectKind;
use crate::launchers::{Launch, LaunchContext, LauncherRegistry, LauncherSpec};

/// Posix-style shell launcher: `bash -c CMD`, `sh -ec CMD`, `zsh -lc CMD`,
/// `fish --command CMD`.
pub struct ShellSpec {
    dialect: DialectKind,
}

impl ShellSpec {
    pub fn new(dialect: DialectKind) -> Self {
        Self { dialect }
    }

    /// Short flags whose value is the next word.
    fn value_flags(&self) -> &'static [char] {
        match self.dialect {
            DialectKind::Fish => &['C', 'd', 'o', 'f'],
            _ => &['o', 'O'],
        }
    }

    /// Long options whose value is the next word.
    fn value_options(&self) -> &'static [&'static str] {
        match self.dialect {
            DialectKind::Fish => &["init-command", "debug", "debug-output", "features"],
            _ => &["rcfile", "init-file"],
        }
    }
}

impl LauncherSpec for ShellSpec {
    fn detect(&self, ctx: &LaunchContext, _registry: &LauncherRegistry) -> Option<Launch> {
        let label = format!("{} -c", ctx.program);
        let mut i = 0;
        while i < ctx.args().len() {
            let word = ctx.arg(i)?;
            let is_flag = (word.starts_with('-') || word.starts_with('+')) && word.len() > 1;
            if word == "--" || word == "-" || !is_flag {
                // A script path or `--`: no inline command.
                return None;
            }
            if let Some(long) = word.strip_prefix("--") {
                if long == "command" {
                    return ctx.launch(i + 1, self.dialect, label);
                }
                i += if self.value_options().contains(&long) { 2 } else { 1 };
                continue;
            }
            let flags = &word[1..];
            let values = flags
                .chars()
                .filter(|c| self.value_flags().contains(c))
                .count();
            if word.starts_with('-') && flags.contains('c') {
                return ctx.launch(i + 1 + values, self.dialect, label);
            }
            i += 1 + values;
        }
        None
    }
}
