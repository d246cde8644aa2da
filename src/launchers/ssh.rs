use crate::dialect::DialectKind;
use crate::launchers::{Launch, LaunchContext, LauncherRegistry, LauncherSpec};

/// Single-letter ssh options that take a value.
const VALUE_FLAGS: &str = "BbcDEeFIiJLlmOoPpQRSWw";

/// `ssh [options] destination CMD`.
///
/// The remote shell is unknown, so the nested dialect comes from
/// configuration. The command must be exactly one word: ssh joins several
/// with spaces, which loses the original word boundaries.
pub struct SshSpec {
    dialect: DialectKind,
}

impl SshSpec {
    pub fn new(dialect: DialectKind) -> Self {
        Self { dialect }
    }
}

impl LauncherSpec for SshSpec {
    fn detect(&self, ctx: &LaunchContext, _registry: &LauncherRegistry) -> Option<Launch> {
        let mut i = 0;
        while i < ctx.args().len() {
            let word = ctx.arg(i)?;
            if word == "--" {
                i += 1;
                break;
            }
            let Some(flags) = word.strip_prefix('-').filter(|f| !f.is_empty()) else {
                break;
            };
            // `-p22` carries its value; `-p 22` takes the next word.
            let mut takes_next = false;
            for (pos, flag) in flags.char_indices() {
                if VALUE_FLAGS.contains(flag) {
                    takes_next = pos + flag.len_utf8() == flags.len();
                    break;
                }
            }
            i += if takes_next { 2 } else { 1 };
        }
        // Destination, then the command word.
        let command = i + 1;
        if command + 1 != ctx.args().len() {
            return None;
        }
        ctx.launch(command, self.dialect, ctx.program.clone())
    }
}
