use crate::dialect::DialectKind;
use crate::launchers::{Launch, LaunchContext, LauncherRegistry, LauncherSpec};

/// `cmd [/d] [/q] [/s] [/e:on] [/v:on] /c CMD` (or `/k`).
pub struct CmdSpec;

impl LauncherSpec for CmdSpec {
    fn detect(&self, ctx: &LaunchContext, _registry: &LauncherRegistry) -> Option<Launch> {
        for i in 0..ctx.args().len() {
            let switch = ctx.arg(i)?.to_ascii_lowercase();
            if !switch.starts_with('/') {
                return None;
            }
            if switch == "/c" || switch == "/k" {
                if i + 2 != ctx.args().len() {
                    return None;
                }
                return ctx.launch(i + 1, DialectKind::Cmd, format!("{} {switch}", ctx.program));
            }
        }
        None
    }
}
