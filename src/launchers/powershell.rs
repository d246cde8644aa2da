use crate::dialect::DialectKind;
use crate::launchers::{Launch, LaunchContext, LauncherRegistry, LauncherSpec};

/// Parameters that take the next word as their value.
const VALUE_PARAMETERS: &[&str] = &[
    "executionpolicy",
    "ep",
    "ex",
    "windowstyle",
    "w",
    "inputformat",
    "inp",
    "if",
    "outputformat",
    "o",
    "of",
    "configurationname",
    "config",
    "workingdirectory",
    "wd",
    "settingsfile",
    "psconsolefile",
    "version",
    "v",
    "custompipename",
];

/// `powershell [switches] -Command CMD`, `pwsh -c CMD`.
///
/// The command must be exactly one word; with several, powershell joins
/// them with spaces and the original quoting is ambiguous.
pub struct PowerShellSpec;

/// True when `name` abbreviates `full` (powershell accepts any unique
/// prefix of a parameter name).
fn abbreviates(name: &str, full: &str, min: usize) -> bool {
    name.len() >= min && full.starts_with(name)
}

impl LauncherSpec for PowerShellSpec {
    fn detect(&self, ctx: &LaunchContext, _registry: &LauncherRegistry) -> Option<Launch> {
        let mut i = 0;
        while i < ctx.args().len() {
            let word = ctx.arg(i)?;
            let name = word.strip_prefix('-')?.to_ascii_lowercase();
            if name == "c" || abbreviates(&name, "command", 3) {
                if i + 2 != ctx.args().len() {
                    return None;
                }
                return ctx.launch(
                    i + 1,
                    DialectKind::PowerShell,
                    format!("{} -Command", ctx.program),
                );
            }
            if name == "e"
                || name == "ec"
                || abbreviates(&name, "encodedcommand", 3)
                || name == "f"
                || abbreviates(&name, "file", 2)
            {
                return None;
            }
            i += if VALUE_PARAMETERS.contains(&name.as_str()) {
                2
            } else {
                1
            };
        }
        None
    }
}
