use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dialect::DialectKind;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Location of the user overlay, before tilde expansion.
const USER_CONFIG_PATH: &str = "~/.config/requote/config.toml";

// ── Merged configuration ──

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub settings: Settings,
    pub launchers: Launchers,
    pub wrappers: WrapperConfig,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub max_depth: usize,
    pub retarget_nested: bool,
    pub ssh_remote_dialect: DialectKind,
    pub verify: bool,
    pub history: bool,
    pub history_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_depth: 8,
            retarget_nested: false,
            ssh_remote_dialect: DialectKind::Bash,
            verify: false,
            history: false,
            history_path: String::new(),
        }
    }
}

impl Settings {
    /// History file path with `~` and environment variables expanded.
    pub fn history_file(&self) -> Option<PathBuf> {
        if self.history_path.is_empty() {
            return None;
        }
        let expanded = shellexpand::full(&self.history_path).ok()?;
        Some(PathBuf::from(expanded.as_ref()))
    }
}

/// Program names per launcher family.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Launchers {
    pub bash: Vec<String>,
    pub zsh: Vec<String>,
    pub fish: Vec<String>,
    pub powershell: Vec<String>,
    pub cmd: Vec<String>,
    pub ssh: Vec<String>,
    /// `docker exec`-style programs.
    pub container: Vec<String>,
    /// `kubectl exec … --`-style programs.
    pub kubectl: Vec<String>,
}

impl Launchers {
    fn families_mut(&mut self) -> [(&'static str, &mut Vec<String>); 8] {
        [
            ("bash", &mut self.bash),
            ("zsh", &mut self.zsh),
            ("fish", &mut self.fish),
            ("powershell", &mut self.powershell),
            ("cmd", &mut self.cmd),
            ("ssh", &mut self.ssh),
            ("container", &mut self.container),
            ("kubectl", &mut self.kubectl),
        ]
    }
}

/// Commands that run their arguments as a command, skipped when looking
/// for a launcher (`sudo bash -c …`).
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WrapperConfig {
    pub transparent: Vec<String>,
}

// ── User overlay ──

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigOverlay {
    settings: SettingsOverlay,
    launchers: LaunchersOverlay,
    wrappers: WrappersOverlay,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsOverlay {
    max_depth: Option<usize>,
    retarget_nested: Option<bool>,
    ssh_remote_dialect: Option<DialectKind>,
    verify: Option<bool>,
    history: Option<bool>,
    history_path: Option<String>,
}

/// `<family> = [...]` adds programs, `remove_<family> = [...]` drops them.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LaunchersOverlay {
    replace: bool,
    #[serde(flatten)]
    lists: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WrappersOverlay {
    replace: bool,
    transparent: Vec<String>,
    remove_transparent: Vec<String>,
}

/// Fold `add` and `remove` into `base`. `replace` discards the defaults.
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
        return;
    }
    base.retain(|item| !remove.contains(item));
    for item in add {
        if !base.contains(&item) {
            base.push(item);
        }
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl Config {
    /// The embedded defaults.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Embedded defaults with the user overlay from
    /// `~/.config/requote/config.toml` applied, when it exists.
    ///
    /// Lists extend the defaults and scalars override them. `replace = true`
    /// in a section drops its defaults; `remove_<field>` subtracts entries.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// A missing file is not an error; a malformed one is reported and
    /// ignored.
    fn load_overlay() -> Option<ConfigOverlay> {
        let path = shellexpand::tilde(USER_CONFIG_PATH);
        let content = std::fs::read_to_string(path.as_ref()).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                log::warn!("config parse error in {path}: {e}");
                None
            }
        }
    }

    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let s = overlay.settings;
        let settings = &mut self.settings;
        override_with(&mut settings.max_depth, s.max_depth);
        override_with(&mut settings.retarget_nested, s.retarget_nested);
        override_with(&mut settings.ssh_remote_dialect, s.ssh_remote_dialect);
        override_with(&mut settings.verify, s.verify);
        override_with(&mut settings.history, s.history);
        override_with(&mut settings.history_path, s.history_path);

        let LaunchersOverlay { replace, mut lists } = overlay.launchers;
        for (family, programs) in self.launchers.families_mut() {
            let add = lists.remove(family).unwrap_or_default();
            let remove = lists.remove(&format!("remove_{family}")).unwrap_or_default();
            merge_list(programs, add, &remove, replace);
        }
        for key in lists.keys() {
            log::warn!("unknown launcher family `{key}` in config");
        }

        let w = overlay.wrappers;
        merge_list(
            &mut self.wrappers.transparent,
            w.transparent,
            &w.remove_transparent,
            w.replace,
        );
    }

    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = Config::default_config();
        assert!(!config.launchers.bash.is_empty());
        assert!(!config.launchers.powershell.is_empty());
        assert!(!config.wrappers.transparent.is_empty());
    }

    #[test]
    fn default_settings() {
        let config = Config::default_config();
        assert_eq!(config.settings.max_depth, 8);
        assert!(!config.settings.retarget_nested);
        assert_eq!(config.settings.ssh_remote_dialect, DialectKind::Bash);
        assert!(!config.settings.history);
    }

    #[test]
    fn default_launchers_have_expected_programs() {
        let config = Config::default_config();
        assert!(config.launchers.bash.contains(&"sh".to_string()));
        assert!(config.launchers.powershell.contains(&"pwsh".to_string()));
        assert!(config.wrappers.transparent.contains(&"sudo".to_string()));
    }

    #[test]
    fn history_path_is_expanded() {
        let config = Config::default_config();
        let path = config.settings.history_file().unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with(".local/share/requote/history.log"));
    }

    // ── Merge semantics ──

    #[test]
    fn overlay_extends_launchers() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [launchers]
            bash = ["busybox-sh"]
        "#,
        );
        assert!(config.launchers.bash.contains(&"bash".to_string()));
        assert!(config.launchers.bash.contains(&"busybox-sh".to_string()));
    }

    #[test]
    fn overlay_removes_launcher() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [launchers]
            remove_ssh = ["ssh"]
        "#,
        );
        assert!(config.launchers.ssh.is_empty());
        assert!(config.launchers.bash.contains(&"bash".to_string()));
    }

    #[test]
    fn overlay_replace_launchers() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [launchers]
            replace = true
            bash = ["bash"]
            ssh = ["autossh"]
        "#,
        );
        assert_eq!(config.launchers.bash, vec!["bash"]);
        assert_eq!(config.launchers.ssh, vec!["autossh"]);
        assert!(config.launchers.powershell.is_empty());
    }

    #[test]
    fn overlay_replace_wrappers() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [wrappers]
            replace = true
            transparent = ["sudo"]
        "#,
        );
        assert_eq!(config.wrappers.transparent, vec!["sudo"]);
    }

    #[test]
    fn overlay_scalar_settings() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [settings]
            max_depth = 3
            ssh_remote_dialect = "pwsh"
        "#,
        );
        assert_eq!(config.settings.max_depth, 3);
        assert_eq!(config.settings.ssh_remote_dialect, DialectKind::PowerShell);
        assert!(!config.settings.retarget_nested);
    }

    #[test]
    fn overlay_no_duplicates() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [launchers]
            zsh = ["zsh"]
        "#,
        );
        let count = config.launchers.zsh.iter().filter(|s| *s == "zsh").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn empty_overlay_changes_nothing() {
        let original = Config::default_config();
        let mut config = Config::default_config();
        config.apply_overlay_str("");
        assert_eq!(config.launchers.bash, original.launchers.bash);
        assert_eq!(config.settings.max_depth, original.settings.max_depth);
    }
}
