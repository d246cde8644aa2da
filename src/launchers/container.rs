use crate::launchers::{Launch, LaunchContext, LauncherRegistry, LauncherSpec};

/// `docker exec` options that take the next word as their value.
const EXEC_VALUE_OPTIONS: &[&str] = &[
    "-e",
    "--env",
    "--env-file",
    "-u",
    "--user",
    "-w",
    "--workdir",
    "--detach-keys",
];

/// Hand the words of the command run inside the container back to the
/// registry, and re-base the launch onto this command's words.
fn nested_launch(
    ctx: &LaunchContext,
    registry: &LauncherRegistry,
    start: usize,
) -> Option<Launch> {
    let inner = registry.detect(ctx.words.get(start..)?)?;
    Some(Launch {
        arg: inner.arg + start,
        dialect: inner.dialect,
        label: format!("{} exec {}", ctx.program, inner.label),
    })
}

/// `docker exec [options] CONTAINER SHELL -c CMD` (also podman, nerdctl).
pub struct ContainerExecSpec;

impl LauncherSpec for ContainerExecSpec {
    fn detect(&self, ctx: &LaunchContext, registry: &LauncherRegistry) -> Option<Launch> {
        let mut i = match ctx.arg(0)? {
            "exec" => 1,
            "container" if ctx.arg(1)? == "exec" => 2,
            _ => return None,
        };
        loop {
            let word = ctx.arg(i)?;
            if !word.starts_with('-') {
                break;
            }
            i += if EXEC_VALUE_OPTIONS.contains(&word) { 2 } else { 1 };
        }
        // Skip the container name; args are offset by the program word.
        nested_launch(ctx, registry, i + 2)
    }
}

/// `kubectl exec [options] POD -- SHELL -c CMD` (also oc).
pub struct KubectlExecSpec;

impl LauncherSpec for KubectlExecSpec {
    fn detect(&self, ctx: &LaunchContext, registry: &LauncherRegistry) -> Option<Launch> {
        let args = ctx.args();
        let exec = args.iter().position(|w| w.as_deref() == Some("exec"))?;
        let dashes = exec + args[exec..].iter().position(|w| w.as_deref() == Some("--"))?;
        nested_launch(ctx, registry, dashes + 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dialect::DialectKind;
    use crate::launchers::test_support::words;

    fn registry() -> LauncherRegistry {
        LauncherRegistry::from_config(&Config::default_config())
    }

    #[test]
    fn docker_exec_shell() {
        let launch = registry()
            .detect(&words("docker exec -it -u root web bash -c 'ls /srv'"))
            .unwrap();
        assert_eq!(launch.arg, 8);
        assert_eq!(launch.dialect, DialectKind::Bash);
        assert_eq!(launch.label, "docker exec bash -c");
    }

    #[test]
    fn podman_container_exec() {
        let launch = registry()
            .detect(&words("podman container exec box sh -c 'id'"))
            .unwrap();
        assert_eq!(launch.arg, 6);
    }

    #[test]
    fn docker_exec_powershell() {
        let launch = registry()
            .detect(&words("docker exec win pwsh -Command 'Get-Date'"))
            .unwrap();
        assert_eq!(launch.dialect, DialectKind::PowerShell);
        assert_eq!(launch.arg, 5);
    }

    #[test]
    fn kubectl_exec_after_dashes() {
        let launch = registry()
            .detect(&words("kubectl -n prod exec -it api-0 -c app -- sh -c 'env'"))
            .unwrap();
        assert_eq!(launch.arg, 11);
        assert_eq!(launch.label, "kubectl exec sh -c");
    }

    #[test]
    fn exec_without_shell() {
        assert_eq!(registry().detect(&words("docker exec web ls /srv")), None);
        assert_eq!(registry().detect(&words("docker run img bash -c ls")), None);
        assert_eq!(registry().detect(&words("kubectl exec api-0 -- ls")), None);
    }
}
