use requote::DialectKind::{self, Bash, Cmd, Fish, PowerShell, Zsh};
use requote::ast::{Element, Invocation};
use requote::config::Config;
use requote::parse::{Segment, Token, VarKind, tokenize};
use requote::verify;
use requote::{TranslationError, Translator};

fn translator() -> Translator {
    Translator::from_config(&Config::default_config())
}

fn translate(command: &str, from: DialectKind, to: DialectKind) -> String {
    translator()
        .translate(command, from, to)
        .unwrap_or_else(|e| panic!("{command:?} ({from} -> {to}): {e}"))
        .output
}

fn parse(command: &str, dialect: DialectKind) -> Invocation {
    translator()
        .parse(command, dialect)
        .unwrap_or_else(|e| panic!("{command:?} ({dialect}): {e}"))
        .0
}

macro_rules! translate_test {
    ($name:ident, $cmd:expr, $from:ident -> $to:ident, $expected:expr) => {
        #[test]
        fn $name() {
            assert_eq!(
                translate($cmd, $from, $to),
                $expected,
                "command: {}",
                $cmd,
            );
        }
    };
}

// ── Same-dialect ──

translate_test!(bash_pipeline, "ls -la | grep foo", Bash -> Bash, "ls -la | grep foo");
translate_test!(bash_globs, "cat *.rs ~/notes", Bash -> Zsh, "cat *.rs ~/notes");
translate_test!(
    ssh_wrapper_unchanged,
    "ssh user@host 'echo \"hi\"'",
    Bash -> Bash,
    "ssh user@host 'echo \"hi\"'"
);
translate_test!(
    docker_exec_unchanged,
    "docker exec web sh -c 'echo \"$PATH\"'",
    Bash -> Bash,
    "docker exec web sh -c 'echo \"$PATH\"'"
);

// ── Cross-dialect quoting ──

translate_test!(
    expandable_to_powershell,
    "echo \"Value: $var\"",
    Bash -> PowerShell,
    "echo \"Value: $var\""
);
translate_test!(apostrophe_to_powershell, "echo 'it'\\''s'", Bash -> PowerShell, "echo 'it''s'");
translate_test!(apostrophe_to_fish, "echo 'it'\\''s'", Bash -> Fish, "echo 'it\\'s'");
translate_test!(
    cmd_env_to_powershell,
    "echo %USERPROFILE%",
    Cmd -> PowerShell,
    "echo $env:USERPROFILE"
);
translate_test!(positional_to_powershell, "echo $1", Bash -> PowerShell, "echo $args[0]");
translate_test!(status_to_fish, "echo $?", Bash -> Fish, "echo $status");
translate_test!(pipe_stderr_to_fish, "make |& tee log", Bash -> Fish, "make &| tee log");
translate_test!(caret_escape_for_cmd, "echo 'a&b'", Bash -> Cmd, "echo a^&b");

// ── Layout ──

translate_test!(
    bash_array_assignment,
    "a=(1 2 3); echo \"${a[@]}\"",
    Bash -> Bash,
    "a=(1 2 3); echo \"${a[@]}\""
);
translate_test!(powershell_hashtable, "$h = @{a=1}", PowerShell -> PowerShell, "$h = @{a=1}");
translate_test!(redirect_without_spaces, "sort<in>out", Bash -> Bash, "sort<in>out");

// ── Oversized positionals ──

translate_test!(
    powershell_args_past_u32,
    "echo $args[4294967295]",
    PowerShell -> PowerShell,
    "echo $args[4294967295]"
);
translate_test!(
    braced_positional_past_u32,
    "echo ${99999999999}",
    Bash -> Bash,
    "echo ${99999999999}"
);

// ── Nested launchers ──

translate_test!(
    pwsh_command_to_bash,
    "pwsh -Command \"Get-ChildItem | Select-Object Name\"",
    PowerShell -> Bash,
    "pwsh -Command 'Get-ChildItem | Select-Object Name'"
);
translate_test!(
    cmd_c_to_bash,
    "cmd /c \"echo hi & echo there\"",
    Bash -> Bash,
    "cmd /c 'echo hi & echo there'"
);
translate_test!(
    escaping_compounds_per_level,
    "ssh host 'bash -c \"echo \\$HOME\"'",
    Bash -> Bash,
    "ssh host 'bash -c '\\''echo $HOME'\\'''"
);
translate_test!(
    captured_variable_crosses_boundary,
    "ssh host \"tail -f $LOG\"",
    Bash -> PowerShell,
    "ssh host \"tail -f $LOG\""
);

// ── Properties ──

const CORPUS: &[(&str, DialectKind)] = &[
    ("ls -la | grep foo", Bash),
    ("echo 'a b' \"$HOME\" \\$x", Bash),
    ("cat <<'EOF'\nhi $x\nEOF\n", Bash),
    ("FOO=1 bash -c 'echo \"$1\"'", Bash),
    ("ssh host \"tail -f $LOG\"", Bash),
    ("echo ${x:-default} $(date) `id`", Bash),
    ("for f in *.rs; do echo \"$f\"; done", Bash),
    ("echo $'tab\\there'", Zsh),
    ("echo (pwd) $argv[1] 'it\\'s'", Fish),
    ("set -x FOO bar; and echo $status", Fish),
    ("Write-Host \"Hello $env:USER\" 'it''s'", PowerShell),
    ("echo %PATH% & dir /b \"C:\\Program Files\"", Cmd),
    ("a=(1 2)", Bash),
    ("$h = @{a=1}", PowerShell),
    ("pwsh -Command \"Write-Host 'it''s' $env:X\"", PowerShell),
    ("cmd /c \"echo hi & dir\"", Cmd),
];

#[test]
fn re_emitting_at_the_source_dialect_is_idempotent() {
    for &(command, dialect) in CORPUS {
        let original = parse(command, dialect);
        let output = translate(command, dialect, dialect);
        let reparsed = parse(&output, dialect);
        assert_eq!(
            original.shape(),
            reparsed.shape(),
            "command: {command:?}\noutput: {output:?}"
        );
    }
}

/// Variable and substitution kinds, recursively, in order.
fn expansions(invocation: &Invocation) -> Vec<String> {
    fn walk(segments: &[Segment], out: &mut Vec<String>) {
        for segment in segments {
            match segment {
                Segment::VariableRef(var) => out.push(format!("{:?}", var.kind)),
                Segment::Substitution(subst) => out.push(format!("{:?}", subst.style)),
                Segment::Expandable(parts) => walk(parts, out),
                _ => {}
            }
        }
    }
    let mut out = Vec::new();
    for element in &invocation.elements {
        match element {
            Element::Word(word) => walk(&word.segments, &mut out),
            Element::Heredoc(heredoc) => walk(std::slice::from_ref(&heredoc.body), &mut out),
            Element::Nested(nested) => {
                walk(&nested.captures, &mut out);
                out.extend(expansions(&nested.invocation));
            }
            _ => {}
        }
    }
    out
}

#[test]
fn same_dialect_translation_keeps_expansions_and_nesting() {
    for &(command, dialect) in CORPUS {
        let original = parse(command, dialect);
        let output = translate(command, dialect, dialect);
        let reparsed = parse(&output, dialect);
        assert_eq!(original.depth(), reparsed.depth(), "command: {command:?}");
        assert_eq!(
            expansions(&original),
            expansions(&reparsed),
            "command: {command:?}"
        );
    }
}

#[test]
fn same_dialect_output_keeps_layout() {
    for command in ["a=(1 2)", "a=(1 2 3); echo \"${a[@]}\""] {
        let output = translate(command, Bash, Bash);
        assert_eq!(output, command);
        assert!(verify::check(&output, Bash).is_empty(), "{output:?}");
    }
    assert_eq!(translate("$h = @{a=1}", PowerShell, PowerShell), "$h = @{a=1}");
}

#[test]
fn one_launcher_stays_one_launcher_in_every_target() {
    let launchers = [
        ("bash -c 'echo hi'", Bash),
        ("ssh host 'ls -la'", Bash),
        ("docker exec web sh -c 'echo hi'", Bash),
        ("fish -c 'echo hi'", Bash),
        ("pwsh -Command \"Write-Host 'it''s' $env:X\"", PowerShell),
        ("cmd /c \"echo hi\"", Cmd),
    ];
    for (command, source) in launchers {
        assert_eq!(parse(command, source).depth(), 1, "{command:?}");
        for target in DialectKind::ALL {
            let output = translate(command, source, target);
            let reparsed = parse(&output, target);
            assert_eq!(
                reparsed.nested().count(),
                1,
                "{command:?} -> {target}: {output:?}"
            );
            assert_eq!(reparsed.depth(), 1, "{command:?} -> {target}: {output:?}");
        }
    }
}

/// Wrap `text` in bash single quotes.
fn single_quoted(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}

#[test]
fn depth_guard() {
    let mut command = "echo hi".to_string();
    for _ in 0..9 {
        command = format!("bash -c {}", single_quoted(&command));
    }

    let err = translator()
        .with_max_depth(8)
        .translate(&command, Bash, Bash)
        .unwrap_err();
    assert_eq!(err.kind(), "NestingTooDeepError");
    assert!(matches!(
        err,
        TranslationError::NestingTooDeep { depth: 9, max_depth: 8 }
    ));

    let ok = translator()
        .with_max_depth(9)
        .translate(&command, Bash, Bash);
    assert!(ok.is_ok(), "{ok:?}");
}

#[test]
fn unterminated_quote_reports_offset() {
    let err = translator()
        .translate("echo \"unterminated", Bash, PowerShell)
        .unwrap_err();
    assert_eq!(err.kind(), "UnterminatedQuoteError");
    assert_eq!(err.offset(), Some(5));
}

#[test]
fn expandable_string_survives_into_powershell() {
    let output = translate("echo \"Value: $var\"", Bash, PowerShell);
    let tokens = tokenize(&output, PowerShell.dialect()).unwrap();
    let expandables: Vec<&Vec<Segment>> = tokens
        .iter()
        .filter_map(|t| match t {
            Token::Word(word) => Some(&word.segments),
            _ => None,
        })
        .flatten()
        .filter_map(|s| match s {
            Segment::Expandable(parts) => Some(parts),
            _ => None,
        })
        .collect();
    assert_eq!(expandables.len(), 1);
    let var = expandables[0]
        .iter()
        .find_map(|p| match p {
            Segment::VariableRef(var) => Some(var),
            _ => None,
        })
        .unwrap();
    assert_eq!(var.kind, VarKind::Named("var".into()));
    assert!(output.contains("\"Value: $var\""));
}

#[test]
fn ssh_wrapper_keeps_inner_quotes() {
    let command = "ssh user@host 'echo \"hi\"'";
    assert_eq!(translate(command, Bash, Bash), command);
    let invocation = parse(command, Bash);
    let nested: Vec<_> = invocation.nested().collect();
    assert_eq!(nested.len(), 1);
    assert_eq!(nested[0].launcher, "ssh");
}

#[test]
fn unsupported_constructs_are_errors() {
    for (command, from, to) in [
        ("echo $(date)", Bash, Cmd),
        ("echo ${x:-d}", Bash, PowerShell),
        ("cat <<EOF\nhi\nEOF\n", Bash, Fish),
        ("echo $$", Bash, Cmd),
        ("echo $args[4294967295]", PowerShell, Bash),
        ("echo ${99999999999}", Bash, Fish),
    ] {
        let err = translator().translate(command, from, to).unwrap_err();
        assert_eq!(err.kind(), "UnsupportedConstructError", "{command:?} -> {to}");
    }
}

#[test]
fn unknown_dialect_name() {
    let err = "tcsh".parse::<DialectKind>().unwrap_err();
    assert_eq!(err.kind(), "UnknownDialectError");
}
