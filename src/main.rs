//! requote: re-quote a shell command for another shell.
//!
//! Reads the command from the argument or stdin, writes the translated
//! command to stdout.
//!
//! Exit codes:
//!   0  translated
//!   1  translation error (message on stderr, or a JSON object with --json)
//!   2  --verify found problems in the output

use std::io::Read;

use clap::Parser;
use requote::config::Config;
use requote::{DialectKind, Translator, logging, verify};

#[derive(Parser)]
#[command(name = "requote")]
#[command(about = "Re-quote shell commands across bash, zsh, fish, PowerShell and cmd")]
#[command(version)]
struct Cli {
    /// Dialect the command is written in
    #[arg(long, value_enum, default_value_t = DialectKind::Bash)]
    from: DialectKind,

    /// Dialect to emit
    #[arg(long, value_enum)]
    to: Option<DialectKind>,

    /// Maximum number of nested launcher levels
    #[arg(long)]
    max_depth: Option<usize>,

    /// Emit nested commands in the target dialect too
    #[arg(long)]
    retarget_nested: bool,

    /// Syntax-check bash/zsh output
    #[arg(long)]
    verify: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the merged configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// Command to translate (read from stdin when omitted)
    command: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = Config::load();

    if cli.dump_config {
        match toml::to_string_pretty(&config) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("cannot serialize config: {e}");
                std::process::exit(1);
            }
        }
        std::process::exit(0);
    }

    let Some(to) = cli.to else {
        eprintln!("error: --to <dialect> is required");
        std::process::exit(1);
    };

    let command = match cli.command {
        Some(command) => command,
        None => {
            let mut input = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut input) {
                eprintln!("failed to read stdin: {e}");
                std::process::exit(1);
            }
            // A trailing newline from `echo … |` is not part of the command.
            input.strip_suffix('\n').unwrap_or(&input).to_string()
        }
    };

    let translator = Translator::from_config(&config)
        .with_max_depth(cli.max_depth.unwrap_or(config.settings.max_depth))
        .with_retarget_nested(cli.retarget_nested || config.settings.retarget_nested);
    let result = translator
        .translate(&command, cli.from, to)
        .map(|translation| {
            for diagnostic in &translation.diagnostics {
                log::warn!("{diagnostic}");
            }
            translation
        });

    if config.settings.history
        && let Some(path) = config.settings.history_file()
    {
        let record = result.as_ref().map(|t| t.output.clone()).map_err(Clone::clone);
        logging::log_translation(&path, cli.from, to, &command, &record);
    }

    let translation = match result {
        Ok(translation) => translation,
        Err(e) => {
            if cli.json {
                let output = serde_json::json!({ "error": e.report() });
                println!("{output}");
            } else {
                eprintln!("error: {e}");
            }
            std::process::exit(1);
        }
    };

    let issues = if cli.verify || config.settings.verify {
        verify::check(&translation.output, to)
    } else {
        Vec::new()
    };

    if cli.json {
        let diagnostics: Vec<_> = translation.diagnostics.iter().map(|d| d.report()).collect();
        let output = serde_json::json!({
            "output": translation.output,
            "diagnostics": diagnostics,
            "issues": issues,
        });
        println!("{output}");
    } else {
        println!("{}", translation.output);
        for issue in &issues {
            match issue.offset {
                Some(offset) => eprintln!("verify: {} (byte {offset})", issue.message),
                None => eprintln!("verify: {}", issue.message),
            }
        }
    }

    if !issues.is_empty() {
        std::process::exit(2);
    }
}
