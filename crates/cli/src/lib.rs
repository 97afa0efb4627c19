//! Command-line front end for the Lua raw-op stub generator.
//!
//! Parses arguments, installs logging, loads inputs and writes (or checks)
//! the generated module. The process entry point only maps [`run`]'s status
//! to an exit code.

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod config;
mod generate;

pub use config::{ConfigFile, DEFAULT_CONFIG_FILE, Settings};
pub use generate::GenerateArgs;

/// Environment variable holding a log level or a full filter spec.
pub const LOG_ENV: &str = "TFL_OPGEN_LOG";

const LOG_TARGETS: [&str; 2] = ["tfl_opgen_core", "tfl_opgen_cli"];

#[derive(Parser)]
#[command(
    name = "tfl-opgen",
    version,
    about = "Generate Lua raw-op stubs from a TensorFlow operation registry"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate (or check) the raw ops module
    Generate(GenerateArgs),
}

/// Run the CLI with `args` (program name first) and return the exit status.
pub fn run(args: Vec<String>) -> i32 {
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Generate(args)) => {
                init_tracing(args.verbose);
                generate::run(&args)
            }
            None => {
                let mut cmd = Cli::command();
                let _ = cmd.print_help();
                println!();
                0
            }
        },
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

fn init_tracing(verbose: bool) {
    // TFL_OPGEN_LOG controls log level: "trace", "debug", "info", "warn", "error"
    // or a full tracing filter spec like "tfl_opgen_core=trace"
    let filter = match std::env::var(LOG_ENV) {
        _ if verbose => level_filter("debug"),
        Ok(level) if is_plain_level(&level) => level_filter(&level),
        Ok(spec) => spec,
        Err(_) => level_filter("info"),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already initialized");
    }
}

fn level_filter(level: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
