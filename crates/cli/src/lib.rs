pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use skyline_core::config::{ConfigOverrides, LoadOptions, LogFormat, LoggingConfig};

#[derive(Debug, Parser)]
#[command(
    name = "skyline",
    about = "Natural-language property queries",
    long_about = "Interpret natural-language property queries into attribute filters and evaluate them against a records snapshot.",
    after_help = "Examples:\n  skyline query buildings over 100 feet in NW --records records.json\n  skyline parse commercial buildings on 17th avenue\n  skyline config"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    #[arg(long, global = true, value_name = "PATH", help = "Config file (default: skyline.toml)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "LEVEL", help = "Override logging.level")]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Interpret a query and list the ids of matching records")]
    Query(commands::query::QueryArgs),
    #[command(about = "Show the rule-based filter for a query without contacting the model")]
    Parse {
        #[arg(required = true, num_args = 1.., help = "Query text")]
        text: Vec<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

impl GlobalArgs {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides { log_level: self.log_level.clone(), ..Default::default() },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.global.load_options();

    let result = match cli.command {
        Command::Query(args) => commands::query::run(args, options),
        Command::Parse { text } => commands::parse::run(&text.join(" ")),
        Command::Config => commands::config::run(options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber on stderr; stdout carries command payloads.
/// Later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) {
    use tracing::Level;

    let log_level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
