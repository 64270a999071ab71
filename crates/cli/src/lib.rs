pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tarifa_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "tarifa",
    about = "Tarifa fieldwork quotation CLI",
    long_about = "Distribute interviews across El Salvador, apply row overrides, and price fieldwork quotations.",
    after_help = "Examples:\n  tarifa quote --input study.json\n  tarifa distribute --input study.json --coverage amss\n  tarifa price --duration 15 --penetration media\n  tarifa config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file path (defaults to tarifa.toml)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Commissionable markup factor override")]
    commissionable: Option<Decimal>,
    #[arg(long, global = true, help = "Non-commissionable markup factor override")]
    non_commissionable: Option<Decimal>,
    #[arg(long, global = true, help = "Region registry TOML override")]
    registry: Option<PathBuf>,
    #[arg(long, global = true, help = "Log level override (trace|debug|info|warn|error)")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Rebuild a full quotation from stored inputs, changes and prior overrides")]
    Quote {
        #[arg(long, help = "Stored quotation inputs (JSON)")]
        input: PathBuf,
        #[arg(long, help = "Input changes to apply before rebuilding (JSON)")]
        changes: Option<PathBuf>,
        #[arg(long, help = "Prior row overrides (JSON array)")]
        overrides: Option<PathBuf>,
        #[arg(long, help = "Re-apply prior overrides instead of discarding them")]
        keep_overrides: bool,
    },
    #[command(about = "Compute the base distribution for a coverage mode")]
    Distribute {
        #[arg(long, help = "Quotation inputs (JSON)")]
        input: PathBuf,
        #[arg(long, help = "Coverage mode; defaults to the one in the inputs")]
        coverage: Option<String>,
    },
    #[command(about = "Merge row overrides into a computed distribution")]
    Merge {
        #[arg(long, help = "Distribution result (JSON)")]
        distribution: PathBuf,
        #[arg(long, help = "Row overrides (JSON array)")]
        overrides: PathBuf,
    },
    #[command(about = "Look up the unit ticket price for a duration and penetration")]
    Price {
        #[arg(long, help = "Interview duration in minutes")]
        duration: u32,
        #[arg(long, help = "Penetration as fraction, percentage, or alta|media|baja")]
        penetration: String,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Cli {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                commissionable: self.commissionable,
                non_commissionable: self.non_commissionable,
                registry_path: self.registry.clone(),
                log_level: self.log_level.clone(),
                log_format: None,
            },
        }
    }
}

/// Installs the stderr subscriber; stdout carries only command payloads.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    // Broken config is reported by the command itself; log with defaults meanwhile.
    let config = AppConfig::load(options.clone()).unwrap_or_default();
    init_logging(&config);

    let result = execute(cli.command, &options);
    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn execute(command: Command, options: &LoadOptions) -> commands::CommandResult {
    match command {
        Command::Quote { input, changes, overrides, keep_overrides } => commands::quote::run(
            options,
            commands::quote::QuoteArgs {
                input: &input,
                changes: changes.as_deref(),
                overrides: overrides.as_deref(),
                keep_overrides,
            },
        ),
        Command::Distribute { input, coverage } => {
            commands::distribute::run(options, &input, coverage.as_deref())
        }
        Command::Merge { distribution, overrides } => {
            commands::merge::run(options, &distribution, &overrides)
        }
        Command::Price { duration, penetration } => commands::price::run(duration, &penetration),
        Command::Config => commands::config::run(options),
    }
}
