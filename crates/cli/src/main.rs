mod commands;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use dentbooks_engine::EngineConfig;
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// dentbooks entry calculation and normalization.
#[derive(Parser)]
#[command(
    name = "dentbooks",
    version,
    about = "dentbooks entry calculation and normalization"
)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate an entry against its form
    Calculate {
        /// Path to the form definition JSON
        #[arg(long)]
        form: PathBuf,
        /// Path to the entry values JSON array
        #[arg(long)]
        values: PathBuf,
        /// Path to the deduction overrides JSON object
        #[arg(long)]
        deductions: Option<PathBuf>,
    },

    /// Split a flat entry into its normalized tables
    Normalize {
        /// Path to the form definition JSON
        #[arg(long)]
        form: PathBuf,
        /// Path to the flat entry JSON
        #[arg(long)]
        entry: PathBuf,
    },

    /// Reassemble a flat entry from its normalized tables
    Flatten {
        /// Path to the normalized entry JSON
        #[arg(long)]
        normalized: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Calculate {
            form,
            values,
            deductions,
        } => commands::calculate::cmd_calculate(
            &form,
            &values,
            deductions.as_deref(),
            &config,
            cli.output,
            cli.quiet,
        ),
        Commands::Normalize { form, entry } => {
            commands::normalize::cmd_normalize(&form, &entry, &config, cli.output, cli.quiet)
        }
        Commands::Flatten { normalized } => {
            commands::flatten::cmd_flatten(&normalized, cli.quiet)
        }
    };

    if let Err(msg) = result {
        report_error(&msg, cli.output, cli.quiet);
        process::exit(1);
    }
}

/// Read the engine configuration, or the defaults when no file is given.
fn load_config(path: Option<&Path>) -> Result<EngineConfig, String> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let src = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let config: EngineConfig =
        toml::from_str(&src).map_err(|e| format!("invalid config in {}: {}", path.display(), e))?;
    config
        .validate()
        .map_err(|e| format!("invalid config in {}: {}", path.display(), e))?;
    tracing::debug!(path = %path.display(), "engine config loaded");
    Ok(config)
}

pub(crate) fn read_json(path: &Path) -> Result<serde_json::Value, String> {
    let src = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&src).map_err(|e| format!("invalid JSON in {}: {}", path.display(), e))
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let pretty =
        serde_json::to_string_pretty(value).map_err(|e| format!("serialization error: {}", e))?;
    println!("{}", pretty);
    Ok(())
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": msg })),
    }
}
