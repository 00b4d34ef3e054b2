use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use chega_check::checks::CheckGroup;
use chega_check::error::ChegaError;
use chega_check::output::{OutputFormat, Palette};
use commands::config::ConfigAction;

/// chega-check - structural audit and liveness checks for the Leidy Cleaner project
#[derive(Parser, Debug)]
#[command(name = "chega-check")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: String,

    /// Project root to inspect (defaults to the current directory)
    #[arg(long, global = true, env = "CHEGA_ROOT")]
    root: Option<PathBuf>,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Audit the project tree and write a report (exit 1 if any check fails)
    Audit {
        /// Only run one check group
        #[arg(short, long, value_enum)]
        group: Option<CheckGroup>,
    },

    /// Probe whether the application is running right now
    Live,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create default .chega-check.toml configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Validate configuration file
    Validate,
}

/// Initialize the tracing subscriber for logging.
///
/// `--debug` forces debug level; otherwise `RUST_LOG` applies, defaulting to warnings.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("chega_check=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chega_check=warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf, ChegaError> {
    let root = match root {
        Some(path) => path,
        None => std::env::current_dir().map_err(|_| ChegaError::ProjectRootMissing {
            path: PathBuf::from("."),
        })?,
    };

    if !root.is_dir() {
        return Err(ChegaError::ProjectRootMissing { path: root });
    }
    Ok(root.canonicalize().unwrap_or(root))
}

fn dispatch(command: Commands, root: &Path, format: OutputFormat, palette: Palette) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Audit { group } => commands::audit::run(root, group, format, palette),
        Commands::Live => commands::live::run(root, format, palette),
        Commands::Config { action } => {
            let config_action = match action {
                ConfigCommands::Init { force } => ConfigAction::Init { force },
                ConfigCommands::Validate => ConfigAction::Validate,
            };
            commands::config::run(root, config_action, format, palette)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    tracing::debug!("chega-check starting with args: {:?}", cli);

    let format = OutputFormat::from_str(&cli.format);
    let is_json = format == OutputFormat::Json;
    let palette = Palette::detect(cli.no_color);

    let result = resolve_root(cli.root)
        .map_err(anyhow::Error::from)
        .and_then(|root| dispatch(cli.command, &root, format, palette));

    match result {
        Ok(code) => code,
        Err(e) => {
            if is_json {
                let error_output = serde_json::json!({
                    "success": false,
                    "error": format!("{:#}", e),
                    "timestamp": chrono::Utc::now().to_rfc3339()
                });
                eprintln!("{}", serde_json::to_string_pretty(&error_output).unwrap_or_default());
            } else if palette.is_enabled() {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::from(1)
        }
    }
}
