//! Configuration commands for chega-check
//! Provides `chega-check config init` and `chega-check config validate` subcommands.

use anyhow::Result;
use std::path::Path;
use std::process::ExitCode;

use chega_check::config::{ChegaConfig, CONFIG_FILE};
use chega_check::output::{ChegaOutput, OutputFormat, Palette};

/// Config subcommand action
#[derive(Debug, Clone)]
pub enum ConfigAction {
    Init { force: bool },
    Validate,
}

/// Run the config command
pub fn run(
    root: &Path,
    action: ConfigAction,
    format: OutputFormat,
    palette: Palette,
) -> Result<ExitCode> {
    match action {
        ConfigAction::Init { force } => run_init(root, force, format, palette),
        ConfigAction::Validate => run_validate(root, format, palette),
    }
}

/// Create default .chega-check.toml in the project root
fn run_init(root: &Path, force: bool, format: OutputFormat, palette: Palette) -> Result<ExitCode> {
    let path = root.join(CONFIG_FILE);

    if path.exists() && !force {
        if format == OutputFormat::Json {
            let output = ChegaOutput::new("config init")
                .with_success(false)
                .with_data(serde_json::json!({
                    "error": "Config file already exists",
                    "path": path.display().to_string(),
                    "hint": "Use --force to overwrite"
                }));
            println!("{}", output.to_json()?);
        } else {
            println!(
                "{} {} already exists",
                palette.red("Error:"),
                palette.cyan(CONFIG_FILE)
            );
            println!("Use {} to overwrite.", palette.cyan("--force"));
        }
        return Ok(ExitCode::from(1));
    }

    let config = ChegaConfig::create_default(&path)?;

    if format == OutputFormat::Json {
        let output = ChegaOutput::new("config init")
            .with_success(true)
            .with_data(serde_json::json!({
                "path": path.display().to_string(),
                "created": true,
                "config": config
            }));
        println!("{}", output.to_json()?);
    } else {
        println!("{} Created {}", palette.green("✓"), palette.cyan(CONFIG_FILE));
        println!();
        println!("You can customize:");
        println!("  • {} - Where reports are written", palette.cyan("[report]"));
        println!(
            "  • {} - Required variables, .gitignore patterns, tools, disabled groups",
            palette.cyan("[audit]")
        );
        println!("  • {} - Subprocess timeouts", palette.cyan("[timeouts]"));
        println!("  • {} - Ports and URLs to probe", palette.cyan("[liveness]"));
    }

    Ok(ExitCode::SUCCESS)
}

/// Validate the configuration file
fn run_validate(root: &Path, format: OutputFormat, palette: Palette) -> Result<ExitCode> {
    let path = root.join(CONFIG_FILE);

    if !path.exists() {
        if format == OutputFormat::Json {
            let output = ChegaOutput::new("config validate")
                .with_success(false)
                .with_data(serde_json::json!({
                    "error": "Config file not found",
                    "path": path.display().to_string(),
                    "hint": "Run `chega-check config init` to create one"
                }));
            println!("{}", output.to_json()?);
        } else {
            println!("{} {} not found", palette.red("Error:"), palette.cyan(CONFIG_FILE));
            println!("Run {} to create one.", palette.cyan("chega-check config init"));
        }
        return Ok(ExitCode::from(1));
    }

    let outcome = ChegaConfig::load_from(&path).and_then(|config| {
        config.validate()?;
        Ok(config)
    });

    match outcome {
        Ok(config) => {
            if format == OutputFormat::Json {
                let output = ChegaOutput::new("config validate")
                    .with_success(true)
                    .with_data(serde_json::json!({
                        "path": path.display().to_string(),
                        "valid": true,
                        "disabled_groups": config.audit.disabled,
                        "ports": config.liveness.ports.len()
                    }));
                println!("{}", output.to_json()?);
            } else {
                println!("{} {} is valid", palette.green("✓"), palette.cyan(CONFIG_FILE));
                if !config.audit.disabled.is_empty() {
                    println!();
                    println!(
                        "  {} disabled groups: {}",
                        config.audit.disabled.len(),
                        palette.dimmed(&config.audit.disabled.join(", "))
                    );
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if format == OutputFormat::Json {
                let output = ChegaOutput::new("config validate")
                    .with_success(false)
                    .with_data(serde_json::json!({
                        "path": path.display().to_string(),
                        "valid": false,
                        "error": e.to_string()
                    }));
                println!("{}", output.to_json()?);
            } else {
                println!(
                    "{} {} has errors",
                    palette.red("✗"),
                    palette.cyan(CONFIG_FILE)
                );
                println!("  {}", e);
            }
            Ok(ExitCode::from(1))
        }
    }
}
