//! CLI command implementations
//!
//! This module contains the implementation for each CLI command.

use crate::graph::Transaction;
use crate::{Config, Error, Result, cli::Cli};
use std::path::{Path, PathBuf};

/// Read a JSON trace: either a bare array or an object with a `transactions` array
pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::custom(format!("Failed to read trace {:?}: {}", path, e)))?;
    parse_transactions(&contents)
}

fn parse_transactions(contents: &str) -> Result<Vec<Transaction>> {
    let value: serde_json::Value = serde_json::from_str(contents)?;
    let list = match value {
        serde_json::Value::Array(list) => serde_json::Value::Array(list),
        serde_json::Value::Object(mut object) => object
            .remove("transactions")
            .ok_or_else(|| Error::custom("Trace object has no `transactions` field"))?,
        _ => return Err(Error::custom("Trace must be an array or an object")),
    };
    Ok(serde_json::from_value(list)?)
}

/// Default output name: the current UTC time
fn timestamp_name() -> String {
    chrono::Utc::now().format("%Y%m%d%H%M%S").to_string()
}

/// Render command implementation
pub mod render {
    use super::*;
    use crate::cli::{Commands, OutputFormat, render_overrides};

    /// Execute the render command
    pub fn execute(args: Cli, mut config: Config) -> Result<()> {
        let (input, name, format, stdout, overrides) = match args.command {
            Commands::Render {
                input,
                name,
                folder,
                direction,
                chart,
                storage,
                show_origin,
                no_styles,
                standard_codes,
                format,
                stdout,
            } => {
                if standard_codes {
                    config.codes.standard = true;
                }
                (
                    input,
                    name,
                    format,
                    stdout,
                    render_overrides(folder, direction, chart, storage, show_origin, no_styles),
                )
            }
            _ => unreachable!("render::execute called with wrong command"),
        };

        tracing::info!("Loading trace from {:?}", input);
        let transactions = load_transactions(&input)?;
        tracing::info!("Found {} transactions", transactions.len());

        let graph = config.build_graph(&overrides)?;

        // printing alone does not touch the disk unless a name was given
        let name = match (name, stdout) {
            (Some(name), _) => Some(name),
            (None, true) => None,
            (None, false) => Some(timestamp_name()),
        };
        let rendered = graph.render_detailed(&transactions, name.as_deref(), None)?;

        match format {
            OutputFormat::Json => {
                crate::cli::output::output_json(&mut std::io::stdout(), &rendered)?;
            }
            OutputFormat::Markdown if stdout => {
                crate::cli::output::output_markdown(&mut std::io::stdout(), &rendered)?;
            }
            OutputFormat::Markdown => {
                if let Some(path) = &rendered.path {
                    println!("{}", path.display());
                }
            }
        }

        Ok(())
    }
}

/// Config validate command implementation
pub mod config_validate {
    use super::*;

    /// Execute the config-validate command
    pub fn execute(config_path: PathBuf) -> Result<()> {
        tracing::info!("Validating config: {:?}", config_path);

        let config = match Config::from_file(&config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load config: {}", e);
                return Err(e);
            }
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if let Err(e) = config.validate() {
            errors.push(e.to_string());
        }
        if config.graph.folder.as_ref().is_some_and(|f| f.as_os_str().is_empty()) {
            errors.push("Output folder cannot be empty".to_string());
        }
        if let Some(aliases) = &config.graph.address_map {
            for (address, alias) in aliases.iter() {
                if alias.is_empty() {
                    warnings.push(format!("Empty alias for {}", address));
                }
            }
        }
        if tracing_subscriber::EnvFilter::try_new(&config.logging.level).is_err() {
            warnings.push(format!("Unrecognized log level {:?}", config.logging.level));
        }

        println!("📋 Config Validation Report");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("File: {:?}", config_path);
        println!();
        println!("Graph:");
        if let Some(chart) = config.graph.chart_type {
            println!("  Chart: {}", chart);
        }
        if let Some(storage) = config.graph.display_storage {
            println!("  Storage: {:?}", storage);
        }
        if let Some(aliases) = &config.graph.address_map {
            println!("  Aliases: {}", aliases.len());
        }
        println!();
        println!("Table:");
        println!("  Line length: {:?}", config.table.line_len.map(|l| l.as_option()));
        println!(
            "  Max display length: {:?}",
            config.table.max_display_len.map(|l| l.as_option())
        );
        println!("  Hash: {}", config.table.hash.label());
        println!();
        println!("Standard codes: {}", config.codes.standard);
        println!("CBOR storage addresses: {}", config.storage.cbor.len());
        for address in &config.storage.cbor {
            println!("    - {}", address);
        }
        println!();

        if !errors.is_empty() {
            println!("❌ Errors:");
            for error in &errors {
                println!("   {}", error);
            }
            println!();
        }

        if !warnings.is_empty() {
            println!("⚠️  Warnings:");
            for warning in &warnings {
                println!("   {}", warning);
            }
            println!();
        }

        if errors.is_empty() {
            println!("✅ Config is valid!");
            Ok(())
        } else {
            println!("❌ Config validation failed with {} error(s)", errors.len());
            Err(Error::config("Config validation failed"))
        }
    }
}
