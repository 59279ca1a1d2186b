//! Transaction Graph Visualizer

use clap::Parser;
use tx_graph_viz::{Config, Result, VERSION, cli, init_logging};

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let source = args.config.clone().or_else(Config::find);
    let config = Config::load(source.as_deref())?;

    // CLI level beats the config file, RUST_LOG beats both
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level);

    tracing::info!("Transaction Graph Visualizer v{}", VERSION);
    match &source {
        Some(path) => tracing::info!("Loaded config from {:?}", path),
        None => tracing::info!("No config file found, using defaults"),
    }
    tracing::debug!("Parsed arguments: {:?}", args);
    tracing::debug!("Loaded configuration: {:?}", config);

    cli::execute(args, config)?;

    Ok(())
}
