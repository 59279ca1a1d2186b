//! CLI module
//!
//! This module defines the command-line interface using clap and implements
//! the command execution logic.

use crate::graph::{ChartType, DirectionType, GraphOverrides, StorageDisplay};
use crate::{Config, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;
pub mod output;

/// Transaction graph renderer CLI
#[derive(Parser, Debug)]
#[command(name = "tx-graph-viz")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (overrides the config file, RUST_LOG overrides both)
    #[arg(long, global = true, env = "TX_GRAPH_LOG")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a transaction trace to a markdown flowchart
    Render {
        /// JSON trace: an array of transactions or `{"transactions": [...]}`
        #[arg(short, long)]
        input: PathBuf,

        /// Output file name without extension (defaults to a UTC timestamp)
        #[arg(short, long)]
        name: Option<String>,

        /// Output folder (overrides config)
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// Node reuse policy for destinations
        #[arg(long, value_enum)]
        direction: Option<DirectionArg>,

        /// Flowchart direction
        #[arg(long, value_enum)]
        chart: Option<ChartArg>,

        /// Storage table mode
        #[arg(long, value_enum)]
        storage: Option<StorageArg>,

        /// Draw externally originated transactions from an `external` node
        #[arg(long)]
        show_origin: bool,

        /// Omit edge colors
        #[arg(long)]
        no_styles: bool,

        /// Name standard jetton/NFT ops and VM exit codes
        #[arg(long)]
        standard_codes: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "markdown")]
        format: OutputFormat,

        /// Print the output; without --name nothing is written to disk
        #[arg(long)]
        stdout: bool,
    },

    /// Validate a configuration file
    ConfigValidate {
        /// Path to configuration file
        path: PathBuf,
    },
}

/// Destination node policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    /// Every destination gets a fresh node
    Uni,
    /// Destinations reuse known nodes
    Bi,
}

impl From<DirectionArg> for DirectionType {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Uni => DirectionType::Unidirectional,
            DirectionArg::Bi => DirectionType::Bidirectional,
        }
    }
}

/// Flowchart direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum ChartArg {
    Tb,
    Lr,
    Bt,
    Rl,
}

impl From<ChartArg> for ChartType {
    fn from(value: ChartArg) -> Self {
        match value {
            ChartArg::Tb => ChartType::TB,
            ChartArg::Lr => ChartType::LR,
            ChartArg::Bt => ChartType::BT,
            ChartArg::Rl => ChartType::RL,
        }
    }
}

/// Storage table mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageArg {
    /// Changed keys only
    Diff,
    /// Every key
    Full,
    /// No storage tables
    Off,
}

impl From<StorageArg> for StorageDisplay {
    fn from(value: StorageArg) -> Self {
        match value {
            StorageArg::Diff => StorageDisplay::Diff,
            StorageArg::Full => StorageDisplay::Full,
            StorageArg::Off => StorageDisplay::Off,
        }
    }
}

/// Output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Markdown with the mermaid flowchart and storage tables
    Markdown,
    /// JSON summary plus the markdown
    Json,
}

/// Render flags as graph overrides; unset flags leave the config untouched
pub fn render_overrides(
    folder: Option<PathBuf>,
    direction: Option<DirectionArg>,
    chart: Option<ChartArg>,
    storage: Option<StorageArg>,
    show_origin: bool,
    no_styles: bool,
) -> GraphOverrides {
    GraphOverrides {
        folder,
        direction_type: direction.map(Into::into),
        chart_type: chart.map(Into::into),
        display_storage: storage.map(Into::into),
        show_origin: show_origin.then_some(true),
        disable_styles: no_styles.then_some(true),
        ..Default::default()
    }
}

/// Execute the CLI command
pub fn execute(args: Cli, config: Config) -> Result<()> {
    match args.command {
        Commands::Render { .. } => commands::render::execute(args, config),
        Commands::ConfigValidate { path } => commands::config_validate::execute(path),
    }
}
