//! Configuration management
//!
//! This module handles loading and managing configuration from:
//! - Command-line arguments
//! - Configuration files (TOML)
//! - Defaults

use crate::address::Address;
use crate::error::{Error, Result};
use crate::graph::{GraphOverrides, StorageMap, TxGraph};
use crate::parser::codes::{CodesMap, default_err_map, default_op_map};
use crate::parser::CborStorageParser;
use crate::style::HashAlgorithm;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Render options layered over the built-in defaults
    #[serde(default)]
    pub graph: GraphOverrides,

    #[serde(default)]
    pub table: TableConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub codes: CodesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage table limits
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    /// Cell chunk length; `false` disables chunking
    pub line_len: Option<LengthSetting>,

    /// Longest verbatim value; `false` never hashes
    pub max_display_len: Option<LengthSetting>,

    /// Digest used for over-long values
    #[serde(default)]
    pub hash: HashAlgorithm,
}

/// Storage decoding
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Destinations whose snapshots are CBOR encoded
    #[serde(default)]
    pub cbor: Vec<Address>,
}

/// Built-in code name tables
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodesConfig {
    /// Name jetton and NFT ops and VM exit codes; `op_map`/`err_map` entries still win
    #[serde(default)]
    pub standard: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// A length limit: a whole number, or `false` to turn the limit off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthSetting {
    Disabled,
    Len(usize),
}

impl LengthSetting {
    pub fn as_option(&self) -> Option<usize> {
        match self {
            LengthSetting::Disabled => None,
            LengthSetting::Len(len) => Some(*len),
        }
    }
}

impl<'de> Deserialize<'de> for LengthSetting {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Int(i64),
            Float(f64),
        }

        let whole = |value: f64| -> std::result::Result<usize, D::Error> {
            if value.fract() != 0.0 || value < 0.0 {
                return Err(serde::de::Error::custom("only whole numbers allowed"));
            }
            Ok(value as usize)
        };
        match Repr::deserialize(deserializer)? {
            Repr::Flag(false) => Ok(LengthSetting::Disabled),
            Repr::Flag(true) => Err(serde::de::Error::custom(
                "expected a length or false, found true",
            )),
            Repr::Int(len) => usize::try_from(len)
                .map(LengthSetting::Len)
                .map_err(|_| serde::de::Error::custom("length must not be negative")),
            Repr::Float(len) => whole(len).map(LengthSetting::Len),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&contents).map_err(|e| Error::ConfigParse {
            file: path.clone(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Default config locations, in search order:
    /// 1. ./tx-graph.toml
    /// 2. ~/.tx-graph-viz/config.toml
    /// 3. /etc/tx-graph-viz/config.toml
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("tx-graph.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".tx-graph-viz").join("config.toml"));
        }
        paths.push(PathBuf::from("/etc/tx-graph-viz/config.toml"));
        paths
    }

    /// First existing default config file
    pub fn find() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|path| path.exists())
    }

    /// Load the given file, or the defaults when there is none
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Config::default()),
        }
    }

    /// Storage parsers registered by the `[storage]` section
    pub fn storage_map(&self) -> StorageMap {
        let mut map = StorageMap::new();
        for address in &self.storage.cbor {
            map.insert(address, Arc::new(CborStorageParser));
        }
        map
    }

    /// Build a renderer from this configuration with `overrides` layered on top
    pub fn build_graph(&self, overrides: &GraphOverrides) -> Result<TxGraph> {
        let mut layered = self.graph.layered(overrides);
        if self.codes.standard {
            layered.op_map = Some(with_standard(default_op_map(), layered.op_map.take()));
            layered.err_map = Some(with_standard(default_err_map(), layered.err_map.take()));
        }
        let storage = self.storage_map();
        layered.storage_map = Some(match &layered.storage_map {
            Some(extra) => storage.merged(extra),
            None => storage,
        });

        let mut graph = TxGraph::new(layered);
        if let Some(len) = self.table.line_len {
            graph.set_table_len(len.as_option())?;
        }
        if let Some(len) = self.table.max_display_len {
            graph.set_max_display_len(len.as_option())?;
        }
        graph.set_hash_algorithm(self.table.hash);
        Ok(graph)
    }

    /// Check the values serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        self.build_graph(&GraphOverrides::default()).map(|_| ())
    }
}

fn with_standard(mut standard: CodesMap, configured: Option<CodesMap>) -> CodesMap {
    standard.extend(configured.unwrap_or_default());
    standard
}
