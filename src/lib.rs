//! Transaction Graph Visualizer
//!
//! Renders an ordered trace of ledger state transitions as a Mermaid flowchart
//! with annotated, styled edges, followed by markdown tables of the storage
//! changes each transaction made.
//!
//! This library provides functionality for:
//! - Deterministic node identity and shape assignment per participant
//! - Edge captions from transaction fields and per-operation payload decoders
//! - Flattening and diffing decoded storage snapshots
//! - Styled markdown tables with value classification and digest truncation
//! - Layered configuration from TOML files, CLI flags and per-call overrides
//!
//! ```no_run
//! use tx_graph_viz::{Address, Transaction, TxGraph};
//!
//! let wallet: Address = "0:0101010101010101010101010101010101010101010101010101010101010101"
//!     .parse()
//!     .unwrap();
//! let contract = Address::new(0, [2u8; 32]);
//! let trace = vec![Transaction::new(Some(wallet), contract).with_value(1_000_000_000)];
//!
//! let markdown = TxGraph::default().render(&trace, None, None).unwrap();
//! assert!(markdown.starts_with("```mermaid"));
//! ```

pub mod address;
pub mod cli;
pub mod config;
pub mod error;
pub mod flatten;
pub mod format;
pub mod graph;
pub mod parser;
pub mod style;
pub mod table;

pub use address::{Address, AddressMap};
pub use config::Config;
pub use error::{Error, Result};
pub use flatten::{DiffMode, Value};
pub use graph::{GraphOptions, GraphOverrides, Rendered, Transaction, TxGraph};
pub use table::MdTable;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the given log level
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
