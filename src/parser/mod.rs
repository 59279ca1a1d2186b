//! Parser module - payload bit reading, code tables and storage decoding

use crate::flatten::Value;

pub mod cbor;
pub mod codes;
pub mod slice;

// Re-export key types
pub use codes::CodesMap;
pub use slice::BitReader;

/// Decodes a contract's persisted storage blob into a nested value.
///
/// Implementations are supplied per destination address. A failing parser
/// only drops that transaction's table.
pub trait StorageParser: Send + Sync {
    fn parse(&self, blob: &[u8]) -> anyhow::Result<Value>;
}

impl<F> StorageParser for F
where
    F: Fn(&[u8]) -> anyhow::Result<Value> + Send + Sync,
{
    fn parse(&self, blob: &[u8]) -> anyhow::Result<Value> {
        self(blob)
    }
}

/// Storage parser for CBOR-encoded state
#[derive(Debug, Clone, Copy, Default)]
pub struct CborStorageParser;

impl StorageParser for CborStorageParser {
    fn parse(&self, blob: &[u8]) -> anyhow::Result<Value> {
        Ok(cbor::decode_storage(blob)?)
    }
}
