//! Per-operation caption handlers
//!
//! A handler decodes a message body and returns extra `label: value` fragments
//! for the edge. Handlers are looked up by operation code; caller-supplied
//! handlers replace the built-in ones for the same code.

use crate::format::{COIN_DECIMALS, from_nanos, to_hex_str};
use crate::parser::BitReader;
use crate::parser::codes::CodesMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const OP_JETTON_TRANSFER: u32 = 0x0f8a7ea5;
pub const OP_JETTON_INTERNAL_TRANSFER: u32 = 0x178d4519;
pub const OP_JETTON_TRANSFER_NOTIFICATION: u32 = 0x7362d09c;

/// Caption fragments in display order
pub type Captions = Vec<(String, String)>;

/// What a handler gets to work with
#[derive(Debug, Clone, Copy)]
pub struct CaptionContext<'a> {
    pub body: &'a [u8],
    pub op_map: &'a CodesMap,
    pub err_map: &'a CodesMap,
    pub hide_ok_values: bool,
}

pub trait CaptionHandler: Send + Sync {
    fn captions(&self, ctx: &CaptionContext<'_>) -> anyhow::Result<Captions>;
}

impl<F> CaptionHandler for F
where
    F: Fn(&CaptionContext<'_>) -> anyhow::Result<Captions> + Send + Sync,
{
    fn captions(&self, ctx: &CaptionContext<'_>) -> anyhow::Result<Captions> {
        self(ctx)
    }
}

/// Caption handlers by operation code
#[derive(Clone, Default)]
pub struct CaptionMap(HashMap<u32, Arc<dyn CaptionHandler>>);

impl CaptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoders for the standard jetton messages
    pub fn builtin() -> Self {
        let mut map = Self::new();
        map.insert(OP_JETTON_TRANSFER, Arc::new(jetton_transfer));
        map.insert(OP_JETTON_INTERNAL_TRANSFER, Arc::new(jetton_internal_transfer));
        map.insert(
            OP_JETTON_TRANSFER_NOTIFICATION,
            Arc::new(jetton_transfer_notification),
        );
        map
    }

    pub fn insert(&mut self, op: u32, handler: Arc<dyn CaptionHandler>) {
        self.0.insert(op, handler);
    }

    pub fn get(&self, op: u32) -> Option<&Arc<dyn CaptionHandler>> {
        self.0.get(&op)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A copy of `self` with `other`'s handlers layered on top
    pub fn merged(&self, other: &CaptionMap) -> CaptionMap {
        let mut map = self.0.clone();
        map.extend(other.0.iter().map(|(op, h)| (*op, h.clone())));
        CaptionMap(map)
    }
}

impl fmt::Debug for CaptionMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut ops: Vec<String> = self.0.keys().map(|op| to_hex_str(*op)).collect();
        ops.sort();
        f.debug_set().entries(ops).finish()
    }
}

fn coins(amount: u128) -> String {
    from_nanos(amount, COIN_DECIMALS)
}

/// Skip the operation code and query id
fn body_reader<'a>(ctx: &CaptionContext<'a>) -> anyhow::Result<BitReader<'a>> {
    let mut reader = BitReader::new(ctx.body);
    reader.skip(32 + 64)?;
    Ok(reader)
}

/// Jetton `transfer`: forwarded TON, amount and the forward payload op
fn jetton_transfer(ctx: &CaptionContext<'_>) -> anyhow::Result<Captions> {
    let mut reader = body_reader(ctx)?;
    let amount = reader.load_coins()?;
    reader.load_maybe_address()?;
    reader.load_maybe_address()?;
    reader.load_bit()?;
    let forward = reader.load_coins()?;

    let mut captions = Captions::new();
    if !ctx.hide_ok_values || forward != 0 {
        captions.push(("fwdTon".to_string(), coins(forward)));
    }
    captions.push(("amount".to_string(), coins(amount)));

    // inline forward payloads only
    if let Ok(false) = reader.load_bit()
        && let Ok(code) = reader.load_uint(32)
    {
        let name = ctx
            .op_map
            .get(&(code as i64))
            .or_else(|| ctx.err_map.get(&(code as i64)))
            .cloned()
            .unwrap_or_else(|| to_hex_str(code as i64));
        captions.push(("txCode".to_string(), name));
    }
    Ok(captions)
}

/// Jetton `internal_transfer`: amount
fn jetton_internal_transfer(ctx: &CaptionContext<'_>) -> anyhow::Result<Captions> {
    let mut reader = body_reader(ctx)?;
    let amount = reader.load_coins()?;
    Ok(vec![("amount".to_string(), coins(amount))])
}

/// Jetton `transfer_notification`: amount and the forward payload op.
///
/// Whatever decodes before the first failure is kept.
fn jetton_transfer_notification(ctx: &CaptionContext<'_>) -> anyhow::Result<Captions> {
    let mut captions = Captions::new();
    let Ok(mut reader) = body_reader(ctx) else {
        return Ok(captions);
    };
    let Ok(amount) = reader.load_coins() else {
        return Ok(captions);
    };
    captions.push(("amount".to_string(), coins(amount)));

    if let Ok(Some(op)) = forward_payload_op(&mut reader)
        && op != 0
    {
        let name = ctx
            .op_map
            .get(&(op as i64))
            .cloned()
            .unwrap_or_else(|| to_hex_str(op as i64));
        captions.push(("fwdOp".to_string(), name));
    }
    Ok(captions)
}

fn forward_payload_op(reader: &mut BitReader<'_>) -> crate::Result<Option<u64>> {
    reader.load_address()?;
    if reader.load_bit()? {
        // payload behind a ref is not readable
        return Ok(None);
    }
    Ok(Some(reader.load_uint(32)?))
}
