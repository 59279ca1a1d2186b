//! Operation and exit code name tables

use crate::format::{to_hex_str, to_snake_case};
use std::collections::HashMap;

/// Code to display name
pub type CodesMap = HashMap<i64, String>;

/// Jetton standard operation codes
pub const JETTON_OPS: &[(&str, i64)] = &[
    ("transfer", 0x0f8a7ea5),
    ("transferNotification", 0x7362d09c),
    ("internalTransfer", 0x178d4519),
    ("excesses", 0xd53276db),
    ("burn", 0x595f07bc),
    ("burnNotification", 0x7bdd97de),
    ("provideWalletAddress", 0x2c76b973),
    ("takeWalletAddress", 0xd1735400),
];

/// NFT standard operation codes
pub const NFT_OPS: &[(&str, i64)] = &[
    ("nftTransfer", 0x5fcc3d14),
    ("ownershipAssigned", 0x05138d91),
    ("getStaticData", 0x2fcb26a2),
    ("reportStaticData", 0x8b771735),
];

/// Virtual machine exit codes
pub const VM_EXIT_CODES: &[(&str, i64)] = &[
    ("stackUnderflow", 2),
    ("stackOverflow", 3),
    ("integerOverflow", 4),
    ("integerOutOfRange", 5),
    ("invalidOpcode", 6),
    ("typeCheckError", 7),
    ("cellOverflow", 8),
    ("cellUnderflow", 9),
    ("dictionaryError", 10),
    ("unknownError", 11),
    ("fatalError", 12),
    ("outOfGas", 13),
    ("outOfGasNegative", -14),
    ("actionListInvalid", 32),
    ("actionListTooLong", 33),
    ("actionInvalid", 34),
    ("invalidSourceAddress", 35),
    ("invalidDestinationAddress", 36),
    ("notEnoughTon", 37),
    ("notEnoughExtraCurrencies", 38),
];

/// Build a code table from camelCase names
pub fn to_codes_map(entries: &[(&str, i64)]) -> CodesMap {
    entries
        .iter()
        .map(|(name, code)| (*code, to_snake_case(name)))
        .collect()
}

/// Standard operation codes
pub fn default_op_map() -> CodesMap {
    let mut map = to_codes_map(JETTON_OPS);
    map.extend(to_codes_map(NFT_OPS));
    map
}

/// Standard exit codes
pub fn default_err_map() -> CodesMap {
    to_codes_map(VM_EXIT_CODES)
}

/// Name of an operation code, hex when unknown
pub fn op_name(map: &CodesMap, op: u32) -> String {
    map.get(&i64::from(op))
        .cloned()
        .unwrap_or_else(|| to_hex_str(op))
}

/// Name of an exit or result code, the number when unknown
pub fn exit_name(map: &CodesMap, code: i32) -> String {
    map.get(&i64::from(code))
        .cloned()
        .unwrap_or_else(|| code.to_string())
}

/// Parse a table key written as decimal or `0x` hex
pub fn parse_code(src: &str) -> Option<i64> {
    let src = src.trim();
    let (negative, digits) = match src.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, src),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -value } else { value })
}
