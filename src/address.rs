//! Ledger addresses and address-keyed lookup tables
//!
//! An address is a workchain id plus a 32-byte account hash. It can be written in
//! two ways:
//! - raw form: `<workchain>:<64 hex chars>`
//! - user-friendly form: 48 base64 (or base64url) chars encoding
//!   `tag | workchain | hash | crc16`
//!
//! The canonical string (used for every equality check and map key) is the
//! bounceable, url-safe, user-friendly form.

use crate::error::{Error, Result};
use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE},
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TEST_ONLY: u8 = 0x80;
const FRIENDLY_LEN: usize = 48;

/// Canonical string of [`HOLE_ADDRESS`]
pub const HOLE_ADDRESS_STR: &str = "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c";

/// The reserved all-zero address of the base workchain
pub const HOLE_ADDRESS: Address = Address {
    workchain: 0,
    hash: [0u8; 32],
};

/// A participant address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    workchain: i8,
    hash: [u8; 32],
}

impl Address {
    pub fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    pub fn workchain(&self) -> i8 {
        self.workchain
    }

    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Parse either the raw or the user-friendly form
    pub fn parse(src: &str) -> Result<Self> {
        if src.contains(':') {
            Self::parse_raw(src)
        } else {
            Self::parse_friendly(src)
        }
    }

    /// Parse `<workchain>:<hex hash>`
    pub fn parse_raw(src: &str) -> Result<Self> {
        let invalid = || Error::InvalidAddress(format!("could not parse '{}' string as address", src));

        let (workchain, hash) = src.split_once(':').ok_or_else(invalid)?;
        let workchain: i8 = workchain.trim().parse().map_err(|_| invalid())?;
        let bytes = hex::decode(hash.trim()).map_err(|_| invalid())?;
        let hash: [u8; 32] = bytes.try_into().map_err(|_| invalid())?;

        Ok(Self { workchain, hash })
    }

    /// Parse the 48-character base64/base64url form, checking tag and checksum
    pub fn parse_friendly(src: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            Error::InvalidAddress(format!("could not parse '{}' string as address: {}", src, reason))
        };

        if src.len() != FRIENDLY_LEN {
            return Err(invalid("wrong length"));
        }
        let decoded = if src.contains(['-', '_']) {
            URL_SAFE.decode(src)
        } else {
            STANDARD.decode(src)
        };
        let bytes = decoded.map_err(|_| invalid("bad base64"))?;
        if bytes.len() != 36 {
            return Err(invalid("wrong payload length"));
        }

        let tag = bytes[0] & !TAG_TEST_ONLY;
        if tag != TAG_BOUNCEABLE && tag != TAG_NON_BOUNCEABLE {
            return Err(invalid("unknown tag"));
        }
        let expected = crc16(&bytes[..34]);
        let actual = u16::from_be_bytes([bytes[34], bytes[35]]);
        if expected != actual {
            return Err(invalid("checksum mismatch"));
        }

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);
        Ok(Self {
            workchain: bytes[1] as i8,
            hash,
        })
    }

    /// The canonical string used for equality and lookups
    pub fn canonical(&self) -> String {
        let mut bytes = Vec::with_capacity(36);
        bytes.push(TAG_BOUNCEABLE);
        bytes.push(self.workchain as u8);
        bytes.extend_from_slice(&self.hash);
        let crc = crc16(&bytes);
        bytes.extend_from_slice(&crc.to_be_bytes());
        URL_SAFE.encode(bytes)
    }

    pub fn to_raw_string(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }

    pub fn is_hole(&self) -> bool {
        *self == HOLE_ADDRESS
    }
}

impl Default for Address {
    fn default() -> Self {
        HOLE_ADDRESS
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.canonical()
    }
}

/// Whether `src` parses as an address in either form
pub fn is_address_str(src: &str) -> bool {
    Address::parse(src).is_ok()
}

/// CRC-16/XMODEM as used by the user-friendly address checksum
fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// A map keyed by the canonical address string.
///
/// Every key goes through [`Address::canonical`] before touching the map, so
/// the raw and the non-bounceable spelling of one address hit the same entry.
#[derive(Debug, Clone)]
pub struct AddressMap<V> {
    entries: HashMap<String, V>,
}

impl<V> Default for AddressMap<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> AddressMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: &Address, value: V) -> Option<V> {
        self.entries.insert(address.canonical(), value)
    }

    pub fn get(&self, address: &Address) -> Option<&V> {
        self.entries.get(&address.canonical())
    }

    /// Look up by an already canonical key
    pub fn get_canonical(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Look up by any address spelling; an unparseable string is an error
    pub fn lookup(&self, address: &str) -> Result<Option<&V>> {
        Ok(self.get(&Address::parse(address)?))
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.entries.contains_key(&address.canonical())
    }

    pub fn remove(&mut self, address: &Address) -> Option<V> {
        self.entries.remove(&address.canonical())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(canonical key, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<V: Clone> AddressMap<V> {
    /// A copy of `self` with `other`'s entries layered on top
    pub fn merged(&self, other: &AddressMap<V>) -> AddressMap<V> {
        let mut entries = self.entries.clone();
        entries.extend(other.entries.iter().map(|(k, v)| (k.clone(), v.clone())));
        AddressMap { entries }
    }
}

impl<V> FromIterator<(Address, V)> for AddressMap<V> {
    fn from_iter<T: IntoIterator<Item = (Address, V)>>(iter: T) -> Self {
        let mut map = AddressMap::new();
        for (address, value) in iter {
            map.insert(&address, value);
        }
        map
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for AddressMap<V> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = HashMap::<String, V>::deserialize(deserializer)?;
        let mut map = AddressMap::new();
        for (key, value) in raw {
            let address = Address::parse(&key).map_err(serde::de::Error::custom)?;
            map.insert(&address, value);
        }
        Ok(map)
    }
}
