//! Classification and coloring of table values

use crate::address::{AddressMap, is_address_str};
use crate::error::{Error, Result};
use crate::format::{flatten_display_label, pretty_number};
use crate::table::Entry;
use blake2::{Blake2b, Digest, digest::consts::U32};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::borrow::Cow;
use std::sync::LazyLock;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid number pattern"));

/// Colors used for each value category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColors {
    pub null_color: String,
    pub undef_color: String,
    pub addr_color: String,
    pub num_color: String,
    pub str_color: String,
    pub diff_plus_color: String,
    pub diff_minus_color: String,
}

impl Default for TableColors {
    fn default() -> Self {
        Self {
            null_color: "#569CD6".to_string(),
            undef_color: "#569CD6".to_string(),
            addr_color: "#D656B2".to_string(),
            num_color: "#B0A104".to_string(),
            str_color: "#E700FF".to_string(),
            diff_plus_color: "#1DB515".to_string(),
            diff_minus_color: "#F70B14".to_string(),
        }
    }
}

/// Partial palette; missing colors fall back to the defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableColorsPatch {
    pub null_color: Option<String>,
    pub undef_color: Option<String>,
    pub addr_color: Option<String>,
    pub num_color: Option<String>,
    pub str_color: Option<String>,
    pub diff_plus_color: Option<String>,
    pub diff_minus_color: Option<String>,
}

/// Table coloring policy: on/off, or a custom palette
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorTable {
    Enabled(bool),
    Custom(TableColorsPatch),
}

impl Default for ColorTable {
    fn default() -> Self {
        ColorTable::Enabled(true)
    }
}

impl ColorTable {
    /// The effective palette, or `None` when coloring is off
    pub fn resolve(&self) -> Option<TableColors> {
        match self {
            ColorTable::Enabled(false) => None,
            ColorTable::Enabled(true) => Some(TableColors::default()),
            ColorTable::Custom(patch) => {
                let d = TableColors::default();
                Some(TableColors {
                    null_color: patch.null_color.clone().unwrap_or(d.null_color),
                    undef_color: patch.undef_color.clone().unwrap_or(d.undef_color),
                    addr_color: patch.addr_color.clone().unwrap_or(d.addr_color),
                    num_color: patch.num_color.clone().unwrap_or(d.num_color),
                    str_color: patch.str_color.clone().unwrap_or(d.str_color),
                    diff_plus_color: patch.diff_plus_color.clone().unwrap_or(d.diff_plus_color),
                    diff_minus_color: patch.diff_minus_color.clone().unwrap_or(d.diff_minus_color),
                })
            }
        }
    }
}

/// Digest used to stand in for over-long values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Blake2b,
}

impl HashAlgorithm {
    pub fn label(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Blake2b => "blake2b",
        }
    }

    pub fn digest_hex(&self, src: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(src)),
            HashAlgorithm::Blake2b => {
                let mut hasher = Blake2b::<U32>::new();
                hasher.update(src);
                hex::encode(hasher.finalize())
            }
        }
    }
}

/// Replaces values longer than `max_len` with `<label>: <hex digest>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongValuePolicy {
    pub max_len: Option<usize>,
    pub algorithm: HashAlgorithm,
}

impl LongValuePolicy {
    pub fn apply<'a>(&self, src: &'a str) -> Cow<'a, str> {
        match self.max_len {
            Some(max) if src.chars().count() > max => Cow::Owned(format!(
                "{}: {}",
                self.algorithm.label(),
                self.algorithm.digest_hex(src.as_bytes())
            )),
            _ => Cow::Borrowed(src),
        }
    }
}

/// Display category of a raw table value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Null,
    Undefined,
    Number,
    Address,
    Str,
}

/// Classify a raw value; first match wins
pub fn value_class(raw: &str) -> ValueClass {
    if raw == "null" {
        ValueClass::Null
    } else if raw == "undef" {
        ValueClass::Undefined
    } else if NUMBER.is_match(raw) {
        ValueClass::Number
    } else if is_address_str(raw) {
        ValueClass::Address
    } else {
        ValueClass::Str
    }
}

/// Turns raw table text into styled entries
pub struct Classifier<'a> {
    colors: Option<&'a TableColors>,
    aliases: &'a AddressMap<String>,
}

impl<'a> Classifier<'a> {
    pub fn new(colors: Option<&'a TableColors>, aliases: &'a AddressMap<String>) -> Self {
        Self { colors, aliases }
    }

    /// The active palette; asking for it with coloring off is a configuration error
    pub fn palette(&self) -> Result<&'a TableColors> {
        self.colors
            .ok_or_else(|| Error::config("table coloring is disabled, no palette available"))
    }

    fn pick(&self, choose: impl Fn(&TableColors) -> &String) -> Option<String> {
        self.colors.map(|c| choose(c).clone())
    }

    /// Style a before/after value; with coloring off the raw text passes through
    pub fn classify(&self, raw: &str) -> Entry {
        if self.colors.is_none() {
            return Entry::new(raw).without_highlight();
        }
        let (text, color, bold) = match value_class(raw) {
            ValueClass::Null => (raw.to_string(), self.pick(|c| &c.null_color), true),
            ValueClass::Undefined => (raw.to_string(), self.pick(|c| &c.undef_color), true),
            ValueClass::Number => (pretty_number(raw), self.pick(|c| &c.num_color), false),
            ValueClass::Address => {
                let shown = self
                    .aliases
                    .lookup(raw)
                    .ok()
                    .flatten()
                    .map(String::as_str)
                    .unwrap_or(raw);
                (
                    flatten_display_label(shown),
                    self.pick(|c| &c.addr_color),
                    false,
                )
            }
            ValueClass::Str => (raw.to_string(), self.pick(|c| &c.str_color), false),
        };

        let entry = Entry::new(text);
        let entry = if bold { entry.bold() } else { entry.without_highlight() };
        match color {
            Some(color) => entry.colored(color),
            None => entry,
        }
    }

    /// Style a delta (`+5`, `-3` or the `-` placeholder)
    pub fn classify_delta(&self, raw: &str) -> Entry {
        if self.colors.is_none() {
            return Entry::new(raw).without_highlight();
        }
        let (color, sign) = if raw.contains('+') {
            (self.pick(|c| &c.diff_plus_color), Some("+"))
        } else if raw.chars().count() > 1 {
            (self.pick(|c| &c.diff_minus_color), Some(""))
        } else {
            (None, None)
        };

        let text = match sign {
            Some(sign) if NUMBER.is_match(raw.trim_start_matches('+')) => {
                format!("{}{}", sign, pretty_number(raw))
            }
            _ => raw.to_string(),
        };

        let entry = Entry::new(text).without_highlight();
        match color {
            Some(color) => entry.colored(color),
            None => entry,
        }
    }
}
