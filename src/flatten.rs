//! Flattening of nested state into dotted-path records, and before/after diffs
//!
//! Storage parsers hand back an arbitrarily nested [`Value`] tree. Tables need
//! one row per leaf, so the tree is flattened into a [`FlatRecord`] whose keys are
//! the path segments joined by a divider (`balance`, `owner > wallet`, `list > 0`).

use crate::address::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A nested value as produced by a storage parser
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Str(String),
    /// A plain machine integer
    Number(i64),
    /// A wide integer (coin amounts, hashes as numbers, ...)
    BigInt(i128),
    Null,
    Undefined,
    /// Flattened to its canonical string, never recursed into
    Address(Address),
    List(Vec<Value>),
    /// Ordered key/value pairs
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Build an object from key/value pairs, keeping their order
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value)
    }
}

impl From<i128> for Value {
    fn from(value: i128) -> Self {
        Value::BigInt(value)
    }
}

impl From<Address> for Value {
    fn from(value: Address) -> Self {
        Value::Address(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A leaf of a flattened record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Bool(bool),
    Str(String),
    Number(i64),
    BigInt(i128),
    Null,
    Undefined,
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::Str(v) => f.write_str(v),
            Scalar::Number(v) => write!(f, "{}", v),
            Scalar::BigInt(v) => write!(f, "{}", v),
            Scalar::Null => f.write_str("null"),
            Scalar::Undefined => f.write_str("undef"),
        }
    }
}

/// An insertion-ordered map from dotted path to scalar
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    entries: Vec<(String, Scalar)>,
    /// Position of each key in `entries`
    index: HashMap<String, usize>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced key keeps its original position
    pub fn insert(&mut self, key: impl Into<String>, value: Scalar) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Same keys, every value `undefined`
    pub fn undefined_like(&self) -> FlatRecord {
        FlatRecord {
            entries: self
                .entries
                .iter()
                .map(|(k, _)| (k.clone(), Scalar::Undefined))
                .collect(),
            index: self.index.clone(),
        }
    }

    fn extend(&mut self, other: FlatRecord) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }
}

fn merge_prefix(prefix: Option<&str>, segment: &str, divider: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}{}{}", prefix, divider, segment),
        _ => segment.to_string(),
    }
}

/// Flatten `value` into dotted-path scalars.
///
/// A scalar without a prefix has no key to live under and yields an empty record.
pub fn flatten(value: &Value, divider: &str, prefix: Option<&str>) -> FlatRecord {
    let mut flat = FlatRecord::new();
    let children: Vec<(String, &Value)> = match value {
        Value::List(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| (merge_prefix(prefix, &index.to_string(), divider), item))
            .collect(),
        Value::Object(entries) => entries
            .iter()
            .map(|(name, item)| (merge_prefix(prefix, name, divider), item))
            .collect(),
        leaf => {
            if let Some(prefix) = prefix.filter(|p| !p.is_empty())
                && let Some(scalar) = leaf_scalar(leaf)
            {
                flat.insert(prefix, scalar);
            }
            return flat;
        }
    };

    for (key, child) in children {
        match leaf_scalar(child) {
            Some(scalar) => flat.insert(key, scalar),
            None => flat.extend(flatten(child, divider, Some(&key))),
        }
    }
    flat
}

fn leaf_scalar(value: &Value) -> Option<Scalar> {
    match value {
        Value::Bool(v) => Some(Scalar::Bool(*v)),
        Value::Str(v) => Some(Scalar::Str(v.clone())),
        Value::Number(v) => Some(Scalar::Number(*v)),
        Value::BigInt(v) => Some(Scalar::BigInt(*v)),
        Value::Null => Some(Scalar::Null),
        Value::Undefined => Some(Scalar::Undefined),
        Value::Address(addr) => Some(Scalar::Str(addr.canonical())),
        Value::List(_) | Value::Object(_) => None,
    }
}

/// Which rows a diff keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode {
    /// Only keys whose values changed
    #[default]
    Diff,
    /// Every key
    Full,
}

impl DiffMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            DiffMode::Diff => "difference",
            DiffMode::Full => "full",
        }
    }
}

/// Placeholder delta for non-numeric or mixed-kind pairs
pub const NO_DELTA: &str = "-";

/// One row of a storage difference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRow {
    pub key: String,
    pub before: String,
    pub after: String,
    pub delta: String,
}

fn delta(before: &Scalar, after: &Scalar) -> String {
    let change = match (before, after) {
        (Scalar::Number(a), Scalar::Number(b)) => Some(*b as i128 - *a as i128),
        (Scalar::BigInt(a), Scalar::BigInt(b)) => b.checked_sub(*a),
        _ => None,
    };
    match change {
        Some(0) | None => NO_DELTA.to_string(),
        Some(change) if change > 0 => format!("+{}", change),
        Some(change) => change.to_string(),
    }
}

/// Compare two flattened records.
///
/// Keys are visited in `before` order, then keys only present in `after`.
/// Missing keys read as `undefined`.
pub fn diff_flat(before: &FlatRecord, after: &FlatRecord, mode: DiffMode) -> Vec<DiffRow> {
    let mut keys: Vec<&str> = before.keys().collect();
    keys.extend(after.keys().filter(|k| before.get(k).is_none()));

    keys.into_iter()
        .filter_map(|key| {
            let old = before.get(key).unwrap_or(&Scalar::Undefined);
            let new = after.get(key).unwrap_or(&Scalar::Undefined);
            if old == new && mode == DiffMode::Diff {
                return None;
            }
            Some(DiffRow {
                key: key.to_string(),
                before: old.to_string(),
                after: new.to_string(),
                delta: delta(old, new),
            })
        })
        .collect()
}

/// Flatten both sides and compare them
pub fn diff(before: &Value, after: &Value, divider: &str, mode: DiffMode) -> Vec<DiffRow> {
    diff_flat(
        &flatten(before, divider, None),
        &flatten(after, divider, None),
        mode,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DIV: &str = " > ";

    fn storage(balance: i128, owner: &str) -> Value {
        Value::object([
            ("balance", Value::BigInt(balance)),
            ("owner", Value::from(owner)),
            (
                "meta",
                Value::object([("seqno", Value::Number(3)), ("tags", vec!["a", "b"].into())]),
            ),
        ])
    }

    #[test]
    fn test_flatten_nested() {
        let flat = flatten(&storage(10, "me"), DIV, None);
        let keys: Vec<&str> = flat.keys().collect();
        assert_eq!(
            keys,
            vec!["balance", "owner", "meta > seqno", "meta > tags > 0", "meta > tags > 1"]
        );
        assert_eq!(flat.get("meta > tags > 1"), Some(&Scalar::Str("b".into())));
    }

    #[test]
    fn test_flatten_scalar_without_prefix_is_empty() {
        assert!(flatten(&Value::Number(1), DIV, None).is_empty());
        let flat = flatten(&Value::Number(1), DIV, Some("root"));
        assert_eq!(flat.get("root"), Some(&Scalar::Number(1)));
    }

    #[test]
    fn test_flatten_address_is_leaf() {
        let addr = Address::new(0, [4u8; 32]);
        let flat = flatten(&Value::object([("owner", Value::Address(addr))]), ".", None);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat.get("owner"), Some(&Scalar::Str(addr.canonical())));
    }

    #[test]
    fn test_flatten_empty_containers_vanish() {
        let value = Value::object([("list", Value::List(vec![])), ("obj", Value::Object(vec![]))]);
        assert!(flatten(&value, DIV, None).is_empty());
    }

    #[test]
    fn test_flatten_with_prefix() {
        let flat = flatten(&Value::from(vec![1i64, 2]), ".", Some("xs"));
        assert_eq!(flat.get("xs.0"), Some(&Scalar::Number(1)));
        assert_eq!(flat.get("xs.1"), Some(&Scalar::Number(2)));
    }

    #[test]
    fn test_diff_only_changes() {
        let rows = diff(&storage(10, "me"), &storage(25, "me"), DIV, DiffMode::Diff);
        assert_eq!(
            rows,
            vec![DiffRow {
                key: "balance".into(),
                before: "10".into(),
                after: "25".into(),
                delta: "+15".into(),
            }]
        );
    }

    #[test]
    fn test_diff_negative_and_mixed_kinds() {
        let before = Value::object([("a", Value::BigInt(100)), ("b", Value::Number(1))]);
        let after = Value::object([("a", Value::BigInt(40)), ("b", Value::BigInt(1))]);
        let rows = diff(&before, &after, DIV, DiffMode::Diff);
        assert_eq!(rows[0].delta, "-60");
        // number vs big integer never compare equal and get no delta
        assert_eq!(rows[1].delta, NO_DELTA);
    }

    #[test]
    fn test_diff_missing_keys_read_undefined() {
        let before = Value::object([("a", Value::Number(1))]);
        let after = Value::object([("b", Value::Null)]);
        let rows = diff(&before, &after, DIV, DiffMode::Diff);
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].before.as_str(), rows[0].after.as_str()), ("1", "undef"));
        assert_eq!((rows[1].before.as_str(), rows[1].after.as_str()), ("undef", "null"));
    }

    #[test]
    fn test_identical_records() {
        let value = storage(7, "x");
        assert!(diff(&value, &value, DIV, DiffMode::Diff).is_empty());

        let rows = diff(&value, &value, DIV, DiffMode::Full);
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|row| row.delta == NO_DELTA));
    }

    #[test]
    fn test_flat_record_replace_keeps_position() {
        let mut record = FlatRecord::new();
        for i in 0..1000 {
            record.insert(format!("key{}", i), Scalar::Number(i));
        }
        record.insert("key3", Scalar::Str("replaced".to_string()));

        assert_eq!(record.len(), 1000);
        assert_eq!(record.keys().nth(3), Some("key3"));
        assert_eq!(record.get("key3"), Some(&Scalar::Str("replaced".to_string())));
        assert_eq!(record.get("key999"), Some(&Scalar::Number(999)));
        assert_eq!(record.get("missing"), None);

        let undefined = record.undefined_like();
        assert_eq!(undefined.get("key3"), Some(&Scalar::Undefined));
    }

    #[test]
    fn test_undefined_like() {
        let flat = flatten(&storage(1, "x"), DIV, None);
        let empty = flat.undefined_like();
        assert_eq!(empty.len(), flat.len());
        assert!(empty.iter().all(|(_, v)| *v == Scalar::Undefined));
    }

    fn arb_leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            "[a-z]{0,8}".prop_map(Value::Str),
            any::<i64>().prop_map(Value::Number),
            any::<i128>().prop_map(Value::BigInt),
            Just(Value::Null),
            Just(Value::Undefined),
        ]
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        arb_leaf().prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    /// Walk `value` along `path`, the way a reader would rebuild it
    fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
        match (path.split_first(), value) {
            (None, _) => Some(value),
            (Some((head, rest)), Value::List(items)) => {
                items.get(head.parse::<usize>().ok()?).and_then(|v| lookup(v, rest))
            }
            (Some((head, rest)), Value::Object(entries)) => entries
                .iter()
                .find(|(k, _)| k == head)
                .and_then(|(_, v)| lookup(v, rest)),
            _ => None,
        }
    }

    proptest! {
        #[test]
        fn test_flatten_leaf_values_roundtrip(
            entries in prop::collection::btree_map("[a-z]{1,4}", arb_value(), 0..5)
        ) {
            let value = Value::Object(entries.into_iter().collect());
            let flat = flatten(&value, ".", None);
            for (key, scalar) in flat.iter() {
                let path: Vec<&str> = key.split('.').collect();
                let original = lookup(&value, &path);
                prop_assert!(original.is_some());
                let leaf = leaf_scalar(original.unwrap());
                prop_assert_eq!(leaf.as_ref(), Some(scalar));
            }
        }

        #[test]
        fn test_self_diff_is_empty(
            entries in prop::collection::btree_map("[a-z]{1,4}", arb_value(), 0..5)
        ) {
            let value = Value::Object(entries.into_iter().collect());
            prop_assert!(diff(&value, &value, DIV, DiffMode::Diff).is_empty());
            let full = diff(&value, &value, DIV, DiffMode::Full);
            prop_assert_eq!(full.len(), flatten(&value, DIV, None).len());
        }
    }
}
