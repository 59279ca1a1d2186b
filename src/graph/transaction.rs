//! Transaction records consumed by the graph builder

use crate::address::Address;
use serde::{Deserialize, Serialize};

/// One ledger state transition, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// `None` for externally originated messages
    #[serde(default)]
    pub from: Option<Address>,
    pub to: Address,
    #[serde(default, with = "amount")]
    pub value: Option<u128>,
    #[serde(default, with = "amount")]
    pub total_fees: Option<u128>,
    #[serde(default, with = "amount")]
    pub compute_fee: Option<u128>,
    #[serde(default, with = "amount")]
    pub storage_fee: Option<u128>,
    #[serde(default, with = "amount")]
    pub total_fwd_fee: Option<u128>,
    #[serde(default, with = "amount")]
    pub in_forward_fee: Option<u128>,
    #[serde(default, with = "amount")]
    pub total_action_fee: Option<u128>,
    #[serde(default)]
    pub op: Option<u32>,
    /// Message body data bits, hex encoded on the wire
    #[serde(default, with = "hex_bytes")]
    pub body: Option<Vec<u8>>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub action_result_code: Option<i32>,
    #[serde(default)]
    pub deploy: bool,
    #[serde(default)]
    pub aborted: bool,
    #[serde(default)]
    pub destroyed: bool,
    #[serde(default)]
    pub success: bool,
    #[serde(default, with = "hex_bytes")]
    pub old_storage: Option<Vec<u8>>,
    #[serde(default, with = "hex_bytes")]
    pub new_storage: Option<Vec<u8>>,
}

impl Transaction {
    pub fn new(from: Option<Address>, to: Address) -> Self {
        Self {
            from,
            to,
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: u128) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_fees(mut self, total: u128) -> Self {
        self.total_fees = Some(total);
        self
    }

    pub fn with_fee_breakdown(mut self, breakdown: FeeBreakdown) -> Self {
        self.compute_fee = breakdown.compute_fee;
        self.storage_fee = breakdown.storage_fee;
        self.total_fwd_fee = breakdown.total_fwd_fee;
        self.in_forward_fee = breakdown.in_forward_fee;
        self.total_action_fee = breakdown.total_action_fee;
        self
    }

    pub fn with_op(mut self, op: u32) -> Self {
        self.op = Some(op);
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    pub fn with_action_result(mut self, code: i32) -> Self {
        self.action_result_code = Some(code);
        self
    }

    pub fn with_deploy(mut self, deploy: bool) -> Self {
        self.deploy = deploy;
        self
    }

    pub fn with_aborted(mut self, aborted: bool) -> Self {
        self.aborted = aborted;
        self
    }

    pub fn with_destroyed(mut self, destroyed: bool) -> Self {
        self.destroyed = destroyed;
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    pub fn with_storage(mut self, old: Option<Vec<u8>>, new: Option<Vec<u8>>) -> Self {
        self.old_storage = old;
        self.new_storage = new;
        self
    }

    /// The fee sub-fields of this transaction
    pub fn fee_breakdown(&self) -> FeeBreakdown {
        FeeBreakdown {
            compute_fee: self.compute_fee,
            storage_fee: self.storage_fee,
            total_fwd_fee: self.total_fwd_fee,
            in_forward_fee: self.in_forward_fee,
            total_action_fee: self.total_action_fee,
        }
    }

    pub fn has_storage(&self) -> bool {
        self.old_storage.is_some() || self.new_storage.is_some()
    }
}

/// Per-phase fees of a transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub compute_fee: Option<u128>,
    pub storage_fee: Option<u128>,
    pub total_fwd_fee: Option<u128>,
    pub in_forward_fee: Option<u128>,
    pub total_action_fee: Option<u128>,
}

impl FeeBreakdown {
    /// Labelled fees in display order
    pub fn labelled(&self) -> [(&'static str, Option<u128>); 5] {
        [
            ("computeFee", self.compute_fee),
            ("storageFee", self.storage_fee),
            ("totalFwdFee", self.total_fwd_fee),
            ("inForwardFee", self.in_forward_fee),
            ("totalActionFee", self.total_action_fee),
        ]
    }
}

/// Coin amounts: JSON numbers, or decimal strings for values past `u64`
mod amount {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &Option<u128>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u128>, D::Error> {
        deserializer.deserialize_option(OptionVisitor)
    }

    struct OptionVisitor;

    impl<'de> Visitor<'de> for OptionVisitor {
        type Value = Option<u128>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an optional coin amount")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_any(AmountVisitor).map(Some)
        }
    }

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = u128;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer or a decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
            Ok(u128::from(v))
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
            u128::try_from(v).map_err(|_| E::custom(format!("negative amount {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
            v.parse::<u128>()
                .map_err(|_| E::custom(format!("invalid amount '{}'", v)))
        }
    }
}

/// Optional byte fields as hex strings
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_str(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| {
            let s = s.strip_prefix("0x").unwrap_or(&s);
            hex::decode(s).map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}
