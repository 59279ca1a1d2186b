//! Render options and their layering
//!
//! [`GraphOptions`] is a fully resolved option set. [`GraphOverrides`] carries
//! optional values that are layered on top with [`GraphOptions::merged`]:
//! built-in defaults, then instance overrides, then per-call overrides.

use crate::address::AddressMap;
use crate::graph::captions::CaptionMap;
use crate::graph::identity::Bracket;
use crate::parser::StorageParser;
use crate::parser::codes::{CodesMap, parse_code};
use crate::style::ColorTable;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_FOLDER: &str = "build/graph/";
pub const DEFAULT_STORAGE_DIVIDER: &str = " > ";
pub const DEFAULT_COLOR_FORWARD: &str = "#ff4747";
pub const DEFAULT_COLOR_BACKWARD: &str = "#02dbdb";
pub const DEFAULT_COLOR_EXCESS: &str = "#0400f0";

/// Whether a destination reuses the node of an earlier sighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionType {
    /// Every destination gets a fresh node
    Unidirectional,
    #[default]
    Bidirectional,
}

/// Flowchart direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChartType {
    #[default]
    TB,
    LR,
    BT,
    RL,
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ChartType::TB => "TB",
            ChartType::LR => "LR",
            ChartType::BT => "BT",
            ChartType::RL => "RL",
        };
        f.write_str(name)
    }
}

/// Storage table mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageDisplay {
    Off,
    /// Changed keys only
    #[default]
    Diff,
    /// Every key
    Full,
}

impl<'de> Deserialize<'de> for StorageDisplay {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Mode(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Flag(false) => Ok(StorageDisplay::Off),
            Repr::Flag(true) => Ok(StorageDisplay::Diff),
            Repr::Mode(mode) => match mode.as_str() {
                "off" => Ok(StorageDisplay::Off),
                "diff" => Ok(StorageDisplay::Diff),
                "full" => Ok(StorageDisplay::Full),
                other => Err(serde::de::Error::custom(format!(
                    "unknown storage display '{}', expected diff, full or off",
                    other
                ))),
            },
        }
    }
}

/// Which fee sub-fields to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeeSelection {
    pub compute_fee: bool,
    pub storage_fee: bool,
    pub total_fwd_fee: bool,
    pub in_forward_fee: bool,
    pub total_action_fee: bool,
}

impl FeeSelection {
    pub fn all() -> Self {
        Self {
            compute_fee: true,
            storage_fee: true,
            total_fwd_fee: true,
            in_forward_fee: true,
            total_action_fee: true,
        }
    }

    /// Flags in the same order as [`FeeBreakdown::labelled`](crate::graph::FeeBreakdown::labelled)
    pub fn flags(&self) -> [bool; 5] {
        [
            self.compute_fee,
            self.storage_fee,
            self.total_fwd_fee,
            self.in_forward_fee,
            self.total_action_fee,
        ]
    }
}

/// Fee breakdown policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FeeDetails {
    Enabled(bool),
    Select(FeeSelection),
}

impl Default for FeeDetails {
    fn default() -> Self {
        FeeDetails::Enabled(false)
    }
}

impl FeeDetails {
    /// `None` when only the total is shown
    pub fn selection(&self) -> Option<FeeSelection> {
        match self {
            FeeDetails::Enabled(false) => None,
            FeeDetails::Enabled(true) => Some(FeeSelection::all()),
            FeeDetails::Select(selection) => Some(*selection),
        }
    }
}

/// Caption shown above each storage table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableInfo {
    /// `` `from` **--->** `to` ``
    Simple,
    /// A two-node flowchart of the edge
    #[default]
    Mermaid,
}

/// Storage parsers by destination address
#[derive(Clone, Default)]
pub struct StorageMap(AddressMap<Arc<dyn StorageParser>>);

impl StorageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: &crate::address::Address, parser: Arc<dyn StorageParser>) {
        self.0.insert(address, parser);
    }

    pub fn get(&self, address: &crate::address::Address) -> Option<&Arc<dyn StorageParser>> {
        self.0.get(address)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn merged(&self, other: &StorageMap) -> StorageMap {
        StorageMap(self.0.merged(&other.0))
    }
}

impl fmt::Debug for StorageMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.0.iter().map(|(k, _)| k)).finish()
    }
}

/// A resolved option set
#[derive(Debug, Clone)]
pub struct GraphOptions {
    pub direction_type: DirectionType,
    pub chart_type: ChartType,
    pub folder: PathBuf,
    pub address_map: AddressMap<String>,
    pub bracket_map: AddressMap<Bracket>,
    pub storage_map: StorageMap,
    pub captions_map: CaptionMap,
    pub op_map: CodesMap,
    pub err_map: CodesMap,
    pub hide_ok_values: bool,
    pub display_index: bool,
    pub display_op: bool,
    pub display_storage: StorageDisplay,
    pub storage_divider: String,
    pub display_value: bool,
    pub display_fees: bool,
    pub display_details: bool,
    pub display_exit_code: bool,
    pub display_action_result: bool,
    pub display_deploy: bool,
    pub display_destroyed: bool,
    pub display_aborted: bool,
    pub display_success: bool,
    pub disable_styles: bool,
    pub fee_details: FeeDetails,
    pub show_origin: bool,
    pub color_forward: String,
    pub color_backward: String,
    pub color_excess: String,
    pub color_table: ColorTable,
    pub table_info: TableInfo,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            direction_type: DirectionType::default(),
            chart_type: ChartType::default(),
            folder: PathBuf::from(DEFAULT_FOLDER),
            address_map: AddressMap::new(),
            bracket_map: AddressMap::new(),
            storage_map: StorageMap::new(),
            captions_map: CaptionMap::builtin(),
            op_map: CodesMap::new(),
            err_map: CodesMap::new(),
            hide_ok_values: true,
            display_index: true,
            display_op: true,
            display_storage: StorageDisplay::default(),
            storage_divider: DEFAULT_STORAGE_DIVIDER.to_string(),
            display_value: true,
            display_fees: true,
            display_details: true,
            display_exit_code: true,
            display_action_result: true,
            display_deploy: false,
            display_destroyed: true,
            display_aborted: true,
            display_success: false,
            disable_styles: false,
            fee_details: FeeDetails::default(),
            show_origin: false,
            color_forward: DEFAULT_COLOR_FORWARD.to_string(),
            color_backward: DEFAULT_COLOR_BACKWARD.to_string(),
            color_excess: DEFAULT_COLOR_EXCESS.to_string(),
            color_table: ColorTable::default(),
            table_info: TableInfo::default(),
        }
    }
}

/// Optional values layered over a [`GraphOptions`]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphOverrides {
    pub direction_type: Option<DirectionType>,
    pub chart_type: Option<ChartType>,
    pub folder: Option<PathBuf>,
    /// Replaces the address aliases
    pub address_map: Option<AddressMap<String>>,
    /// Replaces the node shapes
    pub bracket_map: Option<AddressMap<Bracket>>,
    /// Merged into the storage parsers, these entries win
    #[serde(skip)]
    pub storage_map: Option<StorageMap>,
    /// Merged into the caption handlers, these entries win
    #[serde(skip)]
    pub captions_map: Option<CaptionMap>,
    #[serde(deserialize_with = "deserialize_codes")]
    pub op_map: Option<CodesMap>,
    #[serde(deserialize_with = "deserialize_codes")]
    pub err_map: Option<CodesMap>,
    pub hide_ok_values: Option<bool>,
    pub display_index: Option<bool>,
    pub display_op: Option<bool>,
    pub display_storage: Option<StorageDisplay>,
    pub storage_divider: Option<String>,
    pub display_value: Option<bool>,
    pub display_fees: Option<bool>,
    pub display_details: Option<bool>,
    pub display_exit_code: Option<bool>,
    pub display_action_result: Option<bool>,
    pub display_deploy: Option<bool>,
    pub display_destroyed: Option<bool>,
    pub display_aborted: Option<bool>,
    pub display_success: Option<bool>,
    pub disable_styles: Option<bool>,
    pub fee_details: Option<FeeDetails>,
    pub show_origin: Option<bool>,
    pub color_forward: Option<String>,
    pub color_backward: Option<String>,
    pub color_excess: Option<String>,
    pub color_table: Option<ColorTable>,
    pub table_info: Option<TableInfo>,
}

impl GraphOverrides {
    /// Layer `top` over `self`; values set in `top` win
    pub fn layered(&self, top: &GraphOverrides) -> GraphOverrides {
        macro_rules! pick {
            ($($field:ident),* $(,)?) => {
                GraphOverrides {
                    $($field: top.$field.clone().or_else(|| self.$field.clone()),)*
                    storage_map: match (&self.storage_map, &top.storage_map) {
                        (Some(base), Some(top)) => Some(base.merged(top)),
                        (base, top) => top.clone().or_else(|| base.clone()),
                    },
                    captions_map: match (&self.captions_map, &top.captions_map) {
                        (Some(base), Some(top)) => Some(base.merged(top)),
                        (base, top) => top.clone().or_else(|| base.clone()),
                    },
                }
            };
        }
        pick!(
            direction_type,
            chart_type,
            folder,
            address_map,
            bracket_map,
            op_map,
            err_map,
            hide_ok_values,
            display_index,
            display_op,
            display_storage,
            storage_divider,
            display_value,
            display_fees,
            display_details,
            display_exit_code,
            display_action_result,
            display_deploy,
            display_destroyed,
            display_aborted,
            display_success,
            disable_styles,
            fee_details,
            show_origin,
            color_forward,
            color_backward,
            color_excess,
            color_table,
            table_info,
        )
    }
}

impl GraphOptions {
    /// A copy of `self` with every value set in `overrides` applied
    pub fn merged(&self, overrides: &GraphOverrides) -> GraphOptions {
        macro_rules! apply {
            ($target:ident; $($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = &overrides.$field {
                        $target.$field = value.clone();
                    }
                )*
            };
        }

        let mut merged = self.clone();
        apply!(
            merged;
            direction_type,
            chart_type,
            folder,
            address_map,
            bracket_map,
            op_map,
            err_map,
            hide_ok_values,
            display_index,
            display_op,
            display_storage,
            storage_divider,
            display_value,
            display_fees,
            display_details,
            display_exit_code,
            display_action_result,
            display_deploy,
            display_destroyed,
            display_aborted,
            display_success,
            disable_styles,
            fee_details,
            show_origin,
            color_forward,
            color_backward,
            color_excess,
            color_table,
            table_info,
        );
        if let Some(storage_map) = &overrides.storage_map {
            merged.storage_map = self.storage_map.merged(storage_map);
        }
        if let Some(captions_map) = &overrides.captions_map {
            merged.captions_map = self.captions_map.merged(captions_map);
        }
        merged
    }
}

/// Code tables keyed by decimal or `0x` hex strings
fn deserialize_codes<'de, D>(deserializer: D) -> std::result::Result<Option<CodesMap>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<HashMap<String, String>>::deserialize(deserializer)?;
    raw.map(|entries| {
        entries
            .into_iter()
            .map(|(key, name)| {
                parse_code(&key)
                    .map(|code| (code, name))
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid code '{}'", key)))
            })
            .collect()
    })
    .transpose()
}
