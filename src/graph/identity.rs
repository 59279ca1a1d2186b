//! Participant identity and node shapes
//!
//! Every participant of a render pass gets a short node id (`A0`, `A1`, ...)
//! in first-seen order. The registry lives for one pass only.

use crate::address::Address;
use crate::graph::options::{DirectionType, GraphOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Registry key of the external sender; no canonical address can collide with it
const EXTERNAL_KEY: &str = "-1";
const EXTERNAL_LABEL: &str = "external";

/// Sender or receiver of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participant {
    /// Synthetic origin of externally originated messages
    External,
    Address(Address),
}

impl Participant {
    fn key(&self) -> String {
        match self {
            Participant::External => EXTERNAL_KEY.to_string(),
            Participant::Address(address) => address.canonical(),
        }
    }

    /// Display label: alias if one is configured, else the canonical address
    pub fn label(&self, options: &GraphOptions) -> String {
        match self {
            Participant::External => EXTERNAL_LABEL.to_string(),
            Participant::Address(address) => options
                .address_map
                .get(address)
                .cloned()
                .unwrap_or_else(|| address.canonical()),
        }
    }

    fn bracket(&self, options: &GraphOptions) -> Bracket {
        match self {
            Participant::External => Bracket::default(),
            Participant::Address(address) => options
                .bracket_map
                .get(address)
                .copied()
                .unwrap_or_default(),
        }
    }
}

impl From<Option<Address>> for Participant {
    fn from(value: Option<Address>) -> Self {
        value.map_or(Participant::External, Participant::Address)
    }
}

impl From<Address> for Participant {
    fn from(value: Address) -> Self {
        Participant::Address(value)
    }
}

/// Node identifier in the flowchart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "A{}", self.0)
    }
}

/// Node shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Bracket {
    #[default]
    Square,
    Diamond,
    Fillet,
    Rounded,
    Circle,
    Circle2,
    Hex,
    Sub,
    Flag,
    Db,
    ParallelR,
    ParallelL,
    TrapezoidT,
    TrapezoidB,
}

impl Bracket {
    /// Opening and closing delimiters
    pub fn delimiters(&self) -> (&'static str, &'static str) {
        match self {
            Bracket::Square => ("[", "]"),
            Bracket::Diamond => ("{", "}"),
            Bracket::Fillet => ("(", ")"),
            Bracket::Rounded => ("([", "])"),
            Bracket::Circle => ("((", "))"),
            Bracket::Circle2 => ("(((", ")))"),
            Bracket::Hex => ("{{", "}}"),
            Bracket::Sub => ("[[", "]]"),
            Bracket::Flag => (">", "]"),
            Bracket::Db => ("[(", ")]"),
            Bracket::ParallelR => ("[/", "/]"),
            Bracket::ParallelL => ("[\\", "\\]"),
            Bracket::TrapezoidT => ("[/", "\\]"),
            Bracket::TrapezoidB => ("[\\", "/]"),
        }
    }

    /// Wrap a quoted label in this shape
    pub fn wrap(&self, label: &str) -> String {
        let (open, close) = self.delimiters();
        format!("{}\"{}\"{}", open, label, close)
    }
}

/// Node declaration line: `\tA<n><shape>`
pub fn node_declaration(participant: &Participant, id: NodeId, options: &GraphOptions) -> String {
    format!(
        "\t{}{}",
        id,
        participant.bracket(options).wrap(&participant.label(options))
    )
}

/// First-seen id assignment for one render pass
#[derive(Debug, Default)]
pub struct NodeRegistry {
    ids: HashMap<String, NodeId>,
    next: usize,
    declarations: Vec<String>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `participant`.
    ///
    /// A participant seen for the first time gets the next id. Under the
    /// unidirectional policy a destination always gets a fresh id.
    pub fn assign(
        &mut self,
        participant: &Participant,
        is_destination: bool,
        options: &GraphOptions,
    ) -> NodeId {
        let key = participant.key();
        let fresh = is_destination && options.direction_type == DirectionType::Unidirectional;
        if !fresh && let Some(id) = self.ids.get(&key) {
            return *id;
        }

        let id = NodeId(self.next);
        self.next += 1;
        self.ids.insert(key, id);
        self.declarations
            .push(node_declaration(participant, id, options));
        id
    }

    /// Ids handed out so far
    pub fn len(&self) -> usize {
        self.next
    }

    pub fn is_empty(&self) -> bool {
        self.next == 0
    }

    pub fn declarations(&self) -> &[String] {
        &self.declarations
    }
}
