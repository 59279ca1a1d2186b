//! Graph module - turn a transaction trace into a flowchart and storage tables
//!
//! A render walks the transactions in order, assigns node ids to participants,
//! builds one annotated edge per transaction and, where a storage parser is
//! registered for the destination, a before/after table of its storage.
//! Everything accumulated during a render lives in a [`RenderPass`] that is
//! dropped once the markdown is compiled, so a [`TxGraph`] can be reused and
//! shared freely.

use crate::error::{Error, Result};
use crate::flatten::{DiffMode, DiffRow, FlatRecord, diff_flat, flatten};
use crate::format::{COIN_DECIMALS, flatten_display_label, from_nanos};
use crate::parser::StorageParser;
use crate::parser::codes::{exit_name, op_name};
use crate::style::{Classifier, HashAlgorithm, LongValuePolicy, TableColors};
use crate::table::{CellStyle, Column, Entry, MdTable, TableTitle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub mod captions;
pub mod identity;
pub mod options;
pub mod transaction;

// Re-export key types
pub use captions::{CaptionContext, CaptionHandler, CaptionMap, Captions};
pub use identity::{Bracket, NodeId, NodeRegistry, Participant};
pub use options::{
    ChartType, DirectionType, FeeDetails, FeeSelection, GraphOptions, GraphOverrides,
    StorageDisplay, StorageMap, TableInfo,
};
pub use transaction::{FeeBreakdown, Transaction};

/// Operation code of excess returns; their edges use the excess color
pub const EXCESS_OP: u32 = 0xd53276db;

/// Default chunk length of storage table cells
pub const DEFAULT_TABLE_LEN: usize = 48;
/// Smallest accepted maximum display length
pub const MIN_DISPLAY_LEN: usize = 48;
/// Default maximum display length before a value is replaced by its digest
pub const DEFAULT_MAX_DISPLAY_LEN: usize = 150;

const SIMPLE_TABLE_ARROW: &str = "**--->**";
const FORWARD_ARROW: &str = "-->";
const BACKWARD_ARROW: &str = "-.->";
const LABEL_SEPARATOR: &str = "<br/>";

/// Counters of a finished render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub participants: usize,
    pub edges: usize,
    pub tables: usize,
    pub skipped: usize,
}

/// Markdown output plus statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    #[serde(rename = "summary")]
    pub stats: GraphStats,
    /// Set when the output was written to disk
    pub path: Option<PathBuf>,
    #[serde(rename = "markdown")]
    pub text: String,
}

/// Transaction graph renderer
#[derive(Debug, Clone)]
pub struct TxGraph {
    options: GraphOptions,
    table_len: Option<usize>,
    max_display_len: Option<usize>,
    hash: HashAlgorithm,
}

impl Default for TxGraph {
    fn default() -> Self {
        Self::with_options(GraphOptions::default())
    }
}

impl TxGraph {
    /// Renderer with `overrides` layered over the built-in defaults
    pub fn new(overrides: GraphOverrides) -> Self {
        Self::with_options(GraphOptions::default().merged(&overrides))
    }

    pub fn with_options(options: GraphOptions) -> Self {
        Self {
            options,
            table_len: Some(DEFAULT_TABLE_LEN),
            max_display_len: Some(DEFAULT_MAX_DISPLAY_LEN),
            hash: HashAlgorithm::default(),
        }
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    pub fn table_len(&self) -> Option<usize> {
        self.table_len
    }

    /// Chunk length of storage table cells; `None` disables chunking
    pub fn set_table_len(&mut self, len: Option<usize>) -> Result<()> {
        // validated the same way the table does
        MdTable::default().set_line_len(len)?;
        self.table_len = len;
        Ok(())
    }

    pub fn max_display_len(&self) -> Option<usize> {
        self.max_display_len
    }

    /// Longest value shown verbatim; `None` never hashes
    pub fn set_max_display_len(&mut self, len: Option<usize>) -> Result<()> {
        if let Some(len) = len
            && len < MIN_DISPLAY_LEN
        {
            return Err(Error::config(format!("min len is {}", MIN_DISPLAY_LEN)));
        }
        self.max_display_len = len;
        Ok(())
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn set_hash_algorithm(&mut self, algorithm: HashAlgorithm) {
        self.hash = algorithm;
    }

    /// Render `transactions` to markdown.
    ///
    /// With a `name` the output is also written to `<folder>/<name>.md`.
    pub fn render(
        &self,
        transactions: &[Transaction],
        name: Option<&str>,
        overrides: Option<&GraphOverrides>,
    ) -> Result<String> {
        Ok(self.render_detailed(transactions, name, overrides)?.text)
    }

    /// Same as [`render`](Self::render), with statistics
    pub fn render_detailed(
        &self,
        transactions: &[Transaction],
        name: Option<&str>,
        overrides: Option<&GraphOverrides>,
    ) -> Result<Rendered> {
        let options = match overrides {
            Some(overrides) => self.options.merged(overrides),
            None => self.options.clone(),
        };

        let mut pass = RenderPass::new(self, &options);
        for tx in transactions {
            pass.add_transaction(tx)?;
        }
        let mut rendered = pass.compile();

        if let Some(name) = name {
            rendered.path = Some(persist(&options.folder, name, &rendered.text)?);
        }
        info!(
            participants = rendered.stats.participants,
            edges = rendered.stats.edges,
            tables = rendered.stats.tables,
            skipped = rendered.stats.skipped,
            "Rendered transaction graph"
        );
        Ok(rendered)
    }
}

fn persist(folder: &Path, name: &str, text: &str) -> Result<PathBuf> {
    let path = folder.join(format!("{}.md", name));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, text)?;
    info!("Graph exported to {}", path.display());
    Ok(path)
}

/// A fenced mermaid flowchart
fn mermaid_block(chart: ChartType, names: &[String], links: &[String], styles: &[String]) -> String {
    let mut out = format!("```mermaid\nflowchart {}\n", chart);
    for section in [names, links, styles] {
        for line in section {
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str("```\n");
    out
}

fn style_line(index: usize, color: &str) -> String {
    format!("\tlinkStyle {} stroke:{},color:{}", index, color, color)
}

/// One edge of the flowchart
struct Edge {
    from: NodeId,
    to: NodeId,
    arrow: &'static str,
    color: String,
    label: Vec<String>,
}

impl Edge {
    fn line(&self) -> String {
        format!(
            "\t{} {} |{}| {}",
            self.from,
            self.arrow,
            self.label.join(LABEL_SEPARATOR),
            self.to
        )
    }
}

/// Accumulated state of one render call
struct RenderPass<'a> {
    graph: &'a TxGraph,
    options: &'a GraphOptions,
    colors: Option<TableColors>,
    nodes: NodeRegistry,
    links: Vec<String>,
    styles: Vec<String>,
    tables: Vec<String>,
    skipped: usize,
}

impl<'a> RenderPass<'a> {
    fn new(graph: &'a TxGraph, options: &'a GraphOptions) -> Self {
        Self {
            graph,
            options,
            colors: options.color_table.resolve(),
            nodes: NodeRegistry::new(),
            links: Vec::new(),
            styles: Vec::new(),
            tables: Vec::new(),
            skipped: 0,
        }
    }

    fn add_transaction(&mut self, tx: &Transaction) -> Result<()> {
        if tx.from.is_none() && !self.options.show_origin {
            self.skipped += 1;
            debug!(to = %tx.to, "Skipping externally originated transaction");
            return Ok(());
        }
        let index = self.links.len();

        let source = Participant::from(tx.from);
        let destination = Participant::from(tx.to);
        let from = self.nodes.assign(&source, false, self.options);
        let to = self.nodes.assign(&destination, true, self.options);

        let (arrow, mut color) = if from <= to {
            (FORWARD_ARROW, self.options.color_forward.clone())
        } else {
            (BACKWARD_ARROW, self.options.color_backward.clone())
        };
        if tx.op == Some(EXCESS_OP) {
            color = self.options.color_excess.clone();
        }

        let edge = Edge {
            from,
            to,
            arrow,
            color,
            label: self.edge_label(tx, index),
        };
        debug!(index, from = %edge.from, to = %edge.to, "Added edge");

        if let Some(table) = self.storage_table(tx, index, &edge, &source, &destination)? {
            self.tables.push(table);
        }
        self.styles.push(style_line(index, &edge.color));
        self.links.push(edge.line());
        Ok(())
    }

    /// Label fragments in display order
    fn edge_label(&self, tx: &Transaction, index: usize) -> Vec<String> {
        let options = self.options;
        let hide = options.hide_ok_values;
        let mut label = Vec::new();
        let mut add = |name: &str, value: String| label.push(format!("{}: {}", name, value));

        if options.display_index {
            add("index", index.to_string());
        }
        if options.display_value
            && let Some(value) = tx.value
        {
            add("value", from_nanos(value, COIN_DECIMALS));
        }
        if options.display_fees
            && let Some(total) = tx.total_fees
        {
            match options.fee_details.selection() {
                Some(selection) => {
                    add("totalFee", from_nanos(total, COIN_DECIMALS));
                    let fees = tx.fee_breakdown().labelled();
                    for ((name, fee), shown) in fees.into_iter().zip(selection.flags()) {
                        if shown
                            && let Some(fee) = fee
                            && fee != 0
                        {
                            add(name, from_nanos(fee, COIN_DECIMALS));
                        }
                    }
                }
                None => add("fees", from_nanos(total, COIN_DECIMALS)),
            }
        }
        if options.display_op
            && let Some(op) = tx.op
        {
            add("op", op_name(&options.op_map, op));
        }
        if options.display_details
            && let (Some(op), Some(body)) = (tx.op, tx.body.as_deref())
        {
            for (name, value) in self.captions(op, body) {
                add(name.as_str(), value);
            }
        }
        if options.display_exit_code
            && let Some(code) = tx.exit_code
            && (!hide || code != 0)
        {
            add("exit", exit_name(&options.err_map, code));
        }
        if options.display_action_result
            && let Some(code) = tx.action_result_code
            && (!hide || code != 0)
        {
            add("action", exit_name(&options.err_map, code));
        }
        if options.display_deploy && (!hide || tx.deploy) {
            add("deploy", tx.deploy.to_string());
        }
        if options.display_aborted && (!hide || tx.aborted) {
            add("abort", tx.aborted.to_string());
        }
        if options.display_destroyed && (!hide || tx.destroyed) {
            add("destroy", tx.destroyed.to_string());
        }
        if options.display_success && (!hide || tx.success) {
            add("success", tx.success.to_string());
        }
        label
    }

    /// Caption handler output; a failing handler contributes nothing
    fn captions(&self, op: u32, body: &[u8]) -> Captions {
        let Some(handler) = self.options.captions_map.get(op) else {
            return Captions::new();
        };
        let ctx = CaptionContext {
            body,
            op_map: &self.options.op_map,
            err_map: &self.options.err_map,
            hide_ok_values: self.options.hide_ok_values,
        };
        handler.captions(&ctx).unwrap_or_else(|err| {
            debug!(op = %crate::format::to_hex_str(op), error = %err, "Caption handler failed");
            Captions::new()
        })
    }

    fn storage_table(
        &self,
        tx: &Transaction,
        index: usize,
        edge: &Edge,
        source: &Participant,
        destination: &Participant,
    ) -> Result<Option<String>> {
        let mode = match self.options.display_storage {
            StorageDisplay::Off => return Ok(None),
            StorageDisplay::Diff => DiffMode::Diff,
            StorageDisplay::Full => DiffMode::Full,
        };
        if !tx.has_storage() || tx.from.is_none() {
            return Ok(None);
        }
        let Some(parser) = self.options.storage_map.get(&tx.to) else {
            return Ok(None);
        };

        let (before, after) = match self.decode_storages(parser.as_ref(), tx) {
            Ok(records) => records,
            Err(err) => {
                warn!(index, to = %tx.to, error = %err, "Failed to decode storage");
                return Ok(None);
            }
        };
        let rows = diff_flat(&before, &after, mode);

        let mut table = self.difference_table(&rows)?;
        let info = match self.options.table_info {
            TableInfo::Simple => format!(
                "`{}` {} `{}`",
                flatten_display_label(&source.label(self.options)),
                SIMPLE_TABLE_ARROW,
                flatten_display_label(&destination.label(self.options)),
            ),
            TableInfo::Mermaid => mermaid_block(
                ChartType::LR,
                &[
                    identity::node_declaration(source, edge.from, self.options),
                    identity::node_declaration(destination, edge.to, self.options),
                ],
                &[edge.line()],
                &[style_line(0, &edge.color)],
            ),
        };
        table.set_title(TableTitle::new(format!("Index: {}", index), 2), Some(info.as_str()));
        Ok(Some(table.render()))
    }

    /// Flattened before/after storage; a missing side mirrors the other as undefined
    fn decode_storages(
        &self,
        parser: &dyn StorageParser,
        tx: &Transaction,
    ) -> anyhow::Result<(FlatRecord, FlatRecord)> {
        let divider = self.options.storage_divider.as_str();
        let decode = |blob: Option<&[u8]>| -> anyhow::Result<Option<FlatRecord>> {
            match blob {
                Some(raw) => Ok(Some(flatten(&parser.parse(raw)?, divider, None))),
                None => Ok(None),
            }
        };
        let before = decode(tx.old_storage.as_deref())?;
        let after = decode(tx.new_storage.as_deref())?;
        let records = match (before, after) {
            (Some(before), Some(after)) => (before, after),
            (Some(before), None) => {
                let after = before.undefined_like();
                (before, after)
            }
            (None, Some(after)) => (after.undefined_like(), after),
            (None, None) => (FlatRecord::new(), FlatRecord::new()),
        };
        Ok(records)
    }

    fn difference_table(&self, rows: &[DiffRow]) -> Result<MdTable> {
        let mut table = MdTable::new([
            Column::new("Name").with_default_style(CellStyle::code()),
            Column::from("Before"),
            Column::from("After"),
            Column::from("Diff"),
        ])?;
        table.set_line_len(self.graph.table_len)?;

        let classifier = Classifier::new(self.colors.as_ref(), &self.options.address_map);
        let policy = LongValuePolicy {
            max_len: self.graph.max_display_len,
            algorithm: self.graph.hash,
        };
        for row in rows {
            table.add_entry([
                Entry::new(row.key.as_str()),
                classifier.classify(&policy.apply(&row.before)),
                classifier.classify(&policy.apply(&row.after)),
                classifier.classify_delta(&row.delta),
            ])?;
        }
        Ok(table)
    }

    fn compile(self) -> Rendered {
        let styles: &[String] = if self.options.disable_styles {
            &[]
        } else {
            &self.styles
        };
        let mut text = mermaid_block(
            self.options.chart_type,
            self.nodes.declarations(),
            &self.links,
            styles,
        );

        if !self.tables.is_empty() {
            let mode = match self.options.display_storage {
                StorageDisplay::Full => DiffMode::Full,
                _ => DiffMode::Diff,
            };
            text.push_str(&format!("# Storage Tables ({})\n\n", mode.display_name()));
            for table in &self.tables {
                text.push_str(table);
                text.push('\n');
            }
        }

        Rendered {
            text,
            stats: GraphStats {
                participants: self.nodes.len(),
                edges: self.links.len(),
                tables: self.tables.len(),
                skipped: self.skipped,
            },
            path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::flatten::Value;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn addr(byte: u8) -> Address {
        Address::new(0, [byte; 32])
    }

    fn plain() -> GraphOverrides {
        GraphOverrides {
            display_index: Some(false),
            display_fees: Some(false),
            ..Default::default()
        }
    }

    fn json_storage() -> Arc<dyn StorageParser> {
        Arc::new(|blob: &[u8]| -> anyhow::Result<Value> {
            let json: serde_json::Value = serde_json::from_slice(blob)?;
            let object = json
                .as_object()
                .ok_or_else(|| anyhow::anyhow!("storage is not an object"))?;
            Ok(Value::object(object.iter().map(|(k, v)| {
                let value = match v {
                    serde_json::Value::Number(n) => n.as_i64().map(Value::Number).unwrap_or(Value::Null),
                    serde_json::Value::String(s) => Value::Str(s.clone()),
                    serde_json::Value::Bool(b) => Value::Bool(*b),
                    _ => Value::Null,
                };
                (k.clone(), value)
            })))
        })
    }

    fn with_storage(overrides: GraphOverrides, target: &Address) -> GraphOverrides {
        let mut storage_map = StorageMap::new();
        storage_map.insert(target, json_storage());
        GraphOverrides {
            storage_map: Some(storage_map),
            ..overrides
        }
    }

    #[test]
    fn test_end_to_end_example() {
        let x = addr(1);
        let y = addr(2);
        let txs = vec![
            Transaction::new(None, x).with_deploy(true),
            Transaction::new(Some(x), y).with_value(1_000_000_000).with_op(0x1),
        ];
        let graph = TxGraph::new(plain());
        let rendered = graph.render_detailed(&txs, None, None).unwrap();

        let expected = format!(
            "```mermaid\nflowchart TB\n\tA0[\"{}\"]\n\tA1[\"{}\"]\n\tA0 --> |value: 1<br/>op: 0x1| A1\n\tlinkStyle 0 stroke:#ff4747,color:#ff4747\n```\n",
            x.canonical(),
            y.canonical()
        );
        assert_eq!(rendered.text, expected);
        assert_eq!(
            rendered.stats,
            GraphStats {
                participants: 2,
                edges: 1,
                tables: 0,
                skipped: 1,
            }
        );
    }

    #[test]
    fn test_show_origin_uses_external_node() {
        let x = addr(1);
        let graph = TxGraph::new(GraphOverrides {
            show_origin: Some(true),
            ..plain()
        });
        let text = graph
            .render(&[Transaction::new(None, x)], None, None)
            .unwrap();
        assert!(text.contains("\tA0[\"external\"]\n"));
        assert!(text.contains("\tA0 --> || A1\n"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let (a, b) = (addr(1), addr(2));
        let txs = vec![
            Transaction::new(Some(a), b).with_value(10).with_fees(3),
            Transaction::new(Some(b), a).with_op(EXCESS_OP),
        ];
        let graph = TxGraph::default();
        let first = graph.render(&txs, None, None).unwrap();
        let second = graph.render(&txs, None, None).unwrap();
        let fresh = TxGraph::default().render(&txs, None, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, fresh);
    }

    #[test]
    fn test_backward_and_excess_colors() {
        let (a, b) = (addr(1), addr(2));
        let txs = vec![
            Transaction::new(Some(a), b),
            Transaction::new(Some(b), a),
            Transaction::new(Some(b), a).with_op(EXCESS_OP),
        ];
        let text = TxGraph::new(plain()).render(&txs, None, None).unwrap();
        assert!(text.contains("\tA1 -.-> || A0\n"));
        assert!(text.contains("\tlinkStyle 0 stroke:#ff4747,color:#ff4747\n"));
        assert!(text.contains("\tlinkStyle 1 stroke:#02dbdb,color:#02dbdb\n"));
        assert!(text.contains("\tlinkStyle 2 stroke:#0400f0,color:#0400f0\n"));
    }

    #[test]
    fn test_unidirectional_gives_destinations_fresh_ids() {
        let (a, b) = (addr(1), addr(2));
        let txs = vec![Transaction::new(Some(a), b), Transaction::new(Some(b), a)];

        let uni = TxGraph::new(GraphOverrides {
            direction_type: Some(DirectionType::Unidirectional),
            ..plain()
        });
        let text = uni.render(&txs, None, None).unwrap();
        assert!(text.contains("\tA1 --> || A2\n"));
        assert_eq!(uni.render_detailed(&txs, None, None).unwrap().stats.participants, 3);

        let bi = TxGraph::new(plain());
        let text = bi.render(&txs, None, None).unwrap();
        assert!(text.contains("\tA1 -.-> || A0\n"));
    }

    #[test]
    fn test_disable_styles_and_chart_type() {
        let txs = vec![Transaction::new(Some(addr(1)), addr(2))];
        let graph = TxGraph::new(GraphOverrides {
            disable_styles: Some(true),
            chart_type: Some(ChartType::LR),
            ..plain()
        });
        let text = graph.render(&txs, None, None).unwrap();
        assert!(text.starts_with("```mermaid\nflowchart LR\n"));
        assert!(!text.contains("linkStyle"));
    }

    #[test]
    fn test_hide_ok_values() {
        let tx = Transaction::new(Some(addr(1)), addr(2))
            .with_exit_code(0)
            .with_action_result(0)
            .with_aborted(false);
        let hidden = TxGraph::new(plain()).render(&[tx.clone()], None, None).unwrap();
        assert!(hidden.contains("|| A1"));

        let shown = TxGraph::new(GraphOverrides {
            hide_ok_values: Some(false),
            ..plain()
        })
        .render(&[tx], None, None)
        .unwrap();
        assert!(shown.contains("|exit: 0<br/>action: 0<br/>abort: false<br/>destroy: false| A1"));
    }

    #[test]
    fn test_deploy_flag_respects_hide_ok_values() {
        let (a, b) = (addr(1), addr(2));
        let deployed = Transaction::new(Some(a), b).with_deploy(true);
        let plain_tx = Transaction::new(Some(a), b);
        let graph = TxGraph::new(GraphOverrides {
            display_deploy: Some(true),
            ..plain()
        });
        assert!(graph.render(&[deployed], None, None).unwrap().contains("\tA0 --> |deploy: true| A1\n"));
        assert!(graph.render(&[plain_tx.clone()], None, None).unwrap().contains("\tA0 --> || A1\n"));

        let shown = TxGraph::new(GraphOverrides {
            display_deploy: Some(true),
            hide_ok_values: Some(false),
            ..plain()
        });
        assert!(shown
            .render(&[plain_tx], None, None)
            .unwrap()
            .contains("|deploy: false<br/>abort: false<br/>destroy: false| A1"));
    }

    #[test]
    fn test_success_flag_respects_hide_ok_values() {
        let (a, b) = (addr(1), addr(2));
        let succeeded = Transaction::new(Some(a), b).with_success(true);
        let failed = Transaction::new(Some(a), b).with_success(false);
        let graph = TxGraph::new(GraphOverrides {
            display_success: Some(true),
            ..plain()
        });
        assert!(graph.render(&[succeeded], None, None).unwrap().contains("|success: true| A1"));
        assert!(graph.render(&[failed.clone()], None, None).unwrap().contains("\tA0 --> || A1\n"));

        let shown = TxGraph::new(GraphOverrides {
            display_success: Some(true),
            hide_ok_values: Some(false),
            ..plain()
        });
        assert!(shown
            .render(&[failed], None, None)
            .unwrap()
            .contains("|abort: false<br/>destroy: false<br/>success: false| A1"));

        let off = TxGraph::new(plain())
            .render(&[Transaction::new(Some(a), b).with_success(true)], None, None)
            .unwrap();
        assert!(!off.contains("success"));
    }

    #[test]
    fn test_excess_color_without_op_label() {
        let (a, b) = (addr(1), addr(2));
        let tx = Transaction::new(Some(a), b)
            .with_value(1_000_000_000)
            .with_op(EXCESS_OP);
        let text = TxGraph::new(GraphOverrides {
            display_op: Some(false),
            ..plain()
        })
        .render(&[tx], None, None)
        .unwrap();
        assert!(text.contains("\tA0 --> |value: 1| A1\n"));
        assert!(!text.contains("op: "));
        assert!(text.contains("\tlinkStyle 0 stroke:#0400f0,color:#0400f0\n"));
    }

    #[test]
    fn test_exit_code_names() {
        let tx = Transaction::new(Some(addr(1)), addr(2)).with_exit_code(37);
        let mut err_map = crate::parser::CodesMap::new();
        err_map.insert(37, "not_enough_ton".to_string());

        let named = TxGraph::new(GraphOverrides {
            err_map: Some(err_map),
            ..plain()
        });
        assert!(named.render(&[tx.clone()], None, None).unwrap().contains("|exit: not_enough_ton|"));
        assert!(TxGraph::new(plain()).render(&[tx], None, None).unwrap().contains("|exit: 37|"));
    }

    #[test]
    fn test_fee_details() {
        let tx = Transaction::new(Some(addr(1)), addr(2))
            .with_fees(3_000_000)
            .with_fee_breakdown(FeeBreakdown {
                compute_fee: Some(2_000_000),
                storage_fee: Some(0),
                total_fwd_fee: Some(1_000_000),
                ..Default::default()
            });
        let base = GraphOverrides {
            display_index: Some(false),
            ..Default::default()
        };

        let text = TxGraph::new(base.clone()).render(&[tx.clone()], None, None).unwrap();
        assert!(text.contains("|fees: 0.003|"));

        let detailed = TxGraph::new(GraphOverrides {
            fee_details: Some(FeeDetails::Enabled(true)),
            ..base.clone()
        });
        let text = detailed.render(&[tx.clone()], None, None).unwrap();
        assert!(text.contains("|totalFee: 0.003<br/>computeFee: 0.002<br/>totalFwdFee: 0.001|"));

        let selected = TxGraph::new(GraphOverrides {
            fee_details: Some(FeeDetails::Select(FeeSelection {
                total_fwd_fee: true,
                ..Default::default()
            })),
            ..base
        });
        let text = selected.render(&[tx], None, None).unwrap();
        assert!(text.contains("|totalFee: 0.003<br/>totalFwdFee: 0.001|"));
    }

    fn body_len(ctx: &CaptionContext<'_>) -> anyhow::Result<Captions> {
        anyhow::ensure!(!ctx.body.is_empty(), "empty body");
        Ok(vec![("len".to_string(), ctx.body.len().to_string())])
    }

    #[test]
    fn test_caption_handlers_and_failures() {
        let op = 0x42;
        let mut captions_map = CaptionMap::new();
        captions_map.insert(op, Arc::new(body_len));
        let graph = TxGraph::new(GraphOverrides {
            captions_map: Some(captions_map),
            ..plain()
        });

        let good = Transaction::new(Some(addr(1)), addr(2)).with_op(op).with_body(vec![1, 2]);
        let bad = Transaction::new(Some(addr(1)), addr(2)).with_op(op).with_body(vec![]);
        let text = graph.render(&[good, bad], None, None).unwrap();
        assert!(text.contains("|op: 0x42<br/>len: 2|"));
        assert!(text.contains("|op: 0x42| A1"));
    }

    #[test]
    fn test_storage_diff_table() {
        let (a, b) = (addr(1), addr(2));
        let tx = Transaction::new(Some(a), b).with_storage(
            Some(br#"{"balance": 100, "owner": "alice", "same": 1}"#.to_vec()),
            Some(br#"{"balance": 250, "owner": "bob", "same": 1}"#.to_vec()),
        );
        let graph = TxGraph::new(with_storage(plain(), &b));
        let rendered = graph.render_detailed(&[tx], None, None).unwrap();
        let text = &rendered.text;

        assert_eq!(rendered.stats.tables, 1);
        let info = format!(
            "# Storage Tables (difference)\n\n## Index: 0\n\n```mermaid\nflowchart LR\n\tA0[\"{}\"]\n\tA1[\"{}\"]\n\tA0 --> || A1\n\tlinkStyle 0 stroke:#ff4747,color:#ff4747\n```\n\n\n| Name | Before | After | Diff |\n",
            a.canonical(),
            b.canonical()
        );
        assert!(text.contains(&info));
        assert!(text.contains(
            "| `balance` | <span style=\"color:#B0A104\">100</span> | <span style=\"color:#B0A104\">250</span> | <span style=\"color:#1DB515\">+150</span> |"
        ));
        assert!(text.contains(
            "| `owner` | <span style=\"color:#E700FF\">alice</span> | <span style=\"color:#E700FF\">bob</span> | - |"
        ));
        assert!(!text.contains("`same`"));
    }

    #[test]
    fn test_storage_full_table_and_simple_info() {
        let (a, b) = (addr(1), addr(2));
        let mut address_map = crate::address::AddressMap::new();
        address_map.insert(&a, "Sender<br/>Wallet".to_string());
        let overrides = GraphOverrides {
            display_storage: Some(StorageDisplay::Full),
            table_info: Some(TableInfo::Simple),
            color_table: Some(crate::style::ColorTable::Enabled(false)),
            address_map: Some(address_map),
            ..plain()
        };
        let tx = Transaction::new(Some(a), b).with_storage(
            Some(br#"{"count": 1}"#.to_vec()),
            Some(br#"{"count": 1}"#.to_vec()),
        );
        let text = TxGraph::new(with_storage(overrides, &b))
            .render(&[tx], None, None)
            .unwrap();

        assert!(text.contains("# Storage Tables (full)\n\n"));
        assert!(text.contains(&format!("`Sender Wallet` **--->** `{}`", b.canonical())));
        assert!(text.contains("| `count` | 1 | 1 | - |"));
    }

    #[test]
    fn test_missing_snapshot_reads_as_undefined() {
        let (a, b) = (addr(1), addr(2));
        let tx = Transaction::new(Some(a), b)
            .with_storage(None, Some(br#"{"seqno": 1}"#.to_vec()));
        let overrides = GraphOverrides {
            color_table: Some(crate::style::ColorTable::Enabled(false)),
            ..plain()
        };
        let text = TxGraph::new(with_storage(overrides, &b))
            .render(&[tx], None, None)
            .unwrap();
        assert!(text.contains("| `seqno` | undef | 1 | - |"));
    }

    #[test]
    fn test_failing_storage_parser_drops_table_only() {
        let (a, b) = (addr(1), addr(2));
        let tx = Transaction::new(Some(a), b)
            .with_value(1)
            .with_storage(Some(b"not json".to_vec()), None);
        let rendered = TxGraph::new(with_storage(plain(), &b))
            .render_detailed(&[tx], None, None)
            .unwrap();
        assert_eq!(rendered.stats.tables, 0);
        assert_eq!(rendered.stats.edges, 1);
        assert!(!rendered.text.contains("Storage Tables"));
    }

    #[test]
    fn test_storage_requires_registered_parser_and_origin() {
        let (a, b) = (addr(1), addr(2));
        let storage = Some(br#"{"x": 1}"#.to_vec());
        let unregistered = Transaction::new(Some(a), a).with_storage(None, storage.clone());
        let external = Transaction::new(None, b).with_storage(None, storage);
        let overrides = GraphOverrides {
            show_origin: Some(true),
            ..with_storage(plain(), &b)
        };
        let rendered = TxGraph::new(overrides)
            .render_detailed(&[unregistered, external], None, None)
            .unwrap();
        assert_eq!(rendered.stats.tables, 0);

        let off = GraphOverrides {
            display_storage: Some(StorageDisplay::Off),
            ..with_storage(plain(), &b)
        };
        let tx = Transaction::new(Some(a), b).with_storage(None, Some(br#"{"x": 1}"#.to_vec()));
        assert_eq!(TxGraph::new(off).render_detailed(&[tx], None, None).unwrap().stats.tables, 0);
    }

    #[test]
    fn test_long_values_are_hashed() {
        let (a, b) = (addr(1), addr(2));
        let long = "x".repeat(200);
        let tx = Transaction::new(Some(a), b).with_storage(
            Some(format!(r#"{{"blob": "{}"}}"#, long).into_bytes()),
            Some(br#"{"blob": "short"}"#.to_vec()),
        );
        let mut graph = TxGraph::new(with_storage(plain(), &b));
        graph.set_table_len(None).unwrap();
        let text = graph.render(&[tx.clone()], None, None).unwrap();
        assert!(text.contains("sha256: "));
        assert!(!text.contains(&long));

        graph.set_max_display_len(None).unwrap();
        graph.set_hash_algorithm(HashAlgorithm::Blake2b);
        let text = graph.render(&[tx], None, None).unwrap();
        assert!(text.contains(&long));
    }

    #[test]
    fn test_length_setters_validate() {
        let mut graph = TxGraph::default();
        assert!(graph.set_table_len(Some(9)).unwrap_err().is_config());
        graph.set_table_len(Some(10)).unwrap();
        assert_eq!(graph.table_len(), Some(10));
        assert!(graph.set_max_display_len(Some(47)).unwrap_err().is_config());
        graph.set_max_display_len(Some(48)).unwrap();
        assert_eq!(graph.max_display_len(), Some(48));
    }

    #[test]
    fn test_call_overrides_do_not_leak() {
        let txs = vec![Transaction::new(Some(addr(1)), addr(2)).with_value(1_000_000_000)];
        let graph = TxGraph::new(plain());
        let overridden = graph
            .render(
                &txs,
                None,
                Some(&GraphOverrides {
                    display_value: Some(false),
                    ..Default::default()
                }),
            )
            .unwrap();
        assert!(overridden.contains("|| A1"));
        assert!(graph.render(&txs, None, None).unwrap().contains("|value: 1| A1"));
        assert!(graph.options().display_value);
    }

    #[test]
    fn test_persist_to_folder() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("nested/graphs");
        let graph = TxGraph::new(GraphOverrides {
            folder: Some(folder.clone()),
            ..plain()
        });
        let txs = vec![Transaction::new(Some(addr(1)), addr(2))];
        let rendered = graph.render_detailed(&txs, Some("trace"), None).unwrap();

        let path = folder.join("trace.md");
        assert_eq!(rendered.path.as_deref(), Some(path.as_path()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), rendered.text);
    }

    proptest! {
        #[test]
        fn prop_render_is_deterministic(pairs in prop::collection::vec((0u8..6, 0u8..6), 0..20)) {
            let txs: Vec<Transaction> = pairs
                .iter()
                .map(|(from, to)| Transaction::new(Some(addr(*from)), addr(*to)).with_value(u128::from(*from)))
                .collect();
            let first = TxGraph::default().render_detailed(&txs, None, None).unwrap();
            let second = TxGraph::default().render_detailed(&txs, None, None).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.stats.edges, txs.len());
        }
    }
}
