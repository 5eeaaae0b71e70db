// src/flows/mod.rs
//! Flow aggregation.
//!
//! Records become weighted `category -> branch -> activity` edges. Edges sharing
//! a `(source, target, type)` key are summed; that sum is the only way an edge
//! ever changes. Accumulators can be built per document and merged in any order
//! before a single `finish`.

use crate::models::{CanonicalRecord, RecordType};
use crate::utils::config::ExtractorConfig;
use crate::utils::text::truncate_chars;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Node name used when a record lacks the field a node is built from.
/// Years are never defaulted: a record without a fiscal year adds nothing to `fiscal_years`.
pub const UNKNOWN_NODE: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    CategoryToBranch,
    BranchToActivity,
    Baseline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEdge {
    pub source_node: String,
    pub target_node: String,
    pub value: f64,
    pub fiscal_years: BTreeSet<String>,
    pub edge_type: EdgeType,
}

type EdgeKey = (String, String, EdgeType);
type BaselineKey = (String, String, Option<u16>); // category, branch, fiscal year

#[derive(Debug, Clone, Default, PartialEq)]
struct EdgeTotal {
    value: f64,
    fiscal_years: BTreeSet<String>,
}

impl EdgeTotal {
    fn add(&mut self, value: f64, fiscal_years: impl IntoIterator<Item = String>) {
        self.value += value;
        self.fiscal_years.extend(fiscal_years);
    }
}

// --- Accumulator ---
#[derive(Debug, Clone, PartialEq)]
pub struct FlowAccumulator {
    activity_label_max_chars: usize,
    baseline_flow_floor: f64,
    edges: BTreeMap<EdgeKey, EdgeTotal>,
    baseline_groups: BTreeMap<BaselineKey, f64>,
}

impl FlowAccumulator {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            activity_label_max_chars: config.activity_label_max_chars,
            baseline_flow_floor: config.baseline_flow_floor,
            edges: BTreeMap::new(),
            baseline_groups: BTreeMap::new(),
        }
    }

    pub fn add_records<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a CanonicalRecord>,
    {
        for record in records {
            self.add_record(record);
        }
    }

    pub fn add_record(&mut self, record: &CanonicalRecord) {
        let rec = &record.record;
        let category = rec.appropriation_category.map(|c| c.label()).unwrap_or(UNKNOWN_NODE).to_string();
        let branch = rec.branch.map(|b| b.label()).unwrap_or(UNKNOWN_NODE).to_string();
        let year = rec.fiscal_year_start;

        match record.record_type {
            RecordType::ReprogrammingAction => {
                let Some(amount) = record.reprogramming_amount() else { return };
                let weight = amount.abs();
                if let Some(title) = rec.budget_activity_title.as_deref().filter(|t| !t.is_empty()) {
                    let activity = truncate_chars(title, self.activity_label_max_chars).to_string();
                    self.edges
                        .entry((branch.clone(), activity, EdgeType::BranchToActivity))
                        .or_default()
                        .add(weight, year.map(|y| y.to_string()));
                }
                self.edges
                    .entry((category, branch, EdgeType::CategoryToBranch))
                    .or_default()
                    .add(weight, year.map(|y| y.to_string()));
            }
            RecordType::Baseline => {
                let Some(amount) = record.base_congressional() else { return };
                *self.baseline_groups.entry((category, branch, year)).or_insert(0.0) += amount;
            }
        }
    }

    /// Folds another accumulator into this one. Associative and commutative.
    pub fn merge(&mut self, other: FlowAccumulator) {
        for (key, total) in other.edges {
            self.edges.entry(key).or_default().add(total.value, total.fiscal_years);
        }
        for (key, value) in other.baseline_groups {
            *self.baseline_groups.entry(key).or_insert(0.0) += value;
        }
    }

    /// Applies the baseline materiality floor and produces the graph.
    /// Groups must sum to strictly more than the floor to become edges.
    pub fn finish(self) -> FlowGraph {
        let mut edges = self.edges;
        let mut suppressed = 0usize;
        for ((category, branch, year), value) in self.baseline_groups {
            if value > self.baseline_flow_floor {
                edges
                    .entry((category, branch, EdgeType::Baseline))
                    .or_default()
                    .add(value, year.map(|y| y.to_string()));
            } else {
                suppressed += 1;
            }
        }
        if suppressed > 0 {
            tracing::debug!("Suppressed {} baseline groups at or below {}", suppressed, self.baseline_flow_floor);
        }

        FlowGraph {
            edges: edges
                .into_iter()
                .map(|((source_node, target_node, edge_type), total)| FlowEdge {
                    source_node,
                    target_node,
                    value: total.value,
                    fiscal_years: total.fiscal_years,
                    edge_type,
                })
                .collect(),
        }
    }
}

/// One-shot aggregation over a complete record set.
pub fn aggregate(records: &[CanonicalRecord], config: &ExtractorConfig) -> FlowGraph {
    let mut accumulator = FlowAccumulator::new(config);
    accumulator.add_records(records);
    accumulator.finish()
}

// --- Graph & Export ---
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowGraph {
    pub edges: Vec<FlowEdge>, // Sorted by (source, target, type)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowExport {
    pub source: String,
    pub target: String,
    pub value: f64,
    pub fiscal_years: Vec<String>,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowMetadata {
    pub total_flows: usize,
    pub total_value: f64,
    pub fiscal_years: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowGraphExport {
    pub flows: Vec<FlowExport>,
    pub metadata: FlowMetadata,
}

impl FlowGraph {
    pub fn total_value(&self) -> f64 {
        self.edges.iter().map(|e| e.value).sum()
    }

    pub fn fiscal_years(&self) -> BTreeSet<String> {
        self.edges.iter().flat_map(|e| e.fiscal_years.iter().cloned()).collect()
    }

    /// The visualization export shape: flows plus summary metadata.
    pub fn to_export(&self) -> FlowGraphExport {
        FlowGraphExport {
            flows: self
                .edges
                .iter()
                .map(|e| FlowExport {
                    source: e.source_node.clone(),
                    target: e.target_node.clone(),
                    value: e.value,
                    fiscal_years: e.fiscal_years.iter().cloned().collect(),
                    edge_type: e.edge_type,
                })
                .collect(),
            metadata: FlowMetadata {
                total_flows: self.edges.len(),
                total_value: self.total_value(),
                fiscal_years: self.fiscal_years().into_iter().collect(),
            },
        }
    }
}
