// src/models/record.rs
use crate::models::document::AcquisitionMethod;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendering of a missing value at the export boundary.
pub const MISSING: &str = "-";

// --- Organizational Units ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Branch {
    Army,
    Navy,
    #[serde(rename = "Air Force")]
    AirForce,
    #[serde(rename = "Marines")]
    MarineCorps,
    #[serde(rename = "Defense-Wide")]
    DefenseWide,
    #[serde(rename = "Coast Guard")]
    CoastGuard,
}

impl Branch {
    pub fn label(&self) -> &'static str {
        match self {
            Branch::Army => "Army",
            Branch::Navy => "Navy",
            Branch::AirForce => "Air Force",
            Branch::MarineCorps => "Marines",
            Branch::DefenseWide => "Defense-Wide",
            Branch::CoastGuard => "Coast Guard",
        }
    }

    /// Maps a matched service name ("AIR  FORCE", "Marine Corps", ...) to its branch.
    pub fn from_name(name: &str) -> Option<Self> {
        let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase();
        match collapsed.as_str() {
            "ARMY" => Some(Branch::Army),
            "NAVY" => Some(Branch::Navy),
            "AIR FORCE" => Some(Branch::AirForce),
            "MARINE CORPS" | "MARINES" | "MARINE" => Some(Branch::MarineCorps),
            "DEFENSE-WIDE" | "DEFENSE WIDE" => Some(Branch::DefenseWide),
            "COAST GUARD" => Some(Branch::CoastGuard),
            _ => None,
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// --- Appropriation Categories ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Operation and Maintenance")]
    OperationAndMaintenance,
    #[serde(rename = "Military Personnel")]
    MilitaryPersonnel,
    #[serde(rename = "Weapons Procurement")]
    WeaponsProcurement,
    #[serde(rename = "Missile Procurement")]
    MissileProcurement,
    Procurement,
    #[serde(rename = "RDTE")]
    Rdte,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::OperationAndMaintenance => "Operation and Maintenance",
            Category::MilitaryPersonnel => "Military Personnel",
            Category::WeaponsProcurement => "Weapons Procurement",
            Category::MissileProcurement => "Missile Procurement",
            Category::Procurement => "Procurement",
            Category::Rdte => "RDTE",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Baseline,
    ReprogrammingAction,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Baseline => "baseline",
            RecordType::ReprogrammingAction => "reprogramming_action",
        }
    }
}

// --- Sections ---
/// A contiguous, non-overlapping span of a document's text.
/// Offsets are byte offsets into `Document::text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub start: usize,
    pub end: usize,
    pub branch: Option<Branch>,
    pub category: Option<Category>, // Only carried by baseline sections
    pub anchor_end: Option<usize>,  // End of the organizational-unit marker, if the section has one
}

impl Section {
    pub fn text<'a>(&self, document_text: &'a str) -> &'a str {
        &document_text[self.start..self.end]
    }
}

// --- Amount Slots ---
/// Positional meaning of `CandidateRecord::amounts`.
/// This ordering is a heuristic carried over from the source forms, not a verified layout.
pub const SLOT_BASE_CONGRESSIONAL: usize = 0;
pub const SLOT_BASE_DOD: usize = 1;
pub const SLOT_REPROGRAMMING: usize = 2;
pub const SLOT_REVISED_TOTAL: usize = 3;
pub const AMOUNT_SLOTS: usize = 4;

// --- Records ---
/// Fields extracted from one section, before the assembler accepts or drops it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub appropriation_category: Option<Category>,
    pub branch: Option<Branch>,
    pub fiscal_year_start: Option<u16>,
    pub fiscal_year_end: Option<u16>,
    pub budget_activity_number: Option<u32>,
    pub budget_activity_title: Option<String>,
    pub program_element_code: Option<String>,
    pub program_element: Option<String>, // Leading label of a baseline data line
    pub amounts: Vec<Option<f64>>,       // Native units, in order of the amount slots
    pub explanation: Option<String>,
    pub direction: Direction,
}

impl CandidateRecord {
    pub fn amount(&self, slot: usize) -> Option<f64> {
        self.amounts.get(slot).copied().flatten()
    }

    pub fn has_amounts(&self) -> bool {
        self.amounts.iter().any(Option::is_some)
    }

    /// A record must carry at least one of branch, category or an amount.
    pub fn has_signal(&self) -> bool {
        self.branch.is_some() || self.appropriation_category.is_some() || self.has_amounts()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_id: String,
    pub extraction_method: AcquisitionMethod,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(flatten)]
    pub record: CandidateRecord,
    pub record_type: RecordType,
    pub provenance: Provenance,
}

impl CanonicalRecord {
    pub fn base_congressional(&self) -> Option<f64> {
        self.record.amount(SLOT_BASE_CONGRESSIONAL)
    }

    pub fn base_dod(&self) -> Option<f64> {
        self.record.amount(SLOT_BASE_DOD)
    }

    pub fn reprogramming_amount(&self) -> Option<f64> {
        self.record.amount(SLOT_REPROGRAMMING)
    }

    pub fn revised_total(&self) -> Option<f64> {
        self.record.amount(SLOT_REVISED_TOTAL)
    }
}

// --- Export Row ---
/// One row of the flat record table. Column order is the export contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRow {
    pub appropriation_category: String,
    pub branch: String,
    pub fiscal_year_start: String,
    pub fiscal_year_end: String,
    pub budget_activity_number: String,
    pub budget_activity_title: String,
    pub program_element_code: String,
    pub program_base_congressional: String,
    pub program_base_dod: String,
    pub reprogramming_amount: String,
    pub revised_program_total: String,
    pub explanation: String,
    pub extraction_method: String,
    pub confidence_score: String,
    pub source_id: String,
}

impl RecordRow {
    pub const HEADERS: [&'static str; 15] = [
        "appropriation_category",
        "branch",
        "fiscal_year_start",
        "fiscal_year_end",
        "budget_activity_number",
        "budget_activity_title",
        "program_element_code",
        "program_base_congressional",
        "program_base_dod",
        "reprogramming_amount",
        "revised_program_total",
        "explanation",
        "extraction_method",
        "confidence_score",
        "source_id",
    ];
}

fn or_missing<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| MISSING.to_string())
}

/// Renders an amount without a trailing `.0` when it is integral.
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

impl From<&CanonicalRecord> for RecordRow {
    fn from(rec: &CanonicalRecord) -> Self {
        let r = &rec.record;
        // Baseline lines rarely carry a code; their leading label stands in for it.
        let program_element = r.program_element_code.clone().or_else(|| r.program_element.clone());
        Self {
            appropriation_category: or_missing(r.appropriation_category.map(|c| c.label())),
            branch: or_missing(r.branch.map(|b| b.label())),
            fiscal_year_start: or_missing(r.fiscal_year_start),
            fiscal_year_end: or_missing(r.fiscal_year_end),
            budget_activity_number: or_missing(r.budget_activity_number),
            budget_activity_title: or_missing(r.budget_activity_title.as_deref()),
            program_element_code: or_missing(program_element),
            program_base_congressional: or_missing(rec.base_congressional().map(format_amount)),
            program_base_dod: or_missing(rec.base_dod().map(format_amount)),
            reprogramming_amount: or_missing(rec.reprogramming_amount().map(format_amount)),
            revised_program_total: or_missing(rec.revised_total().map(format_amount)),
            explanation: or_missing(r.explanation.as_deref().filter(|e| !e.is_empty())),
            extraction_method: rec.provenance.extraction_method.to_string(),
            confidence_score: format!("{:.1}", rec.provenance.confidence_score),
            source_id: rec.provenance.source_id.clone(),
        }
    }
}
