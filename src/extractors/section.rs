// src/extractors/section.rs

// --- Imports ---
use crate::models::{Branch, Category, DocumentKind, Section};
use crate::patterns;
use crate::utils::config::ExtractorConfig;
use crate::utils::text::floor_char_boundary;

// --- Scan State ---
/// The "now" pointers of a baseline table scan.
///
/// Once a pointer is set it keeps its value until a later header overwrites it;
/// nothing ever clears it, since one category routinely spans many pages of lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ScanState {
    current_branch: Option<Branch>,
    current_category: Option<Category>,
}

impl ScanState {
    /// Updates the pointers from one line. Returns true if the line was a header.
    fn observe(&mut self, line: &str) -> bool {
        let mut header = false;
        if let Some(branch) = patterns::department_header(line) {
            self.current_branch = Some(branch);
            header = true;
        }
        if let Some(first) = patterns::appropriation_categories(line).first() {
            self.current_category = Some(first.category);
            // Titles such as "Operation and Maintenance, Navy" also name the branch.
            if let Some(branch) = patterns::branch_mention(line) {
                self.current_branch = Some(branch);
            }
            header = true;
        }
        header
    }
}

// --- Segmenter ---
pub struct SectionSegmenter {
    branch_lookback: usize,
}

impl SectionSegmenter {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self { branch_lookback: config.branch_lookback }
    }

    /// Splits `text` into ordered, non-overlapping sections using the grammar for `kind`.
    pub fn segment(&self, text: &str, kind: DocumentKind) -> Vec<Section> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let sections = match kind {
            DocumentKind::ReprogrammingAction => self.segment_reprogramming(text),
            DocumentKind::Baseline => self.segment_baseline(text),
        };
        tracing::debug!("Segmented {} bytes into {} {:?} sections", text.len(), sections.len(), kind);
        sections
    }

    /// One section per organizational-unit marker, running to the next marker.
    /// Text before the first marker belongs to no section; a document without
    /// any marker is a single unanchored section.
    fn segment_reprogramming(&self, text: &str) -> Vec<Section> {
        let units = patterns::organizational_units(text);
        if units.is_empty() {
            tracing::debug!("No organizational-unit markers; treating document as one section");
            return vec![Section { start: 0, end: text.len(), branch: None, category: None, anchor_end: None }];
        }

        units
            .iter()
            .enumerate()
            .map(|(i, unit)| {
                let end = units.get(i + 1).map(|next| next.start).unwrap_or(text.len());
                Section {
                    start: unit.start,
                    end,
                    branch: self.branch_before(text, unit.end),
                    category: None,
                    anchor_end: Some(unit.end),
                }
            })
            .collect()
    }

    /// Nearest organizational-unit marker ending at or before `pos`, within the look-back window.
    /// Nothing is inferred when the window holds no marker.
    pub fn branch_before(&self, text: &str, pos: usize) -> Option<Branch> {
        let pos = floor_char_boundary(text, pos);
        let window_start = floor_char_boundary(text, pos.saturating_sub(self.branch_lookback));
        patterns::organizational_units(&text[window_start..pos])
            .last()
            .map(|unit| unit.branch)
    }

    /// Left-to-right scan that opens a new section at every department header
    /// or category title line, stamping it with the pointers in force after that line.
    fn segment_baseline(&self, text: &str) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut state = ScanState::default();
        let mut open = Section { start: 0, end: 0, branch: None, category: None, anchor_end: None };
        let mut offset = 0;

        for line in text.split_inclusive('\n') {
            let before = state;
            if state.observe(line) {
                tracing::trace!(
                    "Header at {}: branch {:?} -> {:?}, category {:?} -> {:?}",
                    offset, before.current_branch, state.current_branch,
                    before.current_category, state.current_category
                );
                open.end = offset;
                if open.end > open.start {
                    sections.push(open);
                }
                open = Section {
                    start: offset,
                    end: offset,
                    branch: state.current_branch,
                    category: state.current_category,
                    anchor_end: None,
                };
            }
            offset += line.len();
        }

        open.end = text.len();
        if open.end > open.start {
            sections.push(open);
        }
        sections
    }
}
