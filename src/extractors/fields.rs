// src/extractors/fields.rs

// --- Imports ---
use crate::extractors::amount::normalize_amount;
use crate::models::{
    CandidateRecord, Direction, Section, AMOUNT_SLOTS, SLOT_BASE_CONGRESSIONAL, SLOT_REPROGRAMMING,
};
use crate::patterns::{self, CategoryMatch, FiscalYearMatch, Spanned};
use crate::utils::config::ExtractorConfig;
use crate::utils::text::{ceil_char_boundary, floor_char_boundary, line_bounds, truncate_chars};
use std::ops::Range;

/// A fiscal-year span as `(start, end)`.
pub type FiscalYears = (u16, u16);

/// Fiscal year stated for the whole document: the first `FY`/`Fiscal Year`
/// expression in the source id, then in the leading `probe` characters of text.
pub fn document_fiscal_year(source_id: &str, text: &str, probe: usize) -> Option<FiscalYears> {
    // Filenames separate tokens with underscores, which are word characters to the recognizer.
    let name = source_id.replace('_', " ");
    let head = &text[..floor_char_boundary(text, probe)];
    [name.as_str(), head]
        .iter()
        .find_map(|part| patterns::fiscal_years(part).into_iter().find(|m| m.prefixed))
        .map(|m| (m.start_year, m.end_year))
}

// --- Field Extractor ---
pub struct FieldExtractor {
    config: ExtractorConfig,
}

impl FieldExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Extracts one candidate from a reprogramming-action section.
    ///
    /// The action line is the line holding the category nearest the anchor; its
    /// first amount after the fiscal-year prefix is the delta. Sections without a
    /// usable action line fall back to positional amount slots over the section.
    pub fn extract_reprogramming(
        &self,
        text: &str,
        section: &Section,
        document_year: Option<FiscalYears>,
    ) -> CandidateRecord {
        let body = section.text(text);
        let anchor = section.anchor_end.map(|end| end - section.start).unwrap_or(0);
        let mut record = CandidateRecord { branch: section.branch, ..Default::default() };

        let category = self.nearest_category(body, anchor);
        record.appropriation_category = category.as_ref().map(|c| c.category);

        let activity_window = self.window(body, anchor, self.config.activity_window);
        if let Some(activity) = patterns::budget_activity_headers(&body[activity_window]).into_iter().next() {
            record.budget_activity_number = Some(activity.number);
            record.budget_activity_title = activity.title;
        }

        let explanation_window = self.window(body, anchor, self.config.explanation_window);
        if let Some(block) = patterns::explanation_blocks(&body[explanation_window]).into_iter().next() {
            record.explanation = Some(truncate_chars(&block.text, self.config.explanation_max_chars).to_string());
        }

        record.program_element_code = patterns::program_element_codes(body).into_iter().next().map(|m| m.code);

        let action = category.as_ref().map(|c| action_line(body, c));
        let action_year = action.as_ref().and_then(|a| a.year.clone());
        let section_year = patterns::fiscal_years(body).into_iter().next();
        let years = action_year
            .or(section_year)
            .map(|m| (m.start_year, m.end_year))
            .or(document_year);
        if let Some((start, end)) = years {
            record.fiscal_year_start = Some(start);
            record.fiscal_year_end = Some(end);
        }

        match action.and_then(|a| a.delta_raw) {
            Some(raw) => {
                let delta = normalize_amount(&raw);
                let mut slots = vec![None; AMOUNT_SLOTS];
                slots[SLOT_REPROGRAMMING] = delta;
                record.amounts = slots;
                tracing::trace!("Action delta {:?} -> {:?}", raw, delta);
            }
            None => {
                record.amounts = self.positional_amounts(body, anchor);
                tracing::debug!(
                    "No action line at section {}..{}; {} positional amounts",
                    section.start, section.end, record.amounts.len()
                );
            }
        }

        record.direction = match record.amount(SLOT_REPROGRAMMING) {
            Some(v) if v < 0.0 => Direction::Decrease,
            Some(_) => Direction::Increase,
            None => anchor_direction(&body[..anchor]),
        };
        record
    }

    /// Extracts one candidate per qualifying data line of a baseline section.
    ///
    /// A line's representative amount is the largest number on it. Baseline
    /// tables print several related totals per line and this picks one by size;
    /// it is a heuristic, not a reading of the column headers.
    pub fn extract_baseline(
        &self,
        text: &str,
        section: &Section,
        document_year: Option<FiscalYears>,
    ) -> Vec<CandidateRecord> {
        let body = section.text(text);
        let years = document_year.or_else(|| {
            patterns::fiscal_years(body)
                .into_iter()
                .find(|m| m.prefixed)
                .map(|m| (m.start_year, m.end_year))
        });

        let mut records = Vec::new();
        for line in body.lines() {
            // Header lines set the pointers; a total printed on them is not a line item.
            if patterns::is_baseline_header(line) {
                continue;
            }
            let Some(data) = patterns::data_line(line) else { continue };
            let values: Vec<f64> = patterns::monetary_amounts(&line[data.numbers_start..])
                .iter()
                .filter_map(|m| normalize_amount(&m.raw))
                .collect();
            let Some(leading) = values.first().copied() else { continue };
            if leading.abs() < self.config.baseline_line_floor {
                tracing::trace!("Discarding immaterial line {:?} (leading value {})", line.trim(), leading);
                continue;
            }
            let largest = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            let mut amounts = vec![None; SLOT_BASE_CONGRESSIONAL + 1];
            amounts[SLOT_BASE_CONGRESSIONAL] = Some(largest);
            records.push(CandidateRecord {
                appropriation_category: section.category,
                branch: section.branch,
                fiscal_year_start: years.map(|y| y.0),
                fiscal_year_end: years.map(|y| y.1),
                program_element_code: patterns::program_element_codes(line).into_iter().next().map(|m| m.code),
                program_element: Some(truncate_chars(&data.label, self.config.program_element_max_chars).to_string()),
                amounts,
                ..Default::default()
            });
        }
        records
    }

    /// The category closest to the anchor, if one lies within the configured radius.
    fn nearest_category(&self, body: &str, anchor: usize) -> Option<CategoryMatch> {
        patterns::appropriation_categories(body)
            .into_iter()
            .map(|m| {
                let distance = if m.start >= anchor { m.start - anchor } else { anchor.saturating_sub(m.end) };
                (distance, m)
            })
            .filter(|(distance, _)| *distance <= self.config.category_radius)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, m)| m)
    }

    fn window(&self, body: &str, from: usize, len: usize) -> Range<usize> {
        let start = floor_char_boundary(body, from);
        start..ceil_char_boundary(body, from.saturating_add(len))
    }

    /// Amounts in order of appearance, skipping numbers that belong to other
    /// recognized fields. Slot meaning is positional: base, DoD, reprogramming, revised.
    fn positional_amounts(&self, body: &str, anchor: usize) -> Vec<Option<f64>> {
        let mut masked: Vec<Range<usize>> = vec![0..anchor];
        masked.extend(patterns::fiscal_years(body).iter().map(Spanned::span));
        masked.extend(patterns::budget_activity_headers(body).iter().map(Spanned::span));
        masked.extend(patterns::program_element_codes(body).iter().map(Spanned::span));
        masked.extend(patterns::explanation_blocks(body).iter().map(Spanned::span));

        patterns::monetary_amounts(body)
            .into_iter()
            .filter(|m| !masked.iter().any(|span| m.overlaps(span)))
            .take(AMOUNT_SLOTS)
            .map(|m| normalize_amount(&m.raw))
            .collect()
    }
}

// --- Action Line ---
struct ActionLine {
    year: Option<FiscalYearMatch>,
    delta_raw: Option<String>,
}

/// Reads "<Category>, <Branch>, <FY>/<FY> <amount>" starting at the category match.
fn action_line(body: &str, category: &CategoryMatch) -> ActionLine {
    let (_, line_end) = line_bounds(body, category.start);
    let rest_start = category.end.min(line_end);
    let rest = &body[rest_start..line_end];

    let year = patterns::fiscal_years(rest).into_iter().next();
    let after_year = year.as_ref().map(|y| y.end).unwrap_or(0);
    let delta_raw = patterns::monetary_amounts(&rest[after_year..]).into_iter().next().map(|m| m.raw);

    ActionLine {
        year: year.map(|y| FiscalYearMatch { start: y.start + rest_start, end: y.end + rest_start, ..y }),
        delta_raw,
    }
}

fn anchor_direction(anchor_text: &str) -> Direction {
    patterns::organizational_units(anchor_text)
        .last()
        .map(|unit| unit.direction)
        .unwrap_or(Direction::Unknown)
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Branch, Category};
    use crate::utils::config::{DEFAULT_EXPLANATION_MAX_CHARS, DEFAULT_PROGRAM_ELEMENT_MAX_CHARS};

    fn extractor() -> FieldExtractor {
        FieldExtractor::new(&ExtractorConfig::default())
    }

    fn anchored(text: &str, anchor: &str, branch: Branch) -> Section {
        let start = text.find(anchor).unwrap();
        Section { start, end: text.len(), branch: Some(branch), category: None, anchor_end: Some(start + anchor.len()) }
    }

    #[test]
    fn test_reprogramming_action_fields() {
        let text = "ARMY INCREASE\nOperation and Maintenance, Army, 05/05 +21\nBudget Activity 1: Operating Forces\nExplanation: Transfer for readiness.";
        let rec = extractor().extract_reprogramming(text, &anchored(text, "ARMY INCREASE", Branch::Army), None);
        assert_eq!(rec.branch, Some(Branch::Army));
        assert_eq!(rec.appropriation_category, Some(Category::OperationAndMaintenance));
        assert_eq!(rec.fiscal_year_start, Some(2005));
        assert_eq!(rec.fiscal_year_end, Some(2005));
        assert_eq!(rec.budget_activity_number, Some(1));
        assert_eq!(rec.budget_activity_title.as_deref(), Some("Operating Forces"));
        assert_eq!(rec.amount(SLOT_REPROGRAMMING), Some(21.0));
        assert_eq!(rec.direction, Direction::Increase);
        assert_eq!(rec.explanation.as_deref(), Some("Transfer for readiness."));
    }

    #[test]
    fn test_explicit_minus_is_a_decrease() {
        let text = "NAVY DECREASE\nWeapons Procurement, Navy, 07/09 -1,500\n";
        let rec = extractor().extract_reprogramming(text, &anchored(text, "NAVY DECREASE", Branch::Navy), None);
        assert_eq!(rec.appropriation_category, Some(Category::WeaponsProcurement));
        assert_eq!((rec.fiscal_year_start, rec.fiscal_year_end), (Some(2007), Some(2009)));
        assert_eq!(rec.amount(SLOT_REPROGRAMMING), Some(-1500.0));
        assert_eq!(rec.direction, Direction::Decrease);
    }

    #[test]
    fn test_unsigned_delta_defaults_to_increase() {
        let text = "AIR FORCE DECREASE\nMilitary Personnel, Air Force, 99/00 350\n";
        let rec = extractor().extract_reprogramming(text, &anchored(text, "AIR FORCE DECREASE", Branch::AirForce), None);
        assert_eq!(rec.fiscal_year_start, Some(1999));
        assert_eq!(rec.fiscal_year_end, Some(2000));
        assert_eq!(rec.amount(SLOT_REPROGRAMMING), Some(350.0));
        assert_eq!(rec.direction, Direction::Increase);
    }

    #[test]
    fn test_category_beyond_radius_is_ignored() {
        let text = format!("ARMY INCREASE\n{}\nProcurement, Army, 05/05 +9", "x".repeat(600));
        let rec = extractor().extract_reprogramming(&text, &anchored(&text, "ARMY INCREASE", Branch::Army), None);
        assert_eq!(rec.appropriation_category, None);
    }

    #[test]
    fn test_positional_fallback_skips_recognized_fields() {
        let text = "ARMY DECREASE\nFY 2004 program 0603001A\n1,000 2,000 -500 2,500\nBudget Activity 3: Training\n";
        let rec = extractor().extract_reprogramming(text, &anchored(text, "ARMY DECREASE", Branch::Army), None);
        assert_eq!(rec.appropriation_category, None);
        assert_eq!(rec.program_element_code.as_deref(), Some("0603001A"));
        assert_eq!(rec.fiscal_year_start, Some(2004));
        assert_eq!(rec.amounts, vec![Some(1000.0), Some(2000.0), Some(-500.0), Some(2500.0)]);
        assert_eq!(rec.direction, Direction::Decrease);
    }

    #[test]
    fn test_document_year_is_last_resort() {
        let text = "ARMY INCREASE\nOperation and Maintenance, Army +21\n";
        let rec = extractor().extract_reprogramming(text, &anchored(text, "ARMY INCREASE", Branch::Army), Some((2012, 2012)));
        assert_eq!(rec.fiscal_year_start, Some(2012));
        assert_eq!(rec.amount(SLOT_REPROGRAMMING), Some(21.0));
    }

    #[test]
    fn test_no_amount_keeps_marker_direction() {
        let text = "COAST GUARD DECREASE\nnarrative only\n";
        let rec = extractor().extract_reprogramming(text, &anchored(text, "COAST GUARD DECREASE", Branch::CoastGuard), None);
        assert!(!rec.has_amounts());
        assert_eq!(rec.direction, Direction::Decrease);
        assert!(rec.has_signal());
    }

    #[test]
    fn test_baseline_lines_take_largest_amount_and_skip_noise() {
        let text = "Procurement, Army\nTrucks and Trailers 12,000 15,500 14,000\nPage 1,2\nFootnote 0,500\nRadios 3,000\n";
        let section = Section {
            start: 0,
            end: text.len(),
            branch: Some(Branch::Army),
            category: Some(Category::Procurement),
            anchor_end: None,
        };
        let recs = extractor().extract_baseline(text, &section, Some((2010, 2010)));
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].program_element.as_deref(), Some("Trucks and Trailers"));
        assert_eq!(recs[0].amount(SLOT_BASE_CONGRESSIONAL), Some(15_500.0));
        assert_eq!(recs[0].fiscal_year_start, Some(2010));
        assert_eq!(recs[1].amount(SLOT_BASE_CONGRESSIONAL), Some(3_000.0));
        assert!(recs.iter().all(|r| r.branch == Some(Branch::Army)));
    }

    #[test]
    fn test_header_line_total_is_not_a_line_item() {
        let text = "Procurement, Army 5,000,000\nTrucks 2,000,000\nRadios 3,000,000\nDEPARTMENT OF THE NAVY 9,000,000\n";
        let section = Section {
            start: 0,
            end: text.len(),
            branch: Some(Branch::Army),
            category: Some(Category::Procurement),
            anchor_end: None,
        };
        let recs = extractor().extract_baseline(text, &section, None);
        let labels: Vec<&str> = recs.iter().filter_map(|r| r.program_element.as_deref()).collect();
        assert_eq!(labels, vec!["Trucks", "Radios"]);
        let total: f64 = recs.iter().filter_map(|r| r.amount(SLOT_BASE_CONGRESSIONAL)).sum();
        assert_eq!(total, 5_000_000.0, "category total must not be counted on top of its items");
    }

    #[test]
    fn test_program_element_label_capped_on_char_boundary() {
        let label = format!("Equipment {}", "é".repeat(120));
        let text = format!("{} 12,000\n", label);
        let section = Section { start: 0, end: text.len(), branch: None, category: None, anchor_end: None };
        let recs = extractor().extract_baseline(&text, &section, None);
        assert_eq!(recs.len(), 1);
        let kept = recs[0].program_element.as_deref().unwrap();
        assert_eq!(kept.chars().count(), DEFAULT_PROGRAM_ELEMENT_MAX_CHARS);
        assert!(label.starts_with(kept));
    }

    #[test]
    fn test_explanation_capped_at_max_chars() {
        let long = "word ".repeat(200);
        let text = format!("ARMY INCREASE\nOperation and Maintenance, Army, 05/05 +21\nExplanation: {}\n", long);
        let rec = extractor().extract_reprogramming(&text, &anchored(&text, "ARMY INCREASE", Branch::Army), None);
        let explanation = rec.explanation.unwrap();
        assert_eq!(explanation.chars().count(), DEFAULT_EXPLANATION_MAX_CHARS);
        assert!(explanation.starts_with("word word"));
    }

    #[test]
    fn test_baseline_floor_is_absolute_value() {
        let text = "Adjustment -999,000\nRounding 999\nSmall 0,999\n";
        let section = Section { start: 0, end: text.len(), branch: None, category: None, anchor_end: None };
        let recs = extractor().extract_baseline(text, &section, None);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].amount(SLOT_BASE_CONGRESSIONAL), Some(-999_000.0));
    }

    #[test]
    fn test_document_fiscal_year_from_filename_then_text() {
        assert_eq!(document_fiscal_year("FY2010_DD_1414.pdf", "", 1000), Some((2010, 2010)));
        assert_eq!(document_fiscal_year("scan.pdf", "FISCAL YEAR 1996 BASE", 1000), Some((1996, 1996)));
        assert_eq!(document_fiscal_year("scan.pdf", "05/05 only bare pairs", 1000), None);
    }
}
