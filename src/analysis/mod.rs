// src/analysis/mod.rs
use crate::models::CanonicalRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Records at or above this confidence count as high confidence.
pub const HIGH_CONFIDENCE: f64 = 90.0;

/// Aggregate statistics over an extracted record set.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RecordSummary {
    pub total_records: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_branch: BTreeMap<String, usize>,
    pub by_extraction_method: BTreeMap<String, usize>,
    pub by_record_type: BTreeMap<String, usize>,
    pub average_confidence: Option<f64>, // None for an empty record set
    pub high_confidence_records: usize,
    pub fiscal_years: Vec<u16>,
}

impl RecordSummary {
    pub fn from_records(records: &[CanonicalRecord]) -> Self {
        let mut summary = RecordSummary { total_records: records.len(), ..Default::default() };
        let mut years = BTreeSet::new();
        let mut confidence_total = 0.0;

        for rec in records {
            if let Some(category) = rec.record.appropriation_category {
                *summary.by_category.entry(category.label().to_string()).or_insert(0) += 1;
            }
            if let Some(branch) = rec.record.branch {
                *summary.by_branch.entry(branch.label().to_string()).or_insert(0) += 1;
            }
            *summary
                .by_extraction_method
                .entry(rec.provenance.extraction_method.as_str().to_string())
                .or_insert(0) += 1;
            *summary.by_record_type.entry(rec.record_type.as_str().to_string()).or_insert(0) += 1;

            confidence_total += rec.provenance.confidence_score;
            if rec.provenance.confidence_score >= HIGH_CONFIDENCE {
                summary.high_confidence_records += 1;
            }
            years.extend(rec.record.fiscal_year_start);
            years.extend(rec.record.fiscal_year_end);
        }

        if !records.is_empty() {
            summary.average_confidence = Some(confidence_total / records.len() as f64);
        }
        summary.fiscal_years = years.into_iter().collect();
        summary
    }

    /// Writes the summary to the log, one line per breakdown.
    pub fn log(&self) {
        tracing::info!("Records: {} ({} high confidence)", self.total_records, self.high_confidence_records);
        if let Some(avg) = self.average_confidence {
            tracing::info!("Average confidence: {:.1}", avg);
        }
        tracing::info!("By type: {:?}", self.by_record_type);
        tracing::info!("By category: {:?}", self.by_category);
        tracing::info!("By branch: {:?}", self.by_branch);
        tracing::info!("By method: {:?}", self.by_extraction_method);
        tracing::info!("Fiscal years: {:?}", self.fiscal_years);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AcquisitionMethod, Branch, CandidateRecord, Category, Provenance, RecordType};

    fn rec(
        category: Option<Category>,
        branch: Option<Branch>,
        year: Option<u16>,
        method: AcquisitionMethod,
        confidence: f64,
        record_type: RecordType,
    ) -> CanonicalRecord {
        CanonicalRecord {
            record: CandidateRecord {
                appropriation_category: category,
                branch,
                fiscal_year_start: year,
                fiscal_year_end: year,
                ..Default::default()
            },
            record_type,
            provenance: Provenance { source_id: "s".to_string(), extraction_method: method, confidence_score: confidence },
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = RecordSummary::from_records(&[]);
        assert_eq!(summary.total_records, 0);
        assert_eq!(summary.average_confidence, None);
        assert!(summary.fiscal_years.is_empty());
    }

    #[test]
    fn test_counts_and_confidence() {
        let records = vec![
            rec(Some(Category::Rdte), Some(Branch::Navy), Some(2006), AcquisitionMethod::DirectText, 100.0, RecordType::ReprogrammingAction),
            rec(Some(Category::Rdte), Some(Branch::Army), Some(2004), AcquisitionMethod::Ocr, 90.0, RecordType::ReprogrammingAction),
            rec(None, Some(Branch::Army), None, AcquisitionMethod::Ocr, 50.0, RecordType::Baseline),
        ];
        let summary = RecordSummary::from_records(&records);
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.by_category.get("RDTE"), Some(&2));
        assert_eq!(summary.by_category.len(), 1, "missing category is not counted");
        assert_eq!(summary.by_branch.get("Army"), Some(&2));
        assert_eq!(summary.by_extraction_method.get("ocr"), Some(&2));
        assert_eq!(summary.by_record_type.get("baseline"), Some(&1));
        assert_eq!(summary.high_confidence_records, 2, "90 is inclusive");
        assert_eq!(summary.average_confidence, Some(80.0));
        assert_eq!(summary.fiscal_years, vec![2004, 2006]);
    }

    #[test]
    fn test_serializes_with_sorted_keys() {
        let records = vec![
            rec(None, Some(Branch::Navy), None, AcquisitionMethod::Hybrid, 70.0, RecordType::Baseline),
            rec(None, Some(Branch::AirForce), None, AcquisitionMethod::Hybrid, 70.0, RecordType::Baseline),
        ];
        let json = serde_json::to_string(&RecordSummary::from_records(&records)).unwrap();
        let air = json.find("Air Force").unwrap();
        let navy = json.find("Navy").unwrap();
        assert!(air < navy);
    }
}
