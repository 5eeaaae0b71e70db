// src/extractors/pipeline.rs
use crate::extractors::assembler;
use crate::extractors::fields::{document_fiscal_year, FieldExtractor};
use crate::extractors::section::SectionSegmenter;
use crate::models::{CanonicalRecord, Document, DocumentKind, RecordType};
use crate::utils::config::ExtractorConfig;

/// How a document's grammar was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindSource {
    Caller,     // Passed in explicitly
    Filename,   // Filename convention
    AutoDetect, // Both grammars run, more records wins
}

#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub kind: DocumentKind,
    pub kind_source: KindSource,
    pub sections: usize,
    pub records: Vec<CanonicalRecord>,
}

/// Runs one document through segmentation, field extraction and assembly.
/// Holds no state between documents, so one instance can be shared by any number of callers.
pub struct DocumentExtractor {
    config: ExtractorConfig,
    segmenter: SectionSegmenter,
    fields: FieldExtractor,
}

impl DocumentExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            segmenter: SectionSegmenter::new(&config),
            fields: FieldExtractor::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extracts canonical records. `kind` overrides the filename convention;
    /// with neither, both grammars run and the one yielding more records wins,
    /// ties going to the baseline grammar.
    pub fn extract(&self, document: &Document, kind: Option<DocumentKind>) -> ExtractionOutcome {
        let (kind, kind_source) = match kind {
            Some(kind) => (Some(kind), KindSource::Caller),
            None => match DocumentKind::from_source_id(document.source_id()) {
                Some(kind) => (Some(kind), KindSource::Filename),
                None => (None, KindSource::AutoDetect),
            },
        };

        let outcome = match kind {
            Some(kind) => self.run_grammar(document, kind, kind_source),
            None => {
                let baseline = self.run_grammar(document, DocumentKind::Baseline, kind_source);
                let reprogramming = self.run_grammar(document, DocumentKind::ReprogrammingAction, kind_source);
                tracing::debug!(
                    "{}: auto-detect baseline={} reprogramming={}",
                    document.source_id(), baseline.records.len(), reprogramming.records.len()
                );
                if reprogramming.records.len() > baseline.records.len() {
                    reprogramming
                } else {
                    baseline
                }
            }
        };

        tracing::info!(
            "{}: {} records from {} {:?} sections ({:?})",
            document.source_id(), outcome.records.len(), outcome.sections, outcome.kind, outcome.kind_source
        );
        outcome
    }

    fn run_grammar(&self, document: &Document, kind: DocumentKind, kind_source: KindSource) -> ExtractionOutcome {
        let text = document.text();
        let document_year = document_fiscal_year(document.source_id(), text, self.config.fiscal_year_probe);
        let sections = self.segmenter.segment(text, kind);

        let (record_type, candidates) = match kind {
            DocumentKind::ReprogrammingAction => (
                RecordType::ReprogrammingAction,
                sections
                    .iter()
                    .map(|section| self.fields.extract_reprogramming(text, section, document_year))
                    .collect(),
            ),
            DocumentKind::Baseline => (
                RecordType::Baseline,
                sections
                    .iter()
                    .flat_map(|section| self.fields.extract_baseline(text, section, document_year))
                    .collect(),
            ),
        };

        ExtractionOutcome {
            kind,
            kind_source,
            sections: sections.len(),
            records: assembler::assemble(document, record_type, candidates),
        }
    }

    /// Extracts every document and concatenates the records in input order.
    pub fn extract_all<'a, I>(&self, documents: I, kind: Option<DocumentKind>) -> Vec<CanonicalRecord>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        documents
            .into_iter()
            .flat_map(|document| self.extract(document, kind).records)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AcquisitionMethod, Branch, Category};

    const REPROGRAMMING: &str = "\
ARMY INCREASE
Operation and Maintenance, Army, 05/05 +21
Budget Activity 1: Operating Forces
Explanation: Transfer for readiness.
NAVY DECREASE
Weapons Procurement, Navy, 05/07 -1,500
Budget Activity 2: Ships
";

    const BASELINE: &str = "\
FISCAL YEAR 2008 BASE FOR REPROGRAMMING
DEPARTMENT OF THE ARMY
Military Personnel, Army
Pay and Allowances 41,000,000 40,500,000
Page 3
Operation and Maintenance, Army
Training and Operations 25,250,000
";

    fn extractor() -> DocumentExtractor {
        DocumentExtractor::new(ExtractorConfig::default())
    }

    #[test]
    fn test_filename_selects_reprogramming_grammar() {
        let doc = Document::direct_text("FY05_IR_omnibus.txt", REPROGRAMMING);
        let outcome = extractor().extract(&doc, None);
        assert_eq!(outcome.kind, DocumentKind::ReprogrammingAction);
        assert_eq!(outcome.kind_source, KindSource::Filename);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[1].record.branch, Some(Branch::Navy));
        assert_eq!(outcome.records[1].reprogramming_amount(), Some(-1500.0));
        assert_eq!(outcome.records[1].record.budget_activity_title.as_deref(), Some("Ships"));
    }

    #[test]
    fn test_auto_detect_prefers_more_records() {
        let doc = Document::direct_text("unlabeled.txt", REPROGRAMMING);
        let outcome = extractor().extract(&doc, None);
        assert_eq!(outcome.kind_source, KindSource::AutoDetect);
        assert_eq!(outcome.kind, DocumentKind::ReprogrammingAction);

        let doc = Document::direct_text("unlabeled.txt", BASELINE);
        let outcome = extractor().extract(&doc, None);
        assert_eq!(outcome.kind, DocumentKind::Baseline);
        assert_eq!(outcome.records.len(), 2);
    }

    #[test]
    fn test_auto_detect_tie_goes_to_baseline() {
        let doc = Document::direct_text("unlabeled.txt", "nothing recognizable");
        let outcome = extractor().extract(&doc, None);
        assert_eq!(outcome.kind, DocumentKind::Baseline);
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn test_baseline_records_carry_document_year_and_pointers() {
        let doc = Document::new("FY2008_DD_1414.txt", BASELINE, AcquisitionMethod::Ocr, 88.0).unwrap();
        let outcome = extractor().extract(&doc, None);
        assert_eq!(outcome.kind, DocumentKind::Baseline);
        let recs = &outcome.records;
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].record.appropriation_category, Some(Category::MilitaryPersonnel));
        assert_eq!(recs[0].base_congressional(), Some(41_000_000.0));
        assert_eq!(recs[1].record.appropriation_category, Some(Category::OperationAndMaintenance));
        assert!(recs.iter().all(|r| r.record.branch == Some(Branch::Army)));
        assert!(recs.iter().all(|r| r.record.fiscal_year_start == Some(2008)));
        assert!(recs.iter().all(|r| r.provenance.confidence_score == 88.0));
    }

    #[test]
    fn test_caller_kind_overrides_filename() {
        let doc = Document::direct_text("FY05_IR_omnibus.txt", BASELINE);
        let outcome = extractor().extract(&doc, Some(DocumentKind::Baseline));
        assert_eq!(outcome.kind_source, KindSource::Caller);
        assert_eq!(outcome.records.len(), 2);
    }

    #[test]
    fn test_extract_all_concatenates_in_order() {
        let a = Document::direct_text("a_IR_.txt", REPROGRAMMING);
        let b = Document::direct_text("b_DD_1414.txt", BASELINE);
        let records = extractor().extract_all([&a, &b], None);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].provenance.source_id, "a_IR_.txt");
        assert_eq!(records[3].provenance.source_id, "b_DD_1414.txt");
    }
}
