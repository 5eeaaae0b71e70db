// src/extractors/assembler.rs
use crate::models::{AcquisitionMethod, CandidateRecord, CanonicalRecord, Document, Provenance, RecordType};

/// Confidence attached to every record of a document.
/// Direct text is exact; OCR and OCR-fallback hybrids carry the engine's confidence.
pub fn confidence_score(document: &Document) -> f64 {
    match document.acquisition_method() {
        AcquisitionMethod::DirectText => 100.0,
        AcquisitionMethod::Ocr | AcquisitionMethod::Hybrid => document.acquisition_confidence(),
    }
}

/// Accepts candidates that carry a branch, category or amount and stamps them with provenance.
/// Repeated documents yield repeated records; nothing is deduplicated here.
pub fn assemble(
    document: &Document,
    record_type: RecordType,
    candidates: Vec<CandidateRecord>,
) -> Vec<CanonicalRecord> {
    let provenance = Provenance {
        source_id: document.source_id().to_string(),
        extraction_method: document.acquisition_method(),
        confidence_score: confidence_score(document),
    };
    let total = candidates.len();
    let accepted: Vec<CanonicalRecord> = candidates
        .into_iter()
        .filter(CandidateRecord::has_signal)
        .map(|record| CanonicalRecord { record, record_type, provenance: provenance.clone() })
        .collect();

    if accepted.len() < total {
        tracing::debug!(
            "{}: dropped {} of {} candidates without branch, category or amount",
            document.source_id(), total - accepted.len(), total
        );
    }
    accepted
}
