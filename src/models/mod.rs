// src/models/mod.rs
pub mod document;
pub mod record;

pub use document::{AcquisitionMethod, AcquisitionResult, Document, DocumentKind};
pub use record::{
    format_amount, Branch, CandidateRecord, CanonicalRecord, Category, Direction, Provenance,
    RecordRow, RecordType, Section, AMOUNT_SLOTS, MISSING, SLOT_BASE_CONGRESSIONAL, SLOT_BASE_DOD,
    SLOT_REPROGRAMMING, SLOT_REVISED_TOTAL,
};
