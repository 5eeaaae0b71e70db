// src/lib.rs
//! Extracts structured appropriation records from the text of defense budget
//! documents (baseline tables and reprogramming actions) and aggregates them
//! into a weighted flow graph.
//!
//! The core is deterministic and does no I/O: text in, records and edges out.
//! `storage` and the binary handle files.

pub mod analysis;
pub mod extractors;
pub mod flows;
pub mod models;
pub mod patterns;
pub mod storage;
pub mod utils;

pub use analysis::RecordSummary;
pub use extractors::{normalize_amount, DocumentExtractor, ExtractionOutcome, KindSource};
pub use flows::{aggregate, EdgeType, FlowAccumulator, FlowEdge, FlowGraph, FlowGraphExport};
pub use models::{
    AcquisitionMethod, AcquisitionResult, Branch, CandidateRecord, CanonicalRecord, Category, Direction,
    Document, DocumentKind, Provenance, RecordRow, RecordType, Section,
};
pub use storage::{RunStats, StorageManager};
pub use utils::config::ExtractorConfig;
pub use utils::error::{AppError, ExtractError, StorageError};
