// src/extractors/mod.rs
pub mod amount;
pub mod assembler;
pub mod fields;
pub mod pipeline;
pub mod section;

// Re-export key extraction types for convenience
pub use amount::{normalize_amount, strip_scale};
pub use fields::{document_fiscal_year, FieldExtractor, FiscalYears};
pub use pipeline::{DocumentExtractor, ExtractionOutcome, KindSource};
pub use section::SectionSegmenter;
