// src/utils/error.rs
use thiserror::Error;

// Extraction itself never fails; these cover values handed to it from outside.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unknown acquisition method: {0}")]
    UnknownAcquisitionMethod(String),

    #[error("Unknown document kind: {0}")]
    UnknownDocumentKind(String),

    #[error("Acquisition confidence {0} is outside 0..=100")]
    ConfidenceOutOfRange(f64),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
