// src/storage/mod.rs
use crate::analysis::RecordSummary;
use crate::flows::FlowGraph;
use crate::models::{CanonicalRecord, RecordRow};
use crate::patterns::PATTERN_LIBRARY_VERSION;
use crate::utils::error::StorageError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const RECORDS_CSV: &str = "records.csv";
pub const RECORDS_JSON: &str = "records.json";
pub const FLOW_GRAPH_JSON: &str = "flow_graph.json";
pub const SUMMARY_JSON: &str = "summary.json";

/// Counts describing one run, written next to the record summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub documents_processed: usize,
    pub documents_dropped: usize,
}

#[derive(Serialize)]
struct SummaryFile<'a> {
    generated_at: String,
    pattern_library_version: u32,
    documents_processed: usize,
    documents_dropped: usize,
    #[serde(flatten)]
    summary: &'a RecordSummary,
}

/// Writes the export shapes under one output directory.
pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager, creating the directory if it doesn't exist
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }
        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Flat record table. Every field is quoted; missing values render as "-".
    pub fn save_records_csv(&self, records: &[CanonicalRecord]) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(RECORDS_CSV);
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_path(&file_path)?;
        for record in records {
            writer.serialize(RecordRow::from(record))?;
        }
        // An empty table still gets its header row
        if records.is_empty() {
            writer.write_record(RecordRow::HEADERS)?;
        }
        writer.flush().map_err(StorageError::IoError)?;

        tracing::info!("Saved {} records to {}", records.len(), file_path.display());
        Ok(file_path)
    }

    pub fn save_records_json(&self, records: &[CanonicalRecord]) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(RECORDS_JSON);
        self.write_json(&file_path, &records)?;
        tracing::info!("Saved {} records to {}", records.len(), file_path.display());
        Ok(file_path)
    }

    pub fn save_flow_graph(&self, graph: &FlowGraph) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(FLOW_GRAPH_JSON);
        self.write_json(&file_path, &graph.to_export())?;
        tracing::info!("Saved {} flows to {}", graph.edges.len(), file_path.display());
        Ok(file_path)
    }

    pub fn save_summary(&self, summary: &RecordSummary, stats: RunStats) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(SUMMARY_JSON);
        let contents = SummaryFile {
            generated_at: chrono::Utc::now().to_rfc3339(),
            pattern_library_version: PATTERN_LIBRARY_VERSION,
            documents_processed: stats.documents_processed,
            documents_dropped: stats.documents_dropped,
            summary,
        };
        self.write_json(&file_path, &contents)?;
        tracing::info!("Saved summary to {}", file_path.display());
        Ok(file_path)
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(path, json).map_err(StorageError::IoError)
    }
}
