// src/main.rs
use budget_extractor::utils::config::parse_floor;
use budget_extractor::utils::{html_debug, logging};
use budget_extractor::{
    AcquisitionMethod, AcquisitionResult, AppError, Document, DocumentExtractor, DocumentKind,
    ExtractorConfig, FlowAccumulator, RecordSummary, RunStats, StorageManager,
};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Command Line Interface for the budget document extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file (.txt or .json acquisition result) or directory of them
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for records, flow graph and summary
    #[arg(short, long, default_value = "./output")]
    output_dir: PathBuf,

    /// Section grammar: auto, baseline or reprogramming
    #[arg(short, long, default_value = "auto")]
    kind: String,

    /// Acquisition method for .txt inputs: direct-text, ocr or hybrid
    #[arg(short, long, default_value = "direct-text")]
    method: String,

    /// Acquisition confidence (0-100) for .txt inputs; 100 for direct text when omitted
    #[arg(short, long)]
    confidence: Option<f64>,

    /// Baseline data lines leading with a smaller value are discarded
    #[arg(long, value_parser = parse_floor)]
    baseline_line_floor: Option<f64>,

    /// Baseline groups must sum to more than this to become flow edges
    #[arg(long, value_parser = parse_floor)]
    baseline_flow_floor: Option<f64>,

    /// Debug mode - save annotated HTML copies of every document
    #[arg(short, long)]
    debug: bool,

    /// Show extraction decisions in the log
    #[arg(short, long)]
    verbose: bool,
}

/// A `.json` input holds one acquisition result or a batch of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum AcquisitionInput {
    Batch(Vec<AcquisitionResult>),
    Single(AcquisitionResult),
}

fn parse_kind(raw: &str) -> Result<Option<DocumentKind>, AppError> {
    if raw.trim().eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    Ok(Some(raw.parse::<DocumentKind>()?))
}

fn build_config(args: &Args) -> ExtractorConfig {
    let mut config = ExtractorConfig::from_env();
    if let Some(floor) = args.baseline_line_floor {
        config = config.with_baseline_line_floor(floor);
    }
    if let Some(floor) = args.baseline_flow_floor {
        config = config.with_baseline_flow_floor(floor);
    }
    config
}

fn is_input_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("txt") | Some("json")
    )
}

fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>, AppError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(AppError::Config(format!("Input path {} does not exist", input.display())));
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(input)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_input_file(path))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Loads every input into documents. Returns the documents and how many inputs were dropped.
fn load_documents(paths: &[PathBuf], method: AcquisitionMethod, confidence: Option<f64>) -> (Vec<Document>, usize) {
    let mut documents = Vec::new();
    let mut dropped = 0;

    for path in paths {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Skipping unreadable input {}: {}", path.display(), e);
                dropped += 1;
                continue;
            }
        };
        let source_id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let is_json = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if !is_json {
            let confidence = confidence.unwrap_or(match method {
                AcquisitionMethod::DirectText => 100.0,
                _ => 0.0,
            });
            match Document::new(source_id, contents, method, confidence) {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    dropped += 1;
                }
            }
            continue;
        }

        let results = match serde_json::from_str::<AcquisitionInput>(&contents) {
            Ok(AcquisitionInput::Batch(results)) => results,
            Ok(AcquisitionInput::Single(result)) => vec![result],
            Err(e) => {
                tracing::warn!("Skipping {}: not an acquisition result ({})", path.display(), e);
                dropped += 1;
                continue;
            }
        };
        for result in results {
            let file = result.file.clone();
            match result.into_document() {
                Some(Ok(doc)) => documents.push(doc),
                Some(Err(e)) => {
                    tracing::warn!("Skipping acquisition result {}: {}", file, e);
                    dropped += 1;
                }
                None => {
                    tracing::info!("Acquisition failed for {}, skipping", file);
                    dropped += 1;
                }
            }
        }
    }
    (documents, dropped)
}

fn debug_file_name(source_id: &str) -> String {
    let stem: String = source_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect();
    format!("{}_annotated.html", stem)
}

fn main() -> Result<(), AppError> {
    // 1. Parse CLI arguments and set up logging (RUST_LOG overrides)
    let args = Args::parse();
    logging::setup_logging(args.verbose);
    tracing::info!("Starting processing for args: {:?}", args);

    // 2. Resolve configuration
    let kind = parse_kind(&args.kind)?;
    let method: AcquisitionMethod = args.method.parse()?;
    let config = build_config(&args);
    tracing::debug!("Using config: {:?}", config);

    // 3. Load inputs
    let paths = collect_inputs(&args.input)?;
    tracing::info!("Found {} input files", paths.len());
    let (documents, dropped) = load_documents(&paths, method, args.confidence);
    if !paths.is_empty() && documents.is_empty() {
        return Err(AppError::Processing(format!(
            "None of the {} input files produced a document",
            paths.len()
        )));
    }

    // 4. Initialize storage
    let storage = StorageManager::new(&args.output_dir)?;
    let debug_dir = args.output_dir.join("debug");
    if args.debug {
        fs::create_dir_all(&debug_dir)?;
    }

    // 5. Extract each document and reduce its flows
    let extractor = DocumentExtractor::new(config);
    let mut records = Vec::new();
    let mut flows = FlowAccumulator::new(extractor.config());
    let mut empty_documents = 0;

    for document in &documents {
        if args.debug {
            let path = debug_dir.join(debug_file_name(document.source_id()));
            if let Err(e) = html_debug::create_debug_html(document.text(), &path) {
                tracing::warn!("Failed to create debug HTML for {}: {}", document.source_id(), e);
            }
        }

        let outcome = extractor.extract(document, kind);
        if outcome.records.is_empty() {
            empty_documents += 1;
        }
        let mut document_flows = FlowAccumulator::new(extractor.config());
        document_flows.add_records(&outcome.records);
        flows.merge(document_flows);
        records.extend(outcome.records);
    }
    let graph = flows.finish();

    // 6. Write outputs
    let summary = RecordSummary::from_records(&records);
    summary.log();
    storage.save_records_csv(&records)?;
    storage.save_records_json(&records)?;
    storage.save_flow_graph(&graph)?;
    storage.save_summary(&summary, RunStats { documents_processed: documents.len(), documents_dropped: dropped })?;

    tracing::info!(
        "Processing finished. Documents: {}, without records: {}, dropped inputs: {}, records: {}, flows: {}",
        documents.len(), empty_documents, dropped, records.len(), graph.edges.len()
    );
    Ok(())
}
