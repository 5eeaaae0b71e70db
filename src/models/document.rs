// src/models/document.rs
use crate::utils::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- Acquisition Method ---
/// How the text of a document was obtained by the acquisition step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMethod {
    #[serde(alias = "text_extraction", alias = "text")]
    DirectText,
    Ocr,
    Hybrid,
}

impl AcquisitionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcquisitionMethod::DirectText => "direct_text",
            AcquisitionMethod::Ocr => "ocr",
            AcquisitionMethod::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for AcquisitionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AcquisitionMethod {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "direct_text" | "text_extraction" | "text" => Ok(AcquisitionMethod::DirectText),
            "ocr" => Ok(AcquisitionMethod::Ocr),
            "hybrid" => Ok(AcquisitionMethod::Hybrid),
            _ => Err(ExtractError::UnknownAcquisitionMethod(s.to_string())),
        }
    }
}

// --- Document Kind ---
/// Which section grammar applies to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// DD-1414 style tables, scanned line by line.
    Baseline,
    /// Narrative reprogramming actions, split on organizational-unit markers.
    ReprogrammingAction,
}

impl DocumentKind {
    /// Infers the kind from the filename conventions used by the document archive.
    /// Returns `None` when the name carries no convention and the grammar must be auto-detected.
    pub fn from_source_id(source_id: &str) -> Option<Self> {
        if source_id.contains("DD_1414") || source_id.contains("Base_for_Reprogramming") {
            Some(DocumentKind::Baseline)
        } else if source_id.contains("_IR_") || source_id.contains("_PA_") {
            Some(DocumentKind::ReprogrammingAction)
        } else {
            None
        }
    }
}

impl FromStr for DocumentKind {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "baseline" | "dd1414" | "dd_1414" => Ok(DocumentKind::Baseline),
            "reprogramming" | "reprogramming_action" => Ok(DocumentKind::ReprogrammingAction),
            _ => Err(ExtractError::UnknownDocumentKind(s.to_string())),
        }
    }
}

// --- Document ---
/// Raw text handed over by the acquisition step. Immutable once constructed.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    source_id: String,
    text: String,
    acquisition_method: AcquisitionMethod,
    acquisition_confidence: f64, // 0..=100, as reported by the acquisition step
}

impl Document {
    /// Builds a document, rejecting confidences outside `[0, 100]`.
    pub fn new(
        source_id: impl Into<String>,
        text: impl Into<String>,
        acquisition_method: AcquisitionMethod,
        acquisition_confidence: f64,
    ) -> Result<Self, ExtractError> {
        if !acquisition_confidence.is_finite() || !(0.0..=100.0).contains(&acquisition_confidence) {
            return Err(ExtractError::ConfidenceOutOfRange(acquisition_confidence));
        }
        Ok(Self {
            source_id: source_id.into(),
            text: text.into(),
            acquisition_method,
            acquisition_confidence,
        })
    }

    /// Shorthand for directly extracted text, which carries full confidence.
    pub fn direct_text(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            text: text.into(),
            acquisition_method: AcquisitionMethod::DirectText,
            acquisition_confidence: 100.0,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn acquisition_method(&self) -> AcquisitionMethod {
        self.acquisition_method
    }

    pub fn acquisition_confidence(&self) -> f64 {
        self.acquisition_confidence
    }
}

// --- Acquisition Result ---
/// The JSON shape written by the OCR / text-extraction step.
/// A result with `error` set, or without text, never becomes a `Document`.
#[derive(Debug, Clone, Deserialize)]
pub struct AcquisitionResult {
    pub file: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default = "default_method")]
    pub method: AcquisitionMethod,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_method() -> AcquisitionMethod {
    AcquisitionMethod::DirectText
}

impl AcquisitionResult {
    /// Converts into a `Document`, or `None` if acquisition failed.
    /// Missing confidence means 100 for direct text and 0 otherwise.
    pub fn into_document(self) -> Option<Result<Document, ExtractError>> {
        if let Some(err) = &self.error {
            tracing::debug!("Dropping acquisition result for {}: {}", self.file, err);
            return None;
        }
        let text = self.text?;
        let confidence = self.confidence.unwrap_or(match self.method {
            AcquisitionMethod::DirectText => 100.0,
            _ => 0.0,
        });
        Some(Document::new(self.file, text, self.method, confidence))
    }
}
