use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Best-guess projection of document signals into the handful of fields
/// filename templates understand. Every field is optional; nothing is
/// ever fabricated when the signals are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub vendor: Option<String>,
    pub doc_type: Option<String>,
    pub date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub reference: Option<String>,
}

/// One finished classification, ready for user review and the move step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub destination_relative_path: String,
    pub proposed_filename: String,
    /// Higher is better; compared against the configured threshold.
    /// Not a strict probability when embeddings admit negative components.
    pub confidence: f64,
    pub rationale: String,
    pub fields: ExtractedFields,
}
