//! Model backend abstractions for document classification.
//!
//! A backend is one classifier tier the pipeline can consult: a local
//! OpenAI-compatible inference server or a remote hosted model. Both speak
//! the same condensed request and return the same hint payload.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub mod lmstudio;
pub mod mock;
pub mod openai;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("missing credential: {0}")]
    MissingCredential(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("undecodable response: {0}")]
    Decode(String),
}

/// Raw classifier suggestion, prior to being wrapped into a final result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationHints {
    pub path: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reason: String,
}

/// Condensed classification request shared by every backend.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyRequest {
    pub snippet: String,
    pub language: String,
    pub vendor_candidates: Vec<String>,
    pub doc_type_hints: Vec<String>,
    pub reference_tokens: Vec<String>,
    pub folders: Vec<String>,
    pub naming_template: String,
    pub system_message: String,
    pub metadata: BTreeMap<String, String>,
}

#[async_trait::async_trait]
pub trait ModelBackend: Send + Sync {
    async fn classify(&self, request: &ClassifyRequest)
        -> Result<ClassificationHints, BackendError>;
}

pub(crate) const SYSTEM_PROMPT: &str = "You are a document-filing assistant. \
Follow the user's rules and folder names. Output strict JSON with keys: \
`path`, `filename`, `confidence` (0-1), `reason`.";

pub(crate) fn user_payload(request: &ClassifyRequest) -> serde_json::Value {
    serde_json::json!({
        "text": request.snippet,
        "language": request.language,
        "fields": request.vendor_candidates,
        "docTypes": request.doc_type_hints,
        "references": request.reference_tokens,
        "folders": request.folders,
        "template": request.naming_template,
        "systemMessage": request.system_message,
        "metadata": request.metadata,
    })
}

pub(crate) fn parse_hints(content: &str) -> Result<ClassificationHints, BackendError> {
    serde_json::from_str(content.trim()).map_err(|e| BackendError::Decode(e.to_string()))
}
