//! Error taxonomy for the classification pipeline.

use thiserror::Error;

use crate::extract::ExtractError;
use backends::BackendError;

#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Unsupported or corrupt input; fatal to the request.
    #[error("text extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    /// A model backend is not usable. Non-final tiers swallow this and
    /// fall through.
    #[error("model backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Network/HTTP failure talking to a backend.
    #[error("model backend transport failure: {0}")]
    BackendTransport(String),

    /// Backend answered with a malformed hint payload.
    #[error("model backend returned an undecodable payload: {0}")]
    BackendDecode(String),

    /// The remote tier was reached without a usable credential.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// Drives fallthrough between tiers; never the terminal answer.
    #[error("classification confidence {confidence:.2} below threshold {threshold:.2}")]
    ConfidenceBelowThreshold { confidence: f64, threshold: f64 },

    /// Every tier declined or was disabled.
    #[error("unable to classify with sufficient confidence")]
    NoClassificationAvailable,
}

impl From<BackendError> for ClassifyError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable(msg) => Self::BackendUnavailable(msg),
            BackendError::MissingCredential(msg) => Self::MissingCredential(msg),
            BackendError::Transport(msg) => Self::BackendTransport(msg),
            BackendError::Decode(msg) => Self::BackendDecode(msg),
        }
    }
}
