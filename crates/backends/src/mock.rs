//! In-memory backends for tests and offline development.

use crate::{BackendError, ClassificationHints, ClassifyRequest, ModelBackend};

/// Always returns the same hints.
#[derive(Debug, Clone)]
pub struct StaticBackend {
    hints: ClassificationHints,
}

impl StaticBackend {
    pub fn new(hints: ClassificationHints) -> Self {
        Self { hints }
    }
}

#[async_trait::async_trait]
impl ModelBackend for StaticBackend {
    async fn classify(
        &self,
        _request: &ClassifyRequest,
    ) -> Result<ClassificationHints, BackendError> {
        Ok(self.hints.clone())
    }
}

/// Always fails with the configured error kind.
#[derive(Debug, Clone, Copy)]
pub enum FailureKind {
    Unavailable,
    MissingCredential,
    Transport,
    Decode,
}

#[derive(Debug, Clone, Copy)]
pub struct FailingBackend(pub FailureKind);

#[async_trait::async_trait]
impl ModelBackend for FailingBackend {
    async fn classify(
        &self,
        _request: &ClassifyRequest,
    ) -> Result<ClassificationHints, BackendError> {
        Err(match self.0 {
            FailureKind::Unavailable => BackendError::Unavailable("mock backend offline".into()),
            FailureKind::MissingCredential => {
                BackendError::MissingCredential("mock credential missing".into())
            }
            FailureKind::Transport => BackendError::Transport("mock transport failure".into()),
            FailureKind::Decode => BackendError::Decode("mock payload malformed".into()),
        })
    }
}
