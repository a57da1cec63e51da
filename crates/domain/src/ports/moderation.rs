use thiserror::Error;

use super::BoxFuture;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier not configured: {0}")]
    Configuration(String),
    #[error("classifier transport error: {0}")]
    Transport(String),
    #[error("classifier upstream error: {0}")]
    Upstream(String),
    #[error("classifier response decode error: {0}")]
    InvalidResponse(String),
}

/// The external content-safety oracle.
pub trait ContentClassifier: Send + Sync {
    /// Returns the raw reply token, or `None` when the oracle produced no answer.
    fn classify(&self, text: &str) -> BoxFuture<'_, Result<Option<String>, ClassifierError>>;
}
