use std::sync::Arc;
use std::time::Duration;

use crate::DomainResult;
use crate::error::{DomainError, RejectionReason};
use crate::ports::moderation::ContentClassifier;

/// Longest admissible content, counted in characters after trimming.
pub const MAX_CONTENT_CHARS: usize = 1000;
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectionReason),
    /// No definite answer from the oracle; the detail is for logs only.
    Unavailable(String),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Verdict::Accepted => "accepted",
            Verdict::Rejected(_) => "rejected",
            Verdict::Unavailable(_) => "unavailable",
        }
    }

    /// Fail-closed: `Unavailable` is refused exactly like `Rejected`.
    pub fn into_admission(self) -> DomainResult<()> {
        match self {
            Verdict::Accepted => Ok(()),
            Verdict::Rejected(reason) => Err(DomainError::ContentRejected(reason)),
            Verdict::Unavailable(_) => Err(DomainError::ContentRejected(
                RejectionReason::Indeterminate,
            )),
        }
    }
}

/// Maps the oracle's reply token onto a verdict.
pub fn interpret_reply(reply: Option<&str>) -> Verdict {
    let Some(reply) = reply else {
        return Verdict::Unavailable("oracle returned no choices".to_string());
    };
    match reply.trim().to_ascii_lowercase().as_str() {
        "true" => Verdict::Accepted,
        "false" => Verdict::Rejected(RejectionReason::Unsafe),
        "" => Verdict::Unavailable("oracle returned an empty reply".to_string()),
        other => Verdict::Unavailable(format!("unexpected oracle reply '{other}'")),
    }
}

/// Local preconditions checked before any call goes out.
pub fn precheck(text: &str) -> Result<&str, RejectionReason> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(RejectionReason::Empty);
    }
    if trimmed.chars().count() > MAX_CONTENT_CHARS {
        return Err(RejectionReason::TooLong);
    }
    Ok(trimmed)
}

#[derive(Clone)]
pub struct ModerationGate {
    classifier: Arc<dyn ContentClassifier>,
    timeout: Duration,
}

impl ModerationGate {
    pub fn new(classifier: Arc<dyn ContentClassifier>, timeout: Duration) -> Self {
        Self {
            classifier,
            timeout,
        }
    }

    pub async fn check(&self, text: &str) -> Verdict {
        let trimmed = match precheck(text) {
            Ok(trimmed) => trimmed,
            Err(reason) => return Verdict::Rejected(reason),
        };

        match tokio::time::timeout(self.timeout, self.classifier.classify(trimmed)).await {
            Err(_) => Verdict::Unavailable(format!(
                "oracle timed out after {}ms",
                self.timeout.as_millis()
            )),
            Ok(Err(err)) => Verdict::Unavailable(err.to_string()),
            Ok(Ok(reply)) => interpret_reply(reply.as_deref()),
        }
    }

    /// Runs [`ModerationGate::check`] and returns the trimmed content when it
    /// is admitted.
    pub async fn admit(&self, text: &str) -> DomainResult<String> {
        let verdict = self.check(text).await;
        match &verdict {
            Verdict::Accepted => tracing::debug!("content accepted"),
            Verdict::Rejected(reason) => {
                tracing::warn!(reason = reason.as_str(), "content rejected");
            }
            Verdict::Unavailable(detail) => {
                tracing::warn!(detail = %detail, "moderation unavailable; failing closed");
            }
        }
        verdict.into_admission()?;
        Ok(text.trim().to_string())
    }
}
