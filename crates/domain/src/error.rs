use std::fmt;

use thiserror::Error;

/// Why a piece of user content was refused admission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionReason {
    Empty,
    TooLong,
    Unsafe,
    /// The oracle could not give a definite answer. Treated as a rejection.
    Indeterminate,
}

impl RejectionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectionReason::Empty => "empty_content",
            RejectionReason::TooLong => "too_long",
            RejectionReason::Unsafe => "unsafe_content",
            RejectionReason::Indeterminate => "indeterminate",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            RejectionReason::Empty => "empty content",
            RejectionReason::TooLong => "too long",
            RejectionReason::Unsafe => "unsafe content",
            RejectionReason::Indeterminate => "indeterminate",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("content rejected: {0}")]
    ContentRejected(RejectionReason),
    #[error("wish not found")]
    WishNotFound,
    #[error("comment not found")]
    CommentNotFound,
    #[error("invalid parent comment: {0}")]
    InvalidParent(String),
    #[error("comments are not allowed on this wish")]
    CommentForbidden,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("conflict")]
    Conflict,
    #[error("transient failure: {0}")]
    Transient(String),
}

impl DomainError {
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation",
            DomainError::ContentRejected(_) => "content_rejected",
            DomainError::WishNotFound => "wish_not_found",
            DomainError::CommentNotFound => "comment_not_found",
            DomainError::InvalidParent(_) => "invalid_parent",
            DomainError::CommentForbidden => "comment_forbidden",
            DomainError::Forbidden(_) => "forbidden",
            DomainError::Unauthorized => "unauthorized",
            DomainError::Conflict => "conflict",
            DomainError::Transient(_) => "transient",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Conflict | DomainError::Transient(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::WishNotFound | DomainError::CommentNotFound
        )
    }
}
