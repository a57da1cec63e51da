use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;
use thiserror::Error;
use wishwall_domain::error::{DomainError, RejectionReason};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("content rejected: {0}")]
    ContentRejected(RejectionReason),
    #[error("invalid parent comment: {0}")]
    InvalidParent(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("comments are not allowed on this wish")]
    CommentForbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("conflict, please retry")]
    Conflict,
    #[error("too many requests")]
    TooManyRequests { retry_after_secs: u64 },
    #[error("service temporarily unavailable")]
    Unavailable,
    #[error("internal error")]
    Internal,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ContentRejected(_) | ApiError::InvalidParent(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) | ApiError::CommentForbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::ContentRejected(_) => "content_rejected",
            ApiError::InvalidParent(_) => "invalid_parent",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::CommentForbidden => "comment_forbidden",
            ApiError::NotFound("wish") => "wish_not_found",
            ApiError::NotFound("comment") => "comment_not_found",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict => "conflict",
            ApiError::TooManyRequests { .. } => "too_many_requests",
            ApiError::Unavailable => "unavailable",
            ApiError::Internal => "internal_error",
        }
    }

    fn reason(&self) -> Option<&'static str> {
        match self {
            ApiError::ContentRejected(reason) => Some(reason.as_str()),
            _ => None,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(message) => ApiError::Validation(message),
            DomainError::ContentRejected(reason) => ApiError::ContentRejected(reason),
            DomainError::WishNotFound => ApiError::NotFound("wish"),
            DomainError::CommentNotFound => ApiError::NotFound("comment"),
            DomainError::InvalidParent(message) => ApiError::InvalidParent(message),
            DomainError::CommentForbidden => ApiError::CommentForbidden,
            DomainError::Forbidden(message) => ApiError::Forbidden(message),
            DomainError::Unauthorized => ApiError::Unauthorized,
            DomainError::Conflict => ApiError::Conflict,
            DomainError::Transient(detail) => {
                tracing::error!(error = %detail, "transient domain failure");
                ApiError::Unavailable
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_secs: Option<u64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let retry_after_secs = match &self {
            ApiError::TooManyRequests { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };
        let body = ErrorEnvelope {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                reason: self.reason(),
                retry_after_secs,
            },
        };
        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after_secs
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}
