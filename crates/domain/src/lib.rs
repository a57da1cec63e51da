pub mod auth;
pub mod comments;
pub mod consistency;
pub mod counters;
pub mod error;
pub mod identity;
pub mod interactions;
pub mod likes;
pub mod memory;
pub mod moderation;
pub mod ports;
pub mod rate_limit;
pub mod staging;
pub mod util;
pub mod wishes;

pub type DomainResult<T> = Result<T, error::DomainError>;
