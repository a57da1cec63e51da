use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub mod interactions;
pub mod moderation;
pub mod profiles;
pub mod rate_limit;
