use serde::{Deserialize, Serialize};

use crate::DomainResult;

use super::BoxFuture;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub user_id: String,
    pub nickname: String,
    pub avatar_id: Option<String>,
}

/// Read-only view of user display data. Profiles are managed elsewhere.
pub trait ProfileDirectory: Send + Sync {
    fn public_profile(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<PublicProfile>>>;
}
