use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// The authenticated caller of a domain operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActorIdentity {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

impl ActorIdentity {
    pub fn with_user_id(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            user_id: user_id.clone(),
            username: user_id,
            role: Role::User,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            role: Role::Admin,
            ..Self::with_user_id(user_id)
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
