use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::consistency::ConsistencyCoordinator;
use crate::counters::CounterKind;
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::moderation::ModerationGate;
use crate::ports::interactions::WishRepository;
use crate::util::{now_ms, require_id, uuid_v7_without_dashes};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wish {
    pub wish_id: String,
    pub owner_id: String,
    pub content: String,
    pub is_public: bool,
    pub like_count: u64,
    pub comment_count: u64,
    /// Bumped on every committed unit of work.
    pub revision: u64,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Wish {
    pub fn counter(&self, kind: CounterKind) -> u64 {
        match kind {
            CounterKind::Likes => self.like_count,
            CounterKind::Comments => self.comment_count,
        }
    }

    pub fn set_counter(&mut self, kind: CounterKind, value: u64) {
        match kind {
            CounterKind::Likes => self.like_count = value,
            CounterKind::Comments => self.comment_count = value,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// Private wishes are only visible to their owner and to admins.
    pub fn is_visible_to(&self, actor: Option<&ActorIdentity>) -> bool {
        self.is_public
            || actor.is_some_and(|actor| actor.is_admin() || self.is_owned_by(&actor.user_id))
    }
}

#[derive(Clone, Debug)]
pub struct WishCreate {
    pub content: String,
    pub is_public: Option<bool>,
}

#[derive(Clone)]
pub struct WishService {
    repository: Arc<dyn WishRepository>,
    coordinator: ConsistencyCoordinator,
    moderation: ModerationGate,
}

impl WishService {
    pub fn new(
        repository: Arc<dyn WishRepository>,
        coordinator: ConsistencyCoordinator,
        moderation: ModerationGate,
    ) -> Self {
        Self {
            repository,
            coordinator,
            moderation,
        }
    }

    pub async fn create(&self, actor: &ActorIdentity, input: WishCreate) -> DomainResult<Wish> {
        let content = self.moderation.admit(&input.content).await?;
        let now = now_ms();
        let wish = Wish {
            wish_id: uuid_v7_without_dashes(),
            owner_id: actor.user_id.clone(),
            content,
            is_public: input.is_public.unwrap_or(true),
            like_count: 0,
            comment_count: 0,
            revision: 0,
            created_at_ms: now,
            updated_at_ms: now,
        };
        let wish = self.repository.create(&wish).await?;
        tracing::info!(wish_id = %wish.wish_id, actor_id = %actor.user_id, "wish created");
        Ok(wish)
    }

    pub async fn get(&self, actor: Option<&ActorIdentity>, wish_id: &str) -> DomainResult<Wish> {
        let wish_id = require_id("wish_id", wish_id)?;
        let wish = self
            .repository
            .get(&wish_id)
            .await?
            .ok_or(DomainError::WishNotFound)?;
        if !wish.is_visible_to(actor) {
            return Err(DomainError::WishNotFound);
        }
        Ok(wish)
    }

    /// Owner or admin only. Likes and comments go with the wish.
    pub async fn delete(&self, actor: &ActorIdentity, wish_id: &str) -> DomainResult<()> {
        let wish_id = require_id("wish_id", wish_id)?;
        let actor = actor.clone();
        self.coordinator
            .run(&wish_id, move |tx| {
                Box::pin(async move {
                    let wish = tx.wish();
                    if !wish.is_visible_to(Some(&actor)) {
                        return Err(DomainError::WishNotFound);
                    }
                    if !actor.is_admin() && !wish.is_owned_by(&actor.user_id) {
                        return Err(DomainError::Forbidden(
                            "only the owner or an admin may delete this wish".to_string(),
                        ));
                    }
                    tx.delete_wish().await
                })
            })
            .await?;
        tracing::info!(wish_id = %wish_id, "wish deleted");
        Ok(())
    }
}
