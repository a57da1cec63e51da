use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::consistency::ConsistencyCoordinator;
use crate::counters::{AggregateCounter, CounterDelta, CounterKind};
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::util::{now_ms, require_id, uuid_v7_without_dashes};

/// At most one per (wish, actor).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub like_id: String,
    pub wish_id: String,
    pub actor_id: String,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LikeToggleOutcome {
    pub wish_id: String,
    pub like_count: u64,
    pub liked: bool,
}

#[derive(Clone)]
pub struct LikeService {
    coordinator: ConsistencyCoordinator,
}

impl LikeService {
    pub fn new(coordinator: ConsistencyCoordinator) -> Self {
        Self { coordinator }
    }

    /// Flips the actor's like on a wish.
    ///
    /// The existence check and the write happen under the wish lock, so two
    /// rapid toggles by the same actor always observe each other.
    pub async fn toggle(
        &self,
        actor: &ActorIdentity,
        wish_id: &str,
    ) -> DomainResult<LikeToggleOutcome> {
        let wish_id = require_id("wish_id", wish_id)?;
        let actor = actor.clone();
        let outcome = self
            .coordinator
            .run(&wish_id, move |tx| {
                Box::pin(async move {
                    if !tx.wish().is_visible_to(Some(&actor)) {
                        return Err(DomainError::WishNotFound);
                    }
                    let wish_id = tx.wish().wish_id.clone();
                    let (like_count, liked) = match tx.find_like(&actor.user_id).await? {
                        Some(existing) => {
                            tx.delete_like(&existing).await?;
                            let count = AggregateCounter::adjust(
                                tx,
                                CounterKind::Likes,
                                CounterDelta::Decrement,
                            )
                            .await?;
                            (count, false)
                        }
                        None => {
                            tx.insert_like(Like {
                                like_id: uuid_v7_without_dashes(),
                                wish_id: wish_id.clone(),
                                actor_id: actor.user_id.clone(),
                                created_at_ms: now_ms(),
                            })
                            .await?;
                            let count = AggregateCounter::adjust(
                                tx,
                                CounterKind::Likes,
                                CounterDelta::Increment,
                            )
                            .await?;
                            (count, true)
                        }
                    };
                    Ok(LikeToggleOutcome {
                        wish_id,
                        like_count,
                        liked,
                    })
                })
            })
            .await?;

        tracing::debug!(
            wish_id = %outcome.wish_id,
            like_count = outcome.like_count,
            liked = outcome.liked,
            "like toggled"
        );
        Ok(outcome)
    }
}
