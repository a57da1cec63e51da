use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::consistency::ConsistencyCoordinator;
use crate::counters::{AggregateCounter, CounterDelta, CounterKind};
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::moderation::ModerationGate;
use crate::ports::interactions::WishRepository;
use crate::ports::profiles::{ProfileDirectory, PublicProfile};
use crate::util::{now_ms, require_id, uuid_v7_without_dashes};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: String,
    pub wish_id: String,
    pub author_id: String,
    /// Set on replies. Always a top-level comment on the same wish.
    pub parent_id: Option<String>,
    pub content: String,
    pub created_at_ms: i64,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct CommentCreate {
    pub wish_id: String,
    pub content: String,
    pub parent_id: Option<String>,
}

/// A comment joined with its author's display data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub comment_id: String,
    pub wish_id: String,
    pub author_id: String,
    pub author_nickname: String,
    pub author_avatar_id: Option<String>,
    pub parent_id: Option<String>,
    pub content: String,
    pub created_at_ms: i64,
}

impl CommentView {
    pub fn from_parts(comment: Comment, profile: Option<PublicProfile>, fallback: &str) -> Self {
        let (author_nickname, author_avatar_id) = match profile {
            Some(profile) => (profile.nickname, profile.avatar_id),
            None => (fallback.to_string(), None),
        };
        Self {
            comment_id: comment.comment_id,
            wish_id: comment.wish_id,
            author_id: comment.author_id,
            author_nickname,
            author_avatar_id,
            parent_id: comment.parent_id,
            content: comment.content,
            created_at_ms: comment.created_at_ms,
        }
    }
}

#[derive(Clone)]
pub struct CommentService {
    repository: Arc<dyn WishRepository>,
    coordinator: ConsistencyCoordinator,
    moderation: ModerationGate,
    profiles: Arc<dyn ProfileDirectory>,
}

impl CommentService {
    pub fn new(
        repository: Arc<dyn WishRepository>,
        coordinator: ConsistencyCoordinator,
        moderation: ModerationGate,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            repository,
            coordinator,
            moderation,
            profiles,
        }
    }

    pub async fn create(
        &self,
        actor: &ActorIdentity,
        input: CommentCreate,
    ) -> DomainResult<CommentView> {
        let wish_id = require_id("wish_id", &input.wish_id)?;
        let parent_id = input
            .parent_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let wish = self
            .repository
            .get(&wish_id)
            .await?
            .ok_or(DomainError::WishNotFound)?;
        // Private wishes take no comments from anyone but the owner. Checked
        // before moderation so a refused caller never costs an oracle call.
        if !wish.is_public && !wish.is_owned_by(&actor.user_id) {
            return Err(DomainError::CommentForbidden);
        }

        let content = self.moderation.admit(&input.content).await?;

        if let Some(parent_id) = &parent_id {
            let parent = self.coordinator.store().get_comment(parent_id).await?;
            validate_parent(parent.as_ref(), &wish_id)?;
        }

        let comment = Comment {
            comment_id: uuid_v7_without_dashes(),
            wish_id: wish_id.clone(),
            author_id: actor.user_id.clone(),
            parent_id,
            content,
            created_at_ms: now_ms(),
        };

        let staged = comment.clone();
        let comment_count = self
            .coordinator
            .run(&wish_id, move |tx| {
                Box::pin(async move {
                    // The parent may have been deleted since the unlocked read.
                    if let Some(parent_id) = &staged.parent_id {
                        let parent = tx.find_comment(parent_id).await?;
                        validate_parent(parent.as_ref(), &staged.wish_id)?;
                    }
                    tx.insert_comment(staged).await?;
                    AggregateCounter::adjust(tx, CounterKind::Comments, CounterDelta::Increment)
                        .await
                })
            })
            .await?;

        tracing::info!(
            wish_id = %wish_id,
            comment_id = %comment.comment_id,
            actor_id = %actor.user_id,
            comment_count,
            "comment created"
        );

        Ok(self.enrich(comment, actor).await)
    }

    /// Allowed for the comment's author, the wish owner and admins. Replies
    /// of a deleted top-level comment are deleted with it.
    pub async fn delete(&self, actor: &ActorIdentity, comment_id: &str) -> DomainResult<()> {
        let comment_id = require_id("comment_id", comment_id)?;
        let comment = self
            .coordinator
            .store()
            .get_comment(&comment_id)
            .await?
            .ok_or(DomainError::CommentNotFound)?;
        let wish = self
            .repository
            .get(&comment.wish_id)
            .await?
            .ok_or(DomainError::CommentNotFound)?;

        let permitted = actor.is_admin()
            || comment.author_id == actor.user_id
            || wish.is_owned_by(&actor.user_id);
        if !permitted {
            return Err(DomainError::Forbidden(
                "only the author, the wish owner or an admin may delete this comment".to_string(),
            ));
        }

        let removed = self
            .coordinator
            .run(&comment.wish_id, move |tx| {
                Box::pin(async move {
                    let current = tx
                        .find_comment(&comment_id)
                        .await?
                        .ok_or(DomainError::CommentNotFound)?;
                    let mut doomed = if current.is_reply() {
                        Vec::new()
                    } else {
                        tx.list_replies(&current.comment_id).await?
                    };
                    doomed.push(current);

                    for comment in &doomed {
                        tx.delete_comment(comment).await?;
                        AggregateCounter::adjust(
                            tx,
                            CounterKind::Comments,
                            CounterDelta::Decrement,
                        )
                        .await?;
                    }
                    Ok::<_, DomainError>(doomed.len())
                })
            })
            .await?;

        tracing::info!(
            wish_id = %comment.wish_id,
            comment_id = %comment.comment_id,
            actor_id = %actor.user_id,
            removed,
            "comment deleted"
        );
        Ok(())
    }

    /// Best effort: the comment is already committed, so lookup failures are
    /// logged and answered with what is at hand.
    async fn enrich(&self, comment: Comment, actor: &ActorIdentity) -> CommentView {
        let comment = match self
            .coordinator
            .store()
            .get_comment(&comment.comment_id)
            .await
        {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                tracing::warn!(
                    comment_id = %comment.comment_id,
                    "created comment not readable yet; answering from memory"
                );
                comment
            }
            Err(err) => {
                tracing::warn!(
                    comment_id = %comment.comment_id,
                    error = %err,
                    "comment re-read failed"
                );
                comment
            }
        };

        let profile = match self.profiles.public_profile(&comment.author_id).await {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(
                    comment_id = %comment.comment_id,
                    actor_id = %comment.author_id,
                    error = %err,
                    "author profile lookup failed"
                );
                None
            }
        };
        CommentView::from_parts(comment, profile, &actor.username)
    }
}

fn validate_parent(parent: Option<&Comment>, wish_id: &str) -> DomainResult<()> {
    let parent =
        parent.ok_or_else(|| DomainError::InvalidParent("parent comment not found".to_string()))?;
    if parent.wish_id != wish_id {
        return Err(DomainError::InvalidParent(
            "parent comment belongs to another wish".to_string(),
        ));
    }
    if parent.is_reply() {
        return Err(DomainError::InvalidParent(
            "replies cannot be nested".to_string(),
        ));
    }
    Ok(())
}
