use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::DomainResult;
use crate::comments::{Comment, CommentView};
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::ports::interactions::{InteractionStore, WishRepository};
use crate::ports::profiles::{ProfileDirectory, PublicProfile};
use crate::util::require_id;
use crate::wishes::Wish;

pub const RECENT_LIKES_LIMIT: usize = 20;

#[derive(Clone, Debug, Serialize)]
pub struct LikerView {
    pub user_id: String,
    pub nickname: String,
    pub avatar_id: Option<String>,
    pub liked_at_ms: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct LikeSummary {
    pub total_count: u64,
    pub recent: Vec<LikerView>,
    pub current_user_liked: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct CommentThreadView {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct InteractionSnapshot {
    pub wish: Wish,
    pub likes: LikeSummary,
    pub comments: Vec<CommentThreadView>,
}

/// Read side of the interaction engine.
#[derive(Clone)]
pub struct InteractionService {
    repository: Arc<dyn WishRepository>,
    store: Arc<dyn InteractionStore>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl InteractionService {
    pub fn new(
        repository: Arc<dyn WishRepository>,
        store: Arc<dyn InteractionStore>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            repository,
            store,
            profiles,
        }
    }

    pub async fn snapshot(
        &self,
        actor: Option<&ActorIdentity>,
        wish_id: &str,
    ) -> DomainResult<InteractionSnapshot> {
        let wish_id = require_id("wish_id", wish_id)?;
        let wish = self
            .repository
            .get(&wish_id)
            .await?
            .ok_or(DomainError::WishNotFound)?;
        if !wish.is_visible_to(actor) {
            return Err(DomainError::WishNotFound);
        }

        let likes = self.store.list_likes(&wish_id, RECENT_LIKES_LIMIT).await?;
        let current_user_liked = match actor {
            Some(actor) => self
                .store
                .find_like(&wish_id, &actor.user_id)
                .await?
                .is_some(),
            None => false,
        };
        let comments = self.store.list_comments(&wish_id).await?;

        let mut profiles = ProfileCache::default();
        let mut recent = Vec::with_capacity(likes.len());
        for like in likes {
            let profile = profiles.lookup(self.profiles.as_ref(), &like.actor_id).await;
            recent.push(LikerView {
                nickname: profile
                    .as_ref()
                    .map(|profile| profile.nickname.clone())
                    .unwrap_or_else(|| like.actor_id.clone()),
                avatar_id: profile.and_then(|profile| profile.avatar_id),
                user_id: like.actor_id,
                liked_at_ms: like.created_at_ms,
            });
        }

        let threads = self.build_threads(comments, &mut profiles).await;

        Ok(InteractionSnapshot {
            likes: LikeSummary {
                total_count: wish.like_count,
                recent,
                current_user_liked,
            },
            comments: threads,
            wish,
        })
    }

    /// Top-level comments newest first, replies oldest first.
    async fn build_threads(
        &self,
        comments: Vec<Comment>,
        profiles: &mut ProfileCache,
    ) -> Vec<CommentThreadView> {
        let mut tops = Vec::new();
        let mut replies: HashMap<String, Vec<CommentView>> = HashMap::new();
        for comment in comments {
            let profile = profiles
                .lookup(self.profiles.as_ref(), &comment.author_id)
                .await;
            let fallback = comment.author_id.clone();
            let view = CommentView::from_parts(comment, profile, &fallback);
            match view.parent_id.clone() {
                Some(parent_id) => replies.entry(parent_id).or_default().push(view),
                None => tops.push(view),
            }
        }

        tops.reverse();
        tops.into_iter()
            .map(|comment| CommentThreadView {
                replies: replies.remove(&comment.comment_id).unwrap_or_default(),
                comment,
            })
            .collect()
    }
}

#[derive(Default)]
struct ProfileCache {
    entries: HashMap<String, Option<PublicProfile>>,
}

impl ProfileCache {
    async fn lookup(
        &mut self,
        directory: &dyn ProfileDirectory,
        user_id: &str,
    ) -> Option<PublicProfile> {
        if let Some(cached) = self.entries.get(user_id) {
            return cached.clone();
        }
        let profile = match directory.public_profile(user_id).await {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(actor_id = %user_id, error = %err, "profile lookup failed");
                None
            }
        };
        self.entries.insert(user_id.to_string(), profile.clone());
        profile
    }
}
