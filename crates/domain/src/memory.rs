use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::DomainResult;
use crate::comments::Comment;
use crate::consistency::{DEFAULT_LOCK_TIMEOUT, TargetLockGuard, TargetLocks};
use crate::counters::CounterKind;
use crate::error::DomainError;
use crate::likes::Like;
use crate::ports::BoxFuture;
use crate::ports::interactions::{InteractionStore, TargetTransaction, WishRepository};
use crate::ports::profiles::{ProfileDirectory, PublicProfile};
use crate::staging::{StagedWrite, WriteSet};
use crate::util::now_ms;
use crate::wishes::Wish;

type LikeKey = (String, String);

#[derive(Default)]
struct MemoryState {
    wishes: HashMap<String, Wish>,
    /// Keyed by (wish_id, actor_id); the key is the uniqueness constraint.
    likes: HashMap<LikeKey, Like>,
    comments: HashMap<String, Comment>,
}

/// Process-local backend for wishes, likes and comments.
#[derive(Clone)]
pub struct InMemoryInteractionStore {
    state: Arc<RwLock<MemoryState>>,
    locks: TargetLocks,
    lock_timeout: Duration,
}

impl Default for InMemoryInteractionStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

impl InMemoryInteractionStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
            locks: TargetLocks::new(),
            lock_timeout,
        }
    }

    pub fn locks(&self) -> &TargetLocks {
        &self.locks
    }
}

fn like_key(wish_id: &str, actor_id: &str) -> LikeKey {
    (wish_id.to_string(), actor_id.to_string())
}

impl WishRepository for InMemoryInteractionStore {
    fn create(&self, wish: &Wish) -> BoxFuture<'_, DomainResult<Wish>> {
        let wish = wish.clone();
        Box::pin(async move {
            let mut state = self.state.write().await;
            if state.wishes.contains_key(&wish.wish_id) {
                return Err(DomainError::Conflict);
            }
            state.wishes.insert(wish.wish_id.clone(), wish.clone());
            Ok(wish)
        })
    }

    fn get(&self, wish_id: &str) -> BoxFuture<'_, DomainResult<Option<Wish>>> {
        let wish_id = wish_id.to_string();
        Box::pin(async move { Ok(self.state.read().await.wishes.get(&wish_id).cloned()) })
    }
}

impl InteractionStore for InMemoryInteractionStore {
    fn begin(
        &self,
        wish_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Box<dyn TargetTransaction>>>> {
        let wish_id = wish_id.to_string();
        Box::pin(async move {
            let guard = self.locks.acquire(&wish_id, self.lock_timeout).await?;
            let Some(wish) = self.state.read().await.wishes.get(&wish_id).cloned() else {
                return Ok(None);
            };
            let tx: Box<dyn TargetTransaction> = Box::new(MemoryTransaction {
                state: self.state.clone(),
                wish,
                staged: WriteSet::new(),
                _guard: guard,
            });
            Ok(Some(tx))
        })
    }

    fn get_comment(&self, comment_id: &str) -> BoxFuture<'_, DomainResult<Option<Comment>>> {
        let comment_id = comment_id.to_string();
        Box::pin(async move { Ok(self.state.read().await.comments.get(&comment_id).cloned()) })
    }

    fn find_like(
        &self,
        wish_id: &str,
        actor_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Like>>> {
        let key = like_key(wish_id, actor_id);
        Box::pin(async move { Ok(self.state.read().await.likes.get(&key).cloned()) })
    }

    fn list_likes(&self, wish_id: &str, limit: usize) -> BoxFuture<'_, DomainResult<Vec<Like>>> {
        let wish_id = wish_id.to_string();
        Box::pin(async move {
            let state = self.state.read().await;
            let mut likes: Vec<Like> = state
                .likes
                .values()
                .filter(|like| like.wish_id == wish_id)
                .cloned()
                .collect();
            likes.sort_by(|a, b| {
                b.created_at_ms
                    .cmp(&a.created_at_ms)
                    .then_with(|| b.like_id.cmp(&a.like_id))
            });
            likes.truncate(limit);
            Ok(likes)
        })
    }

    fn list_comments(&self, wish_id: &str) -> BoxFuture<'_, DomainResult<Vec<Comment>>> {
        let wish_id = wish_id.to_string();
        Box::pin(async move {
            let state = self.state.read().await;
            let mut comments: Vec<Comment> = state
                .comments
                .values()
                .filter(|comment| comment.wish_id == wish_id)
                .cloned()
                .collect();
            comments.sort_by(|a, b| {
                a.created_at_ms
                    .cmp(&b.created_at_ms)
                    .then_with(|| a.comment_id.cmp(&b.comment_id))
            });
            Ok(comments)
        })
    }
}

struct MemoryTransaction {
    state: Arc<RwLock<MemoryState>>,
    wish: Wish,
    staged: WriteSet,
    _guard: TargetLockGuard,
}

impl TargetTransaction for MemoryTransaction {
    fn wish(&self) -> &Wish {
        &self.wish
    }

    fn find_like(&mut self, actor_id: &str) -> BoxFuture<'_, DomainResult<Option<Like>>> {
        let actor_id = actor_id.to_string();
        Box::pin(async move {
            if let Some(staged) = self.staged.like_state(&actor_id) {
                return Ok(staged);
            }
            let key = like_key(&self.wish.wish_id, &actor_id);
            Ok(self.state.read().await.likes.get(&key).cloned())
        })
    }

    fn insert_like(&mut self, like: Like) -> BoxFuture<'_, DomainResult<()>> {
        Box::pin(async move {
            self.staged.ensure_live()?;
            if like.wish_id != self.wish.wish_id {
                return Err(DomainError::Validation(
                    "like does not belong to the locked wish".to_string(),
                ));
            }
            let exists = match self.staged.like_state(&like.actor_id) {
                Some(staged) => staged.is_some(),
                None => self
                    .state
                    .read()
                    .await
                    .likes
                    .contains_key(&like_key(&like.wish_id, &like.actor_id)),
            };
            if exists {
                return Err(DomainError::Conflict);
            }
            self.staged.push(StagedWrite::InsertLike(like));
            Ok(())
        })
    }

    fn delete_like(&mut self, like: &Like) -> BoxFuture<'_, DomainResult<()>> {
        let like = like.clone();
        Box::pin(async move {
            self.staged.ensure_live()?;
            self.staged.push(StagedWrite::DeleteLike(like));
            Ok(())
        })
    }

    fn find_comment(&mut self, comment_id: &str) -> BoxFuture<'_, DomainResult<Option<Comment>>> {
        let comment_id = comment_id.to_string();
        Box::pin(async move {
            if let Some(staged) = self.staged.comment_state(&comment_id) {
                return Ok(staged);
            }
            Ok(self
                .state
                .read()
                .await
                .comments
                .get(&comment_id)
                .filter(|comment| comment.wish_id == self.wish.wish_id)
                .cloned())
        })
    }

    fn list_replies(&mut self, parent_id: &str) -> BoxFuture<'_, DomainResult<Vec<Comment>>> {
        let parent_id = parent_id.to_string();
        Box::pin(async move {
            let committed: Vec<Comment> = self
                .state
                .read()
                .await
                .comments
                .values()
                .filter(|comment| comment.parent_id.as_deref() == Some(parent_id.as_str()))
                .cloned()
                .collect();
            let replies = self.staged.overlay_replies(&parent_id, committed);
            Ok(replies)
        })
    }

    fn insert_comment(&mut self, comment: Comment) -> BoxFuture<'_, DomainResult<()>> {
        Box::pin(async move {
            self.staged.ensure_live()?;
            if comment.wish_id != self.wish.wish_id {
                return Err(DomainError::Validation(
                    "comment does not belong to the locked wish".to_string(),
                ));
            }
            self.staged.push(StagedWrite::InsertComment(comment));
            Ok(())
        })
    }

    fn delete_comment(&mut self, comment: &Comment) -> BoxFuture<'_, DomainResult<()>> {
        let comment = comment.clone();
        Box::pin(async move {
            self.staged.ensure_live()?;
            self.staged.push(StagedWrite::DeleteComment(comment));
            Ok(())
        })
    }

    fn write_counter(&mut self, kind: CounterKind, value: u64) -> BoxFuture<'_, DomainResult<()>> {
        Box::pin(async move {
            self.staged.ensure_live()?;
            self.wish.set_counter(kind, value);
            Ok(())
        })
    }

    fn delete_wish(&mut self) -> BoxFuture<'_, DomainResult<()>> {
        Box::pin(async move {
            self.staged.ensure_live()?;
            self.staged.push(StagedWrite::DeleteWish);
            Ok(())
        })
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, DomainResult<()>> {
        Box::pin(async move {
            let MemoryTransaction {
                state,
                mut wish,
                staged,
                _guard,
            } = *self;

            // Everything below is applied under one write guard, so readers
            // see either none or all of it.
            let mut state = state.write().await;
            let dirty = !staged.is_empty();
            let mut deleted = false;
            for write in staged {
                match write {
                    StagedWrite::InsertLike(like) => {
                        state
                            .likes
                            .insert(like_key(&like.wish_id, &like.actor_id), like);
                    }
                    StagedWrite::DeleteLike(like) => {
                        state.likes.remove(&like_key(&like.wish_id, &like.actor_id));
                    }
                    StagedWrite::InsertComment(comment) => {
                        state.comments.insert(comment.comment_id.clone(), comment);
                    }
                    StagedWrite::DeleteComment(comment) => {
                        state.comments.remove(&comment.comment_id);
                    }
                    StagedWrite::DeleteWish => deleted = true,
                }
            }

            if deleted {
                state.wishes.remove(&wish.wish_id);
                state.likes.retain(|(wish_id, _), _| *wish_id != wish.wish_id);
                state
                    .comments
                    .retain(|_, comment| comment.wish_id != wish.wish_id);
                return Ok(());
            }

            let counters_moved = state
                .wishes
                .get(&wish.wish_id)
                .is_none_or(|current| *current != wish);
            if dirty || counters_moved {
                wish.revision += 1;
                wish.updated_at_ms = now_ms();
                state.wishes.insert(wish.wish_id.clone(), wish);
            }
            Ok(())
        })
    }
}

/// Seedable profile directory for tests and the memory backend.
#[derive(Clone, Default)]
pub struct InMemoryProfileDirectory {
    profiles: Arc<RwLock<HashMap<String, PublicProfile>>>,
}

impl InMemoryProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, profile: PublicProfile) {
        self.profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile);
    }
}

impl ProfileDirectory for InMemoryProfileDirectory {
    fn public_profile(&self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<PublicProfile>>> {
        let user_id = user_id.to_string();
        Box::pin(async move { Ok(self.profiles.read().await.get(&user_id).cloned()) })
    }
}
