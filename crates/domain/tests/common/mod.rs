#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use wishwall_domain::DomainResult;
use wishwall_domain::comments::{Comment, CommentService};
use wishwall_domain::consistency::ConsistencyCoordinator;
use wishwall_domain::counters::CounterKind;
use wishwall_domain::error::DomainError;
use wishwall_domain::interactions::InteractionService;
use wishwall_domain::likes::{Like, LikeService};
use wishwall_domain::memory::{InMemoryInteractionStore, InMemoryProfileDirectory};
use wishwall_domain::moderation::ModerationGate;
use wishwall_domain::ports::BoxFuture;
use wishwall_domain::ports::interactions::{InteractionStore, TargetTransaction, WishRepository};
use wishwall_domain::ports::moderation::{ClassifierError, ContentClassifier};
use wishwall_domain::ports::profiles::{ProfileDirectory, PublicProfile};
use wishwall_domain::wishes::{Wish, WishService};

/// Answers every classification with a fixed token and counts the calls.
pub struct CountingClassifier {
    reply: Option<String>,
    calls: AtomicUsize,
}

impl CountingClassifier {
    pub fn answering(reply: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.map(str::to_string),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn safe() -> Arc<Self> {
        Self::answering(Some("true"))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ContentClassifier for CountingClassifier {
    fn classify(&self, _text: &str) -> BoxFuture<'_, Result<Option<String>, ClassifierError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.reply.clone();
        Box::pin(async move { Ok(reply) })
    }
}

/// Delegates to the memory backend but fails every counter write.
pub struct FaultyCounterStore {
    pub inner: InMemoryInteractionStore,
}

struct FaultyTransaction {
    inner: Box<dyn TargetTransaction>,
}

impl InteractionStore for FaultyCounterStore {
    fn begin(
        &self,
        wish_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Box<dyn TargetTransaction>>>> {
        let wish_id = wish_id.to_string();
        Box::pin(async move {
            let tx = self.inner.begin(&wish_id).await?;
            Ok(tx.map(|inner| Box::new(FaultyTransaction { inner }) as Box<dyn TargetTransaction>))
        })
    }

    fn get_comment(&self, comment_id: &str) -> BoxFuture<'_, DomainResult<Option<Comment>>> {
        self.inner.get_comment(comment_id)
    }

    fn find_like(
        &self,
        wish_id: &str,
        actor_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Like>>> {
        self.inner.find_like(wish_id, actor_id)
    }

    fn list_likes(&self, wish_id: &str, limit: usize) -> BoxFuture<'_, DomainResult<Vec<Like>>> {
        self.inner.list_likes(wish_id, limit)
    }

    fn list_comments(&self, wish_id: &str) -> BoxFuture<'_, DomainResult<Vec<Comment>>> {
        self.inner.list_comments(wish_id)
    }
}

impl TargetTransaction for FaultyTransaction {
    fn wish(&self) -> &Wish {
        self.inner.wish()
    }

    fn find_like(&mut self, actor_id: &str) -> BoxFuture<'_, DomainResult<Option<Like>>> {
        self.inner.find_like(actor_id)
    }

    fn insert_like(&mut self, like: Like) -> BoxFuture<'_, DomainResult<()>> {
        self.inner.insert_like(like)
    }

    fn delete_like(&mut self, like: &Like) -> BoxFuture<'_, DomainResult<()>> {
        self.inner.delete_like(like)
    }

    fn find_comment(&mut self, comment_id: &str) -> BoxFuture<'_, DomainResult<Option<Comment>>> {
        self.inner.find_comment(comment_id)
    }

    fn list_replies(&mut self, parent_id: &str) -> BoxFuture<'_, DomainResult<Vec<Comment>>> {
        self.inner.list_replies(parent_id)
    }

    fn insert_comment(&mut self, comment: Comment) -> BoxFuture<'_, DomainResult<()>> {
        self.inner.insert_comment(comment)
    }

    fn delete_comment(&mut self, comment: &Comment) -> BoxFuture<'_, DomainResult<()>> {
        self.inner.delete_comment(comment)
    }

    fn write_counter(&mut self, _kind: CounterKind, _value: u64) -> BoxFuture<'_, DomainResult<()>> {
        Box::pin(async { Err(DomainError::Transient("injected counter failure".to_string())) })
    }

    fn delete_wish(&mut self) -> BoxFuture<'_, DomainResult<()>> {
        self.inner.delete_wish()
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, DomainResult<()>> {
        self.inner.commit()
    }
}

/// Profile directory whose backend is down.
pub struct BrokenProfiles;

impl ProfileDirectory for BrokenProfiles {
    fn public_profile(&self, _user_id: &str) -> BoxFuture<'_, DomainResult<Option<PublicProfile>>> {
        Box::pin(async { Err(DomainError::Transient("profile store offline".to_string())) })
    }
}

pub struct Harness {
    pub store: InMemoryInteractionStore,
    pub profiles: InMemoryProfileDirectory,
    pub classifier: Arc<CountingClassifier>,
    pub wishes: WishService,
    pub likes: LikeService,
    pub comments: CommentService,
    pub interactions: InteractionService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_classifier(CountingClassifier::safe())
    }

    pub fn with_classifier(classifier: Arc<CountingClassifier>) -> Self {
        let store = InMemoryInteractionStore::new(Duration::from_secs(5));
        let profiles = InMemoryProfileDirectory::new();
        Self::assemble(store, profiles, classifier, None)
    }

    pub fn with_broken_profiles() -> Self {
        let store = InMemoryInteractionStore::new(Duration::from_secs(5));
        let profiles = InMemoryProfileDirectory::new();
        Self::assemble(
            store,
            profiles,
            CountingClassifier::safe(),
            Some(Arc::new(BrokenProfiles)),
        )
    }

    fn assemble(
        store: InMemoryInteractionStore,
        profiles: InMemoryProfileDirectory,
        classifier: Arc<CountingClassifier>,
        profile_override: Option<Arc<dyn ProfileDirectory>>,
    ) -> Self {
        let repository: Arc<dyn WishRepository> = Arc::new(store.clone());
        let coordinator = ConsistencyCoordinator::new(Arc::new(store.clone()));
        let gate = ModerationGate::new(classifier.clone(), Duration::from_secs(1));
        let directory: Arc<dyn ProfileDirectory> =
            profile_override.unwrap_or_else(|| Arc::new(profiles.clone()));
        Self {
            wishes: WishService::new(repository.clone(), coordinator.clone(), gate.clone()),
            likes: LikeService::new(coordinator.clone()),
            comments: CommentService::new(
                repository.clone(),
                coordinator.clone(),
                gate,
                directory.clone(),
            ),
            interactions: InteractionService::new(repository, Arc::new(store.clone()), directory),
            store,
            profiles,
            classifier,
        }
    }

    pub async fn seed_wish(&self, wish_id: &str, owner_id: &str, is_public: bool) -> Wish {
        let wish = Wish {
            wish_id: wish_id.to_string(),
            owner_id: owner_id.to_string(),
            content: "希望明天会更好".to_string(),
            is_public,
            like_count: 0,
            comment_count: 0,
            revision: 0,
            created_at_ms: 1,
            updated_at_ms: 1,
        };
        WishRepository::create(&self.store, &wish)
            .await
            .expect("seed wish")
    }

    pub async fn wish(&self, wish_id: &str) -> Wish {
        WishRepository::get(&self.store, wish_id)
            .await
            .expect("get wish")
            .expect("wish exists")
    }

    /// Asserts both counters match the rows they count.
    pub async fn assert_counters_consistent(&self, wish_id: &str) {
        let wish = self.wish(wish_id).await;
        let likes = self
            .store
            .list_likes(wish_id, usize::MAX)
            .await
            .expect("likes");
        let comments = self.store.list_comments(wish_id).await.expect("comments");
        assert_eq!(wish.like_count, likes.len() as u64, "like_count drifted");
        assert_eq!(
            wish.comment_count,
            comments.len() as u64,
            "comment_count drifted"
        );
    }
}
