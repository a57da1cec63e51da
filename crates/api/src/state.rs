use std::sync::Arc;

use anyhow::bail;
use wishwall_domain::comments::CommentService;
use wishwall_domain::consistency::ConsistencyCoordinator;
use wishwall_domain::interactions::InteractionService;
use wishwall_domain::likes::LikeService;
use wishwall_domain::memory::{InMemoryInteractionStore, InMemoryProfileDirectory};
use wishwall_domain::moderation::ModerationGate;
use wishwall_domain::ports::interactions::{InteractionStore, WishRepository};
use wishwall_domain::ports::moderation::ContentClassifier;
use wishwall_domain::ports::profiles::ProfileDirectory;
use wishwall_domain::ports::rate_limit::RateLimitStore;
use wishwall_domain::rate_limit::{InMemoryRateLimitStore, RateLimitPolicy, RateLimiter};
use wishwall_domain::wishes::WishService;
use wishwall_infra::config::AppConfig;
use wishwall_infra::db::{self, DbConfig};
use wishwall_infra::moderation_client::ChatModerationClient;
use wishwall_infra::rate_limit::RedisRateLimitStore;
use wishwall_infra::repositories::{SurrealInteractionStore, SurrealProfileDirectory};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub wishes: WishService,
    pub likes: LikeService,
    pub comments: CommentService,
    pub interactions: InteractionService,
    pub content_limiter: RateLimiter,
}

struct Storage {
    wishes: Arc<dyn WishRepository>,
    store: Arc<dyn InteractionStore>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl Storage {
    fn in_memory(config: &AppConfig) -> Self {
        let store = InMemoryInteractionStore::new(config.lock_timeout());
        Self {
            wishes: Arc::new(store.clone()),
            store: Arc::new(store),
            profiles: Arc::new(InMemoryProfileDirectory::new()),
        }
    }

    async fn surreal(config: &AppConfig) -> anyhow::Result<Self> {
        let client = Arc::new(db::connect(&DbConfig::from_app_config(config)).await?);
        let store = SurrealInteractionStore::with_lock_timeout(client.clone(), config.lock_timeout());
        store.ensure_schema().await?;
        Ok(Self {
            wishes: Arc::new(store.clone()),
            store: Arc::new(store),
            profiles: Arc::new(SurrealProfileDirectory::with_client(client)),
        })
    }
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let storage = match config.data_backend.trim().to_ascii_lowercase().as_str() {
            "memory" => Storage::in_memory(&config),
            "surreal" => Storage::surreal(&config).await?,
            other => bail!("unsupported data_backend '{other}'"),
        };

        let limiter_store: Arc<dyn RateLimitStore> =
            match config.rate_limit_backend.trim().to_ascii_lowercase().as_str() {
                "memory" => Arc::new(InMemoryRateLimitStore::new()),
                "redis" => Arc::new(RedisRateLimitStore::connect(&config.redis_url).await?),
                other => bail!("unsupported rate_limit_backend '{other}'"),
            };

        let classifier = ChatModerationClient::new(&config);
        if !classifier.is_configured() {
            tracing::warn!("moderation api key is not configured; all content will be rejected");
        }

        tracing::info!(
            data_backend = %config.data_backend,
            rate_limit_backend = %config.rate_limit_backend,
            "app state ready"
        );
        Ok(Self::assemble(
            config,
            storage,
            Arc::new(classifier),
            limiter_store,
        ))
    }

    /// Memory-backed state around an arbitrary classifier.
    #[cfg(test)]
    pub fn in_memory(config: AppConfig, classifier: Arc<dyn ContentClassifier>) -> Self {
        let storage = Storage::in_memory(&config);
        Self::assemble(
            config,
            storage,
            classifier,
            Arc::new(InMemoryRateLimitStore::new()),
        )
    }

    fn assemble(
        config: AppConfig,
        storage: Storage,
        classifier: Arc<dyn ContentClassifier>,
        limiter_store: Arc<dyn RateLimitStore>,
    ) -> Self {
        let coordinator = ConsistencyCoordinator::new(storage.store.clone());
        let moderation = ModerationGate::new(classifier, config.moderation_timeout());
        let content_limiter = RateLimiter::new(
            limiter_store,
            RateLimitPolicy {
                limit: config.content_rate_limit,
                window: config.content_rate_window(),
            },
        );
        Self {
            wishes: WishService::new(
                storage.wishes.clone(),
                coordinator.clone(),
                moderation.clone(),
            ),
            likes: LikeService::new(coordinator.clone()),
            comments: CommentService::new(
                storage.wishes.clone(),
                coordinator,
                moderation,
                storage.profiles.clone(),
            ),
            interactions: InteractionService::new(storage.wishes, storage.store, storage.profiles),
            content_limiter,
            config,
        }
    }
}
