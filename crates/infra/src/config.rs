use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_MODERATION_BASE_URL: &str = "https://api.siliconflow.cn/v1";
pub const DEFAULT_MODERATION_MODEL: &str = "Qwen/Qwen3-VL-8B-Instruct";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_env: String,
    pub port: u16,
    pub log_level: String,
    pub data_backend: String,
    pub surreal_endpoint: String,
    pub surreal_ns: String,
    pub surreal_db: String,
    pub surreal_user: String,
    pub surreal_pass: String,
    pub rate_limit_backend: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub moderation_base_url: String,
    /// Empty means not configured; every check then fails closed.
    pub moderation_api_key: String,
    pub moderation_model: String,
    pub moderation_timeout_ms: u64,
    pub lock_timeout_ms: u64,
    pub content_rate_limit: u64,
    pub content_rate_window_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        // The provider-specific variables are honoured as fallbacks.
        let legacy_key = std::env::var("SILICONFLOW_API_KEY").unwrap_or_default();
        let legacy_base_url = std::env::var("SILICONFLOW_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODERATION_BASE_URL.to_string());

        let cfg = config::Config::builder()
            .set_default("app_env", "development")?
            .set_default("port", 3000)?
            .set_default("log_level", "info")?
            .set_default("data_backend", "memory")?
            .set_default("surreal_endpoint", "ws://127.0.0.1:8000")?
            .set_default("surreal_ns", "wishwall")?
            .set_default("surreal_db", "wall")?
            .set_default("surreal_user", "root")?
            .set_default("surreal_pass", "root")?
            .set_default("rate_limit_backend", "memory")?
            .set_default("redis_url", "redis://127.0.0.1:6379")?
            .set_default("jwt_secret", "dev-secret")?
            .set_default("moderation_base_url", legacy_base_url)?
            .set_default("moderation_api_key", legacy_key)?
            .set_default("moderation_model", DEFAULT_MODERATION_MODEL)?
            .set_default("moderation_timeout_ms", 8_000)?
            .set_default("lock_timeout_ms", 5_000)?
            .set_default("content_rate_limit", 10)?
            .set_default("content_rate_window_secs", 60)?
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        cfg.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn moderation_timeout(&self) -> Duration {
        Duration::from_millis(self.moderation_timeout_ms.max(1))
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms.max(1))
    }

    pub fn content_rate_window(&self) -> Duration {
        Duration::from_secs(self.content_rate_window_secs.max(1))
    }
}
