pub mod config;
pub mod db;
pub mod logging;
pub mod moderation_client;
pub mod rate_limit;
pub mod repositories;
