use std::time::Duration;

use anyhow::Context;
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

use crate::config::AppConfig;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl DbConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            endpoint: config.surreal_endpoint.clone(),
            namespace: config.surreal_ns.clone(),
            database: config.surreal_db.clone(),
            username: config.surreal_user.clone(),
            password: config.surreal_pass.clone(),
        }
    }
}

/// Opens an authenticated websocket session scoped to the configured
/// namespace and database.
pub async fn connect(config: &DbConfig) -> anyhow::Result<Surreal<Client>> {
    let address = parse_socket_address(&config.endpoint)?;
    let db = Surreal::<Client>::init();
    db.connect::<Ws>(address.as_str())
        .await
        .with_context(|| format!("connect surreal at {}", config.endpoint))?;
    db.signin(Root {
        username: &config.username,
        password: &config.password,
    })
    .await
    .context("surreal signin")?;
    db.use_ns(&config.namespace)
        .use_db(&config.database)
        .await
        .context("select surreal namespace")?;
    tracing::info!(
        endpoint = %config.endpoint,
        namespace = %config.namespace,
        database = %config.database,
        "surreal connected"
    );
    Ok(db)
}

/// TCP reachability probe used by the health endpoint.
pub async fn probe(config: &DbConfig) -> anyhow::Result<()> {
    let address = parse_socket_address(&config.endpoint)?;
    timeout(Duration::from_secs(2), TcpStream::connect(&address))
        .await
        .map_err(|_| anyhow::anyhow!("surreal endpoint connect timed out"))?
        .with_context(|| format!("surreal endpoint connect failed: {address}"))?;
    Ok(())
}

fn parse_socket_address(endpoint: &str) -> anyhow::Result<String> {
    let normalized = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("ws://{endpoint}")
    };
    let parsed = Url::parse(&normalized)
        .with_context(|| format!("invalid surreal endpoint '{endpoint}'"))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("missing surreal host in endpoint '{endpoint}'"))?;
    let port = parsed.port_or_known_default().unwrap_or(match parsed.scheme() {
        "wss" | "https" => 443,
        _ => 8000,
    });
    Ok(format!("{host}:{port}"))
}

#[cfg(test)]
mod tests {
    use super::parse_socket_address;

    #[test]
    fn endpoint_without_scheme_defaults_to_ws() {
        assert_eq!(
            parse_socket_address("127.0.0.1:8000").unwrap(),
            "127.0.0.1:8000"
        );
        assert_eq!(
            parse_socket_address("wss://db.example.com").unwrap(),
            "db.example.com:443"
        );
    }
}
