use std::time::Duration;

use metrics::counter;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use wishwall_domain::ports::BoxFuture;
use wishwall_domain::ports::moderation::{ClassifierError, ContentClassifier};

use crate::config::AppConfig;

const ORACLE_CALLS_TOTAL: &str = "wishwall_moderation_oracle_calls_total";

/// Instruction sent with every classification. The oracle must answer with a
/// single `true` (safe) or `false` (unsafe) token.
pub const SAFETY_INSTRUCTION: &str = "You are a strict content safety reviewer for a public wish wall. \
Judge whether the user's wish is safe to publish. It is unsafe if it contains any of: \
pornographic or sexually suggestive material; violence, gore or terrorism; political content \
or attacks on national leaders; abuse, insults, discrimination or hate speech; promotion of \
illegal activity such as drugs or gambling; advertising, spam or solicitation; personal \
information of others such as phone numbers or addresses; content encouraging self-harm. \
Reply with exactly one lowercase word: true if the wish is safe, false if it is not. \
Do not explain.";

#[derive(Debug, Clone)]
pub struct ChatModerationClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatModerationClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_endpoint(
            &config.moderation_base_url,
            &config.moderation_api_key,
            &config.moderation_model,
            config.moderation_timeout(),
        )
    }

    pub fn with_endpoint(base_url: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let api_key = api_key.trim().to_string();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: if api_key.is_empty() {
                None
            } else {
                Some(api_key)
            },
            model: model.trim().to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, text: &str) -> Result<Option<String>, ClassifierError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ClassifierError::Configuration(
                "moderation api key is not configured".to_string(),
            ));
        };

        let body = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SAFETY_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("[wish]: {text}"),
                },
            ],
        };

        let response = self
            .http
            .post(endpoint_url(&self.base_url, "chat/completions"))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| ClassifierError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ClassifierError::Configuration(format!("oracle refused credentials: {status}"))
                }
                _ => ClassifierError::Upstream(format!("{status}: {}", truncate(&message, 200))),
            });
        }

        let payload = response
            .json::<ChatResponse>()
            .await
            .map_err(|err| ClassifierError::InvalidResponse(err.to_string()))?;
        Ok(first_reply(payload))
    }
}

impl ContentClassifier for ChatModerationClient {
    fn classify(&self, text: &str) -> BoxFuture<'_, Result<Option<String>, ClassifierError>> {
        let text = text.to_string();
        Box::pin(async move {
            let result = self.complete(&text).await;
            let outcome = match &result {
                Ok(Some(_)) => "answered",
                Ok(None) => "no_choice",
                Err(ClassifierError::Configuration(_)) => "not_configured",
                Err(ClassifierError::Transport(_)) => "transport_error",
                Err(ClassifierError::Upstream(_)) => "upstream_error",
                Err(ClassifierError::InvalidResponse(_)) => "invalid_response",
            };
            counter!(ORACLE_CALLS_TOTAL, "outcome" => outcome).increment(1);
            if let Err(err) = &result {
                tracing::warn!(error = %err, outcome, "moderation oracle call failed");
            }
            result
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage; 2],
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn first_reply(payload: ChatResponse) -> Option<String> {
    payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
}

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
