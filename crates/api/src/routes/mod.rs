use axum::extract::{Extension, Path, State};
use axum::{
    Json, Router,
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use validator::Validate;
use wishwall_domain::{
    DomainResult,
    comments::{CommentCreate, CommentView},
    error::DomainError,
    identity::ActorIdentity,
    interactions::InteractionSnapshot,
    likes::LikeToggleOutcome,
    util::format_ms_rfc3339,
    wishes::{Wish, WishCreate},
};

use crate::middleware::AuthContext;
use crate::{
    error::ApiError, middleware as app_middleware, observability, state::AppState, validation,
};

const WISH_TARGET: &str = "wish";
const COMMENT_TARGET: &str = "comment";

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/v1/wishes", post(create_wish))
        .route("/v1/wishes/:wish_id", delete(delete_wish))
        .route("/v1/wishes/:wish_id/like", post(toggle_like))
        .route("/v1/wishes/:wish_id/comments", post(create_comment))
        .route("/v1/comments/:comment_id", delete(delete_comment))
        .route_layer(middleware::from_fn(app_middleware::require_auth_middleware));

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/v1/wishes/:wish_id", get(get_wish))
        .route("/v1/wishes/:wish_id/interactions", get(get_interactions))
        .merge(protected)
        .layer(middleware::from_fn(app_middleware::metrics_layer))
        .layer(app_middleware::timeout_layer())
        .layer(app_middleware::trace_layer())
        .layer(app_middleware::set_request_id_layer())
        .layer(app_middleware::propagate_request_id_layer())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth_middleware,
        ))
        .layer(middleware::from_fn(
            app_middleware::correlation_id_middleware,
        ));

    if !state.config.app_env.eq_ignore_ascii_case("test") {
        app = app.layer(app_middleware::rate_limit_layer());
    }

    app.with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.app_env.clone(),
    })
}

async fn metrics() -> Response {
    match observability::render_metrics() {
        Some(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct CreateWishRequest {
    content: String,
    is_public: Option<bool>,
}

#[derive(Debug, Serialize)]
struct WishResponse {
    #[serde(flatten)]
    wish: Wish,
    created_at: String,
    updated_at: String,
}

impl From<Wish> for WishResponse {
    fn from(wish: Wish) -> Self {
        Self {
            created_at: format_ms_rfc3339(wish.created_at_ms),
            updated_at: format_ms_rfc3339(wish.updated_at_ms),
            wish,
        }
    }
}

async fn create_wish(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateWishRequest>,
) -> Result<(StatusCode, Json<WishResponse>), ApiError> {
    let actor = auth.actor()?;
    enforce_content_rate(&state, WISH_TARGET, &actor).await?;
    let wish = moderated(
        WISH_TARGET,
        state
            .wishes
            .create(
                &actor,
                WishCreate {
                    content: payload.content,
                    is_public: payload.is_public,
                },
            )
            .await,
    )?;
    tracing::info!(wish_id = %wish.wish_id, actor_id = %actor.user_id, "wish created");
    Ok((StatusCode::CREATED, Json(wish.into())))
}

async fn get_wish(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(wish_id): Path<String>,
) -> Result<Json<WishResponse>, ApiError> {
    let actor = auth.optional_actor();
    let wish = state.wishes.get(actor.as_ref(), &wish_id).await?;
    Ok(Json(wish.into()))
}

async fn delete_wish(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(wish_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let actor = auth.actor()?;
    state.wishes.delete(&actor, &wish_id).await?;
    tracing::info!(wish_id = %wish_id, actor_id = %actor.user_id, "wish deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn get_interactions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(wish_id): Path<String>,
) -> Result<Json<InteractionSnapshot>, ApiError> {
    let actor = auth.optional_actor();
    let snapshot = state.interactions.snapshot(actor.as_ref(), &wish_id).await?;
    Ok(Json(snapshot))
}

async fn toggle_like(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(wish_id): Path<String>,
) -> Result<Json<LikeToggleOutcome>, ApiError> {
    let actor = auth.actor()?;
    let outcome = state.likes.toggle(&actor, &wish_id).await?;
    observability::register_like_toggle(outcome.liked);
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize, Validate)]
struct CreateCommentRequest {
    content: String,
    #[validate(length(min = 1, max = 64))]
    parent_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct CommentResponse {
    #[serde(flatten)]
    comment: CommentView,
    created_at: String,
}

async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(wish_id): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    validation::validate(&payload)?;
    let actor = auth.actor()?;
    enforce_content_rate(&state, COMMENT_TARGET, &actor).await?;
    let comment = moderated(
        COMMENT_TARGET,
        state
            .comments
            .create(
                &actor,
                CommentCreate {
                    wish_id,
                    content: payload.content,
                    parent_id: payload.parent_id,
                },
            )
            .await,
    )?;
    tracing::info!(
        wish_id = %comment.wish_id,
        comment_id = %comment.comment_id,
        actor_id = %actor.user_id,
        "comment created"
    );
    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            created_at: format_ms_rfc3339(comment.created_at_ms),
            comment,
        }),
    ))
}

async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(comment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let actor = auth.actor()?;
    state.comments.delete(&actor, &comment_id).await?;
    tracing::info!(comment_id = %comment_id, actor_id = %actor.user_id, "comment deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn enforce_content_rate(
    state: &AppState,
    target: &'static str,
    actor: &ActorIdentity,
) -> Result<(), ApiError> {
    let decision = state.content_limiter.check(target, &actor.user_id).await;
    if decision.allowed {
        return Ok(());
    }
    observability::register_content_throttled(target);
    let retry_after_secs = decision
        .retry_after
        .map(|wait| wait.as_secs_f64().ceil() as u64)
        .unwrap_or(1)
        .max(1);
    tracing::warn!(
        actor_id = %actor.user_id,
        content_target = target,
        retry_after_secs,
        "content creation throttled"
    );
    Err(ApiError::TooManyRequests { retry_after_secs })
}

fn moderated<T>(target: &'static str, result: DomainResult<T>) -> Result<T, ApiError> {
    match result {
        Ok(value) => {
            observability::register_moderation_verdict(target, "accepted");
            Ok(value)
        }
        Err(DomainError::ContentRejected(reason)) => {
            observability::register_content_rejection(target, reason.as_str());
            Err(ApiError::ContentRejected(reason))
        }
        Err(err) => Err(err.into()),
    }
}
