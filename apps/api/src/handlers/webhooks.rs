use std::collections::HashSet;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use shared_models::{Action, ApiError, Permission, RequestContext, SubscriptionHealth, WebhookEvent, WebhookSubscription};
use uuid::Uuid;

use crate::error_map::map_webhook;
use crate::state::AppState;

fn require_webhook_admin(ctx: &RequestContext) -> Result<(), ApiError> {
    match shared_models::auth::allow(ctx, Action::ManageWebhooks, None) {
        Permission::Allow => Ok(()),
        Permission::Deny => Err(ApiError::Authorization("webhook management requires super_admin".into())),
    }
}

#[derive(Deserialize)]
pub struct CreateSubscriptionRequest {
    pub url: String,
    pub events: HashSet<WebhookEvent>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    5
}

/// The secret is always generated server-side and returned exactly once, in
/// this response — a client-supplied secret would let the caller predict or
/// replay a valid `X-Signature` header.
pub async fn create_subscription(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    Json(req): Json<CreateSubscriptionRequest>,
) -> Result<Json<WebhookSubscription>, ApiError> {
    require_webhook_admin(&ctx)?;
    let subscription = WebhookSubscription {
        id: Uuid::new_v4(),
        url: req.url,
        events: req.events,
        secret: webhook_cell::generate_secret(),
        is_active: true,
        retry_count: 0,
        max_retries: req.max_retries,
        last_success_at: None,
        last_failure_at: None,
        last_failure_reason: None,
    };
    let created = state.subscriptions.create(subscription).await;
    Ok(Json(created))
}

pub async fn list_subscriptions(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
) -> Result<Json<Vec<WebhookSubscription>>, ApiError> {
    require_webhook_admin(&ctx)?;
    Ok(Json(state.subscriptions.list().await))
}

pub async fn get_subscription(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WebhookSubscription>, ApiError> {
    require_webhook_admin(&ctx)?;
    Ok(Json(state.subscriptions.get(id).await.map_err(map_webhook)?))
}

pub async fn update_subscription(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut subscription): Json<WebhookSubscription>,
) -> Result<Json<WebhookSubscription>, ApiError> {
    require_webhook_admin(&ctx)?;
    subscription.id = id;
    let updated = state.subscriptions.update(subscription).await.map_err(map_webhook)?;
    Ok(Json(updated))
}

pub async fn delete_subscription(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(), ApiError> {
    require_webhook_admin(&ctx)?;
    state.subscriptions.delete(id).await.map_err(map_webhook)
}

pub async fn subscription_health(
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubscriptionHealth>, ApiError> {
    require_webhook_admin(&ctx)?;
    Ok(Json(state.subscriptions.health(id).await.map_err(map_webhook)?))
}
