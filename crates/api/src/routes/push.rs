//! Web push subscription routes
//!
//! Browsers register a push subscription against an account email; any caller
//! can then send a notification to every device of that account.

use axum::{
    extract::{Path, State},
    Json,
};
use orderpass_shared::{NewPushSubscription, PushSubscription};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    push::{deliver_all, PushPayload},
    state::AppState,
};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub subscription: PushSubscription,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendNotificationRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendNotificationResponse {
    pub success: bool,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VapidKeyResponse {
    pub public_key: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Store a browser subscription for an account, creating the account if needed
pub async fn subscribe(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(req): Json<NewPushSubscription>,
) -> ApiResult<Json<SubscribeResponse>> {
    if req.endpoint.trim().is_empty() {
        return Err(ApiError::BadRequest("endpoint is required".to_string()));
    }

    let subscription = state.subscriptions.subscribe(&email, req).await?;
    tracing::info!(
        email = %email,
        subscription_id = subscription.id,
        "Push subscription stored"
    );

    Ok(Json(SubscribeResponse {
        success: true,
        subscription,
    }))
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<Vec<PushSubscription>>> {
    Ok(Json(state.subscriptions.subscriptions_for(&email).await?))
}

/// Send one notification to every subscription of an account
pub async fn send_notification(
    State(state): State<AppState>,
    Path(email): Path<String>,
    body: Option<Json<SendNotificationRequest>>,
) -> ApiResult<Json<SendNotificationResponse>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let subscriptions = state.subscriptions.subscriptions_for(&email).await?;
    if subscriptions.is_empty() {
        return Err(ApiError::NotFound("No subscriptions found".to_string()));
    }

    let payload = PushPayload::new(req.title, req.body);
    let report = deliver_all(state.push.as_ref(), &subscriptions, &payload).await;
    tracing::info!(
        email = %email,
        sent = report.sent,
        failed = report.failed,
        "Push notification sent"
    );

    Ok(Json(SendNotificationResponse {
        success: true,
        sent: report.sent,
        failed: report.failed,
    }))
}

pub async fn vapid_public_key(State(state): State<AppState>) -> Json<VapidKeyResponse> {
    Json(VapidKeyResponse {
        public_key: state.vapid_public_key.clone(),
    })
}
