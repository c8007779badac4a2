//! Push notifications
//!
//! Delivery of short notification payloads to browser push subscriptions.
//! Each recipient is delivered independently; one failing endpoint never
//! prevents delivery to the others.

mod delivery;
mod encryption;
mod vapid;

use async_trait::async_trait;
use futures::future::join_all;
use orderpass_shared::PushSubscription;
use serde::{Deserialize, Serialize};

pub use delivery::{HttpPushDelivery, PushSettings};
pub use vapid::VapidSigner;

#[cfg(test)]
pub(crate) use encryption::tests::browser_keys;

const DEFAULT_TITLE: &str = "New Notification";
const DEFAULT_BODY: &str = "You have a new message";
const DEFAULT_ICON: &str = "/icon.png";

/// Notification shown by the service worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
}

impl PushPayload {
    pub fn new(title: Option<String>, body: Option<String>) -> Self {
        Self {
            title: title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: body
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| DEFAULT_BODY.to_string()),
            icon: DEFAULT_ICON.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("push request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("push service rejected the message with status {status}")]
    Rejected { status: u16 },
    #[error("invalid push endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("invalid subscription keys: {0}")]
    InvalidKeys(String),
    #[error("failed to encrypt payload: {0}")]
    Encrypt(String),
    #[error("failed to sign VAPID token: {0}")]
    Signing(String),
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Sends one payload to one subscription
#[async_trait]
pub trait PushDelivery: Send + Sync {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<(), PushError>;
}

/// Per-recipient outcome counts of a fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

/// Send `payload` to every subscription concurrently and count the outcomes
pub async fn deliver_all(
    delivery: &dyn PushDelivery,
    subscriptions: &[PushSubscription],
    payload: &PushPayload,
) -> DeliveryReport {
    let results = join_all(
        subscriptions
            .iter()
            .map(|subscription| delivery.send(subscription, payload)),
    )
    .await;

    let mut report = DeliveryReport::default();
    for (subscription, result) in subscriptions.iter().zip(results) {
        match result {
            Ok(()) => report.sent += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    subscription_id = subscription.id,
                    endpoint = %subscription.endpoint,
                    error = %e,
                    "Push delivery failed"
                );
            }
        }
    }
    report
}
