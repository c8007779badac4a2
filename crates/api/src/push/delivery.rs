//! HTTP delivery to push service endpoints

use async_trait::async_trait;
use orderpass_shared::PushSubscription;
use reqwest::header::{AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE};
use std::time::Duration;
use url::Url;

use super::{encryption, PushDelivery, PushError, PushPayload, VapidSigner};

#[derive(Debug, Clone)]
pub struct PushSettings {
    /// How long the push service may hold an undelivered message
    pub ttl_seconds: u32,
    pub timeout: Duration,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: 86_400,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Posts the JSON payload, encrypted for the subscribing browser, to each
/// subscription endpoint.
///
/// Requests are signed with VAPID when a signer is configured.
#[derive(Debug, Clone)]
pub struct HttpPushDelivery {
    client: reqwest::Client,
    settings: PushSettings,
    vapid: Option<VapidSigner>,
}

impl HttpPushDelivery {
    pub fn new(settings: PushSettings, vapid: Option<VapidSigner>) -> Result<Self, PushError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            settings,
            vapid,
        })
    }
}

#[async_trait]
impl PushDelivery for HttpPushDelivery {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<(), PushError> {
        let endpoint = Url::parse(&subscription.endpoint)
            .map_err(|e| PushError::InvalidEndpoint(format!("{}: {}", subscription.endpoint, e)))?;
        let body = encryption::encrypt(
            &subscription.p256dh,
            &subscription.auth,
            &serde_json::to_vec(payload)?,
        )?;

        let mut request = self
            .client
            .post(endpoint.clone())
            .header("TTL", self.settings.ttl_seconds.to_string())
            .header("Urgency", "normal")
            .header(CONTENT_ENCODING, encryption::CONTENT_ENCODING)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body);
        if let Some(vapid) = &self.vapid {
            request = request.header(AUTHORIZATION, vapid.authorization(&endpoint)?);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Rejected {
                status: status.as_u16(),
            });
        }

        tracing::debug!(
            subscription_id = subscription.id,
            status = status.as_u16(),
            "Push message accepted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::encryption::tests::browser_keys;
    use crate::push::vapid::tests::{TEST_PRIVATE_KEY, TEST_PUBLIC_KEY};
    use mockito::Matcher;
    use orderpass_shared::UserId;
    use time::OffsetDateTime;

    fn subscription(endpoint: String) -> PushSubscription {
        let (p256dh, auth) = browser_keys();
        PushSubscription {
            id: 1,
            endpoint,
            p256dh,
            auth,
            user_id: UserId(1),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn test_posts_encrypted_payload_with_ttl() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/push/abc")
            .match_header("ttl", "60")
            .match_header("content-encoding", "aes128gcm")
            .match_header("content-type", "application/octet-stream")
            .match_request(|request| {
                // Ciphertext only: the title must not appear in the clear
                request
                    .body()
                    .map(|body| !body.is_empty() && !body.windows(11).any(|w| w == b"Order ready"))
                    .unwrap_or(false)
            })
            .with_status(201)
            .create_async()
            .await;

        let delivery = HttpPushDelivery::new(
            PushSettings {
                ttl_seconds: 60,
                ..PushSettings::default()
            },
            None,
        )
        .unwrap();
        let payload = PushPayload::new(Some("Order ready".to_string()), Some("Table 5".to_string()));

        delivery
            .send(&subscription(format!("{}/push/abc", server.url())), &payload)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_signs_with_vapid_when_configured() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/push/abc")
            .match_header(
                "authorization",
                Matcher::Regex(format!(r"^vapid t=[\w-]+\.[\w-]+\.[\w-]+, k={}$", TEST_PUBLIC_KEY)),
            )
            .with_status(201)
            .create_async()
            .await;

        let signer =
            VapidSigner::from_pem(TEST_PRIVATE_KEY, TEST_PUBLIC_KEY, "mailto:kitchen@example.com")
                .unwrap();
        let delivery = HttpPushDelivery::new(PushSettings::default(), Some(signer)).unwrap();

        delivery
            .send(
                &subscription(format!("{}/push/abc", server.url())),
                &PushPayload::new(None, None),
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_gone_subscription_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/push/expired")
            .with_status(410)
            .create_async()
            .await;

        let delivery = HttpPushDelivery::new(PushSettings::default(), None).unwrap();
        let result = delivery
            .send(
                &subscription(format!("{}/push/expired", server.url())),
                &PushPayload::new(None, None),
            )
            .await;

        assert!(matches!(result, Err(PushError::Rejected { status: 410 })));
    }

    #[tokio::test]
    async fn test_unusable_keys_are_not_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/push/abc")
            .expect(0)
            .create_async()
            .await;

        let delivery = HttpPushDelivery::new(PushSettings::default(), None).unwrap();
        let mut stale = subscription(format!("{}/push/abc", server.url()));
        stale.p256dh = "not base64!".to_string();

        let result = delivery.send(&stale, &PushPayload::new(None, None)).await;
        assert!(matches!(result, Err(PushError::InvalidKeys(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_endpoint() {
        let delivery = HttpPushDelivery::new(PushSettings::default(), None).unwrap();
        let result = delivery
            .send(&subscription("not a url".to_string()), &PushPayload::new(None, None))
            .await;

        assert!(matches!(result, Err(PushError::InvalidEndpoint(_))));
    }
}
