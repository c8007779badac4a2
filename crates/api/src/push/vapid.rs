//! VAPID identification of the application server (RFC 8292)

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Duration, OffsetDateTime};
use url::Url;

use super::PushError;

/// Lifetime of a signed VAPID token (the RFC allows at most 24 hours)
const TOKEN_LIFETIME_HOURS: i64 = 12;

#[derive(Debug, Serialize, Deserialize)]
struct VapidClaims {
    aud: String,
    exp: i64,
    sub: String,
}

/// Signs per-origin ES256 tokens for the `Authorization: vapid` header
#[derive(Clone)]
pub struct VapidSigner {
    key: EncodingKey,
    public_key: String,
    subject: String,
}

impl VapidSigner {
    /// `private_key_pem` is a PKCS#8 P-256 key; `public_key` is the
    /// base64url uncompressed point handed to browsers.
    pub fn from_pem(
        private_key_pem: &str,
        public_key: impl Into<String>,
        subject: impl Into<String>,
    ) -> Result<Self, PushError> {
        let key = EncodingKey::from_ec_pem(private_key_pem.as_bytes())
            .map_err(|e| PushError::Signing(e.to_string()))?;

        Ok(Self {
            key,
            public_key: public_key.into(),
            subject: subject.into(),
        })
    }

    /// Header value for a request to `endpoint`
    pub fn authorization(&self, endpoint: &Url) -> Result<String, PushError> {
        let origin = endpoint.origin();
        if !origin.is_tuple() {
            return Err(PushError::InvalidEndpoint(endpoint.to_string()));
        }

        let claims = VapidClaims {
            aud: origin.ascii_serialization(),
            exp: (OffsetDateTime::now_utc() + Duration::hours(TOKEN_LIFETIME_HOURS))
                .unix_timestamp(),
            sub: self.subject.clone(),
        };
        let token = encode(&Header::new(Algorithm::ES256), &claims, &self.key)
            .map_err(|e| PushError::Signing(e.to_string()))?;

        Ok(format!("vapid t={}, k={}", token, self.public_key))
    }
}

impl fmt::Debug for VapidSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VapidSigner")
            .field("public_key", &self.public_key)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}
