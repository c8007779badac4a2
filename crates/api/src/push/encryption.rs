//! Message encryption for web push (RFC 8291, `aes128gcm` content coding)

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use super::PushError;

/// `Content-Encoding` of an encrypted push body
pub const CONTENT_ENCODING: &str = "aes128gcm";

/// Encrypt `plaintext` for the browser owning the subscription keys.
///
/// `p256dh` and `auth` are the base64url values the browser hands out with
/// its subscription. Trailing padding is tolerated.
pub fn encrypt(p256dh: &str, auth: &str, plaintext: &[u8]) -> Result<Vec<u8>, PushError> {
    let public_key = decode_key("p256dh", p256dh)?;
    let auth_secret = decode_key("auth", auth)?;

    ece::encrypt(&public_key, &auth_secret, plaintext)
        .map_err(|e| PushError::Encrypt(e.to_string()))
}

fn decode_key(name: &'static str, value: &str) -> Result<Vec<u8>, PushError> {
    URL_SAFE_NO_PAD
        .decode(value.trim().trim_end_matches('='))
        .map_err(|e| PushError::InvalidKeys(format!("{}: {}", name, e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Fresh browser-side subscription keys, base64url encoded
    pub(crate) fn browser_keys() -> (String, String) {
        let (key_pair, auth_secret) = ece::generate_keypair_and_auth_secret().unwrap();
        (
            URL_SAFE_NO_PAD.encode(key_pair.pub_as_raw().unwrap()),
            URL_SAFE_NO_PAD.encode(auth_secret),
        )
    }

    #[test]
    fn test_browser_can_decrypt() {
        let (key_pair, auth_secret) = ece::generate_keypair_and_auth_secret().unwrap();
        let p256dh = URL_SAFE_NO_PAD.encode(key_pair.pub_as_raw().unwrap());
        let auth = URL_SAFE_NO_PAD.encode(auth_secret);
        let plaintext = br#"{"title":"Order ready","body":"Table 5","icon":"/icon.png"}"#;

        let body = encrypt(&p256dh, &auth, plaintext).unwrap();

        // salt(16) | record size(4) | key id length(1) | uncompressed sender key(65)
        assert_eq!(body[20], 65);
        assert_eq!(body[21], 0x04);
        assert!(!body.windows(11).any(|w| w == b"Order ready"));

        let components = key_pair.raw_components().unwrap();
        let decrypted = ece::decrypt(&components, &auth_secret, &body).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_padded_keys_are_accepted() {
        let (p256dh, auth) = browser_keys();
        assert!(encrypt(&format!("{}=", p256dh), &format!("{}==", auth), b"hi").is_ok());
    }

    #[test]
    fn test_invalid_keys() {
        let (p256dh, auth) = browser_keys();

        assert!(matches!(
            encrypt("not base64!", &auth, b"hi"),
            Err(PushError::InvalidKeys(_))
        ));
        // Decodes, but is not a P-256 point
        assert!(matches!(
            encrypt("QktleQ", &auth, b"hi"),
            Err(PushError::Encrypt(_))
        ));
        assert!(encrypt(&p256dh, &auth, b"hi").is_ok());
    }
}
