//! Application configuration

use orderpass_shared::DEFAULT_ACCOUNT_EMAIL;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,

    // Database (in-memory store when unset)
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub run_migrations: bool,

    // Orders created over a socket belong to this account
    pub default_account_email: String,

    // Push notifications
    pub vapid_subject: Option<String>,
    pub vapid_public_key: Option<String>,
    pub vapid_private_key: Option<String>,
    pub push_ttl_seconds: u32,
    pub push_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let vapid_subject = non_empty("VAPID_SUBJECT");
        let vapid_public_key = non_empty("VAPID_PUBLIC_KEY");
        let vapid_private_key = non_empty("VAPID_PRIVATE_KEY");

        // A public key is handed to browsers, so it must come with a subject
        if vapid_public_key.is_some() && vapid_subject.is_none() {
            return Err(ConfigError::Missing("VAPID_SUBJECT"));
        }
        if vapid_private_key.is_some() && vapid_public_key.is_none() {
            return Err(ConfigError::Missing("VAPID_PUBLIC_KEY"));
        }
        if let Some(subject) = &vapid_subject {
            if !(subject.starts_with("mailto:") || subject.starts_with("https:")) {
                return Err(ConfigError::Invalid(
                    "VAPID_SUBJECT must be a mailto: or https: URL",
                ));
            }
        }

        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| {
                let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
                format!("0.0.0.0:{}", port)
            }),

            // Database
            database_url: non_empty("DATABASE_URL"),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            run_migrations: env::var("RUN_MIGRATIONS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),

            default_account_email: env::var("DEFAULT_ACCOUNT_EMAIL")
                .unwrap_or_else(|_| DEFAULT_ACCOUNT_EMAIL.to_string()),

            // Push
            vapid_subject,
            vapid_public_key,
            vapid_private_key,
            push_ttl_seconds: env::var("PUSH_TTL_SECONDS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .unwrap_or(86_400),
            push_timeout: Duration::from_millis(
                env::var("PUSH_TIMEOUT_MS")
                    .unwrap_or_else(|_| "10000".to_string())
                    .parse()
                    .unwrap_or(10_000),
            ),
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}
