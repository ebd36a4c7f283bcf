/// Job queue publishing and callback verification
///
/// Deferred and scheduled work (invitation expiry, periodic token sweeps)
/// is published to a managed HTTP queue service, which calls back into the
/// API with the payload plus an HMAC signature. Without a queue token the
/// publisher degrades to a warn-and-stub no-op so flows that schedule work
/// still complete on self-hosted installs.
///
/// Callback verification accepts signatures under either the current or
/// the next signing key, so key rotation does not drop in-flight jobs.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::env;
use thiserror::Error;

/// Default queue API base URL
const DEFAULT_API_BASE_URL: &str = "https://qstash.upstash.io";

/// Message id returned by the disabled publisher
const STUB_MESSAGE_ID: &str = "stub";

/// Queue settings from the environment
#[derive(Debug, Clone)]
pub struct QueueSettings {
    /// Publish token
    pub token: String,

    /// Queue API base URL
    pub api_base_url: String,

    /// Current callback signing key
    pub current_signing_key: String,

    /// Next callback signing key (rotation)
    pub next_signing_key: String,

    /// Public URL the queue calls back into
    pub callback_url: Option<String>,
}

impl QueueSettings {
    /// Reads settings from the environment; None if no queue configured
    pub fn from_env_optional() -> Option<Self> {
        let token = env::var("QUEUE_TOKEN").ok()?;

        let api_base_url = env::var("QUEUE_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let current_signing_key = env::var("QUEUE_CURRENT_SIGNING_KEY").unwrap_or_default();
        let next_signing_key = env::var("QUEUE_NEXT_SIGNING_KEY").unwrap_or_default();
        let callback_url = env::var("QUEUE_CALLBACK_URL").ok();

        Some(Self {
            token,
            api_base_url,
            current_signing_key,
            next_signing_key,
            callback_url,
        })
    }
}

/// Queue error
#[derive(Debug, Error)]
pub enum QueueError {
    /// Transport-level failure
    #[error("Queue request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Queue service rejected the publish
    #[error("Queue API error: status {0}")]
    Api(u16),
}

/// Publish response envelope
#[derive(Debug, Deserialize)]
struct PublishResponse {
    #[serde(rename = "messageId")]
    message_id: String,
}

/// Job queue publisher capability
#[derive(Clone)]
pub enum JobQueue {
    /// Managed queue service
    Live {
        /// HTTP client
        http: reqwest::Client,

        /// Queue settings
        settings: QueueSettings,
    },

    /// No queue configured; publishes are logged and stubbed
    Disabled,
}

impl JobQueue {
    /// Builds the capability from optional queue settings
    pub fn new(settings: Option<QueueSettings>) -> Self {
        match settings {
            Some(settings) => JobQueue::Live {
                http: reqwest::Client::new(),
                settings,
            },
            None => {
                tracing::info!("Job queue disabled (token not configured)");
                JobQueue::Disabled
            }
        }
    }

    /// The callback URL jobs should be delivered to, if one is configured
    pub fn callback_url(&self) -> Option<&str> {
        match self {
            JobQueue::Live { settings, .. } => settings.callback_url.as_deref(),
            JobQueue::Disabled => None,
        }
    }

    /// Publishes a JSON job to a destination URL
    ///
    /// Returns the queue's message id. The disabled variant warns and
    /// returns a stub id, matching the contract that scheduling work is
    /// always safe to call.
    pub async fn publish_json(
        &self,
        destination_url: &str,
        payload: &serde_json::Value,
    ) -> Result<String, QueueError> {
        let (http, settings) = match self {
            JobQueue::Live { http, settings } => (http, settings),
            JobQueue::Disabled => {
                tracing::warn!(
                    destination = destination_url,
                    "Skipping job publish: queue not configured"
                );
                return Ok(STUB_MESSAGE_ID.to_string());
            }
        };

        let url = format!("{}/v2/publish/{}", settings.api_base_url, destination_url);

        let response = http
            .post(&url)
            .bearer_auth(&settings.token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueueError::Api(status.as_u16()));
        }

        let body: PublishResponse = response.json().await?;
        Ok(body.message_id)
    }
}

/// Verifies inbound queue callback signatures
///
/// Signatures are hex-encoded HMAC-SHA256 over the raw request body,
/// checked against the current key and then the next key.
#[derive(Debug, Clone)]
pub struct QueueReceiver {
    current_signing_key: String,
    next_signing_key: String,
}

impl QueueReceiver {
    /// Creates a receiver from queue settings
    pub fn new(settings: &QueueSettings) -> Self {
        QueueReceiver {
            current_signing_key: settings.current_signing_key.clone(),
            next_signing_key: settings.next_signing_key.clone(),
        }
    }

    /// Signs a body with a key (hex HMAC-SHA256)
    fn sign(key: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verifies a signature against the current and next signing keys
    pub fn verify(&self, signature: &str, body: &[u8]) -> bool {
        for key in [&self.current_signing_key, &self.next_signing_key] {
            if key.is_empty() {
                continue;
            }

            let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes())
                .expect("HMAC can take key of any size");
            mac.update(body);

            // Decode the presented signature and compare in constant time.
            if let Ok(presented) = hex::decode(signature) {
                if mac.verify_slice(&presented).is_ok() {
                    return true;
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(current: &str, next: &str) -> QueueSettings {
        QueueSettings {
            token: "qst_token".to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            current_signing_key: current.to_string(),
            next_signing_key: next.to_string(),
            callback_url: Some("https://api.example.com/api/jobs".to_string()),
        }
    }

    #[tokio::test]
    async fn test_disabled_queue_returns_stub_id() {
        let queue = JobQueue::new(None);
        let id = queue
            .publish_json("https://example.com/hook", &serde_json::json!({"a": 1}))
            .await
            .unwrap();
        assert_eq!(id, "stub");
        assert!(queue.callback_url().is_none());
    }

    #[test]
    fn test_receiver_accepts_current_key() {
        let receiver = QueueReceiver::new(&settings("key-one", "key-two"));
        let body = br#"{"type":"tokens.cleanup"}"#;

        let signature = QueueReceiver::sign("key-one", body);
        assert!(receiver.verify(&signature, body));
    }

    #[test]
    fn test_receiver_accepts_next_key() {
        let receiver = QueueReceiver::new(&settings("key-one", "key-two"));
        let body = br#"{"type":"tokens.cleanup"}"#;

        let signature = QueueReceiver::sign("key-two", body);
        assert!(receiver.verify(&signature, body));
    }

    #[test]
    fn test_receiver_rejects_bad_signature() {
        let receiver = QueueReceiver::new(&settings("key-one", "key-two"));
        let body = br#"{"type":"tokens.cleanup"}"#;

        assert!(!receiver.verify("deadbeef", body));
        assert!(!receiver.verify("not-hex", body));
    }

    #[test]
    fn test_receiver_rejects_tampered_body() {
        let receiver = QueueReceiver::new(&settings("key-one", ""));
        let signature = QueueReceiver::sign("key-one", b"original");
        assert!(!receiver.verify(&signature, b"tampered"));
    }
}
