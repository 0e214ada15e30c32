//! Chat-webhook delivery.
//!
//! [`WebhookClient`] posts one embed per notification in the Discord webhook
//! format. Rate-limit responses are waited out and re-sent a bounded number of
//! times; every other failure is returned to the caller, which drops the
//! notification.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::Notification;

const USER_AGENT: &str = concat!("feedhook/", env!("CARGO_PKG_VERSION"));
const MAX_ATTEMPTS: usize = 3;
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("webhook returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("still rate limited after {0} attempts")]
    RateLimited(usize),
}

/// Destination for formatted notifications.
#[async_trait]
pub trait Sink {
    async fn send(&self, notification: &Notification) -> Result<(), WebhookError>;
}

pub struct WebhookClient {
    client: Client,
    url: Url,
    username: String,
    avatar_url: String,
}

impl WebhookClient {
    pub fn new(
        url: Url,
        username: impl Into<String>,
        avatar_url: impl Into<String>,
    ) -> Result<Self, WebhookError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            url,
            username: username.into(),
            avatar_url: avatar_url.into(),
        })
    }

    fn payload<'a>(&'a self, notification: &'a Notification) -> WebhookPayload<'a> {
        WebhookPayload {
            username: &self.username,
            avatar_url: &self.avatar_url,
            embeds: vec![Embed {
                title: &notification.title,
                url: &notification.url,
                color: notification.color,
                description: &notification.body,
                footer: EmbedFooter {
                    text: &notification.footer_text,
                    icon_url: &notification.footer_icon,
                },
                thumbnail: notification
                    .thumbnail
                    .as_deref()
                    .map(|url| EmbedThumbnail { url }),
            }],
        }
    }
}

#[async_trait]
impl Sink for WebhookClient {
    async fn send(&self, notification: &Notification) -> Result<(), WebhookError> {
        let payload = self.payload(notification);

        for attempt in 1..=MAX_ATTEMPTS {
            let response = self
                .client
                .post(self.url.clone())
                .json(&payload)
                .send()
                .await?;
            let status = response.status();

            if status.is_success() {
                return Ok(());
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let headers = response.headers().clone();
                let body = response.text().await.unwrap_or_default();
                match backoff(attempt, &headers, &body) {
                    Some(wait) => {
                        tracing::warn!(
                            "Webhook rate limited (attempt {}/{}), retrying in {:?}",
                            attempt,
                            MAX_ATTEMPTS,
                            wait
                        );
                        tokio::time::sleep(wait).await;
                    }
                    None => tracing::warn!(
                        "Webhook rate limited (attempt {}/{}), giving up",
                        attempt,
                        MAX_ATTEMPTS
                    ),
                }
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(WebhookError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Err(WebhookError::RateLimited(MAX_ATTEMPTS))
    }
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

/// Wait before re-sending after a 429, or `None` once no attempts remain.
fn backoff(attempt: usize, headers: &HeaderMap, body: &str) -> Option<Duration> {
    (attempt < MAX_ATTEMPTS).then(|| retry_after(headers, body).unwrap_or(DEFAULT_RETRY_AFTER))
}

/// Wait requested by a 429 response: `Retry-After` header first, then the
/// `retry_after` field of the JSON body. Both are in seconds.
fn retry_after(headers: &HeaderMap, body: &str) -> Option<Duration> {
    let from_header = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok());
    let from_body = || {
        serde_json::from_str::<RateLimitBody>(body)
            .ok()
            .map(|b| b.retry_after)
    };

    from_header
        .or_else(from_body)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .map(|wait| wait.min(MAX_RETRY_AFTER))
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    username: &'a str,
    avatar_url: &'a str,
    embeds: Vec<Embed<'a>>,
}

#[derive(Debug, Serialize)]
struct Embed<'a> {
    title: &'a str,
    url: &'a str,
    color: u32,
    description: &'a str,
    footer: EmbedFooter<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<EmbedThumbnail<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedFooter<'a> {
    text: &'a str,
    icon_url: &'a str,
}

#[derive(Debug, Serialize)]
struct EmbedThumbnail<'a> {
    url: &'a str,
}
