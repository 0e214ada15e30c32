use thiserror::Error;

use crate::config::ConfigError;
use crate::webhook::WebhookError;

#[derive(Error, Debug)]
pub enum FeedhookError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    #[error("Entry channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, FeedhookError>;
