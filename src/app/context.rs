use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::webhook::{Sink, WebhookClient};

pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub normalizer: Normalizer,
    pub sink: Arc<dyn Sink + Send + Sync>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new()?);
        let sink: Arc<dyn Sink + Send + Sync> = Arc::new(WebhookClient::new(
            config.webhook_url.clone(),
            &config.webhook_username,
            &config.webhook_avatar,
        )?);

        Ok(Self::with_parts(config, fetcher, sink))
    }

    /// Build a context around caller-supplied fetcher and sink.
    pub fn with_parts(
        config: Config,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        sink: Arc<dyn Sink + Send + Sync>,
    ) -> Self {
        Self {
            config,
            fetcher,
            normalizer: Normalizer::new(),
            sink,
        }
    }
}
