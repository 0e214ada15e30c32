//! Per-entry processing: freshness filter, extraction, formatting, delivery.

pub mod extractor;
pub mod filter;
pub mod formatter;

pub use extractor::Extractor;
pub use formatter::Formatter;

use std::sync::Arc;

use chrono::{DateTime, Local, TimeDelta, Utc};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::config::Config;
use crate::domain::FeedEntry;
use crate::webhook::Sink;

/// What happened to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Older than the freshness window.
    Stale,
    /// Nothing to deliver.
    Empty,
    Delivered,
    /// The sink rejected it; the notification was dropped.
    Failed,
}

pub struct Pipeline {
    freshness_window: TimeDelta,
    extractor: Extractor,
    formatter: Formatter,
    sink: Arc<dyn Sink + Send + Sync>,
}

impl Pipeline {
    pub fn new(
        freshness_window: TimeDelta,
        extractor: Extractor,
        formatter: Formatter,
        sink: Arc<dyn Sink + Send + Sync>,
    ) -> Self {
        Self {
            freshness_window,
            extractor,
            formatter,
            sink,
        }
    }

    pub fn from_config(config: &Config, sink: Arc<dyn Sink + Send + Sync>) -> Self {
        Self::new(
            config.freshness_window,
            Extractor::new(config.gallery_base_url.as_str()),
            Formatter::new(config.embed_color, config.embed_author_image_url.as_str()),
            sink,
        )
    }

    pub async fn process(&self, entry: FeedEntry) -> Outcome {
        self.process_at(entry, Utc::now()).await
    }

    /// Process one entry as if observed at `now`.
    pub async fn process_at(&self, entry: FeedEntry, now: DateTime<Utc>) -> Outcome {
        if !filter::is_fresh(entry.published_at, now, self.freshness_window) {
            tracing::debug!("Skipping stale entry {}", entry.guid);
            return Outcome::Stale;
        }

        let fragments = self.extractor.extract(&entry);
        let sent_at = now.with_timezone(&Local);
        let Some(notification) = self.formatter.format(&entry, &fragments, &sent_at) else {
            tracing::debug!("Nothing to deliver for entry {}", entry.guid);
            return Outcome::Empty;
        };

        match self.sink.send(&notification).await {
            Ok(()) => {
                tracing::info!("Delivered {} ({})", entry.title, entry.guid);
                Outcome::Delivered
            }
            Err(e) => {
                tracing::error!("Error sending webhook for {}: {}", entry.guid, e);
                Outcome::Failed
            }
        }
    }

    /// Consume entries until the channel closes, then wait for in-flight
    /// deliveries.
    ///
    /// Each entry runs in its own task, so a slow send does not hold up the
    /// entries behind it.
    pub async fn run(self: Arc<Self>, mut receiver: mpsc::Receiver<FeedEntry>) {
        let mut tasks = JoinSet::new();

        while let Some(entry) = receiver.recv().await {
            let pipeline = Arc::clone(&self);
            tasks.spawn(async move { pipeline.process(entry).await });

            while let Some(finished) = tasks.try_join_next() {
                log_join_error(finished);
            }
        }

        while let Some(finished) = tasks.join_next().await {
            log_join_error(finished);
        }
        tracing::debug!("Entry channel closed, pipeline stopped");
    }
}

fn log_join_error(result: Result<Outcome, JoinError>) {
    if let Err(e) = result {
        tracing::error!("Entry task failed: {}", e);
    }
}
