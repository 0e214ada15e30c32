//! Periodic feed polling with duplicate suppression.
//!
//! The first fetch after setup is a baseline: its entries are recorded as
//! seen but never emitted. Every later fetch emits only entries whose guid has
//! not been seen before.

mod history;

pub use history::SeenHistory;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use url::Url;

use crate::app::{FeedhookError, Result};
use crate::domain::FeedEntry;
use crate::fetcher::{FetchResult, Fetcher};
use crate::normalizer::Normalizer;

pub struct Poller {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    url: String,
    interval: Duration,
    history: SeenHistory,
    etag: Option<String>,
    last_modified: Option<String>,
}

impl Poller {
    /// Register the feed and take the baseline fetch.
    pub async fn setup(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        normalizer: Normalizer,
        url: &str,
        interval: Duration,
        history_multiplier: usize,
    ) -> Result<Self> {
        Url::parse(url)?;

        let mut poller = Self {
            fetcher,
            normalizer,
            url: url.to_string(),
            interval,
            history: SeenHistory::new(history_multiplier),
            etag: None,
            last_modified: None,
        };

        let baseline = poller.poll_once().await?;
        tracing::info!("Baseline fetch of {} recorded {} entries", url, baseline.len());

        Ok(poller)
    }

    /// Fetch the feed once and return the entries not seen before.
    pub async fn poll_once(&mut self) -> Result<Vec<FeedEntry>> {
        let result = self
            .fetcher
            .fetch(
                &self.url,
                self.etag.as_deref(),
                self.last_modified.as_deref(),
            )
            .await?;

        match result {
            FetchResult::NotModified => {
                tracing::debug!("Feed {} not modified", self.url);
                Ok(Vec::new())
            }
            FetchResult::Content {
                body,
                etag,
                last_modified,
            } => {
                let entries = self.normalizer.normalize(&body)?;
                self.etag = etag;
                self.last_modified = last_modified;
                Ok(self.history.observe(entries))
            }
        }
    }

    /// Poll forever, sending new entries in feed order.
    ///
    /// A failed cycle is logged and the next one runs on schedule. Returns
    /// only when the receiving side has gone away.
    pub async fn run(mut self, sender: mpsc::Sender<FeedEntry>) -> Result<()> {
        let mut timer = interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer.tick().await; // The baseline fetch stands in for the first tick

        loop {
            timer.tick().await;

            let entries = match self.poll_once().await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::error!("Failed to refresh feed {}: {}", self.url, e);
                    continue;
                }
            };

            if !entries.is_empty() {
                tracing::info!("{} new entries from {}", entries.len(), self.url);
            }

            for entry in entries {
                sender
                    .send(entry)
                    .await
                    .map_err(|_| FeedhookError::ChannelClosed)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{rss_feed, ScriptedFetcher};

    const MINUTE: Duration = Duration::from_secs(60);
    const FEED_URL: &str = "https://example.com/feed";

    async fn setup(fetcher: Arc<ScriptedFetcher>) -> Result<Poller> {
        Poller::setup(fetcher, Normalizer::new(), FEED_URL, MINUTE, 3).await
    }

    #[tokio::test]
    async fn test_baseline_entries_are_not_new() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(rss_feed(&["a", "b"])),
            Ok(rss_feed(&["a", "b"])),
        ]);

        let mut poller = setup(fetcher).await.unwrap();

        assert!(poller.poll_once().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_guid_emitted_once() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(rss_feed(&["a"])),
            Ok(rss_feed(&["c", "b", "a"])),
            Ok(rss_feed(&["c", "b", "a"])),
        ]);

        let mut poller = setup(fetcher).await.unwrap();

        let guids: Vec<String> = poller
            .poll_once()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.guid)
            .collect();
        assert_eq!(guids, vec!["c", "b"]);

        assert!(poller.poll_once().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_modified_yields_nothing() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(rss_feed(&["a"])),
            Ok(FetchResult::NotModified),
        ]);

        let mut poller = setup(fetcher).await.unwrap();

        assert!(poller.poll_once().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_setup_rejects_invalid_url() {
        let fetcher = ScriptedFetcher::new(vec![Ok(rss_feed(&["a"]))]);

        let result = Poller::setup(fetcher.clone(), Normalizer::new(), "not a url", MINUTE, 3)
            .await;

        assert!(matches!(result, Err(FeedhookError::InvalidUrl(_))));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_setup_fails_when_baseline_fails() {
        let fetcher =
            ScriptedFetcher::new(vec![Err(FeedhookError::FeedParse("boom".into()))]);

        let result = setup(fetcher).await;

        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_survives_failed_cycle() {
        let fetcher = ScriptedFetcher::new(vec![
            Ok(rss_feed(&["a"])),
            Err(FeedhookError::FeedParse("temporary".into())),
            Ok(rss_feed(&["b", "a"])),
        ]);

        let poller = setup(fetcher.clone()).await.unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let task = tokio::spawn(poller.run(tx));

        let entry = rx.recv().await.expect("entry after failed cycle");
        assert_eq!(entry.guid, "b");
        assert_eq!(fetcher.calls(), 3);

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_when_receiver_dropped() {
        let fetcher =
            ScriptedFetcher::new(vec![Ok(rss_feed(&["a"])), Ok(rss_feed(&["b", "a"]))]);

        let poller = setup(fetcher).await.unwrap();

        let (tx, rx) = mpsc::channel(8);
        drop(rx);

        let result = poller.run(tx).await;
        assert!(matches!(result, Err(FeedhookError::ChannelClosed)));
    }
}
