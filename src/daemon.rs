//! Long-running relay: feed setup with retry, then poll and deliver forever.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::app::{AppContext, Result};
use crate::pipeline::Pipeline;
use crate::poller::Poller;

/// Capacity of the poller-to-pipeline entry queue.
pub const ENTRY_QUEUE_CAPACITY: usize = 64;

/// Format a duration for display, e.g. "1m", "10s", "1500ms".
pub fn format_interval(interval: Duration) -> String {
    let millis = interval.as_millis();
    if millis >= 3_600_000 && millis % 3_600_000 == 0 {
        format!("{}h", millis / 3_600_000)
    } else if millis >= 60_000 && millis % 60_000 == 0 {
        format!("{}m", millis / 60_000)
    } else if millis >= 1_000 && millis % 1_000 == 0 {
        format!("{}s", millis / 1_000)
    } else {
        format!("{}ms", millis)
    }
}

pub struct Daemon {
    ctx: Arc<AppContext>,
}

impl Daemon {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Run until the process is terminated.
    pub async fn run(&self) -> Result<()> {
        let config = &self.ctx.config;
        tracing::info!(
            "Relaying feed {} ({}) every {}",
            config.rss_name,
            config.rss_url,
            format_interval(config.refresh_interval)
        );

        let poller = self.setup_poller().await;
        tracing::info!("RSS feed monitoring started...");

        let (sender, receiver) = mpsc::channel(ENTRY_QUEUE_CAPACITY);
        let pipeline = Arc::new(Pipeline::from_config(config, self.ctx.sink.clone()));
        let consumer = tokio::spawn(pipeline.run(receiver));

        let result = poller.run(sender).await;
        // The sender is gone by now, so the consumer drains and exits.
        if let Err(e) = consumer.await {
            tracing::error!("Pipeline task failed: {}", e);
        }
        result
    }

    /// Set up the poller, retrying after the configured delay until it works.
    async fn setup_poller(&self) -> Poller {
        let config = &self.ctx.config;

        loop {
            match Poller::setup(
                self.ctx.fetcher.clone(),
                self.ctx.normalizer.clone(),
                &config.rss_url,
                config.refresh_interval,
                config.history_multiplier,
            )
            .await
            {
                Ok(poller) => return poller,
                Err(e) => {
                    tracing::error!("Error setting up RSS feed {}: {}", config.rss_name, e);
                    tracing::info!(
                        "Retrying in {}...",
                        format_interval(config.setup_retry_delay)
                    );
                    tokio::time::sleep(config.setup_retry_delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FeedhookError;
    use crate::config::{Cli, Config};
    use crate::fetcher::FetchResult;
    use crate::test_support::{rss_feed, RecordingSink, ScriptedFetcher};
    use clap::Parser;

    fn config() -> Config {
        let cli = Cli::try_parse_from([
            "feedhook",
            "--webhook-url",
            "https://discord.com/api/webhooks/1/abc",
            "--webhook-username",
            "Feed Bot",
            "--webhook-avatar",
            "https://example.com/avatar.png",
            "--embed-author-image-url",
            "https://example.com/icon.png",
            "--rss-url",
            "https://example.com/feed.xml",
            "--rss-name",
            "test",
        ])
        .unwrap();
        Config::try_from(cli).unwrap()
    }

    fn context(fetcher: Arc<ScriptedFetcher>, sink: Arc<RecordingSink>) -> Arc<AppContext> {
        Arc::new(AppContext::with_parts(config(), fetcher, sink))
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(Duration::from_secs(60)), "1m");
        assert_eq!(format_interval(Duration::from_secs(10)), "10s");
        assert_eq!(format_interval(Duration::from_secs(7200)), "2h");
        assert_eq!(format_interval(Duration::from_secs(90)), "90s");
        assert_eq!(format_interval(Duration::from_millis(1500)), "1500ms");
    }

    #[tokio::test(start_paused = true)]
    async fn test_setup_retried_after_delay() {
        let fetcher = ScriptedFetcher::new(vec![
            Err(FeedhookError::FeedParse("down".into())),
            Err(FeedhookError::FeedParse("still down".into())),
            Ok(rss_feed(&["a"])),
        ]);
        let daemon = Daemon::new(context(fetcher.clone(), RecordingSink::new()));

        let started = tokio::time::Instant::now();
        daemon.setup_poller().await;

        assert_eq!(fetcher.calls(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(20));
    }

    /// An RSS document whose items are published now and carry a body.
    fn fresh_feed(guids: &[&str]) -> crate::app::Result<FetchResult> {
        let now = chrono::Utc::now().to_rfc2822();
        let items: String = guids
            .iter()
            .map(|guid| {
                format!(
                    "<item><title>{guid}</title><link>https://example.com/{guid}</link>\
                     <guid>{guid}</guid><pubDate>{now}</pubDate>\
                     <description>&lt;div class=\"md\"&gt;&lt;p&gt;{guid} body\
                     &lt;/p&gt;&lt;/div&gt;</description></item>"
                )
            })
            .collect();

        Ok(FetchResult::Content {
            body: format!("<rss version=\"2.0\"><channel><title>t</title>{items}</channel></rss>")
                .into_bytes(),
            etag: None,
            last_modified: None,
        })
    }

    async fn run_until_calls(daemon: Daemon, fetcher: &ScriptedFetcher, calls: usize) {
        let task = tokio::spawn(async move { daemon.run().await });
        while fetcher.calls() < calls {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_entry_delivered_once() {
        let fetcher = ScriptedFetcher::new(vec![
            fresh_feed(&["a"]),
            fresh_feed(&["b", "a"]),
            fresh_feed(&["b", "a"]),
        ]);
        let sink = RecordingSink::new();
        let daemon = Daemon::new(context(fetcher.clone(), sink.clone()));

        run_until_calls(daemon, &fetcher, 4).await;

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "b");
        assert_eq!(sent[0].body, "b body");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_send_keeps_polling() {
        let fetcher = ScriptedFetcher::new(vec![
            fresh_feed(&["a"]),
            fresh_feed(&["b", "a"]),
            fresh_feed(&["c", "b", "a"]),
        ]);
        let sink = RecordingSink::failing();
        let daemon = Daemon::new(context(fetcher.clone(), sink.clone()));

        run_until_calls(daemon, &fetcher, 4).await;

        let titles: Vec<String> = sink.sent().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["b", "c"]);
        assert!(fetcher.calls() >= 4);
    }
}
