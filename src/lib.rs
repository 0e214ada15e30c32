//! # Feedhook
//!
//! Polls one RSS/Atom feed and relays each new entry to a chat webhook as a
//! formatted embed.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Normalizer → Poller ──channel──▶ Pipeline (filter → extract → format) → Webhook
//! ```
//!
//! - [`fetcher`]: HTTP client with ETag/conditional request support
//! - [`normalizer`]: Converts RSS/Atom/JSON feeds into [`FeedEntry`](domain::FeedEntry) values
//! - [`poller`]: Baseline fetch, periodic refresh, seen-guid history
//! - [`pipeline`]: Freshness filter, content extraction, notification formatting
//! - [`webhook`]: Delivery sink
//!
//! ## Quick Start
//!
//! ```bash
//! WebhookUrl=https://discord.com/api/webhooks/... \
//! WebhookUsername="Feed Bot" \
//! WebhookAvatar=https://example.com/avatar.png \
//! EmbedAuthorImageUrl=https://example.com/icon.png \
//! RssUrl=https://www.reddit.com/r/rust/new/.rss \
//! RssName=rust \
//! feedhook
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the configured
/// fetcher, normalizer, and delivery sink.
pub mod app;

/// Startup configuration from flags and environment variables.
pub mod config;

/// Setup-with-retry followed by the endless poll loop.
pub mod daemon;

/// Core domain models.
///
/// - [`FeedEntry`](domain::FeedEntry): One entry from the feed
/// - [`Notification`](domain::Notification): A message ready for delivery
pub mod domain;

/// HTTP fetching with conditional request support.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for feed fetching
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Feed parsing and normalization.
pub mod normalizer;

/// Per-entry processing: freshness filter, extraction, formatting, delivery.
pub mod pipeline;

/// Baseline fetch, periodic refresh, and seen-guid history.
pub mod poller;

/// Webhook delivery.
///
/// - [`Sink`](webhook::Sink): Async trait for delivering notifications
/// - [`WebhookClient`](webhook::WebhookClient): Discord-style webhook implementation
pub mod webhook;

#[cfg(test)]
mod test_support;
