//! Startup configuration.
//!
//! Every value is read once, either from a command-line flag or from the
//! environment variable named next to it. A `.env` file in the working
//! directory is loaded into the environment before parsing.

use std::time::Duration;

use chrono::TimeDelta;
use clap::Parser;
use url::Url;

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_FRESHNESS_WINDOW_HOURS: u64 = 12;
pub const DEFAULT_SETUP_RETRY_SECS: u64 = 10;
pub const DEFAULT_GALLERY_BASE_URL: &str = "https://www.reddit.com/gallery";
pub const DEFAULT_HISTORY_MULTIPLIER: usize = 3;
pub const DEFAULT_EMBED_COLOR: &str = "#FF4500";

#[derive(Parser, Debug, Clone)]
#[command(name = "feedhook")]
#[command(about = "Relay new RSS/Atom entries to a chat webhook", long_about = None)]
pub struct Cli {
    /// Webhook endpoint that receives notifications
    #[arg(long, env = "WebhookUrl")]
    pub webhook_url: Option<String>,

    /// Display name the webhook posts under
    #[arg(long, env = "WebhookUsername")]
    pub webhook_username: Option<String>,

    /// Avatar image URL the webhook posts with
    #[arg(long, env = "WebhookAvatar")]
    pub webhook_avatar: Option<String>,

    /// Icon shown next to the footer of every notification
    #[arg(long, env = "EmbedAuthorImageUrl")]
    pub embed_author_image_url: Option<String>,

    /// Feed to poll
    #[arg(long, env = "RssUrl")]
    pub rss_url: Option<String>,

    /// Name of the feed, used in logs
    #[arg(long, env = "RssName")]
    pub rss_name: Option<String>,

    /// Time between feed refreshes, in milliseconds
    #[arg(long, env = "RefreshIntervalMs", default_value_t = DEFAULT_REFRESH_INTERVAL_MS)]
    pub refresh_interval_ms: u64,

    /// Entries published longer ago than this are never delivered
    #[arg(long, env = "FreshnessWindowHours", default_value_t = DEFAULT_FRESHNESS_WINDOW_HOURS)]
    pub freshness_window_hours: u64,

    /// Delay before retrying a failed feed setup, in seconds
    #[arg(long, env = "SetupRetrySecs", default_value_t = DEFAULT_SETUP_RETRY_SECS)]
    pub setup_retry_secs: u64,

    /// Base URL for image gallery links
    #[arg(long, env = "GalleryBaseUrl", default_value = DEFAULT_GALLERY_BASE_URL)]
    pub gallery_base_url: String,

    /// Seen-entry history kept, as a multiple of the latest feed size
    #[arg(long, env = "HistoryMultiplier", default_value_t = DEFAULT_HISTORY_MULTIPLIER)]
    pub history_multiplier: usize,

    /// Embed accent color as "#RRGGBB"
    #[arg(long, env = "EmbedColor", default_value = DEFAULT_EMBED_COLOR)]
    pub embed_color: String,
}

/// Validated, immutable process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub webhook_url: Url,
    pub webhook_username: String,
    pub webhook_avatar: String,
    pub embed_author_image_url: String,
    pub rss_url: String,
    pub rss_name: String,
    pub refresh_interval: Duration,
    pub freshness_window: TimeDelta,
    pub setup_retry_delay: Duration,
    pub gallery_base_url: String,
    pub history_multiplier: usize,
    pub embed_color: u32,
}

impl TryFrom<Cli> for Config {
    type Error = ConfigError;

    /// Checks every required value before any other validation so that all
    /// missing names are reported together.
    fn try_from(cli: Cli) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();

        let webhook_url = required("WebhookUrl", cli.webhook_url, &mut missing);
        let webhook_username = required("WebhookUsername", cli.webhook_username, &mut missing);
        let webhook_avatar = required("WebhookAvatar", cli.webhook_avatar, &mut missing);
        let embed_author_image_url =
            required("EmbedAuthorImageUrl", cli.embed_author_image_url, &mut missing);
        let rss_url = required("RssUrl", cli.rss_url, &mut missing);
        let rss_name = required("RssName", cli.rss_name, &mut missing);

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let webhook_url = Url::parse(&webhook_url).map_err(|e| ConfigError::Invalid {
            name: "WebhookUrl",
            reason: e.to_string(),
        })?;

        let refresh_interval = positive_duration(
            "RefreshIntervalMs",
            cli.refresh_interval_ms,
            Duration::from_millis,
        )?;
        let setup_retry_delay =
            positive_duration("SetupRetrySecs", cli.setup_retry_secs, Duration::from_secs)?;

        let freshness_window = i64::try_from(cli.freshness_window_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .ok_or_else(|| ConfigError::Invalid {
                name: "FreshnessWindowHours",
                reason: format!("{} hours is out of range", cli.freshness_window_hours),
            })?;

        if cli.history_multiplier == 0 {
            return Err(ConfigError::Invalid {
                name: "HistoryMultiplier",
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            webhook_url,
            webhook_username,
            webhook_avatar,
            embed_author_image_url,
            rss_url,
            rss_name,
            refresh_interval,
            freshness_window,
            setup_retry_delay,
            gallery_base_url: cli.gallery_base_url.trim_end_matches('/').to_string(),
            history_multiplier: cli.history_multiplier,
            embed_color: parse_color(&cli.embed_color)?,
        })
    }
}

fn required(name: &'static str, value: Option<String>, missing: &mut Vec<&'static str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => {
            missing.push(name);
            String::new()
        }
    }
}

fn positive_duration(
    name: &'static str,
    value: u64,
    to_duration: fn(u64) -> Duration,
) -> Result<Duration, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".into(),
        });
    }
    Ok(to_duration(value))
}

/// Parse a `#RRGGBB` color into its integer form.
pub fn parse_color(s: &str) -> Result<u32, ConfigError> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return Err(ConfigError::Invalid {
            name: "EmbedColor",
            reason: format!("expected #RRGGBB, got {:?}", s),
        });
    }
    u32::from_str_radix(hex, 16).map_err(|e| ConfigError::Invalid {
        name: "EmbedColor",
        reason: e.to_string(),
    })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
