use std::fmt::Display;

use chrono::{DateTime, TimeZone};

use crate::domain::{FeedEntry, Notification};

/// e.g. "January 5, 2024, 3:45 PM"
pub const FOOTER_DATE_FORMAT: &str = "%B %-d, %Y, %-I:%M %p";

#[derive(Debug, Clone)]
pub struct Formatter {
    color: u32,
    footer_icon: String,
}

impl Formatter {
    pub fn new(color: u32, footer_icon: impl Into<String>) -> Self {
        Self {
            color,
            footer_icon: footer_icon.into(),
        }
    }

    /// Build the notification for `entry`, stamped with `sent_at`.
    ///
    /// Returns `None` when there are no fragments to send.
    pub fn format<Tz>(
        &self,
        entry: &FeedEntry,
        fragments: &[String],
        sent_at: &DateTime<Tz>,
    ) -> Option<Notification>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        if fragments.is_empty() {
            return None;
        }

        Some(Notification {
            title: entry.title.clone(),
            url: entry.link.clone(),
            color: self.color,
            body: fragments.join("\n"),
            footer_text: format!(
                "{} | {}",
                entry.author,
                sent_at.format(FOOTER_DATE_FORMAT)
            ),
            footer_icon: self.footer_icon.clone(),
            thumbnail: entry
                .image
                .as_ref()
                .filter(|i| !i.url.is_empty())
                .map(|i| i.url.clone()),
        })
    }
}
