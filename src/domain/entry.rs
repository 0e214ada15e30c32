use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedImage {
    pub url: String,
}

/// One entry from the polled feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub guid: String,
    pub title: String,
    pub link: String,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Raw HTML body.
    pub description: String,
    pub image: Option<FeedImage>,
}

impl FeedEntry {
    pub fn new(guid: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            title: String::new(),
            link: String::new(),
            author: String::new(),
            published_at: None,
            description: String::new(),
            image: None,
        }
    }

    /// The guid without a leading `t<digits>_` kind token.
    pub fn bare_id(&self) -> &str {
        strip_kind_prefix(&self.guid)
    }
}

fn strip_kind_prefix(guid: &str) -> &str {
    let Some(rest) = guid.strip_prefix('t') else {
        return guid;
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return guid;
    }
    rest[digits..].strip_prefix('_').unwrap_or(guid)
}
