use feed_rs::model::{Entry, MediaObject};
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{FeedhookError, Result};
use crate::domain::{FeedEntry, FeedImage};

#[derive(Debug, Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse a feed body into entries, in the order the feed lists them.
    pub fn normalize(&self, body: &[u8]) -> Result<Vec<FeedEntry>> {
        let feed = parser::parse(body).map_err(|e| FeedhookError::FeedParse(e.to_string()))?;

        Ok(feed.entries.into_iter().map(Self::entry).collect())
    }

    fn entry(entry: Entry) -> FeedEntry {
        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();
        let guid = if entry.id.is_empty() {
            link.clone()
        } else {
            entry.id.clone()
        };

        let mut normalized = FeedEntry::new(guid);
        normalized.image = image(&entry.media).map(|url| FeedImage { url });
        normalized.title = entry
            .title
            .map(|t| decode_html_entities(&t.content).to_string())
            .unwrap_or_default();
        normalized.author = entry
            .authors
            .first()
            .map(|a| decode_html_entities(&a.name).to_string())
            .unwrap_or_default();
        normalized.published_at = entry.published.or(entry.updated);
        // Entities in the description stay encoded until extraction.
        normalized.description = entry
            .content
            .and_then(|c| c.body)
            .or(entry.summary.map(|s| s.content))
            .unwrap_or_default();
        normalized.link = link;

        normalized
    }
}

/// First thumbnail, else the first image-typed media content.
fn image(media: &[MediaObject]) -> Option<String> {
    let thumbnail = media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.clone())
        .find(|uri| !uri.is_empty());

    thumbnail.or_else(|| {
        media
            .iter()
            .flat_map(|m| m.content.iter())
            .filter(|c| {
                c.content_type
                    .as_ref()
                    .is_some_and(|t| t.to_string().starts_with("image/"))
            })
            .find_map(|c| c.url.as_ref().map(|u| u.to_string()))
    })
}
