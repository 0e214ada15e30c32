use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;

use crate::domain::FeedEntry;

// Non-greedy: a nested div ends the block at its own closing tag.
static MD_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<div class="md">(.*?)</div>"#).unwrap());

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Turns an entry into display fragments: an image link first, then the
/// cleaned body text.
#[derive(Debug, Clone)]
pub struct Extractor {
    gallery_base: String,
}

impl Extractor {
    pub fn new(gallery_base: impl Into<String>) -> Self {
        let gallery_base = gallery_base.into().trim_end_matches('/').to_string();
        Self { gallery_base }
    }

    pub fn extract(&self, entry: &FeedEntry) -> Vec<String> {
        let mut fragments = Vec::new();

        if entry.image.as_ref().is_some_and(|i| !i.url.is_empty()) {
            fragments.push(self.image_link(entry));
        }

        if let Some(text) = body_text(&entry.description) {
            fragments.push(text);
        }

        fragments
    }

    fn image_link(&self, entry: &FeedEntry) -> String {
        format!("[**Image**]({}/{})", self.gallery_base, entry.bare_id())
    }
}

/// Plain text of the first `<div class="md">` block, if it has any.
pub fn body_text(description: &str) -> Option<String> {
    let inner = MD_BLOCK.captures(description)?.get(1)?.as_str();

    let paragraphs = inner.replace("<p>", "\n\n");
    let stripped = HTML_TAG.replace_all(&paragraphs, "");
    let decoded = decode_html_entities(&stripped);
    let text = decoded.trim();

    (!text.is_empty()).then(|| text.to_string())
}
