use std::collections::HashSet;

use ammonia::{Builder, UrlRelative};
use tracing::debug;

pub const ALLOWED_TAGS: [&str; 8] = ["p", "br", "img", "video", "em", "strong", "q", "mark"];
pub const ALLOWED_ATTRIBUTES: [&str; 5] = ["src", "alt", "class", "controls", "preload"];

const DROP_WITH_CONTENT: [&str; 4] = ["script", "style", "iframe", "object"];
/// `asset:` carries unresolved placeholders. Relative paths pass through.
const URL_SCHEMES: [&str; 3] = ["asset", "http", "https"];

/// Final gate before rendered markup reaches a live document.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct AllowListSanitizer {
    tags: Vec<String>,
    attributes: Vec<String>,
}

impl Default for AllowListSanitizer {
    fn default() -> Self {
        Self::new(&ALLOWED_TAGS, &ALLOWED_ATTRIBUTES)
    }
}

impl AllowListSanitizer {
    pub fn new(tags: &[&str], attributes: &[&str]) -> Self {
        Self {
            tags: tags.iter().map(|tag| tag.to_ascii_lowercase()).collect(),
            attributes: attributes
                .iter()
                .map(|attr| attr.to_ascii_lowercase())
                .collect(),
        }
    }

    fn builder(&self) -> Builder<'_> {
        let tags: HashSet<&str> = self.tags.iter().map(String::as_str).collect();
        // A tag cannot be both kept and dropped with its content.
        let dropped: HashSet<&str> = DROP_WITH_CONTENT
            .iter()
            .copied()
            .filter(|tag| !tags.contains(tag))
            .collect();
        let mut builder = Builder::empty();
        builder
            .tags(tags)
            .clean_content_tags(dropped)
            .generic_attributes(self.attributes.iter().map(String::as_str).collect())
            .url_schemes(URL_SCHEMES.iter().copied().collect())
            .url_relative(UrlRelative::PassThrough)
            .link_rel(None)
            .strip_comments(true);
        builder
    }
}

impl Sanitizer for AllowListSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let clean = self.builder().clean(html).to_string();
        if clean.len() != html.len() {
            debug!(before = html.len(), after = clean.len(), "markup sanitized");
        }
        clean
    }
}
