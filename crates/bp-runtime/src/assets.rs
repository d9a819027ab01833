use std::collections::BTreeSet;
use std::sync::OnceLock;

use bp_core::RenderConfig;
use regex::{Captures, NoExpand, Regex};
use tracing::debug;

pub trait AssetResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<String>;
}

/// Known asset file names. A reference matches the bare name first, then the
/// name with each configured extension appended, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetCatalog {
    files: BTreeSet<String>,
    extensions: Vec<String>,
    base: String,
}

impl AssetCatalog {
    pub fn new<I, S>(files: I, config: &RenderConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            extensions: config.asset_extensions.clone(),
            base: "assets/".to_string(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    pub fn files(&self) -> &BTreeSet<String> {
        &self.files
    }

    pub fn find(&self, name: &str) -> Option<&str> {
        if let Some(file) = self.files.get(name) {
            return Some(file.as_str());
        }
        self.extensions.iter().find_map(|ext| {
            self.files
                .get(&format!("{}.{}", name, ext))
                .map(String::as_str)
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

impl AssetResolver for AssetCatalog {
    fn resolve(&self, name: &str) -> Option<String> {
        self.find(name).map(|file| format!("{}{}", self.base, file))
    }
}

/// Rewrites `src="asset:NAME"` on `img`/`video` tags through `resolver`.
/// Unresolved tags keep the placeholder and gain the `asset-missing` class.
pub fn resolve_asset_sources(html: &str, resolver: &dyn AssetResolver) -> String {
    media_tag_regex()
        .replace_all(html, |caps: &Captures<'_>| {
            let tag = &caps[0];
            let Some(src) = placeholder_src_regex().captures(tag) else {
                return tag.to_string();
            };
            let name = html_escape::decode_html_entities(&src[1]).into_owned();
            match resolver.resolve(&name) {
                Some(url) => {
                    let replacement = format!(
                        "src=\"{}\"",
                        html_escape::encode_double_quoted_attribute(&url)
                    );
                    placeholder_src_regex()
                        .replace(tag, NoExpand(&replacement))
                        .into_owned()
                }
                None => {
                    debug!(asset = %name, "asset not found");
                    mark_missing(tag)
                }
            }
        })
        .into_owned()
}

fn mark_missing(tag: &str) -> String {
    if let Some(class) = class_attribute_regex().captures(tag) {
        let replacement = format!("class=\"{} asset-missing\"", &class[1]);
        return class_attribute_regex()
            .replace(tag, NoExpand(&replacement))
            .into_owned();
    }
    match tag.strip_suffix('>') {
        Some(head) => format!("{} class=\"asset-missing\">", head),
        None => tag.to_string(),
    }
}

fn media_tag_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"<(?:img|video)\b[^<>]*>").expect("media tag regex"))
}

fn placeholder_src_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r#"src="asset:([^"]*)""#).expect("placeholder src regex"))
}

fn class_attribute_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r#"class="([^"]*)""#).expect("class attribute regex"))
}
