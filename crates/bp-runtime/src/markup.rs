use std::sync::OnceLock;

use bp_core::{AssetSize, RenderConfig};
use bp_parser::replace_asset_refs;
use regex::Regex;

/// Inline styling. Brace tokens are copied through untouched so asset names
/// and leftover directives keep their exact spelling.
pub fn apply_styling(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for token in brace_token_regex().find_iter(text) {
        out.push_str(&style_run(&text[last..token.start()]));
        out.push_str(token.as_str());
        last = token.end();
    }
    out.push_str(&style_run(&text[last..]));
    out
}

fn style_run(run: &str) -> String {
    if run.is_empty() {
        return String::new();
    }
    let run = bold_star_regex().replace_all(run, "<strong>$1</strong>");
    let run = bold_underscore_regex().replace_all(&run, "<strong>$1</strong>");
    let run = italic_star_regex().replace_all(&run, "<em>$1</em>");
    let run = italicize_underscores(&run);
    run.replace("---", "\u{2014}")
        .replace("--", "\u{2013}")
        .replace("...", "\u{2026}")
}

/// `_x_` becomes italic only when neither underscore touches a word
/// character, so `snake_case` stays as written. Adjacent spans may share the
/// separator between them.
fn italicize_underscores(run: &str) -> String {
    let mut out = String::with_capacity(run.len());
    let mut copied = 0;
    let mut search = 0;
    while let Some(caps) = italic_underscore_regex().captures_at(run, search) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        if !flanked_by_non_word(run, whole.start(), whole.end()) {
            search = whole.start() + 1;
            continue;
        }
        out.push_str(&run[copied..whole.start()]);
        out.push_str("<em>");
        out.push_str(body.as_str());
        out.push_str("</em>");
        copied = whole.end();
        search = whole.end();
    }
    out.push_str(&run[copied..]);
    out
}

fn flanked_by_non_word(run: &str, start: usize, end: usize) -> bool {
    let before = run[..start].chars().next_back();
    let after = run[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Replaces `{name}` / `{name:size}` tokens with placeholder markup whose
/// `src` is `asset:<name>`; resolution to a real location happens later.
pub fn replace_asset_placeholders(text: &str, config: &RenderConfig) -> String {
    replace_asset_refs(text, |name, size| asset_placeholder(name, size, config))
}

pub fn asset_placeholder(name: &str, size: Option<AssetSize>, config: &RenderConfig) -> String {
    let escaped = html_escape::encode_double_quoted_attribute(name);
    let class = match size {
        Some(size) => format!("story-asset {}", size.class_name()),
        None => "story-asset".to_string(),
    };
    if config.is_video(name) {
        format!(
            "<video src=\"asset:{}\" class=\"{}\" controls preload=\"metadata\"></video>",
            escaped, class
        )
    } else {
        format!(
            "<img src=\"asset:{}\" alt=\"{}\" class=\"{}\">",
            escaped, escaped, class
        )
    }
}

/// Blank lines separate paragraphs; single newlines become `<br>`.
pub fn build_paragraphs(text: &str) -> String {
    blank_line_regex()
        .split(text)
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(|paragraph| {
            let lines: Vec<&str> = paragraph.split('\n').map(str::trim).collect();
            format!("<p>{}</p>", lines.join("<br>"))
        })
        .collect()
}

fn brace_token_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\{[^{}\n]*\}").expect("brace token regex"))
}

fn bold_star_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\*\*([^*\n]+?)\*\*").expect("bold star regex"))
}

fn bold_underscore_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"__([^_\n]+?)__").expect("bold underscore regex"))
}

fn italic_star_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\*([^*\n]+?)\*").expect("italic star regex"))
}

fn italic_underscore_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"_([^_\n]+?)_").expect("italic underscore regex")
    })
}

fn blank_line_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\n[ \t]*\n").expect("blank line regex"))
}
