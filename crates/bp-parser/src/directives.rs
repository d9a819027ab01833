use std::borrow::Cow;
use std::sync::OnceLock;

use bp_core::{AssetSize, AudioTarget, Choice, Command, PageId, StoryValue};
use regex::{Captures, Regex};

use crate::choices::extract_choices;
use crate::conditional::{parse_blocks_lenient, Segment};

/// Keywords that own the `{keyword:...}` form. A brace token whose name is one
/// of these is never an asset reference.
pub const DIRECTIVE_KEYWORDS: [&str; 9] = [
    "set", "add", "sub", "if", "music", "sfx", "ambient", "goto", "stop",
];

/// Result of a single scan over page text.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveScan {
    /// Every recognised directive, ordered by position in the source.
    pub commands: Vec<Command>,
    pub choices: Vec<Choice>,
    /// Source without choice lines, variable directives and audio/goto
    /// directives. Conditional blocks and asset tokens stay in place.
    pub residual: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideEffects {
    pub audio: Vec<Command>,
    pub gotos: Vec<PageId>,
}

pub fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

pub fn parse_directives(text: &str) -> DirectiveScan {
    let text = normalize_newlines(text);
    let (choices, without_choices) = extract_choices(&text);

    let mut positioned: Vec<(usize, Command)> = Vec::new();
    positioned.extend(variable_ops_with_offsets(&without_choices));
    positioned.extend(side_effects_with_offsets(&without_choices));
    positioned.extend(asset_refs_with_offsets(&without_choices));
    collect_conditionals(
        &parse_blocks_lenient(&without_choices, usize::MAX),
        &mut positioned,
    );
    positioned.sort_by_key(|(offset, _)| *offset);

    let residual = strip_side_effects(&strip_variable_ops(&without_choices));

    DirectiveScan {
        commands: positioned.into_iter().map(|(_, command)| command).collect(),
        choices,
        residual,
    }
}

pub fn extract_variable_ops(text: &str) -> Vec<Command> {
    let mut ops = variable_ops_with_offsets(text);
    ops.sort_by_key(|(offset, _)| *offset);
    ops.into_iter().map(|(_, command)| command).collect()
}

pub fn strip_variable_ops(text: &str) -> String {
    let text = set_regex().replace_all(text, "");
    let text = add_regex().replace_all(&text, "");
    sub_regex().replace_all(&text, "").into_owned()
}

pub fn extract_side_effects(text: &str) -> SideEffects {
    let mut found = side_effects_with_offsets(text);
    found.sort_by_key(|(offset, _)| *offset);

    let mut effects = SideEffects::default();
    for (_, command) in found {
        match command {
            Command::Goto { target } => effects.gotos.push(target),
            other => effects.audio.push(other),
        }
    }
    effects
}

/// Removes audio, stop and goto directives. They are never shown to the
/// reader, whether or not anything acts on them.
pub fn strip_side_effects(text: &str) -> String {
    let text = music_regex().replace_all(text, "");
    let text = sfx_regex().replace_all(&text, "");
    let text = ambient_regex().replace_all(&text, "");
    let text = legacy_ambient_regex().replace_all(&text, |caps: &Captures<'_>| {
        if is_keyword(&caps[1]) {
            caps[0].to_string()
        } else {
            String::new()
        }
    });
    let text = stop_regex().replace_all(&text, "");
    goto_regex()
        .replace_all(&text, |caps: &Captures<'_>| {
            if PageId::parse(&caps[1]).is_ok() {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

pub fn extract_asset_refs(text: &str) -> Vec<Command> {
    asset_refs_with_offsets(text)
        .into_iter()
        .map(|(_, command)| command)
        .collect()
}

/// Rewrites every asset token through `replace`. Directive tokens are left as
/// they are.
pub fn replace_asset_refs<F>(text: &str, mut replace: F) -> String
where
    F: FnMut(&str, Option<AssetSize>) -> String,
{
    asset_regex()
        .replace_all(text, |caps: &Captures<'_>| match asset_from_captures(caps) {
            Some(Command::AssetRef { name, size_hint }) => replace(&name, size_hint),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

pub(crate) fn asset_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\{([A-Za-z0-9_][A-Za-z0-9_.\- ]*?)[ \t]*(?::[ \t]*((?i:small|medium|large))[ \t]*)?\}")
            .expect("asset regex")
    })
}

pub(crate) fn asset_from_captures(caps: &Captures<'_>) -> Option<Command> {
    let name = caps[1].trim();
    if name.is_empty() || is_keyword(name) {
        return None;
    }
    Some(Command::AssetRef {
        name: name.to_string(),
        size_hint: caps.get(2).and_then(|size| AssetSize::parse(size.as_str())),
    })
}

pub(crate) fn is_keyword(name: &str) -> bool {
    let lower = name.trim().to_ascii_lowercase();
    DIRECTIVE_KEYWORDS.contains(&lower.as_str())
}

fn variable_ops_with_offsets(text: &str) -> Vec<(usize, Command)> {
    let mut out = Vec::new();
    for caps in set_regex().captures_iter(text) {
        out.push((
            offset(&caps),
            Command::SetVar {
                name: caps[1].to_string(),
                value: StoryValue::from_literal(&caps[2]),
            },
        ));
    }
    for caps in add_regex().captures_iter(text) {
        out.push((
            offset(&caps),
            Command::AddVar {
                name: caps[1].to_string(),
                delta: delta_from(&caps),
            },
        ));
    }
    for caps in sub_regex().captures_iter(text) {
        out.push((
            offset(&caps),
            Command::SubVar {
                name: caps[1].to_string(),
                delta: delta_from(&caps),
            },
        ));
    }
    out
}

fn side_effects_with_offsets(text: &str) -> Vec<(usize, Command)> {
    let mut out = Vec::new();
    for caps in music_regex().captures_iter(text) {
        out.push((
            offset(&caps),
            Command::PlayMusic {
                file: caps[1].trim().to_string(),
                looped: caps.get(2).is_some(),
            },
        ));
    }
    for caps in sfx_regex().captures_iter(text) {
        out.push((
            offset(&caps),
            Command::PlaySfx {
                file: caps[1].trim().to_string(),
            },
        ));
    }
    for caps in ambient_regex().captures_iter(text) {
        out.push((
            offset(&caps),
            Command::PlayAmbient {
                file: caps[1].trim().to_string(),
            },
        ));
    }
    for caps in legacy_ambient_regex().captures_iter(text) {
        if is_keyword(&caps[1]) {
            continue;
        }
        out.push((
            offset(&caps),
            Command::PlayAmbient {
                file: caps[1].trim().to_string(),
            },
        ));
    }
    for caps in stop_regex().captures_iter(text) {
        if let Some(target) = AudioTarget::parse(&caps[1]) {
            out.push((offset(&caps), Command::StopAudio { target }));
        }
    }
    for caps in goto_regex().captures_iter(text) {
        if let Ok(target) = PageId::parse(&caps[1]) {
            out.push((offset(&caps), Command::Goto { target }));
        }
    }
    out
}

fn asset_refs_with_offsets(text: &str) -> Vec<(usize, Command)> {
    asset_regex()
        .captures_iter(text)
        .filter_map(|caps| asset_from_captures(&caps).map(|command| (offset(&caps), command)))
        .collect()
}

fn collect_conditionals(segments: &[Segment], out: &mut Vec<(usize, Command)>) {
    for segment in segments {
        if let Segment::Block(block) = segment {
            out.push((
                block.start,
                Command::Conditional {
                    name: block.name.clone(),
                    operator: block.operator,
                    compare_value: block.compare_value.clone(),
                    body: block.raw_body.clone(),
                },
            ));
            collect_conditionals(&block.body, out);
        }
    }
}

fn offset(caps: &Captures<'_>) -> usize {
    caps.get(0).map(|m| m.start()).unwrap_or_default()
}

fn delta_from(caps: &Captures<'_>) -> f64 {
    caps.get(2)
        .and_then(|raw| bp_core::parse_number(raw.as_str()))
        .unwrap_or(1.0)
}

fn set_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)\{set:[ \t]*([A-Za-z_][A-Za-z0-9_]*)[ \t]*=([^{}\n]*)\}")
            .expect("set regex")
    })
}

fn add_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)\{add:[ \t]*([A-Za-z_][A-Za-z0-9_]*)[ \t]*(?:=[ \t]*([-+]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+))[ \t]*)?\}",
        )
        .expect("add regex")
    })
}

fn sub_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)\{sub:[ \t]*([A-Za-z_][A-Za-z0-9_]*)[ \t]*(?:=[ \t]*([-+]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+))[ \t]*)?\}",
        )
        .expect("sub regex")
    })
}

fn music_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)\{music:([^{}:\n]+?)(?::[ \t]*(loop)[ \t]*)?\}").expect("music regex")
    })
}

fn sfx_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?i)\{sfx:([^{}:\n]+)\}").expect("sfx regex"))
}

fn ambient_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?i)\{ambient:([^{}:\n]+)\}").expect("ambient regex"))
}

fn legacy_ambient_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)\{([^{}:\n/]+):[ \t]*loop[ \t]*\}").expect("legacy ambient regex")
    })
}

fn stop_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)\{stop:[ \t]*(music|sfx|ambient|all)[ \t]*\}").expect("stop regex")
    })
}

fn goto_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)\{goto:[ \t]*([0-9]+[a-e]*)[ \t]*\}").expect("goto regex")
    })
}
