use std::sync::OnceLock;

use bp_core::{CompareOp, StoryError, StoryValue};
use regex::Regex;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Block(IfBlock),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfBlock {
    pub name: String,
    pub operator: CompareOp,
    pub compare_value: StoryValue,
    pub body: Vec<Segment>,
    pub raw_body: String,
    /// Byte offset of the opening `{if:...}` token.
    pub start: usize,
}

struct OpenFrame {
    token: String,
    name: String,
    operator: CompareOp,
    compare_value: StoryValue,
    start: usize,
    body_start: usize,
    children: Vec<Segment>,
}

enum Mode {
    Strict,
    Lenient,
}

/// Parses balanced `{if:...}...{/if}` spans. Unbalanced tags or nesting past
/// `max_depth` are errors.
pub fn parse_blocks(text: &str, max_depth: usize) -> Result<Vec<Segment>, StoryError> {
    parse(text, max_depth, Mode::Strict)
}

/// Like [`parse_blocks`] but never fails: a stray `{/if}` or an unclosed
/// `{if:...}` is kept as literal text, and text nested past `max_depth` is
/// returned untouched.
pub fn parse_blocks_lenient(text: &str, max_depth: usize) -> Vec<Segment> {
    match parse(text, max_depth, Mode::Lenient) {
        Ok(segments) => segments,
        Err(error) => {
            warn!(code = %error.code, "conditional blocks left as text: {}", error.message);
            vec![Segment::Text(text.to_string())]
        }
    }
}

fn parse(text: &str, max_depth: usize, mode: Mode) -> Result<Vec<Segment>, StoryError> {
    let mut root: Vec<Segment> = Vec::new();
    let mut stack: Vec<OpenFrame> = Vec::new();
    let mut last = 0usize;

    for caps in if_token_regex().captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_text(
            current_children(&mut root, &mut stack),
            &text[last..whole.start()],
        );
        last = whole.end();

        let Some(name) = caps.get(1) else {
            match stack.pop() {
                Some(frame) => {
                    let block = IfBlock {
                        name: frame.name,
                        operator: frame.operator,
                        compare_value: frame.compare_value,
                        body: frame.children,
                        raw_body: text[frame.body_start..whole.start()].to_string(),
                        start: frame.start,
                    };
                    current_children(&mut root, &mut stack).push(Segment::Block(block));
                }
                None => match mode {
                    Mode::Strict => {
                        return Err(StoryError::new(
                            "PARSE_IF_UNBALANCED",
                            format!("Unexpected {{/if}} at byte {}.", whole.start()),
                        ))
                    }
                    Mode::Lenient => {
                        warn!(offset = whole.start(), "stray {{/if}} kept as text");
                        push_text(&mut root, whole.as_str());
                    }
                },
            }
            continue;
        };

        if stack.len() >= max_depth {
            return Err(StoryError::new(
                "PARSE_IF_TOO_DEEP",
                format!("Conditional nesting exceeds {} levels.", max_depth),
            ));
        }

        let operator = caps
            .get(2)
            .and_then(|op| CompareOp::parse(op.as_str()))
            .unwrap_or(CompareOp::Eq);
        let compare_value = match caps.get(2) {
            Some(_) => StoryValue::from_literal(caps.get(3).map_or("", |m| m.as_str())),
            None => StoryValue::Bool(true),
        };
        stack.push(OpenFrame {
            token: whole.as_str().to_string(),
            name: name.as_str().to_string(),
            operator,
            compare_value,
            start: whole.start(),
            body_start: whole.end(),
            children: Vec::new(),
        });
    }

    push_text(current_children(&mut root, &mut stack), &text[last..]);

    if let Some(frame) = stack.last() {
        if matches!(mode, Mode::Strict) {
            return Err(StoryError::new(
                "PARSE_IF_UNBALANCED",
                format!("Unclosed {} at byte {}.", frame.token, frame.start),
            ));
        }
        warn!(offset = frame.start, "unclosed conditional kept as text");
    }
    while let Some(frame) = stack.pop() {
        let parent = current_children(&mut root, &mut stack);
        push_text(parent, &frame.token);
        for child in frame.children {
            match child {
                Segment::Text(value) => push_text(parent, &value),
                block => parent.push(block),
            }
        }
    }

    Ok(root)
}

fn current_children<'a>(
    root: &'a mut Vec<Segment>,
    stack: &'a mut [OpenFrame],
) -> &'a mut Vec<Segment> {
    match stack.last_mut() {
        Some(frame) => &mut frame.children,
        None => root,
    }
}

fn push_text(children: &mut Vec<Segment>, value: &str) {
    if value.is_empty() {
        return;
    }
    if let Some(Segment::Text(previous)) = children.last_mut() {
        previous.push_str(value);
        return;
    }
    children.push(Segment::Text(value.to_string()));
}

fn if_token_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)\{if:[ \t]*([A-Za-z_][A-Za-z0-9_]*)[ \t]*(?:(==|!=|>=|<=|>|<)[ \t]*([^{}\n]*?))?[ \t]*\}|\{/if\}",
        )
        .expect("if token regex")
    })
}
