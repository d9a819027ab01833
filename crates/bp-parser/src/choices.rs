use std::sync::OnceLock;

use bp_core::{Choice, Page, PageId};
use regex::Regex;
use tracing::warn;

use crate::directives::normalize_newlines;

/// Parses one line of the form `b) [3ab] Return to the cave`.
pub fn parse_choice_line(line: &str) -> Option<Choice> {
    let captures = choice_line_regex().captures(line)?;
    let letter = captures[1].chars().next()?.to_ascii_lowercase();
    let goto = captures
        .get(2)
        .and_then(|raw| PageId::parse(raw.as_str()).ok());
    Some(Choice {
        letter,
        text: captures[3].trim().to_string(),
        goto,
    })
}

pub fn is_choice_line(line: &str) -> bool {
    choice_line_regex().is_match(line)
}

/// Pulls every choice line out of `text`. Returns the choices in textual
/// order together with the remaining story text. A repeated letter keeps its
/// first occurrence; later lines with the same letter are still removed.
pub fn extract_choices(text: &str) -> (Vec<Choice>, String) {
    let text = normalize_newlines(text);
    let mut choices: Vec<Choice> = Vec::new();
    let mut residual = String::with_capacity(text.len());

    for line in text.split_inclusive('\n') {
        let bare = line.strip_suffix('\n').unwrap_or(line);
        let Some(choice) = parse_choice_line(bare) else {
            residual.push_str(line);
            continue;
        };
        if choices.iter().any(|existing| existing.letter == choice.letter) {
            warn!(letter = %choice.letter, "duplicate choice letter ignored");
            continue;
        }
        choices.push(choice);
    }

    (choices, residual)
}

pub fn page_from_source(content: &str) -> Page {
    let (choices, _) = extract_choices(content);
    Page {
        content: content.to_string(),
        has_choices: !choices.is_empty(),
        is_ending: false,
        choices,
    }
}

fn choice_line_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^([a-eA-E])\)[ \t]*(?:\[([0-9]+[a-eA-E]*)\][ \t]*)?(.+)$")
            .expect("choice line regex")
    })
}

#[cfg(test)]
mod choices_tests {
    use super::*;

    #[test]
    fn parse_choice_line_reads_letter_goto_and_text() {
        let choice = parse_choice_line("b) [3ab] Return to the cave").expect("choice");
        assert_eq!(choice.letter, 'b');
        assert_eq!(choice.text, "Return to the cave");
        assert_eq!(choice.goto, Some(PageId::parse("3ab").expect("id")));
    }

    #[test]
    fn parse_choice_line_without_goto() {
        let choice = parse_choice_line("A)Open the door  ").expect("choice");
        assert_eq!(choice.letter, 'a');
        assert_eq!(choice.text, "Open the door");
        assert!(choice.goto.is_none());
    }

    #[test]
    fn parse_choice_line_rejects_letters_outside_alphabet() {
        assert!(parse_choice_line("f) bad").is_none());
        assert!(parse_choice_line(" a) indented").is_none());
        assert!(parse_choice_line("a)").is_none());
        assert!(parse_choice_line("ab) two letters").is_none());
    }

    #[test]
    fn extract_choices_removes_lines_and_keeps_prose() {
        let text = "You stand at a fork.\r\n\r\na) Go left\nb) [4] Go right\nThe wind howls.";
        let (choices, residual) = extract_choices(text);
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[0].text, "Go left");
        assert_eq!(choices[1].goto, Some(PageId::parse("4").expect("id")));
        assert_eq!(residual, "You stand at a fork.\n\nThe wind howls.");
    }

    #[test]
    fn extract_choices_keeps_first_duplicate_letter() {
        let (choices, residual) = extract_choices("a) First\na) Second\nrest");
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].text, "First");
        assert_eq!(residual, "rest");
    }

    #[test]
    fn page_from_source_derives_flags() {
        let page = page_from_source("Intro\na) Left");
        assert!(page.has_choices);
        assert!(!page.is_ending);
        assert_eq!(page.content, "Intro\na) Left");

        let page = page_from_source("Just prose.");
        assert!(!page.has_choices);
        assert!(page.choices.is_empty());
    }
}
