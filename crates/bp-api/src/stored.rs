use bp_core::{is_choice_letter, Choice, Page, PageId, StoryError};
use bp_parser::{extract_choices, page_from_source};
use serde::{Deserialize, Serialize};

pub const STORED_PAGE_VERSION: u32 = 2;

/// Page record as persisted. Older stories stored a bare content string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredPage {
    Legacy(String),
    V2(StoredPageV2),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPageV2 {
    pub version: u32,
    pub content: String,
    #[serde(default)]
    pub has_choices: bool,
    #[serde(default)]
    pub is_ending: bool,
    #[serde(default)]
    pub choices: Vec<StoredChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChoice {
    pub letter: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goto: Option<String>,
}

impl StoredPage {
    pub fn from_json(raw: &str) -> Result<Self, StoryError> {
        serde_json::from_str(raw).map_err(|error| {
            StoryError::new(
                "API_PAGE_RECORD_INVALID",
                format!("Page record is not valid JSON: {}", error),
            )
        })
    }

    pub fn from_page(page: &Page) -> Self {
        Self::V2(StoredPageV2 {
            version: STORED_PAGE_VERSION,
            content: page.content.clone(),
            has_choices: page.has_choices,
            is_ending: page.is_ending,
            choices: page
                .choices
                .iter()
                .map(|choice| StoredChoice {
                    letter: choice.letter.to_string(),
                    text: choice.text.clone(),
                    goto: choice.goto.as_ref().map(PageId::to_string),
                })
                .collect(),
        })
    }
}

/// Converts any stored shape into the current `Page`.
pub fn migrate(stored: StoredPage) -> Result<Page, StoryError> {
    let record = match stored {
        StoredPage::Legacy(content) => return Ok(page_from_source(&content)),
        StoredPage::V2(record) => record,
    };
    if record.version != STORED_PAGE_VERSION {
        return Err(invalid(format!(
            "Unsupported page record version {}.",
            record.version
        )));
    }

    let mut choices: Vec<Choice> = Vec::with_capacity(record.choices.len());
    for stored in record.choices {
        let mut letters = stored.letter.trim().chars();
        let letter = match (letters.next(), letters.next()) {
            (Some(letter), None) if is_choice_letter(letter.to_ascii_lowercase()) => letter,
            _ => return Err(invalid(format!("Invalid choice letter \"{}\".", stored.letter))),
        };
        let mut choice = Choice::new(letter, stored.text);
        if let Some(goto) = stored.goto.filter(|goto| !goto.trim().is_empty()) {
            let target = PageId::parse(goto.trim())
                .map_err(|_| invalid(format!("Invalid choice target \"{}\".", goto)))?;
            choice = choice.with_goto(target);
        }
        if choices.iter().any(|existing| existing.letter == choice.letter) {
            return Err(invalid(format!("Duplicate choice letter \"{}\".", choice.letter)));
        }
        choices.push(choice);
    }
    if choices.is_empty() {
        choices = extract_choices(&record.content).0;
    }

    Ok(Page {
        has_choices: !choices.is_empty(),
        content: record.content,
        is_ending: record.is_ending,
        choices,
    })
}

fn invalid(message: String) -> StoryError {
    StoryError::new("API_PAGE_RECORD_INVALID", message)
}
