use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::StoryError;

/// Choice letters in order; a page offers at most one choice per letter.
pub const CHOICE_ALPHABET: [char; 5] = ['a', 'b', 'c', 'd', 'e'];

/// Address of a story page: the step number plus the accumulated path of
/// choice letters that lead to it. `1` is the root.
///
/// Ordering compares `number` first and breaks ties on `path`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageId {
    number: u64,
    path: String,
}

impl PageId {
    pub fn new(number: u64, path: impl Into<String>) -> Result<Self, StoryError> {
        let path = path.into().to_ascii_lowercase();
        if number == 0 {
            return Err(StoryError::new(
                "PAGE_ID_INVALID",
                "Page number must be at least 1.",
            ));
        }
        if let Some(bad) = path.chars().find(|ch| !is_choice_letter(*ch)) {
            return Err(StoryError::new(
                "PAGE_ID_INVALID",
                format!("Path letter \"{}\" is outside a-e.", bad),
            ));
        }
        Ok(Self { number, path })
    }

    pub fn root() -> Self {
        Self {
            number: 1,
            path: String::new(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, StoryError> {
        let Some(captures) = page_id_regex().captures(raw) else {
            return Err(StoryError::new(
                "PAGE_ID_INVALID",
                format!("\"{}\" is not a page id (expected digits followed by a-e).", raw),
            ));
        };
        let digits = &captures[1];
        let number = digits.parse::<u64>().map_err(|_| {
            StoryError::new(
                "PAGE_ID_INVALID",
                format!("Page number \"{}\" is out of range.", digits),
            )
        })?;
        Self::new(number, &captures[2])
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.number == 1 && self.path.is_empty()
    }

    /// Default target of the choice labelled `letter`: `(number+1, path+letter)`.
    pub fn child_id(&self, letter: char) -> Option<PageId> {
        let letter = letter.to_ascii_lowercase();
        if !is_choice_letter(letter) {
            return None;
        }
        let mut path = self.path.clone();
        path.push(letter);
        Some(Self {
            number: self.number.saturating_add(1),
            path,
        })
    }

    /// Default successors for the first `choice_count` letters of the alphabet.
    pub fn child_ids(&self, choice_count: usize) -> BTreeMap<char, PageId> {
        CHOICE_ALPHABET
            .iter()
            .take(choice_count.min(CHOICE_ALPHABET.len()))
            .filter_map(|letter| self.child_id(*letter).map(|id| (*letter, id)))
            .collect()
    }

    pub fn continuation_id(&self) -> PageId {
        Self {
            number: self.number.saturating_add(1),
            path: self.path.clone(),
        }
    }

    pub fn parent_id(&self) -> Option<PageId> {
        if self.number <= 1 {
            return None;
        }
        let mut path = self.path.clone();
        path.pop();
        Some(Self {
            number: self.number - 1,
            path,
        })
    }

    /// Breadth-first walk over `child_ids` that only follows ids present in
    /// `existing`. The start id itself is not part of the result.
    pub fn descendants(&self, existing: &BTreeSet<PageId>) -> Vec<PageId> {
        let mut visited = BTreeSet::new();
        visited.insert(self.clone());
        let mut queue = VecDeque::from([self.clone()]);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            for child in current.child_ids(CHOICE_ALPHABET.len()).into_values() {
                if !existing.contains(&child) || !visited.insert(child.clone()) {
                    continue;
                }
                out.push(child.clone());
                queue.push_back(child);
            }
        }

        out
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.path)
    }
}

impl FromStr for PageId {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PageId {
    type Error = StoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PageId> for String {
    fn from(value: PageId) -> Self {
        value.to_string()
    }
}

pub fn is_choice_letter(ch: char) -> bool {
    CHOICE_ALPHABET.contains(&ch)
}

fn page_id_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^([0-9]+)([a-eA-E]*)$").expect("page id regex"))
}
