use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Variable name to value. Snapshots are passed by reference and replaced
/// wholesale; nothing in the pipeline mutates a caller's map.
pub type VariableState = BTreeMap<String, StoryValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoryValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl StoryValue {
    /// Types a literal from story text: `true`/`false` become booleans, a
    /// literal that parses fully as a finite number becomes a number, and
    /// anything else is kept as a trimmed string.
    pub fn from_literal(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        match parse_number(trimmed) {
            Some(number) => Self::Number(number),
            None => Self::String(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
        }
    }
}

impl fmt::Display for StoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{}", value),
            Self::Number(value) => write!(f, "{}", format_number(*value)),
            Self::String(value) => write!(f, "{}", value),
        }
    }
}

pub fn parse_number(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
