use crate::page_id::PageId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct StoryError {
    pub code: String,
    pub message: String,
    pub page: Option<PageId>,
}

impl StoryError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            page: None,
        }
    }

    pub fn with_page(code: impl Into<String>, message: impl Into<String>, page: PageId) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            page: Some(page),
        }
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn display_joins_code_and_message() {
        let error = StoryError::new("ENGINE_ROOT_MISSING", "Root page \"1\" not found.");
        assert_eq!(
            error.to_string(),
            "ENGINE_ROOT_MISSING: Root page \"1\" not found."
        );
        assert!(error.page.is_none());
    }

    #[test]
    fn with_page_keeps_page_id() {
        let page = PageId::root();
        let error = StoryError::with_page("X", "y", page.clone());
        assert_eq!(error.page, Some(page));
    }
}
