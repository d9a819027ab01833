use std::collections::{BTreeMap, BTreeSet};

use bp_core::{Page, PageId};
use bp_parser::page_from_source;

/// Supplies page text to the player. `None` from `load_text` means the story
/// ends at that id.
pub trait PageSource: Send + Sync {
    fn load_text(&self, id: &PageId) -> Option<String>;

    fn is_ending(&self, _id: &PageId) -> bool {
        false
    }

    fn load_page(&self, id: &PageId) -> Option<Page> {
        let text = self.load_text(id)?;
        let mut page = page_from_source(&text);
        page.is_ending = self.is_ending(id);
        Some(page)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPageSource {
    pages: BTreeMap<PageId, String>,
    endings: BTreeSet<PageId>,
}

impl MemoryPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, id: PageId, text: impl Into<String>) -> Self {
        self.pages.insert(id, text.into());
        self
    }

    pub fn with_ending(mut self, id: PageId) -> Self {
        self.endings.insert(id);
        self
    }

    pub fn insert(&mut self, id: PageId, text: impl Into<String>) {
        self.pages.insert(id, text.into());
    }
}

impl PageSource for MemoryPageSource {
    fn load_text(&self, id: &PageId) -> Option<String> {
        self.pages.get(id).cloned()
    }

    fn is_ending(&self, id: &PageId) -> bool {
        self.endings.contains(id)
    }
}
