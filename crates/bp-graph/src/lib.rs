//! Whole-story analysis: reachability, page classification, edges,
//! validation diagnostics and subtree editing.

mod editing;
mod model;
mod validate;

use std::collections::BTreeMap;

use bp_core::{Page, PageId};

pub type PageMap = BTreeMap<PageId, Page>;

pub use editing::{copy_subtree, delete_cascade};
pub use model::{classify, edges, reachable, StoryGraph};
pub use validate::{validate, validate_with_config};
