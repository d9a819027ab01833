use std::collections::{BTreeMap, BTreeSet};

use bp_core::{Edge, Page, PageId, PageKind};
use serde::Serialize;

use crate::PageMap;

/// Targets a reader can move to from `page`, limited to pages that exist.
pub(crate) fn successors(id: &PageId, page: &Page, pages: &PageMap) -> Vec<PageId> {
    if page.is_ending {
        return Vec::new();
    }
    if !page.choices.is_empty() {
        return page
            .choices
            .iter()
            .filter_map(|choice| choice.effective_target(id))
            .filter(|target| pages.contains_key(target))
            .collect();
    }
    let next = id.continuation_id();
    if pages.contains_key(&next) {
        vec![next]
    } else {
        Vec::new()
    }
}

pub fn reachable(pages: &PageMap, root: &PageId) -> BTreeSet<PageId> {
    let mut visited = BTreeSet::new();
    if !pages.contains_key(root) {
        return visited;
    }
    let mut stack = vec![root.clone()];

    while let Some(id) = stack.pop() {
        if !visited.insert(id.clone()) {
            continue;
        }
        if let Some(page) = pages.get(&id) {
            for target in successors(&id, page, pages) {
                if !visited.contains(&target) {
                    stack.push(target);
                }
            }
        }
    }

    visited
}

pub fn classify(pages: &PageMap, reachable: &BTreeSet<PageId>) -> BTreeMap<PageId, PageKind> {
    pages
        .iter()
        .map(|(id, page)| {
            let kind = if !reachable.contains(id) {
                PageKind::Orphan
            } else if page.is_ending {
                PageKind::Ending
            } else if !page.choices.is_empty() {
                PageKind::Choice
            } else {
                PageKind::Normal
            };
            (id.clone(), kind)
        })
        .collect()
}

pub fn edges(pages: &PageMap) -> Vec<Edge> {
    let mut out = Vec::new();
    for (id, page) in pages {
        if page.is_ending {
            continue;
        }
        if !page.choices.is_empty() {
            for choice in &page.choices {
                if choice.text.trim().is_empty() {
                    continue;
                }
                let Some(target) = choice.effective_target(id) else {
                    continue;
                };
                if pages.contains_key(&target) {
                    out.push(Edge {
                        source: id.clone(),
                        target,
                        label: Some(choice.text.clone()),
                    });
                }
            }
            continue;
        }
        let next = id.continuation_id();
        if pages.contains_key(&next) {
            out.push(Edge {
                source: id.clone(),
                target: next,
                label: None,
            });
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryGraph {
    pub root: PageId,
    pub reachable: BTreeSet<PageId>,
    pub kinds: BTreeMap<PageId, PageKind>,
    pub edges: Vec<Edge>,
}

impl StoryGraph {
    pub fn build(pages: &PageMap) -> Self {
        let root = PageId::root();
        let reachable = reachable(pages, &root);
        let kinds = classify(pages, &reachable);
        Self {
            root,
            reachable,
            kinds,
            edges: edges(pages),
        }
    }

    pub fn orphans(&self) -> impl Iterator<Item = &PageId> {
        self.kinds
            .iter()
            .filter(|(_, kind)| **kind == PageKind::Orphan)
            .map(|(id, _)| id)
    }
}
