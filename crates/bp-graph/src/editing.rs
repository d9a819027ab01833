use std::collections::BTreeSet;

use bp_core::{PageId, StoryError};
use tracing::info;

use crate::PageMap;

fn existing_ids(pages: &PageMap) -> BTreeSet<PageId> {
    pages.keys().cloned().collect()
}

/// Removes `id` and every descendant reachable through default child ids.
/// Returns the new map and the removed ids, `id` first.
pub fn delete_cascade(
    pages: &PageMap,
    id: &PageId,
) -> Result<(PageMap, Vec<PageId>), StoryError> {
    if !pages.contains_key(id) {
        return Err(StoryError::with_page(
            "GRAPH_PAGE_MISSING",
            format!("Page {} does not exist.", id),
            id.clone(),
        ));
    }
    let mut removed = vec![id.clone()];
    removed.extend(id.descendants(&existing_ids(pages)));

    let mut next = pages.clone();
    for gone in &removed {
        next.remove(gone);
    }
    info!(page = %id, removed = removed.len(), "pages deleted");
    Ok((next, removed))
}

/// Copies `from` and its descendants under `to`, shifting step numbers by
/// the same offset and swapping the path prefix.
pub fn copy_subtree(pages: &PageMap, from: &PageId, to: &PageId) -> Result<PageMap, StoryError> {
    if !pages.contains_key(from) {
        return Err(StoryError::with_page(
            "GRAPH_PAGE_MISSING",
            format!("Page {} does not exist.", from),
            from.clone(),
        ));
    }
    if is_within(to, from) {
        return Err(StoryError::with_page(
            "GRAPH_COPY_INVALID",
            format!("Cannot copy {} into its own subtree at {}.", from, to),
            to.clone(),
        ));
    }
    let mut sources = vec![from.clone()];
    sources.extend(from.descendants(&existing_ids(pages)));

    let mut next = pages.clone();
    for source in &sources {
        let target = relocate(source, from, to)?;
        if pages.contains_key(&target) || next.contains_key(&target) {
            return Err(StoryError::with_page(
                "GRAPH_COPY_CONFLICT",
                format!("Copying {} would overwrite page {}.", source, target),
                target,
            ));
        }
        if let Some(page) = pages.get(source) {
            next.insert(target, page.clone());
        }
    }
    info!(from = %from, to = %to, copied = sources.len(), "subtree copied");
    Ok(next)
}

/// True when `id` sits at or below `ancestor` in the default child layout.
fn is_within(id: &PageId, ancestor: &PageId) -> bool {
    let Some(extra) = id.path().strip_prefix(ancestor.path()) else {
        return false;
    };
    id.number() >= ancestor.number() && id.number() - ancestor.number() == extra.len() as u64
}

fn relocate(id: &PageId, from: &PageId, to: &PageId) -> Result<PageId, StoryError> {
    let number = i128::from(id.number()) - i128::from(from.number()) + i128::from(to.number());
    let suffix = id.path().strip_prefix(from.path()).unwrap_or(id.path());
    let invalid = || {
        StoryError::with_page(
            "GRAPH_COPY_INVALID",
            format!("Page {} cannot be placed under {}.", id, to),
            id.clone(),
        )
    };
    let number = u64::try_from(number).map_err(|_| invalid())?;
    if number < 1 {
        return Err(invalid());
    }
    PageId::new(number, format!("{}{}", to.path(), suffix)).map_err(|_| invalid())
}
