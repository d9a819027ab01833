use std::collections::BTreeSet;

use bp_core::{Command, Diagnostic, PageId, PageKind, RenderConfig, Severity};
use bp_parser::{extract_asset_refs, parse_blocks};
use bp_runtime::AssetCatalog;
use tracing::debug;

use crate::model::{classify, reachable};
use crate::PageMap;

/// Structural diagnostics for an editor. None of them block rendering.
pub fn validate(pages: &PageMap, assets: &BTreeSet<String>) -> Vec<Diagnostic> {
    validate_with_config(pages, assets, &RenderConfig::default())
}

pub fn validate_with_config(
    pages: &PageMap,
    assets: &BTreeSet<String>,
    config: &RenderConfig,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let root = PageId::root();
    if !pages.contains_key(&root) {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            None,
            format!("Missing root page {}.", root),
        ));
    }

    let catalog = AssetCatalog::new(assets.iter().cloned(), config);
    let kinds = classify(pages, &reachable(pages, &root));

    for (id, page) in pages {
        let at = Some(id.clone());
        if page.content.trim().is_empty() && !page.is_ending {
            diagnostics.push(Diagnostic::new(Severity::Warning, at.clone(), "Page is empty."));
        }
        if kinds.get(id) == Some(&PageKind::Orphan) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                at.clone(),
                format!("Page is not reachable from page {}.", root),
            ));
        }
        let next = id.continuation_id();
        if !page.is_ending && page.choices.is_empty() && !pages.contains_key(&next) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                at.clone(),
                format!(
                    "Dead end: no choices and continuation page {} does not exist.",
                    next
                ),
            ));
        }
        if let Err(error) = parse_blocks(&page.content, config.max_if_depth) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                at.clone(),
                format!("Conditional is shown as plain text: {}", error.message),
            ));
        }
        for asset in extract_asset_refs(&page.content) {
            let Command::AssetRef { name, .. } = asset else {
                continue;
            };
            if !catalog.contains(&name) {
                diagnostics.push(Diagnostic::new(
                    Severity::Warning,
                    at.clone(),
                    format!("Missing asset \"{}\".", name),
                ));
            }
        }
        for choice in &page.choices {
            let Some(target) = choice.effective_target(id) else {
                continue;
            };
            if !pages.contains_key(&target) {
                diagnostics.push(Diagnostic::new(
                    Severity::Info,
                    at.clone(),
                    format!("Choice {} leads to missing page {}.", choice.letter, target),
                ));
            }
        }
    }

    diagnostics.sort_by(|left, right| left.page.cmp(&right.page));
    debug!(count = diagnostics.len(), "story validated");
    diagnostics
}
