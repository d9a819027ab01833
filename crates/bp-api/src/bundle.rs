use std::collections::{BTreeMap, BTreeSet};

use bp_core::{Choice, Diagnostic, Page, PageId, RenderConfig, StoryError, StoryManifest};
use bp_graph::{validate_with_config, PageMap};
use bp_parser::{extract_choices, page_from_source};
use tracing::{debug, warn};

use crate::stored::{migrate, StoredPage};

pub const MANIFEST_FILE: &str = "story.json";
pub const ASSET_DIR: &str = "assets";

/// A loaded story: pages keyed by id, the known asset file names and the
/// optional manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryBundle {
    pub pages: PageMap,
    pub assets: BTreeSet<String>,
    pub manifest: Option<StoryManifest>,
}

impl StoryBundle {
    pub fn render_config(&self) -> RenderConfig {
        self.manifest
            .as_ref()
            .map(|manifest| manifest.render.clone())
            .unwrap_or_default()
    }

    pub fn title(&self) -> Option<&str> {
        self.manifest.as_ref().and_then(|manifest| manifest.title.as_deref())
    }
}

/// Builds a bundle from relative file paths and their text. `<id>.txt` is a
/// page in directive text, `<id>.json` a stored page record and
/// `story.json` the manifest. JSON files whose stem is not a page id are
/// skipped.
pub fn load_story_from_files<I, S>(
    files: &BTreeMap<String, String>,
    assets: I,
) -> Result<StoryBundle, StoryError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut bundle = StoryBundle {
        assets: assets.into_iter().map(Into::into).collect(),
        ..StoryBundle::default()
    };
    let mut origins: BTreeMap<PageId, &str> = BTreeMap::new();

    for (path, text) in files {
        let name = path.rsplit('/').next().unwrap_or(path);
        if name == MANIFEST_FILE {
            bundle.manifest = Some(parse_manifest(text)?);
            continue;
        }
        let (stem, page) = if let Some(stem) = name.strip_suffix(".txt") {
            let id = PageId::parse(stem).map_err(|_| {
                StoryError::new(
                    "API_PAGE_FILE_NAME",
                    format!("Page file \"{}\" is not named after a page id.", path),
                )
            })?;
            (id, page_from_source(text))
        } else if let Some(stem) = name.strip_suffix(".json") {
            let Ok(id) = PageId::parse(stem) else {
                debug!(file = %path, "json file skipped");
                continue;
            };
            let page = migrate(StoredPage::from_json(text)?)
                .map_err(|error| StoryError::with_page(error.code, error.message, id.clone()))?;
            (id, page)
        } else {
            debug!(file = %path, "file skipped");
            continue;
        };

        if let Some(previous) = origins.insert(stem.clone(), path) {
            return Err(StoryError::with_page(
                "API_PAGE_DUPLICATE",
                format!(
                    "Page {} is defined by both \"{}\" and \"{}\".",
                    stem, previous, path
                ),
                stem,
            ));
        }
        bundle.pages.insert(stem, page);
    }

    if let Some(manifest) = &bundle.manifest {
        for id in &manifest.endings {
            match bundle.pages.get_mut(id) {
                Some(page) => page.is_ending = true,
                None => warn!(page = %id, "manifest ending has no page"),
            }
        }
    }

    debug!(pages = bundle.pages.len(), assets = bundle.assets.len(), "story loaded");
    Ok(bundle)
}

fn parse_manifest(text: &str) -> Result<StoryManifest, StoryError> {
    serde_json::from_str(text).map_err(|error| {
        StoryError::new(
            "API_MANIFEST_INVALID",
            format!("{} is invalid: {}", MANIFEST_FILE, error),
        )
    })
}

/// Writes each page as `<id>.txt`. When the structured choices differ from
/// the choice lines in the text, those lines are replaced by the structured
/// ones. Ending flags go to the manifest.
pub fn story_to_files(bundle: &StoryBundle) -> Result<BTreeMap<String, String>, StoryError> {
    let mut files = BTreeMap::new();
    for (id, page) in &bundle.pages {
        files.insert(format!("{}.txt", id), page_text(page));
    }

    let endings: BTreeSet<PageId> = bundle
        .pages
        .iter()
        .filter(|(_, page)| page.is_ending)
        .map(|(id, _)| id.clone())
        .collect();
    if bundle.manifest.is_some() || !endings.is_empty() {
        let mut manifest = bundle.manifest.clone().unwrap_or_default();
        manifest.endings = endings;
        let json = serde_json::to_string_pretty(&manifest).map_err(|error| {
            StoryError::new(
                "API_MANIFEST_INVALID",
                format!("{} could not be written: {}", MANIFEST_FILE, error),
            )
        })?;
        files.insert(MANIFEST_FILE.to_string(), json);
    }
    Ok(files)
}

fn page_text(page: &Page) -> String {
    let (in_text, prose) = extract_choices(&page.content);
    if page.choices.is_empty() || in_text == page.choices {
        return page.content.clone();
    }
    // Stale choice lines would shadow the structured ones on reload.
    let mut text = prose.trim_end_matches('\n').to_string();
    if !text.is_empty() {
        text.push('\n');
    }
    let lines: Vec<String> = page.choices.iter().map(choice_line).collect();
    text.push_str(&lines.join("\n"));
    text
}

fn choice_line(choice: &Choice) -> String {
    match &choice.goto {
        Some(goto) => format!("{}) [{}] {}", choice.letter, goto, choice.text),
        None => format!("{}) {}", choice.letter, choice.text),
    }
}

pub fn validate_story(bundle: &StoryBundle) -> Vec<Diagnostic> {
    validate_with_config(&bundle.pages, &bundle.assets, &bundle.render_config())
}
