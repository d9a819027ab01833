use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use bp_api::{load_story_from_files, ASSET_DIR};
use bp_core::StoryError;
use tracing::debug;
use walkdir::WalkDir;

use crate::{map_cli_source_path, map_cli_source_read, map_cli_source_scan, LoadedStory};

const STORY_REF_PREFIX: &str = "story-dir:";

pub(crate) fn load_story_by_dir(story_dir: &str) -> Result<LoadedStory, StoryError> {
    let story_root = resolve_story_dir(story_dir)?;
    let (files, assets) = read_story_files_from_dir(&story_root)?;
    let bundle = load_story_from_files(&files, assets)?;
    let title = match bundle.title() {
        Some(title) => title.to_string(),
        None => format!(
            "Story {}",
            story_root
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("unknown")
        ),
    };

    Ok(LoadedStory {
        id: make_story_dir_id(&story_root),
        title,
        bundle,
    })
}

pub(crate) fn load_story_by_ref(story_ref: &str) -> Result<LoadedStory, StoryError> {
    let Some(raw) = story_ref.strip_prefix(STORY_REF_PREFIX) else {
        return Err(StoryError::new(
            "CLI_SOURCE_REF_INVALID",
            format!("Unsupported story ref: {}", story_ref),
        ));
    };
    load_story_by_dir(raw)
}

pub(crate) fn resolve_story_dir(story_dir: &str) -> Result<PathBuf, StoryError> {
    let path = PathBuf::from(story_dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(StoryError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("story-dir does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(StoryError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("story-dir is not a directory: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

/// Page files (`.txt`, `.json`) keyed by relative path, plus the file names
/// found under `assets/`.
pub(crate) fn read_story_files_from_dir(
    story_dir: &Path,
) -> Result<(BTreeMap<String, String>, BTreeSet<String>), StoryError> {
    let mut files = BTreeMap::new();
    let mut assets = BTreeSet::new();
    let asset_prefix = format!("{}/", ASSET_DIR);

    for entry in WalkDir::new(story_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path
            .strip_prefix(story_dir)
            .map_err(map_cli_source_scan)?
            .to_string_lossy()
            .replace('\\', "/");

        if let Some(asset) = relative.strip_prefix(&asset_prefix) {
            assets.insert(asset.to_string());
            continue;
        }

        if !(relative.ends_with(".txt") || relative.ends_with(".json")) {
            debug!(file = %relative, "file skipped");
            continue;
        }

        let content = fs::read_to_string(path).map_err(map_cli_source_read)?;
        files.insert(relative, content);
    }

    if files.is_empty() {
        return Err(StoryError::new(
            "CLI_SOURCE_EMPTY",
            format!("No .txt/.json page files under {}", story_dir.display()),
        ));
    }

    Ok((files, assets))
}

pub(crate) fn make_story_dir_id(story_dir: &Path) -> String {
    format!("{}{}", STORY_REF_PREFIX, story_dir.display())
}

#[cfg(test)]
mod source_loader_tests {
    use super::*;
    use crate::cli_test_support::*;

    #[test]
    fn load_story_by_ref_validates_ref_prefix() {
        let error = load_story_by_ref("unknown:main").expect_err("invalid ref should fail");
        assert_eq!(error.code, "CLI_SOURCE_REF_INVALID");
        let error = load_story_by_ref("").expect_err("empty ref should fail");
        assert_eq!(error.code, "CLI_SOURCE_REF_INVALID");
    }

    #[test]
    fn resolve_story_dir_validates_existence_and_directory() {
        let missing = temp_path("missing-dir");
        let missing_err = resolve_story_dir(missing.to_string_lossy().as_ref())
            .expect_err("missing path should fail");
        assert_eq!(missing_err.code, "CLI_SOURCE_NOT_FOUND");

        let file_path = temp_path("plain-file");
        write_file(&file_path, "x");
        let file_err = resolve_story_dir(file_path.to_string_lossy().as_ref())
            .expect_err("file path should fail");
        assert_eq!(file_err.code, "CLI_SOURCE_NOT_DIR");
    }

    #[test]
    fn read_story_files_splits_pages_and_assets() {
        let root = temp_path("story-dir");
        write_file(&root.join("1.txt"), "Start");
        write_file(&root.join("2a.json"), "\"Stored\"");
        write_file(&root.join("story.json"), "{}");
        write_file(&root.join("notes.md"), "ignored");
        write_file(&root.join("assets").join("cave.png"), "png");
        write_file(&root.join("assets").join("sfx").join("drip.wav"), "wav");

        let (files, assets) = read_story_files_from_dir(&root).expect("scan should pass");
        assert_eq!(
            files.keys().cloned().collect::<Vec<_>>(),
            vec!["1.txt", "2a.json", "story.json"]
        );
        assert!(assets.contains("cave.png"));
        assert!(assets.contains("sfx/drip.wav"));
    }

    #[test]
    fn read_story_files_errors_without_pages() {
        let root = temp_path("empty-story-dir");
        write_file(&root.join("readme.md"), "not a page");
        let error = read_story_files_from_dir(&root).expect_err("no pages");
        assert_eq!(error.code, "CLI_SOURCE_EMPTY");
    }

    #[test]
    fn load_story_by_dir_uses_manifest_title() {
        let root = temp_path("titled-story");
        write_file(&root.join("1.txt"), "Start");
        write_file(&root.join("story.json"), r#"{"title":"The Cave"}"#);
        let story = load_story_by_dir(&root.to_string_lossy()).expect("load should pass");
        assert_eq!(story.title, "The Cave");
        assert!(story.id.starts_with("story-dir:"));
        assert_eq!(story.bundle.pages.len(), 1);

        let again = load_story_by_ref(&story.id).expect("load by ref");
        assert_eq!(again.id, story.id);
    }

    #[test]
    fn make_story_dir_id_is_stable() {
        let root = temp_path("story-id-test");
        assert_eq!(make_story_dir_id(&root), make_story_dir_id(&root));
    }
}
