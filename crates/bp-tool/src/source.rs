use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use bp_api::{load_story_from_files, StoryBundle, ASSET_DIR};
use walkdir::WalkDir;

use crate::{BpToolError, TestCase, TESTCASE_SCHEMA_V1};

/// Loads a story directory the way the player does: `.txt`/`.json` files
/// are pages or the manifest, files under `assets/` are asset names.
pub fn read_story_from_dir(story_dir: &Path) -> Result<StoryBundle, BpToolError> {
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
        let Ok(relative) = path.strip_prefix(story_dir) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");

        if let Some(asset) = relative.strip_prefix(&asset_prefix) {
            assets.insert(asset.to_string());
            continue;
        }
        if !(relative.ends_with(".txt") || relative.ends_with(".json")) {
            continue;
        }

        let content = fs::read_to_string(path).map_err(|source| BpToolError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        files.insert(relative, content);
    }

    if files.is_empty() {
        return Err(BpToolError::NoPages {
            dir: story_dir.to_path_buf(),
        });
    }

    Ok(load_story_from_files(&files, assets)?)
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, BpToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| BpToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| BpToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(BpToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}
