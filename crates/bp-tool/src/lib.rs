//! Replays scripted playthroughs (`testcase.json`) against a story directory
//! and compares the pages the player stops on with the expected ones.

mod case;
mod runner;
mod source;

pub use case::{ExpectedEvent, TestAction, TestCase, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, RunReport};
pub use source::{read_story_from_dir, read_test_case};

use std::path::PathBuf;

use bp_core::StoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BpToolError {
    #[error("Cannot read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Testcase {path} is not valid JSON: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Testcase schema is \"{found}\", this runner reads \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("Story directory {dir} has no page files.")]
    NoPages { dir: PathBuf },
    #[error(transparent)]
    Story(#[from] StoryError),
    #[error("Out of actions at page {page} (step {step}); the page needs `{needed}`.")]
    ActionsExhausted {
        page: String,
        step: usize,
        needed: &'static str,
    },
    #[error("Page {page} needs `{needed}` but step {step} gives `{given}`.")]
    WrongAction {
        page: String,
        step: usize,
        needed: &'static str,
        given: &'static str,
    },
    #[error("Story ended after {used} of {total} actions.")]
    LeftoverActions { used: usize, total: usize },
    #[error("Playthrough still running after {limit} steps.")]
    StepLimit { limit: usize },
    #[error("Expected {expected} events, the playthrough produced {actual}:\n{observed}")]
    EventCount {
        expected: usize,
        actual: usize,
        observed: String,
    },
    #[error("Event {index} differs.\n  expected: {expected}\n  actual:   {actual}")]
    EventDiffers {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("Cannot encode event: {0}")]
    EncodeEvent(serde_json::Error),
}
