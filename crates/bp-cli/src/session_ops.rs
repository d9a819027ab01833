use std::path::Path;

use bp_api::{
    create_engine_from_story, resume_engine_from_story, CreateEngineFromStoryOptions,
    ResumeEngineFromStoryOptions,
};
use bp_core::StoryError;
use bp_runtime::StoryEngine;

use crate::{
    emit_boundary, load_player_state, save_player_state, BoundaryEvent, BoundaryResult,
    LoadedStory, PlayerState, PLAYER_STATE_SCHEMA,
};

pub(crate) fn create_engine_for_story(story: &LoadedStory) -> Result<StoryEngine, StoryError> {
    create_engine_from_story(CreateEngineFromStoryOptions {
        bundle: story.bundle.clone(),
        initial_variables: None,
        sanitizer: None,
    })
}

pub(crate) fn resume_engine_for_state(
    story: &LoadedStory,
    state: &PlayerState,
) -> Result<StoryEngine, StoryError> {
    resume_engine_from_story(ResumeEngineFromStoryOptions {
        bundle: story.bundle.clone(),
        snapshot: state.snapshot.clone(),
        sanitizer: None,
    })
}

pub(crate) fn save_engine_state(
    path: &Path,
    engine: &StoryEngine,
    story_id: &str,
) -> Result<(), StoryError> {
    let snapshot = engine.snapshot()?;
    let state = PlayerState {
        schema_version: PLAYER_STATE_SCHEMA.to_string(),
        story_id: story_id.to_string(),
        snapshot,
    };
    save_player_state(path, &state)
}

pub(crate) fn load_engine_from_state_for_story(
    path: &Path,
    story: &LoadedStory,
) -> Result<(PlayerState, StoryEngine), StoryError> {
    let state = load_player_state(path)?;
    if state.story_id != story.id {
        return Err(StoryError::new(
            "TUI_STATE_STORY_MISMATCH",
            format!(
                "State story mismatch. expected={} actual={}",
                story.id, state.story_id
            ),
        ));
    }
    let engine = resume_engine_for_state(story, &state)?;
    Ok((state, engine))
}

/// Saves the player state next to a page boundary. An ended story has
/// nothing to resume, so no state file is written for it.
pub(crate) fn emit_boundary_with_saved_state(
    engine: &StoryEngine,
    boundary: BoundaryResult,
    state_out: &str,
    story_id: &str,
) -> Result<i32, StoryError> {
    if boundary.event == BoundaryEvent::Page {
        save_engine_state(Path::new(state_out), engine, story_id)?;
        emit_boundary(boundary, Some(state_out.to_string()))?;
        return Ok(0);
    }

    emit_boundary(boundary, None)?;
    Ok(0)
}
