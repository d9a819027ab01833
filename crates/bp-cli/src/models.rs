use bp_api::StoryBundle;
use bp_core::{Command, PageId, PlayerSnapshot};
use serde::{Deserialize, Serialize};

pub(crate) const PLAYER_STATE_SCHEMA: &str = "branchpage-state.v1";

#[derive(Debug, Clone)]
pub(crate) struct LoadedStory {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) bundle: StoryBundle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerState {
    pub(crate) schema_version: String,
    pub(crate) story_id: String,
    pub(crate) snapshot: PlayerSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryEvent {
    Page,
    End,
}

#[derive(Debug, Clone)]
pub(crate) struct BoundaryResult {
    pub(crate) event: BoundaryEvent,
    pub(crate) page: Option<PageId>,
    pub(crate) html: Option<String>,
    pub(crate) choices: Vec<(char, String)>,
    pub(crate) audio: Vec<Command>,
    pub(crate) can_continue: bool,
    pub(crate) is_ending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TuiCommandAction {
    NotHandled,
    Continue,
    RefreshBoundary,
    Quit,
}

pub(crate) struct TuiCommandContext<'a> {
    pub(crate) state_file: &'a str,
    pub(crate) story: &'a LoadedStory,
}
