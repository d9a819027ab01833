use std::path::Path;

use bp_core::{EngineOutput, StoryError};
use bp_runtime::StoryEngine;

use crate::{
    boundary_from_output, create_engine_for_story, emit_boundary_with_saved_state,
    load_player_state, load_story_by_dir, load_story_by_ref, resume_engine_for_state, AgentArgs,
    AgentCommand, ChooseArgs, ContinueArgs, StartArgs,
};

pub(super) fn run_agent(args: AgentArgs) -> Result<i32, StoryError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args),
        AgentCommand::Choose(args) => run_choose(args),
        AgentCommand::Continue(args) => run_continue(args),
    }
}

pub(super) fn run_start(args: StartArgs) -> Result<i32, StoryError> {
    let story = load_story_by_dir(&args.story_dir)?;
    let engine = create_engine_for_story(&story)?;
    let boundary = boundary_from_output(engine.output());
    emit_boundary_with_saved_state(&engine, boundary, &args.state_out, &story.id)
}

pub(super) fn run_choose(args: ChooseArgs) -> Result<i32, StoryError> {
    run_state_transition(&args.state_in, &args.state_out, |engine| {
        engine.choose(args.choice)
    })
}

pub(super) fn run_continue(args: ContinueArgs) -> Result<i32, StoryError> {
    run_state_transition(&args.state_in, &args.state_out, |engine| {
        engine.continue_story()
    })
}

fn run_state_transition(
    state_in: &str,
    state_out: &str,
    transition: impl FnOnce(&mut StoryEngine) -> Result<EngineOutput, StoryError>,
) -> Result<i32, StoryError> {
    let state = load_player_state(Path::new(state_in))?;
    let story = load_story_by_ref(&state.story_id)?;
    let mut engine = resume_engine_for_state(&story, &state)?;
    let output = transition(&mut engine)?;
    let boundary = boundary_from_output(output);
    emit_boundary_with_saved_state(&engine, boundary, state_out, &state.story_id)
}
