use std::ffi::OsString;

use bp_core::StoryError;
use clap::Parser;

mod agent;
mod boundary_runner;
mod cli_args;
mod error_map;
mod line_tui;
mod logging;
mod models;
mod report;
mod session_ops;
mod source_loader;
mod state_store;

pub(crate) use boundary_runner::{boundary_from_output, emit_boundary};
pub(crate) use cli_args::{
    AgentArgs, AgentCommand, CheckArgs, ChooseArgs, Cli, ContinueArgs, GraphArgs, Mode,
    RenderArgs, StartArgs, TuiArgs,
};
pub(crate) use error_map::{
    emit_error, json_string, map_cli_output, map_cli_source_path, map_cli_source_read,
    map_cli_source_scan, map_cli_state_invalid, map_cli_state_read, map_cli_state_write,
    map_cli_vars_invalid, map_tui_io,
};
pub(crate) use line_tui::run_tui_line_mode;
#[cfg(test)]
pub(crate) use line_tui::{handle_line_cmd, handle_tui_command, run_tui_line_mode_with_io};
pub(crate) use logging::init_logging;
pub(crate) use models::{
    BoundaryEvent, BoundaryResult, LoadedStory, PlayerState, TuiCommandAction,
    TuiCommandContext, PLAYER_STATE_SCHEMA,
};
pub(crate) use session_ops::{
    create_engine_for_story, emit_boundary_with_saved_state, load_engine_from_state_for_story,
    resume_engine_for_state, save_engine_state,
};
pub(crate) use source_loader::{load_story_by_dir, load_story_by_ref};
pub(crate) use state_store::{load_player_state, save_player_state};

const DEFAULT_STATE_FILE: &str = ".branchpage/save.json";

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    if let Err(error) = init_logging(cli.log_level.as_deref()) {
        return emit_error(error);
    }
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, StoryError> {
    match cli.command {
        Mode::Agent(args) => agent::run_agent(args),
        Mode::Tui(args) => run_tui(args),
        Mode::Check(args) => report::run_check(args),
        Mode::Render(args) => report::run_render(args),
        Mode::Graph(args) => report::run_graph(args),
    }
}

fn run_tui(args: TuiArgs) -> Result<i32, StoryError> {
    let state_file = args
        .state_file
        .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
    let story = load_story_by_dir(&args.story_dir)?;
    let mut engine = create_engine_for_story(&story)?;
    run_tui_line_mode(&state_file, &story, &mut engine)
}

#[cfg(test)]
mod cli_test_support;
