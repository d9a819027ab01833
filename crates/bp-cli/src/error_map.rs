use std::fmt::Display;

use bp_core::StoryError;

fn map_error(code: &'static str, error: impl Display) -> StoryError {
    StoryError::new(code, error.to_string())
}

pub(crate) fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

pub(crate) fn emit_error(error: StoryError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!("ERROR_MSG_JSON:{}", json_string(&error.message));
    if let Some(page) = &error.page {
        println!("ERROR_PAGE:{}", page);
    }
    1
}

pub(crate) fn map_tui_io(error: std::io::Error) -> StoryError {
    map_error("TUI_IO", error)
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> StoryError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_scan(error: std::path::StripPrefixError) -> StoryError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> StoryError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_state_write(error: impl Display) -> StoryError {
    map_error("CLI_STATE_WRITE", error)
}

pub(crate) fn map_cli_state_read(error: std::io::Error) -> StoryError {
    map_error("CLI_STATE_READ", error)
}

pub(crate) fn map_cli_state_invalid(error: serde_json::Error) -> StoryError {
    map_error("CLI_STATE_INVALID", error)
}

pub(crate) fn map_cli_vars_invalid(error: serde_json::Error) -> StoryError {
    map_error("CLI_VARS_INVALID", error)
}

pub(crate) fn map_cli_output(error: serde_json::Error) -> StoryError {
    map_error("CLI_OUTPUT", error)
}
