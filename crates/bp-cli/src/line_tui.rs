use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::OnceLock;

use bp_core::{Command, EngineOutput, PageView, StoryError};
use bp_runtime::StoryEngine;
use regex::Regex;

use crate::{
    create_engine_for_story, load_engine_from_state_for_story, map_tui_io, save_engine_state,
    LoadedStory, TuiCommandAction, TuiCommandContext,
};

const HELP_LINE: &str = "commands: :help :save :load :back :restart :quit";

fn image_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r#"<img\b[^>]*\balt="([^"]*)"[^>]*>"#).expect("image regex"))
}

fn video_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"<video\b[^>]*>").expect("video regex"))
}

fn line_break_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("line break regex"))
}

fn tag_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag regex"))
}

/// Flattens rendered page HTML for a terminal: paragraphs become blank-line
/// separated blocks and assets show as bracketed markers.
pub(crate) fn html_to_text(html: &str) -> String {
    let text = image_regex().replace_all(html, "[image: $1]");
    let text = video_regex().replace_all(&text, "[video]");
    let text = line_break_regex().replace_all(&text, "\n");
    let text = text.replace("</p>", "\n\n");
    let text = tag_regex().replace_all(&text, "");
    html_escape::decode_html_entities(text.trim()).to_string()
}

fn audio_line(command: &Command) -> Option<String> {
    match command {
        Command::PlayMusic { file, looped } => Some(format!(
            "(music: {}{})",
            file,
            if *looped { ", looped" } else { "" }
        )),
        Command::PlaySfx { file } => Some(format!("(sfx: {})", file)),
        Command::PlayAmbient { file } => Some(format!("(ambient: {})", file)),
        Command::StopAudio { target } => Some(format!("(stop: {})", target.as_str())),
        _ => None,
    }
}

fn print_view(view: &PageView, writer: &mut dyn Write) -> Result<(), StoryError> {
    writeln!(writer).map_err(map_tui_io)?;
    writeln!(writer, "-- page {} --", view.page).map_err(map_tui_io)?;
    for line in view.audio_commands.iter().filter_map(audio_line) {
        writeln!(writer, "{}", line).map_err(map_tui_io)?;
    }
    writeln!(writer, "{}", html_to_text(&view.html)).map_err(map_tui_io)?;
    for item in &view.choices {
        writeln!(writer, "  [{}] {}", item.letter, item.text).map_err(map_tui_io)?;
    }
    if view.is_ending {
        writeln!(writer, "[THE END] (press enter)").map_err(map_tui_io)?;
    } else if view.can_continue {
        writeln!(writer, "(press enter to continue)").map_err(map_tui_io)?;
    }
    Ok(())
}

pub(crate) fn run_tui_line_mode(
    state_file: &str,
    story: &LoadedStory,
    engine: &mut StoryEngine,
) -> Result<i32, StoryError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_tui_line_mode_with_io(state_file, story, engine, &mut reader, &mut writer)
}

pub(crate) fn run_tui_line_mode_with_io(
    state_file: &str,
    story: &LoadedStory,
    engine: &mut StoryEngine,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, StoryError> {
    writeln!(writer, "{}", story.title).map_err(map_tui_io)?;
    writeln!(writer, "{}", HELP_LINE).map_err(map_tui_io)?;
    let command_context = TuiCommandContext { state_file, story };

    loop {
        let view = match engine.output() {
            EngineOutput::Page { view } => view,
            EngineOutput::End => {
                writeln!(writer).map_err(map_tui_io)?;
                writeln!(writer, "[END]").map_err(map_tui_io)?;
                return Ok(0);
            }
        };
        print_view(&view, writer)?;

        loop {
            let Some(raw) = prompt_input_from("> ", reader, writer)? else {
                return Ok(0);
            };
            let mut lines = Vec::new();
            let action = {
                let mut emit = |line: String| lines.push(line);
                handle_line_cmd(raw.trim(), &command_context, engine, &mut emit)?
            };
            for line in lines {
                writeln!(writer, "{}", line).map_err(map_tui_io)?;
            }
            match action {
                TuiCommandAction::Continue => continue,
                TuiCommandAction::RefreshBoundary => break,
                TuiCommandAction::Quit => return Ok(0),
                TuiCommandAction::NotHandled => {}
            }

            match step(raw.trim(), &view, engine) {
                Ok(true) => break,
                Ok(false) => {
                    writeln!(writer, "pick one of the listed letters").map_err(map_tui_io)?
                }
                Err(error) => writeln!(writer, "{}", error.message).map_err(map_tui_io)?,
            }
        }
    }
}

/// Applies a player line to the engine. Returns `false` when the line is not
/// a move on this page.
fn step(raw: &str, view: &PageView, engine: &mut StoryEngine) -> Result<bool, StoryError> {
    if raw.is_empty() {
        if view.is_ending || view.can_continue {
            engine.continue_story()?;
            return Ok(true);
        }
        return Ok(false);
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) if letter.is_ascii_alphabetic() && !view.choices.is_empty() => {
            engine.choose(letter)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

pub(crate) fn handle_tui_command(
    raw: &str,
    state_file: &str,
    story: &LoadedStory,
    engine: &mut StoryEngine,
    emit: &mut dyn FnMut(String),
) -> Result<TuiCommandAction, StoryError> {
    match raw {
        ":help" => {
            emit(HELP_LINE.to_string());
            Ok(TuiCommandAction::Continue)
        }
        ":save" => {
            save_engine_state(Path::new(state_file), engine, &story.id)?;
            emit(format!("saved: {}", state_file));
            Ok(TuiCommandAction::Continue)
        }
        ":load" => {
            let (_, resumed) = load_engine_from_state_for_story(Path::new(state_file), story)?;
            *engine = resumed;
            emit(format!("loaded: {}", state_file));
            Ok(TuiCommandAction::RefreshBoundary)
        }
        ":back" => match engine.back() {
            Ok(_) => Ok(TuiCommandAction::RefreshBoundary),
            Err(error) if error.code == "ENGINE_BACK_EMPTY" => {
                emit(error.message);
                Ok(TuiCommandAction::Continue)
            }
            Err(error) => Err(error),
        },
        ":restart" => {
            let mut restarted = create_engine_for_story(story)?;
            std::mem::swap(engine, &mut restarted);
            emit("restarted".to_string());
            Ok(TuiCommandAction::RefreshBoundary)
        }
        ":quit" => {
            emit("bye".to_string());
            Ok(TuiCommandAction::Quit)
        }
        _ => Ok(TuiCommandAction::NotHandled),
    }
}

pub(crate) fn handle_line_cmd(
    raw: &str,
    context: &TuiCommandContext<'_>,
    engine: &mut StoryEngine,
    emit: &mut dyn FnMut(String),
) -> Result<TuiCommandAction, StoryError> {
    handle_tui_command(raw, context.state_file, context.story, engine, emit)
}

/// Reads one line after printing `prefix`; `None` at end of input.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, StoryError> {
    write!(writer, "{}", prefix).map_err(map_tui_io)?;
    writer.flush().map_err(map_tui_io)?;
    let mut input = String::new();
    let read = reader.read_line(&mut input).map_err(map_tui_io)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}

#[cfg(test)]
mod line_tui_tests {
    use super::*;

    #[test]
    fn html_to_text_flattens_paragraphs_and_assets() {
        let html = concat!(
            "<p>You enter the <strong>cave</strong>.<br>It is dark &amp; damp.</p>",
            "<p><img src=\"assets/cave.png\" alt=\"cave\" class=\"story-asset\"></p>"
        );
        assert_eq!(
            html_to_text(html),
            "You enter the cave.\nIt is dark & damp.\n\n[image: cave]"
        );
    }

    #[test]
    fn audio_lines_skip_non_audio_commands() {
        assert_eq!(
            audio_line(&Command::PlayMusic {
                file: "theme.mp3".to_string(),
                looped: true
            }),
            Some("(music: theme.mp3, looped)".to_string())
        );
        assert_eq!(
            audio_line(&Command::Goto {
                target: bp_core::PageId::root()
            }),
            None
        );
    }

    #[test]
    fn prompt_input_from_strips_newline_and_reports_eof() {
        let mut reader = io::Cursor::new(b"a\r\n".to_vec());
        let mut writer = Vec::new();
        assert_eq!(
            prompt_input_from("> ", &mut reader, &mut writer).expect("line"),
            Some("a".to_string())
        );
        assert_eq!(
            prompt_input_from("> ", &mut reader, &mut writer).expect("eof"),
            None
        );
        assert_eq!(String::from_utf8_lossy(&writer), "> > ");
    }
}
