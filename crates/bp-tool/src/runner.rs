use std::path::Path;

use bp_api::{create_engine_from_story, CreateEngineFromStoryOptions};
use bp_core::{EngineOutput, PageView};
use bp_runtime::StoryEngine;
use tracing::debug;

use crate::source::{read_story_from_dir, read_test_case};
use crate::{BpToolError, ExpectedEvent, TestAction, TestCase};

const MAX_STEPS: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub observed_events: Vec<ExpectedEvent>,
    pub consumed_actions: usize,
    pub steps: usize,
}

fn page_event(view: &PageView) -> ExpectedEvent {
    ExpectedEvent::Page {
        page: view.page.to_string(),
        html: Some(view.html.clone()),
        choices: view
            .choices
            .iter()
            .map(|item| format!("{}|{}", item.letter, item.text))
            .collect(),
    }
}

/// Action kind a page waits for: a letter when it offers choices, a plain
/// continue otherwise (endings included).
fn needed_action(view: &PageView) -> &'static str {
    if view.choices.is_empty() {
        TestAction::Continue.kind_name()
    } else {
        TestAction::Choose { letter: 'a' }.kind_name()
    }
}

fn apply_action(
    engine: &mut StoryEngine,
    view: &PageView,
    action: &TestAction,
    step: usize,
) -> Result<EngineOutput, BpToolError> {
    let needed = needed_action(view);
    if action.kind_name() != needed {
        return Err(BpToolError::WrongAction {
            page: view.page.to_string(),
            step,
            needed,
            given: action.kind_name(),
        });
    }
    let output = match action {
        TestAction::Choose { letter } => engine.choose(*letter)?,
        TestAction::Continue => engine.continue_story()?,
    };
    Ok(output)
}

/// Plays `case` from the root page until the story ends, recording every
/// page it stops on.
pub fn run_case(story_dir: &Path, case: &TestCase) -> Result<RunReport, BpToolError> {
    let bundle = read_story_from_dir(story_dir)?;
    let mut engine = create_engine_from_story(CreateEngineFromStoryOptions {
        bundle,
        initial_variables: None,
        sanitizer: None,
    })?;

    let mut output = engine.output();
    let mut observed_events = Vec::new();
    let mut actions = case.actions.iter();

    for step in 1..=MAX_STEPS {
        let EngineOutput::Page { view } = output else {
            observed_events.push(ExpectedEvent::End);
            let used = case.actions.len() - actions.len();
            if !actions.as_slice().is_empty() {
                return Err(BpToolError::LeftoverActions {
                    used,
                    total: case.actions.len(),
                });
            }
            return Ok(RunReport {
                observed_events,
                consumed_actions: used,
                steps: step,
            });
        };

        observed_events.push(page_event(&view));
        let Some(action) = actions.next() else {
            return Err(BpToolError::ActionsExhausted {
                page: view.page.to_string(),
                step,
                needed: needed_action(&view),
            });
        };
        debug!(page = %view.page, action = action.kind_name(), step, "replay");
        output = apply_action(&mut engine, &view, action, step)?;
    }

    Err(BpToolError::StepLimit { limit: MAX_STEPS })
}

pub fn assert_case(story_dir: &Path, case_path: &Path) -> Result<(), BpToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(story_dir, &case)?;

    if report.observed_events.len() != case.expected_events.len() {
        return Err(BpToolError::EventCount {
            expected: case.expected_events.len(),
            actual: report.observed_events.len(),
            observed: encode(&report.observed_events)?,
        });
    }

    let first_mismatch = case
        .expected_events
        .iter()
        .zip(&report.observed_events)
        .enumerate()
        .find(|(_, (expected, actual))| !expected.matches(actual));
    if let Some((index, (expected, actual))) = first_mismatch {
        return Err(BpToolError::EventDiffers {
            index,
            expected: encode(expected)?,
            actual: encode(actual)?,
        });
    }

    Ok(())
}

fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, BpToolError> {
    serde_json::to_string(value).map_err(BpToolError::EncodeEvent)
}
