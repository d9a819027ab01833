use bp_core::{EngineOutput, StoryError};

use crate::{json_string, map_cli_output, BoundaryEvent, BoundaryResult};

pub(crate) fn boundary_from_output(output: EngineOutput) -> BoundaryResult {
    match output {
        EngineOutput::Page { view } => BoundaryResult {
            event: BoundaryEvent::Page,
            page: Some(view.page),
            html: Some(view.html),
            choices: view
                .choices
                .into_iter()
                .map(|item| (item.letter, item.text))
                .collect(),
            audio: view.audio_commands,
            can_continue: view.can_continue,
            is_ending: view.is_ending,
        },
        EngineOutput::End => BoundaryResult {
            event: BoundaryEvent::End,
            page: None,
            html: None,
            choices: Vec::new(),
            audio: Vec::new(),
            can_continue: false,
            is_ending: false,
        },
    }
}

pub(crate) fn emit_boundary(
    boundary: BoundaryResult,
    state_out: Option<String>,
) -> Result<(), StoryError> {
    println!("RESULT:OK");
    match boundary.event {
        BoundaryEvent::Page => println!("EVENT:PAGE"),
        BoundaryEvent::End => println!("EVENT:END"),
    }

    if let Some(page) = boundary.page {
        println!("PAGE:{}", page);
    }

    if let Some(html) = boundary.html {
        println!("HTML_JSON:{}", json_string(&html));
    }

    for (letter, text) in boundary.choices {
        println!("CHOICE:{}|{}", letter, json_string(&text));
    }

    for command in &boundary.audio {
        println!(
            "AUDIO_JSON:{}",
            serde_json::to_string(command).map_err(map_cli_output)?
        );
    }

    if boundary.event == BoundaryEvent::Page {
        println!("CAN_CONTINUE:{}", boundary.can_continue);
        println!("IS_ENDING:{}", boundary.is_ending);
    }

    println!(
        "STATE_OUT:{}",
        state_out.unwrap_or_else(|| "NONE".to_string())
    );
    Ok(())
}
