use std::io::Write;
use std::process::{Command, Output, Stdio};

fn story(name: &str) -> String {
    bp_test_example::story_dir(name)
        .to_str()
        .expect("path should be utf-8")
        .to_string()
}

fn temp_state(name: &str) -> String {
    std::env::temp_dir()
        .join(format!("branchpage-{}.json", name))
        .to_string_lossy()
        .to_string()
}

fn run_cli(args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_branchpage");
    Command::new(bin)
        .args(args)
        .output()
        .expect("cli command should run")
}

fn run_tui(story_name: &str, input: &[u8]) -> Output {
    let bin = env!("CARGO_BIN_EXE_branchpage");
    let mut child = Command::new(bin)
        .arg("tui")
        .arg("--story-dir")
        .arg(story(story_name))
        .arg("--state-file")
        .arg(temp_state(&format!("tui-{}", story_name)))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("tui should spawn");

    {
        let stdin = child.stdin.as_mut().expect("stdin should be piped");
        stdin.write_all(input).expect("should write input");
    }

    child.wait_with_output().expect("tui should complete")
}

fn parse_state_out(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("STATE_OUT:").map(|v| v.to_string()))
        .filter(|value| value != "NONE")
}

#[test]
fn agent_choice_flow_reaches_end() {
    let state_1 = temp_state("agent-cave-1");
    let state_2 = temp_state("agent-cave-2");
    let state_3 = temp_state("agent-cave-3");
    let state_4 = temp_state("agent-cave-4");
    let state_5 = temp_state("agent-cave-5");

    let start = run_cli(&["agent", "start", "--story-dir", &story("01-cave"), "--state-out", &state_1]);
    assert!(start.status.success(), "start failed");
    let start_stdout = String::from_utf8_lossy(&start.stdout);
    assert!(start_stdout.contains("RESULT:OK"));
    assert!(start_stdout.contains("EVENT:PAGE"));
    assert!(start_stdout.contains("CHOICE:a|\"Step inside\""));
    assert!(start_stdout.contains("AUDIO_JSON:{\"kind\":\"playMusic\",\"file\":\"cave-theme.mp3\",\"loop\":true}"));
    assert!(start_stdout.contains("CAN_CONTINUE:false"));
    assert_eq!(parse_state_out(&start_stdout), Some(state_1.clone()));

    for (state_in, letter, state_out) in [
        (&state_1, "b", &state_2),
        (&state_2, "a", &state_3),
        (&state_3, "a", &state_4),
    ] {
        let choose = run_cli(&[
            "agent",
            "choose",
            "--state-in",
            state_in,
            "--choice",
            letter,
            "--state-out",
            state_out,
        ]);
        assert!(choose.status.success(), "choose {} failed", letter);
    }

    let ending = std::fs::read_to_string(&state_4).expect("ending state should exist");
    assert!(ending.contains("\"page\": \"3aa\""));

    let finish = run_cli(&["agent", "continue", "--state-in", &state_4, "--state-out", &state_5]);
    assert!(finish.status.success(), "continue failed");
    let finish_stdout = String::from_utf8_lossy(&finish.stdout);
    assert!(finish_stdout.contains("EVENT:END"));
    assert!(finish_stdout.contains("STATE_OUT:NONE"));
}

#[test]
fn agent_continue_follows_goto_directive() {
    let state_1 = temp_state("agent-lighthouse-1");
    let state_2 = temp_state("agent-lighthouse-2");
    let state_3 = temp_state("agent-lighthouse-3");

    let start = run_cli(&[
        "agent",
        "start",
        "--story-dir",
        &story("02-lighthouse"),
        "--state-out",
        &state_1,
    ]);
    assert!(start.status.success(), "start failed");
    let choose = run_cli(&[
        "agent", "choose", "--state-in", &state_1, "--choice", "a", "--state-out", &state_2,
    ]);
    assert!(choose.status.success(), "choose failed");
    let choose_stdout = String::from_utf8_lossy(&choose.stdout);
    assert!(choose_stdout.contains("PAGE:2a"));
    assert!(choose_stdout.contains("CAN_CONTINUE:true"));

    let next = run_cli(&["agent", "continue", "--state-in", &state_2, "--state-out", &state_3]);
    assert!(next.status.success(), "continue failed");
    let next_stdout = String::from_utf8_lossy(&next.stdout);
    assert!(next_stdout.contains("PAGE:4"));
    assert!(next_stdout.contains("IS_ENDING:true"));
}

#[test]
fn agent_start_missing_dir_returns_error_envelope() {
    let output = run_cli(&[
        "agent",
        "start",
        "--story-dir",
        "/path/does/not/exist",
        "--state-out",
        &temp_state("none"),
    ]);
    assert!(!output.status.success(), "start should fail for missing dir");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RESULT:ERROR"));
    assert!(stdout.contains("ERROR_CODE:CLI_SOURCE_NOT_FOUND"));
}

#[test]
fn agent_choose_with_unknown_letter_returns_error() {
    let state = temp_state("agent-invalid-choice");
    let start = run_cli(&["agent", "start", "--story-dir", &story("01-cave"), "--state-out", &state]);
    assert!(start.status.success(), "start failed");

    let choose = run_cli(&[
        "agent",
        "choose",
        "--state-in",
        &state,
        "--choice",
        "d",
        "--state-out",
        &temp_state("agent-unreachable"),
    ]);
    assert!(!choose.status.success(), "unknown letter should fail");
    let stdout = String::from_utf8_lossy(&choose.stdout);
    assert!(stdout.contains("RESULT:ERROR"));
    assert!(stdout.contains("ERROR_CODE:ENGINE_CHOICE_INVALID"));
    assert!(stdout.contains("ERROR_PAGE:1"));
}

#[test]
fn render_and_graph_print_machine_readable_output() {
    let render = run_cli(&[
        "render",
        "--story-dir",
        &story("01-cave"),
        "--page",
        "3aa",
        "--vars",
        r#"{"coins":1}"#,
    ]);
    assert!(render.status.success(), "render failed");
    let rendered: serde_json::Value =
        serde_json::from_slice(&render.stdout).expect("render output should be json");
    assert_eq!(
        rendered["html"],
        "<p>The passage opens onto an underground lake.</p><p><strong>The End</strong></p>"
    );
    assert_eq!(rendered["isEnding"], true);

    let graph = run_cli(&["graph", "--story-dir", &story("01-cave")]);
    assert!(graph.status.success(), "graph failed");
    let stdout = String::from_utf8_lossy(&graph.stdout);
    assert!(stdout.contains("PAGE:3aa|ending"));
    assert!(stdout.contains("EDGE:2b|2a|\"Step inside\""));

    let bad_vars = run_cli(&[
        "render",
        "--story-dir",
        &story("01-cave"),
        "--page",
        "1",
        "--vars",
        "not json",
    ]);
    assert!(!bad_vars.status.success());
    assert!(String::from_utf8_lossy(&bad_vars.stdout).contains("ERROR_CODE:CLI_VARS_INVALID"));
}

#[test]
fn tui_supports_commands_and_quit() {
    let output = run_tui("01-cave", b":help\n:save\nb\n:restart\n:load\n:back\n:quit\n");
    assert!(output.status.success(), "tui should exit with success");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("The Cave"));
    assert!(stdout.contains("commands: :help :save :load :back :restart :quit"));
    assert!(stdout.contains("saved:"));
    assert!(stdout.contains("restarted"));
    assert!(stdout.contains("loaded:"));
    assert!(stdout.contains("bye"));
}

#[test]
fn tui_plays_lighthouse_to_the_end() {
    let output = run_tui("02-lighthouse", b"a\n\n\n");
    assert!(output.status.success(), "tui should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("You climb the spiral stairs\u{2014}the lamp flickers."));
    assert!(stdout.contains("-- page 4 --"));
    assert!(stdout.contains("[END]"));
}
