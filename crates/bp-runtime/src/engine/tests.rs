use std::sync::Arc;

use bp_core::{EngineOutput, PageId, PageView, RenderConfig, StoryValue};

use super::*;
use crate::assets::AssetCatalog;

fn id(raw: &str) -> PageId {
    PageId::parse(raw).expect("page id")
}

fn new_engine(source: MemoryPageSource) -> StoryEngine {
    StoryEngine::new(StoryEngineOptions::new(Arc::new(source)))
}

fn view(output: EngineOutput) -> PageView {
    match output {
        EngineOutput::Page { view } => view,
        EngineOutput::End => panic!("expected page"),
    }
}

fn forest() -> MemoryPageSource {
    MemoryPageSource::new()
        .with_page(id("1"), "{set:gold=1}You wake.\na) Forest\nb) [4] Skip ahead")
        .with_page(id("2a"), "{add:gold=2}Trees everywhere.")
        .with_page(id("3a"), "A clearing.{if:gold>=3}{goto:4}{/if}")
        .with_page(id("4"), "{music:end.mp3}The end.")
        .with_ending(id("4"))
}

#[test]
fn start_renders_root_page() {
    let mut engine = new_engine(forest());
    let page = view(engine.start().expect("start"));
    assert_eq!(page.page, id("1"));
    assert_eq!(page.html, "<p>You wake.</p>");
    assert_eq!(page.choices.len(), 2);
    assert_eq!(page.choices[0].target, id("2a"));
    assert_eq!(page.choices[1].target, id("4"));
    assert!(!page.can_continue);
    assert_eq!(engine.variables()["gold"], StoryValue::Number(1.0));
}

#[test]
fn start_without_root_fails() {
    let mut engine = new_engine(MemoryPageSource::new().with_page(id("2a"), "x"));
    let error = engine.start().expect_err("missing root");
    assert_eq!(error.code, "ENGINE_ROOT_MISSING");
}

#[test]
fn choose_continue_and_goto_override() {
    let mut engine = new_engine(forest());
    engine.start().expect("start");

    let page = view(engine.choose('A').expect("choose"));
    assert_eq!(page.page, id("2a"));
    assert!(page.can_continue);
    assert_eq!(engine.variables()["gold"], StoryValue::Number(3.0));

    let page = view(engine.continue_story().expect("continue"));
    assert_eq!(page.page, id("3a"));

    let page = view(engine.continue_story().expect("continue"));
    assert_eq!(page.page, id("4"));
    assert!(page.is_ending);
    assert!(!page.can_continue);
    assert_eq!(page.audio_commands.len(), 1);

    assert_eq!(engine.continue_story().expect("end"), EngineOutput::End);
    assert!(engine.is_ended());
}

#[test]
fn invalid_moves_are_errors() {
    let mut engine = new_engine(forest());
    engine.start().expect("start");
    let error = engine.choose('e').expect_err("no such choice");
    assert_eq!(error.code, "ENGINE_CHOICE_INVALID");
    let error = engine.continue_story().expect_err("page has choices");
    assert_eq!(error.code, "ENGINE_CONTINUE_INVALID");
    let error = engine.jump("0a").expect_err("bad id");
    assert_eq!(error.code, "PAGE_ID_INVALID");
}

#[test]
fn missing_target_ends_story_and_back_recovers() {
    let source = MemoryPageSource::new().with_page(id("1"), "Start\na) Nowhere");
    let mut engine = new_engine(source);
    engine.start().expect("start");
    assert_eq!(engine.choose('a').expect("choose"), EngineOutput::End);
    let error = engine.choose('a').expect_err("ended");
    assert_eq!(error.code, "ENGINE_CHOICE_INVALID");

    let page = view(engine.back().expect("back"));
    assert_eq!(page.page, id("1"));
    let error = engine.back().expect_err("history empty");
    assert_eq!(error.code, "ENGINE_BACK_EMPTY");
}

#[test]
fn back_restores_variables_before_page() {
    let mut engine = new_engine(forest());
    engine.start().expect("start");
    engine.choose('a').expect("choose");
    assert_eq!(engine.variables()["gold"], StoryValue::Number(3.0));

    engine.back().expect("back");
    assert_eq!(engine.current_page(), Some(&id("1")));
    assert_eq!(engine.variables()["gold"], StoryValue::Number(1.0));
    assert!(engine.history().is_empty());
}

#[test]
fn jump_navigates_and_records_history() {
    let mut engine = new_engine(forest());
    engine.start().expect("start");
    let page = view(engine.jump("3A").expect("jump"));
    assert_eq!(page.page, id("3a"));
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn snapshot_resume_does_not_reapply_directives() {
    let mut engine = new_engine(forest());
    engine.start().expect("start");
    engine.choose('a').expect("choose");
    let snapshot = engine.snapshot().expect("snapshot");
    assert_eq!(snapshot.schema_version, SNAPSHOT_SCHEMA);
    assert_eq!(snapshot.page, id("2a"));

    let json = serde_json::to_string(&snapshot).expect("json");
    assert!(json.contains("\"variablesBefore\""));
    let restored = serde_json::from_str(&json).expect("parse");

    let mut resumed = new_engine(forest());
    let page = view(resumed.resume(restored).expect("resume"));
    assert_eq!(page.page, id("2a"));
    assert_eq!(resumed.variables()["gold"], StoryValue::Number(3.0));
    assert_eq!(resumed.history().len(), 1);
}

#[test]
fn resume_rejects_foreign_schema_and_missing_page() {
    let mut engine = new_engine(forest());
    engine.start().expect("start");
    engine.choose('a').expect("choose");
    let mut snapshot = engine.snapshot().expect("snapshot");
    let history = engine.history().to_vec();
    let variables = engine.variables().clone();

    snapshot.schema_version = "snapshot.v0".to_string();
    let error = engine.resume(snapshot.clone()).expect_err("schema");
    assert_eq!(error.code, "ENGINE_SNAPSHOT_SCHEMA");

    snapshot.schema_version = SNAPSHOT_SCHEMA.to_string();
    snapshot.page = id("9");
    snapshot.history.clear();
    snapshot.variables_before.clear();
    let error = engine.resume(snapshot).expect_err("missing page");
    assert_eq!(error.code, "ENGINE_SNAPSHOT_PAGE_MISSING");
    assert_eq!(engine.current_page(), Some(&id("2a")));
    assert_eq!(engine.history(), history.as_slice());
    assert_eq!(engine.variables(), &variables);
}

#[test]
fn snapshot_after_end_is_not_allowed() {
    let source = MemoryPageSource::new().with_page(id("1"), "Only page");
    let mut engine = new_engine(source);
    engine.start().expect("start");
    assert_eq!(engine.continue_story().expect("continue"), EngineOutput::End);
    let error = engine.snapshot().expect_err("ended");
    assert_eq!(error.code, "ENGINE_SNAPSHOT_NOT_ALLOWED");
}

#[test]
fn assets_resolve_through_catalog() {
    let source = MemoryPageSource::new().with_page(id("1"), "{cave} {map:small}");
    let config = RenderConfig::default();
    let mut options = StoryEngineOptions::new(Arc::new(source));
    options.assets = Some(Arc::new(AssetCatalog::new(["cave.png"], &config)));
    let mut engine = StoryEngine::new(options);
    let page = view(engine.start().expect("start"));
    assert_eq!(
        page.html,
        "<p><img src=\"assets/cave.png\" alt=\"cave\" class=\"story-asset\"> \
         <img src=\"asset:map\" alt=\"map\" class=\"story-asset asset-small asset-missing\"></p>"
    );
}

#[test]
fn start_resets_previous_run() {
    let mut engine = new_engine(forest());
    engine.start().expect("start");
    engine.choose('a').expect("choose");
    let page = view(engine.start().expect("restart"));
    assert_eq!(page.page, id("1"));
    assert!(engine.history().is_empty());
    assert_eq!(engine.variables()["gold"], StoryValue::Number(1.0));
}
