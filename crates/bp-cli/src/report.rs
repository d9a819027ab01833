use bp_api::{render_story_page, validate_story};
use bp_core::{Diagnostic, PageId, Severity, StoryError, VariableState};
use bp_graph::StoryGraph;
use tracing::debug;

use crate::{
    json_string, load_story_by_dir, map_cli_output, map_cli_vars_invalid, CheckArgs, GraphArgs,
    RenderArgs,
};

pub(crate) fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let page = diagnostic
        .page
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} [{}] {}",
        diagnostic.severity.as_str(),
        page,
        diagnostic.message
    )
}

fn count(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity == severity)
        .count()
}

/// Errors always fail the check; warnings fail it only in strict mode.
pub(crate) fn check_exit_code(diagnostics: &[Diagnostic], strict: bool) -> i32 {
    let errors = count(diagnostics, Severity::Error);
    let warnings = count(diagnostics, Severity::Warning);
    if errors > 0 || (strict && warnings > 0) {
        1
    } else {
        0
    }
}

pub(crate) fn run_check(args: CheckArgs) -> Result<i32, StoryError> {
    let story = load_story_by_dir(&args.story_dir)?;
    let diagnostics = validate_story(&story.bundle);
    debug!(story = %story.id, count = diagnostics.len(), "story checked");

    for diagnostic in &diagnostics {
        println!("{}", format_diagnostic(diagnostic));
    }
    println!(
        "SUMMARY:pages={} errors={} warnings={} infos={}",
        story.bundle.pages.len(),
        count(&diagnostics, Severity::Error),
        count(&diagnostics, Severity::Warning),
        count(&diagnostics, Severity::Info)
    );
    Ok(check_exit_code(&diagnostics, args.strict))
}

pub(crate) fn parse_vars(raw: Option<&str>) -> Result<VariableState, StoryError> {
    match raw {
        Some(raw) => serde_json::from_str(raw).map_err(map_cli_vars_invalid),
        None => Ok(VariableState::new()),
    }
}

pub(crate) fn run_render(args: RenderArgs) -> Result<i32, StoryError> {
    let story = load_story_by_dir(&args.story_dir)?;
    let page = PageId::parse(&args.page)?;
    let variables = parse_vars(args.vars.as_deref())?;
    let rendered = render_story_page(&story.bundle, &page, &variables)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&rendered).map_err(map_cli_output)?
    );
    Ok(0)
}

pub(crate) fn graph_lines(graph: &StoryGraph) -> Vec<String> {
    let mut lines = graph
        .kinds
        .iter()
        .map(|(id, kind)| format!("PAGE:{}|{}", id, kind.as_str()))
        .collect::<Vec<_>>();
    lines.extend(graph.edges.iter().map(|edge| {
        format!(
            "EDGE:{}|{}|{}",
            edge.source,
            edge.target,
            edge.label
                .as_deref()
                .map(json_string)
                .unwrap_or_else(|| "null".to_string())
        )
    }));
    lines
}

pub(crate) fn run_graph(args: GraphArgs) -> Result<i32, StoryError> {
    let story = load_story_by_dir(&args.story_dir)?;
    let graph = StoryGraph::build(&story.bundle.pages);
    for line in graph_lines(&graph) {
        println!("{}", line);
    }
    Ok(0)
}

#[cfg(test)]
mod report_tests {
    use super::*;
    use std::collections::BTreeMap;

    use bp_api::load_story_from_files;
    use bp_core::StoryValue;

    fn id(raw: &str) -> PageId {
        PageId::parse(raw).expect("page id")
    }

    #[test]
    fn diagnostics_format_with_and_without_page() {
        let with_page = Diagnostic::new(Severity::Warning, Some(id("2a")), "Page is empty.");
        assert_eq!(format_diagnostic(&with_page), "WARNING [2a] Page is empty.");
        let without = Diagnostic::new(Severity::Error, None, "Missing root page 1.");
        assert_eq!(format_diagnostic(&without), "ERROR [-] Missing root page 1.");
    }

    #[test]
    fn check_exit_code_respects_strict_mode() {
        let warnings = vec![Diagnostic::new(Severity::Warning, Some(id("3")), "w")];
        assert_eq!(check_exit_code(&warnings, false), 0);
        assert_eq!(check_exit_code(&warnings, true), 1);

        let infos = vec![Diagnostic::new(Severity::Info, Some(id("3")), "i")];
        assert_eq!(check_exit_code(&infos, true), 0);

        let errors = vec![Diagnostic::new(Severity::Error, None, "e")];
        assert_eq!(check_exit_code(&errors, false), 1);
    }

    #[test]
    fn parse_vars_reads_typed_json_object() {
        let vars = parse_vars(Some(r#"{"coins":3,"hasKey":true,"name":"Ada"}"#)).expect("vars");
        assert_eq!(vars.get("coins"), Some(&StoryValue::Number(3.0)));
        assert_eq!(vars.get("hasKey"), Some(&StoryValue::Bool(true)));
        assert_eq!(vars.get("name"), Some(&StoryValue::String("Ada".to_string())));
        assert!(parse_vars(None).expect("empty").is_empty());

        let error = parse_vars(Some("[1,2]")).expect_err("array is not a variable map");
        assert_eq!(error.code, "CLI_VARS_INVALID");
    }

    #[test]
    fn graph_lines_list_pages_then_edges() {
        let files = BTreeMap::from([
            ("1.txt".to_string(), "Start\na) Go left".to_string()),
            ("2a.txt".to_string(), "Left".to_string()),
        ]);
        let bundle = load_story_from_files(&files, Vec::<String>::new()).expect("bundle");
        let graph = StoryGraph::build(&bundle.pages);
        assert_eq!(
            graph_lines(&graph),
            vec![
                "PAGE:1|choice".to_string(),
                "PAGE:2a|normal".to_string(),
                "EDGE:1|2a|\"Go left\"".to_string(),
            ]
        );
    }
}
