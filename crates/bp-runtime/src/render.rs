use bp_core::{Page, RenderConfig, RenderedPage, VariableState};
use bp_parser::{
    extract_choices, extract_side_effects, extract_variable_ops, normalize_newlines,
    page_from_source, strip_side_effects, strip_variable_ops,
};
use tracing::debug;

use crate::markup::{apply_styling, build_paragraphs, replace_asset_placeholders};
use crate::sanitize::{AllowListSanitizer, Sanitizer};
use crate::variables::{apply, resolve_conditionals_with_depth};

/// Runs the page pipeline against `state` and returns the new variable
/// snapshot alongside the sanitized markup. `state` itself is not modified.
pub fn render_page(
    page: &Page,
    state: &VariableState,
    config: &RenderConfig,
    sanitizer: &dyn Sanitizer,
) -> RenderedPage {
    let text = normalize_newlines(&page.content);
    let (_, prose) = extract_choices(&text);

    let ops = extract_variable_ops(&prose);
    let variables = apply(state, &ops);
    let prose = strip_variable_ops(&prose);

    let prose = resolve_conditionals_with_depth(&prose, &variables, config.max_if_depth);

    let effects = extract_side_effects(&prose);
    let prose = strip_side_effects(&prose);

    let styled = apply_styling(&prose);
    let with_assets = replace_asset_placeholders(&styled, config);
    let html = sanitizer.sanitize(&build_paragraphs(&with_assets));

    debug!(
        variable_ops = ops.len(),
        audio = effects.audio.len(),
        gotos = effects.gotos.len(),
        "page rendered"
    );

    RenderedPage {
        html,
        variables,
        audio_commands: effects.audio,
        goto_commands: effects.gotos,
        choices: page.choices.clone(),
        is_ending: page.is_ending,
    }
}

/// Renders raw page text with the default config and allow-list sanitizer.
pub fn render_source(text: &str, state: &VariableState) -> RenderedPage {
    render_page(
        &page_from_source(text),
        state,
        &RenderConfig::default(),
        &AllowListSanitizer::default(),
    )
}

#[cfg(test)]
mod render_tests {
    use super::*;
    use bp_core::{AudioTarget, Command, CompareOp, PageId, StoryValue};

    use crate::variables::evaluate;

    #[test]
    fn variables_then_conditionals() {
        let rendered = render_source(
            "{set:coins=10}{add:coins=5}You have coins.{if:coins>=14} Rich!{/if}",
            &VariableState::new(),
        );
        assert_eq!(rendered.html, "<p>You have coins. Rich!</p>");
        assert!(evaluate(
            &rendered.variables,
            "coins",
            CompareOp::Eq,
            &StoryValue::Number(15.0)
        ));
    }

    #[test]
    fn unset_flag_hides_block() {
        let rendered = render_source("{if:hasKey}Door opens{/if}", &VariableState::new());
        assert_eq!(rendered.html, "");

        let mut vars = VariableState::new();
        vars.insert("hasKey".to_string(), StoryValue::Bool(true));
        assert_eq!(
            render_source("{if:hasKey}Door opens{/if}", &vars).html,
            "<p>Door opens</p>"
        );
    }

    #[test]
    fn ops_inside_false_blocks_still_apply() {
        let rendered = render_source("{if:never}{set:seen=true}{/if}Hi", &VariableState::new());
        assert_eq!(rendered.variables["seen"], StoryValue::Bool(true));
        assert_eq!(rendered.html, "<p>Hi</p>");
    }

    #[test]
    fn side_effects_follow_conditionals_and_are_hidden() {
        let mut vars = VariableState::new();
        vars.insert("angry".to_string(), StoryValue::Bool(true));
        let rendered = render_source(
            "{music:theme.mp3:loop}Hello{if:angry}{sfx:growl.wav}{goto:5}{/if}{if:calm}{goto:6}{/if}{stop:ambient}",
            &vars,
        );
        assert_eq!(rendered.html, "<p>Hello</p>");
        assert_eq!(
            rendered.audio_commands,
            vec![
                Command::PlayMusic {
                    file: "theme.mp3".to_string(),
                    looped: true
                },
                Command::PlaySfx {
                    file: "growl.wav".to_string()
                },
                Command::StopAudio {
                    target: AudioTarget::Ambient
                },
            ]
        );
        assert_eq!(rendered.goto_commands, vec![PageId::parse("5").expect("id")]);
    }

    #[test]
    fn music_is_never_an_asset() {
        let rendered = render_source("{music:theme.mp3}{cave.png}", &VariableState::new());
        assert_eq!(
            rendered.html,
            "<p><img src=\"asset:cave.png\" alt=\"cave.png\" class=\"story-asset\"></p>"
        );
    }

    #[test]
    fn choices_are_removed_from_prose() {
        let rendered = render_source(
            "The road forks.\n\na) Go left\nb) [3ab] Go right",
            &VariableState::new(),
        );
        assert_eq!(rendered.html, "<p>The road forks.</p>");
        assert_eq!(rendered.choices.len(), 2);
        assert_eq!(rendered.choices[1].goto, Some(PageId::parse("3ab").expect("id")));
    }

    #[test]
    fn styling_and_paragraphs() {
        let rendered = render_source(
            "**Night** falls...\nThe _wind_ howls.\n\nMorning -- finally.",
            &VariableState::new(),
        );
        assert_eq!(
            rendered.html,
            "<p><strong>Night</strong> falls\u{2026}<br>The <em>wind</em> howls.</p><p>Morning \u{2013} finally.</p>"
        );
    }

    #[test]
    fn raw_html_is_sanitized() {
        let rendered = render_source(
            "Hi <script>alert(1)</script><b>there</b>",
            &VariableState::new(),
        );
        assert_eq!(rendered.html, "<p>Hi there</p>");
    }

    #[test]
    fn unbalanced_conditionals_degrade_to_text() {
        let rendered = render_source("Start {if:x}never closed", &VariableState::new());
        assert_eq!(rendered.html, "<p>Start {if:x}never closed</p>");
    }

    #[test]
    fn choices_come_from_the_page_record() {
        let page = Page {
            content: "Text\nb) Stale line".to_string(),
            has_choices: true,
            is_ending: false,
            choices: vec![bp_core::Choice::new('a', "Only")],
        };
        let rendered = render_page(
            &page,
            &VariableState::new(),
            &RenderConfig::default(),
            &AllowListSanitizer::default(),
        );
        assert_eq!(rendered.html, "<p>Text</p>");
        assert_eq!(rendered.choices.len(), 1);
        assert_eq!(rendered.choices[0].text, "Only");
    }
}
