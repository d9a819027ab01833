use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "bp-tool-case.v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default)]
    pub actions: Vec<TestAction>,
    #[serde(default)]
    pub expected_events: Vec<ExpectedEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TestAction {
    Choose { letter: char },
    Continue,
}

impl TestAction {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Choose { .. } => "choose",
            Self::Continue => "continue",
        }
    }
}

/// One observed stop of a playthrough. Choices are written `letter|text`.
/// An expected page without `html` matches any markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExpectedEvent {
    Page {
        page: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        html: Option<String>,
        #[serde(default)]
        choices: Vec<String>,
    },
    End,
}

impl ExpectedEvent {
    pub fn matches(&self, actual: &ExpectedEvent) -> bool {
        match (self, actual) {
            (
                Self::Page {
                    page,
                    html,
                    choices,
                },
                Self::Page {
                    page: actual_page,
                    html: actual_html,
                    choices: actual_choices,
                },
            ) => {
                page == actual_page
                    && choices == actual_choices
                    && (html.is_none() || html == actual_html)
            }
            (Self::End, Self::End) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod case_tests {
    use super::*;

    fn page(html: Option<&str>) -> ExpectedEvent {
        ExpectedEvent::Page {
            page: "1".to_string(),
            html: html.map(str::to_string),
            choices: vec!["a|Go".to_string()],
        }
    }

    #[test]
    fn test_action_kind_name_reports_expected_value() {
        assert_eq!(TestAction::Choose { letter: 'a' }.kind_name(), "choose");
        assert_eq!(TestAction::Continue.kind_name(), "continue");
    }

    #[test]
    fn testcase_deserialize_applies_defaults() {
        let parsed: TestCase = serde_json::from_str(r#"{"schemaVersion": "bp-tool-case.v1"}"#)
            .expect("testcase should deserialize");

        assert_eq!(parsed.schema_version, TESTCASE_SCHEMA_V1);
        assert!(parsed.actions.is_empty());
        assert!(parsed.expected_events.is_empty());
    }

    #[test]
    fn events_and_actions_deserialize_all_variants() {
        let actions: Vec<TestAction> =
            serde_json::from_str(r#"[{"kind":"choose","letter":"b"},{"kind":"continue"}]"#)
                .expect("actions should deserialize");
        assert_eq!(
            actions,
            vec![TestAction::Choose { letter: 'b' }, TestAction::Continue]
        );

        let events: Vec<ExpectedEvent> = serde_json::from_str(
            r#"[{"kind":"page","page":"2a","choices":["a|Left"]},{"kind":"end"}]"#,
        )
        .expect("events should deserialize");
        assert!(matches!(&events[0], ExpectedEvent::Page { html: None, .. }));
        assert_eq!(events[1], ExpectedEvent::End);
    }

    #[test]
    fn missing_html_matches_any_markup() {
        assert!(page(None).matches(&page(Some("<p>x</p>"))));
        assert!(page(Some("<p>x</p>")).matches(&page(Some("<p>x</p>"))));
        assert!(!page(Some("<p>y</p>")).matches(&page(Some("<p>x</p>"))));
        assert!(!page(None).matches(&ExpectedEvent::End));
    }
}
