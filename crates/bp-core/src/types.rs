use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::page_id::PageId;
use crate::value::{StoryValue, VariableState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub letter: char,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goto: Option<PageId>,
}

impl Choice {
    pub fn new(letter: char, text: impl Into<String>) -> Self {
        Self {
            letter: letter.to_ascii_lowercase(),
            text: text.into(),
            goto: None,
        }
    }

    pub fn with_goto(mut self, goto: PageId) -> Self {
        self.goto = Some(goto);
        self
    }

    /// The `goto` override when present, else the default child of `from`.
    pub fn effective_target(&self, from: &PageId) -> Option<PageId> {
        match &self.goto {
            Some(goto) => Some(goto.clone()),
            None => from.child_id(self.letter),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub content: String,
    pub has_choices: bool,
    pub is_ending: bool,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl Page {
    pub fn choice(&self, letter: char) -> Option<&Choice> {
        let letter = letter.to_ascii_lowercase();
        self.choices.iter().find(|choice| choice.letter == letter)
    }

    pub fn is_navigable_by_choices(&self) -> bool {
        self.has_choices && !self.is_ending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl CompareOp {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            ">=" => Some(Self::Ge),
            "<=" => Some(Self::Le),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioTarget {
    Music,
    Sfx,
    Ambient,
    All,
}

impl AudioTarget {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "music" => Some(Self::Music),
            "sfx" => Some(Self::Sfx),
            "ambient" => Some(Self::Ambient),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Music => "music",
            Self::Sfx => "sfx",
            Self::Ambient => "ambient",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetSize {
    Small,
    Medium,
    Large,
}

impl AssetSize {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            _ => None,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Small => "asset-small",
            Self::Medium => "asset-medium",
            Self::Large => "asset-large",
        }
    }
}

/// A directive recovered from page text. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Command {
    SetVar {
        name: String,
        value: StoryValue,
    },
    AddVar {
        name: String,
        delta: f64,
    },
    SubVar {
        name: String,
        delta: f64,
    },
    #[serde(rename_all = "camelCase")]
    Conditional {
        name: String,
        operator: CompareOp,
        compare_value: StoryValue,
        body: String,
    },
    PlayMusic {
        file: String,
        #[serde(rename = "loop")]
        looped: bool,
    },
    PlaySfx {
        file: String,
    },
    PlayAmbient {
        file: String,
    },
    StopAudio {
        target: AudioTarget,
    },
    Goto {
        target: PageId,
    },
    #[serde(rename_all = "camelCase")]
    AssetRef {
        name: String,
        size_hint: Option<AssetSize>,
    },
}

impl Command {
    pub fn is_variable_op(&self) -> bool {
        matches!(
            self,
            Self::SetVar { .. } | Self::AddVar { .. } | Self::SubVar { .. }
        )
    }

    pub fn is_audio(&self) -> bool {
        matches!(
            self,
            Self::PlayMusic { .. }
                | Self::PlaySfx { .. }
                | Self::PlayAmbient { .. }
                | Self::StopAudio { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPage {
    pub html: String,
    pub variables: VariableState,
    pub audio_commands: Vec<Command>,
    pub goto_commands: Vec<PageId>,
    pub choices: Vec<Choice>,
    pub is_ending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceItem {
    pub letter: char,
    pub text: String,
    pub target: PageId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub page: PageId,
    pub html: String,
    pub choices: Vec<ChoiceItem>,
    pub audio_commands: Vec<Command>,
    pub can_continue: bool,
    pub is_ending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EngineOutput {
    Page { view: PageView },
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub page: PageId,
    pub variables_before: VariableState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub schema_version: String,
    pub page: PageId,
    pub variables_before: VariableState,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub page: Option<PageId>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, page: Option<PageId>, message: impl Into<String>) -> Self {
        Self {
            severity,
            page,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Normal,
    Choice,
    Ending,
    Orphan,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Choice => "choice",
            Self::Ending => "ending",
            Self::Orphan => "orphan",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: PageId,
    pub target: PageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    pub max_if_depth: usize,
    pub asset_extensions: Vec<String>,
    pub video_extensions: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_if_depth: 16,
            asset_extensions: [
                "png", "jpg", "jpeg", "gif", "webp", "svg", "mp4", "webm", "mp3", "ogg", "wav",
            ]
            .iter()
            .map(|ext| ext.to_string())
            .collect(),
            video_extensions: ["mp4", "webm", "ogv"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl RenderConfig {
    pub fn is_video(&self, asset_name: &str) -> bool {
        let lower = asset_name.to_ascii_lowercase();
        self.video_extensions
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoryManifest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub endings: BTreeSet<PageId>,
    pub render: RenderConfig,
}
