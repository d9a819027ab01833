use std::sync::Arc;

use bp_core::{
    ChoiceItem, EngineOutput, HistoryEntry, Page, PageId, PageView, RenderConfig, RenderedPage,
    StoryError, VariableState,
};
use tracing::info;

use super::source::PageSource;
use crate::assets::{resolve_asset_sources, AssetResolver};
use crate::render::render_page;
use crate::sanitize::{AllowListSanitizer, Sanitizer};

#[derive(Clone)]
pub struct StoryEngineOptions {
    pub source: Arc<dyn PageSource>,
    pub config: RenderConfig,
    pub assets: Option<Arc<dyn AssetResolver>>,
    pub sanitizer: Option<Arc<dyn Sanitizer>>,
    pub initial_variables: VariableState,
}

impl StoryEngineOptions {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self {
            source,
            config: RenderConfig::default(),
            assets: None,
            sanitizer: None,
            initial_variables: VariableState::new(),
        }
    }
}

pub(super) struct CurrentPage {
    pub(super) id: PageId,
    pub(super) variables_before: VariableState,
    pub(super) view: PageView,
    pub(super) gotos: Vec<PageId>,
}

/// Page-by-page player. Each visit renders against the current variables
/// and swaps in the rendered snapshot; `None` for the current page means the
/// story has ended.
pub struct StoryEngine {
    source: Arc<dyn PageSource>,
    config: RenderConfig,
    assets: Option<Arc<dyn AssetResolver>>,
    sanitizer: Arc<dyn Sanitizer>,
    initial_variables: VariableState,
    pub(super) variables: VariableState,
    pub(super) current: Option<CurrentPage>,
    pub(super) history: Vec<HistoryEntry>,
}

impl StoryEngine {
    pub fn new(options: StoryEngineOptions) -> Self {
        Self {
            source: options.source,
            config: options.config,
            assets: options.assets,
            sanitizer: options
                .sanitizer
                .unwrap_or_else(|| Arc::new(AllowListSanitizer::default())),
            variables: options.initial_variables.clone(),
            initial_variables: options.initial_variables,
            current: None,
            history: Vec::new(),
        }
    }

    pub fn start(&mut self) -> Result<EngineOutput, StoryError> {
        self.history.clear();
        self.current = None;
        self.variables = self.initial_variables.clone();
        let root = PageId::root();
        if !self.enter(root.clone()) {
            return Err(StoryError::with_page(
                "ENGINE_ROOT_MISSING",
                "Story has no root page.",
                root,
            ));
        }
        Ok(self.output())
    }

    pub fn output(&self) -> EngineOutput {
        match &self.current {
            Some(current) => EngineOutput::Page {
                view: current.view.clone(),
            },
            None => EngineOutput::End,
        }
    }

    pub fn choose(&mut self, letter: char) -> Result<EngineOutput, StoryError> {
        let Some(current) = &self.current else {
            return Err(StoryError::new(
                "ENGINE_CHOICE_INVALID",
                "The story has ended.",
            ));
        };
        let letter = letter.to_ascii_lowercase();
        let Some(item) = current.view.choices.iter().find(|item| item.letter == letter) else {
            return Err(StoryError::with_page(
                "ENGINE_CHOICE_INVALID",
                format!("Page {} has no choice \"{}\".", current.id, letter),
                current.id.clone(),
            ));
        };
        let target = item.target.clone();
        info!(from = %current.id, letter = %letter, to = %target, "choice taken");
        Ok(self.navigate(target))
    }

    /// Follows the continuation of a page without choices. The last
    /// `{goto:..}` rendered on the page replaces the default continuation.
    pub fn continue_story(&mut self) -> Result<EngineOutput, StoryError> {
        let Some(current) = &self.current else {
            return Err(StoryError::new(
                "ENGINE_CONTINUE_INVALID",
                "The story has ended.",
            ));
        };
        if current.view.is_ending {
            info!(page = %current.id, "ending reached");
            self.leave();
            return Ok(EngineOutput::End);
        }
        if !current.view.choices.is_empty() {
            return Err(StoryError::with_page(
                "ENGINE_CONTINUE_INVALID",
                format!("Page {} waits for a choice.", current.id),
                current.id.clone(),
            ));
        }
        let target = current
            .gotos
            .last()
            .cloned()
            .unwrap_or_else(|| current.id.continuation_id());
        info!(from = %current.id, to = %target, "continue");
        Ok(self.navigate(target))
    }

    pub fn jump(&mut self, raw: &str) -> Result<EngineOutput, StoryError> {
        let target = PageId::parse(raw)?;
        info!(to = %target, "jump");
        Ok(self.navigate(target))
    }

    /// Returns to the previous page with the variables it was entered with.
    pub fn back(&mut self) -> Result<EngineOutput, StoryError> {
        let Some(entry) = self.history.pop() else {
            return Err(StoryError::new(
                "ENGINE_BACK_EMPTY",
                "There is no previous page.",
            ));
        };
        self.current = None;
        self.variables = entry.variables_before;
        self.enter(entry.page);
        Ok(self.output())
    }

    pub fn variables(&self) -> &VariableState {
        &self.variables
    }

    pub fn current_page(&self) -> Option<&PageId> {
        self.current.as_ref().map(|current| &current.id)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn is_ended(&self) -> bool {
        self.current.is_none()
    }

    fn navigate(&mut self, target: PageId) -> EngineOutput {
        self.leave();
        self.enter(target);
        self.output()
    }

    fn leave(&mut self) {
        if let Some(current) = self.current.take() {
            self.history.push(HistoryEntry {
                page: current.id,
                variables_before: current.variables_before,
            });
        }
    }

    pub(super) fn enter(&mut self, id: PageId) -> bool {
        let Some(page) = self.load(&id) else {
            info!(page = %id, "page missing, story ends");
            return false;
        };
        self.show(id, &page);
        true
    }

    pub(super) fn load(&self, id: &PageId) -> Option<Page> {
        self.source.load_page(id)
    }

    /// Renders `page` against the current variables and makes it current.
    pub(super) fn show(&mut self, id: PageId, page: &Page) {
        let variables_before = self.variables.clone();
        let rendered = render_page(page, &self.variables, &self.config, self.sanitizer.as_ref());
        let (view, variables, gotos) = self.build_view(&id, rendered);
        self.variables = variables;
        self.current = Some(CurrentPage {
            id,
            variables_before,
            view,
            gotos,
        });
    }

    fn build_view(
        &self,
        id: &PageId,
        rendered: RenderedPage,
    ) -> (PageView, VariableState, Vec<PageId>) {
        let html = match &self.assets {
            Some(resolver) => resolve_asset_sources(&rendered.html, resolver.as_ref()),
            None => rendered.html,
        };
        let choices: Vec<ChoiceItem> = if rendered.is_ending {
            Vec::new()
        } else {
            rendered
                .choices
                .iter()
                .filter_map(|choice| {
                    choice.effective_target(id).map(|target| ChoiceItem {
                        letter: choice.letter,
                        text: choice.text.clone(),
                        target,
                    })
                })
                .collect()
        };
        let view = PageView {
            page: id.clone(),
            html,
            can_continue: !rendered.is_ending && choices.is_empty(),
            choices,
            audio_commands: rendered.audio_commands,
            is_ending: rendered.is_ending,
        };
        (view, rendered.variables, rendered.goto_commands)
    }
}
