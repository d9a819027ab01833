mod bundle;
mod stored;

use std::sync::Arc;

use bp_core::{Page, PageId, PlayerSnapshot, RenderedPage, StoryError, VariableState};
use bp_graph::PageMap;
use bp_runtime::{
    render_page, resolve_asset_sources, AllowListSanitizer, AssetCatalog, PageSource, Sanitizer,
    StoryEngine, StoryEngineOptions,
};

pub use bundle::{
    load_story_from_files, story_to_files, validate_story, StoryBundle, ASSET_DIR, MANIFEST_FILE,
};
pub use stored::{migrate, StoredChoice, StoredPage, StoredPageV2, STORED_PAGE_VERSION};

/// Serves pages straight from a loaded bundle, structured choices included.
#[derive(Debug, Clone)]
pub struct BundlePageSource {
    pages: PageMap,
}

impl BundlePageSource {
    pub fn new(pages: PageMap) -> Self {
        Self { pages }
    }
}

impl PageSource for BundlePageSource {
    fn load_text(&self, id: &PageId) -> Option<String> {
        self.pages.get(id).map(|page| page.content.clone())
    }

    fn is_ending(&self, id: &PageId) -> bool {
        self.pages.get(id).is_some_and(|page| page.is_ending)
    }

    fn load_page(&self, id: &PageId) -> Option<Page> {
        self.pages.get(id).cloned()
    }
}

#[derive(Clone)]
pub struct CreateEngineFromStoryOptions {
    pub bundle: StoryBundle,
    pub initial_variables: Option<VariableState>,
    pub sanitizer: Option<Arc<dyn Sanitizer>>,
}

#[derive(Clone)]
pub struct ResumeEngineFromStoryOptions {
    pub bundle: StoryBundle,
    pub snapshot: PlayerSnapshot,
    pub sanitizer: Option<Arc<dyn Sanitizer>>,
}

fn engine_options(
    bundle: StoryBundle,
    sanitizer: Option<Arc<dyn Sanitizer>>,
) -> StoryEngineOptions {
    let config = bundle.render_config();
    let catalog = AssetCatalog::new(bundle.assets, &config);
    let mut options = StoryEngineOptions::new(Arc::new(BundlePageSource::new(bundle.pages)));
    options.config = config;
    options.assets = Some(Arc::new(catalog));
    options.sanitizer = sanitizer;
    options
}

pub fn create_engine_from_story(
    options: CreateEngineFromStoryOptions,
) -> Result<StoryEngine, StoryError> {
    let mut engine_options = engine_options(options.bundle, options.sanitizer);
    if let Some(variables) = options.initial_variables {
        engine_options.initial_variables = variables;
    }
    let mut engine = StoryEngine::new(engine_options);
    engine.start()?;
    Ok(engine)
}

pub fn resume_engine_from_story(
    options: ResumeEngineFromStoryOptions,
) -> Result<StoryEngine, StoryError> {
    let mut engine = StoryEngine::new(engine_options(options.bundle, options.sanitizer));
    engine.resume(options.snapshot)?;
    Ok(engine)
}

/// One-off render of a page outside a playthrough, with assets resolved
/// against the bundle.
pub fn render_story_page(
    bundle: &StoryBundle,
    id: &PageId,
    variables: &VariableState,
) -> Result<RenderedPage, StoryError> {
    let Some(page) = bundle.pages.get(id) else {
        return Err(StoryError::with_page(
            "API_PAGE_NOT_FOUND",
            format!("Page {} does not exist.", id),
            id.clone(),
        ));
    };
    let config = bundle.render_config();
    let mut rendered = render_page(page, variables, &config, &AllowListSanitizer::default());
    let catalog = AssetCatalog::new(bundle.assets.iter().cloned(), &config);
    rendered.html = resolve_asset_sources(&rendered.html, &catalog);
    Ok(rendered)
}
