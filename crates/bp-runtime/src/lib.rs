mod assets;
mod engine;
mod markup;
mod render;
mod sanitize;
mod variables;

pub use assets::{resolve_asset_sources, AssetCatalog, AssetResolver};
pub use engine::{
    MemoryPageSource, PageSource, StoryEngine, StoryEngineOptions, SNAPSHOT_SCHEMA,
};
pub use markup::{apply_styling, asset_placeholder, build_paragraphs, replace_asset_placeholders};
pub use render::{render_page, render_source};
pub use sanitize::{AllowListSanitizer, Sanitizer, ALLOWED_ATTRIBUTES, ALLOWED_TAGS};
pub use variables::{
    apply, apply_command, evaluate, resolve_conditionals, resolve_conditionals_strict,
    resolve_conditionals_with_depth,
};
