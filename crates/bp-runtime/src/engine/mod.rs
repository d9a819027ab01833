mod lifecycle;
mod snapshot;
mod source;

pub use lifecycle::{StoryEngine, StoryEngineOptions};
pub use snapshot::SNAPSHOT_SCHEMA;
pub use source::{MemoryPageSource, PageSource};

#[cfg(test)]
mod tests;
