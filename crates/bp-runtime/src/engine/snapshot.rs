use bp_core::{EngineOutput, PlayerSnapshot, StoryError};

use super::lifecycle::StoryEngine;

pub const SNAPSHOT_SCHEMA: &str = "player-snapshot.v1";

impl StoryEngine {
    pub fn snapshot(&self) -> Result<PlayerSnapshot, StoryError> {
        let Some(current) = &self.current else {
            return Err(StoryError::new(
                "ENGINE_SNAPSHOT_NOT_ALLOWED",
                "snapshot() needs a current page.",
            ));
        };
        Ok(PlayerSnapshot {
            schema_version: SNAPSHOT_SCHEMA.to_string(),
            page: current.id.clone(),
            variables_before: current.variables_before.clone(),
            history: self.history.clone(),
        })
    }

    /// Re-renders the saved page from the variables held before it, so its
    /// directives run exactly once. A failed resume leaves the engine as it was.
    pub fn resume(&mut self, snapshot: PlayerSnapshot) -> Result<EngineOutput, StoryError> {
        if snapshot.schema_version != SNAPSHOT_SCHEMA {
            return Err(StoryError::new(
                "ENGINE_SNAPSHOT_SCHEMA",
                format!(
                    "Unsupported snapshot schema \"{}\", expected \"{}\".",
                    snapshot.schema_version, SNAPSHOT_SCHEMA
                ),
            ));
        }
        let Some(page) = self.load(&snapshot.page) else {
            return Err(StoryError::with_page(
                "ENGINE_SNAPSHOT_PAGE_MISSING",
                format!("Snapshot page {} no longer exists.", snapshot.page),
                snapshot.page,
            ));
        };
        self.history = snapshot.history;
        self.variables = snapshot.variables_before;
        self.show(snapshot.page, &page);
        Ok(self.output())
    }
}
