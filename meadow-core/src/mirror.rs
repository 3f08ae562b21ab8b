//! In-memory mirror of the game's persisted progression.
use std::collections::BTreeMap;

use log::{debug, error};
use thiserror::Error;

use crate::snapshot::{SnapshotError, StoreDocument};

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("discarded store update: {0}")]
    Parse(#[from] SnapshotError),
}

/// Summary derived from one store document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameStateSummary {
    pub total_points: u64,
    pub points_by_item: BTreeMap<String, f64>,
    /// Item id to its upgrade slot levels.
    pub purchased_items: BTreeMap<String, BTreeMap<String, u32>>,
    pub current_level: u32,
    pub points_per_second: f64,
    pub item_contributions: BTreeMap<String, f64>,
}

impl GameStateSummary {
    /// Build a summary from a parsed document.
    #[must_use]
    pub fn from_document(doc: &StoreDocument, level_item_id: &str) -> Self {
        let state = &doc.state;
        let item_contributions = state.item_contributions.clone().unwrap_or_default();
        Self {
            total_points: state.total_points(),
            points_by_item: state.points_by_item.clone(),
            purchased_items: state
                .purchased_items
                .iter()
                .map(|(id, item)| (id.clone(), item.upgrades.clone()))
                .collect(),
            current_level: state.metadata_level(level_item_id).unwrap_or(0),
            points_per_second: item_contributions.values().sum(),
            item_contributions,
        }
    }

    /// Known point contribution of an item.
    #[must_use]
    pub fn contribution(&self, item_id: &str) -> Option<f64> {
        self.item_contributions.get(item_id).copied()
    }
}

/// Keeps the latest successfully parsed summary.
///
/// Never writes to the store itself.
#[derive(Debug, Clone, Default)]
pub struct StateMirror {
    level_item_id: String,
    summary: Option<GameStateSummary>,
    updates: u64,
}

impl StateMirror {
    #[must_use]
    pub fn new(level_item_id: impl Into<String>) -> Self {
        Self {
            level_item_id: level_item_id.into(),
            summary: None,
            updates: 0,
        }
    }

    /// Feed one raw store value.
    ///
    /// Malformed values are logged and ignored; the previous summary stays.
    ///
    /// # Errors
    ///
    /// Returns the parse failure after logging it, for callers that count them.
    pub fn observe(&mut self, raw: &str) -> Result<(), MirrorError> {
        match StoreDocument::parse(raw) {
            Ok(doc) => {
                self.apply(&doc);
                Ok(())
            }
            Err(err) => {
                error!("Error parsing game state: {err}");
                Err(MirrorError::Parse(err))
            }
        }
    }

    /// Replace the summary with one derived from `doc`.
    pub fn apply(&mut self, doc: &StoreDocument) {
        let summary = GameStateSummary::from_document(doc, &self.level_item_id);
        debug!(
            "state mirror updated: {} points across {} items, level {}",
            summary.total_points,
            summary.points_by_item.len(),
            summary.current_level
        );
        self.summary = Some(summary);
        self.updates += 1;
    }

    #[must_use]
    pub fn summary(&self) -> Option<&GameStateSummary> {
        self.summary.as_ref()
    }

    /// Number of accepted updates since construction.
    #[must_use]
    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn clear(&mut self) {
        self.summary = None;
        self.updates = 0;
    }
}
