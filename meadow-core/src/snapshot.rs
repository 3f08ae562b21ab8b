//! Typed model of the game's persisted store document.
//!
//! The game keeps its whole progression under one key as
//! `{ "_state": { "pointsByItem": .., "purchasedItems": .., .. } }`.
//! Fields the bot does not understand are carried through untouched so a
//! patched write never drops game data.
use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Key the game stores its document under.
pub const STORE_KEY: &str = "ClickerGameStore";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document has no `_state` object")]
    MissingState,
}

/// The whole persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(rename = "_state")]
    pub state: GameSnapshot,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Progression data inside `_state`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub points_by_item: BTreeMap<String, f64>,
    pub purchased_items: BTreeMap<String, PurchasedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_contributions: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_achievements: Option<Vec<u32>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchasedItem {
    /// Upgrade slot id to level.
    #[serde(default, deserialize_with = "upgrade_levels")]
    pub upgrades: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A `null` map reads as empty. Fractional levels round up so writing the
/// item back never lowers a level; non-numeric levels are dropped.
fn upgrade_levels<'de, D>(deserializer: D) -> Result<BTreeMap<String, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(slot, level)| upgrade_level(&level).map(|level| (slot, level)))
        .collect())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn upgrade_level(value: &Value) -> Option<u32> {
    let level = value.as_f64()?;
    level
        .is_finite()
        .then(|| level.ceil().clamp(0.0, f64::from(u32::MAX)) as u32)
}

impl StoreDocument {
    /// Parse a raw store value.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or when the `_state` object, `pointsByItem`
    /// or `purchasedItems` are missing.
    pub fn parse(raw: &str) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_str(raw)?;
        if !value.get("_state").is_some_and(Value::is_object) {
            return Err(SnapshotError::MissingState);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize for writing back to the store.
    ///
    /// # Errors
    ///
    /// Fails only if a retained foreign value cannot be serialized.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl GameSnapshot {
    /// Sum of all per-item points, floored; negative totals clamp to zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn total_points(&self) -> u64 {
        let sum: f64 = self.points_by_item.values().sum();
        if sum.is_finite() && sum > 0.0 {
            sum.floor() as u64
        } else {
            0
        }
    }

    /// Integer level stored in an item's metadata, if any.
    #[must_use]
    pub fn metadata_level(&self, item_id: &str) -> Option<u32> {
        self.purchased_items
            .get(item_id)?
            .metadata
            .as_ref()?
            .get("level")?
            .as_u64()
            .and_then(|level| u32::try_from(level).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "_state": {
            "pointsByItem": {"0": 120.5, "3": 80},
            "purchasedItems": {
                "0": {"upgrades": {"0": 2}, "metadata": {"level": 4}, "seen": true},
                "3": {}
            },
            "itemContributions": {"0": 1.5, "3": 4},
            "settings": {"muted": true}
        },
        "version": 7
    }"#;

    #[test]
    fn parses_nested_shape() {
        let doc = StoreDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.state.total_points(), 200);
        assert_eq!(doc.state.metadata_level("0"), Some(4));
        assert_eq!(doc.state.metadata_level("3"), None);
        assert!(doc.state.purchased_items["3"].upgrades.is_empty());
        assert_eq!(doc.state.item_contributions.as_ref().unwrap()["3"], 4.0);
    }

    #[test]
    fn unknown_fields_survive_rewrite() {
        let doc = StoreDocument::parse(SAMPLE).unwrap();
        let reparsed: Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(reparsed["version"], 7);
        assert_eq!(reparsed["_state"]["settings"]["muted"], true);
        assert_eq!(reparsed["_state"]["purchasedItems"]["0"]["seen"], true);
    }

    #[test]
    fn rejects_missing_structure() {
        assert!(matches!(
            StoreDocument::parse("{not json"),
            Err(SnapshotError::Json(_))
        ));
        assert!(matches!(
            StoreDocument::parse(r#"{"other": 1}"#),
            Err(SnapshotError::MissingState)
        ));
        assert!(matches!(
            StoreDocument::parse("null"),
            Err(SnapshotError::MissingState)
        ));
        assert!(StoreDocument::parse(r#"{"_state": {"pointsByItem": {}}}"#).is_err());
    }

    #[test]
    fn null_upgrades_read_as_empty() {
        let doc = StoreDocument::parse(
            r#"{"_state":{"pointsByItem":{"0":500,"1":20},"purchasedItems":{"0":{"upgrades":{"0":2}},"1":{"upgrades":null}}}}"#,
        )
        .unwrap();
        assert_eq!(doc.state.total_points(), 520);
        assert_eq!(doc.state.purchased_items["0"].upgrades["0"], 2);
        assert!(doc.state.purchased_items["1"].upgrades.is_empty());
    }

    #[test]
    fn fractional_levels_round_up_and_junk_is_dropped() {
        let doc = StoreDocument::parse(
            r#"{"_state":{"pointsByItem":{},"purchasedItems":{"4":{"upgrades":{"0":2.5,"1":3,"2":"max","3":-1}}}}}"#,
        )
        .unwrap();
        let upgrades = &doc.state.purchased_items["4"].upgrades;
        assert_eq!(upgrades["0"], 3);
        assert_eq!(upgrades["1"], 3);
        assert!(!upgrades.contains_key("2"));
        assert_eq!(upgrades["3"], 0);
    }

    #[test]
    fn negative_totals_clamp() {
        let mut snapshot = GameSnapshot::default();
        snapshot.points_by_item.insert("1".into(), -50.0);
        assert_eq!(snapshot.total_points(), 0);
    }
}
