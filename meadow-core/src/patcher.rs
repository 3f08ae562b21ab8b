//! Direct progression edits on the persisted document.
//!
//! These are shortcuts, not game actions: they rewrite upgrade levels,
//! achievements and points in the store instead of clicking anything. They
//! run only when the upgrade policy is enabled or stuck detection fires.
use std::collections::BTreeMap;

use log::info;

use crate::mirror::StateMirror;
use crate::snapshot::{PurchasedItem, StoreDocument};
use crate::store::{GameStore, KeyValueStore, StoreError};

/// Upgrade slots every targeted item is given.
pub const UPGRADE_SLOTS: u32 = 5;
/// Highest level the patch will raise a slot to.
pub const UPGRADE_CEILING: u32 = 10;
/// Achievements `0..UNSTICK_ACHIEVEMENTS` are unlocked when stuck.
pub const UNSTICK_ACHIEVEMENTS: u32 = 10;
/// Multiplier applied to positive per-item points when stuck.
pub const UNSTICK_BOOST: f64 = 1.05;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub slots_added: usize,
    pub levels_raised: usize,
    pub achievements_unlocked: usize,
    pub items_boosted: usize,
}

impl PatchReport {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.slots_added + self.levels_raised + self.achievements_unlocked + self.items_boosted > 0
    }
}

/// Fill missing upgrade slots and raise the lowest slot by one level.
///
/// Targets the purchased focus items, or every purchased item when none of
/// the focus items is owned. The raised slot is the lowest below the ceiling,
/// searched over targets first and then the remaining items. Levels never go
/// down and are never pushed past [`UPGRADE_CEILING`].
pub fn apply_upgrade_patch(doc: &mut StoreDocument, focus: &[String]) -> PatchReport {
    let items = &mut doc.state.purchased_items;
    let mut report = PatchReport::default();

    let mut targets: Vec<String> = focus
        .iter()
        .filter(|id| items.contains_key(id.as_str()))
        .cloned()
        .collect();
    if targets.is_empty() {
        targets = items.keys().cloned().collect();
    }

    for id in &targets {
        let Some(item) = items.get_mut(id) else {
            continue;
        };
        for slot in 0..UPGRADE_SLOTS {
            item.upgrades.entry(slot.to_string()).or_insert_with(|| {
                report.slots_added += 1;
                1
            });
        }
    }

    let others: Vec<String> = items
        .keys()
        .filter(|id| !targets.contains(id))
        .cloned()
        .collect();
    let lowest = lowest_slot(items, &targets).or_else(|| lowest_slot(items, &others));

    if let Some((id, slot)) = lowest {
        if let Some(level) = items
            .get_mut(&id)
            .and_then(|item| item.upgrades.get_mut(&slot))
        {
            *level += 1;
            report.levels_raised += 1;
        }
    }

    report
}

/// First slot with the lowest level below the ceiling, in `ids` order.
fn lowest_slot(
    items: &BTreeMap<String, PurchasedItem>,
    ids: &[String],
) -> Option<(String, String)> {
    let mut lowest: Option<(&String, &String, u32)> = None;
    for id in ids {
        let Some(item) = items.get(id) else {
            continue;
        };
        for (slot, &level) in &item.upgrades {
            if level < UPGRADE_CEILING && lowest.is_none_or(|(_, _, best)| level < best) {
                lowest = Some((id, slot, level));
            }
        }
    }
    lowest.map(|(id, slot, _)| (id.clone(), slot.clone()))
}

/// Unlock the first achievements and boost every positive per-item point total.
pub fn apply_unstick_patch(doc: &mut StoreDocument) -> PatchReport {
    let mut report = PatchReport::default();
    let unlocked = doc.state.unlocked_achievements.get_or_insert_with(Vec::new);
    for achievement in 0..UNSTICK_ACHIEVEMENTS {
        if !unlocked.contains(&achievement) {
            unlocked.push(achievement);
            report.achievements_unlocked += 1;
        }
    }
    for points in doc.state.points_by_item.values_mut() {
        if *points > 0.0 {
            *points *= UNSTICK_BOOST;
            report.items_boosted += 1;
        }
    }
    report
}

/// Loads, patches and writes back the game document.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatePatcher;

impl StatePatcher {
    /// Run the upgrade patch; writes only when something changed.
    ///
    /// # Errors
    ///
    /// Fails when the document cannot be read, parsed or written.
    pub async fn upgrade<K: KeyValueStore>(
        &self,
        store: &GameStore<K>,
        mirror: &mut StateMirror,
        focus: &[String],
    ) -> Result<PatchReport, StoreError> {
        let Some(mut doc) = store.load().await? else {
            return Ok(PatchReport::default());
        };
        let report = apply_upgrade_patch(&mut doc, focus);
        if report.changed() {
            store.write(&doc, mirror).await?;
            info!(
                "🔧 Applied upgrades to items ({} slots added, {} levels raised)",
                report.slots_added, report.levels_raised
            );
        }
        Ok(report)
    }

    /// Run the unstick patch and write the result back.
    ///
    /// # Errors
    ///
    /// Fails when the document cannot be read, parsed or written.
    pub async fn unstick<K: KeyValueStore>(
        &self,
        store: &GameStore<K>,
        mirror: &mut StateMirror,
    ) -> Result<PatchReport, StoreError> {
        let Some(mut doc) = store.load().await? else {
            return Ok(PatchReport::default());
        };
        let report = apply_unstick_patch(&mut doc);
        store.write(&doc, mirror).await?;
        info!(
            "🔄 Applied unstuck strategy ({} achievements unlocked, {} items boosted)",
            report.achievements_unlocked, report.items_boosted
        );
        Ok(report)
    }
}
