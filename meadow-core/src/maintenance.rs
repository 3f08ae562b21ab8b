//! Single-element housekeeping interactions: rewards, lootboxes, weeds, lawnmowers.
use log::{debug, info};

use crate::config::BotConfig;
use crate::stats::RunStats;
use crate::surface::{Surface, SurfaceError, Target, Transient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaintenanceAction {
    CollectReward,
    CollectLootbox,
    RemoveWeed,
    /// Counts a lawnmower sighting; never clicks it.
    AvoidHazard,
}

/// Clicking actions tried by the decision task, in priority order.
pub const DECISION_ACTIONS: [MaintenanceAction; 3] = [
    MaintenanceAction::CollectReward,
    MaintenanceAction::CollectLootbox,
    MaintenanceAction::RemoveWeed,
];

impl MaintenanceAction {
    #[must_use]
    pub fn transient(self) -> Transient {
        match self {
            MaintenanceAction::CollectReward => Transient::Reward,
            MaintenanceAction::CollectLootbox => Transient::Lootbox,
            MaintenanceAction::RemoveWeed => Transient::Weed,
            MaintenanceAction::AvoidHazard => Transient::Hazard,
        }
    }

    #[must_use]
    pub fn enabled(self, config: &BotConfig) -> bool {
        match self {
            MaintenanceAction::CollectReward => config.collect_level_rewards,
            MaintenanceAction::CollectLootbox => config.collect_lootboxes,
            MaintenanceAction::RemoveWeed => config.remove_weeds,
            MaintenanceAction::AvoidHazard => config.avoid_lawnmowers,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            MaintenanceAction::CollectReward => "Claimed level reward",
            MaintenanceAction::CollectLootbox => "Collected lootbox",
            MaintenanceAction::RemoveWeed => "Removed weed",
            MaintenanceAction::AvoidHazard => "Avoided lawnmower",
        }
    }
}

/// Click the first element for a clicking action. Returns whether it fired.
///
/// # Errors
///
/// Propagates surface backend failures.
pub async fn perform<S: Surface + ?Sized>(
    action: MaintenanceAction,
    surface: &S,
    config: &BotConfig,
    stats: &mut RunStats,
) -> Result<bool, SurfaceError> {
    if action == MaintenanceAction::AvoidHazard || !action.enabled(config) {
        return Ok(false);
    }
    let transient = action.transient();
    if surface.count(transient).await? == 0 {
        return Ok(false);
    }
    let clicked = surface
        .click(Target::Transient {
            kind: transient,
            index: 0,
        })
        .await?;
    if clicked {
        stats.record(action);
        log_action(config, action.label());
    }
    Ok(clicked)
}

/// Run the decision-task maintenance actions; the first that fires wins.
///
/// # Errors
///
/// Propagates surface backend failures.
pub async fn run_maintenance<S: Surface + ?Sized>(
    surface: &S,
    config: &BotConfig,
    stats: &mut RunStats,
) -> Result<Option<MaintenanceAction>, SurfaceError> {
    for action in DECISION_ACTIONS {
        if perform(action, surface, config, stats).await? {
            return Ok(Some(action));
        }
    }
    Ok(None)
}

/// Tracks lawnmower visibility so each appearance is counted once.
#[derive(Debug, Clone, Copy, Default)]
pub struct HazardWatch {
    visible: bool,
}

impl HazardWatch {
    /// Record the current sighting; true on a new appearance.
    pub fn observe(&mut self, present: bool) -> bool {
        let appeared = present && !self.visible;
        self.visible = present;
        appeared
    }
}

/// Look for a lawnmower and count it without touching it.
///
/// # Errors
///
/// Propagates surface backend failures.
pub async fn avoid_hazard<S: Surface + ?Sized>(
    surface: &S,
    config: &BotConfig,
    stats: &mut RunStats,
    watch: &mut HazardWatch,
) -> Result<bool, SurfaceError> {
    if !config.avoid_lawnmowers {
        return Ok(false);
    }
    let present = surface.count(Transient::Hazard).await? > 0;
    if watch.observe(present) {
        stats.record(MaintenanceAction::AvoidHazard);
        log_action(config, MaintenanceAction::AvoidHazard.label());
        return Ok(true);
    }
    Ok(false)
}

pub(crate) fn log_action(config: &BotConfig, message: &str) {
    if config.debug_mode {
        info!("{message}");
    } else {
        debug!("{message}");
    }
}
