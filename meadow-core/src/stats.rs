//! Counters for one bot run.
use std::time::{Duration, Instant};

use crate::maintenance::MaintenanceAction;

#[derive(Debug, Clone)]
pub struct RunStats {
    pub total_clicks: u64,
    pub level_rewards_claimed: u64,
    pub lootboxes_collected: u64,
    pub weeds_removed: u64,
    pub lawnmowers_avoided: u64,
    pub purchases: u64,
    pub upgrade_patches: u64,
    pub unstick_patches: u64,
    pub started_at: Instant,
    pub last_observed_points: Option<u64>,
    pub active: bool,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl RunStats {
    #[must_use]
    pub fn new(started_at: Instant) -> Self {
        Self {
            total_clicks: 0,
            level_rewards_claimed: 0,
            lootboxes_collected: 0,
            weeds_removed: 0,
            lawnmowers_avoided: 0,
            purchases: 0,
            upgrade_patches: 0,
            unstick_patches: 0,
            started_at,
            last_observed_points: None,
            active: false,
        }
    }

    /// Zero every counter and restart the clock.
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    #[must_use]
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    pub fn record(&mut self, action: MaintenanceAction) {
        let counter = match action {
            MaintenanceAction::CollectReward => &mut self.level_rewards_claimed,
            MaintenanceAction::CollectLootbox => &mut self.lootboxes_collected,
            MaintenanceAction::RemoveWeed => &mut self.weeds_removed,
            MaintenanceAction::AvoidHazard => &mut self.lawnmowers_avoided,
        };
        *counter += 1;
    }

    /// Clicks per second over the run, rounded.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn clicks_per_second(&self, now: Instant) -> f64 {
        let secs = self.elapsed(now).as_secs_f64();
        if secs <= 0.0 {
            0.0
        } else {
            (self.total_clicks as f64 / secs).round()
        }
    }
}
