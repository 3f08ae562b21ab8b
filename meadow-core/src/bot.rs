//! Orchestrator: lifecycle of the four periodic tasks and what each tick does.
use std::fmt;
use std::time::{Duration, Instant};

use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;

use crate::config::BotConfig;
use crate::maintenance::{
    self, HazardWatch, MaintenanceAction, avoid_hazard, log_action, run_maintenance,
};
use crate::mirror::StateMirror;
use crate::patcher::StatePatcher;
use crate::policy::{self, PolicyOutcome, PurchaseDecision};
use crate::report::{
    FinalSummary, ReportSink, StatusReport, StuckDetector, final_status, next_purchase,
};
use crate::stats::RunStats;
use crate::store::{GameStore, KeyValueStore, StoreError};
use crate::surface::{Surface, SurfaceError, SurfaceReader, Target};

/// The bot's independent periodic tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Click,
    /// Weeds, lawnmowers and final-offer availability on a fast cadence.
    Scan,
    /// Maintenance, purchase policy and the upgrade chance.
    Decision,
    Status,
}

impl TaskKind {
    pub const ALL: [TaskKind; 4] = [
        TaskKind::Click,
        TaskKind::Scan,
        TaskKind::Decision,
        TaskKind::Status,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TaskKind::Click => "click",
            TaskKind::Scan => "scan",
            TaskKind::Decision => "decision",
            TaskKind::Status => "status",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Host primitive that fires registered tasks every `period`.
///
/// Cancelling takes effect before the next firing; a firing already in
/// progress is not interrupted.
pub trait Scheduler {
    fn register(&mut self, task: TaskKind, period: Duration);

    fn cancel(&mut self, task: TaskKind);

    fn cancel_all(&mut self) {
        for task in TaskKind::ALL {
            self.cancel(task);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotState {
    Stopped,
    Running,
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a decision tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    Maintenance(MaintenanceAction),
    Purchased(PurchaseDecision),
    HeldForFinal,
    Idle,
}

/// The bot context: configuration, run counters and mirrored state, passed
/// to every task firing by `&mut self`.
pub struct Bot<S, K, W> {
    surface: S,
    store: GameStore<K>,
    mirror: StateMirror,
    config: BotConfig,
    stats: RunStats,
    stuck: StuckDetector,
    hazards: HazardWatch,
    final_available: bool,
    patcher: StatePatcher,
    rng: ChaCha20Rng,
    sink: W,
    state: BotState,
}

impl<S, K, W> Bot<S, K, W>
where
    S: Surface,
    K: KeyValueStore,
    W: ReportSink,
{
    pub fn new(surface: S, store: K, config: BotConfig, sink: W, seed: u64) -> Self {
        let mirror = StateMirror::new(config.level_item_id.clone());
        let stuck = StuckDetector::new(config.stuck_threshold());
        Self {
            surface,
            store: GameStore::new(store),
            mirror,
            config,
            stats: RunStats::default(),
            stuck,
            hazards: HazardWatch::default(),
            final_available: false,
            patcher: StatePatcher,
            rng: ChaCha20Rng::seed_from_u64(seed),
            sink,
            state: BotState::Stopped,
        }
    }

    pub fn state(&self) -> BotState {
        self.state
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn mirror(&self) -> &StateMirror {
        &self.mirror
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn store(&self) -> &GameStore<K> {
        &self.store
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn final_available(&self) -> bool {
        self.final_available
    }

    /// Reset the run and register all four tasks. Starting while running
    /// restarts from a clean reset.
    pub async fn start(&mut self, scheduler: &mut impl Scheduler) {
        if self.state == BotState::Running {
            info!("Restarting bot");
        }
        info!("🤖 The Last Meadow Bot starting...");
        self.stats.reset(Instant::now());
        self.stats.active = true;
        self.stuck = StuckDetector::new(self.config.stuck_threshold());
        self.hazards = HazardWatch::default();
        self.final_available = false;

        // Writes queued while stopped are stale once the current value loads.
        if let Err(err) = self.store.discard_pending().await {
            warn!("could not drain store writes: {err}");
        }
        match self.store.refresh(&mut self.mirror).await {
            Ok(true) => info!("✅ Initial state loaded"),
            Ok(false) => info!("No initial game state found"),
            Err(err) => warn!("❌ Error loading initial state: {err}"),
        }

        scheduler.cancel_all();
        scheduler.register(TaskKind::Click, self.config.click_period());
        scheduler.register(TaskKind::Scan, self.config.scan_period());
        scheduler.register(TaskKind::Decision, self.config.purchase_period());
        scheduler.register(TaskKind::Status, self.config.status_period());
        self.state = BotState::Running;

        self.on_tick(TaskKind::Status).await;
    }

    /// Cancel every task and emit the final summary.
    pub fn stop(&mut self, scheduler: &mut impl Scheduler) {
        if self.state == BotState::Stopped {
            self.sink.notice("Bot is not running");
            return;
        }
        scheduler.cancel_all();
        self.state = BotState::Stopped;
        self.stats.active = false;
        info!("🛑 Bot stopped");
        let summary = self.summary(Instant::now());
        self.sink.summary(&summary);
    }

    /// Apply a new click interval from operator text, re-registering only
    /// the click task when running. Returns whether it was accepted.
    pub fn set_click_interval(&mut self, raw: &str, scheduler: &mut impl Scheduler) -> bool {
        match self.config.set_click_interval(raw) {
            Ok(period) => {
                if self.state == BotState::Running {
                    scheduler.cancel(TaskKind::Click);
                    scheduler.register(TaskKind::Click, period);
                }
                self.sink
                    .notice(&format!("Click interval set to {}ms", self.config.click_interval));
                true
            }
            Err(err) => {
                self.sink.notice(&format!("❌ {err}"));
                false
            }
        }
    }

    /// Flip a named boolean option. Unknown names are reported, not fatal.
    pub fn toggle_option(&mut self, name: &str) -> Option<bool> {
        match self.config.toggle(name) {
            Ok(value) => {
                let state = if value { "enabled" } else { "disabled" };
                self.sink.notice(&format!("{name} {state}"));
                Some(value)
            }
            Err(err) => {
                self.sink.notice(&format!(
                    "❌ {err} (known options: {})",
                    BotConfig::boolean_options().join(", ")
                ));
                None
            }
        }
    }

    pub fn toggle_upgrade_auto(&mut self) -> bool {
        self.toggle_option("autoUpgrade")
            .unwrap_or(self.config.auto_upgrade)
    }

    /// Force a status report.
    pub async fn status(&mut self) {
        if let Err(err) = self.status_tick().await {
            warn!("status report failed: {err}");
        }
    }

    /// Run the upgrade patch once, regardless of the chance policy.
    pub async fn upgrade_now(&mut self) -> bool {
        match self
            .patcher
            .upgrade(&self.store, &mut self.mirror, &self.config.focus_items)
            .await
        {
            Ok(report) if report.changed() => {
                self.stats.upgrade_patches += 1;
                true
            }
            Ok(_) => false,
            Err(err) => {
                warn!("❌ Error upgrading items: {err}");
                false
            }
        }
    }

    /// Handle one firing. Failures are logged and the tick does nothing.
    pub async fn on_tick(&mut self, task: TaskKind) {
        if self.state == BotState::Stopped {
            return;
        }
        let result = match task {
            TaskKind::Click => self.click_tick().await.map(drop),
            TaskKind::Scan => self.scan_tick().await,
            TaskKind::Decision => self.decision_tick().await.map(drop),
            TaskKind::Status => self.status_tick().await.map(drop),
        };
        if let Err(err) = result {
            warn!("{task} tick skipped: {err}");
        }
    }

    /// Click the main target once.
    ///
    /// # Errors
    ///
    /// Propagates surface failures.
    pub async fn click_tick(&mut self) -> Result<bool, BotError> {
        let clicked = self.surface.click(Target::Main).await?;
        if clicked {
            self.stats.total_clicks += 1;
        }
        Ok(clicked)
    }

    /// Fast scan: weeds, lawnmowers, final-offer availability.
    ///
    /// # Errors
    ///
    /// Propagates surface and store failures.
    pub async fn scan_tick(&mut self) -> Result<(), BotError> {
        self.store.sync(&mut self.mirror).await?;
        maintenance::perform(
            MaintenanceAction::RemoveWeed,
            &self.surface,
            &self.config,
            &mut self.stats,
        )
        .await?;
        avoid_hazard(
            &self.surface,
            &self.config,
            &mut self.stats,
            &mut self.hazards,
        )
        .await?;
        let available = SurfaceReader::new(&self.surface)
            .final_offer_available(&self.config)
            .await?;
        if available && !self.final_available {
            info!("🏁 Final offer available");
        }
        self.final_available = available;
        Ok(())
    }

    /// Maintenance first; the purchase policy only when nothing fired.
    /// The upgrade chance is rolled afterwards either way.
    ///
    /// # Errors
    ///
    /// Propagates surface and store failures.
    pub async fn decision_tick(&mut self) -> Result<DecisionOutcome, BotError> {
        self.store.sync(&mut self.mirror).await?;
        let outcome = match run_maintenance(&self.surface, &self.config, &mut self.stats).await? {
            Some(action) => DecisionOutcome::Maintenance(action),
            None => self.purchase().await?,
        };
        self.maybe_upgrade().await;
        Ok(outcome)
    }

    async fn purchase(&mut self) -> Result<DecisionOutcome, BotError> {
        let reader = SurfaceReader::new(&self.surface);
        let points = reader.visible_points().await?;
        let offers = reader.offers(self.mirror.summary(), &self.config).await?;
        match policy::decide(points, &offers, &self.config, self.final_available) {
            PolicyOutcome::Buy(decision) => {
                let target = Target::Offer {
                    kind: decision.offer.kind,
                    id: decision.offer.id,
                };
                if !self.surface.click(target).await? {
                    return Ok(DecisionOutcome::Idle);
                }
                self.stats.purchases += 1;
                log_action(&self.config, &format!("🛒 Buying {}", decision.rationale()));
                Ok(DecisionOutcome::Purchased(decision))
            }
            PolicyOutcome::HoldForFinal { cost, shortfall } => {
                log_action(
                    &self.config,
                    &format!("Saving for final offer ({cost} points, {shortfall} short)"),
                );
                Ok(DecisionOutcome::HeldForFinal)
            }
            PolicyOutcome::Idle => Ok(DecisionOutcome::Idle),
        }
    }

    /// Upgrade-chance policy: with `upgradeChance` per decision tick, run the
    /// upgrade patch when `autoUpgrade` is on.
    async fn maybe_upgrade(&mut self) -> bool {
        let chance = self.config.upgrade_chance;
        if !self.config.auto_upgrade || chance.is_nan() || chance <= 0.0 {
            return false;
        }
        if !self.rng.gen_bool(chance.min(1.0)) {
            return false;
        }
        self.upgrade_now().await
    }

    /// Build and emit a report; run the unstick patch when progress stalled.
    ///
    /// # Errors
    ///
    /// Propagates surface failures. A failing unstick patch is only logged.
    pub async fn status_tick(&mut self) -> Result<StatusReport, BotError> {
        let now = Instant::now();
        let reader = SurfaceReader::new(&self.surface);
        let points = reader.visible_points().await?;
        let displayed_rate = reader.points_per_second().await?;
        let offers = reader.offers(self.mirror.summary(), &self.config).await?;
        let summary = self.mirror.summary();
        let points_per_second = displayed_rate
            .or_else(|| summary.map(|s| s.points_per_second))
            .unwrap_or(0.0);

        let report = StatusReport {
            runtime: self.stats.elapsed(now),
            points,
            points_per_second,
            total_clicks: self.stats.total_clicks,
            clicks_per_second: self.stats.clicks_per_second(now),
            level_rewards_claimed: self.stats.level_rewards_claimed,
            lootboxes_collected: self.stats.lootboxes_collected,
            weeds_removed: self.stats.weeds_removed,
            lawnmowers_avoided: self.stats.lawnmowers_avoided,
            purchases: self.stats.purchases,
            offers_enabled: offers.iter().filter(|offer| offer.enabled).count(),
            offers_total: offers.len(),
            next_purchase: next_purchase(&offers),
            final_status: final_status(&offers, points, points_per_second),
            current_level: summary.map_or(0, |s| s.current_level),
            active_flags: self.config.active_flags(),
        };
        self.sink.status(&report);
        self.stats.last_observed_points = Some(points);

        // Forced reports while stopped must not patch the store.
        if self.state == BotState::Running && self.stuck.observe(points, report.runtime) {
            warn!("⚠️ Game appears stuck. Trying to resolve...");
            match self.patcher.unstick(&self.store, &mut self.mirror).await {
                Ok(_) => self.stats.unstick_patches += 1,
                Err(err) => warn!("❌ Error applying unstuck strategy: {err}"),
            }
        }
        Ok(report)
    }

    fn summary(&self, now: Instant) -> FinalSummary {
        FinalSummary {
            runtime: self.stats.elapsed(now),
            total_clicks: self.stats.total_clicks,
            purchases: self.stats.purchases,
            level_rewards_claimed: self.stats.level_rewards_claimed,
            lootboxes_collected: self.stats.lootboxes_collected,
            weeds_removed: self.stats.weeds_removed,
            lawnmowers_avoided: self.stats.lawnmowers_avoided,
            upgrade_patches: self.stats.upgrade_patches,
            unstick_patches: self.stats.unstick_patches,
        }
    }
}
