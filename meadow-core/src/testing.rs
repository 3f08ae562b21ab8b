//! In-memory stand-ins for the browser: a scripted surface and a scheduler
//! that records registrations. Public so the integration tests under
//! `tests/` can drive a [`Bot`](crate::Bot) without a browser; the bot
//! binary never uses them.
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::bot::{Scheduler, TaskKind};
use crate::offer::OfferKind;
use crate::surface::{Query, RawOffer, Surface, SurfaceError, Target, Transient};

#[derive(Debug, Default)]
pub struct FakeState {
    pub points: Option<String>,
    pub points_per_second: Option<String>,
    pub purchase_offers: Vec<RawOffer>,
    pub upgrade_offers: Vec<RawOffer>,
    pub transients: HashMap<Transient, usize>,
    pub clicks: Vec<Target>,
    pub main_missing: bool,
    pub failing: bool,
}

/// Scripted [`Surface`]. Clicking a transient consumes it.
#[derive(Debug, Default)]
pub struct FakeSurface {
    state: Mutex<FakeState>,
}

impl FakeSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_points(&self, text: &str) {
        self.state().points = Some(text.to_string());
    }

    pub fn set_offers(&self, kind: OfferKind, offers: Vec<RawOffer>) {
        let mut state = self.state();
        match kind {
            OfferKind::Purchase => state.purchase_offers = offers,
            OfferKind::Upgrade => state.upgrade_offers = offers,
        }
    }

    pub fn set_transient(&self, kind: Transient, count: usize) {
        self.state().transients.insert(kind, count);
    }

    #[must_use]
    pub fn clicks(&self) -> Vec<Target> {
        self.state().clicks.clone()
    }

    pub fn clear_clicks(&self) {
        self.state().clicks.clear();
    }

    /// Make every call fail as a broken backend would.
    pub fn set_failing(&self, failing: bool) {
        self.state().failing = failing;
    }

    fn check(&self) -> Result<(), SurfaceError> {
        if self.state().failing {
            Err(SurfaceError::Backend("session lost".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Surface for FakeSurface {
    async fn text(&self, query: Query) -> Result<Option<String>, SurfaceError> {
        self.check()?;
        let state = self.state();
        Ok(match query {
            Query::Points => state.points.clone(),
            Query::PointsPerSecond => state.points_per_second.clone(),
        })
    }

    async fn offers(&self, kind: OfferKind) -> Result<Vec<RawOffer>, SurfaceError> {
        self.check()?;
        let state = self.state();
        Ok(match kind {
            OfferKind::Purchase => state.purchase_offers.clone(),
            OfferKind::Upgrade => state.upgrade_offers.clone(),
        })
    }

    async fn count(&self, kind: Transient) -> Result<usize, SurfaceError> {
        self.check()?;
        Ok(self.state().transients.get(&kind).copied().unwrap_or(0))
    }

    async fn click(&self, target: Target) -> Result<bool, SurfaceError> {
        self.check()?;
        let mut state = self.state();
        let clicked = match target {
            Target::Main => !state.main_missing,
            Target::Offer { kind, id } => {
                let offers = match kind {
                    OfferKind::Purchase => &state.purchase_offers,
                    OfferKind::Upgrade => &state.upgrade_offers,
                };
                usize::try_from(id.0).is_ok_and(|index| index < offers.len())
            }
            Target::Transient { kind, index } => match state.transients.get_mut(&kind) {
                Some(count) if index < *count => {
                    *count -= 1;
                    true
                }
                _ => false,
            },
        };
        if clicked {
            state.clicks.push(target);
        }
        Ok(clicked)
    }
}

/// [`Scheduler`] that only records what was asked of it.
#[derive(Debug, Default, Clone)]
pub struct RecordingScheduler {
    pub active: HashMap<TaskKind, Duration>,
    pub registrations: Vec<(TaskKind, Duration)>,
    pub cancellations: Vec<TaskKind>,
}

impl Scheduler for RecordingScheduler {
    fn register(&mut self, task: TaskKind, period: Duration) {
        self.active.insert(task, period);
        self.registrations.push((task, period));
    }

    fn cancel(&mut self, task: TaskKind) {
        self.active.remove(&task);
        self.cancellations.push(task);
    }
}
