//! Status aggregates, stuck detection and the sink reports are written to.
use std::time::Duration;

use crate::offer::Offer;

/// `"{h}h {m}m {s}s"`.
#[must_use]
pub fn format_runtime(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours}h {minutes}m {seconds}s")
}

/// Where the final offer stands.
#[derive(Debug, Clone, PartialEq)]
pub enum FinalStatus {
    NotSeen,
    Affordable { cost: u64 },
    Saving { cost: u64, eta: Option<Duration> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub runtime: Duration,
    pub points: u64,
    pub points_per_second: f64,
    pub total_clicks: u64,
    pub clicks_per_second: f64,
    pub level_rewards_claimed: u64,
    pub lootboxes_collected: u64,
    pub weeds_removed: u64,
    pub lawnmowers_avoided: u64,
    pub purchases: u64,
    pub offers_enabled: usize,
    pub offers_total: usize,
    pub next_purchase: Option<Offer>,
    pub final_status: FinalStatus,
    pub current_level: u32,
    pub active_flags: Vec<&'static str>,
}

impl StatusReport {
    #[must_use]
    pub fn runtime_label(&self) -> String {
        format_runtime(self.runtime)
    }
}

/// Totals printed when the bot stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalSummary {
    pub runtime: Duration,
    pub total_clicks: u64,
    pub purchases: u64,
    pub level_rewards_claimed: u64,
    pub lootboxes_collected: u64,
    pub weeds_removed: u64,
    pub lawnmowers_avoided: u64,
    pub upgrade_patches: u64,
    pub unstick_patches: u64,
}

/// Cheapest enabled offer, if any.
#[must_use]
pub fn next_purchase(offers: &[Offer]) -> Option<Offer> {
    offers
        .iter()
        .filter(|offer| offer.enabled && !offer.is_final)
        .min_by_key(|offer| offer.cost)
        .cloned()
}

/// Time to afford the final offer at the current rate.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn final_status(offers: &[Offer], points: u64, points_per_second: f64) -> FinalStatus {
    let Some(offer) = offers.iter().find(|offer| offer.is_final) else {
        return FinalStatus::NotSeen;
    };
    if offer.affordable(points) {
        return FinalStatus::Affordable { cost: offer.cost };
    }
    let missing = (offer.cost - points) as f64;
    let eta = (points_per_second > 0.0)
        .then(|| Duration::try_from_secs_f64(missing / points_per_second).ok())
        .flatten();
    FinalStatus::Saving {
        cost: offer.cost,
        eta,
    }
}

/// Declares the game stuck when two consecutive reports see the same
/// non-zero point total after a minimum runtime.
#[derive(Debug, Clone)]
pub struct StuckDetector {
    min_elapsed: Duration,
    last_points: Option<u64>,
}

impl StuckDetector {
    #[must_use]
    pub fn new(min_elapsed: Duration) -> Self {
        Self {
            min_elapsed,
            last_points: None,
        }
    }

    /// Record this report's points; true when the game looks stuck.
    pub fn observe(&mut self, points: u64, elapsed: Duration) -> bool {
        let stuck = self.last_points == Some(points) && points != 0 && elapsed >= self.min_elapsed;
        self.last_points = Some(points);
        stuck
    }
}

/// Receives everything the bot reports to its operator.
pub trait ReportSink {
    fn status(&mut self, report: &StatusReport);

    fn summary(&mut self, summary: &FinalSummary);

    /// Operator-facing messages such as rejected input or toggled options.
    fn notice(&mut self, message: &str);
}

/// Sink that keeps everything in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub reports: Vec<StatusReport>,
    pub summaries: Vec<FinalSummary>,
    pub notices: Vec<String>,
}

impl ReportSink for RecordingSink {
    fn status(&mut self, report: &StatusReport) {
        self.reports.push(report.clone());
    }

    fn summary(&mut self, summary: &FinalSummary) {
        self.summaries.push(summary.clone());
    }

    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
