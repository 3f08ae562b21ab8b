//! Purchase decision policy: at most one buy per decision tick.
use std::fmt;

use crate::config::BotConfig;
use crate::offer::{Offer, OfferKind};

/// Why an offer was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseReason {
    FinalItem,
    Upgrade,
    Priority(u32),
    BestValue,
}

impl fmt::Display for PurchaseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseReason::FinalItem => f.write_str("final item"),
            PurchaseReason::Upgrade => f.write_str("upgrade"),
            PurchaseReason::Priority(id) => write!(f, "priority #{id}"),
            PurchaseReason::BestValue => f.write_str("best value"),
        }
    }
}

/// Decision returned by [`decide`].
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseDecision {
    pub offer: Offer,
    pub reason: PurchaseReason,
}

impl PurchaseDecision {
    #[must_use]
    pub fn new(offer: &Offer, reason: PurchaseReason) -> Self {
        Self {
            offer: offer.clone(),
            reason,
        }
    }

    #[must_use]
    pub fn rationale(&self) -> String {
        format!(
            "{}: {} (efficiency {:.4})",
            self.reason, self.offer, self.offer.efficiency
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PolicyOutcome {
    Buy(PurchaseDecision),
    /// The final offer is enabled but not yet affordable; spend nothing.
    HoldForFinal { cost: u64, shortfall: u64 },
    Idle,
}

impl PolicyOutcome {
    #[must_use]
    pub fn decision(&self) -> Option<&PurchaseDecision> {
        match self {
            PolicyOutcome::Buy(decision) => Some(decision),
            _ => None,
        }
    }
}

/// Pick the single action for this tick.
///
/// Order: final item (finish mode), hold for final, best affordable upgrade,
/// configured priorities, best remaining value. Every step except the final
/// item keeps `points_reserve` unspent. The final offer is only ever bought
/// through finish mode.
#[must_use]
pub fn decide(
    points: u64,
    offers: &[Offer],
    config: &BotConfig,
    final_available: bool,
) -> PolicyOutcome {
    if config.finish_game && final_available {
        let final_offer = offers
            .iter()
            .find(|offer| offer.is_final && offer.kind == OfferKind::Purchase && offer.enabled);
        if let Some(offer) = final_offer {
            if offer.affordable(points) {
                return PolicyOutcome::Buy(PurchaseDecision::new(offer, PurchaseReason::FinalItem));
            }
            return PolicyOutcome::HoldForFinal {
                cost: offer.cost,
                shortfall: offer.cost - points,
            };
        }
    }

    let reserve = config.points_reserve;
    let eligible =
        |offer: &&Offer| offer.enabled && !offer.is_final && offer.affordable_with_reserve(points, reserve);

    let upgrades = offers
        .iter()
        .filter(eligible)
        .filter(|offer| offer.kind == OfferKind::Upgrade);
    if let Some(offer) = most_efficient(upgrades) {
        return PolicyOutcome::Buy(PurchaseDecision::new(offer, PurchaseReason::Upgrade));
    }

    for &priority in &config.priority_items {
        if config.restricted() && config.is_excluded(priority) {
            continue;
        }
        let matches = offers
            .iter()
            .filter(eligible)
            .filter(|offer| offer.kind == OfferKind::Purchase && offer.id.0 == priority);
        if let Some(offer) = most_efficient(matches) {
            return PolicyOutcome::Buy(PurchaseDecision::new(
                offer,
                PurchaseReason::Priority(priority),
            ));
        }
    }

    let remaining = offers
        .iter()
        .filter(eligible)
        .filter(|offer| !(offer.kind == OfferKind::Purchase && config.is_excluded(offer.id.0)));
    match most_efficient(remaining) {
        Some(offer) => PolicyOutcome::Buy(PurchaseDecision::new(offer, PurchaseReason::BestValue)),
        None => PolicyOutcome::Idle,
    }
}

/// Highest efficiency; the earliest offer wins ties.
fn most_efficient<'o>(candidates: impl Iterator<Item = &'o Offer>) -> Option<&'o Offer> {
    candidates.fold(None, |best, offer| match best {
        Some(current) if current.efficiency >= offer.efficiency => Some(current),
        _ => Some(offer),
    })
}
