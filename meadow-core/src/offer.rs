//! Purchasable and upgradeable offers as seen on the shop surface.
use std::fmt;

/// Efficiency assigned to upgrade offers so they outrank normal purchases.
pub const UPGRADE_EFFICIENCY: f64 = 1.0e9;

/// Stable numeric identity of an offer: its scan index on its own surface.
///
/// Purchase offer ids double as the store's item ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OfferId(pub u32);

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OfferKind {
    Purchase,
    Upgrade,
}

impl OfferKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            OfferKind::Purchase => "item",
            OfferKind::Upgrade => "upgrade",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub id: OfferId,
    pub kind: OfferKind,
    pub label: String,
    pub cost: u64,
    pub enabled: bool,
    pub is_final: bool,
    pub efficiency: f64,
}

impl Offer {
    /// Affordable without keeping any reserve.
    #[must_use]
    pub fn affordable(&self, points: u64) -> bool {
        self.cost <= points
    }

    /// Affordable while still leaving `reserve` points unspent.
    #[must_use]
    pub fn affordable_with_reserve(&self, points: u64, reserve: u64) -> bool {
        self.cost
            .checked_add(reserve)
            .is_some_and(|needed| points >= needed)
    }

    /// Item id in the store document this offer corresponds to.
    #[must_use]
    pub fn item_id(&self) -> String {
        self.id.0.to_string()
    }
}

impl fmt::Display for Offer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({} points)",
            self.kind.label(),
            self.id,
            self.label,
            self.cost
        )
    }
}

/// Value per point spent. Unknown contributions count as 1.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn efficiency(contribution: Option<f64>, cost: u64) -> f64 {
    contribution.unwrap_or(1.0) / cost.max(1) as f64
}

fn is_separator(c: char) -> bool {
    matches!(c, ',' | '.' | '\'' | '_' | ' ' | '\u{a0}' | '\u{202f}')
}

/// Parse a displayed integer such as `"1,250"` or `"12 400 points"`.
///
/// Thousands separators are dropped and the leading digits are read;
/// text without leading digits yields `None`.
#[must_use]
pub fn parse_count(text: &str) -> Option<u64> {
    let digits: String = text
        .trim()
        .chars()
        .filter(|c| !is_separator(*c))
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// Parse a displayed rate such as `"12.5/s"` or `"1,204.2 per second"`.
#[must_use]
pub fn parse_rate(text: &str) -> Option<f64> {
    let number: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != ',')
        .collect();
    number.parse().ok()
}
