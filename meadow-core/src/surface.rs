//! Queryable, clickable game surface and the reader that turns it into offers.
use async_trait::async_trait;
use thiserror::Error;

use crate::config::BotConfig;
use crate::mirror::GameStateSummary;
use crate::offer::{Offer, OfferId, OfferKind, UPGRADE_EFFICIENCY, efficiency, parse_count, parse_rate};

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface backend error: {0}")]
    Backend(String),
}

/// Single-valued text elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Points,
    PointsPerSecond,
}

/// Elements that come and go while the game runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transient {
    Reward,
    Lootbox,
    Weed,
    Hazard,
}

impl Transient {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Transient::Reward => "level reward",
            Transient::Lootbox => "lootbox",
            Transient::Weed => "weed",
            Transient::Hazard => "lawnmower",
        }
    }
}

/// Something the bot can click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The main point-generating button.
    Main,
    Offer { kind: OfferKind, id: OfferId },
    Transient { kind: Transient, index: usize },
}

/// One offer element as scanned, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOffer {
    pub label: String,
    pub cost_text: Option<String>,
    pub enabled: bool,
}

impl RawOffer {
    pub fn new(label: impl Into<String>, cost_text: impl Into<String>, enabled: bool) -> Self {
        Self {
            label: label.into(),
            cost_text: Some(cost_text.into()),
            enabled,
        }
    }
}

/// The rendered game.
///
/// Missing elements are normal: queries return `None`, empty lists or zero.
/// Errors are reserved for a failing backend.
#[async_trait]
pub trait Surface {
    async fn text(&self, query: Query) -> Result<Option<String>, SurfaceError>;

    /// Offer elements of one kind, in document order.
    async fn offers(&self, kind: OfferKind) -> Result<Vec<RawOffer>, SurfaceError>;

    async fn count(&self, kind: Transient) -> Result<usize, SurfaceError>;

    /// Click a target. `Ok(false)` when it is not present.
    async fn click(&self, target: Target) -> Result<bool, SurfaceError>;
}

/// Reads points and offers from a [`Surface`].
pub struct SurfaceReader<'a, S: ?Sized> {
    surface: &'a S,
}

impl<'a, S: Surface + ?Sized> SurfaceReader<'a, S> {
    pub fn new(surface: &'a S) -> Self {
        Self { surface }
    }

    /// Visible point total; 0 when absent or unparseable.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn visible_points(&self) -> Result<u64, SurfaceError> {
        let text = self.surface.text(Query::Points).await?;
        Ok(text.as_deref().and_then(parse_count).unwrap_or(0))
    }

    /// Displayed points per second, when the element is present and parseable.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn points_per_second(&self) -> Result<Option<f64>, SurfaceError> {
        let text = self.surface.text(Query::PointsPerSecond).await?;
        Ok(text.as_deref().and_then(parse_rate))
    }

    /// Purchase offers followed by upgrade offers, each in scan order.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn offers(
        &self,
        summary: Option<&GameStateSummary>,
        config: &BotConfig,
    ) -> Result<Vec<Offer>, SurfaceError> {
        let mut offers = Vec::new();
        for kind in [OfferKind::Purchase, OfferKind::Upgrade] {
            let raw = self.surface.offers(kind).await?;
            offers.extend(interpret_offers(kind, &raw, summary, config));
        }
        Ok(offers)
    }

    /// Whether the final offer is on the shop surface and enabled.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn final_offer_available(&self, config: &BotConfig) -> Result<bool, SurfaceError> {
        let raw = self.surface.offers(OfferKind::Purchase).await?;
        Ok(raw
            .iter()
            .any(|offer| offer.enabled && is_final_label(&offer.label, config)))
    }

    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn present(&self, kind: Transient) -> Result<bool, SurfaceError> {
        Ok(self.surface.count(kind).await? > 0)
    }
}

fn is_final_label(label: &str, config: &BotConfig) -> bool {
    !config.final_item_label.is_empty() && label.contains(&config.final_item_label)
}

/// Turn scanned elements into offers; elements without a parseable cost are skipped
/// but still consume their index.
#[must_use]
pub fn interpret_offers(
    kind: OfferKind,
    raw: &[RawOffer],
    summary: Option<&GameStateSummary>,
    config: &BotConfig,
) -> Vec<Offer> {
    raw.iter()
        .enumerate()
        .filter_map(|(index, element)| {
            let cost = element.cost_text.as_deref().and_then(parse_count)?;
            let id = OfferId(u32::try_from(index).ok()?);
            let efficiency = match kind {
                OfferKind::Upgrade => UPGRADE_EFFICIENCY,
                OfferKind::Purchase => efficiency(
                    summary.and_then(|s| s.contribution(&id.0.to_string())),
                    cost,
                ),
            };
            Some(Offer {
                id,
                kind,
                label: element.label.clone(),
                cost,
                enabled: element.enabled,
                is_final: kind == OfferKind::Purchase && is_final_label(&element.label, config),
                efficiency,
            })
        })
        .collect()
}
