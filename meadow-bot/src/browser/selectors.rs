use serde::{Deserialize, Serialize};

use meadow_core::{OfferKind, Query, Transient};

/// CSS hooks into the rendered game. The game ships hashed class names, so
/// every entry can be overridden from the `selectors` section of the config
/// file when a release renames them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Selectors {
    pub points: String,
    pub points_per_second: String,
    pub main_target: String,
    pub purchase_offer: String,
    pub upgrade_offer: String,
    /// Looked up inside an offer element.
    pub offer_cost: String,
    /// Attribute carrying the offer's display name.
    pub offer_label_attribute: String,
    /// Class name, not a selector.
    pub disabled_class: String,
    pub level_reward: String,
    pub lootbox: String,
    pub weed: String,
    pub lawnmower: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            points: ".pointsValue__7a0c3".to_string(),
            points_per_second: "[class*='pointsPerSecond']".to_string(),
            main_target: ".logo_cf3f70".to_string(),
            purchase_offer: ".item__4b373".to_string(),
            upgrade_offer: "[class*='upgradeItem']".to_string(),
            offer_cost: ".pointsInfo__4b373 .text__73a39".to_string(),
            offer_label_attribute: "aria-label".to_string(),
            disabled_class: "disabled_e9638b".to_string(),
            level_reward: "[class*='levelReward'] button".to_string(),
            lootbox: "[class*='lootbox']".to_string(),
            weed: "[class*='weed']".to_string(),
            lawnmower: "[class*='lawnmower']".to_string(),
        }
    }
}

impl Selectors {
    #[must_use]
    pub fn query(&self, query: Query) -> &str {
        match query {
            Query::Points => &self.points,
            Query::PointsPerSecond => &self.points_per_second,
        }
    }

    #[must_use]
    pub fn offers(&self, kind: OfferKind) -> &str {
        match kind {
            OfferKind::Purchase => &self.purchase_offer,
            OfferKind::Upgrade => &self.upgrade_offer,
        }
    }

    #[must_use]
    pub fn transient(&self, kind: Transient) -> &str {
        match kind {
            Transient::Reward => &self.level_reward,
            Transient::Lootbox => &self.lootbox,
            Transient::Weed => &self.weed,
            Transient::Hazard => &self.lawnmower,
        }
    }

    /// Whether a `class` attribute value marks the element disabled.
    #[must_use]
    pub fn is_disabled(&self, class_attr: Option<&str>) -> bool {
        class_attr.is_some_and(|classes| {
            classes
                .split_whitespace()
                .any(|class| class == self.disabled_class)
        })
    }
}
