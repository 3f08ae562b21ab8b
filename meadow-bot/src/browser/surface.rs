//! [`Surface`] over a live WebDriver session.
use async_trait::async_trait;
use thirtyfour::prelude::*;

use meadow_core::{OfferKind, Query, RawOffer, Surface, SurfaceError, Target, Transient};

use super::selectors::Selectors;

fn backend(err: WebDriverError) -> SurfaceError {
    SurfaceError::Backend(err.to_string())
}

pub struct DomSurface<'a> {
    driver: &'a WebDriver,
    selectors: Selectors,
}

impl<'a> DomSurface<'a> {
    pub fn new(driver: &'a WebDriver, selectors: Selectors) -> Self {
        Self { driver, selectors }
    }

    async fn find_all(&self, css: &str) -> Result<Vec<WebElement>, SurfaceError> {
        self.driver.find_all(By::Css(css)).await.map_err(backend)
    }

    async fn read_offer(&self, index: usize, element: &WebElement) -> Result<RawOffer, SurfaceError> {
        let label = element
            .attr(self.selectors.offer_label_attribute.as_str())
            .await
            .map_err(backend)?
            .unwrap_or_else(|| format!("Item {index}"));
        let cost_text = match element
            .find_all(By::Css(self.selectors.offer_cost.as_str()))
            .await
            .map_err(backend)?
            .first()
        {
            Some(cost) => Some(cost.text().await.map_err(backend)?),
            None => None,
        };
        let class_attr = element.class_name().await.map_err(backend)?;
        Ok(RawOffer {
            label,
            cost_text,
            enabled: !self.selectors.is_disabled(class_attr.as_deref()),
        })
    }

    async fn click_nth(&self, css: &str, index: usize) -> Result<bool, SurfaceError> {
        let elements = self.find_all(css).await?;
        match elements.get(index) {
            Some(element) => {
                element.click().await.map_err(backend)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl Surface for DomSurface<'_> {
    async fn text(&self, query: Query) -> Result<Option<String>, SurfaceError> {
        let elements = self.find_all(self.selectors.query(query)).await?;
        match elements.first() {
            Some(element) => Ok(Some(element.text().await.map_err(backend)?)),
            None => Ok(None),
        }
    }

    async fn offers(&self, kind: OfferKind) -> Result<Vec<RawOffer>, SurfaceError> {
        let elements = self.find_all(self.selectors.offers(kind)).await?;
        let mut offers = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            offers.push(self.read_offer(index, element).await?);
        }
        Ok(offers)
    }

    async fn count(&self, kind: Transient) -> Result<usize, SurfaceError> {
        Ok(self.find_all(self.selectors.transient(kind)).await?.len())
    }

    async fn click(&self, target: Target) -> Result<bool, SurfaceError> {
        match target {
            Target::Main => self.click_nth(self.selectors.main_target.as_str(), 0).await,
            Target::Offer { kind, id } => match usize::try_from(id.0) {
                Ok(index) => self.click_nth(self.selectors.offers(kind), index).await,
                Err(_) => Ok(false),
            },
            Target::Transient { kind, index } => {
                self.click_nth(self.selectors.transient(kind), index).await
            }
        }
    }
}
