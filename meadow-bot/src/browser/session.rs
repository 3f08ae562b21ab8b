use std::time::Duration;
use thirtyfour::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BrowserKind {
    Chrome,
    Edge,
    Firefox,
    Safari,
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub headless: bool,
    /// Element lookups must not block: absent transients are the common case.
    pub implicit_wait_millis: u64,
    pub remote_hub: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            implicit_wait_millis: 0,
            remote_hub: None,
        }
    }
}

impl BrowserConfig {
    fn driver_url<'a>(&'a self, local: &'a str) -> &'a str {
        self.remote_hub.as_deref().unwrap_or(local)
    }
}

pub async fn new_session(kind: BrowserKind, cfg: &BrowserConfig) -> WebDriverResult<WebDriver> {
    let driver = match kind {
        BrowserKind::Chrome => {
            let mut caps = DesiredCapabilities::chrome();
            if cfg.headless {
                caps.set_headless()?;
            }
            WebDriver::new(cfg.driver_url("http://localhost:9515"), caps).await?
        }
        BrowserKind::Edge => {
            let mut caps = DesiredCapabilities::edge();
            if cfg.headless {
                caps.set_headless()?;
            }
            WebDriver::new(cfg.driver_url("http://localhost:17556"), caps).await?
        }
        BrowserKind::Firefox => {
            let mut caps = DesiredCapabilities::firefox();
            if cfg.headless {
                caps.set_headless()?;
            }
            WebDriver::new(cfg.driver_url("http://localhost:4444"), caps).await?
        }
        BrowserKind::Safari => {
            let caps = DesiredCapabilities::safari();
            WebDriver::new(cfg.driver_url("http://localhost:4445"), caps).await?
        }
    };

    driver
        .set_implicit_wait_timeout(Duration::from_millis(cfg.implicit_wait_millis))
        .await?;
    Ok(driver)
}
