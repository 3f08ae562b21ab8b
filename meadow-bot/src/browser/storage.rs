//! [`KeyValueStore`] over the page's `localStorage`.
//!
//! The game writes its store whenever it likes. A hook on
//! `Storage.prototype.setItem` keeps the newest of those writes in page
//! memory so every tick can drain it before acting; writes made by the bot
//! itself bypass the hook. Each write replaces the whole document, so one
//! pending value per key is all the mirror needs.
use async_trait::async_trait;
use serde_json::Value;
use thirtyfour::prelude::*;

use meadow_core::{KeyValueStore, StoreError};

macro_rules! install_hook_js {
    () => {
        r#"
if (!window.__meadowBotHook) {
  window.__meadowBotHook = true;
  window.__meadowBotWrites = {};
  window.__meadowBotSelf = false;
  const setItem = Storage.prototype.setItem;
  Storage.prototype.setItem = function (key, value) {
    setItem.apply(this, arguments);
    if (this === window.localStorage && !window.__meadowBotSelf) {
      window.__meadowBotWrites[key] = [String(value)];
    }
  };
}
"#
    };
}

const INSTALL_HOOK: &str = concat!(install_hook_js!(), "return true;");

const GET_ITEM: &str = "return window.localStorage.getItem(arguments[0]);";

const SET_ITEM: &str = r"
window.__meadowBotSelf = true;
try {
  window.localStorage.setItem(arguments[0], arguments[1]);
} finally {
  window.__meadowBotSelf = false;
}
return true;";

// A reload drops the hook; reinstall before reading the queue.
const DRAIN_WRITES: &str = concat!(
    install_hook_js!(),
    r"
const queue = window.__meadowBotWrites[arguments[0]] || [];
delete window.__meadowBotWrites[arguments[0]];
return queue;"
);

fn backend(err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(err.to_string())
}

pub struct LocalStorageStore<'a> {
    driver: &'a WebDriver,
}

impl<'a> LocalStorageStore<'a> {
    pub fn new(driver: &'a WebDriver) -> Self {
        Self { driver }
    }

    pub async fn install_hook(&self) -> Result<(), StoreError> {
        self.driver
            .execute(INSTALL_HOOK, Vec::new())
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn run(&self, script: &str, args: Vec<Value>) -> Result<Value, StoreError> {
        let ret = self.driver.execute(script, args).await.map_err(backend)?;
        Ok(ret.json().clone())
    }
}

fn item_value(value: Value) -> Result<Option<String>, StoreError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        other => Err(backend(format!("unexpected storage value: {other}"))),
    }
}

fn queued_writes(value: Value) -> Result<Vec<String>, StoreError> {
    match value {
        Value::Null => Ok(Vec::new()),
        other => serde_json::from_value(other).map_err(backend),
    }
}

#[async_trait]
impl KeyValueStore for LocalStorageStore<'_> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        item_value(self.run(GET_ITEM, vec![key.into()]).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.run(SET_ITEM, vec![key.into(), value.into()]).await?;
        Ok(())
    }

    async fn drain_writes(&self, key: &str) -> Result<Vec<String>, StoreError> {
        queued_writes(self.run(DRAIN_WRITES, vec![key.into()]).await?)
    }
}
