use crate::session::SessionConfig;
use serde_json::json;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tauri::Runtime;
use tauri_plugin_store::{JsonValue, Store, StoreBuilder};

const SETTINGS_STORE_FILE: &str = "hydroserver-settings.json";

pub const KEY_API_BASE_URL: &str = "apiBaseUrl";
pub const KEY_SEND_REFRESH_HEADER: &str = "sendRefreshHeader";
pub const KEY_REQUEST_TIMEOUT_SECONDS: &str = "requestTimeoutSeconds";
pub const KEY_USER: &str = "user";

const DEV_API_BASE_URL: &str = "http://127.0.0.1:8000/api/";

pub fn default_api_base_url() -> String {
  if cfg!(debug_assertions) {
    return DEV_API_BASE_URL.to_string();
  }
  match option_env!("HYDROSERVER_PROXY_BASE_URL") {
    Some(proxy) => format!("{}/api/", proxy.trim_end_matches('/')),
    None => DEV_API_BASE_URL.to_string(),
  }
}

fn defaults() -> HashMap<String, JsonValue> {
  HashMap::from([
    (KEY_API_BASE_URL.to_string(), json!(default_api_base_url())),
    (KEY_SEND_REFRESH_HEADER.to_string(), json!(true)),
    (KEY_REQUEST_TIMEOUT_SECONDS.to_string(), json!(30)),
  ])
}

#[derive(Clone)]
pub struct SettingsStore<R: Runtime> {
  store: Arc<Store<R>>,
}

impl<R: Runtime> SettingsStore<R> {
  pub fn new(app: &tauri::AppHandle<R>) -> tauri_plugin_store::Result<Self> {
    let store = StoreBuilder::new(app, SETTINGS_STORE_FILE)
      .defaults(defaults())
      .auto_save(Duration::from_millis(200))
      .build()?;
    Ok(Self { store })
  }

  pub fn get_u64(&self, key: &str, fallback: u64) -> u64 {
    self
      .store
      .get(key)
      .and_then(|v| v.as_u64())
      .unwrap_or(fallback)
  }

  pub fn get_bool(&self, key: &str, fallback: bool) -> bool {
    self
      .store
      .get(key)
      .and_then(|v| v.as_bool())
      .unwrap_or(fallback)
  }

  pub fn get_string(&self, key: &str) -> Option<String> {
    let v = self.store.get(key)?;
    let s = v.as_str()?.trim();
    if s.is_empty() {
      None
    } else {
      Some(s.to_string())
    }
  }

  pub fn get_json(&self, key: &str) -> Option<JsonValue> {
    self.store.get(key).filter(|v| !v.is_null())
  }

  pub fn set(&self, key: &str, value: impl Into<JsonValue>) {
    self.store.set(key.to_string(), value.into());
  }

  pub fn remove(&self, key: &str) {
    let _ = self.store.delete(key.to_string());
  }

  pub fn api_base_url(&self) -> String {
    self
      .get_string(KEY_API_BASE_URL)
      .unwrap_or_else(default_api_base_url)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.get_u64(KEY_REQUEST_TIMEOUT_SECONDS, 30).max(1))
  }

  pub fn session_config(&self) -> SessionConfig {
    SessionConfig {
      send_refresh_header: self.get_bool(KEY_SEND_REFRESH_HEADER, true),
      ..SessionConfig::default()
    }
  }
}
