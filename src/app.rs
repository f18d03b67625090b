use crate::commands;
use crate::http::HydroServerClient;
use crate::notifications::DesktopNotifier;
use crate::session::SessionManager;
use crate::settings::SettingsStore;
use crate::state::{spawn_status_events, AppState, PersistentTokenStore};
use crate::windows::{self, WebviewNavigator};
use std::sync::Arc;
use tauri::Manager;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new("hydroserver_lib=info"));
  let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn run() {
  init_tracing();

  tauri::Builder::default()
    .plugin(tauri_plugin_store::Builder::default().build())
    .plugin(tauri_plugin_notification::init())
    .invoke_handler(tauri::generate_handler![
      commands::auth_login,
      commands::auth_logout,
      commands::auth_status,
      commands::api_request,
    ])
    .setup(|app| {
      let app_handle = app.handle().clone();
      let settings = SettingsStore::new(&app_handle)?;

      let base_url = settings.api_base_url();
      let client = HydroServerClient::new(&base_url, settings.request_timeout())?;
      info!(%base_url, "using HydroServer API");

      let session_config = settings.session_config();
      let token_store = PersistentTokenStore::new(settings);
      if !token_store.is_available() {
        warn!("OS keychain/secret service is unavailable; sessions will not survive restarts");
      }

      let session = Arc::new(SessionManager::new(
        session_config,
        Arc::new(client),
        Arc::new(token_store),
        Arc::new(WebviewNavigator::new(app_handle.clone())),
        Arc::new(DesktopNotifier::new(app_handle.clone())),
      ));

      spawn_status_events(app_handle.clone(), session.subscribe());
      if let Err(e) = tauri::async_runtime::block_on(session.restore()) {
        warn!(error = %e, "could not restore persisted session");
      }

      app.manage(AppState::new(session));
      windows::open_main_window(&app_handle)?;
      Ok(())
    })
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
