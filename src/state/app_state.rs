use crate::session::{SessionManager, SessionStatus};
use std::sync::Arc;
use tauri::{AppHandle, Emitter, EventTarget, Runtime};
use tokio::sync::watch;

const SESSION_CHANGED_EVENT: &str = "session:changed";

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionManager>,
}

impl AppState {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }
}

/// Mirrors every session status change to the webview.
pub fn spawn_status_events<R: Runtime>(app: AppHandle<R>, mut rx: watch::Receiver<SessionStatus>) {
    tauri::async_runtime::spawn(async move {
        while rx.changed().await.is_ok() {
            let status = rx.borrow_and_update().clone();
            let _ = app.emit_to(EventTarget::any(), SESSION_CHANGED_EVENT, status);
        }
    });
}
