use crate::session::{NotificationLevel, Notifier};
use serde::Serialize;
use tauri::{AppHandle, Emitter, EventTarget, Runtime};
use tauri_plugin_notification::NotificationExt as _;

const NOTICE_EVENT: &str = "session:notice";

#[derive(Debug, Clone, Serialize)]
struct Notice<'a> {
    level: NotificationLevel,
    message: &'a str,
}

/// Shows session outcomes as a desktop notification and as an in-app
/// banner event.
pub struct DesktopNotifier<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> DesktopNotifier<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> Notifier for DesktopNotifier<R> {
    fn notify(&self, level: NotificationLevel, message: &str) {
        let _ = self
            .app
            .emit_to(EventTarget::any(), NOTICE_EVENT, Notice { level, message });

        if level == NotificationLevel::Info {
            return;
        }

        let notification = self
            .app
            .notification()
            .builder()
            .title("HydroServer")
            .body(message);

        #[cfg(target_os = "macos")]
        let notification = notification.sound("Ping");

        #[cfg(target_os = "linux")]
        let notification = match level {
            NotificationLevel::Error => notification.sound("dialog-warning"),
            _ => notification.sound("complete"),
        };

        let _ = notification.show();
    }
}
