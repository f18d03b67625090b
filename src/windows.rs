use crate::session::{Navigator, Route};
use tauri::{AppHandle, Emitter, EventTarget, Manager, Runtime, WebviewUrl, WebviewWindowBuilder};
use tracing::warn;

pub const MAIN_WINDOW_LABEL: &str = "main";
const NAVIGATE_EVENT: &str = "session:navigate";

pub fn open_main_window<R: Runtime>(app: &AppHandle<R>) -> tauri::Result<()> {
    if let Some(window) = app.get_webview_window(MAIN_WINDOW_LABEL) {
        window.show()?;
        window.set_focus()?;
        return Ok(());
    }

    let window = WebviewWindowBuilder::new(
        app,
        MAIN_WINDOW_LABEL,
        WebviewUrl::App("index.html".into()),
    )
    .title("HydroServer")
    .inner_size(1280.0, 800.0)
    .min_inner_size(800.0, 600.0)
    .visible(true)
    .build()?;

    window.set_focus()?;
    Ok(())
}

/// Routes the webview's client-side router by event.
pub struct WebviewNavigator<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> WebviewNavigator<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> Navigator for WebviewNavigator<R> {
    fn navigate(&self, route: Route) {
        if route == Route::Login {
            if let Err(e) = open_main_window(&self.app) {
                warn!(error = %e, "failed to focus main window");
            }
        }
        let target = EventTarget::webview_window(MAIN_WINDOW_LABEL);
        if let Err(e) = self.app.emit_to(target, NAVIGATE_EVENT, route.path()) {
            warn!(error = %e, route = route.path(), "failed to emit navigation");
        }
    }
}
