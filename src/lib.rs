mod app;
mod commands;
pub mod http;
mod notifications;
mod redact;
pub mod session;
mod settings;
mod state;
pub mod types;
mod windows;

pub fn run() {
    app::run();
}
