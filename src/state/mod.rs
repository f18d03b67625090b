mod app_state;
mod secret_manager;
mod token_store;

pub use app_state::{spawn_status_events, AppState};
pub use token_store::PersistentTokenStore;
