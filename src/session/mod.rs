mod collaborators;
mod error;
mod manager;
mod request;
mod tokens;

#[cfg(test)]
pub(crate) mod testing;

pub use collaborators::{Navigator, NotificationLevel, Notifier, Route, TokenStore, Transport};
pub use error::{SessionError, StoreError, TransportError};
pub use manager::{SessionConfig, SessionManager, DEFAULT_REFRESH_PATH, DEFAULT_TOKEN_PATH};
pub use request::{
    ApiRequest, ApiResponse, RequestContext, RequestKind, REFRESH_AUTHORIZATION,
};
pub use tokens::{AuthenticatedUser, Session, SessionState, SessionStatus, TokenPair};
