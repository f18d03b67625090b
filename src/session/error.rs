use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("network error: {0}")]
    Network(String),
    #[error("refresh token was rejected")]
    RefreshRejected,
    #[error("request is still unauthorized after refreshing credentials")]
    Unauthorized,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("HydroServer API error ({status})")]
    Http { status: u16, body: Value },
    #[error("session was logged out")]
    LoggedOut,
    #[error("invalid response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
}

impl From<TransportError> for SessionError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Network(msg) => Self::Network(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("secure storage is unavailable")]
    Unavailable,
    #[error("stored session is corrupt: {0}")]
    Corrupt(String),
}
