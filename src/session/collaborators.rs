use super::error::{StoreError, TransportError};
use super::request::{ApiRequest, ApiResponse};
use super::tokens::Session;
use async_trait::async_trait;
use serde::Serialize;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request as-is. Any received response is `Ok`, whatever its
    /// status; `Err` means nothing came back.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Durable storage for `access_token`, `refresh_token` and `user`.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Session, StoreError>;
    async fn save(&self, session: &Session) -> Result<(), StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Login,
    LoggedOut,
    PostLogin,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::LoggedOut => "/",
            Self::PostLogin => "/sites",
        }
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, level: NotificationLevel, message: &str);
}
