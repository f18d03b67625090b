//! In-memory collaborators for exercising the session manager.

use super::collaborators::{Navigator, NotificationLevel, Notifier, Route, TokenStore, Transport};
use super::error::{StoreError, TransportError};
use super::manager::{DEFAULT_REFRESH_PATH, DEFAULT_TOKEN_PATH};
use super::request::{ApiRequest, ApiResponse};
use super::tokens::Session;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
struct BackendState {
    login_token: String,
    valid: Option<String>,
    next_access: Option<String>,
    offline: bool,
    always_reject: HashSet<String>,
    canned: HashMap<String, (StatusCode, Value)>,
    log: Vec<(String, Option<String>)>,
    refresh_calls: usize,
    refresh_position: Option<usize>,
    gate: Option<Arc<Notify>>,
}

/// Pretends to be the HydroServer API: `/token` accepts password `pw`,
/// other paths answer 200 only for the currently valid bearer token.
pub struct FakeBackend {
    state: Mutex<BackendState>,
}

pub struct Gate(Arc<Notify>);

impl Gate {
    pub fn release(&self) {
        self.0.notify_one();
    }
}

impl FakeBackend {
    pub fn new(login_token: &str) -> Self {
        Self {
            state: Mutex::new(BackendState {
                login_token: login_token.to_string(),
                ..Default::default()
            }),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut BackendState) -> T) -> T {
        let mut guard = self.state.lock().unwrap();
        f(&mut guard)
    }

    /// Treats `token` as a live access token, as if issued by an earlier run.
    pub fn accept(&self, token: &str) {
        self.with_state(|s| s.valid = Some(token.to_string()));
    }

    /// Invalidates the current token; the next refresh hands out `next`.
    pub fn expire_and_rotate_to(&self, next: &str) {
        self.with_state(|s| {
            s.valid = None;
            s.next_access = Some(next.to_string());
        });
    }

    pub fn expire_and_reject_refresh(&self) {
        self.with_state(|s| {
            s.valid = None;
            s.next_access = None;
        });
    }

    pub fn hold_refresh(&self) -> Gate {
        let notify = Arc::new(Notify::new());
        self.with_state(|s| s.gate = Some(notify.clone()));
        Gate(notify)
    }

    pub fn always_reject(&self, path: &str) {
        self.with_state(|s| s.always_reject.insert(path.to_string()));
    }

    pub fn respond(&self, path: &str, status: StatusCode, body: Value) {
        self.with_state(|s| s.canned.insert(path.to_string(), (status, body)));
    }

    pub fn go_offline(&self) {
        self.with_state(|s| s.offline = true);
    }

    pub fn refresh_calls(&self) -> usize {
        self.with_state(|s| s.refresh_calls)
    }

    pub fn refresh_position(&self) -> Option<usize> {
        self.with_state(|s| s.refresh_position)
    }

    pub fn log(&self) -> Vec<(String, Option<String>)> {
        self.with_state(|s| s.log.clone())
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.log().iter().filter(|(p, _)| p == path).count()
    }

    pub fn calls_with(&self, path: &str, bearer: &str) -> usize {
        self.log()
            .iter()
            .filter(|(p, b)| p == path && b.as_deref() == Some(bearer))
            .count()
    }

    fn answer(&self, request: &ApiRequest, bearer: Option<String>) -> ApiResponse {
        let mut s = self.state.lock().unwrap();
        let body = request.body.clone().unwrap_or(Value::Null);

        if let Some((status, body)) = s.canned.get(&request.path) {
            return ApiResponse::new(*status, body.clone());
        }

        if request.path == DEFAULT_TOKEN_PATH {
            if body["password"] != json!("pw") {
                return ApiResponse::new(
                    StatusCode::UNAUTHORIZED,
                    json!({"detail": "Invalid credentials"}),
                );
            }
            let token = s.login_token.clone();
            s.valid = Some(token.clone());
            return ApiResponse::new(
                StatusCode::OK,
                json!({
                    "access_token": token,
                    "refresh_token": format!("refresh-{token}"),
                    "user": {"id": 1, "email": body["email"]},
                }),
            );
        }

        if request.path == DEFAULT_REFRESH_PATH {
            return match s.next_access.take() {
                Some(next) => {
                    s.valid = Some(next.clone());
                    ApiResponse::new(
                        StatusCode::OK,
                        json!({
                            "access_token": next,
                            "refresh_token": format!("refresh-{next}"),
                        }),
                    )
                }
                None => ApiResponse::new(
                    StatusCode::UNAUTHORIZED,
                    json!({"error": "Token is invalid or expired"}),
                ),
            };
        }

        if !s.always_reject.contains(&request.path) && bearer.is_some() && bearer == s.valid {
            return ApiResponse::new(StatusCode::OK, json!({"path": request.path}));
        }
        ApiResponse::new(StatusCode::UNAUTHORIZED, json!({"detail": "Unauthorized"}))
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let bearer = request.bearer().map(str::to_string);
        let gate = self.with_state(|s| {
            if s.offline {
                return Err(TransportError::Network("connection refused".to_string()));
            }
            s.log.push((request.path.clone(), bearer.clone()));
            if request.path == DEFAULT_REFRESH_PATH {
                s.refresh_calls += 1;
                s.refresh_position = Some(s.log.len() - 1);
                Ok(s.gate.take())
            } else {
                Ok(None)
            }
        })?;
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.answer(&request, bearer))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    session: Mutex<Session>,
}

impl MemoryStore {
    pub fn seed(&self, session: Session) {
        *self.session.lock().unwrap() = session;
    }

    pub fn snapshot(&self) -> Session {
        self.session.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn load(&self) -> Result<Session, StoreError> {
        Ok(self.snapshot())
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.seed(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.seed(Session::default());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(NotificationLevel, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(NotificationLevel, String)> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}
