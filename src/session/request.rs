use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde_json::Value;

/// Secondary credential header some HydroServer deployments check.
pub const REFRESH_AUTHORIZATION: &str = "refresh_authorization";

/// Outbound call descriptor, relative to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn set_bearer(&mut self, token: &str) {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
            self.headers.insert(AUTHORIZATION, value);
        }
    }

    pub fn set_refresh_bearer(&mut self, token: &str) {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
            self.headers
                .insert(HeaderName::from_static(REFRESH_AUTHORIZATION), value);
        }
    }

    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_auth_failure(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Api,
    Login,
    Refresh,
}

/// A request plus the bookkeeping the refresh flow needs. The descriptor
/// itself is never mutated; credentials are attached to a copy per dispatch.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request: ApiRequest,
    pub kind: RequestKind,
    pub retried: bool,
    /// Bearer token the last dispatch carried.
    pub sent_with: Option<String>,
}

impl RequestContext {
    pub fn new(request: ApiRequest) -> Self {
        Self::with_kind(request, RequestKind::Api)
    }

    pub(crate) fn with_kind(request: ApiRequest, kind: RequestKind) -> Self {
        Self {
            request,
            kind,
            retried: false,
            sent_with: None,
        }
    }
}
