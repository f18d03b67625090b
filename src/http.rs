use crate::redact::redact_secrets;
use crate::session::{ApiRequest, ApiResponse, Transport, TransportError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("failed to build http client")]
  Build(#[from] reqwest::Error),
}

fn default_headers() -> HeaderMap {
  let mut headers = HeaderMap::new();
  headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
  headers.insert(
    USER_AGENT,
    HeaderValue::from_static(concat!("hydroserver-desktop/", env!("CARGO_PKG_VERSION"))),
  );
  headers
}

fn parse_body(text: &str) -> Value {
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return Value::Null;
  }
  serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn network_error(err: reqwest::Error) -> TransportError {
  TransportError::Network(redact_secrets(&err.to_string()).to_string())
}

/// reqwest transport rooted at the HydroServer `/api/` base URL.
pub struct HydroServerClient {
  http: reqwest::Client,
  base_url: String,
}

impl HydroServerClient {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
    Ok(Self {
      http: reqwest::Client::builder()
        .default_headers(default_headers())
        .timeout(timeout)
        .build()?,
      base_url: base_url.trim_end_matches('/').to_string(),
    })
  }

  pub fn url(&self, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
      return path.to_string();
    }
    format!("{}/{}", self.base_url, path.trim_start_matches('/'))
  }
}

#[async_trait]
impl Transport for HydroServerClient {
  async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
    let mut builder = self
      .http
      .request(request.method, self.url(&request.path))
      .headers(request.headers);
    if let Some(body) = &request.body {
      builder = builder.json(body);
    }

    let res = builder.send().await.map_err(network_error)?;
    let status = res.status();
    let text = res.text().await.map_err(network_error)?;
    Ok(ApiResponse::new(status, parse_body(&text)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use reqwest::{Method, StatusCode};
  use serde_json::json;
  use wiremock::matchers::{body_json, header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn client_for(server: &MockServer) -> HydroServerClient {
    HydroServerClient::new(&format!("{}/api/", server.uri()), Duration::from_secs(5)).unwrap()
  }

  #[test]
  fn url_joins_base_and_relative_paths() {
    let client = HydroServerClient::new("http://127.0.0.1:8000/api/", Duration::from_secs(1)).unwrap();
    assert_eq!(client.url("/token"), "http://127.0.0.1:8000/api/token");
    assert_eq!(client.url("data/things"), "http://127.0.0.1:8000/api/data/things");
    assert_eq!(client.url("https://other.example/x"), "https://other.example/x");
  }

  #[test]
  fn parse_body_tolerates_non_json() {
    assert_eq!(parse_body(""), Value::Null);
    assert_eq!(parse_body("{\"a\":1}"), json!({"a": 1}));
    assert_eq!(parse_body("Bad Gateway"), json!("Bad Gateway"));
  }

  #[tokio::test]
  async fn send_forwards_headers_and_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/token/refresh"))
      .and(header("authorization", "Bearer tok1"))
      .and(body_json(json!({"refresh_token": "r1"})))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!({"access_token": "tok2", "refresh_token": "r2"})),
      )
      .expect(1)
      .mount(&server)
      .await;

    let mut request = ApiRequest::post("/token/refresh", json!({"refresh_token": "r1"}));
    request.set_bearer("tok1");
    let response = client_for(&server).send(request).await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["access_token"], "tok2");
  }

  #[tokio::test]
  async fn send_reports_error_statuses_as_responses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/data/things"))
      .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Unauthorized"})))
      .mount(&server)
      .await;

    let response = client_for(&server)
      .send(ApiRequest::new(Method::GET, "/data/things"))
      .await
      .unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.is_auth_failure());
  }

  #[tokio::test]
  async fn send_maps_connection_failures_to_network_errors() {
    let client = HydroServerClient::new("http://127.0.0.1:9/api/", Duration::from_secs(2)).unwrap();
    let err = client.send(ApiRequest::get("/data/things")).await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
  }
}
