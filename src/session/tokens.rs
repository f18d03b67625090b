use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Profile snapshot returned alongside the tokens on login.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub organization: Option<Value>,
    #[serde(default, rename = "type")]
    pub user_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub user: Option<AuthenticatedUser>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RefreshBody<'a> {
    pub refresh_token: &'a str,
}

/// Credential state owned by the session manager.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<AuthenticatedUser>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

impl Session {
    pub fn new(
        access_token: Option<String>,
        refresh_token: Option<String>,
        user: Option<AuthenticatedUser>,
    ) -> Self {
        Self {
            access_token: non_empty(access_token),
            refresh_token: non_empty(refresh_token),
            user,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub(crate) fn install_pair(&mut self, pair: TokenPair) {
        self.access_token = non_empty(Some(pair.access_token));
        self.refresh_token = non_empty(Some(pair.refresh_token));
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Anonymous,
    Authenticated,
    Refreshing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub state: SessionState,
    pub user: Option<AuthenticatedUser>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_new_drops_blank_tokens() {
        let session = Session::new(Some("  ".to_string()), Some(" r1 ".to_string()), None);
        assert_eq!(session.access_token, None);
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn login_response_reads_backend_user_shape() {
        let json = serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "user": {
                "id": 7,
                "email": "user@test.com",
                "first_name": "Ada",
                "middle_name": null,
                "last_name": "Lovelace",
                "organization": "USU",
                "type": "Researcher"
            }
        });
        let parsed: LoginResponse = serde_json::from_value(json).unwrap();
        let user = parsed.user.unwrap();
        assert_eq!(user.id, serde_json::json!(7));
        assert_eq!(user.email.as_deref(), Some("user@test.com"));
        assert_eq!(user.user_type.as_deref(), Some("Researcher"));
    }
}
