//! Credential-issuing request and response bodies

use serde::{Deserialize, Serialize};

use super::account::UserProfile;

/// Email/password login
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// New customer registration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"***")
            .field("phone", &self.phone)
            .finish()
    }
}

/// Body returned by login and signup
///
/// The backend has used `accessToken`, `access_token` and `token` for the same
/// field over time; all three are accepted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(alias = "access_token", alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub message: Option<String>,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("access_token", &"***")
            .field("user", &self.user)
            .field("message", &self.message)
            .finish()
    }
}

/// Body returned by the refresh endpoint
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    #[serde(alias = "access_token", alias = "token")]
    pub access_token: String,
}

impl std::fmt::Debug for RefreshResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshResponse").field("access_token", &"***").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_accepts_token_aliases() {
        for body in [
            r#"{ "accessToken": "a" }"#,
            r#"{ "access_token": "a" }"#,
            r#"{ "token": "a" }"#,
        ] {
            let parsed: AuthResponse = serde_json::from_str(body).unwrap();
            assert_eq!(parsed.access_token, "a");
        }
    }

    #[test]
    fn debug_never_prints_secrets() {
        let login = LoginRequest { email: "a@b.c".into(), password: "hunter2".into() };
        let refresh = RefreshResponse { access_token: "opaque-token".into() };

        assert!(!format!("{login:?}").contains("hunter2"));
        assert!(!format!("{refresh:?}").contains("opaque-token"));
    }
}
