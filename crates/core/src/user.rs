//! Registration and login payloads.

use serde::Deserialize;
use validator::Validate;

use crate::serde_util::{trimmed, trimmed_opt};

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 3, max = 30, message = "Username must be between 3 and 30 characters"))]
    pub username: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "Please add a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl RegisterRequest {
    /// Emails are unique case-insensitively; store them lowercased.
    pub fn normalized_email(&self) -> String {
        self.email.to_lowercase()
    }
}

/// Body of `POST /api/auth/login`. Both fields are optional at the decode
/// step so a missing one yields the "provide an email and password" error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl LoginRequest {
    /// Both credentials, if present and non-empty.
    pub fn credentials(&self) -> Option<(String, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email.to_lowercase(), password))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, email: &str, password: &str) -> RegisterRequest {
        serde_json::from_value(serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
        }))
        .unwrap()
    }

    #[test]
    fn valid_registration_passes() {
        let req = register("alice", "Alice@Example.com", "secret1");
        assert!(req.validate().is_ok());
        assert_eq!(req.normalized_email(), "alice@example.com");
    }

    #[test]
    fn invalid_registration_reports_each_field() {
        let req = register("al", "not-an-email", "123");
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn login_requires_both_fields() {
        let req: LoginRequest = serde_json::from_value(serde_json::json!({"email": "a@b.c"})).unwrap();
        assert!(req.credentials().is_none());

        let req: LoginRequest = serde_json::from_value(
            serde_json::json!({"email": " A@B.c ", "password": "pw"}),
        )
        .unwrap();
        assert_eq!(req.credentials(), Some(("a@b.c".to_string(), "pw")));
    }
}
