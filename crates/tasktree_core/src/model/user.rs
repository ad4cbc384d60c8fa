//! Account model and credential payloads.
//!
//! # Invariants
//! - Passwords are only ever held in credential payloads; they are never
//!   logged or persisted by the session store.

use crate::model::common::{min_chars, require, EntityId, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

pub const REGISTER_NAME_MIN: usize = 2;
pub const REGISTER_PASSWORD_MIN: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

/// Authenticated user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: EntityId,
    pub name: String,
    pub email: String,
}

/// Login form payload.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        require("password", &self.password)
    }
}

impl Debug for LoginCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration form payload.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RegisterCredentials {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterCredentials {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Validates registration rules: name ≥ 2 chars, email shape,
    /// password ≥ 6 chars.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        min_chars("name", &self.name, REGISTER_NAME_MIN)?;
        validate_email(&self.email)?;
        require("password", &self.password)?;
        min_chars("password", &self.password, REGISTER_PASSWORD_MIN)
    }
}

impl Debug for RegisterCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterCredentials")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Token + profile returned by login/register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    pub token: String,
    pub user: User,
}

fn validate_email(value: &str) -> Result<(), ValidationError> {
    require("email", value)?;
    if !EMAIL_RE.is_match(value.trim()) {
        return Err(ValidationError::InvalidEmail(value.trim().to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{LoginCredentials, RegisterCredentials};
    use crate::model::common::ValidationError;

    #[test]
    fn register_rules_match_form() {
        assert!(RegisterCredentials::new("Al", "al@example.com", "secret")
            .validate()
            .is_ok());
        assert!(matches!(
            RegisterCredentials::new("A", "a@example.com", "secret")
                .validate()
                .unwrap_err(),
            ValidationError::TooShort { field: "name", .. }
        ));
        assert!(matches!(
            RegisterCredentials::new("Al", "not-an-email", "secret")
                .validate()
                .unwrap_err(),
            ValidationError::InvalidEmail(_)
        ));
        assert!(matches!(
            RegisterCredentials::new("Al", "al@example.com", "12345")
                .validate()
                .unwrap_err(),
            ValidationError::TooShort {
                field: "password",
                ..
            }
        ));
    }

    #[test]
    fn debug_output_redacts_password() {
        let creds = LoginCredentials::new("al@example.com", "hunter22");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter22"));
        assert!(rendered.contains("<redacted>"));
    }
}
