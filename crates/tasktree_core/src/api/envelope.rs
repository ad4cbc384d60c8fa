//! Response envelopes shared by every endpoint.
//!
//! Success bodies look like `{success, data, count?}`; error bodies like
//! `{success: false, message}`.

use crate::api::{ApiError, ApiResult};
use crate::model::user::User;
use serde::{Deserialize, Serialize};

fn default_success() -> bool {
    true
}

/// `{success, data, count?}` wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    /// Absent `data` decodes as `None` without a `T: Default` bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: None,
            message: None,
        }
    }

    pub fn list(items: Vec<T>) -> Envelope<Vec<T>> {
        let count = u32::try_from(items.len()).ok();
        Envelope {
            success: true,
            data: Some(items),
            count,
            message: None,
        }
    }

    /// Unwraps `data`, turning `success: false` into an error.
    pub fn into_data(self) -> ApiResult<T> {
        self.check()?;
        self.data
            .ok_or_else(|| ApiError::Decode("response has no `data` field".to_string()))
    }

    /// Checks `success` for endpoints whose payload is ignored.
    pub fn check(&self) -> ApiResult<()> {
        if self.success {
            return Ok(());
        }
        Err(ApiError::Unsuccessful(
            self.message
                .clone()
                .unwrap_or_else(|| "request was not successful".to_string()),
        ))
    }
}

/// `{success: false, message}` body sent with error statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    /// Extracts the message from a raw body; blank messages count as none.
    pub fn message_from(raw: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(raw)
            .ok()
            .and_then(|body| body.message)
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty())
    }
}

/// `/auth/me` body: `{success, user}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    pub user: User,
}
