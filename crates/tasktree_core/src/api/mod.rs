//! REST gateway contract for the task-management server.
//!
//! # Responsibility
//! - Define one method per endpoint; implementations own transport details.
//! - Carry the bearer token used for every authenticated request.
//!
//! # Invariants
//! - Implementations never log request bodies or tokens.
//! - A server-supplied error message is preserved in [`ApiError`].
//!
//! # See also
//! - `http::HttpApi` for the networked gateway.
//! - `memory::InMemoryApi` for the in-process server.

pub mod envelope;
pub mod http;
pub mod memory;
pub mod query;

use crate::model::common::ValidationError;
use crate::model::project::{Project, ProjectDraft, ProjectPatch};
use crate::model::stats::DashboardStats;
use crate::model::task::{Task, TaskDraft, TaskPatch};
use crate::model::todo::{Todo, TodoDraft, TodoPatch};
use crate::model::user::{AuthResponse, LoginCredentials, RegisterCredentials, User};
use query::{TaskQuery, TodoQuery};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ApiResult<T> = Result<T, ApiError>;

/// Error for gateway calls.
#[derive(Debug)]
pub enum ApiError {
    /// Connection, TLS or timeout failure before a response arrived.
    Transport(reqwest::Error),
    /// Non-2xx response; `message` is the server's text when it sent one.
    Status { status: u16, message: Option<String> },
    /// Response body did not match the expected shape.
    Decode(String),
    /// 2xx response carrying `success: false`.
    Unsuccessful(String),
    /// Entity missing or not owned by the caller.
    NotFound { kind: &'static str, id: String },
    /// Missing or rejected bearer token.
    Unauthorized,
}

impl ApiError {
    /// Message sent by the server, when there is one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } => Some(message.as_str()),
            Self::Unsuccessful(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Status { status: 404, .. }
        )
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::Status { status: 401, .. })
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "network error: {err}"),
            Self::Status {
                status,
                message: Some(message),
            } => write!(f, "server returned {status}: {message}"),
            Self::Status {
                status,
                message: None,
            } => write!(f, "server returned {status}"),
            Self::Decode(details) => write!(f, "unexpected response body: {details}"),
            Self::Unsuccessful(message) => write!(f, "request failed: {message}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Unauthorized => write!(f, "not authorized"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value)
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Server-side rejection of a payload the client let through.
impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::Status {
            status: 400,
            message: Some(value.to_string()),
        }
    }
}

/// Gateway over every endpoint the client uses.
///
/// Methods take `&self`; the bearer token lives behind interior mutability
/// so one gateway can be shared by the session and the workspace.
pub trait TaskTreeApi {
    /// Sets or clears the bearer token attached to later requests.
    fn set_auth_token(&self, token: Option<String>);
    fn auth_token(&self) -> Option<String>;

    fn list_projects(&self) -> ApiResult<Vec<Project>>;
    fn get_project(&self, id: &str) -> ApiResult<Project>;
    fn create_project(&self, draft: &ProjectDraft) -> ApiResult<Project>;
    fn update_project(&self, id: &str, patch: &ProjectPatch) -> ApiResult<Project>;
    fn delete_project(&self, id: &str) -> ApiResult<()>;

    fn list_tasks(&self, query: &TaskQuery) -> ApiResult<Vec<Task>>;
    fn get_task(&self, id: &str) -> ApiResult<Task>;
    fn create_task(&self, draft: &TaskDraft) -> ApiResult<Task>;
    fn update_task(&self, id: &str, patch: &TaskPatch) -> ApiResult<Task>;
    fn delete_task(&self, id: &str) -> ApiResult<()>;
    fn toggle_task(&self, id: &str) -> ApiResult<Task>;

    fn list_todos(&self, query: &TodoQuery) -> ApiResult<Vec<Todo>>;
    fn get_todo(&self, id: &str) -> ApiResult<Todo>;
    fn create_todo(&self, draft: &TodoDraft) -> ApiResult<Todo>;
    fn update_todo(&self, id: &str, patch: &TodoPatch) -> ApiResult<Todo>;
    fn delete_todo(&self, id: &str) -> ApiResult<()>;
    fn toggle_todo(&self, id: &str) -> ApiResult<Todo>;

    fn stats(&self) -> ApiResult<DashboardStats>;

    fn login(&self, credentials: &LoginCredentials) -> ApiResult<AuthResponse>;
    fn register(&self, credentials: &RegisterCredentials) -> ApiResult<AuthResponse>;
    fn me(&self) -> ApiResult<User>;
    fn logout(&self) -> ApiResult<()>;
}
