//! Core client logic for tasktree.
//! This crate is the single source of truth for client-side invariants:
//! derived metrics, filtering, reference resolution and cache bookkeeping.

pub mod api;
pub mod cache;
pub mod config;
pub mod derive;
pub mod logging;
pub mod model;
pub mod service;
pub mod session;

pub use api::http::HttpApi;
pub use api::memory::InMemoryApi;
pub use api::query::{TaskQuery, TodoQuery};
pub use api::{ApiError, ApiResult, TaskTreeApi};
pub use cache::{CacheKey, CacheScope, QueryCache};
pub use config::{ClientConfig, ConfigError};
pub use logging::{default_log_level, init_logging, init_logging_from, logging_status};
pub use model::common::{EntityId, Priority, ProjectStatus, ValidationError};
pub use model::project::{Project, ProjectDraft, ProjectPatch};
pub use model::stats::DashboardStats;
pub use model::task::{Task, TaskDraft, TaskPatch};
pub use model::todo::{EstimateInput, Todo, TodoDraft, TodoPatch};
pub use model::user::{LoginCredentials, RegisterCredentials, User};
pub use service::notice::{Notice, NoticeLevel};
pub use service::workspace::{Intent, Workspace};
pub use session::{
    FileSessionStore, MemorySessionStore, Session, SessionContext, SessionError, SessionResult,
    SessionStore,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
