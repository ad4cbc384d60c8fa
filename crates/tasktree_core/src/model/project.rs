//! Project entity and form payloads.
//!
//! # Responsibility
//! - Define the project record returned by the API.
//! - Define create/update payloads with client-side validation.
//!
//! # Invariants
//! - `completion_percentage` is a server projection of task completion;
//!   `crate::derive::aggregate::ProjectAggregate` recomputes it.
//! - A project counts as completed only when `status == Completed`.

use crate::model::common::{
    max_chars, max_chars_opt, require, EntityId, ProjectStatus, ValidationError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PROJECT_NAME_MAX: usize = 100;
pub const PROJECT_DESCRIPTION_MAX: usize = 500;

/// Top-level container with a target completion date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Target completion date.
    pub eta: DateTime<Utc>,
    #[serde(default)]
    pub status: ProjectStatus,
    /// Owner reference.
    #[serde(default)]
    pub user: EntityId,
    #[serde(default)]
    pub total_tasks: u32,
    #[serde(default)]
    pub completed_tasks: u32,
    #[serde(default)]
    pub completion_percentage: u32,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Builds a project snapshot from a server-assigned id.
    ///
    /// Aggregates start at zero; timestamps are set to `eta` until the
    /// server says otherwise.
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, eta: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            eta,
            status: ProjectStatus::Active,
            user: EntityId::new(),
            total_tasks: 0,
            completed_tasks: 0,
            completion_percentage: 0,
            created_at: eta,
            updated_at: eta,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProjectStatus::Completed
    }
}

/// Create payload for a project form submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub eta: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
}

impl ProjectDraft {
    pub fn new(name: impl Into<String>, eta: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            description: None,
            eta,
            status: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Validates form rules before submission.
    ///
    /// # Errors
    /// - `Required` when `name` is blank.
    /// - `TooLong` when `name` or `description` exceed their limits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        max_chars("name", &self.name, PROJECT_NAME_MAX)?;
        max_chars_opt(
            "description",
            self.description.as_deref(),
            PROJECT_DESCRIPTION_MAX,
        )
    }
}

/// Partial update payload; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
}

impl ProjectPatch {
    /// Validates only the fields being changed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require("name", name)?;
            max_chars("name", name, PROJECT_NAME_MAX)?;
        }
        max_chars_opt(
            "description",
            self.description.as_deref(),
            PROJECT_DESCRIPTION_MAX,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.eta.is_none()
            && self.status.is_none()
    }
}
