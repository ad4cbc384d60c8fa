//! Task entity and form payloads.
//!
//! # Responsibility
//! - Define the task record returned by the API.
//! - Define create/update payloads with client-side validation.
//!
//! # Invariants
//! - `project` may be bare or expanded; callers go through `ParentRef`.
//! - `completed` is user-toggled and independent of todo progress.

use crate::model::common::{
    max_chars, max_chars_opt, null_as_default, require, EntityId, Priority, ValidationError,
};
use crate::model::reference::ProjectRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TASK_NAME_MAX: usize = 100;
pub const TASK_MODULE_MAX: usize = 50;
pub const TASK_DESCRIPTION_MAX: usize = 1000;

/// Unit of work belonging to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-text grouping label.
    #[serde(default, deserialize_with = "null_as_default")]
    pub module_name: String,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    /// `Missing` when the server populated a deleted project.
    #[serde(default)]
    pub project: ProjectRef,
    #[serde(default)]
    pub user: EntityId,
    #[serde(default)]
    pub total_todos: u32,
    #[serde(default)]
    pub completed_todos: u32,
    /// Sum of child todo estimates, in minutes.
    #[serde(default)]
    pub total_estimated_time: u32,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        id: impl Into<EntityId>,
        name: impl Into<String>,
        project: impl Into<ProjectRef>,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            module_name: String::new(),
            due_date,
            completed: false,
            priority: Priority::Medium,
            project: project.into(),
            user: EntityId::new(),
            total_todos: 0,
            completed_todos: 0,
            total_estimated_time: 0,
            created_at: due_date,
            updated_at: due_date,
        }
    }

    /// Id of the owning project, whatever its wire shape.
    pub fn project_id(&self) -> &str {
        self.project.id()
    }
}

/// Create payload for a task form submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub module_name: String,
    pub due_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    pub project: EntityId,
}

impl TaskDraft {
    pub fn new(
        project: impl Into<EntityId>,
        name: impl Into<String>,
        module_name: impl Into<String>,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            module_name: module_name.into(),
            due_date,
            priority: None,
            project: project.into(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validates form rules before submission.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("project", &self.project)?;
        require("name", &self.name)?;
        max_chars("name", &self.name, TASK_NAME_MAX)?;
        require("moduleName", &self.module_name)?;
        max_chars("moduleName", &self.module_name, TASK_MODULE_MAX)?;
        max_chars_opt(
            "description",
            self.description.as_deref(),
            TASK_DESCRIPTION_MAX,
        )
    }
}

/// Partial update payload; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Moving a task to another project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<EntityId>,
}

impl TaskPatch {
    /// Validates only the fields being changed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require("name", name)?;
            max_chars("name", name, TASK_NAME_MAX)?;
        }
        if let Some(module_name) = &self.module_name {
            require("moduleName", module_name)?;
            max_chars("moduleName", module_name, TASK_MODULE_MAX)?;
        }
        if let Some(project) = &self.project {
            require("project", project)?;
        }
        max_chars_opt(
            "description",
            self.description.as_deref(),
            TASK_DESCRIPTION_MAX,
        )
    }
}
