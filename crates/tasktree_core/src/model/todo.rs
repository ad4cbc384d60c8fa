//! Todo entity and form payloads.
//!
//! # Responsibility
//! - Define the todo record returned by the API.
//! - Define create/update payloads, including the hours/minutes estimate
//!   input used by forms.
//!
//! # Invariants
//! - `estimated_time` is expressed in whole minutes and is never negative.
//! - `task` may be bare or expanded; callers go through `ParentRef`.

use crate::model::common::{
    max_chars, max_chars_opt, require, EntityId, Priority, ValidationError,
};
use crate::model::reference::TaskRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TODO_TITLE_MAX: usize = 100;
pub const TODO_DESCRIPTION_MAX: usize = 500;
pub const ESTIMATE_HOURS_MAX: u32 = 999;
pub const ESTIMATE_MINUTES_MAX: u32 = 59;

/// Smallest actionable item belonging to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
    /// Minutes.
    #[serde(default)]
    pub estimated_time: u32,
    /// `Missing` when the server populated a deleted task.
    #[serde(default)]
    pub task: TaskRef,
    #[serde(default)]
    pub user: EntityId,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn new(
        id: impl Into<EntityId>,
        title: impl Into<String>,
        task: impl Into<TaskRef>,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            completed: false,
            due_date,
            priority: Priority::Medium,
            estimated_time: 0,
            task: task.into(),
            user: EntityId::new(),
            created_at: due_date,
            updated_at: due_date,
        }
    }

    /// Id of the owning task, whatever its wire shape.
    pub fn task_id(&self) -> &str {
        self.task.id()
    }
}

/// Hours/minutes pair as entered in the todo form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EstimateInput {
    pub hours: u32,
    pub minutes: u32,
}

impl EstimateInput {
    /// Splits a minute total into the form's hours/minutes fields.
    pub fn from_minutes(total: u32) -> Self {
        Self {
            hours: total / 60,
            minutes: total % 60,
        }
    }

    /// Joins the pair back into minutes after checking form bounds.
    ///
    /// # Errors
    /// - `OutOfRange` when hours exceed 999 or minutes exceed 59.
    pub fn to_minutes(self) -> Result<u32, ValidationError> {
        if self.hours > ESTIMATE_HOURS_MAX {
            return Err(ValidationError::OutOfRange {
                field: "estimatedHours",
                min: 0,
                max: ESTIMATE_HOURS_MAX,
                actual: self.hours,
            });
        }
        if self.minutes > ESTIMATE_MINUTES_MAX {
            return Err(ValidationError::OutOfRange {
                field: "estimatedMinutes",
                min: 0,
                max: ESTIMATE_MINUTES_MAX,
                actual: self.minutes,
            });
        }
        Ok(self.hours * 60 + self.minutes)
    }
}

/// Create payload for a todo form submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u32>,
    pub task: EntityId,
}

impl TodoDraft {
    pub fn new(
        task: impl Into<EntityId>,
        title: impl Into<String>,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            due_date,
            priority: Priority::Medium,
            estimated_time: None,
            task: task.into(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the estimate from the form's hours/minutes pair.
    ///
    /// A zero total is sent as "no estimate".
    pub fn with_estimate(mut self, input: EstimateInput) -> Result<Self, ValidationError> {
        let minutes = input.to_minutes()?;
        self.estimated_time = (minutes > 0).then_some(minutes);
        Ok(self)
    }

    /// Validates form rules before submission.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("task", &self.task)?;
        require("title", &self.title)?;
        max_chars("title", &self.title, TODO_TITLE_MAX)?;
        max_chars_opt(
            "description",
            self.description.as_deref(),
            TODO_DESCRIPTION_MAX,
        )
    }
}

/// Partial update payload; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<EntityId>,
}

impl TodoPatch {
    /// Validates only the fields being changed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require("title", title)?;
            max_chars("title", title, TODO_TITLE_MAX)?;
        }
        if let Some(task) = &self.task {
            require("task", task)?;
        }
        max_chars_opt(
            "description",
            self.description.as_deref(),
            TODO_DESCRIPTION_MAX,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{EstimateInput, Todo, TodoDraft};
    use crate::model::common::ValidationError;
    use chrono::{TimeZone, Utc};

    #[test]
    fn estimate_splits_and_joins() {
        assert_eq!(
            EstimateInput::from_minutes(135),
            EstimateInput {
                hours: 2,
                minutes: 15
            }
        );
        assert_eq!(
            EstimateInput {
                hours: 1,
                minutes: 30
            }
            .to_minutes()
            .unwrap(),
            90
        );
        assert!(matches!(
            EstimateInput {
                hours: 0,
                minutes: 60
            }
            .to_minutes()
            .unwrap_err(),
            ValidationError::OutOfRange { .. }
        ));
    }

    #[test]
    fn zero_estimate_is_omitted_from_payload() {
        let due = Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap();
        let draft = TodoDraft::new("t1", "Write tests", due)
            .with_estimate(EstimateInput::default())
            .unwrap();
        assert_eq!(draft.estimated_time, None);
        let json = serde_json::to_value(&draft).unwrap();
        assert!(json.get("estimatedTime").is_none());
        assert_eq!(json["task"], "t1");
    }

    #[test]
    fn decodes_todo_with_bare_task_and_missing_estimate() {
        let todo: Todo = serde_json::from_value(serde_json::json!({
            "_id": "d1",
            "title": "Ship",
            "completed": true,
            "dueDate": "2026-10-20T00:00:00.000Z",
            "priority": "low",
            "task": "t1"
        }))
        .unwrap();
        assert_eq!(todo.task_id(), "t1");
        assert_eq!(todo.estimated_time, 0);
        assert!(todo.completed);
    }

    #[test]
    fn null_task_decodes_as_missing() {
        let todos: Vec<Todo> = serde_json::from_value(serde_json::json!([
            {"_id": "d1", "title": "Ship", "dueDate": "2026-10-20T00:00:00Z", "task": null},
            {
                "_id": "d2",
                "title": "Test",
                "dueDate": "2026-10-20T00:00:00Z",
                "task": {"_id": "t1", "name": "Auth", "moduleName": null}
            }
        ]))
        .unwrap();
        assert!(todos[0].task.is_missing());
        assert_eq!(todos[0].task_id(), "");
        assert_eq!(todos[1].task_id(), "t1");
    }
}
