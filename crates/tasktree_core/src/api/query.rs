//! List-endpoint query parameters.
//!
//! # Invariants
//! - Unset fields never appear in the query string.
//! - Dates are sent as `YYYY-MM-DD`.
//! - Queries are hashable and ordered so they can key the query cache.

use crate::model::common::{EntityId, Priority};
use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Server-side filters for `GET /tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskQuery {
    pub project: Option<EntityId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
}

impl TaskQuery {
    /// All tasks of one project.
    pub fn for_project(project: impl Into<EntityId>) -> Self {
        Self {
            project: Some(project.into()),
            ..Self::default()
        }
    }

    /// Query-string pairs in a stable order.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_opt(&mut pairs, "project", self.project.clone());
        push_opt(&mut pairs, "startDate", self.start_date.map(format_date));
        push_opt(&mut pairs, "endDate", self.end_date.map(format_date));
        push_opt(&mut pairs, "completed", self.completed.map(|v| v.to_string()));
        push_opt(
            &mut pairs,
            "priority",
            self.priority.map(|p| p.as_str().to_string()),
        );
        pairs
    }
}

/// Server-side filters for `GET /todos`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TodoQuery {
    pub task: Option<EntityId>,
    /// Due-date range.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Creation-date range.
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
}

impl TodoQuery {
    /// All todos of one task.
    pub fn for_task(task: impl Into<EntityId>) -> Self {
        Self {
            task: Some(task.into()),
            ..Self::default()
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_opt(&mut pairs, "task", self.task.clone());
        push_opt(&mut pairs, "startDate", self.start_date.map(format_date));
        push_opt(&mut pairs, "endDate", self.end_date.map(format_date));
        push_opt(&mut pairs, "createdFrom", self.created_from.map(format_date));
        push_opt(&mut pairs, "createdTo", self.created_to.map(format_date));
        push_opt(&mut pairs, "completed", self.completed.map(|v| v.to_string()));
        push_opt(
            &mut pairs,
            "priority",
            self.priority.map(|p| p.as_str().to_string()),
        );
        pairs
    }
}

fn push_opt(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        pairs.push((key, value));
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::{TaskQuery, TodoQuery};
    use crate::model::common::Priority;
    use chrono::NaiveDate;

    #[test]
    fn empty_query_has_no_pairs() {
        assert!(TaskQuery::default().to_pairs().is_empty());
        assert!(TodoQuery::default().to_pairs().is_empty());
    }

    #[test]
    fn task_query_uses_wire_names() {
        let query = TaskQuery {
            project: Some("p1".to_string()),
            end_date: NaiveDate::from_ymd_opt(2026, 10, 31),
            completed: Some(false),
            priority: Some(Priority::High),
            ..TaskQuery::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("project", "p1".to_string()),
                ("endDate", "2026-10-31".to_string()),
                ("completed", "false".to_string()),
                ("priority", "high".to_string()),
            ]
        );
    }

    #[test]
    fn todo_query_sends_created_range() {
        let query = TodoQuery {
            created_from: NaiveDate::from_ymd_opt(2026, 10, 1),
            ..TodoQuery::for_task("t1")
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("task", "t1".to_string()),
                ("createdFrom", "2026-10-01".to_string()),
            ]
        );
    }

    #[test]
    fn blank_parent_id_is_omitted() {
        assert!(TaskQuery::for_project("").to_pairs().is_empty());
    }
}
