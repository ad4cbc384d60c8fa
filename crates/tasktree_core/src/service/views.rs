//! Presentation-ready row projections.
//!
//! Each row pairs an entity snapshot with its resolved parents and the
//! metrics a list or card shows. Rows are rebuilt on every read.

use crate::derive::aggregate::ProjectAggregate;
use crate::derive::metrics::{
    days_left_for, deadline_hint, format_minutes, is_overdue_for, progress_percent,
    PROJECT_DEADLINE_WINDOW_DAYS, TASK_DEADLINE_WINDOW_DAYS,
};
use crate::derive::resolve::{
    resolve_project, resolve_task, resolve_todo_project, ParentDescriptor,
};
use crate::model::project::Project;
use crate::model::task::Task;
use crate::model::todo::Todo;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRow {
    pub project: Project,
    pub days_left: i64,
    pub overdue: bool,
    /// "Today" / "Nd left" inside the project window.
    pub deadline_hint: Option<String>,
    /// Server-reported `completionPercentage`.
    pub progress_percent: u32,
    /// The denormalized counters disagree with their own percentage.
    pub aggregate_drift: bool,
}

impl ProjectRow {
    pub fn build(project: &Project, today: NaiveDate) -> Self {
        let days_left = days_left_for(project, today);
        Self {
            project: project.clone(),
            days_left,
            overdue: is_overdue_for(project, today),
            deadline_hint: deadline_hint(
                days_left,
                project.is_completed(),
                PROJECT_DEADLINE_WINDOW_DAYS,
            ),
            progress_percent: project.completion_percentage,
            aggregate_drift: ProjectAggregate::of(project)
                != ProjectAggregate::from_counts(project.completed_tasks, project.total_tasks),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub task: Task,
    pub project: ParentDescriptor,
    pub days_left: i64,
    pub overdue: bool,
    pub deadline_hint: Option<String>,
    /// Todo ratio; display only.
    pub todo_progress_percent: u32,
    /// `None` when no time is estimated.
    pub estimate_label: Option<String>,
}

impl TaskRow {
    pub fn build(task: &Task, projects: &[Project], today: NaiveDate) -> Self {
        let days_left = days_left_for(task, today);
        Self {
            task: task.clone(),
            project: resolve_project(&task.project, projects),
            days_left,
            overdue: is_overdue_for(task, today),
            deadline_hint: deadline_hint(days_left, task.completed, TASK_DEADLINE_WINDOW_DAYS),
            todo_progress_percent: progress_percent(task.completed_todos, task.total_todos),
            estimate_label: estimate_label(task.total_estimated_time),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TodoRow {
    pub todo: Todo,
    pub task: ParentDescriptor,
    /// Found through the todo's task.
    pub project: ParentDescriptor,
    pub days_left: i64,
    pub overdue: bool,
    pub estimate_label: Option<String>,
}

impl TodoRow {
    pub fn build(todo: &Todo, tasks: &[Task], projects: &[Project], today: NaiveDate) -> Self {
        Self {
            todo: todo.clone(),
            task: resolve_task(&todo.task, tasks),
            project: resolve_todo_project(todo, tasks, projects),
            days_left: days_left_for(todo, today),
            overdue: is_overdue_for(todo, today),
            estimate_label: estimate_label(todo.estimated_time),
        }
    }
}

fn estimate_label(minutes: u32) -> Option<String> {
    (minutes > 0).then(|| format_minutes(minutes))
}

#[cfg(test)]
mod tests {
    use super::{ProjectRow, TaskRow, TodoRow};
    use crate::derive::resolve::{UNKNOWN_MODULE, UNKNOWN_PROJECT, UNKNOWN_TASK};
    use crate::model::project::Project;
    use crate::model::reference::{ProjectRef, TaskRef};
    use crate::model::task::Task;
    use crate::model::todo::Todo;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn yesterday_task_is_overdue_without_hint() {
        let due = Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap();
        let projects = vec![Project::new("p1", "Website", due)];
        let row = TaskRow::build(&Task::new("t1", "Auth", "p1", due), &projects, today());
        assert_eq!(row.days_left, -1);
        assert!(row.overdue);
        assert!(row.deadline_hint.is_none());
        assert_eq!(row.project.name, "Website");
        assert!(row.estimate_label.is_none());
    }

    #[test]
    fn project_row_uses_seven_day_window() {
        let eta = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap() + Duration::days(6);
        let mut project = Project::new("p1", "Website", eta);
        project.total_tasks = 2;
        project.completed_tasks = 1;
        project.completion_percentage = 50;
        let row = ProjectRow::build(&project, today());
        assert_eq!(row.deadline_hint.as_deref(), Some("6d left"));
        assert_eq!(row.progress_percent, 50);
        assert!(!row.aggregate_drift);
    }

    #[test]
    fn project_row_shows_server_percentage_and_flags_drift() {
        let eta = Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap();
        let mut project = Project::new("p1", "Website", eta);
        project.total_tasks = 3;
        project.completed_tasks = 2;
        project.completion_percentage = 33;
        let row = ProjectRow::build(&project, today());
        assert_eq!(row.progress_percent, 33);
        assert!(row.aggregate_drift);
    }

    #[test]
    fn deleted_parents_degrade_to_placeholders() {
        let due = Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap();
        let projects = vec![Project::new("p1", "Website", due)];
        let task = Task::new("t1", "Auth", ProjectRef::Missing, due);
        let task_row = TaskRow::build(&task, &projects, today());
        assert_eq!(task_row.project.name, UNKNOWN_PROJECT);
        assert!(task_row.project.id.is_empty());

        let todo = Todo::new("d1", "Write", TaskRef::Missing, due);
        let todo_row = TodoRow::build(&todo, &[task], &projects, today());
        assert_eq!(todo_row.task.name, UNKNOWN_TASK);
        assert_eq!(todo_row.task.module_name.as_deref(), Some(UNKNOWN_MODULE));
        assert_eq!(todo_row.project.name, UNKNOWN_PROJECT);
    }

    #[test]
    fn orphan_todo_gets_placeholders() {
        let due = Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap();
        let mut todo = Todo::new("d1", "Write", "missing", due);
        todo.estimated_time = 90;
        let row = TodoRow::build(&todo, &[], &[], today());
        assert_eq!(row.task.name, UNKNOWN_TASK);
        assert_eq!(row.project.name, UNKNOWN_PROJECT);
        assert_eq!(row.estimate_label.as_deref(), Some("1h 30m"));
    }
}
