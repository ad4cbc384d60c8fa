//! Denormalized aggregate recomputation.
//!
//! # Responsibility
//! - Recompute project/task aggregates from child collections.
//! - Detect drift between server projections and recomputed values.
//!
//! # Invariants
//! - `completion_percentage == progress_percent(completed_tasks, total_tasks)`.
//! - Task aggregates never touch `Task::completed`.

use crate::derive::metrics::progress_percent;
use crate::model::common::EntityId;
use crate::model::project::Project;
use crate::model::task::Task;
use crate::model::todo::Todo;

/// Task counters for one project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectAggregate {
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub completion_percentage: u32,
}

impl ProjectAggregate {
    pub fn from_counts(completed_tasks: u32, total_tasks: u32) -> Self {
        Self {
            total_tasks,
            completed_tasks,
            completion_percentage: progress_percent(completed_tasks, total_tasks),
        }
    }

    /// Recomputes counters from the tasks referencing `project_id`.
    pub fn from_tasks<'a>(project_id: &str, tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let (completed, total) = tasks
            .into_iter()
            .filter(|task| task.project.points_to(project_id))
            .fold((0u32, 0u32), |(completed, total), task| {
                (completed + u32::from(task.completed), total + 1)
            });
        Self::from_counts(completed, total)
    }

    /// Server-side projection carried by the project record.
    pub fn of(project: &Project) -> Self {
        Self {
            total_tasks: project.total_tasks,
            completed_tasks: project.completed_tasks,
            completion_percentage: project.completion_percentage,
        }
    }

    /// Writes the counters into the project's denormalized fields.
    pub fn apply_to(self, project: &mut Project) {
        project.total_tasks = self.total_tasks;
        project.completed_tasks = self.completed_tasks;
        project.completion_percentage = self.completion_percentage;
    }
}

/// Todo counters for one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskAggregate {
    pub total_todos: u32,
    pub completed_todos: u32,
    /// Minutes.
    pub total_estimated_time: u32,
}

impl TaskAggregate {
    /// Recomputes counters from the todos referencing `task_id`.
    pub fn from_todos<'a>(task_id: &str, todos: impl IntoIterator<Item = &'a Todo>) -> Self {
        todos
            .into_iter()
            .filter(|todo| todo.task.points_to(task_id))
            .fold(Self::default(), |acc, todo| Self {
                total_todos: acc.total_todos + 1,
                completed_todos: acc.completed_todos + u32::from(todo.completed),
                total_estimated_time: acc.total_estimated_time.saturating_add(todo.estimated_time),
            })
    }

    /// Server-side projection carried by the task record.
    pub fn of(task: &Task) -> Self {
        Self {
            total_todos: task.total_todos,
            completed_todos: task.completed_todos,
            total_estimated_time: task.total_estimated_time,
        }
    }

    /// Todo progress; drives display only.
    pub fn progress_percent(&self) -> u32 {
        progress_percent(self.completed_todos, self.total_todos)
    }

    pub fn apply_to(self, task: &mut Task) {
        task.total_todos = self.total_todos;
        task.completed_todos = self.completed_todos;
        task.total_estimated_time = self.total_estimated_time;
    }
}

/// Mismatch between a server projection and the recomputed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift<A> {
    pub id: EntityId,
    pub server: A,
    pub derived: A,
}

/// Projects whose denormalized counters disagree with `tasks`.
///
/// Only meaningful when `tasks` is the complete, unfiltered collection.
pub fn project_drift(projects: &[Project], tasks: &[Task]) -> Vec<Drift<ProjectAggregate>> {
    projects
        .iter()
        .filter_map(|project| {
            let derived = ProjectAggregate::from_tasks(&project.id, tasks);
            let server = ProjectAggregate::of(project);
            (server != derived).then(|| Drift {
                id: project.id.clone(),
                server,
                derived,
            })
        })
        .collect()
}

/// Tasks whose denormalized counters disagree with `todos`.
pub fn task_drift(tasks: &[Task], todos: &[Todo]) -> Vec<Drift<TaskAggregate>> {
    tasks
        .iter()
        .filter_map(|task| {
            let derived = TaskAggregate::from_todos(&task.id, todos);
            let server = TaskAggregate::of(task);
            (server != derived).then(|| Drift {
                id: task.id.clone(),
                server,
                derived,
            })
        })
        .collect()
}
