//! Local recomputation of the dashboard statistics.
//!
//! # Responsibility
//! - Build [`DashboardStats`] from loaded collections with the same overdue
//!   and percentage rules the list views use.
//! - Provide the overall completion headline figure.
//!
//! # See also
//! - `crate::model::stats` for the payload shape.

use crate::derive::metrics::{is_overdue_for, progress_percent};
use crate::model::common::{Priority, ProjectStatus};
use crate::model::project::Project;
use crate::model::stats::{
    CompletionRate, DashboardStats, ProjectStats, RecentActivity, StatusDistribution,
    WorkItemStats,
};
use crate::model::task::Task;
use crate::model::todo::Todo;
use chrono::{DateTime, Duration, Utc};

/// Trailing window counted as recent activity.
pub const RECENT_ACTIVITY_DAYS: i64 = 7;

/// Recomputes the dashboard payload from loaded collections.
pub fn compute_dashboard_stats(
    projects: &[Project],
    tasks: &[Task],
    todos: &[Todo],
    now: DateTime<Utc>,
) -> DashboardStats {
    let today = now.date_naive();
    let since = now - Duration::days(RECENT_ACTIVITY_DAYS);

    let mut status_distribution = StatusDistribution::default();
    for project in projects {
        match project.status {
            ProjectStatus::Active => status_distribution.active += 1,
            ProjectStatus::Completed => status_distribution.completed += 1,
            ProjectStatus::OnHold => status_distribution.on_hold += 1,
        }
    }
    let project_stats = ProjectStats {
        total: count(projects.len()),
        active: status_distribution.active,
        completed: status_distribution.completed,
        status_distribution,
    };

    let task_stats = work_item_stats(
        tasks
            .iter()
            .map(|task| (task.completed, task.priority, is_overdue_for(task, today))),
    );
    let todo_stats = work_item_stats(
        todos
            .iter()
            .map(|todo| (todo.completed, todo.priority, is_overdue_for(todo, today))),
    );

    let recent_activity = RecentActivity {
        projects: count(projects.iter().filter(|p| p.created_at >= since).count()),
        tasks: count(tasks.iter().filter(|t| t.created_at >= since).count()),
        todos: count(todos.iter().filter(|t| t.created_at >= since).count()),
    };
    let completion_rate = CompletionRate {
        tasks: progress_percent(task_stats.completed, task_stats.total),
        todos: progress_percent(todo_stats.completed, todo_stats.total),
    };

    DashboardStats {
        projects: project_stats,
        tasks: task_stats,
        todos: todo_stats,
        recent_activity,
        completion_rate,
    }
}

/// Completed share across projects, tasks and todos combined.
pub fn overall_completion_rate(stats: &DashboardStats) -> u32 {
    let total = stats.projects.total + stats.tasks.total + stats.todos.total;
    let completed = stats.projects.completed + stats.tasks.completed + stats.todos.completed;
    progress_percent(completed, total)
}

fn work_item_stats(items: impl Iterator<Item = (bool, Priority, bool)>) -> WorkItemStats {
    let mut stats = WorkItemStats::default();
    for (completed, priority, overdue) in items {
        stats.total += 1;
        if completed {
            stats.completed += 1;
        } else {
            stats.pending += 1;
        }
        if overdue {
            stats.overdue += 1;
        }
        match priority {
            Priority::High => stats.priority_distribution.high += 1,
            Priority::Medium => stats.priority_distribution.medium += 1,
            Priority::Low => stats.priority_distribution.low += 1,
        }
    }
    stats
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
