//! Dashboard statistics payload.
//!
//! Mirrors the `/stats` endpoint; `crate::derive::stats` can rebuild the same
//! structure from loaded collections.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub projects: ProjectStats,
    pub tasks: WorkItemStats,
    pub todos: WorkItemStats,
    pub recent_activity: RecentActivity,
    pub completion_rate: CompletionRate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total: u32,
    pub active: u32,
    pub completed: u32,
    pub status_distribution: StatusDistribution,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDistribution {
    pub active: u32,
    pub completed: u32,
    pub on_hold: u32,
}

/// Counters shared by tasks and todos.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemStats {
    pub total: u32,
    pub completed: u32,
    pub pending: u32,
    pub overdue: u32,
    pub priority_distribution: PriorityDistribution,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityDistribution {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

/// Items created during the trailing seven days.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub projects: u32,
    pub tasks: u32,
    pub todos: u32,
}

/// Integer percentages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRate {
    pub tasks: u32,
    pub todos: u32,
}
