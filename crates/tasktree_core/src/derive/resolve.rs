//! Cross-entity reference resolution.
//!
//! # Responsibility
//! - Turn a bare or expanded parent reference into a display descriptor.
//! - Walk todo → task → project for grandparent labels.
//! - Select children of a parent from a flat collection.
//!
//! # Invariants
//! - Lookups never fail: unresolvable references degrade to sentinel labels.
//! - An expanded reference with a blank name falls back to a collection
//!   lookup before degrading.

use crate::model::common::EntityId;
use crate::model::project::Project;
use crate::model::reference::{ParentRef, ParentSummary, ProjectRef, TaskRef};
use crate::model::task::Task;
use crate::model::todo::Todo;

pub const UNKNOWN_PROJECT: &str = "Unknown Project";
pub const UNKNOWN_TASK: &str = "Unknown Task";
pub const UNKNOWN_MODULE: &str = "N/A";

/// Normalized parent descriptor for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentDescriptor {
    /// Referenced id; empty when the chain broke before reaching an id.
    pub id: EntityId,
    /// Display name or a sentinel label.
    pub name: String,
    /// Task module label; only set for task descriptors.
    pub module_name: Option<String>,
    /// Whether `name` came from real data rather than a sentinel.
    pub resolved: bool,
}

impl ParentDescriptor {
    fn unresolved(id: impl Into<EntityId>, sentinel: &str) -> Self {
        Self {
            id: id.into(),
            name: sentinel.to_string(),
            module_name: None,
            resolved: false,
        }
    }
}

/// Loaded entity that can stand in for a parent reference.
trait NamedEntity {
    fn entity_id(&self) -> &str;
    fn display_name(&self) -> &str;
}

impl NamedEntity for Project {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

impl NamedEntity for Task {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

fn resolve_named<'a, S, E>(
    reference: &'a ParentRef<S>,
    candidates: &'a [E],
    sentinel: &str,
) -> (ParentDescriptor, Option<&'a E>)
where
    S: ParentSummary,
    E: NamedEntity,
{
    let id = reference.id();
    if let ParentRef::Expanded(summary) = reference {
        if !summary.name().trim().is_empty() {
            let found = candidates.iter().find(|item| item.entity_id() == id);
            return (
                ParentDescriptor {
                    id: id.to_string(),
                    name: summary.name().to_string(),
                    module_name: None,
                    resolved: true,
                },
                found,
            );
        }
    }

    if id.is_empty() {
        return (ParentDescriptor::unresolved(id, sentinel), None);
    }

    match candidates.iter().find(|item| item.entity_id() == id) {
        Some(found) if !found.display_name().trim().is_empty() => (
            ParentDescriptor {
                id: id.to_string(),
                name: found.display_name().to_string(),
                module_name: None,
                resolved: true,
            },
            Some(found),
        ),
        found => (ParentDescriptor::unresolved(id, sentinel), found),
    }
}

/// Resolves a task's project reference against loaded projects.
pub fn resolve_project(reference: &ProjectRef, projects: &[Project]) -> ParentDescriptor {
    resolve_named(reference, projects, UNKNOWN_PROJECT).0
}

/// Resolves a todo's task reference against loaded tasks.
///
/// The descriptor's `module_name` is always set, `"N/A"` when unknown.
pub fn resolve_task(reference: &TaskRef, tasks: &[Task]) -> ParentDescriptor {
    let (mut descriptor, found) = resolve_named(reference, tasks, UNKNOWN_TASK);
    let expanded_module = match reference {
        ParentRef::Expanded(summary) => Some(summary.module_name.as_str()),
        ParentRef::Id(_) | ParentRef::Missing => None,
    };
    let module = expanded_module
        .filter(|value| !value.trim().is_empty())
        .or_else(|| found.map(|task| task.module_name.as_str()))
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(UNKNOWN_MODULE);
    descriptor.module_name = Some(module.to_string());
    descriptor
}

/// Resolves a todo's grandparent project through its task.
///
/// A task missing from `tasks` yields `"Unknown Project"` with an empty id.
pub fn resolve_todo_project(todo: &Todo, tasks: &[Task], projects: &[Project]) -> ParentDescriptor {
    match find_task(tasks, todo.task_id()) {
        Some(task) => resolve_project(&task.project, projects),
        None => ParentDescriptor::unresolved(EntityId::new(), UNKNOWN_PROJECT),
    }
}

/// Project id owning `todo`, when its task is loaded.
pub fn todo_project_id<'a>(todo: &Todo, tasks: &'a [Task]) -> Option<&'a str> {
    find_task(tasks, todo.task_id()).map(Task::project_id)
}

pub fn find_project<'a>(projects: &'a [Project], id: &str) -> Option<&'a Project> {
    projects.iter().find(|project| project.id == id)
}

pub fn find_task<'a>(tasks: &'a [Task], id: &str) -> Option<&'a Task> {
    if id.is_empty() {
        return None;
    }
    tasks.iter().find(|task| task.id == id)
}

/// Tasks owned by `project_id`, in collection order.
pub fn tasks_for_project<'a>(project_id: &str, tasks: &'a [Task]) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| task.project.points_to(project_id))
        .collect()
}

/// Todos owned by `task_id`, in collection order.
pub fn todos_for_task<'a>(task_id: &str, todos: &'a [Todo]) -> Vec<&'a Todo> {
    todos
        .iter()
        .filter(|todo| todo.task.points_to(task_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        resolve_project, resolve_task, resolve_todo_project, tasks_for_project, UNKNOWN_MODULE,
        UNKNOWN_PROJECT, UNKNOWN_TASK,
    };
    use crate::model::project::Project;
    use crate::model::reference::{ProjectRef, ProjectSummary, TaskRef, TaskSummary};
    use crate::model::task::Task;
    use crate::model::todo::Todo;
    use chrono::{TimeZone, Utc};

    fn fixtures() -> (Vec<Project>, Vec<Task>) {
        let at = Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap();
        let projects = vec![Project::new("p1", "Website", at)];
        let mut task = Task::new("t1", "Auth", "p1", at);
        task.module_name = "backend".to_string();
        (projects, vec![task])
    }

    #[test]
    fn bare_id_resolves_through_collection() {
        let (projects, _) = fixtures();
        let descriptor = resolve_project(&ProjectRef::Id("p1".to_string()), &projects);
        assert_eq!(descriptor.name, "Website");
        assert!(descriptor.resolved);
    }

    #[test]
    fn missing_id_degrades_for_any_collection_size() {
        let (projects, tasks) = fixtures();
        for size in 0..=projects.len() {
            let descriptor = resolve_project(&"nope".into(), &projects[..size]);
            assert_eq!(descriptor.name, UNKNOWN_PROJECT);
            assert_eq!(descriptor.id, "nope");
            assert!(!descriptor.resolved);
        }
        let descriptor = resolve_task(&"nope".into(), &tasks);
        assert_eq!(descriptor.name, UNKNOWN_TASK);
        assert_eq!(descriptor.module_name.as_deref(), Some(UNKNOWN_MODULE));
    }

    #[test]
    fn expanded_reference_wins_without_lookup() {
        let reference = ProjectRef::Expanded(ProjectSummary {
            id: "p404".to_string(),
            name: "Archived".to_string(),
        });
        let descriptor = resolve_project(&reference, &[]);
        assert_eq!(descriptor.name, "Archived");
        assert!(descriptor.resolved);
    }

    #[test]
    fn blank_expanded_name_falls_back_to_collection() {
        let (_, tasks) = fixtures();
        let reference = TaskRef::Expanded(TaskSummary {
            id: "t1".to_string(),
            name: String::new(),
            module_name: String::new(),
        });
        let descriptor = resolve_task(&reference, &tasks);
        assert_eq!(descriptor.name, "Auth");
        assert_eq!(descriptor.module_name.as_deref(), Some("backend"));
    }

    #[test]
    fn missing_reference_degrades_with_empty_id() {
        let (projects, tasks) = fixtures();
        let project = resolve_project(&ProjectRef::Missing, &projects);
        assert_eq!(project.name, UNKNOWN_PROJECT);
        assert!(project.id.is_empty());
        assert!(!project.resolved);

        let task = resolve_task(&TaskRef::Missing, &tasks);
        assert_eq!(task.name, UNKNOWN_TASK);
        assert!(task.id.is_empty());
        assert_eq!(task.module_name.as_deref(), Some(UNKNOWN_MODULE));
    }

    #[test]
    fn todo_project_walks_the_chain() {
        let (projects, tasks) = fixtures();
        let at = Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap();
        let todo = Todo::new("d1", "Login form", "t1", at);
        assert_eq!(resolve_todo_project(&todo, &tasks, &projects).name, "Website");

        let orphan = Todo::new("d2", "Orphan", "t9", at);
        let descriptor = resolve_todo_project(&orphan, &tasks, &projects);
        assert_eq!(descriptor.name, UNKNOWN_PROJECT);
        assert!(descriptor.id.is_empty());
    }

    #[test]
    fn children_follow_both_reference_shapes() {
        let at = Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap();
        let tasks = vec![
            Task::new("t1", "A", "p1", at),
            Task::new(
                "t2",
                "B",
                ProjectRef::Expanded(ProjectSummary {
                    id: "p1".to_string(),
                    name: "Website".to_string(),
                }),
                at,
            ),
            Task::new("t3", "C", "p2", at),
        ];
        let ids: Vec<_> = tasks_for_project("p1", &tasks)
            .into_iter()
            .map(|task| task.id.as_str())
            .collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }
}
