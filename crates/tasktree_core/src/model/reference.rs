//! Parent references that arrive either as a bare id or an expanded record.
//!
//! # Responsibility
//! - Model the `id | {_id, ...}` wire union as one tagged enum.
//! - Give every call site the same accessor for the referenced id.
//!
//! # Invariants
//! - Decoding never guesses: a JSON string is `Id`, a JSON object is
//!   `Expanded`, and `null` or an absent field is `Missing`.
//! - A `Missing` reference has an empty id and points at nothing.
//! - Resolution against loaded collections lives in `crate::derive::resolve`.

use crate::model::common::{null_as_default, EntityId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Minimal view over an expanded parent record.
pub trait ParentSummary {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

/// Reference to a parent entity, bare or expanded by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef<S> {
    /// Bare identifier; the name must be looked up in a loaded collection.
    Id(EntityId),
    /// Server-populated record carrying at least id and name.
    Expanded(S),
    /// The server populated a parent that no longer exists.
    Missing,
}

impl<S> Default for ParentRef<S> {
    fn default() -> Self {
        Self::Missing
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireRef<S> {
    Id(EntityId),
    Expanded(S),
}

impl<'de, S: Deserialize<'de>> Deserialize<'de> for ParentRef<S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<WireRef<S>>::deserialize(deserializer)? {
            Some(WireRef::Id(id)) => Self::Id(id),
            Some(WireRef::Expanded(summary)) => Self::Expanded(summary),
            None => Self::Missing,
        })
    }
}

impl<S: Serialize> Serialize for ParentRef<S> {
    fn serialize<Z: Serializer>(&self, serializer: Z) -> Result<Z::Ok, Z::Error> {
        match self {
            Self::Id(id) => serializer.serialize_str(id),
            Self::Expanded(summary) => summary.serialize(serializer),
            Self::Missing => serializer.serialize_none(),
        }
    }
}

impl<S: ParentSummary> ParentRef<S> {
    /// Returns the referenced id regardless of representation.
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id.as_str(),
            Self::Expanded(summary) => summary.id(),
            Self::Missing => "",
        }
    }

    /// Returns `true` when this reference points at `id`.
    pub fn points_to(&self, id: &str) -> bool {
        !id.is_empty() && self.id() == id
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, Self::Expanded(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl<S> From<EntityId> for ParentRef<S> {
    fn from(value: EntityId) -> Self {
        Self::Id(value)
    }
}

impl<S> From<&str> for ParentRef<S> {
    fn from(value: &str) -> Self {
        Self::Id(value.to_string())
    }
}

/// Expanded project reference embedded in a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

impl ParentSummary for ProjectSummary {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Expanded task reference embedded in a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub module_name: String,
}

impl ParentSummary for TaskSummary {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Task → project reference.
pub type ProjectRef = ParentRef<ProjectSummary>;
/// Todo → task reference.
pub type TaskRef = ParentRef<TaskSummary>;

#[cfg(test)]
mod tests {
    use super::{ProjectRef, ProjectSummary, TaskRef};

    #[test]
    fn decodes_bare_id_and_expanded_object() {
        let bare: ProjectRef = serde_json::from_value(serde_json::json!("p1")).unwrap();
        assert_eq!(bare, ProjectRef::Id("p1".to_string()));

        let expanded: ProjectRef =
            serde_json::from_value(serde_json::json!({"_id": "p2", "name": "Launch"})).unwrap();
        assert_eq!(
            expanded,
            ProjectRef::Expanded(ProjectSummary {
                id: "p2".to_string(),
                name: "Launch".to_string()
            })
        );
        assert_eq!(expanded.id(), "p2");
        assert!(expanded.is_expanded());
    }

    #[test]
    fn expanded_task_tolerates_missing_module_name() {
        let task: TaskRef =
            serde_json::from_value(serde_json::json!({"_id": "t1", "name": "API"})).unwrap();
        match task {
            TaskRef::Expanded(summary) => assert!(summary.module_name.is_empty()),
            other => panic!("object must decode as expanded, got {other:?}"),
        }
    }

    #[test]
    fn null_reference_decodes_as_missing() {
        let missing: ProjectRef = serde_json::from_value(serde_json::json!(null)).unwrap();
        assert!(missing.is_missing());
        assert_eq!(missing.id(), "");
        assert!(!missing.points_to(""));
        assert_eq!(serde_json::to_value(&missing).unwrap(), serde_json::json!(null));
    }

    #[test]
    fn bare_id_serializes_back_to_a_string() {
        let bare = TaskRef::Id("t1".to_string());
        assert_eq!(serde_json::to_value(&bare).unwrap(), serde_json::json!("t1"));
    }

    #[test]
    fn points_to_ignores_empty_ids() {
        let reference = ProjectRef::Id(String::new());
        assert!(!reference.points_to(""));
    }
}
