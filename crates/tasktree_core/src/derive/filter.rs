//! Filter/search predicate engine for in-memory collections.
//!
//! # Responsibility
//! - Express each list filter (text, status, priority, parent, date range)
//!   as an independent predicate.
//! - Combine active predicates conjunctively and run a stable filter pass.
//! - Keep cascading parent selections (project → task) consistent.
//!
//! # Invariants
//! - A filter at its "all"/empty sentinel contributes no predicate.
//! - Filtering never mutates or reorders the source collection.
//! - Applying the same filters to their own output returns it unchanged.

use crate::derive::resolve::{find_project, todo_project_id};
use crate::model::common::{EntityId, Priority, ProjectStatus};
use crate::model::project::Project;
use crate::model::task::Task;
use crate::model::todo::Todo;
use chrono::{DateTime, NaiveDate, Utc};

/// Entity view consumed by the shared predicates.
pub trait Filterable {
    /// Text fields searched by [`TextQuery`]; `None` for absent optionals.
    fn search_fields(&self) -> Vec<Option<&str>>;
    fn is_completed(&self) -> bool;
    /// `None` for entities without a priority.
    fn priority(&self) -> Option<Priority>;
    /// Date compared by the due-date range (`eta` for projects).
    fn due_at(&self) -> DateTime<Utc>;
    fn created_at(&self) -> DateTime<Utc>;
}

impl Filterable for Project {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(self.name.as_str()), self.description.as_deref()]
    }

    fn is_completed(&self) -> bool {
        Project::is_completed(self)
    }

    fn priority(&self) -> Option<Priority> {
        None
    }

    fn due_at(&self) -> DateTime<Utc> {
        self.eta
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Filterable for Task {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.name.as_str()),
            Some(self.module_name.as_str()),
            self.description.as_deref(),
        ]
    }

    fn is_completed(&self) -> bool {
        self.completed
    }

    fn priority(&self) -> Option<Priority> {
        Some(self.priority)
    }

    fn due_at(&self) -> DateTime<Utc> {
        self.due_date
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Filterable for Todo {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(self.title.as_str()), self.description.as_deref()]
    }

    fn is_completed(&self) -> bool {
        self.completed
    }

    fn priority(&self) -> Option<Priority> {
        Some(self.priority)
    }

    fn due_at(&self) -> DateTime<Utc> {
        self.due_date
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Boxed predicate over one entity type.
pub type Predicate<'a, T> = Box<dyn Fn(&T) -> bool + 'a>;

/// Conjunction of predicates; empty means "match everything".
pub struct Conjunction<'a, T> {
    predicates: Vec<Predicate<'a, T>>,
}

impl<T> Default for Conjunction<'_, T> {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }
}

impl<'a, T> Conjunction<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one predicate.
    pub fn with(mut self, predicate: impl Fn(&T) -> bool + 'a) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// Adds a predicate only when one is given.
    pub fn with_opt(mut self, predicate: Option<Predicate<'a, T>>) -> Self {
        if let Some(predicate) = predicate {
            self.predicates.push(predicate);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn test(&self, item: &T) -> bool {
        self.predicates.iter().all(|predicate| predicate(item))
    }

    /// Stable filter pass returning references into `items`.
    pub fn select<'s>(&self, items: &'s [T]) -> Vec<&'s T> {
        items.iter().filter(|item| self.test(item)).collect()
    }
}

/// Case-insensitive substring search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextQuery {
    needle: String,
}

impl TextQuery {
    /// Builds a query; surrounding whitespace is ignored.
    pub fn new(raw: &str) -> Self {
        Self {
            needle: raw.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.needle
    }

    /// Matches when any present field contains the needle.
    pub fn matches_any<'f>(&self, fields: impl IntoIterator<Item = Option<&'f str>>) -> bool {
        if self.is_empty() {
            return true;
        }
        fields
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&self.needle))
    }

    fn predicate<'a, T: Filterable>(&'a self) -> Option<Predicate<'a, T>> {
        if self.is_empty() {
            return None;
        }
        Some(Box::new(move |item: &T| {
            self.matches_any(item.search_fields())
        }))
    }
}

/// Completion status selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn matches(self, completed: bool) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !completed,
            Self::Completed => completed,
        }
    }

    /// Equivalent `completed` query parameter for list endpoints.
    pub fn as_completed_flag(self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::Pending => Some(false),
            Self::Completed => Some(true),
        }
    }

    fn predicate<'a, T: Filterable>(self) -> Option<Predicate<'a, T>> {
        if self == Self::All {
            return None;
        }
        Some(Box::new(move |item: &T| self.matches(item.is_completed())))
    }
}

/// Priority selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl PriorityFilter {
    pub fn parse(value: &str) -> Option<Self> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        Priority::parse(value).map(Self::Only)
    }

    /// Entities without a priority only match `All`.
    pub fn matches(self, priority: Option<Priority>) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => priority == Some(wanted),
        }
    }

    fn predicate<'a, T: Filterable>(self) -> Option<Predicate<'a, T>> {
        if self == Self::All {
            return None;
        }
        Some(Box::new(move |item: &T| self.matches(item.priority())))
    }
}

/// Project lifecycle selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProjectStatusFilter {
    #[default]
    All,
    Only(ProjectStatus),
}

impl ProjectStatusFilter {
    pub fn parse(value: &str) -> Option<Self> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        ProjectStatus::parse(value).map(Self::Only)
    }

    pub fn matches(self, status: ProjectStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => status == wanted,
        }
    }
}

/// Parent-entity selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(EntityId),
}

impl Selection {
    /// `"all"` and blank input both mean no selection.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Only(trimmed.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn selected(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(id) => Some(id.as_str()),
        }
    }

    /// `All` matches anything; `Only` requires a present, equal id.
    pub fn matches(&self, id: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => id == Some(wanted.as_str()),
        }
    }
}

/// Inclusive day range; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Compares the UTC calendar day of `at` against both bounds.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }
}

/// Predicates shared by all three entity lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub text: TextQuery,
    pub status: StatusFilter,
    pub priority: PriorityFilter,
    /// Range over the due date (`eta` for projects).
    pub due: DateRange,
    /// Range over the creation timestamp.
    pub created: DateRange,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, raw: &str) -> Self {
        self.text = TextQuery::new(raw);
        self
    }

    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn priority(mut self, priority: PriorityFilter) -> Self {
        self.priority = priority;
        self
    }

    pub fn due_between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.due = DateRange::new(from, to);
        self
    }

    pub fn created_between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.created = DateRange::new(from, to);
        self
    }

    /// `true` when every field sits at its sentinel.
    pub fn is_pass_through(&self) -> bool {
        self.text.is_empty()
            && self.status == StatusFilter::All
            && self.priority == PriorityFilter::All
            && self.due.is_unbounded()
            && self.created.is_unbounded()
    }

    /// Active predicates, in field order. Sentinels contribute nothing.
    pub fn predicates<'a, T: Filterable + 'a>(&'a self) -> Vec<Predicate<'a, T>> {
        let due = self.due;
        let created = self.created;
        let due_predicate: Option<Predicate<'a, T>> = (!due.is_unbounded())
            .then(|| Box::new(move |item: &T| due.contains(item.due_at())) as Predicate<'a, T>);
        let created_predicate: Option<Predicate<'a, T>> = (!created.is_unbounded()).then(|| {
            Box::new(move |item: &T| created.contains(item.created_at())) as Predicate<'a, T>
        });

        [
            self.text.predicate(),
            self.status.predicate(),
            self.priority.predicate(),
            due_predicate,
            created_predicate,
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn conjunction<'a, T: Filterable + 'a>(&'a self) -> Conjunction<'a, T> {
        Conjunction {
            predicates: self.predicates(),
        }
    }

    /// Evaluates every field directly; sentinels always pass.
    pub fn matches<T: Filterable>(&self, item: &T) -> bool {
        self.text.matches_any(item.search_fields())
            && self.status.matches(item.is_completed())
            && self.priority.matches(item.priority())
            && self.due.contains(item.due_at())
            && self.created.contains(item.created_at())
    }

    /// Stable filter pass returning references into `items`.
    pub fn select<'s, T: Filterable>(&self, items: &'s [T]) -> Vec<&'s T> {
        items.iter().filter(|item| self.matches(*item)).collect()
    }

    /// Stable filter pass returning a new owned sequence.
    pub fn apply<T: Filterable + Clone>(&self, items: &[T]) -> Vec<T> {
        self.select(items).into_iter().cloned().collect()
    }
}

/// Filters for the project list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub common: FilterSet,
    pub status: ProjectStatusFilter,
}

impl ProjectFilter {
    pub fn matches(&self, project: &Project) -> bool {
        self.status.matches(project.status) && self.common.matches(project)
    }

    pub fn select<'s>(&self, projects: &'s [Project]) -> Vec<&'s Project> {
        projects.iter().filter(|project| self.matches(project)).collect()
    }

    pub fn apply(&self, projects: &[Project]) -> Vec<Project> {
        self.select(projects).into_iter().cloned().collect()
    }
}

/// Filters for the task list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub common: FilterSet,
    pub project: Selection,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.project.matches(Some(task.project_id())) && self.common.matches(task)
    }

    pub fn select<'s>(&self, tasks: &'s [Task]) -> Vec<&'s Task> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }

    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        self.select(tasks).into_iter().cloned().collect()
    }
}

/// Cascading project → task selection used by the todo list.
///
/// The task option set depends on the selected project; a task selection
/// that falls outside it is reset to `All`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadingScope {
    project: Selection,
    task: Selection,
}

impl CascadingScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(&self) -> &Selection {
        &self.project
    }

    pub fn task(&self) -> &Selection {
        &self.task
    }

    /// Task candidates under the current project selection.
    pub fn task_options<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks
            .iter()
            .filter(|task| self.project.matches(Some(task.project_id())))
            .collect()
    }

    /// Changes the project selection and drops a task selection it orphans.
    ///
    /// Returns `true` when the task selection was reset.
    pub fn select_project(&mut self, project: Selection, tasks: &[Task]) -> bool {
        self.project = project;
        self.reset_task_if_invalid(tasks)
    }

    /// Changes the task selection.
    ///
    /// A task outside the current option set is rejected and leaves the
    /// selection at `All`; returns whether the selection was accepted.
    pub fn select_task(&mut self, task: Selection, tasks: &[Task]) -> bool {
        let accepted = match task.selected() {
            None => true,
            Some(id) => self.task_options(tasks).iter().any(|option| option.id == id),
        };
        self.task = if accepted { task } else { Selection::All };
        accepted
    }

    /// Re-checks both selections after the collections were refetched.
    ///
    /// Returns `true` when anything was reset.
    pub fn revalidate(&mut self, projects: &[Project], tasks: &[Task]) -> bool {
        let mut changed = false;
        if let Some(id) = self.project.selected() {
            if find_project(projects, id).is_none() {
                self.project = Selection::All;
                changed = true;
            }
        }
        changed | self.reset_task_if_invalid(tasks)
    }

    /// Whether `todo` falls under both selections.
    ///
    /// A todo whose task is not loaded cannot satisfy a project selection.
    pub fn matches_todo(&self, todo: &Todo, tasks: &[Task]) -> bool {
        self.task.matches(Some(todo.task_id()))
            && (self.project.is_all() || self.project.matches(todo_project_id(todo, tasks)))
    }

    fn reset_task_if_invalid(&mut self, tasks: &[Task]) -> bool {
        let Some(id) = self.task.selected() else {
            return false;
        };
        let still_valid = self.task_options(tasks).iter().any(|task| task.id == id);
        if !still_valid {
            self.task = Selection::All;
        }
        !still_valid
    }
}

/// Filters for the todo list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    pub common: FilterSet,
    pub scope: CascadingScope,
}

impl TodoFilter {
    /// `tasks` is the loaded task collection used for the project lookup.
    pub fn select<'s>(&self, todos: &'s [Todo], tasks: &[Task]) -> Vec<&'s Todo> {
        let conjunction = self.common.conjunction::<Todo>();
        todos
            .iter()
            .filter(|todo| self.scope.matches_todo(todo, tasks) && conjunction.test(*todo))
            .collect()
    }

    pub fn apply(&self, todos: &[Todo], tasks: &[Task]) -> Vec<Todo> {
        self.select(todos, tasks).into_iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CascadingScope, Conjunction, DateRange, FilterSet, PriorityFilter, Selection,
        StatusFilter, TextQuery,
    };
    use crate::model::common::Priority;
    use crate::model::task::Task;
    use crate::model::todo::Todo;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn todo(id: &str, completed: bool, priority: Priority) -> Todo {
        let at = Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap();
        let mut todo = Todo::new(id, format!("todo {id}"), "t1", at);
        todo.completed = completed;
        todo.priority = priority;
        todo
    }

    #[test]
    fn text_query_skips_absent_fields() {
        let query = TextQuery::new("  API ");
        assert!(query.matches_any([None, Some("public api")]));
        assert!(!query.matches_any([None, None]));
        assert!(TextQuery::new("").matches_any([None]));
    }

    #[test]
    fn sentinels_contribute_no_predicates() {
        let filters = FilterSet::new();
        assert!(filters.is_pass_through());
        assert!(filters.predicates::<Todo>().is_empty());
        let filters = filters.status(StatusFilter::Pending);
        assert_eq!(filters.predicates::<Todo>().len(), 1);
    }

    #[test]
    fn predicate_order_does_not_change_the_result() {
        let todos = vec![
            todo("1", true, Priority::High),
            todo("2", false, Priority::High),
            todo("3", true, Priority::Low),
            todo("4", true, Priority::High),
        ];
        let status = |item: &Todo| StatusFilter::Completed.matches(item.completed);
        let priority =
            |item: &Todo| PriorityFilter::Only(Priority::High).matches(Some(item.priority));

        let forward = Conjunction::new().with(status).with(priority);
        let backward = Conjunction::new().with(priority).with(status);
        let ids = |selected: Vec<&Todo>| -> Vec<String> {
            selected.into_iter().map(|todo| todo.id.clone()).collect()
        };
        assert_eq!(ids(forward.select(&todos)), vec!["1", "4"]);
        assert_eq!(ids(forward.select(&todos)), ids(backward.select(&todos)));
    }

    #[test]
    fn conjunction_agrees_with_direct_match() {
        let todos = vec![
            todo("1", false, Priority::High),
            todo("2", false, Priority::Low),
            todo("3", true, Priority::High),
            todo("4", false, Priority::High),
            todo("5", false, Priority::Medium),
        ];
        let filters = FilterSet::new()
            .status(StatusFilter::Pending)
            .priority(PriorityFilter::Only(Priority::High));
        let conjunction = filters.conjunction::<Todo>();
        assert_eq!(conjunction.len(), 2);

        let selected = filters.select(&todos);
        let ids: Vec<&str> = selected.iter().map(|todo| todo.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
        assert_eq!(conjunction.select(&todos).len(), selected.len());

        let once = filters.apply(&todos);
        assert_eq!(filters.apply(&once), once);
    }

    #[test]
    fn date_range_is_inclusive_and_open_ended() {
        let day = |d: u32| NaiveDate::from_ymd_opt(2026, 10, d).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 10, 20, 18, 0, 0).unwrap();
        assert!(DateRange::new(Some(day(20)), Some(day(20))).contains(at));
        assert!(DateRange::new(None, Some(day(20))).contains(at));
        assert!(DateRange::new(Some(day(20)), None).contains(at));
        assert!(!DateRange::new(Some(day(21)), None).contains(at));
        assert!(!DateRange::new(None, Some(day(19))).contains(at));
    }

    #[test]
    fn cascading_scope_resets_orphaned_task() {
        let at = Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap();
        let tasks = vec![
            Task::new("t1", "A", "p1", at),
            Task::new("t2", "B", "p2", at),
        ];
        let mut scope = CascadingScope::new();
        assert!(scope.select_task(Selection::Only("t1".to_string()), &tasks));

        assert!(!scope.select_project(Selection::Only("p1".to_string()), &tasks));
        assert_eq!(scope.task(), &Selection::Only("t1".to_string()));

        assert!(scope.select_project(Selection::Only("p2".to_string()), &tasks));
        assert_eq!(scope.task(), &Selection::All);
        assert_eq!(scope.task_options(&tasks).len(), 1);

        assert!(!scope.select_task(Selection::Only("t1".to_string()), &tasks));
        assert_eq!(scope.task(), &Selection::All);
    }

    #[test]
    fn selection_parse_treats_blank_as_all() {
        assert_eq!(Selection::parse(" "), Selection::All);
        assert_eq!(Selection::parse("ALL"), Selection::All);
        assert_eq!(Selection::parse("p1"), Selection::Only("p1".to_string()));
        assert!(!Selection::Only("p1".to_string()).matches(None));
    }
}
