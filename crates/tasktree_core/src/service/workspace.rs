//! Workspace use-case service: cached reads, mutation intents, session.
//!
//! # Responsibility
//! - Serve list and detail reads through the query cache.
//! - Turn each user intent into one gateway call, then invalidate every
//!   cache scope whose data the call could change.
//! - Report outcomes as [`Notice`]s; intent failures never propagate.
//!
//! # Invariants
//! - A draft or patch that fails validation produces an error notice and no
//!   gateway call.
//! - Failed calls leave the cache untouched.
//! - Login, register and logout clear the cache.
//!
//! # See also
//! - `crate::cache` for scope semantics.

use crate::api::query::{TaskQuery, TodoQuery};
use crate::api::{ApiError, ApiResult, TaskTreeApi};
use crate::cache::{CacheKey, CacheScope, QueryCache};
use crate::derive::filter::{ProjectFilter, TaskFilter, TodoFilter};
use crate::logging::event_value;
use crate::model::common::ValidationError;
use crate::model::project::{Project, ProjectDraft, ProjectPatch};
use crate::model::stats::DashboardStats;
use crate::model::task::{Task, TaskDraft, TaskPatch};
use crate::model::todo::{Todo, TodoDraft, TodoPatch};
use crate::model::user::{LoginCredentials, RegisterCredentials, User};
use crate::service::notice::Notice;
use crate::service::views::{ProjectRow, TaskRow, TodoRow};
use crate::session::{SessionContext, SessionError, SessionResult, SessionStore};
use chrono::NaiveDate;
use log::{info, warn};
use std::time::Instant;

/// One user-initiated mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    CreateProject,
    UpdateProject,
    DeleteProject,
    CreateTask,
    UpdateTask,
    ToggleTask,
    DeleteTask,
    CreateTodo,
    UpdateTodo,
    ToggleTodo,
    DeleteTodo,
}

impl Intent {
    /// Scopes marked stale after the intent succeeds.
    pub fn invalidates(self) -> &'static [CacheScope] {
        use CacheScope::{Projects, Stats, Tasks, Todos};
        match self {
            Self::CreateProject | Self::UpdateProject => &[Projects, Stats],
            Self::DeleteProject => &[Projects, Tasks, Todos, Stats],
            Self::CreateTask | Self::UpdateTask | Self::ToggleTask => &[Tasks, Projects, Stats],
            Self::DeleteTask => &[Tasks, Todos, Projects, Stats],
            Self::CreateTodo | Self::UpdateTodo | Self::ToggleTodo => &[Todos, Tasks, Stats],
            Self::DeleteTodo => &[Todos, Tasks, Stats],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateProject => "create_project",
            Self::UpdateProject => "update_project",
            Self::DeleteProject => "delete_project",
            Self::CreateTask => "create_task",
            Self::UpdateTask => "update_task",
            Self::ToggleTask => "toggle_task",
            Self::DeleteTask => "delete_task",
            Self::CreateTodo => "create_todo",
            Self::UpdateTodo => "update_todo",
            Self::ToggleTodo => "toggle_todo",
            Self::DeleteTodo => "delete_todo",
        }
    }

    /// Notice text when the server gave no message.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::CreateProject => "Failed to create project",
            Self::UpdateProject => "Failed to update project",
            Self::DeleteProject => "Failed to delete project",
            Self::CreateTask => "Failed to create task",
            Self::UpdateTask | Self::ToggleTask => "Failed to update task",
            Self::DeleteTask => "Failed to delete task",
            Self::CreateTodo => "Failed to create todo",
            Self::UpdateTodo => "Failed to update todo",
            Self::ToggleTodo => "Failed to update todo status",
            Self::DeleteTodo => "Failed to delete todo",
        }
    }
}

/// Client workspace over one gateway and one session store.
pub struct Workspace<A: TaskTreeApi, S: SessionStore> {
    api: A,
    cache: QueryCache,
    session: SessionContext<S>,
    notices: Vec<Notice>,
}

impl<A: TaskTreeApi, S: SessionStore> Workspace<A, S> {
    pub fn new(api: A, store: S) -> Self {
        Self {
            api,
            cache: QueryCache::new(),
            session: SessionContext::new(store),
            notices: Vec::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn session(&self) -> &SessionContext<S> {
        &self.session
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drains pending notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // Session

    /// Restores the stored session and attaches its token.
    pub fn restore_session(&mut self) -> SessionResult<Option<User>> {
        Ok(self.session.restore(&self.api)?.cloned())
    }

    pub fn login(&mut self, credentials: &LoginCredentials) -> Option<User> {
        let result = self
            .session
            .login(&self.api, &mut self.cache, credentials)
            .map(User::clone);
        self.finish_session_intent(result, "Login successful!", "Login failed. Please try again.")
    }

    pub fn register(&mut self, credentials: &RegisterCredentials) -> Option<User> {
        let result = self
            .session
            .register(&self.api, &mut self.cache, credentials)
            .map(User::clone);
        self.finish_session_intent(
            result,
            "Account created successfully!",
            "Registration failed. Please try again.",
        )
    }

    /// Ends the session locally even when the server call fails.
    pub fn logout(&mut self) -> bool {
        match self.session.logout(&self.api, &mut self.cache) {
            Ok(()) => true,
            Err(err) => {
                self.notices.push(Notice::error(err.to_string()));
                false
            }
        }
    }

    /// Re-checks the token against `/auth/me`.
    pub fn verify_session(&mut self) -> SessionResult<Option<User>> {
        Ok(self.session.verify(&self.api, &mut self.cache)?.cloned())
    }

    fn finish_session_intent(
        &mut self,
        result: SessionResult<User>,
        success: &str,
        fallback: &str,
    ) -> Option<User> {
        match result {
            Ok(user) => {
                self.notices.push(Notice::success(success));
                Some(user)
            }
            Err(SessionError::Validation(err)) => {
                self.notices.push(Notice::from_validation(&err));
                None
            }
            Err(SessionError::Api(err)) => {
                self.notices.push(Notice::from_api_error(&err, fallback));
                None
            }
            Err(err) => {
                self.notices.push(Notice::error(err.to_string()));
                None
            }
        }
    }

    // Reads

    pub fn projects(&mut self) -> ApiResult<Vec<Project>> {
        self.cache
            .get_or_fetch(CacheKey::Projects, || self.api.list_projects())
    }

    pub fn project(&mut self, id: &str) -> ApiResult<Project> {
        self.cache
            .get_or_fetch(CacheKey::Project(id.to_string()), || self.api.get_project(id))
    }

    pub fn tasks(&mut self, query: &TaskQuery) -> ApiResult<Vec<Task>> {
        self.cache
            .get_or_fetch(CacheKey::Tasks(query.clone()), || self.api.list_tasks(query))
    }

    pub fn task(&mut self, id: &str) -> ApiResult<Task> {
        self.cache
            .get_or_fetch(CacheKey::Task(id.to_string()), || self.api.get_task(id))
    }

    pub fn todos(&mut self, query: &TodoQuery) -> ApiResult<Vec<Todo>> {
        self.cache
            .get_or_fetch(CacheKey::Todos(query.clone()), || self.api.list_todos(query))
    }

    pub fn todo(&mut self, id: &str) -> ApiResult<Todo> {
        self.cache
            .get_or_fetch(CacheKey::Todo(id.to_string()), || self.api.get_todo(id))
    }

    pub fn stats(&mut self) -> ApiResult<DashboardStats> {
        self.cache.get_or_fetch(CacheKey::Stats, || self.api.stats())
    }

    // Row projections

    pub fn project_rows(
        &mut self,
        filter: &ProjectFilter,
        today: NaiveDate,
    ) -> ApiResult<Vec<ProjectRow>> {
        let projects = self.projects()?;
        Ok(filter
            .select(&projects)
            .into_iter()
            .map(|project| ProjectRow::build(project, today))
            .collect())
    }

    pub fn task_rows(&mut self, filter: &TaskFilter, today: NaiveDate) -> ApiResult<Vec<TaskRow>> {
        let projects = self.projects()?;
        let tasks = self.tasks(&TaskQuery::default())?;
        Ok(filter
            .select(&tasks)
            .into_iter()
            .map(|task| TaskRow::build(task, &projects, today))
            .collect())
    }

    pub fn todo_rows(&mut self, filter: &TodoFilter, today: NaiveDate) -> ApiResult<Vec<TodoRow>> {
        let projects = self.projects()?;
        let tasks = self.tasks(&TaskQuery::default())?;
        let todos = self.todos(&TodoQuery::default())?;
        Ok(filter
            .select(&todos, &tasks)
            .into_iter()
            .map(|todo| TodoRow::build(todo, &tasks, &projects, today))
            .collect())
    }

    // Project intents

    pub fn create_project(&mut self, draft: &ProjectDraft) -> Option<Project> {
        self.run(
            Intent::CreateProject,
            draft.validate(),
            |api| api.create_project(draft),
            |_| "Project created successfully!",
        )
    }

    pub fn update_project(&mut self, id: &str, patch: &ProjectPatch) -> Option<Project> {
        self.run(
            Intent::UpdateProject,
            patch.validate(),
            |api| api.update_project(id, patch),
            |_| "Project updated successfully!",
        )
    }

    /// Cascades to the project's tasks and todos server-side.
    pub fn delete_project(&mut self, id: &str) -> bool {
        self.run(
            Intent::DeleteProject,
            Ok(()),
            |api| api.delete_project(id),
            |_| "Project deleted successfully!",
        )
        .is_some()
    }

    // Task intents

    pub fn create_task(&mut self, draft: &TaskDraft) -> Option<Task> {
        self.run(
            Intent::CreateTask,
            draft.validate(),
            |api| api.create_task(draft),
            |_| "Task created successfully!",
        )
    }

    pub fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Option<Task> {
        self.run(
            Intent::UpdateTask,
            patch.validate(),
            |api| api.update_task(id, patch),
            |_| "Task updated successfully!",
        )
    }

    pub fn toggle_task(&mut self, id: &str) -> Option<Task> {
        self.run(
            Intent::ToggleTask,
            Ok(()),
            |api| api.toggle_task(id),
            |task: &Task| {
                if task.completed {
                    "Task completed!"
                } else {
                    "Task marked as pending"
                }
            },
        )
    }

    /// Cascades to the task's todos server-side.
    pub fn delete_task(&mut self, id: &str) -> bool {
        self.run(
            Intent::DeleteTask,
            Ok(()),
            |api| api.delete_task(id),
            |_| "Task deleted successfully!",
        )
        .is_some()
    }

    // Todo intents

    pub fn create_todo(&mut self, draft: &TodoDraft) -> Option<Todo> {
        self.run(
            Intent::CreateTodo,
            draft.validate(),
            |api| api.create_todo(draft),
            |_| "Todo created successfully!",
        )
    }

    pub fn update_todo(&mut self, id: &str, patch: &TodoPatch) -> Option<Todo> {
        self.run(
            Intent::UpdateTodo,
            patch.validate(),
            |api| api.update_todo(id, patch),
            |_| "Todo updated successfully!",
        )
    }

    pub fn toggle_todo(&mut self, id: &str) -> Option<Todo> {
        self.run(
            Intent::ToggleTodo,
            Ok(()),
            |api| api.toggle_todo(id),
            |todo: &Todo| {
                if todo.completed {
                    "Todo completed!"
                } else {
                    "Todo marked as pending"
                }
            },
        )
    }

    pub fn delete_todo(&mut self, id: &str) -> bool {
        self.run(
            Intent::DeleteTodo,
            Ok(()),
            |api| api.delete_todo(id),
            |_| "Todo deleted successfully!",
        )
        .is_some()
    }

    fn run<T>(
        &mut self,
        intent: Intent,
        validation: Result<(), ValidationError>,
        call: impl FnOnce(&A) -> ApiResult<T>,
        success: impl FnOnce(&T) -> &'static str,
    ) -> Option<T> {
        if let Err(err) = validation {
            warn!(
                "event=mutation module=workspace status=rejected intent={} error={}",
                intent.as_str(),
                event_value(&err)
            );
            self.notices.push(Notice::from_validation(&err));
            return None;
        }

        let started_at = Instant::now();
        match call(&self.api) {
            Ok(value) => {
                for scope in intent.invalidates() {
                    self.cache.invalidate(*scope);
                }
                info!(
                    "event=mutation module=workspace status=ok intent={} duration_ms={}",
                    intent.as_str(),
                    started_at.elapsed().as_millis()
                );
                self.notices.push(Notice::success(success(&value)));
                Some(value)
            }
            Err(err) => {
                warn!(
                    "event=mutation module=workspace status=error intent={} error_kind={} duration_ms={}",
                    intent.as_str(),
                    error_kind(&err),
                    started_at.elapsed().as_millis()
                );
                self.notices
                    .push(Notice::from_api_error(&err, intent.failure_message()));
                None
            }
        }
    }
}

fn error_kind(error: &ApiError) -> &'static str {
    match error {
        ApiError::Transport(_) => "transport",
        ApiError::Status { .. } => "status",
        ApiError::Decode(_) => "decode",
        ApiError::Unsuccessful(_) => "unsuccessful",
        ApiError::NotFound { .. } => "not_found",
        ApiError::Unauthorized => "unauthorized",
    }
}
