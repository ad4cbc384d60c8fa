//! In-process server implementing the gateway contract.
//!
//! # Responsibility
//! - Reproduce the server behavior the client relies on: id assignment,
//!   per-user ownership, cascade deletes, denormalized aggregates, list
//!   filters, auth sessions and dashboard stats.
//! - Record every call so callers can assert cache hits and misses.
//!
//! # Invariants
//! - Entities are stored with bare parent ids and expanded on the way out.
//! - Aggregates are recomputed after every mutation that can change them.
//! - Deleting a parent removes all of its descendants.

use crate::api::query::{TaskQuery, TodoQuery};
use crate::api::{ApiError, ApiResult, TaskTreeApi};
use crate::derive::aggregate::{ProjectAggregate, TaskAggregate};
use crate::derive::filter::DateRange;
use crate::derive::stats::compute_dashboard_stats;
use crate::model::common::{EntityId, Priority};
use crate::model::project::{Project, ProjectDraft, ProjectPatch};
use crate::model::reference::{ParentRef, ProjectSummary, TaskSummary};
use crate::model::stats::DashboardStats;
use crate::model::task::{Task, TaskDraft, TaskPatch};
use crate::model::todo::{Todo, TodoDraft, TodoPatch};
use crate::model::user::{AuthResponse, LoginCredentials, RegisterCredentials, User};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
struct State {
    accounts: Vec<Account>,
    sessions: HashMap<String, EntityId>,
    token: Option<String>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    todos: Vec<Todo>,
    next_id: u64,
    calls: Vec<String>,
    fail_next: Option<(u16, String)>,
    clock: Option<DateTime<Utc>>,
}

impl State {
    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }

    fn next_id(&mut self, kind: &str) -> EntityId {
        self.next_id += 1;
        format!("{kind}-{}", self.next_id)
    }

    fn open_session(&mut self, user_id: &str) -> String {
        let token = self.next_id("token");
        self.sessions.insert(token.clone(), user_id.to_string());
        token
    }

    fn current_user_id(&self) -> ApiResult<EntityId> {
        self.token
            .as_ref()
            .and_then(|token| self.sessions.get(token))
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }

    fn project_index(&self, user: &str, id: &str) -> ApiResult<usize> {
        self.projects
            .iter()
            .position(|project| project.id == id && project.user == user)
            .ok_or_else(|| not_found("project", id))
    }

    fn task_index(&self, user: &str, id: &str) -> ApiResult<usize> {
        self.tasks
            .iter()
            .position(|task| task.id == id && task.user == user)
            .ok_or_else(|| not_found("task", id))
    }

    fn todo_index(&self, user: &str, id: &str) -> ApiResult<usize> {
        self.todos
            .iter()
            .position(|todo| todo.id == id && todo.user == user)
            .ok_or_else(|| not_found("todo", id))
    }

    fn refresh_project(&mut self, project_id: &str) {
        let aggregate = ProjectAggregate::from_tasks(project_id, &self.tasks);
        if let Some(project) = self.projects.iter_mut().find(|p| p.id == project_id) {
            aggregate.apply_to(project);
        }
    }

    fn refresh_task(&mut self, task_id: &str) {
        let aggregate = TaskAggregate::from_todos(task_id, &self.todos);
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            aggregate.apply_to(task);
        }
    }

    /// Task with its project expanded to `{_id, name}`, or `null` once gone.
    fn expand_task(&self, task: &Task) -> Task {
        let mut expanded = task.clone();
        expanded.project = match self.projects.iter().find(|p| p.id == task.project_id()) {
            Some(project) => ParentRef::Expanded(ProjectSummary {
                id: project.id.clone(),
                name: project.name.clone(),
            }),
            None => ParentRef::Missing,
        };
        expanded
    }

    /// Todo with its task expanded to `{_id, name, moduleName}`, or `null` once gone.
    fn expand_todo(&self, todo: &Todo) -> Todo {
        let mut expanded = todo.clone();
        expanded.task = match self.tasks.iter().find(|t| t.id == todo.task_id()) {
            Some(task) => ParentRef::Expanded(TaskSummary {
                id: task.id.clone(),
                name: task.name.clone(),
                module_name: task.module_name.clone(),
            }),
            None => ParentRef::Missing,
        };
        expanded
    }
}

/// Gateway backed by in-memory collections.
#[derive(Default)]
pub struct InMemoryApi {
    state: Mutex<State>,
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the server clock used for timestamps and stats.
    pub fn with_clock(self, now: DateTime<Utc>) -> Self {
        self.lock().clock = Some(now);
        self
    }

    /// Creates an account without going through `register`.
    pub fn seed_user(&self, name: &str, email: &str, password: &str) -> User {
        let mut state = self.lock();
        let user = User {
            id: state.next_id("user"),
            name: name.to_string(),
            email: email.to_string(),
        };
        state.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
        });
        user
    }

    /// Seeds an account and attaches a live session token to this gateway.
    pub fn signed_in(name: &str, email: &str) -> Self {
        let api = Self::new();
        let user = api.seed_user(name, email, "secret1");
        {
            let mut state = api.lock();
            let token = state.open_session(&user.id);
            state.token = Some(token);
        }
        api
    }

    /// Makes the next call fail with `status` and a server message.
    pub fn fail_next(&self, status: u16, message: &str) {
        self.lock().fail_next = Some((status, message.to_string()));
    }

    /// Calls received so far, as `METHOD /path` labels.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of recorded calls equal to `label`.
    pub fn count_calls(&self, label: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.as_str() == label)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn call<T>(
        &self,
        label: String,
        op: impl FnOnce(&mut State) -> ApiResult<T>,
    ) -> ApiResult<T> {
        let mut state = self.lock();
        state.calls.push(label);
        if let Some((status, message)) = state.fail_next.take() {
            return Err(ApiError::Status {
                status,
                message: Some(message),
            });
        }
        op(&mut state)
    }

    fn authed<T>(
        &self,
        label: String,
        op: impl FnOnce(&mut State, &str) -> ApiResult<T>,
    ) -> ApiResult<T> {
        self.call(label, |state| {
            let user = state.current_user_id()?;
            op(state, &user)
        })
    }
}

impl TaskTreeApi for InMemoryApi {
    fn set_auth_token(&self, token: Option<String>) {
        self.lock().token = token.filter(|value| !value.trim().is_empty());
    }

    fn auth_token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    fn list_projects(&self) -> ApiResult<Vec<Project>> {
        self.authed("GET /projects".to_string(), |state, user| {
            Ok(state
                .projects
                .iter()
                .filter(|project| project.user == user)
                .cloned()
                .collect())
        })
    }

    fn get_project(&self, id: &str) -> ApiResult<Project> {
        self.authed(format!("GET /projects/{id}"), |state, user| {
            let index = state.project_index(user, id)?;
            Ok(state.projects[index].clone())
        })
    }

    fn create_project(&self, draft: &ProjectDraft) -> ApiResult<Project> {
        self.authed("POST /projects".to_string(), |state, user| {
            draft.validate()?;
            let now = state.now();
            let mut project = Project::new(state.next_id("project"), draft.name.trim(), draft.eta);
            project.description = draft.description.clone();
            project.status = draft.status.unwrap_or_default();
            project.user = user.to_string();
            project.created_at = now;
            project.updated_at = now;
            state.projects.push(project.clone());
            Ok(project)
        })
    }

    fn update_project(&self, id: &str, patch: &ProjectPatch) -> ApiResult<Project> {
        self.authed(format!("PUT /projects/{id}"), |state, user| {
            patch.validate()?;
            let index = state.project_index(user, id)?;
            let now = state.now();
            let project = &mut state.projects[index];
            if let Some(name) = &patch.name {
                project.name = name.trim().to_string();
            }
            if let Some(description) = &patch.description {
                project.description = Some(description.clone());
            }
            if let Some(eta) = patch.eta {
                project.eta = eta;
            }
            if let Some(status) = patch.status {
                project.status = status;
            }
            project.updated_at = now;
            Ok(project.clone())
        })
    }

    fn delete_project(&self, id: &str) -> ApiResult<()> {
        self.authed(format!("DELETE /projects/{id}"), |state, user| {
            let index = state.project_index(user, id)?;
            let task_ids: Vec<EntityId> = state
                .tasks
                .iter()
                .filter(|task| task.project.points_to(id))
                .map(|task| task.id.clone())
                .collect();
            state
                .todos
                .retain(|todo| !task_ids.iter().any(|task_id| todo.task.points_to(task_id)));
            state.tasks.retain(|task| !task.project.points_to(id));
            state.projects.remove(index);
            Ok(())
        })
    }

    fn list_tasks(&self, query: &TaskQuery) -> ApiResult<Vec<Task>> {
        self.authed("GET /tasks".to_string(), |state, user| {
            let due = DateRange::new(query.start_date, query.end_date);
            Ok(state
                .tasks
                .iter()
                .filter(|task| task.user == user)
                .filter(|task| {
                    query
                        .project
                        .as_deref()
                        .map_or(true, |project| task.project.points_to(project))
                })
                .filter(|task| due.contains(task.due_date))
                .filter(|task| query.completed.map_or(true, |flag| task.completed == flag))
                .filter(|task| matches_priority(query.priority, task.priority))
                .map(|task| state.expand_task(task))
                .collect())
        })
    }

    fn get_task(&self, id: &str) -> ApiResult<Task> {
        self.authed(format!("GET /tasks/{id}"), |state, user| {
            let index = state.task_index(user, id)?;
            Ok(state.expand_task(&state.tasks[index]))
        })
    }

    fn create_task(&self, draft: &TaskDraft) -> ApiResult<Task> {
        self.authed("POST /tasks".to_string(), |state, user| {
            draft.validate()?;
            state.project_index(user, &draft.project)?;
            let now = state.now();
            let mut task = Task::new(
                state.next_id("task"),
                draft.name.trim(),
                draft.project.as_str(),
                draft.due_date,
            );
            task.description = draft.description.clone();
            task.module_name = draft.module_name.trim().to_string();
            task.priority = draft.priority.unwrap_or_default();
            task.user = user.to_string();
            task.created_at = now;
            task.updated_at = now;
            state.tasks.push(task.clone());
            state.refresh_project(&draft.project);
            Ok(state.expand_task(&task))
        })
    }

    fn update_task(&self, id: &str, patch: &TaskPatch) -> ApiResult<Task> {
        self.authed(format!("PUT /tasks/{id}"), |state, user| {
            patch.validate()?;
            let index = state.task_index(user, id)?;
            if let Some(project) = &patch.project {
                state.project_index(user, project)?;
            }
            let now = state.now();
            let previous_project = state.tasks[index].project_id().to_string();
            let task = &mut state.tasks[index];
            if let Some(name) = &patch.name {
                task.name = name.trim().to_string();
            }
            if let Some(description) = &patch.description {
                task.description = Some(description.clone());
            }
            if let Some(module_name) = &patch.module_name {
                task.module_name = module_name.trim().to_string();
            }
            if let Some(due_date) = patch.due_date {
                task.due_date = due_date;
            }
            if let Some(priority) = patch.priority {
                task.priority = priority;
            }
            if let Some(project) = &patch.project {
                task.project = ParentRef::Id(project.clone());
            }
            task.updated_at = now;
            let current_project = task.project_id().to_string();
            let updated = task.clone();

            state.refresh_project(&previous_project);
            if current_project != previous_project {
                state.refresh_project(&current_project);
            }
            Ok(state.expand_task(&updated))
        })
    }

    fn delete_task(&self, id: &str) -> ApiResult<()> {
        self.authed(format!("DELETE /tasks/{id}"), |state, user| {
            let index = state.task_index(user, id)?;
            let task = state.tasks.remove(index);
            state.todos.retain(|todo| !todo.task.points_to(id));
            state.refresh_project(task.project_id());
            Ok(())
        })
    }

    fn toggle_task(&self, id: &str) -> ApiResult<Task> {
        self.authed(format!("PATCH /tasks/{id}/toggle"), |state, user| {
            let index = state.task_index(user, id)?;
            let now = state.now();
            let task = &mut state.tasks[index];
            task.completed = !task.completed;
            task.updated_at = now;
            let toggled = task.clone();
            state.refresh_project(toggled.project_id());
            Ok(state.expand_task(&toggled))
        })
    }

    fn list_todos(&self, query: &TodoQuery) -> ApiResult<Vec<Todo>> {
        self.authed("GET /todos".to_string(), |state, user| {
            let due = DateRange::new(query.start_date, query.end_date);
            let created = DateRange::new(query.created_from, query.created_to);
            Ok(state
                .todos
                .iter()
                .filter(|todo| todo.user == user)
                .filter(|todo| {
                    query
                        .task
                        .as_deref()
                        .map_or(true, |task| todo.task.points_to(task))
                })
                .filter(|todo| due.contains(todo.due_date))
                .filter(|todo| created.contains(todo.created_at))
                .filter(|todo| query.completed.map_or(true, |flag| todo.completed == flag))
                .filter(|todo| matches_priority(query.priority, todo.priority))
                .map(|todo| state.expand_todo(todo))
                .collect())
        })
    }

    fn get_todo(&self, id: &str) -> ApiResult<Todo> {
        self.authed(format!("GET /todos/{id}"), |state, user| {
            let index = state.todo_index(user, id)?;
            Ok(state.expand_todo(&state.todos[index]))
        })
    }

    fn create_todo(&self, draft: &TodoDraft) -> ApiResult<Todo> {
        self.authed("POST /todos".to_string(), |state, user| {
            draft.validate()?;
            state.task_index(user, &draft.task)?;
            let now = state.now();
            let mut todo = Todo::new(
                state.next_id("todo"),
                draft.title.trim(),
                draft.task.as_str(),
                draft.due_date,
            );
            todo.description = draft.description.clone();
            todo.priority = draft.priority;
            todo.estimated_time = draft.estimated_time.unwrap_or(0);
            todo.user = user.to_string();
            todo.created_at = now;
            todo.updated_at = now;
            state.todos.push(todo.clone());
            state.refresh_task(&draft.task);
            Ok(state.expand_todo(&todo))
        })
    }

    fn update_todo(&self, id: &str, patch: &TodoPatch) -> ApiResult<Todo> {
        self.authed(format!("PUT /todos/{id}"), |state, user| {
            patch.validate()?;
            let index = state.todo_index(user, id)?;
            if let Some(task) = &patch.task {
                state.task_index(user, task)?;
            }
            let now = state.now();
            let previous_task = state.todos[index].task_id().to_string();
            let todo = &mut state.todos[index];
            if let Some(title) = &patch.title {
                todo.title = title.trim().to_string();
            }
            if let Some(description) = &patch.description {
                todo.description = Some(description.clone());
            }
            if let Some(due_date) = patch.due_date {
                todo.due_date = due_date;
            }
            if let Some(priority) = patch.priority {
                todo.priority = priority;
            }
            if let Some(estimated_time) = patch.estimated_time {
                todo.estimated_time = estimated_time;
            }
            if let Some(task) = &patch.task {
                todo.task = ParentRef::Id(task.clone());
            }
            todo.updated_at = now;
            let current_task = todo.task_id().to_string();
            let updated = todo.clone();

            state.refresh_task(&previous_task);
            if current_task != previous_task {
                state.refresh_task(&current_task);
            }
            Ok(state.expand_todo(&updated))
        })
    }

    fn delete_todo(&self, id: &str) -> ApiResult<()> {
        self.authed(format!("DELETE /todos/{id}"), |state, user| {
            let index = state.todo_index(user, id)?;
            let todo = state.todos.remove(index);
            state.refresh_task(todo.task_id());
            Ok(())
        })
    }

    fn toggle_todo(&self, id: &str) -> ApiResult<Todo> {
        self.authed(format!("PATCH /todos/{id}/toggle"), |state, user| {
            let index = state.todo_index(user, id)?;
            let now = state.now();
            let todo = &mut state.todos[index];
            todo.completed = !todo.completed;
            todo.updated_at = now;
            let toggled = todo.clone();
            state.refresh_task(toggled.task_id());
            Ok(state.expand_todo(&toggled))
        })
    }

    fn stats(&self) -> ApiResult<DashboardStats> {
        self.authed("GET /stats".to_string(), |state, user| {
            let projects: Vec<Project> = owned(&state.projects, |p| p.user == user);
            let tasks: Vec<Task> = owned(&state.tasks, |t| t.user == user);
            let todos: Vec<Todo> = owned(&state.todos, |t| t.user == user);
            Ok(compute_dashboard_stats(&projects, &tasks, &todos, state.now()))
        })
    }

    fn login(&self, credentials: &LoginCredentials) -> ApiResult<AuthResponse> {
        self.call("POST /auth/login".to_string(), |state| {
            let email = credentials.email.trim();
            let user = state
                .accounts
                .iter()
                .find(|account| {
                    account.user.email.eq_ignore_ascii_case(email)
                        && account.password == credentials.password
                })
                .map(|account| account.user.clone())
                .ok_or_else(|| ApiError::Status {
                    status: 401,
                    message: Some("Invalid credentials".to_string()),
                })?;
            let token = state.open_session(&user.id);
            Ok(AuthResponse {
                success: true,
                token,
                user,
            })
        })
    }

    fn register(&self, credentials: &RegisterCredentials) -> ApiResult<AuthResponse> {
        self.call("POST /auth/register".to_string(), |state| {
            credentials.validate()?;
            let email = credentials.email.trim();
            if state
                .accounts
                .iter()
                .any(|account| account.user.email.eq_ignore_ascii_case(email))
            {
                return Err(ApiError::Status {
                    status: 400,
                    message: Some("User already exists".to_string()),
                });
            }
            let user = User {
                id: state.next_id("user"),
                name: credentials.name.trim().to_string(),
                email: email.to_string(),
            };
            state.accounts.push(Account {
                user: user.clone(),
                password: credentials.password.clone(),
            });
            let token = state.open_session(&user.id);
            Ok(AuthResponse {
                success: true,
                token,
                user,
            })
        })
    }

    fn me(&self) -> ApiResult<User> {
        self.authed("GET /auth/me".to_string(), |state, user| {
            state
                .accounts
                .iter()
                .find(|account| account.user.id == user)
                .map(|account| account.user.clone())
                .ok_or(ApiError::Unauthorized)
        })
    }

    fn logout(&self) -> ApiResult<()> {
        self.authed("POST /auth/logout".to_string(), |state, _user| {
            if let Some(token) = state.token.take() {
                state.sessions.remove(&token);
            }
            Ok(())
        })
    }
}

fn not_found(kind: &'static str, id: &str) -> ApiError {
    ApiError::NotFound {
        kind,
        id: id.to_string(),
    }
}

fn matches_priority(wanted: Option<Priority>, actual: Priority) -> bool {
    wanted.map_or(true, |wanted| wanted == actual)
}

fn owned<T: Clone>(items: &[T], keep: impl Fn(&T) -> bool) -> Vec<T> {
    items.iter().filter(|item| keep(item)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::InMemoryApi;
    use crate::api::query::TaskQuery;
    use crate::api::{ApiError, TaskTreeApi};
    use crate::model::project::ProjectDraft;
    use crate::model::task::TaskDraft;
    use crate::model::todo::TodoDraft;
    use chrono::{TimeZone, Utc};

    #[test]
    fn data_endpoints_require_a_session() {
        let api = InMemoryApi::new();
        assert!(matches!(api.list_projects(), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn cascade_delete_and_aggregates() {
        let at = Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap();
        let api = InMemoryApi::signed_in("Ada", "ada@example.com");
        let project = api.create_project(&ProjectDraft::new("Website", at)).unwrap();
        let task = api
            .create_task(&TaskDraft::new(&project.id, "Auth", "backend", at))
            .unwrap();
        api.create_task(&TaskDraft::new(&project.id, "Docs", "docs", at))
            .unwrap();
        api.toggle_task(&task.id).unwrap();
        let todo = api
            .create_todo(&TodoDraft::new(&task.id, "Write handler", at))
            .unwrap();
        assert_eq!(todo.task.id(), task.id);
        assert!(todo.task.is_expanded());

        let refreshed = api.get_project(&project.id).unwrap();
        assert_eq!(refreshed.total_tasks, 2);
        assert_eq!(refreshed.completed_tasks, 1);
        assert_eq!(refreshed.completion_percentage, 50);
        assert_eq!(api.get_task(&task.id).unwrap().total_todos, 1);

        api.delete_project(&project.id).unwrap();
        assert!(api.list_tasks(&TaskQuery::default()).unwrap().is_empty());
        assert!(api.get_todo(&todo.id).unwrap_err().is_not_found());
    }

    #[test]
    fn fail_next_returns_server_message_once() {
        let api = InMemoryApi::signed_in("Ada", "ada@example.com");
        api.fail_next(500, "Server error");
        let error = api.list_projects().unwrap_err();
        assert_eq!(error.server_message(), Some("Server error"));
        assert!(api.list_projects().is_ok());
        assert_eq!(api.count_calls("GET /projects"), 2);
    }
}
