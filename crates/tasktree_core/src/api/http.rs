//! Networked gateway over the REST API.
//!
//! # Responsibility
//! - Map each gateway method to its HTTP verb and path.
//! - Attach `Authorization: Bearer <token>` when a token is set.
//! - Translate status codes and envelopes into [`ApiError`].
//!
//! # Invariants
//! - Log lines carry method, path, status and duration only.
//! - The base URL never ends with `/`.

use crate::api::envelope::{Envelope, ErrorBody, MeResponse};
use crate::api::query::{TaskQuery, TodoQuery};
use crate::api::{ApiError, ApiResult, TaskTreeApi};
use crate::config::ClientConfig;
use crate::model::project::{Project, ProjectDraft, ProjectPatch};
use crate::model::stats::DashboardStats;
use crate::model::task::{Task, TaskDraft, TaskPatch};
use crate::model::todo::{Todo, TodoDraft, TodoPatch};
use crate::model::user::{AuthResponse, LoginCredentials, RegisterCredentials, User};
use log::{info, warn};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{PoisonError, RwLock};
use std::time::Instant;

/// Blocking HTTP gateway.
pub struct HttpApi {
    base_url: String,
    client: Client,
    token: RwLock<Option<String>>,
}

impl HttpApi {
    /// Builds a gateway for `base_url` (e.g. `http://localhost:5000/api`).
    ///
    /// # Errors
    /// - `Transport` when the HTTP client cannot be constructed.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            client,
            token: RwLock::new(None),
        })
    }

    pub fn from_config(config: &ClientConfig) -> ApiResult<Self> {
        Self::new(&config.api_base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match self.auth_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> ApiResult<T> {
        let started_at = Instant::now();
        let response = match build(self.request(method.clone(), path)).send() {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    "event=api_request module=api status=error method={} path={} error_kind=transport duration_ms={}",
                    method,
                    path,
                    started_at.elapsed().as_millis()
                );
                return Err(ApiError::Transport(err));
            }
        };

        let status = response.status();
        let body = response.text()?;
        let duration_ms = started_at.elapsed().as_millis();

        if !status.is_success() {
            warn!(
                "event=api_request module=api status=error method={} path={} http_status={} duration_ms={}",
                method,
                path,
                status.as_u16(),
                duration_ms
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: ErrorBody::message_from(&body),
            });
        }

        info!(
            "event=api_request module=api status=ok method={} path={} http_status={} duration_ms={}",
            method,
            path,
            status.as_u16(),
            duration_ms
        );
        Ok(serde_json::from_str(&body)?)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send::<Envelope<T>>(Method::GET, path, |builder| builder)?
            .into_data()
    }

    fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        pairs: Vec<(&'static str, String)>,
    ) -> ApiResult<Vec<T>> {
        self.send::<Envelope<Vec<T>>>(Method::GET, path, |builder| builder.query(&pairs))?
            .into_data()
    }

    fn with_body<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.send::<Envelope<T>>(method, path, |builder| builder.json(body))?
            .into_data()
    }

    fn without_body<T: DeserializeOwned>(&self, method: Method, path: &str) -> ApiResult<T> {
        self.send::<Envelope<T>>(method, path, |builder| builder)?
            .into_data()
    }

    fn delete(&self, path: &str) -> ApiResult<()> {
        self.send::<Envelope<Value>>(Method::DELETE, path, |builder| builder)?
            .check()
    }
}

impl TaskTreeApi for HttpApi {
    fn set_auth_token(&self, token: Option<String>) {
        let mut slot = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *slot = token.filter(|value| !value.trim().is_empty());
    }

    fn auth_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn list_projects(&self) -> ApiResult<Vec<Project>> {
        self.list("/projects", Vec::new())
    }

    fn get_project(&self, id: &str) -> ApiResult<Project> {
        self.get(&format!("/projects/{id}"))
    }

    fn create_project(&self, draft: &ProjectDraft) -> ApiResult<Project> {
        self.with_body(Method::POST, "/projects", draft)
    }

    fn update_project(&self, id: &str, patch: &ProjectPatch) -> ApiResult<Project> {
        self.with_body(Method::PUT, &format!("/projects/{id}"), patch)
    }

    fn delete_project(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/projects/{id}"))
    }

    fn list_tasks(&self, query: &TaskQuery) -> ApiResult<Vec<Task>> {
        self.list("/tasks", query.to_pairs())
    }

    fn get_task(&self, id: &str) -> ApiResult<Task> {
        self.get(&format!("/tasks/{id}"))
    }

    fn create_task(&self, draft: &TaskDraft) -> ApiResult<Task> {
        self.with_body(Method::POST, "/tasks", draft)
    }

    fn update_task(&self, id: &str, patch: &TaskPatch) -> ApiResult<Task> {
        self.with_body(Method::PUT, &format!("/tasks/{id}"), patch)
    }

    fn delete_task(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/tasks/{id}"))
    }

    fn toggle_task(&self, id: &str) -> ApiResult<Task> {
        self.without_body(Method::PATCH, &format!("/tasks/{id}/toggle"))
    }

    fn list_todos(&self, query: &TodoQuery) -> ApiResult<Vec<Todo>> {
        self.list("/todos", query.to_pairs())
    }

    fn get_todo(&self, id: &str) -> ApiResult<Todo> {
        self.get(&format!("/todos/{id}"))
    }

    fn create_todo(&self, draft: &TodoDraft) -> ApiResult<Todo> {
        self.with_body(Method::POST, "/todos", draft)
    }

    fn update_todo(&self, id: &str, patch: &TodoPatch) -> ApiResult<Todo> {
        self.with_body(Method::PUT, &format!("/todos/{id}"), patch)
    }

    fn delete_todo(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/todos/{id}"))
    }

    fn toggle_todo(&self, id: &str) -> ApiResult<Todo> {
        self.without_body(Method::PATCH, &format!("/todos/{id}/toggle"))
    }

    fn stats(&self) -> ApiResult<DashboardStats> {
        self.get("/stats")
    }

    fn login(&self, credentials: &LoginCredentials) -> ApiResult<AuthResponse> {
        let response: AuthResponse = self.send(Method::POST, "/auth/login", |builder| {
            builder.json(credentials)
        })?;
        check_auth(response)
    }

    fn register(&self, credentials: &RegisterCredentials) -> ApiResult<AuthResponse> {
        let response: AuthResponse = self.send(Method::POST, "/auth/register", |builder| {
            builder.json(credentials)
        })?;
        check_auth(response)
    }

    fn me(&self) -> ApiResult<User> {
        let response: MeResponse = self.send(Method::GET, "/auth/me", |builder| builder)?;
        if !response.success {
            return Err(ApiError::Unauthorized);
        }
        Ok(response.user)
    }

    fn logout(&self) -> ApiResult<()> {
        self.send::<Envelope<Value>>(Method::POST, "/auth/logout", |builder| builder)?
            .check()
    }
}

fn check_auth(response: AuthResponse) -> ApiResult<AuthResponse> {
    if response.token.trim().is_empty() {
        return Err(ApiError::Decode("auth response has an empty token".to_string()));
    }
    Ok(response)
}
