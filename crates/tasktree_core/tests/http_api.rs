use serde_json::json;
use tasktree_core::{
    ApiError, ApiResult, HttpApi, LoginCredentials, Priority, ProjectDraft, TaskDraft, TaskQuery,
    TaskTreeApi,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Runs blocking gateway calls off the async test runtime.
async fn blocking<T: Send + 'static>(
    server: &MockServer,
    token: Option<&str>,
    call: impl FnOnce(&HttpApi) -> ApiResult<T> + Send + 'static,
) -> ApiResult<T> {
    let base = format!("{}/api/", server.uri());
    let token = token.map(str::to_string);
    tokio::task::spawn_blocking(move || {
        let api = HttpApi::new(&base).expect("client");
        api.set_auth_token(token);
        call(&api)
    })
    .await
    .expect("blocking task")
}

fn project_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "name": name,
        "eta": "2026-11-01T00:00:00Z",
        "status": "on-hold",
        "totalTasks": 2,
        "completedTasks": 1,
        "completionPercentage": 50
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn list_projects_sends_bearer_token_and_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "count": 1,
            "data": [project_json("p1", "Website")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let projects = blocking(&server, Some("tok-1"), |api| api.list_projects())
        .await
        .expect("projects");

    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "Website");
    assert_eq!(projects[0].completion_percentage, 50);
    assert_eq!(projects[0].status.as_str(), "on-hold");
}

#[tokio::test(flavor = "multi_thread")]
async fn list_tasks_forwards_filters_and_reads_expanded_project() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .and(query_param("project", "p1"))
        .and(query_param("completed", "false"))
        .and(query_param("priority", "high"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{
                "_id": "t1",
                "name": "Login page",
                "moduleName": "Auth",
                "dueDate": "2026-10-20T09:00:00Z",
                "priority": "high",
                "project": { "_id": "p1", "name": "Website" },
                "totalTodos": 3,
                "completedTodos": 1
            }]
        })))
        .mount(&server)
        .await;

    let query = TaskQuery {
        completed: Some(false),
        priority: Some(Priority::High),
        ..TaskQuery::for_project("p1")
    };
    let tasks = blocking(&server, Some("tok-1"), move |api| api.list_tasks(&query))
        .await
        .expect("tasks");

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].project_id(), "p1");
    assert!(tasks[0].project.is_expanded());
    assert_eq!(tasks[0].module_name, "Auth");
}

#[tokio::test(flavor = "multi_thread")]
async fn get_project_unwraps_a_single_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": project_json("p1", "Website")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let project = blocking(&server, Some("tok-1"), |api| api.get_project("p1"))
        .await
        .expect("project");

    assert_eq!(project.id, "p1");
    assert_eq!(project.total_tasks, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn create_task_posts_the_draft_and_decodes_the_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": {
                "_id": "t7",
                "name": "Login page",
                "moduleName": "Auth",
                "dueDate": "2026-10-20T09:00:00Z",
                "project": "p1"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let task = blocking(&server, Some("tok-1"), |api| {
        let due = chrono::DateTime::parse_from_rfc3339("2026-10-20T09:00:00Z")
            .expect("due")
            .with_timezone(&chrono::Utc);
        api.create_task(&TaskDraft::new("p1", "Login page", "Auth", due))
    })
    .await
    .expect("created task");

    assert_eq!(task.id, "t7");
    assert_eq!(task.project_id(), "p1");
}

#[tokio::test(flavor = "multi_thread")]
async fn task_list_survives_a_deleted_parent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {
                    "_id": "t1",
                    "name": "Kept",
                    "dueDate": "2026-10-20T09:00:00Z",
                    "project": { "_id": "p1", "name": "Website" }
                },
                {
                    "_id": "t2",
                    "name": "Orphan",
                    "moduleName": null,
                    "dueDate": "2026-10-20T09:00:00Z",
                    "project": null
                }
            ]
        })))
        .mount(&server)
        .await;

    let tasks = blocking(&server, Some("tok-1"), |api| {
        api.list_tasks(&TaskQuery::default())
    })
    .await
    .expect("tasks");

    assert_eq!(tasks.len(), 2);
    assert!(tasks[1].project.is_missing());
}

#[tokio::test(flavor = "multi_thread")]
async fn error_status_keeps_the_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "Project with this name already exists"
        })))
        .mount(&server)
        .await;

    let err = blocking(&server, Some("tok-1"), |api| {
        let eta = chrono::DateTime::parse_from_rfc3339("2026-11-01T00:00:00Z")
            .expect("eta")
            .with_timezone(&chrono::Utc);
        api.create_project(&ProjectDraft::new("Website", eta))
    })
    .await
    .expect_err("400 must fail");

    assert!(matches!(err, ApiError::Status { status: 400, .. }));
    assert_eq!(
        err.server_message(),
        Some("Project with this name already exists")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_token_maps_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Not authorized, no token"
        })))
        .mount(&server)
        .await;

    let err = blocking(&server, None, |api| api.stats())
        .await
        .expect_err("401 must fail");

    assert!(err.is_unauthorized());
}

#[tokio::test(flavor = "multi_thread")]
async fn toggle_todo_uses_patch_on_the_toggle_route() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/todos/d1/toggle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "_id": "d1",
                "title": "Write tests",
                "completed": true,
                "dueDate": "2026-10-20T09:00:00Z",
                "estimatedTime": 90,
                "task": "t1"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let todo = blocking(&server, Some("tok-1"), |api| api.toggle_todo("d1"))
        .await
        .expect("toggle");

    assert!(todo.completed);
    assert_eq!(todo.task_id(), "t1");
    assert_eq!(todo.estimated_time, 90);
}

#[tokio::test(flavor = "multi_thread")]
async fn login_posts_credentials_and_returns_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({
            "email": "ada@example.com",
            "password": "secret1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "jwt-abc",
            "user": { "id": "u1", "name": "Ada", "email": "ada@example.com" }
        })))
        .mount(&server)
        .await;

    let response = blocking(&server, None, |api| {
        api.login(&LoginCredentials::new("ada@example.com", "secret1"))
    })
    .await
    .expect("login");

    assert_eq!(response.token, "jwt-abc");
    assert_eq!(response.user.id, "u1");
}

#[tokio::test(flavor = "multi_thread")]
async fn unsuccessful_delete_envelope_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/t9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Task is locked"
        })))
        .mount(&server)
        .await;

    let err = blocking(&server, Some("tok-1"), |api| api.delete_task("t9"))
        .await
        .expect_err("unsuccessful envelope");

    assert_eq!(err.server_message(), Some("Task is locked"));
}
