use tasktree_core::{
    FileSessionStore, InMemoryApi, LoginCredentials, MemorySessionStore, NoticeLevel,
    RegisterCredentials, Session, SessionStore, TaskTreeApi, User, Workspace,
};

fn session(token: &str) -> Session {
    Session {
        token: token.to_string(),
        user: User {
            id: "user-1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        },
    }
}

#[test]
fn file_store_round_trips_and_clears() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileSessionStore::new(dir.path().join("nested"));

    assert_eq!(store.load().expect("load empty"), None);
    store.save(&session("tok-1")).expect("save");
    assert!(store.path().exists());
    assert_eq!(store.load().expect("load"), Some(session("tok-1")));

    store.clear().expect("clear");
    assert!(!store.path().exists());
    store.clear().expect("clearing twice is fine");
}

#[test]
fn corrupt_session_file_is_discarded_on_restore() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileSessionStore::new(dir.path());
    std::fs::write(store.path(), "{not json").expect("write garbage");

    let mut workspace = Workspace::new(InMemoryApi::new(), store);
    let restored = workspace.restore_session().expect("restore");

    assert_eq!(restored, None);
    assert!(!workspace.session().is_authenticated());
    assert_eq!(workspace.api().auth_token(), None);
    assert!(!workspace.session().store().path().exists());
}

#[test]
fn login_persists_session_and_restores_in_a_new_workspace() {
    let dir = tempfile::tempdir().expect("tempdir");
    let api = InMemoryApi::new();
    api.seed_user("Ada", "ada@example.com", "secret1");

    let mut first = Workspace::new(api, FileSessionStore::new(dir.path()));
    let user = first
        .login(&LoginCredentials::new("ada@example.com", "secret1"))
        .expect("login");
    assert_eq!(user.name, "Ada");
    assert_eq!(first.notices()[0].message, "Login successful!");
    let token = first.api().auth_token().expect("token attached");

    let stored = FileSessionStore::new(dir.path())
        .load()
        .expect("load")
        .expect("stored session");
    assert_eq!(stored.token, token);
    assert_eq!(stored.user, user);
}

#[test]
fn login_clears_cached_data_from_the_previous_user() {
    let mut workspace = Workspace::new(
        InMemoryApi::signed_in("Ada", "ada@example.com"),
        MemorySessionStore::new(),
    );
    workspace.api().seed_user("Bob", "bob@example.com", "hunter22");
    workspace.projects().expect("projects");
    assert!(!workspace.cache().is_empty());

    workspace
        .login(&LoginCredentials::new("bob@example.com", "hunter22"))
        .expect("login");
    assert!(workspace.cache().is_empty());
}

#[test]
fn rejected_login_surfaces_the_server_message() {
    let mut workspace = Workspace::new(InMemoryApi::new(), MemorySessionStore::new());

    let user = workspace.login(&LoginCredentials::new("nobody@example.com", "secret1"));

    assert!(user.is_none());
    let notice = &workspace.notices()[0];
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Invalid credentials");
    assert!(!workspace.session().is_authenticated());
}

#[test]
fn malformed_login_never_reaches_the_server() {
    let mut workspace = Workspace::new(InMemoryApi::new(), MemorySessionStore::new());

    assert!(workspace
        .login(&LoginCredentials::new("not-an-email", "secret1"))
        .is_none());
    assert!(workspace.api().calls().is_empty());
    assert!(workspace.notices()[0].is_error());
}

#[test]
fn duplicate_registration_reports_existing_user() {
    let api = InMemoryApi::new();
    api.seed_user("Ada", "ada@example.com", "secret1");
    let mut workspace = Workspace::new(api, MemorySessionStore::new());

    let user = workspace.register(&RegisterCredentials::new("Ada", "ada@example.com", "secret1"));

    assert!(user.is_none());
    assert_eq!(workspace.notices()[0].message, "User already exists");

    let created = workspace
        .register(&RegisterCredentials::new("Grace", "grace@example.com", "secret1"))
        .expect("register");
    assert_eq!(created.email, "grace@example.com");
    assert_eq!(workspace.notices()[1].message, "Account created successfully!");
    assert!(workspace.session().is_authenticated());
}

#[test]
fn logout_clears_local_state_when_the_server_call_fails() {
    let store = MemorySessionStore::with_session(session("tok-stale"));
    let mut workspace = Workspace::new(InMemoryApi::signed_in("Ada", "ada@example.com"), store);
    workspace.projects().expect("projects");
    workspace.api().fail_next(500, "Server error");

    assert!(workspace.logout());

    assert!(workspace.cache().is_empty());
    assert_eq!(workspace.api().auth_token(), None);
    assert!(!workspace.session().is_authenticated());
    assert_eq!(workspace.session().store().load().expect("load"), None);
    assert_eq!(workspace.api().count_calls("POST /auth/logout"), 1);
}

#[test]
fn stale_token_is_dropped_by_verification() {
    let store = MemorySessionStore::with_session(session("tok-unknown"));
    let mut workspace = Workspace::new(InMemoryApi::new(), store);

    let restored = workspace.restore_session().expect("restore");
    assert_eq!(restored.map(|user| user.name), Some("Ada".to_string()));
    assert_eq!(workspace.api().auth_token().as_deref(), Some("tok-unknown"));

    assert_eq!(workspace.verify_session().expect("verify"), None);
    assert!(!workspace.session().is_authenticated());
    assert_eq!(workspace.api().auth_token(), None);
    assert_eq!(workspace.session().store().load().expect("load"), None);
}
