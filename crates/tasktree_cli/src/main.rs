//! Command-line client.
//!
//! # Responsibility
//! - Verify `tasktree_core` linkage with a deterministic probe.
//! - Run session and read commands against the configured API.
//! - Run an offline demo against the in-process server.

use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::process::ExitCode;
use tasktree_core::derive::filter::{
    FilterSet, PriorityFilter, ProjectFilter, ProjectStatusFilter, Selection, StatusFilter,
    TaskFilter, TodoFilter,
};
use tasktree_core::derive::metrics::today;
use tasktree_core::derive::stats::overall_completion_rate;
use tasktree_core::service::views::{ProjectRow, TaskRow, TodoRow};
use tasktree_core::{
    init_logging_from, ClientConfig, FileSessionStore, HttpApi, InMemoryApi, LoginCredentials,
    MemorySessionStore, Priority, ProjectDraft, SessionStore, TaskDraft, TaskTreeApi, TodoDraft,
    Workspace,
};

#[derive(Parser)]
#[command(name = "tasktree")]
#[command(about = "Client for the tasktree project/task/todo service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print core ping and version
    Probe,

    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "TASKTREE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Print dashboard statistics
    Dashboard,

    /// List projects
    Projects {
        #[arg(long, default_value = "")]
        search: String,

        /// all | active | completed | on-hold
        #[arg(long, default_value = "all")]
        status: String,
    },

    /// List tasks
    Tasks {
        #[arg(long, default_value = "all")]
        project: String,

        #[arg(long, default_value = "")]
        search: String,

        /// all | pending | completed
        #[arg(long, default_value = "all")]
        status: String,

        /// all | low | medium | high
        #[arg(long, default_value = "all")]
        priority: String,
    },

    /// Run a scripted session against the in-process server
    Demo,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command.unwrap_or(Commands::Probe)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Probe => {
            println!("tasktree_core ping={}", tasktree_core::ping());
            println!("tasktree_core version={}", tasktree_core::core_version());
            Ok(())
        }
        Commands::Demo => run_demo(),
        other => {
            let config = ClientConfig::from_env()?;
            init_logging_from(&config)?;
            info!(
                "event=cli_start module=cli status=ok api={}",
                config.api_base_url
            );
            let api = HttpApi::from_config(&config)?;
            let mut workspace = Workspace::new(api, FileSessionStore::new(&config.session_dir));
            workspace.restore_session()?;
            run_remote(&mut workspace, other)
        }
    }
}

fn run_remote<A: TaskTreeApi, S: SessionStore>(
    workspace: &mut Workspace<A, S>,
    command: Commands,
) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Login { email, password } => {
            let user = workspace.login(&LoginCredentials::new(email, password));
            print_notices(workspace);
            if user.is_none() {
                return Err("login failed".into());
            }
        }
        Commands::Logout => {
            workspace.logout();
            print_notices(workspace);
        }
        Commands::Dashboard => print_dashboard(workspace)?,
        Commands::Projects { search, status } => {
            let filter = ProjectFilter {
                common: FilterSet::new().search(&search),
                status: ProjectStatusFilter::parse(&status)
                    .ok_or_else(|| format!("unknown project status `{status}`"))?,
            };
            for row in workspace.project_rows(&filter, today())? {
                print_project(&row);
            }
        }
        Commands::Tasks {
            project,
            search,
            status,
            priority,
        } => {
            let filter = TaskFilter {
                common: FilterSet::new()
                    .search(&search)
                    .status(
                        StatusFilter::parse(&status)
                            .ok_or_else(|| format!("unknown status `{status}`"))?,
                    )
                    .priority(
                        PriorityFilter::parse(&priority)
                            .ok_or_else(|| format!("unknown priority `{priority}`"))?,
                    ),
                project: Selection::parse(&project),
            };
            for row in workspace.task_rows(&filter, today())? {
                print_task(&row);
            }
        }
        Commands::Probe | Commands::Demo => {}
    }
    Ok(())
}

fn run_demo() -> Result<(), Box<dyn Error>> {
    let api = InMemoryApi::signed_in("Demo", "demo@example.com");
    let mut workspace = Workspace::new(api, MemorySessionStore::new());
    let now = chrono::Utc::now();
    let day = chrono::Duration::days(1);

    let project = workspace
        .create_project(&ProjectDraft::new("Website relaunch", now + day * 6))
        .ok_or("project was not created")?;
    let auth = workspace
        .create_task(
            &TaskDraft::new(&project.id, "Auth flow", "backend", now - day)
                .with_priority(Priority::High),
        )
        .ok_or("task was not created")?;
    let docs = workspace
        .create_task(&TaskDraft::new(&project.id, "API docs", "docs", now + day * 2))
        .ok_or("task was not created")?;
    workspace.create_todo(
        &TodoDraft::new(&auth.id, "Login endpoint", now).with_priority(Priority::High),
    );
    workspace.create_todo(&TodoDraft::new(&auth.id, "Session refresh", now + day));
    workspace.create_todo(&TodoDraft::new(&docs.id, "Publish reference", now + day * 2));
    workspace.toggle_task(&docs.id);
    print_notices(&mut workspace);

    println!();
    for row in workspace.project_rows(&ProjectFilter::default(), today())? {
        print_project(&row);
    }
    for row in workspace.task_rows(&TaskFilter::default(), today())? {
        print_task(&row);
    }
    let high_pending = TodoFilter {
        common: FilterSet::new()
            .status(StatusFilter::Pending)
            .priority(PriorityFilter::Only(Priority::High)),
        ..TodoFilter::default()
    };
    for row in workspace.todo_rows(&high_pending, today())? {
        print_todo(&row);
    }
    println!();
    print_dashboard(&mut workspace)
}

fn print_dashboard<A: TaskTreeApi, S: SessionStore>(
    workspace: &mut Workspace<A, S>,
) -> Result<(), Box<dyn Error>> {
    let stats = workspace.stats()?;
    println!(
        "projects total={} active={} completed={} on_hold={}",
        stats.projects.total,
        stats.projects.active,
        stats.projects.completed,
        stats.projects.status_distribution.on_hold
    );
    println!(
        "tasks total={} completed={} pending={} overdue={} rate={}%",
        stats.tasks.total,
        stats.tasks.completed,
        stats.tasks.pending,
        stats.tasks.overdue,
        stats.completion_rate.tasks
    );
    println!(
        "todos total={} completed={} pending={} overdue={} rate={}%",
        stats.todos.total,
        stats.todos.completed,
        stats.todos.pending,
        stats.todos.overdue,
        stats.completion_rate.todos
    );
    println!("overall completion={}%", overall_completion_rate(&stats));
    Ok(())
}

fn print_notices<A: TaskTreeApi, S: SessionStore>(workspace: &mut Workspace<A, S>) {
    for notice in workspace.take_notices() {
        println!("{notice}");
    }
}

fn print_project(row: &ProjectRow) {
    println!(
        "project {:<24} {:>3}% {:<10} {}",
        row.project.name,
        row.progress_percent,
        row.project.status,
        due_label(row.days_left, row.overdue, row.deadline_hint.as_deref())
    );
}

fn print_task(row: &TaskRow) {
    println!(
        "task    {:<24} [{}] {:<8} {:<16} todos {:>3}% {}",
        row.task.name,
        if row.task.completed { "x" } else { " " },
        row.task.priority,
        row.project.name,
        row.todo_progress_percent,
        due_label(row.days_left, row.overdue, row.deadline_hint.as_deref())
    );
}

fn print_todo(row: &TodoRow) {
    println!(
        "todo    {:<24} {:<8} {} / {} {}",
        row.todo.title,
        row.todo.priority,
        row.project.name,
        row.task.name,
        if row.overdue { "overdue" } else { "" }
    );
}

fn due_label(days_left: i64, overdue: bool, hint: Option<&str>) -> String {
    match (overdue, hint) {
        (true, _) => format!("overdue by {}d", -days_left),
        (false, Some(hint)) => hint.to_string(),
        (false, None) => format!("due in {days_left}d"),
    }
}
