//! Taskboard CLI - manage projects and tasks against the Taskboard backend.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use taskboard_api::{ProjectStatus, TaskStatus};
use taskboard_auth::{InvalidationReason, SessionManager};
use taskboard_config::{init_logging, Config, Paths};
use tracing::{debug, info};

/// Taskboard CLI - sign in and manage projects and tasks.
#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Taskboard CLI for projects and tasks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login,

    /// Create an account and log in
    Register,

    /// Logout and clear the stored session
    Logout,

    /// Show the current session
    Status,

    /// Manage projects
    Projects {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// List projects
    List {
        /// Page number
        #[arg(long)]
        page: Option<u32>,
        /// Page size
        #[arg(long)]
        limit: Option<u32>,
        /// Filter by title
        #[arg(short, long)]
        search: Option<String>,
        /// Filter by status (active, completed)
        #[arg(long)]
        status: Option<ProjectStatus>,
    },
    /// Show project details and its tasks
    Show {
        /// Project ID
        id: String,
    },
    /// Create a project
    Create {
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Initial status (active, completed)
        #[arg(long)]
        status: Option<ProjectStatus>,
    },
    /// Update a project
    Update {
        /// Project ID
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<ProjectStatus>,
    },
    /// Delete a project
    Delete {
        /// Project ID
        id: String,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List the tasks of a project
    List {
        /// Project ID
        #[arg(short, long)]
        project: String,
        /// Filter by status (todo, in-progress, done)
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Show task details
    Show {
        /// Task ID
        id: String,
    },
    /// Create a task
    Create {
        /// Project ID
        #[arg(short, long)]
        project: String,
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Due date, e.g. 2024-05-01
        #[arg(long)]
        due: String,
        /// Initial status (todo, in-progress, done)
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Update a task
    Update {
        /// Task ID
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Move the task to this project
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

/// Load config, start logging, and restore the stored session.
async fn start(cli: &Cli) -> anyhow::Result<SessionManager> {
    let paths = Paths::new()?;
    paths.ensure_dirs()?;

    let mut config = Config::load(&paths)?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    init_logging(&paths, &config.log_level, false)?;

    let store = taskboard_storage::create_session_store(&paths)?;
    let manager = SessionManager::from_config(&config, store)?;

    let format = cli.format;
    manager.on_session_invalidated(move |event| match event.reason {
        InvalidationReason::AuthorizationDenied => {
            output::print_login_required(&event.login_route, &format)
        }
        InvalidationReason::Logout => debug!(route = %event.login_route, "Session closed"),
    });

    let state = manager.restore().await?;
    info!(authenticated = state.is_authenticated(), "CLI started");
    Ok(manager)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let manager = start(&cli).await?;
    let format = &cli.format;

    match cli.command {
        Commands::Login => commands::login(&manager, format).await,
        Commands::Register => commands::register(&manager, format).await,
        Commands::Logout => commands::logout(&manager, format),
        Commands::Status => commands::status(&manager, format),
        Commands::Projects { command } => match command {
            ProjectCommands::List {
                page,
                limit,
                search,
                status,
            } => {
                let query = taskboard_api::ProjectQuery {
                    page,
                    limit,
                    search,
                    status,
                };
                commands::projects_list(&manager, &query, format).await
            }
            ProjectCommands::Show { id } => commands::projects_show(&manager, &id, format).await,
            ProjectCommands::Create {
                title,
                description,
                status,
            } => {
                let project = taskboard_api::NewProject {
                    title,
                    description,
                    status,
                };
                commands::projects_create(&manager, &project, format).await
            }
            ProjectCommands::Update {
                id,
                title,
                description,
                status,
            } => {
                let update = taskboard_api::ProjectUpdate {
                    title,
                    description,
                    status,
                };
                commands::projects_update(&manager, &id, &update, format).await
            }
            ProjectCommands::Delete { id } => {
                commands::projects_delete(&manager, &id, format).await
            }
        },
        Commands::Tasks { command } => match command {
            TaskCommands::List { project, status } => {
                commands::tasks_list(&manager, &project, status, format).await
            }
            TaskCommands::Show { id } => commands::tasks_show(&manager, &id, format).await,
            TaskCommands::Create {
                project,
                title,
                description,
                due,
                status,
            } => {
                let task = taskboard_api::NewTask {
                    title,
                    description,
                    due_date: due,
                    project_id: project,
                    status,
                };
                commands::tasks_create(&manager, &task, format).await
            }
            TaskCommands::Update {
                id,
                title,
                description,
                due,
                status,
                project,
            } => {
                let update = taskboard_api::TaskUpdate {
                    title,
                    description,
                    status,
                    due_date: due,
                    project_id: project,
                };
                commands::tasks_update(&manager, &id, &update, format).await
            }
            TaskCommands::Delete { id } => commands::tasks_delete(&manager, &id, format).await,
        },
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = run(cli).await {
        output::print_error(&e.to_string(), &format);
        std::process::exit(1);
    }
}
