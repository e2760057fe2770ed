//! CLI command implementations.

mod auth;
mod projects;
mod tasks;

pub use auth::{login, logout, register, status};
pub use projects::{projects_create, projects_delete, projects_list, projects_show, projects_update};
pub use tasks::{tasks_create, tasks_delete, tasks_list, tasks_show, tasks_update};

use anyhow::Result;
use std::io::{self, Write};
use taskboard_auth::{SessionManager, SessionState, User};

/// Return the signed-in user, or fail when there is no session.
fn require_session(manager: &SessionManager) -> Result<User> {
    match manager.state() {
        SessionState::Authenticated(user) => Ok(user),
        _ => anyhow::bail!("Not logged in. Run 'taskboard login' first"),
    }
}

/// Read one trimmed line from stdin after printing `label`.
fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
