//! Task commands.

use super::require_session;
use crate::output::{self, OutputFormat};
use anyhow::{bail, Result};
use taskboard_api::{NewTask, Task, TaskStatus, TaskUpdate, TasksApi};
use taskboard_auth::SessionManager;

fn print_task(task: &Task) {
    output::print_heading("Task Details");
    output::print_row("ID", &task.id);
    output::print_row("Title", &task.title);
    output::print_row("Status", task.status.as_str());
    output::print_row("Due", &task.due_date);
    output::print_row("Project", &task.project_id);
    if !task.description.is_empty() {
        output::print_row("Description", &task.description);
    }
}

/// List the tasks of a project.
pub async fn tasks_list(
    manager: &SessionManager,
    project_id: &str,
    status: Option<TaskStatus>,
    format: &OutputFormat,
) -> Result<()> {
    require_session(manager)?;
    let tasks = TasksApi::new(manager.pipeline().clone())
        .list_by_project(project_id, status)
        .await?;

    match format {
        OutputFormat::Text => {
            if tasks.is_empty() {
                println!("No tasks found");
            } else {
                println!("{:<26} {:<12} {:<12} {}", "ID", "Status", "Due", "Title");
                println!("{}", "-".repeat(80));
                for task in &tasks {
                    println!(
                        "{:<26} {:<12} {:<12} {}",
                        task.id,
                        task.status,
                        task.due_date,
                        output::truncate(&task.title, 40)
                    );
                }
            }
        }
        OutputFormat::Json => output::print_json(&tasks)?,
    }

    Ok(())
}

/// Show task details.
pub async fn tasks_show(manager: &SessionManager, id: &str, format: &OutputFormat) -> Result<()> {
    require_session(manager)?;
    let task = TasksApi::new(manager.pipeline().clone()).get(id).await?;

    match format {
        OutputFormat::Text => print_task(&task),
        OutputFormat::Json => output::print_json(&task)?,
    }
    Ok(())
}

/// Create a task.
pub async fn tasks_create(manager: &SessionManager, task: &NewTask, format: &OutputFormat) -> Result<()> {
    require_session(manager)?;
    let created = TasksApi::new(manager.pipeline().clone()).create(task).await?;

    match format {
        OutputFormat::Text => println!("Created task {} ({})", created.title, created.id),
        OutputFormat::Json => output::print_json(&created)?,
    }
    Ok(())
}

/// Update a task.
pub async fn tasks_update(
    manager: &SessionManager,
    id: &str,
    update: &TaskUpdate,
    format: &OutputFormat,
) -> Result<()> {
    if update.is_empty() {
        bail!("Nothing to update (use --title, --description, --due, --status or --project)");
    }

    require_session(manager)?;
    let updated = TasksApi::new(manager.pipeline().clone())
        .update(id, update)
        .await?;

    match format {
        OutputFormat::Text => print_task(&updated),
        OutputFormat::Json => output::print_json(&updated)?,
    }
    Ok(())
}

/// Delete a task.
pub async fn tasks_delete(manager: &SessionManager, id: &str, format: &OutputFormat) -> Result<()> {
    require_session(manager)?;
    let response = TasksApi::new(manager.pipeline().clone()).delete(id).await?;

    let message = response
        .message
        .unwrap_or_else(|| format!("Deleted task {}", id));
    output::print_success(&message, format);
    Ok(())
}
