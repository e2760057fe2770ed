//! Project commands.

use super::require_session;
use crate::output::{self, OutputFormat};
use anyhow::{bail, Result};
use taskboard_api::{
    NewProject, Project, ProjectQuery, ProjectUpdate, ProjectsApi, TasksApi,
};
use taskboard_auth::SessionManager;

fn print_project(project: &Project) {
    output::print_heading("Project Details");
    output::print_row("ID", &project.id);
    output::print_row("Title", &project.title);
    output::print_row("Status", project.status.as_str());
    if !project.description.is_empty() {
        output::print_row("Description", &project.description);
    }
    if let Some(created_at) = &project.created_at {
        output::print_row("Created", &created_at.format("%Y-%m-%d %H:%M").to_string());
    }
    if let Some(updated_at) = &project.updated_at {
        output::print_row("Updated", &updated_at.format("%Y-%m-%d %H:%M").to_string());
    }
}

/// List projects.
pub async fn projects_list(
    manager: &SessionManager,
    query: &ProjectQuery,
    format: &OutputFormat,
) -> Result<()> {
    require_session(manager)?;
    let page = ProjectsApi::new(manager.pipeline().clone())
        .list(query)
        .await?;

    match format {
        OutputFormat::Text => {
            if page.items.is_empty() {
                println!("No projects found");
            } else {
                println!("{:<26} {:<40} {}", "ID", "Title", "Status");
                println!("{}", "-".repeat(80));
                for project in &page.items {
                    println!(
                        "{:<26} {:<40} {}",
                        project.id,
                        output::truncate(&project.title, 40),
                        project.status
                    );
                }
                if let (Some(current), Some(total_pages)) = (page.page, page.total_pages) {
                    println!();
                    println!("Page {} of {}", current, total_pages);
                }
            }
        }
        OutputFormat::Json => output::print_json(&page)?,
    }

    Ok(())
}

/// Show a project with its tasks.
pub async fn projects_show(manager: &SessionManager, id: &str, format: &OutputFormat) -> Result<()> {
    require_session(manager)?;
    let project = ProjectsApi::new(manager.pipeline().clone()).get(id).await?;
    let tasks = TasksApi::new(manager.pipeline().clone())
        .list_by_project(id, None)
        .await?;

    match format {
        OutputFormat::Text => {
            print_project(&project);
            println!();
            if tasks.is_empty() {
                println!("No tasks");
            } else {
                println!("{:<26} {:<12} {:<12} {}", "Task ID", "Status", "Due", "Title");
                for task in &tasks {
                    println!(
                        "{:<26} {:<12} {:<12} {}",
                        task.id, task.status, task.due_date, task.title
                    );
                }
            }
        }
        OutputFormat::Json => {
            output::print_json(&serde_json::json!({ "project": project, "tasks": tasks }))?
        }
    }

    Ok(())
}

/// Create a project.
pub async fn projects_create(
    manager: &SessionManager,
    project: &NewProject,
    format: &OutputFormat,
) -> Result<()> {
    require_session(manager)?;
    let created = ProjectsApi::new(manager.pipeline().clone())
        .create(project)
        .await?;

    match format {
        OutputFormat::Text => println!("Created project {} ({})", created.title, created.id),
        OutputFormat::Json => output::print_json(&created)?,
    }
    Ok(())
}

/// Update a project.
pub async fn projects_update(
    manager: &SessionManager,
    id: &str,
    update: &ProjectUpdate,
    format: &OutputFormat,
) -> Result<()> {
    if update.is_empty() {
        bail!("Nothing to update (use --title, --description or --status)");
    }

    require_session(manager)?;
    let updated = ProjectsApi::new(manager.pipeline().clone())
        .update(id, update)
        .await?;

    match format {
        OutputFormat::Text => print_project(&updated),
        OutputFormat::Json => output::print_json(&updated)?,
    }
    Ok(())
}

/// Delete a project.
pub async fn projects_delete(manager: &SessionManager, id: &str, format: &OutputFormat) -> Result<()> {
    require_session(manager)?;
    let response = ProjectsApi::new(manager.pipeline().clone())
        .delete(id)
        .await?;

    let message = response
        .message
        .unwrap_or_else(|| format!("Deleted project {}", id));
    output::print_success(&message, format);
    Ok(())
}
