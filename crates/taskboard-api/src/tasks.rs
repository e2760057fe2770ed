//! Client for the `/tasks` endpoints.

use crate::models::{
    DeleteResponse, ItemBody, ListBody, NewTask, Page, Task, TaskQuery, TaskStatus, TaskUpdate,
};
use crate::path::resource_path;
use taskboard_auth::{AuthResult, RequestPipeline};
use tracing::debug;

/// Task CRUD over the shared request pipeline.
#[derive(Debug, Clone)]
pub struct TasksApi {
    pipeline: RequestPipeline,
}

impl TasksApi {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    /// Tasks of one project, optionally filtered by status.
    pub async fn list_by_project(
        &self,
        project_id: &str,
        status: Option<TaskStatus>,
    ) -> AuthResult<Vec<Task>> {
        let body: ListBody<Task> = self
            .pipeline
            .get_with_query(
                &resource_path("/tasks/project", project_id)?,
                &TaskQuery { status },
            )
            .await?;
        let tasks = Page::from(body).items;
        debug!(project_id = %project_id, count = tasks.len(), "Fetched tasks");
        Ok(tasks)
    }

    pub async fn get(&self, id: &str) -> AuthResult<Task> {
        let body: ItemBody<Task> = self.pipeline.get(&resource_path("/tasks", id)?).await?;
        Ok(body.into_inner())
    }

    pub async fn create(&self, task: &NewTask) -> AuthResult<Task> {
        let body: ItemBody<Task> = self.pipeline.post("/tasks", task).await?;
        let created = body.into_inner();
        debug!(task_id = %created.id, project_id = %created.project_id, "Created task");
        Ok(created)
    }

    /// Apply a partial update.
    pub async fn update(&self, id: &str, update: &TaskUpdate) -> AuthResult<Task> {
        let body: ItemBody<Task> = self.pipeline.put(&resource_path("/tasks", id)?, update).await?;
        Ok(body.into_inner())
    }

    pub async fn delete(&self, id: &str) -> AuthResult<DeleteResponse> {
        let body: Option<DeleteResponse> = self.pipeline.delete(&resource_path("/tasks", id)?).await?;
        debug!(task_id = %id, "Deleted task");
        Ok(body.unwrap_or_default())
    }
}
