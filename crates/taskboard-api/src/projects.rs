//! Client for the `/projects` endpoints.

use crate::models::{
    DeleteResponse, ItemBody, ListBody, NewProject, Page, Project, ProjectQuery, ProjectUpdate,
};
use crate::path::resource_path;
use taskboard_auth::{AuthResult, RequestPipeline};
use tracing::debug;

/// Project CRUD over the shared request pipeline.
#[derive(Debug, Clone)]
pub struct ProjectsApi {
    pipeline: RequestPipeline,
}

impl ProjectsApi {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    /// List projects, optionally paged and filtered.
    pub async fn list(&self, query: &ProjectQuery) -> AuthResult<Page<Project>> {
        let body: ListBody<Project> = self.pipeline.get_with_query("/projects", query).await?;
        let page = Page::from(body);
        debug!(count = page.items.len(), "Fetched projects");
        Ok(page)
    }

    pub async fn get(&self, id: &str) -> AuthResult<Project> {
        let body: ItemBody<Project> = self.pipeline.get(&resource_path("/projects", id)?).await?;
        Ok(body.into_inner())
    }

    pub async fn create(&self, project: &NewProject) -> AuthResult<Project> {
        let body: ItemBody<Project> = self.pipeline.post("/projects", project).await?;
        let created = body.into_inner();
        debug!(project_id = %created.id, "Created project");
        Ok(created)
    }

    /// Apply a partial update.
    pub async fn update(&self, id: &str, update: &ProjectUpdate) -> AuthResult<Project> {
        let body: ItemBody<Project> = self
            .pipeline
            .put(&resource_path("/projects", id)?, update)
            .await?;
        Ok(body.into_inner())
    }

    pub async fn delete(&self, id: &str) -> AuthResult<DeleteResponse> {
        let body: Option<DeleteResponse> =
            self.pipeline.delete(&resource_path("/projects", id)?).await?;
        debug!(project_id = %id, "Deleted project");
        Ok(body.unwrap_or_default())
    }
}
