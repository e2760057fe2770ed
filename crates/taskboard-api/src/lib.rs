//! Typed clients for the Taskboard project and task endpoints.
//!
//! These wrappers only know URLs and payload shapes. Authorization, 401
//! handling and error classification all live in the shared
//! [`taskboard_auth::RequestPipeline`].

mod models;
mod path;
mod projects;
mod tasks;

pub use models::{
    DeleteResponse, NewProject, NewTask, Page, Project, ProjectQuery, ProjectStatus,
    ProjectUpdate, Task, TaskStatus, TaskUpdate,
};
pub use projects::ProjectsApi;
pub use tasks::TasksApi;
