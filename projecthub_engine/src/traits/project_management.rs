use thiserror::Error;

use crate::{
    db_types::{DeliveryFile, NewDeliveryFile, NewProject, Project, ProjectWithOwner},
    state::{InvalidTransition, StateChange},
};

#[derive(Debug, Clone, Error)]
pub enum ProjectApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Project {0} does not exist")]
    ProjectNotFound(i64),
    #[error("You do not have access to this project")]
    AccessDenied,
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

impl From<sqlx::Error> for ProjectApiError {
    fn from(e: sqlx::Error) -> Self {
        ProjectApiError::DatabaseError(e.to_string())
    }
}

/// Custom project requests and their lifecycle columns.
#[allow(async_fn_in_trait)]
pub trait ProjectManagement {
    /// Records a new project request. It starts in `Pending Admin Review` / `Not Quoted` with 0% completion.
    async fn insert_project(&self, project: NewProject) -> Result<Project, ProjectApiError>;

    async fn fetch_project(&self, project_id: i64) -> Result<Option<Project>, ProjectApiError>;

    /// The requesting user's own projects, newest first.
    async fn fetch_projects_for_user(&self, user_id: i64) -> Result<Vec<Project>, ProjectApiError>;

    /// Every project joined with owner contact details, newest first. Admin listing.
    async fn fetch_all_projects(&self) -> Result<Vec<ProjectWithOwner>, ProjectApiError>;

    /// Applies a [`StateChange`] to the project's lifecycle columns and returns the updated row.
    async fn update_project_state(&self, project_id: i64, change: StateChange) -> Result<Project, ProjectApiError>;

    /// Records delivery files against a project and forces it to `Delivered`, in one transaction.
    async fn attach_delivery_files(
        &self,
        project_id: i64,
        files: Vec<NewDeliveryFile>,
    ) -> Result<Vec<DeliveryFile>, ProjectApiError>;

    async fn fetch_delivery_files(&self, project_id: i64) -> Result<Vec<DeliveryFile>, ProjectApiError>;
}
