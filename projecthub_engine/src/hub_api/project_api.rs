//! Custom project requests, their lifecycle and delivery.

use log::*;
use serde::Serialize;

use crate::{
    db_types::{DeliveryFile, NewDeliveryFile, NewProject, Payment, Project, ProjectStatus, ProjectWithOwner},
    state::{apply, LifecycleView, ProjectEvent, StateChange},
    traits::{PaymentLedger, ProjectApiError, ProjectManagement},
};

/// A project together with its payments and delivery files, as returned by the owner-facing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub payments: Vec<Payment>,
    pub delivery_files: Vec<DeliveryFile>,
}

pub struct ProjectApi<B> {
    db: B,
}

impl<B> ProjectApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> ProjectApi<B>
where B: ProjectManagement
{
    pub async fn submit_request(&self, project: NewProject) -> Result<Project, ProjectApiError> {
        self.db.insert_project(project).await
    }

    pub async fn projects_for_user(&self, user_id: i64) -> Result<Vec<Project>, ProjectApiError> {
        self.db.fetch_projects_for_user(user_id).await
    }

    pub async fn all_projects(&self) -> Result<Vec<ProjectWithOwner>, ProjectApiError> {
        self.db.fetch_all_projects().await
    }

    /// Admin sets (or revises) the quote on a project, in whole rupees.
    pub async fn send_quote(&self, project_id: i64, amount_rupees: i64) -> Result<Project, ProjectApiError> {
        self.apply_event(project_id, ProjectEvent::QuoteSent(amount_rupees)).await
    }

    /// Admin reports build progress. Hitting 100% moves the project to `Awaiting Final Payment`.
    pub async fn set_progress(&self, project_id: i64, percentage: i64) -> Result<Project, ProjectApiError> {
        self.apply_event(project_id, ProjectEvent::ProgressSet(percentage)).await
    }

    /// Admin moves the project to an arbitrary known status, bypassing the usual transition rules.
    pub async fn override_status(&self, project_id: i64, status: ProjectStatus) -> Result<Project, ProjectApiError> {
        warn!("💼️ Admin override: moving project #{project_id} to '{status}'");
        self.apply_event(project_id, ProjectEvent::AdminOverride(status)).await
    }

    /// Stores delivery files against the project and marks it `Delivered`.
    pub async fn attach_delivery_files(
        &self,
        project_id: i64,
        files: Vec<NewDeliveryFile>,
    ) -> Result<Vec<DeliveryFile>, ProjectApiError> {
        // Existence check up front so a bad id fails before any file rows are written.
        let _ = self.db.fetch_project(project_id).await?.ok_or(ProjectApiError::ProjectNotFound(project_id))?;
        self.db.attach_delivery_files(project_id, files).await
    }

    async fn apply_event(&self, project_id: i64, event: ProjectEvent) -> Result<Project, ProjectApiError> {
        let project =
            self.db.fetch_project(project_id).await?.ok_or(ProjectApiError::ProjectNotFound(project_id))?;
        let view = LifecycleView {
            status: project.status,
            payment_status: project.payment_status,
            final_quote: project.final_quote,
            completion_percentage: project.completion_percentage,
        };
        let change: StateChange = apply(view, event)?;
        self.db.update_project_state(project_id, change).await
    }
}

impl<B> ProjectApi<B>
where B: ProjectManagement + PaymentLedger
{
    /// Fetches the full detail for a project. Non-admin callers only see their own projects; anything else is
    /// [`ProjectApiError::AccessDenied`].
    pub async fn project_detail(
        &self,
        project_id: i64,
        requester_id: i64,
        is_admin: bool,
    ) -> Result<ProjectDetail, ProjectApiError> {
        let project =
            self.db.fetch_project(project_id).await?.ok_or(ProjectApiError::ProjectNotFound(project_id))?;
        if !is_admin && project.user_id != requester_id {
            return Err(ProjectApiError::AccessDenied);
        }
        self.detail_for(project).await
    }

    /// The caller's own projects, newest first, each carrying its payments and delivery files.
    pub async fn detailed_projects_for_user(&self, user_id: i64) -> Result<Vec<ProjectDetail>, ProjectApiError> {
        let projects = self.db.fetch_projects_for_user(user_id).await?;
        let mut details = Vec::with_capacity(projects.len());
        for project in projects {
            details.push(self.detail_for(project).await?);
        }
        Ok(details)
    }

    async fn detail_for(&self, project: Project) -> Result<ProjectDetail, ProjectApiError> {
        let payments = self
            .db
            .fetch_payments_for_project(project.id)
            .await
            .map_err(|e| ProjectApiError::DatabaseError(e.to_string()))?;
        let delivery_files = self.db.fetch_delivery_files(project.id).await?;
        Ok(ProjectDetail { project, payments, delivery_files })
    }
}
