use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProject, Project, ProjectWithOwner},
    state::StateChange,
    traits::ProjectApiError,
};

pub async fn insert_project(project: NewProject, conn: &mut SqliteConnection) -> Result<Project, ProjectApiError> {
    let attachments = serde_json::to_string(&project.attachments)
        .map_err(|e| ProjectApiError::DatabaseError(format!("Could not serialize attachments. {e}")))?;
    let row = sqlx::query_as::<_, Project>(
        r#"INSERT INTO projects (
            user_id, project_name, project_summary, project_details, budget_estimate,
            completion_date, contact_name, contact_details, attachments
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *"#,
    )
    .bind(project.user_id)
    .bind(&project.project_name)
    .bind(&project.project_summary)
    .bind(&project.project_details)
    .bind(&project.budget_estimate)
    .bind(project.completion_date)
    .bind(&project.contact_name)
    .bind(&project.contact_details)
    .bind(attachments)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Project request #{} ({}) recorded", row.id, row.project_name);
    Ok(row)
}

pub async fn project_by_id(project_id: i64, conn: &mut SqliteConnection) -> Result<Option<Project>, ProjectApiError> {
    let row = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(project_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn projects_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Project>, ProjectApiError> {
    let rows = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE user_id = $1 ORDER BY created_at DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

pub async fn all_projects(conn: &mut SqliteConnection) -> Result<Vec<ProjectWithOwner>, ProjectApiError> {
    let rows = sqlx::query_as::<_, ProjectWithOwner>(
        r#"SELECT projects.*, users.email AS user_email, users.contact AS user_contact
        FROM projects INNER JOIN users ON projects.user_id = users.id
        ORDER BY projects.created_at DESC"#,
    )
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Applies the non-`None` fields of a [`StateChange`] to the project row. The generated UPDATE only touches the
/// columns the change names.
pub async fn update_project_state(
    project_id: i64,
    change: StateChange,
    conn: &mut SqliteConnection,
) -> Result<Project, ProjectApiError> {
    let mut builder = sqlx::QueryBuilder::new("UPDATE projects SET updated_at = CURRENT_TIMESTAMP");
    if let Some(status) = change.status {
        builder.push(", status = ").push_bind(status.to_string());
    }
    if let Some(payment_status) = change.payment_status {
        builder.push(", payment_status = ").push_bind(payment_status.to_string());
    }
    if let Some(quote) = change.final_quote {
        builder.push(", final_quote = ").push_bind(quote);
    }
    if let Some(pct) = change.completion_percentage {
        builder.push(", completion_percentage = ").push_bind(pct);
    }
    builder.push(" WHERE id = ").push_bind(project_id).push(" RETURNING *");
    let row = builder.build_query_as::<Project>().fetch_optional(conn).await?;
    let row = row.ok_or(ProjectApiError::ProjectNotFound(project_id))?;
    debug!("📝️ Project #{project_id} is now '{}' / '{}'", row.status, row.payment_status);
    Ok(row)
}
