use sqlx::SqliteConnection;

use crate::{
    db_types::{DeliveryFile, NewDeliveryFile},
    traits::ProjectApiError,
};

pub async fn insert_delivery_file(
    project_id: i64,
    file: NewDeliveryFile,
    conn: &mut SqliteConnection,
) -> Result<DeliveryFile, ProjectApiError> {
    let row = sqlx::query_as::<_, DeliveryFile>(
        r#"INSERT INTO delivery_files (project_id, filename, url, file_type)
        VALUES ($1, $2, $3, $4)
        RETURNING *"#,
    )
    .bind(project_id)
    .bind(&file.filename)
    .bind(&file.url)
    .bind(file.file_type)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

pub async fn files_for_project(
    project_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<DeliveryFile>, ProjectApiError> {
    let rows = sqlx::query_as::<_, DeliveryFile>(
        "SELECT * FROM delivery_files WHERE project_id = $1 ORDER BY created_at ASC",
    )
    .bind(project_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
