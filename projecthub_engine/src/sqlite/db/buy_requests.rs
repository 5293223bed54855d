use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{BuyRequest, BuyRequestWithUser, NewBuyRequest},
    traits::CatalogApiError,
};

pub async fn insert_buy_request(
    request: NewBuyRequest,
    conn: &mut SqliteConnection,
) -> Result<BuyRequest, CatalogApiError> {
    let row = sqlx::query_as::<_, BuyRequest>(
        r#"INSERT INTO buy_requests (user_id, portfolio_project_id, project_name)
        VALUES ($1, $2, $3)
        RETURNING *"#,
    )
    .bind(request.user_id)
    .bind(request.portfolio_project_id)
    .bind(&request.project_name)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Buy inquiry #{} logged for catalog item '{}'", row.id, row.project_name);
    Ok(row)
}

pub async fn all_buy_requests(conn: &mut SqliteConnection) -> Result<Vec<BuyRequestWithUser>, CatalogApiError> {
    let rows = sqlx::query_as::<_, BuyRequestWithUser>(
        r#"SELECT buy_requests.*, users.email AS user_email, users.contact AS user_contact
        FROM buy_requests INNER JOIN users ON buy_requests.user_id = users.id
        ORDER BY buy_requests.created_at DESC"#,
    )
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
