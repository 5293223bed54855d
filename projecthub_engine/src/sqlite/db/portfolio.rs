use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{DeliverySlot, NewPortfolioProject, PortfolioProject, PortfolioProjectUpdate},
    traits::CatalogApiError,
};

fn to_json(v: &[String]) -> Result<String, CatalogApiError> {
    serde_json::to_string(v).map_err(|e| CatalogApiError::DatabaseError(format!("Could not serialize list. {e}")))
}

pub async fn insert_portfolio_project(
    item: NewPortfolioProject,
    conn: &mut SqliteConnection,
) -> Result<PortfolioProject, CatalogApiError> {
    let row = sqlx::query_as::<_, PortfolioProject>(
        r#"INSERT INTO portfolio_projects (name, description, demo_url, price, features, tech_stacks, image_urls)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *"#,
    )
    .bind(&item.name)
    .bind(&item.description)
    .bind(&item.demo_url)
    .bind(&item.price)
    .bind(to_json(&item.features)?)
    .bind(to_json(&item.tech_stacks)?)
    .bind(to_json(&item.image_urls)?)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Catalog item #{} ({}) added", row.id, row.name);
    Ok(row)
}

pub async fn portfolio_project_by_id(
    item_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PortfolioProject>, CatalogApiError> {
    let row = sqlx::query_as::<_, PortfolioProject>("SELECT * FROM portfolio_projects WHERE id = $1")
        .bind(item_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn all_portfolio_projects(conn: &mut SqliteConnection) -> Result<Vec<PortfolioProject>, CatalogApiError> {
    let rows = sqlx::query_as::<_, PortfolioProject>("SELECT * FROM portfolio_projects ORDER BY created_at DESC")
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// Substring match on name and description, or exact (case-insensitive) membership in the tech stack list.
/// `json_each` unpacks the stored JSON array so membership is tested against whole entries, not substrings.
pub async fn search_portfolio_projects(
    term: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<PortfolioProject>, CatalogApiError> {
    let pattern = format!("%{}%", term.to_lowercase());
    let rows = sqlx::query_as::<_, PortfolioProject>(
        r#"SELECT * FROM portfolio_projects
        WHERE lower(name) LIKE $1
           OR lower(description) LIKE $1
           OR EXISTS (SELECT 1 FROM json_each(tech_stacks) WHERE lower(json_each.value) = $2)
        ORDER BY created_at DESC"#,
    )
    .bind(&pattern)
    .bind(term.to_lowercase())
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn update_portfolio_project(
    item_id: i64,
    update: PortfolioProjectUpdate,
    conn: &mut SqliteConnection,
) -> Result<PortfolioProject, CatalogApiError> {
    let image_urls = update.image_urls.as_deref().map(to_json).transpose()?;
    let row = sqlx::query_as::<_, PortfolioProject>(
        r#"UPDATE portfolio_projects SET
            name = $1, description = $2, demo_url = $3, price = $4, features = $5, tech_stacks = $6,
            image_urls = COALESCE($7, image_urls), updated_at = CURRENT_TIMESTAMP
        WHERE id = $8
        RETURNING *"#,
    )
    .bind(&update.name)
    .bind(&update.description)
    .bind(&update.demo_url)
    .bind(&update.price)
    .bind(to_json(&update.features)?)
    .bind(to_json(&update.tech_stacks)?)
    .bind(image_urls)
    .bind(item_id)
    .fetch_optional(conn)
    .await?;
    row.ok_or(CatalogApiError::ItemNotFound(item_id))
}

pub async fn delete_portfolio_project(item_id: i64, conn: &mut SqliteConnection) -> Result<(), CatalogApiError> {
    let result = sqlx::query("DELETE FROM portfolio_projects WHERE id = $1").bind(item_id).execute(conn).await?;
    if result.rows_affected() == 0 {
        return Err(CatalogApiError::ItemNotFound(item_id));
    }
    debug!("📝️ Catalog item #{item_id} removed");
    Ok(())
}

pub async fn set_delivery_slot(
    item_id: i64,
    slot: DeliverySlot,
    url: &str,
    conn: &mut SqliteConnection,
) -> Result<PortfolioProject, CatalogApiError> {
    let column = match slot {
        DeliverySlot::SetupVideo => "setup_video_url",
        DeliverySlot::ProjectCode => "project_code_url",
    };
    let sql = format!(
        "UPDATE portfolio_projects SET {column} = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *"
    );
    let row = sqlx::query_as::<_, PortfolioProject>(&sql).bind(url).bind(item_id).fetch_optional(conn).await?;
    row.ok_or(CatalogApiError::ItemNotFound(item_id))
}

/// Append-only update of the asset list. Run inside a transaction so two concurrent uploads cannot clobber
/// each other's reads.
pub async fn append_assets(
    item_id: i64,
    urls: Vec<String>,
    conn: &mut SqliteConnection,
) -> Result<PortfolioProject, CatalogApiError> {
    let item = portfolio_project_by_id(item_id, conn).await?.ok_or(CatalogApiError::ItemNotFound(item_id))?;
    let mut assets = item.asset_urls;
    assets.extend(urls);
    let row = sqlx::query_as::<_, PortfolioProject>(
        "UPDATE portfolio_projects SET asset_urls = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(to_json(&assets)?)
    .bind(item_id)
    .fetch_one(conn)
    .await?;
    Ok(row)
}
