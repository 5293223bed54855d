use thiserror::Error;

use crate::db_types::{
    BuyRequest,
    BuyRequestWithUser,
    DeliverySlot,
    NewBuyRequest,
    NewPortfolioProject,
    PortfolioProject,
    PortfolioProjectUpdate,
};

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Catalog item {0} does not exist")]
    ItemNotFound(i64),
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}

/// The prebuilt project catalog, its delivery artifacts and buy inquiries.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn insert_portfolio_project(&self, item: NewPortfolioProject) -> Result<PortfolioProject, CatalogApiError>;

    async fn fetch_portfolio_project(&self, item_id: i64) -> Result<Option<PortfolioProject>, CatalogApiError>;

    /// The full catalog, newest first.
    async fn fetch_portfolio_projects(&self) -> Result<Vec<PortfolioProject>, CatalogApiError>;

    /// Items whose name or description contains `term` (case-insensitive), or whose tech stack contains `term`
    /// exactly (case-insensitive membership). A blank term returns the full catalog.
    async fn search_portfolio_projects(&self, term: &str) -> Result<Vec<PortfolioProject>, CatalogApiError>;

    async fn update_portfolio_project(
        &self,
        item_id: i64,
        update: PortfolioProjectUpdate,
    ) -> Result<PortfolioProject, CatalogApiError>;

    async fn delete_portfolio_project(&self, item_id: i64) -> Result<(), CatalogApiError>;

    /// Replaces the setup video or project code artifact. Each slot holds at most one file.
    async fn set_delivery_slot(
        &self,
        item_id: i64,
        slot: DeliverySlot,
        url: &str,
    ) -> Result<PortfolioProject, CatalogApiError>;

    /// Appends asset URLs to the item's list. Read-modify-write runs in one transaction so concurrent uploads
    /// cannot drop each other's entries.
    async fn append_portfolio_assets(
        &self,
        item_id: i64,
        urls: Vec<String>,
    ) -> Result<PortfolioProject, CatalogApiError>;

    async fn insert_buy_request(&self, request: NewBuyRequest) -> Result<BuyRequest, CatalogApiError>;

    /// All buy inquiries joined with requester contact details, newest first. Admin listing.
    async fn fetch_buy_requests(&self) -> Result<Vec<BuyRequestWithUser>, CatalogApiError>;
}
