//! The prebuilt project catalog and buy inquiries.

use log::*;

use crate::{
    db_types::{
        BuyRequest,
        BuyRequestWithUser,
        DeliverySlot,
        NewBuyRequest,
        NewPortfolioProject,
        PortfolioProject,
        PortfolioProjectUpdate,
    },
    traits::{CatalogApiError, CatalogManagement},
};

pub struct CatalogApi<B> {
    db: B,
}

impl<B> CatalogApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub async fn add_item(&self, item: NewPortfolioProject) -> Result<PortfolioProject, CatalogApiError> {
        self.db.insert_portfolio_project(item).await
    }

    pub async fn item(&self, item_id: i64) -> Result<PortfolioProject, CatalogApiError> {
        self.db.fetch_portfolio_project(item_id).await?.ok_or(CatalogApiError::ItemNotFound(item_id))
    }

    pub async fn list(&self) -> Result<Vec<PortfolioProject>, CatalogApiError> {
        self.db.fetch_portfolio_projects().await
    }

    pub async fn search(&self, term: &str) -> Result<Vec<PortfolioProject>, CatalogApiError> {
        self.db.search_portfolio_projects(term).await
    }

    pub async fn update_item(
        &self,
        item_id: i64,
        update: PortfolioProjectUpdate,
    ) -> Result<PortfolioProject, CatalogApiError> {
        self.db.update_portfolio_project(item_id, update).await
    }

    pub async fn delete_item(&self, item_id: i64) -> Result<(), CatalogApiError> {
        self.db.delete_portfolio_project(item_id).await
    }

    pub async fn set_delivery_slot(
        &self,
        item_id: i64,
        slot: DeliverySlot,
        url: &str,
    ) -> Result<PortfolioProject, CatalogApiError> {
        self.db.set_delivery_slot(item_id, slot, url).await
    }

    pub async fn append_assets(&self, item_id: i64, urls: Vec<String>) -> Result<PortfolioProject, CatalogApiError> {
        self.db.append_portfolio_assets(item_id, urls).await
    }

    /// Logs a buy inquiry for a catalog item. The item name is captured on the request so the record survives
    /// the item being deleted later.
    pub async fn submit_buy_request(&self, user_id: i64, item_id: i64) -> Result<BuyRequest, CatalogApiError> {
        let item = self.item(item_id).await?;
        let request =
            NewBuyRequest { user_id, portfolio_project_id: item_id, project_name: item.name.clone() };
        let row = self.db.insert_buy_request(request).await?;
        info!("💼️ User {user_id} is interested in '{}'", item.name);
        Ok(row)
    }

    pub async fn buy_requests(&self) -> Result<Vec<BuyRequestWithUser>, CatalogApiError> {
        self.db.fetch_buy_requests().await
    }
}
