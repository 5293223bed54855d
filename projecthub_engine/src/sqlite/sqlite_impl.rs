//! `SqliteDatabase` is a concrete implementation of a marketplace engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};

use super::db::{buy_requests, db_url, delivery_files, new_pool, payments, portfolio, projects, users};
use crate::{
    db_types::{
        BuyRequest,
        BuyRequestWithUser,
        DeliveryFile,
        DeliverySlot,
        GatewayOrder,
        NewBuyRequest,
        NewDeliveryFile,
        NewGatewayOrder,
        NewPayment,
        NewPortfolioProject,
        NewProject,
        NewUser,
        Payment,
        PaymentWithContext,
        PendingUser,
        PortfolioProject,
        PortfolioProjectUpdate,
        Project,
        ProjectStatus,
        ProjectWithOwner,
        Role,
        User,
    },
    state::StateChange,
    traits::{
        AuthApiError,
        CatalogApiError,
        CatalogManagement,
        PaymentFlowError,
        PaymentLedger,
        ProjectApiError,
        ProjectManagement,
        UserManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Creates the database file if it does not exist yet.
    pub async fn create_database_if_missing(url: &str) -> Result<(), sqlx::Error> {
        if !Sqlite::database_exists(url).await? {
            info!("Creating new Sqlite database at {url}");
            Sqlite::create_database(url).await?;
        }
        Ok(())
    }

    /// Brings the schema up to date. Safe to call on every startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await.map_err(|e| sqlx::Error::Migrate(Box::new(e)))
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl UserManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::user_by_email(email, &mut conn).await
    }

    async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::user_by_id(user_id, &mut conn).await
    }

    async fn fetch_pending_users(&self) -> Result<Vec<PendingUser>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::pending_users(&mut conn).await
    }

    async fn activate_user(&self, user_id: i64) -> Result<User, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::activate_user(user_id, &mut conn).await?;
        info!("📝️ Account [{}] has been approved", user.email);
        Ok(user)
    }

    async fn assign_role(&self, user_id: i64, role: Role) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::assign_role(user_id, role, &mut conn).await
    }
}

impl ProjectManagement for SqliteDatabase {
    async fn insert_project(&self, project: NewProject) -> Result<Project, ProjectApiError> {
        let mut conn = self.pool.acquire().await?;
        projects::insert_project(project, &mut conn).await
    }

    async fn fetch_project(&self, project_id: i64) -> Result<Option<Project>, ProjectApiError> {
        let mut conn = self.pool.acquire().await?;
        projects::project_by_id(project_id, &mut conn).await
    }

    async fn fetch_projects_for_user(&self, user_id: i64) -> Result<Vec<Project>, ProjectApiError> {
        let mut conn = self.pool.acquire().await?;
        projects::projects_for_user(user_id, &mut conn).await
    }

    async fn fetch_all_projects(&self) -> Result<Vec<ProjectWithOwner>, ProjectApiError> {
        let mut conn = self.pool.acquire().await?;
        projects::all_projects(&mut conn).await
    }

    async fn update_project_state(&self, project_id: i64, change: StateChange) -> Result<Project, ProjectApiError> {
        let mut conn = self.pool.acquire().await?;
        projects::update_project_state(project_id, change, &mut conn).await
    }

    /// Stores the delivery files and forces the project to `Delivered`, in a single transaction.
    async fn attach_delivery_files(
        &self,
        project_id: i64,
        files: Vec<NewDeliveryFile>,
    ) -> Result<Vec<DeliveryFile>, ProjectApiError> {
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            let row = delivery_files::insert_delivery_file(project_id, file, &mut tx).await?;
            stored.push(row);
        }
        let change = StateChange { status: Some(ProjectStatus::Delivered), ..Default::default() };
        projects::update_project_state(project_id, change, &mut tx).await?;
        tx.commit().await?;
        info!("📝️ {} delivery file(s) attached to project #{project_id}", stored.len());
        Ok(stored)
    }

    async fn fetch_delivery_files(&self, project_id: i64) -> Result<Vec<DeliveryFile>, ProjectApiError> {
        let mut conn = self.pool.acquire().await?;
        delivery_files::files_for_project(project_id, &mut conn).await
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_portfolio_project(&self, item: NewPortfolioProject) -> Result<PortfolioProject, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        portfolio::insert_portfolio_project(item, &mut conn).await
    }

    async fn fetch_portfolio_project(&self, item_id: i64) -> Result<Option<PortfolioProject>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        portfolio::portfolio_project_by_id(item_id, &mut conn).await
    }

    async fn fetch_portfolio_projects(&self) -> Result<Vec<PortfolioProject>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        portfolio::all_portfolio_projects(&mut conn).await
    }

    async fn search_portfolio_projects(&self, term: &str) -> Result<Vec<PortfolioProject>, CatalogApiError> {
        let term = term.trim();
        let mut conn = self.pool.acquire().await?;
        if term.is_empty() {
            return portfolio::all_portfolio_projects(&mut conn).await;
        }
        portfolio::search_portfolio_projects(term, &mut conn).await
    }

    async fn update_portfolio_project(
        &self,
        item_id: i64,
        update: PortfolioProjectUpdate,
    ) -> Result<PortfolioProject, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        portfolio::update_portfolio_project(item_id, update, &mut conn).await
    }

    async fn delete_portfolio_project(&self, item_id: i64) -> Result<(), CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        portfolio::delete_portfolio_project(item_id, &mut conn).await
    }

    async fn set_delivery_slot(
        &self,
        item_id: i64,
        slot: DeliverySlot,
        url: &str,
    ) -> Result<PortfolioProject, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        portfolio::set_delivery_slot(item_id, slot, url, &mut conn).await
    }

    async fn append_portfolio_assets(
        &self,
        item_id: i64,
        urls: Vec<String>,
    ) -> Result<PortfolioProject, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let item = portfolio::append_assets(item_id, urls, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn insert_buy_request(&self, request: NewBuyRequest) -> Result<BuyRequest, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        buy_requests::insert_buy_request(request, &mut conn).await
    }

    async fn fetch_buy_requests(&self) -> Result<Vec<BuyRequestWithUser>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        buy_requests::all_buy_requests(&mut conn).await
    }
}

impl PaymentLedger for SqliteDatabase {
    async fn insert_gateway_order(&self, order: NewGatewayOrder) -> Result<GatewayOrder, PaymentFlowError> {
        let mut conn = self.pool.acquire().await?;
        payments::insert_gateway_order(order, &mut conn).await
    }

    async fn fetch_gateway_order(&self, order_id: &str) -> Result<Option<GatewayOrder>, PaymentFlowError> {
        let mut conn = self.pool.acquire().await?;
        payments::gateway_order_by_order_id(order_id, &mut conn).await
    }

    async fn fetch_payment(&self, gateway_payment_id: &str) -> Result<Option<Payment>, PaymentFlowError> {
        let mut conn = self.pool.acquire().await?;
        payments::payment_by_gateway_id(gateway_payment_id, &mut conn).await
    }

    /// Takes a verified payment, and in a single atomic transaction,
    /// * inserts it into the ledger. If the payment already exists, nothing further is done.
    /// * applies the accompanying project state change, if any.
    async fn record_verified_payment(
        &self,
        payment: NewPayment,
        project_update: Option<(i64, StateChange)>,
    ) -> Result<(Payment, bool), PaymentFlowError> {
        let mut tx = self.pool.begin().await?;
        let (row, replayed) = payments::idempotent_insert(payment, &mut tx).await?;
        if replayed {
            tx.commit().await?;
            debug!("🔄️ Payment {} replayed. Project state untouched.", row.gateway_payment_id);
            return Ok((row, true));
        }
        if let Some((project_id, change)) = project_update {
            projects::update_project_state(project_id, change, &mut tx)
                .await
                .map_err(|e| PaymentFlowError::DatabaseError(e.to_string()))?;
        }
        tx.commit().await?;
        debug!("🔄️ Payment {} of {} committed to the ledger", row.gateway_payment_id, row.amount);
        Ok((row, false))
    }

    async fn fetch_payments_for_user(&self, user_id: i64) -> Result<Vec<PaymentWithContext>, PaymentFlowError> {
        let mut conn = self.pool.acquire().await?;
        payments::payments_for_user(user_id, &mut conn).await
    }

    async fn fetch_payments_for_project(&self, project_id: i64) -> Result<Vec<Payment>, PaymentFlowError> {
        let mut conn = self.pool.acquire().await?;
        payments::payments_for_project(project_id, &mut conn).await
    }

    async fn fetch_all_payments(&self) -> Result<Vec<PaymentWithContext>, PaymentFlowError> {
        let mut conn = self.pool.acquire().await?;
        payments::all_payments(&mut conn).await
    }

    async fn fetch_payment_with_context(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<PaymentWithContext>, PaymentFlowError> {
        let mut conn = self.pool.acquire().await?;
        payments::payment_with_context(gateway_payment_id, &mut conn).await
    }

    async fn fetch_purchases_for_user(&self, user_id: i64) -> Result<Vec<PortfolioProject>, PaymentFlowError> {
        let mut conn = self.pool.acquire().await?;
        payments::purchases_for_user(user_id, &mut conn).await
    }
}
