use mockall::mock;
use ph_common::Paise;
use projecthub_engine::{
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

use crate::{
    errors::ServerError,
    gateway::{GatewayOrderResponse, PaymentGateway},
};

mock! {
    pub UserManager {}
    impl UserManagement for UserManager {
        async fn insert_user(&self, user: NewUser) -> Result<User, AuthApiError>;
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError>;
        async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, AuthApiError>;
        async fn fetch_pending_users(&self) -> Result<Vec<PendingUser>, AuthApiError>;
        async fn activate_user(&self, user_id: i64) -> Result<User, AuthApiError>;
        async fn assign_role(&self, user_id: i64, role: Role) -> Result<(), AuthApiError>;
    }
}

mock! {
    pub ProjectManager {}
    impl ProjectManagement for ProjectManager {
        async fn insert_project(&self, project: NewProject) -> Result<Project, ProjectApiError>;
        async fn fetch_project(&self, project_id: i64) -> Result<Option<Project>, ProjectApiError>;
        async fn fetch_projects_for_user(&self, user_id: i64) -> Result<Vec<Project>, ProjectApiError>;
        async fn fetch_all_projects(&self) -> Result<Vec<ProjectWithOwner>, ProjectApiError>;
        async fn update_project_state(&self, project_id: i64, change: StateChange) -> Result<Project, ProjectApiError>;
        async fn attach_delivery_files(&self, project_id: i64, files: Vec<NewDeliveryFile>) -> Result<Vec<DeliveryFile>, ProjectApiError>;
        async fn fetch_delivery_files(&self, project_id: i64) -> Result<Vec<DeliveryFile>, ProjectApiError>;
    }
}

// A backend covering every storage trait, for routes bounded on `PaymentBackend`.
mock! {
    pub Backend {}
    impl UserManagement for Backend {
        async fn insert_user(&self, user: NewUser) -> Result<User, AuthApiError>;
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError>;
        async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, AuthApiError>;
        async fn fetch_pending_users(&self) -> Result<Vec<PendingUser>, AuthApiError>;
        async fn activate_user(&self, user_id: i64) -> Result<User, AuthApiError>;
        async fn assign_role(&self, user_id: i64, role: Role) -> Result<(), AuthApiError>;
    }
    impl ProjectManagement for Backend {
        async fn insert_project(&self, project: NewProject) -> Result<Project, ProjectApiError>;
        async fn fetch_project(&self, project_id: i64) -> Result<Option<Project>, ProjectApiError>;
        async fn fetch_projects_for_user(&self, user_id: i64) -> Result<Vec<Project>, ProjectApiError>;
        async fn fetch_all_projects(&self) -> Result<Vec<ProjectWithOwner>, ProjectApiError>;
        async fn update_project_state(&self, project_id: i64, change: StateChange) -> Result<Project, ProjectApiError>;
        async fn attach_delivery_files(&self, project_id: i64, files: Vec<NewDeliveryFile>) -> Result<Vec<DeliveryFile>, ProjectApiError>;
        async fn fetch_delivery_files(&self, project_id: i64) -> Result<Vec<DeliveryFile>, ProjectApiError>;
    }
    impl CatalogManagement for Backend {
        async fn insert_portfolio_project(&self, item: NewPortfolioProject) -> Result<PortfolioProject, CatalogApiError>;
        async fn fetch_portfolio_project(&self, item_id: i64) -> Result<Option<PortfolioProject>, CatalogApiError>;
        async fn fetch_portfolio_projects(&self) -> Result<Vec<PortfolioProject>, CatalogApiError>;
        async fn search_portfolio_projects(&self, term: &str) -> Result<Vec<PortfolioProject>, CatalogApiError>;
        async fn update_portfolio_project(&self, item_id: i64, update: PortfolioProjectUpdate) -> Result<PortfolioProject, CatalogApiError>;
        async fn delete_portfolio_project(&self, item_id: i64) -> Result<(), CatalogApiError>;
        async fn set_delivery_slot(&self, item_id: i64, slot: DeliverySlot, url: &str) -> Result<PortfolioProject, CatalogApiError>;
        async fn append_portfolio_assets(&self, item_id: i64, urls: Vec<String>) -> Result<PortfolioProject, CatalogApiError>;
        async fn insert_buy_request(&self, request: NewBuyRequest) -> Result<BuyRequest, CatalogApiError>;
        async fn fetch_buy_requests(&self) -> Result<Vec<BuyRequestWithUser>, CatalogApiError>;
    }
    impl PaymentLedger for Backend {
        async fn insert_gateway_order(&self, order: NewGatewayOrder) -> Result<GatewayOrder, PaymentFlowError>;
        async fn fetch_gateway_order(&self, order_id: &str) -> Result<Option<GatewayOrder>, PaymentFlowError>;
        async fn fetch_payment(&self, gateway_payment_id: &str) -> Result<Option<Payment>, PaymentFlowError>;
        async fn record_verified_payment(&self, payment: NewPayment, project_update: Option<(i64, StateChange)>) -> Result<(Payment, bool), PaymentFlowError>;
        async fn fetch_payments_for_user(&self, user_id: i64) -> Result<Vec<PaymentWithContext>, PaymentFlowError>;
        async fn fetch_payments_for_project(&self, project_id: i64) -> Result<Vec<Payment>, PaymentFlowError>;
        async fn fetch_all_payments(&self) -> Result<Vec<PaymentWithContext>, PaymentFlowError>;
        async fn fetch_payment_with_context(&self, gateway_payment_id: &str) -> Result<Option<PaymentWithContext>, PaymentFlowError>;
        async fn fetch_purchases_for_user(&self, user_id: i64) -> Result<Vec<PortfolioProject>, PaymentFlowError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn create_order(&self, amount: Paise, currency: &str, receipt: &str) -> Result<GatewayOrderResponse, ServerError>;
    }
}
