use thiserror::Error;

use crate::{
    db_types::{GatewayOrder, NewGatewayOrder, NewPayment, Payment, PaymentWithContext},
    state::{InvalidTransition, StateChange},
};

#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(String),
    #[error("Payment {0} does not exist")]
    PaymentNotFound(String),
    #[error("You do not have access to this payment")]
    AccessDenied,
    #[error("Payment signature verification failed")]
    InvalidSignature,
    #[error("Payment does not belong to this project")]
    TargetMismatch,
    #[error("Project {0} does not exist")]
    ProjectNotFound(i64),
    #[error("Catalog item {0} does not exist")]
    ItemNotFound(i64),
    #[error("The project has no quote, so no payment is due")]
    NoQuote,
    #[error("The listed price is not payable: {0}")]
    UnpayablePrice(String),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

impl From<sqlx::Error> for PaymentFlowError {
    fn from(e: sqlx::Error) -> Self {
        PaymentFlowError::DatabaseError(e.to_string())
    }
}

impl From<super::ProjectApiError> for PaymentFlowError {
    fn from(e: super::ProjectApiError) -> Self {
        match e {
            super::ProjectApiError::ProjectNotFound(id) => PaymentFlowError::ProjectNotFound(id),
            super::ProjectApiError::AccessDenied => PaymentFlowError::AccessDenied,
            super::ProjectApiError::InvalidTransition(t) => PaymentFlowError::InvalidTransition(t),
            super::ProjectApiError::DatabaseError(e) => PaymentFlowError::DatabaseError(e),
        }
    }
}

impl From<super::CatalogApiError> for PaymentFlowError {
    fn from(e: super::CatalogApiError) -> Self {
        match e {
            super::CatalogApiError::ItemNotFound(id) => PaymentFlowError::ItemNotFound(id),
            super::CatalogApiError::DatabaseError(e) => PaymentFlowError::DatabaseError(e),
        }
    }
}

impl From<crate::helpers::PriceError> for PaymentFlowError {
    fn from(e: crate::helpers::PriceError) -> Self {
        PaymentFlowError::UnpayablePrice(e.to_string())
    }
}

/// Gateway order records and the payment ledger. Orders are written when the gateway mints them; ledger rows are
/// written exactly once per verified gateway payment.
#[allow(async_fn_in_trait)]
pub trait PaymentLedger {
    /// Stores the server-side record of a freshly minted gateway order.
    async fn insert_gateway_order(&self, order: NewGatewayOrder) -> Result<GatewayOrder, PaymentFlowError>;

    /// Fetches the stored order record by its gateway order id.
    async fn fetch_gateway_order(&self, order_id: &str) -> Result<Option<GatewayOrder>, PaymentFlowError>;

    /// Fetches a ledger row by its gateway payment id.
    async fn fetch_payment(&self, gateway_payment_id: &str) -> Result<Option<Payment>, PaymentFlowError>;

    /// Inserts a verified payment, applying the accompanying project state change in the same transaction.
    ///
    /// The insert is idempotent on `gateway_payment_id`: replaying a confirmation returns the already stored row
    /// with the second element set to `true`, and leaves project state untouched.
    async fn record_verified_payment(
        &self,
        payment: NewPayment,
        project_update: Option<(i64, StateChange)>,
    ) -> Result<(Payment, bool), PaymentFlowError>;

    /// The user's own payment history, newest first.
    async fn fetch_payments_for_user(&self, user_id: i64) -> Result<Vec<PaymentWithContext>, PaymentFlowError>;

    async fn fetch_payments_for_project(&self, project_id: i64) -> Result<Vec<Payment>, PaymentFlowError>;

    /// Every ledger row with buyer context, newest first. Admin listing.
    async fn fetch_all_payments(&self) -> Result<Vec<PaymentWithContext>, PaymentFlowError>;

    /// A single ledger row with buyer context, for receipts.
    async fn fetch_payment_with_context(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<PaymentWithContext>, PaymentFlowError>;

    /// Catalog items the user has successfully paid for, deduplicated.
    async fn fetch_purchases_for_user(&self, user_id: i64) -> Result<Vec<crate::db_types::PortfolioProject>, PaymentFlowError>;
}
