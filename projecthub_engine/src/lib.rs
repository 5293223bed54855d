//! ProjectHub Payment Engine
//!
//! The engine holds the business logic for the ProjectHub marketplace: user accounts, custom project requests and
//! their payment-gated lifecycle, the prebuilt catalog, and the immutable payment ledger. It is HTTP-agnostic; the
//! server crate drives it through the public API layer.
//!
//! The crate is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). Low-level queries are plain functions over a
//!    `&mut SqliteConnection` so they can be composed inside transactions. You should never need to call these
//!    directly; use the public API instead. The data types they return live in [`mod@db_types`] and are public.
//! 2. The storage capability traits ([`mod@traits`]). A backend implements these to drive the engine; SQLite is the
//!    default implementation, with Postgres left as a feature hook.
//! 3. The public API layer ([`mod@hub_api`]): authentication, project workflow, catalog, and the payment flow. The
//!    payment flow owns the lifecycle state machine ([`mod@state`]) and the gateway signature check
//!    ([`mod@helpers`]).
pub mod db_types;
pub mod helpers;
pub mod state;
pub mod traits;

mod hub_api;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use hub_api::{
    auth_api::AuthApi,
    catalog_api::CatalogApi,
    payment_flow_api::{OrderTarget, PaymentFlowApi, PaymentOutcome, PreparedOrder, ReceiptData},
    project_api::{ProjectApi, ProjectDetail},
};
pub use traits::{
    AuthApiError,
    CatalogApiError,
    CatalogManagement,
    PaymentBackend,
    PaymentFlowError,
    PaymentLedger,
    ProjectApiError,
    ProjectManagement,
    UserManagement,
};
