//! Interface contracts for marketplace database backends.
//!
//! A backend that implements these four traits can drive the whole hub:
//!
//! * [`UserManagement`] covers registration, credential lookup and account approval.
//! * [`ProjectManagement`] covers custom project requests and their lifecycle columns.
//! * [`CatalogManagement`] covers the prebuilt catalog, its search and its delivery artifacts.
//! * [`PaymentLedger`] covers gateway order records and the immutable payment ledger.
//!
//! Lifecycle changes always travel as a [`crate::state::StateChange`] produced by [`crate::state::apply`];
//! no trait method takes a raw status string.

mod catalog_management;
mod payment_ledger;
mod project_management;
mod user_management;

pub use catalog_management::{CatalogApiError, CatalogManagement};
pub use payment_ledger::{PaymentFlowError, PaymentLedger};
pub use project_management::{ProjectApiError, ProjectManagement};
pub use user_management::{AuthApiError, UserManagement};

/// Umbrella for everything the payment flow touches. Implemented automatically for any backend that covers the
/// three constituent contracts.
pub trait PaymentBackend: PaymentLedger + ProjectManagement + CatalogManagement {}

impl<T> PaymentBackend for T where T: PaymentLedger + ProjectManagement + CatalogManagement {}
