//! The high-level marketplace APIs.
//!
//! Each API wraps a database backend (any type implementing the relevant [`crate::traits`] contracts) and adds
//! the business rules that sit above raw storage: credential checks, ownership checks, lifecycle validation and
//! payment verification. The web server talks to these, never to the backend directly.
pub mod auth_api;
pub mod catalog_api;
pub mod payment_flow_api;
pub mod project_api;
