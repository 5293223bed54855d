//! # ProjectHub server
//! This crate hosts the HTTP server for the marketplace. It is responsible for:
//! * Authenticating users and issuing access tokens.
//! * Accepting custom project requests and serving the prebuilt catalog.
//! * Driving the quote, payment and delivery workflow against the engine.
//! * Receiving payment gateway confirmations and verifying their signatures.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod gateway;
pub mod helpers;
pub mod middleware;
pub mod receipt;
pub mod routes;
pub mod server;
pub mod uploads;

#[cfg(test)]
mod endpoint_tests;
