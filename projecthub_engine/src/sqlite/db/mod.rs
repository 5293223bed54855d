//! # SQLite database methods
//!
//! This module contains the "low-level" SQLite database interactions.
//!
//! All of these are plain functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open a transaction when several writes must land
//! together, and call through without any other changes.
use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod buy_requests;
pub mod delivery_files;
pub mod payments;
pub mod portfolio;
pub mod projects;
pub mod users;

const SQLITE_DB_URL: &str = "sqlite://data/projecthub.db";

pub fn db_url() -> String {
    let result = env::var("PH_DATABASE_URL").unwrap_or_else(|_| {
        info!("PH_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
