#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! PostgreSQL access for patch statistics.
//!
//! Uses `switchy_database` for the connection and raw parameterized SQL via
//! `query_raw_params()`. The [`relation::SqlPatchRelation`] turns the
//! statistics engine's relation queries into single statements over the
//! `nature_data` table.

pub mod db;
pub mod relation;

/// Errors that can occur while setting up the database connection.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// The connection URL could not be parsed or the connection failed.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of what went wrong.
        message: String,
    },
}
