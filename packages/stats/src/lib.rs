#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistics engine for protected-area patch records.
//!
//! Each public function in [`queries`] corresponds to one dashboard
//! statistic. Functions validate their parameters, build a filter over the
//! patch relation, run a single grouped or row-level query against any
//! [`relation::PatchRelation`] implementation and reshape the raw rows into
//! the typed results from `protected_area_stats_models`.

pub mod filter;
pub mod memory;
pub mod queries;
pub mod region;
pub mod relation;
pub mod shape;

use thiserror::Error;

use crate::relation::RelationError;

/// Errors that can occur while answering a statistics query.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A required request parameter was absent or empty.
    #[error("Missing required parameter: {name}")]
    MissingParameter {
        /// Name of the missing parameter.
        name: &'static str,
    },

    /// The scope token is not one of `province`, `city` or `county`.
    #[error("Invalid scope: {scope}")]
    InvalidScope {
        /// The rejected scope token.
        scope: String,
    },

    /// A drill-down was requested below county level.
    #[error("County-level regions have no subordinate level")]
    NoSubordinateLevel,

    /// A parameter was present but outside its valid range.
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The underlying relation failed.
    #[error("Query failed: {0}")]
    QueryFailed(#[from] RelationError),
}
