#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the protected-area statistics server.
//!
//! Query-string parameters are deserialized into the `*Params` types here
//! and converted into the statistics engine's query types. The
//! response types are the engine's own result types.

use protected_area_patch_models::normalize_protected_type;
use protected_area_stats_models::{AlertQuery, DEFAULT_PAGE_SIZE, StatsQuery};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message.
    pub error: String,
}

/// Query parameters carrying only a year.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YearParams {
    /// Reporting year.
    pub year: Option<String>,
}

/// Query parameters for the administrative region endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionParams {
    /// Reporting year.
    pub year: Option<String>,
    /// `province`, `city` or `county`.
    pub scope: Option<String>,
    /// Parent region to drill into.
    pub name: Option<String>,
}

/// Query parameters shared by the protected-area, spot and transition
/// endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsParams {
    /// Reporting year.
    pub year: Option<String>,
    /// `province`, `city` or `county`.
    pub scope: Option<String>,
    /// Region name at the scope's level.
    pub name: Option<String>,
    /// Protected-area type code or display name.
    pub protected_type: Option<String>,
    /// Change type label.
    pub change_type: Option<String>,
    /// Before-category (transition only).
    pub qlx: Option<String>,
    /// 1-based page number. Values below `1` mean the first page.
    pub page: Option<i64>,
    /// Page size.
    pub page_size: Option<u32>,
}

impl From<StatsParams> for StatsQuery {
    fn from(params: StatsParams) -> Self {
        Self {
            year: params.year,
            scope: params.scope,
            region_name: params.name,
            protected_type: params
                .protected_type
                .filter(|t| !t.is_empty())
                .map(|t| normalize_protected_type(&t)),
            change_type: params.change_type,
            before_category: params.qlx,
            page: page_number(params.page),
            page_size: params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

fn page_number(page: Option<i64>) -> u32 {
    page.map_or(1, |p| u32::try_from(p.max(1)).unwrap_or(u32::MAX))
}

/// Query parameters for the large-spot alert endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertParams {
    /// Reporting year.
    pub year: Option<String>,
    /// Minimum area to report. Defaults to `0`.
    pub alert_area: Option<f64>,
    /// 1-based page number. Values below `1` mean the first page.
    pub page: Option<i64>,
    /// Page size.
    pub page_size: Option<u32>,
}

impl From<AlertParams> for AlertQuery {
    fn from(params: AlertParams) -> Self {
        Self {
            year: params.year,
            alert_area: params.alert_area.unwrap_or(0.0),
            page: page_number(params.page),
            page_size: params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

/// Query parameters for the patch image endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageParams {
    /// Patch identifier.
    pub tbbh: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_params_default_paging() {
        let query = StatsQuery::from(StatsParams {
            year: Some("2023".to_string()),
            ..StatsParams::default()
        });
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(query.before_category, None);
    }

    #[test]
    fn protected_type_display_name_becomes_code() {
        let query = StatsQuery::from(StatsParams {
            protected_type: Some(" 森林公园".to_string()),
            qlx: Some("耕地".to_string()),
            name: Some("河北省".to_string()),
            ..StatsParams::default()
        });
        assert_eq!(query.protected_type.as_deref(), Some("FP"));
        assert_eq!(query.before_category.as_deref(), Some("耕地"));
        assert_eq!(query.region_name.as_deref(), Some("河北省"));
    }

    #[test]
    fn empty_protected_type_is_dropped() {
        let query = StatsQuery::from(StatsParams {
            protected_type: Some(String::new()),
            ..StatsParams::default()
        });
        assert_eq!(query.protected_type, None);
    }

    #[test]
    fn alert_params_default_threshold() {
        let query = AlertQuery::from(AlertParams {
            year: Some("2023".to_string()),
            page_size: Some(20),
            ..AlertParams::default()
        });
        assert!(query.alert_area.abs() < f64::EPSILON);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 20);
    }

    #[test]
    fn pages_below_one_mean_the_first_page() {
        for page in [-1, 0] {
            let query = StatsQuery::from(StatsParams {
                page: Some(page),
                ..StatsParams::default()
            });
            assert_eq!(query.page, 1);
        }

        let query = AlertQuery::from(AlertParams {
            page: Some(-5),
            ..AlertParams::default()
        });
        assert_eq!(query.page, 1);

        let query = AlertQuery::from(AlertParams {
            page: Some(3),
            ..AlertParams::default()
        });
        assert_eq!(query.page, 3);
    }

    #[test]
    fn error_body_shape() {
        let json = serde_json::to_string(&ApiError {
            error: "missing".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"error":"missing"}"#);
    }
}
