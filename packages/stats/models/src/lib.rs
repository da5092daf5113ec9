#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query parameters and aggregate result types for patch statistics.
//!
//! Each statistics operation accepts one of the query types below
//! and returns one of the typed results. Results serialize to the keyed
//! JSON shapes the dashboard consumes; keyed results use ordered maps so
//! identical queries serialize identically.

use std::collections::BTreeMap;

use protected_area_patch_models::BatchLabel;
use serde::{Deserialize, Serialize};

/// Default page size for paginated operations.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Filter and paging parameters shared by the protected-area, spot list and
/// transition operations.
///
/// Fields are kept as raw request values. Validation (required fields,
/// scope parsing) happens in the statistics engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsQuery {
    /// Reporting year. Required.
    pub year: Option<String>,
    /// Administrative scope token (`province`, `city` or `county`).
    pub scope: Option<String>,
    /// Region name matched against the scope's attribute.
    pub region_name: Option<String>,
    /// Protected-area type code.
    pub protected_type: Option<String>,
    /// Change type label.
    pub change_type: Option<String>,
    /// Before-category, required by the transition operation only.
    pub before_category: Option<String>,
    /// 1-based page number. `0` is treated as `1`.
    pub page: u32,
    /// Page size, at least 1.
    pub page_size: u32,
}

impl Default for StatsQuery {
    fn default() -> Self {
        Self {
            year: None,
            scope: None,
            region_name: None,
            protected_type: None,
            change_type: None,
            before_category: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Parameters for the large-spot alert operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertQuery {
    /// Reporting year. Required.
    pub year: Option<String>,
    /// Minimum patch area to report. Must be finite and non-negative.
    pub alert_area: f64,
    /// 1-based page number. `0` is treated as `1`.
    pub page: u32,
    /// Page size, at least 1.
    pub page_size: u32,
}

impl Default for AlertQuery {
    fn default() -> Self {
        Self {
            year: None,
            alert_area: 0.0,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Static protected-area reference figures appended to every yearly
/// overview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceBaseline {
    /// Number of protected areas.
    pub protected_count: u64,
    /// Total protected-area surface.
    pub protected_total_area: f64,
}

impl Default for ReferenceBaseline {
    fn default() -> Self {
        Self {
            protected_count: 1098,
            protected_total_area: 88_423_024.14,
        }
    }
}

/// Yearly patch counts for the two reported change types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendResult {
    /// Resource damage counts keyed by year.
    #[serde(rename = "资源损毁")]
    pub damage: BTreeMap<String, u64>,
    /// Restoration counts keyed by year.
    #[serde(rename = "恢复治理")]
    pub restoration: BTreeMap<String, u64>,
}

/// Patch totals for one year plus the reference baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyOverview {
    /// The requested year.
    pub year: String,
    /// Number of patches recorded in the year.
    pub total_count: u64,
    /// Summed patch area for the year.
    pub total_area: f64,
    /// Reference protected-area count.
    pub protected_count: u64,
    /// Reference protected-area surface.
    pub protected_total_area: f64,
}

/// Resource damage totals keyed by normalized batch label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchDamageResult {
    /// Damage patch count per batch.
    #[serde(rename = "资源损毁个数")]
    pub counts: BTreeMap<BatchLabel, u64>,
    /// Damage patch area per batch.
    #[serde(rename = "资源损毁面积")]
    pub areas: BTreeMap<BatchLabel, f64>,
}

/// Count and summed area of a group of patches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaTotals {
    /// Number of patches.
    pub count: u64,
    /// Summed patch area.
    pub area: f64,
}

/// Patch totals keyed by administrative region name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionStats {
    /// Totals per region. Never contains an empty key.
    pub regions: BTreeMap<String, AreaTotals>,
}

/// Patch totals for one protected area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectedAreaStat {
    /// Protected-area name.
    pub name: String,
    /// Number of patches.
    pub count: u64,
    /// Summed patch area.
    pub area: f64,
}

/// One row of the patch listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotItem {
    /// Patch identifier.
    #[serde(rename = "tbbh")]
    pub id: String,
    /// Land-use category before the change.
    #[serde(rename = "qlx")]
    pub before_category: String,
    /// Land-use category after the change.
    #[serde(rename = "hlx")]
    pub after_category: String,
    /// Change type label.
    #[serde(rename = "bhdl")]
    pub change_type: String,
}

/// Flow from a fixed before-category into one after-category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionStat {
    /// After-category.
    #[serde(rename = "hlx")]
    pub after_category: String,
    /// Number of patches.
    pub count: u64,
    /// Summed patch area.
    pub area: f64,
    /// Share of the patch count, in percent.
    pub count_ratio: f64,
    /// Share of the patch area, in percent.
    pub area_ratio: f64,
}

/// A patch at or above the alert area threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSpot {
    /// Protected-area name.
    #[serde(rename = "thbhdmc")]
    pub protected_area_name: String,
    /// Patch identifier.
    #[serde(rename = "tbbh")]
    pub id: String,
    /// Patch area.
    #[serde(rename = "bhmj")]
    pub area: f64,
    /// Province name.
    #[serde(rename = "thsheng")]
    pub province: String,
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Total number of items across all pages.
    pub total: u64,
    /// The page that was returned.
    pub current_page: u32,
    /// Number of pages.
    pub total_pages: u64,
    /// Items per page.
    pub page_size: u32,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub list: Vec<T>,
    /// Paging metadata.
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_query_defaults_to_first_page_of_ten() {
        let query = StatsQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, DEFAULT_PAGE_SIZE);
        assert!(query.year.is_none());
    }

    #[test]
    fn trend_serializes_with_series_labels() {
        let mut trend = TrendResult::default();
        trend.damage.insert("2023".to_string(), 2);
        let json = serde_json::to_string(&trend).unwrap();
        assert_eq!(json, r#"{"资源损毁":{"2023":2},"恢复治理":{}}"#);
    }

    #[test]
    fn batch_result_keys_by_label_name() {
        let mut result = BatchDamageResult::default();
        result.counts.insert(BatchLabel::Second, 3);
        result.counts.insert(BatchLabel::First, 1);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["资源损毁个数"]["第一批次"], 1);
        assert_eq!(json["资源损毁个数"]["第二批次"], 3);
    }

    #[test]
    fn region_stats_serialize_as_plain_map() {
        let mut stats = RegionStats::default();
        stats
            .regions
            .insert("河北省".to_string(), AreaTotals { count: 2, area: 1.5 });
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(json, r#"{"河北省":{"count":2,"area":1.5}}"#);
    }
}
