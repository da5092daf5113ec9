//! Conversion of raw relation rows into typed statistics results.
//!
//! Everything here is pure: rows in, result out.

use protected_area_patch_models::{BatchLabel, ChangeType, UNKNOWN_REGION};
use protected_area_stats_models::{
    AlertSpot, BatchDamageResult, Page, Pagination, ProtectedAreaStat, ReferenceBaseline,
    RegionStats, SpotItem, TransitionStat, TrendResult, YearlyOverview,
};

use crate::relation::{PatchColumn, Row};

/// Buckets `(year, change type) → count` rows into the two trend series.
///
/// Change types outside [`ChangeType::all`] are dropped.
#[must_use]
pub fn trend(rows: &[Row]) -> TrendResult {
    let mut result = TrendResult::default();

    for row in rows {
        let Ok(change_type) = row.text(PatchColumn::ChangeType).parse::<ChangeType>() else {
            continue;
        };
        let series = match change_type {
            ChangeType::ResourceDamage => &mut result.damage,
            ChangeType::Restoration => &mut result.restoration,
        };
        *series
            .entry(row.text(PatchColumn::Year).to_string())
            .or_insert(0) += row.count;
    }

    result
}

/// Builds the yearly overview from the single summary row.
#[must_use]
pub fn yearly_overview(
    year: &str,
    summary: Option<&Row>,
    baseline: &ReferenceBaseline,
) -> YearlyOverview {
    YearlyOverview {
        year: year.to_string(),
        total_count: summary.map_or(0, |r| r.count),
        total_area: summary.map_or(0.0, |r| r.area_sum),
        protected_count: baseline.protected_count,
        protected_total_area: baseline.protected_total_area,
    }
}

/// Re-aggregates raw batch-code groups by normalized [`BatchLabel`].
///
/// Distinct raw codes such as `"202301"` and `"2023-01"` land in the same
/// bucket.
#[must_use]
pub fn batch_damage(rows: &[Row]) -> BatchDamageResult {
    let mut result = BatchDamageResult::default();

    for row in rows {
        let label = BatchLabel::from_code(row.text(PatchColumn::Batch));
        *result.counts.entry(label).or_insert(0) += row.count;
        *result.areas.entry(label).or_insert(0.0) += row.area_sum;
    }

    result
}

/// Keys region groups by name, folding empty names into
/// [`UNKNOWN_REGION`].
#[must_use]
pub fn region_stats(rows: &[Row], group_by: PatchColumn) -> RegionStats {
    let mut result = RegionStats::default();

    for row in rows {
        let name = match row.text(group_by) {
            "" => UNKNOWN_REGION,
            name => name,
        };
        let totals = result.regions.entry(name.to_string()).or_default();
        totals.count += row.count;
        totals.area += row.area_sum;
    }

    result
}

/// Converts protected-area groups, keeping row order.
#[must_use]
pub fn protected_area_stats(rows: &[Row]) -> Vec<ProtectedAreaStat> {
    rows.iter()
        .map(|row| ProtectedAreaStat {
            name: row.text(PatchColumn::ProtectedAreaName).to_string(),
            count: row.count,
            area: row.area_sum,
        })
        .collect()
}

/// Converts listing rows, keeping row order.
#[must_use]
pub fn spot_items(rows: &[Row]) -> Vec<SpotItem> {
    rows.iter()
        .map(|row| SpotItem {
            id: row.text(PatchColumn::Id).to_string(),
            before_category: row.text(PatchColumn::BeforeCategory).to_string(),
            after_category: row.text(PatchColumn::AfterCategory).to_string(),
            change_type: row.text(PatchColumn::ChangeType).to_string(),
        })
        .collect()
}

/// Converts after-category groups and computes each group's share of the
/// total count and area, in percent.
///
/// A ratio is `0` when its total is `0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn transition_stats(rows: &[Row]) -> Vec<TransitionStat> {
    let total_count: u64 = rows.iter().map(|r| r.count).sum();
    let total_area: f64 = rows.iter().map(|r| r.area_sum).sum();

    rows.iter()
        .map(|row| TransitionStat {
            after_category: row.text(PatchColumn::AfterCategory).to_string(),
            count: row.count,
            area: row.area_sum,
            count_ratio: if total_count > 0 {
                row.count as f64 / total_count as f64 * 100.0
            } else {
                0.0
            },
            area_ratio: if total_area > 0.0 {
                row.area_sum / total_area * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

/// Converts alert rows, keeping row order.
#[must_use]
pub fn alert_spots(rows: &[Row]) -> Vec<AlertSpot> {
    rows.iter()
        .map(|row| AlertSpot {
            protected_area_name: row.text(PatchColumn::ProtectedAreaName).to_string(),
            id: row.text(PatchColumn::Id).to_string(),
            area: row.real(PatchColumn::Area),
            province: row.text(PatchColumn::Province).to_string(),
        })
        .collect()
}

/// Number of pages needed for `total` items, `0` when `page_size` is `0`.
#[must_use]
pub fn total_pages(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(u64::from(page_size))
    }
}

/// Wraps one page of items in the pagination envelope.
#[must_use]
pub fn page<T>(list: Vec<T>, total: u64, current_page: u32, page_size: u32) -> Page<T> {
    Page {
        list,
        pagination: Pagination {
            total,
            current_page,
            total_pages: total_pages(total, page_size),
            page_size,
        },
    }
}
