//! Statistics operations.
//!
//! Each function validates its parameters before touching the relation,
//! issues one query (protected-area stats issues a distinct count first)
//! and shapes the rows into the typed result.

use protected_area_patch_models::ChangeType;
use protected_area_stats_models::{
    AlertQuery, AlertSpot, BatchDamageResult, Page, ProtectedAreaStat, ReferenceBaseline,
    RegionStats, SpotItem, StatsQuery, TransitionStat, TrendResult, YearlyOverview,
};

use crate::StatsError;
use crate::filter::{common_filter, required, transition_filter, year_filter};
use crate::region::{parse_scope, resolve};
use crate::relation::{Aggregate, Condition, Filter, PatchColumn, PatchRelation, RelationQuery};
use crate::shape;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Normalizes page `0` to `1` and rejects a zero page size.
    fn new(page: u32, size: u32) -> Result<Self, StatsError> {
        if size == 0 {
            return Err(StatsError::InvalidParameter {
                name: "page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            page: page.max(1),
            size,
        })
    }

    fn offset(self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }

    fn limit(self) -> u64 {
        u64::from(self.size)
    }
}

/// Yearly patch counts for resource damage and restoration.
///
/// # Errors
///
/// Returns [`StatsError::QueryFailed`] if the relation query fails.
pub async fn trend(relation: &dyn PatchRelation) -> Result<TrendResult, StatsError> {
    let filter = Filter::new().and(Condition::OneOf(
        PatchColumn::ChangeType,
        ChangeType::all().iter().map(ToString::to_string).collect(),
    ));
    let query = RelationQuery::grouped(
        filter,
        vec![PatchColumn::Year, PatchColumn::ChangeType],
        vec![Aggregate::Count],
    );

    let rows = relation.query(&query).await?;
    Ok(shape::trend(&rows))
}

/// Patch count and area for one year, plus the reference baseline.
///
/// # Errors
///
/// * [`StatsError::MissingParameter`] if `year` is empty
/// * [`StatsError::QueryFailed`] if the relation query fails
pub async fn yearly_overview(
    relation: &dyn PatchRelation,
    year: &str,
    baseline: &ReferenceBaseline,
) -> Result<YearlyOverview, StatsError> {
    let year = required(Some(year), "year")?;
    let query = RelationQuery::grouped(
        year_filter(year),
        Vec::new(),
        vec![Aggregate::Count, Aggregate::SumArea],
    );

    let rows = relation.query(&query).await?;
    Ok(shape::yearly_overview(year, rows.first(), baseline))
}

/// Resource damage count and area per normalized batch for one year.
///
/// # Errors
///
/// * [`StatsError::MissingParameter`] if `year` is empty
/// * [`StatsError::QueryFailed`] if the relation query fails
pub async fn damage_by_batch(
    relation: &dyn PatchRelation,
    year: &str,
) -> Result<BatchDamageResult, StatsError> {
    let year = required(Some(year), "year")?;
    let filter = year_filter(year).and(Condition::Equals(
        PatchColumn::ChangeType,
        ChangeType::ResourceDamage.to_string(),
    ));
    let query = RelationQuery::grouped(
        filter,
        vec![PatchColumn::Batch],
        vec![Aggregate::Count, Aggregate::SumArea],
    );

    let rows = relation.query(&query).await?;
    log::debug!("damage_by_batch: {} raw batch codes for {year}", rows.len());
    Ok(shape::batch_damage(&rows))
}

/// Patch count and area per administrative region.
///
/// Without `name`, groups at the `scope` level. With `name`, restricts to
/// that region and groups by the next finer level.
///
/// # Errors
///
/// * [`StatsError::MissingParameter`] if `year` or `scope` is empty
/// * [`StatsError::InvalidScope`] if `scope` is unknown
/// * [`StatsError::NoSubordinateLevel`] for a named county
/// * [`StatsError::QueryFailed`] if the relation query fails
pub async fn administrative_stats(
    relation: &dyn PatchRelation,
    year: &str,
    scope: &str,
    name: Option<&str>,
) -> Result<RegionStats, StatsError> {
    let year = required(Some(year), "year")?;
    let scope = parse_scope(scope)?;
    let resolution = resolve(scope, name)?;

    let mut filter = year_filter(year);
    if let Some(condition) = resolution.parent_condition() {
        filter.push(condition);
    }

    let query = RelationQuery::grouped(
        filter,
        vec![resolution.group_by],
        vec![Aggregate::Count, Aggregate::SumArea],
    );

    let rows = relation.query(&query).await?;
    Ok(shape::region_stats(&rows, resolution.group_by))
}

/// Patch count and area per protected area, paginated over groups.
///
/// The total is the number of distinct protected areas matching the
/// filter. The count and the page are two separate relation calls.
///
/// # Errors
///
/// * [`StatsError::MissingParameter`] if `year` or `scope` is absent
/// * [`StatsError::InvalidScope`] if `scope` is unknown
/// * [`StatsError::InvalidParameter`] if the page size is `0`
/// * [`StatsError::QueryFailed`] if a relation query fails
pub async fn protected_area_stats(
    relation: &dyn PatchRelation,
    query: &StatsQuery,
) -> Result<Page<ProtectedAreaStat>, StatsError> {
    let filter = common_filter(query)?;
    let paging = PageRequest::new(query.page, query.page_size)?;

    let total = relation
        .count(&filter, Some(PatchColumn::ProtectedAreaName))
        .await?;

    let grouped = RelationQuery::grouped(
        filter,
        vec![PatchColumn::ProtectedAreaName],
        vec![Aggregate::Count, Aggregate::SumArea],
    )
    .order_by(PatchColumn::ProtectedAreaName)
    .window(paging.limit(), paging.offset());

    let rows = relation.query(&grouped).await?;
    Ok(shape::page(
        shape::protected_area_stats(&rows),
        total,
        paging.page,
        paging.size,
    ))
}

/// Paginated patch listing.
///
/// # Errors
///
/// * [`StatsError::MissingParameter`] if `year` or `scope` is absent
/// * [`StatsError::InvalidScope`] if `scope` is unknown
/// * [`StatsError::InvalidParameter`] if the page size is `0`
/// * [`StatsError::QueryFailed`] if a relation query fails
pub async fn spot_list(
    relation: &dyn PatchRelation,
    query: &StatsQuery,
) -> Result<Page<SpotItem>, StatsError> {
    let filter = common_filter(query)?;
    let paging = PageRequest::new(query.page, query.page_size)?;

    let total = relation.count(&filter, None).await?;

    let select = RelationQuery::select(
        filter,
        vec![
            PatchColumn::Id,
            PatchColumn::BeforeCategory,
            PatchColumn::AfterCategory,
            PatchColumn::ChangeType,
        ],
    )
    .order_by(PatchColumn::Id)
    .window(paging.limit(), paging.offset());

    let rows = relation.query(&select).await?;
    Ok(shape::page(
        shape::spot_items(&rows),
        total,
        paging.page,
        paging.size,
    ))
}

/// Flow from one before-category into each after-category, with count and
/// area shares.
///
/// # Errors
///
/// * [`StatsError::MissingParameter`] if `year`, `scope` or
///   `before_category` is absent
/// * [`StatsError::InvalidScope`] if `scope` is unknown
/// * [`StatsError::QueryFailed`] if the relation query fails
pub async fn transition_stats(
    relation: &dyn PatchRelation,
    query: &StatsQuery,
) -> Result<Vec<TransitionStat>, StatsError> {
    let filter = transition_filter(query)?;

    let grouped = RelationQuery::grouped(
        filter,
        vec![PatchColumn::AfterCategory],
        vec![Aggregate::Count, Aggregate::SumArea],
    )
    .order_by(PatchColumn::AfterCategory);

    let rows = relation.query(&grouped).await?;
    Ok(shape::transition_stats(&rows))
}

/// Paginated list of patches whose area is at least the alert threshold,
/// largest first.
///
/// # Errors
///
/// * [`StatsError::MissingParameter`] if `year` is absent
/// * [`StatsError::InvalidParameter`] if the threshold is negative or not
///   finite, or the page size is `0`
/// * [`StatsError::QueryFailed`] if a relation query fails
pub async fn large_spot_alert(
    relation: &dyn PatchRelation,
    alert: &AlertQuery,
) -> Result<Page<AlertSpot>, StatsError> {
    let year = required(alert.year.as_deref(), "year")?;
    if !alert.alert_area.is_finite() || alert.alert_area < 0.0 {
        return Err(StatsError::InvalidParameter {
            name: "alert_area",
            reason: format!("must be a finite value >= 0, got {}", alert.alert_area),
        });
    }
    let paging = PageRequest::new(alert.page, alert.page_size)?;

    let filter = year_filter(year).and(Condition::AreaAtLeast(alert.alert_area));

    let total = relation.count(&filter, None).await?;

    let select = RelationQuery::select(
        filter,
        vec![
            PatchColumn::ProtectedAreaName,
            PatchColumn::Id,
            PatchColumn::Area,
            PatchColumn::Province,
        ],
    )
    .order_by_desc(PatchColumn::Area)
    .order_by(PatchColumn::Id)
    .window(paging.limit(), paging.offset());

    let rows = relation.query(&select).await?;
    Ok(shape::page(
        shape::alert_spots(&rows),
        total,
        paging.page,
        paging.size,
    ))
}
