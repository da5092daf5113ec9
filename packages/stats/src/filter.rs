//! Filter construction shared by the listing operations.
//!
//! Every predicate is an exact match. The year predicate is always present;
//! region, protected-type and change-type predicates are added only when the
//! corresponding parameter is non-empty.

use protected_area_stats_models::StatsQuery;

use crate::StatsError;
use crate::region::parse_scope;
use crate::relation::{Condition, Filter, PatchColumn};

/// Returns `value` if it is present and non-empty.
///
/// # Errors
///
/// Returns [`StatsError::MissingParameter`] otherwise.
pub fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, StatsError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(StatsError::MissingParameter { name })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Builds the exact-match year filter.
#[must_use]
pub fn year_filter(year: &str) -> Filter {
    Filter::new().and(Condition::Equals(PatchColumn::Year, year.to_string()))
}

/// Builds the filter shared by protected-area stats, spot listing and
/// transition stats.
///
/// # Errors
///
/// * [`StatsError::MissingParameter`] if `year` or `scope` is absent
/// * [`StatsError::InvalidScope`] if `scope` is not a known token
pub fn common_filter(query: &StatsQuery) -> Result<Filter, StatsError> {
    let year = required(query.year.as_deref(), "year")?;
    let scope = parse_scope(required(query.scope.as_deref(), "scope")?)?;

    let mut filter = year_filter(year);

    if let Some(name) = non_empty(query.region_name.as_deref()) {
        filter.push(Condition::Equals(
            PatchColumn::for_scope(scope),
            name.to_string(),
        ));
    }

    if let Some(protected_type) = non_empty(query.protected_type.as_deref()) {
        filter.push(Condition::Equals(
            PatchColumn::ProtectedType,
            protected_type.to_string(),
        ));
    }

    if let Some(change_type) = non_empty(query.change_type.as_deref()) {
        filter.push(Condition::Equals(
            PatchColumn::ChangeType,
            change_type.to_string(),
        ));
    }

    Ok(filter)
}

/// Builds the transition filter: the common filter plus the before-category.
///
/// # Errors
///
/// * [`StatsError::MissingParameter`] if `year`, `scope` or
///   `before_category` is absent
/// * [`StatsError::InvalidScope`] if `scope` is not a known token
pub fn transition_filter(query: &StatsQuery) -> Result<Filter, StatsError> {
    let mut filter = common_filter(query)?;
    let before = required(query.before_category.as_deref(), "before_category")?;
    filter.push(Condition::Equals(
        PatchColumn::BeforeCategory,
        before.to_string(),
    ));
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> StatsQuery {
        StatsQuery {
            year: Some("2023".to_string()),
            scope: Some("province".to_string()),
            ..StatsQuery::default()
        }
    }

    #[test]
    fn year_only_when_optional_fields_are_empty() {
        let mut q = query();
        q.region_name = Some(String::new());
        q.protected_type = Some(String::new());
        let filter = common_filter(&q).unwrap();
        assert_eq!(
            filter.conditions(),
            &[Condition::Equals(PatchColumn::Year, "2023".to_string())]
        );
    }

    #[test]
    fn region_predicate_follows_scope() {
        let mut q = query();
        q.scope = Some("county".to_string());
        q.region_name = Some("涞水县".to_string());
        let filter = common_filter(&q).unwrap();
        assert!(
            filter
                .conditions()
                .contains(&Condition::Equals(PatchColumn::County, "涞水县".to_string()))
        );
    }

    #[test]
    fn all_optional_predicates_in_order() {
        let mut q = query();
        q.region_name = Some("河北省".to_string());
        q.protected_type = Some("NR".to_string());
        q.change_type = Some("资源损毁".to_string());
        let filter = common_filter(&q).unwrap();
        assert_eq!(
            filter.conditions(),
            &[
                Condition::Equals(PatchColumn::Year, "2023".to_string()),
                Condition::Equals(PatchColumn::Province, "河北省".to_string()),
                Condition::Equals(PatchColumn::ProtectedType, "NR".to_string()),
                Condition::Equals(PatchColumn::ChangeType, "资源损毁".to_string()),
            ]
        );
    }

    #[test]
    fn missing_year_and_scope() {
        let mut q = query();
        q.year = None;
        assert!(matches!(
            common_filter(&q),
            Err(StatsError::MissingParameter { name: "year" })
        ));

        let mut q = query();
        q.scope = Some(String::new());
        assert!(matches!(
            common_filter(&q),
            Err(StatsError::MissingParameter { name: "scope" })
        ));
    }

    #[test]
    fn invalid_scope_is_rejected_even_without_region() {
        let mut q = query();
        q.scope = Some("nation".to_string());
        assert!(matches!(
            common_filter(&q),
            Err(StatsError::InvalidScope { .. })
        ));
    }

    #[test]
    fn transition_requires_before_category() {
        assert!(matches!(
            transition_filter(&query()),
            Err(StatsError::MissingParameter {
                name: "before_category"
            })
        ));

        let mut q = query();
        q.before_category = Some("耕地".to_string());
        let filter = transition_filter(&q).unwrap();
        assert_eq!(
            filter.conditions().last(),
            Some(&Condition::Equals(
                PatchColumn::BeforeCategory,
                "耕地".to_string()
            ))
        );
    }
}
