//! Administrative scope resolution.
//!
//! Maps a scope token to the attribute to group by and, when a parent region
//! name is given, drills down one level: a named province is broken down by
//! city, a named city by county.

use protected_area_patch_models::Scope;

use crate::StatsError;
use crate::relation::{Condition, PatchColumn};

/// The grouping and filtering attributes for an administrative query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionResolution {
    /// Attribute to group results by.
    pub group_by: PatchColumn,
    /// Parent-region restriction, if a region name was supplied.
    pub parent: Option<(PatchColumn, String)>,
}

impl RegionResolution {
    /// Returns the parent restriction as a filter condition.
    #[must_use]
    pub fn parent_condition(&self) -> Option<Condition> {
        self.parent
            .as_ref()
            .map(|(column, name)| Condition::Equals(*column, name.clone()))
    }
}

/// Parses a scope token.
///
/// # Errors
///
/// * [`StatsError::MissingParameter`] if the token is empty
/// * [`StatsError::InvalidScope`] if it is not `province`, `city` or `county`
pub fn parse_scope(token: &str) -> Result<Scope, StatsError> {
    if token.is_empty() {
        return Err(StatsError::MissingParameter { name: "scope" });
    }
    token.parse().map_err(|_| StatsError::InvalidScope {
        scope: token.to_string(),
    })
}

/// Resolves the group and filter attributes for `scope` and an optional
/// parent region name. An empty name means no drill-down.
///
/// # Errors
///
/// * [`StatsError::NoSubordinateLevel`] for a named county
pub fn resolve(scope: Scope, name: Option<&str>) -> Result<RegionResolution, StatsError> {
    let current = PatchColumn::for_scope(scope);

    let Some(name) = name.filter(|n| !n.is_empty()) else {
        return Ok(RegionResolution {
            group_by: current,
            parent: None,
        });
    };

    let child = scope.subordinate().ok_or(StatsError::NoSubordinateLevel)?;

    Ok(RegionResolution {
        group_by: PatchColumn::for_scope(child),
        parent: Some((current, name.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_scope_is_rejected() {
        assert!(matches!(
            parse_scope("village"),
            Err(StatsError::InvalidScope { scope }) if scope == "village"
        ));
        assert!(matches!(
            parse_scope(""),
            Err(StatsError::MissingParameter { name: "scope" })
        ));
    }

    #[test]
    fn named_county_has_no_subordinate_level() {
        assert!(matches!(
            resolve(Scope::County, Some("X")),
            Err(StatsError::NoSubordinateLevel)
        ));
    }

    #[test]
    fn unnamed_scope_groups_at_its_own_level() {
        let res = resolve(Scope::Province, Some("")).unwrap();
        assert_eq!(res.group_by, PatchColumn::Province);
        assert_eq!(res.parent, None);
        assert_eq!(res.parent_condition(), None);

        let res = resolve(Scope::County, None).unwrap();
        assert_eq!(res.group_by, PatchColumn::County);
        assert_eq!(res.parent, None);
    }

    #[test]
    fn named_province_drills_down_to_cities() {
        let res = resolve(Scope::Province, Some("河北省")).unwrap();
        assert_eq!(res.group_by, PatchColumn::City);
        assert_eq!(
            res.parent,
            Some((PatchColumn::Province, "河北省".to_string()))
        );
    }

    #[test]
    fn named_city_drills_down_to_counties() {
        let res = resolve(Scope::City, Some("Hebei")).unwrap();
        assert_eq!(res.group_by, PatchColumn::County);
        assert_eq!(
            res.parent_condition(),
            Some(Condition::Equals(PatchColumn::City, "Hebei".to_string()))
        );
    }
}
