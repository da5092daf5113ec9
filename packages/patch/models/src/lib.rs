#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Patch record types and the closed vocabularies used to query them.
//!
//! A patch is one land-parcel change event inside (or near) a protected
//! area. This crate defines the record shape as read from the
//! `nature_data` table together with the small closed sets the statistics
//! engine reasons about: change types, administrative scopes, batch labels
//! and protected-area types.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Label used for administrative buckets whose region name is empty.
pub const UNKNOWN_REGION: &str = "未知区域";

/// One land-parcel change event as stored in the `nature_data` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRecord {
    /// Unique patch identifier (`TBBH`).
    pub id: String,
    /// Change type label (`BHDL`), e.g. 资源损毁 or 恢复治理.
    pub change_type: String,
    /// Land-use category before the change (`QLX`).
    pub before_category: String,
    /// Land-use category after the change (`HLX`).
    pub after_category: String,
    /// Patch area (`BHMJ`), never negative.
    pub area: f64,
    /// Protected-area name (`THBHDMC`).
    pub protected_area_name: String,
    /// Protected-area type code (`BHDLX`).
    pub protected_type: String,
    /// Raw batch code (`PC`). Only the trailing two characters matter.
    pub batch: String,
    /// Reporting year, matched exactly.
    pub year: String,
    /// Province name (`THSHENG`), possibly empty.
    pub province: String,
    /// City name (`THSHI`), possibly empty.
    pub city: String,
    /// County name (`THXIAN`), possibly empty.
    pub county: String,
}

/// The change types the trend view reports on.
///
/// Other change-type labels may exist in the data; they are valid filter
/// values but never appear as a trend series.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ChangeType {
    /// Resource damage.
    #[serde(rename = "资源损毁")]
    #[strum(serialize = "资源损毁")]
    ResourceDamage,
    /// Restoration and remediation.
    #[serde(rename = "恢复治理")]
    #[strum(serialize = "恢复治理")]
    Restoration,
}

impl ChangeType {
    /// Returns all trend-reportable change types.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::ResourceDamage, Self::Restoration]
    }
}

/// Administrative granularity selector.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Scope {
    /// Province level (`THSHENG`).
    Province,
    /// City level (`THSHI`).
    City,
    /// County level (`THXIAN`). Leaf of the hierarchy.
    County,
}

impl Scope {
    /// Returns the next finer administrative level, or `None` for county.
    #[must_use]
    pub const fn subordinate(self) -> Option<Self> {
        match self {
            Self::Province => Some(Self::City),
            Self::City => Some(Self::County),
            Self::County => None,
        }
    }
}

/// Canonical batch label derived from a raw batch code.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
)]
pub enum BatchLabel {
    /// Codes ending in `01`.
    #[serde(rename = "第一批次")]
    #[strum(serialize = "第一批次")]
    First,
    /// Codes ending in `02`.
    #[serde(rename = "第二批次")]
    #[strum(serialize = "第二批次")]
    Second,
    /// Codes ending in `03`.
    #[serde(rename = "第三批次")]
    #[strum(serialize = "第三批次")]
    Third,
    /// Codes ending in `04`.
    #[serde(rename = "第四批次")]
    #[strum(serialize = "第四批次")]
    Fourth,
    /// Codes of at least two characters with any other suffix.
    #[serde(rename = "其他批次")]
    #[strum(serialize = "其他批次")]
    Other,
    /// Codes shorter than two characters.
    #[serde(rename = "未知批次")]
    #[strum(serialize = "未知批次")]
    Unknown,
}

impl BatchLabel {
    /// Normalizes a raw batch code by its trailing two characters.
    ///
    /// Upstream batch codes arrive in inconsistent formats (`"202301"`,
    /// `"2023-01"`, `"A01"`), so everything before the suffix is ignored.
    /// Length is counted in characters, not bytes: a lone `"批"` is
    /// [`Self::Unknown`] rather than [`Self::Other`].
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let mut tail = code.chars().rev();
        let (Some(last), Some(second_last)) = (tail.next(), tail.next()) else {
            return Self::Unknown;
        };

        match (second_last, last) {
            ('0', '1') => Self::First,
            ('0', '2') => Self::Second,
            ('0', '3') => Self::Third,
            ('0', '4') => Self::Fourth,
            _ => Self::Other,
        }
    }
}

/// Protected-area type codes stored in `BHDLX`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ProtectedType {
    /// National park.
    Np,
    /// National nature reserve.
    Nr,
    /// Forest park.
    Fp,
    /// Wetland park.
    Wp,
    /// Geological park.
    Gp,
    /// Desert park.
    Dp,
    /// Scenic and historic area.
    Sh,
}

impl ProtectedType {
    /// Returns all protected-area types.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Np,
            Self::Nr,
            Self::Fp,
            Self::Wp,
            Self::Gp,
            Self::Dp,
            Self::Sh,
        ]
    }

    /// Returns the Chinese display name of this type.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Np => "国家公园",
            Self::Nr => "国家级自然保护区",
            Self::Fp => "森林公园",
            Self::Wp => "湿地公园",
            Self::Gp => "地质公园",
            Self::Dp => "荒漠公园",
            Self::Sh => "风景名胜区",
        }
    }

    /// Resolves either a type code (`"NP"`) or a display name (`"国家公园"`).
    #[must_use]
    pub fn from_alias(alias: &str) -> Option<Self> {
        alias.parse().ok().or_else(|| {
            Self::all()
                .iter()
                .copied()
                .find(|t| t.display_name() == alias)
        })
    }
}

/// Maps user-facing protected-type input to the stored type code.
///
/// Input is trimmed first. Unrecognized values are returned as-is so the
/// query simply matches nothing instead of failing.
#[must_use]
pub fn normalize_protected_type(input: &str) -> String {
    let trimmed = input.trim();
    ProtectedType::from_alias(trimmed).map_or_else(|| trimmed.to_string(), |t| t.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_label_uses_trailing_two_characters() {
        assert_eq!(BatchLabel::from_code("202301"), BatchLabel::First);
        assert_eq!(BatchLabel::from_code("2023-01"), BatchLabel::First);
        assert_eq!(BatchLabel::from_code("A02"), BatchLabel::Second);
        assert_eq!(BatchLabel::from_code("03"), BatchLabel::Third);
        assert_eq!(BatchLabel::from_code("x-04"), BatchLabel::Fourth);
        assert_eq!(BatchLabel::from_code("20230099"), BatchLabel::Other);
        assert_eq!(BatchLabel::from_code("2023-10"), BatchLabel::Other);
    }

    #[test]
    fn short_batch_codes_are_unknown_not_other() {
        assert_eq!(BatchLabel::from_code(""), BatchLabel::Unknown);
        assert_eq!(BatchLabel::from_code("X"), BatchLabel::Unknown);
        assert_eq!(BatchLabel::from_code("1"), BatchLabel::Unknown);
        assert_ne!(BatchLabel::Unknown, BatchLabel::Other);
    }

    #[test]
    fn batch_label_handles_multibyte_codes() {
        assert_eq!(BatchLabel::from_code("第01"), BatchLabel::First);
        assert_eq!(BatchLabel::from_code("批次"), BatchLabel::Other);
        assert_eq!(BatchLabel::from_code("批"), BatchLabel::Unknown);
    }

    #[test]
    fn batch_label_display_matches_serialized_name() {
        assert_eq!(BatchLabel::First.to_string(), "第一批次");
        assert_eq!(BatchLabel::Unknown.to_string(), "未知批次");
    }

    #[test]
    fn scope_parses_lowercase_tokens_only() {
        assert_eq!("province".parse::<Scope>().unwrap(), Scope::Province);
        assert_eq!("city".parse::<Scope>().unwrap(), Scope::City);
        assert_eq!("county".parse::<Scope>().unwrap(), Scope::County);
        assert!("town".parse::<Scope>().is_err());
        assert!("".parse::<Scope>().is_err());
    }

    #[test]
    fn scope_subordinate_chain() {
        assert_eq!(Scope::Province.subordinate(), Some(Scope::City));
        assert_eq!(Scope::City.subordinate(), Some(Scope::County));
        assert_eq!(Scope::County.subordinate(), None);
    }

    #[test]
    fn change_type_labels() {
        assert_eq!(ChangeType::ResourceDamage.as_ref(), "资源损毁");
        assert_eq!(ChangeType::Restoration.as_ref(), "恢复治理");
        assert_eq!(
            "恢复治理".parse::<ChangeType>().unwrap(),
            ChangeType::Restoration
        );
    }

    #[test]
    fn protected_type_aliases_map_to_codes() {
        assert_eq!(normalize_protected_type("国家公园"), "NP");
        assert_eq!(normalize_protected_type(" 湿地公园 "), "WP");
        assert_eq!(normalize_protected_type("SH"), "SH");
        for t in ProtectedType::all() {
            assert_eq!(normalize_protected_type(t.display_name()), t.to_string());
        }
    }

    #[test]
    fn unknown_protected_type_passes_through() {
        assert_eq!(normalize_protected_type("城市公园"), "城市公园");
        assert_eq!(normalize_protected_type(" np "), "np");
    }
}
