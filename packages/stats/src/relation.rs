//! The patch relation contract.
//!
//! The statistics engine never talks to storage directly. It describes each
//! query as a [`RelationQuery`] (a conjunction of predicates, a projection
//! that is either plain columns or group keys with aggregates, ordering and
//! an optional window) and hands it to a [`PatchRelation`]. Column names
//! come from the closed [`PatchColumn`] set, so implementations never need
//! to splice request input into query text.

use std::collections::BTreeMap;

use async_trait::async_trait;
use protected_area_patch_models::Scope;
use thiserror::Error;

/// Errors raised by a [`PatchRelation`] implementation.
#[derive(Debug, Error)]
pub enum RelationError {
    /// The backing store rejected or failed the query.
    #[error("Database error: {message}")]
    Database {
        /// Description of what went wrong.
        message: String,
    },

    /// A returned value could not be read as the expected type.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Attributes of a patch record that queries can filter, group or select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PatchColumn {
    /// Patch identifier.
    Id,
    /// Change type label.
    ChangeType,
    /// Land-use category before the change.
    BeforeCategory,
    /// Land-use category after the change.
    AfterCategory,
    /// Patch area.
    Area,
    /// Protected-area name.
    ProtectedAreaName,
    /// Protected-area type code.
    ProtectedType,
    /// Raw batch code.
    Batch,
    /// Reporting year.
    Year,
    /// Province name.
    Province,
    /// City name.
    City,
    /// County name.
    County,
}

impl PatchColumn {
    /// Returns the column name in the `nature_data` table.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Id => "TBBH",
            Self::ChangeType => "BHDL",
            Self::BeforeCategory => "QLX",
            Self::AfterCategory => "HLX",
            Self::Area => "BHMJ",
            Self::ProtectedAreaName => "THBHDMC",
            Self::ProtectedType => "BHDLX",
            Self::Batch => "PC",
            Self::Year => "year",
            Self::Province => "THSHENG",
            Self::City => "THSHI",
            Self::County => "THXIAN",
        }
    }

    /// Returns the lowercase result alias used for this column.
    #[must_use]
    pub const fn alias(self) -> &'static str {
        match self {
            Self::Id => "tbbh",
            Self::ChangeType => "bhdl",
            Self::BeforeCategory => "qlx",
            Self::AfterCategory => "hlx",
            Self::Area => "bhmj",
            Self::ProtectedAreaName => "thbhdmc",
            Self::ProtectedType => "bhdlx",
            Self::Batch => "pc",
            Self::Year => "year",
            Self::Province => "thsheng",
            Self::City => "thshi",
            Self::County => "thxian",
        }
    }

    /// Returns the administrative attribute for a scope.
    #[must_use]
    pub const fn for_scope(scope: Scope) -> Self {
        match scope {
            Scope::Province => Self::Province,
            Scope::City => Self::City,
            Scope::County => Self::County,
        }
    }
}

/// A single predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Exact text match.
    Equals(PatchColumn, String),
    /// Exact match against any of the listed values.
    OneOf(PatchColumn, Vec<String>),
    /// `area >= value`.
    AreaAtLeast(f64),
}

/// A conjunction of [`Condition`]s. An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Creates an empty filter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Returns this filter with `condition` appended.
    #[must_use]
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Appends a condition in place.
    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// Returns the conditions in the order they were added.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns `true` if the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Aggregates computed per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    /// Number of records in the group.
    Count,
    /// Sum of [`PatchColumn::Area`] over the group, `0` when empty.
    SumArea,
}

/// What a query returns for each result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// One row per matching record with the listed columns.
    Columns(Vec<PatchColumn>),
    /// One row per distinct key combination. With no keys, exactly one row
    /// aggregating every matching record.
    Grouped {
        /// Group-by columns.
        keys: Vec<PatchColumn>,
        /// Aggregates to compute per group.
        aggregates: Vec<Aggregate>,
    },
}

/// One ordering term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    /// Column to order by. For grouped queries this must be a group key.
    pub column: PatchColumn,
    /// Sort largest first.
    pub descending: bool,
}

/// A complete query against the patch relation.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationQuery {
    /// Row filter.
    pub filter: Filter,
    /// Selected columns or grouping.
    pub projection: Projection,
    /// Ordering terms, most significant first.
    pub order_by: Vec<OrderBy>,
    /// Maximum number of rows to return.
    pub limit: Option<u64>,
    /// Number of rows to skip.
    pub offset: Option<u64>,
}

impl RelationQuery {
    /// Creates a row-level query selecting `columns`.
    #[must_use]
    pub const fn select(filter: Filter, columns: Vec<PatchColumn>) -> Self {
        Self {
            filter,
            projection: Projection::Columns(columns),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Creates a grouped query.
    #[must_use]
    pub const fn grouped(
        filter: Filter,
        keys: Vec<PatchColumn>,
        aggregates: Vec<Aggregate>,
    ) -> Self {
        Self {
            filter,
            projection: Projection::Grouped { keys, aggregates },
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Adds an ascending ordering term.
    #[must_use]
    pub fn order_by(mut self, column: PatchColumn) -> Self {
        self.order_by.push(OrderBy {
            column,
            descending: false,
        });
        self
    }

    /// Adds a descending ordering term.
    #[must_use]
    pub fn order_by_desc(mut self, column: PatchColumn) -> Self {
        self.order_by.push(OrderBy {
            column,
            descending: true,
        });
        self
    }

    /// Restricts the result to `limit` rows after skipping `offset`.
    #[must_use]
    pub fn window(mut self, limit: u64, offset: u64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }
}

/// A single column value in a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text value.
    Text(String),
    /// Numeric value.
    Real(f64),
    /// Missing value.
    Null,
}

/// One result row.
///
/// Row-level queries fill `columns` with the selected columns. Grouped
/// queries fill `columns` with the group keys and set `count`/`area_sum`
/// for the aggregates that were requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Selected or group-key columns.
    pub columns: BTreeMap<PatchColumn, Value>,
    /// `COUNT(*)` for the group.
    pub count: u64,
    /// Summed area for the group.
    pub area_sum: f64,
}

impl Row {
    /// Returns a text column, or `""` when it is missing, null or numeric.
    #[must_use]
    pub fn text(&self, column: PatchColumn) -> &str {
        match self.columns.get(&column) {
            Some(Value::Text(s)) => s,
            _ => "",
        }
    }

    /// Returns a numeric column, or `0.0` when it is missing, null or text.
    #[must_use]
    pub fn real(&self, column: PatchColumn) -> f64 {
        match self.columns.get(&column) {
            Some(Value::Real(v)) => *v,
            _ => 0.0,
        }
    }
}

/// A queryable, read-only relation of patch records.
#[async_trait]
pub trait PatchRelation: Send + Sync {
    /// Runs a filtered, optionally grouped and windowed query.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError`] if the backing store fails.
    async fn query(&self, query: &RelationQuery) -> Result<Vec<Row>, RelationError>;

    /// Counts matching records, or distinct values of `distinct` among them.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError`] if the backing store fails.
    async fn count(
        &self,
        filter: &Filter,
        distinct: Option<PatchColumn>,
    ) -> Result<u64, RelationError>;
}
