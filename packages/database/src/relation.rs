//! SQL implementation of the patch relation over the `nature_data` table.
//!
//! Every identifier in generated SQL comes from [`PatchColumn`]; request
//! values only ever travel as `$n` parameters.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use moosicbox_json_utils::database::ToValue as _;
use protected_area_stats::relation::{
    Aggregate, Condition, Filter, PatchColumn, PatchRelation, Projection, RelationError,
    RelationQuery, Row, Value,
};
use switchy_database::{Database, DatabaseError, DatabaseValue};

/// Table holding one row per patch.
pub const TABLE: &str = "nature_data";

const COUNT_ALIAS: &str = "cnt";
const AREA_SUM_ALIAS: &str = "area_sum";

/// A [`PatchRelation`] backed by a `switchy_database` connection.
pub struct SqlPatchRelation {
    db: Arc<dyn Database>,
}

impl SqlPatchRelation {
    /// Wraps a database connection.
    #[must_use]
    pub const fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

fn db_error(e: DatabaseError) -> RelationError {
    RelationError::Database {
        message: e.to_string(),
    }
}

fn ident(column: PatchColumn) -> String {
    format!("\"{}\"", column.column_name())
}

/// Numeric read of a column. `BHMJ` may be stored as `NUMERIC`.
fn numeric(column: PatchColumn) -> String {
    format!("CAST({} AS DOUBLE PRECISION)", ident(column))
}

/// Accumulates positional parameters and hands out their placeholders.
#[derive(Default)]
struct Params {
    values: Vec<DatabaseValue>,
}

impl Params {
    fn bind(&mut self, value: DatabaseValue) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }
}

fn condition_sql(condition: &Condition, params: &mut Params) -> String {
    match condition {
        Condition::Equals(column, value) => format!(
            "{} = {}",
            ident(*column),
            params.bind(DatabaseValue::String(value.clone()))
        ),
        Condition::OneOf(_, values) if values.is_empty() => "FALSE".to_string(),
        Condition::OneOf(column, values) => {
            let placeholders: Vec<String> = values
                .iter()
                .map(|v| params.bind(DatabaseValue::String(v.clone())))
                .collect();
            format!("{} IN ({})", ident(*column), placeholders.join(", "))
        }
        Condition::AreaAtLeast(min) => format!(
            "{} >= {}",
            numeric(PatchColumn::Area),
            params.bind(DatabaseValue::Real64(*min))
        ),
    }
}

fn where_clause(filter: &Filter, params: &mut Params) -> String {
    if filter.is_empty() {
        return String::new();
    }
    let frags: Vec<String> = filter
        .conditions()
        .iter()
        .map(|c| condition_sql(c, params))
        .collect();
    format!(" WHERE {}", frags.join(" AND "))
}

fn column_select(column: PatchColumn) -> String {
    match column {
        PatchColumn::Area => format!("{} AS {}", numeric(column), column.alias()),
        _ => format!("{} AS {}", ident(column), column.alias()),
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Renders `query` as a single parameterized statement.
#[must_use]
pub fn build_sql(query: &RelationQuery) -> (String, Vec<DatabaseValue>) {
    let mut params = Params::default();

    let (select_list, group_by) = match &query.projection {
        Projection::Columns(columns) => (
            columns.iter().map(|c| column_select(*c)).collect::<Vec<_>>(),
            Vec::new(),
        ),
        Projection::Grouped { keys, aggregates } => {
            let mut select: Vec<String> = keys.iter().map(|k| column_select(*k)).collect();
            if aggregates.contains(&Aggregate::Count) {
                select.push(format!("COUNT(*) AS {COUNT_ALIAS}"));
            }
            if aggregates.contains(&Aggregate::SumArea) {
                select.push(format!(
                    "COALESCE(SUM({}), 0) AS {AREA_SUM_ALIAS}",
                    numeric(PatchColumn::Area)
                ));
            }
            (select, keys.iter().map(|k| ident(*k)).collect())
        }
    };

    let select_list = if select_list.is_empty() {
        format!("COUNT(*) AS {COUNT_ALIAS}")
    } else {
        select_list.join(", ")
    };

    let mut sql = format!("SELECT {select_list} FROM {TABLE}");
    sql.push_str(&where_clause(&query.filter, &mut params));

    if !group_by.is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&group_by.join(", "));
    }

    if !query.order_by.is_empty() {
        let terms: Vec<String> = query
            .order_by
            .iter()
            .map(|o| {
                format!(
                    "{} {}",
                    ident(o.column),
                    if o.descending { "DESC" } else { "ASC" }
                )
            })
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&terms.join(", "));
    }

    if let Some(limit) = query.limit {
        let placeholder = params.bind(DatabaseValue::Int64(to_i64(limit)));
        sql.push_str(&format!(" LIMIT {placeholder}"));
    }

    if let Some(offset) = query.offset {
        let placeholder = params.bind(DatabaseValue::Int64(to_i64(offset)));
        sql.push_str(&format!(" OFFSET {placeholder}"));
    }

    (sql, params.values)
}

/// Renders a plain or distinct count over the rows matching `filter`.
#[must_use]
pub fn build_count_sql(
    filter: &Filter,
    distinct: Option<PatchColumn>,
) -> (String, Vec<DatabaseValue>) {
    let mut params = Params::default();
    let counted = distinct.map_or_else(|| "*".to_string(), |c| format!("DISTINCT {}", ident(c)));
    let mut sql = format!("SELECT COUNT({counted}) AS {COUNT_ALIAS} FROM {TABLE}");
    sql.push_str(&where_clause(filter, &mut params));
    (sql, params.values)
}

fn read_count(row: &switchy_database::Row) -> Result<u64, RelationError> {
    let count: i64 = row
        .to_value(COUNT_ALIAS)
        .map_err(|e| RelationError::Conversion {
            message: format!("Failed to parse count: {e:?}"),
        })?;
    u64::try_from(count).map_err(|e| RelationError::Conversion {
        message: format!("Negative count {count}: {e}"),
    })
}

/// Reads a selected column. SQL `NULL` becomes [`Value::Null`]; any other
/// value of the wrong type is a conversion error.
fn read_column(row: &switchy_database::Row, column: PatchColumn) -> Result<Value, RelationError> {
    let alias = column.alias();
    let value = match column {
        PatchColumn::Area => row
            .to_value::<Option<f64>>(alias)
            .map_err(|e| conversion_error(alias, &e))?
            .map_or(Value::Null, Value::Real),
        _ => row
            .to_value::<Option<String>>(alias)
            .map_err(|e| conversion_error(alias, &e))?
            .map_or(Value::Null, Value::Text),
    };
    Ok(value)
}

fn read_area_sum(row: &switchy_database::Row) -> Result<f64, RelationError> {
    row.to_value(AREA_SUM_ALIAS)
        .map_err(|e| conversion_error(AREA_SUM_ALIAS, &e))
}

fn conversion_error(alias: &str, e: &impl std::fmt::Debug) -> RelationError {
    RelationError::Conversion {
        message: format!("Failed to parse {alias}: {e:?}"),
    }
}

fn read_columns(
    row: &switchy_database::Row,
    columns: &[PatchColumn],
) -> Result<BTreeMap<PatchColumn, Value>, RelationError> {
    columns
        .iter()
        .map(|c| Ok((*c, read_column(row, *c)?)))
        .collect()
}

fn decode(row: &switchy_database::Row, projection: &Projection) -> Result<Row, RelationError> {
    match projection {
        Projection::Columns(columns) => Ok(Row {
            columns: read_columns(row, columns)?,
            ..Row::default()
        }),
        Projection::Grouped { keys, aggregates } => Ok(Row {
            columns: read_columns(row, keys)?,
            count: if aggregates.contains(&Aggregate::Count) {
                read_count(row)?
            } else {
                0
            },
            area_sum: if aggregates.contains(&Aggregate::SumArea) {
                read_area_sum(row)?
            } else {
                0.0
            },
        }),
    }
}

#[async_trait]
impl PatchRelation for SqlPatchRelation {
    async fn query(&self, query: &RelationQuery) -> Result<Vec<Row>, RelationError> {
        let (sql, params) = build_sql(query);
        log::debug!("query: {sql} ({} params)", params.len());

        let rows = self
            .db
            .query_raw_params(&sql, &params)
            .await
            .map_err(db_error)?;

        rows.iter()
            .map(|row| decode(row, &query.projection))
            .collect()
    }

    async fn count(
        &self,
        filter: &Filter,
        distinct: Option<PatchColumn>,
    ) -> Result<u64, RelationError> {
        let (sql, params) = build_count_sql(filter, distinct);
        log::debug!("count: {sql} ({} params)", params.len());

        let rows = self
            .db
            .query_raw_params(&sql, &params)
            .await
            .map_err(db_error)?;

        rows.first().map_or(Ok(0), read_count)
    }
}
