//! In-memory [`PatchRelation`] over a vector of [`PatchRecord`]s.
//!
//! Follows the same semantics as the SQL relation: conditions are a
//! conjunction, grouped queries produce one row per key combination (or a
//! single row when there are no keys), and row-level queries keep insertion
//! order unless an ordering is requested.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use protected_area_patch_models::PatchRecord;

use crate::relation::{
    Aggregate, Condition, Filter, OrderBy, PatchColumn, PatchRelation, Projection, RelationError,
    RelationQuery, Row, Value,
};

/// A patch relation backed by an owned list of records.
#[derive(Debug, Clone, Default)]
pub struct MemoryRelation {
    records: Vec<PatchRecord>,
}

impl MemoryRelation {
    /// Creates a relation over `records`.
    #[must_use]
    pub const fn new(records: Vec<PatchRecord>) -> Self {
        Self { records }
    }

    fn matching<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a PatchRecord> {
        self.records
            .iter()
            .filter(move |r| filter.conditions().iter().all(|c| matches(r, c)))
    }
}

fn text(record: &PatchRecord, column: PatchColumn) -> &str {
    match column {
        PatchColumn::Id => &record.id,
        PatchColumn::ChangeType => &record.change_type,
        PatchColumn::BeforeCategory => &record.before_category,
        PatchColumn::AfterCategory => &record.after_category,
        PatchColumn::ProtectedAreaName => &record.protected_area_name,
        PatchColumn::ProtectedType => &record.protected_type,
        PatchColumn::Batch => &record.batch,
        PatchColumn::Year => &record.year,
        PatchColumn::Province => &record.province,
        PatchColumn::City => &record.city,
        PatchColumn::County => &record.county,
        PatchColumn::Area => "",
    }
}

fn value(record: &PatchRecord, column: PatchColumn) -> Value {
    match column {
        PatchColumn::Area => Value::Real(record.area),
        other => Value::Text(text(record, other).to_string()),
    }
}

fn matches(record: &PatchRecord, condition: &Condition) -> bool {
    match condition {
        Condition::Equals(column, expected) => text(record, *column) == expected,
        Condition::OneOf(column, options) => {
            let actual = text(record, *column);
            options.iter().any(|o| o == actual)
        }
        Condition::AreaAtLeast(min) => record.area >= *min,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Text(a)), Some(Value::Text(b))) => a.cmp(b),
        (Some(Value::Real(a)), Some(Value::Real(b))) => a.total_cmp(b),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Text(_)), Some(Value::Real(_))) => Ordering::Greater,
        (Some(Value::Real(_)), Some(Value::Text(_))) => Ordering::Less,
    }
}

fn sort_rows(rows: &mut [Row], order_by: &[OrderBy]) {
    if order_by.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        order_by
            .iter()
            .map(|term| {
                let ord = compare_values(a.columns.get(&term.column), b.columns.get(&term.column));
                if term.descending { ord.reverse() } else { ord }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

fn group_rows<'a>(
    records: impl Iterator<Item = &'a PatchRecord>,
    keys: &[PatchColumn],
    aggregates: &[Aggregate],
) -> Vec<Row> {
    let mut groups: BTreeMap<Vec<String>, (u64, f64)> = BTreeMap::new();

    // A global aggregate still yields one row when nothing matches.
    if keys.is_empty() {
        groups.insert(Vec::new(), (0, 0.0));
    }

    for record in records {
        let key = keys.iter().map(|k| text(record, *k).to_string()).collect();
        let entry = groups.entry(key).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += record.area;
    }

    let wants_count = aggregates.contains(&Aggregate::Count);
    let wants_area = aggregates.contains(&Aggregate::SumArea);

    groups
        .into_iter()
        .map(|(key, (count, area))| Row {
            columns: keys
                .iter()
                .copied()
                .zip(key.into_iter().map(Value::Text))
                .collect(),
            count: if wants_count { count } else { 0 },
            area_sum: if wants_area { area } else { 0.0 },
        })
        .collect()
}

#[async_trait]
impl PatchRelation for MemoryRelation {
    async fn query(&self, query: &RelationQuery) -> Result<Vec<Row>, RelationError> {
        let records = self.matching(&query.filter);

        let mut rows: Vec<Row> = match &query.projection {
            Projection::Columns(columns) => records
                .map(|record| Row {
                    columns: columns.iter().map(|c| (*c, value(record, *c))).collect(),
                    ..Row::default()
                })
                .collect(),
            Projection::Grouped { keys, aggregates } => group_rows(records, keys, aggregates),
        };

        sort_rows(&mut rows, &query.order_by);

        let offset = usize::try_from(query.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(
        &self,
        filter: &Filter,
        distinct: Option<PatchColumn>,
    ) -> Result<u64, RelationError> {
        let total = match distinct {
            Some(column) => self
                .matching(filter)
                .map(|r| text(r, column))
                .collect::<BTreeSet<_>>()
                .len(),
            None => self.matching(filter).count(),
        };

        u64::try_from(total).map_err(|e| RelationError::Conversion {
            message: format!("Count does not fit in u64: {e}"),
        })
    }
}
