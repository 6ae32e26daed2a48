use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use daymark_core::{DayBound, Row, Window};
use daymark_ports::{
    AggregateQuery, AggregateValue, DataSource, DataSourceError, DataSourceResult, EnumerateQuery,
    Measure, RelatedBefore,
};

/// One stored record: an id, named columns, and an optional parent link
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: u64,
    times: BTreeMap<String, NaiveDateTime>,
    numbers: BTreeMap<String, f64>,
    texts: BTreeMap<String, String>,
    parent: Option<(String, u64)>,
}

impl Entity {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            times: BTreeMap::new(),
            numbers: BTreeMap::new(),
            texts: BTreeMap::new(),
            parent: None,
        }
    }

    /// Set a timestamp column. The value is stored as its own-zone civil
    /// instant; an unset timestamp column reads as null.
    pub fn time(mut self, field: impl Into<String>, at: impl Into<DayBound>) -> Self {
        self.times.insert(field.into(), at.into().civil_time());
        self
    }

    /// Set a numeric column
    pub fn number(mut self, field: impl Into<String>, value: f64) -> Self {
        self.numbers.insert(field.into(), value);
        self
    }

    /// Set a text column
    pub fn text(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.texts.insert(field.into(), value.into());
        self
    }

    /// Link this record to a parent record in another table
    pub fn child_of(mut self, table: impl Into<String>, id: u64) -> Self {
        self.parent = Some((table.into(), id));
        self
    }

    fn time_before(&self, field: &str, cutoff: NaiveDateTime) -> bool {
        self.times.get(field).is_some_and(|t| *t < cutoff)
    }
}

/// In-memory data store: named tables of entities in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: BTreeMap<String, Vec<Entity>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record; rows keep insertion order within their table
    pub fn insert(&mut self, table: impl Into<String>, entity: Entity) {
        self.tables.entry(table.into()).or_default().push(entity);
    }

    fn table(&self, name: &str) -> DataSourceResult<&[Entity]> {
        self.tables
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| DataSourceError::UnknownEntity(name.to_string()))
    }

    /// Existence test: does `base` have at least one related record
    /// satisfying the predicate? A base entity with several qualifying
    /// related records still counts once.
    fn has_related(
        &self,
        base_table: &str,
        base: &Entity,
        related: &RelatedBefore,
        cutoff: NaiveDateTime,
    ) -> DataSourceResult<bool> {
        let rows = self.table(&related.relation)?;
        Ok(rows.iter().any(|row| {
            row.parent
                .as_ref()
                .is_some_and(|(table, id)| table == base_table && *id == base.id)
                && row.time_before(&related.timestamp_field, cutoff)
        }))
    }
}

impl DataSource for MemorySource {
    fn aggregate(
        &self,
        query: &AggregateQuery,
        cutoff: NaiveDateTime,
    ) -> DataSourceResult<Vec<AggregateValue>> {
        let base: Vec<&Entity> = self
            .table(&query.entity)?
            .iter()
            .filter(|e| e.time_before(&query.timestamp_field, cutoff))
            .collect();

        let mut values = Vec::with_capacity(query.measures.len());
        for measure in &query.measures {
            // Empty base sets report None, the SQL aggregate-over-empty-set
            // convention; the engine owns coalescing.
            let value = if base.is_empty() {
                match measure {
                    Measure::Count | Measure::CountRelated(_) => AggregateValue::Count(None),
                    Measure::Average(_) | Measure::Sum(_) => AggregateValue::Number(None),
                }
            } else {
                match measure {
                    Measure::Count => AggregateValue::Count(Some(base.len() as i64)),
                    Measure::CountRelated(related) => {
                        let mut count = 0;
                        for entity in &base {
                            if self.has_related(&query.entity, entity, related, cutoff)? {
                                count += 1;
                            }
                        }
                        AggregateValue::Count(Some(count))
                    }
                    Measure::Average(column) => {
                        let samples: Vec<f64> = base
                            .iter()
                            .filter_map(|e| e.numbers.get(column).copied())
                            .collect();
                        if samples.is_empty() {
                            AggregateValue::Number(None)
                        } else {
                            let mean = samples.iter().sum::<f64>() / samples.len() as f64;
                            AggregateValue::Number(Some(mean))
                        }
                    }
                    Measure::Sum(column) => {
                        let sum = base.iter().filter_map(|e| e.numbers.get(column)).sum();
                        AggregateValue::Number(Some(sum))
                    }
                }
            };
            values.push(value);
        }

        Ok(values)
    }

    fn enumerate(&self, query: &EnumerateQuery, window: &Window) -> DataSourceResult<Vec<Row>> {
        let rows = self.table(&query.entity)?;

        let mut out = Vec::new();
        for entity in rows {
            let Some(at) = entity.times.get(&query.timestamp_field) else {
                continue;
            };
            if !window.contains(*at) {
                continue;
            }

            // Project requested fields in order; fields the record does
            // not carry are omitted and left to schema validation.
            let mut row = Row::new();
            for field in &query.fields {
                if let Some(t) = entity.times.get(field) {
                    row.set(field.as_str(), *t);
                } else if let Some(n) = entity.numbers.get(field) {
                    row.set(field.as_str(), *n);
                } else if let Some(s) = entity.texts.get(field) {
                    row.set(field.as_str(), s.clone());
                }
            }
            out.push(row);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daymark_core::{CivilDate, FieldValue};

    fn t(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    fn d(s: &str) -> CivilDate {
        s.parse().unwrap()
    }

    fn sample_store() -> MemorySource {
        let mut source = MemorySource::new();
        source.insert("user", Entity::new(1).time("date_create", t("2022-01-01T08:00:00")));
        source.insert("user", Entity::new(2).time("date_create", t("2022-01-02T09:30:00")));

        // User 1 has two contracts; existence semantics must count it once
        source.insert(
            "contract",
            Entity::new(10)
                .time("date_create", t("2022-01-01T09:00:00"))
                .number("value", 10.0)
                .child_of("user", 1),
        );
        source.insert(
            "contract",
            Entity::new(11)
                .time("date_create", t("2022-01-02T10:00:00"))
                .time("date_validate", t("2022-01-03T10:00:00"))
                .number("value", 20.0)
                .child_of("user", 1),
        );
        source
    }

    #[test]
    fn test_aggregate_counts_before_cutoff() {
        let source = sample_store();
        let query = AggregateQuery::new("user", "date_create").measure(Measure::Count);

        let values = source.aggregate(&query, t("2022-01-02T00:00:00")).unwrap();
        assert_eq!(values, vec![AggregateValue::Count(Some(1))]);

        let values = source.aggregate(&query, t("2022-01-03T00:00:00")).unwrap();
        assert_eq!(values, vec![AggregateValue::Count(Some(2))]);
    }

    #[test]
    fn test_related_existence_counts_base_once() {
        let source = sample_store();
        let query = AggregateQuery::new("user", "date_create").measure(Measure::CountRelated(
            RelatedBefore::new("contract", "date_create"),
        ));

        // Both contracts of user 1 qualify; user 1 still counts once
        let values = source.aggregate(&query, t("2022-01-03T00:00:00")).unwrap();
        assert_eq!(values, vec![AggregateValue::Count(Some(1))]);
    }

    #[test]
    fn test_unset_timestamp_reads_as_null() {
        let source = sample_store();
        let query = AggregateQuery::new("contract", "date_validate").measure(Measure::Count);

        // Only contract 11 carries date_validate at all
        let values = source.aggregate(&query, t("2022-01-04T00:00:00")).unwrap();
        assert_eq!(values, vec![AggregateValue::Count(Some(1))]);
    }

    #[test]
    fn test_empty_base_reports_none() {
        let source = sample_store();
        let query = AggregateQuery::new("user", "date_create")
            .measure(Measure::Count)
            .measure(Measure::Average("value".to_string()));

        let values = source.aggregate(&query, t("2021-01-01T00:00:00")).unwrap();
        assert_eq!(
            values,
            vec![AggregateValue::Count(None), AggregateValue::Number(None)]
        );
    }

    #[test]
    fn test_average_over_base() {
        let source = sample_store();
        let query =
            AggregateQuery::new("contract", "date_create").measure(Measure::Average("value".to_string()));

        let values = source.aggregate(&query, t("2022-01-03T00:00:00")).unwrap();
        assert_eq!(values, vec![AggregateValue::Number(Some(15.0))]);
    }

    #[test]
    fn test_enumerate_respects_half_open_window() {
        let mut source = MemorySource::new();
        source.insert(
            "email",
            Entity::new(1)
                .time("date_sent", t("2022-01-02T00:00:00"))
                .text("type", "registration"),
        );
        source.insert(
            "email",
            Entity::new(2)
                .time("date_sent", t("2022-01-03T00:00:00"))
                .text("type", "registration"),
        );

        let query = EnumerateQuery::new("email", "date_sent")
            .field("date_sent")
            .field("type");
        let window = Window::for_date(d("2022-01-02")).unwrap();

        let rows = source.enumerate(&query, &window).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get("date_sent"),
            Some(&FieldValue::Timestamp(t("2022-01-02T00:00:00")))
        );
    }

    #[test]
    fn test_unknown_table_is_an_error() {
        let source = MemorySource::new();
        let query = AggregateQuery::new("user", "date_create").measure(Measure::Count);
        assert_eq!(
            source.aggregate(&query, t("2022-01-01T00:00:00")),
            Err(DataSourceError::UnknownEntity("user".to_string()))
        );
    }
}
