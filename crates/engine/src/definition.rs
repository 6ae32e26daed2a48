//! Metric definitions and extraction strategies
//!
//! The strategy set is small and fixed (cumulative aggregate vs. row
//! enumeration), so it is a closed sum type dispatched by exhaustive
//! match rather than an open trait hierarchy.

use daymark_core::{CivilDate, FieldKind, FieldValue, MetricSchema, Row, Window, day_end};
use daymark_ports::{AggregateQuery, AggregateValue, DataSource, DataSourceError, EnumerateQuery, Measure};

use crate::error::{ExtractError, ExtractResult};

/// How one metric is computed against the data source for a half-open
/// window `[date_start, date_end)`
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// Cumulative summary as of the window end. The window start is
    /// informational; the aggregation always covers everything strictly
    /// before the cutoff. Exactly one record per invocation.
    DateAggregated(AggregateQuery),

    /// One record per source row whose timestamp falls inside the
    /// window. A row exactly at the window start is included, one
    /// exactly at the window end is excluded.
    IndividualRows(EnumerateQuery),
}

/// One extractable metric: a name, a declared schema, and a strategy.
///
/// Definitions hold no state across calls; each extraction is
/// independently reproducible against an unchanged data source.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    name: String,
    schema: MetricSchema,
    strategy: Strategy,
}

impl Definition {
    /// A cumulative-aggregate metric. Measures pair positionally with
    /// the declared fields: counts feed `Int` fields, averages and sums
    /// feed `Float` fields.
    pub fn date_aggregated(
        name: impl Into<String>,
        schema: MetricSchema,
        query: AggregateQuery,
    ) -> ExtractResult<Self> {
        let name = name.into();
        check_unique_fields(&name, &schema)?;

        if query.measures.len() != schema.len() {
            return Err(ExtractError::InvalidDefinition {
                extractor: name,
                reason: format!(
                    "{} measures for {} declared fields",
                    query.measures.len(),
                    schema.len()
                ),
            });
        }

        for (measure, field) in query.measures.iter().zip(schema.fields()) {
            let expected = match measure {
                Measure::Count | Measure::CountRelated(_) => FieldKind::Int,
                Measure::Average(_) | Measure::Sum(_) => FieldKind::Float,
            };
            if field.kind() != expected {
                return Err(ExtractError::InvalidDefinition {
                    extractor: name,
                    reason: format!(
                        "field '{}' is {:?} but its measure produces {:?}",
                        field.name(),
                        field.kind(),
                        expected
                    ),
                });
            }
        }

        Ok(Self {
            name,
            schema,
            strategy: Strategy::DateAggregated(query),
        })
    }

    /// A row-enumeration metric: one qualifying source row becomes one
    /// record, no aggregation. Emitted rows are checked against the
    /// schema per record, so a source returning rows that lack declared
    /// fields surfaces as a schema violation at extraction time.
    pub fn individual_rows(
        name: impl Into<String>,
        schema: MetricSchema,
        query: EnumerateQuery,
    ) -> ExtractResult<Self> {
        let name = name.into();
        check_unique_fields(&name, &schema)?;

        Ok(Self {
            name,
            schema,
            strategy: Strategy::IndividualRows(query),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &MetricSchema {
        &self.schema
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Run this definition's strategy for one calendar date, yielding
    /// unvalidated rows
    pub(crate) fn extract(&self, source: &dyn DataSource, date: CivilDate) -> ExtractResult<Vec<Row>> {
        match &self.strategy {
            Strategy::DateAggregated(query) => {
                let cutoff = day_end(date)?;
                let values = source
                    .aggregate(query, cutoff)
                    .map_err(|e| self.source_error(date, e))?;

                if values.len() != query.measures.len() {
                    return Err(self.source_error(
                        date,
                        DataSourceError::Query(format!(
                            "expected {} aggregate values, got {}",
                            query.measures.len(),
                            values.len()
                        )),
                    ));
                }

                let mut row = Row::new();
                for (field, value) in self.schema.fields().iter().zip(values) {
                    row.set(field.name(), coalesce(value, field.is_nullable()));
                }
                Ok(vec![row])
            }

            Strategy::IndividualRows(query) => {
                let window = Window::for_date(date)?;
                source
                    .enumerate(query, &window)
                    .map_err(|e| self.source_error(date, e))
            }
        }
    }

    fn source_error(&self, date: CivilDate, source: DataSourceError) -> ExtractError {
        ExtractError::Source {
            extractor: self.name.clone(),
            date,
            source,
        }
    }
}

/// Null aggregates must collapse to valid zero metrics so that "no data
/// yet" is an ordinary record, not an error: counts always become 0,
/// numeric measures become 0.0 unless the field is nullable.
fn coalesce(value: AggregateValue, nullable: bool) -> FieldValue {
    match value {
        AggregateValue::Count(n) => FieldValue::Int(n.unwrap_or(0)),
        AggregateValue::Number(Some(x)) => FieldValue::Float(x),
        AggregateValue::Number(None) if nullable => FieldValue::Null,
        AggregateValue::Number(None) => FieldValue::Float(0.0),
    }
}

fn check_unique_fields(name: &str, schema: &MetricSchema) -> ExtractResult<()> {
    for (i, field) in schema.fields().iter().enumerate() {
        if schema.fields()[..i].iter().any(|f| f.name() == field.name()) {
            return Err(ExtractError::InvalidDefinition {
                extractor: name.to_string(),
                reason: format!("duplicate field '{}'", field.name()),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use daymark_core::FieldDescriptor;
    use daymark_ports::RelatedBefore;

    fn count_schema() -> MetricSchema {
        MetricSchema::new(vec![
            FieldDescriptor::new("users", FieldKind::Int).differentiable(),
            FieldDescriptor::new("prospects", FieldKind::Int).differentiable(),
        ])
    }

    #[test]
    fn test_date_aggregated_accepts_matching_measures() {
        let query = AggregateQuery::new("user", "date_create")
            .measure(Measure::Count)
            .measure(Measure::CountRelated(RelatedBefore::new(
                "contract",
                "date_create",
            )));
        assert!(Definition::date_aggregated("users", count_schema(), query).is_ok());
    }

    #[test]
    fn test_date_aggregated_rejects_arity_mismatch() {
        let query = AggregateQuery::new("user", "date_create").measure(Measure::Count);
        let result = Definition::date_aggregated("users", count_schema(), query);
        assert!(matches!(
            result,
            Err(ExtractError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_date_aggregated_rejects_kind_mismatch() {
        let schema = MetricSchema::new(vec![FieldDescriptor::new("users", FieldKind::Float)]);
        let query = AggregateQuery::new("user", "date_create").measure(Measure::Count);
        let result = Definition::date_aggregated("users", schema, query);
        assert!(matches!(
            result,
            Err(ExtractError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_duplicate_fields_rejected() {
        let schema = MetricSchema::new(vec![
            FieldDescriptor::new("users", FieldKind::Int),
            FieldDescriptor::new("users", FieldKind::Int),
        ]);
        let query = EnumerateQuery::new("email", "date_sent");
        let result = Definition::individual_rows("emails", schema, query);
        assert!(matches!(
            result,
            Err(ExtractError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_coalesce_counts_to_zero() {
        assert_eq!(
            coalesce(AggregateValue::Count(None), false),
            FieldValue::Int(0)
        );
        assert_eq!(
            coalesce(AggregateValue::Count(Some(7)), false),
            FieldValue::Int(7)
        );
    }

    #[test]
    fn test_coalesce_numbers_respect_nullability() {
        assert_eq!(
            coalesce(AggregateValue::Number(None), true),
            FieldValue::Null
        );
        assert_eq!(
            coalesce(AggregateValue::Number(None), false),
            FieldValue::Float(0.0)
        );
    }
}
