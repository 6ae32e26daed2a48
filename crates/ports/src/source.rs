//! The DataSource boundary
//!
//! The minimum query capability the extraction engine consumes: filtered
//! counting/summation of entities by a timestamp cutoff and related-entity
//! existence, and filtered enumeration of entities by a half-open time
//! window. Deliberately not a general query planner.

use chrono::NaiveDateTime;

use daymark_core::{Row, Window};

use crate::error::DataSourceResult;

/// Existence predicate over a related collection.
///
/// A base entity qualifies when at least one entity of `relation` linked
/// to it has `timestamp_field < cutoff`. Existence, never a sum: a base
/// entity with several qualifying related entities counts once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedBefore {
    pub relation: String,
    pub timestamp_field: String,
}

impl RelatedBefore {
    pub fn new(relation: impl Into<String>, timestamp_field: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            timestamp_field: timestamp_field.into(),
        }
    }
}

/// One scalar reduction over the filtered base entities
#[derive(Debug, Clone, PartialEq)]
pub enum Measure {
    /// Number of base entities with `timestamp_field < cutoff`
    Count,
    /// Number of base entities having at least one qualifying related entity
    CountRelated(RelatedBefore),
    /// Mean of a numeric column over the filtered base entities
    Average(String),
    /// Sum of a numeric column over the filtered base entities
    Sum(String),
}

/// One logical aggregation as of a single cutoff instant
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateQuery {
    /// Base entity name
    pub entity: String,
    /// Timestamp field the cutoff applies to
    pub timestamp_field: String,
    /// Reductions to compute, in output order
    pub measures: Vec<Measure>,
}

impl AggregateQuery {
    pub fn new(entity: impl Into<String>, timestamp_field: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            timestamp_field: timestamp_field.into(),
            measures: Vec::new(),
        }
    }

    /// Builder-style measure registration
    pub fn measure(mut self, measure: Measure) -> Self {
        self.measures.push(measure);
        self
    }
}

/// Raw-row enumeration over a half-open time window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerateQuery {
    /// Entity name
    pub entity: String,
    /// Timestamp field the window applies to
    pub timestamp_field: String,
    /// Fields to project, in output order
    pub fields: Vec<String>,
}

impl EnumerateQuery {
    pub fn new(entity: impl Into<String>, timestamp_field: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            timestamp_field: timestamp_field.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field projection
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }
}

/// One aggregate result value.
///
/// Sources report `None` when the aggregate had no input (the SQL
/// NULL-over-empty-set convention); coalescing is the engine's job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateValue {
    Count(Option<i64>),
    Number(Option<f64>),
}

/// Read-only query capability of the structured data store.
///
/// Timestamps cross this boundary as civil (own-zone) instants; sources
/// must compare each entity's own-zone civil time against the given
/// bounds, never a zone-converted one.
pub trait DataSource {
    /// Evaluate `query` against all base entities with
    /// `timestamp_field < cutoff`, returning exactly one value per
    /// measure, in measure order.
    fn aggregate(
        &self,
        query: &AggregateQuery,
        cutoff: NaiveDateTime,
    ) -> DataSourceResult<Vec<AggregateValue>>;

    /// Enumerate entity rows whose `timestamp_field` lies inside the
    /// half-open `window`, projected to `query.fields`, in source
    /// iteration order.
    fn enumerate(&self, query: &EnumerateQuery, window: &Window) -> DataSourceResult<Vec<Row>>;
}
