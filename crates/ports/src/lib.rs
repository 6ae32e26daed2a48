//! Daymark Ports
//!
//! Port definitions (traits) for the Daymark metrics extraction engine.
//! These define the boundary between the extraction core and the
//! structured data store it reads from.

mod error;
mod source;

pub use error::{DataSourceError, DataSourceResult};
pub use source::{AggregateQuery, AggregateValue, DataSource, EnumerateQuery, Measure, RelatedBefore};
