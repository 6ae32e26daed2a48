//! Daymark Core Domain
//!
//! Pure domain types for the Daymark metrics extraction engine.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod calendar;
pub mod schema;
pub mod values;

// Re-export commonly used types at crate root
pub use calendar::{DayRange, Window, WindowError, WindowResult, day_end, day_start, days_between};
pub use schema::{FieldDescriptor, FieldKind, FieldValue, MetricSchema, Row, SchemaViolation};
pub use values::{CivilDate, DayBound, Timestamp};
