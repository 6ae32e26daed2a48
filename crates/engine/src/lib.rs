//! Daymark Engine
//!
//! Turns named metric definitions plus requested calendar dates into
//! deterministic, lazy streams of dated snapshot records. Single-threaded,
//! synchronous, pull-based: records are produced as the caller consumes
//! the returned steps, and re-running with an unchanged data source
//! reproduces identical output.

pub mod definition;
pub mod error;
pub mod manager;
pub mod record;
pub mod step;

// Re-export main types for convenience
pub use definition::{Definition, Strategy};
pub use error::{ExtractError, ExtractResult};
pub use manager::{BoundaryPolicy, ExtractionManager};
pub use record::ExtractionRecord;
pub use step::Step;
