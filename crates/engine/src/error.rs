use thiserror::Error;

use daymark_core::{CivilDate, SchemaViolation, WindowError};
use daymark_ports::DataSourceError;

/// Extraction failures, always carrying the originating extractor and
/// date where one exists. The engine performs no local recovery: every
/// failure is a contract violation or an upstream failure, surfaced
/// unchanged apart from the added context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("invalid range: start {start} is after end {end}")]
    InvalidWindow { start: CivilDate, end: CivilDate },

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("invalid definition '{extractor}': {reason}")]
    InvalidDefinition { extractor: String, reason: String },

    #[error("extractor '{extractor}' violated its schema on {date}: {violation}")]
    Schema {
        extractor: String,
        date: CivilDate,
        #[source]
        violation: SchemaViolation,
    },

    #[error("data source failed for extractor '{extractor}' on {date}: {source}")]
    Source {
        extractor: String,
        date: CivilDate,
        #[source]
        source: DataSourceError,
    },
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;
