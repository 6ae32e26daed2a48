use thiserror::Error;

/// Failures propagated from the data store collaborator.
///
/// The extraction core never retries these; retry policy belongs to the
/// caller or to the store itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("unknown field '{field}' on entity '{entity}'")]
    UnknownField { entity: String, field: String },

    #[error("query failed: {0}")]
    Query(String),

    #[error("connection failed: {0}")]
    Connection(String),
}

pub type DataSourceResult<T> = std::result::Result<T, DataSourceError>;
