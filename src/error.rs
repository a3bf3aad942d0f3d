use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// A `[Timer]` record whose value or unit token could not be read.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("timer record has no value token")]
    MissingValue,

    #[error("timer record has no unit token")]
    MissingUnit,

    #[error("timer value '{token}' is not an integer: {source}")]
    InvalidValue {
        token: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("failed to open worker log {path}: {source}")]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read worker log {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed timer record in {path} at line {line_number}: {source}")]
    MalformedRecord {
        path: PathBuf,
        line_number: usize,
        #[source]
        source: RecordError,
    },

    #[error("invalid worker index '{value}': {source}")]
    InvalidIndex {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("no [Timer] records found, cannot compute an average")]
    EmptyAggregate,

    #[error("product {product} of {count} timer records has no real root")]
    UndefinedAverage { product: f64, count: usize },
}

impl AggregateError {
    pub fn file_not_found(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileNotFound {
            path: path.into(),
            source,
        }
    }

    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}
