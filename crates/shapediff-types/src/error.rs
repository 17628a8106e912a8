use thiserror::Error;

/// Errors produced by value and change-log operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("record {shape} has {actual} field values, expected {expected}")]
    RecordArity {
        shape: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown field {field:?} on {shape}")]
    UnknownField { shape: String, field: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for type operations.
pub type TypeResult<T> = Result<T, TypeError>;
