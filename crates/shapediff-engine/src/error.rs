//! Error types for the diff engine.
//!
//! [`DiffError`] is returned while a differ is being constructed.
//! [`AccessError`] describes a value that could not be read during a
//! comparison; it is never returned to the caller but recorded in the change
//! log at the path where it happened.

/// Errors that can occur while constructing a differ.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// The two shapes cannot be compared with each other.
    #[error("unsupported match types: {from}, {to}")]
    IncompatibleShapes { from: String, to: String },

    /// A shape the engine has no strategy for.
    #[error("unsupported shape {shape}: {reason}")]
    UnsupportedShape { shape: String, reason: String },

    /// A field annotation that does not follow the tag grammar.
    #[error("invalid tag {tag:?}: {reason}")]
    InvalidTag { tag: String, reason: String },

    /// A presence holder lists a flag with no matching sibling field.
    #[error("failed to match presence field {field} in holder {holder}")]
    PresenceMismatch { field: String, holder: String },

    /// `indexBy` names something the element shape cannot be keyed by.
    #[error("cannot index elements of {shape} by {field:?}")]
    UnknownIndexField { field: String, shape: String },

    /// Struct shapes keep expanding past the configured depth.
    #[error("struct {shape} nests deeper than {depth} levels")]
    CyclicSchema { shape: String, depth: usize },
}

impl DiffError {
    pub(crate) fn incompatible(from: impl ToString, to: impl ToString) -> Self {
        Self::IncompatibleShapes {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub(crate) fn invalid_tag(tag: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTag {
            tag: tag.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for differ construction results.
pub type DiffResult<T> = Result<T, DiffError>;

/// Errors reading or preparing a value during comparison.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// The record has no value at a declared field position.
    #[error("record {shape} has no value for field #{index}")]
    MissingField { shape: String, index: usize },

    /// A numeric value does not fit the reconciled representation.
    #[error("cannot normalize {value} to {target}")]
    Normalization { value: String, target: &'static str },

    /// The value does not match the declared shape.
    #[error("expected {expected}, found {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },

    /// A delimited-string field held something other than a string.
    #[error("cannot decode {found} as delimited text")]
    NotAString { found: &'static str },
}

/// Convenience alias for compare-time reads.
pub type AccessResult<T> = Result<T, AccessError>;
