//! Field reads: positional lookup, nullification, numeric reconciliation.

use std::borrow::Cow;

use shapediff_types::{ScalarKind, Value};

use crate::error::{AccessError, AccessResult, DiffError, DiffResult};

/// Common representation for two scalar kinds that differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Normalize {
    /// Mixed signed and unsigned integers, as `i64`.
    Signed,
    /// Integers mixed with floats, as `f64`.
    Float,
    /// Unrelated kinds, compared by rendered text.
    Text,
}

impl Normalize {
    /// The normalization needed to compare `from` with `to`, if any.
    pub(crate) fn reconcile(
        from: ScalarKind,
        to: ScalarKind,
        strict: bool,
    ) -> DiffResult<Option<Self>> {
        if from == to {
            return Ok(None);
        }
        if from.is_numeric() && to.is_numeric() {
            let norm = if from.is_float() && to.is_float() {
                None
            } else if from.is_float() || to.is_float() {
                Some(Self::Float)
            } else if from.is_signed() == to.is_signed() {
                None
            } else {
                Some(Self::Signed)
            };
            return Ok(norm);
        }
        if strict {
            return Err(DiffError::incompatible(from, to));
        }
        Ok(Some(Self::Text))
    }

    fn target(&self) -> &'static str {
        match self {
            Self::Signed => "i64",
            Self::Float => "f64",
            Self::Text => "string",
        }
    }

    pub(crate) fn apply<'v>(&self, value: &'v Value) -> AccessResult<Cow<'v, Value>> {
        let normalized = match (self, value) {
            (_, Value::Null) | (Self::Signed, Value::Int(_)) | (Self::Float, Value::Float(_)) => {
                return Ok(Cow::Borrowed(value))
            }
            (Self::Signed, Value::UInt(u)) => {
                i64::try_from(*u)
                    .map(Value::Int)
                    .map_err(|_| AccessError::Normalization {
                        value: u.to_string(),
                        target: self.target(),
                    })?
            }
            (Self::Float, Value::Int(i)) => Value::Float(*i as f64),
            (Self::Float, Value::UInt(u)) => Value::Float(*u as f64),
            (Self::Text, Value::String(_)) => return Ok(Cow::Borrowed(value)),
            (Self::Text, other) => Value::String(other.render()),
            (_, other) => {
                return Err(AccessError::UnexpectedValue {
                    expected: self.target(),
                    found: other.kind(),
                })
            }
        };
        Ok(Cow::Owned(normalized))
    }
}

/// Normalize when a rule is set, borrowing otherwise.
pub(crate) fn normalize<'v>(
    norm: Option<Normalize>,
    value: &'v Value,
) -> AccessResult<Cow<'v, Value>> {
    match norm {
        Some(norm) => norm.apply(value),
        None => Ok(Cow::Borrowed(value)),
    }
}

/// Reads one field out of a record value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Accessor {
    index: usize,
    norm: Option<Normalize>,
    nullify: bool,
}

impl Accessor {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            norm: None,
            nullify: false,
        }
    }

    pub(crate) fn with_norm(mut self, norm: Option<Normalize>) -> Self {
        self.norm = norm;
        self
    }

    /// Read zero values of `kind` as null. Only integers, floats and strings
    /// can be nullified.
    pub(crate) fn nullify(mut self, enabled: bool, kind: Option<ScalarKind>) -> Self {
        self.nullify = enabled
            && kind.is_some_and(|k| k.is_numeric() || matches!(k, ScalarKind::String));
        self
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// The field value of `holder`, or null when the holder itself is null.
    pub(crate) fn read<'v>(&self, holder: &'v Value) -> AccessResult<Cow<'v, Value>> {
        let record = match holder {
            Value::Null => return Ok(Cow::Owned(Value::Null)),
            Value::Record(record) => record,
            other => {
                return Err(AccessError::UnexpectedValue {
                    expected: "record",
                    found: other.kind(),
                })
            }
        };
        let value = record
            .get(self.index)
            .ok_or_else(|| AccessError::MissingField {
                shape: record.target().name().to_string(),
                index: self.index,
            })?;
        if self.nullify && value.is_default() {
            return Ok(Cow::Owned(Value::Null));
        }
        normalize(self.norm, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapediff_types::{Record, Shape, StructShape};

    fn row(values: Vec<Value>) -> Value {
        let target = StructShape::builder("tests::Row")
            .field("count", Shape::Scalar(ScalarKind::U64))
            .field("label", Shape::Scalar(ScalarKind::String))
            .into_ref();
        Value::Record(Record::new(target, values))
    }

    #[test]
    fn reconcile_rules() {
        use ScalarKind::*;
        assert_eq!(Normalize::reconcile(I64, I64, true).unwrap(), None);
        assert_eq!(Normalize::reconcile(I32, I64, true).unwrap(), None);
        assert_eq!(Normalize::reconcile(I64, U8, true).unwrap(), Some(Normalize::Signed));
        assert_eq!(Normalize::reconcile(U16, F32, true).unwrap(), Some(Normalize::Float));
        assert_eq!(Normalize::reconcile(F32, F64, true).unwrap(), None);
        assert_eq!(Normalize::reconcile(String, I64, false).unwrap(), Some(Normalize::Text));
        assert!(matches!(
            Normalize::reconcile(String, Bool, true),
            Err(DiffError::IncompatibleShapes { .. })
        ));
    }

    #[test]
    fn signed_normalization_overflows() {
        assert_eq!(
            Normalize::Signed.apply(&Value::UInt(5)).unwrap().into_owned(),
            Value::Int(5)
        );
        assert!(matches!(
            Normalize::Signed.apply(&Value::UInt(u64::MAX)),
            Err(AccessError::Normalization { .. })
        ));
        assert_eq!(
            Normalize::Text.apply(&Value::Bool(true)).unwrap().into_owned(),
            Value::from("true")
        );
    }

    #[test]
    fn reads_by_position() {
        let value = row(vec![Value::UInt(3), "x".into()]);
        let accessor = Accessor::new(1);
        assert_eq!(accessor.read(&value).unwrap().as_ref(), &Value::from("x"));
        assert_eq!(accessor.read(&Value::Null).unwrap().as_ref(), &Value::Null);
    }

    #[test]
    fn nullify_turns_zero_into_null() {
        let value = row(vec![Value::UInt(0), String::new().into()]);
        let count = Accessor::new(0).nullify(true, Some(ScalarKind::U64));
        let label = Accessor::new(1).nullify(true, Some(ScalarKind::String));
        assert!(count.read(&value).unwrap().is_null());
        assert!(label.read(&value).unwrap().is_null());
        let flag = Accessor::new(0).nullify(true, Some(ScalarKind::Bool));
        assert!(!flag.read(&value).unwrap().is_null());
    }

    #[test]
    fn read_errors() {
        let short = row(vec![Value::UInt(1)]);
        assert!(matches!(
            Accessor::new(1).read(&short),
            Err(AccessError::MissingField { index: 1, .. })
        ));
        assert!(matches!(
            Accessor::new(0).read(&Value::Int(1)),
            Err(AccessError::UnexpectedValue { expected: "record", .. })
        ));
    }
}
