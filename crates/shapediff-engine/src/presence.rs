//! Presence-gated comparison.
//!
//! A struct may carry a holder field (tagged `presence=true`) whose value is
//! a struct of booleans named after its siblings. When presence checking is
//! enabled, a field whose flag is not set is left out of the comparison.

use shapediff_types::{FieldDef, StructShape, Value};

use crate::error::{DiffError, DiffResult};

/// The presence holder of one struct shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Holder {
    /// Position of the holder field in its struct.
    index: usize,
    /// For each field position of the owning struct, the position of its
    /// flag inside the holder.
    flags: Vec<Option<usize>>,
}

impl Holder {
    pub(crate) fn new(index: usize, holder: &FieldDef, owner: &StructShape) -> DiffResult<Self> {
        let target = holder
            .shape()
            .as_struct()
            .ok_or_else(|| DiffError::UnsupportedShape {
                shape: holder.shape().to_string(),
                reason: format!("presence holder {} must be a struct of flags", holder.name()),
            })?;
        let mut flags = vec![None; owner.len()];
        for (flag, def) in target.resolve().fields().iter().enumerate() {
            let position = owner
                .position(def.name())
                .ok_or_else(|| DiffError::PresenceMismatch {
                    field: def.name().to_string(),
                    holder: holder.name().to_string(),
                })?;
            flags[position] = Some(flag);
        }
        Ok(Self { index, flags })
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// The flag for `field` in `owner`, or `None` when there is no holder
    /// value to consult. Fields without a flag count as unset.
    fn lookup(&self, owner: &Value, field: usize) -> Option<bool> {
        let holder = owner.as_record()?.get(self.index)?.as_record()?;
        let set = self
            .flags
            .get(field)
            .copied()
            .flatten()
            .and_then(|flag| holder.get(flag))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Some(set)
    }
}

/// Presence holders of both sides of a struct differ.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct PresenceProvider {
    pub(crate) from: Option<Holder>,
    pub(crate) to: Option<Holder>,
}

impl PresenceProvider {
    pub(crate) fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether a field was set. The "to" holder is consulted first, then the
    /// "from" holder; with neither available every field counts as set.
    pub(crate) fn is_set(&self, from: &Value, to: &Value, from_field: usize, to_field: usize) -> bool {
        self.to
            .as_ref()
            .and_then(|h| h.lookup(to, to_field))
            .or_else(|| self.from.as_ref().and_then(|h| h.lookup(from, from_field)))
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapediff_types::{Record, ScalarKind, Shape, StructRef};

    fn flags_ref() -> StructRef {
        StructShape::builder("tests::Has")
            .field("id", Shape::Scalar(ScalarKind::Bool))
            .field("name", Shape::Scalar(ScalarKind::Bool))
            .into_ref()
    }

    fn owner() -> std::sync::Arc<StructShape> {
        StructShape::builder("tests::Item")
            .field("id", Shape::Scalar(ScalarKind::I64))
            .field("name", Shape::Scalar(ScalarKind::String))
            .field("extra", Shape::Scalar(ScalarKind::I64))
            .tagged(
                "has",
                Shape::optional(Shape::Struct(flags_ref())),
                "diff",
                "presence=true",
            )
            .build()
    }

    fn item(has: Option<(bool, bool)>) -> Value {
        let flags = match has {
            Some((id, name)) => Value::Record(Record::new(flags_ref(), vec![id.into(), name.into()])),
            None => Value::Null,
        };
        let target = StructRef::ready(owner());
        Value::Record(Record::new(
            target,
            vec![Value::Int(1), "n".into(), Value::Int(2), flags],
        ))
    }

    #[test]
    fn flags_map_to_sibling_positions() {
        let owner = owner();
        let holder = Holder::new(3, owner.field(3).unwrap(), &owner).unwrap();
        assert_eq!(holder.flags, [Some(0), Some(1), None, None]);
        assert_eq!(holder.index(), 3);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let flags = StructShape::builder("tests::BadHas")
            .field("missing", Shape::Scalar(ScalarKind::Bool))
            .into_ref();
        let owner = StructShape::builder("tests::Item")
            .field("id", Shape::Scalar(ScalarKind::I64))
            .field("has", Shape::Struct(flags))
            .build();
        let err = Holder::new(1, owner.field(1).unwrap(), &owner).unwrap_err();
        assert_eq!(
            err,
            DiffError::PresenceMismatch {
                field: "missing".into(),
                holder: "has".into()
            }
        );
    }

    #[test]
    fn to_holder_wins_and_falls_back_to_from() {
        let owner = owner();
        let holder = Holder::new(3, owner.field(3).unwrap(), &owner).unwrap();
        let provider = PresenceProvider {
            from: Some(holder.clone()),
            to: Some(holder),
        };
        let from = item(Some((true, false)));
        let to = item(Some((false, true)));
        assert!(!provider.is_set(&from, &to, 0, 0));
        assert!(provider.is_set(&from, &to, 1, 1));
        assert!(!provider.is_set(&from, &to, 2, 2));

        let to_without_flags = item(None);
        assert!(provider.is_set(&from, &to_without_flags, 0, 0));
        assert!(!provider.is_set(&from, &to_without_flags, 1, 1));

        assert!(provider.is_set(&item(None), &item(None), 0, 0));
    }
}
