//! Keyed lookup of slice elements for `indexBy` matching.

use std::collections::HashMap;

use shapediff_types::Value;

use crate::error::{AccessError, AccessResult};

/// A hashable scalar key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum IndexKey {
    Null,
    Bool(bool),
    Int(i128),
    /// Bit pattern of the float, with `-0.0` folded into `0.0`.
    Float(u64),
    String(String),
    Time(i64, u32),
}

impl IndexKey {
    pub(crate) fn of(value: &Value) -> AccessResult<Self> {
        let key = match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Int(i) => Self::Int(i128::from(*i)),
            Value::UInt(u) => Self::Int(i128::from(*u)),
            Value::Float(f) if *f == 0.0 => Self::Float(0f64.to_bits()),
            Value::Float(f) => Self::Float(f.to_bits()),
            Value::String(s) => Self::String(s.clone()),
            Value::Time(t) => Self::Time(t.timestamp(), t.timestamp_subsec_nanos()),
            other => {
                return Err(AccessError::UnexpectedValue {
                    expected: "scalar key",
                    found: other.kind(),
                })
            }
        };
        Ok(key)
    }
}

/// How elements are keyed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum IndexBy {
    /// The element itself (`indexBy=.`).
    Value,
    /// A field of record elements, by position on each side.
    Field { from: usize, to: usize },
    /// A record field or map entry found by name when comparing. Elements
    /// without it are keyed as null.
    Named(String),
}

/// Which side of a comparison a slice belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    From,
    To,
}

impl IndexBy {
    pub(crate) fn key(&self, item: &Value, side: Side) -> AccessResult<IndexKey> {
        match self {
            Self::Value => IndexKey::of(item),
            Self::Field { from, to } => {
                let index = match side {
                    Side::From => *from,
                    Side::To => *to,
                };
                field_key(item, index)
            }
            Self::Named(name) => named_key(item, name),
        }
    }
}

/// Elements of one slice keyed by `indexBy`.
///
/// When several elements share a key, the last one wins.
pub(crate) struct Index<'v> {
    items: &'v [Value],
    keys: Vec<Option<IndexKey>>,
    positions: HashMap<IndexKey, usize>,
}

impl<'v> Index<'v> {
    /// Index `items` by `index`. Elements whose key cannot be read are left
    /// out and reported through `errors` with their position.
    pub(crate) fn build(
        items: &'v [Value],
        index: &IndexBy,
        side: Side,
        errors: &mut Vec<(usize, AccessError)>,
    ) -> Self {
        let mut keys = Vec::with_capacity(items.len());
        let mut positions = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            match index.key(item, side) {
                Ok(key) => {
                    positions.insert(key.clone(), position);
                    keys.push(Some(key));
                }
                Err(e) => {
                    errors.push((position, e));
                    keys.push(None);
                }
            }
        }
        Self {
            items,
            keys,
            positions,
        }
    }

    /// Surviving entries in positional order.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&IndexKey, usize, &'v Value)> + '_ {
        self.keys
            .iter()
            .enumerate()
            .filter_map(move |(position, key)| {
                let key = key.as_ref()?;
                (self.positions.get(key) == Some(&position))
                    .then(|| (key, position, &self.items[position]))
            })
    }

    pub(crate) fn get(&self, key: &IndexKey) -> Option<(usize, &'v Value)> {
        self.positions
            .get(key)
            .map(|&position| (position, &self.items[position]))
    }

    pub(crate) fn contains(&self, key: &IndexKey) -> bool {
        self.positions.contains_key(key)
    }
}

fn field_key(item: &Value, index: usize) -> AccessResult<IndexKey> {
    match item {
        Value::Null => Ok(IndexKey::Null),
        Value::Record(record) => {
            let value = record.get(index).ok_or_else(|| AccessError::MissingField {
                shape: record.target().name().to_string(),
                index,
            })?;
            IndexKey::of(value)
        }
        other => Err(AccessError::UnexpectedValue {
            expected: "record",
            found: other.kind(),
        }),
    }
}

fn named_key(item: &Value, name: &str) -> AccessResult<IndexKey> {
    let value = match item {
        Value::Null => None,
        Value::Map(entries) => entries.get(name),
        Value::Record(record) => record.field(name).ok(),
        other => {
            return Err(AccessError::UnexpectedValue {
                expected: "record or map",
                found: other.kind(),
            })
        }
    };
    value.map_or(Ok(IndexKey::Null), IndexKey::of)
}
