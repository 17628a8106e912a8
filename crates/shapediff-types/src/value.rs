//! Dynamic values compared by the diff engine.
//!
//! A [`Value`] is the runtime counterpart of a [`Shape`]. Records carry a
//! [`StructRef`] so a dynamically typed slot can be resolved to its concrete
//! shape when it is compared.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::{TypeError, TypeResult};
use crate::shape::{ScalarKind, Shape, StructRef};

/// A dynamically typed value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Time(DateTime<Utc>),
    Record(Record),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for the zero value of the variant.
    ///
    /// Records are never default: a present record is reported through its
    /// fields.
    pub fn is_default(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Int(i) => *i == 0,
            Self::UInt(u) => *u == 0,
            Self::Float(f) => *f == 0.0,
            Self::String(s) => s.is_empty(),
            Self::Time(t) => t.timestamp() == 0 && t.timestamp_subsec_nanos() == 0,
            Self::Record(_) => false,
            Self::List(items) => items.is_empty(),
            Self::Map(entries) => entries.is_empty(),
        }
    }

    /// Name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Time(_) => "time",
            Self::Record(_) => "record",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// The concrete shape of this value, or `None` for null.
    ///
    /// Lists and maps report dynamic elements: their contents are resolved
    /// one element at a time.
    pub fn shape(&self) -> Option<Shape> {
        let shape = match self {
            Self::Null => return None,
            Self::Bool(_) => Shape::Scalar(ScalarKind::Bool),
            Self::Int(_) => Shape::Scalar(ScalarKind::I64),
            Self::UInt(_) => Shape::Scalar(ScalarKind::U64),
            Self::Float(_) => Shape::Scalar(ScalarKind::F64),
            Self::String(_) => Shape::Scalar(ScalarKind::String),
            Self::Time(_) => Shape::Scalar(ScalarKind::Time),
            Self::Record(record) => Shape::Struct(record.target().clone()),
            Self::List(_) => Shape::list(Shape::Dynamic),
            Self::Map(_) => Shape::map(Shape::Scalar(ScalarKind::String), Shape::Dynamic),
        };
        Some(shape)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Plain-text rendering: strings unquoted, times in RFC 3339, composites
    /// as JSON.
    pub fn render(&self) -> String {
        match self {
            Self::Null => "null".into(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::UInt(u) => u.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
            Self::Time(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Self::Record(_) | Self::List(_) | Self::Map(_) => self.to_json().to_string(),
        }
    }

    /// Convert to a `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::UInt(u) => serializer.serialize_u64(*u),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Time(t) => {
                serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::Record(record) => record.serialize(serializer),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

/// A struct value: field values in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    target: StructRef,
    fields: Vec<Value>,
}

impl Record {
    pub fn new(target: StructRef, fields: Vec<Value>) -> Self {
        Self { target, fields }
    }

    /// Create a record, checking the value count against the shape.
    pub fn checked(target: StructRef, fields: Vec<Value>) -> TypeResult<Self> {
        let expected = target.resolve().len();
        if expected != fields.len() {
            return Err(TypeError::RecordArity {
                shape: target.name().to_string(),
                expected,
                actual: fields.len(),
            });
        }
        Ok(Self { target, fields })
    }

    pub fn target(&self) -> &StructRef {
        &self.target
    }

    /// The value at a field position.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }

    /// The value of a field by declared name.
    pub fn field(&self, name: &str) -> TypeResult<&Value> {
        self.target
            .resolve()
            .position(name)
            .and_then(|index| self.fields.get(index))
            .ok_or_else(|| TypeError::UnknownField {
                shape: self.target.name().to_string(),
                field: name.to_string(),
            })
    }

    pub fn values(&self) -> &[Value] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let shape = self.target.resolve();
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (index, value) in self.fields.iter().enumerate() {
            match shape.field(index) {
                Some(def) => map.serialize_entry(def.name(), value)?,
                None => map.serialize_entry(&format!("_{index}"), value)?,
            }
        }
        map.end()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Self::UInt(u)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Time(t)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self::Map(entries)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}
