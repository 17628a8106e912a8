use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::Path;
use crate::value::Value;

/// The kind of a typed change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Create,
    Update,
    Delete,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// The change type implied by which sides of a comparison are present.
    pub fn between(from: &Value, to: &Value) -> Self {
        if from.is_null() {
            Self::Create
        } else if to.is_null() {
            Self::Delete
        } else {
            Self::Update
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in a change log.
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    /// A value appeared.
    Create { path: Path, to: Value },
    /// A value changed.
    Update { path: Path, from: Value, to: Value },
    /// A value disappeared.
    Delete { path: Path, from: Value },
    /// The location could not be read or compared.
    Error { path: Path, message: String },
}

impl Change {
    pub fn path(&self) -> &Path {
        match self {
            Self::Create { path, .. }
            | Self::Update { path, .. }
            | Self::Delete { path, .. }
            | Self::Error { path, .. } => path,
        }
    }

    /// The change type, or `None` for an error entry.
    pub fn change_type(&self) -> Option<ChangeType> {
        match self {
            Self::Create { .. } => Some(ChangeType::Create),
            Self::Update { .. } => Some(ChangeType::Update),
            Self::Delete { .. } => Some(ChangeType::Delete),
            Self::Error { .. } => None,
        }
    }

    pub fn from(&self) -> Option<&Value> {
        match self {
            Self::Update { from, .. } | Self::Delete { from, .. } => Some(from),
            _ => None,
        }
    }

    pub fn to(&self) -> Option<&Value> {
        match self {
            Self::Create { to, .. } | Self::Update { to, .. } => Some(to),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// A flattened change, ready for persistence or logging.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(rename = "sourceID", skip_serializing_if = "String::is_empty")]
    pub source_id: String,
    pub path: String,
    /// `create`, `update`, `delete`, or `error`.
    pub change: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChangeRecord {
    pub fn from_change(change: &Change, source: &str, source_id: &str) -> Self {
        Self {
            source: source.to_string(),
            source_id: source_id.to_string(),
            path: change.path().to_string(),
            change: change
                .change_type()
                .map(|t| t.as_str())
                .unwrap_or("error")
                .to_string(),
            from: change.from().map(Value::to_json),
            to: change.to().map(Value::to_json),
            error: change.error().map(str::to_string),
        }
    }
}
