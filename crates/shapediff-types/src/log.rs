//! The ordered change log produced by one comparison.

use std::fmt;

use crate::change::{Change, ChangeRecord, ChangeType};
use crate::error::{TypeError, TypeResult};
use crate::path::Path;
use crate::value::Value;

/// Changes in emission order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeLog {
    changes: Vec<Change>,
}

impl ChangeLog {
    /// Create an empty change log.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn add_create(&mut self, path: Path, to: Value) {
        self.push(Change::Create { path, to });
    }

    pub fn add_update(&mut self, path: Path, from: Value, to: Value) {
        self.push(Change::Update { path, from, to });
    }

    pub fn add_delete(&mut self, path: Path, from: Value) {
        self.push(Change::Delete { path, from });
    }

    /// Record a typed change of the given kind.
    pub fn add(&mut self, change: ChangeType, path: Path, from: Value, to: Value) {
        match change {
            ChangeType::Create => self.add_create(path, to),
            ChangeType::Update => self.add_update(path, from, to),
            ChangeType::Delete => self.add_delete(path, from),
        }
    }

    pub fn add_error(&mut self, path: Path, error: impl fmt::Display) {
        self.push(Change::Error {
            path,
            message: error.to_string(),
        });
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes, errors included.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }

    /// Number of create changes.
    pub fn creates(&self) -> usize {
        self.count(Some(ChangeType::Create))
    }

    /// Number of update changes.
    pub fn updates(&self) -> usize {
        self.count(Some(ChangeType::Update))
    }

    /// Number of delete changes.
    pub fn deletes(&self) -> usize {
        self.count(Some(ChangeType::Delete))
    }

    /// Number of error entries.
    pub fn errors(&self) -> usize {
        self.count(None)
    }

    fn count(&self, kind: Option<ChangeType>) -> usize {
        self.changes
            .iter()
            .filter(|c| c.change_type() == kind)
            .count()
    }

    /// Flatten into exportable records tagged with a source and id.
    pub fn to_change_records(&self, source: &str, source_id: &str) -> Vec<ChangeRecord> {
        self.changes
            .iter()
            .map(|c| ChangeRecord::from_change(c, source, source_id))
            .collect()
    }

    /// Render the records as one JSON array, or an empty string when there
    /// are no changes.
    pub fn to_json(&self) -> TypeResult<String> {
        if self.is_empty() {
            return Ok(String::new());
        }
        serde_json::to_string(&self.to_change_records("", ""))
            .map_err(|e| TypeError::Serialization(e.to_string()))
    }
}

impl fmt::Display for ChangeLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json().map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl<'a> IntoIterator for &'a ChangeLog {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for ChangeLog {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

impl Extend<Change> for ChangeLog {
    fn extend<I: IntoIterator<Item = Change>>(&mut self, iter: I) {
        self.changes.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ChangeLog {
        let mut log = ChangeLog::new();
        let root = Path::root();
        log.add_create(root.field("name"), "ada".into());
        log.add_update(root.field("age"), Value::Int(36), Value::Int(37));
        log.add_delete(root.field("tags").element(0), "x".into());
        log.add_error(root.field("id"), "cannot read");
        log
    }

    #[test]
    fn empty_log_renders_nothing() {
        let log = ChangeLog::new();
        assert!(log.is_empty());
        assert_eq!(log.to_json().unwrap(), "");
        assert_eq!(log.to_string(), "");
    }

    #[test]
    fn counters() {
        let log = sample();
        assert_eq!(log.len(), 4);
        assert_eq!(log.creates(), 1);
        assert_eq!(log.updates(), 1);
        assert_eq!(log.deletes(), 1);
        assert_eq!(log.errors(), 1);
    }

    #[test]
    fn add_dispatches_on_type() {
        let mut log = ChangeLog::new();
        log.add(ChangeType::Delete, Path::root().field("a"), Value::Int(1), Value::Null);
        assert_eq!(
            log.changes()[0],
            Change::Delete {
                path: Path::root().field("a"),
                from: Value::Int(1)
            }
        );
    }

    #[test]
    fn records_preserve_order_and_source() {
        let records = sample().to_change_records("accounts", "7");
        let kinds: Vec<&str> = records.iter().map(|r| r.change.as_str()).collect();
        assert_eq!(kinds, ["create", "update", "delete", "error"]);
        assert!(records.iter().all(|r| r.source == "accounts" && r.source_id == "7"));
        assert_eq!(records[3].error.as_deref(), Some("cannot read"));
    }

    #[test]
    fn json_is_one_array() {
        let log = sample();
        let parsed: serde_json::Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();
        assert_eq!(
            parsed[1],
            json!({"path": "age", "change": "update", "from": 36, "to": 37})
        );
        assert_eq!(parsed.as_array().unwrap().len(), 4);
    }
}
