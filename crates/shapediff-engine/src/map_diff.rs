//! String-keyed map comparison.

use std::collections::BTreeMap;

use shapediff_types::{ChangeType, Path, ScalarKind, Shape, Value};

use crate::error::{AccessError, DiffError, DiffResult};
use crate::iface::diff_dynamic;
use crate::program::Cx;
use crate::tag::Tag;

static EMPTY: BTreeMap<String, Value> = BTreeMap::new();

/// Compares `map[string]dyn` values entry by entry.
pub(crate) struct MapDiffer {
    /// Directives applied to every entry value.
    tag: Tag,
}

impl MapDiffer {
    pub(crate) fn build(from: &Shape, to: &Shape, tag: &Tag) -> DiffResult<Self> {
        for shape in [from, to] {
            let supported = matches!(
                shape.as_map(),
                Some((key, value))
                    if key.strip_optional().as_scalar() == Some(ScalarKind::String) && value.is_dynamic()
            );
            if !supported {
                return Err(DiffError::UnsupportedShape {
                    shape: shape.to_string(),
                    reason: "maps must have string keys and dynamic values".to_string(),
                });
            }
        }
        Ok(Self { tag: tag.clone() })
    }

    pub(crate) fn diff(&self, cx: &mut Cx<'_>, path: &Path, from: &Value, to: &Value) {
        let (Some(from), Some(to)) = (entries(cx, path, from), entries(cx, path, to)) else {
            return;
        };
        for (key, from_value) in from {
            match to.get(key) {
                Some(to_value) => diff_dynamic(
                    cx,
                    &self.tag,
                    &path.entry(key.as_str()),
                    from_value,
                    to_value,
                    ChangeType::Update,
                ),
                None => diff_dynamic(
                    cx,
                    &self.tag,
                    &path.entry(key.as_str()),
                    from_value,
                    &Value::Null,
                    ChangeType::Delete,
                ),
            }
        }
        for (key, to_value) in to.iter().filter(|(key, _)| !from.contains_key(*key)) {
            diff_dynamic(
                cx,
                &self.tag,
                &path.entry(key.as_str()),
                &Value::Null,
                to_value,
                ChangeType::Create,
            );
        }
    }
}

/// Entries of a map value. Null reads as empty.
fn entries<'v>(cx: &mut Cx<'_>, path: &Path, value: &'v Value) -> Option<&'v BTreeMap<String, Value>> {
    match value {
        Value::Null => Some(&EMPTY),
        Value::Map(entries) => Some(entries),
        other => {
            let error = AccessError::UnexpectedValue {
                expected: "map",
                found: other.kind(),
            };
            cx.error(path.clone(), error);
            None
        }
    }
}
