//! Dynamic slots: the concrete shape is only known at compare time.

use shapediff_types::{ChangeType, Path, Value};
use tracing::trace;

use crate::error::DiffError;
use crate::program::Cx;
use crate::tag::Tag;

/// Compares values whose declared shape is dynamic.
pub(crate) struct IfaceDiffer {
    tag: Tag,
}

impl IfaceDiffer {
    pub(crate) fn new(tag: &Tag) -> Self {
        Self { tag: tag.clone() }
    }

    pub(crate) fn diff(&self, cx: &mut Cx<'_>, path: &Path, from: &Value, to: &Value, change: ChangeType) {
        diff_dynamic(cx, &self.tag, path, from, to, change);
    }
}

/// Resolve both values to their concrete shapes and compare them with the
/// registry's differ for that pair.
///
/// A side that is null takes the other side's shape, and the change type is
/// forced to a create or a delete. Values whose shapes cannot be compared are
/// reported as one update of the whole value.
pub(crate) fn diff_dynamic(
    cx: &mut Cx<'_>,
    tag: &Tag,
    path: &Path,
    from: &Value,
    to: &Value,
    change: ChangeType,
) {
    let (from_shape, to_shape, change) = match (from.shape(), to.shape()) {
        (None, None) => return,
        (Some(from_shape), None) => (from_shape.clone(), from_shape, ChangeType::Delete),
        (None, Some(to_shape)) => (to_shape.clone(), to_shape, ChangeType::Create),
        (Some(from_shape), Some(to_shape)) => (from_shape, to_shape, change),
    };
    match cx.registry.get(&from_shape, &to_shape, tag, cx.config) {
        Ok(compiled) => compiled.diff(cx, path, from, to, change),
        Err(DiffError::IncompatibleShapes { .. }) => {
            trace!(path = %path, from = %from_shape, to = %to_shape, "shapes differ, replacing value");
            cx.log.add_update(path.clone(), from.clone(), to.clone());
        }
        Err(e) => cx.error(path.clone(), e),
    }
}
