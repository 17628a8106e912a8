//! Slice comparison: positional, sorted, or keyed by `indexBy`.

use std::borrow::Cow;

use shapediff_types::{ChangeType, Path, Shape, StructRef, Value};

use crate::compare::ScalarDiffer;
use crate::error::{AccessError, DiffError, DiffResult};
use crate::iface::diff_dynamic;
use crate::index::{Index, IndexBy, Side};
use crate::matcher::FieldMatcher;
use crate::program::{Builder, Compiled, Cx, NodeId};
use crate::sort::sorted;
use crate::tag::Tag;

static NULL: Value = Value::Null;

pub(crate) struct SliceDiffer {
    item: Item,
    sort: bool,
    index: Option<IndexBy>,
}

/// How a pair of elements is compared.
enum Item {
    /// Each element is resolved through the registry by its own shape.
    Dynamic(Tag),
    Scalar(ScalarDiffer),
    Node(NodeId),
}

impl SliceDiffer {
    pub(crate) fn build(builder: &mut Builder<'_>, from: &Shape, to: &Shape, tag: &Tag) -> DiffResult<Self> {
        let (from, to) = (from.strip_optional(), to.strip_optional());
        if from.is_dynamic() || to.is_dynamic() {
            return Ok(Self {
                item: Item::Dynamic(Tag {
                    sort: false,
                    index_by: None,
                    ..tag.clone()
                }),
                sort: tag.sort,
                index: tag.index_by.as_deref().map(|field| match field {
                    "." => IndexBy::Value,
                    name => IndexBy::Named(name.to_string()),
                }),
            });
        }

        let scalars = from.as_scalar().zip(to.as_scalar());
        let item = match scalars {
            Some((from_kind, to_kind)) => Item::Scalar(ScalarDiffer::build(
                from_kind,
                to_kind,
                tag,
                builder.config().strict_mode,
            )?),
            None => Item::Node(builder.node(from, to, &Tag::default())?),
        };
        let sort = tag.sort && scalars.is_some_and(|(f, t)| f.is_sortable() && t.is_sortable());
        let index = match tag.index_by.as_deref() {
            None => None,
            Some(".") if scalars.is_some() => Some(IndexBy::Value),
            Some(field) => Some(index_field(field, from, to)?),
        };
        Ok(Self { item, sort, index })
    }

    pub(crate) fn diff(&self, program: &Compiled, cx: &mut Cx<'_>, path: &Path, from: &Value, to: &Value) {
        let (Some(from_items), Some(to_items)) = (elements(cx, path, from), elements(cx, path, to)) else {
            return;
        };
        let (from_items, to_items) = if self.sort {
            (sorted(from_items), sorted(to_items))
        } else {
            (Cow::Borrowed(from_items), Cow::Borrowed(to_items))
        };
        match &self.index {
            Some(index) if !from_items.is_empty() && !to_items.is_empty() => {
                self.diff_indexed(program, cx, path, index, &from_items, &to_items)
            }
            _ => {
                for position in 0..from_items.len().max(to_items.len()) {
                    let (f, t) = at(&from_items, &to_items, position);
                    let change = position_change(&from_items, &to_items, position);
                    self.item.diff(program, cx, &path.element(position), f, t, change);
                }
            }
        }
    }

    fn diff_indexed(
        &self,
        program: &Compiled,
        cx: &mut Cx<'_>,
        path: &Path,
        index: &IndexBy,
        from_items: &[Value],
        to_items: &[Value],
    ) {
        let mut errors = Vec::new();
        let from_index = Index::build(from_items, index, Side::From, &mut errors);
        for (position, error) in errors.drain(..) {
            cx.error(path.element(position), error);
        }
        let to_index = Index::build(to_items, index, Side::To, &mut errors);
        for (position, error) in errors {
            cx.error(path.element(position), error);
        }

        for (key, position, value) in from_index.entries() {
            if !to_index.contains(key) {
                cx.log.add_delete(path.element(position), value.clone());
            }
        }
        for (key, position, value) in from_index.entries() {
            if let Some((_, other)) = to_index.get(key) {
                self.item
                    .diff(program, cx, &path.element(position), value, other, ChangeType::Update);
            }
        }
        for (key, position, value) in to_index.entries() {
            if !from_index.contains(key) {
                cx.log.add_create(path.element(position), value.clone());
            }
        }
    }
}

impl Item {
    fn diff(&self, program: &Compiled, cx: &mut Cx<'_>, path: &Path, from: &Value, to: &Value, change: ChangeType) {
        match self {
            Self::Dynamic(tag) => diff_dynamic(cx, tag, path, from, to, change),
            Self::Scalar(differ) => differ.diff(cx, path, from, to, change),
            Self::Node(node) => program.run(*node, cx, path, from, to, change),
        }
    }
}

/// The elements of a slice value. Null reads as empty.
fn elements<'v>(cx: &mut Cx<'_>, path: &Path, value: &'v Value) -> Option<&'v [Value]> {
    match value {
        Value::Null => Some(&[]),
        Value::List(items) => Some(items),
        other => {
            let error = AccessError::UnexpectedValue {
                expected: "list",
                found: other.kind(),
            };
            cx.error(path.clone(), error);
            None
        }
    }
}

fn at<'v>(from: &'v [Value], to: &'v [Value], position: usize) -> (&'v Value, &'v Value) {
    (
        from.get(position).unwrap_or(&NULL),
        to.get(position).unwrap_or(&NULL),
    )
}

fn position_change(from: &[Value], to: &[Value], position: usize) -> ChangeType {
    if position >= from.len() {
        ChangeType::Create
    } else if position >= to.len() {
        ChangeType::Delete
    } else {
        ChangeType::Update
    }
}

/// Resolve a named `indexBy` field to a scalar field of both element shapes.
fn index_field(field: &str, from: &Shape, to: &Shape) -> DiffResult<IndexBy> {
    let unknown = || DiffError::UnknownIndexField {
        field: field.to_string(),
        shape: from.to_string(),
    };
    let (Some(from_ref), Some(to_ref)) = (from.as_struct(), to.as_struct()) else {
        return Err(unknown());
    };
    let from_position = scalar_field(from_ref, field).ok_or_else(unknown)?;
    let to_position = scalar_field(to_ref, field).ok_or_else(unknown)?;
    Ok(IndexBy::Field {
        from: from_position,
        to: to_position,
    })
}

fn scalar_field(target: &StructRef, field: &str) -> Option<usize> {
    let shape = target.resolve();
    let position = shape.position(field).or_else(|| {
        FieldMatcher::new(shape.fields().iter().enumerate().map(|(i, f)| (i, f.name()))).find(field)
    })?;
    shape
        .field(position)?
        .shape()
        .strip_optional()
        .as_scalar()
        .map(|_| position)
}
