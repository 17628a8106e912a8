//! Field-by-field comparison of two struct shapes.

use std::sync::Arc;

use shapediff_types::{ChangeType, FieldDef, Path, StructRef, StructShape, Value};

use crate::accessor::{Accessor, Normalize};
use crate::compare::ScalarCompare;
use crate::config::DiffConfig;
use crate::error::{AccessError, DiffError, DiffResult};
use crate::matcher::FieldMatcher;
use crate::presence::{Holder, PresenceProvider};
use crate::program::{Builder, Compiled, Cx, NodeId};
use crate::tag::Tag;

/// Compares matched fields of two struct shapes in "from" declaration order.
pub(crate) struct StructDiffer {
    fields: Vec<FieldDiffer>,
    presence: PresenceProvider,
}

/// One matched field pair.
struct FieldDiffer {
    /// Path segment reported for the field.
    name: String,
    from: Accessor,
    to: Accessor,
    /// Nested differ for composite and decoded fields.
    differ: Option<NodeId>,
    compare: ScalarCompare,
}

impl StructDiffer {
    pub(crate) fn build(builder: &mut Builder<'_>, from: &StructRef, to: &StructRef) -> DiffResult<Self> {
        let config = builder.config();
        let same = from == to;
        let from_shape = from.resolve();
        let to_shape = if same { Arc::clone(&from_shape) } else { to.resolve() };
        let from_tags = field_tags(&from_shape, config)?;
        let to_tags = if same {
            from_tags.clone()
        } else {
            field_tags(&to_shape, config)?
        };

        let presence = PresenceProvider {
            from: holder(&from_shape, &from_tags)?,
            to: holder(&to_shape, &to_tags)?,
        };
        let matcher = (!same).then(|| {
            FieldMatcher::new(
                to_shape
                    .fields()
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !to_tags[*i].presence)
                    .map(|(i, f)| (i, f.name())),
            )
        });

        let mut fields = Vec::with_capacity(from_shape.len());
        for (index, def) in from_shape.fields().iter().enumerate() {
            let tag = &from_tags[index];
            if tag.presence || tag.ignore {
                continue;
            }
            let to_index = match &matcher {
                None => index,
                Some(matcher) => match matcher.find(def.name()) {
                    Some(to_index) => to_index,
                    None => continue,
                },
            };
            let (Some(to_def), Some(to_tag)) = (to_shape.field(to_index), to_tags.get(to_index)) else {
                continue;
            };
            fields.push(FieldDiffer::build(
                builder,
                (index, def, tag),
                (to_index, to_def, to_tag),
            )?);
        }
        Ok(Self { fields, presence })
    }

    pub(crate) fn diff(
        &self,
        program: &Compiled,
        cx: &mut Cx<'_>,
        path: &Path,
        from: &Value,
        to: &Value,
        change: ChangeType,
    ) {
        for side in [from, to] {
            if !matches!(side, Value::Null | Value::Record(_)) {
                let error = AccessError::UnexpectedValue {
                    expected: "record",
                    found: side.kind(),
                };
                return cx.error(path.clone(), error);
            }
        }
        let check_presence = cx.config.presence && !self.presence.is_empty();

        for field in &self.fields {
            let from_value = match field.from.read(from) {
                Ok(value) => value,
                Err(e) => {
                    cx.error(path.field(field.name.as_str()), e);
                    continue;
                }
            };
            let to_value = match field.to.read(to) {
                Ok(value) => value,
                Err(e) => {
                    cx.error(path.field(field.name.as_str()), e);
                    continue;
                }
            };
            if check_presence
                && !self
                    .presence
                    .is_set(from, to, field.from.index(), field.to.index())
            {
                continue;
            }
            if from_value.is_null() && to_value.is_null() {
                continue;
            }

            let field_path = path.field(field.name.as_str());
            if let Some(node) = field.differ {
                let hint = ChangeType::between(&from_value, &to_value);
                program.run(node, cx, &field_path, &from_value, &to_value, hint);
                continue;
            }
            match change {
                ChangeType::Create => {
                    if !to_value.is_default() {
                        cx.log.add_create(field_path, to_value.into_owned());
                    }
                }
                ChangeType::Delete => {
                    if !from_value.is_default() {
                        cx.log.add_delete(field_path, from_value.into_owned());
                    }
                }
                ChangeType::Update => {
                    if !field.compare.matches(&from_value, &to_value) {
                        cx.log
                            .add_update(field_path, from_value.into_owned(), to_value.into_owned());
                    }
                }
            }
        }
    }
}

impl FieldDiffer {
    fn build(
        builder: &mut Builder<'_>,
        (from_index, from_def, tag): (usize, &FieldDef, &Tag),
        (to_index, to_def, to_tag): (usize, &FieldDef, &Tag),
    ) -> DiffResult<Self> {
        let name = tag
            .name
            .clone()
            .unwrap_or_else(|| from_def.name().to_string());
        let (from_shape, to_shape) = (from_def.shape(), to_def.shape());

        if from_shape.is_composite() || to_shape.is_composite() || tag.is_decodable() {
            return Ok(Self {
                name,
                from: Accessor::new(from_index),
                to: Accessor::new(to_index),
                differ: Some(builder.node(from_shape, to_shape, tag)?),
                compare: ScalarCompare::default(),
            });
        }

        let (Some(from_kind), Some(to_kind)) = (from_shape.as_scalar(), to_shape.as_scalar()) else {
            return Err(DiffError::incompatible(from_shape, to_shape));
        };
        let norm = Normalize::reconcile(from_kind, to_kind, builder.config().strict_mode)?;
        Ok(Self {
            name,
            from: Accessor::new(from_index)
                .with_norm(norm)
                .nullify(tag.nullifies(), Some(from_kind)),
            to: Accessor::new(to_index)
                .with_norm(norm)
                .nullify(to_tag.nullifies(), Some(to_kind)),
            differ: None,
            compare: ScalarCompare::from_tag(tag),
        })
    }
}

fn field_tags(shape: &StructShape, config: &DiffConfig) -> DiffResult<Vec<Tag>> {
    shape
        .fields()
        .iter()
        .map(|def| {
            Tag::parse(def.annotation(&config.tag_name).unwrap_or(""))
                .map(|tag| tag.init(config))
        })
        .collect()
}

fn holder(shape: &StructShape, tags: &[Tag]) -> DiffResult<Option<Holder>> {
    let Some(index) = tags.iter().position(|t| t.presence) else {
        return Ok(None);
    };
    let def = &shape.fields()[index];
    Holder::new(index, def, shape).map(Some)
}
