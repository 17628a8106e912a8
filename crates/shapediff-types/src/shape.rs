//! Shape descriptors: the structural type of a value.
//!
//! A [`Shape`] is a closed description of what a value can look like. The
//! diff engine selects a comparison strategy from a pair of shapes once, at
//! construction time, and never re-inspects types per comparison.
//!
//! Struct shapes are referenced through [`StructRef`], which resolves the
//! field list lazily. This lets self-referential and mutually recursive types
//! describe themselves without building an infinite descriptor.

use std::fmt;
use std::sync::Arc;

/// Scalar value kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    Time,
}

impl ScalarKind {
    /// Short lowercase name used in shape keys and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "string",
            Self::Time => "time",
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    pub fn is_integer(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Kinds whose slices can be sorted before comparison.
    pub fn is_sortable(&self) -> bool {
        self.is_numeric() || matches!(self, Self::String)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of a shape, used to key differ caches and construction memos.
///
/// Two shapes with the same key are interchangeable for diffing purposes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeKey(String);

impl ShapeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The structural type of a value.
#[derive(Clone, Debug)]
pub enum Shape {
    /// A leaf value compared by equality.
    Scalar(ScalarKind),
    /// A record with named, ordered fields.
    Struct(StructRef),
    /// An ordered sequence of elements of one shape.
    List(Box<Shape>),
    /// A keyed collection.
    Map { key: Box<Shape>, value: Box<Shape> },
    /// A value whose concrete shape is only known at compare time.
    Dynamic,
    /// A nil-able wrapper around another shape.
    Optional(Box<Shape>),
}

impl Shape {
    pub fn list(element: Shape) -> Self {
        Self::List(Box::new(element))
    }

    pub fn map(key: Shape, value: Shape) -> Self {
        Self::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn optional(inner: Shape) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// The identity key of this shape.
    pub fn key(&self) -> ShapeKey {
        let mut out = String::new();
        self.write_key(&mut out);
        ShapeKey(out)
    }

    fn write_key(&self, out: &mut String) {
        match self {
            Self::Scalar(kind) => out.push_str(kind.name()),
            Self::Struct(target) => {
                out.push_str("struct ");
                out.push_str(target.name());
            }
            Self::List(element) => {
                out.push_str("[]");
                element.write_key(out);
            }
            Self::Map { key, value } => {
                out.push_str("map[");
                key.write_key(out);
                out.push(']');
                value.write_key(out);
            }
            Self::Dynamic => out.push_str("dyn"),
            Self::Optional(inner) => {
                out.push('?');
                inner.write_key(out);
            }
        }
    }

    /// The shape with all optional wrappers removed.
    pub fn strip_optional(&self) -> &Shape {
        let mut shape = self;
        while let Self::Optional(inner) = shape {
            shape = inner;
        }
        shape
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    pub fn as_scalar(&self) -> Option<ScalarKind> {
        match self.strip_optional() {
            Self::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructRef> {
        match self.strip_optional() {
            Self::Struct(target) => Some(target),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Shape> {
        match self.strip_optional() {
            Self::List(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<(&Shape, &Shape)> {
        match self.strip_optional() {
            Self::Map { key, value } => Some((key, value)),
            _ => None,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.strip_optional(), Self::Dynamic)
    }

    /// Returns `true` for shapes that need a nested differ.
    pub fn is_composite(&self) -> bool {
        !matches!(self.strip_optional(), Self::Scalar(_))
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Shape {}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key().as_str())
    }
}

#[derive(Clone)]
enum StructSource {
    Lazy(fn() -> Arc<StructShape>),
    Ready(Arc<StructShape>),
}

/// A handle to a struct shape, resolved on demand.
///
/// The name must uniquely identify the struct type; it is the shape's
/// identity. Types described through `reflect_struct!` use
/// `std::any::type_name`.
#[derive(Clone)]
pub struct StructRef {
    name: Arc<str>,
    source: StructSource,
}

impl StructRef {
    /// A reference that calls `describe` when the field list is first needed.
    pub fn lazy(name: &str, describe: fn() -> Arc<StructShape>) -> Self {
        Self {
            name: Arc::from(name),
            source: StructSource::Lazy(describe),
        }
    }

    /// A reference to an already-built shape.
    pub fn ready(shape: Arc<StructShape>) -> Self {
        Self {
            name: Arc::from(shape.name()),
            source: StructSource::Ready(shape),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The last path segment of the name (`my_crate::model::User` → `User`).
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    pub fn resolve(&self) -> Arc<StructShape> {
        match &self.source {
            StructSource::Lazy(describe) => describe(),
            StructSource::Ready(shape) => Arc::clone(shape),
        }
    }

    pub fn key(&self) -> ShapeKey {
        ShapeKey(format!("struct {}", self.name))
    }
}

impl PartialEq for StructRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for StructRef {}

impl fmt::Debug for StructRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StructRef({})", self.name)
    }
}

/// The field list of a struct.
#[derive(Clone, Debug)]
pub struct StructShape {
    name: String,
    fields: Vec<FieldDef>,
}

impl StructShape {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Start building a struct shape at run time.
    pub fn builder(name: impl Into<String>) -> StructShapeBuilder {
        StructShapeBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&FieldDef> {
        self.fields.get(index)
    }

    /// Position of the field with exactly this declared name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A declared field: name, shape, and annotations.
///
/// Annotations map an attribute name (the diff engine scans `diff` by
/// default) to a tag string.
#[derive(Clone, Debug)]
pub struct FieldDef {
    name: String,
    shape: Shape,
    annotations: Vec<(String, String)>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            annotations: Vec::new(),
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.push((key.into(), value.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The tag string recorded under `key`, if any.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Builder for struct shapes known only at run time.
///
/// The name is the shape's identity: differ memos and registries treat two
/// shapes with the same name as the same shape, so each distinct field list
/// needs its own name.
pub struct StructShapeBuilder {
    name: String,
    fields: Vec<FieldDef>,
}

impl StructShapeBuilder {
    pub fn field(mut self, name: impl Into<String>, shape: Shape) -> Self {
        self.fields.push(FieldDef::new(name, shape));
        self
    }

    /// Add a field carrying one annotation.
    pub fn tagged(
        mut self,
        name: impl Into<String>,
        shape: Shape,
        key: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        self.fields
            .push(FieldDef::new(name, shape).with_annotation(key, tag));
        self
    }

    pub fn build(self) -> Arc<StructShape> {
        Arc::new(StructShape::new(self.name, self.fields))
    }

    pub fn into_ref(self) -> StructRef {
        StructRef::ready(self.build())
    }
}

fn short_name(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}
