//! The reflection capability: describing a Rust type as a [`Shape`] and
//! converting its instances to [`Value`]s.
//!
//! Structs opt in with [`reflect_struct!`](crate::reflect_struct), which also
//! records per-field annotations (tags) for the diff engine:
//!
//! ```
//! use shapediff_types::{reflect_struct, Reflect, Shape};
//!
//! struct Account {
//!     id: u64,
//!     owner: String,
//!     scratch: String,
//! }
//!
//! reflect_struct!(Account {
//!     id,
//!     owner [diff = "name=Owner"],
//!     scratch [diff = "-"],
//! });
//!
//! let shape = Account::shape();
//! let fields = shape.as_struct().unwrap().resolve();
//! assert_eq!(fields.field(1).unwrap().annotation("diff"), Some("name=Owner"));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::hash::BuildHasher;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::shape::{ScalarKind, Shape};
use crate::value::Value;

/// A type that can describe its shape and produce dynamic values.
pub trait Reflect {
    /// The declared shape of the type.
    fn shape() -> Shape
    where
        Self: Sized;

    /// The dynamic value of this instance.
    fn to_value(&self) -> Value;
}

/// The shape of a field, inferred from an accessor closure.
///
/// Used by `reflect_struct!` so field types need not be repeated.
pub fn shape_of<S, T, F>(_field: F) -> Shape
where
    T: Reflect,
    F: for<'a> Fn(&'a S) -> &'a T,
{
    T::shape()
}

macro_rules! reflect_signed {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl Reflect for $ty {
            fn shape() -> Shape {
                Shape::Scalar(ScalarKind::$kind)
            }

            fn to_value(&self) -> Value {
                Value::Int(i64::from(*self))
            }
        }
    )*};
}

macro_rules! reflect_unsigned {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl Reflect for $ty {
            fn shape() -> Shape {
                Shape::Scalar(ScalarKind::$kind)
            }

            fn to_value(&self) -> Value {
                Value::UInt(u64::from(*self))
            }
        }
    )*};
}

reflect_signed!(i8 => I8, i16 => I16, i32 => I32, i64 => I64);
reflect_unsigned!(u8 => U8, u16 => U16, u32 => U32, u64 => U64);

impl Reflect for isize {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::I64)
    }

    fn to_value(&self) -> Value {
        Value::Int(*self as i64)
    }
}

impl Reflect for usize {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::U64)
    }

    fn to_value(&self) -> Value {
        Value::UInt(*self as u64)
    }
}

impl Reflect for f32 {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::F32)
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl Reflect for f64 {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::F64)
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl Reflect for bool {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::Bool)
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl Reflect for String {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::String)
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl Reflect for DateTime<Utc> {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::Time)
    }

    fn to_value(&self) -> Value {
        Value::Time(*self)
    }
}

/// `Value` is the dynamic ("interface") type.
impl Reflect for Value {
    fn shape() -> Shape {
        Shape::Dynamic
    }

    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn shape() -> Shape {
        Shape::optional(T::shape())
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: Reflect> Reflect for Arc<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn shape() -> Shape {
        Shape::list(T::shape())
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Reflect::to_value).collect())
    }
}

impl<K: Reflect + Display, V: Reflect> Reflect for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::map(K::shape(), V::shape())
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_string(), v.to_value()))
                .collect(),
        )
    }
}

impl<K: Reflect + Display, V: Reflect, S: BuildHasher> Reflect for HashMap<K, V, S> {
    fn shape() -> Shape {
        Shape::map(K::shape(), V::shape())
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_string(), v.to_value()))
                .collect(),
        )
    }
}

/// Implement [`Reflect`] for a struct.
///
/// Every listed field must implement `Reflect`. Fields are described in the
/// order given, which is the order changes are reported in. Annotations
/// follow a field in brackets: `field [diff = "indexBy=id", audit = "-"]`.
#[macro_export]
macro_rules! reflect_struct {
    ($ty:ident { $( $field:ident $( [ $( $attr:ident = $tag:literal ),* $(,)? ] )? ),* $(,)? }) => {
        const _: () = {
            fn describe() -> ::std::sync::Arc<$crate::StructShape> {
                static SHAPE: ::std::sync::OnceLock<::std::sync::Arc<$crate::StructShape>> =
                    ::std::sync::OnceLock::new();
                ::std::sync::Arc::clone(SHAPE.get_or_init(|| {
                    ::std::sync::Arc::new($crate::StructShape::new(
                        ::std::any::type_name::<$ty>(),
                        ::std::vec![$(
                            $crate::FieldDef::new(
                                ::std::stringify!($field),
                                $crate::reflect::shape_of(|v: &$ty| &v.$field),
                            )
                            $($( .with_annotation(::std::stringify!($attr), $tag) )*)?
                        ),*],
                    ))
                }))
            }

            fn target() -> $crate::StructRef {
                $crate::StructRef::lazy(::std::any::type_name::<$ty>(), describe)
            }

            impl $crate::Reflect for $ty {
                fn shape() -> $crate::Shape {
                    $crate::Shape::Struct(target())
                }

                fn to_value(&self) -> $crate::Value {
                    $crate::Value::Record($crate::Record::new(
                        target(),
                        ::std::vec![$( $crate::Reflect::to_value(&self.$field) ),*],
                    ))
                }
            }
        };
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    struct Tree {
        label: String,
        weight: Option<f32>,
        children: Vec<Tree>,
        attrs: BTreeMap<String, Value>,
    }

    reflect_struct!(Tree {
        label [diff = "name=Label"],
        weight,
        children [diff = "indexBy=label", audit = "-"],
        attrs,
    });

    fn leaf(label: &str) -> Tree {
        Tree {
            label: label.into(),
            weight: None,
            children: Vec::new(),
            attrs: BTreeMap::new(),
        }
    }

    #[test]
    fn primitive_shapes() {
        assert_eq!(u16::shape(), Shape::Scalar(ScalarKind::U16));
        assert_eq!(Option::<i8>::shape().key().as_str(), "?i8");
        assert_eq!(Vec::<Box<String>>::shape().key().as_str(), "[]string");
        assert_eq!(
            HashMap::<String, Value>::shape().key().as_str(),
            "map[string]dyn"
        );
    }

    #[test]
    fn primitive_values() {
        assert_eq!(7u8.to_value(), Value::UInt(7));
        assert_eq!((-3i16).to_value(), Value::Int(-3));
        assert_eq!(2.5f32.to_value(), Value::Float(2.5));
        assert_eq!(Option::<bool>::None.to_value(), Value::Null);
        assert_eq!(Some(true).to_value(), Value::Bool(true));
    }

    #[test]
    fn struct_shape_lists_fields_with_annotations() {
        let shape = Tree::shape();
        let target = shape.as_struct().unwrap();
        assert!(target.name().ends_with("Tree"));
        let fields = target.resolve();
        let names: Vec<&str> = fields.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["label", "weight", "children", "attrs"]);
        assert_eq!(fields.field(0).unwrap().annotation("diff"), Some("name=Label"));
        assert_eq!(fields.field(2).unwrap().annotation("audit"), Some("-"));
        assert_eq!(fields.field(3).unwrap().annotation("diff"), None);
    }

    #[test]
    fn recursive_struct_refers_to_itself() {
        let fields = Tree::shape().as_struct().unwrap().resolve();
        let child = fields.field(2).unwrap().shape().as_list().unwrap();
        assert_eq!(child, &Tree::shape());
    }

    #[test]
    fn struct_values_are_records() {
        let mut tree = leaf("root");
        tree.weight = Some(1.0);
        tree.children.push(leaf("kid"));
        let value = tree.to_value();
        let record: &Record = value.as_record().unwrap();
        assert_eq!(record.len(), 4);
        assert_eq!(record.field("weight").unwrap(), &Value::Float(1.0));
        let kids = record.field("children").unwrap().as_list().unwrap();
        assert_eq!(kids[0].as_record().unwrap().get(0), Some(&Value::from("kid")));
    }
}
