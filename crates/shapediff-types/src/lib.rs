//! Foundation types for shapediff.
//!
//! This crate describes the data that gets compared (shapes and dynamic
//! values) and the result of a comparison (paths and change logs). The
//! comparison itself lives in `shapediff-engine`.
//!
//! # Key Types
//!
//! - [`Shape`] -- Structural type of a value: scalar, struct, list, map, dynamic, optional
//! - [`StructShape`] / [`FieldDef`] / [`StructRef`] -- Struct field lists with per-field annotations
//! - [`Value`] / [`Record`] -- Dynamic value trees
//! - [`Reflect`] -- Describes a Rust type as a shape and converts instances to values
//! - [`Path`] -- Location of a change (`outer.inner`, `items[3]`, `labels[env]`)
//! - [`Change`] / [`ChangeLog`] / [`ChangeRecord`] -- Typed changes and their exportable form

pub mod change;
pub mod error;
pub mod log;
pub mod path;
pub mod reflect;
pub mod shape;
pub mod value;

pub use change::{Change, ChangeRecord, ChangeType};
pub use error::{TypeError, TypeResult};
pub use log::ChangeLog;
pub use path::{Path, Segment};
pub use reflect::Reflect;
pub use shape::{FieldDef, ScalarKind, Shape, ShapeKey, StructRef, StructShape, StructShapeBuilder};
pub use value::{Record, Value};
