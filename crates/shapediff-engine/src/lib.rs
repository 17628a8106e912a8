//! Structural diff engine for shapediff.
//!
//! Compiles a differ for a pair of shapes once, then compares any number of
//! value pairs with it, producing a [`ChangeLog`](shapediff_types::ChangeLog)
//! of creates, updates, deletes and compare-time errors keyed by path.
//!
//! # Key Types
//!
//! - [`Differ`] / [`DifferBuilder`] -- Compiled comparison between two shapes and its options
//! - [`DiffConfig`] -- Engine-wide defaults (tag name, nullification, strict mode, presence)
//! - [`Tag`] -- Per-field directives parsed from annotations
//! - [`Registry`] -- Shared cache of differs for dynamically typed values
//! - [`DiffError`] / [`AccessError`] -- Construction errors and compare-time read errors

mod accessor;
mod compare;
pub mod config;
mod decode;
pub mod differ;
pub mod error;
mod iface;
mod index;
mod map_diff;
mod matcher;
mod presence;
pub mod program;
pub mod registry;
mod slice_diff;
mod sort;
mod struct_diff;
pub mod tag;

#[cfg(test)]
mod scenarios;

pub use config::DiffConfig;
pub use differ::{Differ, DifferBuilder};
pub use error::{AccessError, AccessResult, DiffError, DiffResult};
pub use program::Compiled;
pub use registry::Registry;
pub use tag::Tag;
