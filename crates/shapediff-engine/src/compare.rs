//! Scalar equality and the scalar differ.

use std::cmp::Ordering;
use std::fmt::Write;

use chrono::{DateTime, Utc};
use shapediff_types::{ChangeType, Path, ScalarKind, Value};

use crate::accessor::{normalize, Normalize};
use crate::error::DiffResult;
use crate::program::Cx;
use crate::tag::Tag;

/// Compares two scalars, reconciling differing kinds first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ScalarDiffer {
    norm: Option<Normalize>,
    compare: ScalarCompare,
}

impl ScalarDiffer {
    pub(crate) fn build(from: ScalarKind, to: ScalarKind, tag: &Tag, strict: bool) -> DiffResult<Self> {
        Ok(Self {
            norm: Normalize::reconcile(from, to, strict)?,
            compare: ScalarCompare::from_tag(tag),
        })
    }

    pub(crate) fn diff(
        &self,
        cx: &mut Cx<'_>,
        path: &Path,
        from: &Value,
        to: &Value,
        change: ChangeType,
    ) {
        let (from, to) = match (normalize(self.norm, from), normalize(self.norm, to)) {
            (Ok(from), Ok(to)) => (from, to),
            (Err(e), _) | (_, Err(e)) => return cx.error(path.clone(), e),
        };
        if self.compare.matches(&from, &to) {
            return;
        }
        match change {
            ChangeType::Delete if to.is_null() => cx.log.add_delete(path.clone(), from.into_owned()),
            ChangeType::Create if from.is_null() => cx.log.add_create(path.clone(), to.into_owned()),
            _ => cx
                .log
                .add_update(path.clone(), from.into_owned(), to.into_owned()),
        }
    }
}

/// Equality rules for two scalar values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ScalarCompare {
    /// Decimal places floats are rounded to before comparing.
    precision: Option<u32>,
    /// Times compare equal when they render identically with this format.
    time_layout: Option<String>,
}

impl ScalarCompare {
    pub(crate) fn from_tag(tag: &Tag) -> Self {
        Self {
            precision: tag.precision,
            time_layout: tag.time_layout.clone(),
        }
    }

    pub(crate) fn matches(&self, from: &Value, to: &Value) -> bool {
        match (from, to) {
            (Value::Float(a), Value::Float(b)) => self.floats_match(*a, *b),
            (Value::Time(a), Value::Time(b)) => self.times_match(a, b),
            (Value::Float(a), other) | (other, Value::Float(a)) => match as_f64(other) {
                Some(b) => self.floats_match(*a, b),
                None => false,
            },
            _ => match (as_i128(from), as_i128(to)) {
                (Some(a), Some(b)) => a == b,
                _ => from == to,
            },
        }
    }

    fn floats_match(&self, a: f64, b: f64) -> bool {
        match self.precision {
            Some(places) => round(a, places) == round(b, places),
            None => a == b,
        }
    }

    fn times_match(&self, a: &DateTime<Utc>, b: &DateTime<Utc>) -> bool {
        let Some(layout) = &self.time_layout else {
            return a == b;
        };
        match (render_time(a, layout), render_time(b, layout)) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        }
    }
}

/// `value` rounded to `places` decimals. Precision beyond what an `f64`
/// carries, or a scaled value that overflows, leaves `value` unchanged.
fn round(value: f64, places: u32) -> f64 {
    if places > f64::DIGITS + 1 {
        return value;
    }
    let factor = 10f64.powi(places as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

fn render_time(time: &DateTime<Utc>, layout: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", time.format(layout)).ok()?;
    Some(out)
}

pub(crate) fn as_i128(value: &Value) -> Option<i128> {
    match value {
        Value::Int(i) => Some(i128::from(*i)),
        Value::UInt(u) => Some(i128::from(*u)),
        _ => None,
    }
}

pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::UInt(u) => Some(*u as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

/// Total order over scalar values of compatible kinds. Nulls sort first.
pub(crate) fn order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Time(a), Value::Time(b)) => a.cmp(b),
        _ => match (as_i128(a), as_i128(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => match (as_f64(a), as_f64(b)) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => a.kind().cmp(b.kind()),
            },
        },
    }
}
