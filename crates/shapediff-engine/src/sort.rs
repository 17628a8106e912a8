//! Ordering of slice elements before comparison.

use std::borrow::Cow;

use shapediff_types::Value;

use crate::compare::order;

/// Scalar elements in ascending order, leaving the input untouched.
///
/// The sort is stable; already-sorted input is borrowed rather than copied.
pub(crate) fn sorted(items: &[Value]) -> Cow<'_, [Value]> {
    if items.windows(2).all(|w| order(&w[0], &w[1]).is_le()) {
        return Cow::Borrowed(items);
    }
    let mut clone = items.to_vec();
    clone.sort_by(order);
    Cow::Owned(clone)
}
