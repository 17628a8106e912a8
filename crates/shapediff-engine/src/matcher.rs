//! Field-name matching between two struct shapes.

use std::collections::HashMap;

/// Finds the "to" field matching a "from" field name.
///
/// Names match exactly first, then case-insensitively, then ignoring
/// underscores as well, so `scratch_pad`, `ScratchPad` and `scratchpad`
/// all find each other. Exact names take precedence over folded ones; among
/// equal keys the first declared field wins.
#[derive(Debug, Default)]
pub(crate) struct FieldMatcher {
    index: HashMap<String, usize>,
}

impl FieldMatcher {
    pub(crate) fn new<'a>(fields: impl IntoIterator<Item = (usize, &'a str)>) -> Self {
        let fields: Vec<(usize, &str)> = fields.into_iter().collect();
        let mut index = HashMap::with_capacity(3 * fields.len());
        let folds: [fn(&str) -> String; 3] = [str::to_string, str::to_lowercase, loose_key];
        for fold in folds {
            for &(position, name) in &fields {
                index.entry(fold(name)).or_insert(position);
            }
        }
        Self { index }
    }

    pub(crate) fn find(&self, name: &str) -> Option<usize> {
        self.index
            .get(name)
            .or_else(|| self.index.get(&name.to_lowercase()))
            .or_else(|| self.index.get(&loose_key(name)))
            .copied()
    }
}

fn loose_key(name: &str) -> String {
    name.to_lowercase().replace('_', "")
}
