use serde::{Deserialize, Serialize};

/// Process-wide defaults for differ construction.
///
/// Per-field tags override `nullify_empty` and `time_layout`; the rest apply
/// to every differ built with this configuration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Annotation key scanned for field tags.
    pub tag_name: String,
    /// Treat zero values as absent unless a tag says otherwise.
    pub nullify_empty: Option<bool>,
    /// Default `chrono` format used to compare time values.
    pub time_layout: Option<String>,
    /// Reject scalar pairs of different non-numeric kinds instead of
    /// comparing their rendered text.
    pub strict_mode: bool,
    /// Skip fields a presence holder marks as unset.
    pub presence: bool,
    /// Maximum nesting of distinct struct shapes in one differ.
    pub max_depth: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            tag_name: "diff".to_string(),
            nullify_empty: None,
            time_layout: None,
            strict_mode: false,
            presence: false,
            max_depth: 64,
        }
    }
}

impl DiffConfig {
    /// Only identical or numeric scalar kinds may be compared.
    pub fn strict() -> Self {
        Self {
            strict_mode: true,
            ..Default::default()
        }
    }

    /// Compare only the fields producers marked as set.
    pub fn with_presence() -> Self {
        Self {
            presence: true,
            ..Default::default()
        }
    }
}
