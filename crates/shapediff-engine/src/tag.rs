//! Per-field diff directives.
//!
//! A tag is a comma-separated list of `key=value` pairs read from a field
//! annotation (the `diff` annotation by default):
//!
//! ```text
//! name=Owner                      report the field under another name
//! -            ignore=true        never compare the field
//! presence=true                   the field holds per-field "is set" flags
//! sort=true                       sort scalar slices before comparing
//! indexBy=id   indexBy=.          match slice elements by key
//! itemSeparator=,                 decode a string into a list
//! pairDelimiter=AND|OR            decode a string into key/value pairs
//! pairSeparator=:                 separator inside a pair (default `=`)
//! whitespace=[|]                  literals removed from decoded parts
//! precision=2                     compare floats rounded to 2 decimals
//! timeLayout=%Y-%m-%d             compare times at this resolution
//! nullifyEmpty=true               treat zero values as absent
//! ```
//!
//! Keys are case-insensitive. A single bare token is a rename, and `$coma`
//! inside a value stands for a literal comma.

use chrono::format::{Item, StrftimeItems};
use serde::Serialize;

use crate::config::DiffConfig;
use crate::error::{DiffError, DiffResult};

/// Parsed field directives.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub ignore: bool,
    pub presence: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_layout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pair_separator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pair_delimiter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_separator: Option<String>,
    pub sort: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullify_empty: Option<bool>,
}

impl Tag {
    /// Parse a tag string. The empty string yields the default tag.
    pub fn parse(tag: &str) -> DiffResult<Self> {
        let mut parsed = Tag::default();
        let trimmed = tag.trim();
        if trimmed == "-" {
            parsed.ignore = true;
            return Ok(parsed);
        }

        for element in trimmed.split(',') {
            let element = element.replace("$coma", ",");
            let element = element.trim();
            if element.is_empty() {
                continue;
            }
            let Some((key, value)) = element.split_once('=') else {
                if element.eq_ignore_ascii_case("ignore") {
                    parsed.ignore = true;
                } else {
                    parsed.name = Some(element.to_string());
                }
                continue;
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "presence" => parsed.presence = parse_bool(tag, key, value)?,
                "ignore" => parsed.ignore = parse_bool(tag, key, value)?,
                "sort" => parsed.sort = parse_bool(tag, key, value)?,
                "nullifyempty" => parsed.nullify_empty = Some(parse_bool(tag, key, value)?),
                "name" => parsed.name = Some(non_empty(tag, key, value)?),
                "indexby" => parsed.index_by = Some(non_empty(tag, key, value)?),
                "whitespace" => parsed.whitespace = Some(non_empty(tag, key, value)?),
                "pairseparator" => parsed.pair_separator = Some(non_empty(tag, key, value)?),
                "pairdelimiter" => parsed.pair_delimiter = Some(non_empty(tag, key, value)?),
                "itemseparator" => parsed.item_separator = Some(non_empty(tag, key, value)?),
                "precision" => {
                    let precision = value.parse::<u32>().map_err(|e| {
                        DiffError::invalid_tag(tag, format!("invalid precision {value:?}: {e}"))
                    })?;
                    parsed.precision = Some(precision);
                }
                "timelayout" => {
                    let layout = non_empty(tag, key, value)?;
                    validate_layout(tag, &layout)?;
                    parsed.time_layout = Some(layout);
                }
                other => {
                    return Err(DiffError::invalid_tag(tag, format!("unknown key {other:?}")));
                }
            }
        }
        Ok(parsed)
    }

    /// Returns `true` if the tag turns a string into a list or a map.
    pub fn is_decodable(&self) -> bool {
        self.pair_delimiter.is_some() || self.item_separator.is_some()
    }

    /// Returns `true` if a differ built with this tag compares values
    /// differently from one built with `baseline`.
    ///
    /// Naming, ignoring, presence and nullification are applied by the
    /// enclosing struct, so they do not count.
    pub fn compares_unlike(&self, baseline: &Tag) -> bool {
        self.is_decodable()
            || self.sort != baseline.sort
            || self.index_by != baseline.index_by
            || self.precision != baseline.precision
            || self.time_layout != baseline.time_layout
            || self.whitespace != baseline.whitespace
    }

    /// Fill omitted values from the configuration.
    pub fn init(mut self, config: &DiffConfig) -> Self {
        if self.nullify_empty.is_none() {
            self.nullify_empty = config.nullify_empty;
        }
        if self.time_layout.is_none() {
            self.time_layout = config.time_layout.clone();
        }
        if self.pair_delimiter.is_some() && self.pair_separator.is_none() {
            self.pair_separator = Some("=".to_string());
        }
        self
    }

    /// Whether zero values are treated as absent.
    pub fn nullifies(&self) -> bool {
        self.nullify_empty == Some(true)
    }

    /// The tag used for the values of a decoded pair map: the same
    /// directives minus the pair decoding itself.
    pub fn without_pairs(&self) -> Self {
        Self {
            pair_delimiter: None,
            pair_separator: None,
            ..self.clone()
        }
    }

    /// Trim a decoded part and strip every configured whitespace literal.
    pub fn remove_whitespace(&self, value: &str) -> String {
        let mut value = value.trim().to_string();
        if let Some(whitespace) = &self.whitespace {
            for literal in whitespace.split('|').filter(|l| !l.is_empty()) {
                value = value.replace(literal, "");
            }
        }
        value
    }
}

fn parse_bool(tag: &str, key: &str, value: &str) -> DiffResult<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(DiffError::invalid_tag(
            tag,
            format!("{} expects a boolean, got {value:?}", key.trim()),
        )),
    }
}

fn non_empty(tag: &str, key: &str, value: &str) -> DiffResult<String> {
    if value.is_empty() {
        return Err(DiffError::invalid_tag(
            tag,
            format!("{} requires a value", key.trim()),
        ));
    }
    Ok(value.to_string())
}

fn validate_layout(tag: &str, layout: &str) -> DiffResult<()> {
    if StrftimeItems::new(layout).any(|item| matches!(item, Item::Error)) {
        return Err(DiffError::invalid_tag(
            tag,
            format!("invalid time layout {layout:?}"),
        ));
    }
    Ok(())
}
