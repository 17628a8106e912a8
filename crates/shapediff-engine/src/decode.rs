//! Delimited strings compared as the lists or maps they encode.
//!
//! `itemSeparator=,` turns `"a, b, c"` into `["a", "b", "c"]`;
//! `pairDelimiter=AND|OR,pairSeparator=:` turns `"k1:v1 AND k2:v2"` into
//! `{k1: v1, k2: v2}`. The decoded value is handed to an ordinary slice or
//! map differ.

use std::collections::BTreeMap;

use shapediff_types::{ChangeType, Path, ScalarKind, Shape, Value};

use crate::error::{AccessError, AccessResult, DiffResult};
use crate::program::{Builder, Compiled, Cx, NodeId};
use crate::tag::Tag;

/// Splits text on any of a set of alternative delimiters.
///
/// Delimiters match case-insensitively. A delimiter that begins or ends with
/// a word character only matches at a word boundary, so `AND` never splits
/// `BRAND`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Splitter {
    delimiters: Vec<String>,
}

impl Splitter {
    /// Alternatives are separated by `|`.
    pub(crate) fn new(alternatives: &str) -> Self {
        let mut delimiters: Vec<String> = alternatives
            .split('|')
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect();
        delimiters.sort_by(|a, b| b.len().cmp(&a.len()));
        Self { delimiters }
    }

    /// Trimmed, non-empty parts of `text`.
    pub(crate) fn split<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut parts = Vec::new();
        let mut start = 0;
        let mut at = 0;
        while at < text.len() {
            match self.match_at(text, at) {
                Some(len) => {
                    parts.push(&text[start..at]);
                    at += len;
                    start = at;
                }
                None => {
                    at += text[at..].chars().next().map_or(1, char::len_utf8);
                }
            }
        }
        parts.push(&text[start..]);
        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    fn match_at(&self, text: &str, at: usize) -> Option<usize> {
        self.delimiters.iter().find_map(|delimiter| {
            let candidate = text.get(at..at + delimiter.len())?;
            if !candidate.eq_ignore_ascii_case(delimiter) {
                return None;
            }
            let starts_word = delimiter.chars().next().is_some_and(is_word);
            let ends_word = delimiter.chars().last().is_some_and(is_word);
            if starts_word && text[..at].chars().next_back().is_some_and(is_word) {
                return None;
            }
            if ends_word && text[at + delimiter.len()..].chars().next().is_some_and(is_word) {
                return None;
            }
            Some(delimiter.len())
        })
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[derive(Clone, Debug)]
enum Decoder {
    List {
        items: Splitter,
    },
    Pairs {
        entries: Splitter,
        separator: String,
    },
}

/// Decodes both sides, then compares the decoded values.
pub(crate) struct DecodingDiffer {
    decoder: Decoder,
    tag: Tag,
    inner: NodeId,
}

impl DecodingDiffer {
    pub(crate) fn build(builder: &mut Builder<'_>, tag: &Tag) -> DiffResult<Self> {
        if let Some(delimiter) = &tag.pair_delimiter {
            let decoded = Shape::map(Shape::Scalar(ScalarKind::String), Shape::Dynamic);
            let inner = builder.node(&decoded, &decoded, &tag.without_pairs())?;
            return Ok(Self {
                decoder: Decoder::Pairs {
                    entries: Splitter::new(delimiter),
                    separator: tag.pair_separator.clone().unwrap_or_else(|| "=".to_string()),
                },
                tag: tag.clone(),
                inner,
            });
        }
        let separator = tag.item_separator.as_deref().unwrap_or(",");
        let decoded = Shape::list(Shape::Scalar(ScalarKind::String));
        let inner = builder.node(&decoded, &decoded, tag)?;
        Ok(Self {
            decoder: Decoder::List {
                items: Splitter::new(separator),
            },
            tag: tag.clone(),
            inner,
        })
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
        let decoded = self.decode(from).and_then(|from| Ok((from, self.decode(to)?)));
        match decoded {
            Ok((from, to)) => program.run(self.inner, cx, path, &from, &to, change),
            Err(e) => cx.error(path.clone(), e),
        }
    }

    fn decode(&self, value: &Value) -> AccessResult<Value> {
        let text = match value {
            Value::Null => return Ok(Value::Null),
            Value::String(text) => text,
            other => return Err(AccessError::NotAString { found: other.kind() }),
        };
        let decoded = match &self.decoder {
            Decoder::List { items } => Value::List(
                items
                    .split(text)
                    .into_iter()
                    .map(|item| self.tag.remove_whitespace(item))
                    .filter(|item| !item.is_empty())
                    .map(Value::String)
                    .collect(),
            ),
            Decoder::Pairs { entries, separator } => Value::Map(
                entries
                    .split(text)
                    .into_iter()
                    .filter_map(|entry| entry.split_once(separator.as_str()))
                    .map(|(key, value)| {
                        (
                            self.tag.remove_whitespace(key),
                            Value::String(self.tag.remove_whitespace(value)),
                        )
                    })
                    .collect::<BTreeMap<_, _>>(),
            ),
        };
        Ok(decoded)
    }
}
