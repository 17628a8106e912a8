//! Shared cache of compiled differs, keyed by configuration and shape pair.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use shapediff_types::{Shape, ShapeKey};
use tracing::{debug, trace};

use crate::config::DiffConfig;
use crate::error::DiffResult;
use crate::program::{Builder, Compiled};
use crate::tag::Tag;

type ShapePair = (ShapeKey, ShapeKey);

/// Compiled differs for shape pairs met while comparing dynamic values.
///
/// Entries are grouped by the `DiffConfig` they were compiled under, so
/// differs with different configurations can share one registry. Lookups
/// take a read lock; a miss compiles outside the lock and inserts under a
/// write lock. Two threads missing on the same pair both compile and the
/// last insert wins.
pub struct Registry {
    differs: RwLock<HashMap<DiffConfig, HashMap<ShapePair, Arc<Compiled>>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            differs: RwLock::new(HashMap::new()),
        }
    }

    /// The differ for `from` → `to`.
    ///
    /// Tags that change how values compare (decoding, sorting, indexing,
    /// precision, time layout, whitespace) always get a fresh differ. Every
    /// other pair is cached under `config`, compiled with its default tag.
    pub fn get(&self, from: &Shape, to: &Shape, tag: &Tag, config: &DiffConfig) -> DiffResult<Arc<Compiled>> {
        let baseline = Tag::default().init(config);
        if tag.compares_unlike(&baseline) {
            return Builder::compile(Some(from), Some(to), tag, config).map(Arc::new);
        }

        let key = (from.key(), to.key());
        let cached = self
            .differs
            .read()
            .expect("lock poisoned")
            .get(config)
            .and_then(|pairs| pairs.get(&key))
            .cloned();
        if let Some(compiled) = cached {
            trace!(from = %key.0, to = %key.1, "registry hit");
            return Ok(compiled);
        }

        debug!(from = %key.0, to = %key.1, "registry miss, compiling");
        let compiled = Arc::new(Builder::compile(Some(from), Some(to), &baseline, config)?);
        self.differs
            .write()
            .expect("lock poisoned")
            .entry(config.clone())
            .or_default()
            .insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Number of cached differs.
    pub fn len(&self) -> usize {
        self.differs
            .read()
            .expect("lock poisoned")
            .values()
            .map(HashMap::len)
            .sum()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.differs
            .read()
            .expect("lock poisoned")
            .values()
            .all(HashMap::is_empty)
    }

    /// Drop every cached differ.
    pub fn clear(&self) {
        self.differs.write().expect("lock poisoned").clear();
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("differs", &self.len()).finish()
    }
}
