//! The public differ and its builder.

use std::fmt;
use std::sync::Arc;

use shapediff_types::{ChangeLog, ChangeType, Path, Reflect, Shape, Value};
use tracing::debug;

use crate::config::DiffConfig;
use crate::error::DiffResult;
use crate::program::{Builder, Compiled, Cx};
use crate::registry::Registry;
use crate::tag::Tag;

/// A compiled, reusable comparison between two shapes.
///
/// Cloning is cheap and clones share the compiled differ, configuration and
/// registry. A `Differ` can be used from many threads at once.
#[derive(Clone)]
pub struct Differ {
    compiled: Arc<Compiled>,
    registry: Arc<Registry>,
    config: Arc<DiffConfig>,
}

impl Differ {
    /// Compile a differ with the default configuration. A missing shape is
    /// taken to be the same as the other side's.
    pub fn new(from: Option<&Shape>, to: Option<&Shape>) -> DiffResult<Self> {
        Self::builder().build(from, to)
    }

    /// Compile a differ for two reflected types.
    pub fn for_types<F: Reflect, T: Reflect>() -> DiffResult<Self> {
        Self::builder().build_for::<F, T>()
    }

    pub fn builder() -> DifferBuilder {
        DifferBuilder::default()
    }

    /// Compare two reflected values. `None` stands for an absent value.
    pub fn diff<F: Reflect, T: Reflect>(&self, from: Option<&F>, to: Option<&T>) -> ChangeLog {
        let from = from.map_or(Value::Null, F::to_value);
        let to = to.map_or(Value::Null, T::to_value);
        self.diff_values(&from, &to)
    }

    /// Compare two dynamic values.
    ///
    /// Never fails: values that cannot be read are reported as error changes
    /// at the path where they occur.
    pub fn diff_values(&self, from: &Value, to: &Value) -> ChangeLog {
        let mut log = ChangeLog::new();
        if from.is_null() && to.is_null() {
            return log;
        }
        let mut cx = Cx {
            registry: &self.registry,
            config: &self.config,
            log: &mut log,
        };
        self.compiled
            .diff(&mut cx, &Path::root(), from, to, ChangeType::between(from, to));
        debug!(
            changes = log.len(),
            errors = log.errors(),
            "diff complete"
        );
        log
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// The registry used for dynamic values.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl fmt::Debug for Differ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Differ")
            .field("compiled", &self.compiled)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

/// Options for constructing a [`Differ`].
#[derive(Debug, Default)]
pub struct DifferBuilder {
    config: DiffConfig,
    tag: Option<Tag>,
    registry: Option<Arc<Registry>>,
}

impl DifferBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: DiffConfig) -> Self {
        self.config = config;
        self
    }

    /// Annotation key that field tags are read from.
    pub fn tag_name(mut self, name: impl Into<String>) -> Self {
        self.config.tag_name = name.into();
        self
    }

    /// Directives applied to the root comparison.
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn nullify_empty(mut self, enabled: bool) -> Self {
        self.config.nullify_empty = Some(enabled);
        self
    }

    /// Share a registry with other differs.
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn presence(mut self, enabled: bool) -> Self {
        self.config.presence = enabled;
        self
    }

    pub fn strict_mode(mut self, enabled: bool) -> Self {
        self.config.strict_mode = enabled;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    pub fn build(self, from: Option<&Shape>, to: Option<&Shape>) -> DiffResult<Differ> {
        let tag = self.tag.unwrap_or_default().init(&self.config);
        let compiled = Builder::compile(from, to, &tag, &self.config)?;
        Ok(Differ {
            compiled: Arc::new(compiled),
            registry: self.registry.unwrap_or_default(),
            config: Arc::new(self.config),
        })
    }

    pub fn build_for<F: Reflect, T: Reflect>(self) -> DiffResult<Differ> {
        let (from, to) = (F::shape(), T::shape());
        self.build(Some(&from), Some(&to))
    }
}
