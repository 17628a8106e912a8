//! Compiled differs.
//!
//! Construction turns a pair of shapes into a [`Compiled`] differ: an arena
//! of nodes, each one strategy (struct, slice, map, interface, decoding, or
//! scalar), referring to its children by [`NodeId`]. Struct nodes are
//! memoized by shape pair while building, so a self-referential struct points
//! back at the node under construction instead of expanding forever.

use std::collections::HashMap;
use std::fmt;

use shapediff_types::{ChangeLog, ChangeType, Path, ScalarKind, Shape, ShapeKey, StructRef, Value};
use tracing::debug;

use crate::compare::ScalarDiffer;
use crate::config::DiffConfig;
use crate::decode::DecodingDiffer;
use crate::error::{DiffError, DiffResult};
use crate::iface::IfaceDiffer;
use crate::map_diff::MapDiffer;
use crate::registry::Registry;
use crate::slice_diff::SliceDiffer;
use crate::struct_diff::StructDiffer;
use crate::tag::Tag;

/// Position of a node in its [`Compiled`] arena.
pub(crate) type NodeId = usize;

pub(crate) enum Node {
    /// Placeholder for a struct node whose fields are still being built.
    Pending,
    Struct(StructDiffer),
    Slice(SliceDiffer),
    Map(MapDiffer),
    Interface(IfaceDiffer),
    Decoding(DecodingDiffer),
    Scalar(ScalarDiffer),
}

/// Shared state of one comparison.
pub(crate) struct Cx<'a> {
    pub(crate) registry: &'a Registry,
    pub(crate) config: &'a DiffConfig,
    pub(crate) log: &'a mut ChangeLog,
}

impl Cx<'_> {
    /// Record a compare-time failure and carry on.
    pub(crate) fn error(&mut self, path: Path, error: impl fmt::Display) {
        debug!(path = %path, error = %error, "recording compare error");
        self.log.add_error(path, error);
    }
}

/// An immutable differ for one pair of shapes.
pub struct Compiled {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Compiled {
    /// Number of strategy nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn diff(
        &self,
        cx: &mut Cx<'_>,
        path: &Path,
        from: &Value,
        to: &Value,
        change: ChangeType,
    ) {
        self.run(self.root, cx, path, from, to, change);
    }

    pub(crate) fn run(
        &self,
        id: NodeId,
        cx: &mut Cx<'_>,
        path: &Path,
        from: &Value,
        to: &Value,
        change: ChangeType,
    ) {
        match &self.nodes[id] {
            Node::Struct(differ) => differ.diff(self, cx, path, from, to, change),
            Node::Slice(differ) => differ.diff(self, cx, path, from, to),
            Node::Map(differ) => differ.diff(cx, path, from, to),
            Node::Interface(differ) => differ.diff(cx, path, from, to, change),
            Node::Decoding(differ) => differ.diff(self, cx, path, from, to, change),
            Node::Scalar(differ) => differ.diff(cx, path, from, to, change),
            Node::Pending => {}
        }
    }
}

impl fmt::Debug for Compiled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiled")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .finish()
    }
}

/// Builds the node arena of one [`Compiled`] differ.
pub(crate) struct Builder<'c> {
    config: &'c DiffConfig,
    nodes: Vec<Node>,
    structs: HashMap<(ShapeKey, ShapeKey), NodeId>,
    depth: usize,
}

impl<'c> Builder<'c> {
    /// Compile a differ for `from` → `to`. A missing shape is taken to be
    /// the same as the other side's.
    pub(crate) fn compile(
        from: Option<&Shape>,
        to: Option<&Shape>,
        tag: &Tag,
        config: &'c DiffConfig,
    ) -> DiffResult<Compiled> {
        let (from, to) = match (from, to) {
            (Some(from), Some(to)) => (from, to),
            (Some(one), None) | (None, Some(one)) => (one, one),
            (None, None) => {
                return Err(DiffError::UnsupportedShape {
                    shape: "unknown".to_string(),
                    reason: "neither side has a shape".to_string(),
                })
            }
        };
        let mut builder = Builder {
            config,
            nodes: Vec::new(),
            structs: HashMap::new(),
            depth: 0,
        };
        let root = builder.node(from, to, tag)?;
        debug!(from = %from, to = %to, nodes = builder.nodes.len(), "compiled differ");
        Ok(Compiled {
            nodes: builder.nodes,
            root,
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests(config: &'c DiffConfig) -> Self {
        Builder {
            config,
            nodes: Vec::new(),
            structs: HashMap::new(),
            depth: 0,
        }
    }

    pub(crate) fn config(&self) -> &'c DiffConfig {
        self.config
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// The node comparing `from` with `to`, dispatched on the shape pair
    /// with optional wrappers removed.
    pub(crate) fn node(&mut self, from: &Shape, to: &Shape, tag: &Tag) -> DiffResult<NodeId> {
        let (from, to) = (from.strip_optional(), to.strip_optional());
        let node = match (from, to) {
            (Shape::Struct(from), Shape::Struct(to)) => return self.struct_node(from, to),
            (Shape::List(from), Shape::List(to)) => {
                Node::Slice(SliceDiffer::build(self, from, to, tag)?)
            }
            (Shape::Map { .. }, Shape::Map { .. }) => Node::Map(MapDiffer::build(from, to, tag)?),
            _ if from.is_dynamic() || to.is_dynamic() => Node::Interface(IfaceDiffer::new(tag)),
            (Shape::Scalar(ScalarKind::String), Shape::Scalar(ScalarKind::String))
                if tag.is_decodable() =>
            {
                Node::Decoding(DecodingDiffer::build(self, tag)?)
            }
            (Shape::Scalar(from), Shape::Scalar(to)) => {
                Node::Scalar(ScalarDiffer::build(*from, *to, tag, self.config.strict_mode)?)
            }
            _ => return Err(DiffError::incompatible(from, to)),
        };
        Ok(self.push(node))
    }

    fn struct_node(&mut self, from: &StructRef, to: &StructRef) -> DiffResult<NodeId> {
        let key = (from.key(), to.key());
        if let Some(&id) = self.structs.get(&key) {
            return Ok(id);
        }
        if self.depth >= self.config.max_depth {
            return Err(DiffError::CyclicSchema {
                shape: from.name().to_string(),
                depth: self.config.max_depth,
            });
        }
        let id = self.push(Node::Pending);
        self.structs.insert(key, id);
        self.depth += 1;
        let built = StructDiffer::build(self, from, to);
        self.depth -= 1;
        self.nodes[id] = Node::Struct(built?);
        Ok(id)
    }
}
