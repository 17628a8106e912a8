//! Locations within a compared data tree.
//!
//! A [`Path`] is a backward-linked chain of immutable segments. Extending a
//! path allocates one node that points at its parent, so sibling branches of
//! a recursive comparison share their common prefix.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// One step from a parent location.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A struct field (by its reported name).
    Field(String),
    /// A map entry.
    Key(String),
    /// A slice element.
    Index(usize),
}

#[derive(Debug)]
struct Node {
    segment: Segment,
    parent: Path,
}

/// A location in a data tree. The default path is the root.
#[derive(Clone, Default)]
pub struct Path {
    node: Option<Arc<Node>>,
}

impl Path {
    /// The root location.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.node.is_none()
    }

    fn push(&self, segment: Segment) -> Self {
        Self {
            node: Some(Arc::new(Node {
                segment,
                parent: self.clone(),
            })),
        }
    }

    /// Descend into a struct field.
    pub fn field(&self, name: impl Into<String>) -> Self {
        self.push(Segment::Field(name.into()))
    }

    /// Descend into a map entry.
    pub fn entry(&self, key: impl Into<String>) -> Self {
        self.push(Segment::Key(key.into()))
    }

    /// Descend into a slice element.
    pub fn element(&self, index: usize) -> Self {
        self.push(Segment::Index(index))
    }

    /// The last segment, or `None` at the root.
    pub fn segment(&self) -> Option<&Segment> {
        self.node.as_ref().map(|n| &n.segment)
    }

    /// The enclosing location, or `None` at the root.
    pub fn parent(&self) -> Option<&Path> {
        self.node.as_ref().map(|n| &n.parent)
    }

    /// Number of segments below the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let Some(parent) = current.parent() {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Segments ordered root-first.
    pub fn segments(&self) -> Vec<&Segment> {
        let mut out = Vec::with_capacity(self.depth());
        let mut current = self;
        while let Some(node) = &current.node {
            out.push(&node.segment);
            current = &node.parent;
        }
        out.reverse();
        out
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        for segment in self.segments() {
            match segment {
                Segment::Field(name) => {
                    if wrote {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                Segment::Key(key) => write!(f, "[{key}]")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
            wrote = true;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.segments() == other.segments()
    }
}

impl Eq for Path {}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
