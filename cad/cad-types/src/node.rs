//! Node records of a CAD document tree.
//!
//! Documents store their nodes in an arena and link them by [`NodeId`].
//! Meshes are addressed the same way through [`MeshId`], so a node can
//! reference a mesh owned by the document without borrowing it.

use std::fmt;

use nalgebra::Isometry3;

/// Index of a node in a document's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Index of a mesh in a document's mesh storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

/// What a node holds besides its children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeContent {
    /// A grouping node without geometry.
    #[default]
    Group,
    /// A mesh-bearing node. The list may repeat a mesh id, and may be empty.
    Meshes(Vec<MeshId>),
}

/// One node of a CAD document tree.
///
/// # Example
///
/// ```
/// use cad_types::{MeshId, NodeId, SceneNode};
///
/// let node = SceneNode::group("assembly").with_child(NodeId(1));
/// assert!(!node.is_mesh_node());
///
/// let part = SceneNode::mesh_node("bolt", vec![MeshId(0)]);
/// assert!(part.is_mesh_node());
/// assert_eq!(part.meshes(), &[MeshId(0)]);
/// ```
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Product name of the node.
    pub name: String,

    /// Name of this particular occurrence, when the source distinguishes it.
    pub instance_name: Option<String>,

    /// Placement relative to the parent node.
    pub transform: Isometry3<f64>,

    /// Child nodes in source order.
    pub children: Vec<NodeId>,

    /// Geometry carried by the node.
    pub content: NodeContent,
}

impl SceneNode {
    /// Create a grouping node with no children.
    #[must_use]
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance_name: None,
            transform: Isometry3::identity(),
            children: Vec::new(),
            content: NodeContent::Group,
        }
    }

    /// Create a mesh-bearing node referencing the given meshes.
    #[must_use]
    pub fn mesh_node(name: impl Into<String>, meshes: Vec<MeshId>) -> Self {
        Self {
            content: NodeContent::Meshes(meshes),
            ..Self::group(name)
        }
    }

    /// Append a child and return the node.
    #[must_use]
    pub fn with_child(mut self, child: NodeId) -> Self {
        self.children.push(child);
        self
    }

    /// Set the instance name.
    #[must_use]
    pub fn with_instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = Some(name.into());
        self
    }

    /// Set the local placement.
    #[must_use]
    pub fn with_transform(mut self, transform: Isometry3<f64>) -> Self {
        self.transform = transform;
        self
    }

    /// Whether the node carries geometry.
    #[inline]
    #[must_use]
    pub const fn is_mesh_node(&self) -> bool {
        matches!(self.content, NodeContent::Meshes(_))
    }

    /// Meshes of the node; empty for grouping nodes.
    #[inline]
    #[must_use]
    pub fn meshes(&self) -> &[MeshId] {
        match &self.content {
            NodeContent::Group => &[],
            NodeContent::Meshes(ids) => ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_has_no_meshes() {
        let node = SceneNode::group("root");
        assert!(!node.is_mesh_node());
        assert!(node.meshes().is_empty());
        assert!(node.children.is_empty());
    }

    #[test]
    fn empty_mesh_node_is_still_a_mesh_node() {
        let node = SceneNode::mesh_node("hollow", Vec::new());
        assert!(node.is_mesh_node());
        assert!(node.meshes().is_empty());
    }

    #[test]
    fn builder_sets_fields() {
        let node = SceneNode::group("a")
            .with_child(NodeId(3))
            .with_child(NodeId(1))
            .with_instance_name("a:1");
        assert_eq!(node.children, vec![NodeId(3), NodeId(1)]);
        assert_eq!(node.instance_name.as_deref(), Some("a:1"));
    }

    #[test]
    fn ids_display() {
        assert_eq!(NodeId(4).to_string(), "node#4");
        assert_eq!(MeshId(0).to_string(), "mesh#0");
    }
}
