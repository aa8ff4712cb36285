//! In-memory CAD document.
//!
//! [`Scene`] is a [`GeometrySource`] whose meshes are already tessellated.
//! It is used by callers that tessellate elsewhere and by tests. Linking is
//! unrestricted: [`Scene::link`] accepts any ids, so malformed trees
//! (cycles, dangling children) can be expressed and must be rejected by
//! consumers.

use crate::{GeometrySource, MeshData, MeshId, NodeContent, NodeId, SceneNode};

/// An in-memory document: a node arena plus owned meshes.
///
/// # Example
///
/// ```
/// use cad_types::{FaceData, GeometrySource, MeshData, Scene};
///
/// let mut scene = Scene::new("assembly");
/// let bolt = scene.add_mesh(MeshData::new("bolt").with_face(FaceData::new(
///     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
///     vec![[0, 1, 2]],
/// )));
/// let root = scene.root();
/// scene.add_mesh_node(root, "bolt", vec![bolt]);
///
/// assert_eq!(scene.node_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    meshes: Vec<MeshData>,
    root: NodeId,
}

impl Scene {
    /// Create a document holding a single grouping root node.
    #[must_use]
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![SceneNode::group(root_name)],
            meshes: Vec::new(),
            root: NodeId(0),
        }
    }

    /// Store a mesh and return its id.
    pub fn add_mesh(&mut self, mesh: MeshData) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    /// Store a node without linking it anywhere.
    pub fn insert_node(&mut self, node: SceneNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Store a node and append it to `parent`'s children.
    ///
    /// If `parent` is not in the arena the node is stored unlinked.
    pub fn add_node(&mut self, parent: NodeId, node: SceneNode) -> NodeId {
        let id = self.insert_node(node);
        self.link(parent, id);
        id
    }

    /// Add a grouping node under `parent`.
    pub fn add_group(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        self.add_node(parent, SceneNode::group(name))
    }

    /// Add a mesh-bearing node under `parent`.
    pub fn add_mesh_node(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        meshes: Vec<MeshId>,
    ) -> NodeId {
        self.add_node(parent, SceneNode::mesh_node(name, meshes))
    }

    /// Append `child` to `parent`'s children.
    ///
    /// No validation is performed on `child`. Returns `false` if `parent`
    /// does not exist.
    pub fn link(&mut self, parent: NodeId, child: NodeId) -> bool {
        match self.nodes.get_mut(parent.0) {
            Some(node) => {
                node.children.push(child);
                true
            }
            None => false,
        }
    }

    /// Replace the geometry of a node.
    ///
    /// Returns `false` if the node does not exist.
    pub fn set_content(&mut self, id: NodeId, content: NodeContent) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(node) => {
                node.content = content;
                true
            }
            None => false,
        }
    }

    /// Mutable access to a node.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    /// Mutable access to a mesh.
    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut MeshData> {
        self.meshes.get_mut(id.0)
    }

    /// Number of stored meshes.
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

impl GeometrySource for Scene {
    type Mesh = MeshData;

    fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    fn mesh(&self, id: MeshId) -> Option<&MeshData> {
        self.meshes.get(id.0)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
