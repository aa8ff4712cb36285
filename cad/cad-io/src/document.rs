//! Kernel-backed CAD documents.
//!
//! A [`CadDocument`] holds one [`KernelMesh`] per B-rep shell. Shells are
//! triangulated the first time their faces are enumerated and the result is
//! cached, so a full enumeration pass ahead of flattening moves all kernel
//! work to the front.

use std::cell::OnceCell;
use std::fmt;

use cad_types::{
    Color, FaceData, GeometrySource, MeshId, NodeId, SceneNode, SourceMesh,
};

use crate::CadFormat;
use crate::params::ImportParams;
use crate::tessellate::{Triangulator, tessellate};

/// A B-rep shell exposed as a mesh, tessellated on demand.
pub struct KernelMesh {
    name: String,
    params: ImportParams,
    triangulate: Triangulator,
    faces: OnceCell<Vec<FaceData>>,
}

impl KernelMesh {
    pub(crate) fn new(name: String, params: ImportParams, triangulate: Triangulator) -> Self {
        Self {
            name,
            params,
            triangulate,
            faces: OnceCell::new(),
        }
    }

    /// Whether the shell has already been triangulated.
    #[must_use]
    pub fn is_tessellated(&self) -> bool {
        self.faces.get().is_some()
    }

    fn tessellated_faces(&self) -> &[FaceData] {
        self.faces
            .get_or_init(|| tessellate(&*self.triangulate, &self.params))
    }
}

impl fmt::Debug for KernelMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelMesh")
            .field("name", &self.name)
            .field("tessellated", &self.is_tessellated())
            .finish_non_exhaustive()
    }
}

impl SourceMesh for KernelMesh {
    type Face<'a> = &'a FaceData;

    fn name(&self) -> &str {
        &self.name
    }

    /// STEP styling is not read by the truck kernel, so shells carry no color.
    fn color(&self) -> Option<Color> {
        None
    }

    fn faces(&self) -> impl Iterator<Item = Self::Face<'_>> {
        self.tessellated_faces().iter()
    }
}

/// A decoded CAD file.
///
/// The root is an unnamed grouping node; every shell becomes a mesh node
/// directly below it, in file order.
#[derive(Debug)]
pub struct CadDocument {
    format: CadFormat,
    params: ImportParams,
    nodes: Vec<SceneNode>,
    meshes: Vec<KernelMesh>,
}

impl CadDocument {
    pub(crate) fn new(format: CadFormat, params: ImportParams) -> Self {
        Self {
            format,
            params,
            nodes: vec![SceneNode::group("")],
            meshes: Vec::new(),
        }
    }

    /// Register a shell as a mesh node under the root.
    pub(crate) fn push_shell(&mut self, name: String, triangulate: Triangulator) {
        let mesh = MeshId(self.meshes.len());
        self.meshes
            .push(KernelMesh::new(name.clone(), self.params, triangulate));

        let node = NodeId(self.nodes.len());
        self.nodes.push(SceneNode::mesh_node(name, vec![mesh]));
        if let Some(root) = self.nodes.first_mut() {
            root.children.push(node);
        }
    }

    /// Format the document was decoded from.
    #[must_use]
    pub const fn format(&self) -> CadFormat {
        self.format
    }

    /// Parameters the document tessellates with.
    #[must_use]
    pub const fn params(&self) -> &ImportParams {
        &self.params
    }

    /// Number of shells.
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Number of shells already triangulated.
    #[must_use]
    pub fn tessellated_count(&self) -> usize {
        self.meshes.iter().filter(|m| m.is_tessellated()).count()
    }
}

impl GeometrySource for CadDocument {
    type Mesh = KernelMesh;

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    fn mesh(&self, id: MeshId) -> Option<&KernelMesh> {
        self.meshes.get(id.0)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
