//! Capability traits of a geometry source.
//!
//! A geometry source is whatever decoded the CAD file: it owns the node
//! arena and the meshes, and hands out faces whose vertex, normal and
//! triangle sequences are produced lazily. Tessellation may happen on first
//! enumeration, so enumerating a face can be expensive the first time.

use crate::{Color, MeshId, NodeId, SceneNode};

/// One tessellated B-rep face.
///
/// The three sequences are independent. Triangle indices are local to the
/// face and 0-based. A well-formed face yields either no normals or exactly
/// one normal per vertex, but consumers must check rather than assume.
pub trait SourceFace {
    /// Vertex positions as `[x, y, z]`.
    fn vertices(&self) -> impl Iterator<Item = [f64; 3]>;

    /// Vertex normals as `[x, y, z]`.
    fn normals(&self) -> impl Iterator<Item = [f64; 3]>;

    /// Triangles as face-local vertex index triples.
    fn triangles(&self) -> impl Iterator<Item = [u32; 3]>;

    /// Color assigned to this face, if any.
    fn color(&self) -> Option<Color>;
}

impl<F: SourceFace + ?Sized> SourceFace for &F {
    fn vertices(&self) -> impl Iterator<Item = [f64; 3]> {
        (**self).vertices()
    }

    fn normals(&self) -> impl Iterator<Item = [f64; 3]> {
        (**self).normals()
    }

    fn triangles(&self) -> impl Iterator<Item = [u32; 3]> {
        (**self).triangles()
    }

    fn color(&self) -> Option<Color> {
        (**self).color()
    }
}

/// A B-rep mesh: an ordered sequence of faces.
pub trait SourceMesh {
    /// Face handle type yielded by [`SourceMesh::faces`].
    type Face<'a>: SourceFace
    where
        Self: 'a;

    /// Name of the mesh.
    fn name(&self) -> &str;

    /// Overall color of the mesh, if any.
    fn color(&self) -> Option<Color>;

    /// Faces in source order.
    fn faces(&self) -> impl Iterator<Item = Self::Face<'_>>;
}

/// A decoded CAD document.
///
/// Nodes and meshes live in arenas owned by the document. The source
/// guarantees the tree is finite and acyclic, but consumers reached through
/// an untrusted source should still guard against revisits.
pub trait GeometrySource {
    /// Mesh type stored by this source.
    type Mesh: SourceMesh;

    /// Root node of the document tree.
    fn root(&self) -> NodeId;

    /// Look up a node record.
    ///
    /// Returns `None` for ids outside the arena.
    fn node(&self, id: NodeId) -> Option<&SceneNode>;

    /// Look up a mesh.
    ///
    /// Returns `None` for ids outside the mesh storage.
    fn mesh(&self, id: MeshId) -> Option<&Self::Mesh>;

    /// Number of nodes in the arena.
    fn node_count(&self) -> usize;
}
