//! Mesh flattening.
//!
//! A source mesh is a sequence of faces, each with face-local vertex
//! numbering. Flattening concatenates the faces into one vertex buffer and
//! one index buffer, rebasing each face's triangles by the number of
//! vertices emitted before it, and records which triangle span each face
//! produced.

use cad_types::{SourceFace, SourceMesh};

use crate::error::{SceneError, SceneResult};
use crate::output::{FaceRange, OutputMesh};

/// Increment a running count, failing once it leaves the `u32` range.
fn bump(counter: &mut u32, what: &'static str) -> SceneResult<()> {
    *counter = counter
        .checked_add(1)
        .ok_or(SceneError::IndexOverflow { what })?;
    Ok(())
}

/// Flatten one source mesh.
///
/// Faces are visited in source order. Normals are kept only when the mesh
/// produced exactly one normal per vertex overall; otherwise the mesh has
/// no normals at all. A face without triangles still gets a range, with
/// `last` one below `first`.
///
/// The source must already be tessellated, or tessellate on enumeration.
/// An untessellated face simply yields no triangles.
///
/// # Errors
///
/// Returns [`SceneError::IndexOverflow`] if the mesh has more vertices,
/// normals or triangles than a `u32` can count.
///
/// # Example
///
/// ```
/// use cad_scene::flatten_mesh;
/// use cad_types::{FaceData, MeshData};
///
/// let mesh = MeshData::new("tri").with_face(FaceData::new(
///     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
///     vec![[0, 1, 2]],
/// ));
///
/// let output = flatten_mesh(&mesh).unwrap();
/// assert_eq!(output.indices, vec![0, 1, 2]);
/// assert!(output.normals.is_none());
/// ```
pub fn flatten_mesh<M: SourceMesh + ?Sized>(mesh: &M) -> SceneResult<OutputMesh> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();
    let mut face_ranges = Vec::new();

    let mut vertex_count: u32 = 0;
    let mut normal_count: u32 = 0;
    let mut triangle_count: u32 = 0;

    for face in mesh.faces() {
        let triangle_offset = triangle_count;
        let vertex_offset = vertex_count;

        for vertex in face.vertices() {
            positions.extend_from_slice(&vertex);
            bump(&mut vertex_count, "vertex")?;
        }

        for normal in face.normals() {
            normals.extend_from_slice(&normal);
            bump(&mut normal_count, "normal")?;
        }

        for triangle in face.triangles() {
            for local in triangle {
                let index = vertex_offset
                    .checked_add(local)
                    .ok_or(SceneError::IndexOverflow { what: "vertex" })?;
                indices.push(index);
            }
            bump(&mut triangle_count, "triangle")?;
        }

        face_ranges.push(FaceRange {
            first: i64::from(triangle_offset),
            last: i64::from(triangle_count) - 1,
            color: face.color(),
        });
    }

    Ok(OutputMesh {
        name: mesh.name().to_string(),
        positions,
        normals: (vertex_count == normal_count).then_some(normals),
        indices,
        face_ranges,
        color: mesh.color(),
    })
}

/// The mesh array of one import: append-only, indices stable once assigned.
///
/// Passed explicitly through the traversal; every import starts from an
/// empty array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshArray {
    meshes: Vec<OutputMesh>,
}

impl MeshArray {
    /// Create an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of meshes appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Returns `true` if nothing was appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Append a mesh and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::IndexOverflow`] if the index would not fit a
    /// `u32`.
    pub fn push(&mut self, mesh: OutputMesh) -> SceneResult<u32> {
        let index =
            u32::try_from(self.meshes.len()).map_err(|_| SceneError::IndexOverflow { what: "mesh" })?;
        self.meshes.push(mesh);
        Ok(index)
    }

    /// Flatten a source mesh and append it.
    ///
    /// # Errors
    ///
    /// Returns an error if flattening or appending overflows.
    pub fn flatten<M: SourceMesh + ?Sized>(&mut self, mesh: &M) -> SceneResult<u32> {
        let output = flatten_mesh(mesh)?;
        self.push(output)
    }

    /// Mesh at `index`.
    #[must_use]
    pub fn get(&self, index: u32) -> Option<&OutputMesh> {
        self.meshes.get(usize::try_from(index).ok()?)
    }

    /// Meshes in index order.
    #[must_use]
    pub fn as_slice(&self) -> &[OutputMesh] {
        &self.meshes
    }

    /// Drop every mesh from `len` on.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.meshes.truncate(len);
    }

    /// Consume the array, yielding meshes in index order.
    #[must_use]
    pub fn into_vec(self) -> Vec<OutputMesh> {
        self.meshes
    }
}
