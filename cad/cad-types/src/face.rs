//! Owned tessellation data.

use crate::{Color, SourceFace, SourceMesh};

/// A face whose tessellation is already materialized.
///
/// # Example
///
/// ```
/// use cad_types::{FaceData, SourceFace};
///
/// let face = FaceData::new(
///     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
///     vec![[0, 1, 2]],
/// );
/// assert_eq!(face.vertices().count(), 3);
/// assert_eq!(face.normals().count(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceData {
    /// Vertex positions.
    pub positions: Vec<[f64; 3]>,
    /// Vertex normals; empty or one per position for well-formed faces.
    pub normals: Vec<[f64; 3]>,
    /// Face-local triangles.
    pub triangles: Vec<[u32; 3]>,
    /// Face color.
    pub color: Option<Color>,
}

impl FaceData {
    /// Create a face from positions and triangles, without normals or color.
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
            ..Self::default()
        }
    }

    /// Set the normals.
    #[must_use]
    pub fn with_normals(mut self, normals: Vec<[f64; 3]>) -> Self {
        self.normals = normals;
        self
    }

    /// Set the face color.
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

impl SourceFace for FaceData {
    fn vertices(&self) -> impl Iterator<Item = [f64; 3]> {
        self.positions.iter().copied()
    }

    fn normals(&self) -> impl Iterator<Item = [f64; 3]> {
        self.normals.iter().copied()
    }

    fn triangles(&self) -> impl Iterator<Item = [u32; 3]> {
        self.triangles.iter().copied()
    }

    fn color(&self) -> Option<Color> {
        self.color
    }
}

/// A mesh whose faces are already materialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Mesh name.
    pub name: String,
    /// Overall mesh color.
    pub color: Option<Color>,
    /// Faces in order.
    pub faces: Vec<FaceData>,
}

impl MeshData {
    /// Create an empty mesh.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a face.
    #[must_use]
    pub fn with_face(mut self, face: FaceData) -> Self {
        self.faces.push(face);
        self
    }

    /// Set the overall color.
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

impl SourceMesh for MeshData {
    type Face<'a> = &'a FaceData;

    fn name(&self) -> &str {
        &self.name
    }

    fn color(&self) -> Option<Color> {
        self.color
    }

    fn faces(&self) -> impl Iterator<Item = Self::Face<'_>> {
        self.faces.iter()
    }
}
