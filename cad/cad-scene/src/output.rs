//! Output records: flattened meshes and the mirrored node tree.
//!
//! These are the host-boundary types. Their JSON form is the shape renderers
//! consume directly (`attributes.position.array`, `index.array`,
//! `brep_faces`), so serialization goes through private wire structs rather
//! than derived field names.

use cad_types::Color;
use serde::{Serialize, Serializer};

/// Span of triangles in a mesh's index buffer that came from one face.
///
/// `first` and `last` are inclusive triangle numbers. A face that produced
/// no triangles has `last == first - 1`; the first face of a mesh therefore
/// records `first: 0, last: -1` when empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRange {
    /// First triangle of the face.
    pub first: i64,
    /// Last triangle of the face (inclusive).
    pub last: i64,
    /// Face color, if the face declares one.
    pub color: Option<Color>,
}

impl FaceRange {
    /// Returns `true` if the face produced no triangles.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.last < self.first
    }

    /// Number of triangles in the span.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        usize::try_from(self.last - self.first + 1).unwrap_or(0)
    }

    /// Indices of the span within a mesh index buffer of `indices`.
    ///
    /// Returns an empty slice for empty spans or spans outside the buffer.
    #[must_use]
    pub fn indices<'a>(&self, indices: &'a [u32]) -> &'a [u32] {
        let (Ok(first), Ok(last)) = (usize::try_from(self.first), usize::try_from(self.last))
        else {
            return &[];
        };
        if last < first {
            return &[];
        }
        indices.get(first * 3..(last + 1) * 3).unwrap_or(&[])
    }
}

/// One flattened mesh.
///
/// Buffers are flat: `positions` and `normals` hold `x, y, z` triples and
/// `indices` holds triangle vertex triples rebased to the mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputMesh {
    /// Name of the source mesh.
    pub name: String,
    /// Vertex positions.
    pub positions: Vec<f64>,
    /// Vertex normals; present only when every vertex has one.
    pub normals: Option<Vec<f64>>,
    /// Triangle indices into the vertex buffers.
    pub indices: Vec<u32>,
    /// One range per source face, in face order.
    pub face_ranges: Vec<FaceRange>,
    /// Overall mesh color.
    pub color: Option<Color>,
}

impl OutputMesh {
    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of source faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.face_ranges.len()
    }

    /// Color a face should render with: its own, else the mesh color.
    #[must_use]
    pub fn effective_color(&self, range: &FaceRange) -> Option<Color> {
        range.color.or(self.color)
    }
}

/// One node of the output tree.
///
/// Mirrors the source node: same name, same children in the same order.
/// `mesh_indices` point into the mesh array produced alongside the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutputNode {
    /// Node name.
    pub name: String,
    /// Indices into the mesh array.
    #[serde(rename = "meshes")]
    pub mesh_indices: Vec<u32>,
    /// Child nodes in source order.
    pub children: Vec<OutputNode>,
}

impl OutputNode {
    /// A node with no meshes and no children.
    #[must_use]
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Nodes of the subtree in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &OutputNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Number of nodes in the subtree, including this one.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }
}

#[derive(Serialize)]
struct ArrayWire<'a, T> {
    array: &'a [T],
}

#[derive(Serialize)]
struct AttributesWire<'a> {
    position: ArrayWire<'a, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    normal: Option<ArrayWire<'a, f64>>,
}

#[derive(Serialize)]
struct FaceWire {
    first: i64,
    last: i64,
    color: Option<[f64; 3]>,
}

#[derive(Serialize)]
struct MeshWire<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<[f64; 3]>,
    attributes: AttributesWire<'a>,
    index: ArrayWire<'a, u32>,
    brep_faces: Vec<FaceWire>,
}

impl Serialize for OutputMesh {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MeshWire {
            name: &self.name,
            color: self.color.map(Color::to_array),
            attributes: AttributesWire {
                position: ArrayWire {
                    array: &self.positions,
                },
                normal: self.normals.as_deref().map(|array| ArrayWire { array }),
            },
            index: ArrayWire {
                array: &self.indices,
            },
            brep_faces: self
                .face_ranges
                .iter()
                .map(|range| FaceWire {
                    first: range.first,
                    last: range.last,
                    color: range.color.map(Color::to_array),
                })
                .collect(),
        }
        .serialize(serializer)
    }
}
