//! Per-mesh binary encoding.
//!
//! Each flattened mesh is encoded on its own into a little-endian byte
//! block: positions, optional normals, optional texture coordinates, then
//! one index run per color group. Every element is four bytes wide, so
//! blocks stay 4-byte aligned when concatenated.

#![allow(clippy::cast_possible_truncation)]

use cad_types::Color;

use crate::output::OutputMesh;

/// A run of bytes inside an encoded mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Block {
    /// Byte offset within the mesh's bytes.
    pub offset: usize,
    /// Length in bytes.
    pub length: usize,
    /// Number of accessor elements.
    pub count: usize,
}

/// Triangles of one color group.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EncodedPrimitive {
    pub indices: Block,
    pub color: Option<Color>,
}

/// A mesh ready to be placed into the glTF buffer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EncodedMesh {
    pub name: String,
    pub bytes: Vec<u8>,
    pub positions: Block,
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub normals: Option<Block>,
    pub texcoords: Option<Block>,
    pub primitives: Vec<EncodedPrimitive>,
}

impl EncodedMesh {
    /// glTF meshes need at least one primitive and one vertex.
    pub fn is_renderable(&self) -> bool {
        self.positions.count > 0 && !self.primitives.is_empty()
    }
}

fn push_f32s(bytes: &mut Vec<u8>, values: impl Iterator<Item = f32>) -> Block {
    let offset = bytes.len();
    let mut count = 0;
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
        count += 1;
    }
    Block {
        offset,
        length: bytes.len() - offset,
        count,
    }
}

fn push_u32s(bytes: &mut Vec<u8>, values: &[u32]) -> Block {
    let offset = bytes.len();
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    Block {
        offset,
        length: bytes.len() - offset,
        count: values.len(),
    }
}

/// Group triangle indices by render color, in order of first appearance.
fn color_groups(mesh: &OutputMesh) -> Vec<(Option<Color>, Vec<u32>)> {
    if mesh.face_ranges.is_empty() {
        if mesh.indices.is_empty() {
            return Vec::new();
        }
        return vec![(mesh.color, mesh.indices.clone())];
    }

    let mut groups: Vec<(Option<Color>, Vec<u32>)> = Vec::new();
    for range in &mesh.face_ranges {
        let triangles = range.indices(&mesh.indices);
        if triangles.is_empty() {
            continue;
        }
        let color = mesh.effective_color(range);
        match groups.iter_mut().find(|(c, _)| *c == color) {
            Some((_, indices)) => indices.extend_from_slice(triangles),
            None => groups.push((color, triangles.to_vec())),
        }
    }
    groups
}

/// Encode one flattened mesh.
pub(crate) fn encode_mesh(mesh: &OutputMesh, force_uv: bool) -> EncodedMesh {
    let mut bytes = Vec::new();

    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for vertex in mesh.positions.chunks_exact(3) {
        for axis in 0..3 {
            let value = vertex[axis] as f32;
            min[axis] = min[axis].min(value);
            max[axis] = max[axis].max(value);
        }
    }

    let vertex_count = mesh.vertex_count();
    let positions = push_f32s(
        &mut bytes,
        mesh.positions[..vertex_count * 3].iter().map(|&v| v as f32),
    );
    let positions = Block {
        count: vertex_count,
        ..positions
    };

    let normals = mesh
        .normals
        .as_deref()
        .filter(|normals| normals.len() == vertex_count * 3 && vertex_count > 0)
        .map(|normals| {
            let block = push_f32s(&mut bytes, normals.iter().map(|&v| v as f32));
            Block {
                count: vertex_count,
                ..block
            }
        });

    let texcoords = (force_uv && vertex_count > 0).then(|| {
        let block = push_f32s(&mut bytes, std::iter::repeat_n(0.0, vertex_count * 2));
        Block {
            count: vertex_count,
            ..block
        }
    });

    let primitives = color_groups(mesh)
        .into_iter()
        .map(|(color, indices)| EncodedPrimitive {
            indices: push_u32s(&mut bytes, &indices),
            color,
        })
        .collect();

    EncodedMesh {
        name: mesh.name.clone(),
        bytes,
        positions,
        min,
        max,
        normals,
        texcoords,
        primitives,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::output::FaceRange;

    fn two_face_mesh(colors: [Option<Color>; 2]) -> OutputMesh {
        OutputMesh {
            name: "m".to_string(),
            positions: vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 2.0,
            ],
            normals: None,
            indices: vec![0, 1, 2, 3, 4, 5],
            face_ranges: vec![
                FaceRange {
                    first: 0,
                    last: 0,
                    color: colors[0],
                },
                FaceRange {
                    first: 1,
                    last: 1,
                    color: colors[1],
                },
            ],
            color: None,
        }
    }

    #[test]
    fn layout_and_bounds() {
        let encoded = encode_mesh(&two_face_mesh([None, None]), true);

        assert_eq!(encoded.positions.offset, 0);
        assert_eq!(encoded.positions.count, 6);
        assert_eq!(encoded.positions.length, 72);
        assert!(encoded.normals.is_none());

        let uv = encoded.texcoords.unwrap();
        assert_eq!(uv.offset, 72);
        assert_eq!(uv.length, 48);

        assert_eq!(encoded.min, [0.0, 0.0, 0.0]);
        assert_eq!(encoded.max, [1.0, 1.0, 2.0]);
        assert_eq!(encoded.bytes.len(), 72 + 48 + 24);
        assert_eq!(encoded.bytes.len() % 4, 0);
    }

    #[test]
    fn same_color_faces_share_a_primitive() {
        let encoded = encode_mesh(&two_face_mesh([Some(Color::RED), Some(Color::RED)]), false);
        assert_eq!(encoded.primitives.len(), 1);
        assert_eq!(encoded.primitives[0].indices.count, 6);
        assert!(encoded.texcoords.is_none());
    }

    #[test]
    fn distinct_colors_split_primitives() {
        let encoded = encode_mesh(&two_face_mesh([Some(Color::RED), None]), false);
        let colors: Vec<_> = encoded.primitives.iter().map(|p| p.color).collect();
        assert_eq!(colors, vec![Some(Color::RED), None]);

        let second = encoded.primitives[1].indices;
        let bytes = &encoded.bytes[second.offset..second.offset + second.length];
        let first_index = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(first_index, 3);
    }

    #[test]
    fn mesh_color_fills_uncolored_faces() {
        let mut mesh = two_face_mesh([Some(Color::BLUE), None]);
        mesh.color = Some(Color::BLUE);
        assert_eq!(encode_mesh(&mesh, false).primitives.len(), 1);
    }

    #[test]
    fn empty_mesh_is_not_renderable() {
        let encoded = encode_mesh(&OutputMesh::default(), true);
        assert!(!encoded.is_renderable());
        assert!(encoded.bytes.is_empty());
    }
}
