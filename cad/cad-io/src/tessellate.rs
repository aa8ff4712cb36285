//! Shell tessellation through the truck kernel.
//!
//! A shell is triangulated face by face. Each meshed face becomes one
//! [`FaceData`] with its own face-local vertex numbering, which is what the
//! flattener expects from a B-rep face.

// Mesh indices don't overflow u32 in practice
#![allow(clippy::cast_possible_truncation)]

use cad_types::FaceData;
use tracing::debug;
use truck_meshalgo::prelude::*;
use truck_polymesh::{Point3, PolygonMesh, PolylineCurve, StandardVertex};
use truck_topology::compress::{CompressedFace, CompressedShell};

use crate::params::{ImportParams, LinearDeflectionType};

/// A shell after tessellation: every face surface is replaced by its mesh.
pub(crate) type MeshedShell = CompressedShell<Point3, PolylineCurve<Point3>, Option<PolygonMesh>>;

/// Triangulates one shell at a given chordal tolerance (millimeters).
pub(crate) type Triangulator = Box<dyn Fn(f64) -> MeshedShell>;

/// Tolerance of the coarse pass used to measure a shell, and the fallback
/// when the configured tolerance is unusable.
const MEASURE_TOLERANCE: f64 = 0.01;

/// Tessellate a shell and split it into per-face data in the target unit.
pub(crate) fn tessellate(triangulate: &dyn Fn(f64) -> MeshedShell, params: &ImportParams) -> Vec<FaceData> {
    let tolerance = match params.linear_deflection_type {
        LinearDeflectionType::BoundingBoxRatio => {
            // First pass to get bounding box for tolerance calculation
            let coarse = triangulate(MEASURE_TOLERANCE);
            let diameter = coarse.to_polygon().bounding_box().diameter();
            params.tolerance_mm(diameter)
        }
        LinearDeflectionType::AbsoluteValue => params.tolerance_mm(0.0),
    }
    .unwrap_or(MEASURE_TOLERANCE);

    let meshed = triangulate(tolerance);
    debug!(
        tolerance,
        faces = meshed.faces.len(),
        "Tessellated shell"
    );

    let scale = params.linear_unit.scale_from_millimeters();
    meshed
        .faces
        .iter()
        .map(|face| face_data(face, scale))
        .collect()
}

/// Convert one meshed face.
///
/// Faces whose surface failed to mesh come out empty. Normals are kept only
/// when every position resolves one.
fn face_data(face: &CompressedFace<Option<PolygonMesh>>, scale: f64) -> FaceData {
    let Some(poly) = face.surface.as_ref() else {
        return FaceData::default();
    };

    let positions: Vec<[f64; 3]> = poly
        .positions()
        .iter()
        .map(|p| [p.x * scale, p.y * scale, p.z * scale])
        .collect();

    let source_normals = poly.normals();
    let mut slots: Vec<Option<[f64; 3]>> = vec![None; positions.len()];
    let mut corner = |vertex: &StandardVertex| -> u32 {
        if let (Some(n), Some(slot)) = (
            vertex.nor.and_then(|i| source_normals.get(i)),
            slots.get_mut(vertex.pos),
        ) {
            *slot = Some([n.x, n.y, n.z]);
        }
        vertex.pos as u32
    };

    let mut triangles = Vec::with_capacity(poly.tri_faces().len() + 2 * poly.quad_faces().len());
    for tri in poly.tri_faces() {
        triangles.push([corner(&tri[0]), corner(&tri[1]), corner(&tri[2])]);
    }

    // Triangulate quad faces
    for quad in poly.quad_faces() {
        let q = [
            corner(&quad[0]),
            corner(&quad[1]),
            corner(&quad[2]),
            corner(&quad[3]),
        ];
        triangles.push([q[0], q[1], q[2]]);
        triangles.push([q[0], q[2], q[3]]);
    }

    let mut normals: Vec<[f64; 3]> = if slots.iter().all(Option::is_some) {
        slots.into_iter().flatten().collect()
    } else {
        Vec::new()
    };

    if !face.orientation {
        for triangle in &mut triangles {
            triangle.swap(1, 2);
        }
        for normal in &mut normals {
            *normal = [-normal[0], -normal[1], -normal[2]];
        }
    }

    FaceData {
        positions,
        normals,
        triangles,
        color: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use truck_polymesh::{Faces, Vector3};

    fn meshed_face(orientation: bool, with_normals: bool) -> CompressedFace<Option<PolygonMesh>> {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 10.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
        ];
        let normals = vec![Vector3::new(0.0, 0.0, 1.0)];
        let nor = with_normals.then_some(0);
        let v = |pos| StandardVertex { pos, uv: None, nor };
        let faces = Faces::from_iter([[v(0), v(1), v(2), v(3)]]);
        let attrs = truck_polymesh::StandardAttributes {
            positions,
            uv_coords: Vec::new(),
            normals: if with_normals { normals } else { Vec::new() },
        };
        CompressedFace {
            boundaries: Vec::new(),
            orientation,
            surface: Some(PolygonMesh::new(attrs, faces)),
        }
    }

    #[test]
    fn quad_is_split_and_scaled() {
        let data = face_data(&meshed_face(true, true), 0.1);
        assert_eq!(data.triangles, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(data.positions[2], [1.0, 1.0, 0.0]);
        assert_eq!(data.normals, vec![[0.0, 0.0, 1.0]; 4]);
    }

    #[test]
    fn reversed_face_flips_winding_and_normals() {
        let data = face_data(&meshed_face(false, true), 1.0);
        assert_eq!(data.triangles, vec![[0, 2, 1], [0, 3, 2]]);
        assert_eq!(data.normals[0], [-0.0, -0.0, -1.0]);
    }

    #[test]
    fn missing_normals_are_dropped() {
        let data = face_data(&meshed_face(true, false), 1.0);
        assert_eq!(data.positions.len(), 4);
        assert!(data.normals.is_empty());
    }

    #[test]
    fn unmeshed_face_is_empty() {
        let face = CompressedFace {
            boundaries: Vec::new(),
            orientation: true,
            surface: None,
        };
        assert_eq!(face_data(&face, 1.0), FaceData::default());
    }
}
