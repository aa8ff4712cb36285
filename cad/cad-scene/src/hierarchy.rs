//! Hierarchy serialization and the forced-tessellation pre-pass.

use cad_types::{GeometrySource, SourceFace, SourceMesh};
use tracing::debug;

use crate::error::{SceneError, SceneResult};
use crate::flatten::MeshArray;
use crate::output::OutputNode;
use crate::walk::PreOrder;

/// A node waiting for its children to be built.
struct PendingNode {
    name: String,
    mesh_indices: Vec<u32>,
    parent: Option<usize>,
}

/// Build the output tree of a document, flattening its meshes into `meshes`.
///
/// Nodes are visited depth-first in pre-order; each mesh of a mesh-bearing
/// node is flattened and appended in order, so mesh indices grow in
/// traversal order. The returned tree has the same shape and child order as
/// the document.
///
/// On error `meshes` is left as it was on entry.
///
/// # Errors
///
/// Returns an error if the document tree revisits a node, references a
/// missing node or mesh, or overflows a `u32` count.
///
/// # Example
///
/// ```
/// use cad_scene::{serialize_hierarchy, MeshArray};
/// use cad_types::{GeometrySource, MeshData, Scene};
///
/// let mut scene = Scene::new("root");
/// let part = scene.add_mesh(MeshData::new("part"));
/// let root = scene.root();
/// scene.add_mesh_node(root, "part", vec![part]);
///
/// let mut meshes = MeshArray::new();
/// let tree = serialize_hierarchy(&scene, &mut meshes).unwrap();
/// assert_eq!(tree.children[0].mesh_indices, vec![0]);
/// assert_eq!(meshes.len(), 1);
/// ```
pub fn serialize_hierarchy<D: GeometrySource>(
    source: &D,
    meshes: &mut MeshArray,
) -> SceneResult<OutputNode> {
    let start = meshes.len();
    let result = build_tree(source, meshes);
    if result.is_err() {
        meshes.truncate(start);
    }
    result
}

fn build_tree<D: GeometrySource>(source: &D, meshes: &mut MeshArray) -> SceneResult<OutputNode> {
    let mut pending = Vec::with_capacity(source.node_count());

    for visit in PreOrder::new(source) {
        let visit = visit?;
        let mut mesh_indices = Vec::new();
        if visit.node.is_mesh_node() {
            for &mesh_id in visit.node.meshes() {
                let mesh = source.mesh(mesh_id).ok_or(SceneError::MissingMesh {
                    node: visit.id,
                    mesh: mesh_id,
                })?;
                mesh_indices.push(meshes.flatten(mesh)?);
            }
        }
        pending.push(PendingNode {
            name: visit.node.name.clone(),
            mesh_indices,
            parent: visit.parent,
        });
    }

    Ok(link_tree(pending))
}

/// Nest pending nodes under their parents.
///
/// Every parent slot precedes its children, so walking the slots backwards
/// completes each subtree before its parent is built. Siblings arrive last
/// first and are reversed once.
fn link_tree(mut pending: Vec<PendingNode>) -> OutputNode {
    let mut children: Vec<Vec<OutputNode>> = vec![Vec::new(); pending.len()];
    let mut root = OutputNode::default();

    while let Some(node) = pending.pop() {
        let slot = pending.len();
        let mut own = std::mem::take(&mut children[slot]);
        own.reverse();
        let built = OutputNode {
            name: node.name,
            mesh_indices: node.mesh_indices,
            children: own,
        };
        match node.parent {
            Some(parent) => children[parent].push(built),
            None => root = built,
        }
    }

    root
}

/// Totals gathered by [`force_tessellation`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TessellationStats {
    /// Meshes enumerated.
    pub meshes: usize,
    /// Faces enumerated.
    pub faces: usize,
    /// Vertices produced.
    pub vertices: usize,
    /// Normals produced.
    pub normals: usize,
    /// Triangles produced.
    pub triangles: usize,
}

/// Enumerate every face of every mesh in the document and discard it.
///
/// Sources that tessellate on first enumeration are fully tessellated
/// afterwards. Only the totals are kept.
///
/// # Errors
///
/// Returns an error if the document tree revisits a node or references a
/// missing node or mesh.
pub fn force_tessellation<D: GeometrySource>(source: &D) -> SceneResult<TessellationStats> {
    let mut stats = TessellationStats::default();

    for visit in PreOrder::new(source) {
        let visit = visit?;
        if !visit.node.is_mesh_node() {
            continue;
        }
        for &mesh_id in visit.node.meshes() {
            let mesh = source.mesh(mesh_id).ok_or(SceneError::MissingMesh {
                node: visit.id,
                mesh: mesh_id,
            })?;
            stats.meshes += 1;
            for face in mesh.faces() {
                stats.faces += 1;
                stats.vertices += face.vertices().count();
                stats.normals += face.normals().count();
                stats.triangles += face.triangles().count();
            }
        }
    }

    debug!(
        meshes = stats.meshes,
        faces = stats.faces,
        triangles = stats.triangles,
        "Forced tessellation"
    );
    Ok(stats)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cad_types::{FaceData, MeshData, MeshId, NodeId, Scene};

    fn triangle_mesh(name: &str) -> MeshData {
        MeshData::new(name).with_face(FaceData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2]],
        ))
    }

    #[test]
    fn lone_root_has_no_meshes_or_children() {
        let scene = Scene::new("root");
        let mut meshes = MeshArray::new();
        let tree = serialize_hierarchy(&scene, &mut meshes).unwrap();
        assert_eq!(tree, OutputNode::leaf("root"));
        assert!(meshes.is_empty());
    }

    #[test]
    fn mesh_indices_follow_pre_order() {
        let mut scene = Scene::new("root");
        let m0 = scene.add_mesh(triangle_mesh("m0"));
        let m1 = scene.add_mesh(triangle_mesh("m1"));
        let m2 = scene.add_mesh(triangle_mesh("m2"));
        let root = scene.root();
        let a = scene.add_group(root, "a");
        scene.add_mesh_node(a, "deep", vec![m2, m0]);
        scene.add_mesh_node(root, "b", vec![m1]);

        let mut meshes = MeshArray::new();
        let tree = serialize_hierarchy(&scene, &mut meshes).unwrap();

        assert_eq!(tree.children[0].name, "a");
        assert_eq!(tree.children[0].children[0].mesh_indices, vec![0, 1]);
        assert_eq!(tree.children[1].mesh_indices, vec![2]);
        let names: Vec<_> = meshes.as_slice().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["m2", "m0", "m1"]);
    }

    #[test]
    fn repeated_mesh_is_flattened_twice() {
        let mut scene = Scene::new("root");
        let m = scene.add_mesh(triangle_mesh("m"));
        let root = scene.root();
        scene.add_mesh_node(root, "twice", vec![m, m]);

        let mut meshes = MeshArray::new();
        let tree = serialize_hierarchy(&scene, &mut meshes).unwrap();

        assert_eq!(tree.children[0].mesh_indices, vec![0, 1]);
        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes.get(0), meshes.get(1));
        assert_eq!(meshes.get(0).map(|o| o.indices.clone()), Some(vec![0, 1, 2]));
    }

    #[test]
    fn group_nodes_have_no_mesh_indices() {
        let mut scene = Scene::new("root");
        let m0 = scene.add_mesh(triangle_mesh("m0"));
        let root = scene.root();
        let leaf = scene.add_group(root, "leaf");
        scene.add_mesh_node(leaf, "part", vec![m0]);

        let mut meshes = MeshArray::new();
        let tree = serialize_hierarchy(&scene, &mut meshes).unwrap();
        assert!(tree.mesh_indices.is_empty());
        assert!(tree.children[0].mesh_indices.is_empty());
    }

    #[test]
    fn failure_leaves_mesh_array_untouched() {
        let mut scene = Scene::new("root");
        let m0 = scene.add_mesh(triangle_mesh("m0"));
        let root = scene.root();
        scene.add_mesh_node(root, "ok", vec![m0]);
        scene.add_mesh_node(root, "bad", vec![MeshId(9)]);

        let mut meshes = MeshArray::new();
        meshes.flatten(&triangle_mesh("earlier")).unwrap();
        let result = serialize_hierarchy(&scene, &mut meshes);

        assert_eq!(
            result,
            Err(SceneError::MissingMesh {
                node: NodeId(2),
                mesh: MeshId(9)
            })
        );
        assert_eq!(meshes.len(), 1);
    }

    #[test]
    fn cycle_fails_serialization() {
        let mut scene = Scene::new("root");
        let root = scene.root();
        let a = scene.add_group(root, "a");
        scene.link(a, a);

        let mut meshes = MeshArray::new();
        assert_eq!(
            serialize_hierarchy(&scene, &mut meshes),
            Err(SceneError::Cycle { node: a })
        );
    }

    #[test]
    fn pre_pass_counts_everything() {
        let mut scene = Scene::new("root");
        let m0 = scene.add_mesh(triangle_mesh("m0"));
        let m1 = scene.add_mesh(triangle_mesh("m1"));
        let root = scene.root();
        let a = scene.add_group(root, "a");
        scene.add_mesh_node(a, "pair", vec![m0, m1]);

        let stats = force_tessellation(&scene).unwrap();
        assert_eq!(
            stats,
            TessellationStats {
                meshes: 2,
                faces: 2,
                vertices: 6,
                normals: 0,
                triangles: 2,
            }
        );
    }

    #[test]
    fn pre_pass_reports_cycles() {
        let mut scene = Scene::new("root");
        let root = scene.root();
        scene.link(root, root);
        assert_eq!(
            force_tessellation(&scene),
            Err(SceneError::Cycle { node: root })
        );
    }
}
