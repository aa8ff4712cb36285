//! glTF JSON document construction.

#![allow(clippy::cast_possible_truncation)]

use std::collections::BTreeMap;

use cad_types::{Color, GeometrySource, Isometry3};
use gltf::json;
use gltf::json::validation::Checked::Valid;
use gltf::json::validation::USize64;

use super::config::{ExportConfig, TransformFormat};
use super::encode::{Block, EncodedMesh};
use crate::error::{SceneError, SceneResult};
use crate::flatten::MeshArray;
use crate::walk::PreOrder;

/// Identity test tolerance for placements.
const IDENTITY_EPSILON: f64 = 1e-12;

/// A document node as the exporter sees it.
#[derive(Debug, Clone)]
pub(crate) struct ExportNode {
    pub name: String,
    pub transform: Isometry3<f64>,
    pub parent: Option<usize>,
    pub meshes: Vec<u32>,
}

/// Nodes in pre-order plus the flattened meshes they reference.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExportScene {
    pub nodes: Vec<ExportNode>,
    pub meshes: MeshArray,
}

/// Walk the document and flatten its meshes for export.
pub(crate) fn collect_scene<D: GeometrySource>(
    source: &D,
    config: &ExportConfig,
) -> SceneResult<ExportScene> {
    let mut scene = ExportScene::default();

    for visit in PreOrder::new(source) {
        let visit = visit?;
        let node = visit.node;
        let mut meshes = Vec::new();
        if node.is_mesh_node() {
            for &mesh_id in node.meshes() {
                let mesh = source.mesh(mesh_id).ok_or(SceneError::MissingMesh {
                    node: visit.id,
                    mesh: mesh_id,
                })?;
                meshes.push(scene.meshes.flatten(mesh)?);
            }
        }
        scene.nodes.push(ExportNode {
            name: config
                .node_name_format
                .format(&node.name, node.instance_name.as_deref()),
            transform: node.transform,
            parent: visit.parent,
            meshes,
        });
    }

    Ok(scene)
}

fn index<T>(position: usize, what: &'static str) -> SceneResult<json::Index<T>> {
    u32::try_from(position)
        .map(json::Index::new)
        .map_err(|_| SceneError::IndexOverflow { what })
}

/// Builds the JSON root while tracking the shared buffer.
struct DocumentBuilder {
    root: json::Root,
    buffer: json::Index<json::Buffer>,
    materials: Vec<Color>,
}

impl DocumentBuilder {
    fn view(
        &mut self,
        base: usize,
        block: Block,
        target: json::buffer::Target,
    ) -> json::Index<json::buffer::View> {
        self.root.push(json::buffer::View {
            buffer: self.buffer,
            byte_length: USize64::from(block.length),
            byte_offset: Some(USize64::from(base + block.offset)),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: Some(Valid(target)),
        })
    }

    fn accessor(
        &mut self,
        view: json::Index<json::buffer::View>,
        count: usize,
        component: json::accessor::ComponentType,
        type_: json::accessor::Type,
        bounds: Option<([f32; 3], [f32; 3])>,
    ) -> json::Index<json::Accessor> {
        self.root.push(json::Accessor {
            buffer_view: Some(view),
            byte_offset: Some(USize64(0)),
            count: USize64::from(count),
            component_type: Valid(json::accessor::GenericComponentType(component)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(type_),
            min: bounds.map(|(min, _)| json::Value::from(min.to_vec())),
            max: bounds.map(|(_, max)| json::Value::from(max.to_vec())),
            name: None,
            normalized: false,
            sparse: None,
        })
    }

    fn vertex_attribute(
        &mut self,
        base: usize,
        block: Block,
        type_: json::accessor::Type,
        bounds: Option<([f32; 3], [f32; 3])>,
    ) -> json::Index<json::Accessor> {
        let view = self.view(base, block, json::buffer::Target::ArrayBuffer);
        self.accessor(view, block.count, json::accessor::ComponentType::F32, type_, bounds)
    }

    fn material(&mut self, color: Color) -> SceneResult<json::Index<json::Material>> {
        if let Some(position) = self.materials.iter().position(|c| *c == color) {
            return index(position, "material");
        }
        let [r, g, b] = color.clamped().to_array();
        let material = self.root.push(json::Material {
            pbr_metallic_roughness: json::material::PbrMetallicRoughness {
                base_color_factor: json::material::PbrBaseColorFactor([
                    r as f32, g as f32, b as f32, 1.0,
                ]),
                metallic_factor: json::material::StrengthFactor(0.0),
                ..Default::default()
            },
            double_sided: true,
            ..Default::default()
        });
        self.materials.push(color);
        Ok(material)
    }

    fn mesh(&mut self, base: usize, encoded: &EncodedMesh) -> SceneResult<json::Index<json::Mesh>> {
        let positions = self.vertex_attribute(
            base,
            encoded.positions,
            json::accessor::Type::Vec3,
            Some((encoded.min, encoded.max)),
        );
        let normals = encoded
            .normals
            .map(|block| self.vertex_attribute(base, block, json::accessor::Type::Vec3, None));
        let texcoords = encoded
            .texcoords
            .map(|block| self.vertex_attribute(base, block, json::accessor::Type::Vec2, None));

        let mut attributes = BTreeMap::new();
        attributes.insert(Valid(json::mesh::Semantic::Positions), positions);
        if let Some(normals) = normals {
            attributes.insert(Valid(json::mesh::Semantic::Normals), normals);
        }
        if let Some(texcoords) = texcoords {
            attributes.insert(Valid(json::mesh::Semantic::TexCoords(0)), texcoords);
        }

        let mut primitives = Vec::with_capacity(encoded.primitives.len());
        for primitive in &encoded.primitives {
            let view = self.view(
                base,
                primitive.indices,
                json::buffer::Target::ElementArrayBuffer,
            );
            let indices = self.accessor(
                view,
                primitive.indices.count,
                json::accessor::ComponentType::U32,
                json::accessor::Type::Scalar,
                None,
            );
            let material = primitive.color.map(|c| self.material(c)).transpose()?;
            primitives.push(json::mesh::Primitive {
                attributes: attributes.clone(),
                extensions: Default::default(),
                extras: Default::default(),
                indices: Some(indices),
                material,
                mode: Valid(json::mesh::Mode::Triangles),
                targets: None,
            });
        }

        Ok(self.root.push(json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(encoded.name.clone()),
            primitives,
            weights: None,
        }))
    }
}

fn is_identity(transform: &Isometry3<f64>) -> (bool, bool) {
    let translation_identity = transform.translation.vector.norm() <= IDENTITY_EPSILON;
    let rotation_identity = transform.rotation.angle() <= IDENTITY_EPSILON;
    (translation_identity, rotation_identity)
}

fn apply_transform(node: &mut json::Node, transform: &Isometry3<f64>, format: TransformFormat) {
    let (no_translation, no_rotation) = is_identity(transform);
    if no_translation && no_rotation {
        return;
    }

    let t = transform.translation.vector;
    let q = transform.rotation;
    let translation = [t.x as f32, t.y as f32, t.z as f32];
    let rotation = json::scene::UnitQuaternion([q.i as f32, q.j as f32, q.k as f32, q.w as f32]);

    match format {
        TransformFormat::Mat4 => {
            let matrix = transform.to_homogeneous();
            let mut columns = [0.0_f32; 16];
            for (out, value) in columns.iter_mut().zip(matrix.as_slice()) {
                *out = *value as f32;
            }
            node.matrix = Some(columns);
        }
        TransformFormat::Trs => {
            node.translation = Some(translation);
            node.rotation = Some(rotation);
        }
        TransformFormat::Compact => {
            node.translation = (!no_translation).then_some(translation);
            node.rotation = (!no_rotation).then_some(rotation);
        }
    }
}

/// Build the glTF root for an encoded scene.
///
/// The buffer is the concatenation of the encoded meshes' bytes in mesh
/// order, `payload_len` bytes long and located by `uri` (`None` for the GLB
/// binary chunk). An empty payload gets no buffer at all.
pub(crate) fn build_root(
    scene: &ExportScene,
    encoded: &[EncodedMesh],
    payload_len: usize,
    uri: Option<String>,
    config: &ExportConfig,
) -> SceneResult<json::Root> {
    let mut root = json::Root::default();
    root.asset.generator = Some(format!("cad-scene {}", env!("CARGO_PKG_VERSION")));

    let mut gltf_meshes: Vec<Option<json::Index<json::Mesh>>> = vec![None; encoded.len()];
    if payload_len > 0 {
        let buffer = root.push(json::Buffer {
            byte_length: USize64::from(payload_len),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri,
        });
        let mut builder = DocumentBuilder {
            root,
            buffer,
            materials: Vec::new(),
        };
        let mut base = 0;
        for (slot, mesh) in encoded.iter().enumerate() {
            if mesh.is_renderable() {
                gltf_meshes[slot] = Some(builder.mesh(base, mesh)?);
            }
            base += mesh.bytes.len();
        }
        root = builder.root;
    }

    // Scene nodes keep their pre-order slots; holders for nodes with more
    // than one mesh are appended after them.
    let mut nodes: Vec<json::Node> = Vec::with_capacity(scene.nodes.len());
    let mut children: Vec<Vec<json::Index<json::Node>>> = vec![Vec::new(); scene.nodes.len()];
    let mut holders: Vec<json::Node> = Vec::new();

    for (slot, node) in scene.nodes.iter().enumerate() {
        let mut gltf_node = json::Node {
            name: Some(node.name.clone()),
            ..Default::default()
        };
        apply_transform(&mut gltf_node, &node.transform, config.transform_format);

        let meshes: Vec<_> = node
            .meshes
            .iter()
            .filter_map(|&m| gltf_meshes.get(m as usize).copied().flatten())
            .collect();
        if let [single] = meshes.as_slice() {
            gltf_node.mesh = Some(*single);
        } else {
            for mesh in meshes {
                let holder = index(scene.nodes.len() + holders.len(), "node")?;
                holders.push(json::Node {
                    name: Some(node.name.clone()),
                    mesh: Some(mesh),
                    ..Default::default()
                });
                children[slot].push(holder);
            }
        }

        if let Some(parent) = node.parent {
            children[parent].push(index(slot, "node")?);
        }
        nodes.push(gltf_node);
    }

    for (node, own) in nodes.iter_mut().zip(children) {
        if !own.is_empty() {
            node.children = Some(own);
        }
    }
    nodes.extend(holders);
    root.nodes = nodes;

    if !scene.nodes.is_empty() {
        let scene_index = root.push(json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            nodes: vec![json::Index::new(0)],
        });
        root.scene = Some(scene_index);
    }

    Ok(root)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::export::encode::encode_mesh;
    use approx::assert_relative_eq;
    use cad_types::{FaceData, MeshData, Scene, SceneNode, Translation3, UnitQuaternion};

    fn triangle(name: &str) -> MeshData {
        MeshData::new(name).with_face(FaceData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2]],
        ))
    }

    fn build(scene: &Scene, config: &ExportConfig) -> json::Root {
        let collected = collect_scene(scene, config).unwrap();
        let encoded: Vec<_> = collected
            .meshes
            .as_slice()
            .iter()
            .map(|m| encode_mesh(m, config.force_uv))
            .collect();
        let len = encoded.iter().map(|e| e.bytes.len()).sum();
        build_root(&collected, &encoded, len, None, config).unwrap()
    }

    #[test]
    fn node_tree_is_mirrored() {
        let mut scene = Scene::new("root");
        let m = scene.add_mesh(triangle("m"));
        let root = scene.root();
        let a = scene.add_group(root, "a");
        scene.add_mesh_node(a, "part", vec![m]);

        let gltf = build(&scene, &ExportConfig::default());
        assert_eq!(gltf.nodes.len(), 3);
        assert_eq!(gltf.nodes[0].children, Some(vec![json::Index::new(1)]));
        assert_eq!(gltf.nodes[1].children, Some(vec![json::Index::new(2)]));
        assert_eq!(gltf.nodes[2].mesh, Some(json::Index::new(0)));
        assert_eq!(gltf.meshes.len(), 1);
        assert_eq!(gltf.buffers.len(), 1);
        assert!(gltf.scene.is_some());
    }

    #[test]
    fn multi_mesh_node_gets_holders() {
        let mut scene = Scene::new("root");
        let m0 = scene.add_mesh(triangle("m0"));
        let m1 = scene.add_mesh(triangle("m1"));
        let root = scene.root();
        scene.add_mesh_node(root, "pair", vec![m0, m1]);

        let gltf = build(&scene, &ExportConfig::default());
        assert_eq!(gltf.nodes.len(), 4);
        assert!(gltf.nodes[1].mesh.is_none());
        assert_eq!(
            gltf.nodes[1].children,
            Some(vec![json::Index::new(2), json::Index::new(3)])
        );
        assert_eq!(gltf.nodes[3].mesh, Some(json::Index::new(1)));
    }

    #[test]
    fn empty_document_has_no_buffer() {
        let gltf = build(&Scene::new("root"), &ExportConfig::default());
        assert!(gltf.buffers.is_empty());
        assert!(gltf.meshes.is_empty());
        assert_eq!(gltf.nodes.len(), 1);
    }

    #[test]
    fn colors_become_shared_materials() {
        let red = FaceData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2]],
        )
        .with_color(Color::RED);
        let mut scene = Scene::new("root");
        let m0 = scene.add_mesh(MeshData::new("a").with_face(red.clone()));
        let m1 = scene.add_mesh(MeshData::new("b").with_face(red));
        let root = scene.root();
        scene.add_mesh_node(root, "a", vec![m0]);
        scene.add_mesh_node(root, "b", vec![m1]);

        let gltf = build(&scene, &ExportConfig::default());
        assert_eq!(gltf.materials.len(), 1);
        assert_eq!(
            gltf.materials[0].pbr_metallic_roughness.base_color_factor.0,
            [1.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn forced_uv_adds_texcoords() {
        let mut scene = Scene::new("root");
        let m = scene.add_mesh(triangle("m"));
        let root = scene.root();
        scene.add_mesh_node(root, "m", vec![m]);

        let with = build(&scene, &ExportConfig::default());
        let attributes = &with.meshes[0].primitives[0].attributes;
        assert!(attributes.contains_key(&Valid(json::mesh::Semantic::TexCoords(0))));

        let without = build(&scene, &ExportConfig::default().with_force_uv(false));
        let attributes = &without.meshes[0].primitives[0].attributes;
        assert!(!attributes.contains_key(&Valid(json::mesh::Semantic::TexCoords(0))));
    }

    #[test]
    fn transforms_follow_format() {
        let mut scene = Scene::new("root");
        let root = scene.root();
        let shifted = SceneNode::group("shifted").with_transform(Isometry3::from_parts(
            Translation3::new(1.0, 2.0, 3.0),
            UnitQuaternion::identity(),
        ));
        scene.add_node(root, shifted);

        let compact = build(&scene, &ExportConfig::default());
        assert_eq!(compact.nodes[1].translation, Some([1.0, 2.0, 3.0]));
        assert!(compact.nodes[1].rotation.is_none());
        assert!(compact.nodes[0].translation.is_none());

        let trs = build(
            &scene,
            &ExportConfig::default().with_transform_format(TransformFormat::Trs),
        );
        assert!(trs.nodes[1].rotation.is_some());

        let mat4 = build(
            &scene,
            &ExportConfig::default().with_transform_format(TransformFormat::Mat4),
        );
        let matrix = mat4.nodes[1].matrix.unwrap();
        assert_eq!(&matrix[12..15], &[1.0, 2.0, 3.0]);
        assert!(mat4.nodes[1].translation.is_none());
    }

    #[test]
    fn compact_rotation_is_a_unit_quaternion() {
        let mut scene = Scene::new("root");
        let root = scene.root();
        let turned = SceneNode::group("turned").with_transform(Isometry3::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        ));
        scene.add_node(root, turned);

        let gltf = build(&scene, &ExportConfig::default());
        assert!(gltf.nodes[1].translation.is_none());
        let [x, y, z, w] = gltf.nodes[1].rotation.unwrap().0;
        let half = std::f32::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(z, half, epsilon = 1e-6);
        assert_relative_eq!(w, half, epsilon = 1e-6);
    }

    #[test]
    fn instance_names_are_formatted() {
        let mut scene = Scene::new("root");
        let root = scene.root();
        scene.add_node(root, SceneNode::group("bolt").with_instance_name("bolt:1"));

        let gltf = build(&scene, &ExportConfig::default());
        assert_eq!(gltf.nodes[1].name.as_deref(), Some("bolt:1 [bolt]"));
    }
}
