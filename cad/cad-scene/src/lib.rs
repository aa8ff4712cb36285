//! Flatten CAD documents into render-ready meshes and node trees.
//!
//! A loaded document is a tree of named nodes; some nodes hold B-rep meshes
//! made of tessellated faces. This crate turns it into two outputs a
//! renderer can consume without a CAD kernel:
//!
//! - a flat array of [`OutputMesh`] values, each with positions, optional
//!   normals, rebased triangle indices and one [`FaceRange`] per source face
//! - an [`OutputNode`] tree with the document's shape, whose nodes point
//!   into the mesh array by index
//!
//! # Pipeline
//!
//! ```text
//! bytes ──load──▶ document ──(forced tessellation)──▶ serializer ──▶ ImportOutcome
//!                     │                                    │
//!                     │                                    └── flattener, per mesh
//!                     └──────────────▶ GltfExporter ──▶ GltfOutcome
//! ```
//!
//! Traversal is depth-first pre-order over the document's node arena with an
//! explicit stack. A node reached twice (a cycle or a shared subtree) fails
//! the import instead of looping.
//!
//! # Example
//!
//! ```
//! use cad_scene::{import_document, ImportOptions, ImportOutcome};
//! use cad_types::{FaceData, GeometrySource, MeshData, Scene};
//!
//! let mut scene = Scene::new("assembly");
//! let plate = scene.add_mesh(MeshData::new("plate").with_face(FaceData::new(
//!     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
//!     vec![[0, 1, 2], [0, 2, 3]],
//! )));
//! let root = scene.root();
//! scene.add_mesh_node(root, "plate", vec![plate]);
//!
//! let ImportOutcome::Success { root, meshes } = import_document(&scene, ImportOptions::default())
//! else {
//!     panic!("import failed");
//! };
//! assert_eq!(root.children[0].mesh_indices, vec![0]);
//! assert_eq!(meshes[0].indices, vec![0, 1, 2, 0, 2, 3]);
//! ```
//!
//! # Host boundary
//!
//! Outcomes serialize with serde into the JSON object renderers expect;
//! failures serialize as exactly `{"success": false}`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]

mod assemble;
mod error;
mod export;
mod flatten;
mod hierarchy;
mod output;
mod walk;

pub use assemble::{
    GltfOutcome, ImportOptions, ImportOutcome, import_document, read_brep_file, read_file,
    read_file_by_name, read_file_gltf, read_iges_file, read_step_file, read_step_file_gltf,
};
pub use error::{ExportError, ExportResult, ImportError, SceneError, SceneResult};
pub use export::{ExportConfig, ExportedFiles, GltfExporter, NameFormat, TransformFormat};
pub use flatten::{MeshArray, flatten_mesh};
pub use hierarchy::{TessellationStats, force_tessellation, serialize_hierarchy};
pub use output::{FaceRange, OutputMesh, OutputNode};

// Re-export the loader surface so callers need one dependency.
pub use cad_io::{CadFormat, ImportParams, LinearDeflectionType, LinearUnit};
