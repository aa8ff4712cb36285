//! Core CAD scene types.
//!
//! This crate provides the data model shared by CAD loaders and the scene
//! flattener:
//!
//! - [`SceneNode`] - A named node of a document tree, addressed by [`NodeId`]
//! - [`Color`] - Normalized RGB color of a mesh or face
//! - [`GeometrySource`], [`SourceMesh`], [`SourceFace`] - What a decoded
//!   document must expose for its meshes to be flattened
//! - [`Scene`] - An in-memory document with materialized faces
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with no kernel dependencies. Loaders in
//! `cad-io` implement [`GeometrySource`] on top of a CAD kernel; the
//! flattener in `cad-scene` only sees these traits.
//!
//! # Units
//!
//! Coordinates are `f64` in whatever linear unit the loader was asked for.
//!
//! # Example
//!
//! ```
//! use cad_types::{Color, FaceData, GeometrySource, MeshData, Scene, SourceMesh};
//!
//! let mut scene = Scene::new("root");
//! let mesh = scene.add_mesh(
//!     MeshData::new("plate")
//!         .with_color(Color::BLUE)
//!         .with_face(FaceData::new(
//!             vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
//!             vec![[0, 1, 2]],
//!         )),
//! );
//! let root = scene.root();
//! scene.add_mesh_node(root, "plate", vec![mesh]);
//!
//! let plate = scene.mesh(mesh).unwrap();
//! assert_eq!(plate.faces().count(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod color;
mod face;
mod node;
mod scene;
mod source;

pub use color::Color;
pub use face::{FaceData, MeshData};
pub use node::{MeshId, NodeContent, NodeId, SceneNode};
pub use scene::Scene;
pub use source::{GeometrySource, SourceFace, SourceMesh};

// Re-export nalgebra types for convenience
pub use nalgebra::{Isometry3, Translation3, UnitQuaternion};
