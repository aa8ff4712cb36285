//! Error types for flattening and export.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use cad_io::LoadError;
use cad_types::{MeshId, NodeId};
use thiserror::Error;

/// Result type for traversal and flattening.
pub type SceneResult<T> = Result<T, SceneError>;

/// Result type for glTF export.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors detected while walking a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// A node was reached twice: the tree has a cycle or a shared subtree.
    #[error("{node} is reachable more than once; the document tree is not a tree")]
    Cycle {
        /// The node reached again.
        node: NodeId,
    },

    /// A child link points outside the node arena.
    #[error("{node} is referenced but does not exist")]
    MissingNode {
        /// The dangling id.
        node: NodeId,
    },

    /// A node references a mesh the document does not hold.
    #[error("{mesh} referenced by {node} does not exist")]
    MissingMesh {
        /// The node holding the reference.
        node: NodeId,
        /// The dangling mesh id.
        mesh: MeshId,
    },

    /// A count no longer fits a `u32` index.
    #[error("{what} count exceeds the u32 index range")]
    IndexOverflow {
        /// What overflowed (vertex, normal, triangle, mesh).
        what: &'static str,
    },
}

/// Errors of the node/mesh import entry points.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The format name is not one of `step`, `iges`, `brep`.
    #[error("unknown format name: {name}")]
    UnknownFormat {
        /// The unrecognized name.
        name: String,
    },

    /// The geometry source could not decode the input.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The document tree could not be flattened.
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// The geometry kernel panicked; the panic was contained.
    #[error("import panicked: {message}")]
    Panicked {
        /// Panic payload, when it was a string.
        message: String,
    },
}

/// Errors of the glTF export path.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The geometry source could not decode the input.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The document tree could not be flattened.
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// Writing an output file failed.
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// The path being written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization of the glTF document failed.
    #[error("glTF JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The binary payload does not fit the glTF size limits.
    #[error("binary payload of {bytes} bytes exceeds the glTF size limit")]
    BufferTooLarge {
        /// Payload size in bytes.
        bytes: usize,
    },

    /// Assembling the GLB container failed.
    #[error("GLB assembly failed: {message}")]
    Glb {
        /// Error message.
        message: String,
    },

    /// The writer panicked; the panic was contained.
    #[error("glTF writer panicked: {message}")]
    Panicked {
        /// Panic payload, when it was a string.
        message: String,
    },
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Run `work`, turning a panic into the error built by `panicked`.
///
/// Kernel tessellation runs lazily inside the walk, so a malformed shell can
/// panic anywhere below an entry point.
pub(crate) fn contain_panics<T, E>(
    work: impl FnOnce() -> Result<T, E>,
    panicked: impl FnOnce(String) -> E,
) -> Result<T, E> {
    panic::catch_unwind(AssertUnwindSafe(work))
        .unwrap_or_else(|payload| Err(panicked(panic_message(payload.as_ref()))))
}
