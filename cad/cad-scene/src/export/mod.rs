//! glTF 2.0 export of whole documents.
//!
//! The exporter flattens the document the same way the JSON result does,
//! encodes every mesh into little-endian buffers (in parallel when enabled),
//! and writes either:
//!
//! - **binary**: a single `<stem>.glb`
//! - **text, embedded**: a single `<stem>.gltf` with a base64 data URI
//! - **text, external**: `<stem>.gltf` plus `<stem>.bin`
//!
//! Node placements and names follow [`ExportConfig`]. Every distinct face
//! color becomes one material; faces of a mesh sharing a color share a
//! primitive.

mod config;
mod document;
mod encode;

pub use config::{ExportConfig, NameFormat, TransformFormat};

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cad_types::GeometrySource;
use gltf::binary::{Glb, Header};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{ExportError, ExportResult, contain_panics};
use document::{build_root, collect_scene};
use encode::{EncodedMesh, encode_mesh};

/// Files produced by an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    /// The `.glb` or `.gltf` file.
    pub primary: PathBuf,
    /// The `.bin` payload, when written separately.
    pub auxiliary: Option<PathBuf>,
}

/// Writes documents as glTF 2.0.
///
/// # Example
///
/// ```no_run
/// use cad_scene::{ExportConfig, GltfExporter};
/// use cad_types::Scene;
///
/// let scene = Scene::new("empty");
/// let exporter = GltfExporter::new("out/model", true).with_config(ExportConfig::default());
/// let files = exporter.export(&scene).unwrap();
/// assert!(files.primary.ends_with("model.glb"));
/// ```
#[derive(Debug, Clone)]
pub struct GltfExporter {
    stem: PathBuf,
    binary: bool,
    config: ExportConfig,
}

fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(stem.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

fn write_file(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> ExportResult<()>,
) -> ExportResult<()> {
    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush().map_err(io_error)
}

impl GltfExporter {
    /// Create an exporter writing next to `stem`.
    ///
    /// The extension is appended to `stem`, so `out/model.v2` becomes
    /// `out/model.v2.glb`.
    #[must_use]
    pub fn new(stem: impl Into<PathBuf>, binary: bool) -> Self {
        Self {
            stem: stem.into(),
            binary,
            config: ExportConfig::default(),
        }
    }

    /// Replace the writer options.
    #[must_use]
    pub const fn with_config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }

    /// Writer options.
    #[must_use]
    pub const fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Returns `true` for `.glb` output.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        self.binary
    }

    /// Path of the `.glb` or `.gltf` file.
    #[must_use]
    pub fn primary_path(&self) -> PathBuf {
        with_suffix(&self.stem, if self.binary { ".glb" } else { ".gltf" })
    }

    /// Path of the `.bin` file, if this configuration writes one.
    ///
    /// A document without geometry writes no payload even then.
    #[must_use]
    pub fn auxiliary_path(&self) -> Option<PathBuf> {
        (!self.binary && !self.config.embed_buffers).then(|| with_suffix(&self.stem, ".bin"))
    }

    /// Export a document.
    ///
    /// Panics raised while exporting are contained and reported as
    /// [`ExportError::Panicked`]. On failure, any file at the output paths
    /// is removed so a stale export is never mistaken for this one.
    ///
    /// # Errors
    ///
    /// Returns an error if the document tree is malformed, the payload is
    /// too large for glTF, or a file cannot be written.
    pub fn export<D: GeometrySource>(&self, source: &D) -> ExportResult<ExportedFiles> {
        let start = Instant::now();
        let result = contain_panics(
            || self.write(source),
            |message| ExportError::Panicked { message },
        );

        match &result {
            Ok(files) => info!(
                path = %files.primary.display(),
                binary = self.binary,
                elapsed_ms = start.elapsed().as_millis(),
                "Exported glTF"
            ),
            Err(_) => {
                let _ = fs::remove_file(self.primary_path());
                if let Some(path) = self.auxiliary_path() {
                    let _ = fs::remove_file(path);
                }
            }
        }
        result
    }

    fn write<D: GeometrySource>(&self, source: &D) -> ExportResult<ExportedFiles> {
        let scene = collect_scene(source, &self.config)?;

        let force_uv = self.config.force_uv;
        let encoded: Vec<EncodedMesh> = if self.config.parallel {
            scene
                .meshes
                .as_slice()
                .par_iter()
                .map(|mesh| encode_mesh(mesh, force_uv))
                .collect()
        } else {
            scene
                .meshes
                .as_slice()
                .iter()
                .map(|mesh| encode_mesh(mesh, force_uv))
                .collect()
        };

        let payload: Vec<u8> = encoded.iter().flat_map(|m| m.bytes.iter().copied()).collect();
        if u32::try_from(payload.len()).is_err() {
            return Err(ExportError::BufferTooLarge {
                bytes: payload.len(),
            });
        }
        debug!(
            nodes = scene.nodes.len(),
            meshes = encoded.len(),
            bytes = payload.len(),
            "Encoded glTF payload"
        );

        let primary = self.primary_path();
        let auxiliary = self.auxiliary_path().filter(|_| !payload.is_empty());
        let uri = if self.binary || payload.is_empty() {
            None
        } else if let Some(path) = &auxiliary {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        } else {
            Some(format!(
                "data:application/octet-stream;base64,{}",
                STANDARD.encode(&payload)
            ))
        };

        let root = build_root(&scene, &encoded, payload.len(), uri, &self.config)?;
        let json = gltf::json::serialize::to_vec(&root)?;

        if self.binary {
            let mut length = 12 + 8 + json.len().next_multiple_of(4);
            if !payload.is_empty() {
                length += 8 + payload.len().next_multiple_of(4);
            }
            let length = u32::try_from(length)
                .map_err(|_| ExportError::BufferTooLarge { bytes: length })?;
            let bin = (!payload.is_empty()).then(|| payload.into());
            let glb = Glb {
                header: Header {
                    magic: *b"glTF",
                    version: 2,
                    length,
                },
                json: json.into(),
                bin,
            };
            let bytes = glb.to_vec().map_err(|e| ExportError::Glb {
                message: e.to_string(),
            })?;
            write_file(&primary, |w| {
                w.write_all(&bytes).map_err(|source| ExportError::Io {
                    path: primary.clone(),
                    source,
                })
            })?;
        } else {
            write_file(&primary, |w| {
                w.write_all(&json).map_err(|source| ExportError::Io {
                    path: primary.clone(),
                    source,
                })
            })?;
            if let Some(path) = &auxiliary {
                write_file(path, |w| {
                    w.write_all(&payload).map_err(|source| ExportError::Io {
                        path: path.clone(),
                        source,
                    })
                })?;
            }
        }

        Ok(ExportedFiles { primary, auxiliary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_append_extensions() {
        let glb = GltfExporter::new("out/model.v2", true);
        assert_eq!(glb.primary_path(), PathBuf::from("out/model.v2.glb"));
        assert_eq!(glb.auxiliary_path(), None);

        let embedded = GltfExporter::new("out/model", false);
        assert_eq!(embedded.primary_path(), PathBuf::from("out/model.gltf"));
        assert_eq!(embedded.auxiliary_path(), None);

        let external = GltfExporter::new("out/model", false)
            .with_config(ExportConfig::default().with_embed_buffers(false));
        assert_eq!(external.auxiliary_path(), Some(PathBuf::from("out/model.bin")));
    }
}
