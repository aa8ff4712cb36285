//! Entry points: load, optionally pre-tessellate, serialize, package.
//!
//! Every entry point returns a tagged outcome and never an error: failures
//! are logged with their reason and serialize as `{"success": false}`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use cad_io::{CadDocument, CadFormat, ImportParams, LoadResult, load_document};
use cad_types::GeometrySource;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ExportError, ImportError, contain_panics};
use crate::export::{ExportConfig, ExportedFiles, GltfExporter};
use crate::flatten::MeshArray;
use crate::hierarchy::{force_tessellation, serialize_hierarchy};
use crate::output::{OutputMesh, OutputNode};

/// Options of the node/mesh import path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Walk every face once before serializing, so tessellation happens in
    /// a separate pass.
    pub force_tessellation: bool,
}

impl ImportOptions {
    /// Enable or disable the forced-tessellation pass.
    #[must_use]
    pub const fn with_force_tessellation(mut self, force: bool) -> Self {
        self.force_tessellation = force;
        self
    }
}

/// Result of an import.
#[derive(Debug)]
pub enum ImportOutcome {
    /// The document was flattened.
    Success {
        /// Output tree mirroring the document.
        root: OutputNode,
        /// Flattened meshes, indexed by the tree's mesh indices.
        meshes: Vec<OutputMesh>,
    },
    /// The import failed; the reason is kept for logging only.
    Failure(ImportError),
}

impl ImportOutcome {
    /// Returns `true` for [`ImportOutcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Failure reason, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&ImportError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(error) => Some(error),
        }
    }
}

impl Serialize for ImportOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success { root, meshes } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("root", root)?;
                map.serialize_entry("meshes", meshes)?;
                map.end()
            }
            Self::Failure(_) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("success", &false)?;
                map.end()
            }
        }
    }
}

/// Result of a glTF export.
#[derive(Debug)]
pub enum GltfOutcome {
    /// The files were written.
    Success(ExportedFiles),
    /// The export failed; no output is reported.
    Failure(ExportError),
}

impl GltfOutcome {
    /// Returns `true` for [`GltfOutcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Failure reason, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&ExportError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }
}

impl Serialize for GltfOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success(files) => {
                let entries = if files.auxiliary.is_some() { 3 } else { 2 };
                let mut map = serializer.serialize_map(Some(entries))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("outputPrimaryFile", &files.primary)?;
                if let Some(auxiliary) = &files.auxiliary {
                    map.serialize_entry("outputAuxiliaryFile", auxiliary)?;
                }
                map.end()
            }
            Self::Failure(_) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("success", &false)?;
                map.end()
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> u128 {
    start.elapsed().as_millis()
}

fn try_import<D: GeometrySource>(
    source: &D,
    options: ImportOptions,
) -> Result<(OutputNode, MeshArray), ImportError> {
    if options.force_tessellation {
        let start = Instant::now();
        let stats = force_tessellation(source)?;
        info!(
            meshes = stats.meshes,
            triangles = stats.triangles,
            elapsed_ms = elapsed_ms(start),
            "Tessellated document"
        );
    }

    let start = Instant::now();
    let mut meshes = MeshArray::new();
    let root = serialize_hierarchy(source, &mut meshes)?;
    info!(
        nodes = root.node_count(),
        meshes = meshes.len(),
        elapsed_ms = elapsed_ms(start),
        "Serialized document"
    );
    Ok((root, meshes))
}

/// Flatten an already loaded document.
///
/// # Example
///
/// ```
/// use cad_scene::{import_document, ImportOptions};
/// use cad_types::Scene;
///
/// let outcome = import_document(&Scene::new("root"), ImportOptions::default());
/// let json = serde_json::to_value(&outcome).unwrap();
/// assert_eq!(json["success"], true);
/// assert_eq!(json["root"]["children"], serde_json::json!([]));
/// ```
pub fn import_document<D: GeometrySource>(source: &D, options: ImportOptions) -> ImportOutcome {
    let result = contain_panics(
        || try_import(source, options),
        |message| ImportError::Panicked { message },
    );
    match result {
        Ok((root, meshes)) => ImportOutcome::Success {
            root,
            meshes: meshes.into_vec(),
        },
        Err(error) => {
            warn!(%error, "Import failed");
            ImportOutcome::Failure(error)
        }
    }
}

fn load(format: CadFormat, bytes: &[u8], params: &ImportParams) -> LoadResult<CadDocument> {
    let start = Instant::now();
    let document = load_document(format, bytes, params)?;
    info!(
        %format,
        bytes = bytes.len(),
        meshes = document.mesh_count(),
        elapsed_ms = elapsed_ms(start),
        "Loaded document"
    );
    Ok(document)
}

/// Decode a CAD file held in memory and flatten it.
pub fn read_file(
    format: CadFormat,
    bytes: &[u8],
    params: &ImportParams,
    options: ImportOptions,
) -> ImportOutcome {
    let loaded = contain_panics(
        || load(format, bytes, params).map_err(ImportError::from),
        |message| ImportError::Panicked { message },
    );
    match loaded {
        Ok(document) => import_document(&document, options),
        Err(error) => {
            warn!(%format, %error, "Load failed");
            ImportOutcome::Failure(error)
        }
    }
}

/// Host-boundary entry point: format by name, parameters as JSON.
///
/// Unknown format names fail; unknown or malformed parameters fall back to
/// their defaults.
///
/// # Example
///
/// ```
/// use cad_scene::{read_file_by_name, ImportOptions};
///
/// let outcome = read_file_by_name("obj", b"", &serde_json::Value::Null, ImportOptions::default());
/// assert_eq!(serde_json::to_string(&outcome).unwrap(), r#"{"success":false}"#);
/// ```
pub fn read_file_by_name(
    format: &str,
    bytes: &[u8],
    params: &Value,
    options: ImportOptions,
) -> ImportOutcome {
    let Some(format) = CadFormat::from_name(format) else {
        let error = ImportError::UnknownFormat {
            name: format.to_string(),
        };
        warn!(%error, "Import failed");
        return ImportOutcome::Failure(error);
    };
    read_file(format, bytes, &ImportParams::from_json(params), options)
}

/// Decode and flatten a STEP file.
pub fn read_step_file(bytes: &[u8], params: &ImportParams) -> ImportOutcome {
    read_file(CadFormat::Step, bytes, params, ImportOptions::default())
}

/// Decode and flatten an IGES file.
pub fn read_iges_file(bytes: &[u8], params: &ImportParams) -> ImportOutcome {
    read_file(CadFormat::Iges, bytes, params, ImportOptions::default())
}

/// Decode and flatten a serialized B-rep.
pub fn read_brep_file(bytes: &[u8], params: &ImportParams) -> ImportOutcome {
    read_file(CadFormat::Brep, bytes, params, ImportOptions::default())
}

fn try_export(
    format: CadFormat,
    bytes: &[u8],
    params: &ImportParams,
    exporter: &GltfExporter,
) -> Result<ExportedFiles, ExportError> {
    let document = load(format, bytes, params)?;

    let start = Instant::now();
    let stats = force_tessellation(&document)?;
    info!(
        meshes = stats.meshes,
        triangles = stats.triangles,
        elapsed_ms = elapsed_ms(start),
        "Tessellated document"
    );

    exporter.export(&document)
}

/// Decode a CAD file and write it as glTF.
///
/// The document is fully tessellated before the writer runs.
pub fn read_file_gltf(
    format: CadFormat,
    bytes: &[u8],
    params: &ImportParams,
    exporter: &GltfExporter,
) -> GltfOutcome {
    let result = contain_panics(
        || try_export(format, bytes, params, exporter),
        |message| ExportError::Panicked { message },
    );
    match result {
        Ok(files) => GltfOutcome::Success(files),
        Err(error) => {
            warn!(%format, %error, "glTF export failed");
            GltfOutcome::Failure(error)
        }
    }
}

/// Decode a STEP file and write `<output_stem>.gltf` plus
/// `<output_stem>.bin`.
pub fn read_step_file_gltf(
    bytes: &[u8],
    output_stem: &Path,
    params: &ImportParams,
) -> GltfOutcome {
    let exporter = GltfExporter::new(PathBuf::from(output_stem), false)
        .with_config(ExportConfig::default().with_embed_buffers(false));
    read_file_gltf(CadFormat::Step, bytes, params, &exporter)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cad_types::{FaceData, MeshData, MeshId, Scene};
    use serde_json::json;

    #[test]
    fn failure_serializes_to_success_false_only() {
        let outcome = read_step_file(b"definitely not step", &ImportParams::default());
        assert!(!outcome.is_success());
        assert_eq!(serde_json::to_value(&outcome).unwrap(), json!({ "success": false }));
    }

    #[test]
    fn iges_fails_cleanly() {
        let outcome = read_iges_file(b"", &ImportParams::default());
        assert!(matches!(
            outcome.error(),
            Some(ImportError::Load(cad_io::LoadError::UnsupportedFormat { .. }))
        ));
    }

    #[test]
    fn unknown_format_name_fails() {
        let outcome = read_file_by_name("dwg", b"", &Value::Null, ImportOptions::default());
        assert!(matches!(
            outcome.error(),
            Some(ImportError::UnknownFormat { name }) if name == "dwg"
        ));
    }

    #[test]
    fn malformed_tree_fails() {
        let mut scene = Scene::new("root");
        let root = scene.root();
        scene.add_mesh_node(root, "broken", vec![MeshId(3)]);

        let outcome = import_document(&scene, ImportOptions::default());
        assert!(matches!(outcome.error(), Some(ImportError::Scene(_))));
        assert_eq!(serde_json::to_value(&outcome).unwrap(), json!({ "success": false }));
    }

    #[test]
    fn success_carries_root_and_meshes() {
        let mut scene = Scene::new("root");
        let mesh = scene.add_mesh(MeshData::new("tri").with_face(FaceData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2]],
        )));
        let root = scene.root();
        scene.add_mesh_node(root, "tri", vec![mesh]);

        let options = ImportOptions::default().with_force_tessellation(true);
        let value = serde_json::to_value(import_document(&scene, options)).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["root"]["children"][0]["meshes"], json!([0]));
        assert_eq!(value["meshes"][0]["index"]["array"], json!([0, 1, 2]));
    }

    #[test]
    fn gltf_outcome_shapes() {
        let files = ExportedFiles {
            primary: PathBuf::from("out.gltf"),
            auxiliary: Some(PathBuf::from("out.bin")),
        };
        assert_eq!(
            serde_json::to_value(GltfOutcome::Success(files)).unwrap(),
            json!({ "success": true, "outputPrimaryFile": "out.gltf", "outputAuxiliaryFile": "out.bin" })
        );

        let single = ExportedFiles {
            primary: PathBuf::from("out.glb"),
            auxiliary: None,
        };
        assert_eq!(
            serde_json::to_value(GltfOutcome::Success(single)).unwrap(),
            json!({ "success": true, "outputPrimaryFile": "out.glb" })
        );

        let failed = GltfOutcome::Failure(ExportError::Panicked {
            message: String::new(),
        });
        assert_eq!(serde_json::to_value(failed).unwrap(), json!({ "success": false }));
    }
}
