//! Native truck B-rep support.
//!
//! A B-rep file is the JSON serialization of a truck `CompressedSolid`, or
//! of a single `CompressedShell`, as written by `serde_json` from truck's
//! modeling types. Each boundary shell becomes one mesh node.

use tracing::debug;
use truck_meshalgo::prelude::*;
use truck_modeling::{Curve, Point3, Surface};

use crate::document::CadDocument;
use crate::error::{LoadError, LoadResult};
use crate::params::ImportParams;
use crate::CadFormat;

type CompressedShell = truck_topology::compress::CompressedShell<Point3, Curve, Surface>;
type CompressedSolid = truck_topology::compress::CompressedSolid<Point3, Curve, Surface>;

/// Decode a truck B-rep JSON document held in memory.
///
/// # Errors
///
/// Returns an error if the bytes are neither a serialized solid nor a
/// serialized shell, or if the solid has no boundary shells.
///
/// # Example
///
/// ```no_run
/// use cad_io::{load_brep, ImportParams};
///
/// let bytes = std::fs::read("part.json").unwrap();
/// let document = load_brep(&bytes, &ImportParams::default()).unwrap();
/// ```
pub fn load_brep(bytes: &[u8], params: &ImportParams) -> LoadResult<CadDocument> {
    let shells: Vec<CompressedShell> = match serde_json::from_slice::<CompressedSolid>(bytes) {
        Ok(solid) => solid.boundaries,
        Err(solid_err) => match serde_json::from_slice::<CompressedShell>(bytes) {
            Ok(shell) => vec![shell],
            Err(_) => return Err(LoadError::Json(solid_err)),
        },
    };

    if shells.is_empty() {
        return Err(LoadError::EmptyDocument);
    }

    let mut document = CadDocument::new(CadFormat::Brep, *params);
    for (index, shell) in shells.into_iter().enumerate() {
        document.push_shell(
            format!("shell {index}"),
            Box::new(move |tolerance| shell.robust_triangulation(tolerance)),
        );
    }

    debug!(shells = document.mesh_count(), "Decoded B-rep document");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_json_is_rejected() {
        let result = load_brep(b"{ not json", &ImportParams::default());
        assert!(matches!(result, Err(LoadError::Json(_))));
    }

    #[test]
    fn solid_without_shells_is_empty() {
        let result = load_brep(br#"{"boundaries": []}"#, &ImportParams::default());
        assert!(matches!(result, Err(LoadError::EmptyDocument)));
    }
}
