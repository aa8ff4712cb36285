//! STEP (Standard for the Exchange of Product Data) format support.
//!
//! STEP is an ISO standard (ISO 10303) for CAD data exchange, widely used in
//! manufacturing, aerospace, and automotive industries.
//!
//! Files are parsed with ruststep and converted to B-rep shells through the
//! truck CAD kernel. Every shell becomes one mesh node; shells are ordered by
//! their STEP entity id so the document layout is stable across runs.
//!
//! # Limitations
//!
//! - Assembly structure and product names are not read; the tree is flat
//! - Colors and layers are not read
//! - Shells that fail to convert are skipped with a warning

use tracing::{debug, warn};
use truck_meshalgo::prelude::*;
use truck_stepio::r#in::Table;

use crate::document::CadDocument;
use crate::error::{LoadError, LoadResult};
use crate::params::ImportParams;
use crate::CadFormat;

/// Decode a STEP file held in memory.
///
/// # Errors
///
/// Returns an error if:
/// - The bytes are not UTF-8
/// - The STEP file is invalid or has no data section
/// - No shell could be converted
///
/// # Example
///
/// ```no_run
/// use cad_io::{load_step, ImportParams};
///
/// let bytes = std::fs::read("model.step").unwrap();
/// let document = load_step(&bytes, &ImportParams::default()).unwrap();
/// println!("{} shells", document.mesh_count());
/// ```
pub fn load_step(bytes: &[u8], params: &ImportParams) -> LoadResult<CadDocument> {
    let step_string = std::str::from_utf8(bytes)?;

    // Parse STEP file using ruststep
    let exchange = truck_stepio::r#in::ruststep::parser::parse(step_string)
        .map_err(|e| LoadError::invalid_content(format!("failed to parse STEP file: {e}")))?;

    let Some(data) = exchange.data.first() else {
        return Err(LoadError::invalid_content(
            "STEP file contains no data sections",
        ));
    };

    // Convert parsed data to truck Table structure
    let table = Table::from_data_section(data);

    let mut shell_ids: Vec<u64> = table.shell.keys().copied().collect();
    shell_ids.sort_unstable();

    let mut document = CadDocument::new(CadFormat::Step, *params);
    for id in shell_ids {
        let Some(shell_holder) = table.shell.get(&id) else {
            continue;
        };
        let Ok(compressed_shell) = table.to_compressed_shell(shell_holder) else {
            warn!(shell = id, "Skipping STEP shell that failed to convert");
            continue;
        };
        document.push_shell(
            format!("shell #{id}"),
            Box::new(move |tolerance| compressed_shell.robust_triangulation(tolerance)),
        );
    }

    if document.mesh_count() == 0 {
        return Err(LoadError::EmptyDocument);
    }

    debug!(shells = document.mesh_count(), "Decoded STEP file");
    Ok(document)
}
