//! CAD file loading for the scene flattener.
//!
//! This crate decodes CAD files into documents implementing
//! [`cad_types::GeometrySource`]:
//!
//! - **STEP** (ISO 10303-21) - parsed with ruststep, converted by truck
//! - **BREP** - truck's native serialized B-rep (JSON)
//! - **IGES** - recognized, but no pure Rust decoder is available; loading
//!   reports [`LoadError::UnsupportedFormat`]
//!
//! Tessellation is deferred: a shell is triangulated the first time its
//! faces are enumerated, using the tolerance policy of [`ImportParams`].
//!
//! # Example
//!
//! ```no_run
//! use cad_io::{load_document, CadFormat, ImportParams};
//!
//! let bytes = std::fs::read("model.step").unwrap();
//! let document = load_document(CadFormat::Step, &bytes, &ImportParams::default()).unwrap();
//! assert_eq!(document.format(), CadFormat::Step);
//! ```
//!
//! # Format Detection
//!
//! ```no_run
//! use cad_io::{load_path, ImportParams};
//!
//! // Format detected from .stp extension
//! let document = load_path("model.stp", None, &ImportParams::default()).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod brep;
mod document;
mod error;
mod params;
mod step;
mod tessellate;

pub use brep::load_brep;
pub use document::{CadDocument, KernelMesh};
pub use error::{LoadError, LoadResult};
pub use params::{ImportParams, LinearDeflectionType, LinearUnit};
pub use step::load_step;

use std::fmt;
use std::path::Path;

/// Supported CAD file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CadFormat {
    /// STEP (Standard for the Exchange of Product Data).
    Step,
    /// IGES (Initial Graphics Exchange Specification).
    Iges,
    /// Serialized truck B-rep.
    Brep,
}

impl CadFormat {
    /// Parse a format name (`"step"`, `"iges"`, `"brep"`).
    ///
    /// # Example
    ///
    /// ```
    /// use cad_io::CadFormat;
    ///
    /// assert_eq!(CadFormat::from_name("step"), Some(CadFormat::Step));
    /// assert_eq!(CadFormat::from_name("obj"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "step" => Some(Self::Step),
            "iges" => Some(Self::Iges),
            "brep" => Some(Self::Brep),
            _ => None,
        }
    }

    /// Detect format from file extension.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to check for extension
    ///
    /// # Returns
    ///
    /// The detected format, or `None` if the extension is not recognized.
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "step" | "stp" => Some(Self::Step),
            "iges" | "igs" => Some(Self::Iges),
            "brep" | "json" => Some(Self::Brep),
            _ => None,
        }
    }

    /// Canonical name of the format.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Step => "step",
            Self::Iges => "iges",
            Self::Brep => "brep",
        }
    }

    /// Get the canonical file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Step => "step",
            Self::Iges => "iges",
            Self::Brep => "json",
        }
    }
}

impl fmt::Display for CadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decode a CAD file held in memory.
///
/// # Errors
///
/// Returns an error if the bytes cannot be decoded as `format`, or if the
/// format has no decoder.
pub fn load_document(
    format: CadFormat,
    bytes: &[u8],
    params: &ImportParams,
) -> LoadResult<CadDocument> {
    match format {
        CadFormat::Step => load_step(bytes, params),
        CadFormat::Brep => load_brep(bytes, params),
        CadFormat::Iges => Err(LoadError::UnsupportedFormat {
            format: format.name(),
        }),
    }
}

/// Read and decode a CAD file, detecting format from extension unless
/// `format` is given.
///
/// # Errors
///
/// Returns an error if:
/// - The format cannot be determined from the extension
/// - The file cannot be read
/// - The file content is invalid for the format
pub fn load_path<P: AsRef<Path>>(
    path: P,
    format: Option<CadFormat>,
    params: &ImportParams,
) -> LoadResult<CadDocument> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => CadFormat::from_path(path).ok_or_else(|| LoadError::UnknownFormat {
            name: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("(none)")
                .to_string(),
        })?,
    };

    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LoadError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io(e)
        }
    })?;

    load_document(format, &bytes, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_name() {
        assert_eq!(CadFormat::from_name("step"), Some(CadFormat::Step));
        assert_eq!(CadFormat::from_name("iges"), Some(CadFormat::Iges));
        assert_eq!(CadFormat::from_name("brep"), Some(CadFormat::Brep));
        assert_eq!(CadFormat::from_name("STEP"), None);
        assert_eq!(CadFormat::from_name(""), None);
    }

    #[test]
    fn format_from_path_step() {
        assert_eq!(CadFormat::from_path("model.step"), Some(CadFormat::Step));
        assert_eq!(CadFormat::from_path("model.STP"), Some(CadFormat::Step));
        assert_eq!(
            CadFormat::from_path("/path/to/model.stp"),
            Some(CadFormat::Step)
        );
    }

    #[test]
    fn format_from_path_iges_and_brep() {
        assert_eq!(CadFormat::from_path("model.igs"), Some(CadFormat::Iges));
        assert_eq!(CadFormat::from_path("model.IGES"), Some(CadFormat::Iges));
        assert_eq!(CadFormat::from_path("part.brep"), Some(CadFormat::Brep));
        assert_eq!(CadFormat::from_path("part.json"), Some(CadFormat::Brep));
    }

    #[test]
    fn format_from_path_unknown() {
        assert_eq!(CadFormat::from_path("model.xyz"), None);
        assert_eq!(CadFormat::from_path("model"), None);
        assert_eq!(CadFormat::from_path(""), None);
    }

    #[test]
    fn format_names_round_trip() {
        for format in [CadFormat::Step, CadFormat::Iges, CadFormat::Brep] {
            assert_eq!(CadFormat::from_name(format.name()), Some(format));
            assert_eq!(format.to_string(), format.name());
        }
    }

    #[test]
    fn iges_is_unsupported() {
        let result = load_document(CadFormat::Iges, b"", &ImportParams::default());
        assert!(matches!(
            result,
            Err(LoadError::UnsupportedFormat { format: "iges" })
        ));
    }

    #[test]
    fn load_path_unknown_extension() {
        let result = load_path("model.xyz", None, &ImportParams::default());
        assert!(matches!(result, Err(LoadError::UnknownFormat { name }) if name == "xyz"));
    }

    #[test]
    fn load_path_missing_file() {
        let result = load_path("nonexistent_file_12345.step", None, &ImportParams::default());
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }
}
