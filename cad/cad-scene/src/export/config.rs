//! glTF writer options.

/// How node placements are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TransformFormat {
    /// Translation and rotation, omitting whichever is identity.
    #[default]
    Compact,
    /// A column-major 4x4 matrix.
    Mat4,
    /// Translation and rotation, both always written.
    Trs,
}

impl TransformFormat {
    /// Parse a format name (`"compact"`, `"mat4"`, `"trs"`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "compact" => Some(Self::Compact),
            "mat4" => Some(Self::Mat4),
            "trs" => Some(Self::Trs),
            _ => None,
        }
    }
}

/// How glTF node names are derived from document names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NameFormat {
    /// The product (part or assembly) name.
    Product,
    /// The instance name, falling back to the product name.
    Instance,
    /// `instance [product]`, collapsing to one name when they agree.
    #[default]
    ProductAndInstance,
}

impl NameFormat {
    /// Parse a format name (`"product"`, `"instance"`,
    /// `"product_and_instance"`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "product" => Some(Self::Product),
            "instance" => Some(Self::Instance),
            "product_and_instance" => Some(Self::ProductAndInstance),
            _ => None,
        }
    }

    /// Format a node name.
    ///
    /// # Example
    ///
    /// ```
    /// use cad_scene::NameFormat;
    ///
    /// let format = NameFormat::ProductAndInstance;
    /// assert_eq!(format.format("bolt", Some("bolt:1")), "bolt:1 [bolt]");
    /// assert_eq!(format.format("bolt", None), "bolt");
    /// ```
    #[must_use]
    pub fn format(self, product: &str, instance: Option<&str>) -> String {
        match (self, instance) {
            (Self::Product, _) | (_, None) => product.to_string(),
            (Self::Instance, Some(instance)) => instance.to_string(),
            (Self::ProductAndInstance, Some(instance)) => {
                if product.is_empty() || product == instance {
                    instance.to_string()
                } else {
                    format!("{instance} [{product}]")
                }
            }
        }
    }
}

/// Options for [`GltfExporter`](crate::GltfExporter).
///
/// # Example
///
/// ```
/// use cad_scene::{ExportConfig, TransformFormat};
///
/// let config = ExportConfig::default()
///     .with_transform_format(TransformFormat::Mat4)
///     .with_embed_buffers(false);
/// assert!(config.force_uv);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportConfig {
    /// How placements are written.
    pub transform_format: TransformFormat,
    /// Write a `TEXCOORD_0` attribute (all zeros) for every mesh.
    pub force_uv: bool,
    /// How node names are built.
    pub node_name_format: NameFormat,
    /// In `.gltf` output, embed the binary payload as a data URI instead of
    /// writing a `.bin` file. `.glb` output always embeds.
    pub embed_buffers: bool,
    /// Encode meshes on the rayon thread pool.
    pub parallel: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            transform_format: TransformFormat::Compact,
            force_uv: true,
            node_name_format: NameFormat::ProductAndInstance,
            embed_buffers: true,
            parallel: true,
        }
    }
}

impl ExportConfig {
    /// Set the placement format.
    #[must_use]
    pub const fn with_transform_format(mut self, format: TransformFormat) -> Self {
        self.transform_format = format;
        self
    }

    /// Enable or disable the forced `TEXCOORD_0` attribute.
    #[must_use]
    pub const fn with_force_uv(mut self, force: bool) -> Self {
        self.force_uv = force;
        self
    }

    /// Set the node naming format.
    #[must_use]
    pub const fn with_node_name_format(mut self, format: NameFormat) -> Self {
        self.node_name_format = format;
        self
    }

    /// Enable or disable embedding the payload in `.gltf` output.
    #[must_use]
    pub const fn with_embed_buffers(mut self, embed: bool) -> Self {
        self.embed_buffers = embed;
        self
    }

    /// Enable or disable parallel mesh encoding.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
