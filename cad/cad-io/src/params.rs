//! Import configuration consumed by the loaders.

use serde_json::Value;

/// Target linear unit of loaded coordinates.
///
/// Kernel geometry is read in millimeters and scaled into this unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LinearUnit {
    /// Millimeters (no scaling).
    #[default]
    Millimeter,
    /// Centimeters.
    Centimeter,
    /// Meters.
    Meter,
    /// Inches.
    Inch,
    /// Feet.
    Foot,
}

impl LinearUnit {
    /// Parse a unit name as used in import configuration objects.
    ///
    /// # Example
    ///
    /// ```
    /// use cad_io::LinearUnit;
    ///
    /// assert_eq!(LinearUnit::from_name("inch"), Some(LinearUnit::Inch));
    /// assert_eq!(LinearUnit::from_name("furlong"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "millimeter" => Some(Self::Millimeter),
            "centimeter" => Some(Self::Centimeter),
            "meter" => Some(Self::Meter),
            "inch" => Some(Self::Inch),
            "foot" => Some(Self::Foot),
            _ => None,
        }
    }

    /// Canonical configuration name of the unit.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Millimeter => "millimeter",
            Self::Centimeter => "centimeter",
            Self::Meter => "meter",
            Self::Inch => "inch",
            Self::Foot => "foot",
        }
    }

    /// Length of one unit in millimeters.
    #[must_use]
    pub const fn millimeters(self) -> f64 {
        match self {
            Self::Millimeter => 1.0,
            Self::Centimeter => 10.0,
            Self::Meter => 1000.0,
            Self::Inch => 25.4,
            Self::Foot => 304.8,
        }
    }

    /// Factor converting a millimeter length into this unit.
    #[must_use]
    pub fn scale_from_millimeters(self) -> f64 {
        1.0 / self.millimeters()
    }
}

/// How the linear deflection value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LinearDeflectionType {
    /// Fraction of the shape's bounding box diagonal.
    #[default]
    BoundingBoxRatio,
    /// Absolute chordal tolerance in the target linear unit.
    AbsoluteValue,
}

impl LinearDeflectionType {
    /// Parse a deflection type name as used in import configuration objects.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bounding_box_ratio" => Some(Self::BoundingBoxRatio),
            "absolute_value" => Some(Self::AbsoluteValue),
            _ => None,
        }
    }

    /// Canonical configuration name of the deflection type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BoundingBoxRatio => "bounding_box_ratio",
            Self::AbsoluteValue => "absolute_value",
        }
    }
}

/// Parameters for decoding and tessellating a CAD file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportParams {
    /// Unit of output coordinates. Default: millimeter
    pub linear_unit: LinearUnit,

    /// Interpretation of `linear_deflection`. Default: bounding box ratio
    pub linear_deflection_type: LinearDeflectionType,

    /// Chordal deflection; a ratio or an absolute length depending on
    /// `linear_deflection_type`. Default: 0.001
    pub linear_deflection: f64,

    /// Angular deflection in radians. Default: 0.5
    ///
    /// The truck tessellator bounds only the chordal error, so this value is
    /// validated and carried but does not change truck output.
    pub angular_deflection: f64,
}

impl Default for ImportParams {
    fn default() -> Self {
        Self {
            linear_unit: LinearUnit::Millimeter,
            linear_deflection_type: LinearDeflectionType::BoundingBoxRatio,
            linear_deflection: 0.001,
            angular_deflection: 0.5,
        }
    }
}

impl ImportParams {
    /// Read parameters from a JSON configuration object.
    ///
    /// Recognized keys are `linearUnit`, `linearDeflectionType`,
    /// `linearDeflection` and `angularDeflection`. Absent keys, values of the
    /// wrong type, and unrecognized names keep their defaults. `null` or a
    /// non-object yields the defaults.
    ///
    /// # Example
    ///
    /// ```
    /// use cad_io::{ImportParams, LinearDeflectionType, LinearUnit};
    ///
    /// let params = ImportParams::from_json(&serde_json::json!({
    ///     "linearUnit": "meter",
    ///     "linearDeflectionType": "absolute_value",
    ///     "linearDeflection": 0.1,
    /// }));
    /// assert_eq!(params.linear_unit, LinearUnit::Meter);
    /// assert_eq!(params.linear_deflection_type, LinearDeflectionType::AbsoluteValue);
    /// assert!((params.angular_deflection - 0.5).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let mut params = Self::default();
        let Some(object) = value.as_object() else {
            return params;
        };

        if let Some(unit) = object
            .get("linearUnit")
            .and_then(Value::as_str)
            .and_then(LinearUnit::from_name)
        {
            params.linear_unit = unit;
        }
        if let Some(kind) = object
            .get("linearDeflectionType")
            .and_then(Value::as_str)
            .and_then(LinearDeflectionType::from_name)
        {
            params.linear_deflection_type = kind;
        }
        if let Some(deflection) = object.get("linearDeflection").and_then(Value::as_f64) {
            params.linear_deflection = deflection;
        }
        if let Some(deflection) = object.get("angularDeflection").and_then(Value::as_f64) {
            params.angular_deflection = deflection;
        }

        params
    }

    /// Set the target linear unit.
    #[must_use]
    pub const fn with_linear_unit(mut self, unit: LinearUnit) -> Self {
        self.linear_unit = unit;
        self
    }

    /// Use an absolute chordal tolerance in the target unit.
    #[must_use]
    pub const fn with_absolute_deflection(mut self, deflection: f64) -> Self {
        self.linear_deflection_type = LinearDeflectionType::AbsoluteValue;
        self.linear_deflection = deflection;
        self
    }

    /// Use a tolerance relative to the bounding box diagonal.
    #[must_use]
    pub const fn with_bounding_box_ratio(mut self, ratio: f64) -> Self {
        self.linear_deflection_type = LinearDeflectionType::BoundingBoxRatio;
        self.linear_deflection = ratio;
        self
    }

    /// Set the angular deflection in radians.
    #[must_use]
    pub const fn with_angular_deflection(mut self, radians: f64) -> Self {
        self.angular_deflection = radians;
        self
    }

    /// Chordal tolerance in millimeters for a shape whose bounding box
    /// diagonal measures `diameter_mm`.
    ///
    /// Returns `None` when the result is not a positive finite length.
    #[must_use]
    pub fn tolerance_mm(&self, diameter_mm: f64) -> Option<f64> {
        let tolerance = match self.linear_deflection_type {
            LinearDeflectionType::BoundingBoxRatio => diameter_mm * self.linear_deflection,
            LinearDeflectionType::AbsoluteValue => {
                self.linear_deflection * self.linear_unit.millimeters()
            }
        };
        (tolerance.is_finite() && tolerance > 0.0).then_some(tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn test_default_params() {
        let params = ImportParams::default();
        assert_eq!(params.linear_unit, LinearUnit::Millimeter);
        assert_eq!(
            params.linear_deflection_type,
            LinearDeflectionType::BoundingBoxRatio
        );
        assert_relative_eq!(params.linear_deflection, 0.001);
        assert_relative_eq!(params.angular_deflection, 0.5);
    }

    #[test]
    fn from_json_null_is_default() {
        assert_eq!(ImportParams::from_json(&Value::Null), ImportParams::default());
        assert_eq!(ImportParams::from_json(&json!(42)), ImportParams::default());
    }

    #[test]
    fn from_json_reads_every_key() {
        let params = ImportParams::from_json(&json!({
            "linearUnit": "foot",
            "linearDeflectionType": "absolute_value",
            "linearDeflection": 0.25,
            "angularDeflection": 0.1,
        }));
        assert_eq!(params.linear_unit, LinearUnit::Foot);
        assert_eq!(
            params.linear_deflection_type,
            LinearDeflectionType::AbsoluteValue
        );
        assert_relative_eq!(params.linear_deflection, 0.25);
        assert_relative_eq!(params.angular_deflection, 0.1);
    }

    #[test]
    fn from_json_unrecognized_values_keep_defaults() {
        let params = ImportParams::from_json(&json!({
            "linearUnit": "parsec",
            "linearDeflectionType": "vibes",
            "linearDeflection": "fine",
            "somethingElse": true,
        }));
        assert_eq!(params, ImportParams::default());
    }

    #[test]
    fn unit_names_round_trip() {
        for unit in [
            LinearUnit::Millimeter,
            LinearUnit::Centimeter,
            LinearUnit::Meter,
            LinearUnit::Inch,
            LinearUnit::Foot,
        ] {
            assert_eq!(LinearUnit::from_name(unit.name()), Some(unit));
        }
    }

    #[test]
    fn unit_scale() {
        assert_relative_eq!(LinearUnit::Meter.scale_from_millimeters(), 0.001);
        assert_relative_eq!(LinearUnit::Inch.scale_from_millimeters() * 25.4, 1.0);
    }

    #[test]
    fn tolerance_ratio_uses_diameter() {
        let params = ImportParams::default().with_bounding_box_ratio(0.01);
        assert_relative_eq!(params.tolerance_mm(200.0).unwrap_or(0.0), 2.0);
        assert_eq!(params.tolerance_mm(0.0), None);
    }

    #[test]
    fn tolerance_absolute_is_converted_to_millimeters() {
        let params = ImportParams::default()
            .with_linear_unit(LinearUnit::Centimeter)
            .with_absolute_deflection(0.05);
        assert_relative_eq!(params.tolerance_mm(1e6).unwrap_or(0.0), 0.5);
    }

    #[test]
    fn tolerance_rejects_non_positive() {
        let params = ImportParams::default().with_absolute_deflection(-1.0);
        assert_eq!(params.tolerance_mm(10.0), None);
    }
}
