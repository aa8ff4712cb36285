//! RGB colors attached to meshes and B-rep faces.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// RGB color with floating point components in the `[0, 1]` range.
///
/// CAD kernels report shape and face styles as normalized floats, so the
/// components are stored unquantized and written out unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "[f64; 3]", into = "[f64; 3]"))]
pub struct Color {
    /// Red component.
    pub r: f64,
    /// Green component.
    pub g: f64,
    /// Blue component.
    pub b: f64,
}

impl Color {
    /// Create a new color from normalized components.
    ///
    /// Values are stored as given; see [`Color::clamped`] to force the
    /// valid range.
    ///
    /// # Example
    ///
    /// ```
    /// use cad_types::Color;
    ///
    /// let orange = Color::new(1.0, 0.5, 0.0);
    /// assert_eq!(orange.to_array(), [1.0, 0.5, 0.0]);
    /// ```
    #[inline]
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Create a color from 8-bit components.
    ///
    /// # Example
    ///
    /// ```
    /// use cad_types::Color;
    ///
    /// let red = Color::from_u8(255, 0, 0);
    /// assert_eq!(red, Color::RED);
    /// ```
    #[inline]
    #[must_use]
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: f64::from(r) / 255.0,
            g: f64::from(g) / 255.0,
            b: f64::from(b) / 255.0,
        }
    }

    /// Return a copy with every component clamped to `[0, 1]`.
    #[inline]
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }

    /// Components as an `[r, g, b]` array.
    #[inline]
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }

    /// Black color (0, 0, 0).
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    /// White color (1, 1, 1).
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    /// Red color (1, 0, 0).
    pub const RED: Self = Self::new(1.0, 0.0, 0.0);

    /// Green color (0, 1, 0).
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0);

    /// Blue color (0, 0, 1).
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0);
}

impl From<[f64; 3]> for Color {
    fn from([r, g, b]: [f64; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Color> for [f64; 3] {
    fn from(color: Color) -> Self {
        color.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn from_u8_normalizes() {
        let c = Color::from_u8(255, 51, 0);
        assert_relative_eq!(c.r, 1.0);
        assert_relative_eq!(c.g, 0.2);
        assert_relative_eq!(c.b, 0.0);
    }

    #[test]
    fn clamped_limits_components() {
        let c = Color::new(1.5, -0.25, 0.5).clamped();
        assert_eq!(c.to_array(), [1.0, 0.0, 0.5]);
    }

    #[test]
    fn array_conversions() {
        let c: Color = [0.1, 0.2, 0.3].into();
        let back: [f64; 3] = c.into();
        assert_eq!(back, [0.1, 0.2, 0.3]);
    }
}
