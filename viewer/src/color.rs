//! RGB colors in the 0-1 range.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Serialized as an `[r, g, b]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Source cloud.
    pub const SOURCE: Color = Color::new(1.0, 0.2, 0.2);
    /// Target cloud.
    pub const TARGET: Color = Color::new(0.2, 0.2, 1.0);
    /// Candidate correspondences.
    pub const CORRESPONDENCE: Color = Color::new(0.2, 0.2, 0.2);
    /// Inlier correspondences.
    pub const INLIER: Color = Color::new(0.0, 0.9, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_array(rgb: [f32; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }

    pub fn to_point(self) -> Point3<f32> {
        Point3::new(self.r, self.g, self.b)
    }

    pub fn from_point(p: &Point3<f32>) -> Self {
        Self::new(p.x, p.y, p.z)
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }
}

impl From<[f32; 3]> for Color {
    fn from(rgb: [f32; 3]) -> Self {
        Self::from_array(rgb)
    }
}

impl From<Color> for [f32; 3] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantizes_and_clamps() {
        assert_eq!(Color::TARGET.to_rgb8(), [51, 51, 255]);
        assert_eq!(Color::new(-1.0, 2.0, 0.25).to_rgb8(), [0, 255, 64]);
    }

    #[test]
    fn serializes_as_array() {
        assert_eq!(serde_json::to_string(&Color::WHITE).unwrap(), "[1.0,1.0,1.0]");
        let c: Color = serde_json::from_str("[0.2, 0.2, 1.0]").unwrap();
        assert_eq!(c, Color::TARGET);
    }
}
