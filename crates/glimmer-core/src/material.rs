//! Surface materials.
//!
//! Materials are stored in the scene's material library and referenced by
//! [`MaterialId`]. Objects hold exactly one material id at any instant; the
//! bloom pass swaps ids, never material contents.

use glam::Vec3;
use serde::{Deserialize, Serialize};

slotmap::new_key_type! {
    /// Stable handle to a material in the scene's material library.
    pub struct MaterialId;
}

/// How a material responds to light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Shading {
    /// Flat base color, no lighting.
    #[default]
    Unlit,
    /// Lambert diffuse from a light attached to the camera, plus ambient.
    Headlight,
}

/// A material definition for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material name.
    pub name: String,
    /// Linear RGB base color.
    pub color: Vec3,
    /// Lighting model.
    pub shading: Shading,
    /// Whether to draw mesh edges instead of filled triangles.
    pub wireframe: bool,
}

impl Material {
    /// Creates a new unlit white material.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Vec3::ONE,
            shading: Shading::Unlit,
            wireframe: false,
        }
    }

    /// Creates an unlit material with the given color.
    pub fn basic(name: impl Into<String>, color: Vec3) -> Self {
        Self::new(name).with_color(color)
    }

    /// The opaque black material substituted onto non-glowing objects while
    /// the glow pass renders.
    #[must_use]
    pub fn mask() -> Self {
        Self::basic("mask", Vec3::ZERO)
    }

    /// Sets the base color.
    #[must_use]
    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    /// Sets the shading model.
    #[must_use]
    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    /// Enables or disables wireframe drawing.
    #[must_use]
    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }
}

/// Converts an HSL color (all components in `0..=1`) to linear RGB.
#[must_use]
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Vec3 {
    let hue = hue.rem_euclid(1.0);
    let saturation = saturation.clamp(0.0, 1.0);
    let lightness = lightness.clamp(0.0, 1.0);

    if saturation == 0.0 {
        return Vec3::splat(lightness);
    }

    let q = if lightness <= 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - lightness * saturation
    };
    let p = 2.0 * lightness - q;

    let channel = |t: f32| {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * 6.0 * (2.0 / 3.0 - t)
        } else {
            p
        }
    };

    Vec3::new(
        channel(hue + 1.0 / 3.0),
        channel(hue),
        channel(hue - 1.0 / 3.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mask_is_black_unlit_solid() {
        let mask = Material::mask();
        assert_eq!(mask.color, Vec3::ZERO);
        assert_eq!(mask.shading, Shading::Unlit);
        assert!(!mask.wireframe);
    }

    #[test]
    fn test_builder() {
        let mat = Material::new("wire")
            .with_color(Vec3::new(0.2, 0.4, 0.6))
            .with_wireframe(true)
            .with_shading(Shading::Headlight);
        assert_eq!(mat.name, "wire");
        assert!(mat.wireframe);
        assert_eq!(mat.shading, Shading::Headlight);
    }

    #[test]
    fn test_hsl_primaries() {
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert_relative_eq!(red.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(red.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(red.z, 0.0, epsilon = 1e-5);

        let green = hsl_to_rgb(1.0 / 3.0, 1.0, 0.5);
        assert_relative_eq!(green.y, 1.0, epsilon = 1e-5);

        let grey = hsl_to_rgb(0.7, 0.0, 0.25);
        assert_eq!(grey, Vec3::splat(0.25));
    }
}
