//! Configuration options for glimmer.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::bloom::{luminance, BloomConfig};
use crate::error::{GlimmerError, Result};
use crate::render_mode::RenderMode;

/// Global configuration options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Bloom parameters and display exposure.
    pub bloom: BloomConfig,

    /// What reaches the screen.
    pub render_mode: RenderMode,

    /// Clear color of the base scene.
    pub background_color: Vec3,

    /// Color of the material swapped onto non-glowing objects. Must have
    /// zero luminance, see [`validate_mask_color`].
    pub mask_color: Vec3,

    /// Viewport-to-glow-chain resolution ratio.
    pub bloom_resolution_divisor: u32,

    /// Maximum frames per second (0 = unlimited).
    pub max_fps: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            bloom: BloomConfig::default(),
            render_mode: RenderMode::SceneWithGlow,
            background_color: Vec3::ZERO,
            mask_color: Vec3::ZERO,
            bloom_resolution_divisor: 2,
            max_fps: 60,
        }
    }
}

/// Checks that a mask color cannot reach the glow.
///
/// Masked objects must stay below every high-pass threshold, including 0, so
/// the color needs non-negative components and zero luminance.
pub fn validate_mask_color(color: Vec3) -> Result<()> {
    let luma = luminance(color.to_array());
    if color.is_nan() || color.min_element() < 0.0 || luma > 0.0 {
        return Err(GlimmerError::ParameterOutOfRange {
            name: "mask_color luminance",
            value: luma,
            min: 0.0,
            max: 0.0,
        });
    }
    Ok(())
}

impl Options {
    /// Parses options from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Re-checks every validated field.
    pub fn validate(&self) -> Result<()> {
        self.bloom.validate()?;
        validate_mask_color(self.mask_color)
    }

    /// Serializes options to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Writes options to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}
