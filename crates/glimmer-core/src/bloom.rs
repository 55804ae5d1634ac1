//! Bloom configuration and the glow math shared by the GPU passes.
//!
//! The glow chain works at a reduced resolution: a luminosity high-pass,
//! five levels of separable Gaussian blur, then a weighted sum of the levels.

use serde::{Deserialize, Serialize};

use crate::error::{GlimmerError, Result};

/// Number of blur levels in the glow chain.
pub const MIP_COUNT: usize = 5;

/// Gaussian kernel radius (taps on each side, including the center) per level.
pub const MIP_KERNEL_RADII: [u32; MIP_COUNT] = [3, 5, 7, 9, 11];

/// Base contribution of each blur level before the radius blend.
pub const BLOOM_FACTORS: [f32; MIP_COUNT] = [1.0, 0.8, 0.6, 0.4, 0.2];

/// Width of the smooth cutoff above the luminance threshold.
pub const HIGH_PASS_SMOOTH_WIDTH: f32 = 0.01;

/// Rec. 601 luma weights.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

pub const THRESHOLD_RANGE: (f32, f32) = (0.0, 1.0);
pub const EXPOSURE_RANGE: (f32, f32) = (0.1, 2.0);

/// Bloom parameters, read once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    threshold: f32,
    strength: f32,
    radius: f32,
    exposure: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            strength: 0.6,
            radius: 2.5,
            exposure: 1.0,
        }
    }
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<f32> {
    if value.is_nan() || value < min || value > max {
        return Err(GlimmerError::ParameterOutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

impl BloomConfig {
    /// Creates a validated configuration.
    pub fn new(threshold: f32, strength: f32, radius: f32, exposure: f32) -> Result<Self> {
        let mut config = Self::default();
        config.set_threshold(threshold)?;
        config.set_strength(strength)?;
        config.set_radius(radius)?;
        config.set_exposure(exposure)?;
        Ok(config)
    }

    /// Luminance below which pixels do not glow.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Overall glow intensity.
    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Blend of the level weights toward their mirrored values; higher spreads
    /// the glow wider.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Display exposure before the power curve.
    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    pub fn set_threshold(&mut self, value: f32) -> Result<()> {
        self.threshold = check_range("threshold", value, THRESHOLD_RANGE.0, THRESHOLD_RANGE.1)?;
        Ok(())
    }

    pub fn set_strength(&mut self, value: f32) -> Result<()> {
        self.strength = check_range("strength", value, 0.0, f32::MAX)?;
        Ok(())
    }

    pub fn set_radius(&mut self, value: f32) -> Result<()> {
        self.radius = check_range("radius", value, 0.0, f32::MAX)?;
        Ok(())
    }

    pub fn set_exposure(&mut self, value: f32) -> Result<()> {
        self.exposure = check_range("exposure", value, EXPOSURE_RANGE.0, EXPOSURE_RANGE.1)?;
        Ok(())
    }

    /// Re-checks every field, for values that bypassed the setters (e.g. JSON).
    pub fn validate(&self) -> Result<()> {
        Self::new(self.threshold, self.strength, self.radius, self.exposure).map(|_| ())
    }

    /// Multiplier applied to final display brightness.
    pub fn tone_mapping_exposure(&self) -> f32 {
        self.exposure.powi(4)
    }

    /// Final weight of each blur level in the combine step.
    pub fn mip_weights(&self) -> [f32; MIP_COUNT] {
        BLOOM_FACTORS.map(|f| self.strength * lerp_bloom_factor(f, self.radius))
    }
}

/// Perceived brightness of a linear RGB color.
pub fn luminance(rgb: [f32; 3]) -> f32 {
    rgb[0] * LUMA_WEIGHTS[0] + rgb[1] * LUMA_WEIGHTS[1] + rgb[2] * LUMA_WEIGHTS[2]
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Fraction of a pixel's color kept by the high-pass.
pub fn high_pass_weight(luma: f32, threshold: f32) -> f32 {
    smoothstep(threshold, threshold + HIGH_PASS_SMOOTH_WIDTH, luma)
}

/// One-sided Gaussian weights for a kernel with `kernel_radius` taps,
/// with sigma equal to the radius. Index 0 is the center tap.
pub fn gaussian_coefficients(kernel_radius: u32) -> Vec<f32> {
    let sigma = kernel_radius as f32;
    (0..kernel_radius)
        .map(|i| {
            let x = i as f32;
            0.39894 * (-0.5 * x * x / (sigma * sigma)).exp() / sigma
        })
        .collect()
}

/// `mix(factor, 1.2 - factor, radius)`.
pub fn lerp_bloom_factor(factor: f32, radius: f32) -> f32 {
    let mirror = 1.2 - factor;
    factor + (mirror - factor) * radius
}

/// Sizes of the high-pass target and each blur level for a viewport.
///
/// The working resolution is the viewport divided by `divisor`; each further
/// level halves it. No dimension goes below 1.
pub fn mip_extents(width: u32, height: u32, divisor: u32) -> [(u32, u32); MIP_COUNT] {
    let divisor = divisor.max(1) as f32;
    let mut w = (width as f32 / divisor).round().max(1.0);
    let mut h = (height as f32 / divisor).round().max(1.0);
    let mut extents = [(1, 1); MIP_COUNT];
    for extent in &mut extents {
        *extent = (w as u32, h as u32);
        w = (w / 2.0).round().max(1.0);
        h = (h / 2.0).round().max(1.0);
    }
    extents
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let config = BloomConfig::default();
        assert_eq!(config.threshold(), 0.0);
        assert_eq!(config.strength(), 0.6);
        assert_eq!(config.radius(), 2.5);
        assert_eq!(config.exposure(), 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_setters_reject_out_of_range() {
        let mut config = BloomConfig::default();
        assert!(config.set_threshold(1.5).is_err());
        assert!(config.set_threshold(-0.1).is_err());
        assert!(config.set_exposure(0.05).is_err());
        assert!(config.set_exposure(2.5).is_err());
        assert!(config.set_strength(-1.0).is_err());
        assert!(config.set_radius(f32::NAN).is_err());
        assert_eq!(config, BloomConfig::default());

        assert!(config.set_strength(10.0).is_ok());
        assert!(config.set_radius(7.5).is_ok());
        assert_eq!(config.strength(), 10.0);
    }

    #[test]
    fn test_out_of_range_error_fields() {
        let err = BloomConfig::new(2.0, 0.6, 2.5, 1.0).unwrap_err();
        match err {
            GlimmerError::ParameterOutOfRange { name, value, .. } => {
                assert_eq!(name, "threshold");
                assert_eq!(value, 2.0);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_exposure_curve() {
        let mut config = BloomConfig::default();
        assert_relative_eq!(config.tone_mapping_exposure(), 1.0);
        config.set_exposure(0.5).unwrap();
        assert_relative_eq!(config.tone_mapping_exposure(), 0.0625);
        config.set_exposure(2.0).unwrap();
        assert_relative_eq!(config.tone_mapping_exposure(), 16.0);
    }

    #[test]
    fn test_high_pass() {
        assert_eq!(high_pass_weight(0.05, 0.1), 0.0);
        assert_eq!(high_pass_weight(0.2, 0.1), 1.0);
        assert_relative_eq!(high_pass_weight(0.105, 0.1), 0.5, epsilon = 1e-4);
        // Nothing reaches a threshold of one for colors within [0, 1].
        assert_eq!(high_pass_weight(luminance([1.0, 1.0, 1.0]) - 1e-3, 1.0), 0.0);
    }

    #[test]
    fn test_luminance_weights_sum_to_one() {
        assert_relative_eq!(luminance([1.0, 1.0, 1.0]), 1.0, epsilon = 1e-6);
        assert_relative_eq!(luminance([0.0, 1.0, 0.0]), 0.587);
    }

    #[test]
    fn test_gaussian_coefficients() {
        for radius in MIP_KERNEL_RADII {
            let coeffs = gaussian_coefficients(radius);
            assert_eq!(coeffs.len(), radius as usize);
            assert!(coeffs.windows(2).all(|w| w[0] > w[1]));
        }
        let c = gaussian_coefficients(3);
        assert_relative_eq!(c[0], 0.39894 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mip_weights() {
        let config = BloomConfig::new(0.0, 1.0, 0.0, 1.0).unwrap();
        assert_eq!(config.mip_weights(), BLOOM_FACTORS);

        let config = BloomConfig::new(0.0, 1.0, 1.0, 1.0).unwrap();
        for (w, f) in config.mip_weights().iter().zip(BLOOM_FACTORS) {
            assert_relative_eq!(*w, 1.2 - f, epsilon = 1e-6);
        }

        let config = BloomConfig::new(1.0, 0.0, 2.5, 1.0).unwrap();
        assert!(config.mip_weights().iter().all(|w| *w == 0.0));
    }

    #[test]
    fn test_mip_extents() {
        let extents = mip_extents(1280, 720, 2);
        assert_eq!(extents[0], (640, 360));
        assert_eq!(extents[1], (320, 180));
        assert_eq!(extents[4], (40, 23));

        let tiny = mip_extents(3, 1, 2);
        assert!(tiny.iter().all(|(w, h)| *w >= 1 && *h >= 1));
    }
}
