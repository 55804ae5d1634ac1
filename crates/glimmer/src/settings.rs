//! The configuration surface.
//!
//! Setters validate their range, take effect on the next frame and never
//! block on rendering.

use std::path::Path;

use crate::init::{context, context_mut};
use crate::{BloomConfig, FrameStats, Options, RenderMode, Result, Vec3};

/// Sets the minimum luminance that contributes to glow, in `[0, 1]`.
pub fn set_bloom_threshold(value: f32) -> Result<()> {
    context_mut(|ctx| ctx.options.bloom.set_threshold(value))?
}

/// Sets the glow intensity multiplier (non-negative).
pub fn set_bloom_strength(value: f32) -> Result<()> {
    context_mut(|ctx| ctx.options.bloom.set_strength(value))?
}

/// Sets how far the glow spreads (non-negative).
pub fn set_bloom_radius(value: f32) -> Result<()> {
    context_mut(|ctx| ctx.options.bloom.set_radius(value))?
}

/// Sets the display exposure, in `[0.1, 2]`. Brightness scales with its
/// fourth power.
pub fn set_exposure(value: f32) -> Result<()> {
    context_mut(|ctx| ctx.options.bloom.set_exposure(value))?
}

/// Replaces every bloom parameter at once.
pub fn set_bloom_config(config: BloomConfig) -> Result<()> {
    config.validate()?;
    context_mut(|ctx| ctx.options.bloom = config)
}

/// Current bloom parameters.
pub fn bloom_config() -> Result<BloomConfig> {
    context(|ctx| ctx.options.bloom)
}

/// Selects what reaches the screen from the next frame on.
pub fn set_render_mode(mode: RenderMode) -> Result<()> {
    context_mut(|ctx| {
        if ctx.options.render_mode != mode {
            log::info!("render mode: {mode}");
        }
        ctx.options.render_mode = mode;
    })
}

pub fn render_mode() -> Result<RenderMode> {
    context(|ctx| ctx.options.render_mode)
}

/// Sets the clear color of the base scene.
pub fn set_background_color(color: Vec3) -> Result<()> {
    context_mut(|ctx| ctx.options.background_color = color)
}

/// Sets the color non-glowing objects take during the glow render.
///
/// Only colors with zero luminance are accepted, so masked objects never glow.
pub fn set_mask_color(color: Vec3) -> Result<()> {
    glimmer_core::options::validate_mask_color(color)?;
    context_mut(|ctx| {
        ctx.options.mask_color = color;
        ctx.sync_options();
    })
}

/// Sets the ratio between viewport and glow-chain resolution (at least 1).
pub fn set_bloom_resolution_divisor(divisor: u32) -> Result<()> {
    context_mut(|ctx| ctx.options.bloom_resolution_divisor = divisor.max(1))
}

/// Caps the viewer's frame rate. Zero removes the cap.
pub fn set_max_fps(max_fps: u32) -> Result<()> {
    context_mut(|ctx| ctx.options.max_fps = max_fps)
}

/// A copy of the current options.
pub fn options() -> Result<Options> {
    context(|ctx| ctx.options.clone())
}

/// Replaces every option after validating them.
pub fn set_options(options: Options) -> Result<()> {
    options.validate()?;
    context_mut(|ctx| {
        ctx.options = options;
        ctx.sync_options();
    })
}

/// Loads options from a JSON file.
pub fn load_options(path: impl AsRef<Path>) -> Result<()> {
    let options = Options::load(path)?;
    set_options(options)
}

/// Saves the current options as JSON.
pub fn save_options(path: impl AsRef<Path>) -> Result<()> {
    options()?.save(path)
}

/// Frame counters of the frame loop.
pub fn frame_stats() -> Result<FrameStats> {
    context(|ctx| ctx.frame_loop.stats.clone())
}
