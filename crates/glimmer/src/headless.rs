//! Rendering without a window.
//!
//! Each call creates a fresh GPU context, runs one frame of the global scene
//! and reads the presented image back. Useful for tests and batch output.

use std::path::Path;

use pollster::FutureExt;

use crate::app::render_frame;
use crate::{GlimmerError, Result};
use glimmer_core::state::with_context_mut;
use glimmer_core::Viewport;
use glimmer_render::RenderEngine;

/// Renders the current scene to a file.
///
/// The format follows the extension (`.png`, `.jpg` or `.jpeg`).
///
/// # Example
/// ```no_run
/// use glimmer::*;
///
/// init().unwrap();
/// let orb = register_object("orb", Geometry::icosphere(1.0, 3), Material::basic("orb", Vec3::ONE)).unwrap();
/// orb.set_bloom(true).unwrap();
/// render_to_file("orb.png", 800, 600).unwrap();
/// ```
pub fn render_to_file(path: impl AsRef<Path>, width: u32, height: u32) -> Result<()> {
    let data = render_to_image(width, height)?;
    glimmer_render::save_image(path, &data, width, height)?;
    Ok(())
}

/// Renders the current scene to tightly packed RGBA8 pixels.
///
/// The buffer holds `width * height * 4` bytes, row by row from the top-left.
/// Animations are not advanced. A zero dimension is rejected with
/// [`GlimmerError::InvalidViewport`].
pub fn render_to_image(width: u32, height: u32) -> Result<Vec<u8>> {
    crate::init::context(|_| ())?;
    Viewport::new(width, height)?;

    let mut engine = RenderEngine::new_headless(width, height).block_on()?;
    with_context_mut(|ctx| ctx.frame_loop.request_resize(width, height));

    let report = render_frame(&mut engine, 0.0)
        .ok_or_else(|| GlimmerError::RenderError("frame skipped".to_string()))?;
    log::debug!(
        "headless frame: {} (presented {:?})",
        report.mode,
        report.presented
    );

    Ok(engine.capture_output()?)
}
