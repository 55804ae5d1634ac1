//! glimmer: selective bloom for real-time 3D scenes.
//!
//! Objects are registered into a global scene. Any of them can be put on the
//! bloom layer, after which it glows while the rest of the scene renders
//! normally, and still occludes glowing objects behind it.
//!
//! # Quick Start
//!
//! ```no_run
//! use glimmer::*;
//!
//! fn main() -> Result<()> {
//!     init()?;
//!
//!     let orb = register_object(
//!         "orb",
//!         Geometry::icosphere(1.0, 15),
//!         Material::basic("orb", Vec3::new(0.2, 0.6, 1.0)).with_wireframe(true),
//!     )?;
//!     orb.set_bloom(true)?;
//!
//!     set_bloom_strength(0.6)?;
//!     show();
//!
//!     Ok(())
//! }
//! ```
//!
//! # Render modes
//!
//! - [`RenderMode::SceneWithGlow`] - the scene with the glow added on top
//! - [`RenderMode::GlowOnly`] - only the glow of objects on the bloom layer
//! - [`RenderMode::SceneOnly`] - the scene without any glow
//!
//! In the viewer, keys `1`, `2` and `3` switch between them.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod app;
mod headless;
mod init;
mod object;
mod settings;

// Re-export core types
pub use glimmer_core::{
    bloom::MIP_COUNT,
    error::{GlimmerError, Result},
    hsl_to_rgb, BloomConfig, Easing, FrameStats, Geometry, Layer, Layers, Material, ObjectId,
    Options, RenderMode, SceneObject, Shading, Transform, Mat4, Vec2, Vec3, Vec4,
};

// Re-export render types
pub use glimmer_render::{save_image, Camera, RenderEngine, RenderError};

pub use headless::{render_to_file, render_to_image};
pub use init::{init, is_initialized, show, shutdown};
pub use object::{
    get_object, library_size, object_count, register_object, remove_all_objects, remove_object,
    spin_targets, ObjectHandle,
};
pub use settings::{
    bloom_config, frame_stats, load_options, options, render_mode, save_options,
    set_background_color, set_bloom_config, set_bloom_radius, set_bloom_resolution_divisor,
    set_bloom_strength, set_bloom_threshold, set_exposure, set_mask_color, set_max_fps,
    set_options, set_render_mode,
};
