//! Core model for glimmer.
//!
//! This crate holds everything about selective bloom that does not touch the GPU:
//! - [`Scene`] with per-object [`Layers`] and a shared mask material
//! - [`MaterialCache`] for the darken/restore material swap around the glow pass
//! - [`BloomConfig`] and the glow math mirrored by the shaders
//! - [`RenderMode`] and the [`FramePlan`] each mode selects
//! - [`AnimationScheduler`] with one task slot per object
//! - [`FrameSequencer`]/[`FrameLoop`] driving a [`RenderBackend`]
//! - Global state and [`Options`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Pixel and vertex counts are converted to f32 for math
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod animation;
pub mod bloom;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod layer;
pub mod material;
pub mod material_cache;
pub mod options;
pub mod render_mode;
pub mod scene;
pub mod state;
pub mod stats;

pub use animation::{AnimationScheduler, AnimationTask, Easing, TransformProperty};
pub use bloom::BloomConfig;
pub use error::{GlimmerError, Result};
pub use frame::{FrameLoop, FrameReport, FrameSequencer, RenderBackend, SceneTarget, Viewport};
pub use geometry::{Geometry, GeometryId};
pub use layer::{Layer, Layers};
pub use material::{hsl_to_rgb, Material, MaterialId, Shading};
pub use material_cache::MaterialCache;
pub use options::Options;
pub use render_mode::{FramePlan, Isolation, Presented, RenderMode};
pub use scene::{ObjectId, Scene, SceneObject, Transform};
pub use state::{with_context, with_context_mut, Context};
pub use stats::FrameStats;

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
