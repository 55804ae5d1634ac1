//! Rendering backend for glimmer.
//!
//! This crate provides the wgpu-based implementation of
//! [`glimmer_core::RenderBackend`]:
//! - Scene pass drawing objects by layer into HDR targets
//! - Multi-level bloom (high-pass, separable blur, weighted combine)
//! - Additive composite and the exposure/present pass
//! - Headless capture and image output

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// GPU sizes and offsets are converted between u32, u64 and f32
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Uniform padding fields
#![allow(clippy::pub_underscore_fields)]

pub mod bloom_pass;
pub mod buffer;
pub mod camera;
pub mod composite_pass;
pub mod engine;
pub mod error;
pub mod mesh_render;
pub mod scene_pass;
pub mod screenshot;
pub mod shader;
pub mod tone_mapping;

pub use bloom_pass::{BlurUniforms, BloomPass, CombineUniforms, HighPassUniforms};
pub use camera::Camera;
pub use composite_pass::CompositePass;
pub use engine::{RenderEngine, DEFAULT_BLOOM_DIVISOR, HEADLESS_FORMAT};
pub use error::{RenderError, RenderResult};
pub use mesh_render::{MeshRenderData, MeshVertex};
pub use scene_pass::{CameraUniforms, ObjectUniforms, ScenePass, DEPTH_FORMAT, HDR_FORMAT};
pub use screenshot::{save_image, save_to_buffer, ScreenshotError};
pub use shader::ShaderBuilder;
pub use tone_mapping::{ToneMapPass, ToneMapUniforms};
