//! Size-dependent render targets.

use crate::scene_pass::{DEPTH_FORMAT, HDR_FORMAT};
use crate::shader::create_render_target;

/// Format of the headless output image.
pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A texture together with its default view.
pub struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> Self {
        let (texture, view) = create_render_target(device, width, height, format, label);
        Self { texture, view }
    }
}

/// The full-resolution targets of one frame.
pub struct FrameTargets {
    /// Normally lit scene.
    pub base: RenderTarget,
    /// Darkened or layer-masked scene feeding the bloom chain.
    pub bloom_source: RenderTarget,
    /// Base plus glow.
    pub composite: RenderTarget,
    /// Shared by both scene renders; each clears it.
    pub depth: RenderTarget,
}

impl FrameTargets {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            base: RenderTarget::new(device, width, height, HDR_FORMAT, "base color"),
            bloom_source: RenderTarget::new(device, width, height, HDR_FORMAT, "bloom source"),
            composite: RenderTarget::new(device, width, height, HDR_FORMAT, "composite"),
            depth: create_depth_texture(device, width, height),
        }
    }
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> RenderTarget {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    RenderTarget { texture, view }
}

/// Output image of a headless engine, readable with a buffer copy.
pub fn create_headless_output(device: &wgpu::Device, width: u32, height: u32) -> RenderTarget {
    RenderTarget::new(device, width, height, HEADLESS_FORMAT, "headless output")
}
