//! The main rendering engine.
//!
//! [`RenderEngine`] owns the wgpu device, the size-dependent targets and every
//! pass, and implements [`glimmer_core::RenderBackend`] so a
//! [`glimmer_core::FrameLoop`] can drive it.

mod capture;
mod frame;
mod textures;

pub use capture::aligned_bytes_per_row;
pub use textures::{FrameTargets, RenderTarget, HEADLESS_FORMAT};

use std::sync::Arc;

use crate::bloom_pass::BloomPass;
use crate::camera::Camera;
use crate::composite_pass::CompositePass;
use crate::error::{RenderError, RenderResult};
use crate::scene_pass::ScenePass;
use crate::tone_mapping::ToneMapPass;

/// Default downscale of the bloom working resolution.
pub const DEFAULT_BLOOM_DIVISOR: u32 = 2;

/// Every pass of a frame.
struct Passes {
    scene: ScenePass,
    bloom: BloomPass,
    composite: CompositePass,
    tone_map: ToneMapPass,
}

impl Passes {
    fn new(
        device: &wgpu::Device,
        targets: &FrameTargets,
        width: u32,
        height: u32,
        output_format: wgpu::TextureFormat,
    ) -> RenderResult<Self> {
        let scene = ScenePass::new(device)?;
        let bloom = BloomPass::new(
            device,
            &targets.bloom_source.view,
            width,
            height,
            DEFAULT_BLOOM_DIVISOR,
        )?;
        let composite = CompositePass::new(device, &targets.base.view, bloom.output_view())?;
        let tone_map = ToneMapPass::new(device, output_format)?;
        Ok(Self {
            scene,
            bloom,
            composite,
            tone_map,
        })
    }
}

/// The main render engine backed by wgpu.
pub struct RenderEngine {
    /// The wgpu instance.
    pub instance: wgpu::Instance,
    /// The graphics adapter.
    pub adapter: wgpu::Adapter,
    /// The logical device.
    pub device: wgpu::Device,
    /// The command queue.
    pub queue: wgpu::Queue,
    /// The render surface (None for headless).
    pub surface: Option<wgpu::Surface<'static>>,
    /// Surface configuration. Headless engines keep one for size and format.
    pub surface_config: wgpu::SurfaceConfiguration,
    /// The main camera.
    pub camera: Camera,
    passes: Passes,
    targets: FrameTargets,
    headless_output: Option<RenderTarget>,
    encoder: Option<wgpu::CommandEncoder>,
    width: u32,
    height: u32,
    bloom_divisor: u32,
}

/// Picks the surface format: linear output preferred, since the tone map pass
/// writes display values directly.
pub fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first())
        .copied()
}

async fn request_device(
    adapter: &wgpu::Adapter,
    label: &str,
) -> RenderResult<(wgpu::Device, wgpu::Queue)> {
    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some(label),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        )
        .await?;
    Ok((device, queue))
}

impl RenderEngine {
    /// Creates a new windowed render engine.
    pub async fn new_windowed(window: Arc<winit::window::Window>) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterCreationFailed)?;
        let info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = request_device(&adapter, "glimmer device").await?;

        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = pick_surface_format(&surface_caps.formats)
            .ok_or(RenderError::SurfaceConfigurationFailed)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        log::debug!("surface format: {surface_format:?}");

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        Self::from_parts(instance, adapter, device, queue, Some(surface), surface_config).await
    }

    /// Creates a new headless render engine.
    pub async fn new_headless(width: u32, height: u32) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterCreationFailed)?;

        let (device, queue) = request_device(&adapter, "glimmer device (headless)").await?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format: HEADLESS_FORMAT,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        Self::from_parts(instance, adapter, device, queue, None, surface_config).await
    }

    async fn from_parts(
        instance: wgpu::Instance,
        adapter: wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: Option<wgpu::Surface<'static>>,
        surface_config: wgpu::SurfaceConfiguration,
    ) -> RenderResult<Self> {
        let (width, height) = (surface_config.width, surface_config.height);
        let targets = FrameTargets::new(&device, width, height);
        let headless_output = surface
            .is_none()
            .then(|| textures::create_headless_output(&device, width, height));

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let passes = Passes::new(&device, &targets, width, height, surface_config.format);
        if let Some(err) = device.pop_error_scope().await {
            return Err(RenderError::PipelineCreationFailed(err.to_string()));
        }
        let passes = passes?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            surface,
            surface_config,
            camera: Camera::new(width as f32 / height as f32),
            passes,
            targets,
            headless_output,
            encoder: None,
            width,
            height,
            bloom_divisor: DEFAULT_BLOOM_DIVISOR,
        })
    }

    /// Resizes every target. Returns whether anything was rebuilt: zero sizes
    /// and the current size are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || (width, height) == (self.width, self.height) {
            return false;
        }

        self.width = width;
        self.height = height;
        self.surface_config.width = width;
        self.surface_config.height = height;

        if let Some(ref surface) = self.surface {
            surface.configure(&self.device, &self.surface_config);
        }

        self.targets = FrameTargets::new(&self.device, width, height);
        if self.headless_output.is_some() {
            self.headless_output = Some(textures::create_headless_output(
                &self.device,
                width,
                height,
            ));
        }
        self.rebuild_bloom();

        self.camera.set_aspect_ratio(width as f32 / height as f32);
        log::debug!("render engine resized to {width}x{height}");
        true
    }

    /// Sets the downscale of the bloom working resolution.
    pub fn set_bloom_divisor(&mut self, divisor: u32) {
        let divisor = divisor.max(1);
        if divisor != self.bloom_divisor {
            self.bloom_divisor = divisor;
            self.rebuild_bloom();
        }
    }

    fn rebuild_bloom(&mut self) {
        self.passes.bloom.resize(
            &self.device,
            &self.queue,
            &self.targets.bloom_source.view,
            self.width,
            self.height,
            self.bloom_divisor,
        );
        self.passes.composite.resize(
            &self.device,
            &self.targets.base.view,
            self.passes.bloom.output_view(),
        );
    }

    /// Returns the current viewport dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bloom working downscale.
    pub fn bloom_divisor(&self) -> u32 {
        self.bloom_divisor
    }

    /// Size of each bloom blur level.
    pub fn bloom_extents(&self) -> [(u32, u32); glimmer_core::bloom::MIP_COUNT] {
        self.passes.bloom.extents()
    }

    /// Geometries currently holding GPU buffers.
    pub fn cached_meshes(&self) -> usize {
        self.passes.scene.cached_meshes()
    }

    /// Format the tone map pass writes.
    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Whether this engine renders to an offscreen image.
    pub fn is_headless(&self) -> bool {
        self.surface.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_format_prefers_linear() {
        let formats = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Bgra8Unorm,
        ];
        assert_eq!(
            pick_surface_format(&formats),
            Some(wgpu::TextureFormat::Bgra8Unorm)
        );
    }

    #[test]
    fn test_surface_format_falls_back_to_first() {
        let formats = [wgpu::TextureFormat::Rgba8UnormSrgb];
        assert_eq!(
            pick_surface_format(&formats),
            Some(wgpu::TextureFormat::Rgba8UnormSrgb)
        );
        assert_eq!(pick_surface_format(&[]), None);
    }
}
