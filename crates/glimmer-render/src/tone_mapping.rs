//! Tone mapping post-processing pass.
//!
//! The last pass of every frame: scales the chosen HDR image by the exposure
//! and writes it to the output format.

use crate::buffer::{create_uniform_buffer, update_uniform};
use crate::error::RenderResult;
use crate::shader::{
    fullscreen_pass, fullscreen_pipeline, linear_sampler, sampler_entry, texture_entry,
    uniform_entry, ShaderBuilder,
};

/// GPU representation of tone mapping uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ToneMapUniforms {
    pub exposure: f32,
    pub _pad: [f32; 3],
}

impl Default for ToneMapUniforms {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ToneMapUniforms {
    pub fn new(exposure: f32) -> Self {
        Self {
            exposure,
            _pad: [0.0; 3],
        }
    }
}

/// Tone mapping render resources.
pub struct ToneMapPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
}

impl ToneMapPass {
    /// Creates a new tone mapping pass.
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat) -> RenderResult<Self> {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Tone Map Bind Group Layout"),
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                uniform_entry(
                    2,
                    wgpu::ShaderStages::FRAGMENT,
                    false,
                    std::mem::size_of::<ToneMapUniforms>() as u64,
                ),
            ],
        });

        let shader = ShaderBuilder::fullscreen()
            .with_fragment(include_str!("shaders/tone_map.wgsl"))
            .with_label("Tone Map Shader")
            .build_module(device)?;
        let pipeline = fullscreen_pipeline(
            device,
            "Tone Map Pipeline",
            &shader,
            &[&bind_group_layout],
            output_format,
        );

        let uniform_buffer = create_uniform_buffer(
            device,
            &ToneMapUniforms::default(),
            Some("Tone Map Uniform Buffer"),
        );
        let sampler = linear_sampler(device, "Tone Map Sampler");

        Ok(Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            sampler,
        })
    }

    /// Updates the exposure multiplier.
    pub fn update_uniforms(&self, queue: &wgpu::Queue, exposure: f32) {
        update_uniform(queue, &self.uniform_buffer, &ToneMapUniforms::new(exposure));
    }

    /// Creates a bind group for rendering.
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        input_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Tone Map Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        })
    }

    /// Renders the tone mapping pass.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output_view: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
    ) {
        fullscreen_pass(
            encoder,
            "Tone Map Pass",
            output_view,
            &self.pipeline,
            bind_group,
        );
    }

    /// Renders tone mapping from input HDR texture to output texture.
    /// Convenience method that creates a bind group and renders in one call.
    pub fn render_to_target(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        input_view: &wgpu::TextureView,
        output_view: &wgpu::TextureView,
    ) {
        let bind_group = self.create_bind_group(device, input_view);
        self.render(encoder, output_view, &bind_group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<ToneMapUniforms>(), 16);
        assert_eq!(ToneMapUniforms::default().exposure, 1.0);
    }
}
