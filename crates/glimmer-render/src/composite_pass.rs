//! Additive composite of the glow texture over the base scene.

use crate::error::RenderResult;
use crate::scene_pass::HDR_FORMAT;
use crate::shader::{
    fullscreen_pass, fullscreen_pipeline, linear_sampler, sampler_entry, texture_entry,
    ShaderBuilder,
};

/// Composite render resources.
pub struct CompositePass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    bind_group: wgpu::BindGroup,
}

impl CompositePass {
    pub fn new(
        device: &wgpu::Device,
        base_view: &wgpu::TextureView,
        glow_view: &wgpu::TextureView,
    ) -> RenderResult<Self> {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Bind Group Layout"),
            entries: &[texture_entry(0), texture_entry(1), sampler_entry(2)],
        });

        let shader = ShaderBuilder::fullscreen()
            .with_fragment(include_str!("shaders/composite.wgsl"))
            .with_label("Composite Shader")
            .build_module(device)?;
        let pipeline = fullscreen_pipeline(
            device,
            "Composite Pipeline",
            &shader,
            &[&bind_group_layout],
            HDR_FORMAT,
        );
        let sampler = linear_sampler(device, "Composite Sampler");
        let bind_group =
            Self::create_bind_group(device, &bind_group_layout, &sampler, base_view, glow_view);

        Ok(Self {
            pipeline,
            bind_group_layout,
            sampler,
            bind_group,
        })
    }

    /// Rebinds the inputs after they were recreated.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        base_view: &wgpu::TextureView,
        glow_view: &wgpu::TextureView,
    ) {
        self.bind_group = Self::create_bind_group(
            device,
            &self.bind_group_layout,
            &self.sampler,
            base_view,
            glow_view,
        );
    }

    /// Records the composite into `output_view`.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, output_view: &wgpu::TextureView) {
        fullscreen_pass(
            encoder,
            "Composite Pass",
            output_view,
            &self.pipeline,
            &self.bind_group,
        );
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        base_view: &wgpu::TextureView,
        glow_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(base_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(glow_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }
}
