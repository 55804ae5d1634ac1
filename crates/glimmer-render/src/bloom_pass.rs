//! Multi-level bloom.
//!
//! High-pass (source → bright), then for each of five levels a horizontal and
//! a vertical Gaussian blur at half the previous level's size, then a weighted
//! combine of all levels into the glow texture.

use glimmer_core::bloom::{
    gaussian_coefficients, mip_extents, BloomConfig, HIGH_PASS_SMOOTH_WIDTH, MIP_COUNT,
    MIP_KERNEL_RADII,
};

use crate::buffer::{create_uniform_buffer, update_uniform};
use crate::error::RenderResult;
use crate::scene_pass::HDR_FORMAT;
use crate::shader::{
    create_render_target, fullscreen_pass, fullscreen_pipeline, linear_sampler, sampler_entry,
    texture_entry, uniform_entry, ShaderBuilder,
};

/// Layout must match `HighPass` in high_pass.wgsl.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct HighPassUniforms {
    pub threshold: f32,
    pub smooth_width: f32,
    pub _pad: [f32; 2],
}

impl HighPassUniforms {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            smooth_width: HIGH_PASS_SMOOTH_WIDTH,
            _pad: [0.0; 2],
        }
    }
}

/// Layout must match `Blur` in blur.wgsl (80 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlurUniforms {
    pub direction: [f32; 2],
    pub inv_size: [f32; 2],
    pub kernel_radius: u32,
    pub _pad: [u32; 3],
    pub coefficients: [[f32; 4]; 3],
}

impl BlurUniforms {
    /// Uniforms for blurring along `direction` into a target of `extent`.
    pub fn new(extent: (u32, u32), direction: [f32; 2], kernel_radius: u32) -> Self {
        let mut coefficients = [[0.0; 4]; 3];
        for (i, c) in gaussian_coefficients(kernel_radius)
            .into_iter()
            .take(12)
            .enumerate()
        {
            coefficients[i / 4][i % 4] = c;
        }
        Self {
            direction,
            inv_size: [1.0 / extent.0.max(1) as f32, 1.0 / extent.1.max(1) as f32],
            kernel_radius: kernel_radius.min(12),
            _pad: [0; 3],
            coefficients,
        }
    }
}

/// Layout must match `Combine` in bloom_combine.wgsl.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CombineUniforms {
    pub weights: [[f32; 4]; 2],
}

impl CombineUniforms {
    pub fn from_config(config: &BloomConfig) -> Self {
        let w = config.mip_weights();
        Self {
            weights: [[w[0], w[1], w[2], w[3]], [w[4], 0.0, 0.0, 0.0]],
        }
    }
}

const BLUR_X: [f32; 2] = [1.0, 0.0];
const BLUR_Y: [f32; 2] = [0.0, 1.0];

struct Target {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Target {
    fn new(device: &wgpu::Device, extent: (u32, u32), label: &str) -> Self {
        let (texture, view) = create_render_target(device, extent.0, extent.1, HDR_FORMAT, label);
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Size-dependent textures and the bind groups that read them.
struct BloomTargets {
    extents: [(u32, u32); MIP_COUNT],
    bright: Target,
    horizontal: Vec<Target>,
    vertical: Vec<Target>,
    output: Target,
    high_pass_group: wgpu::BindGroup,
    horizontal_groups: Vec<wgpu::BindGroup>,
    vertical_groups: Vec<wgpu::BindGroup>,
    combine_group: wgpu::BindGroup,
}

/// Layouts, uniforms and sampler shared by every size of the chain.
struct BloomResources {
    high_pass_layout: wgpu::BindGroupLayout,
    blur_layout: wgpu::BindGroupLayout,
    combine_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    high_pass_buffer: wgpu::Buffer,
    horizontal_buffers: Vec<wgpu::Buffer>,
    vertical_buffers: Vec<wgpu::Buffer>,
    combine_buffer: wgpu::Buffer,
}

impl BloomResources {
    fn new(device: &wgpu::Device, extents: [(u32, u32); MIP_COUNT]) -> Self {
        let high_pass_layout =
            source_layout(device, "Bloom High Pass Layout", size_of_u64::<HighPassUniforms>());
        let blur_layout = source_layout(device, "Bloom Blur Layout", size_of_u64::<BlurUniforms>());

        let mut combine_entries = vec![uniform_entry(
            0,
            wgpu::ShaderStages::FRAGMENT,
            false,
            size_of_u64::<CombineUniforms>(),
        )];
        combine_entries.extend((1..=MIP_COUNT as u32).map(texture_entry));
        combine_entries.push(sampler_entry(MIP_COUNT as u32 + 1));
        let combine_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Combine Layout"),
            entries: &combine_entries,
        });

        let defaults = BloomConfig::default();
        let blur_buffers = |direction: [f32; 2], label: &str| -> Vec<wgpu::Buffer> {
            (0..MIP_COUNT)
                .map(|i| {
                    create_uniform_buffer(
                        device,
                        &BlurUniforms::new(extents[i], direction, MIP_KERNEL_RADII[i]),
                        Some(label),
                    )
                })
                .collect()
        };

        Self {
            high_pass_layout,
            blur_layout,
            combine_layout,
            sampler: linear_sampler(device, "Bloom Sampler"),
            high_pass_buffer: create_uniform_buffer(
                device,
                &HighPassUniforms::new(defaults.threshold()),
                Some("Bloom High Pass Uniforms"),
            ),
            horizontal_buffers: blur_buffers(BLUR_X, "Bloom Horizontal Blur Uniforms"),
            vertical_buffers: blur_buffers(BLUR_Y, "Bloom Vertical Blur Uniforms"),
            combine_buffer: create_uniform_buffer(
                device,
                &CombineUniforms::from_config(&defaults),
                Some("Bloom Combine Uniforms"),
            ),
        }
    }

    fn create_targets(
        &self,
        device: &wgpu::Device,
        source_view: &wgpu::TextureView,
        extents: [(u32, u32); MIP_COUNT],
    ) -> BloomTargets {
        let bright = Target::new(device, extents[0], "Bloom Bright");
        let horizontal: Vec<Target> = extents
            .iter()
            .map(|e| Target::new(device, *e, "Bloom Horizontal"))
            .collect();
        let vertical: Vec<Target> = extents
            .iter()
            .map(|e| Target::new(device, *e, "Bloom Vertical"))
            .collect();
        let output = Target::new(device, extents[0], "Bloom Output");

        let high_pass_group = self.source_group(
            device,
            &self.high_pass_layout,
            &self.high_pass_buffer,
            source_view,
        );
        // Level 0 blurs the bright pass; each later level blurs the previous result.
        let horizontal_groups = (0..MIP_COUNT)
            .map(|i| {
                let input = if i == 0 {
                    &bright.view
                } else {
                    &vertical[i - 1].view
                };
                self.source_group(device, &self.blur_layout, &self.horizontal_buffers[i], input)
            })
            .collect();
        let vertical_groups = (0..MIP_COUNT)
            .map(|i| {
                self.source_group(
                    device,
                    &self.blur_layout,
                    &self.vertical_buffers[i],
                    &horizontal[i].view,
                )
            })
            .collect();

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: self.combine_buffer.as_entire_binding(),
        }];
        entries.extend(vertical.iter().enumerate().map(|(i, level)| {
            wgpu::BindGroupEntry {
                binding: i as u32 + 1,
                resource: wgpu::BindingResource::TextureView(&level.view),
            }
        }));
        entries.push(wgpu::BindGroupEntry {
            binding: MIP_COUNT as u32 + 1,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        });
        let combine_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Combine Bind Group"),
            layout: &self.combine_layout,
            entries: &entries,
        });

        BloomTargets {
            extents,
            bright,
            horizontal,
            vertical,
            output,
            high_pass_group,
            horizontal_groups,
            vertical_groups,
            combine_group,
        }
    }

    fn source_group(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniforms: &wgpu::Buffer,
        input: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Source Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(input),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

/// Bloom render resources.
pub struct BloomPass {
    high_pass_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    combine_pipeline: wgpu::RenderPipeline,
    resources: BloomResources,
    targets: BloomTargets,
}

impl BloomPass {
    /// Creates the bloom chain reading from `source_view`, sized for a
    /// `width` x `height` viewport scaled down by `divisor`.
    pub fn new(
        device: &wgpu::Device,
        source_view: &wgpu::TextureView,
        width: u32,
        height: u32,
        divisor: u32,
    ) -> RenderResult<Self> {
        let extents = mip_extents(width, height, divisor);
        let resources = BloomResources::new(device, extents);

        let high_pass_shader = ShaderBuilder::fullscreen()
            .with_fragment(include_str!("shaders/high_pass.wgsl"))
            .with_label("Bloom High Pass Shader")
            .build_module(device)?;
        let blur_shader = ShaderBuilder::fullscreen()
            .with_fragment(include_str!("shaders/blur.wgsl"))
            .with_label("Bloom Blur Shader")
            .build_module(device)?;
        let combine_shader = ShaderBuilder::fullscreen()
            .with_fragment(include_str!("shaders/bloom_combine.wgsl"))
            .with_label("Bloom Combine Shader")
            .build_module(device)?;

        let high_pass_pipeline = fullscreen_pipeline(
            device,
            "Bloom High Pass Pipeline",
            &high_pass_shader,
            &[&resources.high_pass_layout],
            HDR_FORMAT,
        );
        let blur_pipeline = fullscreen_pipeline(
            device,
            "Bloom Blur Pipeline",
            &blur_shader,
            &[&resources.blur_layout],
            HDR_FORMAT,
        );
        let combine_pipeline = fullscreen_pipeline(
            device,
            "Bloom Combine Pipeline",
            &combine_shader,
            &[&resources.combine_layout],
            HDR_FORMAT,
        );

        let targets = resources.create_targets(device, source_view, extents);
        Ok(Self {
            high_pass_pipeline,
            blur_pipeline,
            combine_pipeline,
            resources,
            targets,
        })
    }

    /// Recreates every level for a new viewport size or source texture.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source_view: &wgpu::TextureView,
        width: u32,
        height: u32,
        divisor: u32,
    ) {
        let extents = mip_extents(width, height, divisor);
        for (i, extent) in extents.iter().enumerate() {
            update_uniform(
                queue,
                &self.resources.horizontal_buffers[i],
                &BlurUniforms::new(*extent, BLUR_X, MIP_KERNEL_RADII[i]),
            );
            update_uniform(
                queue,
                &self.resources.vertical_buffers[i],
                &BlurUniforms::new(*extent, BLUR_Y, MIP_KERNEL_RADII[i]),
            );
        }
        self.targets = self
            .resources
            .create_targets(device, source_view, extents);
        log::debug!("bloom levels resized to {extents:?}");
    }

    /// Uploads threshold and level weights.
    pub fn update(&self, queue: &wgpu::Queue, config: &BloomConfig) {
        update_uniform(
            queue,
            &self.resources.high_pass_buffer,
            &HighPassUniforms::new(config.threshold()),
        );
        update_uniform(
            queue,
            &self.resources.combine_buffer,
            &CombineUniforms::from_config(config),
        );
    }

    /// Records the high-pass, both blur directions of every level and the
    /// combine.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder) {
        let t = &self.targets;
        fullscreen_pass(
            encoder,
            "Bloom High Pass",
            &t.bright.view,
            &self.high_pass_pipeline,
            &t.high_pass_group,
        );
        for i in 0..MIP_COUNT {
            fullscreen_pass(
                encoder,
                "Bloom Horizontal Blur",
                &t.horizontal[i].view,
                &self.blur_pipeline,
                &t.horizontal_groups[i],
            );
            fullscreen_pass(
                encoder,
                "Bloom Vertical Blur",
                &t.vertical[i].view,
                &self.blur_pipeline,
                &t.vertical_groups[i],
            );
        }
        fullscreen_pass(
            encoder,
            "Bloom Combine",
            &t.output.view,
            &self.combine_pipeline,
            &t.combine_group,
        );
    }

    /// The glow texture.
    pub fn output_view(&self) -> &wgpu::TextureView {
        &self.targets.output.view
    }

    /// Size of each blur level.
    pub fn extents(&self) -> [(u32, u32); MIP_COUNT] {
        self.targets.extents
    }
}

/// Layout of a pass reading one texture with one uniform block.
fn source_layout(device: &wgpu::Device, label: &str, uniform_size: u64) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::FRAGMENT, false, uniform_size),
            texture_entry(1),
            sampler_entry(2),
        ],
    })
}

fn size_of_u64<T>() -> u64 {
    std::mem::size_of::<T>() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_sizes_match_shaders() {
        assert_eq!(std::mem::size_of::<HighPassUniforms>(), 16);
        assert_eq!(std::mem::size_of::<BlurUniforms>(), 80);
        assert_eq!(std::mem::size_of::<CombineUniforms>(), 32);
    }

    #[test]
    fn test_blur_uniforms_pack_coefficients() {
        let blur = BlurUniforms::new((200, 100), BLUR_X, 5);
        let expected = gaussian_coefficients(5);
        assert_eq!(blur.kernel_radius, 5);
        assert_relative_eq!(blur.coefficients[0][0], expected[0]);
        assert_relative_eq!(blur.coefficients[1][0], expected[4]);
        assert_eq!(blur.coefficients[1][1], 0.0);
        assert_relative_eq!(blur.inv_size[0], 0.005);
        assert_relative_eq!(blur.inv_size[1], 0.01);
    }

    #[test]
    fn test_largest_kernel_fits() {
        let blur = BlurUniforms::new((10, 10), BLUR_Y, MIP_KERNEL_RADII[MIP_COUNT - 1]);
        assert_eq!(blur.kernel_radius, 11);
        assert!(blur.coefficients[2][2] > 0.0);
        assert_eq!(blur.coefficients[2][3], 0.0);
    }

    #[test]
    fn test_combine_weights_follow_config() {
        let config = BloomConfig::new(0.0, 1.0, 0.0, 1.0).unwrap();
        let uniforms = CombineUniforms::from_config(&config);
        assert_eq!(uniforms.weights[0], [1.0, 0.8, 0.6, 0.4]);
        assert_relative_eq!(uniforms.weights[1][0], 0.2);

        let off = BloomConfig::new(0.0, 0.0, 2.5, 1.0).unwrap();
        let uniforms = CombineUniforms::from_config(&off);
        assert!(uniforms.weights.iter().flatten().all(|w| *w == 0.0));
    }

    #[test]
    fn test_high_pass_uniforms() {
        let u = HighPassUniforms::new(0.4);
        assert_eq!(u.threshold, 0.4);
        assert_eq!(u.smooth_width, HIGH_PASS_SMOOTH_WIDTH);
    }
}
