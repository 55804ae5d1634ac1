//! Scene geometry pass.
//!
//! Draws every visible object of a [`Scene`] into an HDR color target with
//! depth testing. Per-object data lives in one uniform buffer addressed with
//! dynamic offsets, one buffer per [`SceneTarget`] so the base and glow
//! renders of a frame never overwrite each other before submission.

use std::collections::HashMap;

use glam::Vec3;
use glimmer_core::{GeometryId, Layers, Scene, SceneTarget, Shading};

use crate::buffer::{align_to, create_uniform_buffer, update_uniform};
use crate::camera::Camera;
use crate::error::RenderResult;
use crate::mesh_render::{MeshRenderData, MeshVertex};
use crate::shader::{uniform_entry, ShaderBuilder};

/// Color format of every scene and post-processing target.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Depth format of the scene targets.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const INITIAL_OBJECT_CAPACITY: usize = 16;

/// Camera uniforms. Layout must match `Camera` in scene.wgsl (80 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 4],
}

impl CameraUniforms {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            position: camera.position.extend(1.0).to_array(),
        }
    }
}

/// Per-object uniforms. Layout must match `Object` in scene.wgsl (96 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// 0 = unlit, 1 = headlight
    pub shading: u32,
    pub _pad: [u32; 3],
}

impl ObjectUniforms {
    pub fn new(model: glam::Mat4, color: Vec3, shading: Shading) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color: color.extend(1.0).to_array(),
            shading: match shading {
                Shading::Unlit => 0,
                Shading::Headlight => 1,
            },
            _pad: [0; 3],
        }
    }
}

/// Lays out `objects` at `stride`-byte intervals.
pub fn pack_object_uniforms(objects: &[ObjectUniforms], stride: u64) -> Vec<u8> {
    let stride = stride as usize;
    let size = std::mem::size_of::<ObjectUniforms>();
    let mut bytes = vec![0u8; objects.len() * stride];
    for (i, object) in objects.iter().enumerate() {
        bytes[i * stride..i * stride + size].copy_from_slice(bytemuck::bytes_of(object));
    }
    bytes
}

/// Growable uniform buffer holding one [`ObjectUniforms`] slot per draw.
struct ObjectArena {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: usize,
}

impl ObjectArena {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
        label: &str,
    ) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<ObjectUniforms>() as u64),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            capacity,
        }
    }
}

struct Draw {
    geometry: GeometryId,
    wireframe: bool,
}

/// Scene render resources.
pub struct ScenePass {
    fill_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    object_layout: wgpu::BindGroupLayout,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    arenas: [ObjectArena; 2],
    stride: u64,
    meshes: HashMap<GeometryId, MeshRenderData>,
    scene_uid: Option<u64>,
}

impl ScenePass {
    /// Creates the scene pipelines and buffers.
    pub fn new(device: &wgpu::Device) -> RenderResult<Self> {
        let camera_size = std::mem::size_of::<CameraUniforms>() as u64;
        let object_size = std::mem::size_of::<ObjectUniforms>() as u64;
        let stride = align_to(
            object_size,
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Camera Bind Group Layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                false,
                camera_size,
            )],
        });
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Object Bind Group Layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                true,
                object_size,
            )],
        });

        let camera_buffer = create_uniform_buffer(
            device,
            &CameraUniforms::from_camera(&Camera::default()),
            Some("Scene Camera Buffer"),
        );
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let source = include_str!("shaders/scene.wgsl");
        let shader = ShaderBuilder::new()
            .with_vertex(source)
            .with_fragment(source)
            .with_label("Scene Shader")
            .build_module(device)?;

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let fill_pipeline = create_pipeline(
            device,
            &layout,
            &shader,
            wgpu::PrimitiveTopology::TriangleList,
            "Scene Fill Pipeline",
        );
        let line_pipeline = create_pipeline(
            device,
            &layout,
            &shader,
            wgpu::PrimitiveTopology::LineList,
            "Scene Line Pipeline",
        );

        let arenas = [
            ObjectArena::new(
                device,
                &object_layout,
                stride,
                INITIAL_OBJECT_CAPACITY,
                "Base Object Uniforms",
            ),
            ObjectArena::new(
                device,
                &object_layout,
                stride,
                INITIAL_OBJECT_CAPACITY,
                "Bloom Source Object Uniforms",
            ),
        ];

        Ok(Self {
            fill_pipeline,
            line_pipeline,
            object_layout,
            camera_buffer,
            camera_bind_group,
            arenas,
            stride,
            meshes: HashMap::new(),
            scene_uid: None,
        })
    }

    /// Uploads the camera for the current frame.
    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &Camera) {
        update_uniform(queue, &self.camera_buffer, &CameraUniforms::from_camera(camera));
    }

    /// Number of geometries with GPU buffers.
    pub fn cached_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Records a pass drawing every visible object of `scene` whose layers
    /// intersect `visibility`, cleared to `clear_color` first.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: SceneTarget,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        scene: &Scene,
        visibility: Layers,
        clear_color: Vec3,
    ) {
        if self.scene_uid != Some(scene.uid()) {
            self.meshes.clear();
            self.scene_uid = Some(scene.uid());
        }
        self.meshes.retain(|id, _| scene.geometry(*id).is_some());

        let mut draws = Vec::new();
        let mut uniforms = Vec::new();
        for (_, object) in scene.objects() {
            if !object.visible || !object.layers.test(visibility) {
                continue;
            }
            let Some(material) = scene.material(object.material) else {
                log::warn!("object '{}' has no material, skipping", object.name);
                continue;
            };
            let Some(geometry) = scene.geometry(object.geometry) else {
                log::warn!("object '{}' has no geometry, skipping", object.name);
                continue;
            };

            self.meshes
                .entry(object.geometry)
                .or_insert_with(|| MeshRenderData::new(device, geometry));
            draws.push(Draw {
                geometry: object.geometry,
                wireframe: material.wireframe,
            });
            uniforms.push(ObjectUniforms::new(
                object.transform.matrix(),
                material.color,
                material.shading,
            ));
        }

        let slot = match target {
            SceneTarget::Base => 0,
            SceneTarget::BloomSource => 1,
        };
        if self.arenas[slot].capacity < draws.len() {
            let capacity = draws.len().next_power_of_two();
            log::debug!("growing {target:?} object uniforms to {capacity} slots");
            self.arenas[slot] = ObjectArena::new(
                device,
                &self.object_layout,
                self.stride,
                capacity,
                "Object Uniforms",
            );
        }
        let arena = &self.arenas[slot];
        if !uniforms.is_empty() {
            queue.write_buffer(&arena.buffer, 0, &pack_object_uniforms(&uniforms, self.stride));
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: f64::from(clear_color.x),
                        g: f64::from(clear_color.y),
                        b: f64::from(clear_color.z),
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        for (i, draw) in draws.iter().enumerate() {
            let Some(mesh) = self.meshes.get(&draw.geometry) else {
                continue;
            };
            let (index_buffer, index_count) = mesh.indices(draw.wireframe);
            if index_count == 0 {
                continue;
            }
            let pipeline = if draw.wireframe {
                &self.line_pipeline
            } else {
                &self.fill_pipeline
            };
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(1, &arena.bind_group, &[(i as u64 * self.stride) as u32]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..index_count, 0, 0..1);
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    topology: wgpu::PrimitiveTopology,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[MeshVertex::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_match_shader() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 80);
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 96);
    }

    #[test]
    fn test_shading_encoding() {
        let unlit = ObjectUniforms::new(glam::Mat4::IDENTITY, Vec3::ONE, Shading::Unlit);
        let lit = ObjectUniforms::new(glam::Mat4::IDENTITY, Vec3::ONE, Shading::Headlight);
        assert_eq!(unlit.shading, 0);
        assert_eq!(lit.shading, 1);
        assert_eq!(lit.color[3], 1.0);
    }

    #[test]
    fn test_pack_respects_stride() {
        let a = ObjectUniforms::new(glam::Mat4::IDENTITY, Vec3::X, Shading::Unlit);
        let b = ObjectUniforms::new(glam::Mat4::IDENTITY, Vec3::Y, Shading::Headlight);
        let bytes = pack_object_uniforms(&[a, b], 256);
        assert_eq!(bytes.len(), 512);
        assert_eq!(&bytes[..96], bytemuck::bytes_of(&a));
        assert_eq!(&bytes[256..352], bytemuck::bytes_of(&b));
        assert!(bytes[96..256].iter().all(|&byte| byte == 0));
    }
}
