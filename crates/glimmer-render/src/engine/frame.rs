//! [`RenderBackend`] implementation.
//!
//! Every pass of a frame is recorded into one command encoder created by
//! `begin_frame` and submitted by `present`.

use glam::Vec3;
use glimmer_core::{BloomConfig, Layers, Presented, RenderBackend, Scene, SceneTarget, Viewport};

use super::RenderEngine;
use crate::error::RenderError;

impl RenderBackend for RenderEngine {
    fn resize(&mut self, viewport: Viewport) -> glimmer_core::Result<()> {
        RenderEngine::resize(self, viewport.width(), viewport.height());
        Ok(())
    }

    fn begin_frame(&mut self) -> glimmer_core::Result<()> {
        if self.encoder.is_some() {
            log::debug!("discarding unfinished frame");
        }
        self.encoder = Some(
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                }),
        );
        self.passes.scene.update_camera(&self.queue, &self.camera);
        Ok(())
    }

    fn render_scene(
        &mut self,
        target: SceneTarget,
        scene: &Scene,
        visibility: Layers,
        clear_color: Vec3,
    ) -> glimmer_core::Result<()> {
        let encoder = self.encoder.as_mut().ok_or(RenderError::NoActiveFrame)?;
        let color_view = match target {
            SceneTarget::Base => &self.targets.base.view,
            SceneTarget::BloomSource => &self.targets.bloom_source.view,
        };
        self.passes.scene.render(
            &self.device,
            &self.queue,
            encoder,
            target,
            color_view,
            &self.targets.depth.view,
            scene,
            visibility,
            clear_color,
        );
        Ok(())
    }

    fn run_bloom(&mut self, config: &BloomConfig) -> glimmer_core::Result<()> {
        self.passes.bloom.update(&self.queue, config);
        let encoder = self.encoder.as_mut().ok_or(RenderError::NoActiveFrame)?;
        self.passes.bloom.render(encoder);
        Ok(())
    }

    fn composite(&mut self) -> glimmer_core::Result<()> {
        let encoder = self.encoder.as_mut().ok_or(RenderError::NoActiveFrame)?;
        self.passes
            .composite
            .render(encoder, &self.targets.composite.view);
        Ok(())
    }

    fn present(&mut self, source: Presented, exposure: f32) -> glimmer_core::Result<()> {
        let mut encoder = self.encoder.take().ok_or(RenderError::NoActiveFrame)?;
        self.passes.tone_map.update_uniforms(&self.queue, exposure);

        let input_view = match source {
            Presented::Base => &self.targets.base.view,
            Presented::Glow => self.passes.bloom.output_view(),
            Presented::Composite => &self.targets.composite.view,
        };

        if let Some(surface) = &self.surface {
            let frame = match surface.get_current_texture() {
                Ok(frame) => frame,
                Err(err) => {
                    if matches!(err, wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) {
                        surface.configure(&self.device, &self.surface_config);
                    }
                    return Err(RenderError::from(err).into());
                }
            };
            let view = frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            self.passes
                .tone_map
                .render_to_target(&self.device, &mut encoder, input_view, &view);
            self.queue.submit(std::iter::once(encoder.finish()));
            frame.present();
        } else if let Some(output) = &self.headless_output {
            self.passes
                .tone_map
                .render_to_target(&self.device, &mut encoder, input_view, &output.view);
            self.queue.submit(std::iter::once(encoder.finish()));
        }
        Ok(())
    }
}
