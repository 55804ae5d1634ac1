//! Per-frame sequencing.
//!
//! [`FrameSequencer`] turns a [`RenderMode`] into backend calls for one frame,
//! bracketing the glow render with a darken/restore pair. [`FrameLoop`] wraps
//! it with resize handling, animation advancement and frame statistics.
//!
//! The GPU lives behind [`RenderBackend`], so the sequencing can be driven by
//! any implementation, including a recording one in tests.

use glam::Vec3;

use crate::animation::AnimationScheduler;
use crate::bloom::BloomConfig;
use crate::error::{GlimmerError, Result};
use crate::layer::{Layer, Layers};
use crate::material_cache::MaterialCache;
use crate::options::Options;
use crate::render_mode::{FramePlan, Isolation, Presented, RenderMode};
use crate::scene::Scene;
use crate::stats::FrameStats;

/// Output surface size in physical pixels. Both dimensions are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GlimmerError::InvalidViewport { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Color target a scene render writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneTarget {
    /// The normally lit scene.
    Base,
    /// Input of the glow chain.
    BloomSource,
}

/// The GPU side of a frame.
///
/// Calls within a frame arrive in this order: `begin_frame`, zero to two
/// `render_scene`, optional `run_bloom`, optional `composite`, `present`.
pub trait RenderBackend {
    /// Resizes every size-dependent target and the camera projection.
    fn resize(&mut self, viewport: Viewport) -> Result<()>;

    /// Starts recording a frame, discarding anything left from a failed one.
    fn begin_frame(&mut self) -> Result<()>;

    /// Draws every object whose layers intersect `visibility`, using the
    /// material each object holds at the time of the call.
    fn render_scene(
        &mut self,
        target: SceneTarget,
        scene: &Scene,
        visibility: Layers,
        clear_color: Vec3,
    ) -> Result<()>;

    /// Derives the glow texture from the bloom source.
    fn run_bloom(&mut self, config: &BloomConfig) -> Result<()>;

    /// Adds the glow texture onto the base image.
    fn composite(&mut self) -> Result<()>;

    /// Writes `source` to the output through the exposure curve and submits.
    fn present(&mut self, source: Presented, exposure: f32) -> Result<()>;
}

/// What a frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub mode: RenderMode,
    /// Objects swapped to the mask material for the glow render.
    pub darkened: usize,
    /// Objects given back their material afterwards.
    pub restored: usize,
    pub presented: Presented,
}

/// Runs the passes of one frame and owns the material cache.
#[derive(Debug, Default)]
pub struct FrameSequencer {
    cache: MaterialCache,
}

impl FrameSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materials currently awaiting restore. Zero between frames.
    pub fn pending_restores(&self) -> usize {
        self.cache.len()
    }

    /// Runs the frame selected by `options.render_mode`.
    ///
    /// The mode is read once. When the glow render darkens the scene, every
    /// material is restored before this returns, even if the backend fails.
    pub fn run<B: RenderBackend + ?Sized>(
        &mut self,
        scene: &mut Scene,
        options: &Options,
        backend: &mut B,
    ) -> Result<FrameReport> {
        let mode = options.render_mode;
        let plan = mode.plan();
        log::debug!("frame plan for {mode}: {plan:?}");

        backend.begin_frame()?;

        let mut report = FrameReport {
            mode,
            darkened: 0,
            restored: 0,
            presented: plan.presented,
        };

        if plan.bloom {
            let (darkened, restored) = self.render_glow(&plan, scene, options, backend)?;
            report.darkened = darkened;
            report.restored = restored;
        }

        if plan.base {
            backend.render_scene(
                SceneTarget::Base,
                scene,
                Layers::only(Layer::EntireScene),
                options.background_color,
            )?;
        }

        if plan.composite {
            backend.composite()?;
        }

        backend.present(plan.presented, options.bloom.tone_mapping_exposure())?;
        Ok(report)
    }

    fn render_glow<B: RenderBackend + ?Sized>(
        &mut self,
        plan: &FramePlan,
        scene: &mut Scene,
        options: &Options,
        backend: &mut B,
    ) -> Result<(usize, usize)> {
        match plan.isolation {
            Isolation::Darken => {
                let darkened = self.cache.darken(scene)?;
                let rendered = backend.render_scene(
                    SceneTarget::BloomSource,
                    scene,
                    Layers::only(Layer::EntireScene),
                    Vec3::ZERO,
                );
                let restored = self.cache.restore(scene);
                rendered?;
                backend.run_bloom(&options.bloom)?;
                Ok((darkened, restored))
            }
            Isolation::LayerMask => {
                backend.render_scene(
                    SceneTarget::BloomSource,
                    scene,
                    Layers::only(Layer::BloomScene),
                    Vec3::ZERO,
                )?;
                backend.run_bloom(&options.bloom)?;
                Ok((0, 0))
            }
        }
    }
}

/// Drives whole frames: resize, animation, render, statistics.
#[derive(Debug)]
pub struct FrameLoop {
    pub scheduler: AnimationScheduler,
    pub stats: FrameStats,
    sequencer: FrameSequencer,
    viewport: Option<Viewport>,
    pending_resize: Option<Viewport>,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            scheduler: AnimationScheduler::new(),
            stats: FrameStats::new(),
            sequencer: FrameSequencer::new(),
            viewport: None,
            pending_resize: None,
        }
    }

    /// The viewport the backend was last sized to.
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Materials awaiting restore. Zero between frames.
    pub fn pending_restores(&self) -> usize {
        self.sequencer.pending_restores()
    }

    /// Queues a resize for the start of the next frame.
    ///
    /// Zero-sized requests are ignored. Requests matching the current size
    /// cancel any queued change.
    pub fn request_resize(&mut self, width: u32, height: u32) {
        let Ok(viewport) = Viewport::new(width, height) else {
            log::warn!("ignoring resize to {width}x{height}");
            return;
        };
        if self.viewport == Some(viewport) {
            self.pending_resize = None;
        } else {
            self.pending_resize = Some(viewport);
        }
    }

    /// Runs one frame `dt` seconds after the previous one.
    ///
    /// Backend failures skip the rest of the frame's render work and are
    /// logged; the returned report is `None` for a skipped frame.
    pub fn tick<B: RenderBackend + ?Sized>(
        &mut self,
        dt: f32,
        scene: &mut Scene,
        options: &Options,
        backend: &mut B,
    ) -> Option<FrameReport> {
        if let Some(viewport) = self.pending_resize.take() {
            match backend.resize(viewport) {
                Ok(()) => {
                    log::debug!("resized to {}x{}", viewport.width(), viewport.height());
                    self.viewport = Some(viewport);
                }
                Err(e) => log::warn!("resize failed: {e}"),
            }
        }

        self.scheduler.advance(dt, scene);

        match self.sequencer.run(scene, options, backend) {
            Ok(report) => {
                self.stats.record(dt);
                Some(report)
            }
            Err(e) => {
                log::warn!("skipping frame: {e}");
                self.stats.record_skipped();
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::material::{Material, MaterialId};
    use crate::scene::ObjectId;

    /// A backend call, with what the scene looked like at the time.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Resize(u32, u32),
        Begin,
        Render {
            target: SceneTarget,
            visibility: Layers,
            drawn: usize,
            masked: usize,
        },
        Bloom,
        Composite,
        Present(Presented),
    }

    #[derive(Default)]
    pub struct RecordingBackend {
        pub calls: Vec<Call>,
        pub fail_render: Option<SceneTarget>,
        pub fail_resize: bool,
    }

    impl RenderBackend for RecordingBackend {
        fn resize(&mut self, viewport: Viewport) -> Result<()> {
            if self.fail_resize {
                return Err(GlimmerError::RenderError("resize".into()));
            }
            self.calls.push(Call::Resize(viewport.width(), viewport.height()));
            Ok(())
        }

        fn begin_frame(&mut self) -> Result<()> {
            self.calls.push(Call::Begin);
            Ok(())
        }

        fn render_scene(
            &mut self,
            target: SceneTarget,
            scene: &Scene,
            visibility: Layers,
            _clear_color: Vec3,
        ) -> Result<()> {
            let visible: Vec<_> = scene
                .objects()
                .filter(|(_, o)| o.visible && visibility.test(o.layers))
                .collect();
            self.calls.push(Call::Render {
                target,
                visibility,
                drawn: visible.len(),
                masked: visible
                    .iter()
                    .filter(|(_, o)| o.material == scene.mask_material())
                    .count(),
            });
            if self.fail_render == Some(target) {
                return Err(GlimmerError::RenderError("render".into()));
            }
            Ok(())
        }

        fn run_bloom(&mut self, _config: &BloomConfig) -> Result<()> {
            self.calls.push(Call::Bloom);
            Ok(())
        }

        fn composite(&mut self) -> Result<()> {
            self.calls.push(Call::Composite);
            Ok(())
        }

        fn present(&mut self, source: Presented, _exposure: f32) -> Result<()> {
            self.calls.push(Call::Present(source));
            Ok(())
        }
    }

    fn scene_with(tags: &[bool]) -> (Scene, Vec<ObjectId>, Vec<MaterialId>) {
        let mut scene = Scene::new();
        let geometry = scene.add_geometry(Geometry::icosphere(1.0, 2));
        let mut ids = Vec::new();
        let mut mats = Vec::new();
        for (i, &tagged) in tags.iter().enumerate() {
            let material = scene.add_material(Material::basic(format!("m{i}"), Vec3::ONE));
            let id = scene.add_object(format!("o{i}"), geometry, material).unwrap();
            scene.set_bloom(id, tagged).unwrap();
            ids.push(id);
            mats.push(material);
        }
        (scene, ids, mats)
    }

    fn options_for(mode: RenderMode) -> Options {
        Options {
            render_mode: mode,
            ..Options::default()
        }
    }

    #[test]
    fn test_scene_with_glow_sequence() {
        let tags = [true, false, false, true, false, false, true, false, false, false];
        let (mut scene, ids, mats) = scene_with(&tags);
        let mut options = options_for(RenderMode::SceneWithGlow);
        options.bloom = BloomConfig::new(0.1, 0.6, 2.5, 1.0).unwrap();
        let mut backend = RecordingBackend::default();
        let mut sequencer = FrameSequencer::new();

        let report = sequencer.run(&mut scene, &options, &mut backend).unwrap();
        assert_eq!(report.darkened, 7);
        assert_eq!(report.restored, 7);
        assert_eq!(sequencer.pending_restores(), 0);

        assert_eq!(
            backend.calls,
            vec![
                Call::Begin,
                Call::Render {
                    target: SceneTarget::BloomSource,
                    visibility: Layers::entire_scene(),
                    drawn: 10,
                    masked: 7,
                },
                Call::Bloom,
                Call::Render {
                    target: SceneTarget::Base,
                    visibility: Layers::entire_scene(),
                    drawn: 10,
                    masked: 0,
                },
                Call::Composite,
                Call::Present(Presented::Composite),
            ]
        );

        for (id, material) in ids.iter().zip(mats) {
            assert_eq!(scene.object(*id).unwrap().material, material);
        }
    }

    #[test]
    fn test_glow_only_routes_bloom_output() {
        let (mut scene, _, _) = scene_with(&[true, false, false]);
        let mut backend = RecordingBackend::default();
        let report = FrameSequencer::new()
            .run(&mut scene, &options_for(RenderMode::GlowOnly), &mut backend)
            .unwrap();

        assert_eq!(report.presented, Presented::Glow);
        assert_eq!(report.darkened, 0);
        assert_eq!(
            backend.calls,
            vec![
                Call::Begin,
                Call::Render {
                    target: SceneTarget::BloomSource,
                    visibility: Layers::only(Layer::BloomScene),
                    drawn: 1,
                    masked: 0,
                },
                Call::Bloom,
                Call::Present(Presented::Glow),
            ]
        );
    }

    #[test]
    fn test_scene_only_skips_glow() {
        let (mut scene, _, _) = scene_with(&[true, false]);
        let mut backend = RecordingBackend::default();
        FrameSequencer::new()
            .run(&mut scene, &options_for(RenderMode::SceneOnly), &mut backend)
            .unwrap();

        assert!(!backend.calls.contains(&Call::Bloom));
        assert!(!backend.calls.contains(&Call::Composite));
        assert_eq!(backend.calls.last(), Some(&Call::Present(Presented::Base)));
    }

    #[test]
    fn test_same_mode_twice_same_calls() {
        for mode in RenderMode::ALL {
            let (mut scene, _, _) = scene_with(&[true, false, true]);
            let options = options_for(mode);
            let mut sequencer = FrameSequencer::new();

            let mut first = RecordingBackend::default();
            sequencer.run(&mut scene, &options, &mut first).unwrap();
            let mut second = RecordingBackend::default();
            sequencer.run(&mut scene, &options, &mut second).unwrap();
            assert_eq!(first.calls, second.calls);
        }
    }

    #[test]
    fn test_restore_runs_when_glow_render_fails() {
        let (mut scene, ids, mats) = scene_with(&[false, false, true]);
        let mut backend = RecordingBackend {
            fail_render: Some(SceneTarget::BloomSource),
            ..RecordingBackend::default()
        };
        let mut sequencer = FrameSequencer::new();

        assert!(sequencer
            .run(&mut scene, &options_for(RenderMode::SceneWithGlow), &mut backend)
            .is_err());
        assert_eq!(sequencer.pending_restores(), 0);
        for (id, material) in ids.iter().zip(mats) {
            assert_eq!(scene.object(*id).unwrap().material, material);
        }

        backend.fail_render = None;
        assert!(sequencer
            .run(&mut scene, &options_for(RenderMode::SceneWithGlow), &mut backend)
            .is_ok());
    }

    #[test]
    fn test_loop_applies_resize_before_render() {
        let (mut scene, _, _) = scene_with(&[true]);
        let options = Options::default();
        let mut backend = RecordingBackend::default();
        let mut frame_loop = FrameLoop::new();

        frame_loop.request_resize(0, 600);
        frame_loop.request_resize(800, 600);
        frame_loop.tick(0.016, &mut scene, &options, &mut backend);
        assert_eq!(backend.calls[0], Call::Resize(800, 600));
        assert_eq!(backend.calls[1], Call::Begin);
        assert_eq!(frame_loop.viewport(), Viewport::new(800, 600).ok());

        backend.calls.clear();
        frame_loop.request_resize(800, 600);
        frame_loop.tick(0.016, &mut scene, &options, &mut backend);
        assert!(!backend.calls.iter().any(|c| matches!(c, Call::Resize(..))));
    }

    #[test]
    fn test_loop_keeps_running_after_failure() {
        let (mut scene, _, _) = scene_with(&[false]);
        let options = options_for(RenderMode::SceneOnly);
        let mut backend = RecordingBackend {
            fail_render: Some(SceneTarget::Base),
            ..RecordingBackend::default()
        };
        let mut frame_loop = FrameLoop::new();

        assert!(frame_loop.tick(0.016, &mut scene, &options, &mut backend).is_none());
        assert_eq!(frame_loop.stats.skipped(), 1);

        backend.fail_render = None;
        assert!(frame_loop.tick(0.016, &mut scene, &options, &mut backend).is_some());
        assert_eq!(frame_loop.stats.frames(), 1);
    }

    #[test]
    fn test_animation_advances_before_render() {
        let (mut scene, ids, _) = scene_with(&[false]);
        let mut frame_loop = FrameLoop::new();
        frame_loop.scheduler.spin_and_tag(ids[0], &mut scene);
        let mut backend = RecordingBackend::default();
        let options = Options::default();

        frame_loop.tick(1.0, &mut scene, &options, &mut backend);
        frame_loop.tick(1.0, &mut scene, &options, &mut backend);

        // The second frame's glow render already sees the tag set by the
        // callback that fired during the same frame's animation step.
        let last_glow = backend
            .calls
            .iter()
            .rev()
            .find_map(|c| match c {
                Call::Render {
                    target: SceneTarget::BloomSource,
                    masked,
                    ..
                } => Some(*masked),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_glow, 0);
        assert!(frame_loop.scheduler.is_empty());
    }
}
