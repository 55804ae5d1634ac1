//! Headless rendering integration tests.
//!
//! These need a GPU adapter (real or software fallback). Without one they
//! print a message and return early.

use approx::assert_relative_eq;
use glimmer::*;
use glimmer_core::bloom::mip_extents;
use glimmer_core::{FrameLoop, Scene};
use pollster::FutureExt;

const WIDTH: u32 = 160;
const HEIGHT: u32 = 120;

fn engine(width: u32, height: u32) -> Option<RenderEngine> {
    match RenderEngine::new_headless(width, height).block_on() {
        Ok(engine) => Some(engine),
        Err(e) => {
            eprintln!("Skipping headless test: no GPU adapter available ({e})");
            None
        }
    }
}

fn add_sphere(scene: &mut Scene, name: &str, position: Vec3, color: Vec3) -> ObjectId {
    let geometry = scene.add_geometry(Geometry::icosphere(1.0, 3));
    let material = scene.add_material(Material::basic(name, color));
    let id = scene.add_object(name, geometry, material).unwrap();
    scene.object_mut(id).unwrap().transform.position = position;
    id
}

/// Renders one frame of `scene` and reads it back.
fn render(
    engine: &mut RenderEngine,
    frame_loop: &mut FrameLoop,
    scene: &mut Scene,
    options: &Options,
) -> Vec<u8> {
    let report = frame_loop
        .tick(0.0, scene, options, engine)
        .expect("frame skipped");
    assert_eq!(report.mode, options.render_mode);
    engine.capture_output().unwrap()
}

fn is_black(pixels: &[u8]) -> bool {
    pixels.chunks(4).all(|px| px[0] == 0 && px[1] == 0 && px[2] == 0)
}

#[test]
fn headless_without_glow_matches_scene_only() {
    let Some(mut engine) = engine(WIDTH, HEIGHT) else {
        return;
    };
    let mut frame_loop = FrameLoop::new();
    frame_loop.request_resize(WIDTH, HEIGHT);

    let mut scene = Scene::new();
    let glowing = add_sphere(&mut scene, "glowing", Vec3::new(-1.5, 0.0, 0.0), Vec3::ONE);
    add_sphere(&mut scene, "plain", Vec3::new(1.5, 0.0, 0.0), Vec3::new(0.2, 0.8, 0.3));
    scene.set_bloom(glowing, true).unwrap();

    let mut options = Options::default();
    options.bloom = BloomConfig::new(1.0, 0.0, 2.5, 1.0).unwrap();

    options.render_mode = RenderMode::SceneOnly;
    let scene_only = render(&mut engine, &mut frame_loop, &mut scene, &options);
    options.render_mode = RenderMode::SceneWithGlow;
    let with_glow = render(&mut engine, &mut frame_loop, &mut scene, &options);

    assert_eq!(scene_only.len(), (WIDTH * HEIGHT * 4) as usize);
    assert!(!is_black(&scene_only));
    assert!(scene_only == with_glow, "zero-strength glow changed the image");
}

#[test]
fn headless_glow_only_shows_tagged_objects() {
    let Some(mut engine) = engine(WIDTH, HEIGHT) else {
        return;
    };
    let mut frame_loop = FrameLoop::new();
    frame_loop.request_resize(WIDTH, HEIGHT);

    let mut scene = Scene::new();
    let orb = add_sphere(&mut scene, "orb", Vec3::ZERO, Vec3::ONE);

    let mut options = Options::default();
    options.render_mode = RenderMode::GlowOnly;

    let untagged = render(&mut engine, &mut frame_loop, &mut scene, &options);
    assert!(is_black(&untagged), "nothing is tagged, nothing should glow");

    scene.set_bloom(orb, true).unwrap();
    let tagged = render(&mut engine, &mut frame_loop, &mut scene, &options);
    assert!(!is_black(&tagged));
    assert_eq!(frame_loop.stats.frames(), 2);
}

#[test]
fn headless_darkens_only_untagged_objects() {
    let Some(mut engine) = engine(WIDTH, HEIGHT) else {
        return;
    };
    let mut frame_loop = FrameLoop::new();
    frame_loop.request_resize(WIDTH, HEIGHT);

    let mut scene = Scene::new();
    let ids: Vec<_> = (0..10)
        .map(|i| {
            let x = i as f32 - 4.5;
            add_sphere(&mut scene, &format!("sphere {i}"), Vec3::new(x, 0.0, 0.0), Vec3::ONE)
        })
        .collect();
    for id in &ids[..3] {
        scene.set_bloom(*id, true).unwrap();
    }
    let materials: Vec<_> = ids
        .iter()
        .map(|id| scene.object(*id).unwrap().material)
        .collect();

    let mut options = Options::default();
    options.bloom = BloomConfig::new(0.1, 0.6, 2.5, 1.0).unwrap();

    let report = frame_loop
        .tick(0.016, &mut scene, &options, &mut engine)
        .expect("frame skipped");
    assert_eq!(report.darkened, 7);
    assert_eq!(report.restored, 7);
    assert_eq!(frame_loop.pending_restores(), 0);

    let after: Vec<_> = ids
        .iter()
        .map(|id| scene.object(*id).unwrap().material)
        .collect();
    assert_eq!(materials, after);
    assert_eq!(engine.cached_meshes(), 10);
}

#[test]
fn headless_resize_round_trip() {
    let Some(mut engine) = engine(WIDTH, HEIGHT) else {
        return;
    };
    let mut frame_loop = FrameLoop::new();
    let mut scene = Scene::new();
    add_sphere(&mut scene, "orb", Vec3::ZERO, Vec3::ONE);
    let options = Options::default();

    frame_loop.request_resize(WIDTH, HEIGHT);
    render(&mut engine, &mut frame_loop, &mut scene, &options);
    let extents = engine.bloom_extents();
    let aspect = engine.camera.aspect_ratio;

    frame_loop.request_resize(320, 80);
    let wide = render(&mut engine, &mut frame_loop, &mut scene, &options);
    assert_eq!(wide.len(), 320 * 80 * 4);
    assert_eq!(engine.dimensions(), (320, 80));
    assert_relative_eq!(engine.camera.aspect_ratio, 4.0);

    // Zero-sized requests are ignored
    frame_loop.request_resize(0, 80);
    render(&mut engine, &mut frame_loop, &mut scene, &options);
    assert_eq!(engine.dimensions(), (320, 80));

    frame_loop.request_resize(WIDTH, HEIGHT);
    render(&mut engine, &mut frame_loop, &mut scene, &options);
    assert_eq!(engine.dimensions(), (WIDTH, HEIGHT));
    assert_eq!(engine.bloom_extents(), extents);
    assert_eq!(extents, mip_extents(WIDTH, HEIGHT, 2));
    assert_relative_eq!(engine.camera.aspect_ratio, aspect);
}

#[test]
fn headless_resize_skips_unchanged_size() {
    let Some(mut engine) = engine(WIDTH, HEIGHT) else {
        return;
    };
    assert!(!engine.resize(WIDTH, HEIGHT));
    assert!(!engine.resize(0, HEIGHT));
    assert!(engine.resize(320, 80));
    assert!(!engine.resize(320, 80));
    assert_eq!(engine.dimensions(), (320, 80));
}

#[test]
fn headless_drops_meshes_of_removed_geometry() {
    let Some(mut engine) = engine(WIDTH, HEIGHT) else {
        return;
    };
    let mut frame_loop = FrameLoop::new();
    frame_loop.request_resize(WIDTH, HEIGHT);

    let mut scene = Scene::new();
    add_sphere(&mut scene, "kept", Vec3::new(-1.5, 0.0, 0.0), Vec3::ONE);
    let removed = add_sphere(&mut scene, "removed", Vec3::new(1.5, 0.0, 0.0), Vec3::ONE);
    let options = Options::default();

    render(&mut engine, &mut frame_loop, &mut scene, &options);
    assert_eq!(engine.cached_meshes(), 2);

    let object = scene.remove_object(removed).unwrap();
    assert!(scene.remove_geometry(object.geometry).is_some());
    render(&mut engine, &mut frame_loop, &mut scene, &options);
    assert_eq!(engine.cached_meshes(), 1);
}

/// Global-state path, in one function since the context is process-wide.
#[test]
fn headless_render_to_image() {
    assert!(matches!(
        render_to_image(WIDTH, HEIGHT),
        Err(GlimmerError::NotInitialized)
    ));

    init().unwrap();
    for (width, height) in [(0, 8), (8, 0)] {
        assert!(matches!(
            render_to_image(width, height),
            Err(GlimmerError::InvalidViewport { .. })
        ));
    }
    let zero_path = std::env::temp_dir().join(format!("glimmer_zero_{}.png", std::process::id()));
    assert!(matches!(
        render_to_file(&zero_path, 0, 8),
        Err(GlimmerError::InvalidViewport { .. })
    ));
    assert!(!zero_path.exists());

    let orb = register_object(
        "orb",
        Geometry::icosphere(1.0, 3),
        Material::basic("orb", Vec3::new(1.0, 0.6, 0.2)).with_wireframe(true),
    )
    .unwrap();
    orb.set_bloom(true).unwrap();

    let pixels = match render_to_image(WIDTH, HEIGHT) {
        Ok(pixels) => pixels,
        Err(e) => {
            eprintln!("Skipping headless test: no GPU adapter available ({e})");
            return;
        }
    };
    assert_eq!(pixels.len(), (WIDTH * HEIGHT * 4) as usize);
    assert!(!is_black(&pixels));
    assert_eq!(frame_stats().unwrap().frames(), 1);

    let path = std::env::temp_dir().join(format!("glimmer_headless_{}.png", std::process::id()));
    render_to_file(&path, WIDTH, HEIGHT).unwrap();
    assert!(path.exists());
    let _ = std::fs::remove_file(&path);
}
