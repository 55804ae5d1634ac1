//! Basic integration tests for glimmer.
//!
//! Note: glimmer keeps its scene in global state, so everything touching it
//! runs inside a single test function.

use approx::assert_relative_eq;
use glimmer::*;

fn sphere(name: &str) -> Result<ObjectHandle> {
    register_object(
        name,
        Geometry::icosphere(1.0, 2),
        Material::basic(name, Vec3::new(1.0, 0.5, 0.2)).with_wireframe(true),
    )
}

#[test]
fn test_basics() {
    // Before init
    {
        assert!(!is_initialized());
        assert!(matches!(
            set_bloom_strength(1.0),
            Err(GlimmerError::NotInitialized)
        ));
        assert!(matches!(sphere("early"), Err(GlimmerError::NotInitialized)));
        assert!(get_object("early").is_none());
    }

    init().expect("init failed");
    assert!(is_initialized());
    assert!(matches!(init(), Err(GlimmerError::AlreadyInitialized)));

    // Registration and lookup
    {
        let a = sphere("a").unwrap();
        let _b = sphere("b").unwrap();
        assert_eq!(object_count().unwrap(), 2);
        assert_eq!(get_object("a"), Some(a));
        assert!(get_object("missing").is_none());
        assert_eq!(a.name().unwrap(), "a");
        assert!(matches!(sphere("a"), Err(GlimmerError::ObjectExists(_))));
    }

    // Bloom tagging
    {
        let a = get_object("a").unwrap();
        assert!(!a.is_bloom().unwrap());
        a.set_bloom(true).unwrap();
        assert!(a.is_bloom().unwrap());
        assert!(!a.toggle_bloom().unwrap());
        assert!(!a.is_bloom().unwrap());
    }

    // Transforms
    {
        let b = get_object("b").unwrap();
        b.set_position(Vec3::new(1.0, 2.0, 3.0))
            .unwrap()
            .set_scale(Vec3::splat(0.5))
            .unwrap();
        let transform = b.transform().unwrap();
        assert_eq!(transform.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(transform.scale, Vec3::splat(0.5));
        b.set_visible(false).unwrap();
    }

    // Spin and spin targets
    {
        let a = get_object("a").unwrap();
        a.set_rotation(Vec3::new(0.3, 0.2, 0.1)).unwrap();
        a.spin().unwrap();
        assert!(a.is_animating().unwrap());
        assert_eq!(a.transform().unwrap().rotation, Vec3::ZERO);

        let b = get_object("b").unwrap();
        b.set_spin_target(true).unwrap();
        assert_eq!(spin_targets().unwrap(), 1);
        assert!(b.is_animating().unwrap());
        b.set_spin_target(false).unwrap();
        assert_eq!(spin_targets().unwrap(), 0);
    }

    // Removal leaves stale handles erroring
    {
        let b = get_object("b").unwrap();
        remove_object("b").unwrap();
        assert!(!b.exists());
        assert!(matches!(b.is_bloom(), Err(GlimmerError::ObjectNotFound(_))));
        assert!(matches!(b.spin(), Err(GlimmerError::ObjectNotFound(_))));
        assert!(matches!(
            remove_object("b"),
            Err(GlimmerError::ObjectNotFound(_))
        ));
        assert_eq!(object_count().unwrap(), 1);
    }

    // Validated setters
    {
        set_bloom_threshold(0.1).unwrap();
        set_bloom_strength(0.6).unwrap();
        set_bloom_radius(2.5).unwrap();
        set_exposure(1.2).unwrap();
        let config = bloom_config().unwrap();
        assert_relative_eq!(config.threshold(), 0.1);
        assert_relative_eq!(config.strength(), 0.6);
        assert_relative_eq!(config.radius(), 2.5);
        assert_relative_eq!(config.tone_mapping_exposure(), 1.2_f32.powi(4));

        assert!(matches!(
            set_bloom_threshold(1.5),
            Err(GlimmerError::ParameterOutOfRange { .. })
        ));
        assert!(matches!(
            set_bloom_strength(-0.1),
            Err(GlimmerError::ParameterOutOfRange { .. })
        ));
        assert!(matches!(
            set_exposure(0.0),
            Err(GlimmerError::ParameterOutOfRange { .. })
        ));
        assert!(set_bloom_radius(f32::NAN).is_err());
        // Rejected values leave the previous ones in place
        assert_eq!(bloom_config().unwrap(), config);
    }

    // Render mode
    {
        assert_eq!(render_mode().unwrap(), RenderMode::SceneWithGlow);
        set_render_mode(RenderMode::GlowOnly).unwrap();
        set_render_mode(RenderMode::GlowOnly).unwrap();
        assert_eq!(render_mode().unwrap(), RenderMode::GlowOnly);
    }

    // Options round trip through a file
    {
        set_background_color(Vec3::new(0.1, 0.2, 0.3)).unwrap();
        set_bloom_resolution_divisor(0).unwrap();
        assert_eq!(options().unwrap().bloom_resolution_divisor, 1);
        set_max_fps(30).unwrap();

        let path = std::env::temp_dir().join(format!("glimmer_options_{}.json", std::process::id()));
        save_options(&path).unwrap();
        let saved = options().unwrap();

        set_options(Options::default()).unwrap();
        assert_eq!(render_mode().unwrap(), RenderMode::SceneWithGlow);

        load_options(&path).unwrap();
        assert_eq!(options().unwrap(), saved);
        let _ = std::fs::remove_file(&path);
    }

    // The mask color may not reach the glow
    {
        set_mask_color(Vec3::ZERO).unwrap();
        assert!(matches!(
            set_mask_color(Vec3::splat(0.5)),
            Err(GlimmerError::ParameterOutOfRange { .. })
        ));
        let bright = Options {
            mask_color: Vec3::ONE,
            ..Options::default()
        };
        assert!(set_options(bright).is_err());
        assert_eq!(options().unwrap().mask_color, Vec3::ZERO);
    }

    // Frame stats start empty
    {
        let stats = frame_stats().unwrap();
        assert_eq!(stats.frames(), 0);
        assert_eq!(stats.skipped(), 0);
    }

    // Removing objects releases their geometry and material
    {
        remove_all_objects().unwrap();
        assert_eq!(library_size().unwrap(), (0, 0));

        for _ in 0..100 {
            sphere("tmp").unwrap();
            remove_object("tmp").unwrap();
        }
        assert_eq!(object_count().unwrap(), 0);
        assert_eq!(library_size().unwrap(), (0, 0));

        sphere("x").unwrap();
        sphere("y").unwrap();
        assert_eq!(library_size().unwrap(), (2, 2));
        remove_object("x").unwrap();
        assert_eq!(library_size().unwrap(), (1, 1));
        remove_all_objects().unwrap();
        assert_eq!(library_size().unwrap(), (0, 0));
    }

    // Shutdown and re-init give a fresh scene
    {
        remove_all_objects().unwrap();
        assert_eq!(object_count().unwrap(), 0);
        sphere("c").unwrap();

        shutdown();
        assert!(!is_initialized());
        assert!(matches!(object_count(), Err(GlimmerError::NotInitialized)));

        init().unwrap();
        assert_eq!(object_count().unwrap(), 0);
        assert_eq!(options().unwrap(), Options::default());
        shutdown();
    }
}

/// Requires a display. Run with `cargo test -- --ignored`.
#[test]
#[ignore = "opens a window"]
fn test_show() {
    init().unwrap();
    sphere("shown").unwrap().set_bloom(true).unwrap();
    show();
}
