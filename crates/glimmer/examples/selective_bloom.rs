//! Selective bloom demo.
//!
//! A ring of wireframe spheres glows while a lit card in the middle stays
//! plain until Space spins it, after which it glows too.
//!
//! Keys: `1` scene with glow, `2` glow only, `3` scene only, Space spins the
//! card, Escape quits.
//!
//! Run with: `cargo run --example selective_bloom`

use glimmer::*;
use rand::Rng;

const SPHERES: usize = 10;

fn main() -> Result<()> {
    init()?;

    let mut rng = rand::thread_rng();
    for i in 0..SPHERES {
        let color = hsl_to_rgb(rng.gen(), 0.7, rng.gen::<f32>() * 0.2 + 0.05);
        let sphere = register_object(
            format!("sphere {i}"),
            Geometry::icosphere(1.0, 15),
            Material::basic(format!("sphere {i}"), color).with_wireframe(true),
        )?;

        let direction = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        )
        .try_normalize()
        .unwrap_or(Vec3::X);
        let distance = rng.gen::<f32>() * 4.0 + 2.0;
        let scale = rng.gen::<f32>() * rng.gen::<f32>() + 0.5;

        sphere
            .set_position(direction * distance)?
            .set_scale(Vec3::splat(scale))?
            .set_bloom(true)?;
    }

    let card = register_object(
        "card",
        Geometry::plane(16.0, 9.0),
        Material::basic("card", Vec3::new(0.9, 0.9, 0.95)).with_shading(Shading::Headlight),
    )?;
    card.set_scale(Vec3::splat(0.5))?.set_spin_target(true)?;

    set_bloom_threshold(0.0)?;
    set_bloom_strength(0.6)?;
    set_bloom_radius(2.5)?;
    set_exposure(1.0)?;

    show();

    let stats = frame_stats()?;
    log::info!(
        "rendered {} frames ({} skipped), last frame {:.2} ms",
        stats.frames(),
        stats.skipped(),
        stats.last_frame_ms()
    );
    Ok(())
}
