//! Initialization and lifecycle management for glimmer.

use crate::{GlimmerError, Result};
use glimmer_core::state::{self, Context};

/// Initializes glimmer with default settings.
///
/// This must be called before any other glimmer function. It sets up the
/// global scene, options and frame loop.
///
/// # Errors
///
/// Returns an error if glimmer has already been initialized.
///
/// # Example
///
/// ```no_run
/// use glimmer::*;
///
/// fn main() -> Result<()> {
///     init()?;
///     // Now you can register objects and call show()
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    state::init_context()?;
    log::info!("glimmer initialized");
    Ok(())
}

/// Returns whether glimmer has been initialized.
#[must_use]
pub fn is_initialized() -> bool {
    state::is_initialized()
}

/// Shuts down glimmer, dropping every object and pending animation.
///
/// After calling this, [`init()`] can be called again.
pub fn shutdown() {
    state::shutdown_context();
    log::info!("glimmer shut down");
}

/// Shows the viewer window.
///
/// Blocks until the window is closed (Escape or the close button).
/// Keys `1`, `2` and `3` select Scene with Glow, Glow only and Scene only;
/// Space spins every object marked as a spin target.
///
/// # Example
///
/// ```no_run
/// use glimmer::*;
///
/// fn main() -> Result<()> {
///     init()?;
///     let sphere = register_object(
///         "sphere",
///         Geometry::icosphere(1.0, 15),
///         Material::basic("sphere", Vec3::new(1.0, 0.4, 0.1)).with_wireframe(true),
///     )?;
///     sphere.set_bloom(true)?;
///     show();
///     Ok(())
/// }
/// ```
pub fn show() {
    let _ = env_logger::try_init();
    if !is_initialized() {
        log::error!("show() called before init()");
        return;
    }
    crate::app::run_app();
}

/// Runs `f` with mutable access to the global context.
pub(crate) fn context_mut<F, R>(f: F) -> Result<R>
where
    F: FnOnce(&mut Context) -> R,
{
    state::try_with_context_mut(f).ok_or(GlimmerError::NotInitialized)
}

/// Runs `f` with read access to the global context.
pub(crate) fn context<F, R>(f: F) -> Result<R>
where
    F: FnOnce(&Context) -> R,
{
    state::try_with_context(f).ok_or(GlimmerError::NotInitialized)
}
