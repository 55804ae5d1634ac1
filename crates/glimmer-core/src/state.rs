//! Global state management for glimmer.

use std::collections::HashSet;
use std::sync::{OnceLock, RwLock};

use crate::error::{GlimmerError, Result};
use crate::frame::FrameLoop;
use crate::options::Options;
use crate::scene::{ObjectId, Scene};

/// Global context singleton.
static CONTEXT: OnceLock<RwLock<Context>> = OnceLock::new();

/// The global context containing all glimmer state.
#[derive(Default)]
pub struct Context {
    /// Whether glimmer has been initialized.
    pub initialized: bool,

    /// Objects, materials and geometry.
    pub scene: Scene,

    /// Global options.
    pub options: Options,

    /// Animation scheduler, frame statistics and the material-swap sequencer.
    pub frame_loop: FrameLoop,

    /// Objects the viewer spins on request.
    pub spin_targets: HashSet<ObjectId>,
}

impl Context {
    /// Applies option changes that live in the scene.
    pub fn sync_options(&mut self) {
        self.scene.set_mask_color(self.options.mask_color);
    }

    /// Starts the spin-and-tag animation on every spin target still in the
    /// scene. Returns the number started.
    pub fn spin_targets_now(&mut self) -> usize {
        self.spin_targets.retain(|id| self.scene.contains(*id));
        let targets: Vec<_> = self.spin_targets.iter().copied().collect();
        targets
            .into_iter()
            .filter(|id| self.frame_loop.scheduler.spin_and_tag(*id, &mut self.scene))
            .count()
    }
}

/// Initializes the global context.
///
/// Can be called again after [`shutdown_context`].
pub fn init_context() -> Result<()> {
    let lock = CONTEXT.get_or_init(|| RwLock::new(Context::default()));
    let mut ctx = lock
        .write()
        .map_err(|_| GlimmerError::RenderError("context lock poisoned".into()))?;
    if ctx.initialized {
        return Err(GlimmerError::AlreadyInitialized);
    }

    *ctx = Context {
        initialized: true,
        ..Context::default()
    };
    Ok(())
}

/// Returns whether the context has been initialized.
pub fn is_initialized() -> bool {
    CONTEXT
        .get()
        .and_then(|lock| lock.read().ok())
        .is_some_and(|ctx| ctx.initialized)
}

/// Access the global context for reading.
///
/// # Panics
///
/// Panics if glimmer has not been initialized.
pub fn with_context<F, R>(f: F) -> R
where
    F: FnOnce(&Context) -> R,
{
    let lock = CONTEXT.get().expect("glimmer not initialized");
    let guard = lock.read().expect("context lock poisoned");
    f(&guard)
}

/// Access the global context for writing.
///
/// # Panics
///
/// Panics if glimmer has not been initialized.
pub fn with_context_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Context) -> R,
{
    let lock = CONTEXT.get().expect("glimmer not initialized");
    let mut guard = lock.write().expect("context lock poisoned");
    f(&mut guard)
}

/// Try to access the global context for reading.
///
/// Returns `None` if glimmer has not been initialized.
pub fn try_with_context<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&Context) -> R,
{
    let lock = CONTEXT.get()?;
    let guard = lock.read().ok()?;
    guard.initialized.then(|| f(&guard))
}

/// Try to access the global context for writing.
///
/// Returns `None` if glimmer has not been initialized.
pub fn try_with_context_mut<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut Context) -> R,
{
    let lock = CONTEXT.get()?;
    let mut guard = lock.write().ok()?;
    if !guard.initialized {
        return None;
    }
    Some(f(&mut guard))
}

/// Shuts down the global context, dropping every object and pending animation.
pub fn shutdown_context() {
    if let Some(lock) = CONTEXT.get() {
        if let Ok(mut ctx) = lock.write() {
            *ctx = Context::default();
        }
    }
}
