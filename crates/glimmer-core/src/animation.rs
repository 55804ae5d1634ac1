//! Transform animation scheduling.
//!
//! Each object has at most one active [`AnimationTask`]. Starting a task on an
//! object that already has one replaces it, and the replaced task's completion
//! callback is dropped without running. There is no cancel call.

use std::f32::consts::TAU;

use glam::Vec3;
use slotmap::SecondaryMap;

use crate::scene::{ObjectId, Scene, Transform};

/// Easing curves over normalized time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    QuadraticIn,
    QuadraticOut,
    QuadraticInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
}

impl Easing {
    /// Maps `t` in `[0, 1]` to eased progress. Inputs outside are clamped.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticIn => t * t,
            Easing::QuadraticOut => t * (2.0 - t),
            Easing::QuadraticInOut => {
                let k = t * 2.0;
                if k < 1.0 {
                    0.5 * k * k
                } else {
                    let k = k - 1.0;
                    -0.5 * (k * (k - 2.0) - 1.0)
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => {
                let k = t - 1.0;
                k * k * k + 1.0
            }
            Easing::CubicInOut => {
                let k = t * 2.0;
                if k < 1.0 {
                    0.5 * k * k * k
                } else {
                    let k = k - 2.0;
                    0.5 * (k * k * k + 2.0)
                }
            }
        }
    }
}

/// The transform component an animation drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformProperty {
    Position,
    Rotation,
    Scale,
}

impl TransformProperty {
    fn get(self, transform: &Transform) -> Vec3 {
        match self {
            TransformProperty::Position => transform.position,
            TransformProperty::Rotation => transform.rotation,
            TransformProperty::Scale => transform.scale,
        }
    }

    fn set(self, transform: &mut Transform, value: Vec3) {
        match self {
            TransformProperty::Position => transform.position = value,
            TransformProperty::Rotation => transform.rotation = value,
            TransformProperty::Scale => transform.scale = value,
        }
    }
}

/// Runs once when a task reaches its end value.
pub type CompletionCallback = Box<dyn FnOnce(ObjectId, &mut Scene) + Send + Sync>;

/// Interpolation of one transform component from `from` to `to`.
pub struct AnimationTask {
    property: TransformProperty,
    from: Vec3,
    to: Vec3,
    duration: f32,
    elapsed: f32,
    easing: Easing,
    on_complete: Option<CompletionCallback>,
}

impl std::fmt::Debug for AnimationTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationTask")
            .field("property", &self.property)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration", &self.duration)
            .field("elapsed", &self.elapsed)
            .field("easing", &self.easing)
            .field("has_callback", &self.on_complete.is_some())
            .finish()
    }
}

impl AnimationTask {
    /// A linear animation lasting `duration` seconds.
    pub fn new(property: TransformProperty, from: Vec3, to: Vec3, duration: f32) -> Self {
        Self {
            property,
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            easing: Easing::Linear,
            on_complete: None,
        }
    }

    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    #[must_use]
    pub fn on_complete(
        mut self,
        callback: impl FnOnce(ObjectId, &mut Scene) + Send + Sync + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Normalized progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    fn value(&self) -> Vec3 {
        self.from.lerp(self.to, self.easing.apply(self.progress()))
    }
}

/// Per-object animation slots.
#[derive(Debug, Default)]
pub struct AnimationScheduler {
    slots: SecondaryMap<ObjectId, AnimationTask>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `task` on `target`, replacing any active task.
    ///
    /// Returns true if a task was replaced.
    pub fn start(&mut self, target: ObjectId, task: AnimationTask) -> bool {
        match self.slots.insert(target, task) {
            Some(previous) => {
                log::debug!(
                    "replacing animation on {target:?} at {:.0}% progress",
                    previous.progress() * 100.0
                );
                true
            }
            None => false,
        }
    }

    /// Resets the object's rotation, spins it a full turn on every axis over
    /// two seconds, then tags it for bloom.
    pub fn spin_and_tag(&mut self, target: ObjectId, scene: &mut Scene) -> bool {
        let Some(obj) = scene.object_mut(target) else {
            log::warn!("spin requested for missing object {target:?}");
            return false;
        };
        obj.transform.rotation = Vec3::ZERO;

        let task = AnimationTask::new(TransformProperty::Rotation, Vec3::ZERO, Vec3::splat(TAU), 2.0)
            .with_easing(Easing::QuadraticInOut)
            .on_complete(|id, scene| {
                if let Err(e) = scene.set_bloom(id, true) {
                    log::warn!("failed to tag spun object: {e}");
                }
            });
        self.start(target, task);
        true
    }

    /// Advances every task by `dt` seconds.
    ///
    /// Finished tasks write their end value, leave their slot, then run their
    /// callback. Tasks whose target has been removed are dropped. Returns the
    /// number of tasks that finished.
    pub fn advance(&mut self, dt: f32, scene: &mut Scene) -> usize {
        let dt = dt.max(0.0);
        let mut finished = Vec::new();
        let mut orphaned = Vec::new();

        for (id, task) in &mut self.slots {
            let Some(obj) = scene.object_mut(id) else {
                orphaned.push(id);
                continue;
            };
            task.elapsed += dt;
            task.property.set(&mut obj.transform, task.value());
            if task.progress() >= 1.0 {
                finished.push(id);
            }
        }

        for id in orphaned {
            log::warn!("animation target {id:?} no longer exists; dropping task");
            self.slots.remove(id);
        }

        let count = finished.len();
        for id in finished {
            if let Some(task) = self.slots.remove(id) {
                if let Some(callback) = task.on_complete {
                    callback(id, scene);
                }
            }
        }
        count
    }

    /// Whether `target` has an active task.
    pub fn is_animating(&self, target: ObjectId) -> bool {
        self.slots.contains_key(target)
    }

    /// Current value the task on `target` would write, read from the scene if
    /// idle.
    pub fn current_value(
        &self,
        target: ObjectId,
        property: TransformProperty,
        scene: &Scene,
    ) -> Option<Vec3> {
        match self.slots.get(target) {
            Some(task) if task.property == property => Some(task.value()),
            _ => scene.object(target).map(|o| property.get(&o.transform)),
        }
    }

    /// Number of active tasks.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
