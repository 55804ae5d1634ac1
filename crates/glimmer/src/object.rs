use crate::init::{context, context_mut};
use crate::{Geometry, GlimmerError, Material, ObjectId, Result, Vec3};

/// Registers an object built from `geometry` and `material`.
///
/// The object starts on the entire-scene layer only; call
/// [`ObjectHandle::set_bloom`] to make it glow.
pub fn register_object(
    name: impl Into<String>,
    geometry: Geometry,
    material: Material,
) -> Result<ObjectHandle> {
    let name = name.into();
    let id = context_mut(|ctx| {
        let geometry = ctx.scene.add_geometry(geometry);
        let material = ctx.scene.add_material(material);
        ctx.scene.add_object(name.clone(), geometry, material)
    })??;
    log::debug!("registered object '{name}'");
    Ok(ObjectHandle { id })
}

/// Gets a registered object by name.
#[must_use]
pub fn get_object(name: &str) -> Option<ObjectHandle> {
    context(|ctx| ctx.scene.find(name))
        .ok()
        .flatten()
        .map(|id| ObjectHandle { id })
}

/// Removes an object by name, along with its geometry and material unless
/// another object still uses them. A running animation on it is dropped on
/// the next frame.
pub fn remove_object(name: &str) -> Result<()> {
    context_mut(|ctx| {
        let id = ctx
            .scene
            .find(name)
            .ok_or_else(|| GlimmerError::ObjectNotFound(name.to_string()))?;
        if let Some(object) = ctx.scene.remove_object(id) {
            ctx.scene.remove_geometry(object.geometry);
            ctx.scene.remove_material(object.material);
        }
        ctx.spin_targets.remove(&id);
        Ok(())
    })?
}

/// Removes every object and the geometries and materials they used.
pub fn remove_all_objects() -> Result<()> {
    context_mut(|ctx| {
        ctx.scene.clear();
        let pruned = ctx.scene.prune_library();
        ctx.spin_targets.clear();
        log::debug!("removed all objects, {pruned} library entries dropped");
    })
}

/// Number of geometries and materials held by the scene library, not
/// counting the shared mask material.
pub fn library_size() -> Result<(usize, usize)> {
    context(|ctx| (ctx.scene.geometry_count(), ctx.scene.material_count()))
}

/// Number of registered objects.
pub fn object_count() -> Result<usize> {
    context(|ctx| ctx.scene.len())
}

/// Handle for a registered object.
///
/// Handles stay valid after the object is removed; operations on them then
/// return [`GlimmerError::ObjectNotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHandle {
    id: ObjectId,
}

impl ObjectHandle {
    /// The scene id of this object.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns the name of this object.
    pub fn name(&self) -> Result<String> {
        self.read(|object| object.name.clone())
    }

    /// Whether the object still exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        context(|ctx| ctx.scene.contains(self.id)).unwrap_or(false)
    }

    /// Adds the object to, or removes it from, the bloom layer.
    pub fn set_bloom(&self, enabled: bool) -> Result<&Self> {
        context_mut(|ctx| ctx.scene.set_bloom(self.id, enabled))??;
        Ok(self)
    }

    /// Toggles the bloom layer and returns the new state.
    pub fn toggle_bloom(&self) -> Result<bool> {
        context_mut(|ctx| ctx.scene.toggle_bloom(self.id))?
    }

    /// Whether the object is on the bloom layer.
    pub fn is_bloom(&self) -> Result<bool> {
        self.read(crate::SceneObject::is_bloom)
    }

    pub fn set_position(&self, position: Vec3) -> Result<&Self> {
        self.write(|object| object.transform.position = position)?;
        Ok(self)
    }

    /// Sets the XYZ Euler rotation in radians.
    pub fn set_rotation(&self, rotation: Vec3) -> Result<&Self> {
        self.write(|object| object.transform.rotation = rotation)?;
        Ok(self)
    }

    pub fn set_scale(&self, scale: Vec3) -> Result<&Self> {
        self.write(|object| object.transform.scale = scale)?;
        Ok(self)
    }

    pub fn set_visible(&self, visible: bool) -> Result<&Self> {
        self.write(|object| object.visible = visible)?;
        Ok(self)
    }

    /// Current transform as position, rotation and scale.
    pub fn transform(&self) -> Result<crate::Transform> {
        self.read(|object| object.transform)
    }

    /// Starts the spin-and-tag animation: one full turn on every axis over
    /// two seconds, then the object joins the bloom layer. Replaces any
    /// animation already running on this object.
    pub fn spin(&self) -> Result<&Self> {
        context_mut(|ctx| {
            if ctx
                .frame_loop
                .scheduler
                .spin_and_tag(self.id, &mut ctx.scene)
            {
                Ok(())
            } else {
                Err(GlimmerError::ObjectNotFound(format!("{:?}", self.id)))
            }
        })??;
        Ok(self)
    }

    /// Whether an animation is running on this object.
    pub fn is_animating(&self) -> Result<bool> {
        context(|ctx| ctx.frame_loop.scheduler.is_animating(self.id))
    }

    /// Marks the object to be spun by the viewer's Space key.
    pub fn set_spin_target(&self, enabled: bool) -> Result<&Self> {
        context_mut(|ctx| {
            if !ctx.scene.contains(self.id) {
                return Err(GlimmerError::ObjectNotFound(format!("{:?}", self.id)));
            }
            if enabled {
                ctx.spin_targets.insert(self.id);
            } else {
                ctx.spin_targets.remove(&self.id);
            }
            Ok(())
        })??;
        Ok(self)
    }

    fn read<R>(&self, f: impl FnOnce(&crate::SceneObject) -> R) -> Result<R> {
        context(|ctx| {
            ctx.scene
                .object(self.id)
                .map(f)
                .ok_or_else(|| GlimmerError::ObjectNotFound(format!("{:?}", self.id)))
        })?
    }

    fn write<R>(&self, f: impl FnOnce(&mut crate::SceneObject) -> R) -> Result<R> {
        context_mut(|ctx| {
            ctx.scene
                .object_mut(self.id)
                .map(f)
                .ok_or_else(|| GlimmerError::ObjectNotFound(format!("{:?}", self.id)))
        })?
    }
}

/// Spins every object marked with [`ObjectHandle::set_spin_target`].
/// Returns the number of animations started.
pub fn spin_targets() -> Result<usize> {
    context_mut(glimmer_core::Context::spin_targets_now)
}
