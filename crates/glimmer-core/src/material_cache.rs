//! Temporary material substitution for the glow pass.
//!
//! [`MaterialCache::darken`] records the material of every object that is not
//! tagged for bloom and replaces it with the scene's mask material.
//! [`MaterialCache::restore`] puts every recorded material back and empties the
//! cache. The pair must alternate: a second `darken` before `restore` is
//! rejected without touching the scene.

use crate::error::{GlimmerError, Result};
use crate::layer::{Layer, Layers};
use crate::material::MaterialId;
use crate::scene::{ObjectId, Scene};

/// Original materials of darkened objects, keyed by object handle.
#[derive(Debug, Default)]
pub struct MaterialCache {
    entries: Vec<(ObjectId, MaterialId)>,
}

impl MaterialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps every non-bloom object to the mask material.
    ///
    /// Returns the number of objects darkened.
    pub fn darken(&mut self, scene: &mut Scene) -> Result<usize> {
        if !self.entries.is_empty() {
            log::error!(
                "darken called with {} materials still awaiting restore; scene left untouched",
                self.entries.len()
            );
            return Err(GlimmerError::MaterialSwapActive {
                pending: self.entries.len(),
            });
        }

        let bloom = Layers::only(Layer::BloomScene);
        let mask = scene.mask_material();
        for (id, obj) in scene.objects_mut() {
            if !bloom.test(obj.layers) {
                self.entries.push((id, obj.material));
                obj.material = mask;
            }
        }

        log::debug!("darkened {} objects", self.entries.len());
        Ok(self.entries.len())
    }

    /// Reassigns every recorded material and empties the cache.
    ///
    /// Objects removed since `darken` are skipped. Returns the number of
    /// objects restored.
    pub fn restore(&mut self, scene: &mut Scene) -> usize {
        let mut restored = 0;
        for (id, material) in self.entries.drain(..) {
            if let Some(obj) = scene.object_mut(id) {
                obj.material = material;
                restored += 1;
            }
        }
        restored
    }

    /// Runs `f` between a darken and its restore.
    ///
    /// The restore happens whether or not `f` succeeds.
    pub fn with_darkened<R>(
        &mut self,
        scene: &mut Scene,
        f: impl FnOnce(&mut Scene) -> R,
    ) -> Result<R> {
        self.darken(scene)?;
        let result = f(scene);
        self.restore(scene);
        Ok(result)
    }

    /// Number of materials awaiting restore.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
