//! Layer classification for render passes.
//!
//! Every object carries a [`Layers`] bitmask. A pass renders an object when the
//! pass's visibility mask and the object's mask share at least one layer.
//! Objects are always members of [`Layer::EntireScene`]; tagging an object for
//! bloom additionally enables [`Layer::BloomScene`].

use serde::{Deserialize, Serialize};

/// A render layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Rendered by every pass that views the whole scene.
    EntireScene,
    /// Also rendered into the glow pass.
    BloomScene,
}

impl Layer {
    /// Bit index of this layer inside a [`Layers`] mask.
    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            Layer::EntireScene => 0,
            Layer::BloomScene => 1,
        }
    }

    const fn bit(self) -> u32 {
        1 << self.index()
    }
}

/// A set of layers stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layers(u32);

impl Layers {
    /// A mask containing only `layer`.
    #[must_use]
    pub const fn only(layer: Layer) -> Self {
        Self(layer.bit())
    }

    /// The default object mask: member of the entire scene only.
    #[must_use]
    pub const fn entire_scene() -> Self {
        Self::only(Layer::EntireScene)
    }

    /// Adds `layer` to the mask.
    pub fn enable(&mut self, layer: Layer) {
        self.0 |= layer.bit();
    }

    /// Removes `layer` from the mask.
    pub fn disable(&mut self, layer: Layer) {
        self.0 &= !layer.bit();
    }

    /// Replaces the mask with `layer` alone.
    pub fn set(&mut self, layer: Layer) {
        self.0 = layer.bit();
    }

    /// Returns true if `layer` is in the mask.
    #[must_use]
    pub const fn contains(self, layer: Layer) -> bool {
        self.0 & layer.bit() != 0
    }

    /// Returns true if the two masks share at least one layer.
    #[must_use]
    pub const fn test(self, other: Layers) -> bool {
        self.0 & other.0 != 0
    }

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl Default for Layers {
    fn default() -> Self {
        Self::entire_scene()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_entire_scene() {
        let layers = Layers::default();
        assert!(layers.contains(Layer::EntireScene));
        assert!(!layers.contains(Layer::BloomScene));
    }

    #[test]
    fn test_enable_disable() {
        let mut layers = Layers::default();
        layers.enable(Layer::BloomScene);
        assert!(layers.contains(Layer::BloomScene));
        assert!(layers.contains(Layer::EntireScene));

        layers.disable(Layer::BloomScene);
        assert!(!layers.contains(Layer::BloomScene));
    }

    #[test]
    fn test_mask_intersection() {
        let bloom_only = Layers::only(Layer::BloomScene);
        let mut tagged = Layers::default();
        let untagged = Layers::default();
        tagged.enable(Layer::BloomScene);

        assert!(bloom_only.test(tagged));
        assert!(!bloom_only.test(untagged));
        assert!(Layers::entire_scene().test(untagged));
        assert!(Layers::entire_scene().test(tagged));
    }

    #[test]
    fn test_set_replaces() {
        let mut layers = Layers::default();
        layers.set(Layer::BloomScene);
        assert_eq!(layers, Layers::only(Layer::BloomScene));
        assert_eq!(layers.bits(), 0b10);
    }
}
