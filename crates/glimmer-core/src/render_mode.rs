//! Display modes and the pass plan each one selects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GlimmerError;

/// What reaches the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RenderMode {
    /// The normally rendered scene, no glow.
    SceneOnly,
    /// Only the glow texture.
    GlowOnly,
    /// The scene with the glow added on top.
    #[default]
    SceneWithGlow,
}

/// How glowing objects are isolated for the bloom pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    /// Swap non-glowing materials to the mask and render everything, so
    /// glowing objects stay occluded by the geometry in front of them.
    Darken,
    /// Render only objects on the bloom layer.
    LayerMask,
}

/// Which image is handed to the present pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presented {
    Base,
    Glow,
    Composite,
}

/// The passes one frame runs and the image it presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    pub base: bool,
    pub bloom: bool,
    pub composite: bool,
    pub isolation: Isolation,
    pub presented: Presented,
}

impl RenderMode {
    /// Every mode, in control-panel order.
    pub const ALL: [RenderMode; 3] = [
        RenderMode::SceneWithGlow,
        RenderMode::GlowOnly,
        RenderMode::SceneOnly,
    ];

    /// Control-panel label.
    pub fn label(self) -> &'static str {
        match self {
            RenderMode::SceneOnly => "Scene only",
            RenderMode::GlowOnly => "Glow only",
            RenderMode::SceneWithGlow => "Scene with Glow",
        }
    }

    pub fn plan(self) -> FramePlan {
        match self {
            RenderMode::SceneOnly => FramePlan {
                base: true,
                bloom: false,
                composite: false,
                isolation: Isolation::Darken,
                presented: Presented::Base,
            },
            RenderMode::GlowOnly => FramePlan {
                base: false,
                bloom: true,
                composite: false,
                isolation: Isolation::LayerMask,
                presented: Presented::Glow,
            },
            RenderMode::SceneWithGlow => FramePlan {
                base: true,
                bloom: true,
                composite: true,
                isolation: Isolation::Darken,
                presented: Presented::Composite,
            },
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RenderMode {
    type Err = GlimmerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RenderMode::ALL
            .into_iter()
            .find(|mode| mode.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GlimmerError::UnknownRenderMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode() {
        assert_eq!(RenderMode::default(), RenderMode::SceneWithGlow);
    }

    #[test]
    fn test_labels_parse_back() {
        for mode in RenderMode::ALL {
            assert_eq!(mode.to_string().parse::<RenderMode>().unwrap(), mode);
        }
        assert_eq!("glow ONLY".parse::<RenderMode>().unwrap(), RenderMode::GlowOnly);
        assert!("bloom".parse::<RenderMode>().is_err());
    }

    #[test]
    fn test_plans() {
        let scene = RenderMode::SceneOnly.plan();
        assert!(scene.base && !scene.bloom && !scene.composite);
        assert_eq!(scene.presented, Presented::Base);

        let glow = RenderMode::GlowOnly.plan();
        assert!(!glow.base && glow.bloom && !glow.composite);
        assert_eq!(glow.presented, Presented::Glow);

        let both = RenderMode::SceneWithGlow.plan();
        assert!(both.base && both.bloom && both.composite);
        assert_eq!(both.presented, Presented::Composite);
        assert_eq!(both.isolation, Isolation::Darken);
    }

    #[test]
    fn test_plan_is_pure() {
        for mode in RenderMode::ALL {
            assert_eq!(mode.plan(), mode.plan());
        }
    }
}
