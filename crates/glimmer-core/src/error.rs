//! Error types for glimmer.

use thiserror::Error;

/// The main error type for glimmer operations.
#[derive(Error, Debug)]
pub enum GlimmerError {
    /// The global context has not been initialized.
    #[error("glimmer not initialized - call glimmer::init() first")]
    NotInitialized,

    /// The global context has already been initialized.
    #[error("glimmer already initialized")]
    AlreadyInitialized,

    /// No object with the given name exists in the scene.
    #[error("object '{0}' not found")]
    ObjectNotFound(String),

    /// An object with the given name already exists in the scene.
    #[error("object '{0}' already exists")]
    ObjectExists(String),

    /// A material handle does not refer to a live material.
    #[error("material not found")]
    MaterialNotFound,

    /// A geometry handle does not refer to a live geometry.
    #[error("geometry not found")]
    GeometryNotFound,

    /// `darken` was called while a previous darken has not been restored.
    #[error("material swap already active ({pending} materials awaiting restore)")]
    MaterialSwapActive { pending: usize },

    /// A configuration parameter was outside of its valid range.
    #[error("{name} = {value} is outside of the valid range {min}..={max}")]
    ParameterOutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// A render mode label could not be parsed.
    #[error("unknown render mode '{0}'")]
    UnknownRenderMode(String),

    /// A viewport with a zero dimension was requested.
    #[error("invalid viewport size {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },

    /// Rendering error reported by a backend.
    #[error("render error: {0}")]
    RenderError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for glimmer operations.
pub type Result<T> = std::result::Result<T, GlimmerError>;
