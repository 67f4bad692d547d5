//! Error types shared by every part of the renderer.

use thiserror::Error;

/// Everything that can go wrong while building, uploading or sampling render data.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Malformed construction parameters for a vertex format or texture map.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// API misuse, e.g. ending a pass that was never begun.
    #[error("invalid state: {0}")]
    State(String),
    /// Vertex or index data that does not match the active format.
    #[error("validation failed: {0}")]
    Validation(String),
    /// A GPU-facing call was made on a thread that does not own the rendering context.
    #[error("GL operations have to be performed on the render thread (called from {0})")]
    ThreadAffinity(String),
    /// The driver refused to create or update a resource.
    #[error("device error: {0}")]
    Device(String),
    /// The rendering context went away before a request could be answered.
    #[error("rendering context is closed")]
    ContextClosed,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;

impl RenderError {
    pub(crate) fn state(message: impl Into<String>) -> Self {
        Self::State(message.into())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
