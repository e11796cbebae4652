//! Errors raised while submitting frames.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The constant buffer could not be mapped for writing.
    #[error("failed to map '{label}' for writing: {reason}")]
    ResourceMapFailure { label: &'static str, reason: String },

    /// A draw arrived outside `begin_frame`/`end_frame` or with nothing bound.
    #[error("cannot draw '{mesh}': {reason}")]
    DrawRejected { mesh: String, reason: &'static str },

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("create_surface failed: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("request_device failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

pub type RenderResult<T> = Result<T, RenderError>;
