//! Errors raised by the spatial core (renderer-agnostic).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// World matrix has no inverse (zero scale on an axis, or non-finite values).
    #[error("degenerate transform: world matrix is not invertible (det = {determinant})")]
    DegenerateTransform { determinant: f32 },

    #[error("camera index {index} out of range (camera count = {count})")]
    InvalidCameraIndex { index: usize, count: usize },
}

pub type CoreResult<T> = Result<T, CoreError>;
