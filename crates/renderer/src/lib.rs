//! Render submission: per-draw shader records, entities, the scene frame
//! loop and a wgpu backend.
//! wgpu = 26.x, winit = 0.30.x

pub mod context;
pub mod entity;
pub mod error;
pub mod gpu;
pub mod scene;
pub mod shader_record;

#[cfg(test)]
mod testing;

pub use context::{Drawable, RenderContext};
pub use entity::Entity;
pub use error::{RenderError, RenderResult};
pub use gpu::{GpuConstantBuffer, GpuMesh, GpuState, Vertex};
pub use scene::{DEFAULT_CLEAR_COLOR, FrameStats, Scene};
pub use shader_record::{CONSTANT_SLOT, DEFAULT_TINT, RECORD_BUFFER_SIZE, ShaderRecord, padded_size};
