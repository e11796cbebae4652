//! Per-draw constant record shared with `shaders/entity.wgsl`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

/// Tint applied to every entity unless overridden.
pub const DEFAULT_TINT: Vec4 = Vec4::new(1.0, 0.5, 0.5, 1.0);

/// Vertex-stage binding slot of the shared constant buffer.
pub const CONSTANT_SLOT: u32 = 0;

/// GPU layout: tint, then world / view / projection (16-byte aligned, 256 bytes).
///
/// Matrices are glam column-major, i.e. the same 16 floats as a row-vector
/// matrix stored row-major.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ShaderRecord {
    pub color_tint: [f32; 4],
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl ShaderRecord {
    pub fn new(color_tint: Vec4, world: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            color_tint: color_tint.to_array(),
            world: world.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.world)
    }
}

/// Rounds `size` up to the next multiple of 16 bytes.
#[inline]
pub const fn padded_size(size: u64) -> u64 {
    size.div_ceil(16) * 16
}

/// Allocation size for the shared constant buffer.
pub const RECORD_BUFFER_SIZE: u64 = padded_size(std::mem::size_of::<ShaderRecord>() as u64);
