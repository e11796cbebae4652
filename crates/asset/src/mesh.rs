//! CPU-side mesh representation handed to the GPU backend.

use anyhow::{Result, ensure};

/// Vertex with position and RGBA color. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl MeshVertex {
    pub const fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// Named, indexed triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Validates that the index list forms whole triangles and every index
    /// refers to an existing vertex.
    pub fn new(name: impl Into<String>, vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Result<Self> {
        let name = name.into();
        ensure!(!vertices.is_empty(), "mesh '{name}' has no vertices");
        ensure!(
            !indices.is_empty() && indices.len() % 3 == 0,
            "mesh '{name}' index count {} is not a non-empty multiple of 3",
            indices.len()
        );
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            anyhow::bail!(
                "mesh '{name}' index {bad} out of bounds (vertex count = {})",
                vertices.len()
            );
        }
        log::debug!(
            "Mesh '{}': {} vertices, {} indices",
            name,
            vertices.len(),
            indices.len()
        );
        Ok(Self {
            name,
            vertices,
            indices,
        })
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn triangle_count(&self) -> u32 {
        self.index_count() / 3
    }
}
