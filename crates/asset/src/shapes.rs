//! Built-in demo shapes, authored directly in clip-space sized units.

use anyhow::Result;

use crate::mesh::{MeshData, MeshVertex};

const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
const PURPLE: [f32; 4] = [0.5, 0.0, 1.0, 1.0];

pub fn triangle() -> Result<MeshData> {
    let v = vec![
        MeshVertex::new([0.0, 0.3, 0.0], RED),
        MeshVertex::new([0.3, -0.3, 0.0], BLUE),
        MeshVertex::new([-0.3, -0.3, 0.0], GREEN),
    ];
    MeshData::new("Triangle", v, vec![0, 1, 2])
}

pub fn quad() -> Result<MeshData> {
    let v = vec![
        MeshVertex::new([-0.8, 0.8, 0.0], PURPLE),
        MeshVertex::new([-0.8, 0.4, 0.0], PURPLE),
        MeshVertex::new([-0.4, 0.4, 0.0], GREEN),
        MeshVertex::new([-0.4, 0.8, 0.0], GREEN),
    ];
    MeshData::new("Quad", v, vec![0, 3, 2, 0, 2, 1])
}

/// Hull plus two sails, six vertices.
pub fn boat() -> Result<MeshData> {
    let v = vec![
        MeshVertex::new([0.7, -0.4, 0.0], BLUE),
        MeshVertex::new([0.6, -0.6, 0.0], BLUE),
        MeshVertex::new([0.6, -0.4, 0.0], BLACK),
        MeshVertex::new([0.4, -0.4, 0.0], BLACK),
        MeshVertex::new([0.4, -0.6, 0.0], RED),
        MeshVertex::new([0.3, -0.4, 0.0], RED),
    ];
    #[rustfmt::skip]
    let idx = vec![
        0, 1, 2,
        1, 3, 2,
        1, 4, 3,
        4, 5, 3,
    ];
    MeshData::new("Boat", v, idx)
}

/// All built-in shapes in registration order.
pub fn all() -> Result<Vec<MeshData>> {
    Ok(vec![triangle()?, quad()?, boat()?])
}
