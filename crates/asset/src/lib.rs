//! CPU-side geometry: mesh data and the built-in demo shapes.

pub mod mesh;
pub mod shapes;

pub use mesh::{MeshData, MeshVertex};
