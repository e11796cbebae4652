//! Core types: math re-exports, Transform, Camera, input polling, errors.

pub use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4, vec3, vec4};

pub mod camera;
pub mod error;
pub mod input;
pub mod transform;

pub use camera::{Camera, ProjectionMode};
pub use error::{CoreError, CoreResult};
pub use input::{InputSource, InputState, Key};
pub use transform::Transform;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_is_identity_matrix() {
        let t = Transform::identity();
        assert_eq!(t.world_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn camera_pv_is_finite() {
        let cam = Camera::new(
            16.0 / 9.0,
            vec3(3.0, 6.0, -5.0),
            vec3(9.0, 1.0, 0.0),
            5.0,
            1.0,
            60f32.to_radians(),
            0.1,
            100.0,
            ProjectionMode::Perspective,
        );
        let pv = cam.projection_matrix() * cam.view_matrix();
        let a = pv.to_cols_array();
        assert!(a.iter().all(|f| f.is_finite()));
    }
}
