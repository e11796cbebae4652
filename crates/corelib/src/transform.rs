use crate::error::{CoreError, CoreResult};
use crate::{EulerRot, Mat4, Quat, Vec3};

/// Position / pitch-yaw-roll / scale with an eagerly maintained world matrix.
///
/// Every mutator recomputes `world` and `world_inverse_transpose` before it
/// returns, so the matrices are never stale when read.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    position: Vec3,
    /// Euler angles in radians: x = pitch, y = yaw, z = roll.
    rotation: Vec3,
    scale: Vec3,
    world: Mat4,
    world_inverse_transpose: Mat4,
}

impl Transform {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            world: Mat4::IDENTITY,
            world_inverse_transpose: Mat4::IDENTITY,
        }
    }

    pub fn from_trs(
        position: impl Into<Vec3>,
        pitch_yaw_roll: impl Into<Vec3>,
        scale: impl Into<Vec3>,
    ) -> Self {
        let mut t = Self::identity();
        t.position = position.into();
        t.rotation = pitch_yaw_roll.into();
        t.scale = scale.into();
        t.update_world();
        t
    }

    // --- absolute setters

    pub fn set_position(&mut self, position: impl Into<Vec3>) {
        self.position = position.into();
        self.update_world();
    }

    /// Angles are radians and stored as given (no wrapping).
    pub fn set_rotation(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.set_pitch_yaw_roll(Vec3::new(pitch, yaw, roll));
    }

    pub fn set_pitch_yaw_roll(&mut self, pitch_yaw_roll: impl Into<Vec3>) {
        self.rotation = pitch_yaw_roll.into();
        self.update_world();
    }

    pub fn set_scale(&mut self, scale: impl Into<Vec3>) {
        self.scale = scale.into();
        self.update_world();
    }

    // --- movement

    /// Assigns the position. Same effect as [`Transform::set_position`].
    pub fn move_absolute(&mut self, position: impl Into<Vec3>) {
        self.position = position.into();
        self.update_world();
    }

    /// Rotates `offset` from local into world space by the current orientation
    /// and adds it to the position.
    pub fn move_relative(&mut self, offset: impl Into<Vec3>) {
        self.position += self.orientation() * offset.into();
        self.update_world();
    }

    /// Adds to the stored pitch/yaw/roll.
    pub fn rotate(&mut self, delta_pitch_yaw_roll: impl Into<Vec3>) {
        self.rotation += delta_pitch_yaw_roll.into();
        self.update_world();
    }

    /// Multiplies the scale per axis.
    pub fn scale_by(&mut self, factors: impl Into<Vec3>) {
        self.scale *= factors.into();
        self.update_world();
    }

    // --- getters

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn pitch_yaw_roll(&self) -> Vec3 {
        self.rotation
    }

    #[inline]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    #[inline]
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    #[inline]
    pub fn world_inverse_transpose_matrix(&self) -> Mat4 {
        self.world_inverse_transpose
    }

    /// Orientation built from the current Euler angles. Roll is applied
    /// first, then pitch, then yaw.
    #[inline]
    pub fn orientation(&self) -> Quat {
        orientation_from_euler(self.rotation)
    }

    pub fn right(&self) -> Vec3 {
        self.orientation() * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.orientation() * Vec3::Y
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::Z
    }

    fn update_world(&mut self) {
        self.world = compose_world(self.position, self.rotation, self.scale);
        self.world_inverse_transpose = match inverse_transpose(&self.world) {
            Ok(m) => m,
            Err(err) => {
                log::warn!("{err}; using identity inverse-transpose");
                Mat4::IDENTITY
            }
        };
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[inline]
pub(crate) fn orientation_from_euler(pitch_yaw_roll: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        pitch_yaw_roll.y,
        pitch_yaw_roll.x,
        pitch_yaw_roll.z,
    )
}

/// Scale, then rotate, then translate: `S * R * T` for row vectors, which is
/// `T * R * S` in glam's column-vector form.
pub fn compose_world(position: Vec3, pitch_yaw_roll: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, orientation_from_euler(pitch_yaw_roll), position)
}

/// `transpose(inverse(world))`, or [`CoreError::DegenerateTransform`] when
/// `world` cannot be inverted.
pub fn inverse_transpose(world: &Mat4) -> CoreResult<Mat4> {
    let determinant = world.determinant();
    if determinant == 0.0 || !determinant.is_finite() {
        return Err(CoreError::DegenerateTransform { determinant });
    }
    let it = world.inverse().transpose();
    if !it.is_finite() {
        return Err(CoreError::DegenerateTransform { determinant });
    }
    Ok(it)
}
