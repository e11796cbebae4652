use std::f32::consts::FRAC_PI_2;

use crate::input::{InputSource, Key};
use crate::transform::Transform;
use crate::{Mat4, Vec3};

/// Height of the orthographic view volume in world units unless overridden.
pub const DEFAULT_ORTHO_HEIGHT: f32 = 10.0;

const PARALLEL_EPSILON: f32 = 1e-6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

/// Free-flying camera (left-handed, +Z forward, +Y up).
///
/// Navigation moves the owned [`Transform`] relative to its orientation and
/// mouse look rotates it with the pitch held inside `[-pi/2, pi/2]`.
#[derive(Clone, Debug)]
pub struct Camera {
    transform: Transform,
    view: Mat4,
    projection: Mat4,

    aspect: f32,
    fov_y_rad: f32,
    z_near: f32,
    z_far: f32,
    move_speed: f32,
    mouse_speed: f32,
    mode: ProjectionMode,
    ortho_height: f32,
}

impl Camera {
    /// `orientation_deg` is pitch/yaw/roll in **degrees**; it is converted to
    /// radians here and everything after works in radians.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        aspect: f32,
        position: Vec3,
        orientation_deg: Vec3,
        move_speed: f32,
        mouse_speed: f32,
        fov_y_rad: f32,
        z_near: f32,
        z_far: f32,
        mode: ProjectionMode,
    ) -> Self {
        let mut transform = Transform::identity();
        transform.set_position(position);
        transform.set_rotation(
            orientation_deg.x.to_radians(),
            orientation_deg.y.to_radians(),
            orientation_deg.z.to_radians(),
        );

        let mut camera = Self {
            transform,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            aspect,
            fov_y_rad,
            z_near,
            z_far,
            move_speed,
            mouse_speed,
            mode,
            ortho_height: DEFAULT_ORTHO_HEIGHT,
        };
        camera.update_projection_matrix(aspect);
        camera.update_view_matrix();
        camera
    }

    /// Orthographic volume height; only used in [`ProjectionMode::Orthographic`].
    pub fn with_ortho_height(mut self, height: f32) -> Self {
        self.ortho_height = height;
        self.update_projection_matrix(self.aspect);
        self
    }

    /// Rebuild the projection for a new output aspect ratio.
    pub fn update_projection_matrix(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.projection = match self.mode {
            ProjectionMode::Perspective => {
                Mat4::perspective_lh(self.fov_y_rad, aspect, self.z_near, self.z_far)
            }
            ProjectionMode::Orthographic => {
                let half_h = self.ortho_height * 0.5;
                let half_w = half_h * aspect;
                Mat4::orthographic_lh(-half_w, half_w, -half_h, half_h, self.z_near, self.z_far)
            }
        };
    }

    /// Look-to view from the transform's position and forward vector, world up = +Y.
    ///
    /// Looking straight up or down leaves no horizon to align with; the
    /// camera's own up vector is used instead so the view stays finite.
    pub fn update_view_matrix(&mut self) {
        let forward = self.transform.forward();
        let up = if forward.cross(Vec3::Y).length_squared() < PARALLEL_EPSILON {
            self.transform.up()
        } else {
            Vec3::Y
        };
        self.view = Mat4::look_to_lh(self.transform.position(), forward, up);
    }

    /// One frame of navigation and mouse look, then a view refresh.
    pub fn update(&mut self, dt: f32, input: &impl InputSource) {
        let step = self.move_speed * dt;
        if input.key_down(Key::Forward) {
            self.transform.move_relative(Vec3::new(0.0, 0.0, step));
        }
        if input.key_down(Key::Back) {
            self.transform.move_relative(Vec3::new(0.0, 0.0, -step));
        }
        if input.key_down(Key::StrafeLeft) {
            self.transform.move_relative(Vec3::new(-step, 0.0, 0.0));
        }
        if input.key_down(Key::StrafeRight) {
            self.transform.move_relative(Vec3::new(step, 0.0, 0.0));
        }
        if input.key_down(Key::Up) {
            self.transform.move_relative(Vec3::new(0.0, step, 0.0));
        }
        if input.key_down(Key::Down) {
            self.transform.move_relative(Vec3::new(0.0, -step, 0.0));
        }

        if input.look_held() {
            let delta = input.mouse_delta() * self.mouse_speed * dt;
            self.transform.rotate(Vec3::new(delta.y, delta.x, 0.0));

            // Clamp after the additive rotate, keep yaw/roll as they are.
            let pyr = self.transform.pitch_yaw_roll();
            let pitch = pyr.x.clamp(-FRAC_PI_2, FRAC_PI_2);
            if pitch != pyr.x {
                self.transform.set_rotation(pitch, pyr.y, pyr.z);
            }
        }

        self.update_view_matrix();
    }

    #[inline]
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    #[inline]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Direct access for scripted placement. The view matrix is refreshed by
    /// the next [`Camera::update`] or an explicit [`Camera::update_view_matrix`].
    #[inline]
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    pub fn fov(&self) -> f32 {
        self.fov_y_rad
    }

    pub fn near_clip(&self) -> f32 {
        self.z_near
    }

    pub fn far_clip(&self) -> f32 {
        self.z_far
    }

    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    pub fn mouse_speed(&self) -> f32 {
        self.mouse_speed
    }

    pub fn projection_mode(&self) -> ProjectionMode {
        self.mode
    }
}
