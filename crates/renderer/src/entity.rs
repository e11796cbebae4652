//! A transform bound to a shared drawable.

use std::rc::Rc;

use corelib::{Camera, Transform};
use glam::Vec4;

use crate::context::{Drawable, RenderContext};
use crate::error::RenderResult;
use crate::shader_record::{CONSTANT_SLOT, DEFAULT_TINT, ShaderRecord};

pub struct Entity<C: RenderContext> {
    transform: Transform,
    drawable: Rc<dyn Drawable<C>>,
    tint: Vec4,
}

impl<C: RenderContext> Entity<C> {
    pub fn new(drawable: Rc<dyn Drawable<C>>) -> Self {
        Self {
            transform: Transform::identity(),
            drawable,
            tint: DEFAULT_TINT,
        }
    }

    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Callers (scene logic, tools) may move the entity; it never moves itself.
    #[inline]
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn drawable(&self) -> &Rc<dyn Drawable<C>> {
        &self.drawable
    }

    pub fn tint(&self) -> Vec4 {
        self.tint
    }

    pub fn set_tint(&mut self, tint: Vec4) {
        self.tint = tint;
    }

    pub fn shader_record(&self, camera: &Camera) -> ShaderRecord {
        ShaderRecord::new(
            self.tint,
            self.transform.world_matrix(),
            camera.view_matrix(),
            camera.projection_matrix(),
        )
    }

    /// Overwrite `constants` with this entity's record, bind it and draw.
    ///
    /// `constants` is shared by every entity, so the draw must be issued
    /// before anyone writes to it again.
    pub fn draw(&self, ctx: &mut C, constants: &C::ConstantBuffer, camera: &Camera) -> RenderResult<()> {
        let record = self.shader_record(camera);
        ctx.write_discard(constants, record.as_bytes())?;
        ctx.bind_vertex_constants(CONSTANT_SLOT, constants);
        self.drawable.draw(ctx)
    }
}
