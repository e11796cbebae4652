//! Seams between the submission logic and a concrete GPU backend.

use crate::error::RenderResult;

/// Device-context operations the frame loop needs.
///
/// Calls arrive strictly in submission order from one thread: a write to the
/// constant buffer is followed by its bind and the drawable's draw before the
/// next write may happen.
pub trait RenderContext {
    /// Backend handle of a uniform buffer sized for one [`crate::ShaderRecord`].
    type ConstantBuffer;

    /// Clear color and depth targets for a new frame.
    fn begin_frame(&mut self, clear_color: [f32; 4]) -> RenderResult<()>;

    /// Map `buffer` for exclusive write with discard, copy `bytes`, unmap.
    fn write_discard(&mut self, buffer: &Self::ConstantBuffer, bytes: &[u8]) -> RenderResult<()>;

    /// Bind `buffer` as vertex-stage constants at `slot`.
    fn bind_vertex_constants(&mut self, slot: u32, buffer: &Self::ConstantBuffer);

    /// Present the frame.
    fn end_frame(&mut self) -> RenderResult<()>;

    /// Re-establish output bindings after present.
    fn rebind_targets(&mut self);
}

/// Opaque geometry that can issue its own indexed draw.
pub trait Drawable<C: RenderContext + ?Sized> {
    fn name(&self) -> &str;
    fn vertex_count(&self) -> u32;
    fn index_count(&self) -> u32;
    /// Submit exactly `index_count()` indices with this drawable's buffers.
    fn draw(&self, ctx: &mut C) -> RenderResult<()>;
}
