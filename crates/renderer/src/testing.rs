//! In-memory render context that records every call, for tests.

use std::collections::HashSet;
use std::rc::Rc;

use crate::context::{Drawable, RenderContext};
use crate::error::{RenderError, RenderResult};
use crate::shader_record::{RECORD_BUFFER_SIZE, ShaderRecord};

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    BeginFrame { clear_color: [f32; 4] },
    Write { buffer: usize },
    Bind { slot: u32, buffer: usize },
    /// `record` is the bound buffer's content at the moment of the draw.
    Draw { name: String, indices: u32, record: ShaderRecord },
    EndFrame,
    RebindTargets,
}

#[derive(Default)]
pub struct RecordingContext {
    pub events: Vec<Event>,
    /// Zero-based write numbers that fail to map.
    pub fail_writes_at: HashSet<usize>,
    /// Zero-based draw numbers the context refuses.
    pub fail_draws_at: HashSet<usize>,
    buffers: Vec<Vec<u8>>,
    bound: Option<usize>,
    writes: usize,
    draws: usize,
}

impl RecordingContext {
    pub fn create_constant_buffer(&mut self) -> usize {
        self.buffers.push(vec![0; RECORD_BUFFER_SIZE as usize]);
        self.buffers.len() - 1
    }

    pub fn draws(&self) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Draw { .. }))
            .collect()
    }

    fn draw_indexed(&mut self, name: &str, indices: u32) -> RenderResult<()> {
        let n = self.draws;
        self.draws += 1;
        let rejected = |reason: &'static str| RenderError::DrawRejected {
            mesh: name.to_owned(),
            reason,
        };
        if self.fail_draws_at.contains(&n) {
            return Err(rejected("injected draw failure"));
        }
        let Some(b) = self.bound else {
            return Err(rejected("no constants bound"));
        };
        let record = bytemuck::pod_read_unaligned::<ShaderRecord>(
            &self.buffers[b][..std::mem::size_of::<ShaderRecord>()],
        );
        self.events.push(Event::Draw {
            name: name.to_owned(),
            indices,
            record,
        });
        Ok(())
    }
}

impl RenderContext for RecordingContext {
    type ConstantBuffer = usize;

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> RenderResult<()> {
        self.events.push(Event::BeginFrame { clear_color });
        Ok(())
    }

    fn write_discard(&mut self, buffer: &usize, bytes: &[u8]) -> RenderResult<()> {
        let n = self.writes;
        self.writes += 1;
        if self.fail_writes_at.contains(&n) {
            return Err(RenderError::ResourceMapFailure {
                label: "test constants",
                reason: format!("injected failure on write #{n}"),
            });
        }
        let dst = &mut self.buffers[*buffer];
        dst.fill(0);
        dst[..bytes.len()].copy_from_slice(bytes);
        self.events.push(Event::Write { buffer: *buffer });
        Ok(())
    }

    fn bind_vertex_constants(&mut self, slot: u32, buffer: &usize) {
        self.bound = Some(*buffer);
        self.events.push(Event::Bind {
            slot,
            buffer: *buffer,
        });
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        self.events.push(Event::EndFrame);
        Ok(())
    }

    fn rebind_targets(&mut self) {
        self.events.push(Event::RebindTargets);
    }
}

pub struct FakeMesh {
    name: String,
    vertices: u32,
    indices: u32,
}

impl FakeMesh {
    pub fn shared(name: &str, indices: u32) -> Rc<dyn Drawable<RecordingContext>> {
        Rc::new(Self {
            name: name.to_owned(),
            vertices: indices,
            indices,
        })
    }
}

impl Drawable<RecordingContext> for FakeMesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn vertex_count(&self) -> u32 {
        self.vertices
    }

    fn index_count(&self) -> u32 {
        self.indices
    }

    fn draw(&self, ctx: &mut RecordingContext) -> RenderResult<()> {
        ctx.draw_indexed(&self.name, self.indices)
    }
}
