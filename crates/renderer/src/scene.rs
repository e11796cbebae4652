//! Scene: ordered entities, cameras, the active camera and the frame loop.

use std::fmt::Write as _;
use std::rc::Rc;

use corelib::{Camera, CoreError, CoreResult, InputSource};

use crate::context::{Drawable, RenderContext};
use crate::entity::Entity;
use crate::error::RenderResult;

pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.4, 0.6, 0.75, 0.0];

/// Outcome of one [`Scene::render_frame`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: usize,
    pub skipped: usize,
}

pub struct Scene<C: RenderContext> {
    entities: Vec<Entity<C>>,
    meshes: Vec<Rc<dyn Drawable<C>>>,
    cameras: Vec<Camera>,
    active_camera: usize,
    constants: C::ConstantBuffer,
    clear_color: [f32; 4],
}

impl<C: RenderContext> Scene<C> {
    /// `constants` is the one constant buffer every entity draw goes through.
    pub fn new(constants: C::ConstantBuffer) -> Self {
        Self {
            entities: Vec::new(),
            meshes: Vec::new(),
            cameras: Vec::new(),
            active_camera: 0,
            constants,
            clear_color: DEFAULT_CLEAR_COLOR,
        }
    }

    // --- meshes & entities

    /// Keeps a handle for the scene summary; entities hold their own.
    pub fn register_mesh(&mut self, mesh: Rc<dyn Drawable<C>>) -> Rc<dyn Drawable<C>> {
        self.meshes.push(mesh.clone());
        mesh
    }

    pub fn meshes(&self) -> &[Rc<dyn Drawable<C>>] {
        &self.meshes
    }

    /// Appends to the draw order; returns the entity index.
    pub fn add_entity(&mut self, entity: Entity<C>) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    pub fn entities(&self) -> &[Entity<C>] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity<C>] {
        &mut self.entities
    }

    pub fn entity(&self, index: usize) -> Option<&Entity<C>> {
        self.entities.get(index)
    }

    pub fn entity_mut(&mut self, index: usize) -> Option<&mut Entity<C>> {
        self.entities.get_mut(index)
    }

    // --- cameras

    pub fn add_camera(&mut self, camera: Camera) -> usize {
        self.cameras.push(camera);
        self.cameras.len() - 1
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn camera(&self, index: usize) -> Option<&Camera> {
        self.cameras.get(index)
    }

    pub fn active_camera_index(&self) -> usize {
        self.active_camera
    }

    pub fn active_camera(&self) -> Option<&Camera> {
        self.cameras.get(self.active_camera)
    }

    pub fn active_camera_mut(&mut self) -> Option<&mut Camera> {
        self.cameras.get_mut(self.active_camera)
    }

    /// Switch cameras. An out-of-range index is a bug: debug builds panic,
    /// release builds clamp to the last camera. Returns the selected index.
    pub fn set_active_camera(&mut self, index: usize) -> usize {
        let count = self.cameras.len();
        debug_assert!(
            index < count,
            "camera index {index} out of range (camera count = {count})"
        );
        self.active_camera = index.min(count.saturating_sub(1));
        log::debug!("Active camera -> {}", self.active_camera);
        self.active_camera
    }

    /// Checked switch; leaves the active camera untouched on error.
    pub fn try_set_active_camera(&mut self, index: usize) -> CoreResult<()> {
        if index >= self.cameras.len() {
            return Err(CoreError::InvalidCameraIndex {
                index,
                count: self.cameras.len(),
            });
        }
        self.active_camera = index;
        log::debug!("Active camera -> {}", index);
        Ok(())
    }

    // --- per-frame

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }

    /// Surface size changed: every camera gets the new aspect so switching
    /// later never shows a stale projection.
    pub fn resize(&mut self, width: u32, height: u32) {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        for camera in &mut self.cameras {
            camera.update_projection_matrix(aspect);
        }
        log::debug!("Scene resized to {}x{} (aspect {:.3})", width, height, aspect);
    }

    /// Navigation/look for the active camera.
    pub fn update(&mut self, dt: f32, input: &impl InputSource) {
        if let Some(camera) = self.active_camera_mut() {
            camera.update(dt, input);
        }
    }

    /// Clear, draw every entity in order through the shared constant buffer,
    /// present, rebind targets. An entity whose draw fails is logged and
    /// skipped; the rest of the frame still renders.
    pub fn render_frame(&self, ctx: &mut C) -> RenderResult<FrameStats> {
        ctx.begin_frame(self.clear_color)?;

        let mut stats = FrameStats::default();
        match self.active_camera() {
            Some(camera) => {
                for (i, entity) in self.entities.iter().enumerate() {
                    match entity.draw(ctx, &self.constants, camera) {
                        Ok(()) => stats.drawn += 1,
                        Err(err) => {
                            log::error!(
                                "Skipping entity #{} ('{}'): {}",
                                i + 1,
                                entity.drawable().name(),
                                err
                            );
                            stats.skipped += 1;
                        }
                    }
                }
            }
            None => log::trace!("No camera in scene; frame left empty"),
        }

        ctx.end_frame()?;
        ctx.rebind_targets();
        Ok(stats)
    }

    /// Human-readable dump of meshes, entities and the active camera.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Meshes ({}):", self.meshes.len());
        for m in &self.meshes {
            let _ = writeln!(
                out,
                "  {}: triangles={} vertices={} indices={}",
                m.name(),
                m.index_count() / 3,
                m.vertex_count(),
                m.index_count()
            );
        }
        let _ = writeln!(out, "Entities ({}):", self.entities.len());
        for (i, e) in self.entities.iter().enumerate() {
            let t = e.transform();
            let p = t.position();
            let r = t.pitch_yaw_roll();
            let s = t.scale();
            let _ = writeln!(
                out,
                "  Entity #{} [{}] pos=({:.2}, {:.2}, {:.2}) rot=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2})",
                i + 1,
                e.drawable().name(),
                p.x,
                p.y,
                p.z,
                r.x,
                r.y,
                r.z,
                s.x,
                s.y,
                s.z
            );
        }
        match self.active_camera() {
            Some(cam) => {
                let p = cam.transform().position();
                let _ = writeln!(
                    out,
                    "Camera in use: {} of {} pos=({:.2}, {:.2}, {:.2}) fov={:.1}deg",
                    self.active_camera + 1,
                    self.cameras.len(),
                    p.x,
                    p.y,
                    p.z,
                    cam.fov().to_degrees()
                );
            }
            None => {
                let _ = writeln!(out, "Camera in use: none");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader_record::DEFAULT_TINT;
    use crate::testing::{Event, FakeMesh, RecordingContext};
    use corelib::{InputState, Key, Mat4, ProjectionMode, Vec3, Vec4, vec3};
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    const EPS: f32 = 1e-5;

    fn camera(position: Vec3, fov: f32) -> Camera {
        Camera::new(
            16.0 / 9.0,
            position,
            Vec3::ZERO,
            5.0,
            1.0,
            fov,
            0.1,
            100.0,
            ProjectionMode::Perspective,
        )
    }

    fn scene_with_two_entities() -> (RecordingContext, Scene<RecordingContext>) {
        let mut ctx = RecordingContext::default();
        let buf = ctx.create_constant_buffer();
        let mut scene = Scene::new(buf);
        let mesh = scene.register_mesh(FakeMesh::shared("boat", 12));
        let mut a = Entity::new(mesh.clone());
        a.transform_mut().set_position(vec3(-1.0, 0.0, 0.0));
        let mut b = Entity::new(mesh);
        b.transform_mut().set_position(vec3(1.0, 0.0, 0.0));
        scene.add_entity(a);
        scene.add_entity(b);
        scene.add_camera(camera(vec3(0.0, 0.0, -5.0), FRAC_PI_2));
        (ctx, scene)
    }

    #[test]
    fn identity_entity_end_to_end() {
        let mut ctx = RecordingContext::default();
        let buf = ctx.create_constant_buffer();
        let mut scene = Scene::new(buf);
        scene.add_entity(Entity::new(FakeMesh::shared("tri", 3)));
        scene.add_camera(camera(vec3(0.0, 0.0, -5.0), FRAC_PI_2));

        let stats = scene.render_frame(&mut ctx).expect("frame");
        assert_eq!(stats, FrameStats { drawn: 1, skipped: 0 });

        let Event::Draw { record, .. } = ctx.draws()[0].clone() else {
            unreachable!()
        };
        assert_eq!(record.world, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(Vec4::from_array(record.color_tint), DEFAULT_TINT);

        // Camera 5 units behind the origin looking down +Z.
        let view_ref = Mat4::from_translation(vec3(0.0, 0.0, 5.0));
        // tan(45deg) = 1, so the vertical scale is 1.
        let (near, far, aspect) = (0.1_f32, 100.0_f32, 16.0_f32 / 9.0);
        let r = far / (far - near);
        let proj_ref = Mat4::from_cols(
            Vec4::new(1.0 / aspect, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, r, 1.0),
            Vec4::new(0.0, 0.0, -r * near, 0.0),
        );
        assert!(Mat4::from_cols_array_2d(&record.view).abs_diff_eq(view_ref, EPS));
        assert!(Mat4::from_cols_array_2d(&record.projection).abs_diff_eq(proj_ref, EPS));
    }

    #[test]
    fn frame_is_bracketed_and_entities_drawn_in_order() {
        let (mut ctx, scene) = scene_with_two_entities();
        scene.render_frame(&mut ctx).expect("frame");

        assert_eq!(
            ctx.events.first(),
            Some(&Event::BeginFrame {
                clear_color: DEFAULT_CLEAR_COLOR
            })
        );
        let tail = &ctx.events[ctx.events.len() - 2..];
        assert_eq!(tail, &[Event::EndFrame, Event::RebindTargets]);

        let kinds: Vec<&str> = ctx.events[1..ctx.events.len() - 2]
            .iter()
            .map(|e| match e {
                Event::Write { .. } => "write",
                Event::Bind { .. } => "bind",
                Event::Draw { .. } => "draw",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, ["write", "bind", "draw", "write", "bind", "draw"]);
    }

    #[test]
    fn shared_buffer_holds_each_entity_at_its_draw() {
        let (mut ctx, scene) = scene_with_two_entities();
        scene.render_frame(&mut ctx).expect("frame");

        let worlds: Vec<Mat4> = ctx
            .draws()
            .iter()
            .map(|e| match e {
                Event::Draw { record, .. } => record.world_matrix(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(worlds.len(), 2);
        assert_ne!(worlds[0], worlds[1]);
        assert_eq!(worlds[0], scene.entities()[0].transform().world_matrix());
        assert_eq!(worlds[1], scene.entities()[1].transform().world_matrix());
    }

    #[test]
    fn failed_map_skips_only_that_entity() {
        let (mut ctx, scene) = scene_with_two_entities();
        ctx.fail_writes_at.insert(0);
        let stats = scene.render_frame(&mut ctx).expect("frame");
        assert_eq!(stats, FrameStats { drawn: 1, skipped: 1 });
        assert_eq!(ctx.draws().len(), 1);
        assert_eq!(ctx.events.last(), Some(&Event::RebindTargets));
    }

    #[test]
    fn rejected_draw_counts_as_skipped() {
        let (mut ctx, scene) = scene_with_two_entities();
        ctx.fail_draws_at.insert(0);
        let stats = scene.render_frame(&mut ctx).expect("frame");
        assert_eq!(stats, FrameStats { drawn: 1, skipped: 1 });
        let draws = ctx.draws();
        assert_eq!(draws.len(), 1);
        let Event::Draw { record, .. } = draws[0] else {
            unreachable!()
        };
        assert_eq!(record.world_matrix(), scene.entities()[1].transform().world_matrix());
        assert_eq!(ctx.events.last(), Some(&Event::RebindTargets));
    }

    #[test]
    fn no_camera_still_clears_and_presents() {
        let mut ctx = RecordingContext::default();
        let buf = ctx.create_constant_buffer();
        let mut scene = Scene::new(buf);
        scene.add_entity(Entity::new(FakeMesh::shared("tri", 3)));
        let stats = scene.render_frame(&mut ctx).expect("frame");
        assert_eq!(stats, FrameStats::default());
        assert_eq!(ctx.events.len(), 3);
    }

    #[test]
    fn active_camera_selects_matrices() {
        let (_, mut scene) = scene_with_two_entities();
        scene.add_camera(camera(vec3(3.0, 6.0, -5.0), FRAC_PI_4));
        scene.add_camera(camera(vec3(1.0, 2.0, -5.0), FRAC_PI_2));
        scene.add_camera(camera(vec3(-1.0, 4.0, -5.0), FRAC_PI_4));
        assert_eq!(scene.cameras().len(), 4);

        assert_eq!(scene.set_active_camera(2), 2);
        let expected = camera(vec3(1.0, 2.0, -5.0), FRAC_PI_2);
        let active = scene.active_camera().expect("camera");
        assert_eq!(active.view_matrix(), expected.view_matrix());
        assert_eq!(active.projection_matrix(), expected.projection_matrix());
        assert_ne!(active.view_matrix(), scene.cameras()[0].view_matrix());
    }

    #[test]
    fn only_active_camera_updates() {
        let (_, mut scene) = scene_with_two_entities();
        scene.add_camera(camera(Vec3::ZERO, FRAC_PI_2));
        scene.set_active_camera(1);
        let mut input = InputState::new();
        input.set_key(Key::Forward, true);
        scene.update(1.0, &input);
        assert_eq!(scene.cameras()[0].transform().position(), vec3(0.0, 0.0, -5.0));
        assert!(
            scene.cameras()[1]
                .transform()
                .position()
                .abs_diff_eq(vec3(0.0, 0.0, 5.0), EPS)
        );
    }

    #[test]
    fn try_set_active_camera_rejects_out_of_range() {
        let (_, mut scene) = scene_with_two_entities();
        let err = scene.try_set_active_camera(3).unwrap_err();
        assert_eq!(err, CoreError::InvalidCameraIndex { index: 3, count: 1 });
        assert_eq!(scene.active_camera_index(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of range")]
    fn set_active_camera_out_of_range_panics_in_debug() {
        let (_, mut scene) = scene_with_two_entities();
        scene.set_active_camera(7);
    }

    #[test]
    fn resize_updates_every_camera() {
        let (_, mut scene) = scene_with_two_entities();
        scene.add_camera(camera(Vec3::ZERO, FRAC_PI_4));
        scene.resize(800, 400);
        assert!(scene.cameras().iter().all(|c| c.aspect_ratio() == 2.0));
        scene.resize(800, 0);
        assert!(scene.cameras().iter().all(|c| c.aspect_ratio() == 800.0));
    }

    #[test]
    fn summary_lists_meshes_entities_and_camera() {
        let (_, scene) = scene_with_two_entities();
        let s = scene.summary();
        assert!(s.contains("boat: triangles=4 vertices=12 indices=12"));
        assert!(s.contains("Entity #2 [boat] pos=(1.00, 0.00, 0.00)"));
        assert!(s.contains("Camera in use: 1 of 1"));
    }
}
