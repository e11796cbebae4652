//! Entry point: logging, CLI flags and the demo scene.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
use std::rc::Rc;

use anyhow::Result;
use corelib::{Camera, ProjectionMode, Transform, Vec3, vec3};
use platform::{GpuScene, RunOptions};
use renderer::{Drawable, Entity, GpuMesh, GpuState, Scene};

fn parse_backend_arg() -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all(); // default = auto
    for arg in std::env::args() {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{}', falling back to auto.", other);
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_show_fps_arg() -> bool {
    // --show-fps[=on|off], off by default
    for arg in std::env::args() {
        if arg == "--show-fps" {
            return true;
        }
        if let Some(val) = arg.strip_prefix("--show-fps=") {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn parse_size_args() -> (u32, u32) {
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in std::env::args() {
        if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    w = Some(pw);
                    h = Some(ph);
                }
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            if let Ok(pw) = v.parse::<u32>() {
                w = Some(pw);
            }
        } else if let Some(v) = arg.strip_prefix("--height=") {
            if let Ok(ph) = v.parse::<u32>() {
                h = Some(ph);
            }
        }
    }

    let ww = w.unwrap_or(1280).max(1);
    let hh = h.unwrap_or(720).max(1);
    (ww, hh)
}

/// `--camera=N`, 1-based like the scene summary. Returns a 0-based index.
fn parse_camera_arg() -> usize {
    for arg in std::env::args() {
        if let Some(v) = arg.strip_prefix("--camera=") {
            match v.parse::<usize>() {
                Ok(n) if n >= 1 => return n - 1,
                _ => log::warn!("Invalid camera '{}', using camera 1.", v),
            }
        }
    }
    0
}

fn parse_projection_arg() -> ProjectionMode {
    if std::env::args().any(|a| a == "--ortho") {
        ProjectionMode::Orthographic
    } else {
        ProjectionMode::Perspective
    }
}

/// Position, orientation (degrees) and vertical FOV of the four demo cameras.
const CAMERA_RIG: [(Vec3, Vec3, f32); 4] = [
    (Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 0.0), FRAC_PI_4),
    (Vec3::new(3.0, 6.0, -5.0), Vec3::new(9.0, 1.0, 0.0), FRAC_PI_2),
    (Vec3::new(1.0, 2.0, -5.0), Vec3::new(5.0, -2.0, 0.0), FRAC_PI_4),
    (Vec3::new(-1.0, 4.0, -5.0), Vec3::new(-2.0, -1.0, 0.0), FRAC_PI_2),
];

fn build_demo_scene(
    gpu: &GpuState,
    aspect: f32,
    mode: ProjectionMode,
    active_camera: usize,
) -> Result<GpuScene> {
    let mut scene: GpuScene = Scene::new(gpu.create_constant_buffer());

    let mut meshes: Vec<Rc<dyn Drawable<GpuState>>> = Vec::new();
    for data in asset::shapes::all()? {
        let mesh: Rc<dyn Drawable<GpuState>> = Rc::new(GpuMesh::new(gpu, &data));
        meshes.push(scene.register_mesh(mesh));
    }
    let [triangle, quad, boat] = &meshes[..] else {
        anyhow::bail!("expected 3 built-in meshes, got {}", meshes.len());
    };

    let placements = [
        (triangle, Vec3::ZERO),
        (quad, Vec3::ZERO),
        (boat, Vec3::ZERO),
        (boat, vec3(-0.2, 0.6, 0.0)),
        (boat, vec3(-0.09, 0.9, 0.0)),
    ];
    for (mesh, position) in placements {
        let mut entity = Entity::new(Rc::clone(mesh));
        *entity.transform_mut() = Transform::from_trs(position, Vec3::ZERO, Vec3::ONE);
        scene.add_entity(entity);
    }

    for (position, orientation, fov) in CAMERA_RIG {
        scene.add_camera(Camera::new(
            aspect,
            position,
            orientation,
            5.0,
            1.0,
            fov,
            0.001,
            1000.0,
            mode,
        ));
    }
    scene.set_active_camera(active_camera.min(CAMERA_RIG.len() - 1));

    Ok(scene)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let chosen = parse_backend_arg();
    let show_fps = parse_show_fps_arg();
    let (width, height) = parse_size_args();
    let active_camera = parse_camera_arg();
    let mode = parse_projection_arg();
    log::info!(
        "Starting. Backend: {:?}, show_fps={}, window_size={}x{}, camera={}, projection={:?}",
        chosen,
        show_fps,
        width,
        height,
        active_camera + 1,
        mode
    );

    let options = RunOptions {
        backends: chosen,
        show_fps,
        width,
        height,
        ..RunOptions::default()
    };
    let aspect = width as f32 / height as f32;

    platform::run_with_renderer(
        options,
        Box::new(move |gpu: &GpuState| build_demo_scene(gpu, aspect, mode, active_camera)),
        // The first entity rolls slowly so there is always something moving.
        Box::new(|scene: &mut GpuScene, dt: f32| {
            if let Some(first) = scene.entity_mut(0) {
                first.transform_mut().rotate(vec3(0.0, 0.0, dt));
            }
        }),
    )?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
