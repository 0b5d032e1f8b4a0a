//! Mesh viewer demo
//!
//! Drives the render cache against the headless device: a cube and a
//! mirrored plane are drawn for a few frames, with an edit and an options
//! change in between, and the resulting device traffic is logged.
//!
//! Usage: `mesh_viewer [config.toml|config.ron]`

use mesh_render::prelude::*;
use mesh_render::render::DeviceEvent;
use parking_lot::RwLock;
use std::sync::Arc;

const FRAMES: usize = 6;
const EDIT_FRAME: usize = 2;
const OPTIONS_FRAME: usize = 4;

/// Device traffic accumulated across frames
#[derive(Debug, Default)]
struct DeviceTotals {
    compiles: usize,
    replays: usize,
    draws: usize,
}

impl DeviceTotals {
    fn record(&mut self, events: &[DeviceEvent]) {
        for event in events {
            match event {
                DeviceEvent::ListCompiled { .. } => self.compiles += 1,
                DeviceEvent::ListCalled(_) => self.replays += 1,
                DeviceEvent::Draw { .. } => self.draws += 1,
                _ => {}
            }
        }
    }
}

pub struct ViewerApp {
    device: Arc<HeadlessDevice>,
    totals: DeviceTotals,
    cache: RenderCache<TrackedMesh>,
    cube: SharedMesh<TrackedMesh>,
    cube_fingerprint: MeshFingerprint,
    frame: Frame,
}

impl ViewerApp {
    pub fn new(config: &RenderCacheConfig) -> RenderResult<Self> {
        log::info!("Creating mesh viewer...");
        let device = Arc::new(HeadlessDevice::with_dpi_mult(1.5));
        let cache = RenderCache::new(device.clone(), config)?;

        let (core, edit) = cube();
        let cube = Arc::new(RwLock::new(
            TrackedMesh::new(core)
                .with_edit_mesh(edit)
                .with_transform(Mat4::new_translation(&Vec3::new(0.0, 0.0, -4.0))),
        ));

        Ok(Self {
            device,
            totals: DeviceTotals::default(),
            cache,
            cube,
            cube_fingerprint: MeshFingerprint::of("Cube", "cube-v1"),
            frame: Frame::default(),
        })
    }

    pub fn initialize(&mut self) -> RenderResult<()> {
        log::info!("Initializing scene...");
        self.cache.get_or_create(
            self.cube_fingerprint,
            Arc::clone(&self.cube),
            RenderOptions::default(),
        )?;

        let plane = Arc::new(RwLock::new(
            TrackedMesh::new(plane()).with_symmetry(MirrorAxes::X),
        ));
        self.cache.get_or_create(
            MeshFingerprint::of("Plane", "plane-v1"),
            plane,
            RenderOptions::default(),
        )?;

        log::info!("Scene ready with {} render objects", self.cache.len());
        Ok(())
    }

    pub fn run(&mut self) -> RenderResult<()> {
        for frame in 0..FRAMES {
            match frame {
                EDIT_FRAME => self.pull_cube_corner(),
                OPTIONS_FRAME => self.hide_occluded_geometry()?,
                _ => {}
            }

            for (fingerprint, status) in self.cache.draw_all(MirrorAxes::X, Some(&self.frame)) {
                match status.error() {
                    Some(err) => log::warn!("Frame {}: {:?} -> {}", frame, fingerprint, err),
                    None => log::info!("Frame {}: {:?} -> {:?}", frame, fingerprint, status),
                }
            }

            // The headless device keeps every event until drained.
            let events = self.device.take_events();
            log::debug!("Frame {}: {} device events", frame, events.len());
            self.totals.record(&events);
        }

        self.report();
        Ok(())
    }

    fn pull_cube_corner(&self) {
        log::info!("Editing cube");
        self.cube.write().edit(|core| {
            let corner = core
                .vertices()
                .find(|(_, v)| v.position == Point3::new(1.0, 1.0, 1.0))
                .map(|(key, _)| key);
            if let Some(key) = corner {
                core.set_position(key, Point3::new(1.5, 1.5, 1.5));
            }
        });
    }

    fn hide_occluded_geometry(&self) -> RenderResult<()> {
        log::info!("Switching cube to visible-only drawing");
        let object = self
            .cache
            .get(&self.cube_fingerprint)
            .ok_or_else(|| RenderError::InvalidUse("cube is not cached".to_string()))?;
        object
            .lock()
            .replace_options(RenderOptions::default().with_no_below(true));
        Ok(())
    }

    fn report(&self) {
        for fingerprint in self.cache.fingerprints() {
            if let Some(object) = self.cache.get(&fingerprint) {
                log::info!("{:?}: {:?}", fingerprint, object.lock().stats());
            }
        }

        log::info!(
            "Device totals: {} compiles, {} replays, {} geometry draws, shader bound: {}",
            self.totals.compiles,
            self.totals.replays,
            self.totals.draws,
            self.device.shader_enabled()
        );
    }
}

/// Unit cube as core mesh plus matching edit view
fn cube() -> (CoreMesh, EditMesh) {
    let corners = [
        (-1.0, -1.0, -1.0),
        (1.0, -1.0, -1.0),
        (1.0, 1.0, -1.0),
        (-1.0, 1.0, -1.0),
        (-1.0, -1.0, 1.0),
        (1.0, -1.0, 1.0),
        (1.0, 1.0, 1.0),
        (-1.0, 1.0, 1.0),
    ];
    let faces: [[u32; 4]; 6] = [
        [0, 3, 2, 1],
        [4, 5, 6, 7],
        [0, 1, 5, 4],
        [2, 3, 7, 6],
        [1, 2, 6, 5],
        [0, 4, 7, 3],
    ];
    let edges: [[u32; 2]; 12] = [
        [0, 1],
        [1, 2],
        [2, 3],
        [3, 0],
        [4, 5],
        [5, 6],
        [6, 7],
        [7, 4],
        [0, 4],
        [1, 5],
        [2, 6],
        [3, 7],
    ];

    let mut core = CoreMesh::new();
    let mut edit = EditMesh::new();
    let keys: Vec<_> = corners
        .iter()
        .map(|&(x, y, z)| {
            let position = Point3::new(x, y, z);
            let normal = position.coords.normalize();
            edit.add_vertex(position, normal);
            core.add_vertex(position, normal)
        })
        .collect();

    for [a, b] in edges {
        edit.add_edge(a, b);
        core.add_edge(keys[a as usize], keys[b as usize]);
    }
    for face in faces {
        edit.add_polygon(face.to_vec());
        core.add_face(face.iter().map(|&i| keys[i as usize]).collect::<Vec<_>>());
    }
    (core, edit)
}

/// Quad on the positive X side, mirrored across X when drawn
fn plane() -> CoreMesh {
    let mut core = CoreMesh::new();
    let keys: Vec<_> = [(0.5, -1.0), (2.0, -1.0), (2.0, 1.0), (0.5, 1.0)]
        .iter()
        .map(|&(x, y)| core.add_vertex(Point3::new(x, y, -6.0), Vec3::z()))
        .collect();
    for i in 0..keys.len() {
        core.add_edge(keys[i], keys[(i + 1) % keys.len()]);
    }
    core.add_face(keys);
    core
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    mesh_render::foundation::logging::init();

    log::info!("Starting mesh viewer");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading render cache config from {}", path);
            RenderCacheConfig::load_from_file(&path)?
        }
        None => RenderCacheConfig::default()
            .with_gather(GatherConfig::both())
            .with_worker_threads(2),
    };

    let mut app = ViewerApp::new(&config)?;
    app.initialize()?;
    app.run()?;

    log::info!("Mesh viewer finished successfully");
    Ok(())
}
