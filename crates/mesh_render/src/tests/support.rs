//! Shared fixtures for render cache scenarios

use crate::config::{GatherConfig, ReplayStrategy};
use crate::foundation::logging;
use crate::foundation::math::{Mat4, Point3, Vec3};
use crate::mesh::{
    CoreMesh, EditMesh, MeshError, MeshFingerprint, MeshResult, MeshSource, MirrorAxes, SharedMesh,
    TrackedMesh, VersionStamp,
};
use crate::render::{
    DepthFunc, DeviceEvent, GatherRunner, HeadlessDevice, PrimitiveKind, RenderCache, RenderOptions,
    SharedRenderObject,
};
use parking_lot::RwLock;
use std::sync::Arc;

/// Mesh whose normalization can be made to fail
pub struct ScriptedMesh {
    pub inner: TrackedMesh,
    pub fail_clean: bool,
    pub clean_calls: usize,
}

impl ScriptedMesh {
    pub fn new(inner: TrackedMesh) -> Self {
        Self {
            inner,
            fail_clean: false,
            clean_calls: 0,
        }
    }

    /// Bump the version without changing geometry
    pub fn touch(&mut self) {
        self.inner.edit(|_| ());
    }
}

impl MeshSource for ScriptedMesh {
    fn clean(&mut self) -> MeshResult<()> {
        self.clean_calls += 1;
        if self.fail_clean {
            return Err(MeshError::Normalize("scripted failure".to_string()));
        }
        self.inner.clean()
    }

    fn version(&self) -> VersionStamp {
        self.inner.version()
    }

    fn transform(&self) -> Mat4 {
        self.inner.transform()
    }

    fn symmetry(&self) -> MirrorAxes {
        self.inner.symmetry()
    }

    fn edit_mesh(&self) -> Option<&EditMesh> {
        self.inner.edit_mesh()
    }

    fn core_mesh(&self) -> &CoreMesh {
        self.inner.core_mesh()
    }
}

/// Unit quad split into two triangles: 4 vertices, 5 edges, 2 faces, at depth `z`
pub fn quad_core(z: f32) -> CoreMesh {
    let mut core = CoreMesh::new();
    let a = core.add_vertex(Point3::new(0.0, 0.0, z), Vec3::z());
    let b = core.add_vertex(Point3::new(1.0, 0.0, z), Vec3::z());
    let c = core.add_vertex(Point3::new(1.0, 1.0, z), Vec3::z());
    let d = core.add_vertex(Point3::new(0.0, 1.0, z), Vec3::z());
    for (p, q) in [(a, b), (b, c), (c, d), (d, a), (a, c)] {
        core.add_edge(p, q);
    }
    core.add_face(vec![a, b, c]);
    core.add_face(vec![a, c, d]);
    core
}

/// Edit view of [`quad_core`]
pub fn quad_edit(z: f32) -> EditMesh {
    let mut edit = EditMesh::new();
    for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
        edit.add_vertex(Point3::new(x, y, z), Vec3::z());
    }
    edit.add_edge(0, 2);
    edit.add_polygon(vec![0, 1, 2]);
    edit.add_polygon(vec![0, 2, 3]);
    edit
}

/// Edit view whose second polygon refers past the vertex list
pub fn broken_edit() -> EditMesh {
    let mut edit = quad_edit(0.0);
    edit.add_polygon(vec![0, 2, 9]);
    edit
}

pub fn scripted(core: CoreMesh) -> SharedMesh<ScriptedMesh> {
    shared(TrackedMesh::new(core))
}

pub fn shared(mesh: TrackedMesh) -> SharedMesh<ScriptedMesh> {
    Arc::new(RwLock::new(ScriptedMesh::new(mesh)))
}

/// Draw events as (kind, hidden poly factor, depth func, depth mask)
pub fn passes(device: &HeadlessDevice) -> Vec<(PrimitiveKind, f32, DepthFunc, bool)> {
    device
        .events()
        .into_iter()
        .filter_map(|event| match event {
            DeviceEvent::Draw {
                kind,
                hidden,
                depth_func,
                depth_mask,
                ..
            } => Some((kind, hidden.poly, depth_func, depth_mask)),
            _ => None,
        })
        .collect()
}

pub struct Harness {
    pub device: Arc<HeadlessDevice>,
    pub cache: RenderCache<ScriptedMesh>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(GatherConfig::default(), ReplayStrategy::Cached, GatherRunner::Synchronous)
    }

    pub fn with(gather: GatherConfig, replay: ReplayStrategy, runner: GatherRunner) -> Self {
        logging::init_for_tests();
        let device = Arc::new(HeadlessDevice::new());
        let cache = RenderCache::with_runner(device.clone(), gather, replay, runner);
        Self { device, cache }
    }

    pub fn object(
        &self,
        id: u64,
        mesh: SharedMesh<ScriptedMesh>,
    ) -> SharedRenderObject<ScriptedMesh> {
        self.cache
            .get_or_create(MeshFingerprint::new(id, 0), mesh, RenderOptions::default())
            .unwrap()
    }

    pub fn compiles(&self) -> usize {
        self.device.count(|e| matches!(e, DeviceEvent::ListCompiled { .. }))
    }

    pub fn replays(&self) -> usize {
        self.device.count(|e| matches!(e, DeviceEvent::ListCalled(_)))
    }

    pub fn shader_pairs(&self) -> (usize, usize) {
        (
            self.device.count(|e| matches!(e, DeviceEvent::ShaderEnabled)),
            self.device.count(|e| matches!(e, DeviceEvent::ShaderDisabled)),
        )
    }
}
