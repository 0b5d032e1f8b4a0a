//! Attribute gathering
//!
//! Extracts immutable snapshots of the edit and core representations. The
//! two extractions are pure functions of the same read-only mesh, so running
//! them on a worker pool or on the calling thread gives identical results.
//!
//! Pooled gathering joins both tasks before returning; the snapshot is
//! published to the render object in one assignment afterwards. A reader
//! either sees the previous snapshot or the complete new one.

use super::commands::{Polygon, Segment};
use super::{RenderError, RenderResult};
use crate::config::{GatherConfig, RenderCacheConfig};
use crate::foundation::math::{Point3, Vec3};
use crate::foundation::time::Stopwatch;
use crate::mesh::{CoreMesh, EditMesh, MeshSource, VertexKey};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::HashMap;
use std::sync::Arc;

/// Gathering errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GatherError {
    /// An edit edge or polygon refers past the vertex list
    #[error("edit {element} {element_index} refers to vertex {vertex} of {vertex_count}")]
    IndexOutOfRange {
        /// "edge" or "polygon"
        element: &'static str,
        /// Index of the offending element
        element_index: usize,
        /// Referenced vertex index
        vertex: u32,
        /// Number of vertices
        vertex_count: usize,
    },

    /// A core edge or face refers to a removed vertex
    #[error("core {element} {element_index} refers to a missing vertex")]
    DanglingVertex {
        /// "edge" or "face"
        element: &'static str,
        /// Index of the offending element
        element_index: usize,
    },
}

/// Result type for gathering
pub type GatherResult<T> = Result<T, GatherError>;

/// Vertex attributes captured in a snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotVertex {
    /// Position
    pub position: Point3,
    /// Normal
    pub normal: Vec3,
}

/// Snapshot of one representation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepresentationSnapshot {
    /// Vertex attributes
    pub verts: Vec<SnapshotVertex>,
    /// Edge endpoint positions
    pub edges: Vec<Segment>,
    /// Face loop positions
    pub faces: Vec<Polygon>,
}

impl RepresentationSnapshot {
    /// Element counts as (verts, edges, faces)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.verts.len(), self.edges.len(), self.faces.len())
    }
}

/// Snapshots of both representations
///
/// `None` means "disabled or not available", never an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSnapshot {
    /// Edit representation snapshot
    pub edit: Option<RepresentationSnapshot>,
    /// Core representation snapshot
    pub core: Option<RepresentationSnapshot>,
}

impl AttributeSnapshot {
    /// Snapshot with nothing gathered
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when neither representation was gathered
    pub fn is_empty(&self) -> bool {
        self.edit.is_none() && self.core.is_none()
    }

    /// Edit faces, if gathered and non-empty
    pub fn edit_faces(&self) -> Option<&[Polygon]> {
        self.edit
            .as_ref()
            .map(|edit| edit.faces.as_slice())
            .filter(|faces| !faces.is_empty())
    }
}

/// Snapshot the edit representation
///
/// Edges and polygons resolve through the vertex list; coincident vertices
/// are not merged.
pub fn gather_edit(edit: &EditMesh) -> GatherResult<RepresentationSnapshot> {
    let verts: Vec<SnapshotVertex> = edit
        .vertices
        .iter()
        .map(|v| SnapshotVertex {
            position: v.position,
            normal: v.normal,
        })
        .collect();

    let resolve = |element: &'static str, element_index: usize, vertex: u32| {
        verts
            .get(vertex as usize)
            .map(|v| v.position)
            .ok_or(GatherError::IndexOutOfRange {
                element,
                element_index,
                vertex,
                vertex_count: verts.len(),
            })
    };

    let edges = edit
        .edges
        .iter()
        .enumerate()
        .map(|(i, [a, b])| Ok([resolve("edge", i, *a)?, resolve("edge", i, *b)?]))
        .collect::<GatherResult<Vec<_>>>()?;

    let faces = edit
        .polygons
        .iter()
        .enumerate()
        .map(|(i, polygon)| {
            polygon
                .iter()
                .map(|&vertex| resolve("polygon", i, vertex))
                .collect::<GatherResult<Polygon>>()
        })
        .collect::<GatherResult<Vec<_>>>()?;

    Ok(RepresentationSnapshot { verts, edges, faces })
}

/// Snapshot the core representation
///
/// Each vertex key maps to exactly one snapshot vertex, so shared vertices
/// appear once.
pub fn gather_core(core: &CoreMesh) -> GatherResult<RepresentationSnapshot> {
    let mut index_of: HashMap<VertexKey, usize> = HashMap::with_capacity(core.vertex_count());
    let mut verts = Vec::with_capacity(core.vertex_count());
    for (key, vertex) in core.vertices() {
        index_of.insert(key, verts.len());
        verts.push(SnapshotVertex {
            position: vertex.position,
            normal: vertex.normal,
        });
    }

    let resolve = |element: &'static str, element_index: usize, key: &VertexKey| {
        index_of
            .get(key)
            .map(|&i| verts[i].position)
            .ok_or(GatherError::DanglingVertex { element, element_index })
    };

    let edges = core
        .edges()
        .iter()
        .enumerate()
        .map(|(i, [a, b])| Ok([resolve("edge", i, a)?, resolve("edge", i, b)?]))
        .collect::<GatherResult<Vec<_>>>()?;

    let faces = core
        .faces()
        .iter()
        .enumerate()
        .map(|(i, face)| {
            face.iter()
                .map(|key| resolve("face", i, key))
                .collect::<GatherResult<Polygon>>()
        })
        .collect::<GatherResult<Vec<_>>>()?;

    Ok(RepresentationSnapshot { verts, edges, faces })
}

/// Where gathering tasks run
#[derive(Clone, Default)]
pub enum GatherRunner {
    /// On the calling thread, one after the other
    #[default]
    Synchronous,
    /// On a shared worker pool, joined before returning
    Pooled(Arc<ThreadPool>),
}

impl std::fmt::Debug for GatherRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Synchronous => f.write_str("Synchronous"),
            Self::Pooled(pool) => write!(f, "Pooled({} threads)", pool.current_num_threads()),
        }
    }
}

impl GatherRunner {
    /// Build a runner with its own pool of `threads` workers
    pub fn pooled(threads: usize) -> RenderResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("mesh-gather-{i}"))
            .build()
            .map_err(|e| RenderError::WorkerPool(e.to_string()))?;
        Ok(Self::Pooled(Arc::new(pool)))
    }

    /// Runner described by a cache configuration; 0 threads is synchronous
    pub fn from_config(config: &RenderCacheConfig) -> RenderResult<Self> {
        match config.worker_threads {
            0 => Ok(Self::Synchronous),
            threads => Self::pooled(threads),
        }
    }

    /// Run two tasks and wait for both
    pub fn join<A, B, RA, RB>(&self, a: A, b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        match self {
            Self::Synchronous => (a(), b()),
            Self::Pooled(pool) => pool.join(a, b),
        }
    }
}

/// Runs the enabled extractions for a mesh
#[derive(Debug, Clone, Default)]
pub struct AttributeGatherer {
    config: GatherConfig,
    runner: GatherRunner,
}

impl AttributeGatherer {
    /// Create a gatherer
    pub fn new(config: GatherConfig, runner: GatherRunner) -> Self {
        Self { config, runner }
    }

    /// Enabled representations
    pub fn config(&self) -> GatherConfig {
        self.config
    }

    /// Execution strategy
    pub fn runner(&self) -> &GatherRunner {
        &self.runner
    }

    /// Gather snapshots of the enabled representations
    pub fn gather<M: MeshSource + ?Sized>(&self, mesh: &M) -> GatherResult<AttributeSnapshot> {
        if self.config.is_disabled() {
            return Ok(AttributeSnapshot::empty());
        }

        let stopwatch = Stopwatch::start_new();
        let edit_mesh = if self.config.edit { mesh.edit_mesh() } else { None };
        let core_mesh = self.config.core.then(|| mesh.core_mesh());

        // Tasks stay free of logging; the timing is reported after the join.
        let (edit, core) = self.runner.join(
            || edit_mesh.map(gather_edit).transpose(),
            || core_mesh.map(gather_core).transpose(),
        );
        let snapshot = AttributeSnapshot {
            edit: edit?,
            core: core?,
        };

        log::debug!(
            "Gathered mesh attributes in {:.3} ms (edit: {:?}, core: {:?}, runner: {:?})",
            stopwatch.elapsed_ms(),
            snapshot.edit.as_ref().map(RepresentationSnapshot::counts),
            snapshot.core.as_ref().map(RepresentationSnapshot::counts),
            self.runner,
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::TrackedMesh;

    fn quad_core() -> CoreMesh {
        let mut core = CoreMesh::new();
        let a = core.add_vertex(Point3::new(0.0, 0.0, 0.0), Vec3::z());
        let b = core.add_vertex(Point3::new(1.0, 0.0, 0.0), Vec3::z());
        let c = core.add_vertex(Point3::new(1.0, 1.0, 0.0), Vec3::z());
        let d = core.add_vertex(Point3::new(0.0, 1.0, 0.0), Vec3::z());
        for (p, q) in [(a, b), (b, c), (c, d), (d, a), (a, c)] {
            core.add_edge(p, q);
        }
        core.add_face(vec![a, b, c]);
        core.add_face(vec![a, c, d]);
        core
    }

    fn quad_edit() -> EditMesh {
        let mut edit = EditMesh::new();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            edit.add_vertex(Point3::new(x, y, 0.0), Vec3::z());
        }
        edit.add_edge(0, 2);
        edit.add_polygon(vec![0, 1, 2]);
        edit.add_polygon(vec![0, 2, 3]);
        edit
    }

    #[test]
    fn test_core_snapshot_dedups_shared_vertices() {
        let snapshot = gather_core(&quad_core()).unwrap();
        assert_eq!(snapshot.counts(), (4, 5, 2));
        // The diagonal vertices are shared by both faces but stored once.
        assert_eq!(snapshot.faces[0][0], snapshot.faces[1][0]);
        assert_eq!(snapshot.faces[0][2], snapshot.faces[1][1]);
    }

    #[test]
    fn test_edit_snapshot_resolves_indices() {
        let snapshot = gather_edit(&quad_edit()).unwrap();
        assert_eq!(snapshot.counts(), (4, 1, 2));
        assert_eq!(snapshot.edges[0], [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)]);
        assert_eq!(snapshot.faces[1][2], Point3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_edit_index_out_of_range() {
        let mut edit = quad_edit();
        edit.add_polygon(vec![0, 1, 9]);
        let err = gather_edit(&edit).unwrap_err();
        assert_eq!(
            err,
            GatherError::IndexOutOfRange {
                element: "polygon",
                element_index: 2,
                vertex: 9,
                vertex_count: 4,
            }
        );
    }

    #[test]
    fn test_core_dangling_vertex() {
        let mut core = quad_core();
        core.add_face(vec![VertexKey::default()]);
        assert!(matches!(
            gather_core(&core),
            Err(GatherError::DanglingVertex { element: "face", .. })
        ));
    }

    #[test]
    fn test_disabled_gatherer_returns_empty_snapshot() {
        let mesh = TrackedMesh::new(quad_core()).with_edit_mesh(quad_edit());
        let snapshot = AttributeGatherer::default().gather(&mesh).unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.edit_faces().is_none());
    }

    #[test]
    fn test_pooled_and_synchronous_gathering_agree() {
        let mesh = TrackedMesh::new(quad_core()).with_edit_mesh(quad_edit());
        let sync = AttributeGatherer::new(GatherConfig::both(), GatherRunner::Synchronous)
            .gather(&mesh)
            .unwrap();
        let pooled = AttributeGatherer::new(GatherConfig::both(), GatherRunner::pooled(2).unwrap())
            .gather(&mesh)
            .unwrap();
        assert_eq!(sync, pooled);
        assert!(sync.edit.is_some() && sync.core.is_some());
    }

    #[test]
    fn test_edit_gathering_without_edit_mesh() {
        let mesh = TrackedMesh::new(quad_core());
        let gatherer = AttributeGatherer::new(
            GatherConfig { edit: true, core: false },
            GatherRunner::Synchronous,
        );
        let snapshot = gatherer.gather(&mesh).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_runner_from_config() {
        let sync = GatherRunner::from_config(&RenderCacheConfig::default()).unwrap();
        assert!(matches!(sync, GatherRunner::Synchronous));
        let config = RenderCacheConfig::default().with_worker_threads(2);
        let pooled = GatherRunner::from_config(&config).unwrap();
        assert!(matches!(pooled, GatherRunner::Pooled(_)));
    }
}
