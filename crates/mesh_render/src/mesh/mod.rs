//! Mesh collaborator interface
//!
//! The render cache never edits meshes. It reads them through [`MeshSource`],
//! which exposes a version stamp, a draw-space transform, the active mirror
//! axes and two views of the same geometry:
//!
//! - the **edit** representation ([`EditMesh`]), index based, reflecting
//!   in-progress interactive edits with no vertex sharing guarantee
//! - the **core** representation ([`CoreMesh`]), canonical, where each vertex
//!   is stored once and referenced by key from adjacent edges and faces

pub mod fingerprint;
pub mod representation;
pub mod symmetry;
pub mod tracked;

pub use fingerprint::MeshFingerprint;
pub use representation::{CoreMesh, CoreVertex, EditMesh, EditVertex, VertexKey};
pub use symmetry::{Frame, MirrorAxes, MirrorUniforms};
pub use tracked::TrackedMesh;

use crate::foundation::math::Mat4;
use parking_lot::RwLock;
use std::sync::Arc;

/// Opaque token that changes if and only if mesh content changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionStamp(pub u64);

/// Mesh shared between the editor and the render cache
pub type SharedMesh<M> = Arc<RwLock<M>>;

/// Errors reported by mesh collaborators
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// Internal state could not be normalized
    #[error("mesh normalization failed: {0}")]
    Normalize(String),

    /// Topology references something that does not exist
    #[error("invalid mesh topology: {0}")]
    Topology(String),
}

/// Result type for mesh operations
pub type MeshResult<T> = Result<T, MeshError>;

/// Read access to an editable mesh
///
/// Implementations must be `Send + Sync`: gathering may read the mesh from
/// worker threads while the render thread holds a read lock.
pub trait MeshSource: Send + Sync {
    /// Normalize internal state before it is read (recompute normals,
    /// flush pending edits). Must succeed for well-formed meshes.
    fn clean(&mut self) -> MeshResult<()>;

    /// Current content version
    fn version(&self) -> VersionStamp;

    /// Object-to-draw-space transform
    fn transform(&self) -> Mat4;

    /// Mirror axes currently active on the mesh
    fn symmetry(&self) -> MirrorAxes;

    /// Edit representation, if the mesh has one
    fn edit_mesh(&self) -> Option<&EditMesh>;

    /// Core representation
    fn core_mesh(&self) -> &CoreMesh;
}
