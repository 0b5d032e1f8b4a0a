//! Render cache for editable meshes
//!
//! ```text
//! RenderCache (fingerprint -> RenderObject)
//!         │
//!         ▼
//!   RenderObject::draw ──► clean ──► version changed?
//!         │                              │ yes
//!         │                              ▼
//!         │                  AttributeGatherer (sync or pooled)
//!         │                              │
//!         │                              ▼
//!         │                  DrawCompiler (two-pass sequence)
//!         │                              │
//!         ▼                              ▼
//!   replay draw list ◄──────── CompiledDrawBuffer
//! ```
//!
//! Both `clean` and `draw` report failures as status values and log them;
//! nothing in this module aborts a frame.

pub mod cache;
pub mod commands;
pub mod compiler;
pub mod device;
pub mod gather;
pub mod headless;
pub mod object;
pub mod options;

pub use cache::{RenderCache, SharedRenderObject};
pub use commands::{DrawCommand, Polygon, Primitive, PrimitiveKind, Segment};
pub use compiler::{DrawCompiler, GeometrySource, ABOVE_HIDDEN, BELOW_HIDDEN};
pub use device::{DepthFunc, DrawListId, GeometryRenderer, ListMode, RenderDevice, ShaderScope};
pub use gather::{
    AttributeGatherer, AttributeSnapshot, GatherError, GatherResult, GatherRunner,
    RepresentationSnapshot, SnapshotVertex,
};
pub use headless::{DeviceEvent, FaultPlan, HeadlessDevice};
pub use object::{
    CleanStatus, CompiledDrawBuffer, DrawStatus, RenderObject, RenderObjectBuilder, RenderStats,
};
pub use options::{DrawStyle, HiddenFactors, RenderOptions};

use crate::config::ConfigError;
use crate::mesh::MeshError;

/// Render cache errors
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// An API was used outside its supported path
    ///
    /// Returned when a render object is built without going through
    /// [`RenderCache::get_or_create`].
    #[error("invalid use: {0}")]
    InvalidUse(String),

    /// The mesh collaborator failed
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Attribute gathering failed
    #[error(transparent)]
    Gather(#[from] GatherError),

    /// A replay was requested but the draw list was never compiled
    #[error("no compiled draw list to replay")]
    NoDrawList,

    /// The render device rejected an operation
    #[error("device error: {0}")]
    Device(String),

    /// The gather worker pool could not be created
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for render cache operations
pub type RenderResult<T> = Result<T, RenderError>;
