//! # Mesh Render
//!
//! Render cache and dirty tracking for editable polygon meshes.
//!
//! ## Features
//!
//! - **Version-based invalidation**: draw lists recompile only when the mesh
//!   version changes or the mesh/options are replaced
//! - **Content-addressed registry**: one render object per mesh fingerprint
//! - **Off-thread gathering**: edit and core attribute snapshots on a rayon pool
//! - **Two-pass occlusion drawing**: visible geometry at full opacity, hidden
//!   geometry faintly through the surfaces in front of it
//!
//! ## Quick Start
//!
//! ```rust
//! use mesh_render::prelude::*;
//! use parking_lot::RwLock;
//! use std::sync::Arc;
//!
//! let device = Arc::new(HeadlessDevice::new());
//! let cache: RenderCache<TrackedMesh> =
//!     RenderCache::new(device.clone(), &RenderCacheConfig::default()).unwrap();
//!
//! let mesh = Arc::new(RwLock::new(TrackedMesh::new(CoreMesh::new())));
//! let object = cache
//!     .get_or_create(MeshFingerprint::of("Cube", &0u64), mesh, RenderOptions::default())
//!     .unwrap();
//!
//! let status = object.lock().draw(MirrorAxes::empty(), None);
//! assert!(status.error().is_none());
//! assert!(!device.shader_enabled());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod mesh;
pub mod render;

#[cfg(test)]
mod tests;

pub use render::{RenderError, RenderResult};

/// Common imports for cache users
pub mod prelude {
    pub use crate::{
        config::{Config, GatherConfig, RenderCacheConfig, ReplayStrategy},
        foundation::math::{Mat4, Point3, Vec3},
        mesh::{
            CoreMesh, EditMesh, Frame, MeshFingerprint, MeshSource, MirrorAxes, SharedMesh,
            TrackedMesh, VersionStamp,
        },
        render::{
            CleanStatus, DrawStatus, GatherRunner, HeadlessDevice, RenderCache, RenderDevice,
            RenderObject, RenderOptions, SharedRenderObject,
        },
        RenderError, RenderResult,
    };
}
