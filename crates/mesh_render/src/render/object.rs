//! Render objects: one cached draw list per mesh
//!
//! A [`RenderObject`] remembers the mesh version its draw list was compiled
//! from. `clean` recompiles only when the version changed; `draw` replays the
//! list otherwise.
//!
//! The version is stored *before* compiling. A compile that fails leaves the
//! previous list in place and is not retried until the mesh changes again, so
//! a broken mesh costs one failed compile instead of one per frame.

use super::commands::{execute_all, DrawCommand};
use super::compiler::{DrawCompiler, GeometrySource};
use super::device::{DrawListId, ListMode, RenderDevice, ShaderScope};
use super::gather::{AttributeGatherer, AttributeSnapshot};
use super::options::RenderOptions;
use super::{RenderError, RenderResult};
use crate::config::ReplayStrategy;
use crate::foundation::math::Mat4;
use crate::foundation::time::Stopwatch;
use crate::mesh::{Frame, MeshSource, MirrorAxes, MirrorUniforms, SharedMesh, VersionStamp};
use parking_lot::RwLockWriteGuard;
use std::sync::Arc;

/// Device draw list owned by exactly one render object
///
/// Released when dropped, whatever triggered the drop.
pub struct CompiledDrawBuffer {
    id: DrawListId,
    device: Arc<dyn RenderDevice>,
    compiled: bool,
}

impl CompiledDrawBuffer {
    /// Allocate an empty draw list
    pub fn allocate(device: Arc<dyn RenderDevice>) -> RenderResult<Self> {
        let id = device.create_draw_list()?;
        Ok(Self {
            id,
            device,
            compiled: false,
        })
    }

    /// Device handle
    pub fn id(&self) -> DrawListId {
        self.id
    }

    /// Whether the list holds a compiled sequence
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    fn compile(&mut self, commands: &[DrawCommand], mode: ListMode) -> RenderResult<()> {
        self.device.compile_draw_list(self.id, commands, mode)?;
        self.compiled = true;
        Ok(())
    }

    fn replay(&self) -> RenderResult<()> {
        self.device.call_draw_list(self.id)
    }
}

impl Drop for CompiledDrawBuffer {
    fn drop(&mut self) {
        log::debug!("Releasing draw list {:?}", self.id);
        self.device.delete_draw_list(self.id);
    }
}

impl std::fmt::Debug for CompiledDrawBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledDrawBuffer")
            .field("id", &self.id)
            .field("compiled", &self.compiled)
            .finish_non_exhaustive()
    }
}

/// Outcome of [`RenderObject::clean`]
#[derive(Debug)]
pub enum CleanStatus {
    /// Version unchanged, nothing done
    Unchanged,
    /// Draw list recompiled
    Compiled,
    /// Normalize, gather or compile failed; the previous list stays in effect
    Failed(RenderError),
}

impl CleanStatus {
    /// Whether the list was recompiled
    pub fn is_compiled(&self) -> bool {
        matches!(self, Self::Compiled)
    }

    /// Whether cleaning failed
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcome of [`RenderObject::draw`]
#[derive(Debug)]
pub enum DrawStatus {
    /// Unchanged list replayed
    Replayed,
    /// List recompiled and drawn in the same step
    Compiled,
    /// Full sequence built and executed without caching
    Immediate,
    /// Cleaning failed or no list was ever compiled; the previous list (if any) was replayed
    Stale(RenderError),
    /// Drawing failed; the shader was still disabled
    Failed(RenderError),
}

impl DrawStatus {
    /// The error carried by a stale or failed draw
    pub fn error(&self) -> Option<&RenderError> {
        match self {
            Self::Stale(err) | Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Per-object counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Successful draw list compiles
    pub compiles: u64,
    /// Draw list replays
    pub replays: u64,
    /// Uncached full-sequence draws
    pub immediate_draws: u64,
    /// Failed cleans
    pub clean_failures: u64,
    /// Failed draws
    pub draw_failures: u64,
}

/// Proof that construction goes through the render cache
pub(crate) struct FactoryToken(());

impl FactoryToken {
    pub(crate) fn new() -> Self {
        Self(())
    }
}

/// Builder for [`RenderObject`]
///
/// Only [`RenderCache::get_or_create`](super::RenderCache::get_or_create)
/// can complete a build. Calling [`RenderObjectBuilder::build`] directly
/// returns [`RenderError::InvalidUse`].
pub struct RenderObjectBuilder<M: MeshSource> {
    mesh: SharedMesh<M>,
    options: RenderOptions,
    device: Option<Arc<dyn RenderDevice>>,
    gatherer: AttributeGatherer,
    replay: ReplayStrategy,
    token: Option<FactoryToken>,
}

impl<M: MeshSource> RenderObjectBuilder<M> {
    /// Start a builder for a mesh and options
    pub fn new(mesh: SharedMesh<M>, options: RenderOptions) -> Self {
        Self {
            mesh,
            options,
            device: None,
            gatherer: AttributeGatherer::default(),
            replay: ReplayStrategy::Cached,
            token: None,
        }
    }

    /// Device that owns the draw list
    pub fn device(mut self, device: Arc<dyn RenderDevice>) -> Self {
        self.device = Some(device);
        self
    }

    /// Attribute gatherer
    pub fn gatherer(mut self, gatherer: AttributeGatherer) -> Self {
        self.gatherer = gatherer;
        self
    }

    /// Replay strategy
    pub fn replay(mut self, replay: ReplayStrategy) -> Self {
        self.replay = replay;
        self
    }

    pub(crate) fn token(mut self, token: FactoryToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Build the render object
    ///
    /// # Errors
    ///
    /// [`RenderError::InvalidUse`] unless invoked by the render cache or when
    /// no device was supplied; device errors from draw list allocation.
    pub fn build(self) -> RenderResult<RenderObject<M>> {
        if self.token.is_none() {
            return Err(RenderError::InvalidUse(
                "render objects must be created through RenderCache::get_or_create".to_string(),
            ));
        }
        let device = self
            .device
            .ok_or_else(|| {
                RenderError::InvalidUse("render object built without a device".to_string())
            })?;

        let buffer = CompiledDrawBuffer::allocate(Arc::clone(&device))?;
        let transform = self.mesh.read().transform();
        let mut object = RenderObject {
            mesh: self.mesh,
            options: self.options,
            version: None,
            transform,
            snapshot: Arc::new(AttributeSnapshot::empty()),
            gatherer: self.gatherer,
            replay: self.replay,
            buffer,
            device,
            stats: RenderStats::default(),
        };
        object.refresh_dpi();
        Ok(object)
    }
}

/// Cached draw state of one mesh
pub struct RenderObject<M: MeshSource> {
    mesh: SharedMesh<M>,
    options: RenderOptions,
    version: Option<VersionStamp>,
    transform: Mat4,
    snapshot: Arc<AttributeSnapshot>,
    gatherer: AttributeGatherer,
    replay: ReplayStrategy,
    buffer: CompiledDrawBuffer,
    device: Arc<dyn RenderDevice>,
    stats: RenderStats,
}

impl<M: MeshSource> RenderObject<M> {
    /// Swap the mesh and force a rebuild on the next clean
    pub fn replace_mesh(&mut self, mesh: SharedMesh<M>) {
        self.transform = mesh.read().transform();
        self.mesh = mesh;
        self.version = None;
    }

    /// Replace options and force a rebuild on the next clean
    pub fn replace_options(&mut self, options: RenderOptions) {
        self.options = options;
        self.refresh_dpi();
        self.version = None;
    }

    fn refresh_dpi(&mut self) {
        self.options.dpi_mult = self.device.dpi_mult();
    }

    /// Recompile the draw list if the mesh version changed
    ///
    /// Never panics on collaborator failure; failures are logged and
    /// returned as [`CleanStatus::Failed`].
    pub fn clean(&mut self) -> CleanStatus {
        self.clean_with(ListMode::Compile)
    }

    fn clean_with(&mut self, mode: ListMode) -> CleanStatus {
        match self.try_clean(mode) {
            Ok(true) => CleanStatus::Compiled,
            Ok(false) => CleanStatus::Unchanged,
            Err(err) => {
                log::warn!("Render object clean failed, keeping previous draw list: {}", err);
                self.stats.clean_failures += 1;
                CleanStatus::Failed(err)
            }
        }
    }

    fn try_clean(&mut self, mode: ListMode) -> RenderResult<bool> {
        let shared = Arc::clone(&self.mesh);
        let mut mesh = shared.write();
        mesh.clean()?;
        let mesh = RwLockWriteGuard::downgrade(mesh);

        let version = mesh.version();
        if self.version == Some(version) {
            return Ok(false);
        }

        self.snapshot = Arc::new(self.gatherer.gather(&*mesh)?);
        self.version = Some(version);

        let stopwatch = Stopwatch::start_new();
        let commands = self.build_commands(&*mesh)?;
        drop(mesh);
        self.buffer.compile(&commands, mode)?;
        self.stats.compiles += 1;
        log::debug!(
            "Compiled draw list {:?} ({} commands, version {:?}) in {:.3} ms",
            self.buffer.id(),
            commands.len(),
            version,
            stopwatch.elapsed_ms()
        );
        Ok(true)
    }

    fn build_commands(&self, mesh: &M) -> RenderResult<Vec<DrawCommand>> {
        let source = GeometrySource::select(&self.snapshot, mesh.core_mesh())?;
        let compiler = DrawCompiler::new(&self.options, self.transform, mesh.symmetry());
        Ok(compiler.compile(&source))
    }

    /// Draw the mesh for this frame
    ///
    /// The shader is enabled for the duration of the call and disabled on
    /// every exit path. Failures are logged and returned in the status.
    pub fn draw(&mut self, symmetry: MirrorAxes, frame: Option<&Frame>) -> DrawStatus {
        let device = Arc::clone(&self.device);
        let uniforms = MirrorUniforms::new(symmetry, frame);
        match self.try_draw(device.as_ref(), &uniforms) {
            Ok(status) => status,
            Err(err) => {
                log::error!("Render object draw failed: {}", err);
                self.stats.draw_failures += 1;
                DrawStatus::Failed(err)
            }
        }
    }

    fn try_draw(
        &mut self,
        device: &dyn RenderDevice,
        uniforms: &MirrorUniforms,
    ) -> RenderResult<DrawStatus> {
        let _shader = ShaderScope::enable(device)?;
        device.set_mirror(uniforms)?;
        match self.replay {
            ReplayStrategy::Cached => self.draw_cached(),
            ReplayStrategy::AlwaysDirty => self.draw_immediate(device),
        }
    }

    fn draw_cached(&mut self) -> RenderResult<DrawStatus> {
        match self.clean_with(ListMode::CompileAndExecute) {
            CleanStatus::Compiled => Ok(DrawStatus::Compiled),
            CleanStatus::Unchanged if self.buffer.is_compiled() => {
                self.replay_buffer()?;
                Ok(DrawStatus::Replayed)
            }
            // A failed compile already took this version; nothing to replay until the next edit.
            CleanStatus::Unchanged => Ok(DrawStatus::Stale(RenderError::NoDrawList)),
            CleanStatus::Failed(err) => {
                if self.buffer.is_compiled() {
                    self.replay_buffer()?;
                }
                Ok(DrawStatus::Stale(err))
            }
        }
    }

    fn replay_buffer(&mut self) -> RenderResult<()> {
        self.buffer.replay()?;
        self.stats.replays += 1;
        log::trace!("Replayed draw list {:?}", self.buffer.id());
        Ok(())
    }

    fn draw_immediate(&mut self, device: &dyn RenderDevice) -> RenderResult<DrawStatus> {
        let shared = Arc::clone(&self.mesh);
        let mut mesh = shared.write();
        mesh.clean()?;
        let mesh = RwLockWriteGuard::downgrade(mesh);

        self.snapshot = Arc::new(self.gatherer.gather(&*mesh)?);
        self.version = Some(mesh.version());
        let commands = self.build_commands(&*mesh)?;
        drop(mesh);

        execute_all(device, &commands);
        self.stats.immediate_draws += 1;
        Ok(DrawStatus::Immediate)
    }

    /// Mesh being drawn
    pub fn mesh(&self) -> &SharedMesh<M> {
        &self.mesh
    }

    /// Current options
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Version the draw list was last compiled from, `None` when unknown
    pub fn version(&self) -> Option<VersionStamp> {
        self.version
    }

    /// Draw-space transform
    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Latest attribute snapshot
    pub fn snapshot(&self) -> Arc<AttributeSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Owned draw list
    pub fn buffer(&self) -> &CompiledDrawBuffer {
        &self.buffer
    }

    /// Replay strategy
    pub fn replay_strategy(&self) -> ReplayStrategy {
        self.replay
    }

    /// Counters
    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{CoreMesh, TrackedMesh};
    use crate::render::HeadlessDevice;
    use parking_lot::RwLock;

    #[test]
    fn test_direct_build_is_invalid_use() {
        let mesh = Arc::new(RwLock::new(TrackedMesh::new(CoreMesh::new())));
        let device: Arc<dyn RenderDevice> = Arc::new(HeadlessDevice::new());
        let result = RenderObjectBuilder::new(mesh, RenderOptions::default())
            .device(device)
            .build();
        assert!(matches!(result, Err(RenderError::InvalidUse(_))));
    }

    #[test]
    fn test_build_without_device_is_invalid_use() {
        let mesh = Arc::new(RwLock::new(TrackedMesh::new(CoreMesh::new())));
        let result = RenderObjectBuilder::new(mesh, RenderOptions::default())
            .token(FactoryToken::new())
            .build();
        assert!(matches!(result, Err(RenderError::InvalidUse(_))));
    }

    #[test]
    fn test_buffer_released_once_on_drop() {
        let device = Arc::new(HeadlessDevice::new());
        let mesh = Arc::new(RwLock::new(TrackedMesh::new(CoreMesh::new())));
        let object = RenderObjectBuilder::new(mesh, RenderOptions::default())
            .device(device.clone())
            .token(FactoryToken::new())
            .build()
            .unwrap();
        assert_eq!(device.live_lists(), 1);
        drop(object);
        assert_eq!(device.live_lists(), 0);
        assert_eq!(
            device.count(|e| matches!(e, crate::render::DeviceEvent::ListDeleted(_))),
            1
        );
    }

    #[test]
    fn test_options_take_device_dpi() {
        let device = Arc::new(HeadlessDevice::with_dpi_mult(2.0));
        let mesh = Arc::new(RwLock::new(TrackedMesh::new(CoreMesh::new())));
        let mut object = RenderObjectBuilder::new(mesh, RenderOptions::default())
            .device(device)
            .token(FactoryToken::new())
            .build()
            .unwrap();
        assert!((object.options().dpi_mult - 2.0).abs() < f32::EPSILON);

        object.replace_options(RenderOptions::default());
        assert!((object.options().dpi_mult - 2.0).abs() < f32::EPSILON);
        assert_eq!(object.version(), None);
    }
}
