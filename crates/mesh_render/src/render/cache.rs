//! Render object registry
//!
//! Maps a [`MeshFingerprint`] to exactly one [`RenderObject`]. The registry
//! is an explicit object owned by the caller's render context; object
//! lifetime is caller managed through [`RenderCache::evict`] and
//! [`RenderCache::clear`].

use super::device::RenderDevice;
use super::gather::{AttributeGatherer, GatherRunner};
use super::object::{DrawStatus, FactoryToken, RenderObject, RenderObjectBuilder};
use super::options::RenderOptions;
use super::RenderResult;
use crate::config::{GatherConfig, RenderCacheConfig, ReplayStrategy};
use crate::mesh::{Frame, MeshFingerprint, MeshSource, MirrorAxes, SharedMesh};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Render object shared between the cache and its callers
pub type SharedRenderObject<M> = Arc<Mutex<RenderObject<M>>>;

/// Thread-safe registry of render objects keyed by fingerprint
pub struct RenderCache<M: MeshSource> {
    objects: Mutex<HashMap<MeshFingerprint, SharedRenderObject<M>>>,
    device: Arc<dyn RenderDevice>,
    gatherer: AttributeGatherer,
    replay: ReplayStrategy,
}

impl<M: MeshSource> RenderCache<M> {
    /// Create a cache from configuration, building a gather pool if requested
    pub fn new(device: Arc<dyn RenderDevice>, config: &RenderCacheConfig) -> RenderResult<Self> {
        let runner = GatherRunner::from_config(config)?;
        Ok(Self::with_runner(device, config.gather, config.replay, runner))
    }

    /// Create a cache with an explicit gather runner
    pub fn with_runner(
        device: Arc<dyn RenderDevice>,
        gather: GatherConfig,
        replay: ReplayStrategy,
        runner: GatherRunner,
    ) -> Self {
        log::info!(
            "Render cache created (gather: {:?}, replay: {:?}, runner: {:?})",
            gather,
            replay,
            runner
        );
        Self {
            objects: Mutex::new(HashMap::new()),
            device,
            gatherer: AttributeGatherer::new(gather, runner),
            replay,
        }
    }

    /// Return the object for `fingerprint`, creating it on first use
    ///
    /// Lookup and insertion happen under one lock, so concurrent callers
    /// with the same fingerprint get the same object and it is constructed
    /// once. `mesh` and `options` are ignored on a hit.
    pub fn get_or_create(
        &self,
        fingerprint: MeshFingerprint,
        mesh: SharedMesh<M>,
        options: RenderOptions,
    ) -> RenderResult<SharedRenderObject<M>> {
        let mut objects = self.objects.lock();
        if let Some(object) = objects.get(&fingerprint) {
            return Ok(Arc::clone(object));
        }

        let object = RenderObjectBuilder::new(mesh, options)
            .device(Arc::clone(&self.device))
            .gatherer(self.gatherer.clone())
            .replay(self.replay)
            .token(FactoryToken::new())
            .build()?;
        log::debug!(
            "Created render object for {:?} (draw list {:?})",
            fingerprint,
            object.buffer().id()
        );

        let object = Arc::new(Mutex::new(object));
        objects.insert(fingerprint, Arc::clone(&object));
        Ok(object)
    }

    /// Cached object for `fingerprint`
    pub fn get(&self, fingerprint: &MeshFingerprint) -> Option<SharedRenderObject<M>> {
        self.objects.lock().get(fingerprint).map(Arc::clone)
    }

    /// Whether `fingerprint` is cached
    pub fn contains(&self, fingerprint: &MeshFingerprint) -> bool {
        self.objects.lock().contains_key(fingerprint)
    }

    /// Remove an object; its draw list is released once the last handle drops
    pub fn evict(&self, fingerprint: &MeshFingerprint) -> Option<SharedRenderObject<M>> {
        let evicted = self.objects.lock().remove(fingerprint);
        if evicted.is_some() {
            log::debug!("Evicted render object for {:?}", fingerprint);
        }
        evicted
    }

    /// Remove every object
    pub fn clear(&self) {
        self.objects.lock().clear();
    }

    /// Number of cached objects
    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached fingerprints in sorted order
    pub fn fingerprints(&self) -> Vec<MeshFingerprint> {
        let mut fingerprints: Vec<_> = self.objects.lock().keys().copied().collect();
        fingerprints.sort_unstable();
        fingerprints
    }

    /// Draw every cached object in fingerprint order
    ///
    /// The registry lock is released before drawing, so objects may be
    /// looked up from other threads meanwhile.
    pub fn draw_all(
        &self,
        symmetry: MirrorAxes,
        frame: Option<&Frame>,
    ) -> Vec<(MeshFingerprint, DrawStatus)> {
        let mut objects: Vec<_> = self
            .objects
            .lock()
            .iter()
            .map(|(fingerprint, object)| (*fingerprint, Arc::clone(object)))
            .collect();
        objects.sort_unstable_by_key(|(fingerprint, _)| *fingerprint);

        objects
            .into_iter()
            .map(|(fingerprint, object)| (fingerprint, object.lock().draw(symmetry, frame)))
            .collect()
    }

    /// Device shared by all objects
    pub fn device(&self) -> &Arc<dyn RenderDevice> {
        &self.device
    }
}
