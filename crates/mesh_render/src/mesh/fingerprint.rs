//! Content fingerprints used as render cache keys

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Cache key combining an object identity hash and a mesh content hash
///
/// Computing the hashes is the caller's job; equal fingerprints always map to
/// the same render object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshFingerprint {
    /// Hash of the owning object
    pub object: u64,
    /// Hash of the mesh content
    pub mesh: u64,
}

impl MeshFingerprint {
    /// Create a fingerprint from precomputed hashes
    pub const fn new(object: u64, mesh: u64) -> Self {
        Self { object, mesh }
    }

    /// Fingerprint any hashable object/mesh pair
    pub fn of<O: Hash + ?Sized, M: Hash + ?Sized>(object: &O, mesh: &M) -> Self {
        Self::new(hash_one(object), hash_one(mesh))
    }
}

fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
