//! Minimal versioned mesh

use super::{CoreMesh, EditMesh, MeshResult, MeshSource, MirrorAxes, VersionStamp};
use crate::foundation::math::Mat4;

/// A core mesh (plus optional edit view) whose version bumps on every edit
///
/// Handy for tools that keep geometry outside a full mesh editor, and for
/// driving the render cache in tests and demos.
#[derive(Debug, Clone)]
pub struct TrackedMesh {
    core: CoreMesh,
    edit: Option<EditMesh>,
    transform: Mat4,
    symmetry: MirrorAxes,
    version: u64,
}

impl TrackedMesh {
    /// Wrap a core mesh with an identity transform and no symmetry
    pub fn new(core: CoreMesh) -> Self {
        Self {
            core,
            edit: None,
            transform: Mat4::identity(),
            symmetry: MirrorAxes::empty(),
            version: 0,
        }
    }

    /// Attach an edit representation
    pub fn with_edit_mesh(mut self, edit: EditMesh) -> Self {
        self.edit = Some(edit);
        self
    }

    /// Set the draw-space transform
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Set the active mirror axes
    pub fn with_symmetry(mut self, symmetry: MirrorAxes) -> Self {
        self.symmetry = symmetry;
        self
    }

    /// Edit the core mesh, bumping the version
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut CoreMesh) -> R) -> R {
        self.version += 1;
        f(&mut self.core)
    }

    /// Edit the edit representation, bumping the version
    pub fn edit_view<R>(&mut self, f: impl FnOnce(&mut Option<EditMesh>) -> R) -> R {
        self.version += 1;
        f(&mut self.edit)
    }

    /// Change the active mirror axes, bumping the version
    pub fn set_symmetry(&mut self, symmetry: MirrorAxes) {
        self.version += 1;
        self.symmetry = symmetry;
    }
}

impl MeshSource for TrackedMesh {
    fn clean(&mut self) -> MeshResult<()> {
        Ok(())
    }

    fn version(&self) -> VersionStamp {
        VersionStamp(self.version)
    }

    fn transform(&self) -> Mat4 {
        self.transform
    }

    fn symmetry(&self) -> MirrorAxes {
        self.symmetry
    }

    fn edit_mesh(&self) -> Option<&EditMesh> {
        self.edit.as_ref()
    }

    fn core_mesh(&self) -> &CoreMesh {
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Point3, Vec3};

    #[test]
    fn test_edits_bump_version() {
        let mut mesh = TrackedMesh::new(CoreMesh::new());
        let before = mesh.version();
        mesh.edit(|core| core.add_vertex(Point3::origin(), Vec3::z()));
        assert_ne!(mesh.version(), before);
        assert_eq!(mesh.core_mesh().vertex_count(), 1);
    }

    #[test]
    fn test_reads_do_not_bump_version() {
        let mesh = TrackedMesh::new(CoreMesh::new()).with_symmetry(MirrorAxes::X);
        let before = mesh.version();
        let _ = mesh.symmetry();
        let _ = mesh.core_mesh();
        assert_eq!(mesh.version(), before);
    }
}
