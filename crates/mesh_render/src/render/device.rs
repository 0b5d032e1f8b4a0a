//! Render device abstraction
//!
//! The cache talks to the graphics API through two traits:
//!
//! - [`GeometryRenderer`] owns the four geometry entry points and turns
//!   positions plus a [`DrawStyle`] into primitive draw calls
//! - [`RenderDevice`] adds fixed-function state, the mesh shader, display
//!   metrics and draw lists (pre-recorded, replayable command sequences)
//!
//! Methods take `&self`: a device wraps a context that is already externally
//! synchronized to the render thread, and draw lists must be released from
//! `Drop` where only a shared handle is available.

use super::commands::{DrawCommand, Polygon, Segment};
use super::options::{DrawStyle, RenderOptions};
use super::RenderResult;
use crate::foundation::math::{Mat4, Point3};
use crate::mesh::MirrorUniforms;

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    /// Nearer-or-equal fragments pass
    LessEqual,
    /// Only strictly farther fragments pass
    Greater,
}

/// Handle to a device draw list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawListId(pub u64);

/// What compiling a draw list does with the commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Record only
    Compile,
    /// Record and execute in the same step
    CompileAndExecute,
}

/// Low-level geometry entry points
pub trait GeometryRenderer {
    /// Draw shaded faces
    fn draw_faces(&self, faces: &[Polygon], style: &DrawStyle);

    /// Draw edges as lines
    fn draw_edges(&self, edges: &[Segment], style: &DrawStyle);

    /// Draw vertices as points
    fn draw_verts(&self, verts: &[Point3], style: &DrawStyle);

    /// Draw faces without per-element edge or vertex passes
    fn draw_simplified_faces(&self, faces: &[Polygon], style: &DrawStyle);
}

/// Graphics device used by render objects
pub trait RenderDevice: GeometryRenderer + Send + Sync {
    /// Reset style state to the object's options
    fn apply_default_options(&self, options: &RenderOptions);

    /// Push a matrix multiplied onto the current one
    fn push_matrix(&self, matrix: &Mat4);

    /// Pop the matrix stack
    fn pop_matrix(&self);

    /// Enable or disable back-face culling
    fn set_cull_face(&self, enabled: bool);

    /// Set the depth comparison
    fn set_depth_func(&self, func: DepthFunc);

    /// Enable or disable depth writes
    fn set_depth_mask(&self, write: bool);

    /// Set the depth range
    fn set_depth_range(&self, near: f32, far: f32);

    /// Bind the mesh shader
    fn enable_shader(&self) -> RenderResult<()>;

    /// Unbind the mesh shader. Must be safe to call when not enabled.
    fn disable_shader(&self);

    /// Upload mirror uniforms to the bound shader
    fn set_mirror(&self, uniforms: &MirrorUniforms) -> RenderResult<()>;

    /// Display dpi multiplier
    fn dpi_mult(&self) -> f32;

    /// Allocate an empty draw list
    fn create_draw_list(&self) -> RenderResult<DrawListId>;

    /// Record commands into a draw list, replacing its contents.
    ///
    /// On error the previous contents must stay intact.
    fn compile_draw_list(
        &self,
        id: DrawListId,
        commands: &[DrawCommand],
        mode: ListMode,
    ) -> RenderResult<()>;

    /// Execute a recorded draw list
    fn call_draw_list(&self, id: DrawListId) -> RenderResult<()>;

    /// Release a draw list
    fn delete_draw_list(&self, id: DrawListId);
}

/// Keeps the mesh shader bound for a scope
///
/// The shader is disabled when the scope drops, on every exit path including
/// early returns, errors and unwinding. A failed enable still disables.
pub struct ShaderScope<'a> {
    device: &'a dyn RenderDevice,
}

impl<'a> ShaderScope<'a> {
    /// Enable the shader for the lifetime of the returned scope
    pub fn enable(device: &'a dyn RenderDevice) -> RenderResult<Self> {
        let scope = Self { device };
        device.enable_shader()?;
        Ok(scope)
    }
}

impl Drop for ShaderScope<'_> {
    fn drop(&mut self) {
        self.device.disable_shader();
    }
}
