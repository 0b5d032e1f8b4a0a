//! Draw commands recorded by the compiler
//!
//! A compiled draw buffer is a list of these commands. Geometry is captured
//! at compile time, so replaying a list never touches the mesh.

use super::device::{DepthFunc, RenderDevice};
use super::options::{DrawStyle, RenderOptions};
use crate::foundation::math::{Mat4, Point3};
use std::sync::Arc;

/// Face outline as a loop of positions
pub type Polygon = Vec<Point3>;

/// Edge as its two endpoint positions
pub type Segment = [Point3; 2];

/// Element class of a geometry draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Core faces
    Faces,
    /// Core edges
    Edges,
    /// Core vertices
    Verts,
    /// Edit-snapshot faces drawn without separate edges or vertices
    SimplifiedFaces,
}

/// Geometry of one draw, shared between the two passes
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Core faces
    Faces(Arc<[Polygon]>),
    /// Core edges
    Edges(Arc<[Segment]>),
    /// Core vertices
    Verts(Arc<[Point3]>),
    /// Edit-snapshot faces
    SimplifiedFaces(Arc<[Polygon]>),
}

impl Primitive {
    /// Element class
    pub const fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Faces(_) => PrimitiveKind::Faces,
            Self::Edges(_) => PrimitiveKind::Edges,
            Self::Verts(_) => PrimitiveKind::Verts,
            Self::SimplifiedFaces(_) => PrimitiveKind::SimplifiedFaces,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            Self::Faces(faces) | Self::SimplifiedFaces(faces) => faces.len(),
            Self::Edges(edges) => edges.len(),
            Self::Verts(verts) => verts.len(),
        }
    }

    /// True when there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One recorded device operation
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Reset style state the geometry renderer does not set per draw
    ApplyDefaults(Arc<RenderOptions>),
    /// Multiply the draw-space matrix onto the stack
    PushMatrix(Mat4),
    /// Restore the previous matrix
    PopMatrix,
    /// Enable or disable back-face culling
    SetCullFace(bool),
    /// Depth comparison
    SetDepthFunc(DepthFunc),
    /// Depth writes
    SetDepthMask(bool),
    /// Depth range
    SetDepthRange {
        /// Near plane
        near: f32,
        /// Far plane
        far: f32,
    },
    /// Geometry through one of the four renderer entry points
    Draw {
        /// Geometry
        primitive: Primitive,
        /// Style of the pass
        style: Arc<DrawStyle>,
    },
}

impl DrawCommand {
    /// Issue this command on a device
    pub fn apply(&self, device: &dyn RenderDevice) {
        match self {
            Self::ApplyDefaults(options) => device.apply_default_options(options),
            Self::PushMatrix(matrix) => device.push_matrix(matrix),
            Self::PopMatrix => device.pop_matrix(),
            Self::SetCullFace(enabled) => device.set_cull_face(*enabled),
            Self::SetDepthFunc(func) => device.set_depth_func(*func),
            Self::SetDepthMask(write) => device.set_depth_mask(*write),
            Self::SetDepthRange { near, far } => device.set_depth_range(*near, *far),
            Self::Draw { primitive, style } => match primitive {
                Primitive::Faces(faces) => device.draw_faces(faces, style),
                Primitive::Edges(edges) => device.draw_edges(edges, style),
                Primitive::Verts(verts) => device.draw_verts(verts, style),
                Primitive::SimplifiedFaces(faces) => device.draw_simplified_faces(faces, style),
            },
        }
    }
}

/// Issue a command sequence immediately
pub fn execute_all(device: &dyn RenderDevice, commands: &[DrawCommand]) {
    for command in commands {
        command.apply(device);
    }
}
