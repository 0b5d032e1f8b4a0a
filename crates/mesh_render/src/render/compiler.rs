//! Two-pass draw sequence compiler
//!
//! Geometry is drawn twice with depth writes off:
//!
//! 1. **above**: `LessEqual` depth test, hidden factors [`ABOVE_HIDDEN`], so
//!    visible geometry draws at full option opacity
//! 2. **below**: `Greater` depth test, hidden factors [`BELOW_HIDDEN`], so
//!    geometry behind other surfaces shows faintly through them
//!
//! The sequence ends by restoring `LessEqual`, depth writes and the [0, 1]
//! depth range. `RenderOptions::no_below` drops the second pass.

use super::commands::{DrawCommand, Polygon, Primitive, Segment};
use super::device::DepthFunc;
use super::gather::{AttributeSnapshot, GatherError, GatherResult};
use super::options::{DrawStyle, HiddenFactors, RenderOptions};
use crate::foundation::math::{Mat4, Point3};
use crate::mesh::{CoreMesh, MirrorAxes};
use std::sync::Arc;

/// Hidden factor of the visible-geometry pass
pub const ABOVE_HIDDEN: f32 = 0.0;

/// Hidden factor of the occluded-geometry pass
pub const BELOW_HIDDEN: f32 = 0.95;

/// Geometry a compile draws, resolved once and shared by both passes
#[derive(Debug, Clone, PartialEq)]
pub enum GeometrySource {
    /// Edit-snapshot faces only
    Simplified(Arc<[Polygon]>),
    /// Faces, edges and vertices of the live core mesh
    Live {
        /// Face loops
        faces: Arc<[Polygon]>,
        /// Edges
        edges: Arc<[Segment]>,
        /// Vertices
        verts: Arc<[Point3]>,
    },
}

impl GeometrySource {
    /// Prefer non-empty edit-snapshot faces, otherwise read the live core mesh
    pub fn select(snapshot: &AttributeSnapshot, core: &CoreMesh) -> GatherResult<Self> {
        match snapshot.edit_faces() {
            Some(faces) => Ok(Self::Simplified(faces.into())),
            None => Self::live(core),
        }
    }

    /// Resolve the live core mesh
    pub fn live(core: &CoreMesh) -> GatherResult<Self> {
        let position = |element: &'static str, element_index: usize, key| {
            core.vertex(key)
                .map(|v| v.position)
                .ok_or(GatherError::DanglingVertex { element, element_index })
        };

        let mut faces = Vec::with_capacity(core.faces().len());
        for (i, face) in core.faces().iter().enumerate() {
            faces.push(
                face.iter()
                    .map(|&key| position("face", i, key))
                    .collect::<GatherResult<Polygon>>()?,
            );
        }

        let mut edges = Vec::with_capacity(core.edges().len());
        for (i, &[a, b]) in core.edges().iter().enumerate() {
            edges.push([position("edge", i, a)?, position("edge", i, b)?]);
        }

        let verts: Vec<Point3> = core.vertices().map(|(_, v)| v.position).collect();

        Ok(Self::Live {
            faces: faces.into(),
            edges: edges.into(),
            verts: verts.into(),
        })
    }
}

/// Builds the command sequence for one render object
pub struct DrawCompiler<'a> {
    options: &'a RenderOptions,
    transform: Mat4,
    symmetry: MirrorAxes,
}

impl<'a> DrawCompiler<'a> {
    /// Create a compiler for the given options, draw-space transform and mirror axes
    pub fn new(options: &'a RenderOptions, transform: Mat4, symmetry: MirrorAxes) -> Self {
        Self {
            options,
            transform,
            symmetry,
        }
    }

    /// Options copied into a working set with the mirror axes applied
    pub fn base_style(&self) -> DrawStyle {
        let mut style = DrawStyle::from_options(self.options);
        style.mirror = self.symmetry;
        style
    }

    fn pass_style(&self, hidden: f32) -> Arc<DrawStyle> {
        let mut style = self.base_style();
        style.hidden = HiddenFactors::uniform(hidden);
        Arc::new(style)
    }

    /// Compile the full sequence
    pub fn compile(&self, source: &GeometrySource) -> Vec<DrawCommand> {
        let mut commands = vec![
            DrawCommand::ApplyDefaults(Arc::new(self.options.clone())),
            DrawCommand::PushMatrix(self.transform),
            DrawCommand::SetCullFace(false),
        ];

        // above
        commands.push(DrawCommand::SetDepthFunc(DepthFunc::LessEqual));
        commands.push(DrawCommand::SetDepthMask(false));
        push_geometry(&mut commands, source, &self.pass_style(ABOVE_HIDDEN));

        // below
        if !self.options.no_below {
            commands.push(DrawCommand::SetDepthFunc(DepthFunc::Greater));
            commands.push(DrawCommand::SetDepthMask(false));
            push_geometry(&mut commands, source, &self.pass_style(BELOW_HIDDEN));
        }

        commands.extend([
            DrawCommand::SetDepthFunc(DepthFunc::LessEqual),
            DrawCommand::SetDepthMask(true),
            DrawCommand::SetDepthRange { near: 0.0, far: 1.0 },
            DrawCommand::PopMatrix,
        ]);
        commands
    }
}

fn push_geometry(commands: &mut Vec<DrawCommand>, source: &GeometrySource, style: &Arc<DrawStyle>) {
    let draw = |primitive| DrawCommand::Draw {
        primitive,
        style: Arc::clone(style),
    };
    match source {
        GeometrySource::Simplified(faces) => {
            commands.push(draw(Primitive::SimplifiedFaces(Arc::clone(faces))));
        }
        GeometrySource::Live { faces, edges, verts } => {
            commands.push(draw(Primitive::Faces(Arc::clone(faces))));
            commands.push(draw(Primitive::Edges(Arc::clone(edges))));
            commands.push(draw(Primitive::Verts(Arc::clone(verts))));
        }
    }
}
