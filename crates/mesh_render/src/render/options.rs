//! Render options and the per-draw style working set

use crate::config::{Config, Deserialize, Serialize};
use crate::mesh::MirrorAxes;

/// Style options for one render object
///
/// Opacity factors scale the alpha of each element class; the `mirror`
/// variants apply to geometry drawn through a mirror plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Face color, RGBA (default: `[0.08, 0.31, 0.47, 1.0]`)
    pub poly_color: [f32; 4],
    /// Face opacity (default: 0.3)
    pub poly_opacity: f32,
    /// Mirrored face opacity (default: 0.15)
    pub poly_mirror_opacity: f32,

    /// Edge color, RGBA (default: `[0.0, 0.0, 0.0, 1.0]`)
    pub line_color: [f32; 4],
    /// Edge width in pixels before dpi scaling (default: 1.0)
    pub line_width: f32,
    /// Edge opacity (default: 1.0)
    pub line_opacity: f32,
    /// Mirrored edge opacity (default: 0.5)
    pub line_mirror_opacity: f32,

    /// Vertex color, RGBA (default: `[0.0, 0.0, 0.0, 1.0]`)
    pub point_color: [f32; 4],
    /// Vertex size in pixels before dpi scaling (default: 5.0)
    pub point_size: f32,
    /// Vertex opacity (default: 1.0)
    pub point_opacity: f32,
    /// Mirrored vertex opacity (default: 0.5)
    pub point_mirror_opacity: f32,

    /// Display dpi multiplier, refreshed from the device whenever options are
    /// replaced (default: 1.0)
    pub dpi_mult: f32,
    /// Skip the pass that draws occluded geometry (default: false)
    pub no_below: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            poly_color: [0.08, 0.31, 0.47, 1.0],
            poly_opacity: 0.3,
            poly_mirror_opacity: 0.15,
            line_color: [0.0, 0.0, 0.0, 1.0],
            line_width: 1.0,
            line_opacity: 1.0,
            line_mirror_opacity: 0.5,
            point_color: [0.0, 0.0, 0.0, 1.0],
            point_size: 5.0,
            point_opacity: 1.0,
            point_mirror_opacity: 0.5,
            dpi_mult: 1.0,
            no_below: false,
        }
    }
}

impl Config for RenderOptions {}

impl RenderOptions {
    /// Skip or keep the occluded-geometry pass
    pub fn with_no_below(mut self, no_below: bool) -> Self {
        self.no_below = no_below;
        self
    }

    /// Edge width scaled for the display
    pub fn scaled_line_width(&self) -> f32 {
        self.line_width * self.dpi_mult
    }

    /// Vertex size scaled for the display
    pub fn scaled_point_size(&self) -> f32 {
        self.point_size * self.dpi_mult
    }
}

/// Opacity bias conveying occlusion, per element class and mirror state
///
/// 0.0 draws at full option opacity, values near 1.0 fade the element out.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HiddenFactors {
    /// Faces
    pub poly: f32,
    /// Mirrored faces
    pub poly_mirror: f32,
    /// Edges
    pub line: f32,
    /// Mirrored edges
    pub line_mirror: f32,
    /// Vertices
    pub point: f32,
    /// Mirrored vertices
    pub point_mirror: f32,
}

impl HiddenFactors {
    /// Same factor for every element class and mirror state
    pub const fn uniform(factor: f32) -> Self {
        Self {
            poly: factor,
            poly_mirror: factor,
            line: factor,
            line_mirror: factor,
            point: factor,
            point_mirror: factor,
        }
    }

    /// All six factors
    pub const fn as_array(&self) -> [f32; 6] {
        [
            self.poly,
            self.poly_mirror,
            self.line,
            self.line_mirror,
            self.point,
            self.point_mirror,
        ]
    }
}

/// Style working set for one pass of one draw
///
/// Starts as a copy of the object's options; the compiler adds the mirror
/// axes of the mesh and the hidden factors of the pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawStyle {
    /// Copied options
    pub options: RenderOptions,
    /// Occlusion bias of the pass
    pub hidden: HiddenFactors,
    /// Mirror axes to render
    pub mirror: MirrorAxes,
}

impl DrawStyle {
    /// Copy options into a fresh working set
    pub fn from_options(options: &RenderOptions) -> Self {
        Self {
            options: options.clone(),
            hidden: HiddenFactors::default(),
            mirror: MirrorAxes::empty(),
        }
    }

    /// Whether the given axis is mirrored
    pub fn mirrored(&self, axis: MirrorAxes) -> bool {
        self.mirror.contains(axis)
    }

    /// Effective face alpha for normal or mirrored geometry
    pub fn poly_alpha(&self, mirrored: bool) -> f32 {
        let (opacity, hidden) = if mirrored {
            (self.options.poly_mirror_opacity, self.hidden.poly_mirror)
        } else {
            (self.options.poly_opacity, self.hidden.poly)
        };
        self.options.poly_color[3] * opacity * (1.0 - hidden)
    }
}
