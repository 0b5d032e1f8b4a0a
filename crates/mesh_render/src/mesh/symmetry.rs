//! Mirror symmetry and the uniforms derived from it

use crate::foundation::math::{Point3, Vec3};
use bitflags::bitflags;

bitflags! {
    /// Set of active mirror axes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MirrorAxes: u8 {
        /// Mirror across the YZ plane
        const X = 0b001;
        /// Mirror across the XZ plane
        const Y = 0b010;
        /// Mirror across the XY plane
        const Z = 0b100;
    }
}

impl MirrorAxes {
    /// Axis names of the active flags, in x, y, z order
    pub fn axis_names(self) -> impl Iterator<Item = &'static str> {
        [(Self::X, "x"), (Self::Y, "y"), (Self::Z, "z")]
            .into_iter()
            .filter(move |(axis, _)| self.contains(*axis))
            .map(|(_, name)| name)
    }
}

/// Orthonormal frame the mirror planes are expressed in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Frame origin
    pub origin: Point3,
    /// X axis
    pub x: Vec3,
    /// Y axis
    pub y: Vec3,
    /// Z axis
    pub z: Vec3,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            origin: Point3::origin(),
            x: Vec3::x(),
            y: Vec3::y(),
            z: Vec3::z(),
        }
    }
}

impl Frame {
    /// Create a frame from an origin and three axes
    pub fn new(origin: Point3, x: Vec3, y: Vec3, z: Vec3) -> Self {
        Self { origin, x, y, z }
    }
}

/// Shader uniforms controlling mirrored rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorUniforms {
    /// Mirror axes to render
    pub axes: MirrorAxes,
    /// Frame of the mirror planes
    pub frame: Frame,
}

impl MirrorUniforms {
    /// Derive uniforms from a symmetry set and an optional frame.
    ///
    /// Without a frame the mirror planes pass through the world origin.
    pub fn new(symmetry: MirrorAxes, frame: Option<&Frame>) -> Self {
        Self {
            axes: symmetry,
            frame: frame.copied().unwrap_or_default(),
        }
    }

    /// Uniforms with mirroring switched off
    pub fn disabled() -> Self {
        Self::new(MirrorAxes::empty(), None)
    }

    /// Per-axis enable flags as the shader consumes them
    pub fn enabled_flags(&self) -> [bool; 3] {
        [
            self.axes.contains(MirrorAxes::X),
            self.axes.contains(MirrorAxes::Y),
            self.axes.contains(MirrorAxes::Z),
        ]
    }
}
