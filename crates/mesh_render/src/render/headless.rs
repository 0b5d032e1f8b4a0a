//! Headless render device
//!
//! Executes draw commands against an in-memory state machine and records
//! every operation as a [`DeviceEvent`]. Used for offscreen validation, the
//! viewer demo and tests. Faults can be injected through [`FaultPlan`].

use super::commands::{execute_all, DrawCommand, Polygon, PrimitiveKind, Segment};
use super::device::{DepthFunc, DrawListId, GeometryRenderer, ListMode, RenderDevice};
use super::options::{DrawStyle, HiddenFactors, RenderOptions};
use super::{RenderError, RenderResult};
use crate::foundation::math::{point_bits, Mat4, Point3};
use crate::mesh::{MirrorAxes, MirrorUniforms};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Operation observed by the headless device
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// Default options applied
    DefaultsApplied,
    /// Matrix pushed
    MatrixPushed,
    /// Matrix popped
    MatrixPopped,
    /// Cull-face toggled
    CullFace(bool),
    /// Depth function set
    DepthFunc(DepthFunc),
    /// Depth mask set
    DepthMask(bool),
    /// Depth range set
    DepthRange(f32, f32),
    /// Geometry drawn
    Draw {
        /// Element class
        kind: PrimitiveKind,
        /// Number of elements
        count: usize,
        /// Distinct vertex positions touched by the call
        unique_verts: usize,
        /// Hidden factors of the pass
        hidden: HiddenFactors,
        /// Mirror axes of the pass
        mirror: MirrorAxes,
        /// Depth function active when drawn
        depth_func: DepthFunc,
        /// Depth mask active when drawn
        depth_mask: bool,
    },
    /// Shader bound
    ShaderEnabled,
    /// Shader unbound
    ShaderDisabled,
    /// Mirror uniforms uploaded
    Mirror(MirrorUniforms),
    /// Draw list allocated
    ListCreated(DrawListId),
    /// Draw list recorded
    ListCompiled {
        /// List
        id: DrawListId,
        /// Compile mode
        mode: ListMode,
        /// Number of recorded commands
        commands: usize,
    },
    /// Draw list replayed
    ListCalled(DrawListId),
    /// Draw list released
    ListDeleted(DrawListId),
}

/// Failures to inject into the next matching operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// Fail `compile_draw_list`
    pub fail_compile: bool,
    /// Fail `set_mirror`
    pub fail_mirror: bool,
    /// Fail `enable_shader`
    pub fail_enable: bool,
    /// Fail `call_draw_list`
    pub fail_call: bool,
}

struct HeadlessState {
    shader_enabled: bool,
    depth_func: DepthFunc,
    depth_mask: bool,
    cull_face: bool,
    depth_range: (f32, f32),
    matrix_stack: Vec<Mat4>,
    lists: HashMap<DrawListId, Vec<DrawCommand>>,
    next_list: u64,
    events: Vec<DeviceEvent>,
    faults: FaultPlan,
}

/// In-memory [`RenderDevice`]
pub struct HeadlessDevice {
    dpi_mult: f32,
    state: Mutex<HeadlessState>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    /// Create a device with a dpi multiplier of 1.0
    pub fn new() -> Self {
        Self::with_dpi_mult(1.0)
    }

    /// Create a device reporting the given dpi multiplier
    pub fn with_dpi_mult(dpi_mult: f32) -> Self {
        Self {
            dpi_mult,
            state: Mutex::new(HeadlessState {
                shader_enabled: false,
                depth_func: DepthFunc::LessEqual,
                depth_mask: true,
                cull_face: true,
                depth_range: (0.0, 1.0),
                matrix_stack: vec![Mat4::identity()],
                lists: HashMap::new(),
                next_list: 1,
                events: Vec::new(),
                faults: FaultPlan::default(),
            }),
        }
    }

    /// Replace the injected faults
    pub fn inject(&self, faults: FaultPlan) {
        self.state.lock().faults = faults;
    }

    /// Recorded events
    pub fn events(&self) -> Vec<DeviceEvent> {
        self.state.lock().events.clone()
    }

    /// Drain recorded events
    pub fn take_events(&self) -> Vec<DeviceEvent> {
        std::mem::take(&mut self.state.lock().events)
    }

    /// Number of recorded events matching a predicate
    pub fn count(&self, predicate: impl Fn(&DeviceEvent) -> bool) -> usize {
        self.state.lock().events.iter().filter(|e| predicate(e)).count()
    }

    /// Whether the shader is currently bound
    pub fn shader_enabled(&self) -> bool {
        self.state.lock().shader_enabled
    }

    /// Current depth function and mask
    pub fn depth_state(&self) -> (DepthFunc, bool) {
        let state = self.state.lock();
        (state.depth_func, state.depth_mask)
    }

    /// Current depth range
    pub fn depth_range(&self) -> (f32, f32) {
        self.state.lock().depth_range
    }

    /// Whether back-face culling is enabled
    pub fn cull_face(&self) -> bool {
        self.state.lock().cull_face
    }

    /// Depth of the matrix stack; 1 when balanced
    pub fn matrix_depth(&self) -> usize {
        self.state.lock().matrix_stack.len()
    }

    /// Draw lists currently allocated
    pub fn live_lists(&self) -> usize {
        self.state.lock().lists.len()
    }

    fn record(&self, event: DeviceEvent) {
        self.state.lock().events.push(event);
    }

    fn draw(
        &self,
        kind: PrimitiveKind,
        count: usize,
        points: impl Iterator<Item = Point3>,
        style: &DrawStyle,
    ) {
        // Per-call scratch: each distinct position is counted once.
        let unique_verts = points.map(|p| point_bits(&p)).collect::<HashSet<_>>().len();
        let mut state = self.state.lock();
        let event = DeviceEvent::Draw {
            kind,
            count,
            unique_verts,
            hidden: style.hidden,
            mirror: style.mirror,
            depth_func: state.depth_func,
            depth_mask: state.depth_mask,
        };
        state.events.push(event);
    }
}

impl GeometryRenderer for HeadlessDevice {
    fn draw_faces(&self, faces: &[Polygon], style: &DrawStyle) {
        self.draw(PrimitiveKind::Faces, faces.len(), faces.iter().flatten().copied(), style);
    }

    fn draw_edges(&self, edges: &[Segment], style: &DrawStyle) {
        self.draw(PrimitiveKind::Edges, edges.len(), edges.iter().flatten().copied(), style);
    }

    fn draw_verts(&self, verts: &[Point3], style: &DrawStyle) {
        self.draw(PrimitiveKind::Verts, verts.len(), verts.iter().copied(), style);
    }

    fn draw_simplified_faces(&self, faces: &[Polygon], style: &DrawStyle) {
        self.draw(
            PrimitiveKind::SimplifiedFaces,
            faces.len(),
            faces.iter().flatten().copied(),
            style,
        );
    }
}

impl RenderDevice for HeadlessDevice {
    fn apply_default_options(&self, _options: &RenderOptions) {
        self.record(DeviceEvent::DefaultsApplied);
    }

    fn push_matrix(&self, matrix: &Mat4) {
        let mut state = self.state.lock();
        let top = state.matrix_stack.last().copied().unwrap_or_else(Mat4::identity);
        state.matrix_stack.push(top * matrix);
        state.events.push(DeviceEvent::MatrixPushed);
    }

    fn pop_matrix(&self) {
        let mut state = self.state.lock();
        if state.matrix_stack.len() > 1 {
            state.matrix_stack.pop();
        } else {
            log::warn!("Headless device matrix stack underflow");
        }
        state.events.push(DeviceEvent::MatrixPopped);
    }

    fn set_cull_face(&self, enabled: bool) {
        let mut state = self.state.lock();
        state.cull_face = enabled;
        state.events.push(DeviceEvent::CullFace(enabled));
    }

    fn set_depth_func(&self, func: DepthFunc) {
        let mut state = self.state.lock();
        state.depth_func = func;
        state.events.push(DeviceEvent::DepthFunc(func));
    }

    fn set_depth_mask(&self, write: bool) {
        let mut state = self.state.lock();
        state.depth_mask = write;
        state.events.push(DeviceEvent::DepthMask(write));
    }

    fn set_depth_range(&self, near: f32, far: f32) {
        let mut state = self.state.lock();
        state.depth_range = (near, far);
        state.events.push(DeviceEvent::DepthRange(near, far));
    }

    fn enable_shader(&self) -> RenderResult<()> {
        let mut state = self.state.lock();
        if state.faults.fail_enable {
            return Err(RenderError::Device("injected shader enable failure".to_string()));
        }
        state.shader_enabled = true;
        state.events.push(DeviceEvent::ShaderEnabled);
        Ok(())
    }

    fn disable_shader(&self) {
        let mut state = self.state.lock();
        state.shader_enabled = false;
        state.events.push(DeviceEvent::ShaderDisabled);
    }

    fn set_mirror(&self, uniforms: &MirrorUniforms) -> RenderResult<()> {
        let mut state = self.state.lock();
        if state.faults.fail_mirror {
            return Err(RenderError::Device("injected mirror uniform failure".to_string()));
        }
        state.events.push(DeviceEvent::Mirror(*uniforms));
        Ok(())
    }

    fn dpi_mult(&self) -> f32 {
        self.dpi_mult
    }

    fn create_draw_list(&self) -> RenderResult<DrawListId> {
        let mut state = self.state.lock();
        let id = DrawListId(state.next_list);
        state.next_list += 1;
        state.lists.insert(id, Vec::new());
        state.events.push(DeviceEvent::ListCreated(id));
        Ok(id)
    }

    fn compile_draw_list(
        &self,
        id: DrawListId,
        commands: &[DrawCommand],
        mode: ListMode,
    ) -> RenderResult<()> {
        {
            let mut state = self.state.lock();
            if state.faults.fail_compile {
                return Err(RenderError::Device("injected draw list compile failure".to_string()));
            }
            let Some(list) = state.lists.get_mut(&id) else {
                return Err(RenderError::Device(format!("unknown draw list {id:?}")));
            };
            *list = commands.to_vec();
            state.events.push(DeviceEvent::ListCompiled {
                id,
                mode,
                commands: commands.len(),
            });
        }
        if mode == ListMode::CompileAndExecute {
            execute_all(self, commands);
        }
        Ok(())
    }

    fn call_draw_list(&self, id: DrawListId) -> RenderResult<()> {
        let commands = {
            let mut state = self.state.lock();
            if state.faults.fail_call {
                return Err(RenderError::Device("injected draw list call failure".to_string()));
            }
            let Some(list) = state.lists.get(&id) else {
                return Err(RenderError::Device(format!("unknown draw list {id:?}")));
            };
            let commands = list.clone();
            state.events.push(DeviceEvent::ListCalled(id));
            commands
        };
        execute_all(self, &commands);
        Ok(())
    }

    fn delete_draw_list(&self, id: DrawListId) {
        let mut state = self.state.lock();
        if state.lists.remove(&id).is_some() {
            state.events.push(DeviceEvent::ListDeleted(id));
        } else {
            log::warn!("Deleting unknown draw list {:?}", id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_replays_recorded_commands() {
        let device = HeadlessDevice::new();
        let id = device.create_draw_list().unwrap();
        device
            .compile_draw_list(
                id,
                &[DrawCommand::SetDepthFunc(DepthFunc::Greater), DrawCommand::SetDepthMask(false)],
                ListMode::Compile,
            )
            .unwrap();
        assert_eq!(device.depth_state(), (DepthFunc::LessEqual, true));

        device.call_draw_list(id).unwrap();
        assert_eq!(device.depth_state(), (DepthFunc::Greater, false));
    }

    #[test]
    fn test_failed_compile_keeps_previous_contents() {
        let device = HeadlessDevice::new();
        let id = device.create_draw_list().unwrap();
        device
            .compile_draw_list(id, &[DrawCommand::SetCullFace(false)], ListMode::Compile)
            .unwrap();
        device.inject(FaultPlan {
            fail_compile: true,
            ..FaultPlan::default()
        });
        assert!(device.compile_draw_list(id, &[], ListMode::Compile).is_err());

        device.inject(FaultPlan::default());
        device.call_draw_list(id).unwrap();
        assert!(!device.cull_face());
    }

    #[test]
    fn test_delete_releases_list() {
        let device = HeadlessDevice::new();
        let id = device.create_draw_list().unwrap();
        assert_eq!(device.live_lists(), 1);
        device.delete_draw_list(id);
        assert_eq!(device.live_lists(), 0);
        assert!(device.call_draw_list(id).is_err());
    }

    #[test]
    fn test_take_events_drains_log() {
        let device = HeadlessDevice::new();
        device.create_draw_list().unwrap();
        device.set_cull_face(false);

        let drained = device.take_events();
        assert_eq!(drained.len(), 2);
        assert!(device.events().is_empty());
        assert_eq!(device.count(|e| matches!(e, DeviceEvent::CullFace(_))), 0);
        assert_eq!(device.live_lists(), 1);
    }

    #[test]
    fn test_draw_counts_unique_vertices() {
        let device = HeadlessDevice::new();
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let style = DrawStyle::from_options(&RenderOptions::default());
        device.draw_faces(&[vec![a, b, c], vec![a, c, b]], &style);
        assert!(matches!(
            device.events().last(),
            Some(DeviceEvent::Draw { count: 2, unique_verts: 3, .. })
        ));
    }
}
