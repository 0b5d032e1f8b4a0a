use super::support::{quad_core, quad_edit, scripted, shared, Harness};
use crate::config::{GatherConfig, ReplayStrategy};
use crate::foundation::math::{Mat4, Vec3};
use crate::mesh::{MeshSource, MirrorAxes, TrackedMesh};
use crate::render::{CleanStatus, DeviceEvent, DrawStatus, GatherRunner, ListMode, RenderOptions};

#[test]
fn test_repeated_clean_compiles_once() {
    let harness = Harness::new();
    let object = harness.object(1, scripted(quad_core(0.0)));
    let mut object = object.lock();

    assert!(object.clean().is_compiled());
    for _ in 0..4 {
        assert!(matches!(object.clean(), CleanStatus::Unchanged));
    }
    assert_eq!(harness.compiles(), 1);
    assert_eq!(object.stats().compiles, 1);
}

#[test]
fn test_version_changes_coalesce_into_one_recompile() {
    let harness = Harness::new();
    let mesh = scripted(quad_core(0.0));
    let object = harness.object(1, mesh.clone());
    let mut object = object.lock();
    object.clean();

    for _ in 0..3 {
        mesh.write().touch();
    }
    assert!(object.clean().is_compiled());
    assert!(matches!(object.clean(), CleanStatus::Unchanged));
    assert_eq!(harness.compiles(), 2);
    assert_eq!(object.version(), Some(mesh.read().version()));
}

#[test]
fn test_three_draws_compile_once_replay_twice() {
    let harness = Harness::new();
    let object = harness.object(1, scripted(quad_core(0.0)));
    let mut object = object.lock();

    let statuses: Vec<_> = (0..3).map(|_| object.draw(MirrorAxes::empty(), None)).collect();

    assert!(matches!(statuses[0], DrawStatus::Compiled));
    assert!(matches!(statuses[1], DrawStatus::Replayed));
    assert!(matches!(statuses[2], DrawStatus::Replayed));
    assert_eq!(harness.compiles(), 1);
    assert_eq!(harness.replays(), 2);
    assert_eq!(harness.shader_pairs(), (3, 3));
    assert_eq!(
        harness.device.count(|e| matches!(
            e,
            DeviceEvent::ListCompiled {
                mode: ListMode::CompileAndExecute,
                ..
            }
        )),
        1
    );
}

#[test]
fn test_clean_before_draw_compiles_without_executing() {
    let harness = Harness::new();
    let object = harness.object(1, scripted(quad_core(0.0)));
    let mut object = object.lock();

    object.clean();
    assert_eq!(harness.device.count(|e| matches!(e, DeviceEvent::Draw { .. })), 0);

    assert!(matches!(object.draw(MirrorAxes::empty(), None), DrawStatus::Replayed));
    assert_eq!(harness.compiles(), 1);
    assert!(harness.device.count(|e| matches!(e, DeviceEvent::Draw { .. })) > 0);
}

#[test]
fn test_replace_options_between_draws_recompiles_once() {
    let harness = Harness::new();
    let object = harness.object(1, scripted(quad_core(0.0)));
    let mut object = object.lock();

    object.draw(MirrorAxes::empty(), None);
    object.replace_options(RenderOptions::default().with_no_below(true));
    assert!(matches!(object.draw(MirrorAxes::empty(), None), DrawStatus::Compiled));
    assert!(matches!(object.draw(MirrorAxes::empty(), None), DrawStatus::Replayed));

    assert_eq!(harness.compiles(), 2);
    assert!(object.options().no_below);
}

#[test]
fn test_replace_mesh_forces_rebuild_with_new_transform() {
    let harness = Harness::new();
    let object = harness.object(1, scripted(quad_core(0.0)));
    let mut object = object.lock();
    object.clean();

    let moved = Mat4::new_translation(&Vec3::new(0.0, 0.0, -2.0));
    object.replace_mesh(shared(TrackedMesh::new(quad_core(1.0)).with_transform(moved)));
    assert_eq!(object.version(), None);
    assert_eq!(*object.transform(), moved);

    assert!(object.clean().is_compiled());
    assert_eq!(harness.compiles(), 2);
}

#[test]
fn test_always_dirty_executes_every_frame() {
    let harness = Harness::with(
        GatherConfig::default(),
        ReplayStrategy::AlwaysDirty,
        GatherRunner::Synchronous,
    );
    let mesh = scripted(quad_core(0.0));
    let object = harness.object(1, mesh.clone());
    let mut object = object.lock();

    for _ in 0..3 {
        assert!(matches!(object.draw(MirrorAxes::empty(), None), DrawStatus::Immediate));
    }

    assert_eq!(harness.compiles(), 0);
    assert_eq!(harness.replays(), 0);
    assert_eq!(object.stats().immediate_draws, 3);
    assert_eq!(mesh.read().clean_calls, 3);
    assert_eq!(object.version(), Some(mesh.read().version()));
    assert_eq!(harness.shader_pairs(), (3, 3));
}

#[test]
fn test_pooled_gather_matches_synchronous() {
    let tracked = TrackedMesh::new(quad_core(0.0)).with_edit_mesh(quad_edit(0.0));
    let synchronous = Harness::with(
        GatherConfig::both(),
        ReplayStrategy::Cached,
        GatherRunner::Synchronous,
    );
    let pooled = Harness::with(
        GatherConfig::both(),
        ReplayStrategy::Cached,
        GatherRunner::pooled(2).unwrap(),
    );

    let a = synchronous.object(1, shared(tracked.clone()));
    let b = pooled.object(1, shared(tracked));
    assert!(a.lock().clean().is_compiled());
    assert!(b.lock().clean().is_compiled());

    let (a, b) = (a.lock().snapshot(), b.lock().snapshot());
    assert_eq!(*a, *b);
    assert!(a.edit.is_some());
    assert!(a.core.is_some());
}

#[test]
fn test_shared_mesh_objects_track_versions_independently() {
    let harness = Harness::new();
    let mesh = scripted(quad_core(0.0));
    let first = harness.object(1, mesh.clone());
    let second = harness.object(2, mesh.clone());

    first.lock().clean();
    mesh.write().touch();
    assert!(second.lock().clean().is_compiled());
    assert!(first.lock().clean().is_compiled());
    assert!(matches!(second.lock().clean(), CleanStatus::Unchanged));
    assert_eq!(harness.compiles(), 3);
}
