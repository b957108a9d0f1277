use control::{ArmControl, ArmKind, Condition, SimRig};
use nalgebra::Rotation3;

use super::*;
use crate::{
    objects::load_objects,
    task::{RoundOutcome, Task, TaskOptions},
};

/// Controller orientation that holds the pad flat against the board with its
/// long edge along the drawn line.
fn facing_board() -> UnitQuaternion<f64> {
    let pad = Rotation3::<f64>::from_basis_unchecked(&[Vector3::z(), -Vector3::x(), -Vector3::y()]);
    UnitQuaternion::from_rotation_matrix(&pad) * controller_eraser_rotation().inverse()
}

fn hand_held(vibration: f64) -> Erasing {
    Erasing::new(ErasingOptions {
        robot_controlled: false,
        erase_vibration_strength: vibration,
        ..ErasingOptions::default()
    })
}

fn sweep_frame(z: f64, ts: u64) -> FrameInfo {
    let controller = Pose::at(0.9, 1.35, z).with_orientation(facing_board());
    FrameInfo::new(controller, None, ts)
}

#[test]
fn split_keeps_pieces_with_two_points() {
    let line: Vec<Vector3<f64>> = (0..6).map(|i| Vector3::new(0.0, 0.0, i as f64)).collect();

    let mut out = Vec::new();
    split_at(line.clone(), 0, &mut out);
    assert_eq!(out, vec![line[1..].to_vec()]);

    let mut out = Vec::new();
    split_at(line.clone(), 1, &mut out);
    assert_eq!(out, vec![line[2..].to_vec()]);

    let mut out = Vec::new();
    split_at(line.clone(), 3, &mut out);
    assert_eq!(out, vec![line[..3].to_vec(), line[4..].to_vec()]);

    let mut out = Vec::new();
    split_at(line.clone(), 4, &mut out);
    assert_eq!(out, vec![line[..4].to_vec()]);
}

#[tokio::test]
async fn sweeping_the_whole_line_finishes_the_task() {
    let rig = SimRig::new();
    let mut ctx = SimContext::new(rig.services());
    let behavior = hand_held(0.0);
    let objects = load_objects(&rig, &behavior.object_names()).await.expect("objects");
    let condition = Condition::builder("remote-only")
        .module(ArmControl::new(ArmKind::Remote, "grip-hold").expect("mode"))
        .build()
        .expect("condition");
    let mut task = Task::new(Box::new(behavior), condition, objects, TaskOptions::default())
        .expect("task");
    task.start(&mut ctx).expect("start");

    let mut outcomes = Vec::new();
    for step in 0..=110u64 {
        let z = -0.55 + step as f64 * 0.01;
        let ts = 5 * (step + 1);
        ctx.set_now(ts);
        outcomes.extend(task.update(&sweep_frame(z, ts), &mut ctx));
    }
    assert_eq!(outcomes, vec![RoundOutcome::Completed]);
    assert!(task.is_completed());
}

#[tokio::test]
async fn eraser_held_away_from_the_board_leaves_the_drawing() {
    let rig = SimRig::new();
    let mut ctx = SimContext::new(rig.services());
    let mut erasing = hand_held(0.5);
    let mut objects = load_objects(&rig, &erasing.object_names()).await.expect("objects");
    erasing.on_start(0, &mut ctx, &mut objects);
    let before = erasing.remaining_points();
    assert_eq!(before, 1001);

    let mut frame = sweep_frame(0.0, 5);
    frame.controller_pose.position.x = 0.8;
    assert!(!erasing.on_update(&frame, &mut ctx, &mut objects));
    assert_eq!(erasing.remaining_points(), before);
    assert!(rig.state().pulses.is_empty());

    assert!(!erasing.on_update(&sweep_frame(0.0, 10), &mut ctx, &mut objects));
    assert!(erasing.remaining_points() < before);
    assert_eq!(erasing.lines().len(), 2);
    assert_eq!(rig.state().pulses.len(), 1);
}

#[test]
fn hand_held_eraser_stops_at_the_board() {
    let erasing = hand_held(0.0);
    let rig = SimRig::new();
    let ctx = SimContext::new(rig.services());

    let mut frame = sweep_frame(0.0, 5);
    frame.controller_pose.position.x = 1.2;
    let eraser = erasing.eraser_pose(&frame, &ctx).expect("pose");
    for corner in eraser_corners() {
        assert!(eraser.transform_point(&corner).x <= CONTROLLER_ERASER_MAX_X + 1e-9);
    }
}

#[test]
fn robot_eraser_clamps_goal_and_restores_on_teardown() {
    let rig = SimRig::new();
    let mut ctx = SimContext::new(rig.services());
    let mut erasing = Erasing::new(ErasingOptions::default());
    let mut objects = ObjectSet::new();

    erasing.setup(&mut ctx, &mut objects);
    let GoalAdjustment::ClampX { max_x, probes } = &ctx.adjustment else {
        panic!("expected a clamp");
    };
    assert_eq!(*max_x, WHITEBOARD_SURFACE_X);
    assert_eq!(probes.len(), 4);

    erasing.teardown(&mut ctx, &mut objects);
    assert_eq!(ctx.adjustment, GoalAdjustment::Identity);
    assert_eq!(rig.state().grip_visible.get(&Hand::Right), Some(&true));
}

#[test]
fn missing_robot_pose_is_not_completion() {
    let rig = SimRig::new();
    rig.clear_end_effector();
    let mut ctx = SimContext::new(rig.services());
    let mut erasing = Erasing::new(ErasingOptions::default());
    let mut objects = ObjectSet::new();
    erasing.on_start(0, &mut ctx, &mut objects);

    assert!(!erasing.on_update(&FrameInfo::new(Pose::identity(), None, 5), &mut ctx, &mut objects));
}
