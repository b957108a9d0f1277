use std::f64::consts::FRAC_PI_2;

use control::SimRig;
use shared::domain::RobotKind;

use super::*;
use crate::objects::load_objects;

fn controller_drawing() -> Drawing {
    Drawing::new(DrawingOptions {
        trace: TraceName::Lab,
        robot_controlled: false,
        ..DrawingOptions::default()
    })
}

fn at(point: Vector3<f64>, ts: u64) -> FrameInfo {
    FrameInfo::new(Pose::new(point, UnitQuaternion::identity()), None, ts)
}

#[tokio::test]
async fn tracing_from_start_to_end_completes() {
    let rig = SimRig::new();
    let mut ctx = SimContext::new(rig.services());
    let mut drawing = controller_drawing();
    let mut objects = load_objects(&rig, &drawing.object_names()).await.expect("objects");
    drawing.setup(&mut ctx, &mut objects);
    drawing.on_start(0, &mut ctx, &mut objects);
    assert_eq!(rig.state().grip_visible.get(&Hand::Right), Some(&false));

    let (start, end) = trace_endpoints(TraceName::Lab);
    assert!(!drawing.on_update(&at(start, 5), &mut ctx, &mut objects));
    for step in 1..=20 {
        let point = start + (end - start) * (step as f64 / 20.0);
        let done = drawing.on_update(&at(point, 5 + step), &mut ctx, &mut objects);
        assert_eq!(done, step == 20);
    }
    assert_eq!(drawing.stroke().len(), 21);
    let marker = rig.object_pose(MARKER).expect("marker placed");
    assert!((marker.position - end).norm() < 1e-9);
}

#[tokio::test]
async fn marker_away_from_the_board_draws_nothing() {
    let rig = SimRig::new();
    let mut ctx = SimContext::new(rig.services());
    let mut drawing = controller_drawing();
    let mut objects = load_objects(&rig, &drawing.object_names()).await.expect("objects");
    drawing.on_start(0, &mut ctx, &mut objects);

    let (start, _) = trace_endpoints(TraceName::Lab);
    let off_board = start - Vector3::new(0.1, 0.0, 0.0);
    assert!(!drawing.on_update(&at(off_board, 5), &mut ctx, &mut objects));
    let below = Vector3::new(WHITEBOARD_SURFACE_X, WHITEBOARD_MIN_Y - 0.1, 0.0);
    assert!(!drawing.on_update(&at(below, 10), &mut ctx, &mut objects));
    assert!(drawing.stroke().is_empty());
}

#[test]
fn missing_marker_short_circuits() {
    let rig = SimRig::new();
    let mut ctx = SimContext::new(rig.services());
    let mut drawing = controller_drawing();
    let mut objects = ObjectSet::new();
    drawing.on_start(0, &mut ctx, &mut objects);

    let (start, _) = trace_endpoints(TraceName::Lab);
    assert!(!drawing.on_update(&at(start, 5), &mut ctx, &mut objects));
    assert!(drawing.stroke().is_empty());
}

#[test]
fn robot_marker_installs_and_removes_the_board_clamp() {
    let rig = SimRig::new();
    let mut ctx = SimContext::new(rig.services()).with_robot(RobotKind::Sawyer);
    let mut drawing = Drawing::new(DrawingOptions::default());
    let mut objects = ObjectSet::new();

    drawing.setup(&mut ctx, &mut objects);
    let GoalAdjustment::ClampX { max_x, probes } = &ctx.adjustment else {
        panic!("expected a clamp");
    };
    assert_eq!(*max_x, WHITEBOARD_SURFACE_X);
    assert_eq!(probes.len(), 1);

    // Hand Z pointing at the board puts the tip 0.2 m ahead of the goal.
    let goal = Pose::at(0.9, 1.2, 0.0)
        .with_orientation(UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2));
    let adjusted = ctx.adjustment.apply(goal);
    assert!((adjusted.position.x - 0.79).abs() < 1e-9);
    assert!(adjusted.transform_point(&probes[0]).x <= WHITEBOARD_SURFACE_X + 1e-9);

    drawing.teardown(&mut ctx, &mut objects);
    assert_eq!(ctx.adjustment, GoalAdjustment::Identity);
}
