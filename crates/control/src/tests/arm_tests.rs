use std::f64::consts::FRAC_PI_2;

use nalgebra::Vector3;
use shared::{
    domain::{ButtonEvent, Pose},
    error::ErrorCategory,
};

use super::*;
use crate::sim::SimRig;

fn context(rig: &SimRig) -> SimContext {
    let mut ctx = SimContext::new(rig.services());
    ctx.set_now(100);
    ctx
}

#[test]
fn every_arm_mode_installs_its_documented_handlers() {
    for mode in ArmMode::ALL {
        let mut arm = ArmControl::new(ArmKind::Drag, mode.as_str()).expect("drag supports all");
        let mut bindings = ButtonBindings::new();
        arm.bind(&mut bindings);

        let installed = bindings.owned_by("drag-control");
        let button = mode.button();
        let expected = match mode.activation() {
            Activation::Hold => vec![
                (button.start(), Binding::Activate),
                (button.end(), Binding::Deactivate),
            ],
            Activation::Toggle => vec![(button.press(), Binding::Toggle)],
            Activation::Auto => vec![(button.press(), Binding::Deactivate)],
        };
        let mut expected = expected;
        expected.sort_by_key(|(event, _)| *event);
        assert_eq!(installed, expected, "mode {mode}");
    }
}

#[test]
fn switching_modes_removes_previous_handlers() {
    let mut arm = ArmControl::new(ArmKind::Remote, "grip-hold").expect("mode");
    let mut bindings = ButtonBindings::new();
    arm.bind(&mut bindings);
    assert_eq!(bindings.len(), 2);

    arm.set_mode("trigger-toggle", &mut bindings).expect("switch");
    assert_eq!(
        bindings.owned_by("remote-control"),
        vec![(ButtonEvent::Trigger, Binding::Toggle)]
    );
}

#[test]
fn invalid_mode_fails_before_touching_handlers() {
    let mut arm = ArmControl::new(ArmKind::Drag, "grip-toggle").expect("mode");
    let mut bindings = ButtonBindings::new();
    arm.bind(&mut bindings);

    let err = arm.set_mode("grip-sometimes", &mut bindings).expect_err("unknown");
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert_eq!(arm.mode(), ArmMode::GripToggle);
    assert_eq!(
        bindings.owned_by("drag-control"),
        vec![(ButtonEvent::Grip, Binding::Toggle)]
    );
}

#[test]
fn remote_control_rejects_auto_modes() {
    let err = ArmControl::new(ArmKind::Remote, "grip-auto").expect_err("no auto");
    assert_eq!(err, CoreError::invalid_mode("remote-control", "grip-auto"));
    assert!(ArmControl::new(ArmKind::Redirected, "trigger-auto").is_err());
    assert!(ArmControl::new(ArmKind::Redirected, "trigger-hold").is_ok());
}

#[test]
fn toggle_activation_is_gated_by_reach() {
    let rig = SimRig::new();
    let ctx = context(&rig);
    let arm = ArmControl::new(ArmKind::Drag, "grip-toggle").expect("mode");

    rig.set_controller(Hand::Right, Pose::at(0.5, 1.2, 0.5));
    assert_eq!(arm.on_button(Binding::Toggle, IDLE, &ctx), None);

    rig.set_controller(Hand::Right, Pose::at(0.5, 1.2, 0.05));
    assert_eq!(
        arm.on_button(Binding::Toggle, IDLE, &ctx),
        Some("activate-drag-control")
    );
    // Deactivation needs no proximity.
    rig.set_controller(Hand::Right, Pose::at(2.0, 1.2, 0.0));
    assert_eq!(
        arm.on_button(Binding::Toggle, "DRAG_CONTROL", &ctx),
        Some("deactivate-drag-control")
    );
}

#[test]
fn remote_control_activates_from_anywhere() {
    let rig = SimRig::new();
    let ctx = context(&rig);
    let arm = ArmControl::new(ArmKind::Remote, "grip-hold").expect("mode");
    assert_eq!(
        arm.on_button(Binding::Activate, IDLE, &ctx),
        Some("activate-remote-control")
    );
    assert_eq!(arm.on_button(Binding::Activate, "REMOTE_CONTROL", &ctx), None);
    assert_eq!(arm.on_button(Binding::Deactivate, IDLE, &ctx), None);
}

#[test]
fn auto_mode_waits_out_the_cooldown() {
    let rig = SimRig::new();
    let mut ctx = context(&rig);
    let mut arm = ArmControl::new(ArmKind::Drag, "grip-auto").expect("mode");
    let ee = Pose::at(0.5, 1.2, 0.0);
    let frame = FrameInfo::new(Pose::at(0.5, 1.2, 0.05), Some(ee), 100);

    assert_eq!(
        arm.poll_activation(&frame, IDLE, 100),
        Some("activate-drag-control")
    );

    arm.on_exit(&mut ctx);
    assert_eq!(arm.poll_activation(&frame, IDLE, 600), None);
    assert_eq!(
        arm.poll_activation(&frame, IDLE, 1100),
        Some("activate-drag-control")
    );
}

#[test]
fn exit_restores_scene_feedback() {
    let rig = SimRig::new();
    let mut ctx = context(&rig);
    let mut arm = ArmControl::new(ArmKind::Drag, "grip-hold").expect("mode");

    arm.on_enter(&mut ctx);
    {
        let state = rig.state();
        assert_eq!(state.sounds, vec![CLICK_CLIP.to_string()]);
        assert_eq!(state.pulses.len(), 1);
        assert_eq!(state.grip_visible.get(&Hand::Right), Some(&false));
    }

    arm.on_exit(&mut ctx);
    let state = rig.state();
    assert_eq!(state.grip_visible.get(&Hand::Right), Some(&true));
    assert_eq!(state.cursor_color, Some(CueColor::Neutral));
    assert_eq!(state.offset_indicator, None);
}

#[test]
fn remote_control_accumulates_controller_motion() {
    let rig = SimRig::new();
    let mut ctx = context(&rig);
    let arm = ArmControl::new(ArmKind::Remote, "grip-toggle").expect("mode");
    let ee = Pose::at(0.5, 1.2, 0.0);

    let frame = FrameInfo::new(Pose::at(2.0, 1.0, 0.1), Some(ee), 100)
        .with_previous(Pose::at(2.0, 1.0, 0.0));
    arm.integrate(&frame, &mut ctx);
    ctx.set_now(105);
    let frame = FrameInfo::new(Pose::at(2.0, 1.1, 0.1), Some(ee), 105)
        .with_previous(Pose::at(2.0, 1.0, 0.1));
    arm.integrate(&frame, &mut ctx);

    assert!((ctx.goal().position - Vector3::new(0.0, 0.1, 0.1)).norm() < 1e-12);
    let indicator = rig.state().offset_indicator.expect("indicator");
    assert_eq!(indicator.color, CueColor::Amber);
}

#[test]
fn redirected_control_eases_toward_controller_orientation() {
    let rig = SimRig::new();
    let mut ctx = context(&rig);
    let remote = ArmControl::new(ArmKind::Remote, "grip-toggle").expect("mode");
    let redirected = ArmControl::new(ArmKind::Redirected, "grip-toggle")
        .expect("mode")
        .with_correction(UnitQuaternion::identity());

    let turned = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2);
    let frame = FrameInfo::new(Pose::identity().with_orientation(turned), None, 100)
        .with_previous(Pose::identity());

    remote.integrate(&frame, &mut ctx);
    let accumulated = ctx.goal().orientation;
    ctx.reset_goal();
    redirected.integrate(&frame, &mut ctx);

    // Both rotate by the controller delta; the blend toward an aligned
    // target leaves an already-aligned goal where it is.
    assert!(accumulated.angle_to(&turned) < 1e-9);
    assert!(ctx.goal().orientation.angle_to(&turned) < 1e-9);
}

#[test]
fn redirected_blend_scales_with_rotation() {
    let rig = SimRig::new();
    let mut ctx = context(&rig);
    let redirected = ArmControl::new(ArmKind::Redirected, "grip-toggle").expect("mode");

    // A pure translation carries no rotation, so nothing is blended.
    let frame = FrameInfo::new(Pose::at(0.0, 0.0, 0.1), None, 100).with_previous(Pose::identity());
    redirected.integrate(&frame, &mut ctx);
    assert!(ctx.goal().orientation.angle() < 1e-12);
}

#[test]
fn disabled_module_ignores_input() {
    let rig = SimRig::new();
    let ctx = context(&rig);
    let mut arm = ArmControl::new(ArmKind::Remote, "grip-toggle").expect("mode");
    arm.set_disabled(true);
    assert_eq!(arm.on_button(Binding::Toggle, IDLE, &ctx), None);
    assert_eq!(arm.release_event("REMOTE_CONTROL"), Some("deactivate-remote-control"));
}
