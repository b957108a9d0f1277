use control::SimRig;
use shared::{
    domain::RobotKind,
    error::{CoreError, ErrorCategory},
};

use super::*;

fn condition(kind: ArmModuleKind, mode: &str) -> ConditionSettings {
    ConditionSettings {
        name: "study".to_string(),
        primary: ArmSettings {
            kind,
            mode: mode.to_string(),
        },
        first_person: None,
        grasping: Some("ab-hold".to_string()),
        show_offset_indicator: true,
    }
}

fn task(kind: TaskKind, condition: ConditionSettings) -> TaskSettings {
    TaskSettings {
        kind,
        label: None,
        condition,
        robot: None,
        rounds: 2,
        robot_controlled: None,
        text: None,
        drawing: Default::default(),
        erasing: Default::default(),
        pouring: Default::default(),
    }
}

#[test]
fn condition_carries_configured_modules() {
    let mut settings = condition(ArmModuleKind::DragControl, "grip-auto");
    settings.first_person = Some(ArmSettings {
        kind: ArmModuleKind::RedirectedControl,
        mode: "trigger-toggle".to_string(),
    });
    let condition = build_condition(&settings, &Settings::default()).expect("condition");
    assert_eq!(condition.name(), "study");
    assert_eq!(condition.modules().len(), 3);
    assert_eq!(condition.active_arm().name(), "drag-control");
}

#[test]
fn unknown_mode_is_a_configuration_error() {
    let err = build_condition(
        &condition(ArmModuleKind::RemoteControl, "grip-auto"),
        &Settings::default(),
    )
    .err()
    .expect("remote has no auto modes");
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[tokio::test]
async fn session_is_built_from_settings() {
    let rig = SimRig::new();
    let settings = Settings {
        robot: Some(RobotKind::Ur5),
        tasks: vec![
            task(TaskKind::Pouring, condition(ArmModuleKind::RemoteControl, "grip-hold")),
            task(TaskKind::End, condition(ArmModuleKind::RemoteControl, "grip-hold")),
        ],
        ..Settings::default()
    };
    let session = build_session(&settings, &rig, rig.services())
        .await
        .expect("session");
    assert_eq!(session.task_count(), 2);
    assert!(!session.is_running());
    assert_eq!(session.context().robot, Some(RobotKind::Ur5));
    assert_eq!(session.tasks()[0].label(), "pouring");
    assert_eq!(session.tasks()[0].num_rounds(), 2);
    assert!(session.tasks()[0].objects().contains("particle-29"));
}

#[tokio::test]
async fn bad_task_fails_the_whole_build() {
    let rig = SimRig::new();
    let settings = Settings {
        tasks: vec![
            task(TaskKind::Tutorial, condition(ArmModuleKind::RemoteControl, "grip-hold")),
            task(TaskKind::End, condition(ArmModuleKind::DragControl, "grip-wiggle")),
        ],
        ..Settings::default()
    };
    let err = build_session(&settings, &rig, rig.services())
        .await
        .err()
        .expect("invalid mode");
    assert!(format!("{err:#}").contains("failed to build task 1"));
    assert!(matches!(
        err.root_cause().downcast_ref::<CoreError>(),
        Some(CoreError::InvalidArgument { .. })
    ));
}

#[tokio::test]
async fn empty_task_list_is_rejected() {
    let rig = SimRig::new();
    let result = build_session(&Settings::default(), &rig, rig.services()).await;
    assert!(result.is_err());
}
