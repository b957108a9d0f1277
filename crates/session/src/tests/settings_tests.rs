use std::collections::HashMap;

use super::*;

const EXPERIMENT: &str = r#"
logic_tick_ms = 10
robot = "ur5"

[[tasks]]
kind = "tutorial"
rounds = 3

[tasks.condition]
name = "remote-tutorial"
primary = { kind = "remote-control", mode = "grip-hold" }
grasping = "trigger-toggle"

[[tasks]]
kind = "erasing"
robot_controlled = false

[tasks.condition]
name = "drag"
primary = { kind = "drag-control", mode = "grip-auto" }
first_person = { kind = "remote-control", mode = "trigger-hold" }
show_offset_indicator = false

[tasks.erasing]
path = "filled"
erase_vibration_strength = 0.3
"#;

#[test]
fn parses_an_experiment_file() {
    let settings = Settings::from_toml(EXPERIMENT).expect("settings");
    assert_eq!(settings.logic_tick_ms, 10);
    assert_eq!(settings.physics_tick_ms, 16);
    assert_eq!(settings.robot, Some(RobotKind::Ur5));
    assert_eq!(settings.tasks.len(), 2);

    let tutorial = &settings.tasks[0];
    assert_eq!(tutorial.kind, TaskKind::Tutorial);
    assert_eq!(tutorial.rounds, 3);
    assert_eq!(tutorial.condition.primary.kind, ArmModuleKind::RemoteControl);
    assert_eq!(tutorial.condition.grasping.as_deref(), Some("trigger-toggle"));
    assert!(tutorial.condition.show_offset_indicator);

    let erasing = &settings.tasks[1];
    assert_eq!(erasing.rounds, 1);
    assert_eq!(erasing.robot_controlled, Some(false));
    assert_eq!(erasing.erasing.path, tasks::tuning::ErasePath::Filled);
    assert!(erasing.erasing.stop_on_collision);
    assert!(!erasing.condition.show_offset_indicator);
    assert_eq!(
        erasing.condition.first_person.as_ref().map(|arm| arm.mode.as_str()),
        Some("trigger-hold")
    );
}

#[test]
fn env_overrides_scalars_and_ignores_garbage() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("TELEOP__LOGIC_TICK_MS", "2"),
        ("TELEOP__ROBOT", "spot_arm"),
        ("TELEOP__START_FIRST_PERSON", "true"),
        ("TELEOP__PHYSICS_TICK_MS", "fast"),
    ]);
    let mut settings = Settings::default();
    settings.apply_env(|name| vars.get(name).map(|v| v.to_string()));

    assert_eq!(settings.logic_tick_ms, 2);
    assert_eq!(settings.robot, Some(RobotKind::SpotArm));
    assert!(settings.start_first_person);
    assert_eq!(settings.physics_tick_ms, 16);
}

#[test]
fn explicit_missing_file_is_an_error() {
    let err = load_settings(Some(Path::new("/nonexistent/teleop.toml")))
        .err()
        .expect("missing file");
    assert!(format!("{err:#}").contains("failed to read settings file"));
}

#[test]
fn unknown_task_kind_is_rejected() {
    let raw = r#"
[[tasks]]
kind = "juggling"
[tasks.condition]
name = "c"
primary = { kind = "remote-control", mode = "grip-hold" }
"#;
    assert!(Settings::from_toml(raw).is_err());
}
