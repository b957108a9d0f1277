use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::RobotKind;
use tasks::{tuning::DEFAULT_TELEMETRY_BUFFER, DrawingOptions, ErasingOptions, PouringOptions};

pub const DEFAULT_SETTINGS_FILE: &str = "teleop.toml";
const ENV_PREFIX: &str = "TELEOP__";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logic_tick_ms: u64,
    pub physics_tick_ms: u64,
    pub render_tick_ms: u64,
    pub activation_radius_m: f64,
    pub reactivation_cooldown_ms: u64,
    pub start_first_person: bool,
    pub robot: Option<RobotKind>,
    pub telemetry_buffer: usize,
    pub tasks: Vec<TaskSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logic_tick_ms: 5,
            physics_tick_ms: 16,
            render_tick_ms: 11,
            activation_radius_m: control::tuning::DEFAULT_ACTIVATION_RADIUS_M,
            reactivation_cooldown_ms: control::tuning::DEFAULT_REACTIVATION_COOLDOWN_MS,
            start_first_person: false,
            robot: Some(RobotKind::Sawyer),
            telemetry_buffer: DEFAULT_TELEMETRY_BUFFER,
            tasks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Drawing,
    Erasing,
    Pouring,
    Tutorial,
    End,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskSettings {
    pub kind: TaskKind,
    #[serde(default)]
    pub label: Option<String>,
    pub condition: ConditionSettings,
    #[serde(default)]
    pub robot: Option<RobotKind>,
    #[serde(default = "one_round")]
    pub rounds: usize,
    #[serde(default)]
    pub robot_controlled: Option<bool>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub drawing: DrawingOptions,
    #[serde(default)]
    pub erasing: ErasingOptions,
    #[serde(default)]
    pub pouring: PouringOptions,
}

fn one_round() -> usize {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArmModuleKind {
    DragControl,
    RemoteControl,
    RedirectedControl,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArmSettings {
    pub kind: ArmModuleKind,
    pub mode: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionSettings {
    pub name: String,
    pub primary: ArmSettings,
    #[serde(default)]
    pub first_person: Option<ArmSettings>,
    #[serde(default)]
    pub grasping: Option<String>,
    #[serde(default = "show_indicator")]
    pub show_offset_indicator: bool,
}

fn show_indicator() -> bool {
    true
}

impl Settings {
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        toml::from_str(raw).context("invalid settings file")
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(parsed) = var("LOGIC_TICK_MS").and_then(|v| v.parse().ok()) {
            self.logic_tick_ms = parsed;
        }
        if let Some(parsed) = var("PHYSICS_TICK_MS").and_then(|v| v.parse().ok()) {
            self.physics_tick_ms = parsed;
        }
        if let Some(parsed) = var("RENDER_TICK_MS").and_then(|v| v.parse().ok()) {
            self.render_tick_ms = parsed;
        }
        if let Some(parsed) = var("ACTIVATION_RADIUS_M").and_then(|v| v.parse().ok()) {
            self.activation_radius_m = parsed;
        }
        if let Some(parsed) = var("REACTIVATION_COOLDOWN_MS").and_then(|v| v.parse().ok()) {
            self.reactivation_cooldown_ms = parsed;
        }
        if let Some(parsed) = var("START_FIRST_PERSON").and_then(|v| v.parse().ok()) {
            self.start_first_person = parsed;
        }
        if let Some(robot) = var("ROBOT").and_then(|v| toml::Value::String(v).try_into().ok()) {
            self.robot = Some(robot);
        }
        if let Some(parsed) = var("TELEMETRY_BUFFER").and_then(|v| v.parse().ok()) {
            self.telemetry_buffer = parsed;
        }
    }
}

/// Defaults, then the settings file, then environment overrides. An explicit
/// `path` must exist; the default file is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };

    let mut settings = match fs::read_to_string(&path) {
        Ok(raw) => Settings::from_toml(&raw)
            .with_context(|| format!("failed to load settings from '{}'", path.display()))?,
        Err(err) if required => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()));
        }
        Err(_) => Settings::default(),
    };

    settings.apply_env(|name| env::var(name).ok());
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
