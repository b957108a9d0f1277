use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ButtonEvent, Pose};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub controller_pose: Pose,
    pub previous_controller_pose: Option<Pose>,
    pub current_ee_pose: Option<Pose>,
    pub timestamp_ms: u64,
}

impl FrameInfo {
    pub fn new(controller_pose: Pose, current_ee_pose: Option<Pose>, timestamp_ms: u64) -> Self {
        Self {
            controller_pose,
            previous_controller_pose: None,
            current_ee_pose,
            timestamp_ms,
        }
    }

    pub fn with_previous(mut self, previous: Pose) -> Self {
        self.previous_controller_pose = Some(previous);
        self
    }

    pub fn controller_delta(&self) -> Option<(Vector3<f64>, UnitQuaternion<f64>)> {
        let previous = self.previous_controller_pose?;
        let translation = self.controller_pose.position - previous.position;
        let rotation = self.controller_pose.orientation * previous.orientation.inverse();
        Some((translation, rotation))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SessionInput {
    Continue,
    ResetRobot,
    Button(ButtonEvent),
    FirstPerson(bool),
    Stop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSample {
    pub task_id: Uuid,
    pub task: String,
    pub condition: String,
    pub round: usize,
    pub timestamp_ms: u64,
    pub controller: Option<Pose>,
    pub end_effector: Option<Pose>,
    pub goal: Pose,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub detail: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum TelemetryRecord {
    Samples(Vec<TaskSample>),
    RoundFinished {
        task_id: Uuid,
        task: String,
        round: usize,
        duration_ms: u64,
    },
}
