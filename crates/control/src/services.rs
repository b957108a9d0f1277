use nalgebra::{UnitQuaternion, Vector3};
use shared::{
    domain::{CueColor, Hand, Pose, RobotKind},
    error::CoreResult,
    protocol::TelemetryRecord,
};

pub trait PoseService: Send {
    fn current_end_effector_pose(&self) -> Option<Pose>;
    fn finger_gap(&self, robot: RobotKind) -> Option<f64>;
}

pub trait IkService: Send {
    fn solve(
        &mut self,
        position: &Vector3<f64>,
        orientation: &UnitQuaternion<f64>,
    ) -> CoreResult<Vec<f64>>;
    fn reset(&mut self, seed: &[f64]);
}

pub trait Haptics: Send {
    fn pulse(&mut self, hand: Hand, intensity: f64, duration_ms: u64);
}

pub trait AudioCue: Send {
    fn play(&mut self, clip: &str);
}

pub trait ControllerInput: Send {
    fn pose(&self, hand: Hand) -> Option<Pose>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetSegment {
    pub from: Vector3<f64>,
    pub to: Vector3<f64>,
    pub color: CueColor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instructions {
    pub title: String,
    pub body: String,
}

pub trait SceneFeedback: Send {
    fn set_grip_visible(&mut self, hand: Hand, visible: bool);
    fn set_cursor_position(&mut self, position: Vector3<f64>);
    fn set_cursor_color(&mut self, color: CueColor);
    fn set_offset_indicator(&mut self, segment: Option<OffsetSegment>);
    fn show_instructions(&mut self, instructions: &Instructions);
    fn hide_instructions(&mut self);
    fn set_trial_counter(&mut self, current: usize, total: usize);
    fn reload_environment(&mut self);
}

pub trait Fingers: Send {
    fn translate(&mut self, left: f64, right: f64);
}

pub trait PhysicsWorld: Send {
    fn in_contact(&self, a: &str, b: &str) -> bool;
    fn step(&mut self, dt_ms: u64);
}

pub trait RenderFrame: Send {
    fn render(&mut self, timestamp_ms: u64);
}

pub trait TelemetrySink: Send {
    fn publish(&mut self, record: TelemetryRecord);
}

pub struct Services {
    pub pose: Box<dyn PoseService>,
    pub ik: Box<dyn IkService>,
    pub haptics: Box<dyn Haptics>,
    pub audio: Box<dyn AudioCue>,
    pub input: Box<dyn ControllerInput>,
    pub scene: Box<dyn SceneFeedback>,
    pub fingers: Box<dyn Fingers>,
    pub physics: Box<dyn PhysicsWorld>,
    pub render: Box<dyn RenderFrame>,
    pub telemetry: Box<dyn TelemetrySink>,
}
