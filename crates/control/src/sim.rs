use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use nalgebra::{UnitQuaternion, Vector3};
use shared::{
    domain::{CueColor, Hand, Pose, RobotKind},
    error::{CoreError, CoreResult},
    protocol::TelemetryRecord,
};

use crate::services::{
    AudioCue, ControllerInput, Fingers, Haptics, IkService, Instructions, OffsetSegment,
    PhysicsWorld, PoseService, RenderFrame, SceneFeedback, Services, TelemetrySink,
};

const DEFAULT_FINGER_GAP_M: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct Pulse {
    pub hand: Hand,
    pub intensity: f64,
    pub duration_ms: u64,
}

#[derive(Debug, Default)]
pub struct RigState {
    pub end_effector: Option<Pose>,
    pub controllers: BTreeMap<Hand, Pose>,
    pub finger_gap: f64,
    pub ik_fails: bool,
    pub ik_calls: Vec<Pose>,
    pub ik_resets: usize,
    pub pulses: Vec<Pulse>,
    pub sounds: Vec<String>,
    pub grip_visible: BTreeMap<Hand, bool>,
    pub cursor_position: Option<Vector3<f64>>,
    pub cursor_color: Option<CueColor>,
    pub offset_indicator: Option<OffsetSegment>,
    pub instructions: Option<Instructions>,
    pub trial_counter: Option<(usize, usize)>,
    pub environment_reloads: usize,
    pub finger_moves: Vec<(f64, f64)>,
    pub contacts: BTreeSet<(String, String)>,
    pub physics_steps: usize,
    pub frames_rendered: usize,
    pub telemetry: Vec<TelemetryRecord>,
    pub objects: BTreeMap<String, Pose>,
}

#[derive(Debug, Clone)]
pub struct SimRig {
    state: Arc<Mutex<RigState>>,
}

impl Default for SimRig {
    fn default() -> Self {
        Self::new()
    }
}

impl SimRig {
    pub fn new() -> Self {
        let state = RigState {
            end_effector: Some(Pose::at(0.5, 1.2, 0.0)),
            finger_gap: DEFAULT_FINGER_GAP_M,
            ..RigState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, RigState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn services(&self) -> Services {
        Services {
            pose: Box::new(self.clone()),
            ik: Box::new(self.clone()),
            haptics: Box::new(self.clone()),
            audio: Box::new(self.clone()),
            input: Box::new(self.clone()),
            scene: Box::new(self.clone()),
            fingers: Box::new(self.clone()),
            physics: Box::new(self.clone()),
            render: Box::new(self.clone()),
            telemetry: Box::new(self.clone()),
        }
    }

    pub fn set_end_effector(&self, pose: Pose) {
        self.state().end_effector = Some(pose);
    }

    pub fn clear_end_effector(&self) {
        self.state().end_effector = None;
    }

    pub fn set_controller(&self, hand: Hand, pose: Pose) {
        self.state().controllers.insert(hand, pose);
    }

    pub fn set_finger_gap(&self, gap: f64) {
        self.state().finger_gap = gap;
    }

    pub fn fail_ik(&self, fails: bool) {
        self.state().ik_fails = fails;
    }

    pub fn set_contact(&self, a: &str, b: &str, touching: bool) {
        let key = contact_key(a, b);
        let mut state = self.state();
        if touching {
            state.contacts.insert(key);
        } else {
            state.contacts.remove(&key);
        }
    }

    pub fn set_object_pose(&self, name: &str, pose: Pose) {
        self.state().objects.insert(name.to_string(), pose);
    }

    pub fn object_pose(&self, name: &str) -> Option<Pose> {
        self.state().objects.get(name).copied()
    }

    pub fn remove_object(&self, name: &str) {
        self.state().objects.remove(name);
    }
}

fn contact_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl PoseService for SimRig {
    fn current_end_effector_pose(&self) -> Option<Pose> {
        self.state().end_effector
    }

    fn finger_gap(&self, _robot: RobotKind) -> Option<f64> {
        let state = self.state();
        state.end_effector.map(|_| state.finger_gap)
    }
}

impl IkService for SimRig {
    fn solve(
        &mut self,
        position: &Vector3<f64>,
        orientation: &UnitQuaternion<f64>,
    ) -> CoreResult<Vec<f64>> {
        let mut state = self.state();
        let target = Pose::new(*position, *orientation);
        state.ik_calls.push(target);
        if state.ik_fails {
            return Err(CoreError::collaborator("ik", "no solution"));
        }
        state.end_effector = Some(target);
        let q = orientation.quaternion();
        Ok(vec![position.x, position.y, position.z, q.w, q.i, q.j, q.k])
    }

    fn reset(&mut self, _seed: &[f64]) {
        self.state().ik_resets += 1;
    }
}

impl Haptics for SimRig {
    fn pulse(&mut self, hand: Hand, intensity: f64, duration_ms: u64) {
        self.state().pulses.push(Pulse {
            hand,
            intensity: intensity.clamp(0.0, 1.0),
            duration_ms,
        });
    }
}

impl AudioCue for SimRig {
    fn play(&mut self, clip: &str) {
        self.state().sounds.push(clip.to_string());
    }
}

impl ControllerInput for SimRig {
    fn pose(&self, hand: Hand) -> Option<Pose> {
        self.state().controllers.get(&hand).copied()
    }
}

impl SceneFeedback for SimRig {
    fn set_grip_visible(&mut self, hand: Hand, visible: bool) {
        self.state().grip_visible.insert(hand, visible);
    }

    fn set_cursor_position(&mut self, position: Vector3<f64>) {
        self.state().cursor_position = Some(position);
    }

    fn set_cursor_color(&mut self, color: CueColor) {
        self.state().cursor_color = Some(color);
    }

    fn set_offset_indicator(&mut self, segment: Option<OffsetSegment>) {
        self.state().offset_indicator = segment;
    }

    fn show_instructions(&mut self, instructions: &Instructions) {
        self.state().instructions = Some(instructions.clone());
    }

    fn hide_instructions(&mut self) {
        self.state().instructions = None;
    }

    fn set_trial_counter(&mut self, current: usize, total: usize) {
        self.state().trial_counter = Some((current, total));
    }

    fn reload_environment(&mut self) {
        self.state().environment_reloads += 1;
    }
}

impl Fingers for SimRig {
    fn translate(&mut self, left: f64, right: f64) {
        let mut state = self.state();
        state.finger_moves.push((left, right));
        state.finger_gap += 2.0 * left;
    }
}

impl PhysicsWorld for SimRig {
    fn in_contact(&self, a: &str, b: &str) -> bool {
        self.state().contacts.contains(&contact_key(a, b))
    }

    fn step(&mut self, _dt_ms: u64) {
        self.state().physics_steps += 1;
    }
}

impl RenderFrame for SimRig {
    fn render(&mut self, _timestamp_ms: u64) {
        self.state().frames_rendered += 1;
    }
}

impl TelemetrySink for SimRig {
    fn publish(&mut self, record: TelemetryRecord) {
        self.state().telemetry.push(record);
    }
}
