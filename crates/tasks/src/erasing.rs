use std::f64::consts::PI;

use control::{GoalAdjustment, SimContext};
use nalgebra::{UnitQuaternion, Vector3};
use serde::Deserialize;
use serde_json::json;
use shared::{
    domain::{Hand, Pose},
    protocol::FrameInfo,
};
use tracing::{debug, trace};

use crate::{
    drawing::WHITEBOARD,
    objects::ObjectSet,
    task::TaskBehavior,
    tuning::{
        controller_eraser_rotation, erase_path, eraser_corners, robot_eraser_rotation, ErasePath,
        CONTROLLER_ERASER_MAX_X, CONTROLLER_ERASER_OFFSET_Y, ERASE_PULSE_MS, ERASE_REACH_M,
        ERASE_SAMPLE_OFFSETS_X, ERASING_DIST_FROM_WHITEBOARD_M, ROBOT_ERASER_OFFSET_Y,
        WHITEBOARD_POSITION, WHITEBOARD_SURFACE_X,
    },
};

pub const ERASER: &str = "eraser";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ErasingOptions {
    pub path: ErasePath,
    pub robot_controlled: bool,
    pub dist_from_whiteboard: f64,
    pub erase_vibration_strength: f64,
    pub stop_on_collision: bool,
}

impl Default for ErasingOptions {
    fn default() -> Self {
        Self {
            path: ErasePath::Line,
            robot_controlled: true,
            dist_from_whiteboard: ERASING_DIST_FROM_WHITEBOARD_M,
            erase_vibration_strength: 0.0,
            stop_on_collision: true,
        }
    }
}

pub struct Erasing {
    options: ErasingOptions,
    lines: Vec<Vec<Vector3<f64>>>,
}

impl Erasing {
    pub fn new(options: ErasingOptions) -> Self {
        Self {
            options,
            lines: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[Vec<Vector3<f64>>] {
        &self.lines
    }

    pub fn remaining_points(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }

    fn eraser_pose(&self, frame: &FrameInfo, ctx: &SimContext) -> Option<Pose> {
        if self.options.robot_controlled {
            let ee = frame.current_ee_pose.or_else(|| ctx.current_ee())?;
            let orientation = ee.orientation * robot_eraser_rotation();
            let position =
                ee.position + orientation * Vector3::new(0.0, ROBOT_ERASER_OFFSET_Y, 0.0);
            return Some(Pose::new(position, orientation));
        }

        let controller = frame.controller_pose;
        let orientation = controller.orientation * controller_eraser_rotation();
        let position =
            controller.position + orientation * Vector3::new(0.0, CONTROLLER_ERASER_OFFSET_Y, 0.0);
        let pose = Pose::new(position, orientation);
        if !self.options.stop_on_collision {
            return Some(pose);
        }
        let clamp = GoalAdjustment::ClampX {
            max_x: CONTROLLER_ERASER_MAX_X,
            probes: eraser_corners().to_vec(),
        };
        Some(clamp.apply(pose))
    }

    fn near_whiteboard(&self, eraser: &Pose) -> bool {
        eraser_corners().iter().all(|corner| {
            WHITEBOARD_SURFACE_X - eraser.transform_point(corner).x
                <= self.options.dist_from_whiteboard
        })
    }

    fn erase(&mut self, eraser: &Pose) -> usize {
        let target = Vector3::new(WHITEBOARD_SURFACE_X, eraser.position.y, eraser.position.z);
        let samples: Vec<Vector3<f64>> = ERASE_SAMPLE_OFFSETS_X
            .iter()
            .map(|x| target + eraser.orientation * Vector3::new(*x, 0.0, 0.0))
            .collect();

        let mut erased = 0;
        let mut i = 0;
        while i < self.lines.len() {
            let hit = self.lines[i]
                .iter()
                .position(|point| samples.iter().any(|s| (point - s).norm() < ERASE_REACH_M));
            let Some(j) = hit else {
                i += 1;
                continue;
            };
            // Line `i` is replaced by its pieces at the end; index `i` now
            // holds the next unvisited line.
            let line = self.lines.remove(i);
            split_at(line, j, &mut self.lines);
            erased += 1;
        }
        erased
    }
}

/// Drops point `j` from `line` and keeps the pieces on either side that
/// still have at least two points.
fn split_at(line: Vec<Vector3<f64>>, j: usize, out: &mut Vec<Vec<Vector3<f64>>>) {
    if j > 1 {
        out.push(line[..j].to_vec());
    }
    if j + 2 < line.len() {
        out.push(line[j + 1..].to_vec());
    }
}

impl TaskBehavior for Erasing {
    fn kind(&self) -> &'static str {
        "erasing"
    }

    fn title(&self) -> &'static str {
        "Whiteboard Erasing\n"
    }

    fn default_text(&self) -> &'static str {
        "Complete the task by erasing the drawing on the whiteboard.\n\n"
    }

    fn object_names(&self) -> Vec<String> {
        vec![WHITEBOARD.to_string(), ERASER.to_string()]
    }

    fn setup(&mut self, ctx: &mut SimContext, objects: &mut ObjectSet) {
        let [x, y, z] = WHITEBOARD_POSITION;
        let board = Pose::at(x, y, z)
            .with_orientation(UnitQuaternion::from_axis_angle(&Vector3::y_axis(), PI));
        if let Err(err) = objects.set_pose(WHITEBOARD, board) {
            debug!(error = %err, "task: whiteboard not placed");
        }

        if !self.options.robot_controlled {
            ctx.services.scene.set_grip_visible(Hand::Right, false);
        } else if self.options.stop_on_collision {
            // Corners of the pad as seen from the end-effector frame.
            let rotation = robot_eraser_rotation();
            let offset = Vector3::new(0.0, ROBOT_ERASER_OFFSET_Y, 0.0);
            let probes = eraser_corners()
                .iter()
                .map(|corner| rotation * (offset + corner))
                .collect();
            ctx.adjustment = GoalAdjustment::ClampX {
                max_x: WHITEBOARD_SURFACE_X,
                probes,
            };
        }
    }

    fn teardown(&mut self, ctx: &mut SimContext, _objects: &mut ObjectSet) {
        ctx.adjustment = GoalAdjustment::Identity;
        ctx.services.scene.set_grip_visible(Hand::Right, true);
    }

    fn on_start(&mut self, round: usize, _ctx: &mut SimContext, _objects: &mut ObjectSet) {
        self.lines = erase_path(self.options.path);
        debug!(round, points = self.remaining_points(), "task: drawing restored");
    }

    fn on_update(&mut self, frame: &FrameInfo, ctx: &mut SimContext, objects: &mut ObjectSet) -> bool {
        let Some(eraser) = self.eraser_pose(frame, ctx) else {
            return false;
        };
        if objects.set_pose(ERASER, eraser).is_err() {
            return false;
        }

        if self.near_whiteboard(&eraser) {
            let cuts = self.erase(&eraser);
            if cuts > 0 {
                trace!(cuts, remaining = self.remaining_points(), "task: erased");
            }
            if self.options.erase_vibration_strength > 0.0 {
                ctx.services.haptics.pulse(
                    Hand::Right,
                    self.options.erase_vibration_strength,
                    ERASE_PULSE_MS,
                );
            }
        }
        self.lines.is_empty()
    }

    fn detail(&self) -> serde_json::Value {
        json!({
            "path": self.options.path,
            "robot_controlled": self.options.robot_controlled,
            "lines": self.lines.len(),
            "remaining_points": self.remaining_points(),
        })
    }
}

#[cfg(test)]
#[path = "tests/erasing_tests.rs"]
mod tests;
