use std::f64::consts::PI;

use control::{GoalAdjustment, SimContext};
use nalgebra::{UnitQuaternion, Vector3};
use serde::Deserialize;
use serde_json::json;
use shared::{
    domain::{Hand, Pose},
    protocol::FrameInfo,
};
use tracing::debug;

use crate::{
    objects::ObjectSet,
    task::TaskBehavior,
    tuning::{
        marker_rotation, marker_translation, trace_endpoints, TraceName,
        DRAWING_DIST_FROM_WHITEBOARD_M, TRACE_ENDPOINT_TOLERANCE_M, WHITEBOARD_HALF_WIDTH_Z,
        WHITEBOARD_MAX_Y, WHITEBOARD_MIN_Y, WHITEBOARD_POSITION, WHITEBOARD_SURFACE_X,
    },
};

pub const WHITEBOARD: &str = "whiteboard";
pub const MARKER: &str = "marker";

const STROKE_SPACING_M: f64 = 0.001;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DrawingOptions {
    pub trace: TraceName,
    pub robot_controlled: bool,
    pub dist_from_whiteboard: f64,
}

impl Default for DrawingOptions {
    fn default() -> Self {
        Self {
            trace: TraceName::Lab,
            robot_controlled: true,
            dist_from_whiteboard: DRAWING_DIST_FROM_WHITEBOARD_M,
        }
    }
}

pub struct Drawing {
    options: DrawingOptions,
    stroke: Vec<Vector3<f64>>,
    touched_start: bool,
    touched_end: bool,
}

impl Drawing {
    pub fn new(options: DrawingOptions) -> Self {
        Self {
            options,
            stroke: Vec::new(),
            touched_start: false,
            touched_end: false,
        }
    }

    pub fn stroke(&self) -> &[Vector3<f64>] {
        &self.stroke
    }

    fn marker(&self, frame: &FrameInfo, ctx: &SimContext) -> Option<(Pose, Vector3<f64>)> {
        if !self.options.robot_controlled {
            let pose = frame.controller_pose;
            return Some((pose, pose.position));
        }
        let robot = ctx.robot?;
        let ee = frame.current_ee_pose.or_else(|| ctx.current_ee())?;
        let orientation = ee.orientation * marker_rotation(robot);
        let tip = ee.position + orientation * Vector3::new(0.0, marker_translation(robot), 0.0);
        Some((Pose::new(ee.position, orientation), tip))
    }

    fn on_surface(&self, tip: &Vector3<f64>) -> bool {
        (tip.x - WHITEBOARD_SURFACE_X).abs() <= self.options.dist_from_whiteboard
            && (WHITEBOARD_MIN_Y..=WHITEBOARD_MAX_Y).contains(&tip.y)
            && tip.z.abs() <= WHITEBOARD_HALF_WIDTH_Z
    }

    fn record(&mut self, tip: Vector3<f64>) {
        let point = Vector3::new(WHITEBOARD_SURFACE_X, tip.y, tip.z);
        if self
            .stroke
            .last()
            .is_some_and(|last| (last - point).norm() < STROKE_SPACING_M)
        {
            return;
        }
        let (start, end) = trace_endpoints(self.options.trace);
        if (point - start).norm() <= TRACE_ENDPOINT_TOLERANCE_M && !self.touched_start {
            self.touched_start = true;
            debug!(trace = ?self.options.trace, "task: trace start reached");
        }
        if (point - end).norm() <= TRACE_ENDPOINT_TOLERANCE_M && !self.touched_end {
            self.touched_end = true;
            debug!(trace = ?self.options.trace, "task: trace end reached");
        }
        self.stroke.push(point);
    }
}

impl TaskBehavior for Drawing {
    fn kind(&self) -> &'static str {
        "drawing"
    }

    fn title(&self) -> &'static str {
        "Whiteboard Drawing\n"
    }

    fn default_text(&self) -> &'static str {
        "Complete the task by drawing over the outline on the whiteboard.\n\n"
    }

    fn object_names(&self) -> Vec<String> {
        vec![WHITEBOARD.to_string(), MARKER.to_string()]
    }

    fn setup(&mut self, ctx: &mut SimContext, objects: &mut ObjectSet) {
        let [x, y, z] = WHITEBOARD_POSITION;
        let board = Pose::at(x, y, z)
            .with_orientation(UnitQuaternion::from_axis_angle(&Vector3::y_axis(), PI));
        if let Err(err) = objects.set_pose(WHITEBOARD, board) {
            debug!(error = %err, "task: whiteboard not placed");
        }

        match (self.options.robot_controlled, ctx.robot) {
            (true, Some(robot)) => {
                let tip = marker_rotation(robot) * Vector3::new(0.0, marker_translation(robot), 0.0);
                ctx.adjustment = GoalAdjustment::ClampX {
                    max_x: WHITEBOARD_SURFACE_X,
                    probes: vec![tip],
                };
            }
            (true, None) => {}
            (false, _) => ctx.services.scene.set_grip_visible(Hand::Right, false),
        }
    }

    fn teardown(&mut self, ctx: &mut SimContext, _objects: &mut ObjectSet) {
        ctx.adjustment = GoalAdjustment::Identity;
        ctx.services.scene.set_grip_visible(Hand::Right, true);
    }

    fn on_start(&mut self, _round: usize, _ctx: &mut SimContext, _objects: &mut ObjectSet) {
        self.stroke.clear();
        self.touched_start = false;
        self.touched_end = false;
    }

    fn on_update(&mut self, frame: &FrameInfo, ctx: &mut SimContext, objects: &mut ObjectSet) -> bool {
        let Some((pose, tip)) = self.marker(frame, ctx) else {
            return false;
        };
        if objects.set_pose(MARKER, pose).is_err() {
            return false;
        }
        if self.on_surface(&tip) {
            self.record(tip);
        }
        self.touched_start && self.touched_end
    }

    fn detail(&self) -> serde_json::Value {
        json!({
            "trace": self.options.trace,
            "robot_controlled": self.options.robot_controlled,
            "stroke_points": self.stroke.len(),
            "touched_start": self.touched_start,
            "touched_end": self.touched_end,
        })
    }
}

#[cfg(test)]
#[path = "tests/drawing_tests.rs"]
mod tests;
