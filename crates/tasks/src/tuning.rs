use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use shared::domain::RobotKind;

pub const DEFAULT_TELEMETRY_BUFFER: usize = 500;

// Whiteboard.
pub const WHITEBOARD_POSITION: [f64; 3] = [1.0, 0.0, 0.0];
pub const WHITEBOARD_SURFACE_X: f64 = 0.99;
pub const WHITEBOARD_MIN_Y: f64 = 0.85625;
pub const WHITEBOARD_MAX_Y: f64 = 1.83125;
pub const WHITEBOARD_HALF_WIDTH_Z: f64 = 0.6875;

// Drawing.
pub const DRAWING_DIST_FROM_WHITEBOARD_M: f64 = 0.025;
pub const TRACE_ENDPOINT_TOLERANCE_M: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceName {
    Lab,
    Hri,
    Ros,
}

pub fn trace_endpoints(trace: TraceName) -> (Vector3<f64>, Vector3<f64>) {
    match trace {
        TraceName::Lab => (
            Vector3::new(0.99, 0.95, -0.675),
            Vector3::new(0.99, 1.34, 0.55),
        ),
        TraceName::Hri => (
            Vector3::new(0.99, 0.96, -0.68),
            Vector3::new(0.99, 0.97, 0.68),
        ),
        TraceName::Ros => (
            Vector3::new(0.99, 1.008, -0.62),
            Vector3::new(0.99, 1.105, 0.335),
        ),
    }
}

pub fn marker_rotation(robot: RobotKind) -> UnitQuaternion<f64> {
    match robot {
        RobotKind::Sawyer | RobotKind::Ur5 => {
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2)
        }
        RobotKind::SpotArm | RobotKind::MobileSpotArm => {
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI)
        }
    }
}

pub fn marker_translation(robot: RobotKind) -> f64 {
    match robot {
        RobotKind::Sawyer => -0.2,
        RobotKind::Ur5 => -0.1,
        RobotKind::SpotArm | RobotKind::MobileSpotArm => -0.3,
    }
}

// Erasing.
pub const ERASING_DIST_FROM_WHITEBOARD_M: f64 = 0.01;
pub const ERASE_REACH_M: f64 = 0.025;
pub const ERASE_SAMPLE_OFFSETS_X: [f64; 5] = [-0.05, -0.025, 0.0, 0.025, 0.05];
pub const ERASER_HALF_LENGTH_X: f64 = 0.075;
pub const ERASER_HALF_DEPTH_Z: f64 = 0.025;
pub const ERASE_PULSE_MS: u64 = 18;
pub const CONTROLLER_ERASER_MAX_X: f64 = 1.0;
pub const ROBOT_ERASER_OFFSET_Y: f64 = -0.15;
pub const CONTROLLER_ERASER_OFFSET_Y: f64 = -0.1;
pub const PATH_STEP_M: f64 = 0.001;

pub fn robot_eraser_rotation() -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2)
}

pub fn controller_eraser_rotation() -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2)
}

pub fn eraser_corners() -> [Vector3<f64>; 4] {
    [
        Vector3::new(-ERASER_HALF_LENGTH_X, 0.0, -ERASER_HALF_DEPTH_Z),
        Vector3::new(-ERASER_HALF_LENGTH_X, 0.0, ERASER_HALF_DEPTH_Z),
        Vector3::new(ERASER_HALF_LENGTH_X, 0.0, -ERASER_HALF_DEPTH_Z),
        Vector3::new(ERASER_HALF_LENGTH_X, 0.0, ERASER_HALF_DEPTH_Z),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErasePath {
    Line,
    Filled,
}

pub fn erase_path(path: ErasePath) -> Vec<Vec<Vector3<f64>>> {
    let row = |y: f64| -> Vec<Vector3<f64>> {
        (0..=1000)
            .map(|i| Vector3::new(WHITEBOARD_SURFACE_X, y, -0.5 + i as f64 * PATH_STEP_M))
            .collect()
    };
    match path {
        ErasePath::Line => vec![row(1.35)],
        ErasePath::Filled => (0..1000)
            .map(|i| row(0.85 + i as f64 * PATH_STEP_M))
            .collect(),
    }
}

// Pouring.
pub const DEFAULT_PARTICLES: usize = 30;
pub const CUP_SIZE_M: f64 = 0.1;
/// Finger gap band, above `CUP_SIZE_M / 4`, in which a touched cup is held.
pub const CUP_GRASP_BAND_M: f64 = 0.01;
pub const CUP_START: [f64; 3] = [0.6, 1.0, -0.25];
pub const BOX_START: [f64; 3] = [0.5, 1.0, 0.0];
pub const TABLE_POSITION: [f64; 3] = [0.8, 0.0, 0.0];
pub const BOX_SIZE: [f64; 3] = [0.3, 0.2, 0.3];
pub const PARTICLE_BASE: [f64; 3] = [0.595, 1.05, -0.255];
pub const PARTICLE_SPACING_Y: f64 = 0.05;
pub const PARTICLE_JITTER_M: f64 = 0.01;
pub fn gripper_offset_z(robot: RobotKind) -> f64 {
    match robot {
        RobotKind::Sawyer => 0.07,
        RobotKind::Ur5 | RobotKind::SpotArm | RobotKind::MobileSpotArm => 0.0,
    }
}

pub fn cup_rotation() -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2)
}

// Tutorial.
pub const TUTORIAL_REACH_M: f64 = 0.05;
pub const TUTORIAL_TARGETS: [[f64; 3]; 3] = [[0.6, 1.3, 0.2], [0.6, 1.1, -0.2], [0.7, 1.4, 0.0]];
