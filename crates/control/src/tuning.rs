use std::f64::consts::FRAC_PI_4;

use nalgebra::{Quaternion, UnitQuaternion};
use shared::domain::RobotKind;

pub const DEFAULT_ACTIVATION_RADIUS_M: f64 = 0.1;
pub const DEFAULT_REACTIVATION_COOLDOWN_MS: u64 = 1000;

pub const CLICK_CLIP: &str = "click";
pub const ACTIVATION_PULSE_INTENSITY: f64 = 0.25;
pub const ACTIVATION_PULSE_MS: u64 = 18;

pub const IK_POSITION_EPSILON_M: f64 = 1e-3;
pub const IK_ANGLE_EPSILON_RAD: f64 = 1e-3;

pub const FINGER_STEP_M: f64 = 0.001;
pub const FINGER_OPEN_LIMIT_M: f64 = 0.08;
pub const FINGER_CLOSE_LIMIT_M: f64 = 0.01;
pub const GRASP_PULSE_INTENSITY: f64 = 0.25;
pub const GRASP_PULSE_MS: u64 = 18;

/// Sign applied to the right finger's local translation. The UR5 gripper
/// model mirrors its right pad.
pub fn finger_direction(robot: RobotKind) -> Option<f64> {
    match robot {
        RobotKind::Sawyer => Some(1.0),
        RobotKind::Ur5 => Some(-1.0),
        RobotKind::SpotArm | RobotKind::MobileSpotArm => None,
    }
}

pub fn redirect_correction() -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(
        FRAC_PI_4.cos(),
        0.0,
        FRAC_PI_4.sin(),
        0.0,
    ))
}
