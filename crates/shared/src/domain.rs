use std::fmt;

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), UnitQuaternion::identity())
    }

    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self::new(Vector3::new(x, y, z), UnitQuaternion::identity())
    }

    pub fn with_orientation(mut self, orientation: UnitQuaternion<f64>) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn distance_to(&self, other: &Pose) -> f64 {
        (self.position - other.position).norm()
    }

    pub fn angle_to(&self, other: &Pose) -> f64 {
        self.orientation.angle_to(&other.orientation)
    }

    pub fn transform_point(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.position + self.orientation * local
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotKind {
    Sawyer,
    Ur5,
    SpotArm,
    MobileSpotArm,
}

impl RobotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RobotKind::Sawyer => "sawyer",
            RobotKind::Ur5 => "ur5",
            RobotKind::SpotArm => "spot_arm",
            RobotKind::MobileSpotArm => "mobile_spot_arm",
        }
    }
}

impl fmt::Display for RobotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hand {
    Left,
    Right,
}

/// Button events published by the controller binding.
///
/// `Grip`/`Trigger`/`A`/`B` are completed presses, `*Start`/`*End` bracket a
/// held press, and `TriggerPressed`/`TriggerReleased` are level events the
/// binding emits on every frame the trigger is down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonEvent {
    Grip,
    GripStart,
    GripEnd,
    Trigger,
    TriggerStart,
    TriggerEnd,
    TriggerPressed,
    TriggerReleased,
    A,
    B,
}

impl ButtonEvent {
    pub const ALL: [ButtonEvent; 10] = [
        ButtonEvent::Grip,
        ButtonEvent::GripStart,
        ButtonEvent::GripEnd,
        ButtonEvent::Trigger,
        ButtonEvent::TriggerStart,
        ButtonEvent::TriggerEnd,
        ButtonEvent::TriggerPressed,
        ButtonEvent::TriggerReleased,
        ButtonEvent::A,
        ButtonEvent::B,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonEvent::Grip => "grip",
            ButtonEvent::GripStart => "gripstart",
            ButtonEvent::GripEnd => "gripend",
            ButtonEvent::Trigger => "trigger",
            ButtonEvent::TriggerStart => "triggerstart",
            ButtonEvent::TriggerEnd => "triggerend",
            ButtonEvent::TriggerPressed => "triggerpressed",
            ButtonEvent::TriggerReleased => "triggerreleased",
            ButtonEvent::A => "a",
            ButtonEvent::B => "b",
        }
    }
}

impl fmt::Display for ButtonEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeButton {
    Grip,
    Trigger,
}

impl ModeButton {
    pub fn press(self) -> ButtonEvent {
        match self {
            ModeButton::Grip => ButtonEvent::Grip,
            ModeButton::Trigger => ButtonEvent::Trigger,
        }
    }

    pub fn start(self) -> ButtonEvent {
        match self {
            ModeButton::Grip => ButtonEvent::GripStart,
            ModeButton::Trigger => ButtonEvent::TriggerStart,
        }
    }

    pub fn end(self) -> ButtonEvent {
        match self {
            ModeButton::Grip => ButtonEvent::GripEnd,
            ModeButton::Trigger => ButtonEvent::TriggerEnd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activation {
    Auto,
    Toggle,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArmMode {
    GripAuto,
    GripToggle,
    GripHold,
    TriggerAuto,
    TriggerToggle,
    TriggerHold,
}

impl ArmMode {
    pub const ALL: [ArmMode; 6] = [
        ArmMode::GripAuto,
        ArmMode::GripToggle,
        ArmMode::GripHold,
        ArmMode::TriggerAuto,
        ArmMode::TriggerToggle,
        ArmMode::TriggerHold,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArmMode::GripAuto => "grip-auto",
            ArmMode::GripToggle => "grip-toggle",
            ArmMode::GripHold => "grip-hold",
            ArmMode::TriggerAuto => "trigger-auto",
            ArmMode::TriggerToggle => "trigger-toggle",
            ArmMode::TriggerHold => "trigger-hold",
        }
    }

    pub fn button(&self) -> ModeButton {
        match self {
            ArmMode::GripAuto | ArmMode::GripToggle | ArmMode::GripHold => ModeButton::Grip,
            ArmMode::TriggerAuto | ArmMode::TriggerToggle | ArmMode::TriggerHold => {
                ModeButton::Trigger
            }
        }
    }

    pub fn activation(&self) -> Activation {
        match self {
            ArmMode::GripAuto | ArmMode::TriggerAuto => Activation::Auto,
            ArmMode::GripToggle | ArmMode::TriggerToggle => Activation::Toggle,
            ArmMode::GripHold | ArmMode::TriggerHold => Activation::Hold,
        }
    }
}

impl fmt::Display for ArmMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GraspMode {
    AbHold,
    TriggerToggle,
    TriggerHold,
}

impl GraspMode {
    pub const ALL: [GraspMode; 3] = [
        GraspMode::AbHold,
        GraspMode::TriggerToggle,
        GraspMode::TriggerHold,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GraspMode::AbHold => "ab-hold",
            GraspMode::TriggerToggle => "trigger-toggle",
            GraspMode::TriggerHold => "trigger-hold",
        }
    }
}

impl fmt::Display for GraspMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueColor {
    Neutral,
    Green,
    Amber,
    Red,
}

impl CueColor {
    pub fn hex(&self) -> u32 {
        match self {
            CueColor::Neutral => 0xffffff,
            CueColor::Green => 0x00ff00,
            CueColor::Amber => 0xffcc00,
            CueColor::Red => 0xff0000,
        }
    }

    pub fn for_offset(length: f64) -> Self {
        if length < 0.1 {
            CueColor::Green
        } else if length < 0.2 {
            CueColor::Amber
        } else {
            CueColor::Red
        }
    }
}
