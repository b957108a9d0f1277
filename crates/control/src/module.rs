use crate::{
    arm::{ArmControl, ArmKind},
    grasping::Grasping,
};

#[derive(Debug, Clone)]
pub enum ControlModule {
    Arm(ArmControl),
    Grasping(Grasping),
}

impl ControlModule {
    pub fn name(&self) -> &'static str {
        match self {
            ControlModule::Arm(arm) => arm.name(),
            ControlModule::Grasping(grasping) => grasping.name(),
        }
    }

    pub fn mode_name(&self) -> &'static str {
        match self {
            ControlModule::Arm(arm) => arm.mode().as_str(),
            ControlModule::Grasping(grasping) => grasping.mode().as_str(),
        }
    }

    pub fn arm_kind(&self) -> Option<ArmKind> {
        match self {
            ControlModule::Arm(arm) => Some(arm.kind()),
            ControlModule::Grasping(_) => None,
        }
    }
}

impl From<ArmControl> for ControlModule {
    fn from(arm: ArmControl) -> Self {
        ControlModule::Arm(arm)
    }
}

impl From<Grasping> for ControlModule {
    fn from(grasping: Grasping) -> Self {
        ControlModule::Grasping(grasping)
    }
}
