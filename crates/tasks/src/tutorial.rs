use control::SimContext;
use nalgebra::Vector3;
use serde_json::json;
use shared::{domain::Pose, protocol::FrameInfo};
use tracing::debug;

use crate::{
    objects::ObjectSet,
    task::TaskBehavior,
    tuning::{TUTORIAL_REACH_M, TUTORIAL_TARGETS},
};

pub const TARGET: &str = "target";

#[derive(Debug, Default)]
pub struct Tutorial {
    target: Option<Vector3<f64>>,
    distance: Option<f64>,
}

impl Tutorial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<Vector3<f64>> {
        self.target
    }
}

impl TaskBehavior for Tutorial {
    fn kind(&self) -> &'static str {
        "tutorial"
    }

    fn title(&self) -> &'static str {
        "Tutorial\n"
    }

    fn default_text(&self) -> &'static str {
        "Move the robot's gripper onto the floating target.\n\n"
    }

    fn object_names(&self) -> Vec<String> {
        vec![TARGET.to_string()]
    }

    fn on_start(&mut self, round: usize, _ctx: &mut SimContext, objects: &mut ObjectSet) {
        let [x, y, z] = TUTORIAL_TARGETS[round % TUTORIAL_TARGETS.len()];
        self.target = Some(Vector3::new(x, y, z));
        self.distance = None;
        if let Err(err) = objects.set_pose(TARGET, Pose::at(x, y, z)) {
            debug!(error = %err, "task: tutorial target not placed");
        }
    }

    fn on_update(&mut self, frame: &FrameInfo, ctx: &mut SimContext, _objects: &mut ObjectSet) -> bool {
        let (Some(target), Some(ee)) = (self.target, frame.current_ee_pose.or_else(|| ctx.current_ee()))
        else {
            return false;
        };
        let distance = (ee.position - target).norm();
        self.distance = Some(distance);
        distance <= TUTORIAL_REACH_M
    }

    fn detail(&self) -> serde_json::Value {
        json!({
            "target": self.target.map(|t| [t.x, t.y, t.z]),
            "distance": self.distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use control::SimRig;
    use shared::domain::RobotKind;

    use super::*;

    #[test]
    fn reaching_the_target_completes_the_round() {
        let rig = SimRig::new();
        let mut ctx = SimContext::new(rig.services()).with_robot(RobotKind::Sawyer);
        let mut objects = ObjectSet::new();
        let mut tutorial = Tutorial::new();
        tutorial.on_start(1, &mut ctx, &mut objects);

        let [x, y, z] = TUTORIAL_TARGETS[1];
        let far = FrameInfo::new(Pose::identity(), Some(Pose::at(x, y + 0.2, z)), 5);
        assert!(!tutorial.on_update(&far, &mut ctx, &mut objects));

        let near = FrameInfo::new(Pose::identity(), Some(Pose::at(x, y + 0.01, z)), 10);
        assert!(tutorial.on_update(&near, &mut ctx, &mut objects));
    }

    #[test]
    fn missing_robot_pose_never_completes() {
        let rig = SimRig::new();
        rig.clear_end_effector();
        let mut ctx = SimContext::new(rig.services());
        let mut objects = ObjectSet::new();
        let mut tutorial = Tutorial::new();
        tutorial.on_start(0, &mut ctx, &mut objects);

        let frame = FrameInfo::new(Pose::identity(), None, 5);
        assert!(!tutorial.on_update(&frame, &mut ctx, &mut objects));
    }
}
