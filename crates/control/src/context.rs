use nalgebra::Vector3;
use shared::{
    domain::{Pose, RobotKind},
    error::{CoreError, CoreResult},
};
use tracing::debug;

use crate::{bindings::ButtonBindings, services::Services};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum GoalAdjustment {
    #[default]
    Identity,
    /// Shifts the goal along -X until every probe point, expressed in the
    /// goal's frame, sits at or below `max_x`.
    ClampX {
        max_x: f64,
        probes: Vec<Vector3<f64>>,
    },
}

impl GoalAdjustment {
    pub fn apply(&self, goal: Pose) -> Pose {
        match self {
            GoalAdjustment::Identity => goal,
            GoalAdjustment::ClampX { max_x, probes } => {
                let mut adjusted = goal;
                for probe in probes {
                    let point = adjusted.transform_point(probe);
                    if point.x > *max_x {
                        adjusted.position.x -= point.x - max_x;
                    }
                }
                adjusted
            }
        }
    }
}

pub struct SimContext {
    pub services: Services,
    pub robot: Option<RobotKind>,
    pub first_person: bool,
    pub grasped: bool,
    pub bindings: ButtonBindings,
    pub adjustment: GoalAdjustment,
    goal: Pose,
    initial_ee: Pose,
    now_ms: u64,
    goal_writer: Option<(u64, String)>,
}

impl SimContext {
    pub fn new(services: Services) -> Self {
        let initial_ee = services
            .pose
            .current_end_effector_pose()
            .unwrap_or_default();
        Self {
            services,
            robot: None,
            first_person: false,
            grasped: false,
            bindings: ButtonBindings::new(),
            adjustment: GoalAdjustment::Identity,
            goal: Pose::identity(),
            initial_ee,
            now_ms: 0,
            goal_writer: None,
        }
    }

    pub fn with_robot(mut self, robot: RobotKind) -> Self {
        self.robot = Some(robot);
        self
    }

    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn initial_ee(&self) -> Pose {
        self.initial_ee
    }

    pub fn capture_initial_pose(&mut self) {
        if let Some(pose) = self.services.pose.current_end_effector_pose() {
            self.initial_ee = pose;
        }
    }

    pub fn goal(&self) -> Pose {
        self.goal
    }

    pub fn absolute_goal(&self) -> Pose {
        Pose::new(
            self.initial_ee.position + self.goal.position,
            self.goal.orientation * self.initial_ee.orientation,
        )
    }

    pub fn adjusted_goal(&self) -> Pose {
        self.adjustment.apply(self.absolute_goal())
    }

    /// Lets `owner` mutate the relative goal. Only one owner may write per
    /// frame; a second writer in the same frame is refused.
    pub fn write_goal(&mut self, owner: &str, write: impl FnOnce(&mut Pose)) -> CoreResult<()> {
        match &self.goal_writer {
            Some((frame, holder)) if *frame == self.now_ms && holder != owner => {
                debug!(owner, holder = %holder, "control: goal already written this frame");
                return Err(CoreError::GoalContended {
                    holder: holder.clone(),
                });
            }
            _ => {}
        }
        self.goal_writer = Some((self.now_ms, owner.to_string()));
        write(&mut self.goal);
        Ok(())
    }

    pub fn reset_goal(&mut self) {
        self.goal = Pose::identity();
        self.goal_writer = None;
    }

    pub fn current_ee(&self) -> Option<Pose> {
        self.services.pose.current_end_effector_pose()
    }
}
