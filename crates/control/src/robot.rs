use tracing::{debug, info};

use crate::{
    context::{GoalAdjustment, SimContext},
    tuning::{IK_ANGLE_EPSILON_RAD, IK_POSITION_EPSILON_M},
};

/// Moves the target cursor to the adjusted goal and asks IK for joints when
/// the robot is measurably away from it. Returns whether IK ran and
/// succeeded; a failed solve leaves the robot where it is until next frame.
pub fn drive_goal(ctx: &mut SimContext) -> bool {
    let goal = ctx.adjusted_goal();
    ctx.services.scene.set_cursor_position(goal.position);

    let Some(current) = ctx.current_ee() else {
        return false;
    };
    if current.distance_to(&goal) <= IK_POSITION_EPSILON_M
        && current.angle_to(&goal) <= IK_ANGLE_EPSILON_RAD
    {
        return false;
    }

    match ctx.services.ik.solve(&goal.position, &goal.orientation) {
        Ok(_) => true,
        Err(err) => {
            debug!(error = %err, "control: ik solve failed, skipping frame");
            false
        }
    }
}

pub fn reset_robot(ctx: &mut SimContext) {
    ctx.grasped = false;
    ctx.first_person = false;
    ctx.adjustment = GoalAdjustment::Identity;
    ctx.reset_goal();
    ctx.services.ik.reset(&[]);
    drive_goal(ctx);
    ctx.capture_initial_pose();
    info!(robot = ?ctx.robot, "control: robot reset");
}
