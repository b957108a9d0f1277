use std::f64::consts::FRAC_PI_2;

use control::SimContext;
use nalgebra::{UnitQuaternion, Vector3};
use serde::Deserialize;
use serde_json::json;
use shared::{domain::Pose, protocol::FrameInfo};
use tracing::{debug, info};

use crate::{
    objects::ObjectSet,
    task::TaskBehavior,
    tuning::{
        cup_rotation, gripper_offset_z, BOX_SIZE, BOX_START, CUP_GRASP_BAND_M, CUP_SIZE_M,
        CUP_START, DEFAULT_PARTICLES, PARTICLE_BASE, PARTICLE_JITTER_M, PARTICLE_SPACING_Y,
        TABLE_POSITION,
    },
};

pub const CUP: &str = "cup";
pub const BOX: &str = "box";
pub const TABLE: &str = "table";

// Collider names registered with the physics collaborator.
pub const LEFT_FINGER: &str = "left-finger";
pub const RIGHT_FINGER: &str = "right-finger";
pub const GROUND: &str = "ground";
pub const BOX_LID: &str = "box-lid";
pub const BOX_SIDES: [&str; 4] = ["box-side-1", "box-side-2", "box-side-3", "box-side-4"];

pub fn particle_name(index: usize) -> String {
    format!("particle-{index}")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PouringOptions {
    pub num_particles: usize,
}

impl Default for PouringOptions {
    fn default() -> Self {
        Self {
            num_particles: DEFAULT_PARTICLES,
        }
    }
}

pub struct Pouring {
    options: PouringOptions,
    holding_cup: bool,
    particles_inside: usize,
}

impl Pouring {
    pub fn new(options: PouringOptions) -> Self {
        Self {
            options,
            holding_cup: false,
            particles_inside: 0,
        }
    }

    pub fn is_holding_cup(&self) -> bool {
        self.holding_cup
    }

    pub fn particles_inside(&self) -> usize {
        self.particles_inside
    }

    fn release_cup(&mut self, ctx: &mut SimContext) {
        if self.holding_cup {
            self.holding_cup = false;
            ctx.grasped = false;
            debug!("task: cup released");
        }
    }

    fn update_grasp(&mut self, ctx: &mut SimContext) {
        let Some(gap) = ctx.robot.and_then(|robot| ctx.services.pose.finger_gap(robot)) else {
            return;
        };
        let min_gap = CUP_SIZE_M / 4.0;
        let max_gap = min_gap + CUP_GRASP_BAND_M;

        if self.holding_cup {
            if gap > max_gap {
                self.release_cup(ctx);
            }
            return;
        }
        let physics = &ctx.services.physics;
        let touching = physics.in_contact(LEFT_FINGER, CUP) && physics.in_contact(RIGHT_FINGER, CUP);
        if touching && gap > min_gap && gap < max_gap {
            self.holding_cup = true;
            ctx.grasped = true;
            debug!(gap, "task: cup grasped");
        }
    }

    fn count_inside(&self, objects: &ObjectSet) -> Option<usize> {
        let container = objects.pose(BOX)?;
        let inverse = container.orientation.inverse();
        let count = (0..self.options.num_particles)
            .filter_map(|i| objects.pose(&particle_name(i)))
            .filter(|particle| {
                let local = inverse * (particle.position - container.position);
                (0..3).all(|axis| local[axis] > 0.0 && local[axis] < BOX_SIZE[axis])
            })
            .count();
        Some(count)
    }

    fn lid_closed(ctx: &SimContext) -> bool {
        BOX_SIDES
            .iter()
            .all(|side| ctx.services.physics.in_contact(side, BOX_LID))
    }

    fn dropped(ctx: &SimContext) -> bool {
        let physics = &ctx.services.physics;
        physics.in_contact(GROUND, BOX) || physics.in_contact(GROUND, CUP)
    }
}

fn jitter(index: usize, round: usize, axis: usize) -> f64 {
    let bucket = (index * 7 + round * 13 + axis * 5) % 11;
    PARTICLE_JITTER_M * bucket as f64 / 10.0
}

impl TaskBehavior for Pouring {
    fn kind(&self) -> &'static str {
        "pouring"
    }

    fn title(&self) -> &'static str {
        "Pouring Task\n"
    }

    fn default_text(&self) -> &'static str {
        "Complete the task by pouring the contents of the cup into the box. Close the box after you are done.\n\n"
    }

    fn object_names(&self) -> Vec<String> {
        let mut names = vec![CUP.to_string(), BOX.to_string(), TABLE.to_string()];
        names.extend((0..self.options.num_particles).map(particle_name));
        names
    }

    fn setup(&mut self, _ctx: &mut SimContext, objects: &mut ObjectSet) {
        let [x, y, z] = TABLE_POSITION;
        let table = Pose::at(x, y, z)
            .with_orientation(UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -FRAC_PI_2));
        if let Err(err) = objects.set_pose(TABLE, table) {
            debug!(error = %err, "task: table not placed");
        }
    }

    fn teardown(&mut self, ctx: &mut SimContext, _objects: &mut ObjectSet) {
        self.release_cup(ctx);
    }

    fn on_start(&mut self, round: usize, ctx: &mut SimContext, objects: &mut ObjectSet) {
        self.release_cup(ctx);
        self.particles_inside = 0;

        let [cx, cy, cz] = CUP_START;
        let [bx, by, bz] = BOX_START;
        let mut layout = vec![
            (CUP.to_string(), Pose::at(cx, cy, cz)),
            (BOX.to_string(), Pose::at(bx, by, bz)),
        ];
        let [px, py, pz] = PARTICLE_BASE;
        layout.extend((0..self.options.num_particles).map(|i| {
            let pose = Pose::at(
                px + jitter(i, round, 0),
                py + i as f64 * PARTICLE_SPACING_Y,
                pz + jitter(i, round, 2),
            );
            (particle_name(i), pose)
        }));

        for (name, pose) in layout {
            if let Err(err) = objects.set_pose(&name, pose) {
                debug!(error = %err, "task: object not placed");
            }
        }
        info!(round, particles = self.options.num_particles, "task: pouring layout reset");
    }

    fn on_update(&mut self, frame: &FrameInfo, ctx: &mut SimContext, objects: &mut ObjectSet) -> bool {
        self.update_grasp(ctx);

        if self.holding_cup {
            let ee = frame.current_ee_pose.or_else(|| ctx.current_ee());
            if let (Some(ee), Some(robot)) = (ee, ctx.robot) {
                let position =
                    ee.position + ee.orientation * Vector3::new(0.0, 0.0, gripper_offset_z(robot));
                let cup = Pose::new(position, ee.orientation * cup_rotation());
                if let Err(err) = objects.set_pose(CUP, cup) {
                    debug!(error = %err, "task: held cup not moved");
                }
            }
        }

        if Self::dropped(ctx) {
            return true;
        }
        let Some(inside) = self.count_inside(objects) else {
            return false;
        };
        self.particles_inside = inside;
        Self::lid_closed(ctx)
    }

    fn detail(&self) -> serde_json::Value {
        json!({
            "particles_inside": self.particles_inside,
            "num_particles": self.options.num_particles,
            "holding_cup": self.holding_cup,
        })
    }
}

#[cfg(test)]
#[path = "tests/pouring_tests.rs"]
mod tests;
