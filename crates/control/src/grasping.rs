use shared::{
    domain::{ButtonEvent, GraspMode, Hand},
    error::{CoreError, CoreResult},
};
use tracing::{debug, info};

use crate::{
    bindings::{Binding, ButtonBindings},
    context::SimContext,
    tuning::{
        finger_direction, FINGER_CLOSE_LIMIT_M, FINGER_OPEN_LIMIT_M, FINGER_STEP_M,
        GRASP_PULSE_INTENSITY, GRASP_PULSE_MS,
    },
};

pub const GRASPING: &str = "grasping";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraspAction {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    Complete,
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct Grasping {
    mode: GraspMode,
    closed: bool,
    pending: Option<GraspAction>,
    disabled: bool,
    hand: Hand,
    bound: bool,
}

impl Grasping {
    pub fn new(mode: &str) -> CoreResult<Self> {
        let mode = parse_mode(mode)?;
        Ok(Self {
            mode,
            closed: false,
            pending: None,
            disabled: false,
            hand: Hand::Right,
            bound: false,
        })
    }

    pub fn name(&self) -> &'static str {
        GRASPING
    }

    pub fn mode(&self) -> GraspMode {
        self.mode
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub(crate) fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn set_mode(&mut self, mode: &str, bindings: &mut ButtonBindings) -> CoreResult<()> {
        self.mode = parse_mode(mode)?;
        if self.bound {
            self.bind(bindings);
        }
        info!(module = GRASPING, mode = %self.mode, "control: mode set");
        Ok(())
    }

    pub fn bind(&mut self, bindings: &mut ButtonBindings) {
        bindings.remove_owner(GRASPING);
        self.pending = None;
        match self.mode {
            GraspMode::TriggerHold => {
                bindings.add(ButtonEvent::TriggerPressed, GRASPING, Binding::CloseFingers);
                bindings.add(ButtonEvent::TriggerReleased, GRASPING, Binding::OpenFingers);
            }
            GraspMode::TriggerToggle => {
                self.closed = false;
                bindings.add(ButtonEvent::Trigger, GRASPING, Binding::ArmGraspToggle);
            }
            GraspMode::AbHold => {
                bindings.add(ButtonEvent::A, GRASPING, Binding::CloseFingers);
                bindings.add(ButtonEvent::B, GRASPING, Binding::OpenFingers);
            }
        }
        self.bound = true;
    }

    pub fn unbind(&mut self, bindings: &mut ButtonBindings) {
        bindings.remove_owner(GRASPING);
        self.pending = None;
        self.bound = false;
    }

    pub fn reset(&mut self, bindings: &mut ButtonBindings) {
        if self.pending.take().is_some() {
            bindings.remove(ButtonEvent::TriggerReleased, GRASPING);
        }
    }

    pub fn instructions(&self) -> &'static str {
        match self.mode {
            GraspMode::TriggerHold => "Close: Squeeze and hold the trigger.\nOpen: Release the trigger.",
            GraspMode::TriggerToggle => "Close: Squeeze the trigger.\nOpen: Squeeze the trigger again.",
            GraspMode::AbHold => "Close: Press and hold (a).\nOpen: Press and hold (b).",
        }
    }

    pub fn handle(&mut self, binding: Binding, ctx: &mut SimContext) -> Option<StepOutcome> {
        if self.disabled {
            return None;
        }
        match binding {
            Binding::CloseFingers => Some(step(GraspAction::Close, self.hand, ctx)),
            Binding::OpenFingers => Some(step(GraspAction::Open, self.hand, ctx)),
            Binding::ArmGraspToggle => {
                let action = if self.closed {
                    GraspAction::Open
                } else {
                    GraspAction::Close
                };
                self.pending = Some(action);
                ctx.bindings.add(
                    ButtonEvent::TriggerReleased,
                    GRASPING,
                    Binding::CompleteGraspToggle,
                );
                None
            }
            Binding::CompleteGraspToggle => {
                let action = self.pending?;
                let outcome = step(action, self.hand, ctx);
                if outcome == StepOutcome::Complete {
                    self.closed = action == GraspAction::Close;
                    self.pending = None;
                    ctx.bindings.remove(ButtonEvent::TriggerReleased, GRASPING);
                    debug!(closed = self.closed, "control: grasp toggle latched");
                }
                Some(outcome)
            }
            Binding::Activate | Binding::Deactivate | Binding::Toggle => None,
        }
    }
}

pub fn step(action: GraspAction, hand: Hand, ctx: &mut SimContext) -> StepOutcome {
    let Some(robot) = ctx.robot else {
        return StepOutcome::Unavailable;
    };
    let Some(direction) = finger_direction(robot) else {
        return StepOutcome::Unavailable;
    };
    let Some(gap) = ctx.services.pose.finger_gap(robot) else {
        return StepOutcome::Unavailable;
    };

    let (left, right) = match action {
        GraspAction::Open if gap <= FINGER_OPEN_LIMIT_M => {
            (FINGER_STEP_M, direction * -FINGER_STEP_M)
        }
        GraspAction::Close if gap >= FINGER_CLOSE_LIMIT_M && !ctx.grasped => {
            (-FINGER_STEP_M, direction * FINGER_STEP_M)
        }
        _ => return StepOutcome::Complete,
    };
    ctx.services.fingers.translate(left, right);
    ctx.services
        .haptics
        .pulse(hand, GRASP_PULSE_INTENSITY, GRASP_PULSE_MS);
    StepOutcome::Moved
}

fn parse_mode(mode: &str) -> CoreResult<GraspMode> {
    GraspMode::from_name(mode).ok_or_else(|| CoreError::invalid_mode(GRASPING, mode))
}

#[cfg(test)]
#[path = "tests/grasping_tests.rs"]
mod tests;
