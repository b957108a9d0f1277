use std::f64::consts::TAU;

use fsm::{StateMachineBuilder, TransitionDef, IDLE};
use nalgebra::UnitQuaternion;
use shared::{
    domain::{Activation, ArmMode, CueColor, Hand},
    error::{CoreError, CoreResult},
    protocol::FrameInfo,
};
use tracing::{debug, info};

use crate::{
    bindings::{Binding, ButtonBindings},
    context::SimContext,
    services::OffsetSegment,
    tuning::{
        redirect_correction, ACTIVATION_PULSE_INTENSITY, ACTIVATION_PULSE_MS, CLICK_CLIP,
        DEFAULT_ACTIVATION_RADIUS_M, DEFAULT_REACTIVATION_COOLDOWN_MS,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmKind {
    Drag,
    Remote,
    Redirected,
}

impl ArmKind {
    pub fn name(&self) -> &'static str {
        match self {
            ArmKind::Drag => "drag-control",
            ArmKind::Remote => "remote-control",
            ArmKind::Redirected => "redirected-control",
        }
    }

    pub fn active_state(&self) -> &'static str {
        match self {
            ArmKind::Drag => "DRAG_CONTROL",
            ArmKind::Remote => "REMOTE_CONTROL",
            ArmKind::Redirected => "REDIRECTED_CONTROL",
        }
    }

    pub fn activate_event(&self) -> &'static str {
        match self {
            ArmKind::Drag => "activate-drag-control",
            ArmKind::Remote => "activate-remote-control",
            ArmKind::Redirected => "activate-redirected-control",
        }
    }

    pub fn deactivate_event(&self) -> &'static str {
        match self {
            ArmKind::Drag => "deactivate-drag-control",
            ArmKind::Remote => "deactivate-remote-control",
            ArmKind::Redirected => "deactivate-redirected-control",
        }
    }

    pub fn supports(&self, mode: ArmMode) -> bool {
        match self {
            ArmKind::Drag => true,
            ArmKind::Remote | ArmKind::Redirected => mode.activation() != Activation::Auto,
        }
    }

    fn has_proximity_gate(&self) -> bool {
        matches!(self, ArmKind::Drag)
    }
}

#[derive(Debug, Clone)]
pub struct ArmControl {
    kind: ArmKind,
    mode: ArmMode,
    disabled: bool,
    activation_radius_m: f64,
    show_offset_indicator: bool,
    cooldown_ms: u64,
    cooldown_until: Option<u64>,
    correction: UnitQuaternion<f64>,
    hand: Hand,
    bound: bool,
}

impl ArmControl {
    pub fn new(kind: ArmKind, mode: &str) -> CoreResult<Self> {
        let mode = parse_mode(kind, mode)?;
        Ok(Self {
            kind,
            mode,
            disabled: false,
            activation_radius_m: DEFAULT_ACTIVATION_RADIUS_M,
            show_offset_indicator: true,
            cooldown_ms: DEFAULT_REACTIVATION_COOLDOWN_MS,
            cooldown_until: None,
            correction: redirect_correction(),
            hand: Hand::Right,
            bound: false,
        })
    }

    pub fn with_activation_radius(mut self, radius_m: f64) -> Self {
        self.activation_radius_m = radius_m;
        self
    }

    pub fn with_offset_indicator(mut self, show: bool) -> Self {
        self.show_offset_indicator = show;
        self
    }

    pub fn with_cooldown(mut self, cooldown_ms: u64) -> Self {
        self.cooldown_ms = cooldown_ms;
        self
    }

    pub fn with_correction(mut self, correction: UnitQuaternion<f64>) -> Self {
        self.correction = correction;
        self
    }

    pub fn kind(&self) -> ArmKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn mode(&self) -> ArmMode {
        self.mode
    }

    pub fn active_state(&self) -> &'static str {
        self.kind.active_state()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub(crate) fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn set_mode(&mut self, mode: &str, bindings: &mut ButtonBindings) -> CoreResult<()> {
        let mode = parse_mode(self.kind, mode)?;
        self.mode = mode;
        if self.bound {
            self.bind(bindings);
        }
        info!(module = self.name(), mode = %mode, "control: mode set");
        Ok(())
    }

    pub fn bind(&mut self, bindings: &mut ButtonBindings) {
        let owner = self.name();
        bindings.remove_owner(owner);
        let button = self.mode.button();
        match self.mode.activation() {
            Activation::Hold => {
                bindings.add(button.start(), owner, Binding::Activate);
                bindings.add(button.end(), owner, Binding::Deactivate);
            }
            Activation::Toggle => {
                bindings.add(button.press(), owner, Binding::Toggle);
            }
            Activation::Auto => {
                bindings.add(button.press(), owner, Binding::Deactivate);
            }
        }
        self.bound = true;
    }

    pub fn unbind(&mut self, bindings: &mut ButtonBindings) {
        bindings.remove_owner(self.name());
        self.bound = false;
    }

    pub fn contribute(&self, builder: &mut StateMachineBuilder) -> CoreResult<()> {
        builder
            .transition(
                TransitionDef::new(self.kind.activate_event(), IDLE, self.active_state())
                    .owned_by(self.name()),
            )?
            .transition(
                TransitionDef::new(self.kind.deactivate_event(), self.active_state(), IDLE)
                    .owned_by(self.name()),
            )?;
        Ok(())
    }

    pub fn instructions(&self) -> &'static str {
        match (self.kind, self.mode) {
            (ArmKind::Drag, ArmMode::GripHold) => "Activate: Move the controller to the gripper and hold the grip button\nDeactivate: Release the grip button.",
            (ArmKind::Drag, ArmMode::GripToggle) => "Activate: Move the controller to the gripper and press the grip button\nDeactivate: Press the grip button.",
            (ArmKind::Drag, ArmMode::GripAuto) => "Activate: Move the controller to the gripper.\nDeactivate: Press the grip button.",
            (ArmKind::Drag, ArmMode::TriggerHold) => "Activate: Move the controller to the gripper, then squeeze and hold the trigger.\nDeactivate: Release the trigger.",
            (ArmKind::Drag, ArmMode::TriggerToggle) => "Activate: Move the controller to the gripper and squeeze the trigger.\nDeactivate: Squeeze the trigger again.",
            (ArmKind::Drag, ArmMode::TriggerAuto) => "Activate: Move the controller to the gripper.\nDeactivate: Squeeze the trigger.",
            (_, ArmMode::GripHold) => "Activate: Press and hold the grip button.\nDeactivate: Release the grip button.",
            (_, ArmMode::GripToggle) => "Activate: Press the grip button.\nDeactivate: Press the grip button again.",
            (_, ArmMode::TriggerHold) => "Activate: Squeeze and hold the trigger.\nDeactivate: Release the trigger.",
            (_, ArmMode::TriggerToggle) => "Activate: Squeeze the trigger.\nDeactivate: Squeeze the trigger again.",
            // Remote and redirected control never hold an auto mode.
            (_, ArmMode::GripAuto | ArmMode::TriggerAuto) => "",
        }
    }

    pub fn on_button(&self, binding: Binding, state: &str, ctx: &SimContext) -> Option<&'static str> {
        if self.disabled {
            return None;
        }
        let active = state == self.active_state();
        match binding {
            Binding::Activate if state == IDLE && self.in_reach(ctx) => {
                Some(self.kind.activate_event())
            }
            Binding::Deactivate if active => Some(self.kind.deactivate_event()),
            Binding::Toggle if state == IDLE && self.in_reach(ctx) => {
                Some(self.kind.activate_event())
            }
            Binding::Toggle if active => Some(self.kind.deactivate_event()),
            _ => None,
        }
    }

    pub fn release_event(&self, state: &str) -> Option<&'static str> {
        (state == self.active_state()).then(|| self.kind.deactivate_event())
    }

    pub fn poll_activation(
        &self,
        frame: &FrameInfo,
        state: &str,
        now_ms: u64,
    ) -> Option<&'static str> {
        if self.disabled
            || self.mode.activation() != Activation::Auto
            || state != IDLE
            || self.cooling_down(now_ms)
        {
            return None;
        }
        let ee = frame.current_ee_pose?;
        (frame.controller_pose.distance_to(&ee) <= self.activation_radius_m)
            .then(|| self.kind.activate_event())
    }

    pub fn on_enter(&mut self, ctx: &mut SimContext) {
        ctx.services.audio.play(CLICK_CLIP);
        ctx.services
            .haptics
            .pulse(self.hand, ACTIVATION_PULSE_INTENSITY, ACTIVATION_PULSE_MS);
        if self.kind == ArmKind::Drag {
            ctx.services.scene.set_grip_visible(self.hand, false);
        }
        info!(module = self.name(), "control: activated");
    }

    pub fn on_exit(&mut self, ctx: &mut SimContext) {
        if self.kind == ArmKind::Drag {
            ctx.services.scene.set_grip_visible(self.hand, true);
        }
        ctx.services.scene.set_cursor_color(CueColor::Neutral);
        ctx.services.scene.set_offset_indicator(None);
        self.cooldown_until = Some(ctx.now_ms() + self.cooldown_ms);
        info!(module = self.name(), "control: deactivated");
    }

    pub fn integrate(&self, frame: &FrameInfo, ctx: &mut SimContext) {
        if self.disabled {
            return;
        }
        let Some((translation, rotation)) = frame.controller_delta() else {
            return;
        };
        let controller = frame.controller_pose;
        let initial = ctx.initial_ee();
        let kind = self.kind;
        let correction = self.correction;
        let written = ctx.write_goal(self.name(), |goal| {
            match kind {
                ArmKind::Drag => goal.position = controller.position - initial.position,
                ArmKind::Remote | ArmKind::Redirected => goal.position += translation,
            }
            goal.orientation = rotation * goal.orientation;

            if kind == ArmKind::Redirected {
                let factor = rotation.angle() / TAU;
                let aligned = controller.orientation * correction;
                if let Some(blended) = goal.orientation.try_slerp(&aligned, factor, 1e-9) {
                    goal.orientation = blended;
                }
            }
        });
        if let Err(err) = written {
            debug!(module = self.name(), error = %err, "control: goal not written");
            return;
        }

        if self.show_offset_indicator {
            self.update_offset_indicator(frame, ctx);
        }
    }

    fn update_offset_indicator(&self, frame: &FrameInfo, ctx: &mut SimContext) {
        let Some(ee) = frame.current_ee_pose else {
            return;
        };
        let cursor = ctx.adjusted_goal().position;
        let color = CueColor::for_offset((ee.position - cursor).norm());
        ctx.services.scene.set_offset_indicator(Some(OffsetSegment {
            from: ee.position,
            to: cursor,
            color,
        }));
        ctx.services.scene.set_cursor_color(color);
    }

    fn cooling_down(&self, now_ms: u64) -> bool {
        self.cooldown_until.is_some_and(|until| now_ms < until)
    }

    fn in_reach(&self, ctx: &SimContext) -> bool {
        if !self.kind.has_proximity_gate() {
            return true;
        }
        let (Some(controller), Some(ee)) = (ctx.services.input.pose(self.hand), ctx.current_ee())
        else {
            return false;
        };
        controller.distance_to(&ee) <= self.activation_radius_m
    }
}

fn parse_mode(kind: ArmKind, mode: &str) -> CoreResult<ArmMode> {
    ArmMode::from_name(mode)
        .filter(|parsed| kind.supports(*parsed))
        .ok_or_else(|| CoreError::invalid_mode(kind.name(), mode))
}

#[cfg(test)]
#[path = "tests/arm_tests.rs"]
mod tests;
