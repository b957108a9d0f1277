use std::iter;

use fsm::{Fired, StateMachine, StateMachineBuilder, TransitionDef, IDLE};
use shared::{
    domain::ButtonEvent,
    error::{CoreError, CoreResult},
    protocol::FrameInfo,
};
use tracing::{debug, info};

use crate::{
    arm::ArmControl, bindings::Binding, context::SimContext, grasping::Grasping,
    module::ControlModule,
};

const RESET_EVENT: &str = "reset";

pub struct ConditionBuilder {
    name: String,
    primary: Option<ArmControl>,
    first_person: Option<ArmControl>,
    grasping: Option<Grasping>,
    error: Option<CoreError>,
}

impl ConditionBuilder {
    pub fn module(mut self, module: impl Into<ControlModule>) -> Self {
        match module.into() {
            ControlModule::Arm(arm) => {
                if self.primary.is_some() {
                    self.fail("primary");
                } else {
                    self.primary = Some(arm);
                }
            }
            ControlModule::Grasping(grasping) => {
                if self.grasping.is_some() {
                    self.fail("grasping");
                } else {
                    self.grasping = Some(grasping);
                }
            }
        }
        self
    }

    pub fn first_person(mut self, arm: ArmControl) -> Self {
        if self.first_person.is_some() {
            self.fail("first-person");
        } else {
            self.first_person = Some(arm);
        }
        self
    }

    fn fail(&mut self, slot: &str) {
        self.error.get_or_insert(CoreError::SlotTaken {
            condition: self.name.clone(),
            slot: slot.to_string(),
        });
    }

    pub fn build(self) -> CoreResult<Condition> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let primary = self.primary.ok_or_else(|| CoreError::MissingModule {
            condition: self.name.clone(),
            slot: "primary".to_string(),
        })?;

        let mut names = vec![primary.name()];
        names.extend(self.first_person.as_ref().map(ArmControl::name));
        names.extend(self.grasping.as_ref().map(Grasping::name));
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(CoreError::DuplicateModule(name.to_string()));
            }
        }

        Ok(Condition {
            name: self.name,
            primary,
            first_person: self.first_person,
            grasping: self.grasping,
            fsm: None,
            first_person_active: false,
        })
    }
}

pub struct Condition {
    name: String,
    primary: ArmControl,
    first_person: Option<ArmControl>,
    grasping: Option<Grasping>,
    fsm: Option<StateMachine>,
    first_person_active: bool,
}

impl Condition {
    pub fn builder(name: impl Into<String>) -> ConditionBuilder {
        ConditionBuilder {
            name: name.into(),
            primary: None,
            first_person: None,
            grasping: None,
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_loaded(&self) -> bool {
        self.fsm.is_some()
    }

    pub fn state(&self) -> &str {
        self.fsm.as_ref().map_or(IDLE, StateMachine::state)
    }

    pub fn grasping(&self) -> Option<&Grasping> {
        self.grasping.as_ref()
    }

    pub fn modules(&self) -> Vec<ControlModule> {
        iter::once(self.primary.clone())
            .chain(self.first_person.clone())
            .map(ControlModule::from)
            .chain(self.grasping.clone().map(ControlModule::from))
            .collect()
    }

    pub fn active_arm(&self) -> &ArmControl {
        match (&self.first_person, self.first_person_active) {
            (Some(arm), true) => arm,
            _ => &self.primary,
        }
    }

    fn active_arm_mut(&mut self) -> &mut ArmControl {
        match (&mut self.first_person, self.first_person_active) {
            (Some(arm), true) => arm,
            _ => &mut self.primary,
        }
    }

    fn arms_mut(&mut self) -> impl Iterator<Item = &mut ArmControl> {
        iter::once(&mut self.primary).chain(self.first_person.as_mut())
    }

    pub fn instructions(&self) -> String {
        let mut lines = vec![self.active_arm().instructions()];
        lines.extend(self.grasping.as_ref().map(Grasping::instructions));
        lines.retain(|line| !line.is_empty());
        lines.join("\n")
    }

    pub fn load(&mut self, ctx: &mut SimContext) -> CoreResult<()> {
        if self.fsm.is_some() {
            return Ok(());
        }

        let mut builder = StateMachineBuilder::new(IDLE);
        if let Some(arm) = &self.first_person {
            arm.contribute(&mut builder)?;
        }
        self.primary.contribute(&mut builder)?;
        builder.transition(TransitionDef::new(RESET_EVENT, "*", IDLE).owned_by(self.name.clone()))?;
        self.fsm = Some(builder.build()?);

        self.first_person_active = ctx.first_person;
        if let Some(grasping) = &mut self.grasping {
            grasping.bind(&mut ctx.bindings);
        }
        self.active_arm_mut().bind(&mut ctx.bindings);

        info!(
            condition = %self.name,
            module = self.active_arm().name(),
            "condition: loaded"
        );
        Ok(())
    }

    pub fn unload(&mut self, ctx: &mut SimContext) {
        if self.fsm.is_none() {
            return;
        }
        self.reset(ctx);
        for arm in self.arms_mut() {
            arm.unbind(&mut ctx.bindings);
        }
        if let Some(grasping) = &mut self.grasping {
            grasping.unbind(&mut ctx.bindings);
        }
        self.fsm = None;
        info!(condition = %self.name, "condition: unloaded");
    }

    pub fn reset(&mut self, ctx: &mut SimContext) {
        if self.state() != IDLE {
            if let Err(err) = self.fire(RESET_EVENT, ctx) {
                debug!(condition = %self.name, error = %err, "condition: reset refused");
            }
        }
        if let Some(grasping) = &mut self.grasping {
            grasping.reset(&mut ctx.bindings);
        }
    }

    pub fn fire(&mut self, event: &str, ctx: &mut SimContext) -> CoreResult<Fired> {
        let fsm = self
            .fsm
            .as_mut()
            .ok_or_else(|| CoreError::NotLoaded(self.name.clone()))?;
        let fired = fsm.fire(event)?;
        for arm in self.arms_mut() {
            if arm.active_state() == fired.from {
                arm.on_exit(ctx);
            }
            if arm.active_state() == fired.to {
                arm.on_enter(ctx);
            }
        }
        info!(
            condition = %self.name,
            event = %fired.event,
            from = %fired.from,
            to = %fired.to,
            owner = ?fired.owner,
            "condition: transition"
        );
        Ok(fired)
    }

    pub fn handle_button(&mut self, event: ButtonEvent, ctx: &mut SimContext) -> CoreResult<()> {
        if self.fsm.is_none() {
            return Err(CoreError::NotLoaded(self.name.clone()));
        }
        for (owner, binding) in ctx.bindings.handlers(event) {
            if let Some(grasping) = self.grasping.as_mut().filter(|g| g.name() == owner) {
                grasping.handle(binding, ctx);
                continue;
            }
            if self.active_arm().name() != owner {
                continue;
            }
            self.dispatch_arm(binding, ctx);
        }
        Ok(())
    }

    fn dispatch_arm(&mut self, binding: Binding, ctx: &mut SimContext) {
        let state = self.state().to_string();
        let Some(event) = self.active_arm().on_button(binding, &state, ctx) else {
            return;
        };
        if let Err(err) = self.fire(event, ctx) {
            debug!(condition = %self.name, error = %err, "condition: button transition ignored");
        }
    }

    pub fn update(&mut self, frame: &FrameInfo, ctx: &mut SimContext) {
        if self.fsm.is_none() {
            return;
        }
        self.sync_perspective(ctx);

        let state = self.state().to_string();
        if let Some(event) = self.active_arm().poll_activation(frame, &state, ctx.now_ms()) {
            if let Err(err) = self.fire(event, ctx) {
                debug!(condition = %self.name, error = %err, "condition: auto activation ignored");
            }
        }
        if self.state() == self.active_arm().active_state() {
            self.active_arm().integrate(frame, ctx);
        }
    }

    /// Swaps the bound arm module when the first-person flag changed. The
    /// machine is returned to IDLE first so the outgoing module cannot stay
    /// active.
    fn sync_perspective(&mut self, ctx: &mut SimContext) {
        if self.first_person.is_none() || ctx.first_person == self.first_person_active {
            return;
        }
        self.reset(ctx);
        self.active_arm_mut().unbind(&mut ctx.bindings);
        self.first_person_active = ctx.first_person;
        self.active_arm_mut().bind(&mut ctx.bindings);
        info!(
            condition = %self.name,
            module = self.active_arm().name(),
            first_person = ctx.first_person,
            "condition: perspective switched"
        );
    }

    pub fn set_mode(&mut self, module: &str, mode: &str, ctx: &mut SimContext) -> CoreResult<()> {
        if let Some(grasping) = self.grasping.as_mut().filter(|g| g.name() == module) {
            return grasping.set_mode(mode, &mut ctx.bindings);
        }
        let arm = self
            .arms_mut()
            .find(|arm| arm.name() == module)
            .ok_or_else(|| CoreError::UnknownModule(module.to_string()))?;
        arm.set_mode(mode, &mut ctx.bindings)
    }

    pub fn disable_module(&mut self, module: &str, ctx: &mut SimContext) -> CoreResult<()> {
        if let Some(grasping) = self.grasping.as_mut().filter(|g| g.name() == module) {
            grasping.set_disabled(true);
            return Ok(());
        }
        let state = self.state().to_string();
        let release = self
            .arms_mut()
            .find(|arm| arm.name() == module)
            .ok_or_else(|| CoreError::UnknownModule(module.to_string()))?
            .release_event(&state);
        if let Some(event) = release {
            self.fire(event, ctx)?;
        }
        if let Some(arm) = self.arms_mut().find(|arm| arm.name() == module) {
            arm.set_disabled(true);
        }
        info!(condition = %self.name, module, "condition: module disabled");
        Ok(())
    }

    pub fn enable_module(&mut self, module: &str) -> CoreResult<()> {
        if let Some(grasping) = self.grasping.as_mut().filter(|g| g.name() == module) {
            grasping.set_disabled(false);
            return Ok(());
        }
        self.arms_mut()
            .find(|arm| arm.name() == module)
            .ok_or_else(|| CoreError::UnknownModule(module.to_string()))?
            .set_disabled(false);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/condition_tests.rs"]
mod tests;
