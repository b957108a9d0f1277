use control::{
    robot::{drive_goal, reset_robot},
    SimContext,
};
use fsm::{Fired, StateMachine, StateMachineBuilder, Target, TransitionDef, IDLE};
use shared::{
    domain::{Hand, Pose},
    error::{CoreError, CoreResult},
    protocol::{FrameInfo, SessionInput},
};
use tasks::{RoundOutcome, Task};
use tracing::{debug, info, warn};

pub struct SessionController {
    ctx: SimContext,
    tasks: Vec<Task>,
    fsm: StateMachine,
    previous_controller: Option<Pose>,
}

fn session_machine(task_count: usize) -> CoreResult<StateMachine> {
    let mut builder = StateMachineBuilder::new(IDLE);
    builder
        .transition(TransitionDef::new("start", IDLE, "0"))?
        .transition(TransitionDef::new(
            "next",
            "*",
            Target::computed(move |state| {
                let index: usize = state.parse().ok()?;
                if index + 1 < task_count {
                    Some((index + 1).to_string())
                } else {
                    Some(IDLE.to_string())
                }
            }),
        ))?
        .transition(TransitionDef::new(
            "previous",
            "*",
            Target::computed(|state| {
                let index: usize = state.parse().ok()?;
                index.checked_sub(1).map(|previous| previous.to_string())
            }),
        ))?
        .transition(TransitionDef::new("stop", "*", IDLE))?;
    builder.build()
}

impl SessionController {
    pub fn new(ctx: SimContext, tasks: Vec<Task>) -> CoreResult<Self> {
        if tasks.is_empty() {
            return Err(CoreError::EmptySession);
        }
        Ok(Self {
            fsm: session_machine(tasks.len())?,
            ctx,
            tasks,
            previous_controller: None,
        })
    }

    pub fn state(&self) -> &str {
        self.fsm.state()
    }

    pub fn is_running(&self) -> bool {
        !self.fsm.is(IDLE)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn current_index(&self) -> Option<usize> {
        self.fsm.index()
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.current_index().and_then(|index| self.tasks.get(index))
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SimContext {
        &mut self.ctx
    }

    pub fn start(&mut self) -> CoreResult<()> {
        let fired = self.fsm.fire("start")?;
        self.ctx.capture_initial_pose();
        self.enter(&fired)
    }

    pub fn next(&mut self) -> CoreResult<()> {
        let fired = self.fsm.fire("next")?;
        self.leave(&fired);
        if fired.to == IDLE {
            self.finish();
            return Ok(());
        }
        self.enter(&fired)
    }

    pub fn previous(&mut self) -> CoreResult<()> {
        let fired = self.fsm.fire("previous")?;
        self.leave(&fired);
        self.enter(&fired)
    }

    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        match self.fsm.fire("stop") {
            Ok(fired) => {
                self.leave(&fired);
                info!(from = %fired.from, "session: stopped");
            }
            Err(err) => debug!(error = %err, "session: stop refused"),
        }
    }

    pub fn update(&mut self, frame: &FrameInfo) {
        let Some(task) = self.current_index().and_then(|index| self.tasks.get_mut(index)) else {
            return;
        };
        self.ctx.set_now(frame.timestamp_ms);

        let outcome = task.update(frame, &mut self.ctx);
        task.log(frame.timestamp_ms, &mut self.ctx);

        if outcome == Some(RoundOutcome::Completed) {
            if let Err(err) = self.next() {
                warn!(error = %err, "session: could not advance after task completion");
            }
        }
        if self.is_running() {
            drive_goal(&mut self.ctx);
        }
    }

    pub fn tick(&mut self, now_ms: u64) {
        let Some(controller) = self.ctx.services.input.pose(Hand::Right) else {
            debug!(now_ms, "session: controller not tracked, skipping tick");
            return;
        };
        let mut frame = FrameInfo::new(controller, self.ctx.current_ee(), now_ms);
        if let Some(previous) = self.previous_controller {
            frame = frame.with_previous(previous);
        }
        self.previous_controller = Some(controller);
        self.update(&frame);
    }

    pub fn handle_input(&mut self, input: SessionInput) {
        match input {
            SessionInput::Continue => self.continue_task(),
            SessionInput::ResetRobot => reset_robot(&mut self.ctx),
            SessionInput::Button(event) => {
                let Some(task) = self.current_index().and_then(|index| self.tasks.get_mut(index))
                else {
                    return;
                };
                if let Err(err) = task.handle_button(event, &mut self.ctx) {
                    debug!(error = %err, %event, "session: button ignored");
                }
            }
            SessionInput::FirstPerson(first_person) => {
                if self.ctx.first_person != first_person {
                    info!(first_person, "session: perspective changed");
                }
                self.ctx.first_person = first_person;
            }
            SessionInput::Stop => self.stop(),
        }
    }

    pub fn physics_tick(&mut self, dt_ms: u64) {
        self.ctx.services.physics.step(dt_ms);
    }

    pub fn render_tick(&mut self, now_ms: u64) {
        self.ctx.services.render.render(now_ms);
    }

    fn continue_task(&mut self) {
        let Some(task) = self.current_index().and_then(|index| self.tasks.get_mut(index)) else {
            return;
        };
        match task.next(&mut self.ctx) {
            Ok(RoundOutcome::Completed) => {
                if let Err(err) = self.next() {
                    warn!(error = %err, "session: could not advance after task completion");
                }
            }
            Ok(RoundOutcome::Round(round)) => debug!(round, "session: round skipped"),
            Err(err) => debug!(error = %err, "session: continue ignored"),
        }
    }

    fn leave(&mut self, fired: &Fired) {
        if let Some(task) = fired
            .from
            .parse::<usize>()
            .ok()
            .and_then(|index| self.tasks.get_mut(index))
        {
            task.stop(&mut self.ctx);
        }
    }

    fn enter(&mut self, fired: &Fired) -> CoreResult<()> {
        let Some(task) = fired
            .to
            .parse::<usize>()
            .ok()
            .and_then(|index| self.tasks.get_mut(index))
        else {
            return Ok(());
        };
        info!(task = %task.label(), index = %fired.to, "session: task started");
        if let Err(err) = task.start(&mut self.ctx) {
            // Nothing is active on the failed task; leave the session idle.
            self.fsm.fire("stop")?;
            return Err(err);
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.ctx.services.scene.reload_environment();
        reset_robot(&mut self.ctx);
        info!("session: complete");
    }
}
