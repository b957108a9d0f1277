use control::{services::Instructions, Condition, SimContext};
use fsm::{StateMachine, StateMachineBuilder, Target, TransitionDef, IDLE};
use shared::{
    domain::{ButtonEvent, Hand, RobotKind},
    error::CoreResult,
    protocol::{FrameInfo, TaskSample, TelemetryRecord},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    objects::{load_objects, AssetLoader, ObjectSet},
    telemetry::TelemetryBuffer,
    tuning::DEFAULT_TELEMETRY_BUFFER,
};

pub const ROUND_DONE: &str = "DONE";

pub trait TaskBehavior: Send {
    fn kind(&self) -> &'static str;

    fn title(&self) -> &'static str;

    fn default_text(&self) -> &'static str;

    fn object_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn setup(&mut self, _ctx: &mut SimContext, _objects: &mut ObjectSet) {}

    fn teardown(&mut self, _ctx: &mut SimContext, _objects: &mut ObjectSet) {}

    fn on_start(&mut self, round: usize, ctx: &mut SimContext, objects: &mut ObjectSet);

    fn on_stop(&mut self, _round: usize, _ctx: &mut SimContext, _objects: &mut ObjectSet) {}

    /// Per-frame scene logic. Returns the round's completion predicate; a
    /// missing object or pose makes it false for the frame.
    fn on_update(&mut self, frame: &FrameInfo, ctx: &mut SimContext, objects: &mut ObjectSet)
        -> bool;

    fn detail(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

#[derive(Debug, Clone)]
pub struct TaskOptions {
    pub label: Option<String>,
    pub rounds: usize,
    pub robot: Option<RobotKind>,
    pub text: Option<String>,
    pub buffer_size: usize,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            label: None,
            rounds: 1,
            robot: None,
            text: None,
            buffer_size: DEFAULT_TELEMETRY_BUFFER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Round(usize),
    Completed,
}

pub struct Task {
    id: Uuid,
    label: String,
    condition: Condition,
    num_rounds: usize,
    rounds: StateMachine,
    behavior: Box<dyn TaskBehavior>,
    objects: ObjectSet,
    robot: Option<RobotKind>,
    text: Option<String>,
    telemetry: TelemetryBuffer,
    predicate_held: bool,
    round_started_ms: u64,
}

fn round_machine(num_rounds: usize) -> CoreResult<StateMachine> {
    let mut builder = StateMachineBuilder::new(IDLE);
    builder
        .transition(TransitionDef::new("start", IDLE, "0"))?
        .transition(TransitionDef::new(
            "next",
            "*",
            Target::computed(move |state| {
                let round: usize = state.parse().ok()?;
                if round + 1 < num_rounds {
                    Some((round + 1).to_string())
                } else {
                    Some(ROUND_DONE.to_string())
                }
            }),
        ))?
        .transition(TransitionDef::new(
            "previous",
            "*",
            Target::computed(|state| {
                let round: usize = state.parse().ok()?;
                round.checked_sub(1).map(|previous| previous.to_string())
            }),
        ))?
        .transition(TransitionDef::new("stop", "*", IDLE))?;
    builder.build()
}

impl Task {
    pub fn new(
        behavior: Box<dyn TaskBehavior>,
        condition: Condition,
        objects: ObjectSet,
        options: TaskOptions,
    ) -> CoreResult<Self> {
        let num_rounds = options.rounds.max(1);
        Ok(Self {
            id: Uuid::new_v4(),
            label: options
                .label
                .unwrap_or_else(|| behavior.kind().to_string()),
            condition,
            num_rounds,
            rounds: round_machine(num_rounds)?,
            behavior,
            objects,
            robot: options.robot,
            text: options.text,
            telemetry: TelemetryBuffer::new(options.buffer_size),
            predicate_held: false,
            round_started_ms: 0,
        })
    }

    pub async fn load(
        loader: &dyn AssetLoader,
        behavior: Box<dyn TaskBehavior>,
        condition: Condition,
        options: TaskOptions,
    ) -> anyhow::Result<Self> {
        let objects = load_objects(loader, &behavior.object_names()).await?;
        Ok(Self::new(behavior, condition, objects, options)?)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &'static str {
        self.behavior.kind()
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn num_rounds(&self) -> usize {
        self.num_rounds
    }

    pub fn round(&self) -> Option<usize> {
        self.rounds.index()
    }

    pub fn round_state(&self) -> &str {
        self.rounds.state()
    }

    pub fn is_active(&self) -> bool {
        !self.rounds.is(IDLE)
    }

    pub fn is_completed(&self) -> bool {
        self.rounds.is(ROUND_DONE)
    }

    pub fn objects(&self) -> &ObjectSet {
        &self.objects
    }

    pub fn start(&mut self, ctx: &mut SimContext) -> CoreResult<()> {
        if let Some(robot) = self.robot {
            ctx.robot = Some(robot);
        }
        self.rounds.fire("start")?;
        if let Err(err) = self.condition.load(ctx) {
            self.rounds.fire("stop")?;
            return Err(err);
        }
        self.predicate_held = false;
        self.behavior.setup(ctx, &mut self.objects);
        ctx.services.scene.show_instructions(&self.instructions());
        info!(task = %self.label, id = %self.id, rounds = self.num_rounds, "task: started");
        self.begin_round(0, ctx);
        Ok(())
    }

    pub fn next(&mut self, ctx: &mut SimContext) -> CoreResult<RoundOutcome> {
        let fired = self.rounds.fire("next")?;
        if let Ok(round) = fired.from.parse() {
            self.end_round(round, ctx);
        }
        match fired.to.parse() {
            Ok(round) => {
                self.begin_round(round, ctx);
                Ok(RoundOutcome::Round(round))
            }
            Err(_) => {
                info!(task = %self.label, "task: all rounds complete");
                Ok(RoundOutcome::Completed)
            }
        }
    }

    pub fn previous(&mut self, ctx: &mut SimContext) -> CoreResult<usize> {
        let fired = self.rounds.fire("previous")?;
        if let Ok(round) = fired.from.parse() {
            self.end_round(round, ctx);
        }
        let round = fired.to.parse().unwrap_or_default();
        self.begin_round(round, ctx);
        Ok(round)
    }

    pub fn stop(&mut self, ctx: &mut SimContext) {
        if !self.is_active() {
            return;
        }
        if let Some(round) = self.round() {
            self.end_round(round, ctx);
        }
        if let Err(err) = self.rounds.fire("stop") {
            debug!(task = %self.label, error = %err, "task: stop refused");
        }
        self.behavior.teardown(ctx, &mut self.objects);
        ctx.services.scene.hide_instructions();
        self.flush(ctx);
        self.condition.unload(ctx);
        info!(task = %self.label, id = %self.id, "task: stopped");
    }

    pub fn update(&mut self, frame: &FrameInfo, ctx: &mut SimContext) -> Option<RoundOutcome> {
        self.round()?;
        self.condition.update(frame, ctx);
        let complete = self.behavior.on_update(frame, ctx, &mut self.objects);
        let rising = complete && !self.predicate_held;
        self.predicate_held = complete;
        if !rising {
            return None;
        }
        match self.next(ctx) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                debug!(task = %self.label, error = %err, "task: advance refused");
                None
            }
        }
    }

    pub fn log(&mut self, now_ms: u64, ctx: &mut SimContext) {
        let Some(round) = self.round() else {
            return;
        };
        let sample = TaskSample {
            task_id: self.id,
            task: self.label.clone(),
            condition: self.condition.name().to_string(),
            round,
            timestamp_ms: now_ms,
            controller: ctx.services.input.pose(Hand::Right),
            end_effector: ctx.current_ee(),
            goal: ctx.absolute_goal(),
            detail: self.behavior.detail(),
        };
        if let Some(batch) = self.telemetry.push(sample) {
            ctx.services.telemetry.publish(batch);
        }
    }

    pub fn handle_button(&mut self, event: ButtonEvent, ctx: &mut SimContext) -> CoreResult<()> {
        self.condition.handle_button(event, ctx)
    }

    fn flush(&mut self, ctx: &mut SimContext) {
        if let Some(batch) = self.telemetry.drain() {
            ctx.services.telemetry.publish(batch);
        }
    }

    fn instructions(&self) -> Instructions {
        let text = self.text.as_deref().unwrap_or(self.behavior.default_text());
        Instructions {
            title: self.behavior.title().to_string(),
            body: format!("{text}{}", self.condition.instructions()),
        }
    }

    fn begin_round(&mut self, round: usize, ctx: &mut SimContext) {
        self.round_started_ms = ctx.now_ms();
        self.behavior.on_start(round, ctx, &mut self.objects);
        ctx.services
            .scene
            .set_trial_counter(round + 1, self.num_rounds);
        info!(task = %self.label, round, "task: round started");
    }

    fn end_round(&mut self, round: usize, ctx: &mut SimContext) {
        self.behavior.on_stop(round, ctx, &mut self.objects);
        self.condition.reset(ctx);
        ctx.services.telemetry.publish(TelemetryRecord::RoundFinished {
            task_id: self.id,
            task: self.label.clone(),
            round,
            duration_ms: ctx.now_ms().saturating_sub(self.round_started_ms),
        });
    }
}

#[cfg(test)]
#[path = "tests/task_tests.rs"]
mod tests;
