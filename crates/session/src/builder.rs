use anyhow::Context;
use control::{ArmControl, ArmKind, Condition, Grasping, Services, SimContext};
use shared::error::CoreResult;
use tasks::{
    AssetLoader, Drawing, End, Erasing, Pouring, Task, TaskBehavior, TaskOptions, Tutorial,
};
use tracing::info;

use crate::{
    controller::SessionController,
    settings::{ArmModuleKind, ArmSettings, ConditionSettings, Settings, TaskKind, TaskSettings},
};

fn arm_kind(kind: ArmModuleKind) -> ArmKind {
    match kind {
        ArmModuleKind::DragControl => ArmKind::Drag,
        ArmModuleKind::RemoteControl => ArmKind::Remote,
        ArmModuleKind::RedirectedControl => ArmKind::Redirected,
    }
}

fn build_arm(arm: &ArmSettings, condition: &ConditionSettings, settings: &Settings) -> CoreResult<ArmControl> {
    Ok(ArmControl::new(arm_kind(arm.kind), &arm.mode)?
        .with_activation_radius(settings.activation_radius_m)
        .with_cooldown(settings.reactivation_cooldown_ms)
        .with_offset_indicator(condition.show_offset_indicator))
}

pub fn build_condition(condition: &ConditionSettings, settings: &Settings) -> CoreResult<Condition> {
    let mut builder =
        Condition::builder(condition.name.clone()).module(build_arm(&condition.primary, condition, settings)?);
    if let Some(first_person) = &condition.first_person {
        builder = builder.first_person(build_arm(first_person, condition, settings)?);
    }
    if let Some(mode) = &condition.grasping {
        builder = builder.module(Grasping::new(mode)?);
    }
    builder.build()
}

fn build_behavior(task: &TaskSettings) -> Box<dyn TaskBehavior> {
    match task.kind {
        TaskKind::Drawing => {
            let mut options = task.drawing.clone();
            if let Some(robot_controlled) = task.robot_controlled {
                options.robot_controlled = robot_controlled;
            }
            Box::new(Drawing::new(options))
        }
        TaskKind::Erasing => {
            let mut options = task.erasing.clone();
            if let Some(robot_controlled) = task.robot_controlled {
                options.robot_controlled = robot_controlled;
            }
            Box::new(Erasing::new(options))
        }
        TaskKind::Pouring => Box::new(Pouring::new(task.pouring.clone())),
        TaskKind::Tutorial => Box::new(Tutorial::new()),
        TaskKind::End => Box::new(End),
    }
}

pub async fn build_task(
    task: &TaskSettings,
    settings: &Settings,
    loader: &dyn AssetLoader,
) -> anyhow::Result<Task> {
    let condition = build_condition(&task.condition, settings)
        .with_context(|| format!("invalid condition '{}'", task.condition.name))?;
    let options = TaskOptions {
        label: task.label.clone(),
        rounds: task.rounds,
        robot: task.robot.or(settings.robot),
        text: task.text.clone(),
        buffer_size: settings.telemetry_buffer,
    };
    Task::load(loader, build_behavior(task), condition, options).await
}

pub async fn build_session(
    settings: &Settings,
    loader: &dyn AssetLoader,
    services: Services,
) -> anyhow::Result<SessionController> {
    anyhow::ensure!(!settings.tasks.is_empty(), "no tasks configured");

    let mut tasks = Vec::with_capacity(settings.tasks.len());
    for (index, task) in settings.tasks.iter().enumerate() {
        let task = build_task(task, settings, loader)
            .await
            .with_context(|| format!("failed to build task {index}"))?;
        tasks.push(task);
    }

    let mut ctx = SimContext::new(services);
    ctx.robot = settings.robot;
    ctx.first_person = settings.start_first_person;

    let session = SessionController::new(ctx, tasks)?;
    info!(tasks = session.task_count(), "session: built");
    Ok(session)
}

#[cfg(test)]
#[path = "tests/builder_tests.rs"]
mod tests;
