use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError};
use shared::protocol::SessionInput;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::{controller::SessionController, settings::Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    Finished,
    InputClosed,
    TimedOut,
}

pub async fn run(
    session: &mut SessionController,
    inputs: Receiver<SessionInput>,
    settings: &Settings,
    limit: Option<Duration>,
) -> anyhow::Result<RunExit> {
    session.start()?;

    let tick = |ms: u64| {
        let mut ticker = interval(Duration::from_millis(ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    };
    let mut logic = tick(settings.logic_tick_ms);
    let mut physics = tick(settings.physics_tick_ms);
    let mut render = tick(settings.render_tick_ms);

    let started = Instant::now();
    let deadline = tokio::time::sleep(limit.unwrap_or(Duration::MAX));
    tokio::pin!(deadline);
    let elapsed_ms = || started.elapsed().as_millis() as u64;

    info!(
        logic_ms = settings.logic_tick_ms,
        physics_ms = settings.physics_tick_ms,
        render_ms = settings.render_tick_ms,
        "session: running"
    );

    let exit = loop {
        tokio::select! {
            _ = logic.tick() => {
                if drain_inputs(&inputs, session) {
                    session.stop();
                    break RunExit::InputClosed;
                }
                if session.is_running() {
                    session.tick(elapsed_ms());
                }
                if !session.is_running() {
                    break RunExit::Finished;
                }
            }
            _ = physics.tick() => session.physics_tick(settings.physics_tick_ms),
            _ = render.tick() => session.render_tick(elapsed_ms()),
            _ = &mut deadline, if limit.is_some() => {
                session.stop();
                break RunExit::TimedOut;
            }
        }
    };
    info!(?exit, elapsed_ms = elapsed_ms(), "session: run finished");
    Ok(exit)
}

fn drain_inputs(inputs: &Receiver<SessionInput>, session: &mut SessionController) -> bool {
    loop {
        match inputs.try_recv() {
            Ok(input) => {
                debug!(?input, "session: input");
                session.handle_input(input);
            }
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => return true,
        }
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
