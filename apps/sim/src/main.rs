use std::{path::PathBuf, thread, time::Duration};

use anyhow::Result;
use clap::Parser;
use control::SimRig;
use crossbeam_channel::{bounded, Sender, TrySendError};
use session::{build_session, load_settings, run};
use shared::{
    domain::{ButtonEvent, Hand, Pose},
    protocol::SessionInput,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; `teleop.toml` in the working directory when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log_filter: String,
    /// Stop the session after this long.
    #[arg(long)]
    duration_ms: Option<u64>,
    /// Period of the scripted `Continue` press. Zero disables it.
    #[arg(long, default_value_t = 2_000)]
    continue_every_ms: u64,
}

const OPERATOR_STEP_MS: u64 = 10;
const CIRCLE_RADIUS_M: f64 = 0.05;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = load_settings(args.config.as_deref())?;
    let rig = SimRig::new();
    rig.set_controller(Hand::Right, Pose::at(0.3, 1.0, 0.2));
    let mut session = build_session(&settings, &rig, rig.services()).await?;

    let (tx, rx) = bounded(64);
    {
        let rig = rig.clone();
        let period = args.continue_every_ms;
        thread::spawn(move || operate(rig, tx, period));
    }

    let exit = run(
        &mut session,
        rx,
        &settings,
        args.duration_ms.map(Duration::from_millis),
    )
    .await?;

    let state = rig.state();
    info!(
        ?exit,
        telemetry_records = state.telemetry.len(),
        ik_calls = state.ik_calls.len(),
        environment_reloads = state.environment_reloads,
        "sim: done"
    );
    Ok(())
}

fn operate(rig: SimRig, tx: Sender<SessionInput>, continue_every_ms: u64) {
    let send = |input| match tx.try_send(input) {
        Ok(()) | Err(TrySendError::Full(_)) => true,
        Err(TrySendError::Disconnected(_)) => false,
    };
    if !send(SessionInput::Button(ButtonEvent::GripStart)) {
        return;
    }

    let mut elapsed_ms = 0;
    loop {
        thread::sleep(Duration::from_millis(OPERATOR_STEP_MS));
        elapsed_ms += OPERATOR_STEP_MS;

        let angle = elapsed_ms as f64 / 1_000.0;
        rig.set_controller(
            Hand::Right,
            Pose::at(
                0.3 + CIRCLE_RADIUS_M * angle.cos(),
                1.0 + CIRCLE_RADIUS_M * angle.sin(),
                0.2,
            ),
        );

        let press = continue_every_ms > 0 && elapsed_ms % continue_every_ms == 0;
        if press && !send(SessionInput::Continue) {
            return;
        }
    }
}
