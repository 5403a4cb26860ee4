//! One-second countdown tick task

use std::{sync::Arc, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant},
};
use tracing::{debug, error, info};

use crate::state::{AppState, TickOutcome};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Owns the running tick task. Dropping the handle aborts the task, so
/// replacing or clearing it cancels the previous countdown.
#[derive(Debug)]
pub struct TickHandle {
    epoch: u64,
    task: JoinHandle<()>,
}

impl TickHandle {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            debug!("Cancelling tick task for run {}", self.epoch);
        }
        self.task.abort();
    }
}

/// Spawn the tick task for the run identified by `epoch`
pub fn spawn_countdown(state: Arc<AppState>, epoch: u64) -> TickHandle {
    let task = tokio::spawn(countdown_task(state, epoch));
    TickHandle { epoch, task }
}

/// Advance the engine once a second until the run completes, is paused or
/// is superseded by a newer run.
pub async fn countdown_task(state: Arc<AppState>, epoch: u64) {
    debug!("Starting tick task for run {}", epoch);

    let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);

    loop {
        interval.tick().await;

        match state.apply_tick(epoch) {
            Ok(Some(TickOutcome::Advanced)) => {}
            Ok(Some(TickOutcome::Completed)) => {
                info!("Run {} finished", epoch);
                break;
            }
            Ok(Some(TickOutcome::Idle)) => {
                debug!("Run {} no longer running, stopping tick task", epoch);
                break;
            }
            Ok(None) => {
                debug!("Run {} superseded, stopping tick task", epoch);
                break;
            }
            Err(e) => {
                error!("Tick failed: {}", e);
                break;
            }
        }
    }
}
