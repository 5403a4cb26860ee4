//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{
    Duration, PresetId, SavedTimerId, SavedTimerStore, SaveOutcome, DeleteOutcome, TickOutcome,
    TimerEngine, TimerSnapshot, ValidationError,
};
use crate::{
    services::{
        audio::{play_cue, CompletionCue, SilentCue},
        confirm::Confirm,
        persistence::{MemoryRepository, PersistedTimers, StoreError, TimerRepository},
    },
    tasks::{spawn_countdown, TickHandle},
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to lock {0}")]
    Poisoned(&'static str),
}

/// Shared state: the timer engine, its tick task and collaborators
pub struct AppState {
    engine: Arc<Mutex<TimerEngine>>,
    /// Handle of the active tick task, if any
    tick: Mutex<Option<TickHandle>>,
    /// Serializes repository writes
    persist_lock: Mutex<()>,
    cue: Arc<dyn CompletionCue>,
    repository: Arc<dyn TimerRepository>,
    /// Keep counting when the timer view is left
    pub background: bool,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
    /// Snapshot published after every change
    snapshot_tx: watch::Sender<TimerSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    _snapshot_rx: watch::Receiver<TimerSnapshot>,
}

impl AppState {
    /// Create state with a fresh engine, no sound and in-memory storage
    pub fn new(port: u16, host: String) -> Self {
        let engine = TimerEngine::new();
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());

        Self {
            engine: Arc::new(Mutex::new(engine)),
            tick: Mutex::new(None),
            persist_lock: Mutex::new(()),
            cue: Arc::new(SilentCue),
            repository: Arc::new(MemoryRepository::new()),
            background: false,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            snapshot_tx,
            _snapshot_rx: snapshot_rx,
        }
    }

    pub fn with_cue(mut self, cue: Arc<dyn CompletionCue>) -> Self {
        self.cue = cue;
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn TimerRepository>) -> Self {
        self.repository = repository;
        self
    }

    pub fn with_background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    /// Load saved timers and the last selection from the repository.
    /// Returns whether anything was restored.
    pub fn restore(&self) -> Result<bool, StoreError> {
        let Some(data) = self.repository.load()? else {
            return Ok(false);
        };

        let count = data.timers.len();
        let store = SavedTimerStore::restore(data.timers, data.next_id);
        let mut engine = TimerEngine::with_store(store);
        engine.set_custom_time(data.custom_time);
        if let Some(selection) = data.last_selection {
            if !engine.restore_selection(selection) {
                warn!("Last selection {:?} no longer exists, keeping default", selection);
            }
        }
        let snapshot = engine.snapshot();

        {
            let mut slot = self.engine.lock().map_err(|_| StoreError::Poisoned)?;
            *slot = engine;
        }
        self.publish(snapshot);
        info!("Restored {} saved timers", count);
        Ok(true)
    }

    /// Apply one transition under the engine lock, then cancel the tick if
    /// the engine is no longer running and publish the new snapshot.
    fn update<F, R>(&self, action: &str, updater: F) -> Result<(R, TimerSnapshot), EngineError>
    where
        F: FnOnce(&mut TimerEngine) -> Result<R, ValidationError>,
    {
        let mut engine = self.engine.lock().map_err(|_| EngineError::Poisoned("timer engine"))?;

        let result = updater(&mut engine)?;
        let running = engine.is_running();
        let epoch = engine.run_epoch();
        let snapshot = engine.snapshot();
        drop(engine); // Release the lock early

        if !running {
            self.cancel_ticks_through(epoch);
        }
        self.record_action(action);
        self.publish(snapshot.clone());

        Ok((result, snapshot))
    }

    fn publish(&self, snapshot: TimerSnapshot) {
        if let Err(e) = self.snapshot_tx.send(snapshot) {
            warn!("Failed to publish timer snapshot: {}", e);
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some((action.to_string(), Utc::now()));
        }
    }

    /// Install the tick task for a run. A handle from an older run than the
    /// installed one is refused and dropped, which aborts its task.
    fn install_tick(&self, handle: TickHandle) -> bool {
        let mut slot = match self.tick.lock() {
            Ok(slot) => slot,
            Err(e) => {
                error!("Failed to lock tick handle: {}", e);
                return false;
            }
        };
        if slot.as_ref().is_some_and(|current| current.epoch() > handle.epoch()) {
            debug!("Refusing tick for superseded run {}", handle.epoch());
            return false;
        }
        // The old handle drops here, aborting its task
        *slot = Some(handle);
        true
    }

    /// Cancel the installed tick unless it belongs to a run newer than `epoch`
    fn cancel_ticks_through(&self, epoch: u64) {
        match self.tick.lock() {
            Ok(mut slot) => {
                if slot.as_ref().is_some_and(|current| current.epoch() <= epoch) {
                    *slot = None;
                }
            }
            Err(e) => error!("Failed to lock tick handle: {}", e),
        }
    }

    fn cancel_tick(&self) {
        match self.tick.lock() {
            Ok(mut slot) => *slot = None,
            Err(e) => error!("Failed to lock tick handle: {}", e),
        }
    }

    /// Write saved timers to the repository. The persist lock is held from
    /// the copy through the write so writes land in the order they were taken.
    fn persist(&self) {
        let _guard = match self.persist_lock.lock() {
            Ok(guard) => guard,
            Err(e) => {
                error!("Failed to lock saved timer storage: {}", e);
                return;
            }
        };
        let data = match self.engine.lock() {
            Ok(engine) => PersistedTimers {
                timers: engine.store().to_vec(),
                next_id: engine.store().next_id(),
                last_selection: Some(engine.selection()),
                custom_time: engine.custom_time(),
            },
            Err(e) => {
                error!("Failed to lock timer engine for saving: {}", e);
                return;
            }
        };

        if let Err(e) = self.repository.save(&data) {
            error!("Failed to store saved timers: {}", e);
        }
    }

    /// Called from the tick task. `Ok(None)` means the run `epoch` has been
    /// superseded and the task should exit.
    pub fn apply_tick(&self, epoch: u64) -> Result<Option<TickOutcome>, EngineError> {
        let mut engine = self.engine.lock().map_err(|_| EngineError::Poisoned("timer engine"))?;
        if engine.run_epoch() != epoch {
            return Ok(None);
        }
        let outcome = engine.tick();
        let snapshot = engine.snapshot();
        drop(engine);

        if outcome == TickOutcome::Idle {
            return Ok(Some(outcome));
        }
        if outcome == TickOutcome::Completed {
            self.record_action("completed");
            play_cue(self.cue.as_ref());
        }
        self.publish(snapshot);
        Ok(Some(outcome))
    }

    pub fn select_preset(&self, id: PresetId) -> Result<TimerSnapshot, EngineError> {
        let ((), snapshot) = self.update("select-preset", |engine| {
            engine.select_preset(id);
            Ok(())
        })?;
        self.persist();
        Ok(snapshot)
    }

    /// `Ok(None)` when no saved timer has this id
    pub fn select_saved(&self, id: SavedTimerId) -> Result<Option<TimerSnapshot>, EngineError> {
        let (found, snapshot) = self.update("select-saved", |engine| Ok(engine.select_saved(id)))?;
        if !found {
            return Ok(None);
        }
        self.persist();
        Ok(Some(snapshot))
    }

    pub fn start(self: &Arc<Self>) -> Result<TimerSnapshot, EngineError> {
        let (epoch, snapshot) =
            self.update("start", |engine| Ok(engine.start().then(|| engine.run_epoch())))?;
        if let Some(epoch) = epoch {
            self.install_tick(spawn_countdown(Arc::clone(self), epoch));
        }
        Ok(snapshot)
    }

    pub fn pause(&self) -> Result<TimerSnapshot, EngineError> {
        self.update("pause", |engine| Ok(engine.pause()))
            .map(|(_, snapshot)| snapshot)
    }

    /// The combined start/pause control
    pub fn toggle(self: &Arc<Self>) -> Result<TimerSnapshot, EngineError> {
        let (epoch, snapshot) = self.update("toggle", |engine| {
            let was_running = engine.is_running();
            let running = engine.toggle();
            Ok((!was_running && running).then(|| engine.run_epoch()))
        })?;
        if let Some(epoch) = epoch {
            self.install_tick(spawn_countdown(Arc::clone(self), epoch));
        }
        Ok(snapshot)
    }

    pub fn stop(&self) -> Result<TimerSnapshot, EngineError> {
        self.update("stop", |engine| {
            engine.stop();
            Ok(())
        })
        .map(|(_, snapshot)| snapshot)
    }

    pub fn set_custom_time(&self, time: Duration) -> Result<TimerSnapshot, EngineError> {
        let ((), snapshot) = self.update("custom-time", |engine| {
            engine.set_custom_time(time);
            Ok(())
        })?;
        self.persist();
        Ok(snapshot)
    }

    pub fn set_label(&self, label: String) -> Result<TimerSnapshot, EngineError> {
        self.update("label", |engine| {
            engine.set_label(label);
            Ok(())
        })
        .map(|(_, snapshot)| snapshot)
    }

    /// Save under `label`, or under the label already being edited when `None`
    pub fn save(&self, label: Option<String>) -> Result<(SaveOutcome, TimerSnapshot), EngineError> {
        let result = self.update("save", |engine| {
            let label = label.unwrap_or_else(|| engine.label().to_string());
            engine.save_current_as_named(&label)
        })?;
        self.persist();
        Ok(result)
    }

    pub fn edit(&self, id: SavedTimerId) -> Result<TimerSnapshot, EngineError> {
        self.update("edit", |engine| Ok(engine.edit(id)))
            .map(|(_, snapshot)| snapshot)
    }

    pub fn delete(
        &self,
        id: SavedTimerId,
        confirm: &dyn Confirm,
    ) -> Result<(DeleteOutcome, TimerSnapshot), EngineError> {
        let result = self.update("delete", |engine| Ok(engine.delete(id, confirm)))?;
        if result.0 == DeleteOutcome::Deleted {
            self.persist();
        }
        Ok(result)
    }

    pub fn reset_to_default(&self) -> Result<TimerSnapshot, EngineError> {
        let ((), snapshot) = self.update("reset", |engine| {
            engine.reset_to_default();
            Ok(())
        })?;
        self.persist();
        Ok(snapshot)
    }

    /// The timer view was navigated away from. Pauses a running countdown
    /// unless background countdowns are enabled.
    pub fn leave_view(&self) -> Result<TimerSnapshot, EngineError> {
        if self.background {
            info!("Timer view left, countdown continues in background");
            return self.snapshot();
        }
        self.pause()
    }

    pub fn snapshot(&self) -> Result<TimerSnapshot, EngineError> {
        self.engine
            .lock()
            .map(|engine| engine.snapshot())
            .map_err(|_| EngineError::Poisoned("timer engine"))
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Whether a tick task is currently alive
    pub fn has_active_tick(&self) -> bool {
        self.tick
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    /// Cancel any pending tick and flush storage. Called on teardown.
    pub fn shutdown(&self) {
        self.cancel_tick();
        self.persist();
        info!("Timer engine shut down");
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|a| a.clone()) {
            Some((action, time)) => (Some(action), Some(time)),
            None => (None, None),
        }
    }
}
