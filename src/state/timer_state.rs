//! Countdown state machine
//!
//! `TimerEngine` holds the remaining/initial spans, run flags, the current
//! selection and the saved-timer store. It is purely synchronous; the
//! one-second tick is driven from outside (see `tasks::countdown`).

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::{
    duration::Duration,
    preset::{PresetId, Selection},
    saved_timers::{SavedTimer, SavedTimerId, SavedTimerStore},
};
use crate::services::confirm::Confirm;

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this timer?";

/// User-facing validation failures. The operation is aborted and no state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please provide a name for this timer")]
    EmptyLabel,
    #[error("Please set a time first")]
    ZeroDuration,
    #[error("{field} must be between 0 and {max}, got {value}")]
    OutOfRange { field: &'static str, value: u32, max: u32 },
}

/// Derived view of the run flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; nothing happened
    Idle,
    /// One second elapsed
    Advanced,
    /// Reached zero on this tick; the completion cue should fire
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "id", rename_all = "snake_case")]
pub enum SaveOutcome {
    Created(SavedTimerId),
    Updated(SavedTimerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    Declined,
    Missing,
}

#[derive(Debug, Clone)]
pub struct TimerEngine {
    remaining: Duration,
    initial: Duration,
    running: bool,
    completed: bool,
    selection: Selection,
    label: String,
    custom_time: Duration,
    editing: Option<SavedTimerId>,
    store: SavedTimerStore,
    run_epoch: u64,
}

impl TimerEngine {
    /// New engine loaded with the Pomodoro preset
    pub fn new() -> Self {
        Self::with_store(SavedTimerStore::new())
    }

    pub fn with_store(store: SavedTimerStore) -> Self {
        let pomodoro = PresetId::Pomodoro.resolve().unwrap_or_default();
        Self {
            remaining: pomodoro,
            initial: pomodoro,
            running: false,
            completed: false,
            selection: Selection::default(),
            label: String::new(),
            custom_time: Duration::ZERO,
            editing: None,
            store,
            run_epoch: 0,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn initial(&self) -> Duration {
        self.initial
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn custom_time(&self) -> Duration {
        self.custom_time
    }

    pub fn editing(&self) -> Option<SavedTimerId> {
        self.editing
    }

    pub fn store(&self) -> &SavedTimerStore {
        &self.store
    }

    /// Bumped on every start; tick tasks compare it to detect they are stale
    pub fn run_epoch(&self) -> u64 {
        self.run_epoch
    }

    pub fn status(&self) -> TimerStatus {
        if self.completed {
            TimerStatus::Completed
        } else if self.running {
            TimerStatus::Running
        } else if self.remaining == self.initial {
            TimerStatus::Idle
        } else {
            TimerStatus::Paused
        }
    }

    fn load(&mut self, time: Duration) {
        self.remaining = time;
        self.initial = time;
    }

    fn halt(&mut self) {
        self.running = false;
        self.completed = false;
    }

    /// Load a catalog preset. `Custom` loads the current custom editor value.
    pub fn select_preset(&mut self, id: PresetId) {
        self.halt();
        self.editing = None;
        self.selection = Selection::Preset(id);
        match id.resolve() {
            Some(time) => {
                self.load(time);
                self.label.clear();
            }
            None => self.load(self.custom_time),
        }
        info!("Selected preset {} ({})", id, self.initial);
    }

    /// Load a saved timer. Returns false (and changes nothing) for unknown ids.
    pub fn select_saved(&mut self, id: SavedTimerId) -> bool {
        let Some(SavedTimer { label, time, .. }) = self.store.get(id).cloned() else {
            return false;
        };
        self.halt();
        self.editing = None;
        self.selection = Selection::Saved(id);
        self.load(time);
        info!("Selected saved timer {} '{}' ({})", id, label, time);
        self.label = label;
        true
    }

    /// Begin counting down. No-op when nothing is left to count.
    pub fn start(&mut self) -> bool {
        if self.running || self.remaining.is_zero() {
            return false;
        }
        self.running = true;
        self.completed = false;
        self.run_epoch += 1;
        info!("Countdown started at {}", self.remaining);
        true
    }

    /// Freeze the countdown. Returns false when it was not running.
    pub fn pause(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        info!("Countdown paused at {}", self.remaining);
        true
    }

    /// Start/pause on one control. Returns the new running flag.
    pub fn toggle(&mut self) -> bool {
        if self.running {
            self.pause();
        } else {
            self.start();
        }
        self.running
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        match self.remaining.decremented() {
            Some(next) if !next.is_zero() => {
                self.remaining = next;
                debug!("Tick: {} remaining", self.remaining);
                TickOutcome::Advanced
            }
            _ => {
                self.running = false;
                self.completed = true;
                self.remaining = Duration::ZERO;
                info!("Countdown completed");
                TickOutcome::Completed
            }
        }
    }

    /// Reset to the initial span. Allowed from any state.
    pub fn stop(&mut self) {
        self.halt();
        self.remaining = self.initial;
        info!("Countdown stopped, reset to {}", self.initial);
    }

    /// Update the custom editor. Loads the value right away when `custom` is selected.
    pub fn set_custom_time(&mut self, time: Duration) {
        self.custom_time = time;
        if self.selection == Selection::Preset(PresetId::Custom) {
            self.halt();
            self.load(time);
        }
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Save the configured span under `label`, overwriting the timer being
    /// edited if there is one.
    pub fn save_current_as_named(&mut self, label: &str) -> Result<SaveOutcome, ValidationError> {
        if label.trim().is_empty() {
            return Err(ValidationError::EmptyLabel);
        }
        if self.initial.is_zero() {
            return Err(ValidationError::ZeroDuration);
        }

        let label = label.to_string();
        let updated = self
            .editing
            .take()
            .filter(|id| self.store.update(*id, label.clone(), self.initial));
        let outcome = match updated {
            Some(id) => {
                info!("Updated saved timer {} '{}' ({})", id, label, self.initial);
                SaveOutcome::Updated(id)
            }
            // The edited timer may have vanished; fall back to appending.
            None => {
                let id = self.store.insert(label.clone(), self.initial);
                info!("Saved timer {} '{}' ({})", id, label, self.initial);
                SaveOutcome::Created(id)
            }
        };

        self.label = label;
        self.remaining = self.initial;
        self.completed = false;
        Ok(outcome)
    }

    /// Load a saved timer into the custom editor for modification.
    /// Unknown ids are ignored.
    pub fn edit(&mut self, id: SavedTimerId) -> bool {
        let Some(SavedTimer { label, time, .. }) = self.store.get(id).cloned() else {
            debug!("Ignoring edit of unknown saved timer {}", id);
            return false;
        };
        self.halt();
        self.custom_time = time;
        self.label = label;
        self.load(time);
        self.selection = Selection::Preset(PresetId::Custom);
        self.editing = Some(id);
        info!("Editing saved timer {}", id);
        true
    }

    /// Remove a saved timer after confirmation. Removing the timer currently
    /// being edited snaps the engine back to its default.
    pub fn delete(&mut self, id: SavedTimerId, confirm: &dyn Confirm) -> DeleteOutcome {
        if !self.store.contains(id) {
            return DeleteOutcome::Missing;
        }
        if !confirm.confirm(DELETE_PROMPT) {
            debug!("Delete of saved timer {} declined", id);
            return DeleteOutcome::Declined;
        }
        self.store.remove(id);
        info!("Deleted saved timer {}", id);

        if self.editing == Some(id) {
            self.reset_to_default();
        }
        DeleteOutcome::Deleted
    }

    /// Back to Pomodoro with nothing being edited
    pub fn reset_to_default(&mut self) {
        self.editing = None;
        self.select_preset(PresetId::Pomodoro);
        info!("Timer reset to default");
    }

    /// Restore a previously persisted selection, if it still resolves
    pub fn restore_selection(&mut self, selection: Selection) -> bool {
        match selection {
            Selection::Preset(id) => {
                self.select_preset(id);
                true
            }
            Selection::Saved(id) => self.select_saved(id),
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let editing_label = self
            .editing
            .and_then(|id| self.store.get(id))
            .map(|timer| timer.label.clone());

        TimerSnapshot {
            remaining: self.remaining,
            initial: self.initial,
            display: self.remaining.to_string(),
            status: self.status(),
            running: self.running,
            completed: self.completed,
            selection: self.selection,
            description: self.selection.description(),
            label: self.label.clone(),
            custom_time: self.custom_time,
            editing: self.editing,
            editing_label,
            saved_timers: self.store.to_vec(),
        }
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable view of the engine, published after every change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerSnapshot {
    pub remaining: Duration,
    pub initial: Duration,
    pub display: String,
    pub status: TimerStatus,
    pub running: bool,
    pub completed: bool,
    pub selection: Selection,
    pub description: &'static str,
    pub label: String,
    pub custom_time: Duration,
    pub editing: Option<SavedTimerId>,
    pub editing_label: Option<String>,
    pub saved_timers: Vec<SavedTimer>,
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::services::confirm::Confirmation;

    fn hms(h: u32, m: u32, s: u32) -> Duration {
        Duration::new(h, m, s).unwrap()
    }

    fn run_to_end(engine: &mut TimerEngine) -> (u64, TickOutcome) {
        let mut ticks = 0;
        loop {
            ticks += 1;
            let outcome = engine.tick();
            if outcome != TickOutcome::Advanced {
                return (ticks, outcome);
            }
        }
    }

    fn custom(engine: &mut TimerEngine, time: Duration) {
        engine.select_preset(PresetId::Custom);
        engine.set_custom_time(time);
    }

    #[test]
    fn starts_on_pomodoro() {
        let engine = TimerEngine::new();
        assert_eq!(engine.selection(), Selection::Preset(PresetId::Pomodoro));
        assert_eq!(engine.remaining(), hms(0, 25, 0));
        assert_eq!(engine.status(), TimerStatus::Idle);
    }

    #[test]
    fn ticking_total_seconds_completes() {
        for time in [hms(0, 0, 1), hms(0, 1, 0), hms(0, 2, 3), hms(1, 0, 0)] {
            let mut engine = TimerEngine::new();
            custom(&mut engine, time);
            assert!(engine.start());

            let (ticks, outcome) = run_to_end(&mut engine);
            assert_eq!(ticks, time.total_seconds());
            assert_eq!(outcome, TickOutcome::Completed);
            assert_eq!(engine.status(), TimerStatus::Completed);
            assert_eq!(engine.remaining(), Duration::ZERO);
            assert!(!engine.is_running());
        }
    }

    #[test]
    fn ten_second_custom_completes_after_ten_ticks() {
        let mut engine = TimerEngine::new();
        custom(&mut engine, hms(0, 0, 10));
        engine.start();
        let outcomes: Vec<_> = (0..10).map(|_| engine.tick()).collect();
        assert_eq!(outcomes.iter().filter(|o| **o == TickOutcome::Completed).count(), 1);
        assert_eq!(outcomes.last(), Some(&TickOutcome::Completed));
        assert!(engine.is_completed());
        assert_eq!(engine.tick(), TickOutcome::Idle);
    }

    #[test]
    fn stop_restores_initial_from_every_state() {
        let mut engine = TimerEngine::new();
        custom(&mut engine, hms(0, 0, 5));

        engine.stop();
        assert_eq!(engine.remaining(), engine.initial());

        engine.start();
        engine.tick();
        engine.stop();
        assert_eq!(engine.remaining(), hms(0, 0, 5));
        assert_eq!(engine.status(), TimerStatus::Idle);

        engine.start();
        engine.tick();
        engine.pause();
        assert_eq!(engine.status(), TimerStatus::Paused);
        engine.stop();
        assert_eq!(engine.remaining(), hms(0, 0, 5));

        engine.start();
        run_to_end(&mut engine);
        engine.stop();
        assert_eq!(engine.remaining(), hms(0, 0, 5));
        assert!(!engine.is_completed());
    }

    #[test]
    fn start_is_noop_at_zero() {
        let mut engine = TimerEngine::new();
        engine.select_preset(PresetId::Custom);
        assert!(!engine.start());
        assert!(!engine.is_running());
        assert_eq!(engine.run_epoch(), 0);
    }

    #[test]
    fn pause_preserves_remaining() {
        let mut engine = TimerEngine::new();
        engine.start();
        engine.tick();
        engine.tick();
        assert!(!engine.toggle());
        assert_eq!(engine.remaining(), hms(0, 24, 58));
        assert_eq!(engine.tick(), TickOutcome::Idle);
        assert!(engine.toggle());
        assert_eq!(engine.run_epoch(), 2);
    }

    #[test]
    fn selecting_pomodoro_loads_25_minutes() {
        let mut engine = TimerEngine::new();
        engine.select_preset(PresetId::Minute90);
        engine.start();
        engine.tick();
        engine.select_preset(PresetId::Pomodoro);
        assert_eq!(engine.remaining(), hms(0, 25, 0));
        assert_eq!(engine.initial(), hms(0, 25, 0));
        assert!(!engine.is_running());
    }

    #[test]
    fn minute5217_renders_without_hours() {
        let mut engine = TimerEngine::new();
        engine.select_preset(PresetId::Minute5217);
        assert_eq!(engine.remaining(), hms(0, 52, 0));
        assert_eq!(engine.initial(), hms(0, 52, 0));
        assert_eq!(engine.snapshot().display, "52:00");
    }

    #[test]
    fn blank_labels_fail_validation() {
        let mut engine = TimerEngine::new();
        assert_eq!(engine.save_current_as_named(""), Err(ValidationError::EmptyLabel));
        assert_eq!(engine.save_current_as_named("  "), Err(ValidationError::EmptyLabel));
        assert!(engine.store().is_empty());
    }

    #[test]
    fn zero_initial_fails_validation() {
        let mut engine = TimerEngine::new();
        engine.select_preset(PresetId::Custom);
        assert_eq!(engine.save_current_as_named("Nothing"), Err(ValidationError::ZeroDuration));
        assert!(engine.store().is_empty());
    }

    #[test]
    fn save_appends_then_edit_overwrites() {
        let mut engine = TimerEngine::new();
        custom(&mut engine, hms(0, 45, 0));
        let created = engine.save_current_as_named("Reading").unwrap();
        let SaveOutcome::Created(id) = created else { panic!("expected create") };
        assert_eq!(engine.store().len(), 1);

        custom(&mut engine, hms(0, 10, 0));
        engine.save_current_as_named("Stretch").unwrap();
        assert_eq!(engine.store().len(), 2);

        assert!(engine.edit(id));
        assert_eq!(engine.editing(), Some(id));
        assert_eq!(engine.label(), "Reading");
        engine.set_custom_time(hms(0, 50, 0));
        assert_eq!(engine.save_current_as_named("Reading+"), Ok(SaveOutcome::Updated(id)));

        assert_eq!(engine.store().len(), 2);
        assert_eq!(engine.editing(), None);
        let updated = engine.store().get(id).unwrap();
        assert_eq!(updated.label, "Reading+");
        assert_eq!(updated.time, hms(0, 50, 0));
    }

    #[test]
    fn save_resets_remaining_and_clears_completion() {
        let mut engine = TimerEngine::new();
        custom(&mut engine, hms(0, 0, 2));
        engine.start();
        run_to_end(&mut engine);
        engine.save_current_as_named("Quick").unwrap();
        assert_eq!(engine.remaining(), hms(0, 0, 2));
        assert!(!engine.is_completed());
        assert_eq!(engine.status(), TimerStatus::Idle);
    }

    #[test]
    fn edit_unknown_id_is_noop() {
        let mut engine = TimerEngine::new();
        let before = engine.snapshot();
        assert!(!engine.edit(SavedTimerId(7)));
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn deleting_edited_timer_resets_to_pomodoro() {
        let mut engine = TimerEngine::new();
        custom(&mut engine, hms(0, 15, 0));
        let SaveOutcome::Created(id) = engine.save_current_as_named("Chores").unwrap() else {
            panic!("expected create")
        };
        engine.edit(id);

        assert_eq!(engine.delete(id, &Confirmation(true)), DeleteOutcome::Deleted);
        assert_eq!(engine.selection(), Selection::Preset(PresetId::Pomodoro));
        assert_eq!(engine.editing(), None);
        assert_eq!(engine.remaining(), hms(0, 25, 0));
        assert_eq!(engine.initial(), hms(0, 25, 0));
        assert_eq!(engine.label(), "");
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut engine = TimerEngine::new();
        custom(&mut engine, hms(0, 15, 0));
        let SaveOutcome::Created(id) = engine.save_current_as_named("Chores").unwrap() else {
            panic!("expected create")
        };

        let prompts = RefCell::new(Vec::new());
        let decline = |prompt: &str| {
            prompts.borrow_mut().push(prompt.to_string());
            false
        };
        assert_eq!(engine.delete(id, &decline), DeleteOutcome::Declined);
        assert_eq!(engine.store().len(), 1);
        assert_eq!(prompts.into_inner(), [DELETE_PROMPT]);

        assert_eq!(engine.delete(SavedTimerId(42), &Confirmation(true)), DeleteOutcome::Missing);
        assert_eq!(engine.delete(id, &|_: &str| true), DeleteOutcome::Deleted);
        assert!(engine.store().is_empty());
    }

    #[test]
    fn saved_timer_round_trips_through_selection() {
        let mut engine = TimerEngine::new();
        custom(&mut engine, hms(1, 0, 0));
        let SaveOutcome::Created(id) = engine.save_current_as_named("Deep Work").unwrap() else {
            panic!("expected create")
        };
        let saved = engine.store().get(id).unwrap().clone();
        assert_eq!(saved.label, "Deep Work");
        assert_eq!(saved.time, hms(1, 0, 0));

        engine.select_preset(PresetId::Pomodoro);
        assert!(engine.select_saved(id));
        assert_eq!(engine.remaining(), hms(1, 0, 0));
        assert_eq!(engine.initial(), hms(1, 0, 0));
        assert_eq!(engine.label(), "Deep Work");
        assert_eq!(engine.selection(), Selection::Saved(id));
        assert_eq!(engine.snapshot().display, "1:00:00");
    }

    #[test]
    fn custom_time_only_loads_when_custom_selected() {
        let mut engine = TimerEngine::new();
        engine.set_custom_time(hms(0, 3, 0));
        assert_eq!(engine.remaining(), hms(0, 25, 0));
        engine.select_preset(PresetId::Custom);
        assert_eq!(engine.remaining(), hms(0, 3, 0));
    }

    #[test]
    fn editing_custom_time_while_running_stops_and_reloads() {
        let mut engine = TimerEngine::new();
        engine.select_preset(PresetId::Custom);
        engine.set_custom_time(hms(0, 3, 0));
        assert!(engine.start());
        engine.tick();

        engine.set_custom_time(hms(0, 1, 30));
        assert!(!engine.is_running());
        assert_eq!(engine.remaining(), hms(0, 1, 30));
        assert_eq!(engine.initial(), hms(0, 1, 30));
        assert_eq!(engine.status(), TimerStatus::Idle);
    }
}
