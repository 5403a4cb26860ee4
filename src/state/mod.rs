//! State management module
//!
//! The timer engine and its building blocks: spans, the preset catalog,
//! the saved-timer store and the shared application state.

pub mod app_state;
pub mod duration;
pub mod preset;
pub mod saved_timers;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, EngineError};
pub use duration::Duration;
pub use preset::{PresetId, Selection};
pub use saved_timers::{SavedTimer, SavedTimerId, SavedTimerStore};
pub use timer_state::{
    DeleteOutcome, SaveOutcome, TickOutcome, TimerEngine, TimerSnapshot, TimerStatus,
    ValidationError,
};
