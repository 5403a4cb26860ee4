//! External collaborators module
//!
//! The timer engine's outside world: the completion sound, confirmation of
//! destructive actions and storage for saved timers.

pub mod audio;
pub mod confirm;
pub mod persistence;

// Re-export main types
pub use audio::{CommandCue, CompletionCue, SilentCue};
pub use confirm::{Confirm, Confirmation};
pub use persistence::{JsonFileRepository, MemoryRepository, TimerRepository};
