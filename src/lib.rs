//! Focus Timer - A countdown timer engine served over HTTP
//!
//! This library provides the timer engine behind a productivity app's timer
//! view: preset focus methods, a custom span, user-saved named timers and a
//! one-second countdown with a completion cue.

pub mod config;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, TimerEngine};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
