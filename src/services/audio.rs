//! Completion cue played when a countdown reaches zero

use std::{
    path::{Path, PathBuf},
    process::Stdio,
};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CueError {
    #[error("Sound file not found: {0}")]
    MissingSound(PathBuf),
    #[error("Failed to launch audio player '{player}': {source}")]
    Spawn {
        player: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Audio playback not supported: {0}")]
    Unsupported(String),
}

/// Signal fired once per completed countdown
pub trait CompletionCue: Send + Sync {
    fn play(&self) -> Result<(), CueError>;
}

/// Play the cue and swallow any failure. Playback problems never reach the
/// countdown.
pub fn play_cue(cue: &dyn CompletionCue) {
    match cue.play() {
        Ok(()) => debug!("Completion cue played"),
        Err(e) => warn!("Completion cue failed: {}", e),
    }
}

/// Plays a sound file through an external player command (e.g. `paplay`).
/// The player is spawned and not waited on.
#[derive(Debug, Clone)]
pub struct CommandCue {
    player: String,
    sound: PathBuf,
}

impl CommandCue {
    pub fn new(player: impl Into<String>, sound: impl Into<PathBuf>) -> Self {
        Self {
            player: player.into(),
            sound: sound.into(),
        }
    }

    pub fn sound(&self) -> &Path {
        &self.sound
    }
}

impl CompletionCue for CommandCue {
    fn play(&self) -> Result<(), CueError> {
        if !self.sound.is_file() {
            return Err(CueError::MissingSound(self.sound.clone()));
        }

        Command::new(&self.player)
            .arg(&self.sound)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| CueError::Spawn {
                player: self.player.clone(),
                source,
            })?;

        info!("Playing {} with {}", self.sound.display(), self.player);
        Ok(())
    }
}

/// No sound at all
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCue;

impl CompletionCue for SilentCue {
    fn play(&self) -> Result<(), CueError> {
        Ok(())
    }
}
