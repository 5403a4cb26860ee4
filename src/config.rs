//! Configuration and CLI argument handling

use std::path::PathBuf;
use clap::Parser;

use crate::services::persistence::JsonFileRepository;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "focus-timer")]
#[command(about = "A countdown timer engine with presets and saved timers, driven over HTTP")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Store saved timers in this JSON file
    #[arg(long, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Store saved timers in the user data directory
    #[arg(long, conflicts_with = "store")]
    pub persist: bool,

    /// Sound file played when a countdown completes
    #[arg(long, value_name = "PATH", default_value = "notification.mp3")]
    pub sound: PathBuf,

    /// Command used to play the completion sound
    #[arg(long, default_value = "paplay")]
    pub player: String,

    /// Do not play a sound on completion
    #[arg(long)]
    pub silent: bool,

    /// Keep counting down after the timer view is left
    #[arg(short, long)]
    pub background: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Where saved timers go, if anywhere. `None` keeps them in memory.
    pub fn store_path(&self) -> Option<PathBuf> {
        match (&self.store, self.persist) {
            (Some(path), _) => Some(path.clone()),
            (None, true) => JsonFileRepository::default_path(),
            (None, false) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_ephemeral_and_local() {
        let config = Config::try_parse_from(["focus-timer"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.store_path(), None);
        assert!(!config.background);
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn explicit_store_path_wins() {
        let config =
            Config::try_parse_from(["focus-timer", "--store", "/tmp/timers.json", "-v"]).unwrap();
        assert_eq!(config.store_path(), Some(PathBuf::from("/tmp/timers.json")));
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn store_and_persist_conflict() {
        assert!(Config::try_parse_from(["focus-timer", "--store", "x.json", "--persist"]).is_err());
    }
}
