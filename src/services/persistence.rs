//! Pluggable storage for saved timers and the last selection

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::state::{Duration, SavedTimer, Selection};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Stored timers are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Everything that outlives a single run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedTimers {
    pub timers: Vec<SavedTimer>,
    #[serde(default)]
    pub next_id: u64,
    #[serde(default)]
    pub last_selection: Option<Selection>,
    /// Time loaded when the custom preset is selected
    #[serde(default)]
    pub custom_time: Duration,
}

pub trait TimerRepository: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet
    fn load(&self) -> Result<Option<PersistedTimers>, StoreError>;
    fn save(&self, data: &PersistedTimers) -> Result<(), StoreError>;
}

/// Lives for the process only
#[derive(Debug, Default)]
pub struct MemoryRepository {
    data: Mutex<Option<PersistedTimers>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimerRepository for MemoryRepository {
    fn load(&self) -> Result<Option<PersistedTimers>, StoreError> {
        self.data
            .lock()
            .map(|data| data.clone())
            .map_err(|_| StoreError::Poisoned)
    }

    fn save(&self, data: &PersistedTimers) -> Result<(), StoreError> {
        let mut slot = self.data.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = Some(data.clone());
        Ok(())
    }
}

/// Pretty-printed JSON document on disk
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/focus-timer/timers.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("focus-timer").join("timers.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        static WRITES: AtomicU64 = AtomicU64::new(0);
        let n = WRITES.fetch_add(1, Ordering::Relaxed);
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "timers.json".to_string());
        self.path
            .with_file_name(format!("{}.{}.{}.tmp", name, std::process::id(), n))
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TimerRepository for JsonFileRepository {
    fn load(&self) -> Result<Option<PersistedTimers>, StoreError> {
        if !self.path.exists() {
            debug!("No stored timers at {}", self.path.display());
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let data: PersistedTimers = serde_json::from_str(&raw)?;
        info!("Loaded {} saved timers from {}", data.timers.len(), self.path.display());
        Ok(Some(data))
    }

    fn save(&self, data: &PersistedTimers) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(data)?;
        // Replace atomically via a sibling temp file, unique per write
        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        debug!("Stored {} saved timers to {}", data.timers.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::state::{PresetId, SavedTimerId};

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "focus-timer-{}-{}-{}",
                name,
                std::process::id(),
                chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
            ));
            fs::create_dir_all(&path).unwrap();
            Self(path)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn sample() -> PersistedTimers {
        PersistedTimers {
            timers: vec![SavedTimer {
                id: SavedTimerId(0),
                label: "Deep Work".into(),
                time: Duration::new(1, 0, 0).unwrap(),
            }],
            next_id: 1,
            last_selection: Some(Selection::Preset(PresetId::Minute90)),
            custom_time: Duration::new(0, 45, 0).unwrap(),
        }
    }

    #[test]
    fn file_repository_missing_file_loads_nothing() {
        let dir = TempDir::new("missing");
        let repo = JsonFileRepository::new(dir.0.join("timers.json"));
        assert_eq!(repo.load().unwrap(), None);
    }

    #[test]
    fn file_repository_stores_and_reloads() {
        let dir = TempDir::new("reload");
        let repo = JsonFileRepository::new(dir.0.join("nested").join("timers.json"));
        repo.save(&sample()).unwrap();

        let reopened = JsonFileRepository::new(repo.path().to_path_buf());
        assert_eq!(reopened.load().unwrap(), Some(sample()));
    }

    #[test]
    fn file_repository_rejects_out_of_range_durations() {
        let dir = TempDir::new("invalid");
        let path = dir.0.join("timers.json");
        fs::write(
            &path,
            r#"{"timers":[{"id":0,"label":"Bad","time":{"hours":30,"minutes":0,"seconds":0}}]}"#,
        )
        .unwrap();
        assert!(matches!(JsonFileRepository::new(path).load(), Err(StoreError::Json(_))));
    }

    #[test]
    fn file_repository_defaults_missing_custom_time() {
        let dir = TempDir::new("legacy");
        let path = dir.0.join("timers.json");
        fs::write(&path, r#"{"timers":[],"next_id":3}"#).unwrap();
        let data = JsonFileRepository::new(path).load().unwrap().unwrap();
        assert_eq!(data.custom_time, Duration::ZERO);
        assert_eq!(data.next_id, 3);
    }

    #[test]
    fn file_repository_concurrent_writes_do_not_collide() {
        let dir = TempDir::new("concurrent");
        let repo = Arc::new(JsonFileRepository::new(dir.0.join("timers.json")));

        let writers: Vec<_> = (0..8)
            .map(|_| {
                let repo = Arc::clone(&repo);
                std::thread::spawn(move || {
                    (0..20).map(|_| repo.save(&sample())).collect::<Result<Vec<_>, _>>()
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap().unwrap();
        }

        assert_eq!(repo.load().unwrap(), Some(sample()));
        let leftovers = fs::read_dir(&dir.0).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn memory_repository_keeps_last_save() {
        let repo = MemoryRepository::new();
        assert_eq!(repo.load().unwrap(), None);
        repo.save(&sample()).unwrap();
        assert_eq!(repo.load().unwrap(), Some(sample()));
    }
}
