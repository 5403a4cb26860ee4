//! User-saved named timers

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

use super::duration::Duration;

/// Stable identifier assigned when a timer is saved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedTimerId(pub u64);

impl fmt::Display for SavedTimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTimer {
    pub id: SavedTimerId,
    pub label: String,
    pub time: Duration,
}

/// Ordered id → timer mapping. `order` keeps insertion order for display.
#[derive(Debug, Clone, Default)]
pub struct SavedTimerStore {
    timers: HashMap<SavedTimerId, SavedTimer>,
    order: Vec<SavedTimerId>,
    next_id: u64,
}

impl SavedTimerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted timers. `next_id` never goes below one
    /// past the largest id present, so ids are not reused.
    pub fn restore(timers: Vec<SavedTimer>, next_id: u64) -> Self {
        let mut store = Self::new();
        for timer in timers {
            if store.timers.contains_key(&timer.id) {
                tracing::warn!("Skipping duplicate saved timer id {}", timer.id);
                continue;
            }
            store.next_id = store.next_id.max(timer.id.0 + 1);
            store.order.push(timer.id);
            store.timers.insert(timer.id, timer);
        }
        store.next_id = store.next_id.max(next_id);
        store
    }

    pub fn insert(&mut self, label: String, time: Duration) -> SavedTimerId {
        let id = SavedTimerId(self.next_id);
        self.next_id += 1;
        self.order.push(id);
        self.timers.insert(id, SavedTimer { id, label, time });
        id
    }

    /// Overwrite label and time in place. Returns false for unknown ids.
    pub fn update(&mut self, id: SavedTimerId, label: String, time: Duration) -> bool {
        match self.timers.get_mut(&id) {
            Some(timer) => {
                timer.label = label;
                timer.time = time;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: SavedTimerId) -> Option<SavedTimer> {
        let removed = self.timers.remove(&id)?;
        self.order.retain(|existing| *existing != id);
        Some(removed)
    }

    pub fn get(&self, id: SavedTimerId) -> Option<&SavedTimer> {
        self.timers.get(&id)
    }

    pub fn contains(&self, id: SavedTimerId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedTimer> {
        self.order.iter().filter_map(|id| self.timers.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Timers in display order
    pub fn to_vec(&self) -> Vec<SavedTimer> {
        self.iter().cloned().collect()
    }
}
