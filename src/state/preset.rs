//! Preset catalog: fixed focus-method durations plus the custom slot

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{duration::Duration, saved_timers::SavedTimerId};

/// Identifier of a catalog preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetId {
    Pomodoro,
    Minute90,
    Minute5217,
    Custom,
}

impl PresetId {
    pub const ALL: [PresetId; 4] = [
        PresetId::Pomodoro,
        PresetId::Minute90,
        PresetId::Minute5217,
        PresetId::Custom,
    ];

    /// Fixed duration for this preset. `Custom` has none; the caller supplies
    /// the live custom value.
    pub fn resolve(self) -> Option<Duration> {
        match self {
            PresetId::Pomodoro => Some(Duration::from_hms(0, 25, 0)),
            PresetId::Minute90 => Some(Duration::from_hms(1, 30, 0)),
            PresetId::Minute5217 => Some(Duration::from_hms(0, 52, 0)),
            PresetId::Custom => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PresetId::Pomodoro => "pomodoro",
            PresetId::Minute90 => "minute90",
            PresetId::Minute5217 => "minute5217",
            PresetId::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PresetId::Pomodoro => "Pomodoro",
            PresetId::Minute90 => "90-minute method",
            PresetId::Minute5217 => "52/17 method",
            PresetId::Custom => "Custom",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PresetId::Pomodoro => {
                "Work with full focus for 25 minutes, then take a 5 minute break. \
                 After four cycles take a longer 15-30 minute break."
            }
            PresetId::Minute90 => {
                "Work with full focus for 90 minutes, then rest for 20-30 minutes. \
                 Follows the body's natural ultradian rhythm."
            }
            PresetId::Minute5217 => {
                "Work with full focus for 52 minutes, then rest for 17 minutes to \
                 stay productive through the day."
            }
            PresetId::Custom => {
                "Set your own work span. Everyone has a different rhythm, so find \
                 the pattern that works best for you."
            }
        }
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetId::ALL
            .into_iter()
            .find(|preset| preset.as_str() == s)
            .ok_or_else(|| format!("Unknown preset: {}", s))
    }
}

/// What the countdown is currently loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Selection {
    Preset(PresetId),
    Saved(SavedTimerId),
}

impl Selection {
    pub fn preset(self) -> Option<PresetId> {
        match self {
            Selection::Preset(id) => Some(id),
            Selection::Saved(_) => None,
        }
    }

    /// Description shown next to the timer. Saved timers share the custom text.
    pub fn description(self) -> &'static str {
        match self {
            Selection::Preset(id) => id.description(),
            Selection::Saved(_) => PresetId::Custom.description(),
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Preset(PresetId::Pomodoro)
    }
}

/// Catalog entry returned by `GET /presets`
#[derive(Debug, Clone, Serialize)]
pub struct PresetInfo {
    pub id: PresetId,
    pub label: &'static str,
    pub description: &'static str,
    pub duration: Option<Duration>,
}

pub fn catalog() -> Vec<PresetInfo> {
    PresetId::ALL
        .into_iter()
        .map(|id| PresetInfo {
            id,
            label: id.label(),
            description: id.description(),
            duration: id.resolve(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_presets_resolve() {
        assert_eq!(PresetId::Pomodoro.resolve(), Some(Duration::new(0, 25, 0).unwrap()));
        assert_eq!(PresetId::Minute90.resolve(), Some(Duration::new(1, 30, 0).unwrap()));
        assert_eq!(PresetId::Minute5217.resolve(), Some(Duration::new(0, 52, 0).unwrap()));
        assert_eq!(PresetId::Custom.resolve(), None);
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("minute5217".parse::<PresetId>(), Ok(PresetId::Minute5217));
        assert!("saved".parse::<PresetId>().is_err());
        assert_eq!(
            serde_json::to_string(&Selection::Preset(PresetId::Minute90)).unwrap(),
            r#"{"kind":"preset","id":"minute90"}"#
        );
    }

    #[test]
    fn saved_selection_uses_custom_description() {
        assert_eq!(Selection::Saved(SavedTimerId(3)).description(), PresetId::Custom.description());
        assert_eq!(catalog().len(), 4);
    }
}
