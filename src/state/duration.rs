//! Hour/minute/second span used by presets, saved timers and the countdown

use std::fmt;

use serde::{Deserialize, Serialize};

use super::timer_state::ValidationError;

pub const MAX_HOURS: u32 = 23;
pub const MAX_MINUTES: u32 = 59;
pub const MAX_SECONDS: u32 = 59;

/// A span of time, not a wall-clock instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "RawDuration")]
pub struct Duration {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

/// Unvalidated wire form, checked on the way in.
#[derive(Deserialize)]
struct RawDuration {
    #[serde(default)]
    hours: u32,
    #[serde(default)]
    minutes: u32,
    #[serde(default)]
    seconds: u32,
}

impl TryFrom<RawDuration> for Duration {
    type Error = ValidationError;

    fn try_from(raw: RawDuration) -> Result<Self, Self::Error> {
        Duration::new(raw.hours, raw.minutes, raw.seconds)
    }
}

impl Duration {
    pub const ZERO: Duration = Duration::from_hms(0, 0, 0);

    /// Build a span, rejecting fields outside their clock ranges
    pub fn new(hours: u32, minutes: u32, seconds: u32) -> Result<Self, ValidationError> {
        if hours > MAX_HOURS {
            return Err(ValidationError::OutOfRange { field: "hours", value: hours, max: MAX_HOURS });
        }
        if minutes > MAX_MINUTES {
            return Err(ValidationError::OutOfRange { field: "minutes", value: minutes, max: MAX_MINUTES });
        }
        if seconds > MAX_SECONDS {
            return Err(ValidationError::OutOfRange { field: "seconds", value: seconds, max: MAX_SECONDS });
        }
        Ok(Self::from_hms(hours, minutes, seconds))
    }

    /// Const constructor for catalog values known to be in range
    pub(crate) const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self { hours, minutes, seconds }
    }

    pub fn total_seconds(&self) -> u64 {
        u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }

    pub fn is_zero(&self) -> bool {
        self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }

    /// One second less, borrowing seconds from minutes and minutes from hours.
    /// Returns `None` when already at zero.
    pub fn decremented(&self) -> Option<Self> {
        let Self { hours, minutes, seconds } = *self;
        if seconds > 0 {
            Some(Self::from_hms(hours, minutes, seconds - 1))
        } else if minutes > 0 {
            Some(Self::from_hms(hours, minutes - 1, MAX_SECONDS))
        } else if hours > 0 {
            Some(Self::from_hms(hours - 1, MAX_MINUTES, MAX_SECONDS))
        } else {
            None
        }
    }

    /// Compact form for lists, e.g. `1h 30m` or `45s`
    pub fn summary(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if self.hours > 0 {
            parts.push(format!("{}h", self.hours));
        }
        if self.minutes > 0 {
            parts.push(format!("{}m", self.minutes));
        }
        if self.seconds > 0 {
            parts.push(format!("{}s", self.seconds));
        }
        if parts.is_empty() {
            "0s".to_string()
        } else {
            parts.join(" ")
        }
    }
}

impl fmt::Display for Duration {
    /// `H:MM:SS`, or `MM:SS` when there are no hours
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hours > 0 {
            write!(f, "{}:", self.hours)?;
        }
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_fields() {
        assert!(Duration::new(24, 0, 0).is_err());
        assert!(Duration::new(0, 60, 0).is_err());
        assert!(Duration::new(0, 0, 60).is_err());
        assert_eq!(Duration::new(23, 59, 59).unwrap().total_seconds(), 86_399);
    }

    #[test]
    fn decrement_borrows_across_fields() {
        let d = Duration::new(1, 0, 0).unwrap();
        assert_eq!(d.decremented(), Some(Duration::new(0, 59, 59).unwrap()));

        let d = Duration::new(0, 3, 0).unwrap();
        assert_eq!(d.decremented(), Some(Duration::new(0, 2, 59).unwrap()));

        assert_eq!(Duration::ZERO.decremented(), None);
    }

    #[test]
    fn repeated_decrement_reaches_zero_after_total_seconds() {
        let mut d = Duration::new(1, 1, 1).unwrap();
        let mut steps = 0;
        while let Some(next) = d.decremented() {
            d = next;
            steps += 1;
        }
        assert!(d.is_zero());
        assert_eq!(steps, 3661);
    }

    #[test]
    fn display_omits_zero_hours() {
        assert_eq!(Duration::new(0, 5, 0).unwrap().to_string(), "05:00");
        assert_eq!(Duration::new(0, 52, 0).unwrap().to_string(), "52:00");
        assert_eq!(Duration::new(1, 30, 7).unwrap().to_string(), "1:30:07");
    }

    #[test]
    fn summary_skips_empty_parts() {
        assert_eq!(Duration::new(1, 30, 0).unwrap().summary(), "1h 30m");
        assert_eq!(Duration::new(0, 0, 45).unwrap().summary(), "45s");
        assert_eq!(Duration::ZERO.summary(), "0s");
    }

    #[test]
    fn deserialize_validates_ranges() {
        let ok: Duration = serde_json::from_str(r#"{"hours":0,"minutes":10,"seconds":0}"#).unwrap();
        assert_eq!(ok, Duration::new(0, 10, 0).unwrap());

        let partial: Duration = serde_json::from_str(r#"{"seconds":10}"#).unwrap();
        assert_eq!(partial.total_seconds(), 10);

        assert!(serde_json::from_str::<Duration>(r#"{"minutes":75}"#).is_err());
    }
}
