use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

// ─── Gesture labels ─────────────────────────────────────────────────────────

/// Label used for the pointer/touch tap surface.
pub const TAP_LABEL: &str = "tap";

/// Identifies a logical input source: a key name, or `"tap"` for the pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GestureLabel(String);

impl GestureLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn tap() -> Self {
        Self(TAP_LABEL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_tap(&self) -> bool {
        self.0 == TAP_LABEL
    }
}

impl From<&str> for GestureLabel {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Event log ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Start,
    Stop,
}

/// One line of the human-readable scrollback.
///
/// For `Start` the magnitude is the gap since the previous onset (0 for the
/// first onset of a session). For `Stop` it is how long the gesture was held.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub direction: Direction,
    pub magnitude_ms: f64,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.direction {
            Direction::Start => '↓',
            Direction::Stop => '↑',
        };
        write!(f, "{} {:.2}ms", arrow, self.magnitude_ms)
    }
}

// ─── Inter-thread messages ──────────────────────────────────────────────────

/// Which configuration value a `Configure` event targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigField {
    PickupNotesCount,
    NumberOfBeats,
}

/// Everything an input source can tell the coordinator.
///
/// Serializes with a `"type"` tag so event scripts read as
/// `{"type":"onset","label":"a","timestamp_ms":120.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Onset { label: GestureLabel, timestamp_ms: f64 },
    Release { label: GestureLabel, timestamp_ms: f64 },
    /// Pointer left the tap surface while held.
    LeaveWhileHeld { timestamp_ms: f64 },
    /// Stop recording and switch to analysis.
    Interrupt { timestamp_ms: f64 },
    /// Raw, unvalidated configuration input from a widget or script.
    Configure { field: ConfigField, value: String },
    Reset,
}

impl InputEvent {
    pub fn onset(label: &str, timestamp_ms: f64) -> Self {
        Self::Onset { label: label.into(), timestamp_ms }
    }

    pub fn release(label: &str, timestamp_ms: f64) -> Self {
        Self::Release { label: label.into(), timestamp_ms }
    }

    /// Timestamp carried by the event, if it has one.
    pub fn timestamp_ms(&self) -> Option<f64> {
        match self {
            Self::Onset { timestamp_ms, .. }
            | Self::Release { timestamp_ms, .. }
            | Self::LeaveWhileHeld { timestamp_ms }
            | Self::Interrupt { timestamp_ms } => Some(*timestamp_ms),
            Self::Configure { .. } | Self::Reset => None,
        }
    }
}

// ─── Session clock ──────────────────────────────────────────────────────────

/// Monotonic clock for the capture session, in fractional milliseconds.
#[derive(Clone)]
pub struct SessionClock {
    start: Instant,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_entry_display_uses_arrows() {
        let down = LogEntry { direction: Direction::Start, magnitude_ms: 0.0 };
        let up = LogEntry { direction: Direction::Stop, magnitude_ms: 200.456 };
        assert_eq!(down.to_string(), "↓ 0.00ms");
        assert_eq!(up.to_string(), "↑ 200.46ms");
    }

    #[test]
    fn input_event_script_format() {
        let ev: InputEvent =
            serde_json::from_str(r#"{"type":"onset","label":"a","timestamp_ms":12.5}"#).unwrap();
        assert_eq!(ev, InputEvent::onset("a", 12.5));

        let cfg: InputEvent = serde_json::from_str(
            r#"{"type":"configure","field":"number_of_beats","value":"8"}"#,
        )
        .unwrap();
        assert_eq!(
            cfg,
            InputEvent::Configure { field: ConfigField::NumberOfBeats, value: "8".into() }
        );

        let reset: InputEvent = serde_json::from_str(r#"{"type":"reset"}"#).unwrap();
        assert_eq!(reset.timestamp_ms(), None);
    }

    #[test]
    fn session_clock_is_monotonic() {
        let clock = SessionClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
