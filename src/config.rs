//! Rendering configuration and the reserved-key ignore set.
//!
//! Values arrive from numeric widgets or scripts as raw text. Every setter
//! validates first and only then writes, so a rejected input always leaves
//! the previous valid value in place.

use crate::types::{ConfigField, GestureLabel};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PICKUP_NOTES_COUNT: usize = 0;
pub const DEFAULT_NUMBER_OF_BEATS: u32 = 4;

/// Upper bound on the beat grid. The renderer emits one tick per beat.
pub const MAX_NUMBER_OF_BEATS: u32 = 1024;

/// Keys left to the browser/OS for navigation and shortcuts.
pub const DEFAULT_IGNORED_KEYS: [&str; 4] = ["Control", "Alt", "Shift", "Tab"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field:?}: not a number: {raw:?}")]
    NotANumber { field: ConfigField, raw: String },
    #[error("pickup notes count must be >= 0, got {0}")]
    NegativePickup(i64),
    #[error("number of beats must be > 0, got {0}")]
    NonPositiveBeats(i64),
    #[error("number of beats must be <= {max}, got {0}", max = MAX_NUMBER_OF_BEATS)]
    TooManyBeats(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pickup_notes_count: usize,
    number_of_beats: u32,
}

impl Configuration {
    pub fn new(pickup_notes_count: i64, number_of_beats: i64) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.set_pickup_notes_count(pickup_notes_count)?;
        cfg.set_number_of_beats(number_of_beats)?;
        Ok(cfg)
    }

    pub fn pickup_notes_count(&self) -> usize {
        self.pickup_notes_count
    }

    pub fn number_of_beats(&self) -> u32 {
        self.number_of_beats
    }

    pub fn set_pickup_notes_count(&mut self, value: i64) -> Result<(), ConfigError> {
        let count = usize::try_from(value).map_err(|_| ConfigError::NegativePickup(value))?;
        self.pickup_notes_count = count;
        Ok(())
    }

    pub fn set_number_of_beats(&mut self, value: i64) -> Result<(), ConfigError> {
        if value <= 0 {
            return Err(ConfigError::NonPositiveBeats(value));
        }
        let beats = u32::try_from(value)
            .ok()
            .filter(|&b| b <= MAX_NUMBER_OF_BEATS)
            .ok_or(ConfigError::TooManyBeats(value))?;
        self.number_of_beats = beats;
        Ok(())
    }

    /// Parse raw widget text and apply it to `field`.
    pub fn apply_raw(&mut self, field: ConfigField, raw: &str) -> Result<(), ConfigError> {
        let value: i64 = raw.trim().parse().map_err(|_| ConfigError::NotANumber {
            field,
            raw: raw.to_string(),
        })?;
        match field {
            ConfigField::PickupNotesCount => self.set_pickup_notes_count(value),
            ConfigField::NumberOfBeats => self.set_number_of_beats(value),
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            pickup_notes_count: DEFAULT_PICKUP_NOTES_COUNT,
            number_of_beats: DEFAULT_NUMBER_OF_BEATS,
        }
    }
}

/// Key labels that never become gestures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreSet {
    labels: Vec<GestureLabel>,
}

impl IgnoreSet {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(GestureLabel::new).collect(),
        }
    }

    pub fn contains(&self, label: &GestureLabel) -> bool {
        self.labels.contains(label)
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORED_KEYS)
    }
}
