//! Note Timeline: onset offsets relative to the first recorded boundary.
//!
//! A release appends a *provisional* boundary. If the next thing to happen
//! is an onset, that boundary is retracted and the onset takes its place,
//! so a finished sequence reads as onsets plus one trailing release.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Boundary {
    pub offset_ms: f64,
    pub provisional: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NoteTimeline {
    entries: Vec<Boundary>,
    first_onset_ms: Option<f64>,
}

impl NoteTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute timestamp of the first boundary, once one exists.
    pub fn first_onset_ms(&self) -> Option<f64> {
        self.first_onset_ms
    }

    /// Append a confirmed boundary for `timestamp_ms`.
    pub fn append(&mut self, timestamp_ms: f64) -> f64 {
        self.push(timestamp_ms, false)
    }

    /// Append a provisional boundary for `timestamp_ms`.
    pub fn append_provisional(&mut self, timestamp_ms: f64) -> f64 {
        self.push(timestamp_ms, true)
    }

    /// Remove the trailing entry if it is provisional.
    pub fn retract_provisional(&mut self) -> Option<Boundary> {
        match self.entries.last() {
            Some(b) if b.provisional => self.entries.pop(),
            _ => None,
        }
    }

    /// Turn a pending provisional entry into a permanent boundary.
    pub fn confirm_provisional(&mut self) -> bool {
        match self.entries.last_mut() {
            Some(b) if b.provisional => {
                b.provisional = false;
                true
            }
            _ => false,
        }
    }

    pub fn pending_provisional(&self) -> Option<Boundary> {
        self.entries.last().copied().filter(|b| b.provisional)
    }

    /// Offset `timestamp_ms` would get if appended now.
    ///
    /// Clamped to the previous last entry, so out-of-order timestamps
    /// cannot make the sequence decrease.
    pub fn normalize(&self, timestamp_ms: f64) -> f64 {
        match (self.first_onset_ms, self.entries.last()) {
            (Some(first), Some(last)) => (timestamp_ms - first).max(last.offset_ms),
            _ => 0.0,
        }
    }

    pub fn entries(&self) -> &[Boundary] {
        &self.entries
    }

    pub fn offsets(&self) -> Vec<f64> {
        self.entries.iter().map(|b| b.offset_ms).collect()
    }

    pub fn last_offset(&self) -> Option<f64> {
        self.entries.last().map(|b| b.offset_ms)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, timestamp_ms: f64, provisional: bool) -> f64 {
        if self.entries.is_empty() {
            self.first_onset_ms = Some(timestamp_ms);
        }
        let offset_ms = self.normalize(timestamp_ms);
        self.entries.push(Boundary { offset_ms, provisional });
        offset_ms
    }
}
