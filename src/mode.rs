use serde::{Deserialize, Serialize};
use std::fmt;

/// Capture mode. Recording accepts gestures, Analyzing shows the beat grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Recording,
    Analyzing,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Recording => f.write_str("recording"),
            Mode::Analyzing => f.write_str("analyzing"),
        }
    }
}

/// One-way Recording → Analyzing switch. Only a session reset goes back.
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    mode: Mode,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_recording(&self) -> bool {
        self.mode == Mode::Recording
    }

    /// Move to Analyzing. Returns false if already there.
    pub fn finish(&mut self) -> bool {
        if self.mode == Mode::Analyzing {
            return false;
        }
        self.mode = Mode::Analyzing;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_once() {
        let mut mc = ModeController::new();
        assert!(mc.is_recording());
        assert!(mc.finish());
        assert_eq!(mc.mode(), Mode::Analyzing);
        assert!(!mc.finish());
        assert_eq!(mc.mode(), Mode::Analyzing);
    }
}
