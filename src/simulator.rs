use crate::types::*;
use crossbeam_channel::Sender;
use log::{info, warn};
use std::thread;
use std::time::Duration;

/// Taps a scripted rhythm against the session clock, so the whole pipeline
/// can be exercised without a keyboard or touch surface.
pub struct Simulator {
    clock: SessionClock,
    tx: Sender<InputEvent>,
    tempo_bpm: f64,
}

/// One step of a demo rhythm.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Press `label`, hold for `hold` beats, release, then wait out the rest of `beats`.
    Note { label: &'static str, beats: f64, hold: f64 },
    /// Press every label together, hold, release in order.
    Chord { labels: Vec<&'static str>, beats: f64, hold: f64 },
    /// Press and drag off the tap surface before releasing.
    SlideOff { beats: f64, hold: f64 },
    Rest { beats: f64 },
}

impl Simulator {
    pub fn new(clock: SessionClock, tx: Sender<InputEvent>, tempo_bpm: f64) -> Self {
        Self {
            clock,
            tx,
            tempo_bpm: tempo_bpm.max(1.0),
        }
    }

    /// Play the named demo, then interrupt. Blocks the calling thread.
    pub fn run(&self, demo: &str) {
        let gestures = match demo {
            "pickup" => pickup_sequence(),
            "chords" => chord_sequence(),
            "basic" => basic_sequence(),
            other => {
                warn!("Unknown demo {:?}, playing \"basic\"", other);
                basic_sequence()
            }
        };
        info!("Simulator playing {:?} at {} bpm ({} gestures)", demo, self.tempo_bpm, gestures.len());

        for gesture in &gestures {
            if !self.execute(gesture) {
                return;
            }
        }

        self.rest(1.0);
        info!("Demo complete, stopping recording");
        let _ = self.tx.send(InputEvent::Interrupt { timestamp_ms: self.clock.now_ms() });
    }

    /// Returns false once the coordinator has gone away.
    fn execute(&self, gesture: &Gesture) -> bool {
        match gesture {
            Gesture::Note { label, beats, hold } => {
                if !self.send(InputEvent::onset(label, self.clock.now_ms())) {
                    return false;
                }
                self.rest(*hold);
                if !self.send(InputEvent::release(label, self.clock.now_ms())) {
                    return false;
                }
                self.rest(beats - hold);
            }
            Gesture::Chord { labels, beats, hold } => {
                for label in labels {
                    if !self.send(InputEvent::onset(label, self.clock.now_ms())) {
                        return false;
                    }
                }
                self.rest(*hold);
                for label in labels {
                    if !self.send(InputEvent::release(label, self.clock.now_ms())) {
                        return false;
                    }
                }
                self.rest(beats - hold);
            }
            Gesture::SlideOff { beats, hold } => {
                if !self.send(InputEvent::onset(TAP_LABEL, self.clock.now_ms())) {
                    return false;
                }
                self.rest(*hold);
                if !self.send(InputEvent::LeaveWhileHeld { timestamp_ms: self.clock.now_ms() }) {
                    return false;
                }
                // pointerup arrives outside the surface; must be a no-op
                if !self.send(InputEvent::release(TAP_LABEL, self.clock.now_ms())) {
                    return false;
                }
                self.rest(beats - hold);
            }
            Gesture::Rest { beats } => self.rest(*beats),
        }
        true
    }

    fn send(&self, event: InputEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    fn rest(&self, beats: f64) {
        if beats > 0.0 {
            thread::sleep(Duration::from_secs_f64(beats * 60.0 / self.tempo_bpm));
        }
    }
}

fn note(label: &'static str, beats: f64) -> Gesture {
    // Held for a bit under half the note, like a light tap.
    Gesture::Note { label, beats, hold: beats * 0.4 }
}

/// Four-on-the-floor with one syncopated bar.
pub fn basic_sequence() -> Vec<Gesture> {
    vec![
        note("tap", 1.0),
        note("tap", 1.0),
        note("tap", 1.0),
        note("tap", 1.0),
        note("j", 0.5),
        note("k", 0.5),
        note("j", 1.0),
        Gesture::Rest { beats: 0.5 },
        note("k", 0.5),
        note("j", 1.0),
    ]
}

/// Two eighth-note pickups into a bar of quarters.
pub fn pickup_sequence() -> Vec<Gesture> {
    vec![
        note("tap", 0.5),
        note("tap", 0.5),
        note("tap", 1.0),
        note("tap", 1.0),
        note("tap", 1.0),
        Gesture::SlideOff { beats: 1.0, hold: 0.6 },
    ]
}

/// Overlapping key presses.
pub fn chord_sequence() -> Vec<Gesture> {
    vec![
        Gesture::Chord { labels: vec!["a", "s", "d"], beats: 1.0, hold: 0.5 },
        note("f", 1.0),
        Gesture::Chord { labels: vec!["a", "d"], beats: 2.0, hold: 1.5 },
    ]
}
