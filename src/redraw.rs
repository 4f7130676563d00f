use crate::types::InputEvent;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::debug;
use std::time::{Duration, Instant};

/// What woke the coordinator up.
#[derive(Debug)]
pub enum Wake {
    Event(InputEvent),
    /// Frame deadline passed while a gesture is held.
    Frame,
    /// Input channel closed.
    Closed,
}

/// Live redraw cadence while any gesture is held.
///
/// The loop is armed by [`RedrawLoop::sync`] whenever the registry is
/// non-empty and disarmed the moment it empties. Disarmed, [`RedrawLoop::wait`]
/// blocks on the next input event and schedules nothing.
///
/// Frame deadlines are absolute: incoming events (key auto-repeat included)
/// never push the next frame back.
pub struct RedrawLoop {
    interval: Duration,
    next_frame: Option<Instant>,
    frames: u64,
}

impl RedrawLoop {
    pub fn new(fps: u32) -> Self {
        let fps = fps.max(1);
        Self {
            interval: Duration::from_secs_f64(1.0 / fps as f64),
            next_frame: None,
            frames: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.next_frame.is_some()
    }

    /// Arm or disarm according to whether anything is held.
    pub fn sync(&mut self, held: bool) {
        match (self.next_frame.is_some(), held) {
            (false, true) => {
                self.next_frame = Some(Instant::now() + self.interval);
                self.frames = 0;
                debug!("live redraw started");
            }
            (true, false) => {
                self.next_frame = None;
                debug!("live redraw stopped after {} frames", self.frames);
            }
            _ => {}
        }
    }

    pub fn wait(&mut self, rx: &Receiver<InputEvent>) -> Wake {
        let Some(deadline) = self.next_frame else {
            return match rx.recv() {
                Ok(event) => Wake::Event(event),
                Err(_) => Wake::Closed,
            };
        };
        if Instant::now() >= deadline {
            return self.frame(deadline);
        }
        match rx.recv_deadline(deadline) {
            Ok(event) => Wake::Event(event),
            Err(RecvTimeoutError::Timeout) => self.frame(deadline),
            Err(RecvTimeoutError::Disconnected) => Wake::Closed,
        }
    }

    fn frame(&mut self, deadline: Instant) -> Wake {
        self.frames += 1;
        let now = Instant::now();
        let next = deadline + self.interval;
        // Skip missed frames instead of bursting to catch up.
        self.next_frame = Some(if next <= now { now + self.interval } else { next });
        Wake::Frame
    }
}
