use crate::capture::CaptureSession;
use crate::config::Configuration;
use crate::mode::Mode;
use crate::redraw::{RedrawLoop, Wake};
use crate::render::{render, Scene};
use crate::types::*;
use crossbeam_channel::{Receiver, Sender};
use log::{info, trace};
use serde::Serialize;

/// Log entries carried per frame.
pub const LOG_TAIL: usize = 32;

/// Everything a drawing collaborator needs after one render pass.
#[derive(Debug, Clone, Serialize)]
pub struct SceneFrame {
    /// Session clock time of the render, ms.
    pub timestamp_ms: f64,
    pub mode: Mode,
    /// Configuration the scene (and its beat grid) was rendered with.
    pub config: Configuration,
    pub held: Vec<GestureLabel>,
    pub scene: Scene,
    /// Most recent log entries, oldest first, at most [`LOG_TAIL`].
    pub log: Vec<LogEntry>,
    /// Total entries in the session log.
    pub log_len: usize,
}

/// The coordinator owns the capture session. It receives InputEvents,
/// applies them, renders after each mutation, and keeps rendering at the
/// live frame rate while a gesture is held.
///
/// It is the only writer of session state; consumers only ever see
/// finished [`SceneFrame`]s.
pub struct Coordinator {
    input_rx: Receiver<InputEvent>,
    frame_txs: Vec<Sender<SceneFrame>>,
    session: CaptureSession,
    clock: SessionClock,
    width_px: f64,
    redraw: RedrawLoop,
}

impl Coordinator {
    pub fn new(
        input_rx: Receiver<InputEvent>,
        frame_txs: Vec<Sender<SceneFrame>>,
        session: CaptureSession,
        clock: SessionClock,
    ) -> Self {
        Self {
            input_rx,
            frame_txs,
            session,
            clock,
            width_px: 800.0,
            redraw: RedrawLoop::new(60),
        }
    }

    pub fn with_width(mut self, width_px: f64) -> Self {
        self.width_px = width_px;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.redraw = RedrawLoop::new(fps);
        self
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Process events until the input channel closes. Returns the final session.
    pub fn run(mut self) -> CaptureSession {
        info!(
            "Coordinator running ({}px wide, live redraw every {:?})",
            self.width_px,
            self.redraw.interval()
        );
        let mut events: u64 = 0;

        loop {
            match self.redraw.wait(&self.input_rx) {
                Wake::Event(event) => {
                    events += 1;
                    let now = event.timestamp_ms().unwrap_or_else(|| self.clock.now_ms());
                    trace!("event: {:?}", event);
                    if self.session.apply(event) {
                        self.publish(now);
                    }
                }
                Wake::Frame => self.publish(self.clock.now_ms()),
                Wake::Closed => break,
            }
            self.redraw.sync(self.session.is_held());
        }

        info!(
            "Coordinator shutting down after {} events ({} notes recorded)",
            events,
            self.session.timeline().len()
        );
        self.session
    }

    fn publish(&self, now_ms: f64) {
        let scene = render(&self.session.render_input(now_ms, self.width_px));
        let log = self.session.log();
        let frame = SceneFrame {
            timestamp_ms: now_ms,
            mode: self.session.mode(),
            config: self.session.config(),
            held: self.session.held_labels(),
            scene,
            log: log[log.len().saturating_sub(LOG_TAIL)..].to_vec(),
            log_len: log.len(),
        };
        trace!(
            "render: {} blocks, domain {:.2}ms, axis {}",
            frame.scene.blocks.len(),
            frame.scene.last_recorded_ms,
            if frame.scene.axis.is_some() { "on" } else { "off" }
        );
        for tx in &self.frame_txs {
            let _ = tx.send(frame.clone());
        }
    }
}
