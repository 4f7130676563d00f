//! JSONL scene stream for an external drawing collaborator.
//!
//! First line is a header, then one `SceneFrame` per line.

use crate::config::Configuration;
use crate::coordinator::SceneFrame;
use crossbeam_channel::Receiver;
use log::{error, info};
use serde_json::json;
use std::io::{self, Write};

pub struct SceneWriter<W: Write> {
    rx: Receiver<SceneFrame>,
    out: W,
    /// Also write frames rendered while a gesture is held.
    include_live: bool,
}

impl<W: Write> SceneWriter<W> {
    pub fn new(rx: Receiver<SceneFrame>, out: W) -> Self {
        Self {
            rx,
            out,
            include_live: false,
        }
    }

    pub fn with_live_frames(mut self, enabled: bool) -> Self {
        self.include_live = enabled;
        self
    }

    /// Run the writer. Blocks until the frame channel closes or a write fails.
    /// Returns the number of frames written.
    pub fn run(mut self, width_px: f64, config: Configuration) -> usize {
        if let Err(e) = self.write_header(width_px, config) {
            error!("Scene stream header failed: {}", e);
            return 0;
        }

        let mut written = 0;
        for frame in self.rx.iter() {
            if !self.include_live && !frame.held.is_empty() {
                continue;
            }
            if let Err(e) = write_frame(&mut self.out, &frame) {
                error!("Scene stream stopped: {}", e);
                break;
            }
            written += 1;
        }
        let _ = self.out.flush();
        info!("Scene stream closed after {} frames", written);
        written
    }

    fn write_header(&mut self, width_px: f64, config: Configuration) -> io::Result<()> {
        let header = json!({
            "format": "tap-timeline",
            "version": env!("CARGO_PKG_VERSION"),
            "width_px": width_px,
            "config": config,
        });
        writeln!(self.out, "{}", header)?;
        self.out.flush()
    }
}

fn write_frame<W: Write>(out: &mut W, frame: &SceneFrame) -> io::Result<()> {
    let line = serde_json::to_string(frame).map_err(io::Error::other)?;
    writeln!(out, "{}", line)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;
    use crate::render::{render, RenderInput};
    use crossbeam_channel::unbounded;

    fn frame(held: bool) -> SceneFrame {
        SceneFrame {
            timestamp_ms: 10.0,
            mode: Mode::Recording,
            config: Configuration::default(),
            held: if held { vec!["a".into()] } else { Vec::new() },
            scene: render(&RenderInput {
                offsets: vec![0.0, 50.0],
                mode: Mode::Recording,
                config: Configuration::default(),
                live_elapsed_ms: None,
                width_px: 100.0,
            }),
            log: Vec::new(),
            log_len: 0,
        }
    }

    #[test]
    fn writes_header_then_settled_frames() {
        let (tx, rx) = unbounded();
        tx.send(frame(true)).unwrap();
        tx.send(frame(false)).unwrap();
        drop(tx);

        let mut buf = Vec::new();
        let written = SceneWriter::new(rx, &mut buf).run(100.0, Configuration::default());
        assert_eq!(written, 1);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let header: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(header["format"], "tap-timeline");
        assert_eq!(header["config"]["number_of_beats"], 4);
        let body: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(body["mode"], "Recording");
        assert_eq!(body["config"]["pickup_notes_count"], 0);
        assert_eq!(body["scene"]["blocks"][1]["start_px"], 100.0);
        assert!(body["scene"]["axis"].is_null());
    }

    #[test]
    fn live_frames_when_enabled() {
        let (tx, rx) = unbounded();
        tx.send(frame(true)).unwrap();
        drop(tx);
        let mut buf = Vec::new();
        let written = SceneWriter::new(rx, &mut buf)
            .with_live_frames(true)
            .run(100.0, Configuration::default());
        assert_eq!(written, 1);
    }
}
