//! JSONL event scripts: one `InputEvent` per line, replayed in real time.
//!
//! ```text
//! # four taps, then stop
//! {"type":"onset","label":"tap","timestamp_ms":0}
//! {"type":"release","label":"tap","timestamp_ms":120}
//! {"type":"interrupt","timestamp_ms":2000}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Works with any
//! `BufRead`: files, in-memory buffers, stdin.

use crate::types::{InputEvent, SessionClock};
use crossbeam_channel::Sender;
use log::{info, warn};
use std::io::BufRead;
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("read script: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Line-by-line event script reader.
pub struct ScriptReader<R: BufRead> {
    reader: R,
    line_no: usize,
    line_buf: String,
}

impl<R: BufRead> ScriptReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            line_buf: String::new(),
        }
    }

    /// Read the next event. Returns `None` at EOF.
    pub fn next_event(&mut self) -> Option<Result<InputEvent, ScriptError>> {
        loop {
            self.line_buf.clear();
            match self.reader.read_line(&mut self.line_buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_no += 1;
                    let trimmed = self.line_buf.trim();
                    if trimmed.is_empty() || trimmed.starts_with('#') {
                        continue;
                    }
                    return Some(serde_json::from_str(trimmed).map_err(|source| {
                        ScriptError::Parse {
                            line: self.line_no,
                            source,
                        }
                    }));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    /// Read every event, skipping (and warning about) unparseable lines.
    /// I/O errors abort.
    pub fn read_all(mut self) -> Result<Vec<InputEvent>, ScriptError> {
        let mut events = Vec::new();
        while let Some(result) = self.next_event() {
            match result {
                Ok(event) => events.push(event),
                Err(ScriptError::Io(e)) => return Err(ScriptError::Io(e)),
                Err(e) => warn!("skipping script {}", e),
            }
        }
        Ok(events)
    }
}

/// Send `events` to `tx`, holding each timestamped event back until the
/// session clock reaches its timestamp. Returns how many were sent.
pub fn replay(events: Vec<InputEvent>, clock: &SessionClock, tx: &Sender<InputEvent>) -> usize {
    info!("Replaying {} scripted events", events.len());
    let mut sent = 0;
    for event in events {
        if let Some(at) = event.timestamp_ms() {
            let wait = at - clock.now_ms();
            if wait > 0.0 {
                thread::sleep(Duration::from_secs_f64(wait / 1000.0));
            }
        }
        if tx.send(event).is_err() {
            warn!("Coordinator gone, script replay stopped after {} events", sent);
            break;
        }
        sent += 1;
    }
    sent
}
