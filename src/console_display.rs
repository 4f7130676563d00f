use crate::coordinator::SceneFrame;
use crate::mode::Mode;
use crate::render::Scene;
use crossbeam_channel::Receiver;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Log lines kept on screen.
const SCROLLBACK: usize = 8;

/// Renders scene frames as an ASCII timeline in the terminal.
///
/// One terminal column stands for one scene pixel, so the coordinator
/// should be configured with `width == columns`.
pub struct ConsoleDisplay {
    rx: Receiver<SceneFrame>,
    update_hz: u32,
    columns: usize,
}

impl ConsoleDisplay {
    pub fn new(rx: Receiver<SceneFrame>, update_hz: u32, columns: usize) -> Self {
        Self { rx, update_hz, columns }
    }

    pub fn run(&self) {
        let min_gap = if self.update_hz == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / self.update_hz as f64)
        };
        let mut last_draw: Option<Instant> = None;
        let mut stdout = io::stdout();

        for frame in self.rx.iter() {
            // Live frames are throttled; frames after a release or stop always draw.
            let live = !frame.held.is_empty();
            if live && last_draw.is_some_and(|t| t.elapsed() < min_gap) {
                continue;
            }
            last_draw = Some(Instant::now());

            // Clear screen and move cursor home
            print!("\x1b[2J\x1b[H");
            print!("{}", draw_frame(&frame, self.columns));
            let _ = stdout.flush();
        }
    }
}

/// Full screen for one frame: header, timeline, ruler, log tail.
pub fn draw_frame(frame: &SceneFrame, columns: usize) -> String {
    let mut out = String::new();
    let mode = match frame.mode {
        Mode::Recording => "RECORDING",
        Mode::Analyzing => "ANALYZING",
    };
    out.push_str(&format!(
        "TAP TIMELINE  [{}]  {} notes  {:.0}ms  grid {}+{}\n",
        mode,
        frame.scene.blocks.len(),
        frame.scene.last_recorded_ms,
        frame.config.pickup_notes_count(),
        frame.config.number_of_beats()
    ));
    if !frame.held.is_empty() {
        let held: Vec<&str> = frame.held.iter().map(|l| l.as_str()).collect();
        out.push_str(&format!("held: {}\n", held.join(" ")));
    }
    out.push('\n');
    out.push_str(&timeline_row(&frame.scene, columns));
    out.push('\n');
    if let Some((ruler, labels)) = ruler_rows(&frame.scene, columns) {
        out.push_str(&ruler);
        out.push('\n');
        out.push_str(&labels);
        out.push('\n');
    }
    out.push('\n');
    let skip = frame.log.len().saturating_sub(SCROLLBACK);
    for entry in &frame.log[skip..] {
        out.push_str(&format!("  {}\n", entry));
    }
    out
}

/// Blocks alternate fill characters so adjacent notes stay distinguishable.
pub fn timeline_row(scene: &Scene, columns: usize) -> String {
    let mut row = vec![' '; columns];
    let scale = column_scale(scene, columns);
    for block in &scene.blocks {
        let fill = if block.index % 2 == 0 { '█' } else { '▒' };
        let start = to_column(block.start_px * scale, columns);
        let end = to_edge((block.start_px + block.width_px) * scale, columns).max(start + 1);
        for cell in row.iter_mut().take(end.min(columns)).skip(start) {
            *cell = fill;
        }
    }
    row.into_iter().collect()
}

/// Beat ruler and its labels, if the scene has an axis.
pub fn ruler_rows(scene: &Scene, columns: usize) -> Option<(String, String)> {
    let axis = scene.axis.as_ref()?;
    let scale = column_scale(scene, columns);
    let mut ruler = vec![' '; columns];
    let mut labels = vec![' '; columns];

    let origin = to_column(axis.origin_px * scale, columns);
    let end = to_edge((axis.origin_px + axis.width_px) * scale, columns);
    for cell in ruler.iter_mut().take(end).skip(origin) {
        *cell = '─';
    }
    for tick in &axis.ticks {
        let col = to_column(tick.px * scale, columns);
        if let Some(cell) = ruler.get_mut(col) {
            *cell = '┼';
        }
        for (i, ch) in tick.label.to_string().chars().enumerate() {
            if let Some(cell) = labels.get_mut(col + i) {
                *cell = ch;
            }
        }
    }
    Some((ruler.into_iter().collect(), labels.into_iter().collect()))
}

fn column_scale(scene: &Scene, columns: usize) -> f64 {
    if scene.width_px <= 0.0 {
        0.0
    } else {
        columns as f64 / scene.width_px
    }
}

/// Column index for a position, kept on screen.
fn to_column(pos: f64, columns: usize) -> usize {
    let max = columns.saturating_sub(1);
    (pos.floor().max(0.0) as usize).min(max)
}

/// Exclusive end column for a span ending at `pos`.
fn to_edge(pos: f64, columns: usize) -> usize {
    (pos.floor().max(0.0) as usize).min(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::render::{render, RenderInput};
    use crate::types::{Direction, LogEntry};

    fn scene(offsets: &[f64], mode: Mode) -> Scene {
        render(&RenderInput {
            offsets: offsets.to_vec(),
            mode,
            config: Configuration::new(1, 4).unwrap(),
            live_elapsed_ms: None,
            width_px: 40.0,
        })
    }

    #[test]
    fn timeline_row_alternates_fill() {
        let row = timeline_row(&scene(&[0.0, 100.0, 200.0], Mode::Recording), 40);
        let cells: Vec<char> = row.chars().collect();
        assert_eq!(cells.len(), 40);
        assert_eq!(cells[0], '█');
        assert_eq!(cells[19], '█');
        assert_eq!(cells[20], '▒');
        assert_eq!(cells[38], '▒');
        // The closing boundary is a one-column mark at the right edge.
        assert_eq!(cells[39], '█');
    }

    #[test]
    fn ruler_marks_every_beat() {
        let s = scene(&[0.0, 200.0, 400.0, 600.0, 800.0], Mode::Analyzing);
        let (ruler, labels) = ruler_rows(&s, 40).unwrap();
        assert_eq!(ruler.chars().filter(|&c| c == '┼').count(), 5);
        assert_eq!(ruler.chars().nth(10), Some('┼'));
        assert!(ruler.starts_with("          ┼"));
        assert_eq!(labels.chars().nth(10), Some('0'));
    }

    #[test]
    fn no_ruler_while_recording() {
        assert!(ruler_rows(&scene(&[0.0, 10.0], Mode::Recording), 40).is_none());
    }

    #[test]
    fn frame_shows_log_tail() {
        let log: Vec<LogEntry> = (0..12)
            .map(|i| LogEntry { direction: Direction::Start, magnitude_ms: i as f64 })
            .collect();
        let frame = SceneFrame {
            timestamp_ms: 0.0,
            mode: Mode::Recording,
            config: Configuration::default(),
            held: vec!["a".into()],
            scene: scene(&[0.0], Mode::Recording),
            log,
            log_len: 12,
        };
        let text = draw_frame(&frame, 40);
        assert!(text.contains("RECORDING"));
        assert!(text.contains("grid 0+4"));
        assert!(text.contains("held: a"));
        assert!(text.contains("↓ 11.00ms"));
        assert!(!text.contains("↓ 3.00ms"));
    }
}
