//! Timeline renderer: maps recorded offsets onto a fixed pixel width.
//!
//! `render` is a pure function of its input. It holds no state between calls
//! and never touches the capture session; the session hands it a
//! [`RenderInput`] snapshot instead.

use crate::config::Configuration;
use crate::mode::Mode;
use log::{trace, warn};
use serde::Serialize;

/// Blocks narrower than this are widened so they stay visible.
pub const MIN_BLOCK_WIDTH_PX: f64 = 1.0;

/// Linear map from `[0, domain_max]` ms to `[0, range_max]` pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain_max: f64,
    range_max: f64,
}

impl LinearScale {
    pub fn new(domain_max: f64, range_max: f64) -> Self {
        Self { domain_max, range_max }
    }

    /// A zero-length domain maps everything to the left edge.
    pub fn map(&self, value: f64) -> f64 {
        if self.domain_max <= 0.0 {
            return 0.0;
        }
        value / self.domain_max * self.range_max
    }
}

/// Snapshot of everything the renderer reads.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInput {
    /// Timeline offsets in ms, non-decreasing, first entry 0.
    pub offsets: Vec<f64>,
    pub mode: Mode,
    pub config: Configuration,
    /// Live time since the first onset, present only while a gesture is held.
    pub live_elapsed_ms: Option<f64>,
    pub width_px: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub index: usize,
    pub start_px: f64,
    pub width_px: f64,
    pub offset_ms: f64,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTick {
    pub label: u32,
    pub px: f64,
}

/// Beat grid anchored at the first beat after the pickup notes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub origin_px: f64,
    pub width_px: f64,
    pub ticks: Vec<AxisTick>,
    /// True when the pickup count was past the end of the timeline and the
    /// grid fell back to the first entry.
    pub anchor_clamped: bool,
}

impl Axis {
    pub fn tick_labels(&self) -> Vec<u32> {
        self.ticks.iter().map(|t| t.label).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub width_px: f64,
    pub last_recorded_ms: f64,
    pub blocks: Vec<Block>,
    pub axis: Option<Axis>,
}

impl Scene {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// End of the drawable domain: the live clock while held, else the last entry.
pub fn last_recorded_time(input: &RenderInput) -> f64 {
    let last = input.offsets.last().copied().unwrap_or(0.0);
    match input.live_elapsed_ms {
        Some(live) => live.max(last),
        None => last,
    }
}

pub fn render(input: &RenderInput) -> Scene {
    let last_recorded_ms = last_recorded_time(input);
    let scale = LinearScale::new(last_recorded_ms, input.width_px);

    let axis = match input.mode {
        Mode::Analyzing => build_axis(input, &scale),
        Mode::Recording => None,
    };

    let blocks = input
        .offsets
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = input.offsets.get(i + 1).copied().unwrap_or(last_recorded_ms);
            let start_px = scale.map(start);
            let raw_width = scale.map(end) - start_px;
            if raw_width < MIN_BLOCK_WIDTH_PX {
                trace!("block {} width {:.3}px widened to {}px", i, raw_width, MIN_BLOCK_WIDTH_PX);
            }
            Block {
                index: i,
                start_px,
                width_px: raw_width.max(MIN_BLOCK_WIDTH_PX),
                offset_ms: start,
                duration_ms: end - start,
            }
        })
        .collect();

    Scene {
        width_px: input.width_px,
        last_recorded_ms,
        blocks,
        axis,
    }
}

fn build_axis(input: &RenderInput, scale: &LinearScale) -> Option<Axis> {
    if input.offsets.is_empty() {
        return None;
    }
    let pickup = input.config.pickup_notes_count();
    let (anchor_idx, anchor_clamped) = if pickup < input.offsets.len() {
        (pickup, false)
    } else {
        warn!(
            "pickup notes count {} exceeds {} recorded notes; anchoring beat grid at the first note",
            pickup,
            input.offsets.len()
        );
        (0, true)
    };

    let origin_px = scale.map(input.offsets[anchor_idx]);
    let width_px = (input.width_px - origin_px).max(0.0);
    let beats = input.config.number_of_beats();
    let step = width_px / beats as f64;
    let ticks = (0..=beats)
        .map(|label| AxisTick { label, px: origin_px + label as f64 * step })
        .collect();

    Some(Axis {
        origin_px,
        width_px,
        ticks,
        anchor_clamped,
    })
}
