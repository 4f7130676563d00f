use crate::config::{ConfigError, Configuration, IgnoreSet};
use crate::mode::{Mode, ModeController};
use crate::registry::GestureRegistry;
use crate::render::RenderInput;
use crate::timeline::NoteTimeline;
use crate::types::*;
use log::{debug, info, trace};

/// Why an input event left the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Session is in Analyzing mode.
    NotRecording,
    /// Key is reserved for browser/system shortcuts.
    Reserved,
    /// Onset for a label that is already held (hardware key repeat).
    AlreadyHeld,
    /// Release for a label that is not held.
    NotHeld,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Recorded,
    Ignored(IgnoreReason),
}

impl EventOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, EventOutcome::Recorded)
    }
}

/// One capture session: held gestures, the note timeline, mode, and log.
///
/// Every mutation goes through the handlers below, each of which runs to
/// completion. Callers are expected to re-render after any handler returns
/// [`EventOutcome::Recorded`].
///
/// # Release boundaries
///
/// A release appends a provisional boundary marking the end of the last
/// note. The next onset retracts it and appends its own offset instead.
/// If another release arrives first (overlapping gestures), the pending
/// boundary is confirmed and the new one becomes provisional, unless both
/// fall on the same instant, in which case the new one simply replaces it.
pub struct CaptureSession {
    registry: GestureRegistry,
    timeline: NoteTimeline,
    mode: ModeController,
    config: Configuration,
    ignored: IgnoreSet,
    last_onset_ms: Option<f64>,
    log: Vec<LogEntry>,
}

impl CaptureSession {
    pub fn new(config: Configuration, ignored: IgnoreSet) -> Self {
        Self {
            registry: GestureRegistry::new(),
            timeline: NoteTimeline::new(),
            mode: ModeController::new(),
            config,
            ignored,
            last_onset_ms: None,
            log: Vec::new(),
        }
    }

    // ─── Gesture handlers ───────────────────────────────────────────────

    pub fn on_gesture_start(&mut self, label: GestureLabel, timestamp_ms: f64) -> EventOutcome {
        if let Some(reason) = self.reject(&label) {
            return ignored(reason, "onset", &label);
        }
        if !self.registry.press(label.clone(), timestamp_ms) {
            return ignored(IgnoreReason::AlreadyHeld, "onset", &label);
        }

        let gap = self.last_onset_ms.map(|last| timestamp_ms - last);
        self.last_onset_ms = Some(timestamp_ms);

        if let Some(b) = self.timeline.retract_provisional() {
            trace!("onset retracts provisional boundary at {:.2}ms", b.offset_ms);
        }
        let offset = self.timeline.append(timestamp_ms);

        let entry = LogEntry {
            direction: Direction::Start,
            magnitude_ms: gap.unwrap_or(0.0),
        };
        debug!("\"{}\" down at +{:.2}ms  {}", label, offset, entry);
        self.log.push(entry);
        EventOutcome::Recorded
    }

    pub fn on_gesture_stop(&mut self, label: GestureLabel, timestamp_ms: f64) -> EventOutcome {
        if let Some(reason) = self.reject(&label) {
            return ignored(reason, "release", &label);
        }
        let Some(pressed_at) = self.registry.release(&label) else {
            return ignored(IgnoreReason::NotHeld, "release", &label);
        };
        let duration = timestamp_ms - pressed_at;

        if let Some(pending) = self.timeline.pending_provisional() {
            if self.timeline.normalize(timestamp_ms) == pending.offset_ms {
                self.timeline.retract_provisional();
            } else {
                self.timeline.confirm_provisional();
            }
        }
        let offset = self.timeline.append_provisional(timestamp_ms);

        let entry = LogEntry {
            direction: Direction::Stop,
            magnitude_ms: duration,
        };
        debug!("\"{}\" up at +{:.2}ms  {}", label, offset, entry);
        self.log.push(entry);
        EventOutcome::Recorded
    }

    /// Release every held gesture at `timestamp_ms`. Returns how many were released.
    pub fn force_release_all(&mut self, timestamp_ms: f64) -> usize {
        let mut released = 0;
        for label in self.registry.labels() {
            if self.on_gesture_stop(label, timestamp_ms).is_recorded() {
                released += 1;
            }
        }
        if released > 0 {
            debug!("force-released {} held gesture(s)", released);
        }
        released
    }

    /// The pointer left the tap surface. Only the tap gesture is released;
    /// held keys are unaffected.
    pub fn release_pointer(&mut self, timestamp_ms: f64) -> EventOutcome {
        let tap = GestureLabel::tap();
        if !self.registry.contains(&tap) {
            return EventOutcome::Ignored(IgnoreReason::NotHeld);
        }
        self.on_gesture_stop(tap, timestamp_ms)
    }

    // ─── Mode, configuration, lifecycle ─────────────────────────────────

    /// Stop recording: release anything held, then switch to Analyzing.
    /// Returns false if the session had already stopped.
    pub fn stop(&mut self, timestamp_ms: f64) -> bool {
        if !self.mode.is_recording() {
            return false;
        }
        self.force_release_all(timestamp_ms);
        debug_assert!(self.registry.is_empty());
        self.mode.finish();
        info!(
            "Recording stopped: {} notes, last boundary at {:.2}ms",
            self.timeline.len(),
            self.timeline.last_offset().unwrap_or(0.0)
        );
        true
    }

    pub fn configure(&mut self, field: ConfigField, raw: &str) -> Result<(), ConfigError> {
        self.config.apply_raw(field, raw)?;
        debug!("{:?} set to {}", field, raw.trim());
        Ok(())
    }

    /// Reinitialize the session. Configuration and the ignore set survive.
    pub fn reset(&mut self) {
        *self = Self::new(self.config, self.ignored.clone());
        info!("Session reset");
    }

    /// Dispatch one input-boundary event. Returns true if state changed.
    pub fn apply(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::Onset { label, timestamp_ms } => {
                self.on_gesture_start(label, timestamp_ms).is_recorded()
            }
            InputEvent::Release { label, timestamp_ms } => {
                self.on_gesture_stop(label, timestamp_ms).is_recorded()
            }
            InputEvent::LeaveWhileHeld { timestamp_ms } => {
                self.release_pointer(timestamp_ms).is_recorded()
            }
            InputEvent::Interrupt { timestamp_ms } => self.stop(timestamp_ms),
            InputEvent::Configure { field, value } => match self.configure(field, &value) {
                Ok(()) => true,
                Err(e) => {
                    debug!("configuration rejected: {}", e);
                    false
                }
            },
            InputEvent::Reset => {
                self.reset();
                true
            }
        }
    }

    // ─── Read-only views ────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    pub fn config(&self) -> Configuration {
        self.config
    }

    pub fn timeline(&self) -> &NoteTimeline {
        &self.timeline
    }

    pub fn offsets(&self) -> Vec<f64> {
        self.timeline.offsets()
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn held_labels(&self) -> Vec<GestureLabel> {
        self.registry.labels()
    }

    pub fn is_held(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Renderer input for the moment `now_ms` (absolute, same clock as events).
    pub fn render_input(&self, now_ms: f64, width_px: f64) -> RenderInput {
        let live_elapsed_ms = match self.timeline.first_onset_ms() {
            Some(first) if self.is_held() => Some(now_ms - first),
            _ => None,
        };
        RenderInput {
            offsets: self.timeline.offsets(),
            mode: self.mode.mode(),
            config: self.config,
            live_elapsed_ms,
            width_px,
        }
    }

    fn reject(&self, label: &GestureLabel) -> Option<IgnoreReason> {
        if !self.mode.is_recording() {
            Some(IgnoreReason::NotRecording)
        } else if self.ignored.contains(label) {
            Some(IgnoreReason::Reserved)
        } else {
            None
        }
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new(Configuration::default(), IgnoreSet::default())
    }
}

fn ignored(reason: IgnoreReason, what: &str, label: &GestureLabel) -> EventOutcome {
    debug!("ignored {} for \"{}\": {:?}", what, label, reason);
    EventOutcome::Ignored(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> CaptureSession {
        CaptureSession::default()
    }

    #[test]
    fn release_then_onset_replaces_provisional() {
        let mut s = session();
        s.on_gesture_start(GestureLabel::tap(), 100.0);
        assert_eq!(s.offsets(), vec![0.0]);
        s.on_gesture_stop(GestureLabel::tap(), 300.0);
        assert_eq!(s.offsets(), vec![0.0, 200.0]);
        assert!(s.timeline().pending_provisional().is_some());
        s.on_gesture_start(GestureLabel::tap(), 350.0);
        assert_eq!(s.offsets(), vec![0.0, 250.0]);
        assert!(s.timeline().pending_provisional().is_none());
    }

    #[test]
    fn overlapping_gestures_share_one_timeline() {
        let mut s = session();
        s.on_gesture_start("a".into(), 0.0);
        s.on_gesture_start("b".into(), 50.0);
        s.on_gesture_stop("a".into(), 100.0);
        s.on_gesture_stop("b".into(), 150.0);
        assert_eq!(s.offsets(), vec![0.0, 50.0, 100.0, 150.0]);
        let provisional: Vec<bool> =
            s.timeline().entries().iter().map(|b| b.provisional).collect();
        assert_eq!(provisional, vec![false, false, false, true]);
    }

    #[test]
    fn duplicate_onset_is_ignored() {
        let mut s = session();
        assert!(s.on_gesture_start("a".into(), 0.0).is_recorded());
        assert_eq!(
            s.on_gesture_start("a".into(), 30.0),
            EventOutcome::Ignored(IgnoreReason::AlreadyHeld)
        );
        assert_eq!(s.offsets(), vec![0.0]);
        assert_eq!(s.log().len(), 1);
    }

    #[test]
    fn release_without_onset_is_ignored() {
        let mut s = session();
        assert_eq!(
            s.on_gesture_stop("a".into(), 10.0),
            EventOutcome::Ignored(IgnoreReason::NotHeld)
        );
        assert!(s.timeline().is_empty());
        assert!(s.log().is_empty());
    }

    #[test]
    fn reserved_keys_never_become_gestures() {
        let mut s = session();
        assert_eq!(
            s.on_gesture_start("Shift".into(), 0.0),
            EventOutcome::Ignored(IgnoreReason::Reserved)
        );
        assert!(!s.is_held());
        assert!(s.timeline().is_empty());
    }

    #[test]
    fn log_carries_gaps_and_durations() {
        let mut s = session();
        s.on_gesture_start("a".into(), 1000.0);
        s.on_gesture_stop("a".into(), 1120.0);
        s.on_gesture_start("a".into(), 1500.0);
        let lines: Vec<String> = s.log().iter().map(|e| e.to_string()).collect();
        assert_eq!(lines, ["↓ 0.00ms", "↑ 120.00ms", "↓ 500.00ms"]);
    }

    #[test]
    fn retracted_release_still_logged_once() {
        let mut s = session();
        s.on_gesture_start("a".into(), 0.0);
        s.on_gesture_stop("a".into(), 40.0);
        s.on_gesture_start("a".into(), 90.0);
        assert_eq!(s.offsets(), vec![0.0, 90.0]);
        let stops = s.log().iter().filter(|e| e.direction == Direction::Stop).count();
        assert_eq!(stops, 1);
    }

    #[test]
    fn stop_releases_held_and_locks_input() {
        let mut s = session();
        s.on_gesture_start("a".into(), 0.0);
        s.on_gesture_start("b".into(), 100.0);
        assert!(s.stop(400.0));
        assert!(!s.is_held());
        assert_eq!(s.mode(), Mode::Analyzing);
        // Both releases land on the same instant: one trailing boundary.
        assert_eq!(s.offsets(), vec![0.0, 100.0, 400.0]);

        assert_eq!(
            s.on_gesture_start("a".into(), 500.0),
            EventOutcome::Ignored(IgnoreReason::NotRecording)
        );
        assert!(!s.stop(600.0));
        assert_eq!(s.offsets(), vec![0.0, 100.0, 400.0]);
    }

    #[test]
    fn pointer_leave_only_releases_tap() {
        let mut s = session();
        s.on_gesture_start(GestureLabel::tap(), 0.0);
        s.on_gesture_start("k".into(), 10.0);
        assert!(s.release_pointer(60.0).is_recorded());
        assert_eq!(s.held_labels(), vec![GestureLabel::new("k")]);
        assert!(!s.release_pointer(70.0).is_recorded());
    }

    #[test]
    fn force_release_all_empties_registry() {
        let mut s = session();
        s.on_gesture_start("a".into(), 0.0);
        s.on_gesture_start("b".into(), 10.0);
        assert_eq!(s.force_release_all(50.0), 2);
        assert!(!s.is_held());
        assert_eq!(s.mode(), Mode::Recording);
        assert_eq!(s.force_release_all(60.0), 0);
    }

    #[test]
    fn reset_keeps_configuration() {
        let mut s = session();
        s.configure(ConfigField::NumberOfBeats, "8").unwrap();
        s.on_gesture_start("a".into(), 0.0);
        s.stop(10.0);
        s.reset();
        assert_eq!(s.mode(), Mode::Recording);
        assert!(s.timeline().is_empty());
        assert!(s.timeline().first_onset_ms().is_none());
        assert!(s.log().is_empty());
        assert_eq!(s.config().number_of_beats(), 8);
        // Gap restarts from nothing after reset.
        s.on_gesture_start("a".into(), 5000.0);
        assert_eq!(s.log()[0].magnitude_ms, 0.0);
        assert_eq!(s.offsets(), vec![0.0]);
    }

    #[test]
    fn invalid_configure_keeps_previous() {
        let mut s = session();
        s.configure(ConfigField::NumberOfBeats, "8").unwrap();
        assert!(!s.apply(InputEvent::Configure {
            field: ConfigField::NumberOfBeats,
            value: "-1".into(),
        }));
        assert_eq!(s.config().number_of_beats(), 8);
    }

    #[test]
    fn render_input_tracks_live_time_only_while_held() {
        let mut s = session();
        s.on_gesture_start("a".into(), 1000.0);
        let live = s.render_input(1250.0, 500.0);
        assert_eq!(live.live_elapsed_ms, Some(250.0));
        s.on_gesture_stop("a".into(), 1300.0);
        let idle = s.render_input(2000.0, 500.0);
        assert_eq!(idle.live_elapsed_ms, None);
        assert_eq!(idle.offsets, vec![0.0, 300.0]);
    }

    #[test]
    fn timeline_length_rule_holds_across_random_walk() {
        let mut s = session();
        let labels = ["a", "b", "c"];
        let mut t = 0.0;
        for step in 0..200usize {
            t += ((step * 37) % 23) as f64;
            let label: GestureLabel = labels[(step * 7) % 3].into();
            let prior_len = s.timeline().len();
            let prior_provisional = s.timeline().pending_provisional().is_some();
            if s.held_labels().contains(&label) {
                s.on_gesture_stop(label, t);
            } else if s.on_gesture_start(label, t).is_recorded() {
                let expected = prior_len - usize::from(prior_provisional) + 1;
                assert_eq!(s.timeline().len(), expected);
            }
            let offsets = s.offsets();
            assert_eq!(offsets[0], 0.0);
            assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
            let pending = s.timeline().entries().iter().filter(|b| b.provisional).count();
            assert!(pending <= 1);
        }
    }
}
