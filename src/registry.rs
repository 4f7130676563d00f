use crate::types::GestureLabel;

/// Gestures currently held, with the timestamp each was pressed.
///
/// Kept in press order so forced releases happen in a stable order.
/// A label appears at most once.
#[derive(Debug, Clone, Default)]
pub struct GestureRegistry {
    held: Vec<(GestureLabel, f64)>,
}

impl GestureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press. Returns false if the label is already held.
    pub fn press(&mut self, label: GestureLabel, timestamp_ms: f64) -> bool {
        if self.contains(&label) {
            return false;
        }
        self.held.push((label, timestamp_ms));
        true
    }

    /// Remove a held label, returning when it was pressed.
    pub fn release(&mut self, label: &GestureLabel) -> Option<f64> {
        let idx = self.held.iter().position(|(l, _)| l == label)?;
        Some(self.held.remove(idx).1)
    }

    pub fn contains(&self, label: &GestureLabel) -> bool {
        self.held.iter().any(|(l, _)| l == label)
    }

    pub fn pressed_at(&self, label: &GestureLabel) -> Option<f64> {
        self.held.iter().find(|(l, _)| l == label).map(|&(_, t)| t)
    }

    pub fn labels(&self) -> Vec<GestureLabel> {
        self.held.iter().map(|(l, _)| l.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}
