use rand::Rng;

use crate::util::{CANVAS_HEIGHT, CANVAS_WIDTH};

pub const TARGET_COUNT: usize = 5;
pub const TARGET_RADIUS: f64 = 20.0;

/// A circle the player has to touch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// Owns the active targets. The set holds between 0 and [`TARGET_COUNT`]
/// circles and is refilled as soon as a removal empties it.
#[derive(Debug, Clone, Default)]
pub struct TargetManager {
    targets: Vec<Target>,
}

impl TargetManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Replace the active set with a fresh batch placed fully on the canvas
    pub fn populate<R: Rng>(&mut self, rng: &mut R) {
        self.targets = (0..TARGET_COUNT)
            .map(|_| Target {
                x: rng.gen_range(TARGET_RADIUS..CANVAS_WIDTH - TARGET_RADIUS),
                y: rng.gen_range(TARGET_RADIUS..CANVAS_HEIGHT - TARGET_RADIUS),
                radius: TARGET_RADIUS,
            })
            .collect();
    }

    /// Remove the target at `index`. Returns true when the removal emptied the
    /// set and it was repopulated on the spot.
    pub fn remove<R: Rng>(&mut self, index: usize, rng: &mut R) -> bool {
        if index >= self.targets.len() {
            return false;
        }
        self.targets.remove(index);
        if self.targets.is_empty() {
            self.populate(rng);
            return true;
        }
        false
    }

    /// Safety-net refill used by the periodic cadence
    pub fn repopulate_if_empty<R: Rng>(&mut self, rng: &mut R) -> bool {
        if self.targets.is_empty() {
            self.populate(rng);
            return true;
        }
        false
    }

    pub fn clear(&mut self) {
        self.targets.clear();
    }

    #[cfg(test)]
    pub(crate) fn set(&mut self, targets: Vec<Target>) {
        self.targets = targets;
    }
}
