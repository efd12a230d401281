use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Interpolation trait for values that can be smoothly transitioned
pub trait Interpolatable: Copy {
    fn lerp(&self, other: &Self, t: f64) -> Self;

    /// Largest per-component distance to `other`
    fn distance(&self, other: &Self) -> f64;
}

impl Interpolatable for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Interpolation::linear(*self, *other, t)
    }

    fn distance(&self, other: &Self) -> f64 {
        (other - self).abs()
    }
}

impl Interpolatable for Point {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Point::new(
            Interpolation::linear(self.x, other.x, t),
            Interpolation::linear(self.y, other.y, t),
        )
    }

    fn distance(&self, other: &Self) -> f64 {
        (other.x - self.x).abs().max((other.y - self.y).abs())
    }
}

/// Main interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two f64 values
    pub fn linear(start: f64, end: f64, t: f64) -> f64 {
        start + (end - start) * t
    }
}

/// Frame-count based exponential smoothing.
///
/// Each step moves a value a fixed fraction of the remaining distance toward
/// its target. The step is not scaled by frame time; the frame loop runs on a
/// capped clock. Once the remaining distance drops below
/// `snap_epsilon` the value lands exactly on the target, which makes a settled
/// value a fixed point of [`Smoothing::step`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Smoothing {
    pub speed: f64,
    pub snap_epsilon: f64,
}

impl Smoothing {
    pub fn new(speed: f64, snap_epsilon: f64) -> Self {
        Self {
            speed: speed.clamp(f64::EPSILON, 1.0),
            snap_epsilon: snap_epsilon.max(0.0),
        }
    }

    /// Advances `current` one frame toward `target`
    pub fn step<T: Interpolatable>(&self, current: T, target: T) -> T {
        let next = current.lerp(&target, self.speed);
        if next.distance(&target) < self.snap_epsilon {
            target
        } else {
            next
        }
    }

    /// Number of frames until `current` settles on `target`, if within `limit`
    pub fn frames_to_settle<T: Interpolatable>(&self, current: T, target: T, limit: usize) -> Option<usize> {
        let mut value = current;
        for frame in 0..=limit {
            if value.distance(&target) == 0.0 {
                return Some(frame);
            }
            value = self.step(value, target);
        }
        None
    }
}

impl Default for Smoothing {
    fn default() -> Self {
        Self::new(
            crate::core::constants::SMOOTH_SPEED,
            crate::core::constants::SNAP_EPSILON,
        )
    }
}
