//! Cosine learning-rate schedule.
//!
//! The multiplier decays from 1.0 at epoch 0 to a configured floor
//! fraction of the base rate at the final epoch:
//!
//! ```text
//! lf(e) = ((1 + cos(e * pi / total_epochs)) / 2) * (1 - floor) + floor
//! ```
//!
//! The schedule advances once per epoch; progress past the final epoch is
//! clamped so the rate never drops below the floor.

use std::f64::consts::PI;

/// Per-epoch cosine decay toward a floor fraction of the base rate
#[derive(Debug, Clone)]
pub struct CosineSchedule {
    base_lr: f64,
    floor_fraction: f64,
    total_epochs: usize,
    epoch: usize,
}

impl CosineSchedule {
    /// Create a new schedule starting at epoch 0
    pub fn new(base_lr: f64, floor_fraction: f64, total_epochs: usize) -> Self {
        Self {
            base_lr,
            floor_fraction,
            total_epochs,
            epoch: 0,
        }
    }

    /// The decay multiplier at a given epoch
    pub fn multiplier(&self, epoch: usize) -> f64 {
        let progress = (epoch as f64 / self.total_epochs as f64).min(1.0);
        ((1.0 + (progress * PI).cos()) / 2.0) * (1.0 - self.floor_fraction) + self.floor_fraction
    }

    /// The learning rate for the current epoch
    pub fn lr(&self) -> f64 {
        self.base_lr * self.multiplier(self.epoch)
    }

    /// Advance the schedule by one epoch (call at the end of each epoch)
    pub fn step(&mut self) {
        self.epoch += 1;
    }

    /// The current epoch
    pub fn epoch(&self) -> usize {
        self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_starts_at_one() {
        let schedule = CosineSchedule::new(0.01, 0.01, 50);
        assert_eq!(schedule.multiplier(0), 1.0);
    }

    #[test]
    fn test_multiplier_ends_at_floor() {
        let schedule = CosineSchedule::new(0.01, 0.01, 50);
        assert!((schedule.multiplier(50) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_multiplier_monotonically_non_increasing() {
        let schedule = CosineSchedule::new(0.1, 0.05, 30);
        let mut previous = schedule.multiplier(0);
        for epoch in 1..=30 {
            let current = schedule.multiplier(epoch);
            assert!(
                current <= previous,
                "multiplier increased at epoch {epoch}: {previous} -> {current}"
            );
            previous = current;
        }
    }

    #[test]
    fn test_single_epoch_run_starts_at_one() {
        // total_epochs=1, lrf=0.01: the cosine term is exactly 1 at x=0
        let schedule = CosineSchedule::new(0.01, 0.01, 1);
        assert_eq!(schedule.multiplier(0), 1.0);
        assert_eq!(schedule.lr(), 0.01);
    }

    #[test]
    fn test_progress_is_clamped_past_the_end() {
        let schedule = CosineSchedule::new(0.01, 0.1, 10);
        assert!((schedule.multiplier(15) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_step_advances_the_rate() {
        let mut schedule = CosineSchedule::new(0.01, 0.01, 10);
        let initial = schedule.lr();
        assert_eq!(initial, 0.01);

        schedule.step();
        assert_eq!(schedule.epoch(), 1);
        assert!(schedule.lr() < initial);
        assert_eq!(schedule.lr(), 0.01 * schedule.multiplier(1));
    }
}
