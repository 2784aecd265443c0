//! Smile signal smoothing and hysteresis.
//!
//! The landmark detector supplies one normalized geometry ratio per frame
//! (`(mouth_height / mouth_width) / eye_distance`). This module smooths
//! that noisy signal with an exponential moving average and derives a
//! stable smiling/not-smiling boolean through an asymmetric hysteresis
//! band around a calibrated baseline.

use serde::{Deserialize, Serialize};

/// EMA weight for each new sample. Fast enough to track within about a
/// second at typical frame rates, stable against single-frame jitter.
const EMA_ALPHA: f64 = 0.2;

/// Width of the hysteresis dead zone below the on-threshold.
const HYSTERESIS_DROP: f64 = 0.10;

/// Smoothed smile estimate with hysteresis state.
///
/// No-sample ticks (no face detected) leave every field untouched: the
/// last known estimate holds and is never treated as "not smiling".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmileFilter {
    /// Smoothed ratio; None until the first valid sample.
    ema: Option<f64>,
    smiling: bool,
    /// Calibrated neutral-face ratio; set once per session.
    baseline: Option<f64>,
}

impl SmileFilter {
    pub fn new() -> Self {
        Self {
            ema: None,
            smiling: false,
            baseline: None,
        }
    }

    pub fn ema(&self) -> Option<f64> {
        self.ema
    }

    pub fn smiling(&self) -> bool {
        self.smiling
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    /// Fold one raw ratio sample into the moving average.
    pub fn observe(&mut self, ratio: f64) {
        self.ema = Some(match self.ema {
            None => ratio,
            Some(prev) => EMA_ALPHA * ratio + (1.0 - EMA_ALPHA) * prev,
        });
    }

    /// Re-evaluate the smiling flag against the hysteresis band.
    ///
    /// With challenge mode enabled the whole band shifts up by
    /// `super_on_offset`, with the off side clamped so it never drops
    /// below the baseline itself:
    /// `on = baseline + offset`, `off = baseline + max(0, offset - 0.10)`.
    /// Without challenge mode: `on = baseline`, `off = baseline - 0.10`.
    ///
    /// Rising above `on` enters smiling; falling below `off` leaves it.
    /// Between the two nothing changes, which is what stops the flag
    /// chattering when the estimate rides the boundary.
    pub fn update_smiling(&mut self, challenge_mode: bool, super_on_offset: f64) {
        let (Some(ema), Some(baseline)) = (self.ema, self.baseline) else {
            return;
        };
        let super_off = (super_on_offset - HYSTERESIS_DROP).max(0.0);
        let on_thr = baseline + if challenge_mode { super_on_offset } else { 0.0 };
        let off_thr = baseline + if challenge_mode { super_off } else { -HYSTERESIS_DROP };

        if !self.smiling && ema > on_thr {
            self.smiling = true;
        } else if self.smiling && ema < off_thr {
            self.smiling = false;
        }
    }

    /// Calibrate the baseline from the current estimate.
    ///
    /// Returns the captured baseline, or None when no sample has been
    /// seen yet or a baseline is already set (one calibration per
    /// session). Resets the smiling flag so the warm-up starts neutral.
    pub fn set_baseline(&mut self) -> Option<f64> {
        if self.baseline.is_some() {
            return None;
        }
        let ema = self.ema?;
        self.baseline = Some(ema);
        self.smiling = false;
        Some(ema)
    }
}

impl Default for SmileFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibrated(baseline: f64) -> SmileFilter {
        let mut f = SmileFilter::new();
        f.observe(baseline);
        f.set_baseline();
        f
    }

    #[test]
    fn first_sample_seeds_ema() {
        let mut f = SmileFilter::new();
        f.observe(0.42);
        assert_eq!(f.ema(), Some(0.42));
    }

    #[test]
    fn ema_blends_toward_new_samples() {
        let mut f = SmileFilter::new();
        f.observe(1.0);
        f.observe(0.0);
        assert!((f.ema().unwrap() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn calibration_is_one_shot() {
        let mut f = SmileFilter::new();
        f.observe(0.5);
        assert_eq!(f.set_baseline(), Some(0.5));
        f.observe(0.9);
        assert_eq!(f.set_baseline(), None);
        assert_eq!(f.baseline(), Some(0.5));
    }

    #[test]
    fn smiling_requires_crossing_on_threshold() {
        let mut f = calibrated(0.50);
        // At baseline exactly: not above, stays off.
        f.update_smiling(false, 0.15);
        assert!(!f.smiling());

        for _ in 0..40 {
            f.observe(0.70);
        }
        f.update_smiling(false, 0.15);
        assert!(f.smiling());
    }

    #[test]
    fn dead_zone_prevents_chattering() {
        let mut f = calibrated(0.50);
        for _ in 0..40 {
            f.observe(0.70);
        }
        f.update_smiling(false, 0.15);
        assert!(f.smiling());

        // Oscillate straddling only the on-threshold (0.50); the off
        // threshold is 0.40 so the flag must hold.
        for _ in 0..20 {
            f.observe(0.48);
            f.update_smiling(false, 0.15);
            assert!(f.smiling());
            f.observe(0.52);
            f.update_smiling(false, 0.15);
            assert!(f.smiling());
        }

        // Dropping strictly below the off threshold releases it.
        for _ in 0..60 {
            f.observe(0.30);
        }
        f.update_smiling(false, 0.15);
        assert!(!f.smiling());
    }

    #[test]
    fn challenge_mode_raises_both_thresholds() {
        let mut f = calibrated(0.50);
        for _ in 0..40 {
            f.observe(0.60);
        }
        // 0.60 clears the normal threshold but not baseline + 0.15.
        f.update_smiling(true, 0.15);
        assert!(!f.smiling());
        f.update_smiling(false, 0.15);
        assert!(f.smiling());
    }

    #[test]
    fn super_off_floor_clamps_at_baseline() {
        // offset 0.05 would put the off threshold below on; the clamp
        // keeps it at baseline + 0.
        let mut f = calibrated(0.50);
        for _ in 0..60 {
            f.observe(0.60);
        }
        f.update_smiling(true, 0.05);
        assert!(f.smiling());
        for _ in 0..60 {
            f.observe(0.45);
        }
        f.update_smiling(true, 0.05);
        assert!(!f.smiling());
    }

    #[test]
    fn no_sample_holds_state() {
        let mut f = calibrated(0.50);
        for _ in 0..40 {
            f.observe(0.70);
        }
        f.update_smiling(false, 0.15);
        let ema_before = f.ema();
        // A no-detection tick performs no observe/update at all.
        assert!(f.smiling());
        assert_eq!(f.ema(), ema_before);
    }
}
