//! Property tests for the signal filter and the intensity policy.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use smilekeeper_core::config::ChannelConfig;
use smilekeeper_core::session::{Channel, ChannelPolicy};
use smilekeeper_core::SmileFilter;

proptest! {
    /// After every update the EMA lies between the previous estimate
    /// and the new sample: the filter interpolates, never overshoots.
    #[test]
    fn ema_stays_between_prev_and_sample(
        samples in prop::collection::vec(0.0f64..2.0, 1..200)
    ) {
        let mut filter = SmileFilter::new();
        let mut prev: Option<f64> = None;
        for &r in &samples {
            filter.observe(r);
            let ema = filter.ema().unwrap();
            match prev {
                None => prop_assert!((ema - r).abs() < 1e-12),
                Some(p) => {
                    let lo = p.min(r) - 1e-12;
                    let hi = p.max(r) + 1e-12;
                    prop_assert!(ema >= lo && ema <= hi,
                        "ema {ema} left [{lo}, {hi}]");
                }
            }
            prev = Some(ema);
        }
    }

    /// Intensity draws always land inside [min, max] inclusive, for any
    /// configuration and any number of recorded failures.
    #[test]
    fn draws_stay_inside_configured_band(
        min in 0u32..=100,
        extra_max in 0u32..=100,
        step in 0u32..=20,
        window in 0u32..=30,
        failures in 0usize..300,
        seed in any::<u64>(),
    ) {
        let cfg = ChannelConfig {
            enabled: true,
            min,
            max: min + extra_max,
            step,
            window,
        };
        let max = cfg.max;
        let mut policy = ChannelPolicy::new(Channel::A, cfg);
        for _ in 0..failures {
            policy.record_failure();
        }
        let mut rng = Mcg128Xsl64::seed_from_u64(seed);
        for _ in 0..32 {
            let i = policy.draw(&mut rng);
            prop_assert!(i >= min && i <= max, "draw {i} outside [{min}, {max}]");
        }
        // Super draws respect the ceiling too, whatever the bonus.
        let s = policy.super_intensity(50);
        prop_assert!(s <= max);
    }

    /// Escalation is monotone: more failures never lower the base.
    #[test]
    fn escalated_base_is_monotone(
        min in 0u32..=50,
        extra_max in 0u32..=100,
        step in 0u32..=10,
        failures in 0usize..100,
    ) {
        let cfg = ChannelConfig {
            enabled: true,
            min,
            max: min + extra_max,
            step,
            window: 5,
        };
        let mut policy = ChannelPolicy::new(Channel::A, cfg);
        let mut last = policy.base();
        for _ in 0..failures {
            policy.record_failure();
            let base = policy.base();
            prop_assert!(base >= last);
            last = base;
        }
    }
}
