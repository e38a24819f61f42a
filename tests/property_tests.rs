//! Property-based tests for the closed form, the barrier and the exact
//! first-passage law.

use liquidation_sim::analytic::{expected_time_to_liquidation, ExpectedTime};
use liquidation_sim::{liquidation_barrier, FirstPassage, SimError};
use proptest::prelude::*;

fn leverage_strategy() -> impl Strategy<Value = f64> {
    (1_001u32..=100_000u32).prop_map(|x| x as f64 / 1000.0) // 1.001x to 100x
}

fn volatility_strategy() -> impl Strategy<Value = f64> {
    (1u32..=400u32).prop_map(|x| x as f64 / 100.0) // 1% to 400%
}

fn drift_strategy() -> impl Strategy<Value = f64> {
    (-200i32..=200i32).prop_map(|x| x as f64 / 100.0) // -200% to +200%
}

proptest! {
    /// Barrier sits strictly between zero and the entry price.
    #[test]
    fn barrier_inside_entry(
        price in 1u32..1_000_000u32,
        leverage in leverage_strategy(),
    ) {
        let price = price as f64 / 100.0;
        let barrier = liquidation_barrier(price, leverage).unwrap();
        prop_assert!(barrier > 0.0);
        prop_assert!(barrier < price);
    }

    /// Leverage at or below 1x never produces a barrier.
    #[test]
    fn unlevered_rejected(leverage in -1000i32..=1000i32) {
        let leverage = leverage as f64 / 1000.0;
        let is_invalid = matches!(
            liquidation_barrier(100.0, leverage),
            Err(SimError::InvalidParameter { .. })
        );
        prop_assert!(is_invalid);
    }

    /// More leverage, shorter expected survival.
    #[test]
    fn expected_time_decreases_with_leverage(
        leverage in leverage_strategy(),
        bump in 1u32..=1000u32,
        volatility in volatility_strategy(),
        drift in drift_strategy(),
    ) {
        let higher = leverage + bump as f64 / 100.0;
        let low = expected_time_to_liquidation(leverage, volatility, drift).unwrap();
        let high = expected_time_to_liquidation(higher, volatility, drift).unwrap();
        match (low, high) {
            (ExpectedTime::Finite(a), ExpectedTime::Finite(b)) => prop_assert!(b < a),
            (ExpectedTime::Infinite, ExpectedTime::Infinite) => {}
            other => prop_assert!(false, "finiteness changed with leverage: {:?}", other),
        }
    }

    /// Finite exactly when mu + sigma^2/2 > 0, and then positive.
    #[test]
    fn infinite_iff_alpha_nonpositive(
        leverage in leverage_strategy(),
        volatility in volatility_strategy(),
        drift in drift_strategy(),
    ) {
        let alpha = drift + 0.5 * volatility * volatility;
        let result = expected_time_to_liquidation(leverage, volatility, drift).unwrap();
        match result {
            ExpectedTime::Finite(t) => {
                prop_assert!(alpha > 0.0);
                prop_assert!(t > 0.0 && t.is_finite());
            }
            ExpectedTime::Infinite => prop_assert!(alpha <= 0.0),
        }
    }

    /// Lower net drift (more funding paid) never lengthens exact survival.
    #[test]
    fn exact_mean_decreases_with_drift(
        leverage in leverage_strategy(),
        volatility in volatility_strategy(),
        drift in drift_strategy(),
        cut in 1u32..=100u32,
    ) {
        let lower = drift - cut as f64 / 100.0;
        let base = FirstPassage::new(leverage, volatility, drift).unwrap().mean();
        let funded = FirstPassage::new(leverage, volatility, lower).unwrap().mean();
        match (base, funded) {
            (ExpectedTime::Finite(a), ExpectedTime::Finite(b)) => prop_assert!(b < a),
            (ExpectedTime::Infinite, _) => {}
            other => prop_assert!(false, "lower drift lost finiteness: {:?}", other),
        }
    }

    /// The exact CDF is a sub-probability that never decreases in time.
    #[test]
    fn exact_cdf_monotone(
        leverage in leverage_strategy(),
        volatility in volatility_strategy(),
        drift in drift_strategy(),
        t in 1u32..=5_000u32,
    ) {
        let fp = FirstPassage::new(leverage, volatility, drift).unwrap();
        let t = t as f64 / 1000.0;
        let (a, b) = (fp.cdf(t), fp.cdf(t * 1.5));
        prop_assert!((0.0..=1.0).contains(&a));
        prop_assert!(b >= a - 1e-9);
        prop_assert!(b <= fp.hit_probability() + 1e-9);
    }
}
