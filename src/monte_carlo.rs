//! Monte Carlo Reconciliation
//!
//! Simulates many independent GBM paths for one market/position pair and
//! compares what actually happens on them with the closed-form estimate.
//! The closed form is a baseline intuition, not a faithful model, so the
//! report always carries both sides and the gap between them.
//!
//! ## Censoring
//! Paths that survive the horizon have no liquidation time. They count in
//! the denominator of the liquidation probability but are left out of the
//! mean, median and percentiles of time to liquidation.
//!
//! ## Parallelism
//! Trials fan out over rayon. Each trial builds its own `ChaCha8Rng` from the
//! base seed and its index, and outcomes are collected in trial order, so the
//! result does not depend on scheduling.

use std::time::Instant;

use rand::Rng;
use rayon::prelude::*;

use crate::analytic::{expected_time_to_liquidation, ExpectedTime};
use crate::detector::{detect_liquidation, LiquidationOutcome};
use crate::error::{invalid, SimResult};
use crate::first_passage::FirstPassage;
use crate::params::{years_to_days, MarketParameters, PositionParameters};
use crate::path::{trial_rng, GbmPath, PathConfig, RandomSource};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonteCarloConfig {
    pub trials: usize,
    pub path: PathConfig,
    pub seed: RandomSource,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            trials: 10_000,
            path: PathConfig::default(),
            seed: RandomSource::Entropy,
        }
    }
}

impl MonteCarloConfig {
    pub fn new(trials: usize, path: PathConfig, seed: RandomSource) -> SimResult<Self> {
        let config = Self { trials, path, seed };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.trials == 0 {
            return Err(invalid("trials", 0.0, "must be > 0"));
        }
        Ok(())
    }
}

/// One path, generated lazily and dropped at the first crossing.
pub fn run_trial<R: Rng + ?Sized>(
    market: &MarketParameters,
    position: &PositionParameters,
    path: PathConfig,
    rng: &mut R,
) -> LiquidationOutcome {
    let barrier = position.liquidation_barrier(market.initial_price());
    detect_liquidation(GbmPath::new(market, path, rng), barrier)
}

#[derive(Clone, Debug, PartialEq)]
pub struct LiquidationStats {
    pub trials: usize,
    pub liquidated: usize,
    pub liquidation_probability: f64,
    // Years, over liquidated trials only. `None` if nothing liquidated.
    pub mean_time: Option<f64>,
    pub median_time: Option<f64>,
    pub p10_time: Option<f64>,
    pub p90_time: Option<f64>,
}

impl LiquidationStats {
    pub fn from_outcomes(outcomes: &[LiquidationOutcome]) -> Self {
        let mut times: Vec<f64> = outcomes.iter().filter_map(|o| o.time()).collect();
        times.sort_by(f64::total_cmp);

        let trials = outcomes.len();
        let liquidated = times.len();
        let liquidation_probability = if trials > 0 {
            liquidated as f64 / trials as f64
        } else {
            0.0
        };
        let mean_time = (liquidated > 0).then(|| times.iter().sum::<f64>() / liquidated as f64);

        Self {
            trials,
            liquidated,
            liquidation_probability,
            mean_time,
            median_time: median(&times),
            p10_time: percentile(&times, 0.10),
            p90_time: percentile(&times, 0.90),
        }
    }

    pub fn survived(&self) -> usize {
        self.trials - self.liquidated
    }

    pub fn mean_days(&self) -> Option<f64> {
        self.mean_time.map(years_to_days)
    }

    pub fn median_days(&self) -> Option<f64> {
        self.median_time.map(years_to_days)
    }
}

fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    Some(sorted[idx.min(sorted.len() - 1)])
}

fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some(0.5 * (sorted[n / 2 - 1] + sorted[n / 2])),
    }
}

/// Runs `trials` paths for sweep cell `cell` (0 for a standalone run).
pub(crate) fn simulate_outcomes(
    market: &MarketParameters,
    position: &PositionParameters,
    config: &MonteCarloConfig,
    base_seed: u64,
    cell: u64,
) -> Vec<LiquidationOutcome> {
    (0..config.trials)
        .into_par_iter()
        .map(|i| {
            let mut rng = trial_rng(base_seed, cell, i as u64);
            run_trial(market, position, config.path, &mut rng)
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct Reconciliation {
    pub market: MarketParameters,
    pub position: PositionParameters,
    pub horizon: f64,
    pub stats: LiquidationStats,

    /// Closed-form `-ln(1 - 1/L) / (mu + sigma^2/2)`.
    pub analytic: ExpectedTime,
    /// Exact GBM first-passage mean, median and probability within horizon.
    pub exact_mean: ExpectedTime,
    pub exact_median: Option<f64>,
    pub exact_probability: f64,
}

impl Reconciliation {
    pub fn new(
        market: MarketParameters,
        position: PositionParameters,
        horizon: f64,
        stats: LiquidationStats,
    ) -> SimResult<Self> {
        let analytic =
            expected_time_to_liquidation(position.leverage(), market.volatility(), market.drift())?;
        let exact = FirstPassage::from_params(&market, &position);

        Ok(Self {
            market,
            position,
            horizon,
            stats,
            analytic,
            exact_mean: exact.mean(),
            exact_median: exact.median(),
            exact_probability: exact.cdf(horizon),
        })
    }

    pub fn barrier(&self) -> f64 {
        self.position.liquidation_barrier(self.market.initial_price())
    }

    /// (empirical - analytic) / analytic. `None` if either side has no number.
    pub fn relative_error(&self) -> Option<f64> {
        let empirical = self.stats.mean_time?;
        let analytic = self.analytic.years()?;
        Some((empirical - analytic) / analytic)
    }

    pub fn exact_relative_error(&self) -> Option<f64> {
        let empirical = self.stats.mean_time?;
        let exact = self.exact_mean.years()?;
        Some((empirical - exact) / exact)
    }

    /// Empirical minus exact liquidation probability within the horizon.
    /// Discrete monitoring makes this slightly negative.
    pub fn probability_gap(&self) -> f64 {
        self.stats.liquidation_probability - self.exact_probability
    }

    pub fn print(&self) {
        let days = |t: Option<f64>| match t {
            Some(y) => format!("{:.2} days", years_to_days(y)),
            None => "n/a".to_string(),
        };
        let pct = |e: Option<f64>| match e {
            Some(e) => format!("{:+.2}%", e * 100.0),
            None => "n/a".to_string(),
        };

        println!(
            "  Liquidation price:       {:.2} ({:.1}% below entry)",
            self.barrier(),
            self.position.liquidation_distance() * 100.0
        );
        println!("  Trials:                  {}", self.stats.trials);
        println!("  Horizon:                 {:.1} days", years_to_days(self.horizon));
        println!("  Liquidated:              {}", self.stats.liquidated);
        println!(
            "  P(liquidated) empirical: {:.2}%",
            self.stats.liquidation_probability * 100.0
        );
        println!("  P(liquidated) exact:     {:.2}%", self.exact_probability * 100.0);
        println!("  Mean time (empirical):   {}", days(self.stats.mean_time));
        println!("  Median time (empirical): {}", days(self.stats.median_time));
        println!("  Expected time (formula): {}", days(self.analytic.years()));
        println!("  Expected time (exact):   {}", days(self.exact_mean.years()));
        println!("  Median time (exact):     {}", days(self.exact_median));
        println!("  Error vs formula:        {}", pct(self.relative_error()));
        println!("  Error vs exact:          {}", pct(self.exact_relative_error()));
    }
}

pub fn run_monte_carlo(
    market: &MarketParameters,
    position: &PositionParameters,
    config: &MonteCarloConfig,
) -> SimResult<Reconciliation> {
    config.validate()?;
    let base_seed = config.seed.base_seed();
    let start = Instant::now();

    tracing::debug!(
        leverage = position.leverage(),
        volatility = market.volatility(),
        drift = market.drift(),
        trials = config.trials,
        base_seed,
        "monte carlo run starting"
    );

    let outcomes = simulate_outcomes(market, position, config, base_seed, 0);
    let stats = LiquidationStats::from_outcomes(&outcomes);

    tracing::info!(
        leverage = position.leverage(),
        volatility = market.volatility(),
        drift = market.drift(),
        trials = stats.trials,
        liquidated = stats.liquidated,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "monte carlo run finished"
    );

    Reconciliation::new(*market, *position, config.path.horizon(), stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_censored_trials_excluded_from_times() {
        let outcomes = [
            LiquidationOutcome::Liquidated { time: 1.0, step: 1 },
            LiquidationOutcome::Survived { horizon: 5.0 },
            LiquidationOutcome::Liquidated { time: 3.0, step: 3 },
        ];
        let stats = LiquidationStats::from_outcomes(&outcomes);

        assert_eq!(stats.trials, 3);
        assert_eq!(stats.liquidated, 2);
        assert_eq!(stats.survived(), 1);
        assert!((stats.liquidation_probability - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats.mean_time, Some(2.0));
        assert_eq!(stats.median_time, Some(2.0));
    }

    #[test]
    fn test_no_liquidations() {
        let outcomes = [LiquidationOutcome::Survived { horizon: 1.0 }; 4];
        let stats = LiquidationStats::from_outcomes(&outcomes);
        assert_eq!(stats.liquidation_probability, 0.0);
        assert_eq!(stats.mean_time, None);
        assert_eq!(stats.median_time, None);
        assert_eq!(stats.p90_time, None);
    }

    #[test]
    fn test_percentiles() {
        let data: Vec<f64> = (0..100).map(|i| i as f64).collect();
        assert_eq!(percentile(&data, 0.95), Some(94.0));
        assert_eq!(median(&data), Some(49.5));
        assert_eq!(median(&[1.0, 2.0, 7.0]), Some(2.0));
    }

    #[test]
    fn test_zero_trials_rejected() {
        let config = MonteCarloConfig {
            trials: 0,
            ..MonteCarloConfig::default()
        };
        let market = MarketParameters::new(100.0, 0.5, 0.0).unwrap();
        let position = PositionParameters::new(10.0).unwrap();
        assert!(run_monte_carlo(&market, &position, &config).is_err());
    }

    #[test]
    fn test_monte_carlo_runs() {
        let market = MarketParameters::new(100.0, 1.5, 0.0).unwrap();
        let position = PositionParameters::new(10.0).unwrap();
        let config = MonteCarloConfig {
            trials: 500,
            seed: RandomSource::Seeded(42),
            ..MonteCarloConfig::default()
        };
        let result = run_monte_carlo(&market, &position, &config).unwrap();

        assert_eq!(result.stats.trials, 500);
        assert!(result.stats.liquidated > 400);
        assert!(result.analytic.is_finite());
        assert!(result.relative_error().is_some());
    }

    #[test]
    fn test_ninety_day_daily_run() {
        // 10x at 50% vol over 90 daily steps: about 70% liquidate in
        // continuous time, a few points fewer on the daily grid.
        let market = MarketParameters::new(100.0, 0.5, 0.0).unwrap();
        let position = PositionParameters::new(10.0).unwrap();
        let path = PathConfig::new(90.0 / 365.0, 1.0 / 365.0).unwrap();
        let config = MonteCarloConfig::new(4_000, path, RandomSource::Seeded(90)).unwrap();
        let result = run_monte_carlo(&market, &position, &config).unwrap();

        assert!((result.barrier() - 90.0).abs() < 1e-9);
        assert!((result.exact_probability - 0.706).abs() < 0.01);
        let gap = result.probability_gap();
        assert!(gap < 0.0 && gap > -0.09, "gap={gap}");
        let mean_days = result.stats.mean_days().unwrap();
        assert!(mean_days > 0.0 && mean_days < 90.0);
    }

    #[test]
    fn test_seeded_runs_reproducible() {
        let market = MarketParameters::new(100.0, 1.0, -0.2).unwrap();
        let position = PositionParameters::new(5.0).unwrap();
        let config = MonteCarloConfig {
            trials: 200,
            seed: RandomSource::Seeded(7),
            ..MonteCarloConfig::default()
        };
        let a = run_monte_carlo(&market, &position, &config).unwrap();
        let b = run_monte_carlo(&market, &position, &config).unwrap();
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn test_does_not_mutate_inputs() {
        let market = MarketParameters::new(100.0, 1.0, 0.0).unwrap();
        let position = PositionParameters::new(3.0).unwrap();
        let before = (market, position);
        let config = MonteCarloConfig {
            trials: 50,
            seed: RandomSource::Seeded(1),
            ..MonteCarloConfig::default()
        };
        let result = run_monte_carlo(&market, &position, &config).unwrap();
        assert_eq!((market, position), before);
        assert_eq!(result.market, market);
    }
}
