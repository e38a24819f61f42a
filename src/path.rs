//! GBM Price Path Simulator
//!
//! Discretized geometric Brownian motion. The log-price advances by
//!
//! ```text
//! X(t+dt) = X(t) + (mu - sigma^2/2) dt + sigma sqrt(dt) Z,   Z ~ N(0, 1)
//! ```
//!
//! and is exponentiated back into a price. Paths can be collected into a
//! [`SimulatedPath`] or consumed lazily through [`GbmPath`], which is what the
//! Monte Carlo runner does so that a trial stops generating once liquidated.
//!
//! ## Random sources
//! Every trial owns its own `ChaCha8Rng`, keyed by the run's base seed and
//! sweep cell and set to a stream per trial index, so no generator is ever
//! shared between threads.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use crate::error::{invalid, require_positive, SimResult};
use crate::params::{MarketParameters, DAYS_PER_YEAR};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub time: f64,  // years since open
    pub price: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathConfig {
    horizon: f64,
    dt: f64,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            horizon: 1.0,
            dt: 1.0 / DAYS_PER_YEAR,
        }
    }
}

impl PathConfig {
    /// A `dt` longer than the horizon gives a single step to the horizon.
    pub fn new(horizon: f64, dt: f64) -> SimResult<Self> {
        let horizon = require_positive("horizon", horizon)?;
        let dt = require_positive("dt", dt)?;
        Ok(Self { horizon, dt })
    }

    /// Horizon in years, sampled `steps_per_day` times per day.
    pub fn daily(horizon: f64, steps_per_day: u32) -> SimResult<Self> {
        if steps_per_day == 0 {
            return Err(invalid("steps_per_day", 0.0, "must be > 0"));
        }
        Self::new(horizon, 1.0 / (DAYS_PER_YEAR * steps_per_day as f64))
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Number of increments; the last one is shortened to land on the horizon.
    pub fn steps(&self) -> usize {
        // Tolerance keeps 1.0 / (1/365) from rounding up to 366 steps.
        ((self.horizon / self.dt) - 1e-9).ceil().max(1.0) as usize
    }

    fn time_at(&self, step: usize) -> f64 {
        if step >= self.steps() {
            self.horizon
        } else {
            step as f64 * self.dt
        }
    }
}

/// Lazy GBM path, starting with `(0, S0)` and ending at the horizon.
pub struct GbmPath<'a, R: Rng + ?Sized> {
    rng: &'a mut R,
    config: PathConfig,
    steps: usize,
    step: usize,
    log_price: f64,
    log_drift: f64, // mu - sigma^2/2
    volatility: f64,
    started: bool,
}

impl<'a, R: Rng + ?Sized> GbmPath<'a, R> {
    pub fn new(market: &MarketParameters, config: PathConfig, rng: &'a mut R) -> Self {
        let volatility = market.volatility();
        Self {
            rng,
            config,
            steps: config.steps(),
            step: 0,
            log_price: market.initial_price().ln(),
            log_drift: market.drift() - 0.5 * volatility.powi(2),
            volatility,
            started: false,
        }
    }
}

impl<R: Rng + ?Sized> Iterator for GbmPath<'_, R> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if !self.started {
            self.started = true;
            return Some(Sample {
                time: 0.0,
                price: self.log_price.exp(),
            });
        }
        if self.step >= self.steps {
            return None;
        }

        let t0 = self.config.time_at(self.step);
        self.step += 1;
        let t1 = self.config.time_at(self.step);
        let dt = t1 - t0;

        let z: f64 = StandardNormal.sample(&mut *self.rng);
        self.log_price += self.log_drift * dt + self.volatility * dt.sqrt() * z;

        Some(Sample {
            time: t1,
            price: self.log_price.exp(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.steps - self.step + usize::from(!self.started);
        (remaining, Some(remaining))
    }
}

impl<R: Rng + ?Sized> ExactSizeIterator for GbmPath<'_, R> {}

/// Fully materialized path, ordered by time.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulatedPath {
    samples: Vec<Sample>,
}

impl SimulatedPath {
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn horizon(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.time)
    }

    pub fn final_price(&self) -> Option<f64> {
        self.samples.last().map(|s| s.price)
    }
}

impl FromIterator<Sample> for SimulatedPath {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SimulatedPath {
    type Item = Sample;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Sample>>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter().copied()
    }
}

pub fn simulate_path<R: Rng + ?Sized>(
    market: &MarketParameters,
    config: PathConfig,
    rng: &mut R,
) -> SimulatedPath {
    GbmPath::new(market, config, rng).collect()
}

/// Validating entry point for callers holding raw numbers.
pub fn simulate_path_checked<R: Rng + ?Sized>(
    market: &MarketParameters,
    horizon: f64,
    dt: f64,
    rng: &mut R,
) -> SimResult<SimulatedPath> {
    let config = PathConfig::new(horizon, dt)?;
    Ok(simulate_path(market, config, rng))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RandomSource {
    /// Reproducible runs.
    Seeded(u64),
    /// Fresh base seed drawn from the thread RNG on each run.
    #[default]
    Entropy,
}

impl RandomSource {
    pub fn base_seed(&self) -> u64 {
        match self {
            Self::Seeded(seed) => *seed,
            Self::Entropy => rand::thread_rng().gen(),
        }
    }

    pub fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.base_seed())
    }
}

/// Independent generator for trial `index` of sweep cell `cell`.
///
/// The base seed and cell form the ChaCha key and the trial index picks the
/// stream, so neighbouring base seeds never replay each other's trials.
pub fn trial_rng(base_seed: u64, cell: u64, index: u64) -> ChaCha8Rng {
    let mut key = [0u8; 32];
    key[..8].copy_from_slice(&base_seed.to_le_bytes());
    key[8..16].copy_from_slice(&cell.to_le_bytes());
    let mut rng = ChaCha8Rng::from_seed(key);
    rng.set_stream(index);
    rng
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(volatility: f64, drift: f64) -> MarketParameters {
        MarketParameters::new(100.0, volatility, drift).unwrap()
    }

    #[test]
    fn test_price_path_generation() {
        let mut rng = RandomSource::Seeded(42).rng();
        let config = PathConfig::default();
        let path = simulate_path(&market(0.5, 0.0), config, &mut rng);

        assert_eq!(path.len(), 366);
        assert!((path.samples()[0].price - 100.0).abs() < 1e-9);
        assert!((path.horizon() - 1.0).abs() < 1e-12);
        assert!(path.samples().iter().all(|s| s.price > 0.0));
    }

    #[test]
    fn test_times_strictly_increase() {
        let mut rng = RandomSource::Seeded(7).rng();
        let config = PathConfig::new(0.1, 0.03).unwrap();
        let path = simulate_path(&market(0.5, 0.0), config, &mut rng);

        assert_eq!(config.steps(), 4);
        let times: Vec<f64> = path.samples().iter().map(|s| s.time).collect();
        assert!(times.windows(2).all(|w| w[1] > w[0]));
        assert!((times[times.len() - 1] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_seeded_paths_reproducible() {
        let config = PathConfig::default();
        let a = simulate_path(&market(1.5, 0.0), config, &mut RandomSource::Seeded(9).rng());
        let b = simulate_path(&market(1.5, 0.0), config, &mut RandomSource::Seeded(9).rng());
        let c = simulate_path(&market(1.5, 0.0), config, &mut RandomSource::Seeded(10).rng());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_zero_volatility_is_deterministic() {
        let mut rng = RandomSource::Entropy.rng();
        let config = PathConfig::new(1.0, 0.25).unwrap();
        let path = simulate_path(&market(0.0, -0.5), config, &mut rng);
        let expected = 100.0 * (-0.5f64).exp();
        assert!((path.final_price().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_step_and_horizon() {
        assert!(PathConfig::new(1.0, 0.0).is_err());
        assert!(PathConfig::new(0.0, 0.01).is_err());
        assert!(PathConfig::new(-1.0, 0.01).is_err());
        assert!(PathConfig::daily(1.0, 0).is_err());
        let mut rng = RandomSource::Seeded(1).rng();
        assert!(simulate_path_checked(&market(0.5, 0.0), 1.0, -0.1, &mut rng).is_err());
    }

    #[test]
    fn test_step_longer_than_horizon_is_one_step() {
        let config = PathConfig::new(0.5, 2.0).unwrap();
        assert_eq!(config.steps(), 1);

        let mut rng = RandomSource::Seeded(5).rng();
        let path = simulate_path(&market(0.0, 0.2), config, &mut rng);
        assert_eq!(path.len(), 2);
        assert!((path.horizon() - 0.5).abs() < 1e-12);
        assert!((path.final_price().unwrap() - 100.0 * 0.1f64.exp()).abs() < 1e-9);
    }

    #[test]
    fn test_size_hint_matches_length() {
        let mut rng = RandomSource::Seeded(3).rng();
        let config = PathConfig::new(0.5, 0.01).unwrap();
        let iter = GbmPath::new(&market(0.5, 0.0), config, &mut rng);
        assert_eq!(iter.len(), config.steps() + 1);
        assert_eq!(iter.count(), config.steps() + 1);
    }

    #[test]
    fn test_trial_rngs_differ() {
        let a: u64 = trial_rng(1, 0, 0).gen();
        let b: u64 = trial_rng(1, 0, 1).gen();
        let c: u64 = trial_rng(1, 1, 0).gen();
        let d: u64 = trial_rng(2, 0, 0).gen();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, d);
        assert_eq!(a, trial_rng(1, 0, 0).gen::<u64>());
    }

    #[test]
    fn test_log_returns_match_drift_and_vol() {
        let m = market(0.8, 0.1);
        let config = PathConfig::new(1.0, 1.0).unwrap();
        let n = 40_000;
        let mut rng = RandomSource::Seeded(11).rng();
        let returns: Vec<f64> = (0..n)
            .map(|_| {
                let path = simulate_path(&m, config, &mut rng);
                (path.final_price().unwrap() / 100.0).ln()
            })
            .collect();
        let mean = returns.iter().sum::<f64>() / n as f64;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1) as f64;

        assert!((mean - (0.1 - 0.32)).abs() < 0.02, "mean={mean}");
        assert!((var - 0.64).abs() < 0.03, "var={var}");
    }
}
