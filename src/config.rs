//! Run configuration for the reporting binaries.
//!
//! Library entry points take explicit config structs. The binaries build
//! theirs from environment variables (optionally loaded from `.env`):
//!
//! | Variable                | Default   |
//! |-------------------------|-----------|
//! | `LIQSIM_TRIALS`         | 10000     |
//! | `LIQSIM_SEED`           | (entropy) |
//! | `LIQSIM_HORIZON_YEARS`  | 1.0       |
//! | `LIQSIM_STEPS_PER_DAY`  | 1         |
//! | `LIQSIM_INITIAL_PRICE`  | 100.0     |
//! | `LIQSIM_MONTE_CARLO`    | false     |

use std::str::FromStr;

use crate::error::{SimError, SimResult};
use crate::monte_carlo::MonteCarloConfig;
use crate::path::{PathConfig, RandomSource};
use crate::sweep::SweepConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub trials: usize,
    pub seed: Option<u64>,
    pub horizon_years: f64,
    pub steps_per_day: u32,
    pub initial_price: f64,
    /// Whether sweeps also simulate every cell.
    pub sweep_monte_carlo: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            trials: 10_000,
            seed: None,
            horizon_years: 1.0,
            steps_per_day: 1,
            initial_price: 100.0,
            sweep_monte_carlo: false,
        }
    }
}

impl RunConfig {
    pub fn from_env() -> SimResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reading from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> SimResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            trials: parse_or(&lookup, "LIQSIM_TRIALS", defaults.trials)?,
            seed: match lookup("LIQSIM_SEED") {
                Some(raw) => Some(parse("LIQSIM_SEED", &raw)?),
                None => None,
            },
            horizon_years: parse_or(&lookup, "LIQSIM_HORIZON_YEARS", defaults.horizon_years)?,
            steps_per_day: parse_or(&lookup, "LIQSIM_STEPS_PER_DAY", defaults.steps_per_day)?,
            initial_price: parse_or(&lookup, "LIQSIM_INITIAL_PRICE", defaults.initial_price)?,
            sweep_monte_carlo: parse_or(&lookup, "LIQSIM_MONTE_CARLO", defaults.sweep_monte_carlo)?,
        };
        config.monte_carlo()?;
        Ok(config)
    }

    pub fn random_source(&self) -> RandomSource {
        self.seed.map_or(RandomSource::Entropy, RandomSource::Seeded)
    }

    pub fn monte_carlo(&self) -> SimResult<MonteCarloConfig> {
        let path = PathConfig::daily(self.horizon_years, self.steps_per_day)?;
        MonteCarloConfig::new(self.trials, path, self.random_source())
    }

    pub fn sweep(&self) -> SimResult<SweepConfig> {
        Ok(SweepConfig {
            initial_price: self.initial_price,
            monte_carlo: if self.sweep_monte_carlo {
                Some(self.monte_carlo()?)
            } else {
                None
            },
        })
    }
}

fn parse<T>(key: &str, raw: &str) -> SimResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| SimError::Config(format!("{key}: {e}")))
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> SimResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse(key, &raw),
        None => Ok(default),
    }
}

/// Structured logging to stderr, `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
