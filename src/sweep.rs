//! Parameter Sweeps
//!
//! Evaluates every (leverage, volatility, drift) combination of a grid.
//! Each cell always gets the closed-form estimate, the funding-study median
//! heuristic and the exact first-passage median; with a Monte Carlo config
//! it also gets empirical statistics.
//!
//! ## Scenario shapes
//! - Heatmap: zero drift, leverage x volatility.
//! - Funding curve: fixed volatility, leverage x funding rate
//!   (drift = -funding).
//!
//! Cells share nothing mutable. They run in parallel, each on its own
//! RNG key, so a sweep's numbers do not depend on thread count.

use std::time::Instant;

use rayon::prelude::*;

use crate::analytic::{expected_time_to_liquidation, median_time_heuristic, ExpectedTime};
use crate::error::{
    invalid, require_finite, require_leverage, require_non_negative, require_positive, SimResult,
};
use crate::first_passage::FirstPassage;
use crate::monte_carlo::{simulate_outcomes, LiquidationStats, MonteCarloConfig};
use crate::params::{MarketParameters, PositionParameters};

/// Leverages used by the heatmap.
pub const HEATMAP_LEVERAGES: [f64; 16] = [
    2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 12.0, 15.0, 20.0, 25.0, 30.0, 50.0, 100.0,
];

/// Annual volatilities used by the heatmap (50% .. 300%).
pub const HEATMAP_VOLATILITIES: [f64; 15] = [
    0.50, 0.60, 0.70, 0.80, 0.90, 1.00, 1.10, 1.20, 1.30, 1.40, 1.50, 1.75, 2.00, 2.50, 3.00,
];

/// Funding rates of the leverage/funding curve.
pub const FUNDING_RATES: [f64; 5] = [0.0, 0.1, 0.2, 0.5, 1.0];

#[derive(Clone, Debug, PartialEq)]
pub struct SweepGrid {
    leverages: Vec<f64>,
    volatilities: Vec<f64>,
    drifts: Vec<f64>,
}

impl SweepGrid {
    pub fn new(leverages: Vec<f64>, volatilities: Vec<f64>, drifts: Vec<f64>) -> SimResult<Self> {
        if leverages.is_empty() || volatilities.is_empty() || drifts.is_empty() {
            return Err(invalid("grid", 0.0, "every axis needs at least one value"));
        }
        for &leverage in &leverages {
            require_leverage(leverage)?;
        }
        for &volatility in &volatilities {
            require_non_negative("volatility", volatility)?;
        }
        for &drift in &drifts {
            require_finite("drift", drift)?;
        }
        Ok(Self {
            leverages,
            volatilities,
            drifts,
        })
    }

    /// Leverage x volatility at a single net drift.
    pub fn heatmap(drift: f64) -> SimResult<Self> {
        Self::new(
            HEATMAP_LEVERAGES.to_vec(),
            HEATMAP_VOLATILITIES.to_vec(),
            vec![drift],
        )
    }

    /// Leverage x funding at fixed volatility. Funding is paid by the long,
    /// so each rate becomes a drift of `-funding`.
    pub fn funding_curve(
        volatility: f64,
        leverages: Vec<f64>,
        fundings: &[f64],
    ) -> SimResult<Self> {
        let drifts = fundings.iter().map(|f| -f).collect();
        Self::new(leverages, vec![volatility], drifts)
    }

    pub fn leverages(&self) -> &[f64] {
        &self.leverages
    }

    pub fn volatilities(&self) -> &[f64] {
        &self.volatilities
    }

    pub fn drifts(&self) -> &[f64] {
        &self.drifts
    }

    pub fn len(&self) -> usize {
        self.leverages.len() * self.volatilities.len() * self.drifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (leverage, volatility, drift), drift varying fastest.
    pub fn cells(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.leverages.iter().flat_map(move |&l| {
            self.volatilities
                .iter()
                .flat_map(move |&v| self.drifts.iter().map(move |&d| (l, v, d)))
        })
    }
}

/// `n` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepConfig {
    pub initial_price: f64,
    pub monte_carlo: Option<MonteCarloConfig>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            initial_price: 100.0,
            monte_carlo: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SweepCell {
    pub leverage: f64,
    pub volatility: f64,
    pub drift: f64,
    pub analytic: ExpectedTime,
    pub median_heuristic: ExpectedTime,
    pub exact_mean: ExpectedTime,
    pub exact_median: Option<f64>,
    pub monte_carlo: Option<LiquidationStats>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SweepResult {
    cells: Vec<SweepCell>,
}

impl SweepResult {
    pub fn cells(&self) -> &[SweepCell] {
        &self.cells
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SweepCell> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Looks a cell up by the exact grid values it was built from.
    pub fn get(&self, leverage: f64, volatility: f64, drift: f64) -> Option<&SweepCell> {
        self.cells
            .iter()
            .find(|c| c.leverage == leverage && c.volatility == volatility && c.drift == drift)
    }
}

impl<'a> IntoIterator for &'a SweepResult {
    type Item = &'a SweepCell;
    type IntoIter = std::slice::Iter<'a, SweepCell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

fn evaluate_cell(
    (leverage, volatility, drift): (f64, f64, f64),
    config: &SweepConfig,
    base_seed: u64,
    cell: u64,
) -> SimResult<SweepCell> {
    let exact = FirstPassage::new(leverage, volatility, drift)?;

    let monte_carlo = match &config.monte_carlo {
        Some(mc) => {
            let market = MarketParameters::new(config.initial_price, volatility, drift)?;
            let position = PositionParameters::new(leverage)?;
            let outcomes = simulate_outcomes(&market, &position, mc, base_seed, cell);
            Some(LiquidationStats::from_outcomes(&outcomes))
        }
        None => None,
    };

    Ok(SweepCell {
        leverage,
        volatility,
        drift,
        analytic: expected_time_to_liquidation(leverage, volatility, drift)?,
        median_heuristic: median_time_heuristic(leverage, volatility, drift)?,
        exact_mean: exact.mean(),
        exact_median: exact.median(),
        monte_carlo,
    })
}

pub fn run_sweep(grid: &SweepGrid, config: &SweepConfig) -> SimResult<SweepResult> {
    require_positive("initial_price", config.initial_price)?;
    if let Some(mc) = &config.monte_carlo {
        mc.validate()?;
    }
    let base_seed = config
        .monte_carlo
        .as_ref()
        .map_or(0, |mc| mc.seed.base_seed());
    let start = Instant::now();

    let cells: Vec<(f64, f64, f64)> = grid.cells().collect();
    let cells = cells
        .into_par_iter()
        .enumerate()
        .map(|(i, cell)| evaluate_cell(cell, config, base_seed, i as u64 + 1))
        .collect::<SimResult<Vec<_>>>()?;

    tracing::info!(
        cells = cells.len(),
        monte_carlo = config.monte_carlo.is_some(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "sweep finished"
    );

    Ok(SweepResult { cells })
}

/// How much the highest funding rate in a sweep cuts the median time,
/// relative to the lowest, for one leverage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FundingSensitivity {
    pub leverage: f64,
    pub baseline_median: f64, // years, lowest funding
    pub funded_median: f64,   // years, highest funding
    pub reduction: f64,       // 1 - funded / baseline
}

/// Computed from the exact medians; leverages where either median is
/// undefined are skipped.
pub fn funding_sensitivity(result: &SweepResult, volatility: f64) -> Vec<FundingSensitivity> {
    let mut leverages: Vec<f64> = result
        .iter()
        .filter(|c| c.volatility == volatility)
        .map(|c| c.leverage)
        .collect();
    leverages.sort_by(f64::total_cmp);
    leverages.dedup();

    leverages
        .into_iter()
        .filter_map(|leverage| {
            let row: Vec<&SweepCell> = result
                .iter()
                .filter(|c| c.volatility == volatility && c.leverage == leverage)
                .collect();
            let baseline = row.iter().max_by(|a, b| a.drift.total_cmp(&b.drift))?;
            let funded = row.iter().min_by(|a, b| a.drift.total_cmp(&b.drift))?;
            let baseline_median = baseline.exact_median?;
            let funded_median = funded.exact_median?;
            Some(FundingSensitivity {
                leverage,
                baseline_median,
                funded_median,
                reduction: 1.0 - funded_median / baseline_median,
            })
        })
        .collect()
}
