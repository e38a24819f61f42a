//! Liquidation Detector
//!
//! Scans samples in time order for the first price at or below the
//! liquidation barrier. Crossings that happen between two samples and
//! recover before the next one are missed, so discretely monitored paths
//! liquidate slightly later (and less often) than continuous GBM would. The
//! bias shrinks with the step size and is left uncorrected.

use crate::path::{Sample, SimulatedPath};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LiquidationOutcome {
    /// First sample at or below the barrier.
    Liquidated { time: f64, step: usize },
    /// Never touched the barrier before the path ended. Censored, not a time.
    Survived { horizon: f64 },
}

impl LiquidationOutcome {
    pub fn is_liquidated(&self) -> bool {
        matches!(self, Self::Liquidated { .. })
    }

    pub fn time(&self) -> Option<f64> {
        match self {
            Self::Liquidated { time, .. } => Some(*time),
            Self::Survived { .. } => None,
        }
    }
}

/// Consumes samples only up to the first crossing.
pub fn detect_liquidation<I>(samples: I, barrier: f64) -> LiquidationOutcome
where
    I: IntoIterator<Item = Sample>,
{
    let mut horizon = 0.0;
    for (step, sample) in samples.into_iter().enumerate() {
        if sample.price <= barrier {
            return LiquidationOutcome::Liquidated {
                time: sample.time,
                step,
            };
        }
        horizon = sample.time;
    }
    LiquidationOutcome::Survived { horizon }
}

impl SimulatedPath {
    pub fn first_passage(&self, barrier: f64) -> LiquidationOutcome {
        detect_liquidation(self, barrier)
    }
}
