//! Closed-form expected time to liquidation.
//!
//! For a long opened at `S0` with leverage `L`, liquidation happens when the
//! log-price first falls by `b = ln(1 - 1/L)`. The estimate used throughout
//! the analysis is
//!
//! ```text
//! alpha = mu + sigma^2 / 2
//! E[tau] = -b / alpha          (alpha > 0)
//! ```
//!
//! When `alpha <= 0` there is no finite expected time and the result is
//! [`ExpectedTime::Infinite`]. At zero drift this agrees with the exact GBM
//! first-passage mean; see [`crate::first_passage`] for the exact law and
//! [`crate::monte_carlo`] for how far the two drift apart otherwise.

use std::fmt;

use crate::error::{require_finite, require_non_negative, SimResult};
use crate::params::{years_to_days, PositionParameters};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExpectedTime {
    Finite(f64), // years
    Infinite,
}

impl ExpectedTime {
    pub fn years(&self) -> Option<f64> {
        match self {
            Self::Finite(years) => Some(*years),
            Self::Infinite => None,
        }
    }

    pub fn days(&self) -> Option<f64> {
        self.years().map(years_to_days)
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Self::Finite(_))
    }
}

impl fmt::Display for ExpectedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.days() {
            Some(days) => f.write_str(&format_duration(days)),
            None => f.write_str("never (infinite)"),
        }
    }
}

/// `alpha = mu + sigma^2/2`.
pub fn effective_drift(volatility: f64, drift: f64) -> f64 {
    drift + 0.5 * volatility.powi(2)
}

pub fn expected_time_to_liquidation(
    leverage: f64,
    volatility: f64,
    drift: f64,
) -> SimResult<ExpectedTime> {
    let position = PositionParameters::new(leverage)?;
    let volatility = require_non_negative("volatility", volatility)?;
    let drift = require_finite("drift", drift)?;

    let alpha = effective_drift(volatility, drift);
    if alpha <= 0.0 {
        return Ok(ExpectedTime::Infinite);
    }
    Ok(ExpectedTime::Finite(-position.log_barrier() / alpha))
}

/// Expected days; `None` when the expectation is infinite.
pub fn expected_days(leverage: f64, volatility: f64, drift: f64) -> SimResult<Option<f64>> {
    Ok(expected_time_to_liquidation(leverage, volatility, drift)?.days())
}

/// Rough median from the funding study, in years.
///
/// Strongly negative drift (`mu < -sigma^2`): `b / |mu|`. Otherwise
/// `b / (|mu| + sigma^2 sqrt(2/pi))`. Not a distributional result; the
/// exact median lives in [`crate::first_passage::FirstPassage::median`].
pub fn median_time_heuristic(
    leverage: f64,
    volatility: f64,
    drift: f64,
) -> SimResult<ExpectedTime> {
    let position = PositionParameters::new(leverage)?;
    let volatility = require_non_negative("volatility", volatility)?;
    let drift = require_finite("drift", drift)?;
    let distance = -position.log_barrier();

    let variance = volatility.powi(2);
    let rate = if drift < -variance {
        drift.abs()
    } else {
        drift.abs() + variance * (2.0 / std::f64::consts::PI).sqrt()
    };
    if rate <= 0.0 {
        return Ok(ExpectedTime::Infinite);
    }
    Ok(ExpectedTime::Finite(distance / rate))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Extreme,
    VeryHigh,
    High,
    Medium,
    Low,
    Safe,
}

impl RiskLevel {
    pub fn from_expected(time: ExpectedTime) -> Self {
        match time.days() {
            Some(days) if days < 1.0 => Self::Extreme,
            Some(days) if days < 7.0 => Self::VeryHigh,
            Some(days) if days < 30.0 => Self::High,
            Some(days) if days < 90.0 => Self::Medium,
            Some(days) if days < 365.0 => Self::Low,
            _ => Self::Safe,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Extreme => "EXTREME",
            Self::VeryHigh => "VERY HIGH",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Safe => "SAFE",
        }
    }
}

/// Hours under a day, then days, weeks, months, years.
pub fn format_duration(days: f64) -> String {
    if days < 1.0 {
        format!("{:.1} hours", days * 24.0)
    } else if days < 7.0 {
        format!("{:.1} days", days)
    } else if days < 30.0 {
        format!("{:.1} weeks", days / 7.0)
    } else if days < 365.0 {
        format!("{:.0} months", days / 30.0)
    } else {
        format!("{:.1} years", days / 365.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scenario {
    ConservativeStock,
    ModerateStock,
    AggressiveStock,
    ConservativeCrypto,
    ModerateCrypto,
    AggressiveCrypto,
    AltcoinConservative,
    AltcoinModerate,
    AltcoinAggressive,
    MemeCoin,
    UltraDegen,
}

impl Scenario {
    pub fn all() -> Vec<Self> {
        vec![
            Self::ConservativeStock,
            Self::ModerateStock,
            Self::AggressiveStock,
            Self::ConservativeCrypto,
            Self::ModerateCrypto,
            Self::AggressiveCrypto,
            Self::AltcoinConservative,
            Self::AltcoinModerate,
            Self::AltcoinAggressive,
            Self::MemeCoin,
            Self::UltraDegen,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ConservativeStock => "Conservative Stock",
            Self::ModerateStock => "Moderate Stock",
            Self::AggressiveStock => "Aggressive Stock",
            Self::ConservativeCrypto => "Conservative Crypto",
            Self::ModerateCrypto => "Moderate Crypto",
            Self::AggressiveCrypto => "Aggressive Crypto",
            Self::AltcoinConservative => "Altcoin Conservative",
            Self::AltcoinModerate => "Altcoin Moderate",
            Self::AltcoinAggressive => "Altcoin Aggressive",
            Self::MemeCoin => "Meme Coin",
            Self::UltraDegen => "Ultra Degen",
        }
    }

    /// (annual volatility, leverage)
    pub fn parameters(&self) -> (f64, f64) {
        match self {
            Self::ConservativeStock => (0.15, 2.0),
            Self::ModerateStock => (0.20, 3.0),
            Self::AggressiveStock => (0.30, 5.0),
            Self::ConservativeCrypto => (0.40, 2.0),
            Self::ModerateCrypto => (0.50, 5.0),
            Self::AggressiveCrypto => (0.70, 10.0),
            Self::AltcoinConservative => (0.80, 3.0),
            Self::AltcoinModerate => (1.00, 5.0),
            Self::AltcoinAggressive => (1.00, 10.0),
            Self::MemeCoin => (1.50, 10.0),
            Self::UltraDegen => (2.00, 20.0),
        }
    }

    pub fn expected_time(&self, drift: f64) -> SimResult<ExpectedTime> {
        let (volatility, leverage) = self.parameters();
        expected_time_to_liquidation(leverage, volatility, drift)
    }
}
