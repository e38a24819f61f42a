//! Exact first-passage law for GBM to the liquidation barrier.
//!
//! The log-return `X(t) = ln(S(t)/S0)` is Brownian motion with drift
//! `nu = mu - sigma^2/2`. Liquidation is the first time `X` reaches
//! `b = ln(1 - 1/L) < 0`. Writing `a = -b` and `m = -nu = sigma^2/2 - mu`
//! for the pull toward the barrier, the hitting time is inverse Gaussian:
//!
//! ```text
//! P(tau <= t) = Phi((m t - a) / (sigma sqrt t))
//!             + exp(2 m a / sigma^2) Phi((-m t - a) / (sigma sqrt t))
//! E[tau]      = a / m                    (m > 0)
//! P(tau < oo) = exp(2 m a / sigma^2)     (m < 0), 1 otherwise
//! ```
//!
//! At zero drift `E[tau]` equals the closed form in [`crate::analytic`]; with
//! drift the two disagree, which is what the reconciler reports.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::analytic::ExpectedTime;
use crate::error::{require_finite, require_non_negative, SimResult};
use crate::params::{MarketParameters, PositionParameters};

const MAX_BRACKET_DOUBLINGS: usize = 200;
const BISECTION_ITERATIONS: usize = 200;

#[derive(Clone, Debug)]
pub struct FirstPassage {
    distance: f64,   // a = -ln(1 - 1/L)
    pull: f64,       // m = sigma^2/2 - mu
    volatility: f64,
    normal: Normal,
}

impl FirstPassage {
    pub fn new(leverage: f64, volatility: f64, drift: f64) -> SimResult<Self> {
        let position = PositionParameters::new(leverage)?;
        let volatility = require_non_negative("volatility", volatility)?;
        let drift = require_finite("drift", drift)?;
        Ok(Self {
            distance: -position.log_barrier(),
            pull: 0.5 * volatility.powi(2) - drift,
            volatility,
            normal: Normal::standard(),
        })
    }

    pub fn from_params(market: &MarketParameters, position: &PositionParameters) -> Self {
        let volatility = market.volatility();
        Self {
            distance: -position.log_barrier(),
            pull: 0.5 * volatility.powi(2) - market.drift(),
            volatility,
            normal: Normal::standard(),
        }
    }

    fn deterministic(&self) -> bool {
        self.volatility == 0.0
    }

    /// Probability of ever being liquidated.
    pub fn hit_probability(&self) -> f64 {
        if self.deterministic() {
            return if self.pull > 0.0 { 1.0 } else { 0.0 };
        }
        if self.pull >= 0.0 {
            1.0
        } else {
            (2.0 * self.pull * self.distance / self.volatility.powi(2)).exp()
        }
    }

    /// Probability of liquidation by time `t` (years).
    pub fn cdf(&self, t: f64) -> f64 {
        if t <= 0.0 || !t.is_finite() {
            return if t == f64::INFINITY { self.hit_probability() } else { 0.0 };
        }
        if self.deterministic() {
            return if self.pull > 0.0 && t >= self.distance / self.pull {
                1.0
            } else {
                0.0
            };
        }

        let scale = self.volatility * t.sqrt();
        let near = self.normal.cdf((self.pull * t - self.distance) / scale);

        let x = (-self.pull * t - self.distance) / scale;
        let exponent = 2.0 * self.pull * self.distance / self.volatility.powi(2);
        let reflected = (exponent + self.ln_cdf(x)).exp();

        (near + reflected).clamp(0.0, 1.0)
    }

    pub fn survival(&self, t: f64) -> f64 {
        1.0 - self.cdf(t)
    }

    pub fn mean(&self) -> ExpectedTime {
        if self.pull > 0.0 {
            ExpectedTime::Finite(self.distance / self.pull)
        } else {
            ExpectedTime::Infinite
        }
    }

    /// Time by which a fraction `p` of positions are liquidated.
    /// `None` when `p` is at or beyond the probability of ever hitting.
    pub fn quantile(&self, p: f64) -> Option<f64> {
        if !(0.0..1.0).contains(&p) {
            return None;
        }
        if p == 0.0 {
            return Some(0.0);
        }
        if p >= self.hit_probability() {
            return None;
        }
        if self.deterministic() {
            return Some(self.distance / self.pull);
        }

        let mut hi = self.mean().years().unwrap_or(1.0).max(1e-6);
        let mut bracketed = false;
        for _ in 0..MAX_BRACKET_DOUBLINGS {
            if self.cdf(hi) >= p {
                bracketed = true;
                break;
            }
            hi *= 2.0;
        }
        if !bracketed {
            return None;
        }

        let mut lo = 0.0;
        for _ in 0..BISECTION_ITERATIONS {
            let mid = 0.5 * (lo + hi);
            if self.cdf(mid) < p {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi - lo <= 1e-12 * hi {
                break;
            }
        }
        Some(0.5 * (lo + hi))
    }

    pub fn median(&self) -> Option<f64> {
        self.quantile(0.5)
    }

    // ln Phi(x), with an asymptotic tail once Phi underflows.
    fn ln_cdf(&self, x: f64) -> f64 {
        if x > -30.0 {
            return self.normal.cdf(x).ln();
        }
        let x2 = x * x;
        -0.5 * x2 - (-x).ln() - 0.5 * (2.0 * std::f64::consts::PI).ln()
            + (1.0 - 1.0 / x2 + 3.0 / (x2 * x2)).ln()
    }
}
