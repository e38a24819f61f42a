//! Market and position parameters.
//!
//! Rates are annualized fractions (0.5 = 50%). Leverage is a plain ratio
//! and must be strictly above 1x, otherwise there is no liquidation barrier.

use crate::error::{
    require_finite, require_leverage, require_non_negative, require_positive, SimResult,
};

pub const DAYS_PER_YEAR: f64 = 365.0;

pub fn years_to_days(years: f64) -> f64 {
    years * DAYS_PER_YEAR
}

pub fn days_to_years(days: f64) -> f64 {
    days / DAYS_PER_YEAR
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarketParameters {
    initial_price: f64,
    volatility: f64,
    drift: f64,
}

impl MarketParameters {
    /// `drift` is the net drift, i.e. already after funding.
    pub fn new(initial_price: f64, volatility: f64, drift: f64) -> SimResult<Self> {
        Ok(Self {
            initial_price: require_positive("initial_price", initial_price)?,
            volatility: require_non_negative("volatility", volatility)?,
            drift: require_finite("drift", drift)?,
        })
    }

    /// Copy with the funding rate subtracted from the drift.
    pub fn with_funding(&self, funding: f64) -> SimResult<Self> {
        let funding = require_finite("funding", funding)?;
        Self::new(self.initial_price, self.volatility, self.drift - funding)
    }

    pub fn initial_price(&self) -> f64 {
        self.initial_price
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn drift(&self) -> f64 {
        self.drift
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionParameters {
    leverage: f64,
}

impl PositionParameters {
    pub fn new(leverage: f64) -> SimResult<Self> {
        Ok(Self {
            leverage: require_leverage(leverage)?,
        })
    }

    pub fn leverage(&self) -> f64 {
        self.leverage
    }

    /// Fractional adverse move that exhausts the margin.
    pub fn liquidation_distance(&self) -> f64 {
        1.0 / self.leverage
    }

    pub fn liquidation_barrier(&self, initial_price: f64) -> f64 {
        initial_price * (1.0 - self.liquidation_distance())
    }

    /// `ln(1 - 1/L)`, strictly negative for every valid leverage.
    pub fn log_barrier(&self) -> f64 {
        (-self.liquidation_distance()).ln_1p()
    }

    /// PnL of a long with the given notional when the mark sits at `price`.
    ///
    /// Above the barrier the payoff is linear in the price move; at or below
    /// it the whole margin (`notional / leverage`) is gone. This is the
    /// option-like kink that leverage puts into a perpetual.
    pub fn payoff(&self, notional: f64, initial_price: f64, price: f64) -> f64 {
        if price <= self.liquidation_barrier(initial_price) {
            -notional / self.leverage
        } else {
            notional * (price / initial_price - 1.0)
        }
    }

    /// PnL of a long call on `notional / initial_price` units, struck at the
    /// liquidation price and bought for a premium equal to the margin.
    ///
    /// Matches [`payoff`](Self::payoff) at every price: the perp is this
    /// option, with liquidation standing in for expiry out of the money.
    pub fn call_equivalent_payoff(&self, notional: f64, initial_price: f64, price: f64) -> f64 {
        let units = notional / initial_price;
        let strike = self.liquidation_barrier(initial_price);
        let premium = notional / self.leverage;
        units * (price - strike).max(0.0) - premium
    }

    pub fn summary(&self, notional: f64, initial_price: f64) -> PayoffSummary {
        let margin = notional / self.leverage;
        PayoffSummary {
            leverage: self.leverage,
            margin,
            liquidation_price: self.liquidation_barrier(initial_price),
            liquidation_distance: self.liquidation_distance(),
            max_loss: margin,
            breakeven_move: self.liquidation_distance(),
            delta: self.leverage,
        }
    }
}

/// Option-like shape of a leveraged long at entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PayoffSummary {
    pub leverage: f64,
    pub margin: f64,
    pub liquidation_price: f64,
    pub liquidation_distance: f64, // fraction below entry
    pub max_loss: f64,             // the margin, like a premium
    pub breakeven_move: f64,       // rise that earns the margin back
    pub delta: f64,                // PnL per unit move, per unit of margin
}

pub fn liquidation_barrier(initial_price: f64, leverage: f64) -> SimResult<f64> {
    let initial_price = require_positive("initial_price", initial_price)?;
    Ok(PositionParameters::new(leverage)?.liquidation_barrier(initial_price))
}
