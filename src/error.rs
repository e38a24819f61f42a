//! Error types shared by every stage of the simulation.
//!
//! Simulation and detection are total over validated inputs, so the only
//! failure the library itself produces is a rejected parameter. `Config` is
//! used by the binaries when environment overrides don't parse.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("config error: {0}")]
    Config(String),
}

pub type SimResult<T> = Result<T, SimError>;

pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> SimError {
    SimError::InvalidParameter { name, value, reason }
}

/// Rejects NaN and infinities before any range check runs.
pub(crate) fn require_finite(name: &'static str, value: f64) -> SimResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(name, value, "must be finite"))
    }
}

pub(crate) fn require_positive(name: &'static str, value: f64) -> SimResult<f64> {
    require_finite(name, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(name, value, "must be > 0"))
    }
}

pub(crate) fn require_non_negative(name: &'static str, value: f64) -> SimResult<f64> {
    require_finite(name, value)?;
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(invalid(name, value, "must be >= 0"))
    }
}

pub(crate) fn require_leverage(value: f64) -> SimResult<f64> {
    require_finite("leverage", value)?;
    if value > 1.0 {
        Ok(value)
    } else {
        Err(invalid("leverage", value, "must be > 1"))
    }
}
