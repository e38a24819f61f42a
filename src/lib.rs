//! Liquidation Time Simulation Library
//!
//! Tools for estimating how long a leveraged perpetual swap position
//! survives before its margin is exhausted, under geometric Brownian motion.
//!
//! ## Modules
//!
//! - `params`: market/position parameters and the liquidation barrier
//! - `path`: discretized GBM price paths and per-trial random sources
//! - `detector`: first crossing of the liquidation barrier on a path
//! - `analytic`: closed-form expected time to liquidation
//! - `first_passage`: exact GBM first-passage distribution
//! - `monte_carlo`: simulated liquidation statistics vs. the closed form
//! - `sweep`: leverage x volatility x funding grids
//! - `config`: environment-driven settings for the binaries
//!
//! ## Usage
//!
//! ```bash
//! # Closed-form times, scenario table and heatmap
//! cargo run --bin expected_time --release
//!
//! # Monte Carlo vs. closed form
//! cargo run --bin reconcile --release
//!
//! # Median time vs. leverage and funding
//! cargo run --bin funding_sweep --release
//!
//! # Perp vs. call option payoff
//! cargo run --bin payoff --release
//! ```

pub mod analytic;
pub mod config;
pub mod detector;
pub mod error;
pub mod first_passage;
pub mod monte_carlo;
pub mod params;
pub mod path;
pub mod sweep;

pub use analytic::{expected_time_to_liquidation, ExpectedTime};
pub use detector::{detect_liquidation, LiquidationOutcome};
pub use error::{SimError, SimResult};
pub use first_passage::FirstPassage;
pub use monte_carlo::{run_monte_carlo, LiquidationStats, MonteCarloConfig, Reconciliation};
pub use params::{liquidation_barrier, MarketParameters, PayoffSummary, PositionParameters};
pub use path::{simulate_path, PathConfig, RandomSource, SimulatedPath};
pub use sweep::{run_sweep, SweepConfig, SweepGrid, SweepResult};
