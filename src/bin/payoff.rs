//! Perp vs. Call Option Payoff Binary
//!
//! Shows that a leveraged long behaves like a call struck at the
//! liquidation price with the margin as premium: per-leverage summary, then
//! both payoffs side by side across a price range.
//!
//! ## Usage
//! ```bash
//! cargo run --bin payoff --release
//! LIQSIM_INITIAL_PRICE=50 cargo run --bin payoff --release
//! ```

use liquidation_sim::config::{init_logging, RunConfig};
use liquidation_sim::{PositionParameters, SimResult};

const NOTIONAL: f64 = 1000.0;
const LEVERAGES: [f64; 4] = [2.0, 5.0, 10.0, 20.0];
const COMPARISON_LEVERAGE: f64 = 10.0;

fn main() {
    init_logging();
    if let Err(e) = run() {
        tracing::error!("payoff failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> SimResult<()> {
    let cfg = RunConfig::from_env()?;
    let initial_price = cfg.initial_price;

    println!("=======================================================");
    println!("  Leveraged Perpetual: Option-Like Payoff");
    println!("  Position ${NOTIONAL:.0} notional, entry ${initial_price:.2}");
    println!("=======================================================");
    println!();

    println!("| Lev  | Margin  | Liq Price | Liq Move | Max Loss | Breakeven | Delta |");
    println!("|------|---------|-----------|----------|----------|-----------|-------|");
    for leverage in LEVERAGES {
        let s = PositionParameters::new(leverage)?.summary(NOTIONAL, initial_price);
        println!(
            "| {:3.0}x | {:7.2} | {:9.2} | {:7.1}% | {:8.2} | {:+8.1}% | {:5.0} |",
            s.leverage,
            s.margin,
            s.liquidation_price,
            -s.liquidation_distance * 100.0,
            s.max_loss,
            s.breakeven_move * 100.0,
            s.delta,
        );
    }
    println!();

    let position = PositionParameters::new(COMPARISON_LEVERAGE)?;
    let strike = position.liquidation_barrier(initial_price);
    println!(
        "{:.0}x perp vs. call (strike {:.2}, premium {:.2})",
        COMPARISON_LEVERAGE,
        strike,
        NOTIONAL / COMPARISON_LEVERAGE
    );
    println!("{}", "-".repeat(50));
    println!("| Price    | Perp PnL  | Call PnL  | Zone       |");
    println!("|----------|-----------|-----------|------------|");
    for step in 0..=16 {
        let price = initial_price * (0.6 + 0.05 * step as f64);
        let zone = if price <= strike { "LIQUIDATED" } else { "linear" };
        println!(
            "| {:8.2} | {:+9.2} | {:+9.2} | {:10} |",
            price,
            position.payoff(NOTIONAL, initial_price, price),
            position.call_equivalent_payoff(NOTIONAL, initial_price, price),
            zone,
        );
    }
    println!();
    println!("  Below the liquidation price the loss is capped at the margin.");
    println!("  Higher leverage moves the strike closer, so the payoff gets more binary.");
    Ok(())
}
