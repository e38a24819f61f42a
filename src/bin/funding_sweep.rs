//! Funding Sweep Binary
//!
//! Median time to liquidation against leverage for several funding rates at
//! a fixed volatility, and how much funding cuts it at each leverage.
//!
//! ## Usage
//! ```bash
//! cargo run --bin funding_sweep --release
//! LIQSIM_MONTE_CARLO=true LIQSIM_TRIALS=2000 cargo run --bin funding_sweep --release
//! ```

use liquidation_sim::config::{init_logging, RunConfig};
use liquidation_sim::sweep::{
    funding_sensitivity, linspace, run_sweep, SweepGrid, SweepResult, FUNDING_RATES,
};
use liquidation_sim::SimResult;

const VOLATILITY: f64 = 1.5;

fn main() {
    init_logging();
    if let Err(e) = run() {
        tracing::error!("funding_sweep failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> SimResult<()> {
    let cfg = RunConfig::from_env()?;
    let with_monte_carlo = cfg.sweep_monte_carlo;

    let leverages = linspace(2.0, 50.0, 13);
    let grid = SweepGrid::funding_curve(VOLATILITY, leverages, &FUNDING_RATES)?;
    let result = run_sweep(&grid, &cfg.sweep()?)?;

    println!("=======================================================");
    println!("  Median Time to Liquidation vs. Leverage and Funding");
    println!("  {:.0}% annual volatility", VOLATILITY * 100.0);
    println!("=======================================================");
    println!();

    print_median_table(&result, &grid, with_monte_carlo);
    println!();

    print_mean_vs_median(&result, &grid);
    println!();

    println!(
        "Funding impact (exact median, {:.0}% vs {:.0}% funding)",
        FUNDING_RATES[0] * 100.0,
        FUNDING_RATES[FUNDING_RATES.len() - 1] * 100.0
    );
    println!("{}", "-".repeat(50));
    println!("| Lev   | Median 0% | Median max | Reduction |");
    println!("|-------|-----------|------------|-----------|");
    for row in funding_sensitivity(&result, VOLATILITY) {
        println!(
            "| {:4.0}x | {:8.2}d | {:9.2}d | {:8.1}% |",
            row.leverage,
            row.baseline_median * 365.0,
            row.funded_median * 365.0,
            row.reduction * 100.0,
        );
    }
    Ok(())
}

fn print_median_table(result: &SweepResult, grid: &SweepGrid, with_monte_carlo: bool) {
    print!("  lev \\ funding");
    for funding in FUNDING_RATES {
        print!(" {:>9}", format!("{:.0}%", funding * 100.0));
    }
    println!();

    for &leverage in grid.leverages() {
        print!("  {:>12.1}x", leverage);
        for &drift in grid.drifts() {
            let Some(cell) = result.get(leverage, VOLATILITY, drift) else {
                continue;
            };
            let median = if with_monte_carlo {
                cell.monte_carlo.as_ref().and_then(|s| s.median_time)
            } else {
                cell.exact_median
            };
            match median {
                Some(years) => print!(" {:>8.2}d", years * 365.0),
                None => print!(" {:>9}", "n/a"),
            }
        }
        println!();
    }
    println!();
    println!("  Heuristic vs. exact median at 10x:");
    for &drift in grid.drifts() {
        let nearest = grid
            .leverages()
            .iter()
            .copied()
            .min_by(|a, b| (a - 10.0).abs().total_cmp(&(b - 10.0).abs()));
        if let Some(cell) = nearest.and_then(|l| result.get(l, VOLATILITY, drift)) {
            println!(
                "    funding {:>4.0}%: heuristic {:>8}  exact {:>8}",
                -drift * 100.0,
                cell.median_heuristic
                    .days()
                    .map_or("n/a".to_string(), |d| format!("{d:.2}d")),
                cell.exact_median
                    .map_or("n/a".to_string(), |y| format!("{:.2}d", y * 365.0)),
            );
        }
    }
}

/// Zero-funding mean against median: rare long survivors drag the mean up.
fn print_mean_vs_median(result: &SweepResult, grid: &SweepGrid) {
    println!("Mean vs. median at {:.0}% funding", FUNDING_RATES[0] * 100.0);
    println!("{}", "-".repeat(50));
    println!("| Lev   | Mean      | Median    | Heuristic | Median/Mean |");
    println!("|-------|-----------|-----------|-----------|-------------|");
    let drift = -FUNDING_RATES[0];
    for &leverage in grid.leverages() {
        let Some(cell) = result.get(leverage, VOLATILITY, drift) else {
            continue;
        };
        let (Some(mean), Some(median)) = (cell.analytic.days(), cell.exact_median) else {
            continue;
        };
        let median = median * 365.0;
        let heuristic = cell
            .median_heuristic
            .days()
            .map_or("n/a".to_string(), |d| format!("{d:8.2}d"));
        println!(
            "| {:4.1}x | {:8.2}d | {:8.2}d | {:>9} | {:10.1}% |",
            leverage,
            mean,
            median,
            heuristic,
            median / mean * 100.0,
        );
    }
}
