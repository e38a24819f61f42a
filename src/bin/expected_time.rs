//! Expected Time to Liquidation Binary
//!
//! Prints the closed-form estimates: the worked examples, the scenario
//! risk table and the leverage x volatility heatmap.
//!
//! ## Usage
//! ```bash
//! cargo run --bin expected_time --release
//! ```

use liquidation_sim::analytic::{expected_days, format_duration, RiskLevel, Scenario};
use liquidation_sim::config::init_logging;
use liquidation_sim::sweep::{run_sweep, SweepConfig, SweepGrid, SweepResult};
use liquidation_sim::SimResult;

const EXAMPLES: [(f64, f64, &str); 5] = [
    (50.0, 1.50, "50x leverage, 150% volatility"),
    (10.0, 0.50, "10x leverage, 50% volatility (Bitcoin-like)"),
    (10.0, 1.00, "10x leverage, 100% volatility (Altcoin)"),
    (5.0, 0.50, "5x leverage, 50% volatility"),
    (20.0, 0.30, "20x leverage, 30% volatility"),
];

fn main() {
    init_logging();
    if let Err(e) = run() {
        tracing::error!("expected_time failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> SimResult<()> {
    println!("=======================================================");
    println!("  Expected Time to Liquidation");
    println!("  E[tau] = -ln(1 - 1/L) / (mu + sigma^2/2)");
    println!("=======================================================");
    println!();

    println!("Example Calculations (zero drift, zero funding)");
    println!("{}", "-".repeat(50));
    for (leverage, volatility, desc) in EXAMPLES {
        match expected_days(leverage, volatility, 0.0)? {
            Some(days) => println!("  {desc}: {days:.1} days expected"),
            None => println!("  {desc}: no finite expected time"),
        }
    }
    println!();

    print_scenario_table(0.0)?;
    println!();

    let heatmaps = [
        (0.0, "Zero Drift, Zero Funding"),
        (0.05, "Net Drift +5%: 10% drift, 5% funding"),
    ];
    for (drift, label) in heatmaps {
        println!("=======================================================");
        println!("  Heatmap: expected days ({label})");
        println!("=======================================================");
        let result = run_sweep(&SweepGrid::heatmap(drift)?, &SweepConfig::default())?;
        print_heatmap(&result, drift);
        println!();
    }

    Ok(())
}

fn print_scenario_table(drift: f64) -> SimResult<()> {
    println!("| Scenario             | Vol   | Lev  | Expected Time  | Risk Level |");
    println!("|----------------------|-------|------|----------------|------------|");
    for scenario in Scenario::all() {
        let (volatility, leverage) = scenario.parameters();
        let expected = scenario.expected_time(drift)?;
        let time = expected
            .days()
            .map_or_else(|| "never".to_string(), format_duration);
        println!(
            "| {:20} | {:4.0}% | {:3.0}x | {:14} | {:10} |",
            scenario.name(),
            volatility * 100.0,
            leverage,
            time,
            RiskLevel::from_expected(expected).name(),
        );
    }
    Ok(())
}

fn print_heatmap(result: &SweepResult, drift: f64) {
    let Some(first) = result.cells().first() else {
        return;
    };
    let mut leverages: Vec<f64> = result
        .iter()
        .filter(|c| c.volatility == first.volatility)
        .map(|c| c.leverage)
        .collect();
    leverages.dedup();
    let mut volatilities: Vec<f64> = result
        .iter()
        .filter(|c| c.leverage == first.leverage)
        .map(|c| c.volatility)
        .collect();
    volatilities.dedup();

    print!("  vol \\ lev");
    for leverage in &leverages {
        print!(" {:>7}", format!("{leverage:.0}x"));
    }
    println!();

    for &volatility in &volatilities {
        print!("  {:>8.0}%", volatility * 100.0);
        for &leverage in &leverages {
            let cell = result.get(leverage, volatility, drift);
            match cell.and_then(|c| c.analytic.days()) {
                Some(days) => print!(" {days:>7.1}"),
                None => print!(" {:>7}", "inf"),
            }
        }
        println!();
    }
}
