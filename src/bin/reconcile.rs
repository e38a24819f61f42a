//! Monte Carlo Reconciliation Binary
//!
//! Simulates GBM paths for a handful of leverage/volatility/drift settings
//! and sets the empirical liquidation statistics next to the closed form
//! and the exact first-passage law.
//!
//! ## Usage
//! ```bash
//! LIQSIM_TRIALS=50000 LIQSIM_HORIZON_YEARS=5 cargo run --bin reconcile --release
//! ```

use liquidation_sim::config::{init_logging, RunConfig};
use liquidation_sim::monte_carlo::{run_monte_carlo, Reconciliation};
use liquidation_sim::params::days_to_years;
use liquidation_sim::{
    MarketParameters, MonteCarloConfig, PathConfig, PositionParameters, SimResult,
};

// 10x, 50% vol, no drift, daily steps over one quarter.
const PATH_DEMO_DAYS: f64 = 90.0;

// (leverage, volatility, drift)
const CASES: [(f64, f64, f64); 6] = [
    (20.0, 0.50, 0.0),
    (50.0, 1.50, 0.0),
    (10.0, 1.50, 0.0),
    (10.0, 1.50, -0.5),
    (5.0, 1.00, -1.0),
    (3.0, 0.80, 0.3),
];

fn main() {
    init_logging();
    if let Err(e) = run() {
        tracing::error!("reconcile failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> SimResult<()> {
    let cfg = RunConfig::from_env()?;
    let mc = cfg.monte_carlo()?;

    println!("=======================================================");
    println!("  Monte Carlo Reconciliation");
    println!("  Simulated GBM paths vs. closed-form expected time");
    println!("=======================================================");
    println!();
    println!("Parameters:");
    println!("  Trials per case: {}", mc.trials);
    println!("  Horizon:         {:.2} years", mc.path.horizon());
    println!("  Step:            {:.4} days", mc.path.dt() * 365.0);
    println!();

    let demo = run_path_demo(cfg.initial_price, &mc)?;
    println!();

    let mut results = Vec::with_capacity(CASES.len() + 1);
    results.push(demo);
    for (leverage, volatility, drift) in CASES {
        let market = MarketParameters::new(cfg.initial_price, volatility, drift)?;
        let position = PositionParameters::new(leverage)?;

        println!("=======================================================");
        println!(
            "Case: {:.0}x leverage, {:.0}% vol, {:+.0}% drift",
            leverage,
            volatility * 100.0,
            drift * 100.0
        );
        println!("=======================================================");
        let result = run_monte_carlo(&market, &position, &mc)?;
        result.print();
        println!();
        results.push(result);
    }

    print_summary_table(&results);
    Ok(())
}

fn run_path_demo(initial_price: f64, mc: &MonteCarloConfig) -> SimResult<Reconciliation> {
    let market = MarketParameters::new(initial_price, 0.5, 0.0)?;
    let position = PositionParameters::new(10.0)?;
    let path = PathConfig::daily(days_to_years(PATH_DEMO_DAYS), 1)?;
    let config = MonteCarloConfig::new(mc.trials, path, mc.seed)?;

    println!("=======================================================");
    println!("Path demo: 10x leverage, 50% vol, {PATH_DEMO_DAYS:.0} daily steps");
    println!("=======================================================");
    let result = run_monte_carlo(&market, &position, &config)?;
    println!("  Initial price:           {:.2}", market.initial_price());
    result.print();
    println!(
        "  Paths liquidated:        {}/{} ({:.1}%)",
        result.stats.liquidated,
        result.stats.trials,
        result.stats.liquidation_probability * 100.0
    );
    match result.stats.mean_days() {
        Some(days) => println!("  Average time to liquidation: {days:.1} days"),
        None => println!("  Average time to liquidation: n/a"),
    }
    Ok(result)
}

fn print_summary_table(results: &[Reconciliation]) {
    let fmt_days = |years: Option<f64>| match years {
        Some(y) => format!("{:9.2}", y * 365.0),
        None => format!("{:>9}", "inf"),
    };

    println!("| Lev  | Vol  | Drift | Formula d | Exact d   | Empirical | P(liq) MC | P(liq) exact |");
    println!("|------|------|-------|-----------|-----------|-----------|-----------|--------------|");
    for r in results {
        println!(
            "| {:3.0}x | {:3.0}% | {:+4.0}% | {} | {} | {} | {:8.1}% | {:11.1}% |",
            r.position.leverage(),
            r.market.volatility() * 100.0,
            r.market.drift() * 100.0,
            fmt_days(r.analytic.years()),
            fmt_days(r.exact_mean.years()),
            fmt_days(r.stats.mean_time),
            r.stats.liquidation_probability * 100.0,
            r.exact_probability * 100.0,
        );
    }
    println!();
    println!("  Empirical times are over liquidated paths only; survivors are censored.");
}
