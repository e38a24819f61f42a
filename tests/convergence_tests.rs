//! Statistical checks that simulated liquidations agree with the
//! first-passage formulas.
//!
//! Parameters are picked so that a daily grid keeps the discrete-monitoring
//! bias around 2% and the horizon is long enough that censoring is
//! negligible. Seeds are fixed, but the tolerances hold for any seed.

use liquidation_sim::monte_carlo::run_monte_carlo;
use liquidation_sim::{
    ExpectedTime, MarketParameters, MonteCarloConfig, PathConfig, PositionParameters, RandomSource,
};

fn run(
    leverage: f64,
    volatility: f64,
    drift: f64,
    trials: usize,
    path: PathConfig,
    seed: u64,
) -> liquidation_sim::Reconciliation {
    let market = MarketParameters::new(100.0, volatility, drift).unwrap();
    let position = PositionParameters::new(leverage).unwrap();
    let config = MonteCarloConfig::new(trials, path, RandomSource::Seeded(seed)).unwrap();
    run_monte_carlo(&market, &position, &config).unwrap()
}

#[test]
fn empirical_mean_converges_to_closed_form_at_zero_drift() {
    let path = PathConfig::new(100.0, 1.0 / 365.0).unwrap();
    let result = run(1.25, 1.0, 0.0, 50_000, path, 2024);

    let analytic = result.analytic.years().unwrap();
    let empirical = result.stats.mean_time.unwrap();
    let error = result.relative_error().unwrap();

    println!("analytic={analytic:.4} empirical={empirical:.4} error={:.2}%", error * 100.0);
    assert!(error.abs() < 0.05, "relative error {error}");
    assert!(result.stats.liquidation_probability > 0.999);
}

#[test]
fn error_shrinks_with_more_trials() {
    // Averaged over seeds so a lucky small run can't beat a large one.
    let path = PathConfig::new(20.0, 1.0 / 365.0).unwrap();
    let spread = |trials: usize| -> f64 {
        let means: Vec<f64> = (0..8)
            .map(|seed| {
                run(5.0, 1.0, -1.0, trials, path, 100 + seed)
                    .stats
                    .mean_time
                    .unwrap()
            })
            .collect();
        let avg = means.iter().sum::<f64>() / means.len() as f64;
        (means.iter().map(|m| (m - avg).powi(2)).sum::<f64>() / (means.len() - 1) as f64).sqrt()
    };

    let small = spread(250);
    let large = spread(4_000);
    assert!(large < small, "small={small} large={large}");
}

#[test]
fn closed_form_diverges_from_simulation_with_negative_drift() {
    // mu + sigma^2/2 = 0: the closed form has no finite expectation, yet
    // every path is liquidated, matching the exact first-passage mean.
    let path = PathConfig::new(40.0, 1.0 / 365.0).unwrap();
    let result = run(1.25, 1.0, -0.5, 20_000, path, 7);

    assert_eq!(result.analytic, ExpectedTime::Infinite);
    assert_eq!(result.relative_error(), None);

    let exact = result.exact_mean.years().unwrap();
    let error = result.exact_relative_error().unwrap();
    println!("exact={exact:.4} empirical={:?}", result.stats.mean_time);
    assert!(error.abs() < 0.05, "relative error vs exact {error}");
}

#[test]
fn lower_drift_shortens_simulated_survival() {
    let path = PathConfig::new(20.0, 1.0 / 365.0).unwrap();
    let means: Vec<f64> = [0.0, -0.5, -1.0]
        .iter()
        .map(|&drift| run(5.0, 1.0, drift, 10_000, path, 31).stats.mean_time.unwrap())
        .collect();
    assert!(means.windows(2).all(|w| w[1] < w[0]), "{means:?}");
}

#[test]
fn liquidation_probability_tracks_exact_cdf() {
    // Discrete monitoring misses some crossings, so the simulated
    // probability sits a little under the continuous one.
    let path = PathConfig::daily(0.25, 4).unwrap();
    let result = run(5.0, 1.0, 0.0, 20_000, path, 55);

    let gap = result.probability_gap();
    println!(
        "empirical={:.4} exact={:.4}",
        result.stats.liquidation_probability, result.exact_probability
    );
    assert!(gap < 0.01, "gap={gap}");
    assert!(gap > -0.04, "gap={gap}");
}
