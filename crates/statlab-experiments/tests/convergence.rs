//! Large-sample behaviour of the experiments: each estimate has to land near its
//! known limit for a fixed seed.

use approx::assert_relative_eq;
use statlab_experiments::{
    chi_square_from_poisson, linear_regression, monty_hall, particle_detection, seed::Seed,
};
use statlab_stats::distributions;

#[test]
fn monty_hall_rates_approach_one_and_two_thirds() {
    let mut rng = Seed::from_u128(0x5eed_0001).rng();
    let report = monty_hall::run(&monty_hall::Config::default(), &mut rng);
    assert_eq!(report.stay_wins + report.switch_wins, 10_000);
    // 4σ with σ = sqrt(2/9 / 10000)
    assert!((report.stay_rate - 1.0 / 3.0).abs() < 0.02);
    assert!((report.switch_rate - 2.0 / 3.0).abs() < 0.02);
}

#[test]
fn chi_square_from_poisson_moments() {
    let mut rng = Seed::from_u128(0x5eed_0002).rng();
    let config = chi_square_from_poisson::Config {
        draws: 4_000,
        ..chi_square_from_poisson::Config::default()
    };
    let report = chi_square_from_poisson::run(&config, &mut rng).unwrap();

    assert_relative_eq!(report.poisson_moments.mean, 10_000.0, epsilon = 10.0);
    assert_relative_eq!(report.single_moments.mean, 1.0, epsilon = 0.1);
    assert_relative_eq!(report.single_moments.variance, 2.0, max_relative = 0.25);

    let dof = 200.0;
    assert_relative_eq!(report.combined_moments.mean, dof, epsilon = 2.0);
    assert_relative_eq!(report.combined_moments.variance, 2.0 * dof, max_relative = 0.15);
}

#[test]
fn line_fit_recovers_generating_line() {
    let mut rng = Seed::from_u128(0x5eed_0003).rng();
    let generate = linear_regression::GenerateConfig {
        points: 200,
        ..linear_regression::GenerateConfig::default()
    };
    let points = linear_regression::generate(&generate, &mut rng).unwrap();
    let report = linear_regression::run(
        &linear_regression::Config {
            sigma: generate.sigma,
        },
        &points,
    )
    .unwrap();

    assert!((report.fit.slope - generate.slope).abs() < 4.0 * report.fit.slope_error);
    assert!((report.fit.intercept - generate.intercept).abs() < 4.0 * report.fit.intercept_error);
    assert_eq!(report.ndf, 198);
    assert!((report.reduced_chi_square - 1.0).abs() < 4.0 * report.expected_spread);
}

#[test]
fn binomial_table_is_normalised_and_follows_recursion() {
    let (n, p) = (4_096, 0.989);
    let table = distributions::binomial_table(n, p).unwrap();
    assert_eq!(table.len(), 4_097);
    assert_relative_eq!(table.iter().sum::<f64>(), 1.0, epsilon = 1e-9);

    let ratio = p / (1.0 - p);
    for k in 3_950..4_096_u32 {
        let idx = usize::try_from(k).unwrap();
        let next = table[idx] * f64::from(4_096 - k) / f64::from(k + 1) * ratio;
        assert_relative_eq!(table[idx + 1], next, max_relative = 1e-9);
    }
    for k in [4_000_u64, 4_051, 4_096] {
        assert_relative_eq!(
            table[usize::try_from(k).unwrap()],
            distributions::binomial(k, n, p).unwrap(),
            max_relative = 1e-9
        );
    }

    let report = particle_detection::run(&particle_detection::Config::default()).unwrap();
    assert_relative_eq!(report.binomial_total, 1.0, epsilon = 1e-9);
}
