use statlab_experiments::chi_square_from_poisson::{self, Config, DensityRow, Moments, Report};

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ChiSquareFromPoissonArg {
    /// Mean of the Poisson law
    #[arg(long, default_value_t = Config::default().lambda)]
    lambda: f64,
    /// Number of draws (and of sums)
    #[arg(long, default_value_t = Config::default().draws)]
    draws: usize,
    /// Terms per sum
    #[arg(long, default_value_t = Config::default().dof)]
    dof: usize,
}

pub(crate) fn run(arg: &ChiSquareFromPoissonArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = Config {
        lambda: arg.lambda,
        draws: arg.draws,
        dof: arg.dof,
    };
    let report = chi_square_from_poisson::run(&config, &mut options.seed.rng())?;
    options.emit(&report, print)
}

fn print_moments(title: &str, moments: &Moments, mean: f64, variance: f64) {
    println!(
        "{title:<22} mean {:>12.4} (expected {mean}), variance {:>12.4} (expected {variance})",
        moments.mean, moments.variance
    );
}

fn print_rows(rows: &[DensityRow]) {
    println!("{:>10} {:>12} {:>12} {:>12}", "x", "observed", "chi2 pdf", "gaussian");
    for row in rows {
        let gaussian = row
            .gaussian
            .map_or_else(|| "-".to_owned(), |g| format!("{g:.6}"));
        println!(
            "{:>10.4} {:>12.6} {:>12.6} {:>12}",
            row.x, row.observed, row.chi_square, gaussian
        );
    }
}

#[expect(clippy::cast_precision_loss)]
fn print(report: &Report) {
    let config = &report.config;
    let dof = config.dof as f64;
    util::print_title("Chi-square from Poisson");
    print_moments("poisson draws", &report.poisson_moments, config.lambda, config.lambda);
    print_moments("single terms", &report.single_moments, 1.0, 2.0);
    print_moments("sums", &report.combined_moments, dof, 2.0 * dof);
    if report.skipped_draws > 0 || report.skipped_sums > 0 {
        println!(
            "skipped zero counts: {} draws, {} sums",
            report.skipped_draws, report.skipped_sums
        );
    }
    util::print_histogram("poisson draws", &report.poisson);
    println!();
    println!("single terms against chi2 with 1 dof");
    print_rows(&report.single_rows);
    println!();
    println!("sums against chi2 with {} dof and N({dof}, {})", config.dof, 2.0 * dof);
    print_rows(&report.combined_rows);
}
