use statlab_experiments::maximum_likelihood::{self, Config, Report};

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct MaximumLikelihoodArg {
    /// True lifetime
    #[arg(long, default_value_t = Config::default().tau)]
    tau: f64,
    /// Decays measured per experiment
    #[arg(long, default_value_t = Config::default().measures)]
    measures: usize,
    /// Number of experiments
    #[arg(long, default_value_t = Config::default().experiments)]
    experiments: usize,
    /// Bins of the decay-time histogram
    #[arg(long, default_value_t = Config::default().bins)]
    bins: usize,
}

pub(crate) fn run(arg: &MaximumLikelihoodArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = Config {
        tau: arg.tau,
        measures: arg.measures,
        experiments: arg.experiments,
        bins: arg.bins,
        ..Config::default()
    };
    let report = maximum_likelihood::run(&config, &mut options.seed.rng())?;
    options.emit(&report, print)
}

fn print(report: &Report) {
    util::print_title("Maximum likelihood lifetime fits");
    println!(
        "{} experiments of {} decays, tau = {}",
        report.config.experiments, report.config.measures, report.config.tau
    );
    println!(
        "mean estimate {:.5}, mean error {:.5}, failed fits {}",
        report.mean_estimate, report.mean_error, report.failed_fits
    );
    println!(
        "pulls: mean {:.4}, std dev {:.4}",
        report.pull_mean, report.pull_std_dev
    );
    println!();
    println!("{:>8} {:>10} {:>10}", "pull", "observed", "N(0, 1)");
    for row in &report.rows {
        println!("{:>8.3} {:>10.0} {:>10.2}", row.x, row.observed, row.expected);
    }
}
