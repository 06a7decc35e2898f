use statlab_experiments::counting_experiment::{self, Config, ModeSummary, Report};
use statlab_stats::fit::BinMode;

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct CountingExperimentArg {
    /// Number of toy experiments per binning mode
    #[arg(long, default_value_t = Config::default().tries)]
    tries: usize,
    /// Bins of each toy histogram
    #[arg(long, default_value_t = Config::default().bins)]
    bins: usize,
    /// Area of the generating Gaussian
    #[arg(long, default_value_t = Config::default().norm)]
    norm: f64,
    /// Print every pull histogram
    #[arg(long)]
    histograms: bool,
}

pub(crate) fn run(arg: &CountingExperimentArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = Config {
        tries: arg.tries,
        bins: arg.bins,
        norm: arg.norm,
        ..Config::default()
    };
    let report = counting_experiment::run(&config, &mut options.seed.rng())?;
    options.emit(&report, |report| print(report, arg.histograms))
}

fn mode_label(mode: BinMode) -> &'static str {
    match mode {
        BinMode::Center => "bin centre",
        BinMode::Integral => "bin integral",
    }
}

fn print_mode(summary: &ModeSummary, histograms: bool) {
    println!();
    println!(
        "expectation from the {}: mean chi2 {:.4} for ndf {}, {} failed fits",
        mode_label(summary.mode),
        summary.mean_chi_square,
        summary.ndf,
        summary.failed_fits
    );
    println!(
        "  {:<8} {:>12} {:>12} {:>22} {:>22}",
        "pull", "mean", "std dev", "fitted mean", "fitted sigma"
    );
    for pulls in &summary.pulls {
        let fitted = |j: usize| {
            pulls.fit.as_ref().map_or_else(
                || "-".to_owned(),
                |fit| format!("{:.4} ± {:.4}", fit.params[j], fit.errors[j]),
            )
        };
        println!(
            "  {:<8} {:>12.4} {:>12.4} {:>22} {:>22}",
            pulls.name,
            pulls.sample_mean,
            pulls.sample_std_dev,
            fitted(1),
            fitted(2)
        );
        if histograms {
            util::print_histogram(&format!("{} pull", pulls.name), &pulls.histogram);
        }
    }
    if histograms {
        util::print_histogram("chi2", &summary.chi_square);
        util::print_histogram("P(chi2)", &summary.probability);
    }
}

fn print(report: &Report, histograms: bool) {
    util::print_title("Counting experiment");
    println!(
        "{} toys, {} bins on [{}, {}), true parameters {:?}",
        report.config.tries,
        report.config.bins,
        report.config.x_min,
        report.config.x_max,
        report.true_params
    );
    for summary in &report.modes {
        print_mode(summary, histograms);
    }
}
