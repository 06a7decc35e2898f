use statlab_experiments::lethal_horse::{self, Config, Report};

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct LethalHorseArg {
    /// Corps-years with 0, 1, 2, ... deaths
    #[arg(long, value_delimiter = ',', default_values_t = Config::default().deaths)]
    deaths: Vec<f64>,
}

pub(crate) fn run(arg: &LethalHorseArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = Config {
        deaths: arg.deaths.clone(),
    };
    let report = lethal_horse::run(&config)?;
    options.emit(&report, print)
}

fn print(report: &Report) {
    util::print_title("Deaths by horse kick");
    println!(
        "lambda {:.4}, normalisation {:.1}",
        report.lambda, report.normalisation
    );
    println!();
    println!(
        "{:>7} {:>10} {:>10} {:>8}",
        "deaths", "observed", "expected", "error"
    );
    for row in &report.rows {
        println!(
            "{:>7} {:>10.0} {:>10.2} {:>8.2}",
            row.deaths, row.observed, row.expected, row.error
        );
    }
    println!();
    println!(
        "chi2 / ndf = {:.4} / {}, P(chi2) = {:.4}",
        report.chi_square, report.ndf, report.probability
    );
}
