use statlab_experiments::variance_check::{self, Config, Report};

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct VarianceCheckArg {
    /// Number of uniform values
    #[arg(long, default_value_t = Config::default().size)]
    size: usize,
    /// Values are drawn from [0, scale)
    #[arg(long, default_value_t = Config::default().scale)]
    scale: f64,
}

pub(crate) fn run(arg: &VarianceCheckArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = Config {
        size: arg.size,
        scale: arg.scale,
    };
    let report = variance_check::run(&config, &mut options.seed.rng());
    options.emit(&report, print)
}

fn print(report: &Report) {
    util::print_title("Variance check");
    println!("mean:                      {:.6}", report.mean);
    println!("sum x^2 / n:               {:.6}", report.bad);
    println!("sum (x - mean)^2 / n:      {:.6}", report.good);
    println!("sum (x^2 - mean^2) / n:    {:.6}", report.dont_know);
    println!("expected (scale^2 / 12):   {:.6}", report.expected);
}
