use statlab_experiments::decision_wheel::{self, Config, Report};

use crate::command::RunOptions;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct DecisionWheelArg {
    /// Number of spins
    #[arg(long, default_value_t = Config::default().spins)]
    spins: usize,
}

pub(crate) fn run(arg: &DecisionWheelArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = Config { spins: arg.spins };
    let report = decision_wheel::run(&config, &mut options.seed.rng());
    options.emit(&report, print)
}

fn print(report: &Report) {
    if let [pick] = report.picks.as_slice() {
        println!("{pick}");
        return;
    }
    for (outcome, count) in &report.counts {
        println!("{count:>8}  {outcome}");
    }
}
