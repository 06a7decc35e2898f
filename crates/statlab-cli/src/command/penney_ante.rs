use statlab_experiments::penney_ante::{self, Config, Report};

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PenneyAnteArg {
    /// Number of games for each choice of sequence
    #[arg(long, default_value_t = Config::default().tries)]
    tries: usize,
}

pub(crate) fn run(arg: &PenneyAnteArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = Config { tries: arg.tries };
    let report = penney_ante::run(&config, &mut options.seed.rng());
    options.emit(&report, print)
}

fn print(report: &Report) {
    util::print_title("Penney's game");
    println!("{} games per choice (H = heads, first toss first)", report.config.tries);
    println!();
    println!(
        "{:<8} {:<8} {:>12} {:>12} {:>10}",
        "choice", "counter", "choice wins", "counter wins", "P(counter)"
    );
    for stats in &report.choices {
        println!(
            "{:<8} {:<8} {:>12} {:>12} {:>10.4}",
            stats.choice,
            stats.counter,
            stats.choice_wins,
            stats.counter_wins,
            stats.counter_win_rate
        );
    }
}
