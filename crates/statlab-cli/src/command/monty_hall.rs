use statlab_experiments::monty_hall::{self, Config, Report};

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct MontyHallArg {
    /// Number of games played with each strategy
    #[arg(long, default_value_t = Config::default().trials)]
    trials: usize,
    /// Number of points of the win-rate curve
    #[arg(long, default_value_t = Config::default().curve_points)]
    curve_points: usize,
}

pub(crate) fn run(arg: &MontyHallArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = Config {
        trials: arg.trials,
        curve_points: arg.curve_points,
    };
    let report = monty_hall::run(&config, &mut options.seed.rng());
    options.emit(&report, print)
}

fn print(report: &Report) {
    util::print_title("Monty Hall");
    println!("games played:   {}", report.config.trials);
    println!(
        "stay wins:      {:>8} ({:.4}, expected {:.4})",
        report.stay_wins,
        report.stay_rate,
        1.0 / 3.0
    );
    println!(
        "switch wins:    {:>8} ({:.4}, expected {:.4})",
        report.switch_wins,
        report.switch_rate,
        2.0 / 3.0
    );
    println!();
    println!("{:>10} {:>10} {:>10}", "games", "stay", "switch");
    for point in &report.curve {
        println!(
            "{:>10} {:>10.4} {:>10.4}",
            point.games, point.stay_rate, point.switch_rate
        );
    }
}
