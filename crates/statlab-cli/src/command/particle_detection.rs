use statlab_experiments::particle_detection::{self, Config, Report};

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ParticleDetectionArg {
    /// Number of particles crossing the detector
    #[arg(long, default_value_t = Config::default().n)]
    n: u64,
    /// Detection probability of a single particle
    #[arg(long, default_value_t = Config::default().p)]
    p: f64,
    /// Half width of the printed window, in standard deviations of the Poisson law
    #[arg(long, default_value_t = Config::default().window_sigmas)]
    window_sigmas: u64,
}

pub(crate) fn run(arg: &ParticleDetectionArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = Config {
        n: arg.n,
        p: arg.p,
        window_sigmas: arg.window_sigmas,
    };
    let report = particle_detection::run(&config)?;
    options.emit(&report, print)
}

fn print(report: &Report) {
    util::print_title("Particle detection");
    println!(
        "n = {}, p = {}, mean = {:.2}, recursion starts at P({}) = {:e}",
        report.config.n, report.config.p, report.mean, report.start_k, report.start_value
    );
    println!();
    println!(
        "{:>6} {:>14} {:>14} {:>14}",
        "k", "binomial", "poisson", "forward"
    );
    for row in &report.rows {
        println!(
            "{:>6} {:>14.6e} {:>14.6e} {:>14.6e}",
            row.k, row.binomial, row.poisson, row.forward
        );
    }
    println!();
    println!("window sum (binomial):  {:.9}", report.binomial_window_sum);
    println!("window sum (poisson):   {:.9}", report.poisson_window_sum);
    println!("total (binomial):       {:.12}", report.binomial_total);
    if report.forward_underflows() {
        println!("total (forward):        underflows, (1 - p)^n is below f64 range");
    } else {
        println!("total (forward):        {:.12}", report.forward_total);
    }
    println!(
        "max deviation from closed form: {:e}",
        report.max_recursion_deviation
    );
}
