use statlab_experiments::non_gaussian_fit::{self, Config, Noise, Report};

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub(crate) enum NoiseArg {
    Gaussian,
    Laplace,
    Uniform,
}

impl From<NoiseArg> for Noise {
    fn from(arg: NoiseArg) -> Self {
        match arg {
            NoiseArg::Gaussian => Noise::Gaussian,
            NoiseArg::Laplace => Noise::Laplace,
            NoiseArg::Uniform => Noise::Uniform,
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct NonGaussianFitArg {
    /// Noise law: gaussian, laplace or uniform
    #[arg(long, default_value = "gaussian")]
    noise: NoiseArg,
    /// Number of fitted data sets
    #[arg(long, default_value_t = Config::default().tries)]
    tries: usize,
    /// Points per data set
    #[arg(long, default_value_t = Config::default().points)]
    points: usize,
    /// Standard deviation of the noise
    #[arg(long, default_value_t = Config::default().sigma)]
    sigma: f64,
}

pub(crate) fn run(arg: &NonGaussianFitArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = Config {
        noise: arg.noise.into(),
        tries: arg.tries,
        points: arg.points,
        sigma: arg.sigma,
        ..Config::default()
    };
    let report = non_gaussian_fit::run(&config, &mut options.seed.rng())?;
    options.emit(&report, print)
}

fn print(report: &Report) {
    util::print_title("Line fits with non-Gaussian noise");
    println!(
        "{:?} noise, sigma {}, {} fits of {} points (ndf {})",
        report.config.noise,
        report.config.sigma,
        report.config.tries,
        report.config.points,
        report.ndf
    );
    println!("mean reduced chi2:     {:.4}", report.mean_reduced_chi_square);
    println!(
        "std dev of P(chi2):    {:.4} (uniform: {:.4})",
        report.probability_std_dev,
        (1.0_f64 / 12.0).sqrt()
    );
    println!();
    println!("{:>10} {:>12} {:>12}", "chi2/ndf", "observed", "expected");
    for row in &report.reduced_chi_square_rows {
        println!("{:>10.3} {:>12.5} {:>12.5}", row.x, row.observed, row.expected);
    }
    util::print_histogram("P(chi2)", &report.probability);
}
