use statlab_experiments::transform_variables::{self, Config, Report};

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TransformVariablesArg {
    /// Width of the isotropic Gaussian
    #[arg(long, default_value_t = Config::default().sigma)]
    sigma: f64,
    /// Number of sampled points
    #[arg(long, default_value_t = Config::default().samples)]
    samples: usize,
    /// Bins of the radius histogram
    #[arg(long, default_value_t = Config::default().radius_bins)]
    radius_bins: usize,
}

pub(crate) fn run(arg: &TransformVariablesArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = Config {
        sigma: arg.sigma,
        samples: arg.samples,
        radius_bins: arg.radius_bins,
        ..Config::default()
    };
    let report = transform_variables::run(&config, &mut options.seed.rng())?;
    options.emit(&report, print)
}

fn print(report: &Report) {
    util::print_title("Transformation of variables");
    println!("integral of the Cartesian density: {:.6}", report.cartesian_integral);
    println!("integral of the polar density:     {:.6}", report.polar_integral);
    println!("integral of the Rayleigh density:  {:.6}", report.rayleigh_integral);
    util::print_histogram("radius", &report.radius);
    println!(
        "Rayleigh against radius histogram: chi2 / ndf = {:.4} / {}, P(chi2) = {:.4}",
        report.chi_square, report.ndf, report.probability
    );
}
