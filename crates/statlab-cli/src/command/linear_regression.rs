use std::path::PathBuf;

use anyhow::Context as _;
use statlab_data::text;
use statlab_experiments::linear_regression::{self, Config, GenerateConfig, Report};

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct LinearRegressionArg {
    /// Two columns per line: x y
    #[arg(default_value = "linearRegression.dat")]
    input: PathBuf,
    /// Measurement error of y
    #[arg(long, default_value_t = Config::default().sigma)]
    sigma: f64,
}

pub(crate) fn run(arg: &LinearRegressionArg, options: &RunOptions) -> anyhow::Result<()> {
    let rows = text::read_columns(&arg.input, 2)
        .with_context(|| format!("Failed to read points from {}", arg.input.display()))?;
    let points = rows.iter().map(|row| (row[0], row[1])).collect::<Vec<_>>();
    let config = Config { sigma: arg.sigma };
    let report = linear_regression::run(&config, &points)?;
    options.emit(&report, print)
}

fn print(report: &Report) {
    let fit = &report.fit;
    util::print_title("Linear regression");
    println!("points:      {}", report.points);
    println!("slope:       {:.6} ± {:.6}", fit.slope, fit.slope_error);
    println!("intercept:   {:.6} ± {:.6}", fit.intercept, fit.intercept_error);
    println!(
        "chi2 / ndf = {:.4} / {} = {:.4} (expected 1 ± {:.4})",
        report.chi_square, report.ndf, report.reduced_chi_square, report.expected_spread
    );
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateRegressionArg {
    /// Output file
    #[arg(default_value = "linearRegression.dat")]
    output: PathBuf,
    #[arg(long, default_value_t = GenerateConfig::default().slope)]
    slope: f64,
    #[arg(long, default_value_t = GenerateConfig::default().intercept, allow_hyphen_values = true)]
    intercept: f64,
    /// Gaussian noise added to y
    #[arg(long, default_value_t = GenerateConfig::default().sigma)]
    sigma: f64,
    /// Number of points
    #[arg(long, default_value_t = GenerateConfig::default().points)]
    points: usize,
    /// First x value
    #[arg(long, default_value_t = GenerateConfig::default().x_start, allow_hyphen_values = true)]
    x_start: f64,
    /// Spacing of the x values
    #[arg(long, default_value_t = GenerateConfig::default().x_step)]
    x_step: f64,
}

pub(crate) fn run_generate(arg: &GenerateRegressionArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = GenerateConfig {
        slope: arg.slope,
        intercept: arg.intercept,
        sigma: arg.sigma,
        points: arg.points,
        x_start: arg.x_start,
        x_step: arg.x_step,
    };
    let points = linear_regression::generate(&config, &mut options.seed.rng())?;
    let rows = points.iter().map(|&(x, y)| vec![x, y]).collect::<Vec<_>>();
    text::write_columns_file(&arg.output, Some("x y"), &rows)
        .with_context(|| format!("Failed to write points to {}", arg.output.display()))?;
    log::info!("wrote {} points to {}", rows.len(), arg.output.display());
    Ok(())
}
