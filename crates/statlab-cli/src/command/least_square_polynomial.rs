use std::path::PathBuf;

use anyhow::Context as _;
use statlab_data::text;
use statlab_experiments::least_square_polynomial::{self, Config, Report};
use statlab_stats::fit::DataPoint;

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct LeastSquarePolynomialArg {
    /// Three columns per line: x y sigma_y
    #[arg(default_value = "LSDataPoints.dat")]
    input: PathBuf,
    /// Polynomials of degree 0 up to (excluding) this one are fitted
    #[arg(long, default_value_t = Config::default().max_degree)]
    max_degree: usize,
    /// Steps of the pol0 chi-square scan
    #[arg(long, default_value_t = Config::default().scan_steps)]
    scan_steps: usize,
    /// Steps per axis of the pol1 chi-square grid
    #[arg(long, default_value_t = Config::default().grid_steps)]
    grid_steps: usize,
}

pub(crate) fn run(arg: &LeastSquarePolynomialArg, options: &RunOptions) -> anyhow::Result<()> {
    let rows = text::read_columns(&arg.input, 3)
        .with_context(|| format!("Failed to read points from {}", arg.input.display()))?;
    let points = rows
        .iter()
        .map(|row| DataPoint::new(row[0], row[1], row[2]))
        .collect::<Vec<_>>();
    let config = Config {
        max_degree: arg.max_degree,
        scan_steps: arg.scan_steps,
        grid_steps: arg.grid_steps,
    };
    let report = least_square_polynomial::run(&config, &points)?;
    options.emit(&report, print)
}

fn print(report: &Report) {
    util::print_title("Least-squares polynomials");
    for degree_fit in &report.fits {
        println!();
        println!("degree {}", degree_fit.degree);
        let names = (0..=degree_fit.degree)
            .map(|j| format!("p{j}"))
            .collect::<Vec<_>>();
        let names = names.iter().map(String::as_str).collect::<Vec<_>>();
        util::print_fit(&names, &degree_fit.fit);
    }

    println!();
    println!("pol0 scan");
    println!("{:>12} {:>12}", "p0", "delta chi2");
    for (p0, delta) in &report.pol0_scan {
        println!("{p0:>12.6} {delta:>12.6}");
    }

    let grid = &report.pol1_grid;
    let inside = grid
        .delta
        .iter()
        .flatten()
        .filter(|&&delta| delta <= 1.0)
        .count();
    println!();
    println!(
        "pol1 grid: {} x {} points, {inside} inside delta chi2 <= 1",
        grid.p0.len(),
        grid.p1.len()
    );
}
