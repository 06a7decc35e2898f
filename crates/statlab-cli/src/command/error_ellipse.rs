use statlab_experiments::error_ellipse::{self, Config, Report};

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ErrorEllipseArg {
    /// Rotation angle, degrees
    #[arg(long, default_value_t = Config::default().phi_degrees)]
    phi: f64,
    /// Width along the unrotated x axis
    #[arg(long, default_value_t = Config::default().gaussian.sigma_x)]
    sigma_x: f64,
    /// Width along the unrotated y axis
    #[arg(long, default_value_t = Config::default().gaussian.sigma_y)]
    sigma_y: f64,
    /// Number of points sampled for the covariance matrix
    #[arg(long, default_value_t = Config::default().samples)]
    samples: usize,
}

pub(crate) fn run(arg: &ErrorEllipseArg, options: &RunOptions) -> anyhow::Result<()> {
    let defaults = Config::default();
    let config = Config {
        gaussian: statlab_stats::distributions::Gaussian2dParams {
            sigma_x: arg.sigma_x,
            sigma_y: arg.sigma_y,
            ..defaults.gaussian
        },
        phi_degrees: arg.phi,
        samples: arg.samples,
        ..defaults
    };
    let report = error_ellipse::run(&config, &mut options.seed.rng())?;
    options.emit(&report, print)
}

fn print_matrix(title: &str, matrix: &[[f64; 2]; 2]) {
    println!("{title}");
    for row in matrix {
        println!("  {:>10.4} {:>10.4}", row[0], row[1]);
    }
}

fn print(report: &Report) {
    util::print_title("Error ellipse");
    println!("peak density {:.6}", report.peak);
    println!();
    println!(
        "{:>8} {:>12} {:>12} {:>12} {:>12}",
        "sigmas", "level", "semi-axis x", "semi-axis y", "max dev"
    );
    for contour in &report.contours {
        println!(
            "{:>8.4} {:>12.6} {:>12.4} {:>12.4} {:>12.2e}",
            contour.sigmas,
            contour.level,
            contour.semi_axis_x,
            contour.semi_axis_y,
            contour.max_deviation
        );
    }
    println!();
    print_matrix("analytic covariance", &report.analytic_covariance);
    println!("  correlation {:.4}", report.analytic_correlation);
    if let Some(sampled) = &report.sampled_covariance {
        print_matrix("sampled covariance", sampled);
    }
    if let Some(correlation) = report.sampled_correlation {
        println!("  correlation {correlation:.4}");
    }
    println!(
        "largest difference from the bivariate normal: {:e}",
        report.max_density_deviation
    );
}
