use statlab_experiments::detector_efficiency::{self, Config, Report};

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct DetectorEfficiencyArg {
    /// Layers that must fire for a particle to count as detected
    #[arg(long, default_value_t = Config::default().required_layers)]
    required_layers: u64,
    /// Detector layouts, as numbers of layers
    #[arg(long, value_delimiter = ',', default_values_t = Config::default().layouts)]
    layouts: Vec<u64>,
    /// Detector efficiency the single-layer efficiency is solved for
    #[arg(long, default_value_t = Config::default().target)]
    target: f64,
    /// Single-particle efficiency of the detection Monte Carlo
    #[arg(long, default_value_t = Config::default().efficiency)]
    efficiency: f64,
    /// Particles per Monte Carlo try
    #[arg(long, default_value_t = Config::default().signals)]
    signals: u64,
    /// Number of Monte Carlo tries
    #[arg(long, default_value_t = Config::default().tries)]
    tries: usize,
}

pub(crate) fn run(arg: &DetectorEfficiencyArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = Config {
        required_layers: arg.required_layers,
        layouts: arg.layouts.clone(),
        target: arg.target,
        efficiency: arg.efficiency,
        signals: arg.signals,
        tries: arg.tries,
        ..Config::default()
    };
    let report = detector_efficiency::run(&config, &mut options.seed.rng())?;
    options.emit(&report, print)
}

fn print(report: &Report) {
    util::print_title("Detector efficiency");
    for layout in &report.layouts {
        match layout.layer_efficiency {
            Some(p) => println!(
                "{} layers, {} required: layer efficiency {:.6} for {}",
                layout.layers, report.config.required_layers, p, report.config.target
            ),
            None => println!(
                "{} layers, {} required: target {} not reachable",
                layout.layers, report.config.required_layers, report.config.target
            ),
        }
    }
    println!();
    println!(
        "{} particles detected with efficiency {}, {} tries",
        report.config.signals, report.config.efficiency, report.config.tries
    );
    println!("{:>9} {:>10} {:>12}", "detected", "observed", "expected");
    for row in &report.rows {
        println!(
            "{:>9} {:>10.0} {:>12.2}",
            row.detected, row.observed, row.expected
        );
    }
    println!(
        "chi2 / ndf = {:.4} / {}, P(chi2) = {:.4}",
        report.chi_square, report.ndf, report.probability
    );
}
