use statlab_experiments::beam_calorimeter::{self, Config, Report};

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct BeamCalorimeterArg {
    /// Bin width of the energy histogram, GeV
    #[arg(long, default_value_t = Config::default().resolution)]
    resolution: f64,
}

pub(crate) fn run(arg: &BeamCalorimeterArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = Config {
        resolution: arg.resolution,
        ..Config::default()
    };
    let report = beam_calorimeter::run(&config)?;
    options.emit(&report, print)
}

fn print(report: &Report) {
    util::print_title("Beam calorimeter");
    println!("measurements:       {}", report.config.energies.len());
    println!(
        "mode:               {:.4} (frequency {})",
        report.mode, report.mode_frequency
    );
    println!("median:             {:.4}", report.median);
    println!("mean (binned):      {:.4}", report.binned_mean);
    println!("mean (data):        {:.4}", report.data_mean);
    println!("mean (histogram):   {:.4}", report.histogram_mean);
    util::print_histogram("energy", &report.histogram);
    util::print_histogram("cumulative", &report.cumulative);
}
