use std::path::PathBuf;

use anyhow::Context as _;
use statlab_data::text;
use statlab_experiments::charge::{self, Config, Report, Spectrum};

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ChargeArg {
    /// One charge measurement per line
    #[arg(default_value = "chargedata.txt")]
    input: PathBuf,
    /// Bin width of the charge histograms
    #[arg(long, default_value_t = Config::default().bin_width)]
    bin_width: f64,
    /// Charges below this value are dropped from the cut spectrum
    #[arg(long, default_value_t = Config::default().cut)]
    cut: f64,
}

pub(crate) fn run(arg: &ChargeArg, options: &RunOptions) -> anyhow::Result<()> {
    let charges = text::read_values(&arg.input)
        .with_context(|| format!("Failed to read charges from {}", arg.input.display()))?;
    let config = Config {
        bin_width: arg.bin_width,
        cut: arg.cut,
    };
    let report = charge::run(&config, &charges)?;
    options.emit(&report, print)
}

fn print_spectrum(title: &str, spectrum: &Spectrum) {
    util::print_histogram(title, &spectrum.histogram);
    println!("  mean {:.4}, rms {:.4}", spectrum.mean, spectrum.rms);
}

fn print(report: &Report) {
    util::print_title("Charge spectrum");
    println!("measurements: {}", report.count);
    print_spectrum("all charges", &report.all);
    print_spectrum(&format!("charges >= {}", report.config.cut), &report.cut);
}
