use statlab_experiments::radioactive_decay::{self, Config, CountSpectrum, Report};

use crate::{command::RunOptions, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RadioactiveDecayArg {
    /// Initial number of nuclei
    #[arg(long, default_value_t = Config::default().nuclei)]
    nuclei: u64,
    /// Observation time, seconds
    #[arg(long, default_value_t = Config::default().time)]
    time: u32,
    /// A nucleus decays when its N(mean, sigma) draw exceeds this value
    #[arg(long, default_value_t = Config::default().threshold)]
    threshold: f64,
    /// Probability that an emitted alpha is detected
    #[arg(long, default_value_t = Config::default().detection_efficiency)]
    detection_efficiency: f64,
}

pub(crate) fn run(arg: &RadioactiveDecayArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = Config {
        nuclei: arg.nuclei,
        time: arg.time,
        threshold: arg.threshold,
        detection_efficiency: arg.detection_efficiency,
        ..Config::default()
    };
    let report = radioactive_decay::run(&config, &mut options.seed.rng())?;
    options.emit(&report, print)
}

fn print_spectrum(title: &str, spectrum: &CountSpectrum) {
    util::print_histogram(title, &spectrum.histogram);
    println!("  histogram mean {:.4}", spectrum.mean);
    util::print_fit(&["lambda"], &spectrum.fit);
}

fn print(report: &Report) {
    util::print_title("Radioactive decay");
    println!(
        "decay probability per second: {:e} (integrated), {:e} (closed form)",
        report.probability_integrated, report.probability_closed_form
    );
    if let Some(last) = report.remaining.last() {
        println!(
            "nuclei left after {} s: {last} of {}",
            report.config.time, report.config.nuclei
        );
    }
    print_spectrum("decays per second", &report.decays);
    print_spectrum("detected alphas per second", &report.detected);
}
