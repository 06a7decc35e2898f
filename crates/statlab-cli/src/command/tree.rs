use std::path::PathBuf;

use statlab_experiments::tree_io::{
    self, BuildConfig, BuildReport, EVENT_TREE, PRIMAKOFF_TREE, PionEnergyConfig,
    PionEnergyReport, PrimakoffConfig, PrimakoffReport, ReadConfig, ReadReport, THREE_PI_TREE,
};

use crate::{command::RunOptions, util};

const TREE_FILE: &str = "test.stl";

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct BuildTreeArg {
    /// Output tree file
    #[arg(default_value = TREE_FILE)]
    output: PathBuf,
    /// Name of the event tree
    #[arg(long, default_value = EVENT_TREE)]
    tree: String,
    /// Number of events
    #[arg(long, default_value_t = BuildConfig::default().events)]
    events: usize,
    /// Hits per event are drawn from 1 to this value
    #[arg(long, default_value_t = BuildConfig::default().max_hits)]
    max_hits: i32,
    /// Do not add the threePiTree and PT demo trees
    #[arg(long)]
    no_demo_trees: bool,
    /// Entries of each demo tree
    #[arg(long, default_value_t = BuildConfig::default().demo_events)]
    demo_events: usize,
}

pub(crate) fn run_build(arg: &BuildTreeArg, options: &RunOptions) -> anyhow::Result<()> {
    let config = BuildConfig {
        tree: arg.tree.clone(),
        events: arg.events,
        max_hits: arg.max_hits,
        demo_trees: !arg.no_demo_trees,
        demo_events: arg.demo_events,
        ..BuildConfig::default()
    };
    let report = tree_io::build(&config, &arg.output, &mut options.seed.rng())?;
    options.emit(&report, |report: &BuildReport| {
        println!("wrote {}", arg.output.display());
        for tree in &report.trees {
            println!("  {:<16} {:>8} entries", tree.name, tree.entries);
        }
        println!("  {} hits in '{}'", report.hits, report.config.tree);
    })
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ReadTreeArg {
    /// Tree file to read
    #[arg(default_value = TREE_FILE)]
    input: PathBuf,
    /// Name of the event tree
    #[arg(default_value = EVENT_TREE)]
    tree: String,
}

pub(crate) fn run_read(arg: &ReadTreeArg, options: &RunOptions) -> anyhow::Result<()> {
    let file = util::open_tree_file(&arg.input)?;
    let config = ReadConfig {
        tree: arg.tree.clone(),
        ..ReadConfig::default()
    };
    let report = tree_io::read_tree(&file, &config)?;
    options.emit(&report, |report: &ReadReport| {
        util::print_title(&format!("Tree '{}'", report.config.tree));
        println!(
            "{} entries, {} hits, mean amplitude {:.3}",
            report.entries, report.hits, report.mean_amplitude
        );
        util::print_histogram("hit z coordinate", &report.z);
    })
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PionEnergySumArg {
    /// Tree file to read
    #[arg(default_value = TREE_FILE)]
    input: PathBuf,
    /// Name of the three-pion tree
    #[arg(default_value = THREE_PI_TREE)]
    tree: String,
}

pub(crate) fn run_pion_energy_sum(
    arg: &PionEnergySumArg,
    options: &RunOptions,
) -> anyhow::Result<()> {
    let file = util::open_tree_file(&arg.input)?;
    let config = PionEnergyConfig {
        tree: arg.tree.clone(),
        ..PionEnergyConfig::default()
    };
    let report = tree_io::pion_energy_sum(&file, &config)?;
    options.emit(&report, |report: &PionEnergyReport| {
        util::print_title("Summed pion energy");
        println!(
            "{} entries, mean {:.3} GeV, peak at {:.1} GeV",
            report.entries, report.mean, report.peak
        );
        util::print_histogram(&report.config.branch, &report.histogram);
    })
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PrimakoffArg {
    /// Tree file to read
    #[arg(default_value = TREE_FILE)]
    input: PathBuf,
    /// Name of the Primakoff tree
    #[arg(default_value = PRIMAKOFF_TREE)]
    tree: String,
}

pub(crate) fn run_primakoff(arg: &PrimakoffArg, options: &RunOptions) -> anyhow::Result<()> {
    let file = util::open_tree_file(&arg.input)?;
    let config = PrimakoffConfig {
        tree: arg.tree.clone(),
        ..PrimakoffConfig::default()
    };
    let report = tree_io::primakoff(&file, &config)?;
    options.emit(&report, print_primakoff)
}

fn print_primakoff(report: &PrimakoffReport) {
    let config = &report.config;
    util::print_title("Primakoff events");
    println!("{} entries", report.entries);
    util::print_histogram("energy of g1", &report.g1_energy);
    util::print_histogram("energy of g2", &report.g2_energy);
    util::print_histogram("energy of pion", &report.pion_energy);
    util::print_histogram("energy of beam", &report.beam_energy);
    util::print_histogram("photon pair mass", &report.mass);
    util::print_histogram(
        &format!(
            "photon pair mass, beam energy in ({}, {})",
            config.beam_window[0], config.beam_window[1]
        ),
        &report.mass_cut,
    );
    println!("  peak at {:.4} GeV", report.mass_peak);
    util::print_histogram(
        &format!(
            "pion energy, pair mass in ({}, {})",
            config.sideband_window[0], config.sideband_window[1]
        ),
        &report.sideband_pion_energy,
    );
    util::print_histogram(
        &format!(
            "pion energy, pair mass in ({}, {})",
            config.signal_window[0], config.signal_window[1]
        ),
        &report.signal_pion_energy,
    );
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct InspectTreeArg {
    /// Tree file to read
    #[arg(default_value = TREE_FILE)]
    input: PathBuf,
    /// Only this tree
    tree: Option<String>,
}

pub(crate) fn run_inspect(arg: &InspectTreeArg, options: &RunOptions) -> anyhow::Result<()> {
    let file = util::open_tree_file(&arg.input)?;
    let summaries = tree_io::inspect(&file, arg.tree.as_deref())?;
    options.emit(&summaries, |summaries: &Vec<String>| {
        for summary in summaries {
            print!("{summary}");
        }
    })
}
