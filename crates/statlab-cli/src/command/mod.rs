use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::Rng as _;
use serde::Serialize;
use statlab_experiments::seed::Seed;

use crate::util::Output;

use self::{
    beam_calorimeter::BeamCalorimeterArg,
    charge::ChargeArg,
    chi_square_from_poisson::ChiSquareFromPoissonArg,
    counting_experiment::CountingExperimentArg,
    decision_wheel::DecisionWheelArg,
    detector_efficiency::DetectorEfficiencyArg,
    error_ellipse::ErrorEllipseArg,
    least_square_polynomial::LeastSquarePolynomialArg,
    lethal_horse::LethalHorseArg,
    linear_regression::{GenerateRegressionArg, LinearRegressionArg},
    maximum_likelihood::MaximumLikelihoodArg,
    monty_hall::MontyHallArg,
    non_gaussian_fit::NonGaussianFitArg,
    particle_detection::ParticleDetectionArg,
    penney_ante::PenneyAnteArg,
    radioactive_decay::RadioactiveDecayArg,
    transform_variables::TransformVariablesArg,
    tree::{BuildTreeArg, InspectTreeArg, PionEnergySumArg, PrimakoffArg, ReadTreeArg},
    variance_check::VarianceCheckArg,
};

mod beam_calorimeter;
mod charge;
mod chi_square_from_poisson;
mod counting_experiment;
mod decision_wheel;
mod detector_efficiency;
mod error_ellipse;
mod least_square_polynomial;
mod lethal_horse;
mod linear_regression;
mod maximum_likelihood;
mod monty_hall;
mod non_gaussian_fit;
mod particle_detection;
mod penney_ante;
mod radioactive_decay;
mod transform_variables;
mod tree;
mod variance_check;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Seed of the random generator, 32 hex digits (random when omitted)
    #[arg(long, global = true)]
    seed: Option<Seed>,
    /// Print the report as JSON instead of text, to stdout or to PATH
    #[arg(long, global = true, value_name = "PATH", num_args = 0..=1)]
    json: Option<Option<PathBuf>>,
    /// Which experiment to run
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Stay or switch in the three-door game show
    MontyHall(#[clap(flatten)] MontyHallArg),
    /// Penney's coin-sequence game against the counter strategy
    PenneyAnte(#[clap(flatten)] PenneyAnteArg),
    /// Mode, median and mean of a calorimeter energy sample
    BeamCalorimeter(#[clap(flatten)] BeamCalorimeterArg),
    /// Spin the decision wheel
    DecisionWheel(#[clap(flatten)] DecisionWheelArg),
    /// Charge spectrum of a measured sample, with and without a cut
    Charge(#[clap(flatten)] ChargeArg),
    /// Poisson fit of the Prussian cavalry horse-kick deaths
    LethalHorse(#[clap(flatten)] LethalHorseArg),
    /// Three ways to compute a variance
    VarianceCheck(#[clap(flatten)] VarianceCheckArg),
    /// Binomial against Poisson for a large detector
    ParticleDetection(#[clap(flatten)] ParticleDetectionArg),
    /// Multi-layer detector efficiency and a detection Monte Carlo
    DetectorEfficiency(#[clap(flatten)] DetectorEfficiencyArg),
    /// Decays and detected alphas of a radioactive sample
    RadioactiveDecay(#[clap(flatten)] RadioactiveDecayArg),
    /// Cartesian against polar description of a 2-D Gaussian
    TransformVariables(#[clap(flatten)] TransformVariablesArg),
    /// Contours and covariance of a rotated 2-D Gaussian
    ErrorEllipse(#[clap(flatten)] ErrorEllipseArg),
    /// Chi-square variables built from Poisson draws
    ChiSquareFromPoisson(#[clap(flatten)] ChiSquareFromPoissonArg),
    /// Straight-line fit of a two-column data file
    LinearRegression(#[clap(flatten)] LinearRegressionArg),
    /// Write synthetic straight-line data
    GenerateRegression(#[clap(flatten)] GenerateRegressionArg),
    /// Polynomial fits and chi-square scans of a data file with errors
    LeastSquarePolynomial(#[clap(flatten)] LeastSquarePolynomialArg),
    /// Toy Monte Carlo of Gaussian fits to Poisson-fluctuated histograms
    CountingExperiment(#[clap(flatten)] CountingExperimentArg),
    /// Line fits with Gaussian, Laplace or uniform noise
    NonGaussianFit(#[clap(flatten)] NonGaussianFitArg),
    /// Binned likelihood fits of an exponential lifetime
    MaximumLikelihood(#[clap(flatten)] MaximumLikelihoodArg),
    /// Write the event tree (and the demo trees) to a tree file
    BuildTree(#[clap(flatten)] BuildTreeArg),
    /// Histogram the hit z coordinates of the event tree
    ReadTree(#[clap(flatten)] ReadTreeArg),
    /// Histogram the summed energy of three pions
    PionEnergySum(#[clap(flatten)] PionEnergySumArg),
    /// Photon-pair mass and pion energies of Primakoff events
    Primakoff(#[clap(flatten)] PrimakoffArg),
    /// Print the branches of the trees in a tree file
    InspectTree(#[clap(flatten)] InspectTreeArg),
}

/// Options shared by every command.
#[derive(Debug, Clone)]
pub(crate) struct RunOptions {
    pub seed: Seed,
    /// `Some(None)` prints JSON to stdout.
    pub json: Option<Option<PathBuf>>,
}

impl RunOptions {
    /// Writes `report` as JSON when requested, or prints it with `print_text`.
    pub fn emit<T, F>(&self, report: &T, print_text: F) -> anyhow::Result<()>
    where
        T: Serialize,
        F: FnOnce(&T),
    {
        match &self.json {
            Some(path) => Output::save_json(report, path.clone()),
            None => {
                print_text(report);
                Ok(())
            }
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    log::info!("seed: {seed}");
    let options = RunOptions {
        seed,
        json: args.json,
    };
    match &args.mode {
        Mode::MontyHall(arg) => monty_hall::run(arg, &options)?,
        Mode::PenneyAnte(arg) => penney_ante::run(arg, &options)?,
        Mode::BeamCalorimeter(arg) => beam_calorimeter::run(arg, &options)?,
        Mode::DecisionWheel(arg) => decision_wheel::run(arg, &options)?,
        Mode::Charge(arg) => charge::run(arg, &options)?,
        Mode::LethalHorse(arg) => lethal_horse::run(arg, &options)?,
        Mode::VarianceCheck(arg) => variance_check::run(arg, &options)?,
        Mode::ParticleDetection(arg) => particle_detection::run(arg, &options)?,
        Mode::DetectorEfficiency(arg) => detector_efficiency::run(arg, &options)?,
        Mode::RadioactiveDecay(arg) => radioactive_decay::run(arg, &options)?,
        Mode::TransformVariables(arg) => transform_variables::run(arg, &options)?,
        Mode::ErrorEllipse(arg) => error_ellipse::run(arg, &options)?,
        Mode::ChiSquareFromPoisson(arg) => chi_square_from_poisson::run(arg, &options)?,
        Mode::LinearRegression(arg) => linear_regression::run(arg, &options)?,
        Mode::GenerateRegression(arg) => linear_regression::run_generate(arg, &options)?,
        Mode::LeastSquarePolynomial(arg) => least_square_polynomial::run(arg, &options)?,
        Mode::CountingExperiment(arg) => counting_experiment::run(arg, &options)?,
        Mode::NonGaussianFit(arg) => non_gaussian_fit::run(arg, &options)?,
        Mode::MaximumLikelihood(arg) => maximum_likelihood::run(arg, &options)?,
        Mode::BuildTree(arg) => tree::run_build(arg, &options)?,
        Mode::ReadTree(arg) => tree::run_read(arg, &options)?,
        Mode::PionEnergySum(arg) => tree::run_pion_energy_sum(arg, &options)?,
        Mode::Primakoff(arg) => tree::run_primakoff(arg, &options)?,
        Mode::InspectTree(arg) => tree::run_inspect(arg, &options)?,
    }
    Ok(())
}
