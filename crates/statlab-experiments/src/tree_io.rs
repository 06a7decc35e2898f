//! Writing and analysing tree files.
//!
//! [`build`] writes the event tree `test` (hits with amplitude and coordinates)
//! and, optionally, two synthetic demo trees that stand in for measured data: a
//! three-pion sample (`threePiTree`) and a Primakoff `π⁻γ → π⁻π⁰` sample (`PT`).
//! The remaining functions read one tree each and histogram it.

use std::{path::Path, time::Instant};

use rand::Rng;
use rand_distr::{Distribution as _, Normal};
use serde::{Deserialize, Serialize};
use statlab_data::tree::{Entry, Leaf, LeafType, Shape, Tree, TreeError, TreeFile, TreeSchema};
use statlab_stats::histogram::Histogram;

use crate::{
    ExperimentError,
    four_vector::{self, FourVector},
    sampling::Moyal,
};

pub const EVENT_TREE: &str = "test";
pub const THREE_PI_TREE: &str = "threePiTree";
pub const PRIMAKOFF_TREE: &str = "PT";

const PION_ENERGIES: &str = "outPionEnergies";
const PI0_MASS: f64 = 0.134_977;
const PION_MASS: f64 = 0.139_570;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub tree: String,
    pub events: usize,
    pub max_hits: i32,
    pub amplitude_mpv: f64,
    pub amplitude_width: f64,
    /// Also write the `threePiTree` and `PT` demo trees.
    pub demo_trees: bool,
    pub demo_events: usize,
    pub beam_energy: f64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            tree: EVENT_TREE.to_owned(),
            events: 10_000,
            max_hits: 10,
            amplitude_mpv: 100.0,
            amplitude_width: 20.0,
            demo_trees: true,
            demo_events: 10_000,
            beam_energy: 190.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeInfo {
    pub name: String,
    pub entries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub config: BuildConfig,
    pub trees: Vec<TreeInfo>,
    pub hits: usize,
}

fn config_error(err: impl std::fmt::Display) -> ExperimentError {
    ExperimentError::config(err.to_string())
}

/// The event tree: `nHits` (1 to `max_hits`), `hitAmp[nHits]`, `hitCoord[nHits][3]`.
pub fn event_tree<R: Rng + ?Sized>(
    config: &BuildConfig,
    rng: &mut R,
) -> Result<Tree, ExperimentError> {
    if config.max_hits < 1 {
        return Err(ExperimentError::config("max_hits must be at least 1"));
    }
    let amplitude = Moyal::new(config.amplitude_mpv, config.amplitude_width)
        .ok_or_else(|| ExperimentError::config("amplitude width must be positive"))?;
    let transverse = Normal::new(0.0, 1.0).map_err(config_error)?;
    let depth = Normal::new(10.0, 10.0).map_err(config_error)?;

    let schema = TreeSchema::new()
        .with_branch("nHits", LeafType::I32, Shape::Scalar)?
        .with_branch("hitAmp", LeafType::F64, Shape::counted("nHits", 1))?
        .with_branch("hitCoord", LeafType::F64, Shape::counted("nHits", 3))?;
    let mut tree = Tree::new(&config.tree, schema);
    for _ in 0..config.events {
        let hits = rng.random_range(1..=config.max_hits);
        let mut amplitudes = Vec::new();
        let mut coords = Vec::new();
        for _ in 0..hits {
            amplitudes.push(amplitude.sample(rng));
            coords.extend([
                transverse.sample(rng),
                transverse.sample(rng),
                depth.sample(rng),
            ]);
        }
        tree.push(Entry::new(vec![
            Leaf::I32(vec![hits]),
            Leaf::F64(amplitudes),
            Leaf::F64(coords),
        ]))?;
    }
    Ok(tree)
}

/// Beam energy: a narrow peak plus a flat tail of badly reconstructed events.
fn beam_energy<R: Rng + ?Sized>(config: &BuildConfig, peak: &Normal<f64>, rng: &mut R) -> f64 {
    if rng.random_bool(0.85) {
        peak.sample(rng)
    } else {
        rng.random_range(config.beam_energy - 30.0..config.beam_energy + 30.0)
    }
}

/// `outPionEnergies[3]`: three pions sharing the beam energy at random.
pub fn three_pi_tree<R: Rng + ?Sized>(
    config: &BuildConfig,
    rng: &mut R,
) -> Result<Tree, ExperimentError> {
    let peak = Normal::new(config.beam_energy, 2.0).map_err(config_error)?;
    let schema =
        TreeSchema::new().with_branch(PION_ENERGIES, LeafType::F64, Shape::Fixed(3))?;
    let mut tree = Tree::new(THREE_PI_TREE, schema);
    for _ in 0..config.demo_events {
        let total = beam_energy(config, &peak, rng);
        let mut cuts = [rng.random::<f64>(), rng.random::<f64>()];
        cuts.sort_by(f64::total_cmp);
        let energies = [cuts[0], cuts[1] - cuts[0], 1.0 - cuts[1]]
            .map(|fraction| (fraction * total).max(PION_MASS));
        tree.push(Entry::new(vec![Leaf::F64(energies.to_vec())]))?;
    }
    Ok(tree)
}

/// `g1`, `g2`, `pip`, `beam` as `(px, py, pz, E)`.
///
/// Most γγ pairs come from a π⁰ whose mass is smeared by the calorimeter
/// resolution; the rest are combinatorial pairs with a flat mass. The harder
/// photon is always `g1`.
pub fn primakoff_tree<R: Rng + ?Sized>(
    config: &BuildConfig,
    rng: &mut R,
) -> Result<Tree, ExperimentError> {
    let peak = Normal::new(config.beam_energy, 1.5).map_err(config_error)?;
    let resolution = Normal::new(PI0_MASS, 0.008).map_err(config_error)?;
    let transverse = Normal::new(0.0, 0.05).map_err(config_error)?;

    let schema = TreeSchema::new()
        .with_branch("g1", LeafType::F64, Shape::Fixed(4))?
        .with_branch("g2", LeafType::F64, Shape::Fixed(4))?
        .with_branch("pip", LeafType::F64, Shape::Fixed(4))?
        .with_branch("beam", LeafType::F64, Shape::Fixed(4))?;
    let mut tree = Tree::new(PRIMAKOFF_TREE, schema);
    for _ in 0..config.demo_events {
        let energy = beam_energy(config, &peak, rng);
        let momentum = (energy * energy - PION_MASS * PION_MASS).max(0.0).sqrt();
        let beam = FourVector::with_mass(0.0, 0.0, momentum, PION_MASS);

        let mass = if rng.random_bool(0.7) {
            resolution.sample(rng).max(0.0)
        } else {
            rng.random_range(0.01..0.2)
        };
        let fraction = rng.random_range(0.15..0.9);
        let (px, py) = (transverse.sample(rng), transverse.sample(rng));
        let pi0 = FourVector::with_mass(px, py, fraction * beam.pz, mass);
        let pion = FourVector::with_mass(-px, -py, (1.0 - fraction) * beam.pz, PION_MASS);

        let [a, b] = four_vector::decay_to_photons(&pi0, rng);
        let (g1, g2) = if a.e >= b.e { (a, b) } else { (b, a) };
        tree.push(Entry::new(
            [g1, g2, pion, beam]
                .map(|v| Leaf::F64(v.to_array().to_vec()))
                .to_vec(),
        ))?;
    }
    Ok(tree)
}

/// Builds the configured trees and writes them to `path`.
pub fn build<R: Rng + ?Sized>(
    config: &BuildConfig,
    path: impl AsRef<Path>,
    rng: &mut R,
) -> Result<BuildReport, ExperimentError> {
    let start = Instant::now();
    let mut trees = vec![event_tree(config, rng)?];
    if config.demo_trees {
        trees.push(three_pi_tree(config, rng)?);
        trees.push(primakoff_tree(config, rng)?);
    }

    let mut writer = TreeFile::create(&path)?;
    for tree in &trees {
        writer.write_tree(tree)?;
    }
    writer.finish()?;
    log::info!(
        "wrote {} trees to {} in {:.2?}",
        trees.len(),
        path.as_ref().display(),
        start.elapsed()
    );

    let hits = trees[0]
        .entries()
        .iter()
        .filter_map(|entry| entry.leaf(0).as_i32())
        .map(|hits| usize::try_from(hits[0]).unwrap_or(0))
        .sum();
    Ok(BuildReport {
        config: config.clone(),
        trees: trees
            .iter()
            .map(|tree| TreeInfo {
                name: tree.name().to_owned(),
                entries: tree.len(),
            })
            .collect(),
        hits,
    })
}

fn schema_error(message: impl Into<String>) -> ExperimentError {
    ExperimentError::Tree(TreeError::Schema {
        message: message.into(),
    })
}

/// Index of an `f64` branch, as a schema error if it has another element type.
fn f64_branch(tree: &Tree, name: &str) -> Result<usize, ExperimentError> {
    let idx = tree.branch_index(name)?;
    let branch = &tree.schema().branches()[idx];
    if branch.leaf == LeafType::F64 {
        Ok(idx)
    } else {
        Err(schema_error(format!("branch '{name}' does not hold f64 values")))
    }
}

/// Index of a scalar `i32` branch such as a hit counter.
fn counter_branch(tree: &Tree, name: &str) -> Result<usize, ExperimentError> {
    let idx = tree.branch_index(name)?;
    let branch = &tree.schema().branches()[idx];
    if branch.leaf == LeafType::I32 && branch.shape == Shape::Scalar {
        Ok(idx)
    } else {
        Err(schema_error(format!("branch '{name}' is not a scalar i32")))
    }
}

/// Index of an `f64[4]` branch holding a four-vector.
fn vector_branch(tree: &Tree, name: &str) -> Result<usize, ExperimentError> {
    let idx = f64_branch(tree, name)?;
    if tree.schema().branches()[idx].shape == Shape::Fixed(4) {
        Ok(idx)
    } else {
        Err(schema_error(format!("branch '{name}' is not a four-vector")))
    }
}

fn four_vector_at(entry: &Entry, idx: usize) -> Option<FourVector> {
    let values = entry.leaf(idx).as_f64()?;
    Some(FourVector::from_array(values.try_into().ok()?))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadConfig {
    pub tree: String,
    pub bins: usize,
    pub min: f64,
    pub max: f64,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            tree: EVENT_TREE.to_owned(),
            bins: 100,
            min: -60.0,
            max: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadReport {
    pub config: ReadConfig,
    pub entries: usize,
    pub hits: usize,
    /// Hit `z` coordinates (`hitCoord[j][2]`).
    pub z: Histogram,
    pub mean_amplitude: f64,
}

#[expect(clippy::cast_precision_loss)]
pub fn read_tree(file: &TreeFile, config: &ReadConfig) -> Result<ReadReport, ExperimentError> {
    let tree = file.read_tree(&config.tree)?;
    let hits_idx = counter_branch(tree, "nHits")?;
    let amp_idx = f64_branch(tree, "hitAmp")?;
    let coord_idx = f64_branch(tree, "hitCoord")?;

    let mut z = Histogram::new(config.bins, config.min, config.max)?;
    let mut hits = 0;
    let mut amplitude_sum = 0.0;
    for entry in tree.entries() {
        let n = entry
            .leaf(hits_idx)
            .as_i32()
            .and_then(|n| n.first())
            .and_then(|&n| usize::try_from(n).ok())
            .ok_or_else(|| schema_error("nHits must be a non-negative i32"))?;
        let coords = entry.leaf(coord_idx).as_f64().unwrap_or_default();
        for hit in coords.chunks_exact(3).take(n) {
            z.fill(hit[2]);
        }
        let amplitudes = entry.leaf(amp_idx).as_f64().unwrap_or_default();
        amplitude_sum += amplitudes.iter().sum::<f64>();
        hits += n;
    }
    let mean_amplitude = amplitude_sum / hits as f64;
    Ok(ReadReport {
        config: config.clone(),
        entries: tree.len(),
        hits,
        z,
        mean_amplitude,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PionEnergyConfig {
    pub tree: String,
    pub branch: String,
    pub bins: usize,
    pub min: f64,
    pub max: f64,
}

impl Default for PionEnergyConfig {
    fn default() -> Self {
        Self {
            tree: THREE_PI_TREE.to_owned(),
            branch: PION_ENERGIES.to_owned(),
            bins: 220,
            min: 0.0,
            max: 220.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PionEnergyReport {
    pub config: PionEnergyConfig,
    pub entries: usize,
    /// Sum of the three pion energies per entry.
    pub histogram: Histogram,
    pub mean: f64,
    pub peak: f64,
}

pub fn pion_energy_sum(
    file: &TreeFile,
    config: &PionEnergyConfig,
) -> Result<PionEnergyReport, ExperimentError> {
    let tree = file.read_tree(&config.tree)?;
    let idx = f64_branch(tree, &config.branch)?;
    let mut histogram = Histogram::new(config.bins, config.min, config.max)?;
    for entry in tree.entries() {
        let energies = entry.leaf(idx).as_f64().unwrap_or_default();
        histogram.fill(energies.iter().take(3).sum());
    }
    Ok(PionEnergyReport {
        config: config.clone(),
        entries: tree.len(),
        mean: histogram.mean(),
        peak: histogram.bin_center(histogram.maximum_bin()),
        histogram,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimakoffConfig {
    pub tree: String,
    /// Accepted beam energies for the cut mass spectrum, GeV.
    pub beam_window: [f64; 2],
    /// γγ mass window below the π⁰ peak.
    pub sideband_window: [f64; 2],
    /// γγ mass window around the π⁰ peak.
    pub signal_window: [f64; 2],
}

impl Default for PrimakoffConfig {
    fn default() -> Self {
        Self {
            tree: PRIMAKOFF_TREE.to_owned(),
            beam_window: [187.0, 193.0],
            sideband_window: [0.06, 0.08],
            signal_window: [0.115, 0.15],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PrimakoffReport {
    pub config: PrimakoffConfig,
    pub entries: usize,
    pub g1_energy: Histogram,
    pub g2_energy: Histogram,
    pub pion_energy: Histogram,
    pub beam_energy: Histogram,
    pub mass: Histogram,
    pub mass_cut: Histogram,
    pub sideband_pion_energy: Histogram,
    pub signal_pion_energy: Histogram,
    /// Centre of the fullest bin of the beam-cut mass spectrum.
    pub mass_peak: f64,
}

fn inside([low, high]: [f64; 2], x: f64) -> bool {
    low < x && x < high
}

pub fn primakoff(
    file: &TreeFile,
    config: &PrimakoffConfig,
) -> Result<PrimakoffReport, ExperimentError> {
    let tree = file.read_tree(&config.tree)?;
    let g1_idx = vector_branch(tree, "g1")?;
    let g2_idx = vector_branch(tree, "g2")?;
    let pip_idx = vector_branch(tree, "pip")?;
    let beam_idx = vector_branch(tree, "beam")?;

    let mut g1_energy = Histogram::new(200, 0.0, 200.0)?;
    let mut g2_energy = Histogram::new(200, 0.0, 20.0)?;
    let mut pion_energy = Histogram::new(200, 0.0, 160.0)?;
    let mut beam_energy = Histogram::new(200, 160.0, 220.0)?;
    let mut mass = Histogram::new(300, 0.0, 0.2)?;
    let mut mass_cut = mass.clone();
    let mut sideband_pion_energy = pion_energy.clone();
    let mut signal_pion_energy = pion_energy.clone();

    for entry in tree.entries() {
        let vectors = [g1_idx, g2_idx, pip_idx, beam_idx].map(|idx| four_vector_at(entry, idx));
        let [Some(g1), Some(g2), Some(pip), Some(beam)] = vectors else {
            return Err(schema_error("four-vector branch without four values"));
        };
        g1_energy.fill(g1.e);
        g2_energy.fill(g2.e);
        pion_energy.fill(pip.e);
        beam_energy.fill(beam.e);

        let m = (g1 + g2).mass();
        mass.fill(m);
        if inside(config.beam_window, beam.e) {
            mass_cut.fill(m);
        }
        if inside(config.sideband_window, m) {
            sideband_pion_energy.fill(pip.e);
        }
        if inside(config.signal_window, m) {
            signal_pion_energy.fill(pip.e);
        }
    }

    Ok(PrimakoffReport {
        config: config.clone(),
        entries: tree.len(),
        mass_peak: mass_cut.bin_center(mass_cut.maximum_bin()),
        g1_energy,
        g2_energy,
        pion_energy,
        beam_energy,
        mass,
        mass_cut,
        sideband_pion_energy,
        signal_pion_energy,
    })
}

/// Summaries of every tree in the file, or only of `name`.
pub fn inspect(file: &TreeFile, name: Option<&str>) -> Result<Vec<String>, ExperimentError> {
    match name {
        Some(name) => Ok(vec![file.read_tree(name)?.summary()]),
        None => Ok(file.trees().iter().map(Tree::summary).collect()),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn small_file(seed: u64) -> (BuildReport, TreeFile) {
        let mut rng = Pcg32::seed_from_u64(seed);
        let config = BuildConfig {
            events: 500,
            demo_events: 2_000,
            ..BuildConfig::default()
        };
        let path = std::env::temp_dir()
            .join(format!("statlab-tree-io-{seed}-{}.stl", std::process::id()));
        let report = build(&config, &path, &mut rng).unwrap();
        let file = TreeFile::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        (report, file)
    }

    #[test]
    fn test_build_then_read_hits() {
        let (built, file) = small_file(41);
        let names = file.tree_names().collect::<Vec<_>>();
        assert_eq!(names, [EVENT_TREE, THREE_PI_TREE, PRIMAKOFF_TREE]);

        let report = read_tree(&file, &ReadConfig::default()).unwrap();
        assert_eq!(report.entries, 500);
        assert_eq!(report.hits, built.hits);
        assert!((500..=5_000).contains(&report.hits));
        // z ~ N(10, 10)
        assert_relative_eq!(report.z.mean(), 10.0, epsilon = 1.5);
        // Moyal mean is mpv + width·(γ + ln 2)
        assert_relative_eq!(report.mean_amplitude, 125.4, epsilon = 5.0);
    }

    #[test]
    fn test_pion_energy_sum_peaks_at_beam_energy() {
        let (_, file) = small_file(42);
        let report = pion_energy_sum(&file, &PionEnergyConfig::default()).unwrap();
        assert_eq!(report.entries, 2_000);
        assert!((185.0..195.0).contains(&report.peak));
    }

    #[test]
    fn test_primakoff_mass_peak() {
        let (_, file) = small_file(43);
        let report = primakoff(&file, &PrimakoffConfig::default()).unwrap();
        assert!((0.115..0.15).contains(&report.mass_peak));
        assert!(report.mass_cut.integral() < report.mass.integral());
        assert!(report.signal_pion_energy.integral() > report.sideband_pion_energy.integral());
    }

    #[test]
    fn test_missing_tree_and_wrong_branch() {
        let (_, file) = small_file(44);
        let config = ReadConfig {
            tree: "nope".to_owned(),
            ..ReadConfig::default()
        };
        let err = read_tree(&file, &config).unwrap_err();
        assert_eq!(err.to_string(), "error finding tree 'nope'");

        let config = PionEnergyConfig {
            tree: EVENT_TREE.to_owned(),
            branch: "nHits".to_owned(),
            ..PionEnergyConfig::default()
        };
        assert!(matches!(
            pion_energy_sum(&file, &config),
            Err(ExperimentError::Tree(TreeError::Schema { .. }))
        ));
        assert_eq!(inspect(&file, None).unwrap().len(), 3);
    }

    #[test]
    fn test_non_scalar_hit_counter_is_a_schema_error() {
        let schema = TreeSchema::new()
            .with_branch("nHits", LeafType::I32, Shape::Fixed(0))
            .unwrap()
            .with_branch("hitAmp", LeafType::F64, Shape::Fixed(1))
            .unwrap()
            .with_branch("hitCoord", LeafType::F64, Shape::Fixed(3))
            .unwrap();
        let mut tree = Tree::new(EVENT_TREE, schema);
        tree.push(Entry::new(vec![
            Leaf::I32(vec![]),
            Leaf::F64(vec![100.0]),
            Leaf::F64(vec![0.0, 0.0, 10.0]),
        ]))
        .unwrap();
        let mut bytes = Vec::new();
        TreeFile::write_to(&mut bytes, &[tree]).unwrap();
        let file = TreeFile::read_from(&mut bytes.as_slice()).unwrap();

        let err = read_tree(&file, &ReadConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ExperimentError::Tree(TreeError::Schema { .. })
        ));
        assert!(err.to_string().contains("nHits"));
    }
}
