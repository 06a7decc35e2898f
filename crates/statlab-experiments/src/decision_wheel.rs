//! The magic decision wheel: a uniform pick among eight answers.

use rand::{Rng, seq::IndexedRandom as _};
use serde::{Deserialize, Serialize};

pub const OUTCOMES: [&str; 8] = [
    "Yes",
    "Today",
    "Pass the buck",
    "Maybe",
    "Reorganize",
    "No",
    "Tomorrow",
    "Sit on it",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub spins: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { spins: 1 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub picks: Vec<&'static str>,
    /// How often each outcome came up, in wheel order.
    pub counts: Vec<(&'static str, usize)>,
}

pub fn spin<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    OUTCOMES.choose(rng).copied().unwrap_or(OUTCOMES[0])
}

pub fn run<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Report {
    let picks = (0..config.spins).map(|_| spin(rng)).collect::<Vec<_>>();
    let counts = OUTCOMES
        .iter()
        .map(|&outcome| (outcome, picks.iter().filter(|&&p| p == outcome).count()))
        .collect();
    Report {
        config: config.clone(),
        picks,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_every_outcome_comes_up() {
        let mut rng = Pcg32::seed_from_u64(8);
        let report = run(&Config { spins: 8_000 }, &mut rng);
        assert_eq!(report.picks.len(), 8_000);
        for (outcome, count) in report.counts {
            assert!((800..1_200).contains(&count), "{outcome}: {count}");
        }
    }
}
