//! The Monty Hall game show.
//!
//! A car hides behind one of three doors. The player picks a door, the host opens
//! another door with a goat behind it, and the player either stays or switches
//! to the last closed door.

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DOORS: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of games played.
    pub trials: usize,
    /// Number of points kept from the running win-rate curves.
    pub curve_points: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trials: 10_000,
            curve_points: 100,
        }
    }
}

/// Result of a single game for both strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Game {
    pub car: u32,
    pub first_pick: u32,
    pub opened: u32,
    pub switched_pick: u32,
}

impl Game {
    #[must_use]
    pub fn stay_wins(&self) -> bool {
        self.first_pick == self.car
    }

    #[must_use]
    pub fn switch_wins(&self) -> bool {
        self.switched_pick == self.car
    }
}

/// Plays one game. The host picks at random among the goat doors the player did
/// not choose.
pub fn play<R: Rng + ?Sized>(rng: &mut R) -> Game {
    let car = rng.random_range(0..DOORS);
    let first_pick = rng.random_range(0..DOORS);
    let goats = (0..DOORS)
        .filter(|&door| door != car && door != first_pick)
        .collect::<Vec<_>>();
    let opened = goats[rng.random_range(0..goats.len())];
    let switched_pick = (0..DOORS)
        .find(|&door| door != first_pick && door != opened)
        .unwrap_or(first_pick);
    Game {
        car,
        first_pick,
        opened,
        switched_pick,
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CurvePoint {
    pub games: usize,
    pub stay_rate: f64,
    pub switch_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub stay_wins: usize,
    pub switch_wins: usize,
    pub stay_rate: f64,
    pub switch_rate: f64,
    pub curve: Vec<CurvePoint>,
}

#[expect(clippy::cast_precision_loss)]
pub fn run<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Report {
    let stride = (config.trials / config.curve_points.max(1)).max(1);
    let mut stay_wins = 0;
    let mut switch_wins = 0;
    let mut curve = Vec::with_capacity(config.curve_points + 1);
    for games in 1..=config.trials {
        let game = play(rng);
        stay_wins += usize::from(game.stay_wins());
        switch_wins += usize::from(game.switch_wins());
        if games % stride == 0 || games == config.trials {
            curve.push(CurvePoint {
                games,
                stay_rate: stay_wins as f64 / games as f64,
                switch_rate: switch_wins as f64 / games as f64,
            });
        }
    }
    let rate = |wins: usize| {
        if config.trials == 0 {
            0.0
        } else {
            wins as f64 / config.trials as f64
        }
    };
    log::debug!("monty hall: {stay_wins} stay wins, {switch_wins} switch wins");
    Report {
        config: config.clone(),
        stay_wins,
        switch_wins,
        stay_rate: rate(stay_wins),
        switch_rate: rate(switch_wins),
        curve,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_exactly_one_strategy_wins() {
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..1_000 {
            let game = play(&mut rng);
            assert_ne!(game.opened, game.car);
            assert_ne!(game.opened, game.first_pick);
            assert_ne!(game.switched_pick, game.first_pick);
            assert!(game.stay_wins() ^ game.switch_wins());
        }
    }

    #[test]
    fn test_curve_ends_at_final_rates() {
        let mut rng = Pcg32::seed_from_u64(2);
        let config = Config {
            trials: 1_001,
            curve_points: 10,
        };
        let report = run(&config, &mut rng);
        assert_eq!(report.stay_wins + report.switch_wins, 1_001);
        let last = report.curve.last().unwrap();
        assert_eq!(last.games, 1_001);
        assert_eq!(last.switch_rate, report.switch_rate);
    }

    #[test]
    fn test_no_trials() {
        let mut rng = Pcg32::seed_from_u64(3);
        let config = Config {
            trials: 0,
            curve_points: 10,
        };
        let report = run(&config, &mut rng);
        assert!(report.curve.is_empty());
        assert_eq!(report.stay_rate, 0.0);
    }
}
