//! Penney's game on three coin tosses.
//!
//! A sequence is a 3-bit number read from the most significant bit, `1` for heads.
//! For every choice of the first player the second player answers with the counter
//! sequence, and coins are tossed until one of the two sequences shows up in the
//! last three tosses.

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const SEQUENCES: u8 = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Games played for each of the eight choices.
    pub tries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { tries: 1_000_000 }
    }
}

/// Counter sequence: `(c2, c1, c0)` becomes `(!c1, c0, c1)`.
///
/// # Examples
///
/// ```
/// # use statlab_experiments::penney_ante::{counter_sequence, label};
/// assert_eq!(label(counter_sequence(0b110)), "TTH");
/// assert_eq!(label(counter_sequence(0b000)), "HTT");
/// ```
#[must_use]
pub fn counter_sequence(choice: u8) -> u8 {
    let mut t = (choice & 3) << 1;
    t |= t >> 2;
    (t ^ 4) & 7
}

/// `H`/`T` spelling of a sequence, first toss first.
#[must_use]
pub fn label(sequence: u8) -> String {
    (0..3_u8)
        .rev()
        .map(|bit| if (sequence >> bit) & 1 == 1 { 'H' } else { 'T' })
        .collect()
}

/// Tosses coins until `choice` or `counter` appears; returns which of them matched.
///
/// Both can match at once when they are the same sequence.
pub fn play<R: Rng + ?Sized>(rng: &mut R, choice: u8, counter: u8) -> (bool, bool) {
    let mut window = rng.random_range(0..SEQUENCES);
    loop {
        let choice_hit = window == choice;
        let counter_hit = window == counter;
        if choice_hit || counter_hit {
            return (choice_hit, counter_hit);
        }
        window = ((window << 1) | u8::from(rng.random::<bool>())) & 7;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceStats {
    pub choice: String,
    pub counter: String,
    pub choice_wins: usize,
    pub counter_wins: usize,
    pub counter_win_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub config: Config,
    pub choices: Vec<ChoiceStats>,
}

#[expect(clippy::cast_precision_loss)]
pub fn run<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Report {
    let choices = (0..SEQUENCES)
        .map(|choice| {
            let counter = counter_sequence(choice);
            let mut choice_wins = 0;
            let mut counter_wins = 0;
            for _ in 0..config.tries {
                let (c, n) = play(rng, choice, counter);
                choice_wins += usize::from(c);
                counter_wins += usize::from(n);
            }
            let decided = choice_wins + counter_wins;
            ChoiceStats {
                choice: label(choice),
                counter: label(counter),
                choice_wins,
                counter_wins,
                counter_win_rate: if decided == 0 {
                    0.0
                } else {
                    counter_wins as f64 / decided as f64
                },
            }
        })
        .collect();
    Report {
        config: config.clone(),
        choices,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_counter_table() {
        let table = (0..SEQUENCES)
            .map(|s| (label(s), label(counter_sequence(s))))
            .collect::<Vec<_>>();
        assert_eq!(table[0b000], ("TTT".to_owned(), "HTT".to_owned()));
        assert_eq!(table[0b011], ("THH".to_owned(), "THH".to_owned()));
        assert_eq!(table[0b101], ("HTH".to_owned(), "HHT".to_owned()));
        assert_eq!(table[0b111], ("HHH".to_owned(), "THH".to_owned()));
    }

    #[test]
    fn test_counter_beats_ttt() {
        // HTT loses only if the first three tosses are TTT
        let mut rng = Pcg32::seed_from_u64(4);
        let config = Config { tries: 20_000 };
        let report = run(&config, &mut rng);
        let ttt = &report.choices[0];
        assert!((ttt.counter_win_rate - 7.0 / 8.0).abs() < 0.01);
    }

    #[test]
    fn test_identical_sequences_both_win() {
        let mut rng = Pcg32::seed_from_u64(5);
        assert_eq!(play(&mut rng, 0b011, 0b011), (true, true));
    }
}
