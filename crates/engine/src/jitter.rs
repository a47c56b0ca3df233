use sha3::{Digest, Sha3_256};

use crate::scoring::ScoredItem;

const DELTAS: [i8; 4] = [-2, -1, 1, 2];

/// Items that carry a 0..=100 score and a stable key.
pub trait Ranked {
    fn key(&self) -> &str;
    fn score(&self) -> u8;
    fn apply_jitter(&mut self, delta: i8);
}

impl Ranked for ScoredItem {
    fn key(&self) -> &str {
        &self.recipe_id
    }

    fn score(&self) -> u8 {
        self.score
    }

    fn apply_jitter(&mut self, delta: i8) {
        self.set_score(shifted(self.score, delta));
        self.jitter += delta;
    }
}

/// Breaks up long runs of identical scores in an already sorted list.
///
/// Within every maximal run of three or more adjacent equal scores, the first
/// two items keep their score and each later item moves by -2, -1, +1 or +2.
/// The delta comes from a hash of `seed`, the item key and the item's position
/// in the run, so the same input always yields the same output. A delta that
/// would leave 0..=100 is mirrored. Runs of one or two items are untouched and
/// the order of the list never changes.
///
/// ```
/// use petplates_engine::jitter::{Ranked, apply_score_tie_break_jitter};
///
/// #[derive(Clone)]
/// struct Row(&'static str, u8);
///
/// impl Ranked for Row {
///     fn key(&self) -> &str { self.0 }
///     fn score(&self) -> u8 { self.1 }
///     fn apply_jitter(&mut self, delta: i8) { self.1 = (self.1 as i16 + delta as i16) as u8 }
/// }
///
/// let rows = vec![Row("a", 90), Row("b", 90), Row("c", 89)];
/// let out = apply_score_tie_break_jitter(rows, "seed");
/// assert_eq!(out.iter().map(|r| r.1).collect::<Vec<_>>(), vec![90, 90, 89]);
/// ```
pub fn apply_score_tie_break_jitter<T: Ranked>(mut items: Vec<T>, seed: &str) -> Vec<T> {
    let mut start = 0;

    while start < items.len() {
        let score = items[start].score();
        let end = items[start..]
            .iter()
            .position(|item| item.score() != score)
            .map_or(items.len(), |offset| start + offset);

        if end - start >= 3 {
            for (run_index, item) in items[start..end].iter_mut().enumerate().skip(2) {
                let delta = bounded(score, tie_break_delta(seed, item.key(), run_index));
                item.apply_jitter(delta);
            }
        }

        start = end;
    }

    items
}

/// Picks one of the four deltas from the first eight bytes of
/// `sha3_256("{seed}|{key}|{run_index}")`.
pub fn tie_break_delta(seed: &str, key: &str, run_index: usize) -> i8 {
    let mut hasher = Sha3_256::default();
    hasher.update(format!("{seed}|{key}|{run_index}"));
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let slot = u64::from_be_bytes(prefix) % DELTAS.len() as u64;

    DELTAS[slot as usize]
}

fn bounded(score: u8, delta: i8) -> i8 {
    let target = i16::from(score) + i16::from(delta);
    if (0..=100).contains(&target) { delta } else { -delta }
}

fn shifted(score: u8, delta: i8) -> u8 {
    (i16::from(score) + i16::from(delta)).clamp(0, 100) as u8
}
