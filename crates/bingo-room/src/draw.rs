//! The draw engine: which numbers are left and in what order they came out.

use bingo_protocol::{Letter, MAX_NUMBER};
use rand::Rng;
use rand::seq::IndexedRandom;

/// Remaining numbers plus the call history.
///
/// A number is either in `pool` or in `history`, never both, and the two
/// always add up to `1..=MAX_NUMBER`.
#[derive(Debug, Clone)]
pub struct DrawPool {
    pool: Vec<u32>,
    history: Vec<u32>,
}

impl Default for DrawPool {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawPool {
    /// A full pool with no history.
    pub fn new() -> Self {
        Self {
            pool: (1..=MAX_NUMBER).collect(),
            history: Vec::with_capacity(MAX_NUMBER as usize),
        }
    }

    /// Draws one number, preferring `bias` when given.
    ///
    /// A biased draw picks uniformly among the letter's remaining numbers
    /// and falls back to the whole pool once that letter is used up.
    /// Returns `None` when the pool is empty.
    pub fn draw<R: Rng>(&mut self, rng: &mut R, bias: Option<Letter>) -> Option<u32> {
        let candidates: Vec<u32> = match bias {
            Some(letter) => {
                let range = letter.range();
                let in_letter: Vec<u32> =
                    self.pool.iter().copied().filter(|n| range.contains(n)).collect();
                if in_letter.is_empty() {
                    tracing::debug!(%letter, "letter exhausted, drawing from full pool");
                    self.pool.clone()
                } else {
                    in_letter
                }
            }
            None => self.pool.clone(),
        };

        let number = *candidates.choose(rng)?;
        self.pool.retain(|n| *n != number);
        self.history.push(number);
        Some(number)
    }

    /// Numbers drawn so far, in call order.
    pub fn history(&self) -> &[u32] {
        &self.history
    }

    /// Whether `number` has been called.
    pub fn is_called(&self, number: u32) -> bool {
        self.history.contains(&number)
    }

    /// Numbers left to draw.
    pub fn remaining(&self) -> usize {
        self.pool.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.pool.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_draw_until_empty_never_repeats() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut pool = DrawPool::new();
        for k in 1..=MAX_NUMBER as usize {
            assert!(pool.draw(&mut rng, None).is_some());
            assert_eq!(pool.remaining(), MAX_NUMBER as usize - k);
            assert_eq!(pool.history().len(), k);
        }
        assert!(pool.is_exhausted());
        assert_eq!(pool.draw(&mut rng, None), None);

        let unique: HashSet<_> = pool.history().iter().collect();
        assert_eq!(unique.len(), MAX_NUMBER as usize);
    }

    #[test]
    fn test_biased_draw_stays_in_letter() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut pool = DrawPool::new();
        for _ in 0..30 {
            let n = pool.draw(&mut rng, Some(Letter::G)).unwrap();
            assert!(Letter::G.range().contains(&n));
        }
    }

    #[test]
    fn test_biased_draw_falls_back_when_letter_exhausted() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut pool = DrawPool::new();
        for _ in 0..30 {
            pool.draw(&mut rng, Some(Letter::B)).unwrap();
        }
        let n = pool.draw(&mut rng, Some(Letter::B)).unwrap();
        assert!(!Letter::B.range().contains(&n));
        assert_eq!(pool.remaining(), 119);
    }

    #[test]
    fn test_is_called_tracks_history() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut pool = DrawPool::new();
        let n = pool.draw(&mut rng, None).unwrap();
        assert!(pool.is_called(n));
        assert!(!pool.is_called(0));
    }
}
