//! Card generation and win distance.

use std::collections::{BTreeSet, HashSet};

use bingo_protocol::{CARD_SIZE, COLUMN_SPAN, Card, FREE_SPACE, Letter};
use rand::Rng;

/// Row that holds the free space in the `N` column.
const CENTER: usize = CARD_SIZE / 2;

/// Generates a fresh card.
///
/// Each column holds distinct numbers from its letter's range, sorted
/// ascending. The `N` column draws one fewer and gets [`FREE_SPACE`] in the
/// middle row. Cards are not checked for uniqueness against each other.
pub fn generate_card<R: Rng>(rng: &mut R) -> Card {
    let mut columns = [[0u32; CARD_SIZE]; CARD_SIZE];
    for letter in Letter::ALL {
        let col = letter.column();
        if col == CENTER {
            let picked = sample_distinct(rng, letter, CARD_SIZE - 1);
            let mut it = picked.into_iter();
            for (row, cell) in columns[col].iter_mut().enumerate() {
                *cell = if row == CENTER {
                    FREE_SPACE
                } else {
                    it.next().unwrap_or(FREE_SPACE)
                };
            }
        } else {
            for (cell, n) in columns[col]
                .iter_mut()
                .zip(sample_distinct(rng, letter, CARD_SIZE))
            {
                *cell = n;
            }
        }
    }
    Card::from_columns(columns)
}

/// Rejection-samples `count` distinct numbers from the letter's range.
///
/// `count` is at most 5 out of a 30-wide range, so retries are rare.
fn sample_distinct<R: Rng>(rng: &mut R, letter: Letter, count: usize) -> BTreeSet<u32> {
    debug_assert!(count as u32 <= COLUMN_SPAN);
    let mut picked = BTreeSet::new();
    while picked.len() < count {
        picked.insert(rng.random_range(letter.range()));
    }
    picked
}

/// Cells still missing from the card's closest line.
///
/// Checks all 5 rows, 5 columns, and both diagonals. `0` is a win. The free
/// space only counts if it is in `marked`; callers keep it there.
pub fn distance_to_win(card: &Card, marked: &HashSet<u32>) -> u8 {
    let missing = |cells: [u32; CARD_SIZE]| -> u8 {
        cells.iter().filter(|n| !marked.contains(n)).count() as u8
    };

    let diagonal: [u32; CARD_SIZE] = std::array::from_fn(|i| card.cell(i, i));
    let anti_diagonal: [u32; CARD_SIZE] = std::array::from_fn(|i| card.cell(i, CARD_SIZE - 1 - i));

    (0..CARD_SIZE)
        .flat_map(|i| [card.rows()[i], card.column(i)])
        .chain([diagonal, anti_diagonal])
        .map(missing)
        .min()
        .unwrap_or(CARD_SIZE as u8)
}
