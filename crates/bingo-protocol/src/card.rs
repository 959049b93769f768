//! Board vocabulary shared by server and clients: letters, number ranges,
//! and the 5×5 card layout.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Highest drawable number. The draw pool is `1..=MAX_NUMBER`.
pub const MAX_NUMBER: u32 = 150;

/// Width of each letter's number range.
pub const COLUMN_SPAN: u32 = 30;

/// Value stored in the centre cell. Outside the draw range, so it can never
/// be called, and always counts as marked.
pub const FREE_SPACE: u32 = MAX_NUMBER + 1;

/// Rows and columns on a card.
pub const CARD_SIZE: usize = 5;

// ---------------------------------------------------------------------------
// Letter
// ---------------------------------------------------------------------------

/// One of the five card columns. Also the unit of voting: a winning letter
/// biases the next draw toward its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Letter {
    B,
    I,
    N,
    G,
    O,
}

impl Letter {
    /// All letters in column order. Vote tie-breaks follow this order.
    pub const ALL: [Letter; 5] = [Letter::B, Letter::I, Letter::N, Letter::G, Letter::O];

    /// Zero-based column index.
    pub fn column(self) -> usize {
        match self {
            Self::B => 0,
            Self::I => 1,
            Self::N => 2,
            Self::G => 3,
            Self::O => 4,
        }
    }

    /// The numbers belonging to this letter, e.g. `31..=60` for `I`.
    pub fn range(self) -> RangeInclusive<u32> {
        let low = self.column() as u32 * COLUMN_SPAN + 1;
        low..=low + COLUMN_SPAN - 1
    }

    /// The letter whose range contains `number`, if it is drawable.
    pub fn of(number: u32) -> Option<Letter> {
        if !(1..=MAX_NUMBER).contains(&number) {
            return None;
        }
        Some(Self::ALL[((number - 1) / COLUMN_SPAN) as usize])
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::B => "B",
            Self::I => "I",
            Self::N => "N",
            Self::G => "G",
            Self::O => "O",
        };
        f.write_str(c)
    }
}

impl std::str::FromStr for Letter {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "B" => Ok(Self::B),
            "I" => Ok(Self::I),
            "N" => Ok(Self::N),
            "G" => Ok(Self::G),
            "O" => Ok(Self::O),
            other => Err(ProtocolError::InvalidLetter(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// A player's 5×5 card, stored row-major.
///
/// On the wire this is a plain nested array (`[[1, 31, 61, 91, 121], ...]`),
/// which is what the browser renders directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Card {
    rows: [[u32; CARD_SIZE]; CARD_SIZE],
}

impl Card {
    /// Wraps an already-laid-out grid.
    pub fn from_rows(rows: [[u32; CARD_SIZE]; CARD_SIZE]) -> Self {
        Self { rows }
    }

    /// Builds a card from five columns (B through O), each top to bottom.
    pub fn from_columns(columns: [[u32; CARD_SIZE]; CARD_SIZE]) -> Self {
        let mut rows = [[0; CARD_SIZE]; CARD_SIZE];
        for (c, column) in columns.iter().enumerate() {
            for (r, value) in column.iter().enumerate() {
                rows[r][c] = *value;
            }
        }
        Self { rows }
    }

    /// The grid, row-major.
    pub fn rows(&self) -> &[[u32; CARD_SIZE]; CARD_SIZE] {
        &self.rows
    }

    /// The value at `row`, `col`.
    pub fn cell(&self, row: usize, col: usize) -> u32 {
        self.rows[row][col]
    }

    /// One column, top to bottom.
    pub fn column(&self, col: usize) -> [u32; CARD_SIZE] {
        std::array::from_fn(|r| self.rows[r][col])
    }

    /// Returns `true` if `number` appears anywhere on the card.
    pub fn contains(&self, number: u32) -> bool {
        self.rows.iter().any(|row| row.contains(&number))
    }

    /// Every value on the card, row by row.
    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.iter().flat_map(|row| row.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_ranges_partition_the_pool() {
        assert_eq!(Letter::B.range(), 1..=30);
        assert_eq!(Letter::N.range(), 61..=90);
        assert_eq!(Letter::O.range(), 121..=150);
        for n in 1..=MAX_NUMBER {
            let letter = Letter::of(n).unwrap();
            assert!(letter.range().contains(&n));
        }
    }

    #[test]
    fn test_letter_of_rejects_out_of_range() {
        assert_eq!(Letter::of(0), None);
        assert_eq!(Letter::of(FREE_SPACE), None);
    }

    #[test]
    fn test_letter_parse_and_display() {
        assert_eq!("g".parse::<Letter>().unwrap(), Letter::G);
        assert!("X".parse::<Letter>().is_err());
        assert_eq!(Letter::I.to_string(), "I");
        assert_eq!(serde_json::to_string(&Letter::O).unwrap(), "\"O\"");
    }

    #[test]
    fn test_card_from_columns_transposes() {
        let columns = [
            [1, 2, 3, 4, 5],
            [31, 32, 33, 34, 35],
            [61, 62, FREE_SPACE, 63, 64],
            [91, 92, 93, 94, 95],
            [121, 122, 123, 124, 125],
        ];
        let card = Card::from_columns(columns);
        assert_eq!(card.rows()[0], [1, 31, 61, 91, 121]);
        assert_eq!(card.cell(2, 2), FREE_SPACE);
        assert_eq!(card.column(1), [31, 32, 33, 34, 35]);
        assert!(card.contains(94));
        assert_eq!(card.values().count(), 25);
    }

    #[test]
    fn test_card_serializes_as_nested_array() {
        let card = Card::from_rows([[7; CARD_SIZE]; CARD_SIZE]);
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json[4][4], 7);
    }
}
