use crate::feedback::LetterState;
use crate::{COLS, ROWS};

/// One grid slot: a letter (once typed) and its judged state (once painted).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    pub letter: Option<char>,
    pub state: Option<LetterState>,
}

/// The fixed `ROWS` x `COLS` grid of guesses plus the input cursor.
///
/// Only the current row is ever edited. Rows before it have been painted with
/// judge feedback and are frozen; rows after it are empty.
#[derive(Debug, Clone)]
pub struct GuessBuffer {
    grid: [[Tile; COLS]; ROWS],
    current_row: usize,
    current_col: usize,
}

impl Default for GuessBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl GuessBuffer {
    pub fn new() -> Self {
        Self {
            grid: [[Tile::default(); COLS]; ROWS],
            current_row: 0,
            current_col: 0,
        }
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.current_row, self.current_col)
    }

    pub fn rows(&self) -> &[[Tile; COLS]; ROWS] {
        &self.grid
    }

    /// Writes `ch` at the cursor. Returns the written position, or `None` when
    /// the row is already full or every row has been used.
    pub fn insert_letter(&mut self, ch: char) -> Option<(usize, usize, char)> {
        if self.current_row >= ROWS || self.current_col >= COLS {
            return None;
        }
        let letter = ch.to_ascii_uppercase();
        let pos = (self.current_row, self.current_col);
        self.grid[pos.0][pos.1].letter = Some(letter);
        self.current_col += 1;
        Some((pos.0, pos.1, letter))
    }

    /// Clears the last filled slot of the current row, returning its position.
    pub fn delete_letter(&mut self) -> Option<(usize, usize)> {
        if self.current_row >= ROWS || self.current_col == 0 {
            return None;
        }
        self.current_col -= 1;
        self.grid[self.current_row][self.current_col].letter = None;
        Some((self.current_row, self.current_col))
    }

    pub fn ready_to_submit(&self) -> bool {
        self.current_row < ROWS && self.current_col == COLS
    }

    /// The letters of the current row, only once it is full.
    pub fn current_guess(&self) -> Option<String> {
        if !self.ready_to_submit() {
            return None;
        }
        self.grid[self.current_row]
            .iter()
            .map(|tile| tile.letter)
            .collect()
    }

    /// Freezes `row` with its judged states. A row can only be painted once.
    pub fn paint_row(&mut self, row: usize, states: &[LetterState]) -> bool {
        let Some(tiles) = self.grid.get_mut(row) else {
            return false;
        };
        if tiles.iter().any(|t| t.state.is_some()) || states.len() != COLS {
            return false;
        }
        for (tile, &state) in tiles.iter_mut().zip(states) {
            tile.state = Some(state);
        }
        true
    }

    /// Moves the cursor to the start of the next row.
    pub fn advance_row(&mut self) {
        if self.current_row < ROWS {
            self.current_row += 1;
            self.current_col = 0;
        }
    }

    pub fn filled_in_current_row(&self) -> usize {
        self.grid
            .get(self.current_row)
            .map_or(0, |row| row.iter().filter(|t| t.letter.is_some()).count())
    }
}
