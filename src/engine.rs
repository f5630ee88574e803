use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side length of the square grid.
pub const SIZE: usize = 4;

/// Probability that a spawned tile is a 4 rather than a 2.
pub const DEFAULT_FOUR_PROBABILITY: f64 = 0.1;

pub type Tile = u32;
pub type Score = u64;
type Row = [Tile; SIZE];
type Cells = [Row; SIZE];

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        };
        f.write_str(s)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown direction '{0}' (expected up, down, left or right)")]
pub struct ParseMoveError(pub String);

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Move::Up),
            "down" => Ok(Move::Down),
            "left" => Ok(Move::Left),
            "right" => Ok(Move::Right),
            _ => Err(ParseMoveError(s.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("expected 4 rows, got {0}")]
    RowCount(usize),
    #[error("row {row} has {len} cells, expected 4")]
    RowLength { row: usize, len: usize },
    #[error("cell ({row}, {col}) holds {value}, which is neither 0 nor a power of two")]
    NotPowerOfTwo { row: usize, col: usize, value: Tile },
}

/// A 4x4 2048 board holding actual tile values (0 = empty).
///
/// Boards are small `Copy` values; every operation returns a new board and
/// leaves the receiver untouched. Stateful play lives in [`crate::game::Game`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(Cells);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board([[0; SIZE]; SIZE]);

    /// Build a board from rows without validation.
    ///
    /// Callers are trusted to pass only zeros and powers of two; use
    /// [`Board::try_from_rows`] for untrusted input.
    #[inline]
    pub const fn from_rows(rows: [[Tile; SIZE]; SIZE]) -> Self { Board(rows) }

    /// Build a board from rows, rejecting values that are not 0 or a power of two.
    ///
    /// ```
    /// use grid_2048::engine::{Board, BoardError};
    /// let ok = Board::try_from_rows([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
    /// assert!(ok.is_ok());
    /// let bad = Board::try_from_rows([[3, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
    /// assert_eq!(bad, Err(BoardError::NotPowerOfTwo { row: 0, col: 0, value: 3 }));
    /// ```
    pub fn try_from_rows(rows: [[Tile; SIZE]; SIZE]) -> Result<Self, BoardError> {
        for (r, row) in rows.iter().enumerate() {
            for (c, &value) in row.iter().enumerate() {
                if value != 0 && !value.is_power_of_two() {
                    return Err(BoardError::NotPowerOfTwo { row: r, col: c, value });
                }
            }
        }
        Ok(Board(rows))
    }

    /// Copy out the rows of this board.
    #[inline]
    pub fn rows(&self) -> [[Tile; SIZE]; SIZE] { self.0 }

    /// Value at (`row`, `col`), 0 if empty. Panics when out of range.
    #[inline]
    pub fn tile(&self, row: usize, col: usize) -> Tile { self.0[row][col] }

    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    ///
    /// ```
    /// use grid_2048::engine::{Board, Move};
    /// let b = Board::from_rows([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
    /// assert_eq!(b.shift(Move::Left).tile(0, 0), 4);
    /// ```
    #[inline]
    pub fn shift(self, dir: Move) -> Self { self.shift_scored(dir).0 }

    /// Like [`Board::shift`], also returning the points earned by merges.
    ///
    /// Every direction is reduced to a left slide: the board is reoriented,
    /// slid row by row, then oriented back.
    ///
    /// ```
    /// use grid_2048::engine::{Board, Move};
    /// let b = Board::from_rows([[2, 2, 2, 2], [0; 4], [0; 4], [0; 4]]);
    /// let (after, gained) = b.shift_scored(Move::Right);
    /// assert_eq!(after.rows()[0], [0, 0, 4, 4]);
    /// assert_eq!(gained, 8);
    /// ```
    pub fn shift_scored(self, dir: Move) -> (Self, Score) {
        match dir {
            Move::Left => slide_left(self),
            Move::Right => {
                let (b, gained) = slide_left(reverse_rows(self));
                (reverse_rows(b), gained)
            }
            Move::Up => {
                let (b, gained) = slide_left(transpose(self));
                (transpose(b), gained)
            }
            Move::Down => {
                let (b, gained) = slide_left(reverse_rows(transpose(self)));
                (transpose(reverse_rows(b)), gained)
            }
        }
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a random empty slot, using the provided RNG.
    ///
    /// A full board is returned unchanged.
    ///
    /// ```
    /// use grid_2048::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    #[inline]
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        self.spawn_tile(rng, DEFAULT_FOUR_PROBABILITY).0
    }

    /// Insert a random tile that is a 4 with probability `four_probability`.
    #[inline]
    pub fn with_random_tile_weighted<R: Rng + ?Sized>(self, rng: &mut R, four_probability: f64) -> Self {
        self.spawn_tile(rng, four_probability).0
    }

    /// Insert a random tile and report which cell received it.
    ///
    /// The cell is drawn uniformly from the empty cells. Returns `None` for the
    /// position when the board has no empty cell. `four_probability` must lie in
    /// `[0, 1]`.
    pub fn spawn_tile<R: Rng + ?Sized>(self, rng: &mut R, four_probability: f64) -> (Self, Option<(usize, usize)>) {
        let empty = self.empty_cells();
        if empty.is_empty() {
            return (self, None);
        }
        let (row, col) = empty[rng.gen_range(0..empty.len())];
        let mut cells = self.0;
        cells[row][col] = generate_random_tile(rng, four_probability);
        (Board(cells), Some((row, col)))
    }

    /// Perform a move then insert a random tile if the move changed the board, using the provided RNG.
    ///
    /// ```
    /// use grid_2048::engine::{Board, Move};
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let b0 = Board::from_rows([[0, 0, 0, 2], [0; 4], [0; 4], [0; 4]]);
    /// let b1 = b0.make_move(Move::Left, &mut rng);
    /// assert_eq!(b1.tile(0, 0), 2);
    /// assert_eq!(b1.count_empty(), 14);
    /// ```
    #[inline]
    pub fn make_move<R: Rng + ?Sized>(self, direction: Move, rng: &mut R) -> Self {
        let moved = self.shift(direction);
        if moved != self { moved.with_random_tile(rng) } else { self }
    }

    /// Return true if the board is full and no two neighbours share a value.
    ///
    /// ```
    /// use grid_2048::engine::Board;
    /// let checker = Board::from_rows([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
    /// assert!(checker.is_terminal());
    /// // Unlike a "no shift changes the board" check, an empty board is not terminal.
    /// assert!(!Board::EMPTY.is_terminal());
    /// ```
    #[inline]
    pub fn is_terminal(self) -> bool { is_game_over(self) }

    /// Return the highest tile value (e.g., 2048) present on the board, 0 when empty.
    #[inline]
    pub fn highest_tile(self) -> Tile { get_highest_tile_val(self) }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> usize { count_empty(self) }

    /// Empty cells as (row, col) in row-major order.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        let mut cells = Vec::with_capacity(SIZE * SIZE);
        for (r, row) in self.0.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                if v == 0 {
                    cells.push((r, c));
                }
            }
        }
        cells
    }

    /// Iterate every cell value in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Tile> + '_ {
        self.0.iter().flat_map(|row| row.iter().copied())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:?})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(SIZE * 8);
        writeln!(f)?;
        for (r, row) in self.0.iter().enumerate() {
            if r > 0 {
                writeln!(f, "{rule}")?;
            }
            let cells: Vec<String> = row.iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

impl From<[[Tile; SIZE]; SIZE]> for Board { fn from(rows: [[Tile; SIZE]; SIZE]) -> Self { Board::from_rows(rows) } }
impl From<Board> for [[Tile; SIZE]; SIZE] { fn from(b: Board) -> Self { b.rows() } }

impl TryFrom<Vec<Vec<Tile>>> for Board {
    type Error = BoardError;

    fn try_from(rows: Vec<Vec<Tile>>) -> Result<Self, Self::Error> {
        if rows.len() != SIZE {
            return Err(BoardError::RowCount(rows.len()));
        }
        let mut cells = [[0; SIZE]; SIZE];
        for (r, row) in rows.iter().enumerate() {
            if row.len() != SIZE {
                return Err(BoardError::RowLength { row: r, len: row.len() });
            }
            cells[r].copy_from_slice(row);
        }
        Board::try_from_rows(cells)
    }
}

/// Slide/merge tiles in the given direction. No randomness.
pub fn shift(board: Board, direction: Move) -> Board { board.shift(direction) }

/// True if every cell is filled and no horizontal or vertical neighbours are equal.
///
/// Only the neighbour below and the neighbour to the right are inspected; each
/// adjacent pair is seen exactly once that way.
pub fn is_game_over(board: Board) -> bool {
    let cells = &board.0;
    for r in 0..SIZE {
        for c in 0..SIZE {
            let v = cells[r][c];
            if v == 0 {
                return false;
            }
            if r + 1 < SIZE && cells[r + 1][c] == v {
                return false;
            }
            if c + 1 < SIZE && cells[r][c + 1] == v {
                return false;
            }
        }
    }
    true
}

/// Count the number of zero tiles.
pub fn count_empty(board: Board) -> usize {
    board.iter().filter(|&v| v == 0).count()
}

pub fn get_highest_tile_val(board: Board) -> Tile {
    board.iter().max().unwrap_or(0)
}

pub(crate) fn transpose(board: Board) -> Board {
    let mut out = [[0; SIZE]; SIZE];
    for (r, row) in board.0.iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            out[c][r] = v;
        }
    }
    Board(out)
}

pub(crate) fn reverse_rows(board: Board) -> Board {
    let mut cells = board.0;
    for row in cells.iter_mut() {
        row.reverse();
    }
    Board(cells)
}

fn slide_left(board: Board) -> (Board, Score) {
    let mut cells = board.0;
    let mut gained = 0;
    for row in cells.iter_mut() {
        let (slid, score) = slide_row_left(*row);
        *row = slid;
        gained += score;
    }
    (Board(cells), gained)
}

/// Slide one row to the left, merging each equal adjacent pair at most once.
///
/// Returns the new row and the sum of the merged tile values.
///
/// ```
/// use grid_2048::engine::slide_row_left;
/// assert_eq!(slide_row_left([2, 0, 2, 4]), ([4, 4, 0, 0], 4));
/// assert_eq!(slide_row_left([2, 2, 2, 2]), ([4, 4, 0, 0], 8));
/// ```
pub fn slide_row_left(row: [Tile; SIZE]) -> ([Tile; SIZE], Score) {
    let mut line = compact(row);
    let mut gained = 0;
    for i in 0..SIZE - 1 {
        if line[i] != 0 && line[i] == line[i + 1] {
            line[i] *= 2;
            line[i + 1] = 0;
            gained += Score::from(line[i]);
        }
    }
    (compact(line), gained)
}

// Zeros removed, order kept, right-padded.
fn compact(row: Row) -> Row {
    let mut out = [0; SIZE];
    for (slot, v) in out.iter_mut().zip(row.into_iter().filter(|&v| v != 0)) {
        *slot = v;
    }
    out
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R, four_probability: f64) -> Tile {
    if rng.gen_bool(four_probability) { 4 } else { 2 }
}

fn format_val(val: Tile) -> String {
    match val {
        0 => String::from("       "),
        x => format!("{:^7}", x),
    }
}
