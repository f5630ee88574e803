//! The stateful grid engine: one game's board, score, status and RNG.
//!
//! `Game` is the only owner of mutable game state. Front ends drive it through
//! [`Game::reset`] and [`Game::apply_move`] and read it back through `&self`
//! queries or a [`Snapshot`]; they never get mutable access to the board.
//!
//! ```
//! use grid_2048::engine::Move;
//! use grid_2048::game::{Game, GameStatus};
//!
//! let mut game = Game::from_seed(7);
//! assert_eq!(game.board().count_empty(), 14);
//! let outcome = game.apply_move(Move::Left);
//! if outcome.changed {
//!     assert!(outcome.spawned.is_some());
//! }
//! assert_eq!(game.status(), GameStatus::InProgress);
//! ```

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ConfigError, GameConfig};
use crate::engine::{Board, Move, Score, DEFAULT_FOUR_PROBABILITY};

const START_TILES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    InProgress,
    Terminal,
}

/// What a single [`Game::apply_move`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// False when the move was rejected (nothing slid or merged, or the game is over).
    pub changed: bool,
    /// Sum of the tiles created by merges during this move.
    pub gained: Score,
    /// Cell that received the post-move tile.
    pub spawned: Option<(usize, usize)>,
    /// Status after the move.
    pub status: GameStatus,
}

/// Read-only copy of the engine state for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub board: Board,
    pub score: Score,
    pub status: GameStatus,
}

impl Snapshot {
    #[inline]
    pub fn is_terminal(&self) -> bool { self.status == GameStatus::Terminal }
}

/// A single 2048 game.
///
/// Single-caller and non-reentrant: every method runs to completion and no
/// internal locking is done. Callers with several input sources must
/// serialize their calls.
#[derive(Debug, Clone)]
pub struct Game<R = StdRng> {
    board: Board,
    score: Score,
    status: GameStatus,
    four_probability: f64,
    rng: R,
}

impl Game<StdRng> {
    /// New game seeded from OS entropy.
    pub fn new() -> Self { Game::with_rng(StdRng::from_entropy()) }

    /// New game with a reproducible tile sequence.
    pub fn from_seed(seed: u64) -> Self { Game::with_rng(StdRng::seed_from_u64(seed)) }

    /// New game using the seed and spawn weighting from `config`.
    pub fn from_config(config: &GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut game = Game::unstarted(Board::EMPTY, rng);
        game.four_probability = config.four_probability;
        game.reset();
        Ok(game)
    }
}

impl Default for Game<StdRng> {
    fn default() -> Self { Game::new() }
}

impl<R: Rng> Game<R> {
    /// Start a new game drawing randomness from `rng`.
    pub fn with_rng(rng: R) -> Self {
        let mut game = Game::unstarted(Board::EMPTY, rng);
        game.reset();
        game
    }

    /// Resume play from an arbitrary board with a zero score.
    ///
    /// The status is derived from the board, so a full board without merges
    /// starts out terminal.
    pub fn with_board(board: Board, rng: R) -> Self {
        let mut game = Game::unstarted(board, rng);
        game.status = status_of(board);
        game
    }

    fn unstarted(board: Board, rng: R) -> Self {
        Game {
            board,
            score: 0,
            status: GameStatus::InProgress,
            four_probability: DEFAULT_FOUR_PROBABILITY,
            rng,
        }
    }

    /// Clear the board and score, then spawn the two opening tiles.
    pub fn reset(&mut self) {
        self.board = Board::EMPTY;
        self.score = 0;
        self.status = GameStatus::InProgress;
        for _ in 0..START_TILES {
            self.spawn_random_tile();
        }
        debug!("new game:{}", self.board);
    }

    /// Slide and merge toward `direction`.
    ///
    /// A move that changes nothing, or any move once the game is terminal,
    /// leaves every piece of state untouched. Otherwise the merge points are
    /// added to the score, exactly one tile is spawned and the status is
    /// recomputed.
    pub fn apply_move(&mut self, direction: Move) -> MoveOutcome {
        if self.status == GameStatus::Terminal {
            debug!("ignoring {direction}: game is over");
            return self.rejected();
        }

        let before = self.board;
        let (after, gained) = before.shift_scored(direction);
        if after == before {
            debug!("rejected {direction}: board unchanged");
            return self.rejected();
        }

        self.board = after;
        self.score += gained;
        let spawned = self.spawn_random_tile();
        self.status = status_of(self.board);
        debug!("applied {direction}: +{gained} (score {})", self.score);
        if self.status == GameStatus::Terminal {
            info!(
                "game over: score {}, highest tile {}",
                self.score,
                self.board.highest_tile()
            );
        }

        MoveOutcome { changed: true, gained, spawned, status: self.status }
    }

    /// Place a 2 (or, less often, a 4) in a uniformly chosen empty cell.
    ///
    /// Returns the cell used, or `None` on a full board.
    pub fn spawn_random_tile(&mut self) -> Option<(usize, usize)> {
        let (board, pos) = self.board.spawn_tile(&mut self.rng, self.four_probability);
        self.board = board;
        if let Some((r, c)) = pos {
            trace!("spawned {} at ({r}, {c})", board.tile(r, c));
        }
        pos
    }

    /// True if no empty cell and no equal neighbours remain.
    #[inline]
    pub fn is_terminal(&self) -> bool { self.board.is_terminal() }

    #[inline]
    pub fn board(&self) -> Board { self.board }

    #[inline]
    pub fn score(&self) -> Score { self.score }

    #[inline]
    pub fn status(&self) -> GameStatus { self.status }

    #[inline]
    pub fn four_probability(&self) -> f64 { self.four_probability }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot { board: self.board, score: self.score, status: self.status }
    }

    fn rejected(&self) -> MoveOutcome {
        MoveOutcome { changed: false, gained: 0, spawned: None, status: self.status }
    }
}

fn status_of(board: Board) -> GameStatus {
    if board.is_terminal() { GameStatus::Terminal } else { GameStatus::InProgress }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SIZE;

    const CHECKER: [[u32; SIZE]; SIZE] = [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]];

    fn seeded(board: [[u32; SIZE]; SIZE], seed: u64) -> Game {
        Game::with_board(Board::from_rows(board), StdRng::seed_from_u64(seed))
    }

    fn non_zero(board: Board) -> Vec<u32> {
        board.iter().filter(|&v| v != 0).collect()
    }

    #[test]
    fn reset_spawns_two_tiles() {
        let mut game = Game::from_seed(1);
        for _ in 0..2 {
            game.reset();
            let tiles = non_zero(game.board());
            assert_eq!(tiles.len(), 2);
            assert!(tiles.iter().all(|&v| v == 2 || v == 4));
            assert_eq!(game.score(), 0);
            assert_eq!(game.status(), GameStatus::InProgress);
        }
    }

    #[test]
    fn reset_clears_a_finished_game() {
        let mut game = seeded(CHECKER, 3);
        assert_eq!(game.status(), GameStatus::Terminal);
        game.reset();
        assert_eq!(game.status(), GameStatus::InProgress);
        assert_eq!(game.board().count_empty(), 14);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn merge_scores_and_spawns_one_tile() {
        let mut game = seeded([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]], 42);
        let outcome = game.apply_move(Move::Left);
        assert!(outcome.changed);
        assert_eq!(outcome.gained, 4);
        assert_eq!(game.score(), 4);
        assert_eq!(game.board().tile(0, 0), 4);

        let spawned = outcome.spawned.expect("a tile is spawned after a changing move");
        assert_ne!(spawned, (0, 0));
        let mut rows = game.board().rows();
        assert!(matches!(rows[spawned.0][spawned.1], 2 | 4));
        rows[spawned.0][spawned.1] = 0;
        assert_eq!(rows, [[4, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
    }

    #[test]
    fn unchanged_move_is_rejected() {
        let start = [[2, 4, 0, 0], [8, 0, 0, 0], [0; 4], [0; 4]];
        let mut game = seeded(start, 9);
        let outcome = game.apply_move(Move::Left);
        assert_eq!(
            outcome,
            MoveOutcome { changed: false, gained: 0, spawned: None, status: GameStatus::InProgress }
        );
        assert_eq!(game.board(), Board::from_rows(start));
        assert_eq!(game.score(), 0);
        assert!(!game.apply_move(Move::Up).changed);
        assert!(game.apply_move(Move::Down).changed);
    }

    #[test]
    fn terminal_board_accepts_no_moves() {
        let mut game = seeded(CHECKER, 5);
        assert!(game.is_terminal());
        for dir in Move::ALL {
            let outcome = game.apply_move(dir);
            assert!(!outcome.changed);
            assert_eq!(outcome.status, GameStatus::Terminal);
            assert_eq!(game.board(), Board::from_rows(CHECKER));
            assert_eq!(game.status(), GameStatus::Terminal);
        }
    }

    #[test]
    fn terminal_status_is_absorbing_until_reset() {
        // Only the top row can move; whatever lands in (0, 3) leaves no merge.
        let start = [[0, 16, 8, 16], [8, 16, 8, 16], [16, 8, 16, 8], [8, 16, 8, 16]];
        let mut game = seeded(start, 11);
        assert_eq!(game.status(), GameStatus::InProgress);
        let outcome = game.apply_move(Move::Left);
        assert!(outcome.changed);
        assert_eq!(outcome.spawned, Some((0, 3)));
        assert_eq!(outcome.status, GameStatus::Terminal);
        assert!(!game.apply_move(Move::Right).changed);
        game.reset();
        assert_eq!(game.status(), GameStatus::InProgress);
    }

    #[test]
    fn spawn_on_full_board_is_noop() {
        let mut game = seeded(CHECKER, 13);
        assert_eq!(game.spawn_random_tile(), None);
        assert_eq!(game.board(), Board::from_rows(CHECKER));
    }

    #[test]
    fn spawn_targets_the_single_empty_cell() {
        let mut board = CHECKER;
        board[2][1] = 0;
        for seed in 0..20 {
            let mut game = seeded(board, seed);
            assert_eq!(game.spawn_random_tile(), Some((2, 1)));
            assert_eq!(game.board().count_empty(), 0);
        }
    }

    #[test]
    fn score_is_monotonic_and_tracks_merges() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut game = Game::from_seed(2024);
        let mut last = game.score();
        for _ in 0..2_000 {
            if game.is_terminal() {
                game.reset();
                last = 0;
            }
            let dir = Move::ALL[rng.gen_range(0..4)];
            let before = game.snapshot();
            let outcome = game.apply_move(dir);
            assert!(game.score() >= last);
            assert_eq!(game.score() - last, outcome.gained);
            if outcome.changed {
                assert!(outcome.spawned.is_some());
            } else {
                assert_eq!(game.snapshot(), before);
            }
            assert!(game.board().iter().all(|v| v == 0 || v.is_power_of_two()));
            last = game.score();
        }
    }

    #[test]
    fn same_seed_same_game() {
        let mut a = Game::from_seed(77);
        let mut b = Game::from_seed(77);
        for dir in [Move::Left, Move::Up, Move::Right, Move::Down].iter().cycle().take(40) {
            assert_eq!(a.apply_move(*dir), b.apply_move(*dir));
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn config_controls_spawn_weighting() {
        let config = GameConfig { seed: Some(5), four_probability: 1.0, ..GameConfig::default() };
        let game = Game::from_config(&config).unwrap();
        assert_eq!(non_zero(game.board()), vec![4, 4]);
        assert_eq!(game.four_probability(), 1.0);

        let bad = GameConfig { four_probability: 2.0, ..GameConfig::default() };
        assert!(matches!(Game::from_config(&bad), Err(ConfigError::FourProbability(_))));
    }
}
