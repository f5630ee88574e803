//! grid-2048: a 2048 grid engine and a terminal front end
//!
//! This crate provides:
//! - A value-level 4x4 `Board` with pure slide/merge, spawn and terminal checks (`engine`)
//! - A stateful `Game` owning board, score, status and RNG (`game`)
//! - TOML session settings (`config`)
//! - Terminal rendering and input mapping that only read engine state (`view`)
//!
//! Quick start:
//! ```
//! use grid_2048::engine::{Board, Move};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic board initialization with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let b0 = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
//! let (b1, gained) = b0.shift_scored(Move::Left);
//! assert!(b1.count_empty() >= b0.count_empty());
//! assert!(gained == 0 || gained >= 4);
//! ```
//!
//! Full loop:
//! ```
//! use grid_2048::engine::Move;
//! use grid_2048::game::Game;
//!
//! let mut game = Game::from_seed(123);
//! let mut moves = 0u32;
//! for dir in Move::ALL.iter().cycle().take(64) {
//!     if game.is_terminal() {
//!         break;
//!     }
//!     if game.apply_move(*dir).changed {
//!         moves += 1;
//!     }
//! }
//! assert!(moves > 0);
//! let _final_score = game.score();
//! ```
//!
pub mod config;
pub mod engine;
pub mod game;
pub mod view;
