//! Terminal presentation for a [`Game`](crate::game::Game).
//!
//! Nothing here mutates the engine. The front end turns key events into a
//! [`Command`] with a [`Keymap`], calls the engine, and hands the resulting
//! [`Snapshot`] to a [`Presenter`] for drawing. Styling goes through
//! crossterm commands so the same code draws to a raw-mode terminal or to a
//! byte buffer.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor};

use crate::engine::{Move, Tile, SIZE};
use crate::game::Snapshot;

const fn rgb(r: u8, g: u8, b: u8) -> Color { Color::Rgb { r, g, b } }

/// Background color per tile value. Values past 2048 use [`FALLBACK_COLOR`].
pub const TILE_COLORS: [(Tile, Color); 11] = [
    (2, rgb(0xee, 0xe4, 0xda)),
    (4, rgb(0xed, 0xe0, 0xc8)),
    (8, rgb(0xf2, 0xb1, 0x79)),
    (16, rgb(0xf5, 0x95, 0x63)),
    (32, rgb(0xf6, 0x7c, 0x5f)),
    (64, rgb(0xf6, 0x5e, 0x3b)),
    (128, rgb(0xed, 0xcf, 0x72)),
    (256, rgb(0xed, 0xcc, 0x61)),
    (512, rgb(0xed, 0xc8, 0x50)),
    (1024, rgb(0xed, 0xc5, 0x3f)),
    (2048, rgb(0xed, 0xc2, 0x2e)),
];

pub const FALLBACK_COLOR: Color = rgb(0xcd, 0xc1, 0xb4);

const TEXT_COLOR: Color = rgb(0x77, 0x6e, 0x65);
const CELL_WIDTH: usize = 6;

// Raw mode does not translate '\n'.
const NEWLINE: &str = "\r\n";

pub fn tile_color(value: Tile) -> Color {
    TILE_COLORS
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, c)| *c)
        .unwrap_or(FALLBACK_COLOR)
}

/// One key press, decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Move),
    Restart,
    Quit,
}

/// Name used for a key in bindings: `up`/`down`/`left`/`right` for the
/// arrows, `esc`, or the character itself.
pub fn key_token(code: KeyCode) -> Option<String> {
    let token = match code {
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Char(c) => c.to_string(),
        _ => return None,
    };
    Some(token)
}

/// Maps key tokens to commands; anything unmapped is ignored.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<String, Move>,
}

impl Default for Keymap {
    fn default() -> Self {
        let mut bindings = HashMap::new();
        let defaults: [(&[&str], Move); 4] = [
            (&["up", "w", "k"], Move::Up),
            (&["down", "s", "j"], Move::Down),
            (&["left", "a", "h"], Move::Left),
            (&["right", "d", "l"], Move::Right),
        ];
        for (tokens, dir) in defaults {
            for token in tokens {
                bindings.insert((*token).to_string(), dir);
            }
        }
        Keymap { bindings }
    }
}

impl Keymap {
    /// Built-in bindings plus `overrides`, which win on conflict.
    ///
    /// A token is kept as written and also under its lowercase form, and any
    /// built-in binding equal to it ignoring case is dropped, so an override
    /// is never shadowed by a default.
    pub fn with_overrides(overrides: &BTreeMap<String, Move>) -> Self {
        let mut keymap = Keymap::default();
        for (token, dir) in overrides {
            keymap.bindings.retain(|k, _| !k.eq_ignore_ascii_case(token));
            let lower = token.to_ascii_lowercase();
            if lower != *token {
                keymap.bindings.insert(lower, *dir);
            }
            keymap.bindings.insert(token.clone(), *dir);
        }
        keymap
    }

    pub fn direction(&self, token: &str) -> Option<Move> {
        let token = token.trim();
        self.bindings
            .get(token)
            .or_else(|| self.bindings.get(&token.to_ascii_lowercase()))
            .copied()
    }

    pub fn command(&self, token: &str) -> Option<Command> {
        if let Some(dir) = self.direction(token) {
            return Some(Command::Move(dir));
        }
        match token.trim().to_ascii_lowercase().as_str() {
            "r" | "restart" => Some(Command::Restart),
            "q" | "quit" | "esc" => Some(Command::Quit),
            _ => None,
        }
    }

    /// Decode a key event. Releases are ignored and Ctrl-C always quits,
    /// since raw mode swallows the signal.
    pub fn command_for_key(&self, key: &KeyEvent) -> Option<Command> {
        if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') | KeyCode::Char('C') => Some(Command::Quit),
                _ => None,
            };
        }
        self.command(&key_token(key.code)?)
    }
}

pub fn score_line(score: u64) -> String { format!("Score: {score}") }

pub fn game_over_notice(score: u64) -> String {
    format!("Game Over! Your Score: {score}\nPress Restart to Play Again.")
}

pub fn instructions() -> &'static str {
    "Use the arrow keys, WASD or HJKL to slide the tiles.\n\
     Equal tiles merge when they collide. Reach 2048!\n\
     Press r to restart, q or Esc to quit."
}

/// Draws a [`Snapshot`]: the grid, the score line, the game-over notice
/// while the game is Terminal, then the instructions.
///
/// The notice stays on every frame until [`Presenter::on_reset`].
#[derive(Debug, Clone)]
pub struct Presenter {
    color: bool,
    notice_shown: bool,
}

impl Presenter {
    pub fn new(color: bool) -> Self { Presenter { color, notice_shown: false } }

    pub fn on_reset(&mut self) { self.notice_shown = false; }

    pub fn notice_shown(&self) -> bool { self.notice_shown }

    pub fn render<W: Write>(&mut self, out: &mut W, snapshot: &Snapshot) -> io::Result<()> {
        let dimmed = snapshot.is_terminal();
        for r in 0..SIZE {
            if dimmed && self.color {
                queue!(out, SetAttribute(Attribute::Dim))?;
            }
            for c in 0..SIZE {
                self.draw_cell(out, snapshot.board.tile(r, c))?;
            }
            if self.color {
                queue!(out, ResetColor, SetAttribute(Attribute::Reset))?;
            }
            queue!(out, Print(NEWLINE))?;
        }
        write_lines(out, &score_line(snapshot.score))?;
        if dimmed {
            write_lines(out, &game_over_notice(snapshot.score))?;
        }
        self.notice_shown = dimmed;
        queue!(out, Print(NEWLINE))?;
        write_lines(out, instructions())
    }

    fn draw_cell<W: Write>(&self, out: &mut W, value: Tile) -> io::Result<()> {
        let label = if value == 0 { String::new() } else { value.to_string() };
        if !self.color {
            return queue!(out, Print(format!("[{:^w$}]", label, w = CELL_WIDTH)));
        }
        // Color changes keep the dim attribute set at the start of the row.
        queue!(
            out,
            SetBackgroundColor(tile_color(value)),
            SetForegroundColor(TEXT_COLOR),
            Print(format!("{:^w$}", label, w = CELL_WIDTH))
        )
    }
}

fn write_lines<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    for line in text.lines() {
        queue!(out, Print(line), Print(NEWLINE))?;
    }
    Ok(())
}
