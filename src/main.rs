use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use crossterm::cursor::{self, MoveTo};
use crossterm::event::{self, Event};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use env_logger::Env;
use log::{debug, info};

use grid_2048::config::GameConfig;
use grid_2048::game::{Game, Snapshot};
use grid_2048::view::{Command, Keymap, Presenter};

#[derive(Parser, Debug)]
#[command(name = "grid-2048", version, about = "Play 2048 in the terminal")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE", value_parser = clap::value_parser!(PathBuf))]
    config: Option<PathBuf>,

    /// Seed for a reproducible tile sequence (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Draw without colors
    #[arg(long)]
    no_color: bool,
}

/// Raw mode on an alternate screen for as long as it lives.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn redraw<W: Write>(out: &mut W, presenter: &mut Presenter, snapshot: &Snapshot) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    presenter.render(out, snapshot)?;
    out.flush()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let mut config = match &args.config {
        Some(path) => GameConfig::from_toml(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.no_color {
        config.display.color = false;
    }
    info!("starting with {config:?}");

    let keymap = Keymap::with_overrides(&config.keys);
    let mut presenter = Presenter::new(config.display.color);
    let mut game = Game::from_config(&config)?;

    let _guard = TerminalGuard::enter().context("entering raw mode")?;
    let mut out = io::stdout();
    redraw(&mut out, &mut presenter, &game.snapshot())?;

    // One event at a time: engine calls never overlap.
    loop {
        let key = match event::read().context("reading input")? {
            Event::Key(key) => key,
            Event::Resize(..) => {
                redraw(&mut out, &mut presenter, &game.snapshot())?;
                continue;
            }
            _ => continue,
        };
        match keymap.command_for_key(&key) {
            Some(Command::Move(dir)) => {
                if game.apply_move(dir).changed {
                    redraw(&mut out, &mut presenter, &game.snapshot())?;
                }
            }
            Some(Command::Restart) => {
                game.reset();
                presenter.on_reset();
                redraw(&mut out, &mut presenter, &game.snapshot())?;
            }
            Some(Command::Quit) => break,
            None => debug!("ignoring key {:?}", key.code),
        }
    }
    Ok(())
}
