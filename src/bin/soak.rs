use std::time::Instant;

use anyhow::bail;
use clap::Parser;
use env_logger::Env;
use grid_2048::engine::{Move, Score, Tile};
use grid_2048::game::{Game, GameStatus};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

#[derive(Parser, Debug)]
#[command(
    name = "soak",
    version,
    about = "Play many random-direction games and check engine invariants after every move"
)]
struct Args {
    /// Number of games to play
    #[arg(short = 'n', long, default_value_t = 1_000)]
    games: u64,

    /// Base seed; game i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Give up on a game after this many move attempts
    #[arg(long, default_value_t = 100_000)]
    max_moves: u64,

    /// Number of worker threads (default: rayon's choice)
    #[arg(long)]
    threads: Option<usize>,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct GameReport {
    moves: u64,
    rejected: u64,
    score: Score,
    highest_tile: Tile,
    finished: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new().num_threads(n).build_global()?;
    }

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.games);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} games ({eta})")?
                .progress_chars("=>-"),
        );
        pb
    };

    let start = Instant::now();
    let reports: Vec<GameReport> = (0..args.games)
        .into_par_iter()
        .map(|i| {
            let r = play_one(args.seed.wrapping_add(i), args.max_moves);
            pb.inc(1);
            r
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    pb.finish_and_clear();

    let unfinished = reports.iter().filter(|r| !r.finished).count();
    if unfinished > 0 {
        warn!("{unfinished} games hit --max-moves before reaching a terminal board");
    }
    let moves: u64 = reports.iter().map(|r| r.moves).sum();
    let rejected: u64 = reports.iter().map(|r| r.rejected).sum();
    let best = reports.iter().map(|r| r.score).max().unwrap_or(0);
    let highest = reports.iter().map(|r| r.highest_tile).max().unwrap_or(0);
    let elapsed = start.elapsed().as_secs_f64().max(1e-6);
    info!(
        "games: {}, moves: {} ({} rejected), best score: {}, highest tile: {}, moves/sec: {:.0}",
        reports.len(),
        moves,
        rejected,
        best,
        highest,
        moves as f64 / elapsed
    );
    Ok(())
}

fn play_one(seed: u64, max_moves: u64) -> anyhow::Result<GameReport> {
    let mut game = Game::from_seed(seed);
    let mut picker = StdRng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15);
    let mut report = GameReport::default();

    let opening = game.board().count_empty();
    if opening != 14 || game.score() != 0 || game.status() != GameStatus::InProgress {
        bail!("seed {seed}: bad opening position {:?}", game.board());
    }

    for _ in 0..max_moves {
        if game.status() == GameStatus::Terminal {
            report.finished = true;
            break;
        }
        let dir = Move::ALL[picker.gen_range(0..Move::ALL.len())];
        let before = game.snapshot();
        let outcome = game.apply_move(dir);
        let after = game.snapshot();

        if after.score < before.score || after.score - before.score != outcome.gained {
            bail!("seed {seed}: score went {} -> {} with gain {}", before.score, after.score, outcome.gained);
        }
        if let Some(v) = after.board.iter().find(|&v| v != 0 && !v.is_power_of_two()) {
            bail!("seed {seed}: tile {v} is not a power of two");
        }
        if outcome.changed {
            if outcome.spawned.is_none() {
                bail!("seed {seed}: {dir} changed the board without spawning");
            }
            if after.status != outcome.status || after.board.is_terminal() != (after.status == GameStatus::Terminal) {
                bail!("seed {seed}: status {:?} disagrees with board", after.status);
            }
            report.moves += 1;
        } else {
            if after != before {
                bail!("seed {seed}: rejected {dir} still mutated state");
            }
            report.rejected += 1;
        }
    }

    report.score = game.score();
    report.highest_tile = game.board().highest_tile();
    if game.status() == GameStatus::Terminal {
        report.finished = true;
    }
    Ok(report)
}
