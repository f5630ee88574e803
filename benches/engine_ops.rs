use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use grid_2048::engine::{count_empty, get_highest_tile_val, is_game_over, slide_row_left, Board, Move};
use grid_2048::game::Game;
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut boards = Vec::new();
    // Empty and two-tile starts
    boards.push(Board::EMPTY);
    let mut b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    boards.push(b);
    // Derive a variety of densities deterministically
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..40 {
        let dir = seq[i % seq.len()];
        let nb = b.shift(dir);
        if nb != b { b = nb.with_random_tile(&mut rng); }
        boards.push(b);
    }
    boards
}

fn bench_shift(c: &mut Criterion) {
    for dir in Move::ALL {
        c.bench_function(&format!("shift/{dir}"), |bch| {
            let boards = corpus();
            bch.iter(|| {
                let mut acc = 0u64;
                for &bd in &boards { acc = acc.wrapping_add(bd.shift_scored(dir).1); }
                black_box(acc)
            })
        });
    }
    c.bench_function("row/slide_left", |bch| {
        let rows: Vec<[u32; 4]> = corpus().iter().flat_map(|b| b.rows()).collect();
        bch.iter(|| {
            let mut acc = 0u64;
            for &row in &rows { acc = acc.wrapping_add(slide_row_left(row).1); }
            black_box(acc)
        })
    });
}

fn bench_game(c: &mut Criterion) {
    c.bench_function("board/with_random_tile", |bch| {
        bch.iter_batched(
            || (Board::EMPTY, StdRng::seed_from_u64(7)),
            |(mut bd, mut rng)| {
                for _ in 0..16 { bd = bd.with_random_tile(&mut rng); }
                black_box(bd)
            },
            BatchSize::SmallInput,
        )
    });
    c.bench_function("game/apply_move_cycle", |bch| {
        bch.iter_batched(
            || Game::from_seed(9),
            |mut game| {
                for dir in Move::ALL.iter().cycle().take(64) { game.apply_move(*dir); }
                black_box(game.score())
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_queries(c: &mut Criterion) {
    c.bench_function("query/is_game_over", |bch| {
        let boards = corpus();
        bch.iter(|| boards.iter().filter(|&&bd| is_game_over(bd)).count())
    });
    c.bench_function("query/count_empty", |bch| {
        let boards = corpus();
        bch.iter(|| {
            let mut acc = 0usize;
            for &bd in &boards { acc ^= count_empty(bd); }
            black_box(acc)
        })
    });
    c.bench_function("query/highest_tile_val", |bch| {
        let boards = corpus();
        bch.iter(|| {
            let mut acc = 0u32;
            for &bd in &boards { acc ^= get_highest_tile_val(bd); }
            black_box(acc)
        })
    });
}

criterion_group!(engine_ops, bench_shift, bench_game, bench_queries);
criterion_main!(engine_ops);
