//! Benchmark for whole-game playouts
//!
//! Measures roll/move throughput of the pure engine with uniformly random moves

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ludo_engine::{
    advance_turn, legal_moves, new_game, roll_dice, try_apply_move, GameState, NextStep, Phase,
    PieceState, Rules,
};

fn playout(rng: &mut StdRng) -> GameState {
    let mut state = new_game(Rules::default());
    while !state.is_over() {
        state = match roll_dice(&state, rng) {
            Ok(next) => next,
            Err(_) => break,
        };
        if let Phase::TurnEnding(_) = state.phase() {
            state = advance_turn(state);
            continue;
        }
        let legal = legal_moves(&state);
        let id = legal[rng.random_range(0..legal.len())];
        let outcome = match try_apply_move(&state, id) {
            Ok(outcome) => outcome,
            Err(_) => break,
        };
        state = match outcome.next {
            NextStep::AdvanceTurn => advance_turn(outcome.state),
            _ => outcome.state,
        };
    }
    state
}

fn bench_random_playout(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("random_playout", |b| {
        b.iter(|| black_box(playout(&mut rng)))
    });
}

fn bench_legal_moves(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let mut state = new_game(Rules::default());
    for (i, piece) in state.pieces.iter_mut().enumerate() {
        if i % 2 == 0 {
            piece.state = PieceState::OnTrack((i * 3) as u8);
        }
    }
    let state = loop {
        let rolled = roll_dice(&state, &mut rng).expect("fresh state accepts a roll");
        if rolled.can_move {
            break rolled;
        }
        state = advance_turn(rolled);
    };

    c.bench_function("legal_moves", |b| {
        b.iter(|| black_box(legal_moves(black_box(&state))))
    });
}

criterion_group!(benches, bench_random_playout, bench_legal_moves);
criterion_main!(benches);
