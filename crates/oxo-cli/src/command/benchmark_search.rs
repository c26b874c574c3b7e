use std::{collections::BTreeMap, path::PathBuf, time::Instant};

use anyhow::Context;
use oxo_engine::{Board, Outcome, Player};
use oxo_search::{SearchAlgorithm, SearchEngine};
use rand::{Rng, seq::IndexedRandom};
use serde::Serialize;

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct BenchmarkSearchArg {
    /// Games per batch
    #[arg(long, default_value_t = 10)]
    games: usize,
    /// Per-turn records (CSV)
    #[arg(long, default_value = "search_benchmark.csv")]
    output: PathBuf,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, derive_more::Display)]
enum Contestant {
    #[display("{_0}")]
    Search(SearchAlgorithm),
    Random,
}

const BATCHES: [(&str, Contestant, Contestant); 3] = [
    (
        "minimax-vs-alpha-beta",
        Contestant::Search(SearchAlgorithm::Minimax),
        Contestant::Search(SearchAlgorithm::AlphaBeta),
    ),
    (
        "minimax-vs-random",
        Contestant::Search(SearchAlgorithm::Minimax),
        Contestant::Random,
    ),
    (
        "alpha-beta-vs-random",
        Contestant::Search(SearchAlgorithm::AlphaBeta),
        Contestant::Random,
    ),
];

#[derive(Debug, Clone, Serialize)]
struct TurnRecord {
    batch: &'static str,
    game: usize,
    turn: usize,
    algorithm: String,
    nodes: u64,
    seconds: f64,
    /// Set on the last turn of a game: `X`, `O` or `draw`.
    winner: Option<String>,
}

#[derive(Debug, Default)]
struct Totals {
    moves: usize,
    nodes: u64,
    seconds: f64,
}

pub(crate) fn run(arg: &BenchmarkSearchArg) -> anyhow::Result<()> {
    let BenchmarkSearchArg {
        games,
        output,
        seed,
    } = arg;

    let mut rng = util::make_rng(*seed);
    let mut writer = util::create_csv(output)?;
    let mut totals: BTreeMap<String, Totals> = BTreeMap::new();

    let pb = util::progress_bar((BATCHES.len() * games) as u64, "games");
    for (batch, first, second) in BATCHES {
        for game in 0..*games {
            for record in play_game(batch, game, first, second, &mut rng)? {
                let total = totals.entry(record.algorithm.clone()).or_default();
                total.moves += 1;
                total.nodes += record.nodes;
                total.seconds += record.seconds;
                writer
                    .serialize(&record)
                    .with_context(|| format!("Failed to write record: {}", output.display()))?;
            }
            pb.inc(1);
        }
        tracing::debug!(batch, games, "benchmark batch completed");
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush records: {}", output.display()))?;
    pb.finish_and_clear();

    eprintln!("Search benchmark ({games} games per batch)");
    for (algorithm, total) in &totals {
        #[expect(clippy::cast_precision_loss)]
        let mean_nodes = total.nodes as f64 / total.moves.max(1) as f64;
        eprintln!(
            "  {algorithm:<10} moves {:>5} | nodes/move {:>10.1} | total {:>8.3}s",
            total.moves, mean_nodes, total.seconds
        );
    }
    eprintln!("Records saved to {}", output.display());

    Ok(())
}

fn play_game<R>(
    batch: &'static str,
    game: usize,
    first: Contestant,
    second: Contestant,
    rng: &mut R,
) -> anyhow::Result<Vec<TurnRecord>>
where
    R: Rng + ?Sized,
{
    let mut board = Board::new();
    let mut records = vec![];
    while !board.is_terminal() {
        let contestant = match board.turn() {
            Player::X => first,
            Player::O => second,
        };
        let start = Instant::now();
        let (position, nodes) = match contestant {
            Contestant::Search(algorithm) => SearchEngine::new(algorithm).simulation_move(&board),
            Contestant::Random => {
                let position = *board
                    .legal_moves()
                    .choose(rng)
                    .expect("unfinished board should always have a legal move");
                (position, 0)
            }
        };
        let seconds = start.elapsed().as_secs_f64();
        board.apply(position)?;

        let winner = board.outcome().map(|outcome| match outcome {
            Outcome::Winner(player) => player.to_string(),
            Outcome::Draw => "draw".to_owned(),
        });
        records.push(TurnRecord {
            batch,
            game,
            turn: board.move_count(),
            algorithm: contestant.to_string(),
            nodes,
            seconds,
            winner,
        });
    }
    Ok(records)
}
