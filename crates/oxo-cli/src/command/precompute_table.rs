use std::{path::PathBuf, time::Instant};

use oxo_engine::Board;
use oxo_search::PerfectPlayTable;

use crate::util::Output;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct PrecomputeTableArg {
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &PrecomputeTableArg) -> anyhow::Result<()> {
    let PrecomputeTableArg { output } = arg;

    let start = Instant::now();
    let board = Board::new();
    let table = PerfectPlayTable::precompute(&board);
    let terminal = table
        .iter()
        .filter(|(_, entry)| entry.best_move().is_none())
        .count();
    tracing::info!(
        entries = table.len(),
        terminal,
        elapsed = ?start.elapsed(),
        "perfect-play table computed"
    );

    Output::save_json(&table, output.clone())?;

    eprintln!();
    eprintln!("Perfect-play table saved successfully");
    if let Some(path) = &output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Positions: {} ({terminal} terminal)", table.len());
    if let Some(root) = table.get(&board) {
        eprintln!("  Empty board value: {}", root.value());
        if let Some(position) = root.best_move() {
            eprintln!("  Opening move: {position}");
        }
    }

    Ok(())
}
