use std::path::PathBuf;

use oxo_learning::{MatchRecord, RandomPlayer, evaluate_agent, evaluate_self_play, master_policy};

use crate::{command::TableArg, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TournamentArg {
    /// Model written by `train-agent`
    #[arg(long)]
    model: PathBuf,
    #[clap(flatten)]
    table: TableArg,
    /// Games per opponent
    #[arg(long, default_value_t = 100)]
    games: usize,
    #[arg(long)]
    seed: Option<u64>,
}

pub(crate) fn run(arg: &TournamentArg) -> anyhow::Result<()> {
    let TournamentArg {
        model,
        table,
        games,
        seed,
    } = arg;

    let table = table.load()?;
    let agent = util::read_model_file(model)?.into_agent();
    let master = master_policy(table.as_ref());
    let mut rng = util::make_rng(*seed);

    let vs_master = evaluate_agent(&agent, master.as_ref(), *games, &mut rng)?;
    let vs_random = evaluate_agent(&agent, &RandomPlayer, *games, &mut rng)?;
    let self_play = evaluate_self_play(&agent, *games, &mut rng)?;

    eprintln!("Tournament of {} ({games} games each)", model.display());
    eprintln!("  {:<10} | {:>4} | {:>4} | {:>4} | {:>8}", "OPPONENT", "W", "L", "D", "NON-LOSS");
    eprintln!("  {}", "-".repeat(44));
    print_row("master", &vs_master);
    print_row("random", &vs_random);
    eprintln!(
        "  {:<10} | X {} / O {} / D {}",
        "self",
        self_play.first_wins,
        self_play.second_wins,
        self_play.draws
    );

    Ok(())
}

fn print_row(name: &str, record: &MatchRecord) {
    eprintln!(
        "  {name:<10} | {:>4} | {:>4} | {:>4} | {:>7.1}%",
        record.wins,
        record.losses,
        record.draws,
        record.non_loss_rate() * 100.0
    );
}
