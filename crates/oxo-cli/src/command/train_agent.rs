use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use oxo_learning::{CurveConfig, LearningParams, QAgent, Trainer, evaluate_agent, master_policy};

use crate::{
    command::{TableArg, TrainingArg},
    schema::q_model::QModel,
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainAgentArg {
    #[clap(flatten)]
    table: TableArg,
    #[clap(flatten)]
    training: TrainingArg,
    /// Episode budget
    #[arg(long, default_value_t = 20_000)]
    episodes: usize,
    /// Learning rate
    #[arg(long, default_value_t = 0.5)]
    alpha: f64,
    /// Discount factor
    #[arg(long, default_value_t = 0.9)]
    gamma: f64,
    /// Per-episode epsilon decrement [default: start epsilon / episodes]
    #[arg(long)]
    decay: Option<f64>,
    /// Reward of a drawn game
    #[arg(long, default_value_t = 0.5)]
    reward_draw: f64,
    /// Games against the master after training
    #[arg(long, default_value_t = 100)]
    eval_games: usize,
    /// Write a learning curve (CSV) sampled every `curve-interval` episodes
    #[arg(long)]
    curve_output: Option<PathBuf>,
    #[arg(long, default_value_t = 200)]
    curve_interval: usize,
    /// Continue training the Q-table of an existing model
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
}

pub(crate) fn run(arg: &TrainAgentArg) -> anyhow::Result<()> {
    let TrainAgentArg {
        table,
        training,
        episodes,
        alpha,
        gamma,
        decay,
        reward_draw,
        eval_games,
        curve_output,
        curve_interval,
        resume,
        output,
        seed,
    } = arg;

    let table = table.load()?;
    let params = LearningParams {
        alpha: *alpha,
        gamma: *gamma,
    };
    let mut config = training.to_config(*episodes)?;
    config.epsilon_decay = *decay;
    config.reward_draw = *reward_draw;
    if curve_output.is_some() {
        config.curve = Some(CurveConfig {
            interval: *curve_interval,
            ..CurveConfig::default()
        });
    }

    let (mut agent, previous_episodes) = load_agent(resume.as_deref(), params)?;

    let mut rng = util::make_rng(*seed);
    let trainer = Trainer::new(config.clone(), table.as_ref());
    let pb = util::progress_bar(config.episodes as u64, "episodes");
    let mut on_progress = |episode: usize, _total: usize| pb.set_position(episode as u64);
    let outcome = trainer.train(&mut agent, &mut rng, Some(&mut on_progress))?;
    pb.finish_and_clear();

    let master = master_policy(table.as_ref());
    let evaluation = evaluate_agent(&agent, master.as_ref(), *eval_games, &mut rng)?;

    eprintln!("Training completed");
    eprintln!("  Episodes: {}", outcome.episodes_played);
    if outcome.converged {
        eprintln!("  Converged after: {} episodes", outcome.episodes_to_convergence);
    } else {
        eprintln!("  Did not converge within the budget");
    }
    eprintln!("  States learned: {}", agent.table().state_count());
    eprintln!(
        "  Against master: W {} / L {} / D {} (non-loss {:.1}%)",
        evaluation.wins,
        evaluation.losses,
        evaluation.draws,
        evaluation.non_loss_rate() * 100.0
    );

    if let Some(path) = curve_output {
        let mut writer = util::create_csv(path)?;
        for point in &outcome.curve {
            writer
                .serialize(point)
                .with_context(|| format!("Failed to write learning curve: {}", path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush learning curve: {}", path.display()))?;
        eprintln!("  Learning curve: {} points -> {}", outcome.curve.len(), path.display());
    }

    let model = QModel {
        trained_at: Utc::now(),
        params,
        training: config,
        total_episodes: previous_episodes + outcome.episodes_played,
        episodes_to_convergence: outcome.episodes_to_convergence,
        converged: outcome.converged,
        evaluation,
        q_table: agent.into_table(),
    };
    Output::save_json(&model, output.clone())?;

    eprintln!();
    eprintln!("Model saved successfully");
    if let Some(path) = &output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Trained at: {}", model.trained_at);
    eprintln!("  Total episodes: {}", model.total_episodes);

    Ok(())
}

/// Returns the agent to train and the episodes it was already trained for.
///
/// A resume path that does not exist starts from an empty table.
fn load_agent(resume: Option<&Path>, params: LearningParams) -> anyhow::Result<(QAgent, usize)> {
    let Some(path) = resume else {
        return Ok((QAgent::new(params), 0));
    };
    if !path.exists() {
        tracing::warn!(
            path = %path.display(),
            "model to resume not found, starting from an empty table"
        );
        return Ok((QAgent::new(params), 0));
    }
    let model = util::read_model_file(path)?;
    eprintln!(
        "Resuming {} ({} states, {} episodes)",
        path.display(),
        model.q_table.state_count(),
        model.total_episodes
    );
    let previous = model.total_episodes;
    Ok((QAgent::with_table(model.q_table, params), previous))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use oxo_engine::Board;
    use oxo_learning::{MatchRecord, QTable, TrainingConfig};

    use super::*;
    use crate::util::test_path;

    const PARAMS: LearningParams = LearningParams {
        alpha: 0.5,
        gamma: 0.9,
    };

    #[test]
    fn test_missing_resume_model_starts_empty() {
        let path = test_path("missing_model.json");
        let (agent, previous) = load_agent(Some(&path), PARAMS).unwrap();
        assert!(agent.table().is_empty());
        assert_eq!(previous, 0);
    }

    #[test]
    fn test_resume_keeps_table_and_episode_count() {
        let mut agent = QAgent::new(PARAMS);
        let board = Board::new();
        let action = board.legal_moves()[4];
        agent.update(QAgent::state_key(&board), action, 1.0, None, true);
        let model = QModel {
            trained_at: Utc::now(),
            params: PARAMS,
            training: TrainingConfig::default(),
            total_episodes: 1200,
            episodes_to_convergence: 1200,
            converged: false,
            evaluation: MatchRecord::default(),
            q_table: agent.into_table(),
        };
        let path = test_path("resume_model.json");
        Output::save_json(&model, Some(path.clone())).unwrap();

        let (resumed, previous) = load_agent(Some(&path), PARAMS).unwrap();
        assert_eq!(previous, 1200);
        assert_eq!(resumed.table(), &model.q_table);
        assert_ne!(resumed.table(), &QTable::new());
    }
}
