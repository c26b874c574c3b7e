use oxo_engine::{Board, Player, Position};
use oxo_search::{PerfectPlayTable, SearchAlgorithm, SearchEngine};
use rand::{SeedableRng, seq::IndexedRandom};
use rand_pcg::Pcg64;

fn table() -> PerfectPlayTable {
    PerfectPlayTable::precompute(&Board::new())
}

#[test]
fn test_table_covers_every_reachable_state() {
    let table = table();
    assert_eq!(table.len(), 5478);
    let terminal = table
        .iter()
        .filter(|(_, entry)| entry.best_move().is_none())
        .count();
    assert_eq!(terminal, 958);
}

#[test]
fn test_empty_board_opening() {
    let table = table();
    let board = Board::new();
    assert_eq!(table.value(&board), Some(0));
    let opening = table.best_move(&board).unwrap();
    assert!(opening == Position::CENTER || Position::CORNERS.contains(&opening));
}

#[test]
fn test_table_self_play_is_nine_move_draw() {
    let table = table();
    let mut board = Board::new();
    let mut moves = 0;
    while !board.is_terminal() {
        let position = table.best_move(&board).unwrap();
        board.apply(position).unwrap();
        moves += 1;
    }
    assert_eq!(moves, 9);
    assert!(board.is_draw());
}

#[test]
fn test_search_algorithms_agree_with_table() {
    let table = table();
    let minimax = SearchEngine::new(SearchAlgorithm::Minimax);
    let alpha_beta = SearchEngine::new(SearchAlgorithm::AlphaBeta);

    for (key, entry) in table.iter() {
        let Some(table_move) = entry.best_move() else {
            continue;
        };
        let board = Board::from_key(key).unwrap();
        let a = minimax.find_best_move(&board);
        let b = alpha_beta.find_best_move(&board);

        assert_eq!(a.value(), b.value(), "{board}");
        assert_eq!(a.position(), b.position(), "{board}");
        assert!(b.nodes() <= a.nodes(), "{board}");
        assert_eq!(a.value(), entry.value_for(board.turn()), "{board}");
        assert_eq!(a.position(), table_move, "{board}");

        let (sim_a, sim_nodes_a) = minimax.simulation_move(&board);
        let (sim_b, sim_nodes_b) = alpha_beta.simulation_move(&board);
        assert_eq!(sim_a, a.position(), "{board}");
        assert_eq!(sim_b, a.position(), "{board}");
        assert!(sim_nodes_b <= sim_nodes_a, "{board}");
    }
}

#[test]
fn test_stored_move_preserves_value() {
    let table = table();
    for (key, entry) in table.iter() {
        let Some(position) = entry.best_move() else {
            continue;
        };
        let mut board = Board::from_key(key).unwrap();
        board.apply(position).unwrap();
        assert_eq!(table.value(&board), Some(entry.value()), "{key}");
    }
}

/// Returns `true` if the opponent of `table_player` can force a win from `board`
/// while `table_player` follows the table.
fn opponent_can_win(table: &PerfectPlayTable, board: &mut Board, table_player: Player) -> bool {
    if let Some(outcome) = board.outcome() {
        return outcome.winner() == Some(table_player.opponent());
    }
    if board.turn() == table_player {
        let position = table.best_move(board).unwrap();
        let mut child = board.play(position).unwrap();
        return opponent_can_win(table, &mut child, table_player);
    }
    board.legal_moves().into_iter().any(|position| {
        let mut child = board.play(position).unwrap();
        opponent_can_win(table, &mut child, table_player)
    })
}

#[test]
fn test_table_player_never_loses() {
    let table = table();
    for player in Player::ALL {
        let mut board = Board::new();
        assert!(!opponent_can_win(&table, &mut board, player), "{player}");
    }
}

#[test]
fn test_table_beats_random_or_draws() {
    let table = table();
    let mut rng = Pcg64::seed_from_u64(1234);
    for game in 0..200 {
        let table_player = if game % 2 == 0 { Player::X } else { Player::O };
        let mut board = Board::new();
        while !board.is_terminal() {
            let position = if board.turn() == table_player {
                table.best_move(&board).unwrap()
            } else {
                *board.legal_moves().choose(&mut rng).unwrap()
            };
            board.apply(position).unwrap();
        }
        assert_ne!(board.winner(), Some(table_player.opponent()));
    }
}
