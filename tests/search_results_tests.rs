use std::str::FromStr;
use vantage::board::Board;
use vantage::moves::magic::loader::load_magic_tables;
use vantage::search::search::search_with_results;

#[test]
fn reports_best_move_depth_and_nodes() {
    let mut board = Board::from_str("6k1/8/8/2q5/3P4/8/8/6K1 w - - 0 1").unwrap();
    let tables = load_magic_tables();

    let results = search_with_results(&mut board, &tables, 5, None);

    assert!(results.best_move.is_some());
    assert!(results.searched_depth >= 1);
    assert!(results.visited_nodes > 0);
    assert!(results.search_start.elapsed().as_secs() < 5);
}

#[test]
fn principal_variation_starts_with_the_best_move() {
    let mut board =
        Board::from_str("r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 0 1")
            .unwrap();
    let tables = load_magic_tables();

    let results = search_with_results(&mut board, &tables, 4, None);

    let best = results.best_move.expect("a move should be found");
    let variation = results
        .searched_variations
        .first()
        .expect("at least one variation is reported");
    assert_eq!(variation.moves.first().copied(), Some(best));
    assert_eq!(variation.score, results.best_score);
}

#[test]
fn board_is_unchanged_after_reporting_results() {
    let fen = "6k1/8/8/2q5/3P4/8/8/6K1 w - - 0 1";
    let mut board = Board::from_str(fen).unwrap();
    let tables = load_magic_tables();

    let before = board.clone();
    let _ = search_with_results(&mut board, &tables, 4, None);

    assert_eq!(board.zobrist, before.zobrist);
    assert_eq!(board.side_to_move, before.side_to_move);
}
