use super::*;

#[test]
fn new_matches_startpos_fen() {
    let start = Board::new();
    let parsed: Board = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        .parse()
        .unwrap();
    assert_eq!(start.piece_on_sq, parsed.piece_on_sq);
    assert_eq!(start.side_to_move, parsed.side_to_move);
    assert_eq!(start.castling_rights, parsed.castling_rights);
    assert_eq!(start.en_passant, parsed.en_passant);
    assert_eq!(start.zobrist, parsed.zobrist);
}

#[test]
fn fen_round_trips() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        "8/8/3k4/8/7Q/8/4K3/8 w - - 0 1",
    ];
    for fen in fens {
        let board: Board = fen.parse().unwrap();
        assert_eq!(board.to_fen(), fen, "round-trip mismatch for {fen}");
    }
}

#[test]
fn set_fen_defaults_missing_clock_fields() {
    let board: Board = "8/8/3k4/8/7Q/8/4K3/8 w - -".parse().unwrap();
    assert_eq!(board.halfmove_clock, 0);
    assert_eq!(board.fullmove_number, 1);
}

#[test]
fn set_fen_rejects_missing_king() {
    assert!("8/8/8/8/8/8/8/8 w - - 0 1".parse::<Board>().is_err());
}

#[test]
fn set_fen_rejects_malformed_placement() {
    assert!(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1"
            .parse::<Board>()
            .is_err()
    );
}

#[test]
fn piece_at_agrees_with_bitboards() {
    let board = Board::new();
    for sq_idx in 0..64u8 {
        let sq = Square::from_index(sq_idx);
        let bit = 1u64 << sq_idx;
        let expected = [Color::White, Color::Black].iter().find_map(|&c| {
            [
                Piece::Pawn,
                Piece::Knight,
                Piece::Bishop,
                Piece::Rook,
                Piece::Queen,
                Piece::King,
            ]
            .iter()
            .find(|&&p| board.bb(c, p) & bit != 0)
            .map(|&p| (c, p))
        });
        assert_eq!(board.piece_at(sq), expected);
    }
}

#[test]
fn validate_detects_overlap() {
    let mut board = Board::new_empty();
    board.set_bb(Color::White, Piece::Pawn, 1);
    board.set_bb(Color::White, Piece::Rook, 1);
    assert!(board.validate().is_err());
}

#[test]
fn insufficient_material_draw_position_has_no_pawns_rooks_queens() {
    let board: Board = "8/3k4/8/8/8/8/4K3/8 w - - 0 1".parse().unwrap();
    for &c in &[Color::White, Color::Black] {
        assert_eq!(board.bb(c, Piece::Pawn), 0);
        assert_eq!(board.bb(c, Piece::Rook), 0);
        assert_eq!(board.bb(c, Piece::Queen), 0);
    }
}
