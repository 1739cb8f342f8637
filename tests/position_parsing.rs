use pretty_assertions::assert_eq;
use shakmaty::{CastlingMode, Chess, Color, Position as ShakmatyPosition};
use strum::IntoEnumIterator;
use tabiya::chess::attacks::{self, AttackerSpec};
use tabiya::chess::bitboard::Bitboard;
use tabiya::chess::core::{CastleRights, Piece, Player, Square};
use tabiya::chess::fen::{Field, ParseError};
use tabiya::chess::position::Position;

const POSITIONS: [&str; 12] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "2r3r1/p3k3/1p3pp1/1B5p/5P2/2P1p1P1/PP4KP/3R4 w - - 0 34",
    "r2qkb1r/1pp1pp1p/p1np1np1/1B6/3PP1b1/2N1BN2/PPP2PPP/R2QK2R w KQkq - 0 7",
    "r3k3/5p2/2p5/p7/P3r3/2N2n2/1PP2P2/2K2B2 w q - 0 24",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
    "4r2k/8/8/8/8/3n4/8/4K3 w - - 0 1",
    "4k3/8/8/q7/8/8/3B4/4K3 w - - 0 1",
];

fn reference(fen: &str) -> Chess {
    let setup: shakmaty::fen::Fen = fen.parse().unwrap();
    setup.into_position(CastlingMode::Standard).unwrap()
}

fn color(player: Player) -> Color {
    match player {
        Player::White => Color::White,
        Player::Black => Color::Black,
    }
}

fn shakmaty_square(square: Square) -> shakmaty::Square {
    shakmaty::Square::new(u32::from(square.index()))
}

#[test]
fn round_trip() {
    for fen in POSITIONS {
        let position = Position::try_from(fen).unwrap();
        assert_eq!(position.to_string(), fen);
        assert_eq!(Position::try_from(position.to_string().as_str()), Ok(position));
    }
}

#[test]
fn derived_state_invariants() {
    for fen in POSITIONS {
        let position = Position::from_fen(fen).unwrap();
        let occupancy = position.occupancy();
        assert_eq!(position.occupied(), occupancy.white.all | occupancy.black.all);
        assert!(!occupancy.white.all.intersects(occupancy.black.all));
        for player in [Player::White, Player::Black] {
            let pieces = position.pieces(player);
            let player_occupancy = occupancy.player(player);
            assert_eq!(player_occupancy.major, pieces.rooks | pieces.queens);
            assert_eq!(player_occupancy.minor, pieces.knights | pieces.bishops);
            assert_eq!(
                player_occupancy.all,
                player_occupancy.major | player_occupancy.minor | pieces.pawns | pieces.king
            );
        }
        if position.is_in_check() {
            assert_eq!(position.checker_count(), position.checkers().count());
            assert!(position.checking_piece().is_some());
        } else {
            assert_eq!(position.checker_count(), 0);
            assert_eq!(position.checking_piece(), None);
        }
        assert_eq!(position.flipped().flipped(), position);
    }
}

#[test]
fn attacks_match_reference() {
    for fen in POSITIONS {
        let position = Position::from_fen(fen).unwrap();
        let reference = reference(fen);
        let board = reference.board();
        for square in Square::iter() {
            for player in [Player::White, Player::Black] {
                let attackers =
                    board.attacks_to(shakmaty_square(square), color(player), board.occupied());
                assert_eq!(
                    position.is_square_attacked(square, player),
                    attackers.any(),
                    "{fen}: {square} attacked by {player:?}"
                );
            }
        }
    }
}

#[test]
fn checkers_match_reference() {
    for fen in POSITIONS {
        let position = Position::from_fen(fen).unwrap();
        let reference = reference(fen);
        assert_eq!(
            position.checkers().bits(),
            u64::from(reference.checkers()),
            "{fen}"
        );
        assert_eq!(position.is_in_check(), reference.is_check(), "{fen}");
    }
}

#[test]
fn king_danger_matches_reference() {
    for fen in POSITIONS {
        let position = Position::from_fen(fen).unwrap();
        let reference = reference(fen);
        let board = reference.board();
        let us = position.side_to_move();
        let king = shakmaty::Bitboard(position.pieces(us).king.bits());
        let occupied = board.occupied() ^ king;
        for square in Square::iter() {
            let attackers =
                board.attacks_to(shakmaty_square(square), color(us.opponent()), occupied);
            assert_eq!(
                position.king_danger_squares().contains(square),
                attackers.any(),
                "{fen}: {square}"
            );
        }
        assert_eq!(
            position.king_danger_squares(),
            attacks::king_danger_squares(us, &position)
        );
    }
}

#[test]
fn starting_position() {
    let position = Position::starting();
    assert_eq!(position.occupancy().white.all.count(), 16);
    assert_eq!(position.occupancy().black.all.count(), 16);
    assert_eq!(position.occupied().count(), 32);
    assert!(!position.is_in_check());
    assert_eq!(position.castling(), CastleRights::ALL);
    assert!(position.en_passant_target().is_empty());
    assert!(position.en_passant_capture().is_empty());
    // Every square on the third rank is covered by white pawns or pieces.
    for square in [Square::A3, Square::D3, Square::H3] {
        assert!(position.is_square_attacked(square, Player::White));
        assert!(!position.is_square_attacked(square, Player::Black));
    }
}

#[test]
fn en_passant_after_double_push() {
    let position =
        Position::try_from("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2")
            .unwrap();
    assert_eq!(position.en_passant_target(), Bitboard::from(Square::E6));
    assert_eq!(position.en_passant_capture(), Bitboard::from(Square::E5));
    assert!(position
        .board()
        .bitboard(Piece::try_from('p').unwrap())
        .contains(Square::E5));
    let flipped = position.flipped();
    assert_eq!(flipped.en_passant(), None);
    assert_eq!(Position::try_from(flipped.to_string().as_str()), Ok(flipped));
}

#[test]
fn double_check() {
    let position = Position::try_from("4r2k/8/8/8/8/3n4/8/4K3 w - - 0 1").unwrap();
    assert_eq!(position.checker_count(), 2);
    assert_eq!(
        position.checkers(),
        Bitboard::from_squares(&[Square::D3, Square::E8])
    );
    assert_eq!(position.checking_piece(), Some(Piece::try_from('n').unwrap()));
}

#[test]
fn attacks_of_all() {
    let position = Position::try_from("4k3/8/8/3n4/8/8/8/4K3 b - - 0 1").unwrap();
    let expected = Bitboard::from_squares(&[
        // White king.
        Square::D1,
        Square::F1,
        Square::D2,
        Square::E2,
        Square::F2,
        // Black knight.
        Square::C3,
        Square::E3,
        Square::B4,
        Square::F4,
        Square::B6,
        Square::F6,
        Square::C7,
        Square::E7,
        // Black king.
        Square::D7,
        Square::F7,
        Square::D8,
        Square::F8,
    ]);
    assert_eq!(attacks::attacks_of(AttackerSpec::All, &position), expected);
    for square in Square::iter() {
        assert_eq!(
            position.is_square_attacked(square, AttackerSpec::All),
            expected.contains(square),
            "{square}"
        );
    }
}

#[test]
fn rejected_inputs() {
    assert_eq!(Position::try_from(""), Err(ParseError::FieldCount(1)));
    assert!(matches!(
        Position::try_from("4k3/8/8/8/8/8/8/8 w - - 0 1"),
        Err(ParseError::InvalidPlacement(_))
    ));
    assert!(matches!(
        Position::try_from("1kkk4/8/8/8/8/8/8/1KKK4 w - - 0 1"),
        Err(ParseError::InvalidPlacement(_))
    ));
    assert!(matches!(
        Position::try_from("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e3 0 1"),
        Err(ParseError::InvalidField {
            field: Field::EnPassant,
            ..
        })
    ));
    assert!(matches!(
        Position::try_from("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkqK - 0 1"),
        Err(ParseError::InvalidField {
            field: Field::Castling,
            ..
        })
    ));
}
