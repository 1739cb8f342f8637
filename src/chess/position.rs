//! Provides fully-specified [Chess Position] implementation: stores information
//! about the board and tracks the state of castling, 50-move rule draw, etc.
//!
//! Every [`Position`] carries the derived state a move generator needs
//! (occupancy, check and pin information). It is computed once, when the
//! position is constructed, and never goes stale: there are no setters and
//! every change of the position is a full rebuild.
//!
//! [Chess Position]: https://www.chessprogramming.org/Chess_Position

use std::fmt;

use crate::chess::attacks::{self, AttackerSpec, Blockers, CheckInfo};
use crate::chess::bitboard::{Bitboard, Board, Occupancy, Pieces};
use crate::chess::core::{CastleRights, Piece, PieceKind, Player, Rank, Square};
use crate::chess::fen::{self, ParseError};
use crate::chess::movegen::MoveGenerator;

/// [En passant] capture opportunity: the square the capturing pawn moves to
/// and the square of the pawn that has just been double-pushed.
///
/// [En passant]: https://www.chessprogramming.org/En_passant
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnPassant {
    /// The square skipped by the double-pushed pawn.
    pub target: Square,
    /// The square of the pawn that can be captured.
    pub capture: Square,
}

impl EnPassant {
    /// Returns [`None`] if `target` is not on the rank an en passant capture
    /// by `side_to_move` lands on.
    #[must_use]
    pub fn new(target: Square, side_to_move: Player) -> Option<Self> {
        if target.rank() != Rank::en_passant(side_to_move) {
            return None;
        }
        // The pushed pawn is one rank further from the capturing side.
        let capture = target.offset(0, -side_to_move.pawn_push())?;
        Some(Self { target, capture })
    }
}

/// State of the chess game: board, half-move counters and castling rights,
/// etc. It has 1:1 relationship with [Forsyth-Edwards Notation] (FEN).
///
/// [`Position::try_from()`] provides a convenient interface for creating a
/// [`Position`]. It will clean up the input (trim newlines and whitespace) and
/// strip the optional "fen" prefix.
///
/// Positions are small plain values: workers that need a position of their own
/// simply copy it.
///
/// [Forsyth-Edwards Notation]: https://www.chessprogramming.org/Forsyth-Edwards_Notation
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    board: Board,
    side_to_move: Player,
    castling: CastleRights,
    en_passant: Option<EnPassant>,
    /// [Halfmove Clock][^ply] keeps track of the number of (half-)moves
    /// since the last capture or pawn move and is used to enforce
    /// fifty[^fifty]-move draw rule.
    ///
    ///
    /// [Halfmove Clock]: https://www.chessprogramming.org/Halfmove_Clock
    /// [^ply]: "Half-move" or ["ply"](https://www.chessprogramming.org/Ply) means a move of only
    ///     one side.
    /// [^fifty]: 50 __full__ moves
    halfmove_clock: u8,
    fullmove_number: u16,
    occupancy: Occupancy,
    check: CheckInfo,
    blockers: Blockers,
}

impl Position {
    /// Creates the starting position of the standard chess variant.
    ///
    /// ```
    /// use tabiya::chess::position::Position;
    ///
    /// let starting_position = Position::starting();
    /// assert_eq!(
    ///     &starting_position.to_string(),
    ///     "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    /// );
    /// ```
    #[must_use]
    pub fn starting() -> Self {
        Self::new(Board::starting(), Player::White, CastleRights::ALL, None, 0, 1)
    }

    /// Assembles the position and runs the derived state pipeline: occupancy,
    /// then check information, then blockers. Each stage only reads what the
    /// previous ones produced.
    pub(super) fn new(
        board: Board,
        side_to_move: Player,
        castling: CastleRights,
        en_passant: Option<EnPassant>,
        halfmove_clock: u8,
        fullmove_number: u16,
    ) -> Self {
        let occupancy = Occupancy::new(&board);
        let check = CheckInfo::new(&board, &occupancy, side_to_move);
        let blockers = Blockers::new(&board, &occupancy, side_to_move);
        log::trace!(
            "derived state for {board}: in check: {}, checkers: {}, blockers: {}",
            check.in_check,
            check.checker_count,
            blockers.all.count()
        );
        Self {
            board,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
            occupancy,
            check,
            blockers,
        }
    }

    /// Parses board from Forsyth-Edwards Notation and checks its correctness.
    /// The parser is quite lenient in terms of the position legality: it only
    /// requires exactly one king per side and an en passant square on the
    /// right rank.
    ///
    /// FEN ::=
    ///       Piece Placement
    ///   ' ' Side to move
    ///   ' ' Castling ability
    ///   ' ' En passant target square
    ///   ' ' Halfmove clock
    ///   ' ' Fullmove counter
    ///
    /// The last two parts are mandatory, EPD-style trimmed FEN lines are
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the input has a wrong number of fields or
    /// any of the fields is malformed.
    pub fn from_fen(input: &str) -> Result<Self, ParseError> {
        let fields = fen::parse(input)?;
        Ok(Self::new(
            fields.board,
            fields.side_to_move,
            fields.castling,
            fields.en_passant,
            fields.halfmove_clock,
            fields.fullmove_number,
        ))
    }

    /// Piece placement.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Pieces of given player.
    #[must_use]
    pub const fn pieces(&self, player: Player) -> &Pieces {
        self.board.player_pieces(player)
    }

    /// Occupied squares per player and in total.
    #[must_use]
    pub const fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    /// Squares occupied by either player.
    #[must_use]
    pub const fn occupied(&self) -> Bitboard {
        self.occupancy.all
    }

    /// Player whose turn it is.
    #[must_use]
    pub const fn side_to_move(&self) -> Player {
        self.side_to_move
    }

    /// Castling rights of both players.
    #[must_use]
    pub const fn castling(&self) -> CastleRights {
        self.castling
    }

    /// En passant target and capture squares, if a capture is possible.
    #[must_use]
    pub const fn en_passant(&self) -> Option<EnPassant> {
        self.en_passant
    }

    /// Single-square set with the en passant target or an empty set.
    #[must_use]
    pub fn en_passant_target(&self) -> Bitboard {
        self.en_passant.map(|en_passant| en_passant.target).into()
    }

    /// Single-square set with the pawn capturable en passant or an empty set.
    #[must_use]
    pub fn en_passant_capture(&self) -> Bitboard {
        self.en_passant.map(|en_passant| en_passant.capture).into()
    }

    /// Plies since the last capture or pawn move.
    #[must_use]
    pub const fn halfmove_clock(&self) -> u8 {
        self.halfmove_clock
    }

    /// Starts at 1 and is incremented after Black's move.
    #[must_use]
    pub const fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    /// Checkers and king danger squares of the side to move.
    #[must_use]
    pub const fn check_info(&self) -> &CheckInfo {
        &self.check
    }

    /// Squares of the opponent pieces giving check.
    #[must_use]
    pub const fn checkers(&self) -> Bitboard {
        self.check.checkers
    }

    /// Number of pieces giving check to the side to move.
    #[must_use]
    pub const fn checker_count(&self) -> u32 {
        self.check.checker_count
    }

    /// See [`CheckInfo::checking_piece`] for the double check caveat.
    #[must_use]
    pub const fn checking_piece(&self) -> Option<Piece> {
        self.check.checking_piece
    }

    /// Squares attacked by the opponent with our king removed: the king can
    /// not move there.
    #[must_use]
    pub const fn king_danger_squares(&self) -> Bitboard {
        self.check.king_danger_squares
    }

    /// Both players' pieces standing alone between an opponent slider and our
    /// king.
    #[must_use]
    pub const fn blockers(&self) -> Bitboard {
        self.blockers.all
    }

    /// Pieces standing alone between the white king and an enemy slider.
    #[must_use]
    pub const fn white_blockers(&self) -> Bitboard {
        self.blockers.white
    }

    /// Pieces standing alone between the black king and an enemy slider.
    #[must_use]
    pub const fn black_blockers(&self) -> Bitboard {
        self.blockers.black
    }

    /// Checks whether any of the pieces selected by `attackers` attacks
    /// `square`.
    #[must_use]
    pub fn is_square_attacked(&self, square: Square, attackers: impl Into<AttackerSpec>) -> bool {
        attacks::attacks_of(attackers.into(), self).contains(square)
    }

    /// Our king is on an opponent slider's line, behind a single piece.
    #[must_use]
    pub fn is_king_xrayed(&self) -> bool {
        attacks::xray_attacks(self).intersects(self.pieces(self.side_to_move).king)
    }

    /// At least one of our pieces is pinned to our king.
    #[must_use]
    pub const fn is_own_piece_pinned(&self) -> bool {
        self.occupancy
            .player(self.side_to_move)
            .all
            .intersects(self.blockers.all)
    }

    /// At least one opponent piece shields our king from an opponent slider:
    /// moving it away would give a discovered check.
    #[must_use]
    pub const fn has_discovery_candidate(&self) -> bool {
        self.occupancy
            .player(self.side_to_move.opponent())
            .all
            .intersects(self.blockers.all)
    }

    /// Whether the king of the side to move is attacked.
    #[must_use]
    pub const fn is_in_check(&self) -> bool {
        self.check.in_check
    }

    /// Delegates to `generator` which receives this position as context.
    pub fn legal_moves<G: MoveGenerator>(&self, generator: &G) -> Vec<G::Move> {
        generator.legal_moves(self)
    }

    /// Delegates to `generator` for the moves of pieces of given kind.
    pub fn moves_for<G: MoveGenerator>(&self, kind: PieceKind, generator: &G) -> Vec<G::Move> {
        generator.moves_for(kind, self)
    }

    /// Returns the position with the board mirrored vertically (see
    /// [`Board::flip`]) and the derived state computed for the new board.
    /// Piece colors, side to move, castling rights and clocks are carried
    /// over. The mirrored en passant target lands on the rank of the side
    /// to move's own pawns, so en passant rights are dropped.
    #[must_use]
    pub fn flipped(&self) -> Self {
        let en_passant = self
            .en_passant
            .and_then(|en_passant| EnPassant::new(en_passant.target.flip(), self.side_to_move));
        Self::new(
            self.board.flip(),
            self.side_to_move,
            self.castling,
            en_passant,
            self.halfmove_clock,
            self.fullmove_number,
        )
    }
}

impl TryFrom<&str> for Position {
    type Error = ParseError;

    /// Trims the surrounding whitespace and an optional "fen " prefix before
    /// parsing the input with [`Position::from_fen`].
    fn try_from(input: &str) -> Result<Self, ParseError> {
        let input = input.trim();
        Self::from_fen(input.strip_prefix("fen ").unwrap_or(input))
    }
}

impl fmt::Display for Position {
    /// Prints board in Forsyth-Edwards Notation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", &self.board)?;
        write!(f, "{} ", &self.side_to_move)?;
        write!(f, "{} ", &self.castling)?;
        match self.en_passant {
            Some(en_passant) => write!(f, "{} ", en_passant.target),
            None => write!(f, "- "),
        }?;
        write!(f, "{} ", &self.halfmove_clock)?;
        write!(f, "{}", &self.fullmove_number)?;
        Ok(())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:?}", &self.board)?;
        writeln!(f, "Player to move: {:?}", &self.side_to_move)?;
        writeln!(f, "Fullmove number: {}", &self.fullmove_number)?;
        writeln!(f, "Halfmove clock: {}", &self.halfmove_clock)?;
        writeln!(f, "En Passant: {:?}", &self.en_passant)?;
        // bitflags' default fmt::Debug implementation is not very convenient:
        // dump FEN instead.
        writeln!(f, "Castling rights: {}", &self.castling)?;
        writeln!(f, "In check: {}", self.check.in_check)?;
        let checkers = self.check.checkers.iter().map(|square| square.to_string());
        writeln!(f, "Checkers: {}", itertools::join(checkers, " "))?;
        let blockers = self.blockers.all.iter().map(|square| square.to_string());
        writeln!(f, "Blockers: {}", itertools::join(blockers, " "))?;
        writeln!(f, "FEN: {self}")?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    fn setup(fen: &str) -> Position {
        let position = Position::try_from(fen);
        assert!(position.is_ok(), "input: {fen}");
        let position = position.unwrap();
        assert_eq!(position.to_string(), fen);
        position
    }

    fn assert_invariants(position: &Position) {
        let occupancy = position.occupancy();
        assert_eq!(position.occupied(), occupancy.white.all | occupancy.black.all);
        assert!(!occupancy.white.all.intersects(occupancy.black.all));
        let union = position
            .board()
            .piece_boards()
            .fold(Bitboard::empty(), |all, piece_board| all | piece_board.bitboard);
        assert_eq!(position.occupied(), union);
        if position.is_in_check() {
            assert_eq!(position.checker_count(), position.checkers().count());
        } else {
            assert_eq!(position.checker_count(), 0);
            assert!(position.checkers().is_empty());
        }
        assert!(position.en_passant_target().count() <= 1);
        assert!(position.en_passant_capture().count() <= 1);
        assert_eq!(
            position.blockers(),
            position.white_blockers() | position.black_blockers()
        );
    }

    #[test]
    fn correct_fen() {
        for fen in [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "2r3r1/p3k3/1p3pp1/1B5p/5P2/2P1p1P1/PP4KP/3R4 w - - 0 34",
            "rnbqk1nr/p3bppp/1p2p3/2ppP3/3P4/P7/1PP1NPPP/R1BQKBNR w KQkq c6 0 7",
            "r2qkb1r/1pp1pp1p/p1np1np1/1B6/3PP1b1/2N1BN2/PPP2PPP/R2QK2R w KQkq - 0 7",
            "r3k3/5p2/2p5/p7/P3r3/2N2n2/1PP2P2/2K2B2 w q - 0 24",
            "r1b1qrk1/ppp2pbp/n2p1np1/4p1B1/2PPP3/2NB1N1P/PP3PP1/R2QK2R w KQ e6 0 9",
            "8/8/8/8/2P5/3k4/8/KB6 b - c3 0 1",
            "rnbq1rk1/pp4pp/1b1ppn2/2p2p2/2PP4/1P2PN2/PB2BPPP/RN1Q1RK1 w - c6 0 9",
        ] {
            assert_invariants(&setup(fen));
        }
    }

    #[test]
    fn starting_position() {
        let position = Position::starting();
        assert_eq!(position, setup("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"));
        assert_eq!(position.occupancy().white.all.count(), 16);
        assert_eq!(position.occupancy().black.all.count(), 16);
        assert_eq!(position.occupied().count(), 32);
        assert!(!position.is_in_check());
        assert_eq!(position.checker_count(), 0);
        assert_eq!(position.checking_piece(), None);
        assert_eq!(position.castling(), CastleRights::ALL);
        assert_eq!(position.en_passant(), None);
        assert!(position.en_passant_target().is_empty());
        assert!(position.blockers().is_empty());
        assert!(!position.is_king_xrayed());
        assert!(!position.is_own_piece_pinned());
        assert!(!position.has_discovery_candidate());
        assert_invariants(&position);
    }

    #[test]
    fn clean_board_str() {
        assert!(Position::try_from(
            "fen rn1qkb1r/pp3ppp/2p1pn2/3p1b2/2PP4/5NP1/PP2PPBP/RNBQK2R w KQkq - 0 1"
        )
        .is_ok());
        assert!(Position::try_from(
            "\n rnbqkbnr/pp2pppp/8/3p4/3P4/3B4/PPP2PPP/RNBQK1NR b KQkq - 0 1\n"
        )
        .is_ok());
        // EPD lines lack the clocks.
        assert_eq!(
            Position::try_from("rnbqkbnr/pp2pppp/8/3p4/3P4/3B4/PPP2PPP/RNBQK1NR b KQkq -"),
            Err(ParseError::FieldCount(4))
        );
        // Whitespace is only cleaned up by try_from.
        assert!(Position::from_fen(
            "rnbqkbnr/pp2pppp/8/3p4/3P4/3B4/PPP2PPP/RNBQK1NR b KQkq - 0 1\n"
        )
        .is_err());
        assert!(Position::try_from("fen3kn3/R2p1N2/8/8/7B/6K1/3R4/8 b - - 0 23").is_err());
        assert!(Position::try_from("8/8/8/8/8/8/8/8 b 88 🔠 🔠 ").is_err());
        assert!(Position::try_from("3kn3/R4N2/8/8/7B/6K1/3R4/8 b - - 0 48 b - - 0 4/8 b").is_err());
    }

    #[test]
    fn en_passant() {
        let position = setup("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2");
        assert_eq!(
            position.en_passant(),
            Some(EnPassant {
                target: Square::E6,
                capture: Square::E5,
            })
        );
        assert_eq!(position.en_passant_target(), Bitboard::from(Square::E6));
        assert_eq!(position.en_passant_capture(), Bitboard::from(Square::E5));
        assert_eq!(EnPassant::new(Square::E3, Player::White), None);
        assert_eq!(
            EnPassant::new(Square::A3, Player::Black),
            Some(EnPassant {
                target: Square::A3,
                capture: Square::A4,
            })
        );
    }

    #[test]
    fn single_check() {
        let position = setup("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert!(position.is_in_check());
        assert_eq!(position.checkers(), Bitboard::from(Square::H4));
        assert_eq!(position.checker_count(), 1);
        assert_eq!(position.checking_piece(), Some(Piece::try_from('q').unwrap()));
        // The king can not step onto the checking diagonal.
        assert!(position.king_danger_squares().contains(Square::F2));
        assert_invariants(&position);
    }

    #[test]
    fn double_check() {
        // Rook on e8 and knight on d3 both check the white king.
        let position = setup("4r2k/8/8/8/8/3n4/8/4K3 w - - 0 1");
        assert!(position.is_in_check());
        assert_eq!(
            position.checkers(),
            Bitboard::from_squares(&[Square::E8, Square::D3])
        );
        assert_eq!(position.checker_count(), 2);
        // Only the last kind in the piece table order is recorded.
        assert_eq!(position.checking_piece(), Some(Piece::try_from('n').unwrap()));
        assert_invariants(&position);
    }

    #[test]
    fn pins() {
        // The bishop on d2 is pinned by the queen on a5.
        let position = setup("4k3/8/8/q7/8/8/3B4/4K3 w - - 0 1");
        assert_eq!(position.white_blockers(), Bitboard::from(Square::D2));
        assert!(position.black_blockers().is_empty());
        assert!(position.is_own_piece_pinned());
        assert!(!position.has_discovery_candidate());
        assert!(position.is_king_xrayed());
        assert!(!position.is_in_check());
    }

    #[test]
    fn discovery_candidates() {
        // Black knight on e4 shields the white king from the rook on e8.
        let position = setup("4r2k/8/8/8/4n3/8/8/4K3 w - - 0 1");
        assert_eq!(position.black_blockers(), Bitboard::from(Square::E4));
        assert!(position.has_discovery_candidate());
        assert!(!position.is_own_piece_pinned());
        assert!(position.is_king_xrayed());
        // Two pieces on the line: neither of them is a blocker.
        let position = setup("4r2k/8/8/4P3/4n3/8/8/4K3 w - - 0 1");
        assert!(position.blockers().is_empty());
        assert!(!position.is_king_xrayed());
    }

    #[test]
    fn square_attacks() {
        let position = setup("4k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
        let white_rook = Piece::try_from('R').unwrap();
        assert!(position.is_square_attacked(Square::A8, white_rook));
        assert!(position.is_square_attacked(Square::D1, white_rook));
        assert!(!position.is_square_attacked(Square::F1, white_rook));
        assert!(position.is_square_attacked(Square::F1, Player::White));
        assert!(position.is_square_attacked(Square::D7, Player::Black));
        assert!(!position.is_square_attacked(Square::D7, Player::White));
        let expected = attacks::rook_attacks(Square::A1, position.occupied())
            | attacks::king_attacks(Square::E1)
            | attacks::king_attacks(Square::E8);
        for square in Square::iter() {
            assert_eq!(
                position.is_square_attacked(square, AttackerSpec::All),
                expected.contains(square),
                "{square}"
            );
        }
    }

    #[test]
    fn flip() {
        let position = setup("r3k2r/pp1n1ppp/2p5/3pP3/8/2N5/PPP2PPP/R3K2R w KQkq d6 0 12");
        let flipped = position.flipped();
        assert_eq!(
            flipped.to_string(),
            "R3K2R/PPP2PPP/2N5/8/3pP3/2p5/pp1n1ppp/r3k2r w KQkq - 0 12"
        );
        assert_eq!(flipped.en_passant(), None);
        assert_eq!(flipped.en_passant_capture(), Bitboard::empty());
        assert_eq!(flipped.occupied(), position.occupied().flip());
        assert_invariants(&flipped);
        assert_eq!(Position::try_from(flipped.to_string().as_str()), Ok(flipped));
        assert_eq!(flipped.flipped().board(), position.board());
        assert_eq!(flipped.flipped().en_passant(), None);
        for piece in Piece::ALL {
            assert_eq!(
                flipped.board().bitboard(piece),
                position.board().bitboard(piece).flip()
            );
        }
    }

    #[test]
    fn generator_seam() {
        // Steps the king to the squares the opponent does not attack.
        struct KingSteps;

        impl MoveGenerator for KingSteps {
            type Move = (Square, Square);

            fn legal_moves(&self, position: &Position) -> Vec<Self::Move> {
                self.moves_for(PieceKind::King, position)
            }

            fn moves_for(&self, kind: PieceKind, position: &Position) -> Vec<Self::Move> {
                if kind != PieceKind::King {
                    return vec![];
                }
                let us = position.side_to_move();
                let king = position.pieces(us).king.as_square();
                let targets = attacks::king_attacks(king)
                    - position.occupancy().player(us).all
                    - position.king_danger_squares();
                targets.iter().map(|to| (king, to)).collect()
            }
        }

        let position = setup("4r2k/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(
            position.legal_moves(&KingSteps),
            vec![
                (Square::E1, Square::D1),
                (Square::E1, Square::F1),
                (Square::E1, Square::D2),
                (Square::E1, Square::F2),
            ]
        );
        assert!(position.moves_for(PieceKind::Pawn, &KingSteps).is_empty());
    }

    #[test]
    fn debug_dump() {
        let position = setup("4r2k/8/8/8/8/3n4/8/4K3 w - - 0 1");
        assert_eq!(
            format!("{position:?}"),
            ". . . . r . . k\n\
             . . . . . . . .\n\
             . . . . . . . .\n\
             . . . . . . . .\n\
             . . . . . . . .\n\
             . . . n . . . .\n\
             . . . . . . . .\n\
             . . . . K . . .\n\
             Player to move: White\n\
             Fullmove number: 1\n\
             Halfmove clock: 0\n\
             En Passant: None\n\
             Castling rights: -\n\
             In check: true\n\
             Checkers: d3 e8\n\
             Blockers: \n\
             FEN: 4r2k/8/8/8/8/3n4/8/4K3 w - - 0 1\n"
        );
    }
}
