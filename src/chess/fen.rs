//! [Forsyth-Edwards Notation] decoder.
//!
//! Decoding is done in two stages: the input is split into exactly six
//! space-separated fields and then each field is handed to its own parser. Any
//! problem is reported as a [`ParseError`] naming the offending field, nothing
//! is built from a malformed input.
//!
//! [Forsyth-Edwards Notation]: https://www.chessprogramming.org/Forsyth-Edwards_Notation

use std::fmt;

use itertools::Itertools;

use crate::chess::bitboard::Board;
use crate::chess::core::{CastleRights, File, Piece, Player, Rank, Square, BOARD_WIDTH};
use crate::chess::position::EnPassant;

/// Fields of a FEN string, in the order they appear.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Placement,
    SideToMove,
    Castling,
    EnPassant,
    HalfmoveClock,
    FullmoveNumber,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Placement => "piece placement",
            Self::SideToMove => "side to move",
            Self::Castling => "castling rights",
            Self::EnPassant => "en passant square",
            Self::HalfmoveClock => "halfmove clock",
            Self::FullmoveNumber => "fullmove number",
        })
    }
}

/// Reasons a FEN string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The input does not consist of exactly six space-separated fields.
    #[error("FEN should have exactly 6 space-separated fields, got {0}")]
    FieldCount(usize),
    /// The first field does not describe a board with one king per side.
    #[error("invalid piece placement: {0}")]
    InvalidPlacement(String),
    #[allow(missing_docs)]
    #[error("invalid {field}: {reason}")]
    InvalidField { field: Field, reason: String },
}

impl ParseError {
    fn field(field: Field, reason: impl fmt::Display) -> Self {
        Self::InvalidField {
            field,
            reason: reason.to_string(),
        }
    }

    fn placement(reason: impl fmt::Display) -> Self {
        Self::InvalidPlacement(reason.to_string())
    }
}

/// Values of all six fields, validated but without any derived state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) struct Fields {
    pub(super) board: Board,
    pub(super) side_to_move: Player,
    pub(super) castling: CastleRights,
    pub(super) en_passant: Option<EnPassant>,
    pub(super) halfmove_clock: u8,
    pub(super) fullmove_number: u16,
}

/// Splits `input` into fields and parses each of them. The input is expected
/// to be clean: no leading or trailing whitespace, single spaces between the
/// fields.
pub(super) fn parse(input: &str) -> Result<Fields, ParseError> {
    parse_fields(input).inspect_err(|error| log::debug!("rejected FEN \"{input}\": {error}"))
}

fn parse_fields(input: &str) -> Result<Fields, ParseError> {
    let Some((placement, side_to_move, castling, en_passant, halfmove_clock, fullmove_number)) =
        input.split(' ').collect_tuple()
    else {
        return Err(ParseError::FieldCount(input.split(' ').count()));
    };
    let board = parse_placement(placement)?;
    let side_to_move = parse_side_to_move(side_to_move)?;
    Ok(Fields {
        board,
        side_to_move,
        castling: CastleRights::try_from(castling)
            .map_err(|e| ParseError::field(Field::Castling, e))?,
        en_passant: parse_en_passant(en_passant, side_to_move)?,
        halfmove_clock: parse_number(halfmove_clock, Field::HalfmoveClock)?,
        fullmove_number: parse_number(fullmove_number, Field::FullmoveNumber)?,
    })
}

/// Walks the ranks from the 8th down to the 1st, placing pieces at the cursor
/// and skipping the squares for digits.
fn parse_placement(placement: &str) -> Result<Board, ParseError> {
    let mut board = Board::empty();
    let mut ranks_read = 0;
    for rank_fen in placement.split('/') {
        if ranks_read == BOARD_WIDTH {
            return Err(ParseError::placement(format!(
                "expected {BOARD_WIDTH} ranks, got more in \"{placement}\""
            )));
        }
        let rank = Rank::try_from(BOARD_WIDTH - 1 - ranks_read).map_err(ParseError::placement)?;
        let mut file = 0;
        for symbol in rank_fen.chars() {
            if file >= BOARD_WIDTH {
                return Err(ParseError::placement(format!(
                    "rank {rank} is longer than {BOARD_WIDTH} squares: \"{rank_fen}\""
                )));
            }
            if matches!(symbol, '1'..='8') {
                file += symbol as u8 - b'0';
                continue;
            }
            let piece = Piece::try_from(symbol).map_err(ParseError::placement)?;
            let square = Square::new(File::try_from(file).map_err(ParseError::placement)?, rank);
            board = board.with_piece(piece, square);
            file += 1;
        }
        if file != BOARD_WIDTH {
            return Err(ParseError::placement(format!(
                "rank {rank} should have exactly {BOARD_WIDTH} squares, got {file}: \"{rank_fen}\""
            )));
        }
        ranks_read += 1;
    }
    if ranks_read != BOARD_WIDTH {
        return Err(ParseError::placement(format!(
            "expected {BOARD_WIDTH} ranks, got {ranks_read} in \"{placement}\""
        )));
    }
    for player in [Player::White, Player::Black] {
        let kings = board.player_pieces(player).king.count();
        if kings != 1 {
            return Err(ParseError::placement(format!(
                "{player:?} should have exactly one king, got {kings}"
            )));
        }
    }
    Ok(board)
}

fn parse_side_to_move(input: &str) -> Result<Player, ParseError> {
    Player::try_from(input).map_err(|e| ParseError::field(Field::SideToMove, e))
}

fn parse_en_passant(input: &str, side_to_move: Player) -> Result<Option<EnPassant>, ParseError> {
    if input == "-" {
        return Ok(None);
    }
    let target = Square::try_from(input).map_err(|e| ParseError::field(Field::EnPassant, e))?;
    match EnPassant::new(target, side_to_move) {
        Some(en_passant) => Ok(Some(en_passant)),
        None => Err(ParseError::field(
            Field::EnPassant,
            format!(
                "with {side_to_move} to move the square should be on rank {}, got {target}",
                Rank::en_passant(side_to_move)
            ),
        )),
    }
}

fn parse_number<T: std::str::FromStr>(input: &str, field: Field) -> Result<T, ParseError>
where
    T::Err: fmt::Display,
{
    if input.is_empty() || !input.bytes().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::field(
            field,
            format!("expected ASCII digits, got \"{input}\""),
        ));
    }
    input
        .parse::<T>()
        .map_err(|e| ParseError::field(field, format!("\"{input}\": {e}")))
}
