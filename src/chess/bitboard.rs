//! [`Bitboard`]-based representation for [`crate::chess::position::Position`].
//! Bitboard utilizes the fact that modern processors operate on 64 bit
//! integers, and the bit operations can be performed simultaneously. This
//! results in very efficient calculation of possible attack vectors and other
//! meaningful features that are calculated to evaluate a position on the board.
//! The disadvantage is complexity that comes with bitboard implementation and
//! inefficiency of some operations like "get piece type on given square"
//! (efficiently handled by Square-centric board implementations).
//!
//! [Bitboard]: https://www.chessprogramming.org/Bitboards

use std::fmt::{self, Write};
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, Not, Sub};

use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::chess::core::{
    File,
    Piece,
    PieceKind,
    Player,
    Rank,
    Square,
    BOARD_SIZE,
};

/// Represents a set of squares and provides common operations (e.g. AND, OR,
/// XOR) over these sets. Each bit corresponds to one of 64 squares of the chess
/// board.
///
/// Mirroring [`Square`] semantics, the least significant
/// bit corresponds to A1, and the most significant bit - to H8.
///
/// Bitboard is a thin wrapper around [u64].
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bitboard {
    bits: u64,
}

impl Bitboard {
    /// Constructs Bitboard from pre-calculated bits.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self { bits }
    }

    /// Constructs a bitboard representing empty set of squares.
    #[must_use]
    pub const fn empty() -> Self {
        Self::from_bits(0)
    }

    /// Returns raw bits.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.bits
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn from_squares(squares: &[Square]) -> Self {
        let mut result = Self::empty();
        for square in squares {
            result |= Self::from(*square);
        }
        result
    }

    /// Returns true if this bitboard contains given square.
    #[must_use]
    pub const fn contains(self, square: Square) -> bool {
        (self.bits & (1u64 << square as u8)) != 0
    }

    /// Returns a copy with the bit of `square` set to `value`.
    #[must_use]
    pub const fn with(self, square: Square, value: bool) -> Self {
        let bit = 1u64 << square as u8;
        if value {
            Self::from_bits(self.bits | bit)
        } else {
            Self::from_bits(self.bits & !bit)
        }
    }

    /// Population count: the number of squares in the set.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.bits.count_ones()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Returns true if the sets have at least one square in common.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.bits & other.bits != 0
    }

    /// Converts a bitboard with exactly one set bit into the [`Square`].
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the bitboard does not contain exactly one
    /// square.
    #[must_use]
    pub fn as_square(self) -> Square {
        debug_assert!(self.count() == 1, "expected a single square, got {self:?}");
        #[allow(clippy::cast_possible_truncation)]
        let index = self.bits.trailing_zeros() as u8;
        Square::try_from(index).unwrap_or(Square::A1)
    }

    /// An efficient way to iterate over the set squares.
    #[must_use]
    pub const fn iter(self) -> BitboardIterator {
        BitboardIterator { bits: self.bits }
    }

    /// Reflects the set vertically: rank 1 becomes rank 8 and vice versa, the
    /// files stay. Each square `s` in the lower half is exchanged with its
    /// mirror `s ^ 56` in the upper half, so 32 swaps cover the whole board.
    #[must_use]
    pub fn flip(self) -> Self {
        let mut result = self;
        for square in Square::iter().take(BOARD_SIZE as usize / 2) {
            let mirror = square.flip();
            result = result
                .with(square, self.contains(mirror))
                .with(mirror, self.contains(square));
        }
        result
    }
}

impl fmt::Debug for Bitboard {
    /// Dumps the set as an 8x8 grid, rank 8 first: '1' for a set square and
    /// '.' for an empty one.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = Rank::iter()
            .rev()
            .map(|rank| {
                File::iter()
                    .map(|file| {
                        if self.contains(Square::new(file, rank)) {
                            '1'
                        } else {
                            '.'
                        }
                    })
                    .join(SQUARE_SEPARATOR)
            })
            .join(LINE_SEPARATOR);
        f.write_str(&grid)
    }
}

impl BitOr for Bitboard {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits.bitor(rhs.bits))
    }
}

impl BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits.bitor_assign(rhs.bits);
    }
}

impl BitAnd for Bitboard {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits.bitand(rhs.bits))
    }
}

impl BitAndAssign for Bitboard {
    fn bitand_assign(&mut self, rhs: Self) {
        self.bits.bitand_assign(rhs.bits);
    }
}

impl BitXor for Bitboard {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits.bitxor(rhs.bits))
    }
}

impl Sub for Bitboard {
    type Output = Self;

    /// [Relative component], i.e. Result = LHS \ RHS.
    ///
    /// [Relative component]: https://en.wikipedia.org/wiki/Complement_%28set_theory%29#Relative_complement
    fn sub(self, rhs: Self) -> Self::Output {
        self & !rhs
    }
}

impl Not for Bitboard {
    type Output = Self;

    /// Returns [complement
    /// set](https://en.wikipedia.org/wiki/Complement_%28set_theory%29) of Self,
    /// i.e. flipping the set squares to unset and vice versa.
    fn not(self) -> Self::Output {
        Self::from_bits(!self.bits)
    }
}

impl From<Square> for Bitboard {
    fn from(square: Square) -> Self {
        Self::from_bits(1u64 << square as u8)
    }
}

impl From<Option<Square>> for Bitboard {
    fn from(square: Option<Square>) -> Self {
        square.map_or_else(Self::empty, Self::from)
    }
}

/// Iterates over set squares in a given [Bitboard] from least significant 1
/// bits (LS1B) to most significant 1 bits (MS1B) through implementing
/// [`BitScan`] forward operation.
///
/// [BitScan]: https://www.chessprogramming.org/BitScan
pub struct BitboardIterator {
    bits: u64,
}

impl Iterator for BitboardIterator {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bits == 0 {
            return None;
        }
        // Get the LS1B and consume it from the iterator.
        let next_index = self.bits.trailing_zeros();
        self.bits &= self.bits - 1;
        #[allow(clippy::cast_possible_truncation)]
        Square::try_from(next_index as u8).ok()
    }
}

/// Piece-centric representation of all material owned by one player. Uses
/// [Bitboard] to store a set of squares occupied by each piece. The main user
/// is [`Board`], [Bitboard] is not very useful on its own.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pieces {
    #[allow(missing_docs)]
    pub king: Bitboard,
    #[allow(missing_docs)]
    pub queens: Bitboard,
    #[allow(missing_docs)]
    pub rooks: Bitboard,
    #[allow(missing_docs)]
    pub bishops: Bitboard,
    #[allow(missing_docs)]
    pub knights: Bitboard,
    #[allow(missing_docs)]
    pub pawns: Bitboard,
}

impl Pieces {
    pub(super) fn empty() -> Self {
        Self::default()
    }

    pub(super) fn new_white() -> Self {
        Self {
            king: Square::E1.into(),
            queens: Square::D1.into(),
            rooks: Bitboard::from_squares(&[Square::A1, Square::H1]),
            bishops: Bitboard::from_squares(&[Square::C1, Square::F1]),
            knights: Bitboard::from_squares(&[Square::B1, Square::G1]),
            pawns: Rank::Two.mask(),
        }
    }

    pub(super) fn new_black() -> Self {
        Self::new_white().flip()
    }

    /// Rooks and queens.
    #[must_use]
    pub fn major(&self) -> Bitboard {
        self.rooks | self.queens
    }

    /// Knights and bishops.
    #[must_use]
    pub fn minor(&self) -> Bitboard {
        self.knights | self.bishops
    }

    /// Every square occupied by this player.
    #[must_use]
    pub fn all(&self) -> Bitboard {
        self.major() | self.minor() | self.pawns | self.king
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn get(&self, kind: PieceKind) -> Bitboard {
        match kind {
            PieceKind::King => self.king,
            PieceKind::Queen => self.queens,
            PieceKind::Rook => self.rooks,
            PieceKind::Bishop => self.bishops,
            PieceKind::Knight => self.knights,
            PieceKind::Pawn => self.pawns,
        }
    }

    pub(super) fn bitboard_for(&mut self, kind: PieceKind) -> &mut Bitboard {
        match kind {
            PieceKind::King => &mut self.king,
            PieceKind::Queen => &mut self.queens,
            PieceKind::Rook => &mut self.rooks,
            PieceKind::Bishop => &mut self.bishops,
            PieceKind::Knight => &mut self.knights,
            PieceKind::Pawn => &mut self.pawns,
        }
    }

    fn flip(&self) -> Self {
        Self {
            king: self.king.flip(),
            queens: self.queens.flip(),
            rooks: self.rooks.flip(),
            bishops: self.bishops.flip(),
            knights: self.knights.flip(),
            pawns: self.pawns.flip(),
        }
    }

    fn at(&self, square: Square) -> Option<PieceKind> {
        PieceKind::iter().find(|&kind| self.get(kind).contains(square))
    }
}

/// Immutable pair of a piece and the squares it occupies.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PieceBoard {
    #[allow(missing_docs)]
    pub piece: Piece,
    #[allow(missing_docs)]
    pub bitboard: Bitboard,
}

/// Piece-centric implementation of the chess board: the set of 12 per-piece
/// bitboards. The bitboards are pairwise disjoint, no square holds two pieces.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Board {
    pub(super) white_pieces: Pieces,
    pub(super) black_pieces: Pieces,
}

impl Board {
    #[allow(missing_docs)]
    #[must_use]
    pub fn starting() -> Self {
        Self {
            white_pieces: Pieces::new_white(),
            black_pieces: Pieces::new_black(),
        }
    }

    /// Constructs an empty Board to be filled by the position decoder.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            white_pieces: Pieces::empty(),
            black_pieces: Pieces::empty(),
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn player_pieces(&self, player: Player) -> &Pieces {
        match player {
            Player::White => &self.white_pieces,
            Player::Black => &self.black_pieces,
        }
    }

    /// Squares occupied by given piece.
    #[must_use]
    pub const fn bitboard(&self, piece: Piece) -> Bitboard {
        self.player_pieces(piece.owner).get(piece.kind)
    }

    /// Returns the [`PieceBoard`] of every piece in [`Piece::ALL`] order.
    pub fn piece_boards(&self) -> impl Iterator<Item = PieceBoard> + '_ {
        Piece::ALL.into_iter().map(|piece| PieceBoard {
            piece,
            bitboard: self.bitboard(piece),
        })
    }

    /// Returns a copy of the board with `piece` put on `square`. The caller is
    /// responsible for checking that the square is vacant.
    #[must_use]
    pub(super) fn with_piece(mut self, piece: Piece, square: Square) -> Self {
        let pieces = match piece.owner {
            Player::White => &mut self.white_pieces,
            Player::Black => &mut self.black_pieces,
        };
        *pieces.bitboard_for(piece.kind) |= Bitboard::from(square);
        self
    }

    /// Reflects every piece bitboard vertically (see [`Bitboard::flip`]).
    /// Colors are not swapped: white pieces stay white.
    #[must_use]
    pub fn flip(&self) -> Self {
        Self {
            white_pieces: self.white_pieces.flip(),
            black_pieces: self.black_pieces.flip(),
        }
    }

    // WARNING: This is slow and inefficient for Bitboard-based piece-centric
    // representation. Use with caution.
    #[allow(missing_docs)]
    #[must_use]
    pub fn at(&self, square: Square) -> Option<Piece> {
        for player in [Player::White, Player::Black] {
            if let Some(kind) = self.player_pieces(player).at(square) {
                return Some(Piece::new(player, kind));
            }
        }
        None
    }
}

impl fmt::Display for Board {
    /// Prints board representation in FEN format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            let mut empty_squares = 0i32;
            for file in File::iter() {
                let square = Square::new(file, rank);
                if let Some(piece) = self.at(square) {
                    if empty_squares != 0 {
                        write!(f, "{empty_squares}")?;
                        empty_squares = 0;
                    }
                    write!(f, "{piece}")?;
                } else {
                    empty_squares += 1;
                }
            }
            if empty_squares != 0 {
                write!(f, "{empty_squares}")?;
            }
            if rank != Rank::One {
                const RANK_SEPARATOR: char = '/';
                write!(f, "{RANK_SEPARATOR}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    /// Dumps the board in a simple format ('.' for empty square, FEN algebraic
    /// symbol for piece) a-la Stockfish "debug" command in UCI mode.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            for file in File::iter() {
                match self.at(Square::new(file, rank)) {
                    Some(piece) => write!(f, "{piece}"),
                    None => f.write_char('.'),
                }?;
                if file != File::H {
                    f.write_str(SQUARE_SEPARATOR)?;
                }
            }
            if rank != Rank::One {
                f.write_str(LINE_SEPARATOR)?;
            }
        }
        Ok(())
    }
}

/// Occupancy of a single player, grouped by piece class.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PlayerOccupancy {
    /// Every square occupied by the player.
    pub all: Bitboard,
    /// Rooks and queens.
    pub major: Bitboard,
    /// Knights and bishops.
    pub minor: Bitboard,
}

/// Combined, per-player and per-class occupancy: the first stage of derived
/// state, a pure function of the [`Board`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Occupancy {
    #[allow(missing_docs)]
    pub white: PlayerOccupancy,
    #[allow(missing_docs)]
    pub black: PlayerOccupancy,
    /// Union of both players' occupancy.
    pub all: Bitboard,
}

impl Occupancy {
    #[allow(missing_docs)]
    #[must_use]
    pub fn new(board: &Board) -> Self {
        let summarize = |pieces: &Pieces| PlayerOccupancy {
            all: pieces.all(),
            major: pieces.major(),
            minor: pieces.minor(),
        };
        let white = summarize(&board.white_pieces);
        let black = summarize(&board.black_pieces);
        debug_assert!(
            !white.all.intersects(black.all),
            "players can not share squares: {board:?}"
        );
        Self {
            white,
            black,
            all: white.all | black.all,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn player(&self, player: Player) -> &PlayerOccupancy {
        match player {
            Player::White => &self.white,
            Player::Black => &self.black,
        }
    }
}

const LINE_SEPARATOR: &str = "\n";
const SQUARE_SEPARATOR: &str = " ";
