//! The seam between the position core and [move generation]. The core does
//! not enumerate moves: a generator receives the whole [`Position`] with its
//! derived state (checkers, king danger squares, blockers) as context and
//! produces moves in its own representation.
//!
//! [move generation]: https://www.chessprogramming.org/Move_Generation

use crate::chess::core::PieceKind;
use crate::chess::position::Position;

/// Produces moves for the side to move of a [`Position`].
pub trait MoveGenerator {
    /// Move record, opaque to the position core.
    type Move;

    /// Moves that do not leave the king of the side to move in check, in the
    /// generator's order.
    fn legal_moves(&self, position: &Position) -> Vec<Self::Move>;

    /// Legal moves of the side to move's pieces of given kind.
    fn moves_for(&self, kind: PieceKind, position: &Position) -> Vec<Self::Move>;
}
