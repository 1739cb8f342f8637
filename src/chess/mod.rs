//! Bitboard chess position core: board representation, FEN decoding and the
//! derived state move generators rely on.

pub mod attacks;
pub mod bitboard;
pub mod core;
pub mod fen;
pub mod movegen;
pub mod position;
