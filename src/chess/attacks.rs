//! Mappings of occupied squares to the attacked squares for each piece and the
//! threat information derived from them: [`CheckInfo`] and [`Blockers`].
//!
//! Leaper (king, knight, pawn) attacks are pre-calculated at compile time.
//! Slider attacks are computed by walking the rays until the first occupied
//! square, which is the reference [classical approach]. The position core only
//! needs a handful of slider queries per decoded position, so the lookup
//! tables of the magic or PEXT families are not worth their size here.
//!
//! [classical approach]: https://www.chessprogramming.org/Classical_Approach

use crate::chess::bitboard::{Bitboard, Board, Occupancy};
use crate::chess::core::{Piece, PieceKind, Player, Square, BOARD_SIZE};
use crate::chess::position::Position;

const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];
const WHITE_PAWN_OFFSETS: [(i8, i8); 2] = [(-1, 1), (1, 1)];
const BLACK_PAWN_OFFSETS: [(i8, i8); 2] = [(-1, -1), (1, -1)];

const fn leaper_attacks(offsets: &[(i8, i8)]) -> [Bitboard; BOARD_SIZE as usize] {
    let mut table = [Bitboard::empty(); BOARD_SIZE as usize];
    let mut index = 0;
    while index < BOARD_SIZE as usize {
        let (file, rank) = ((index % 8) as i8, (index / 8) as i8);
        let mut bits = 0u64;
        let mut i = 0;
        while i < offsets.len() {
            let (target_file, target_rank) = (file + offsets[i].0, rank + offsets[i].1);
            if target_file >= 0 && target_file < 8 && target_rank >= 0 && target_rank < 8 {
                bits |= 1 << ((target_rank * 8 + target_file) as u32);
            }
            i += 1;
        }
        table[index] = Bitboard::from_bits(bits);
        index += 1;
    }
    table
}

const KNIGHT_ATTACKS: [Bitboard; BOARD_SIZE as usize] = leaper_attacks(&KNIGHT_OFFSETS);
const KING_ATTACKS: [Bitboard; BOARD_SIZE as usize] = leaper_attacks(&KING_OFFSETS);
const WHITE_PAWN_ATTACKS: [Bitboard; BOARD_SIZE as usize] = leaper_attacks(&WHITE_PAWN_OFFSETS);
const BLACK_PAWN_ATTACKS: [Bitboard; BOARD_SIZE as usize] = leaper_attacks(&BLACK_PAWN_OFFSETS);

fn sliding_attacks(square: Square, occupancy: Bitboard, directions: &[(i8, i8); 4]) -> Bitboard {
    let mut result = Bitboard::empty();
    for &(d_file, d_rank) in directions {
        let mut current = square.offset(d_file, d_rank);
        while let Some(attacked) = current {
            result |= Bitboard::from(attacked);
            if occupancy.contains(attacked) {
                break;
            }
            current = attacked.offset(d_file, d_rank);
        }
    }
    result
}

/// Squares a king on `square` attacks.
#[must_use]
pub fn king_attacks(square: Square) -> Bitboard {
    KING_ATTACKS[square as usize]
}

/// Squares a knight on `square` attacks.
#[must_use]
pub fn knight_attacks(square: Square) -> Bitboard {
    KNIGHT_ATTACKS[square as usize]
}

/// Squares a pawn of `player` standing on `square` captures on. Pushes are
/// not attacks.
#[must_use]
pub fn pawn_attacks(square: Square, player: Player) -> Bitboard {
    match player {
        Player::White => WHITE_PAWN_ATTACKS[square as usize],
        Player::Black => BLACK_PAWN_ATTACKS[square as usize],
    }
}

/// Diagonal rays from `square`, each ending on the first occupied square.
#[must_use]
pub fn bishop_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    sliding_attacks(square, occupancy, &BISHOP_DIRECTIONS)
}

/// Orthogonal rays from `square`, each ending on the first occupied square.
#[must_use]
pub fn rook_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    sliding_attacks(square, occupancy, &ROOK_DIRECTIONS)
}

/// Union of bishop and rook attacks.
#[must_use]
pub fn queen_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    bishop_attacks(square, occupancy) | rook_attacks(square, occupancy)
}

/// Squares attacked by `piece` standing on `square`, given the board
/// `occupancy` that blocks sliders.
#[must_use]
pub fn piece_attacks(piece: Piece, square: Square, occupancy: Bitboard) -> Bitboard {
    match piece.kind {
        PieceKind::King => king_attacks(square),
        PieceKind::Queen => queen_attacks(square, occupancy),
        PieceKind::Rook => rook_attacks(square, occupancy),
        PieceKind::Bishop => bishop_attacks(square, occupancy),
        PieceKind::Knight => knight_attacks(square),
        PieceKind::Pawn => pawn_attacks(square, piece.owner),
    }
}

/// Squares strictly between `from` and `to` if they share a rank, a file or a
/// diagonal. Returns an empty set otherwise and for adjacent squares.
#[must_use]
pub fn between(from: Square, to: Square) -> Bitboard {
    let d_file = to.file() as i8 - from.file() as i8;
    let d_rank = to.rank() as i8 - from.rank() as i8;
    let aligned = d_file == 0 || d_rank == 0 || d_file.abs() == d_rank.abs();
    if from == to || !aligned {
        return Bitboard::empty();
    }
    let step = (d_file.signum(), d_rank.signum());
    let mut result = Bitboard::empty();
    let mut current = from.offset(step.0, step.1);
    while let Some(square) = current {
        if square == to {
            break;
        }
        result |= Bitboard::from(square);
        current = square.offset(step.0, step.1);
    }
    result
}

/// Selects the attackers for [`attacks_of`]: every piece on the board, all
/// pieces of one player or pieces of one kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttackerSpec {
    /// Pieces of both players.
    All,
    /// Pieces owned by one player.
    Player(Player),
    /// A single piece kind of a single player, e.g. white knights.
    Piece(Piece),
}

impl AttackerSpec {
    fn selects(self, piece: Piece) -> bool {
        match self {
            Self::All => true,
            Self::Player(player) => piece.owner == player,
            Self::Piece(selected) => selected == piece,
        }
    }
}

impl From<Player> for AttackerSpec {
    fn from(player: Player) -> Self {
        Self::Player(player)
    }
}

impl From<Piece> for AttackerSpec {
    fn from(piece: Piece) -> Self {
        Self::Piece(piece)
    }
}

fn attacks_on(board: &Board, spec: AttackerSpec, occupancy: Bitboard) -> Bitboard {
    let mut result = Bitboard::empty();
    for piece in Piece::ALL.into_iter().filter(|&piece| spec.selects(piece)) {
        for square in board.bitboard(piece).iter() {
            result |= piece_attacks(piece, square, occupancy);
        }
    }
    result
}

fn king_danger_on(board: &Board, occupancy: Bitboard, player: Player) -> Bitboard {
    let king = board.player_pieces(player).king;
    attacks_on(board, player.opponent().into(), occupancy - king)
}

/// Attacks of `player`'s sliders that only exist once the first piece on
/// each ray is removed. Direct attacks are not part of the result.
fn xrays_on(board: &Board, occupancy: Bitboard, player: Player) -> Bitboard {
    let mut result = Bitboard::empty();
    for piece in Piece::of(player).filter(|piece| piece.kind.is_slider()) {
        for square in board.bitboard(piece).iter() {
            let direct = piece_attacks(piece, square, occupancy);
            let through = piece_attacks(piece, square, occupancy - (direct & occupancy));
            result |= through - direct;
        }
    }
    result
}

/// Returns the set of squares attacked by the pieces selected by `spec` in
/// the given position.
#[must_use]
pub fn attacks_of(spec: AttackerSpec, position: &Position) -> Bitboard {
    attacks_on(position.board(), spec, position.occupied())
}

/// Squares attacked by `player`'s opponent when `player`'s king is removed
/// from the board: sliders attack through the square the king stands on, so
/// the king can not "hide" from a check by stepping along the checking ray.
#[must_use]
pub fn king_danger_squares(player: Player, position: &Position) -> Bitboard {
    king_danger_on(position.board(), position.occupied(), player)
}

/// Xray attacks of the opponent of the side to move (see [`Blockers`]).
#[must_use]
pub fn xray_attacks(position: &Position) -> Bitboard {
    xrays_on(
        position.board(),
        position.occupied(),
        position.side_to_move().opponent(),
    )
}

/// Check information of the side to move, the second stage of derived state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CheckInfo {
    /// Attacks of the opponent with our king removed from the board.
    pub king_danger_squares: Bitboard,
    /// Whether our king is attacked.
    pub in_check: bool,
    /// Squares of the opponent pieces attacking our king.
    pub checkers: Bitboard,
    /// Population count of `checkers` when in check, zero otherwise.
    pub checker_count: u32,
    /// The kind of the checking piece. Under a double check by two different
    /// kinds only the latter one in [`Piece::ALL`] order is recorded: block
    /// and capture logic downstream assumes a single checker and double
    /// checks can only be evaded by the king anyway.
    pub checking_piece: Option<Piece>,
}

impl CheckInfo {
    /// Computes check state for the king of `us`.
    #[must_use]
    pub fn new(board: &Board, occupancy: &Occupancy, us: Player) -> Self {
        let king = board.player_pieces(us).king;
        let king_danger_squares = king_danger_on(board, occupancy.all, us);
        let in_check = king_danger_squares.intersects(king);
        let mut checkers = Bitboard::empty();
        let mut checking_piece = None;
        for piece in Piece::of(us.opponent()) {
            for square in board.bitboard(piece).iter() {
                if piece_attacks(piece, square, occupancy.all).intersects(king) {
                    checkers |= Bitboard::from(square);
                    checking_piece = Some(piece);
                }
            }
        }
        Self {
            king_danger_squares,
            in_check,
            checkers,
            checker_count: if in_check { checkers.count() } else { 0 },
            checking_piece,
        }
    }
}

/// Pieces standing alone between an opponent slider and the king of the side
/// to move, the last stage of derived state.
///
/// Our blockers are pinned: moving them off the line may expose our king.
/// Opponent blockers would uncover a discovered attack on our king.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Blockers {
    /// Union of both players' blockers.
    pub all: Bitboard,
    /// White pieces among the blockers.
    pub white: Bitboard,
    /// Black pieces among the blockers.
    pub black: Bitboard,
}

impl Blockers {
    /// Collects blockers of enemy slider lines towards the king of `us`.
    #[must_use]
    pub fn new(board: &Board, occupancy: &Occupancy, us: Player) -> Self {
        let king = board.player_pieces(us).king;
        let mut all = Bitboard::empty();
        // The decoder guarantees a single king, this only guards an empty
        // board built by hand.
        if king.count() == 1 {
            let king = king.as_square();
            let them = board.player_pieces(us.opponent());
            let snipers = (rook_attacks(king, Bitboard::empty()) & them.major())
                | (bishop_attacks(king, Bitboard::empty()) & (them.bishops | them.queens));
            for sniper in snipers.iter() {
                let between = between(sniper, king) & occupancy.all;
                if between.count() == 1 {
                    all |= between;
                }
            }
        }
        Self {
            all,
            white: all & occupancy.white.all,
            black: all & occupancy.black.all,
        }
    }
}
