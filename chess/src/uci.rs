//! Move text in UCI long algebraic form ("e2e4", "e7e8q").
//!
//! The rules library encodes castling as the king capturing its own rook
//! (e1h1). The engine speaks standard notation (e1g1). The conversions below
//! translate between the two so that every string leaving this crate is
//! standard UCI.

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

use crate::game::GameError;

/// Parse UCI move text into a raw move (no castling translation).
pub fn parse_uci_move(s: &str) -> Result<Move, GameError> {
    let s = s.trim();
    if !(4..=5).contains(&s.len()) || !s.is_ascii() {
        return Err(GameError::InvalidMove(s.to_string()));
    }

    let from: Square = s[0..2]
        .parse()
        .map_err(|_| GameError::InvalidMove(s.to_string()))?;
    let to: Square = s[2..4]
        .parse()
        .map_err(|_| GameError::InvalidMove(s.to_string()))?;

    let promotion = match s.as_bytes().get(4) {
        None => None,
        Some(b'q') => Some(Piece::Queen),
        Some(b'r') => Some(Piece::Rook),
        Some(b'b') => Some(Piece::Bishop),
        Some(b'n') => Some(Piece::Knight),
        Some(_) => return Err(GameError::InvalidMove(s.to_string())),
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q")
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", mv.from, mv.to);
    if let Some(promo) = mv.promotion {
        s.push(format_piece(promo));
    }
    s
}

/// Lowercase promotion letter for a piece.
pub fn format_piece(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    }
}

/// Convert UCI castling notation to cozy_chess notation
///
/// UCI: king moves two squares (e1g1, e1c1, e8g8, e8c8).
/// cozy_chess: king moves onto its rook (e1h1, e1a1, e8h8, e8a8).
///
/// Only converts when the translated move is actually in `legal_moves`, so a
/// plain king step is never rewritten.
pub fn convert_uci_castling_to_cozy(mv: Move, legal_moves: &[Move]) -> Move {
    let is_back_rank = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let is_e_file = matches!(mv.from.file(), File::E);
    let is_g_or_c_file = matches!(mv.to.file(), File::G | File::C);

    if is_back_rank
        && is_e_file
        && is_g_or_c_file
        && mv.from.rank() == mv.to.rank()
        && mv.promotion.is_none()
    {
        let rook_file = if mv.to.file() == File::G {
            File::H
        } else {
            File::A
        };
        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.from.rank()),
            promotion: None,
        };

        if legal_moves.contains(&converted) {
            return converted;
        }
    }

    mv
}

/// Convert a cozy_chess castling move (king onto own rook) back to UCI.
///
/// `board` must be the position the move is played from.
pub fn convert_cozy_castling_to_uci(board: &Board, mv: Move) -> Move {
    let mover = board.side_to_move();
    let is_king = board.piece_on(mv.from) == Some(Piece::King);
    let onto_own_piece = board.color_on(mv.to) == Some(mover);

    if !(is_king && onto_own_piece) {
        return mv;
    }

    let king_file = mv.from.file() as usize;
    let rook_file = mv.to.file() as usize;
    let target_file = if rook_file > king_file {
        File::G
    } else {
        File::C
    };

    Move {
        from: mv.from,
        to: Square::new(target_file, mv.from.rank()),
        promotion: None,
    }
}
