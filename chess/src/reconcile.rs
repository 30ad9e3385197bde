//! Reconciling human and engine move text with the rules oracle.

use cozy_chess::{Board, Move, Piece};

use crate::game::GameError;
use crate::uci::{
    convert_cozy_castling_to_uci, convert_uci_castling_to_cozy, format_uci_move, parse_uci_move,
};

pub(crate) fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

/// Resolve a from/to candidate ("e7e8", "e1g1") into a fully qualified legal
/// move in standard UCI notation.
///
/// When several legal moves share the squares (promotions), an explicit
/// promotion letter in the candidate wins; otherwise the queen promotion is
/// preferred, then the first legal match. Returns `None` when nothing legal
/// matches.
pub fn normalize(board: &Board, candidate: &str) -> Option<String> {
    let wanted = parse_uci_move(candidate).ok()?;

    let matching: Vec<Move> = legal_moves(board)
        .into_iter()
        .map(|mv| convert_cozy_castling_to_uci(board, mv))
        .filter(|mv| mv.from == wanted.from && mv.to == wanted.to)
        .collect();

    let chosen = match wanted.promotion {
        Some(piece) => matching.iter().find(|mv| mv.promotion == Some(piece)),
        None => matching
            .iter()
            .find(|mv| mv.promotion == Some(Piece::Queen))
            .or_else(|| matching.first()),
    }?;

    Some(format_uci_move(*chosen))
}

/// Advance `board` by a fully qualified UCI move.
///
/// The board is left untouched when the oracle rejects the move.
pub fn apply(board: &mut Board, uci: &str) -> Result<(), GameError> {
    let mv = parse_uci_move(uci)?;
    let legal = legal_moves(board);
    let mv = convert_uci_castling_to_cozy(mv, &legal);

    if !legal.contains(&mv) {
        tracing::debug!("Oracle rejected move {} in {}", uci.trim(), board);
        return Err(GameError::IllegalMove(uci.trim().to_string()));
    }

    board.play_unchecked(mv);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn board(fen: &str) -> Board {
        Board::from_fen(fen, false).unwrap()
    }

    #[test]
    fn test_promotion_prefers_queen() {
        for idx in 0..8u8 {
            let file = (b'a' + idx) as char;
            let mut rank = String::new();
            if idx > 0 {
                rank.push((b'0' + idx) as char);
            }
            rank.push('P');
            if idx < 7 {
                rank.push((b'0' + 7 - idx) as char);
            }

            let b = board(&format!("8/{rank}/8/8/8/8/8/K6k w - - 0 1"));
            let candidate = format!("{file}7{file}8");
            assert_eq!(normalize(&b, &candidate), Some(format!("{candidate}q")));
        }
    }

    #[test]
    fn test_explicit_underpromotion_is_kept() {
        let b = board("8/4P3/8/8/8/8/8/K6k w - - 0 1");
        assert_eq!(normalize(&b, "e7e8n").as_deref(), Some("e7e8n"));
    }

    #[test]
    fn test_capture_promotion() {
        let b = board("3r4/4P3/8/8/8/8/8/K6k w - - 0 1");
        assert_eq!(normalize(&b, "e7d8").as_deref(), Some("e7d8q"));
    }

    #[test]
    fn test_plain_move_is_unchanged() {
        let b = Board::default();
        assert_eq!(normalize(&b, "g1f3").as_deref(), Some("g1f3"));
    }

    #[test]
    fn test_no_match_returns_none() {
        let b = Board::default();
        assert_eq!(normalize(&b, "e2e5"), None);
        assert_eq!(normalize(&b, "e2e2"), None);
        assert_eq!(normalize(&b, "garbage"), None);
    }

    #[test]
    fn test_castling_normalizes_to_standard_notation() {
        let b = board("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1");
        assert_eq!(normalize(&b, "e8g8").as_deref(), Some("e8g8"));
        assert_eq!(normalize(&b, "e8c8").as_deref(), Some("e8c8"));
    }

    #[test]
    fn test_apply_castling() {
        let mut b = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        apply(&mut b, "e1g1").unwrap();
        assert_eq!(b.to_string(), "r3k2r/8/8/8/8/8/8/R4RK1 b kq - 1 1");
    }

    #[test]
    fn test_apply_rejects_illegal_move() {
        let mut b = Board::default();
        assert_eq!(
            apply(&mut b, "e1e2"),
            Err(GameError::IllegalMove("e1e2".to_string()))
        );
        assert_eq!(b, Board::default());
    }

    proptest! {
        #[test]
        fn prop_normalized_moves_always_apply(choices in prop::collection::vec(any::<u16>(), 0..40)) {
            let mut b = Board::default();
            for choice in choices {
                let legal = legal_moves(&b);
                if legal.is_empty() {
                    break;
                }
                let mv = convert_cozy_castling_to_uci(&b, legal[choice as usize % legal.len()]);
                let squares = format!("{}{}", mv.from, mv.to);

                let normalized = normalize(&b, &squares);
                prop_assert!(normalized.is_some());
                let normalized = normalized.unwrap();
                prop_assert!(normalized.starts_with(&squares));

                prop_assert!(apply(&mut b, &normalized).is_ok());
            }
        }
    }
}
