use cozy_chess::{Board, Color, GameStatus, Move};

use crate::fen::{format_fen, parse_fen, FenError, START_FEN};
use crate::reconcile;

/// Rules oracle for one game: the current position plus every move applied
/// since the starting FEN, in UCI notation.
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    start_fen: String,
    history: Vec<String>,
}

/// How the game stands from the rules' point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Ongoing,
    /// The side to move has been checkmated; the other side won.
    Checkmate { winner: Color },
    /// Stalemate or a rules draw.
    Draw,
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self {
            position: Board::default(),
            start_fen: START_FEN.to_string(),
            history: Vec::new(),
        }
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let position = parse_fen(fen)?;
        Ok(Self {
            position,
            start_fen: fen.trim().to_string(),
            history: Vec::new(),
        })
    }

    /// Get the current board position
    pub fn position(&self) -> &Board {
        &self.position
    }

    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    /// Moves applied since the starting position, in UCI notation.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Get all legal moves for the current position (rules-library encoding)
    pub fn legal_moves(&self) -> Vec<Move> {
        reconcile::legal_moves(&self.position)
    }

    /// Get the side to move
    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    pub fn outcome(&self) -> GameOutcome {
        match self.position.status() {
            GameStatus::Ongoing => GameOutcome::Ongoing,
            GameStatus::Drawn => GameOutcome::Draw,
            GameStatus::Won => GameOutcome::Checkmate {
                winner: !self.position.side_to_move(),
            },
        }
    }

    /// Export position to FEN string
    pub fn to_fen(&self) -> String {
        format_fen(&self.position)
    }

    /// Resolve a candidate like "e7e8" into a fully qualified legal move.
    pub fn normalize(&self, candidate: &str) -> Option<String> {
        reconcile::normalize(&self.position, candidate)
    }

    /// Apply a fully qualified UCI move and record it in the history.
    pub fn play_uci(&mut self, uci: &str) -> Result<(), GameError> {
        reconcile::apply(&mut self.position, uci)?;
        self.history.push(uci.trim().to_string());
        Ok(())
    }

    /// Return to the starting position, dropping the history.
    pub fn reset(&mut self) {
        // start_fen was validated when the game was created
        if let Ok(board) = parse_fen(&self.start_fen) {
            self.position = board;
        }
        self.history.clear();
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Invalid move text: {0}")]
    InvalidMove(String),
    #[error("FEN parse error: {0}")]
    Fen(#[from] FenError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_starts_from_standard_position() {
        let game = Game::new();
        assert_eq!(game.to_fen(), START_FEN);
        assert_eq!(game.legal_moves().len(), 20);
        assert_eq!(game.side_to_move(), Color::White);
        assert_eq!(game.outcome(), GameOutcome::Ongoing);
    }

    #[test]
    fn test_play_uci_records_history() {
        let mut game = Game::new();
        game.play_uci("e2e4").unwrap();
        game.play_uci("e7e5").unwrap();
        assert_eq!(game.history(), ["e2e4", "e7e5"]);
        assert_eq!(game.side_to_move(), Color::White);
    }

    #[test]
    fn test_illegal_move_leaves_game_untouched() {
        let mut game = Game::new();
        let before = game.to_fen();
        assert!(matches!(
            game.play_uci("e2e5"),
            Err(GameError::IllegalMove(_))
        ));
        assert_eq!(game.to_fen(), before);
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_fools_mate_outcome() {
        let mut game = Game::new();
        for mv in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            game.play_uci(mv).unwrap();
        }
        assert_eq!(
            game.outcome(),
            GameOutcome::Checkmate {
                winner: Color::Black
            }
        );
    }

    #[test]
    fn test_reset_returns_to_start_fen() {
        let fen = "4k3/8/8/8/8/8/8/RNBQKBNR w - - 1 1";
        let mut game = Game::from_fen(fen).unwrap();
        game.play_uci("b1c3").unwrap();
        game.reset();
        assert_eq!(game.to_fen(), fen);
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_from_fen_rejects_blank() {
        assert!(matches!(
            Game::from_fen(" "),
            Err(GameError::Fen(FenError::Empty))
        ));
    }
}
