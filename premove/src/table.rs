//! The player's side of the board: the rules oracle plus queued premoves.

use std::time::{Duration, Instant};

use chess::{Color, Game, GameError, GameOutcome};
use engine::BestMove;

use crate::premoves::PremoveQueue;

/// What an engine reply did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Moved { mv: String, depth: u32 },
    /// `bestmove (none)`: the engine had nothing legal to play.
    NoMove { depth: u32 },
    /// The oracle rejected the engine's move; board and engine disagree.
    Desync { mv: String, error: GameError },
}

#[derive(Debug)]
pub struct Table {
    game: Game,
    human: Color,
    premoves: PremoveQueue,
}

impl Table {
    /// The human plays the side to move in `fen`.
    pub fn new(fen: &str, premove_cooldown: Duration) -> Result<Self, GameError> {
        let game = Game::from_fen(fen)?;
        Ok(Self {
            human: game.side_to_move(),
            game,
            premoves: PremoveQueue::new(premove_cooldown),
        })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn human(&self) -> Color {
        self.human
    }

    pub fn premoves(&self) -> &PremoveQueue {
        &self.premoves
    }

    pub fn premoves_mut(&mut self) -> &mut PremoveQueue {
        &mut self.premoves
    }

    pub fn is_over(&self) -> bool {
        self.game.outcome() != GameOutcome::Ongoing
    }

    pub fn human_to_move(&self) -> bool {
        !self.is_over() && self.game.side_to_move() == self.human
    }

    /// Resolve and apply a human move, returning its fully qualified form.
    pub fn play_human(&mut self, candidate: &str) -> Result<String, GameError> {
        let mv = self
            .game
            .normalize(candidate)
            .ok_or_else(|| GameError::IllegalMove(candidate.to_string()))?;
        self.game.play_uci(&mv)?;
        Ok(mv)
    }

    /// Apply the engine's answer and start the premove cooldown.
    pub fn accept_reply(&mut self, best: &BestMove, now: Instant) -> Reply {
        if best.is_resignation() {
            return Reply::NoMove { depth: best.depth };
        }

        match self.game.play_uci(&best.mv) {
            Ok(()) => {
                self.premoves.hold(now);
                Reply::Moved {
                    mv: best.mv.clone(),
                    depth: best.depth,
                }
            }
            Err(error) => Reply::Desync {
                mv: best.mv.clone(),
                error,
            },
        }
    }

    /// Back to the starting position with no premoves.
    pub fn reset(&mut self) {
        self.game.reset();
        self.premoves.clear();
    }

    /// Replace the game with one starting from `fen`.
    pub fn load(&mut self, fen: &str) -> Result<(), GameError> {
        let game = Game::from_fen(fen)?;
        self.human = game.side_to_move();
        self.game = game;
        self.premoves.clear();
        Ok(())
    }

    /// Final result line, once the game is decided.
    pub fn result_text(&self) -> Option<String> {
        match self.game.outcome() {
            GameOutcome::Ongoing => None,
            GameOutcome::Draw => Some("Draw.".to_string()),
            GameOutcome::Checkmate { winner } if winner == self.human => {
                Some("Checkmate. You win.".to_string())
            }
            GameOutcome::Checkmate { .. } => Some("Checkmate. The engine wins.".to_string()),
        }
    }
}
