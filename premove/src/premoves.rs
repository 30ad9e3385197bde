use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Moves the player has entered ahead of their turn.
///
/// After each engine reply the queue holds back for `cooldown`, so the player
/// sees the reply before the next premove goes out.
#[derive(Debug)]
pub struct PremoveQueue {
    moves: VecDeque<String>,
    cooldown: Duration,
    held_until: Option<Instant>,
}

impl PremoveQueue {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            moves: VecDeque::new(),
            cooldown,
            held_until: None,
        }
    }

    pub fn push(&mut self, mv: impl Into<String>) {
        self.moves.push_back(mv.into());
    }

    pub fn clear(&mut self) {
        self.moves.clear();
        self.held_until = None;
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Start the cooldown.
    pub fn hold(&mut self, now: Instant) {
        self.held_until = Some(now + self.cooldown);
    }

    /// Next premove, unless the queue is empty or still cooling down.
    pub fn pop_due(&mut self, now: Instant) -> Option<String> {
        if self.held_until.is_some_and(|until| now < until) {
            return None;
        }
        self.held_until = None;
        self.moves.pop_front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.moves.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = PremoveQueue::new(Duration::ZERO);
        queue.push("e2e4");
        queue.push("g1f3");
        let now = Instant::now();
        assert_eq!(queue.pop_due(now).as_deref(), Some("e2e4"));
        assert_eq!(queue.pop_due(now).as_deref(), Some("g1f3"));
        assert_eq!(queue.pop_due(now), None);
    }

    #[test]
    fn test_cooldown_holds_the_queue() {
        let mut queue = PremoveQueue::new(Duration::from_millis(150));
        queue.push("e2e4");

        let now = Instant::now();
        queue.hold(now);
        assert_eq!(queue.pop_due(now + Duration::from_millis(100)), None);
        assert_eq!(queue.len(), 1);
        assert_eq!(
            queue.pop_due(now + Duration::from_millis(150)).as_deref(),
            Some("e2e4")
        );
    }

    #[test]
    fn test_clear_drops_moves_and_cooldown() {
        let mut queue = PremoveQueue::new(Duration::from_secs(60));
        queue.push("e2e4");
        queue.hold(Instant::now());
        queue.clear();
        assert!(queue.is_empty());

        queue.push("d2d4");
        assert_eq!(queue.pop_due(Instant::now()).as_deref(), Some("d2d4"));
    }
}
