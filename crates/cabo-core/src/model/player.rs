use core::fmt;
use serde::{Deserialize, Serialize};

/// Seat identity as handed out by the game orchestrator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// A single card slot on some player's board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Target {
    pub player: PlayerId,
    pub position: usize,
}

impl Target {
    pub const fn new(player: PlayerId, position: usize) -> Self {
        Self { player, position }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.player, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::{PlayerId, Target};

    #[test]
    fn display_is_compact() {
        assert_eq!(PlayerId(3).to_string(), "P3");
        assert_eq!(Target::new(PlayerId(1), 2).to_string(), "P1#2");
    }

    #[test]
    fn targets_order_by_player_then_position() {
        let mut targets = vec![
            Target::new(PlayerId(2), 0),
            Target::new(PlayerId(1), 3),
            Target::new(PlayerId(1), 1),
        ];
        targets.sort();
        assert_eq!(targets[0], Target::new(PlayerId(1), 1));
        assert_eq!(targets[2], Target::new(PlayerId(2), 0));
    }
}
