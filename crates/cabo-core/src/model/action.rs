use core::fmt;
use serde::{Deserialize, Serialize};

/// Special effect triggered by discarding (or tossing in) an action rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Look at one of your own cards.
    PeekOwn,
    /// Look at one opponent card.
    PeekOpponent,
    /// Exchange one own card with one opponent card, unseen.
    BlindSwap,
    /// Look at one opponent card, then optionally exchange it with one of yours.
    PeekAndSwap,
    /// Name the rank of one of your own cards; a correct call sheds it, a
    /// wrong one costs a penalty card.
    DeclareOwn,
    /// Make an opponent draw a penalty card.
    ForceDraw,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::PeekOwn,
        ActionKind::PeekOpponent,
        ActionKind::BlindSwap,
        ActionKind::PeekAndSwap,
        ActionKind::DeclareOwn,
        ActionKind::ForceDraw,
    ];

    pub const fn targets_own(self) -> bool {
        matches!(
            self,
            ActionKind::PeekOwn
                | ActionKind::BlindSwap
                | ActionKind::PeekAndSwap
                | ActionKind::DeclareOwn
        )
    }

    pub const fn targets_opponent(self) -> bool {
        matches!(
            self,
            ActionKind::PeekOpponent
                | ActionKind::BlindSwap
                | ActionKind::PeekAndSwap
                | ActionKind::ForceDraw
        )
    }

    pub const fn reveals_to_actor(self) -> bool {
        matches!(
            self,
            ActionKind::PeekOwn | ActionKind::PeekOpponent | ActionKind::PeekAndSwap
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionKind::PeekOwn => "peek-own",
            ActionKind::PeekOpponent => "peek-opponent",
            ActionKind::BlindSwap => "blind-swap",
            ActionKind::PeekAndSwap => "peek-and-swap",
            ActionKind::DeclareOwn => "declare-own",
            ActionKind::ForceDraw => "force-draw",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::ActionKind;

    #[test]
    fn swaps_touch_both_sides() {
        assert!(ActionKind::BlindSwap.targets_own());
        assert!(ActionKind::BlindSwap.targets_opponent());
        assert!(!ActionKind::PeekOwn.targets_opponent());
        assert!(!ActionKind::ForceDraw.targets_own());
    }

    #[test]
    fn only_peeks_reveal() {
        let revealing: Vec<_> = ActionKind::ALL
            .iter()
            .filter(|kind| kind.reveals_to_actor())
            .collect();
        assert_eq!(revealing.len(), 3);
    }
}
