use crate::model::action::ActionKind;
use crate::model::player::{PlayerId, Target};
use crate::model::rank::Rank;
use core::fmt;
use serde::{Deserialize, Serialize};

/// One step a player can take; every variant names the acting player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Draw {
        player: PlayerId,
    },
    TakeDiscard {
        player: PlayerId,
    },
    UseAction {
        player: PlayerId,
        kind: ActionKind,
        targets: Vec<Target>,
        declared: Option<Rank>,
        swap: Option<bool>,
    },
    Swap {
        player: PlayerId,
        position: usize,
    },
    Discard {
        player: PlayerId,
    },
    TossIn {
        player: PlayerId,
        position: usize,
        rank: Rank,
    },
    CallEnd {
        player: PlayerId,
    },
    Pass {
        player: PlayerId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveTag {
    Draw,
    TakeDiscard,
    UseAction,
    Swap,
    Discard,
    TossIn,
    CallEnd,
    Pass,
}

impl Move {
    pub fn player(&self) -> PlayerId {
        match self {
            Move::Draw { player }
            | Move::TakeDiscard { player }
            | Move::UseAction { player, .. }
            | Move::Swap { player, .. }
            | Move::Discard { player }
            | Move::TossIn { player, .. }
            | Move::CallEnd { player }
            | Move::Pass { player } => *player,
        }
    }

    pub fn tag(&self) -> MoveTag {
        match self {
            Move::Draw { .. } => MoveTag::Draw,
            Move::TakeDiscard { .. } => MoveTag::TakeDiscard,
            Move::UseAction { .. } => MoveTag::UseAction,
            Move::Swap { .. } => MoveTag::Swap,
            Move::Discard { .. } => MoveTag::Discard,
            Move::TossIn { .. } => MoveTag::TossIn,
            Move::CallEnd { .. } => MoveTag::CallEnd,
            Move::Pass { .. } => MoveTag::Pass,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Move::Pass { .. })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Draw { player } => write!(f, "{player} draw"),
            Move::TakeDiscard { player } => write!(f, "{player} take-discard"),
            Move::UseAction {
                player,
                kind,
                targets,
                declared,
                swap,
            } => {
                write!(f, "{player} {kind}")?;
                for target in targets {
                    write!(f, " {target}")?;
                }
                if let Some(rank) = declared {
                    write!(f, " declare={rank}")?;
                }
                if let Some(flag) = swap {
                    write!(f, " swap={flag}")?;
                }
                Ok(())
            }
            Move::Swap { player, position } => write!(f, "{player} swap #{position}"),
            Move::Discard { player } => write!(f, "{player} discard"),
            Move::TossIn {
                player,
                position,
                rank,
            } => write!(f, "{player} toss #{position} as {rank}"),
            Move::CallEnd { player } => write!(f, "{player} call-end"),
            Move::Pass { player } => write!(f, "{player} pass"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_and_player_are_exposed() {
        let mv = Move::UseAction {
            player: PlayerId(2),
            kind: ActionKind::PeekAndSwap,
            targets: vec![Target::new(PlayerId(2), 0), Target::new(PlayerId(1), 3)],
            declared: None,
            swap: Some(true),
        };
        assert_eq!(mv.tag(), MoveTag::UseAction);
        assert_eq!(mv.player(), PlayerId(2));
        assert!(!mv.is_pass());
        assert!(Move::Pass { player: PlayerId(0) }.is_pass());
    }

    #[test]
    fn display_lists_targets_and_flags() {
        let mv = Move::UseAction {
            player: PlayerId(0),
            kind: ActionKind::DeclareOwn,
            targets: vec![Target::new(PlayerId(0), 1)],
            declared: Some(Rank::Five),
            swap: None,
        };
        assert_eq!(mv.to_string(), "P0 declare-own P0#1 declare=5");
    }
}
