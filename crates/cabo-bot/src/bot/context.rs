use super::DecisionError;
use cabo_core::model::action::ActionKind;
use cabo_core::model::player::PlayerId;
use cabo_core::model::rank::Rank;
use std::collections::BTreeSet;

/// Public information about one seat, in turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatInfo {
    pub player: PlayerId,
    pub card_count: usize,
}

/// A card the bot has legitimately seen at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownCard {
    pub player: PlayerId,
    pub position: usize,
    pub rank: Rank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawnCard {
    pub rank: Rank,
    pub from_discard: bool,
}

/// Everything the game hands the bot for one decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionContext {
    pub bot: PlayerId,
    /// The bot's own cards, position by position.
    pub own_hand: Vec<Rank>,
    /// Positions of `own_hand` the bot has actually looked at.
    pub known_positions: Vec<usize>,
    pub seats: Vec<SeatInfo>,
    pub current: PlayerId,
    pub discard_top: Option<Rank>,
    pub end_caller: Option<PlayerId>,
    pub turn_count: u32,
    pub deck_size: usize,
    pub drawn: Option<DrawnCard>,
    /// Opponent cards the bot has seen earlier in the round.
    pub opponent_knowledge: Vec<KnownCard>,
}

/// Extra information available while resolving a special-card action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionContext {
    pub kind: ActionKind,
    pub peeked: Vec<KnownCard>,
}

impl ActionContext {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            peeked: Vec::new(),
        }
    }
}

impl DecisionContext {
    pub fn seat_index(&self, player: PlayerId) -> Option<usize> {
        self.seats.iter().position(|seat| seat.player == player)
    }

    pub fn seat(&self, player: PlayerId) -> Option<&SeatInfo> {
        self.seats.iter().find(|seat| seat.player == player)
    }

    /// Own cards the bot knows, as observations.
    pub fn known_own_cards(&self) -> impl Iterator<Item = KnownCard> + '_ {
        self.known_positions.iter().filter_map(|&position| {
            self.own_hand.get(position).map(|&rank| KnownCard {
                player: self.bot,
                position,
                rank,
            })
        })
    }

    /// Checks the context is internally consistent for the bot `expected`.
    pub fn validate(&self, expected: PlayerId) -> Result<(), DecisionError> {
        if self.bot != expected || self.seat(self.bot).is_none() {
            return Err(DecisionError::UnknownPlayer { player: self.bot });
        }

        let mut ids = BTreeSet::new();
        for seat in &self.seats {
            if !ids.insert(seat.player) {
                return Err(invalid(format!("seat {} listed twice", seat.player)));
            }
        }
        if self.seat(self.current).is_none() {
            return Err(DecisionError::UnknownPlayer {
                player: self.current,
            });
        }

        let own_count = self.seat(self.bot).map(|seat| seat.card_count).unwrap_or(0);
        if own_count != self.own_hand.len() {
            return Err(invalid(format!(
                "own hand has {} cards but the table shows {own_count}",
                self.own_hand.len()
            )));
        }
        if let Some(&position) = self
            .known_positions
            .iter()
            .find(|&&position| position >= own_count)
        {
            return Err(invalid(format!("known position {position} is outside the hand")));
        }

        for card in &self.opponent_knowledge {
            self.check_target(card)?;
        }
        if let Some(caller) = self.end_caller {
            if self.seat(caller).is_none() {
                return Err(DecisionError::UnknownPlayer { player: caller });
            }
        }
        Ok(())
    }

    pub(crate) fn check_target(&self, card: &KnownCard) -> Result<(), DecisionError> {
        let Some(seat) = self.seat(card.player) else {
            return Err(DecisionError::UnknownPlayer {
                player: card.player,
            });
        };
        if card.position >= seat.card_count {
            return Err(invalid(format!(
                "{} has no card at position {}",
                card.player, card.position
            )));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> DecisionError {
    DecisionError::InvalidContext { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> DecisionContext {
        DecisionContext {
            bot: PlayerId(0),
            own_hand: vec![Rank::Two, Rank::King, Rank::Five, Rank::Seven],
            known_positions: vec![0, 1],
            seats: vec![
                SeatInfo {
                    player: PlayerId(0),
                    card_count: 4,
                },
                SeatInfo {
                    player: PlayerId(1),
                    card_count: 4,
                },
            ],
            current: PlayerId(0),
            discard_top: Some(Rank::Three),
            end_caller: None,
            turn_count: 0,
            deck_size: 40,
            drawn: None,
            opponent_knowledge: Vec::new(),
        }
    }

    #[test]
    fn well_formed_context_validates() {
        let ctx = context();
        assert!(ctx.validate(PlayerId(0)).is_ok());
        let known: Vec<_> = ctx.known_own_cards().map(|card| card.rank).collect();
        assert_eq!(known, vec![Rank::Two, Rank::King]);
    }

    #[test]
    fn wrong_bot_is_unknown_player() {
        let ctx = context();
        assert!(matches!(
            ctx.validate(PlayerId(3)),
            Err(DecisionError::UnknownPlayer { player }) if player == PlayerId(0)
        ));
    }

    #[test]
    fn hand_size_mismatch_is_invalid() {
        let mut ctx = context();
        ctx.own_hand.pop();
        assert!(matches!(
            ctx.validate(PlayerId(0)),
            Err(DecisionError::InvalidContext { .. })
        ));
    }

    #[test]
    fn opponent_knowledge_must_point_at_a_card() {
        let mut ctx = context();
        ctx.opponent_knowledge.push(KnownCard {
            player: PlayerId(1),
            position: 9,
            rank: Rank::Ace,
        });
        assert!(matches!(
            ctx.validate(PlayerId(0)),
            Err(DecisionError::InvalidContext { .. })
        ));
    }
}
