//! Immutable search snapshot of one round as seen by a single bot.

use crate::model::action::ActionKind;
use crate::model::deck::canonical_mean_points;
use crate::model::player::PlayerId;
use crate::model::rank::Rank;
use serde::{Deserialize, Serialize};

/// Where the identity of a slot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardOrigin {
    /// Remembered or seen by the deciding bot.
    Memory,
    /// Synthesized by determinization; the bot does not actually know it.
    Sampled,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotCard {
    pub rank: Rank,
    pub confidence: f32,
    pub origin: CardOrigin,
}

impl SlotCard {
    pub fn remembered(rank: Rank, confidence: f32) -> Self {
        Self {
            rank,
            confidence: confidence.clamp(0.0, 1.0),
            origin: CardOrigin::Memory,
        }
    }

    /// A card the bot has just looked at.
    pub fn revealed(rank: Rank) -> Self {
        Self::remembered(rank, 1.0)
    }

    pub fn sampled(rank: Rank) -> Self {
        Self {
            rank,
            confidence: 0.0,
            origin: CardOrigin::Sampled,
        }
    }

    pub fn is_remembered(&self) -> bool {
        self.origin == CardOrigin::Memory
    }

    /// Confidence the bot really holds about this slot; sampled cards carry none.
    pub fn belief(&self) -> f32 {
        match self.origin {
            CardOrigin::Memory => self.confidence,
            CardOrigin::Sampled => 0.0,
        }
    }
}

/// One player's row of face-down cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub id: PlayerId,
    pub slots: Vec<Option<SlotCard>>,
}

impl Seat {
    pub fn new(id: PlayerId, slots: Vec<Option<SlotCard>>) -> Self {
        Self { id, slots }
    }

    /// Seat with `count` cards the bot knows nothing about.
    pub fn unknown(id: PlayerId, count: usize) -> Self {
        Self::new(id, vec![None; count])
    }

    pub fn card_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, position: usize) -> Option<&SlotCard> {
        self.slots.get(position).and_then(Option::as_ref)
    }

    pub fn estimated_score(&self) -> f32 {
        let unknown = canonical_mean_points();
        self.slots
            .iter()
            .map(|slot| match slot {
                Some(card) => f32::from(card.rank.points()),
                None => unknown,
            })
            .sum()
    }
}

/// What the player to move is currently deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Start of a turn: draw, take the discard, or call the end.
    Start,
    /// A card is in hand waiting to be swapped in, discarded, or used.
    Drawn {
        card: Option<Rank>,
        from_discard: bool,
    },
    /// `player` resolves an action (chained from a toss-in or mid-action).
    Action { player: PlayerId, kind: ActionKind },
    /// Anyone may toss in a card matching `rank`.
    TossIn { rank: Rank },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    pub(crate) perspective: PlayerId,
    pub(crate) seats: Vec<Seat>,
    pub(crate) current: usize,
    pub(crate) discard_top: Option<Rank>,
    pub(crate) deck_size: usize,
    pub(crate) draw_pile: Vec<Rank>,
    pub(crate) phase: TurnPhase,
    pub(crate) turn_count: u32,
    pub(crate) end_caller: Option<PlayerId>,
    pub(crate) terminal: bool,
    pub(crate) winner: Option<PlayerId>,
}

impl SearchState {
    /// Builds a snapshot at the start of `current`'s turn.
    pub fn new(perspective: PlayerId, seats: Vec<Seat>, current: usize) -> Self {
        let current = if seats.is_empty() {
            0
        } else {
            current % seats.len()
        };
        Self {
            perspective,
            seats,
            current,
            discard_top: None,
            deck_size: 0,
            draw_pile: Vec::new(),
            phase: TurnPhase::Start,
            turn_count: 0,
            end_caller: None,
            terminal: false,
            winner: None,
        }
    }

    pub fn with_discard_top(mut self, rank: Option<Rank>) -> Self {
        self.discard_top = rank;
        self
    }

    pub fn with_deck_size(mut self, deck_size: usize) -> Self {
        self.deck_size = deck_size;
        self.draw_pile.truncate(deck_size);
        self
    }

    /// Replaces the concrete draw order used by rollouts. The top of the
    /// pile is the last element.
    pub fn with_draw_pile(mut self, pile: Vec<Rank>) -> Self {
        self.draw_pile = pile;
        self
    }

    pub fn with_phase(mut self, phase: TurnPhase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_turn_count(mut self, turn_count: u32) -> Self {
        self.turn_count = turn_count;
        self
    }

    pub fn with_end_caller(mut self, caller: Option<PlayerId>) -> Self {
        self.end_caller = caller;
        self
    }

    pub fn with_slot(mut self, seat_index: usize, position: usize, card: Option<SlotCard>) -> Self {
        if let Some(slot) = self
            .seats
            .get_mut(seat_index)
            .and_then(|seat| seat.slots.get_mut(position))
        {
            *slot = card;
        }
        self
    }

    pub fn perspective(&self) -> PlayerId {
        self.perspective
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat_index(&self, player: PlayerId) -> Option<usize> {
        self.seats.iter().position(|seat| seat.id == player)
    }

    pub fn seat(&self, player: PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|seat| seat.id == player)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_player(&self) -> PlayerId {
        self.seats
            .get(self.current)
            .map(|seat| seat.id)
            .unwrap_or(self.perspective)
    }

    pub fn discard_top(&self) -> Option<Rank> {
        self.discard_top
    }

    pub fn deck_size(&self) -> usize {
        self.deck_size
    }

    pub fn draw_pile(&self) -> &[Rank] {
        &self.draw_pile
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Pending drawn card and whether it came off the discard pile.
    pub fn pending_drawn(&self) -> Option<(Option<Rank>, bool)> {
        match self.phase {
            TurnPhase::Drawn { card, from_discard } => Some((card, from_discard)),
            _ => None,
        }
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn end_caller(&self) -> Option<PlayerId> {
        self.end_caller
    }

    pub fn end_triggered(&self) -> bool {
        self.end_caller.is_some()
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn card_count(&self, player: PlayerId) -> usize {
        self.seat(player).map(Seat::card_count).unwrap_or(0)
    }

    pub fn estimated_score(&self, player: PlayerId) -> f32 {
        self.seat(player).map(Seat::estimated_score).unwrap_or(0.0)
    }

    /// Iterates every (seat index, position, slot) triple.
    pub fn slots(&self) -> impl Iterator<Item = (usize, usize, Option<&SlotCard>)> + '_ {
        self.seats.iter().enumerate().flat_map(|(seat_index, seat)| {
            seat.slots
                .iter()
                .enumerate()
                .map(move |(position, slot)| (seat_index, position, slot.as_ref()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_seat_state() -> SearchState {
        let seats = vec![
            Seat::new(
                PlayerId(0),
                vec![Some(SlotCard::revealed(Rank::Ace)), None],
            ),
            Seat::unknown(PlayerId(1), 4),
        ];
        SearchState::new(PlayerId(0), seats, 0)
    }

    #[test]
    fn unknown_slots_score_at_deck_mean() {
        let state = two_seat_state();
        let expected = 1.0 + canonical_mean_points();
        assert!((state.estimated_score(PlayerId(0)) - expected).abs() < 1e-4);
        assert_eq!(state.card_count(PlayerId(1)), 4);
    }

    #[test]
    fn sampled_cards_carry_no_belief() {
        let card = SlotCard::sampled(Rank::King);
        assert_eq!(card.belief(), 0.0);
        assert!(!card.is_remembered());
        assert_eq!(SlotCard::remembered(Rank::King, 1.4).confidence, 1.0);
    }

    #[test]
    fn builders_do_not_touch_other_fields() {
        let state = two_seat_state()
            .with_deck_size(10)
            .with_discard_top(Some(Rank::Four))
            .with_slot(1, 2, Some(SlotCard::sampled(Rank::Two)));
        assert_eq!(state.deck_size(), 10);
        assert_eq!(state.discard_top(), Some(Rank::Four));
        assert_eq!(state.seats()[1].slot(2).map(|c| c.rank), Some(Rank::Two));
        assert_eq!(state.phase(), TurnPhase::Start);
        assert!(state.pending_drawn().is_none());
        assert_eq!(state.slots().count(), 6);
    }
}
