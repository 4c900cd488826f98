//! Turns a partially known state into one concrete world for a rollout.

use crate::memory::RankPool;
use cabo_core::game::state::{SearchState, SlotCard, TurnPhase};
use cabo_core::model::deck::RankCounts;
use cabo_core::model::rank::Rank;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::trace;

/// Slots remembered with more confidence than this keep their identity.
pub const KEEP_CONFIDENCE: f32 = 0.5;

/// When fewer cards than this remain to sample from, the sampling pool is
/// reset to the full deck composition. This can put more copies of a rank on
/// the table than the deck holds; rollouts tolerate it.
pub const REFILL_BELOW: usize = 10;

/// Fills every unknown or weakly remembered slot with a sampled rank and
/// builds a concrete draw pile.
///
/// Confident slots pass through untouched. `fallback` backs the draw pile
/// when the leftover cards cannot cover the estimated deck size.
pub fn determinize<R: Rng + ?Sized>(
    state: &SearchState,
    fallback: &RankPool,
    rng: &mut R,
) -> SearchState {
    let mut remaining = RankCounts::canonical();
    let mut open = Vec::new();
    for (seat_index, position, slot) in state.slots() {
        match slot {
            Some(card) if card.belief() > KEEP_CONFIDENCE => {
                remaining.take_one(card.rank);
            }
            _ => open.push((seat_index, position)),
        }
    }

    let pending = state.pending_drawn();
    if let Some((Some(rank), _)) = pending {
        remaining.take_one(rank);
    }

    let mut next = state.clone();
    for (seat_index, position) in open {
        let Some(rank) = draw(&mut remaining, rng) else {
            continue;
        };
        next = next.with_slot(seat_index, position, Some(SlotCard::sampled(rank)));
    }

    if let Some((None, from_discard)) = pending {
        let card = draw(&mut remaining, rng);
        next = next.with_phase(TurnPhase::Drawn { card, from_discard });
    }

    let mut pile = remaining.to_cards();
    pile.shuffle(rng);
    pile.truncate(state.deck_size());
    while pile.len() < state.deck_size() {
        let Some(rank) = fallback.sample(rng).or_else(|| RankCounts::canonical().sample(rng)) else {
            break;
        };
        pile.push(rank);
    }
    next.with_draw_pile(pile)
}

fn draw<R: Rng + ?Sized>(remaining: &mut RankCounts, rng: &mut R) -> Option<Rank> {
    if remaining.total() < REFILL_BELOW {
        trace!(target: "cabo_bot::determinize", left = remaining.total(), "refilling sampling pool");
        *remaining = RankCounts::canonical();
    }
    remaining.draw(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabo_core::game::state::{CardOrigin, Seat};
    use cabo_core::model::player::PlayerId;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn confident_slots_pass_through_unchanged() {
        let seats = vec![
            Seat::new(
                PlayerId(0),
                vec![
                    Some(SlotCard::revealed(Rank::Ace)),
                    Some(SlotCard::remembered(Rank::Nine, 0.8)),
                ],
            ),
            Seat::new(PlayerId(1), vec![Some(SlotCard::remembered(Rank::King, 0.9))]),
        ];
        let state = SearchState::new(PlayerId(0), seats, 0).with_deck_size(12);
        let mut rng = SmallRng::seed_from_u64(4);

        let world = determinize(&state, &RankPool::canonical(), &mut rng);
        assert_eq!(world.seats(), state.seats());
        assert_eq!(world.draw_pile().len(), 12);
    }

    #[test]
    fn weak_and_unknown_slots_are_sampled() {
        let seats = vec![
            Seat::new(
                PlayerId(0),
                vec![Some(SlotCard::remembered(Rank::Five, 0.4)), None],
            ),
            Seat::unknown(PlayerId(1), 3),
        ];
        let state = SearchState::new(PlayerId(0), seats, 0)
            .with_deck_size(5)
            .with_phase(TurnPhase::Drawn {
                card: None,
                from_discard: false,
            });
        let mut rng = SmallRng::seed_from_u64(5);

        let world = determinize(&state, &RankPool::canonical(), &mut rng);
        for (_, _, slot) in world.slots() {
            let card = slot.expect("every slot filled");
            assert_eq!(card.origin, CardOrigin::Sampled);
            assert_eq!(card.confidence, 0.0);
        }
        assert!(matches!(
            world.phase(),
            TurnPhase::Drawn {
                card: Some(_),
                from_discard: false
            }
        ));
        // input stays untouched
        assert!(state.seats()[1].slot(0).is_none());
    }

    #[test]
    fn refill_can_exceed_deck_composition() {
        // Every card but the two jokers is pinned; sampling drops below the
        // refill threshold straight away and draws from a fresh deck.
        let mut known = Vec::new();
        for rank in Rank::ORDERED {
            if rank != Rank::Joker {
                known.extend((0..4).map(|_| Some(SlotCard::revealed(rank))));
            }
        }
        let seats = vec![Seat::new(PlayerId(0), known), Seat::unknown(PlayerId(1), 4)];
        let state = SearchState::new(PlayerId(0), seats, 0);

        let mut over_counted = false;
        for seed in 0..16 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let world = determinize(&state, &RankPool::canonical(), &mut rng);
            let mut seen = [0usize; Rank::COUNT];
            for (_, _, slot) in world.slots() {
                if let Some(card) = slot {
                    seen[card.rank.index()] += 1;
                }
            }
            over_counted |= Rank::ORDERED
                .iter()
                .any(|rank| seen[rank.index()] > usize::from(rank.copies_in_deck()));
        }
        assert!(over_counted);
    }

    #[test]
    fn short_leftovers_fall_back_to_memory_pool() {
        let seats = vec![Seat::unknown(PlayerId(0), 2)];
        let state = SearchState::new(PlayerId(0), seats, 0).with_deck_size(80);
        let mut rng = SmallRng::seed_from_u64(6);
        let world = determinize(&state, &RankPool::canonical(), &mut rng);
        assert_eq!(world.draw_pile().len(), 80);
    }
}
