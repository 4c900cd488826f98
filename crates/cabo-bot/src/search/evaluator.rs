//! Heuristic value of a state for one player, squashed into (0, 1).

use cabo_core::game::state::{Seat, SearchState};
use cabo_core::model::player::PlayerId;

/// Tunable weights for [`StateEvaluator`]. Score terms are per point of
/// estimated hand value, count terms per card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluatorWeights {
    /// Lead over the opponents' average estimated score.
    pub score_vs_average: f64,
    /// Lead over the strongest opponent.
    pub score_vs_best: f64,
    /// Fewer cards than the opponents' average.
    pub card_count: f64,
    /// Share of slots the player holds real memory about.
    pub knowledge: f64,
    /// Multiplier on `knowledge` during the first full rounds.
    pub early_knowledge_boost: f64,
    /// Number of turns per seat still considered early game.
    pub early_rounds: u32,
    /// Remembered own cards that can trigger an action.
    pub action_cards: f64,
    /// Per point of a confidently known own card at or above `high_card_points`.
    pub high_card_penalty: f64,
    pub high_card_points: u8,
    /// Deck size below which the round counts as late.
    pub late_deck_size: usize,
    pub late_information_scale: f64,
    pub late_score_scale: f64,
    pub win_bonus: f64,
    pub loss_penalty: f64,
    /// Bonus for having called the end while holding the lowest estimate.
    pub caller_bonus: f64,
}

impl Default for EvaluatorWeights {
    fn default() -> Self {
        Self {
            score_vs_average: 0.10,
            score_vs_best: 0.06,
            card_count: 0.20,
            knowledge: 0.8,
            early_knowledge_boost: 1.5,
            early_rounds: 2,
            action_cards: 0.08,
            high_card_penalty: 0.03,
            high_card_points: 10,
            late_deck_size: 10,
            late_information_scale: 0.35,
            late_score_scale: 1.5,
            win_bonus: 2.5,
            loss_penalty: 2.5,
            caller_bonus: 0.4,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StateEvaluator {
    weights: EvaluatorWeights,
}

impl StateEvaluator {
    pub fn new(weights: EvaluatorWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &EvaluatorWeights {
        &self.weights
    }

    pub fn evaluate(&self, state: &SearchState, perspective: PlayerId) -> f64 {
        logistic(self.raw(state, perspective))
    }

    /// Unsquashed weighted sum.
    pub fn raw(&self, state: &SearchState, perspective: PlayerId) -> f64 {
        let w = &self.weights;
        let Some(own) = state.seat(perspective) else {
            return 0.0;
        };
        let opponents: Vec<&Seat> = state
            .seats()
            .iter()
            .filter(|seat| seat.id != perspective)
            .collect();

        let own_score = f64::from(own.estimated_score());
        let own_count = own.card_count() as f64;
        let (average_score, best_score, average_count) = if opponents.is_empty() {
            (own_score, own_score, own_count)
        } else {
            let n = opponents.len() as f64;
            let scores: Vec<f64> = opponents
                .iter()
                .map(|seat| f64::from(seat.estimated_score()))
                .collect();
            let best = scores.iter().copied().fold(f64::INFINITY, f64::min);
            let count = opponents.iter().map(|seat| seat.card_count() as f64).sum::<f64>();
            (scores.iter().sum::<f64>() / n, best, count / n)
        };

        let mut score = w.score_vs_average * (average_score - own_score)
            + w.score_vs_best * (best_score - own_score)
            + w.card_count * (average_count - own_count);

        let high_points: f64 = own
            .slots
            .iter()
            .flatten()
            .filter(|card| card.belief() > 0.5 && card.rank.points() >= w.high_card_points)
            .map(|card| f64::from(card.rank.points()))
            .sum();
        score -= w.high_card_penalty * high_points;

        let own_ratio = belief_ratio(std::iter::once(own));
        let opponent_ratio = belief_ratio(opponents.iter().copied());
        let mut knowledge = w.knowledge * 0.5 * (own_ratio + opponent_ratio);
        let early_turns = w.early_rounds.saturating_mul(state.seats().len() as u32);
        if state.turn_count() < early_turns {
            knowledge *= w.early_knowledge_boost;
        }
        let action_cards = own
            .slots
            .iter()
            .flatten()
            .filter(|card| card.is_remembered() && card.rank.action().is_some())
            .count() as f64;
        let mut information = knowledge + w.action_cards * action_cards;

        if state.end_triggered() || state.deck_size() < w.late_deck_size {
            information *= w.late_information_scale;
            score *= w.late_score_scale;
        }

        let mut total = score + information;
        if state.is_terminal() {
            if state.winner() == Some(perspective) {
                total += w.win_bonus;
            } else {
                total -= w.loss_penalty;
            }
        }
        if state.end_caller() == Some(perspective) && own_score < best_score {
            total += w.caller_bonus;
        }
        total
    }
}

fn belief_ratio<'a>(seats: impl Iterator<Item = &'a Seat>) -> f64 {
    let mut slots = 0usize;
    let mut belief = 0.0f64;
    for seat in seats {
        for slot in &seat.slots {
            slots += 1;
            belief += slot.map(|card| f64::from(card.belief())).unwrap_or(0.0);
        }
    }
    if slots == 0 { 0.0 } else { belief / slots as f64 }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabo_core::game::state::SlotCard;
    use cabo_core::model::rank::Rank;

    fn hand(ranks: &[Rank]) -> Vec<Option<SlotCard>> {
        ranks.iter().map(|&r| Some(SlotCard::revealed(r))).collect()
    }

    fn table(own: &[Rank], other: &[Rank]) -> SearchState {
        SearchState::new(
            PlayerId(0),
            vec![
                Seat::new(PlayerId(0), hand(own)),
                Seat::new(PlayerId(1), hand(other)),
            ],
            0,
        )
        .with_deck_size(30)
        .with_turn_count(10)
    }

    #[test]
    fn value_stays_inside_unit_interval() {
        let evaluator = StateEvaluator::default();
        let good = table(&[Rank::Joker, Rank::Ace], &[Rank::King, Rank::King, Rank::Queen]);
        let bad = table(&[Rank::King, Rank::King, Rank::Queen], &[Rank::Joker, Rank::Ace]);
        for state in [&good, &bad] {
            let value = evaluator.evaluate(state, PlayerId(0));
            assert!(value > 0.0 && value < 1.0);
        }
        assert!(evaluator.evaluate(&good, PlayerId(0)) > evaluator.evaluate(&bad, PlayerId(0)));
    }

    #[test]
    fn late_game_shrinks_information_weight() {
        let evaluator = StateEvaluator::new(EvaluatorWeights {
            score_vs_average: 0.0,
            score_vs_best: 0.0,
            card_count: 0.0,
            high_card_penalty: 0.0,
            ..EvaluatorWeights::default()
        });
        let early = table(&[Rank::Two, Rank::Three], &[Rank::Four, Rank::Five]);
        let late = early.clone().with_deck_size(3);
        let early_raw = evaluator.raw(&early, PlayerId(0));
        let late_raw = evaluator.raw(&late, PlayerId(0));
        assert!((late_raw - early_raw * 0.35).abs() < 1e-9);
    }

    #[test]
    fn zero_weights_are_neutral() {
        let zero = EvaluatorWeights {
            score_vs_average: 0.0,
            score_vs_best: 0.0,
            card_count: 0.0,
            knowledge: 0.0,
            action_cards: 0.0,
            high_card_penalty: 0.0,
            win_bonus: 0.0,
            loss_penalty: 0.0,
            caller_bonus: 0.0,
            ..EvaluatorWeights::default()
        };
        let evaluator = StateEvaluator::new(zero);
        let state = table(&[Rank::Two], &[Rank::King]);
        assert!((evaluator.evaluate(&state, PlayerId(0)) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn missing_player_is_neutral() {
        let evaluator = StateEvaluator::default();
        let state = table(&[Rank::Two], &[Rank::King]);
        assert_eq!(evaluator.evaluate(&state, PlayerId(7)), 0.5);
    }
}
