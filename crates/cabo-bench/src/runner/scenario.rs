//! Seeded table positions shared by every benchmarked agent.

use cabo_bot::{DecisionContext, DrawnCard, KnownCard, SeatInfo};
use cabo_core::model::deck::Deck;
use cabo_core::model::player::PlayerId;
use cabo_core::model::rank::Rank;

use super::RunnerError;

/// Cards each player has looked at before the first turn.
const OPENING_PEEKS: usize = 2;

#[derive(Debug, Clone)]
pub struct Scenario {
    pub index: usize,
    pub seed: u64,
    pub context: DecisionContext,
    /// Card the bot will be holding for drawn-card decisions.
    pub drawn: Rank,
}

impl Scenario {
    /// Deals a fresh table from `seed`. The bot sits at seat 0 and it is its
    /// turn after one full round of play, so ending the round is legal.
    pub fn deal(
        index: usize,
        seed: u64,
        players: usize,
        hand_size: usize,
    ) -> Result<Self, RunnerError> {
        let mut deck = Deck::shuffled_with_seed(seed);
        let mut hands = Vec::with_capacity(players);
        for _ in 0..players {
            let mut hand = Vec::with_capacity(hand_size);
            for _ in 0..hand_size {
                hand.push(draw(&mut deck)?);
            }
            hands.push(hand);
        }
        let discard = draw(&mut deck)?;
        let drawn = draw(&mut deck)?;

        let bot = PlayerId(0);
        let seats = (0..players)
            .map(|seat| SeatInfo {
                player: PlayerId(seat as u8),
                card_count: hand_size,
            })
            .collect();
        let opponent_knowledge = hands
            .get(1)
            .and_then(|hand| hand.first())
            .map(|&rank| KnownCard {
                player: PlayerId(1),
                position: 0,
                rank,
            })
            .into_iter()
            .collect();
        let own_hand = hands.into_iter().next().unwrap_or_default();

        let context = DecisionContext {
            bot,
            known_positions: (0..OPENING_PEEKS.min(own_hand.len())).collect(),
            own_hand,
            seats,
            current: bot,
            discard_top: Some(discard),
            end_caller: None,
            turn_count: players as u32,
            deck_size: deck.len(),
            drawn: None,
            opponent_knowledge,
        };

        Ok(Self {
            index,
            seed,
            context,
            drawn,
        })
    }

    pub fn id(&self) -> String {
        format!("S{:05}", self.index)
    }

    /// The same table with a card freshly drawn from the deck.
    pub fn with_drawn(&self) -> DecisionContext {
        let mut context = self.context.clone();
        context.drawn = Some(DrawnCard {
            rank: self.drawn,
            from_discard: false,
        });
        context
    }
}

fn draw(deck: &mut Deck) -> Result<Rank, RunnerError> {
    deck.draw().ok_or_else(|| RunnerError::Deal {
        message: "deck ran out while dealing".to_string(),
    })
}
