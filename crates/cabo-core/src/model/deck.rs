use crate::model::rank::Rank;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Per-rank card multiset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RankCounts {
    counts: [u8; Rank::COUNT],
}

impl RankCounts {
    pub const fn empty() -> Self {
        Self {
            counts: [0; Rank::COUNT],
        }
    }

    /// Composition of the shared deck: four of every rank, two jokers.
    pub fn canonical() -> Self {
        let mut counts = [0u8; Rank::COUNT];
        for rank in Rank::ORDERED {
            counts[rank.index()] = rank.copies_in_deck();
        }
        Self { counts }
    }

    pub fn get(&self, rank: Rank) -> u8 {
        self.counts[rank.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|&count| count as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Removes one card of `rank`; returns false when none remain.
    pub fn take_one(&mut self, rank: Rank) -> bool {
        let slot = &mut self.counts[rank.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    pub fn put_back(&mut self, rank: Rank) {
        let slot = &mut self.counts[rank.index()];
        *slot = slot.saturating_add(1);
    }

    /// Draws one rank weighted by remaining copies (uniform over individual
    /// cards) without removing it.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Rank> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let mut choice = rng.gen_range(0..total);
        for rank in Rank::ORDERED {
            let count = self.get(rank) as usize;
            if choice < count {
                return Some(rank);
            }
            choice -= count;
        }
        None
    }

    /// Draws and removes one card.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Rank> {
        let rank = self.sample(rng)?;
        self.take_one(rank);
        Some(rank)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rank, u8)> + '_ {
        Rank::ORDERED.iter().map(|&rank| (rank, self.get(rank)))
    }

    /// Expands the multiset into individual cards in rank order.
    pub fn to_cards(&self) -> Vec<Rank> {
        let mut cards = Vec::with_capacity(self.total());
        for (rank, count) in self.iter() {
            cards.extend(std::iter::repeat_n(rank, count as usize));
        }
        cards
    }
}

impl Default for RankCounts {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Mean points of a card drawn from a full canonical deck.
pub fn canonical_mean_points() -> f32 {
    let counts = RankCounts::canonical();
    let total_points: u32 = counts
        .iter()
        .map(|(rank, count)| u32::from(rank.points()) * u32::from(count))
        .sum();
    total_points as f32 / counts.total() as f32
}

#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Rank>,
}

impl Deck {
    pub fn standard() -> Self {
        Self {
            cards: RankCounts::canonical().to_cards(),
        }
    }

    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    pub fn shuffle_in_place<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn cards(&self) -> &[Rank] {
        &self.cards
    }

    /// Removes and returns the top card.
    pub fn draw(&mut self) -> Option<Rank> {
        self.cards.pop()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;

    #[test]
    fn standard_deck_has_fifty_four_cards() {
        let deck = Deck::standard();
        assert_eq!(deck.cards().len(), 54);
        assert_eq!(
            deck.cards().iter().filter(|&&r| r == Rank::Joker).count(),
            2
        );
    }

    #[test]
    fn shuffle_with_seed_is_deterministic() {
        let deck_a = Deck::shuffled_with_seed(42);
        let deck_b = Deck::shuffled_with_seed(42);
        assert_eq!(deck_a.cards(), deck_b.cards());
    }

    #[test]
    fn shuffle_with_different_seeds_differs() {
        let deck_a = Deck::shuffled_with_seed(1);
        let deck_b = Deck::shuffled_with_seed(2);
        assert_ne!(deck_a.cards(), deck_b.cards());
    }

    #[test]
    fn take_one_stops_at_zero() {
        let mut counts = RankCounts::canonical();
        assert!(counts.take_one(Rank::Joker));
        assert!(counts.take_one(Rank::Joker));
        assert!(!counts.take_one(Rank::Joker));
        assert_eq!(counts.get(Rank::Joker), 0);
        assert_eq!(counts.total(), 52);
    }

    #[test]
    fn sample_only_returns_remaining_ranks() {
        let mut counts = RankCounts::empty();
        counts.put_back(Rank::Nine);
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..32 {
            assert_eq!(counts.sample(&mut rng), Some(Rank::Nine));
        }
        assert_eq!(counts.draw(&mut rng), Some(Rank::Nine));
        assert_eq!(counts.sample(&mut rng), None);
    }

    #[test]
    fn mean_points_matches_composition() {
        let mean = canonical_mean_points();
        assert!((mean - 364.0 / 54.0).abs() < 1e-5);
    }
}
