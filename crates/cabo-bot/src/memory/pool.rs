use cabo_core::model::deck::RankCounts;
use cabo_core::model::rank::Rank;
use rand::Rng;

/// Per-rank counts of cards the bot has not pinned to any slot.
///
/// Starts at the canonical deck composition. A remembered slot holds a
/// reservation against its rank; forgetting the slot hands it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankPool {
    remaining: RankCounts,
}

impl RankPool {
    pub fn canonical() -> Self {
        Self {
            remaining: RankCounts::canonical(),
        }
    }

    pub fn remaining(&self, rank: Rank) -> u8 {
        self.remaining.get(rank)
    }

    pub fn total(&self) -> usize {
        self.remaining.total()
    }

    pub fn counts(&self) -> &RankCounts {
        &self.remaining
    }

    /// Takes one copy of `rank` out of the pool. Returns false when the rank
    /// is already exhausted, in which case nothing changes.
    pub(crate) fn reserve(&mut self, rank: Rank) -> bool {
        self.remaining.take_one(rank)
    }

    /// Returns a previously reserved copy, never exceeding the deck composition.
    pub(crate) fn release(&mut self, rank: Rank) {
        if self.remaining.get(rank) < rank.copies_in_deck() {
            self.remaining.put_back(rank);
        }
    }

    /// Uniform over individual remaining cards; `None` once exhausted.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Rank> {
        self.remaining.sample(rng)
    }

    pub(crate) fn restore(&mut self) {
        self.remaining = RankCounts::canonical();
    }
}

impl Default for RankPool {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn reserve_stops_at_zero() {
        let mut pool = RankPool::canonical();
        assert!(pool.reserve(Rank::Joker));
        assert!(pool.reserve(Rank::Joker));
        assert!(!pool.reserve(Rank::Joker));
        assert_eq!(pool.remaining(Rank::Joker), 0);
        assert_eq!(pool.total(), 52);
    }

    #[test]
    fn release_never_exceeds_composition() {
        let mut pool = RankPool::canonical();
        pool.release(Rank::Queen);
        assert_eq!(pool.remaining(Rank::Queen), 4);
        assert!(pool.reserve(Rank::Queen));
        pool.release(Rank::Queen);
        assert_eq!(pool.remaining(Rank::Queen), 4);
    }

    #[test]
    fn exhausted_pool_samples_nothing() {
        let mut pool = RankPool::canonical();
        for rank in Rank::ORDERED {
            while pool.reserve(rank) {}
        }
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(pool.sample(&mut rng), None);
        pool.restore();
        assert_eq!(pool.total(), 54);
    }
}
