//! Imperfect card memory.
//!
//! Every bot owns one [`CardMemoryStore`]. Observations may be missed,
//! confidence fades with wall-clock time, records are randomly forgotten at
//! turn boundaries and the store only holds a bounded number of slots. The
//! numbers behind all of this come from the bot's [`MemoryProfile`].

mod pool;

pub use pool::RankPool;

use crate::tier::{MemoryProfile, SkillTier};
use cabo_core::model::player::PlayerId;
use cabo_core::model::rank::Rank;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::trace;

/// Records whose confidence falls below this are dropped.
pub const FORGET_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct CardObservation {
    pub rank: Rank,
    pub confidence: f64,
    pub observed_at: Instant,
    pub(crate) decayed_at: Instant,
    pub observations: u32,
    /// Whether this record holds a copy of `rank` out of the pool.
    pub(crate) reserved: bool,
}

impl CardObservation {
    pub fn is_reserved(&self) -> bool {
        self.reserved
    }
}

/// Everything remembered about one player's slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerMemory {
    slots: BTreeMap<usize, CardObservation>,
}

impl PlayerMemory {
    pub fn get(&self, position: usize) -> Option<&CardObservation> {
        self.slots.get(&position)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &CardObservation)> + '_ {
        self.slots.iter().map(|(&position, obs)| (position, obs))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CardMemoryStore {
    profile: MemoryProfile,
    players: BTreeMap<PlayerId, PlayerMemory>,
    pool: RankPool,
    rng: SmallRng,
}

impl CardMemoryStore {
    pub fn new(profile: MemoryProfile) -> Self {
        Self::with_rng(profile, SmallRng::from_entropy())
    }

    pub fn for_tier(tier: SkillTier) -> Self {
        Self::new(tier.profile().memory)
    }

    /// Deterministic store for tests and benchmark replays.
    pub fn seeded(profile: MemoryProfile, seed: u64) -> Self {
        Self::with_rng(profile, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(profile: MemoryProfile, rng: SmallRng) -> Self {
        Self {
            profile,
            players: BTreeMap::new(),
            pool: RankPool::canonical(),
            rng,
        }
    }

    pub fn profile(&self) -> &MemoryProfile {
        &self.profile
    }

    pub fn rank_pool(&self) -> &RankPool {
        &self.pool
    }

    pub fn player(&self, player: PlayerId) -> Option<&PlayerMemory> {
        self.players.get(&player)
    }

    /// Total number of slot records across all players.
    pub fn len(&self) -> usize {
        self.players.values().map(PlayerMemory::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn observe(&mut self, rank: Rank, player: PlayerId, position: usize) {
        self.observe_at(rank, player, position, Instant::now());
    }

    /// Records that `rank` was seen at `player`'s `position` at time `now`.
    ///
    /// The tier's accuracy roll may silently discard the observation.
    pub fn observe_at(&mut self, rank: Rank, player: PlayerId, position: usize, now: Instant) {
        let accuracy = self.profile.accuracy.clamp(0.0, 1.0);
        if accuracy < 1.0 && !self.rng.gen_bool(accuracy) {
            trace!(target: "cabo_bot::memory", %player, position, "observation missed");
            return;
        }

        let required = self.profile.observations_for_high_confidence.max(1);
        let existing = self
            .players
            .get_mut(&player)
            .and_then(|memory| memory.slots.remove(&position));

        let record = match existing {
            Some(mut record) if record.rank == rank => {
                record.observations = record.observations.saturating_add(1);
                let boosted = record.confidence + 0.5 / f64::from(required);
                record.confidence = boosted
                    .max(confidence_curve(record.observations, required))
                    .min(1.0);
                record.observed_at = now;
                record.decayed_at = now;
                record
            }
            previous => {
                if let Some(old) = previous {
                    if old.reserved {
                        self.pool.release(old.rank);
                    }
                }
                let reserved = self.pool.reserve(rank);
                CardObservation {
                    rank,
                    confidence: confidence_curve(1, required),
                    observed_at: now,
                    decayed_at: now,
                    observations: 1,
                    reserved,
                }
            }
        };

        self.players
            .entry(player)
            .or_default()
            .slots
            .insert(position, record);
        self.enforce_capacity();
    }

    pub fn forget(&mut self, player: PlayerId, position: usize) {
        if let Some(record) = self
            .players
            .get_mut(&player)
            .and_then(|memory| memory.slots.remove(&position))
        {
            self.release(&record);
        }
    }

    pub fn decay(&mut self) {
        self.decay_at(Instant::now());
    }

    /// Applies exponential decay to every record up to `now` and drops the
    /// ones that fell below [`FORGET_THRESHOLD`].
    pub fn decay_at(&mut self, now: Instant) {
        let rate = self.profile.decay_per_ms.max(0.0);
        let mut released = Vec::new();
        for memory in self.players.values_mut() {
            memory.slots.retain(|_, record| {
                let elapsed = now.saturating_duration_since(record.decayed_at);
                let elapsed_ms = elapsed.as_secs_f64() * 1_000.0;
                record.confidence = (record.confidence * (-rate * elapsed_ms).exp()).max(0.0);
                if now > record.decayed_at {
                    record.decayed_at = now;
                }
                if record.confidence < FORGET_THRESHOLD {
                    released.push(record.clone());
                    false
                } else {
                    true
                }
            });
        }
        for record in &released {
            self.release(record);
        }
    }

    /// Each record is independently dropped with the tier's forget chance.
    pub fn process_turn_boundary(&mut self) {
        let chance = self.profile.forget_chance.clamp(0.0, 1.0);
        if chance <= 0.0 {
            return;
        }
        let mut released = Vec::new();
        for memory in self.players.values_mut() {
            let rng = &mut self.rng;
            memory.slots.retain(|_, record| {
                if rng.gen_bool(chance) {
                    released.push(record.clone());
                    false
                } else {
                    true
                }
            });
        }
        if !released.is_empty() {
            trace!(target: "cabo_bot::memory", dropped = released.len(), "turn boundary forgetting");
        }
        for record in &released {
            self.release(record);
        }
    }

    /// Evicts the lowest-confidence records until the store fits its capacity.
    pub fn enforce_capacity(&mut self) {
        while self.len() > self.profile.capacity {
            let Some((player, position)) = self.weakest() else {
                break;
            };
            trace!(target: "cabo_bot::memory", %player, position, "evicting weakest record");
            self.forget(player, position);
        }
    }

    fn weakest(&self) -> Option<(PlayerId, usize)> {
        let mut weakest: Option<(PlayerId, usize, f64)> = None;
        for (&player, memory) in &self.players {
            for (position, record) in memory.iter() {
                match weakest {
                    Some((_, _, confidence)) if record.confidence >= confidence => {}
                    _ => weakest = Some((player, position, record.confidence)),
                }
            }
        }
        weakest.map(|(player, position, _)| (player, position))
    }

    pub fn query(&self, player: PlayerId, position: usize) -> Option<&CardObservation> {
        self.players.get(&player)?.get(position)
    }

    pub fn confidence(&self, player: PlayerId, position: usize) -> f64 {
        self.query(player, position)
            .map(|record| record.confidence)
            .unwrap_or(0.0)
    }

    pub fn sample_unknown_rank(&mut self) -> Option<Rank> {
        self.pool.sample(&mut self.rng)
    }

    /// Moves whatever is remembered about two slots along with the cards
    /// after a swap the bot watched happen.
    pub fn swap_slots(&mut self, a: (PlayerId, usize), b: (PlayerId, usize)) {
        if a == b {
            return;
        }
        let first = self
            .players
            .get_mut(&a.0)
            .and_then(|memory| memory.slots.remove(&a.1));
        let second = self
            .players
            .get_mut(&b.0)
            .and_then(|memory| memory.slots.remove(&b.1));
        if let Some(record) = first {
            self.players.entry(b.0).or_default().slots.insert(b.1, record);
        }
        if let Some(record) = second {
            self.players.entry(a.0).or_default().slots.insert(a.1, record);
        }
    }

    /// Clears all knowledge for a new round.
    pub fn reset(&mut self) {
        self.players.clear();
        self.pool.restore();
    }

    fn release(&mut self, record: &CardObservation) {
        if record.reserved {
            self.pool.release(record.rank);
        }
    }
}

fn confidence_curve(observations: u32, required: u32) -> f64 {
    let progress = (f64::from(observations) / f64::from(required)).min(1.0);
    0.5 + 0.5 * progress
}
