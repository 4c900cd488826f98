pub mod bot;
pub mod memory;
pub mod search;
pub mod tier;

pub use bot::{
    ActionChoice, ActionContext, DecisionContext, DecisionError, DrawnCard, KnownCard, SearchBot,
    SeatInfo, TurnAction,
};
pub use memory::{CardMemoryStore, CardObservation, PlayerMemory, RankPool};
pub use search::{EvaluatorWeights, SearchConfig, SearchEngine, SearchReport, StateEvaluator};
pub use tier::{MemoryProfile, SearchOverrides, SearchProfile, SkillTier, TierProfile};
