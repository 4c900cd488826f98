pub mod determinize;
pub mod engine;
pub mod evaluator;
pub mod node;
pub mod tree;

pub use determinize::determinize;
pub use engine::{ChildSummary, SearchConfig, SearchEngine, SearchReport};
pub use evaluator::{EvaluatorWeights, StateEvaluator};
pub use node::{NodeId, SearchNode};
pub use tree::SearchTree;
