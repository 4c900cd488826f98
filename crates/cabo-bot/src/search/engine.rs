//! Determinized Monte Carlo tree search under a wall-clock budget.

use super::determinize::determinize;
use super::evaluator::StateEvaluator;
use super::node::NodeId;
use super::tree::SearchTree;
use crate::memory::RankPool;
use crate::tier::SearchProfile;
use cabo_core::game::moves::Move;
use cabo_core::game::rules::{MoveGenerator, StateTransition};
use cabo_core::game::state::SearchState;
use cabo_core::model::player::PlayerId;
use rand::Rng;
use rand::seq::SliceRandom;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    pub time_budget: Duration,
    pub max_iterations: usize,
    pub rollout_depth: usize,
    pub exploration: f64,
}

impl From<SearchProfile> for SearchConfig {
    fn from(profile: SearchProfile) -> Self {
        Self {
            time_budget: profile.time_budget(),
            max_iterations: profile.max_iterations,
            rollout_depth: profile.rollout_depth,
            exploration: profile.exploration,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChildSummary {
    pub mv: Move,
    pub visits: u32,
    pub mean_reward: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub best_move: Move,
    pub iterations: usize,
    pub elapsed: Duration,
    pub nodes: usize,
    pub root_children: Vec<ChildSummary>,
}

impl SearchReport {
    /// True when the search never expanded the root.
    pub fn is_fallback(&self) -> bool {
        self.root_children.is_empty()
    }
}

pub struct SearchEngine<G, T> {
    generator: G,
    transition: T,
    evaluator: StateEvaluator,
    config: SearchConfig,
}

impl<G, T> SearchEngine<G, T>
where
    G: MoveGenerator,
    T: StateTransition,
{
    pub fn new(generator: G, transition: T, evaluator: StateEvaluator, config: SearchConfig) -> Self {
        Self {
            generator,
            transition,
            evaluator,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SearchConfig) {
        self.config = config;
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn evaluator(&self) -> &StateEvaluator {
        &self.evaluator
    }

    pub fn set_evaluator(&mut self, evaluator: StateEvaluator) {
        self.evaluator = evaluator;
    }

    /// Searches from `root` for `root.perspective()` until either the
    /// deadline or the iteration cap is reached, whichever comes first.
    pub fn search<R: Rng + ?Sized>(&self, root: &SearchState, pool: &RankPool, rng: &mut R) -> SearchReport {
        let started = Instant::now();
        let deadline = started + self.config.time_budget;
        let perspective = root.perspective();
        let mut tree = SearchTree::new(root.clone(), self.generator.generate(root));

        let mut iterations = 0usize;
        while iterations < self.config.max_iterations && Instant::now() < deadline {
            let mut cursor = NodeId::ROOT;
            loop {
                let node = tree.node(cursor);
                if !node.is_fully_expanded() || node.is_leaf() {
                    break;
                }
                cursor = self.select_child(&tree, cursor, perspective);
            }

            let node = tree.node_mut(cursor);
            if !node.untried.is_empty() && !node.state.is_terminal() {
                let pick = rng.gen_range(0..node.untried.len());
                let mv = node.untried.swap_remove(pick);
                let next = self.transition.apply(&tree.node(cursor).state, &mv);
                let untried = self.generator.generate(&next);
                cursor = tree.add_child(cursor, mv, next, untried);
            }

            let reward = self.simulate(&tree.node(cursor).state, pool, rng);
            tree.backpropagate(cursor, reward);
            iterations += 1;
        }

        let best = best_child(&tree);
        let best_move = best
            .and_then(|id| tree.node(id).mv.clone())
            .unwrap_or(Move::Pass { player: perspective });
        let root_children = tree
            .root()
            .children
            .iter()
            .filter_map(|&id| {
                let child = tree.node(id);
                child.mv.clone().map(|mv| ChildSummary {
                    mv,
                    visits: child.visits,
                    mean_reward: child.mean_reward(),
                })
            })
            .collect();
        let elapsed = started.elapsed();

        debug!(
            target: "cabo_bot::search",
            player = %perspective,
            iterations,
            elapsed_ms = elapsed.as_millis() as u64,
            nodes = tree.len(),
            best = %best_move,
            "search finished"
        );

        SearchReport {
            best_move,
            iterations,
            elapsed,
            nodes: tree.len(),
            root_children,
        }
    }

    /// UCB1 over the children of `parent`. Rewards are stored from the
    /// searching player's side; opponents' moves are scored from theirs.
    fn select_child(&self, tree: &SearchTree, parent: NodeId, perspective: PlayerId) -> NodeId {
        let parent_node = tree.node(parent);
        let log_parent = f64::from(parent_node.visits.max(1)).ln();
        let mut best = parent_node.children[0];
        let mut best_score = f64::NEG_INFINITY;
        for &id in &parent_node.children {
            let child = tree.node(id);
            if child.visits == 0 {
                return id;
            }
            let mean = child.mean_reward();
            let exploit = match &child.mv {
                Some(mv) if mv.player() != perspective => 1.0 - mean,
                _ => mean,
            };
            let score = exploit + self.config.exploration * (log_parent / f64::from(child.visits)).sqrt();
            if score > best_score {
                best_score = score;
                best = id;
            }
        }
        best
    }

    fn simulate<R: Rng + ?Sized>(&self, state: &SearchState, pool: &RankPool, rng: &mut R) -> f64 {
        let mut world = determinize(state, pool, rng);
        for _ in 0..self.config.rollout_depth {
            if world.is_terminal() {
                break;
            }
            let moves = self.generator.generate(&world);
            let Some(mv) = moves.choose(rng) else {
                break;
            };
            world = self.transition.apply(&world, mv);
        }
        self.evaluator.evaluate(&world, state.perspective())
    }
}

/// Root child with the strictly highest visit count; the first one seen wins ties.
fn best_child(tree: &SearchTree) -> Option<NodeId> {
    let mut best: Option<(NodeId, u32)> = None;
    for &id in &tree.root().children {
        let visits = tree.node(id).visits;
        match best {
            Some((_, most)) if visits <= most => {}
            _ => best = Some((id, visits)),
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabo_core::game::rules::StandardRules;
    use cabo_core::game::state::{Seat, SlotCard};
    use cabo_core::model::rank::Rank;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn engine(time_budget: Duration, max_iterations: usize) -> SearchEngine<StandardRules, StandardRules> {
        SearchEngine::new(
            StandardRules::new(),
            StandardRules::new(),
            StateEvaluator::default(),
            SearchConfig {
                time_budget,
                max_iterations,
                rollout_depth: 30,
                exploration: std::f64::consts::SQRT_2,
            },
        )
    }

    fn opening() -> SearchState {
        let own = vec![
            Some(SlotCard::revealed(Rank::Two)),
            Some(SlotCard::revealed(Rank::Queen)),
            None,
            None,
        ];
        SearchState::new(
            PlayerId(0),
            vec![Seat::new(PlayerId(0), own), Seat::unknown(PlayerId(1), 4)],
            0,
        )
        .with_deck_size(40)
        .with_discard_top(Some(Rank::Ace))
    }

    #[test]
    fn zero_iteration_cap_passes() {
        let mut rng = SmallRng::seed_from_u64(1);
        let report = engine(Duration::from_secs(5), 0).search(&opening(), &RankPool::canonical(), &mut rng);
        assert_eq!(report.best_move, Move::Pass { player: PlayerId(0) });
        assert_eq!(report.iterations, 0);
        assert!(report.is_fallback());
    }

    #[test]
    fn terminal_root_passes() {
        let mut rng = SmallRng::seed_from_u64(2);
        let root = SearchState::new(PlayerId(0), Vec::new(), 0);
        let report = engine(Duration::from_millis(50), 100).search(&root, &RankPool::canonical(), &mut rng);
        assert_eq!(report.best_move, Move::Pass { player: PlayerId(0) });
        assert_eq!(report.nodes, 1);
    }

    #[test]
    fn iteration_cap_bounds_work() {
        let mut rng = SmallRng::seed_from_u64(3);
        let report = engine(Duration::from_secs(30), 64).search(&opening(), &RankPool::canonical(), &mut rng);
        assert_eq!(report.iterations, 64);
        let visits: u32 = report.root_children.iter().map(|child| child.visits).sum();
        assert_eq!(visits, 64);
        assert!(matches!(
            report.best_move,
            Move::Draw { .. } | Move::TakeDiscard { .. }
        ));
    }

    #[test]
    fn deadline_stops_uncapped_search() {
        let mut rng = SmallRng::seed_from_u64(4);
        let budget = Duration::from_millis(40);
        let report = engine(budget, usize::MAX).search(&opening(), &RankPool::canonical(), &mut rng);
        assert!(report.iterations > 0);
        assert!(report.elapsed < budget + Duration::from_millis(500));
    }

    #[test]
    fn best_child_prefers_first_of_equal_visits() {
        let mut tree = SearchTree::new(opening(), Vec::new());
        let a = tree.add_child(NodeId::ROOT, Move::Draw { player: PlayerId(0) }, opening(), Vec::new());
        let b = tree.add_child(NodeId::ROOT, Move::TakeDiscard { player: PlayerId(0) }, opening(), Vec::new());
        tree.backpropagate(a, 0.1);
        tree.backpropagate(b, 0.9);
        assert_eq!(best_child(&tree), Some(a));
        tree.backpropagate(b, 0.0);
        assert_eq!(best_child(&tree), Some(b));
    }
}
