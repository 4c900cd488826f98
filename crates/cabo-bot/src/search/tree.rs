//! Arena-allocated search tree, built and dropped once per decision.

use super::node::{NodeId, SearchNode};
use cabo_core::game::moves::Move;
use cabo_core::game::state::SearchState;

#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
}

impl SearchTree {
    pub fn new(root: SearchState, untried: Vec<Move>) -> Self {
        Self {
            nodes: vec![SearchNode::root(root, untried)],
        }
    }

    pub fn root(&self) -> &SearchNode {
        &self.nodes[NodeId::ROOT.0]
    }

    /// # Panics
    /// Panics if `id` did not come from this tree.
    pub fn node(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id.0]
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        mv: Move,
        state: SearchState,
        untried: Vec<Move>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SearchNode::child(parent, mv, state, untried));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Adds `reward` to every node from `leaf` up to the root.
    pub fn backpropagate(&mut self, leaf: NodeId, reward: f64) {
        let mut cursor = Some(leaf);
        while let Some(id) = cursor {
            let node = &mut self.nodes[id.0];
            node.visits = node.visits.saturating_add(1);
            node.total_reward += reward;
            cursor = node.parent;
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabo_core::game::state::Seat;
    use cabo_core::model::player::PlayerId;

    fn state() -> SearchState {
        SearchState::new(PlayerId(0), vec![Seat::unknown(PlayerId(0), 4)], 0)
    }

    #[test]
    fn backpropagation_reaches_root_only_along_path() {
        let mut tree = SearchTree::new(state(), Vec::new());
        let a = tree.add_child(NodeId::ROOT, Move::Draw { player: PlayerId(0) }, state(), Vec::new());
        let b = tree.add_child(NodeId::ROOT, Move::Pass { player: PlayerId(0) }, state(), Vec::new());
        let a1 = tree.add_child(a, Move::Discard { player: PlayerId(0) }, state(), Vec::new());

        tree.backpropagate(a1, 0.5);
        tree.backpropagate(b, 1.0);

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.root().visits, 2);
        assert!((tree.root().total_reward - 1.5).abs() < 1e-12);
        assert_eq!(tree.node(a).visits, 1);
        assert_eq!(tree.node(a1).parent, Some(a));
        assert_eq!(tree.root().children, vec![a, b]);
    }
}
