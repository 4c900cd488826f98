use cabo_core::game::moves::Move;
use cabo_core::game::state::SearchState;

/// Index of a node in a [`SearchTree`](super::tree::SearchTree) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct SearchNode {
    pub state: SearchState,
    /// Move that produced this node; `None` for the root.
    pub mv: Option<Move>,
    /// Back-reference used only while backpropagating.
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub untried: Vec<Move>,
    pub visits: u32,
    pub total_reward: f64,
}

impl SearchNode {
    pub fn root(state: SearchState, untried: Vec<Move>) -> Self {
        Self {
            state,
            mv: None,
            parent: None,
            children: Vec::new(),
            untried,
            visits: 0,
            total_reward: 0.0,
        }
    }

    pub fn child(parent: NodeId, mv: Move, state: SearchState, untried: Vec<Move>) -> Self {
        Self {
            mv: Some(mv),
            parent: Some(parent),
            ..Self::root(state, untried)
        }
    }

    pub fn mean_reward(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.total_reward / f64::from(self.visits)
        }
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
