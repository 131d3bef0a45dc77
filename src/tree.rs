//! Tree data structures for the guided search
//!
//! The search tree is a mapping from puzzle state to [`NodeInfo`]. Records
//! live in an arena and are addressed by [`NodeId`]; the state-to-id map
//! is the only way in, so no record holds a reference to another one.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{evaluator::ValuePolicyPair, puzzle::PuzzleState, utils::puct_exploration};

/// Index of a record in the [`SearchTree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Id of the first state inserted into a tree
    pub fn root() -> Self {
        NodeId(0)
    }
}

/// Per-state search statistics, one slot per move class
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    prior: Vec<f64>,
    visit_counts: Vec<u64>,
    action_values: Vec<f64>,
    virtual_losses: Vec<f64>,
    /// Network value estimate for the state itself
    value: f64,
}

impl NodeInfo {
    /// Creates a record with zero visits and zero action-values
    ///
    /// `prior` is stored verbatim and fixes the number of move classes.
    pub fn create_new(prior: Vec<f64>) -> Self {
        let moves = prior.len();
        NodeInfo {
            prior,
            visit_counts: vec![0; moves],
            action_values: vec![0.0; moves],
            virtual_losses: vec![0.0; moves],
            value: 0.0,
        }
    }

    /// Creates a record from a network evaluation, keeping its value
    pub fn from_evaluation(pair: ValuePolicyPair) -> Self {
        let mut info = Self::create_new(pair.policy);
        info.value = pair.value;
        info
    }

    /// Number of move classes
    pub fn move_count(&self) -> usize {
        self.prior.len()
    }

    /// Prior probability of a move
    pub fn prior(&self, move_id: usize) -> f64 {
        self.prior[move_id]
    }

    /// Times a move has been backed up through
    pub fn visit_count(&self, move_id: usize) -> u64 {
        self.visit_counts[move_id]
    }

    /// Sum of visit counts over all moves
    pub fn total_visits(&self) -> u64 {
        self.visit_counts.iter().sum()
    }

    /// Mean backed-up value of a move
    pub fn action_value(&self, move_id: usize) -> f64 {
        self.action_values[move_id]
    }

    /// Sum of all values backed up through a move
    pub fn total_value(&self, move_id: usize) -> f64 {
        self.action_values[move_id] * self.visit_counts[move_id] as f64
    }

    /// Virtual loss currently charged to a move
    pub fn virtual_loss(&self, move_id: usize) -> f64 {
        self.virtual_losses[move_id]
    }

    /// Network value estimate recorded when the node was created
    pub fn value(&self) -> f64 {
        self.value
    }

    /// PUCT score of a move
    ///
    /// `Q(m) - L(m) + c * P(m) * sqrt(parent_total_visits) / (1 + N(m))`,
    /// where `L(m)` is the virtual loss, zero outside a simulation.
    pub fn selection_score(
        &self,
        move_id: usize,
        parent_total_visits: u64,
        exploration_factor: f64,
    ) -> f64 {
        self.action_values[move_id] - self.virtual_losses[move_id]
            + puct_exploration(
                self.prior[move_id],
                parent_total_visits,
                self.visit_counts[move_id],
                exploration_factor,
            )
    }

    /// Counts a visit and folds `observed_value` into the running mean
    pub fn record_visit(&mut self, move_id: usize, observed_value: f64) {
        self.visit_counts[move_id] += 1;
        let n = self.visit_counts[move_id] as f64;
        self.action_values[move_id] += (observed_value - self.action_values[move_id]) / n;
    }

    /// Charges a virtual loss to a move
    pub fn add_virtual_loss(&mut self, move_id: usize, loss: f64) {
        self.virtual_losses[move_id] += loss;
    }

    /// Refunds a virtual loss previously charged to a move
    pub fn remove_virtual_loss(&mut self, move_id: usize, loss: f64) {
        let remaining = self.virtual_losses[move_id] - loss;
        // Snap float residue back to zero
        self.virtual_losses[move_id] = if remaining.abs() < 1e-12 { 0.0 } else { remaining };
    }
}

#[derive(Debug, Clone)]
struct TreeEntry<S> {
    state: S,
    info: NodeInfo,
}

/// Mapping from puzzle state to search statistics
///
/// Keys are unique and the tree only grows. It is rebuilt for every solve.
#[derive(Debug, Clone)]
pub struct SearchTree<S: PuzzleState> {
    entries: Vec<TreeEntry<S>>,
    index: HashMap<S, NodeId>,
}

impl<S: PuzzleState> SearchTree<S> {
    /// Creates an empty tree
    pub fn new() -> Self {
        SearchTree {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Creates a tree holding only `root`
    pub fn with_root(root: S, info: NodeInfo) -> Self {
        let mut tree = Self::new();
        tree.insert(root, info);
        tree
    }

    /// Adds a state, returning its id
    ///
    /// A state already present keeps its existing record and `info` is
    /// dropped.
    pub fn insert(&mut self, state: S, info: NodeInfo) -> NodeId {
        if let Some(&id) = self.index.get(&state) {
            return id;
        }
        let id = NodeId(self.entries.len());
        self.index.insert(state.clone(), id);
        self.entries.push(TreeEntry { state, info });
        id
    }

    /// Returns true if `state` has a record
    pub fn contains(&self, state: &S) -> bool {
        self.index.contains_key(state)
    }

    /// Id of a state's record
    pub fn id_of(&self, state: &S) -> Option<NodeId> {
        self.index.get(state).copied()
    }

    /// Record of a state
    pub fn get(&self, state: &S) -> Option<&NodeInfo> {
        self.id_of(state).map(|id| &self.entries[id.0].info)
    }

    /// Mutable record of a state
    pub fn get_mut(&mut self, state: &S) -> Option<&mut NodeInfo> {
        let id = self.id_of(state)?;
        Some(&mut self.entries[id.0].info)
    }

    /// State stored under `id`
    pub fn state(&self, id: NodeId) -> &S {
        &self.entries[id.0].state
    }

    /// Record stored under `id`
    pub fn info(&self, id: NodeId) -> &NodeInfo {
        &self.entries[id.0].info
    }

    /// Mutable record stored under `id`
    pub fn info_mut(&mut self, id: NodeId) -> &mut NodeInfo {
        &mut self.entries[id.0].info
    }

    /// Number of states in the tree
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the tree has no states
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shortest move sequence from `root` to a solved state
    ///
    /// Breadth-first over the states in the tree. A solved neighbour of a
    /// tree state ends the search even if it has no record of its own.
    /// Returns `None` if `root` is not in the tree or no solved state is
    /// reachable through it.
    pub fn shortest_path(&self, root: &S) -> Option<Vec<usize>> {
        if root.is_solved() {
            return Some(Vec::new());
        }

        let start = self.id_of(root)?;
        let mut parents: HashMap<NodeId, (NodeId, usize)> = HashMap::new();
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            let state = self.state(current);
            for move_id in 0..S::MOVE_COUNT {
                let next = state.apply_move(move_id);
                if next.is_solved() {
                    let mut moves = vec![move_id];
                    let mut node = current;
                    while let Some(&(parent, m)) = parents.get(&node) {
                        moves.push(m);
                        node = parent;
                    }
                    moves.reverse();
                    return Some(moves);
                }
                if let Some(next_id) = self.id_of(&next) {
                    if seen.insert(next_id) {
                        parents.insert(next_id, (current, move_id));
                        queue.push_back(next_id);
                    }
                }
            }
        }

        None
    }
}

impl<S: PuzzleState> Default for SearchTree<S> {
    fn default() -> Self {
        Self::new()
    }
}
