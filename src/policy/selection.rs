//! Selection policies for the tree search
//!
//! Selection policies decide which move to follow from a node during the
//! selection phase, balancing exploitation of good action-values against
//! exploration of moves the network likes but the search has rarely tried.

use crate::tree::NodeInfo;

/// Trait for policies that choose the move to follow from a node
pub trait SelectionPolicy {
    /// Returns the move id to follow
    fn select_move(&self, info: &NodeInfo) -> usize;

    /// Create a boxed clone of this policy
    fn clone_box(&self) -> Box<dyn SelectionPolicy>;
}

/// Polynomial Upper Confidence Trees (PUCT) selection policy
///
/// The AlphaZero rule, scoring every move with
///
/// ```text
/// PUCT = Q(s,a) + c * P(s,a) * sqrt(sum_b N(s,b)) / (1 + N(s,a))
/// ```
///
/// Where:
/// - `Q(s,a)` is the mean backed-up value of the move, minus any virtual loss
/// - `P(s,a)` is the network's prior for the move
/// - `N(s,a)` is the move's visit count
/// - `c` is the exploration factor
///
/// Ties go to the lowest move id, which keeps searches reproducible.
#[derive(Debug, Clone)]
pub struct PuctPolicy {
    /// Exploration factor `c`
    pub exploration_factor: f64,
}

impl PuctPolicy {
    /// Creates a new PUCT policy
    pub fn new(exploration_factor: f64) -> Self {
        PuctPolicy { exploration_factor }
    }
}

impl Default for PuctPolicy {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl SelectionPolicy for PuctPolicy {
    fn select_move(&self, info: &NodeInfo) -> usize {
        let parent_visits = info.total_visits();
        let mut best_score = f64::NEG_INFINITY;
        let mut best_move = 0;

        for m in 0..info.move_count() {
            let score = info.selection_score(m, parent_visits, self.exploration_factor);
            if score > best_score {
                best_score = score;
                best_move = m;
            }
        }

        best_move
    }

    fn clone_box(&self) -> Box<dyn SelectionPolicy> {
        Box::new(self.clone())
    }
}

// Implement SelectionPolicy for Box<dyn SelectionPolicy>
impl SelectionPolicy for Box<dyn SelectionPolicy> {
    fn select_move(&self, info: &NodeInfo) -> usize {
        (**self).select_move(info)
    }

    fn clone_box(&self) -> Box<dyn SelectionPolicy> {
        (**self).clone_box()
    }
}
