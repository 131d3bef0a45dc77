//! Backup policies for the tree search
//!
//! Backup policies determine how a leaf's value updates the statistics of
//! each edge on the path that led to it.

use crate::tree::NodeInfo;

/// Trait for policies that back a leaf value up one edge
pub trait BackupPolicy {
    /// Updates the statistics of `move_id` at `info`
    ///
    /// `distance` counts the edges between this one and the leaf; the edge
    /// entering the leaf has distance 0.
    fn update_stats(&self, info: &mut NodeInfo, move_id: usize, leaf_value: f64, distance: usize);

    /// Create a boxed clone of this policy
    fn clone_box(&self) -> Box<dyn BackupPolicy>;
}

/// Standard backup policy
///
/// Folds the leaf value unchanged into every edge's running mean.
#[derive(Debug, Clone)]
pub struct MeanValuePolicy;

impl MeanValuePolicy {
    /// Creates a new mean-value policy
    pub fn new() -> Self {
        MeanValuePolicy
    }
}

impl Default for MeanValuePolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl BackupPolicy for MeanValuePolicy {
    fn update_stats(&self, info: &mut NodeInfo, move_id: usize, leaf_value: f64, _distance: usize) {
        info.record_visit(move_id, leaf_value);
    }

    fn clone_box(&self) -> Box<dyn BackupPolicy> {
        Box::new(self.clone())
    }
}

/// Discounted backup policy
///
/// Edges further from the leaf receive the leaf value lowered by
/// `(1 - discount^distance) * |leaf_value|`, so a leaf found deep in the
/// tree looks worse from the root whatever the sign of its value.
#[derive(Debug, Clone)]
pub struct DiscountedPolicy {
    /// Per-edge decay, clamped to `[0, 1]`
    pub discount: f64,
}

impl DiscountedPolicy {
    /// Creates a new discounted policy
    pub fn new(discount: f64) -> Self {
        DiscountedPolicy {
            discount: discount.clamp(0.0, 1.0),
        }
    }
}

impl BackupPolicy for DiscountedPolicy {
    fn update_stats(&self, info: &mut NodeInfo, move_id: usize, leaf_value: f64, distance: usize) {
        let weight = self.discount.powi(distance as i32);
        info.record_visit(move_id, leaf_value - (1.0 - weight) * leaf_value.abs());
    }

    fn clone_box(&self) -> Box<dyn BackupPolicy> {
        Box::new(self.clone())
    }
}

// Implement BackupPolicy for Box<dyn BackupPolicy>
impl BackupPolicy for Box<dyn BackupPolicy> {
    fn update_stats(&self, info: &mut NodeInfo, move_id: usize, leaf_value: f64, distance: usize) {
        (**self).update_stats(info, move_id, leaf_value, distance)
    }

    fn clone_box(&self) -> Box<dyn BackupPolicy> {
        (**self).clone_box()
    }
}
