//! Utility functions shared by the network and the search
//!
//! This module contains the numeric helpers used by the policy head and
//! the selection score.

use ndarray::{Array2, Axis};

/// Row-wise softmax
///
/// Each row is shifted by its maximum before exponentiation so large
/// logits do not overflow.
pub fn softmax_rows(logits: &Array2<f64>) -> Array2<f64> {
    let mut out = logits.to_owned();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    out
}

/// One-hot matrix with `classes` columns, one row per index
///
/// Callers validate the indices beforehand.
pub fn one_hot_rows(indices: &[usize], classes: usize) -> Array2<f64> {
    let mut out = Array2::zeros((indices.len(), classes));
    for (row, &index) in indices.iter().enumerate() {
        out[[row, index]] = 1.0;
    }
    out
}

/// Index of the largest value, lowest index on ties
///
/// Returns 0 for an empty slice.
pub fn argmax(values: &[f64]) -> usize {
    let mut best_index = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_value {
            best_value = v;
            best_index = i;
        }
    }
    best_index
}

/// Exploration bonus of the PUCT score
///
/// `c * prior * sqrt(parent_visits) / (1 + visits)`
pub fn puct_exploration(prior: f64, parent_visits: u64, visits: u64, exploration_factor: f64) -> f64 {
    exploration_factor * prior * (parent_visits as f64).sqrt() / (1.0 + visits as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let logits = array![[1.0, 2.0, 3.0], [1000.0, 1000.0, -1000.0]];
        let probs = softmax_rows(&logits);
        for row in probs.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-12);
            assert!(row.iter().all(|&p| p >= 0.0));
        }
        assert!((probs[[1, 0]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.5, 1.0, 1.0]), 1);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn test_one_hot_rows() {
        let m = one_hot_rows(&[2, 0], 3);
        assert_eq!(m, array![[0.0, 0.0, 1.0], [1.0, 0.0, 0.0]]);
    }
}
