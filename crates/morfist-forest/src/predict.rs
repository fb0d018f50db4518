//! Prediction methods for the mixed-target forest.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::config::TargetKind;
use crate::error::ForestError;
use crate::forest::MixedForest;
use crate::importance::{RankedFeature, aggregate_importances};
use crate::tree::DecisionTree;

/// Vote frequencies of the trees over the known labels of one target.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassDistribution {
    labels: Vec<usize>,
    probs: Vec<f64>,
}

impl ClassDistribution {
    /// Create a new class distribution over sorted `labels`.
    pub(crate) fn new(labels: Vec<usize>, probs: Vec<f64>) -> Self {
        Self { labels, probs }
    }

    /// Return the label with the highest probability, ties to the smallest label.
    #[must_use]
    pub fn predicted_label(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (&label, &p) in self.labels.iter().zip(&self.probs) {
            if best.is_none_or(|(_, bp)| p > bp) {
                best = Some((label, p));
            }
        }
        best.map(|(label, _)| label)
    }

    /// Return the top-k labels sorted by descending probability.
    #[must_use]
    pub fn top_k(&self, k: usize) -> Vec<(usize, f64)> {
        let mut indexed: Vec<(usize, f64)> =
            self.labels.iter().copied().zip(self.probs.iter().copied()).collect();
        // Stable sort keeps smaller labels first among equal probabilities.
        indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
        indexed.truncate(k);
        indexed
    }

    /// Return the probability of `label`, zero for an unknown label.
    #[must_use]
    pub fn probability(&self, label: usize) -> f64 {
        self.labels
            .binary_search(&label)
            .map_or(0.0, |pos| self.probs[pos])
    }

    /// Return the sorted labels the probabilities refer to.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Return the probability distribution as a slice, parallel to [`labels`](Self::labels).
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }
}

/// Probability output for one target of one sample.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TargetProba {
    /// Vote frequencies of a classification target.
    Classes(ClassDistribution),
    /// A regression target has no distribution; this is its mean prediction.
    Mean(f64),
}

impl TargetProba {
    /// Return the point prediction this output implies.
    ///
    /// The most probable label (ties to the smallest) for a classification
    /// target, the mean for a regression target. Matches
    /// [`MixedForest::predict`].
    #[must_use]
    pub fn value(&self) -> f64 {
        match self {
            TargetProba::Classes(dist) => dist.predicted_label().map_or(0.0, |label| label as f64),
            TargetProba::Mean(mean) => *mean,
        }
    }
}

impl MixedForest {
    /// Per-tree predictions stacked as `[tree][sample][target]`.
    ///
    /// Trees are evaluated in parallel; the output keeps tree order.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] if any sample has the
    /// wrong feature count.
    pub fn tree_predictions(&self, samples: &[Vec<f64>]) -> Result<Vec<Vec<Vec<f64>>>, ForestError> {
        self.check_features(samples)?;
        self.trees
            .par_iter()
            .map(|tree| tree.predict_batch(samples))
            .collect()
    }

    /// Predict every target of every sample.
    ///
    /// Classification targets take the most frequent label across trees
    /// (ties to the smallest label); regression targets take the mean of the
    /// tree predictions.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] if any sample has the
    /// wrong feature count.
    pub fn predict(&self, samples: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ForestError> {
        let stacked = self.tree_predictions(samples)?;
        Ok((0..samples.len())
            .map(|row| {
                self.kinds
                    .iter()
                    .enumerate()
                    .map(|(t, kind)| match kind {
                        TargetKind::Classification => {
                            let dist = self.vote(&stacked, row, t);
                            dist.predicted_label().map_or(0.0, |label| label as f64)
                        }
                        TargetKind::Regression => mean_over_trees(&stacked, row, t),
                    })
                    .collect()
            })
            .collect())
    }

    /// Per-sample, per-target probabilities.
    ///
    /// Classification targets get the vote frequency of each known label
    /// (summing to 1.0). Regression targets get [`TargetProba::Mean`].
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] if any sample has the
    /// wrong feature count.
    pub fn predict_proba(&self, samples: &[Vec<f64>]) -> Result<Vec<Vec<TargetProba>>, ForestError> {
        let stacked = self.tree_predictions(samples)?;
        Ok((0..samples.len())
            .map(|row| {
                self.kinds
                    .iter()
                    .enumerate()
                    .map(|(t, kind)| match kind {
                        TargetKind::Classification => TargetProba::Classes(self.vote(&stacked, row, t)),
                        TargetKind::Regression => TargetProba::Mean(mean_over_trees(&stacked, row, t)),
                    })
                    .collect()
            })
            .collect())
    }

    fn vote(&self, stacked: &[Vec<Vec<f64>>], row: usize, target: usize) -> ClassDistribution {
        let labels = self.class_labels.get(&target).cloned().unwrap_or_default();
        let mut counts = vec![0usize; labels.len()];
        for tree_preds in stacked {
            let label = tree_preds[row][target] as usize;
            if let Ok(pos) = labels.binary_search(&label) {
                counts[pos] += 1;
            }
        }
        let n_trees = stacked.len() as f64;
        let probs = counts.iter().map(|&c| c as f64 / n_trees).collect();
        ClassDistribution::new(labels, probs)
    }

    fn check_features(&self, samples: &[Vec<f64>]) -> Result<(), ForestError> {
        match samples.iter().find(|s| s.len() != self.n_features) {
            Some(sample) => Err(ForestError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            }),
            None => Ok(()),
        }
    }

    /// Return gain-based feature importances averaged over trees.
    ///
    /// Sums to 1.0 unless every tree is a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let per_tree: Vec<Vec<f64>> = self.trees.iter().map(DecisionTree::feature_importances).collect();
        let mut totals = vec![0.0f64; self.n_features];
        for imp in &per_tree {
            for (total, v) in totals.iter_mut().zip(imp) {
                *total += v;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return named feature importances sorted by descending importance.
    #[must_use]
    pub fn ranked_importances(&self, names: &[String]) -> Vec<RankedFeature> {
        let per_tree: Vec<Vec<f64>> = self.trees.iter().map(DecisionTree::feature_importances).collect();
        aggregate_importances(&per_tree, names)
    }

    /// Return the sorted labels observed for a classification target.
    ///
    /// `None` for regression targets and out-of-range indices.
    #[must_use]
    pub fn class_labels(&self, target: usize) -> Option<&[usize]> {
        self.class_labels.get(&target).map(Vec::as_slice)
    }

    /// Return the trees in training order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of target columns.
    #[must_use]
    pub fn n_targets(&self) -> usize {
        self.kinds.len()
    }

    /// Return the kind of every target column.
    #[must_use]
    pub fn target_kinds(&self) -> &[TargetKind] {
        &self.kinds
    }
}

fn mean_over_trees(stacked: &[Vec<Vec<f64>>], row: usize, target: usize) -> f64 {
    stacked.iter().map(|tree_preds| tree_preds[row][target]).sum::<f64>() / stacked.len() as f64
}
