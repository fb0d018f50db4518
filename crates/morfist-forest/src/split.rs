use rand::Rng;

use crate::impurity::ImpurityCalculator;
use crate::kernel::NumericKernel;
use crate::node::FeatureIndex;

/// Number of midpoints sampled per feature as candidate thresholds.
const CANDIDATES_PER_FEATURE: usize = 2;

/// How the per-target gain vector of a candidate split is reduced to one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SplitChoice {
    /// Average gain across targets.
    Mean,
    /// Largest single-target gain.
    Max,
}

impl SplitChoice {
    /// Reduce a non-empty per-target gain vector to a scalar.
    #[must_use]
    pub fn reduce(self, gains: &[f64]) -> f64 {
        match self {
            SplitChoice::Mean => gains.iter().sum::<f64>() / gains.len() as f64,
            SplitChoice::Max => gains.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Outcome of a split search for one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitDecision {
    /// Partition the node by `feature <= threshold`.
    Split {
        /// Feature used for the split.
        feature: FeatureIndex,
        /// Samples with a feature value <= threshold go left.
        threshold: f64,
        /// Scalar normalized gain of the split.
        gain: f64,
    },
    /// The node must become a leaf.
    NoSplit,
}

/// Randomized split search over a column-major dataset.
///
/// The root impurity is computed once at construction from the tree's whole
/// training subset and normalizes every gain computed afterwards.
#[derive(Debug)]
pub struct Splitter<'a, K: NumericKernel> {
    features: &'a [Vec<f64>],
    targets: &'a [Vec<f64>],
    impurity: ImpurityCalculator<'a, K>,
    root_impurity: Vec<f64>,
    max_features: usize,
    min_samples_leaf: usize,
    choose_split: SplitChoice,
}

impl<'a, K: NumericKernel> Splitter<'a, K> {
    /// Create a splitter for the tree trained on `root_indices`.
    ///
    /// `features[feature_idx][sample_idx]` and `targets[target_idx][sample_idx]`
    /// are column-major.
    pub fn new(
        features: &'a [Vec<f64>],
        targets: &'a [Vec<f64>],
        impurity: ImpurityCalculator<'a, K>,
        root_indices: &[usize],
        max_features: usize,
        min_samples_leaf: usize,
        choose_split: SplitChoice,
    ) -> Self {
        let root_impurity = impurity.impurity_node(targets, root_indices);
        Self {
            features,
            targets,
            impurity,
            root_impurity,
            max_features,
            min_samples_leaf,
            choose_split,
        }
    }

    /// Return the per-target impurity of the tree's whole training subset.
    #[must_use]
    pub fn root_impurity(&self) -> &[f64] {
        &self.root_impurity
    }

    /// Consume the splitter, keeping only the root impurity.
    pub(crate) fn into_root_impurity(self) -> Vec<f64> {
        self.root_impurity
    }

    /// Find the best admissible split for the rows in `sample_indices`.
    ///
    /// Nodes with at most `min_samples_leaf` rows are never split and consume
    /// no randomness. Otherwise `max_features` distinct features are drawn,
    /// and for each non-constant one up to two midpoints between consecutive
    /// distinct values are tried. Candidates leaving fewer than
    /// `min_samples_leaf` rows on either side are skipped. The first candidate
    /// with the strictly highest score wins.
    pub fn find_best_split(&self, sample_indices: &[usize], rng: &mut impl Rng) -> SplitDecision {
        let n_samples = sample_indices.len();
        if n_samples <= self.min_samples_leaf {
            return SplitDecision::NoSplit;
        }

        let n_features = self.features.len();
        let parent_impurity = self.normalized(self.impurity.impurity_node(self.targets, sample_indices));

        // Partial Fisher-Yates: shuffle only the first `max_features` positions.
        let mut feature_order: Vec<usize> = (0..n_features).collect();
        let take = self.max_features.min(n_features);
        for i in 0..take {
            let j = rng.gen_range(i..n_features);
            feature_order.swap(i, j);
        }

        let mut best_gain = f64::NEG_INFINITY;
        let mut best: Option<(FeatureIndex, f64)> = None;
        let mut left = Vec::with_capacity(n_samples);
        let mut right = Vec::with_capacity(n_samples);

        for &feat_idx in &feature_order[..take] {
            let feat_col = &self.features[feat_idx];

            let mut values: Vec<f64> = sample_indices.iter().map(|&si| feat_col[si]).collect();
            values.sort_unstable_by(f64::total_cmp);
            values.dedup();
            if values.len() < 2 {
                continue;
            }
            let midpoints: Vec<f64> = values.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();

            // Drawn with replacement, so a single midpoint may be tried twice.
            for _ in 0..CANDIDATES_PER_FEATURE.min(midpoints.len()) {
                let threshold = midpoints[rng.gen_range(0..midpoints.len())];
                partition_into(feat_col, sample_indices, threshold, &mut left, &mut right);

                let Some(gain) = self.split_gain(&parent_impurity, &left, &right) else {
                    continue;
                };
                if gain > best_gain {
                    best_gain = gain;
                    best = Some((FeatureIndex::new(feat_idx), threshold));
                }
            }
        }

        match best {
            Some((feature, threshold)) => SplitDecision::Split {
                feature,
                threshold,
                gain: best_gain,
            },
            None => SplitDecision::NoSplit,
        }
    }

    /// Score a candidate partition, or `None` when a side is too small.
    fn split_gain(&self, parent: &[f64], left: &[usize], right: &[usize]) -> Option<f64> {
        let (n_left, n_right) = (left.len(), right.len());
        if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
            return None;
        }
        let n_parent = (n_left + n_right) as f64;
        let w_left = n_left as f64 / n_parent;
        let w_right = n_right as f64 / n_parent;

        let imp_left = self.normalized(self.impurity.impurity_node(self.targets, left));
        let imp_right = self.normalized(self.impurity.impurity_node(self.targets, right));

        let gains: Vec<f64> = parent
            .iter()
            .zip(&imp_left)
            .zip(&imp_right)
            .map(|((&p, &l), &r)| w_left * (p - l) + w_right * (p - r))
            .collect();
        Some(self.choose_split.reduce(&gains))
    }

    fn normalized(&self, mut impurity: Vec<f64>) -> Vec<f64> {
        for (v, root) in impurity.iter_mut().zip(&self.root_impurity) {
            *v /= root;
        }
        impurity
    }
}

/// Partition `sample_indices` by `feature_column[si] <= threshold`.
pub(crate) fn partition(
    feature_column: &[f64],
    sample_indices: &[usize],
    threshold: f64,
) -> (Vec<usize>, Vec<usize>) {
    let mut left = Vec::with_capacity(sample_indices.len() / 2);
    let mut right = Vec::with_capacity(sample_indices.len() / 2);
    partition_into(feature_column, sample_indices, threshold, &mut left, &mut right);
    (left, right)
}

fn partition_into(
    feature_column: &[f64],
    sample_indices: &[usize],
    threshold: f64,
    left: &mut Vec<usize>,
    right: &mut Vec<usize>,
) {
    left.clear();
    right.clear();
    for &si in sample_indices {
        if feature_column[si] <= threshold {
            left.push(si);
        } else {
            right.push(si);
        }
    }
}
