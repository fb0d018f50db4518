//! Configuration builder for mixed-target forest training.

use std::collections::BTreeSet;

use crate::error::ForestError;
use crate::forest::MixedForest;
use crate::impurity::DEFAULT_HISTOGRAM_BINS;
use crate::split::SplitChoice;

/// How a target column is scored and aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TargetKind {
    /// Integer class labels: entropy impurity, majority leaves, vote aggregation.
    Classification,
    /// Real values: histogram entropy impurity, mean leaves, mean aggregation.
    Regression,
}

impl TargetKind {
    /// Return `true` for [`TargetKind::Classification`].
    #[must_use]
    pub fn is_classification(self) -> bool {
        self == TargetKind::Classification
    }
}

/// Resolve the kind of every target column from the set of classification indices.
pub(crate) fn resolve_target_kinds(
    classification_targets: &BTreeSet<usize>,
    n_targets: usize,
) -> Result<Vec<TargetKind>, ForestError> {
    if let Some(&target_index) = classification_targets.iter().find(|&&t| t >= n_targets) {
        return Err(ForestError::ClassificationTargetOutOfRange {
            target_index,
            n_targets,
        });
    }
    Ok((0..n_targets)
        .map(|t| {
            if classification_targets.contains(&t) {
                TargetKind::Classification
            } else {
                TargetKind::Regression
            }
        })
        .collect())
}

/// Strategy for determining the number of features to consider at each split.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum MaxFeatures {
    /// Ceiling of the square root of total features.
    Sqrt,
    /// Floor of log base 2 of total features (at least 1).
    Log2,
    /// Floor of a fraction of total features (must be in (0.0, 1.0], at least 1).
    Fraction(f64),
    /// A fixed count.
    Fixed(usize),
    /// All features (no subsampling).
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete feature count for a dataset with `n_features` columns.
    ///
    /// # Errors
    ///
    /// | Variant                                    | When                               |
    /// |--------------------------------------------|------------------------------------|
    /// | [`ForestError::InvalidMaxFeaturesFraction`] | fraction is not in (0.0, 1.0]      |
    /// | [`ForestError::InvalidMaxFeatures`]         | `Fixed(k)` with k outside [1, n]   |
    pub fn resolve(self, n_features: usize) -> Result<usize, ForestError> {
        let n = n_features as f64;
        let resolved = match self {
            MaxFeatures::Sqrt => (n.sqrt().ceil() as usize).max(1),
            MaxFeatures::Log2 => (n.log2().floor().max(0.0) as usize).max(1),
            MaxFeatures::Fraction(fraction) => {
                if !(fraction > 0.0 && fraction <= 1.0) {
                    return Err(ForestError::InvalidMaxFeaturesFraction { fraction });
                }
                ((n * fraction).floor() as usize).max(1)
            }
            MaxFeatures::Fixed(k) => k,
            MaxFeatures::All => n_features,
        };
        if resolved == 0 || resolved > n_features {
            return Err(ForestError::InvalidMaxFeatures {
                max_features: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }
}

/// Configuration for mixed-target forest training.
///
/// Construct via [`MixedForestConfig::new`], then chain `with_*` methods.
/// The config holds hyperparameters only; every call to [`fit`](Self::fit)
/// builds a brand-new forest.
///
/// # Defaults
///
/// | Parameter                | Default   |
/// |--------------------------|-----------|
/// | `max_features`           | `Sqrt`    |
/// | `min_samples_leaf`       | 5         |
/// | `choose_split`           | `Mean`    |
/// | `classification_targets` | none      |
/// | `seed`                   | 42        |
/// | `histogram_bins`         | 100       |
#[derive(Debug, Clone)]
pub struct MixedForestConfig {
    pub(crate) n_estimators: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) min_samples_leaf: usize,
    pub(crate) choose_split: SplitChoice,
    pub(crate) classification_targets: BTreeSet<usize>,
    pub(crate) seed: u64,
    pub(crate) histogram_bins: usize,
}

impl MixedForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidEstimatorCount`] if `n_estimators` is zero.
    pub fn new(n_estimators: usize) -> Result<Self, ForestError> {
        if n_estimators == 0 {
            return Err(ForestError::InvalidEstimatorCount { n_estimators });
        }
        Ok(Self {
            n_estimators,
            max_features: MaxFeatures::Sqrt,
            min_samples_leaf: 5,
            choose_split: SplitChoice::Mean,
            classification_targets: BTreeSet::new(),
            seed: 42,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        })
    }

    // --- Setters ---

    /// Set the max features strategy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the minimum number of samples required in each leaf after a split.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set how per-target gains are reduced to a single split score.
    #[must_use]
    pub fn with_choose_split(mut self, choose_split: SplitChoice) -> Self {
        self.choose_split = choose_split;
        self
    }

    /// Set which target columns are classification targets.
    ///
    /// All other target columns are treated as regression targets.
    #[must_use]
    pub fn with_classification_targets(mut self, targets: impl IntoIterator<Item = usize>) -> Self {
        self.classification_targets = targets.into_iter().collect();
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of histogram bins used for regression impurity.
    #[must_use]
    pub fn with_histogram_bins(mut self, histogram_bins: usize) -> Self {
        self.histogram_bins = histogram_bins;
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Return the max features strategy.
    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    /// Return the minimum samples required in each leaf.
    #[must_use]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    /// Return the split score reduction.
    #[must_use]
    pub fn choose_split(&self) -> SplitChoice {
        self.choose_split
    }

    /// Return the classification target indices.
    #[must_use]
    pub fn classification_targets(&self) -> &BTreeSet<usize> {
        &self.classification_targets
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the number of regression histogram bins.
    #[must_use]
    pub fn histogram_bins(&self) -> usize {
        self.histogram_bins
    }

    /// Train a forest on the provided dataset.
    ///
    /// `features[sample_idx][feature_idx]`, row-major layout.
    /// `targets[sample_idx][target_idx]`, row-major layout.
    ///
    /// # Errors
    ///
    /// | Variant                                          | When                                        |
    /// |--------------------------------------------------|---------------------------------------------|
    /// | [`ForestError::EmptyDataset`]                    | `features` is empty                         |
    /// | [`ForestError::ZeroFeatures`]                    | rows have zero feature columns              |
    /// | [`ForestError::ZeroTargets`]                     | target rows have zero columns               |
    /// | [`ForestError::RowCountMismatch`]                | `features` and `targets` lengths differ     |
    /// | [`ForestError::FeatureCountMismatch`]            | feature rows have inconsistent lengths      |
    /// | [`ForestError::TargetCountMismatch`]             | target rows have inconsistent lengths       |
    /// | [`ForestError::NonFiniteValue`]                  | any feature is NaN or infinite              |
    /// | [`ForestError::NonFiniteTarget`]                 | any target is NaN or infinite               |
    /// | [`ForestError::ClassificationTargetOutOfRange`]  | a classification index ≥ n_targets          |
    /// | [`ForestError::InvalidClassLabel`]               | a class label is not a small integer ≥ 0    |
    /// | [`ForestError::TooFewSamples`]                   | `n_samples <= min_samples_leaf`             |
    /// | [`ForestError::InvalidMinSamplesLeaf`]           | `min_samples_leaf` is zero                  |
    /// | [`ForestError::InvalidMaxFeatures`]              | resolved max_features outside [1, n]        |
    /// | [`ForestError::InvalidMaxFeaturesFraction`]      | fraction outside (0.0, 1.0]                 |
    /// | [`ForestError::InvalidHistogramBins`]            | `histogram_bins` is zero                    |
    pub fn fit(&self, features: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<MixedForest, ForestError> {
        crate::forest::train(self, features, targets)
    }

    /// Train a forest on a single target column.
    ///
    /// Equivalent to [`fit`](Self::fit) with every target wrapped in a
    /// one-element row.
    ///
    /// # Errors
    ///
    /// Same as [`fit`](Self::fit).
    pub fn fit_single(&self, features: &[Vec<f64>], target: &[f64]) -> Result<MixedForest, ForestError> {
        let targets: Vec<Vec<f64>> = target.iter().map(|&y| vec![y]).collect();
        self.fit(features, &targets)
    }
}
