//! K-fold cross-validation for any mixed-target estimator.

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::config::{MixedForestConfig, TargetKind, resolve_target_kinds};
use crate::error::ForestError;
use crate::forest::MixedForest;
use crate::tree::{DecisionTree, DecisionTreeConfig};

/// A fitted model that predicts every target of every row.
pub trait Predictor {
    /// Predict a `[sample][target]` matrix for row-major `features`.
    ///
    /// # Errors
    ///
    /// Implementation-defined; typically a feature count mismatch.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ForestError>;
}

/// Hyperparameters that can train a fresh [`Predictor`].
///
/// Estimators carry no learned state, so every call to `fit` builds an
/// independent model.
pub trait Estimator {
    /// The fitted model type.
    type Model: Predictor;

    /// Train a new model on row-major features and targets.
    ///
    /// # Errors
    ///
    /// Propagates training validation errors.
    fn fit(&self, features: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<Self::Model, ForestError>;

    /// Target columns scored as classification.
    fn classification_targets(&self) -> &BTreeSet<usize>;
}

impl Predictor for MixedForest {
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ForestError> {
        MixedForest::predict(self, features)
    }
}

impl Estimator for MixedForestConfig {
    type Model = MixedForest;

    fn fit(&self, features: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<MixedForest, ForestError> {
        MixedForestConfig::fit(self, features, targets)
    }

    fn classification_targets(&self) -> &BTreeSet<usize> {
        &self.classification_targets
    }
}

impl Predictor for DecisionTree {
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ForestError> {
        self.predict_batch(features)
    }
}

impl Estimator for DecisionTreeConfig {
    type Model = DecisionTree;

    fn fit(&self, features: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<DecisionTree, ForestError> {
        DecisionTreeConfig::fit(self, features, targets)
    }

    fn classification_targets(&self) -> &BTreeSet<usize> {
        &self.classification_targets
    }
}

/// Score of one target column: `metric(y_true, y_pred)`.
pub type Metric = fn(&[f64], &[f64]) -> f64;

/// Fraction of rows whose integer-truncated prediction equals the truth.
///
/// Returns 0.0 for empty input.
#[must_use]
pub fn accuracy(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred)
        .filter(|&(&t, &p)| t.trunc() == p.trunc())
        .count();
    correct as f64 / y_true.len() as f64
}

/// Root mean squared error. Returns 0.0 for empty input.
#[must_use]
pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let sse: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    (sse / y_true.len() as f64).sqrt()
}

/// Cross-validation configuration.
///
/// Construct via [`CrossValidation::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter               | Default      |
/// |-------------------------|--------------|
/// | `seed`                  | 42           |
/// | `classification_metric` | [`accuracy`] |
/// | `regression_metric`     | [`rmse`]     |
#[derive(Debug, Clone)]
pub struct CrossValidation {
    n_folds: usize,
    seed: u64,
    classification_metric: Metric,
    regression_metric: Metric,
}

/// Cross-validated scores of one target column.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TargetScore {
    /// Zero-based target column.
    pub target_index: usize,
    /// Kind of the target, which selects its metric.
    pub kind: TargetKind,
    /// Metric over all out-of-fold predictions pooled together.
    pub pooled: f64,
    /// Metric of each fold's held-out rows.
    pub fold_scores: Vec<f64>,
    /// Mean of the fold scores.
    pub mean: f64,
    /// Population standard deviation of the fold scores.
    pub std: f64,
}

/// Results of k-fold cross-validation.
#[derive(Debug, Clone)]
pub struct CrossValidationResult {
    /// One score entry per target column.
    pub scores: Vec<TargetScore>,
    /// Out-of-fold predictions in original row order.
    pub predictions: Vec<Vec<f64>>,
    /// Number of folds.
    pub n_folds: usize,
    /// Total number of samples.
    pub n_samples: usize,
}

impl CrossValidation {
    /// Create a new cross-validation config with the given number of folds.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidFoldCount`] if `n_folds` < 2.
    pub fn new(n_folds: usize) -> Result<Self, ForestError> {
        if n_folds < 2 {
            return Err(ForestError::InvalidFoldCount { n_folds });
        }
        Ok(Self {
            n_folds,
            seed: 42,
            classification_metric: accuracy,
            regression_metric: rmse,
        })
    }

    /// Set the random seed for the row permutation.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Replace the metric used for classification targets.
    #[must_use]
    pub fn with_classification_metric(mut self, metric: Metric) -> Self {
        self.classification_metric = metric;
        self
    }

    /// Replace the metric used for regression targets.
    #[must_use]
    pub fn with_regression_metric(mut self, metric: Metric) -> Self {
        self.regression_metric = metric;
        self
    }

    /// Return the number of folds.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Return the permutation seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run k-fold cross-validation of `estimator` on a row-major dataset.
    ///
    /// Rows are permuted with the configured seed and cut into `n_folds`
    /// contiguous folds of `n / n_folds` rows; the last fold also takes the
    /// remainder, so every row is predicted exactly once. Each fold trains a
    /// fresh model on the other folds.
    ///
    /// # Errors
    ///
    /// | Variant                                          | Condition                           |
    /// |--------------------------------------------------|-------------------------------------|
    /// | [`ForestError::EmptyDataset`]                    | zero samples                        |
    /// | [`ForestError::RowCountMismatch`]                | `features` and `targets` differ     |
    /// | [`ForestError::ZeroTargets`]                     | target rows have zero columns       |
    /// | [`ForestError::TargetCountMismatch`]             | target rows have inconsistent lengths |
    /// | [`ForestError::TooFewSamplesForFolds`]           | fewer samples than folds            |
    /// | [`ForestError::ClassificationTargetOutOfRange`]  | bad classification index            |
    /// | Other errors                                     | from training or prediction         |
    #[instrument(skip_all, fields(n_folds = self.n_folds, n_samples = features.len()))]
    pub fn evaluate<E: Estimator>(
        &self,
        estimator: &E,
        features: &[Vec<f64>],
        targets: &[Vec<f64>],
    ) -> Result<CrossValidationResult, ForestError> {
        if features.is_empty() {
            return Err(ForestError::EmptyDataset);
        }
        let n_samples = features.len();
        if targets.len() != n_samples {
            return Err(ForestError::RowCountMismatch {
                features: n_samples,
                targets: targets.len(),
            });
        }
        let n_targets = targets[0].len();
        if n_targets == 0 {
            return Err(ForestError::ZeroTargets);
        }
        if let Some((sample_index, row)) = targets.iter().enumerate().find(|(_, row)| row.len() != n_targets) {
            return Err(ForestError::TargetCountMismatch {
                expected: n_targets,
                got: row.len(),
                sample_index,
            });
        }
        if n_samples < self.n_folds {
            return Err(ForestError::TooFewSamplesForFolds {
                n_samples,
                n_folds: self.n_folds,
            });
        }
        let kinds = resolve_target_kinds(estimator.classification_targets(), n_targets)?;

        let folds = self.fold_indices(n_samples);
        let mut predictions: Vec<Vec<f64>> = vec![Vec::new(); n_samples];
        let mut fold_scores: Vec<Vec<f64>> = vec![Vec::with_capacity(self.n_folds); n_targets];

        for (fold, test_rows) in folds.iter().enumerate() {
            let mut in_test = vec![false; n_samples];
            for &i in test_rows {
                in_test[i] = true;
            }
            let (mut train_x, mut train_y) = (Vec::new(), Vec::new());
            for i in (0..n_samples).filter(|&i| !in_test[i]) {
                train_x.push(features[i].clone());
                train_y.push(targets[i].clone());
            }
            let test_x: Vec<Vec<f64>> = test_rows.iter().map(|&i| features[i].clone()).collect();
            let test_y: Vec<Vec<f64>> = test_rows.iter().map(|&i| targets[i].clone()).collect();

            let model = estimator.fit(&train_x, &train_y)?;
            let fold_pred = model.predict(&test_x)?;

            for (t, kind) in kinds.iter().enumerate() {
                let score = self.score(*kind, &column(&test_y, t), &column(&fold_pred, t));
                fold_scores[t].push(score);
            }
            info!(
                fold,
                n_train = train_x.len(),
                n_test = test_rows.len(),
                "fold completed"
            );

            for (&i, pred) in test_rows.iter().zip(fold_pred) {
                predictions[i] = pred;
            }
        }

        let scores: Vec<TargetScore> = kinds
            .iter()
            .enumerate()
            .zip(fold_scores)
            .map(|((t, &kind), fold_scores)| {
                let pooled = self.score(kind, &column(targets, t), &column(&predictions, t));
                let (mean, std) = mean_std(&fold_scores);
                debug!(target_index = t, ?kind, pooled, mean, std, "target scored");
                TargetScore {
                    target_index: t,
                    kind,
                    pooled,
                    fold_scores,
                    mean,
                    std,
                }
            })
            .collect();

        info!(n_targets, "cross-validation complete");

        Ok(CrossValidationResult {
            scores,
            predictions,
            n_folds: self.n_folds,
            n_samples,
        })
    }

    /// Seeded permutation of `0..n_samples` cut into contiguous folds.
    fn fold_indices(&self, n_samples: usize) -> Vec<Vec<usize>> {
        let mut order: Vec<usize> = (0..n_samples).collect();
        order.shuffle(&mut ChaCha8Rng::seed_from_u64(self.seed));

        let fold_size = n_samples / self.n_folds;
        (0..self.n_folds)
            .map(|i| {
                let start = i * fold_size;
                let end = if i + 1 == self.n_folds {
                    n_samples
                } else {
                    start + fold_size
                };
                order[start..end].to_vec()
            })
            .collect()
    }

    fn score(&self, kind: TargetKind, y_true: &[f64], y_pred: &[f64]) -> f64 {
        match kind {
            TargetKind::Classification => (self.classification_metric)(y_true, y_pred),
            TargetKind::Regression => (self.regression_metric)(y_true, y_pred),
        }
    }
}

fn column(rows: &[Vec<f64>], t: usize) -> Vec<f64> {
    rows.iter().map(|row| row[t]).collect()
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}
