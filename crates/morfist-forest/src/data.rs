//! Validated, column-major training data shared by tree and forest fitting.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{TargetKind, resolve_target_kinds};
use crate::error::ForestError;

/// Largest label value accepted for a classification target.
pub const MAX_CLASS_LABEL: usize = 65_535;

/// Training matrices after validation, transposed to column-major layout.
///
/// `features[feature_idx][sample_idx]` and `targets[target_idx][sample_idx]`.
#[derive(Debug, Clone)]
pub(crate) struct TrainingData {
    pub(crate) features: Vec<Vec<f64>>,
    pub(crate) targets: Vec<Vec<f64>>,
    pub(crate) kinds: Vec<TargetKind>,
    pub(crate) n_samples: usize,
}

impl TrainingData {
    /// Validate row-major inputs and transpose them.
    ///
    /// Checks shapes, finiteness, target kinds and class labels, and that
    /// there are more samples than `min_samples_leaf`.
    pub(crate) fn from_rows(
        features: &[Vec<f64>],
        targets: &[Vec<f64>],
        classification_targets: &BTreeSet<usize>,
        min_samples_leaf: usize,
    ) -> Result<Self, ForestError> {
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

        let n_features = features[0].len();
        if n_features == 0 {
            return Err(ForestError::ZeroFeatures);
        }
        for (sample_index, row) in features.iter().enumerate() {
            if row.len() != n_features {
                return Err(ForestError::FeatureCountMismatch {
                    expected: n_features,
                    got: row.len(),
                    sample_index,
                });
            }
            if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
                return Err(ForestError::NonFiniteValue {
                    sample_index,
                    feature_index,
                });
            }
        }

        let n_targets = targets[0].len();
        if n_targets == 0 {
            return Err(ForestError::ZeroTargets);
        }
        let kinds = resolve_target_kinds(classification_targets, n_targets)?;
        for (sample_index, row) in targets.iter().enumerate() {
            if row.len() != n_targets {
                return Err(ForestError::TargetCountMismatch {
                    expected: n_targets,
                    got: row.len(),
                    sample_index,
                });
            }
            for (target_index, (&value, kind)) in row.iter().zip(&kinds).enumerate() {
                if !value.is_finite() {
                    return Err(ForestError::NonFiniteTarget {
                        sample_index,
                        target_index,
                    });
                }
                if kind.is_classification() && !is_class_label(value) {
                    return Err(ForestError::InvalidClassLabel {
                        sample_index,
                        target_index,
                        value,
                        max: MAX_CLASS_LABEL,
                    });
                }
            }
        }

        if min_samples_leaf == 0 {
            return Err(ForestError::InvalidMinSamplesLeaf { min_samples_leaf });
        }
        if n_samples <= min_samples_leaf {
            return Err(ForestError::TooFewSamples {
                n_samples,
                min_samples_leaf,
            });
        }

        Ok(Self {
            features: transpose(features, n_features),
            targets: transpose(targets, n_targets),
            kinds,
            n_samples,
        })
    }

    pub(crate) fn n_features(&self) -> usize {
        self.features.len()
    }

    pub(crate) fn n_targets(&self) -> usize {
        self.targets.len()
    }

    /// Sorted distinct labels of every classification target.
    pub(crate) fn class_labels(&self) -> BTreeMap<usize, Vec<usize>> {
        self.kinds
            .iter()
            .enumerate()
            .filter(|(_, kind)| kind.is_classification())
            .map(|(t, _)| {
                let labels: BTreeSet<usize> =
                    self.targets[t].iter().map(|&v| v as usize).collect();
                (t, labels.into_iter().collect())
            })
            .collect()
    }
}

fn is_class_label(value: f64) -> bool {
    value >= 0.0 && value.fract() == 0.0 && value <= MAX_CLASS_LABEL as f64
}

fn transpose(rows: &[Vec<f64>], n_cols: usize) -> Vec<Vec<f64>> {
    (0..n_cols)
        .map(|c| rows.iter().map(|row| row[c]).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let features = (0..n).map(|i| vec![i as f64, 1.0]).collect();
        let targets = (0..n).map(|i| vec![(i % 2) as f64, i as f64 * 0.5]).collect();
        (features, targets)
    }

    fn classes(t: &[usize]) -> BTreeSet<usize> {
        t.iter().copied().collect()
    }

    #[test]
    fn transposes_to_column_major() {
        let (features, targets) = rows(6);
        let data = TrainingData::from_rows(&features, &targets, &classes(&[0]), 1).unwrap();
        assert_eq!(data.n_features(), 2);
        assert_eq!(data.n_targets(), 2);
        assert_eq!(data.features[0], vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(data.targets[1][4], 2.0);
        assert_eq!(data.kinds, vec![TargetKind::Classification, TargetKind::Regression]);
    }

    #[test]
    fn class_labels_sorted_and_distinct() {
        let features: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64]).collect();
        let targets = vec![vec![3.0], vec![1.0], vec![3.0], vec![0.0], vec![1.0]];
        let data = TrainingData::from_rows(&features, &targets, &classes(&[0]), 1).unwrap();
        assert_eq!(data.class_labels()[&0], vec![0, 1, 3]);
    }

    #[test]
    fn empty_dataset() {
        let err = TrainingData::from_rows(&[], &[], &classes(&[]), 1).unwrap_err();
        assert!(matches!(err, ForestError::EmptyDataset));
    }

    #[test]
    fn row_count_mismatch() {
        let (features, mut targets) = rows(6);
        targets.pop();
        let err = TrainingData::from_rows(&features, &targets, &classes(&[]), 1).unwrap_err();
        assert!(matches!(
            err,
            ForestError::RowCountMismatch { features: 6, targets: 5 }
        ));
    }

    #[test]
    fn too_few_samples() {
        let (features, targets) = rows(5);
        let err = TrainingData::from_rows(&features, &targets, &classes(&[]), 5).unwrap_err();
        assert!(matches!(
            err,
            ForestError::TooFewSamples { n_samples: 5, min_samples_leaf: 5 }
        ));
    }

    #[test]
    fn zero_min_samples_leaf() {
        let (features, targets) = rows(5);
        let err = TrainingData::from_rows(&features, &targets, &classes(&[]), 0).unwrap_err();
        assert!(matches!(err, ForestError::InvalidMinSamplesLeaf { .. }));
    }

    #[test]
    fn fractional_class_label_rejected() {
        let (features, mut targets) = rows(6);
        targets[3][0] = 1.5;
        let err = TrainingData::from_rows(&features, &targets, &classes(&[0]), 1).unwrap_err();
        assert!(matches!(
            err,
            ForestError::InvalidClassLabel { sample_index: 3, target_index: 0, .. }
        ));
    }

    #[test]
    fn negative_class_label_rejected() {
        let (features, mut targets) = rows(6);
        targets[0][0] = -1.0;
        let err = TrainingData::from_rows(&features, &targets, &classes(&[0]), 1).unwrap_err();
        assert!(matches!(err, ForestError::InvalidClassLabel { .. }));
    }

    #[test]
    fn fractional_regression_target_accepted() {
        let (features, mut targets) = rows(6);
        targets[3][1] = -1.25;
        assert!(TrainingData::from_rows(&features, &targets, &classes(&[0]), 1).is_ok());
    }

    #[test]
    fn non_finite_target_rejected() {
        let (features, mut targets) = rows(6);
        targets[2][1] = f64::INFINITY;
        let err = TrainingData::from_rows(&features, &targets, &classes(&[]), 1).unwrap_err();
        assert!(matches!(
            err,
            ForestError::NonFiniteTarget { sample_index: 2, target_index: 1 }
        ));
    }

    #[test]
    fn non_finite_feature_rejected() {
        let (mut features, targets) = rows(6);
        features[1][1] = f64::NAN;
        let err = TrainingData::from_rows(&features, &targets, &classes(&[]), 1).unwrap_err();
        assert!(matches!(
            err,
            ForestError::NonFiniteValue { sample_index: 1, feature_index: 1 }
        ));
    }

    #[test]
    fn ragged_targets_rejected() {
        let (features, mut targets) = rows(6);
        targets[4] = vec![1.0];
        let err = TrainingData::from_rows(&features, &targets, &classes(&[]), 1).unwrap_err();
        assert!(matches!(err, ForestError::TargetCountMismatch { .. }));
    }
}
