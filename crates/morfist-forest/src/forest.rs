//! Mixed-target forest training on bootstrap samples.

use std::collections::BTreeMap;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::config::{MixedForestConfig, TargetKind};
use crate::data::TrainingData;
use crate::error::ForestError;
use crate::kernel::ScalarKernel;
use crate::tree::{DecisionTree, DecisionTreeConfig};

/// A fitted mixed-target forest.
///
/// Holds the trees in training order and, for every classification target,
/// the sorted distinct labels observed in the training targets.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MixedForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) kinds: Vec<TargetKind>,
    pub(crate) class_labels: BTreeMap<usize, Vec<usize>>,
}

/// Draw `n_samples` row indices uniformly with replacement.
fn bootstrap_sample(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Per-tree RNGs, each seeded by one draw from the master seed.
pub(crate) fn tree_rngs(seed: u64, n_estimators: usize) -> Vec<ChaCha8Rng> {
    let mut master_rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n_estimators)
        .map(|_| ChaCha8Rng::seed_from_u64(master_rng.r#gen()))
        .collect()
}

/// Train the forest. Trees are grown one after another.
#[instrument(skip_all, fields(n_estimators = config.n_estimators, n_samples = features.len()))]
pub(crate) fn train(
    config: &MixedForestConfig,
    features: &[Vec<f64>],
    targets: &[Vec<f64>],
) -> Result<MixedForest, ForestError> {
    let data = TrainingData::from_rows(
        features,
        targets,
        &config.classification_targets,
        config.min_samples_leaf,
    )?;
    if config.histogram_bins == 0 {
        return Err(ForestError::InvalidHistogramBins {
            n_bins: config.histogram_bins,
        });
    }
    let max_features = config.max_features.resolve(data.n_features())?;

    info!(
        n_estimators = config.n_estimators,
        n_samples = data.n_samples,
        n_features = data.n_features(),
        n_targets = data.n_targets(),
        n_classification = config.classification_targets.len(),
        max_features,
        "training mixed forest"
    );

    let mut trees = Vec::with_capacity(config.n_estimators);
    for (tree_index, mut rng) in tree_rngs(config.seed, config.n_estimators).into_iter().enumerate() {
        let bootstrap = bootstrap_sample(data.n_samples, &mut rng);
        let tree = DecisionTreeConfig::for_forest_tree(config, rng.r#gen())
            .grow(&data, &bootstrap, &ScalarKernel)?;
        debug!(
            tree_index,
            n_nodes = tree.n_nodes(),
            n_leaves = tree.n_leaves(),
            depth = tree.depth(),
            "tree trained"
        );
        trees.push(tree);
    }

    let forest = MixedForest {
        trees,
        n_features: data.n_features(),
        kinds: data.kinds.clone(),
        class_labels: data.class_labels(),
    };

    info!(n_trees = forest.trees.len(), "mixed forest training complete");

    Ok(forest)
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::{bootstrap_sample, tree_rngs};
    use crate::config::{MaxFeatures, MixedForestConfig, TargetKind};
    use crate::error::ForestError;
    use crate::predict::TargetProba;

    /// Two separable classes on feature 0 plus a regression target on feature 1.
    fn make_mixed_data() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let mut features = Vec::new();
        let mut targets = Vec::new();
        for i in 0..60 {
            let class = i % 2;
            let x0 = class as f64 * 10.0 + rng.gen_range(0.0..3.0);
            let x1 = rng.gen_range(0.0..5.0);
            features.push(vec![x0, x1, rng.gen_range(-1.0..1.0)]);
            targets.push(vec![class as f64, 3.0 * x1 + 1.0]);
        }
        (features, targets)
    }

    fn config(n_estimators: usize) -> MixedForestConfig {
        MixedForestConfig::new(n_estimators)
            .unwrap()
            .with_classification_targets([0])
            .with_max_features(MaxFeatures::All)
            .with_min_samples_leaf(2)
    }

    #[test]
    fn trains_requested_number_of_trees() {
        let (features, targets) = make_mixed_data();
        let forest = config(7).fit(&features, &targets).unwrap();
        assert_eq!(forest.n_trees(), 7);
        assert_eq!(forest.n_features(), 3);
        assert_eq!(forest.n_targets(), 2);
        assert_eq!(
            forest.target_kinds(),
            &[TargetKind::Classification, TargetKind::Regression]
        );
    }

    #[test]
    fn class_labels_from_original_targets() {
        let (features, targets) = make_mixed_data();
        let forest = config(3).fit(&features, &targets).unwrap();
        assert_eq!(forest.class_labels(0), Some(&[0, 1][..]));
        assert_eq!(forest.class_labels(1), None);
    }

    #[test]
    fn rare_label_keeps_probability_slot() {
        // Label 2 appears only in row 29.
        let (features, mut targets) = make_mixed_data();
        let (features, targets) = (&features[..30], &mut targets[..30]);
        targets[29][0] = 2.0;
        let cfg = config(20).with_seed(11);
        let forest = cfg.fit(features, targets).unwrap();

        assert_eq!(forest.class_labels(0), Some(&[0, 1, 2][..]));

        let missed = tree_rngs(cfg.seed(), cfg.n_estimators())
            .into_iter()
            .any(|mut rng| !bootstrap_sample(30, &mut rng).contains(&29));
        assert!(missed, "every bootstrap drew the rare row");

        for row in forest.predict_proba(features).unwrap() {
            let TargetProba::Classes(dist) = &row[0] else {
                panic!("target 0 is a classification target");
            };
            assert_eq!(dist.labels(), &[0, 1, 2]);
            assert_eq!(dist.as_slice().len(), 3);
            let sum: f64 = dist.as_slice().iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn separable_classes_high_accuracy() {
        let (features, targets) = make_mixed_data();
        let forest = config(20).fit(&features, &targets).unwrap();
        let predictions = forest.predict(&features).unwrap();
        let correct = predictions
            .iter()
            .zip(&targets)
            .filter(|(p, t)| p[0] == t[0])
            .count();
        let accuracy = correct as f64 / targets.len() as f64;
        assert!(accuracy > 0.9, "accuracy = {accuracy}");
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (features, targets) = make_mixed_data();
        let a = config(5).with_seed(99).fit(&features, &targets).unwrap();
        let b = config(5).with_seed(99).fit(&features, &targets).unwrap();
        assert_eq!(a.predict(&features).unwrap(), b.predict(&features).unwrap());
    }

    #[test]
    fn different_seeds_grow_different_trees() {
        let (features, targets) = make_mixed_data();
        let a = config(5).with_seed(1).fit(&features, &targets).unwrap();
        let b = config(5).with_seed(2).fit(&features, &targets).unwrap();
        let differs = a
            .trees()
            .iter()
            .zip(b.trees())
            .any(|(x, y)| x.nodes() != y.nodes());
        assert!(differs);
    }

    #[test]
    fn refit_builds_fresh_model() {
        let (features, targets) = make_mixed_data();
        let cfg = config(4);
        let first = cfg.fit(&features, &targets).unwrap();
        let second = cfg.fit(&features[..30], &targets[..30]).unwrap();
        assert_eq!(first.n_trees(), second.n_trees());
        // Every tree of the second model was grown from 30 bootstrap rows.
        assert!(second.trees().iter().all(|t| t.nodes()[0].n_samples() == 30));
        assert!(first.trees().iter().all(|t| t.nodes()[0].n_samples() == 60));
    }

    #[test]
    fn fit_single_regression_target() {
        let (features, targets) = make_mixed_data();
        let y: Vec<f64> = targets.iter().map(|t| t[1]).collect();
        let forest = MixedForestConfig::new(5)
            .unwrap()
            .fit_single(&features, &y)
            .unwrap();
        assert_eq!(forest.n_targets(), 1);
        assert_eq!(forest.target_kinds(), &[TargetKind::Regression]);
    }

    #[test]
    fn empty_dataset_error() {
        let err = config(3).fit(&[], &[]).unwrap_err();
        assert!(matches!(err, ForestError::EmptyDataset));
    }

    #[test]
    fn zero_histogram_bins_error() {
        let (features, targets) = make_mixed_data();
        let err = config(3)
            .with_histogram_bins(0)
            .fit(&features, &targets)
            .unwrap_err();
        assert!(matches!(err, ForestError::InvalidHistogramBins { n_bins: 0 }));
    }

    #[test]
    fn too_few_samples_error() {
        let (features, targets) = make_mixed_data();
        let err = config(3)
            .with_min_samples_leaf(5)
            .fit(&features[..5], &targets[..5])
            .unwrap_err();
        assert!(matches!(err, ForestError::TooFewSamples { n_samples: 5, .. }));
    }

    #[test]
    fn classification_index_out_of_range() {
        let (features, targets) = make_mixed_data();
        let err = config(3)
            .with_classification_targets([0, 4])
            .fit(&features, &targets)
            .unwrap_err();
        assert!(matches!(
            err,
            ForestError::ClassificationTargetOutOfRange { target_index: 4, n_targets: 2 }
        ));
    }
}
