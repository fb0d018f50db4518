use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    ForestError,
    config::{MaxFeatures, MixedForestConfig, TargetKind},
    data::TrainingData,
    impurity::{DEFAULT_HISTOGRAM_BINS, ImpurityCalculator},
    kernel::{NumericKernel, ScalarKernel},
    node::{Node, NodeIndex},
    split::{SplitChoice, SplitDecision, Splitter, partition},
};

/// Configuration for a single randomized mixed-target decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
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
pub struct DecisionTreeConfig {
    pub(crate) max_features: MaxFeatures,
    pub(crate) min_samples_leaf: usize,
    pub(crate) choose_split: SplitChoice,
    pub(crate) classification_targets: BTreeSet<usize>,
    pub(crate) seed: u64,
    pub(crate) histogram_bins: usize,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    ///
    /// All parameters use the defaults shown in the struct-level documentation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_features: MaxFeatures::Sqrt,
            min_samples_leaf: 5,
            choose_split: SplitChoice::Mean,
            classification_targets: BTreeSet::new(),
            seed: 42,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }

    /// Per-tree config carrying a forest's knobs and a derived seed.
    pub(crate) fn for_forest_tree(config: &MixedForestConfig, seed: u64) -> Self {
        Self {
            max_features: config.max_features,
            min_samples_leaf: config.min_samples_leaf,
            choose_split: config.choose_split,
            classification_targets: config.classification_targets.clone(),
            seed,
            histogram_bins: config.histogram_bins,
        }
    }

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

    /// Train a tree on the provided row-major dataset.
    ///
    /// `features[sample_idx][feature_idx]` and `targets[sample_idx][target_idx]`.
    ///
    /// # Errors
    ///
    /// Same validation as [`MixedForestConfig::fit`].
    pub fn fit(&self, features: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<DecisionTree, ForestError> {
        self.fit_with_kernel(features, targets, &ScalarKernel)
    }

    /// Train a tree using an explicit numeric kernel for impurity computation.
    ///
    /// # Errors
    ///
    /// Same as [`fit`](Self::fit).
    #[instrument(skip(self, features, targets, kernel), fields(n_samples = features.len()))]
    pub fn fit_with_kernel<K: NumericKernel>(
        &self,
        features: &[Vec<f64>],
        targets: &[Vec<f64>],
        kernel: &K,
    ) -> Result<DecisionTree, ForestError> {
        let data = TrainingData::from_rows(
            features,
            targets,
            &self.classification_targets,
            self.min_samples_leaf,
        )?;
        let sample_indices: Vec<usize> = (0..data.n_samples).collect();
        self.grow(&data, &sample_indices, kernel)
    }

    /// Grow a tree on the rows of validated data listed in `sample_indices`.
    ///
    /// Duplicated indices (bootstrap samples) count once per occurrence.
    pub(crate) fn grow<K: NumericKernel>(
        &self,
        data: &TrainingData,
        sample_indices: &[usize],
        kernel: &K,
    ) -> Result<DecisionTree, ForestError> {
        if self.histogram_bins == 0 {
            return Err(ForestError::InvalidHistogramBins {
                n_bins: self.histogram_bins,
            });
        }
        let n_features = data.n_features();
        let max_features = self.max_features.resolve(n_features)?;

        let impurity = ImpurityCalculator::new(&data.kinds, self.histogram_bins, kernel);
        let splitter = Splitter::new(
            &data.features,
            &data.targets,
            impurity,
            sample_indices,
            max_features,
            self.min_samples_leaf,
            self.choose_split,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut arena = NodeArena::default();
        let mut queue: VecDeque<(NodeIndex, Vec<usize>)> = VecDeque::new();
        queue.push_back((arena.reserve(), sample_indices.to_vec()));

        while let Some((id, rows)) = queue.pop_front() {
            let value = leaf_value(data, &rows, kernel);
            let n_samples = rows.len();

            match splitter.find_best_split(&rows, &mut rng) {
                SplitDecision::NoSplit => arena.materialize(id, Node::Leaf { value, n_samples }),
                SplitDecision::Split {
                    feature,
                    threshold,
                    gain,
                } => {
                    let left = arena.reserve();
                    let right = arena.reserve();
                    arena.materialize(
                        id,
                        Node::Split {
                            feature,
                            threshold,
                            left,
                            right,
                            value,
                            n_samples,
                            gain,
                        },
                    );
                    let (left_rows, right_rows) =
                        partition(&data.features[feature.index()], &rows, threshold);
                    queue.push_back((left, left_rows));
                    queue.push_back((right, right_rows));
                }
            }
        }

        let tree = DecisionTree {
            nodes: arena.into_nodes(),
            n_features,
            kinds: data.kinds.clone(),
            root_impurity: splitter.into_root_impurity(),
            max_features,
        };
        debug!(
            n_nodes = tree.n_nodes(),
            depth = tree.depth(),
            max_features,
            "decision tree built"
        );
        Ok(tree)
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Node storage that hands out ids before the nodes themselves exist.
///
/// Ids are reserved when a work item is queued and nodes are materialized in
/// the same order, so every id equals the node's position in the arena.
#[derive(Debug, Default)]
struct NodeArena {
    nodes: Vec<Node>,
    next_id: usize,
}

impl NodeArena {
    fn reserve(&mut self) -> NodeIndex {
        let id = NodeIndex::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn materialize(&mut self, id: NodeIndex, node: Node) {
        debug_assert_eq!(id.index(), self.nodes.len(), "nodes materialized out of id order");
        self.nodes.push(node);
    }

    fn into_nodes(self) -> Vec<Node> {
        debug_assert_eq!(self.nodes.len(), self.next_id, "reserved ids left unmaterialized");
        self.nodes
    }
}

/// Per-target leaf value: majority label (ties to the smallest) or mean.
fn leaf_value<K: NumericKernel>(data: &TrainingData, rows: &[usize], kernel: &K) -> Vec<f64> {
    data.kinds
        .iter()
        .zip(&data.targets)
        .map(|(kind, column)| match kind {
            TargetKind::Classification => {
                let labels: Vec<usize> = rows.iter().map(|&si| column[si] as usize).collect();
                let counts = kernel.bincount(&labels, 0);
                let mut best = 0;
                for (label, &count) in counts.iter().enumerate() {
                    if count > counts[best] {
                        best = label;
                    }
                }
                best as f64
            }
            TargetKind::Regression => {
                rows.iter().map(|&si| column[si]).sum::<f64>() / rows.len() as f64
            }
        })
        .collect()
}

/// A fitted mixed-target decision tree.
///
/// Stored as an arena-based `Vec<Node>` with index references; node 0 is the
/// root and children always have larger ids than their parent.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) kinds: Vec<TargetKind>,
    pub(crate) root_impurity: Vec<f64>,
    pub(crate) max_features: usize,
}

impl DecisionTree {
    /// Predict the per-target value vector for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<Vec<f64>, ForestError> {
        let leaf = self.apply(sample)?;
        Ok(self.nodes[leaf.index()].value().to_vec())
    }

    /// Predict every row of a row-major batch.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] for the first row with
    /// the wrong length.
    pub fn predict_batch(&self, samples: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ForestError> {
        samples.iter().map(|s| self.predict(s)).collect()
    }

    /// Return the id of the leaf a sample lands in.
    ///
    /// Traverses from the root: at each `Split`, goes left when
    /// `sample[feature] <= threshold`, right otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn apply(&self, sample: &[f64]) -> Result<NodeIndex, ForestError> {
        if sample.len() != self.n_features {
            return Err(ForestError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut idx = NodeIndex::ROOT;
        loop {
            match &self.nodes[idx.index()] {
                Node::Leaf { .. } => return Ok(idx),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[feature.index()] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Return the node arena; index 0 is the root.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the number of feature columns the tree was trained on.
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

    /// Return the per-target impurity of the tree's whole training subset.
    #[must_use]
    pub fn root_impurity(&self) -> &[f64] {
        &self.root_impurity
    }

    /// Return the number of features sampled per split.
    #[must_use]
    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Compute gain-based feature importances.
    ///
    /// Each split contributes `gain * n_samples` to its feature; negative
    /// gains contribute nothing. Totals are normalized to sum to 1.0, or are
    /// all zeros when the tree is a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                gain,
                n_samples,
                ..
            } = node
            {
                totals[feature.index()] += gain.max(0.0) * *n_samples as f64;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the total number of nodes in the tree (both splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree.
    ///
    /// A single-node tree (just a root leaf) has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }

        // BFS: (node_index, current_depth)
        let mut max_depth = 0usize;
        let mut queue = VecDeque::new();
        queue.push_back((NodeIndex::ROOT, 0usize));

        while let Some((idx, d)) = queue.pop_front() {
            match &self.nodes[idx.index()] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    queue.push_back((*left, d + 1));
                    queue.push_back((*right, d + 1));
                }
            }
        }

        max_depth
    }
}

impl fmt::Display for DecisionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nodes.is_empty() {
            return Ok(());
        }

        // Pre-order walk; right is pushed first so left prints first.
        let mut stack = vec![(NodeIndex::ROOT, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            let indent = "    ".repeat(depth);
            match &self.nodes[idx.index()] {
                Node::Leaf { value, n_samples } => writeln!(f, "{indent}{value:?} ({n_samples})")?,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    writeln!(f, "{indent}[x{feature} <= {threshold}]:")?;
                    stack.push((*right, depth + 1));
                    stack.push((*left, depth + 1));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::impurity::IMPURITY_DELTA;
    use crate::kernel::Histogram;
    use crate::node::FeatureIndex;

    fn separable() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        // Feature 0 separates both targets; feature 1 is constant.
        let features = vec![
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![3.0, 0.0],
            vec![10.0, 0.0],
            vec![11.0, 0.0],
            vec![12.0, 0.0],
        ];
        let targets = vec![
            vec![0.0, 1.0],
            vec![0.0, 1.5],
            vec![0.0, 2.0],
            vec![1.0, 20.0],
            vec![1.0, 21.0],
            vec![1.0, 22.0],
        ];
        (features, targets)
    }

    fn config() -> DecisionTreeConfig {
        DecisionTreeConfig::new()
            .with_max_features(MaxFeatures::All)
            .with_min_samples_leaf(1)
            .with_classification_targets([0])
    }

    fn seeded_data(seed: u64, n: usize) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        use rand::Rng;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let features: Vec<Vec<f64>> = (0..n)
            .map(|_| (0..3).map(|_| rng.gen_range(0.0..10.0)).collect())
            .collect();
        let targets = features
            .iter()
            .map(|row| vec![if row[0] > 5.0 { 1.0 } else { 0.0 }, row[1] * 2.0 + row[2]])
            .collect();
        (features, targets)
    }

    #[test]
    fn empty_dataset_error() {
        let err = config().fit(&[], &[]).unwrap_err();
        assert!(matches!(err, ForestError::EmptyDataset));
    }

    #[test]
    fn zero_histogram_bins_error() {
        let (features, targets) = separable();
        let err = config().with_histogram_bins(0).fit(&features, &targets).unwrap_err();
        assert!(matches!(err, ForestError::InvalidHistogramBins { n_bins: 0 }));
    }

    #[test]
    fn constant_features_single_leaf() {
        let features = vec![vec![1.0]; 4];
        let targets = vec![vec![0.0, 1.0], vec![1.0, 2.0], vec![1.0, 3.0], vec![0.0, 6.0]];
        let tree = config().fit(&features, &targets).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.depth(), 0);
        // Tie between labels 0 and 1 resolves to the smallest; regression is the mean.
        assert_eq!(tree.predict(&[1.0]).unwrap(), vec![0.0, 3.0]);
    }

    #[test]
    fn linearly_separable_mixed_targets() {
        let (features, targets) = separable();
        let tree = config().fit(&features, &targets).unwrap();
        let low = tree.predict(&[2.0, 0.0]).unwrap();
        let high = tree.predict(&[11.0, 0.0]).unwrap();
        assert_eq!(low[0], 0.0);
        assert_eq!(high[0], 1.0);
        assert!(low[1] < 3.0);
        assert!(high[1] > 19.0);
    }

    #[test]
    fn children_partition_parent_rows() {
        let (features, targets) = seeded_data(11, 60);
        let tree = config().with_min_samples_leaf(3).fit(&features, &targets).unwrap();
        for (i, node) in tree.nodes().iter().enumerate() {
            if let Node::Split {
                left,
                right,
                n_samples,
                ..
            } = node
            {
                let l = &tree.nodes()[left.index()];
                let r = &tree.nodes()[right.index()];
                assert_eq!(l.n_samples() + r.n_samples(), *n_samples);
                assert!(l.n_samples() >= 3 && r.n_samples() >= 3);
                assert!(left.index() > i);
                assert_eq!(right.index(), left.index() + 1);
            }
        }
    }

    #[test]
    fn leaves_respect_min_samples_leaf() {
        let (features, targets) = seeded_data(5, 80);
        for min_leaf in [1, 4, 9] {
            let tree = config().with_min_samples_leaf(min_leaf).fit(&features, &targets).unwrap();
            for node in tree.nodes().iter().filter(|n| n.is_leaf()) {
                assert!(node.n_samples() >= min_leaf);
            }
        }
    }

    #[test]
    fn nodes_are_breadth_first() {
        let (features, targets) = seeded_data(3, 60);
        let tree = config().with_min_samples_leaf(2).fit(&features, &targets).unwrap();
        // Depth never decreases along the arena.
        let mut depths = vec![0usize; tree.n_nodes()];
        for (i, node) in tree.nodes().iter().enumerate() {
            if let Node::Split { left, right, .. } = node {
                depths[left.index()] = depths[i] + 1;
                depths[right.index()] = depths[i] + 1;
            }
        }
        assert!(depths.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn root_impurity_of_training_rows() {
        let (features, targets) = separable();
        let tree = config().fit(&features, &targets).unwrap();
        assert_eq!(tree.root_impurity().len(), 2);
        assert!((tree.root_impurity()[0] - (1.0 + IMPURITY_DELTA)).abs() < 1e-12);
        assert!(tree.root_impurity()[1] > IMPURITY_DELTA);
    }

    #[test]
    fn max_features_resolved_once() {
        let (features, targets) = seeded_data(1, 30);
        let tree = config()
            .with_max_features(MaxFeatures::Sqrt)
            .fit(&features, &targets)
            .unwrap();
        assert_eq!(tree.max_features(), 2);
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (features, targets) = seeded_data(9, 50);
        let a = config().with_seed(123).fit(&features, &targets).unwrap();
        let b = config().with_seed(123).fit(&features, &targets).unwrap();
        assert_eq!(a.nodes(), b.nodes());
    }

    #[test]
    fn prediction_feature_mismatch() {
        let (features, targets) = separable();
        let tree = config().fit(&features, &targets).unwrap();
        let err = tree.predict(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            ForestError::PredictionFeatureMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn apply_returns_leaf() {
        let (features, targets) = seeded_data(4, 40);
        let tree = config().fit(&features, &targets).unwrap();
        for sample in &features {
            let leaf = tree.apply(sample).unwrap();
            assert!(tree.nodes()[leaf.index()].is_leaf());
        }
    }

    #[test]
    fn feature_importances_favor_informative_feature() {
        let (features, targets) = separable();
        let tree = config().fit(&features, &targets).unwrap();
        let importances = tree.feature_importances();
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-10);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn display_renders_splits_and_leaves() {
        let (features, targets) = separable();
        let tree = config().fit(&features, &targets).unwrap();
        let rendered = tree.to_string();
        assert!(rendered.starts_with("[x0 <= "));
        assert!(rendered.lines().any(|l| l.starts_with("    [")));
    }

    /// A right-leaning chain of `depth` splits, each with a leaf on the left.
    fn chain_tree(depth: usize) -> DecisionTree {
        let mut nodes = Vec::with_capacity(2 * depth + 1);
        for k in 0..depth {
            nodes.push(Node::Split {
                feature: FeatureIndex::new(0),
                threshold: k as f64 + 0.5,
                left: NodeIndex::new(2 * k + 1),
                right: NodeIndex::new(2 * k + 2),
                value: vec![0.0],
                n_samples: depth - k + 1,
                gain: 0.1,
            });
            nodes.push(Node::Leaf {
                value: vec![k as f64],
                n_samples: 1,
            });
        }
        nodes.push(Node::Leaf {
            value: vec![depth as f64],
            n_samples: 1,
        });
        DecisionTree {
            nodes,
            n_features: 1,
            kinds: vec![TargetKind::Regression],
            root_impurity: vec![1.0],
            max_features: 1,
        }
    }

    #[test]
    fn display_order_is_preorder() {
        let rendered = chain_tree(2).to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "[x0 <= 0.5]:",
                "    [0.0] (1)",
                "    [x0 <= 1.5]:",
                "        [1.0] (1)",
                "        [2.0] (1)",
            ]
        );
    }

    #[test]
    fn display_deep_tree_on_small_stack() {
        let depth = 4_000;
        let rendered = std::thread::Builder::new()
            .stack_size(128 * 1024)
            .spawn(move || chain_tree(depth).to_string())
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(rendered.lines().count(), 2 * depth + 1);
        let last = rendered.lines().last().unwrap();
        assert_eq!(last.trim_start(), format!("[{:?}] (1)", depth as f64));
        assert_eq!(last.len() - last.trim_start().len(), 4 * depth);
        assert_eq!(chain_tree(depth).depth(), depth);
    }

    #[derive(Default)]
    struct CountingKernel {
        histograms: Cell<usize>,
    }

    impl NumericKernel for CountingKernel {
        fn bincount(&self, values: &[usize], min_length: usize) -> Vec<usize> {
            ScalarKernel.bincount(values, min_length)
        }

        fn histogram(&self, values: &[f64], n_bins: usize) -> Histogram {
            self.histograms.set(self.histograms.get() + 1);
            ScalarKernel.histogram(values, n_bins)
        }
    }

    #[test]
    fn custom_kernel_is_used() {
        let (features, targets) = separable();
        let kernel = CountingKernel::default();
        let with_kernel = config().fit_with_kernel(&features, &targets, &kernel).unwrap();
        let scalar = config().fit(&features, &targets).unwrap();
        assert!(kernel.histograms.get() > 0);
        assert_eq!(with_kernel.nodes(), scalar.nodes());
    }
}
