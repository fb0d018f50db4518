//! Randomized decision trees and forests over mixed targets.
//!
//! Each model predicts several target columns at once from one feature
//! matrix: classification targets (integer labels scored by entropy) and
//! regression targets (real values scored by a histogram entropy estimate)
//! share every split. Provides seeded breadth-first tree growth, bootstrap
//! forests with parallel prediction, k-fold cross-validation, feature
//! importances, and model serialization.

mod config;
mod data;
mod error;
mod eval;
mod forest;
mod importance;
mod impurity;
mod kernel;
mod node;
mod predict;
mod serialize;
mod split;
mod tree;

pub use config::{MaxFeatures, MixedForestConfig, TargetKind};
pub use data::MAX_CLASS_LABEL;
pub use error::ForestError;
pub use eval::{
    CrossValidation, CrossValidationResult, Estimator, Metric, Predictor, TargetScore, accuracy,
    rmse,
};
pub use forest::MixedForest;
pub use importance::RankedFeature;
pub use impurity::{
    DEFAULT_HISTOGRAM_BINS, IMPURITY_DELTA, ImpurityCalculator, class_entropy, histogram_entropy,
};
pub use kernel::{Histogram, NumericKernel, ScalarKernel};
pub use node::{FeatureIndex, Node, NodeIndex};
pub use predict::{ClassDistribution, TargetProba};
pub use serialize::{FORMAT_VERSION, SavedModel};
pub use split::{SplitChoice, SplitDecision, Splitter};
pub use tree::{DecisionTree, DecisionTreeConfig};
