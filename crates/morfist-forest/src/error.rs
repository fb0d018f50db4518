use std::path::PathBuf;

/// Errors from mixed-target tree and forest operations.
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    /// Returned when n_estimators is zero.
    #[error("n_estimators must be at least 1, got {n_estimators}")]
    InvalidEstimatorCount {
        /// The invalid n_estimators value provided.
        n_estimators: usize,
    },

    /// Returned when min_samples_leaf is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The invalid min_samples_leaf value provided.
        min_samples_leaf: usize,
    },

    /// Returned when max_features resolves to 0 or exceeds n_features.
    #[error("max_features resolved to {max_features}, but must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved max_features value.
        max_features: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when a `MaxFeatures::Fraction` is not in (0.0, 1.0].
    #[error("max_features fraction must be in (0.0, 1.0], got {fraction}")]
    InvalidMaxFeaturesFraction {
        /// The invalid fraction provided.
        fraction: f64,
    },

    /// Returned when the regression histogram resolution is zero.
    #[error("histogram_bins must be at least 1, got {n_bins}")]
    InvalidHistogramBins {
        /// The invalid bin count provided.
        n_bins: usize,
    },

    /// Returned when n_folds is less than 2.
    #[error("n_folds must be at least 2, got {n_folds}")]
    InvalidFoldCount {
        /// The invalid n_folds value provided.
        n_folds: usize,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when the target matrix has zero columns.
    #[error("training dataset has zero target columns")]
    ZeroTargets,

    /// Returned when the feature and target matrices have different row counts.
    #[error("feature matrix has {features} rows but target matrix has {targets}")]
    RowCountMismatch {
        /// Rows in the feature matrix.
        features: usize,
        /// Rows in the target matrix.
        targets: usize,
    },

    /// Returned when there are not more samples than `min_samples_leaf`.
    #[error("need more than {min_samples_leaf} samples to grow a tree, got {n_samples}")]
    TooFewSamples {
        /// The number of training samples.
        n_samples: usize,
        /// The configured minimum leaf size.
        min_samples_leaf: usize,
    },

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a target row has a different number of targets than expected.
    #[error("sample {sample_index} has {got} targets, expected {expected}")]
    TargetCountMismatch {
        /// The expected number of targets.
        expected: usize,
        /// The actual number of targets in the row.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when a feature value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when a target value is NaN or infinite.
    #[error("non-finite target at sample {sample_index}, target {target_index}")]
    NonFiniteTarget {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending target column.
        target_index: usize,
    },

    /// Returned when a classification target holds something other than a small
    /// non-negative integer.
    #[error(
        "classification target {target_index} at sample {sample_index} has value {value}, \
         expected an integer in [0, {max}]"
    )]
    InvalidClassLabel {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the classification target column.
        target_index: usize,
        /// The rejected value.
        value: f64,
        /// The largest accepted label.
        max: usize,
    },

    /// Returned when a classification target index does not name a target column.
    #[error("classification target {target_index} is out of range for {n_targets} targets")]
    ClassificationTargetOutOfRange {
        /// The configured classification target index.
        target_index: usize,
        /// The number of target columns in the dataset.
        n_targets: usize,
    },

    /// Returned when cross-validation is asked for more folds than there are samples.
    #[error("{n_samples} samples cannot be split into {n_folds} folds")]
    TooFewSamplesForFolds {
        /// The number of samples in the dataset.
        n_samples: usize,
        /// The requested number of folds.
        n_folds: usize,
    },

    /// Returned when saved column names do not match the forest's dimensions.
    #[error("{kind} names has {got} entries, but the forest has {expected}")]
    ColumnNameMismatch {
        /// Which names were inconsistent (`feature` or `target`).
        kind: &'static str,
        /// The dimension the forest was trained with.
        expected: usize,
        /// The number of names supplied.
        got: usize,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}
