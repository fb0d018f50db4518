//! Domain types for morfist-io.

use crate::IoError;

/// A sample identifier.
///
/// Wraps the string in the first column of the input CSV.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleId(String);

impl SampleId {
    /// Create a new sample ID.
    pub(crate) fn new(id: String) -> Self {
        Self(id)
    }

    /// Return the sample ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SampleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Feature and target matrices read from one CSV file.
///
/// Produced by [`DatasetReader`](crate::DatasetReader). Rows are parallel:
/// `sample_ids[i]` corresponds to `features[i]` and `targets[i]`. When no
/// target columns were requested every target row is empty.
#[derive(Debug)]
pub struct MixedDataset {
    sample_ids: Vec<SampleId>,
    feature_names: Vec<String>,
    target_names: Vec<String>,
    features: Vec<Vec<f64>>,
    targets: Vec<Vec<f64>>,
}

impl MixedDataset {
    /// Create a new dataset from parallel rows.
    pub(crate) fn new(
        sample_ids: Vec<SampleId>,
        feature_names: Vec<String>,
        target_names: Vec<String>,
        features: Vec<Vec<f64>>,
        targets: Vec<Vec<f64>>,
    ) -> Self {
        Self {
            sample_ids,
            feature_names,
            target_names,
            features,
            targets,
        }
    }

    /// Return the sample IDs.
    #[must_use]
    pub fn sample_ids(&self) -> &[SampleId] {
        &self.sample_ids
    }

    /// Return the feature column names, in matrix order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the target column names, in matrix order.
    #[must_use]
    pub fn target_names(&self) -> &[String] {
        &self.target_names
    }

    /// Return the feature matrix (row-major).
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Return the target matrix (row-major).
    #[must_use]
    pub fn targets(&self) -> &[Vec<f64>] {
        &self.targets
    }

    /// Return the position of a target column by name.
    #[must_use]
    pub fn target_index(&self, name: &str) -> Option<usize> {
        self.target_names.iter().position(|n| n == name)
    }

    /// Return the number of samples.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Return the number of target columns.
    #[must_use]
    pub fn n_targets(&self) -> usize {
        self.target_names.len()
    }
}
