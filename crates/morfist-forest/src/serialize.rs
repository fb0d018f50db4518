//! Model serialization and deserialization via bincode.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::ForestError;
use crate::forest::MixedForest;

/// Current binary format version.
pub const FORMAT_VERSION: u32 = 1;

/// A fitted forest together with the column names it was trained on.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SavedModel {
    forest: MixedForest,
    feature_names: Vec<String>,
    target_names: Vec<String>,
}

/// Versioned envelope for the serialized model.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope {
    /// Format version for compatibility checking.
    format_version: u32,
    /// Number of trees in the forest.
    n_trees: usize,
    /// The serialized model.
    model: SavedModel,
}

impl SavedModel {
    /// Bundle a forest with its feature and target column names.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::ColumnNameMismatch`] when the number of names
    /// does not match the forest's feature or target count.
    pub fn new(
        forest: MixedForest,
        feature_names: Vec<String>,
        target_names: Vec<String>,
    ) -> Result<Self, ForestError> {
        if feature_names.len() != forest.n_features() {
            return Err(ForestError::ColumnNameMismatch {
                kind: "feature",
                expected: forest.n_features(),
                got: feature_names.len(),
            });
        }
        if target_names.len() != forest.n_targets() {
            return Err(ForestError::ColumnNameMismatch {
                kind: "target",
                expected: forest.n_targets(),
                got: target_names.len(),
            });
        }
        Ok(Self {
            forest,
            feature_names,
            target_names,
        })
    }

    /// Borrow the fitted forest.
    #[must_use]
    pub fn forest(&self) -> &MixedForest {
        &self.forest
    }

    /// Consume the model and return the fitted forest.
    #[must_use]
    pub fn into_forest(self) -> MixedForest {
        self.forest
    }

    /// Return the feature column names, in training order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the target column names, in training order.
    #[must_use]
    pub fn target_names(&self) -> &[String] {
        &self.target_names
    }

    /// Save the model to a binary file.
    ///
    /// Uses bincode encoding wrapped in a versioned envelope.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::SerializeModel`] | bincode encoding failed |
    /// | [`ForestError::WriteModel`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ForestError> {
        let path = path.as_ref();

        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_trees: self.forest.n_trees(),
            model: self.clone(),
        };

        let bytes = bincode::serialize(&envelope).map_err(|e| ForestError::SerializeModel { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| ForestError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = bytes.len(),
            n_trees = self.forest.n_trees(),
            "model saved"
        );

        Ok(())
    }

    /// Load a model from a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::ReadModel`] | file read failed |
    /// | [`ForestError::DeserializeModel`] | bincode decoding failed |
    /// | [`ForestError::IncompatibleModelVersion`] | format version mismatch |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ForestError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| ForestError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        // The version is the envelope's first field; check it before decoding
        // the rest so an old layout reports a version error.
        let format_version: u32 = bincode::deserialize(&bytes).map_err(|e| ForestError::DeserializeModel {
            path: path.to_path_buf(),
            source: e,
        })?;
        if format_version != FORMAT_VERSION {
            return Err(ForestError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: format_version,
                path: path.to_path_buf(),
            });
        }

        let envelope: ModelEnvelope = bincode::deserialize(&bytes).map_err(|e| ForestError::DeserializeModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        debug!(
            n_trees = envelope.n_trees,
            n_features = envelope.model.forest.n_features(),
            n_targets = envelope.model.forest.n_targets(),
            "model loaded"
        );

        Ok(envelope.model)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::{FORMAT_VERSION, SavedModel};
    use crate::config::MixedForestConfig;
    use crate::error::ForestError;
    use crate::forest::MixedForest;

    fn train_simple_model() -> MixedForest {
        let features: Vec<Vec<f64>> = (0..12).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let targets: Vec<Vec<f64>> = (0..12)
            .map(|i| vec![if i < 6 { 0.0 } else { 1.0 }, i as f64 * 1.5])
            .collect();
        MixedForestConfig::new(5)
            .unwrap()
            .with_classification_targets([0])
            .with_min_samples_leaf(2)
            .with_seed(42)
            .fit(&features, &targets)
            .unwrap()
    }

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn round_trip_identical_predictions() {
        let dir = TempDir::new().unwrap();
        let model_path = dir.path().join("test_model.bin");

        let model = SavedModel::new(train_simple_model(), names(&["a", "b"]), names(&["class", "value"])).unwrap();
        model.save(&model_path).unwrap();
        let loaded = SavedModel::load(&model_path).unwrap();

        assert_eq!(loaded.feature_names(), model.feature_names());
        assert_eq!(loaded.target_names(), model.target_names());

        let samples = vec![vec![1.5, 0.0], vec![11.0, 2.0], vec![5.0, 1.0]];
        assert_eq!(
            model.forest().predict(&samples).unwrap(),
            loaded.forest().predict(&samples).unwrap()
        );
        assert_eq!(
            model.forest().predict_proba(&samples).unwrap(),
            loaded.forest().predict_proba(&samples).unwrap()
        );
        assert_eq!(loaded.forest().class_labels(0), Some(&[0, 1][..]));
    }

    #[test]
    fn name_count_mismatch() {
        let err = SavedModel::new(train_simple_model(), names(&["a"]), names(&["c", "v"])).unwrap_err();
        assert!(matches!(
            err,
            ForestError::ColumnNameMismatch { kind: "feature", expected: 2, got: 1 }
        ));
        let err = SavedModel::new(train_simple_model(), names(&["a", "b"]), names(&["c"])).unwrap_err();
        assert!(matches!(err, ForestError::ColumnNameMismatch { kind: "target", .. }));
    }

    #[test]
    fn wrong_version_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.bin");
        std::fs::write(&path, bincode::serialize(&(FORMAT_VERSION + 1)).unwrap()).unwrap();
        let err = SavedModel::load(&path).unwrap_err();
        assert!(matches!(
            err,
            ForestError::IncompatibleModelVersion { found: 2, expected: 1, .. }
        ));
    }

    #[test]
    fn load_nonexistent_file_error() {
        let dir = TempDir::new().unwrap();
        let err = SavedModel::load(dir.path().join("missing.bin")).unwrap_err();
        assert!(matches!(err, ForestError::ReadModel { .. }));
    }

    #[test]
    fn load_corrupt_file_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.bin");
        std::fs::write(&path, [1u8, 0, 0, 0, 0xff]).unwrap();
        let err = SavedModel::load(&path).unwrap_err();
        assert!(matches!(err, ForestError::DeserializeModel { .. }));
    }
}
