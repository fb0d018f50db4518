//! JSON result writer for evaluation, prediction and importance outputs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{ExperimentName, SampleId};

/// Cross-validated score of one target, as primitives.
///
/// Shadow of the forest crate's score type so the writer does not depend on it.
#[derive(Debug, Clone, Serialize)]
pub struct TargetScoreRecord<'a> {
    /// Target column name.
    pub name: &'a str,
    /// `"classification"` or `"regression"`.
    pub kind: &'a str,
    /// Name of the metric the scores are measured in.
    pub metric: &'a str,
    /// Metric over all pooled out-of-fold predictions.
    pub pooled: f64,
    /// Mean of the per-fold scores.
    pub mean: f64,
    /// Standard deviation of the per-fold scores.
    pub std: f64,
    /// Per-fold scores.
    pub fold_scores: &'a [f64],
}

/// Prediction of one target for one sample, as primitives.
#[derive(Debug, Clone)]
pub struct TargetPrediction {
    /// Predicted label or mean value.
    pub value: f64,
    /// `(label, probability)` pairs for classification targets.
    pub probabilities: Option<Vec<(usize, f64)>>,
}

/// Writes experiment results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_evaluate.json`,
/// `{experiment}_predict.json` and `{experiment}_importances.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write cross-validation scores to `{experiment}_evaluate.json`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeJson`] | the artifact cannot be encoded |
    /// | [`IoError::WriteFile`] | the file cannot be written |
    #[instrument(skip_all)]
    pub fn write_evaluation(
        &self,
        n_folds: usize,
        n_samples: usize,
        scores: &[TargetScoreRecord<'_>],
    ) -> Result<PathBuf, IoError> {
        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            n_folds,
            n_samples,
            targets: scores,
        };
        let path = self.write_json("evaluate", &artifact)?;
        info!(path = %path.display(), "evaluation result written");
        Ok(path)
    }

    /// Write per-sample predictions to `{experiment}_predict.json`.
    ///
    /// `predictions[i][t]` is the prediction of target `target_names[t]` for
    /// `sample_ids[i]`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeJson`] | the artifact cannot be encoded |
    /// | [`IoError::WriteFile`] | the file cannot be written |
    #[instrument(skip_all, fields(n_samples = sample_ids.len()))]
    pub fn write_predictions(
        &self,
        target_names: &[String],
        sample_ids: &[SampleId],
        predictions: &[Vec<TargetPrediction>],
    ) -> Result<PathBuf, IoError> {
        let entries: Vec<PredictionEntry<'_>> = sample_ids
            .iter()
            .zip(predictions)
            .map(|(id, row)| PredictionEntry {
                sample_id: id.as_str(),
                targets: target_names
                    .iter()
                    .zip(row)
                    .map(|(name, pred)| TargetEntry {
                        name: name.as_str(),
                        value: pred.value,
                        probabilities: pred.probabilities.as_ref().map(|probs| {
                            probs
                                .iter()
                                .map(|&(label, probability)| LabelProbability { label, probability })
                                .collect()
                        }),
                    })
                    .collect(),
            })
            .collect();

        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            n_samples: entries.len(),
            targets: target_names,
            predictions: entries,
        };
        let path = self.write_json("predict", &artifact)?;
        info!(path = %path.display(), "predictions written");
        Ok(path)
    }

    /// Write ranked feature importances to `{experiment}_importances.json`.
    ///
    /// The three slices are parallel and already sorted by rank.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeJson`] | the artifact cannot be encoded |
    /// | [`IoError::WriteFile`] | the file cannot be written |
    #[instrument(skip_all)]
    pub fn write_importances(
        &self,
        feature_names: &[String],
        importances: &[f64],
        ranks: &[usize],
    ) -> Result<PathBuf, IoError> {
        let features: Vec<FeatureEntry<'_>> = feature_names
            .iter()
            .zip(importances)
            .zip(ranks)
            .map(|((name, &importance), &rank)| FeatureEntry {
                name: name.as_str(),
                importance,
                rank,
            })
            .collect();

        let artifact = ImportanceArtifact {
            experiment: self.experiment.as_str(),
            feature_importances: features,
        };
        let path = self.write_json("importances", &artifact)?;
        info!(path = %path.display(), "feature importances written");
        Ok(path)
    }

    /// Return the path where the model binary should be saved.
    ///
    /// Does not write anything; just computes `{output_dir}/{experiment}_model.bin`.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_model.bin", self.experiment.as_str()))
    }

    fn write_json(&self, suffix: &str, artifact: &impl Serialize) -> Result<PathBuf, IoError> {
        let path = self
            .output_dir
            .join(format!("{}_{suffix}.json", self.experiment.as_str()));
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::SerializeJson {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    n_folds: usize,
    n_samples: usize,
    targets: &'a [TargetScoreRecord<'a>],
}

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    n_samples: usize,
    targets: &'a [String],
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct PredictionEntry<'a> {
    sample_id: &'a str,
    targets: Vec<TargetEntry<'a>>,
}

#[derive(Serialize)]
struct TargetEntry<'a> {
    name: &'a str,
    value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    probabilities: Option<Vec<LabelProbability>>,
}

#[derive(Serialize)]
struct LabelProbability {
    label: usize,
    probability: f64,
}

#[derive(Serialize)]
struct ImportanceArtifact<'a> {
    experiment: &'a str,
    feature_importances: Vec<FeatureEntry<'a>>,
}

#[derive(Serialize)]
struct FeatureEntry<'a> {
    name: &'a str,
    importance: f64,
    rank: usize,
}
