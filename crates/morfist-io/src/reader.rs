//! CSV dataset reader with column selection and full input validation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{MixedDataset, SampleId};

/// Reads feature and target columns from a headered CSV file.
///
/// Expected CSV format:
/// - Header row required; the first column is the sample ID
/// - `sample_id,col1,col2,...,colN`
/// - One row per sample, all rows must have the same number of columns
///
/// Target columns are selected by name. Features are the listed columns in
/// the given order, or every non-target column when no list is given. Only
/// selected columns are parsed; other columns may hold anything.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | A requested column is not in the header |
/// | [`IoError::OverlappingColumn`] | A column is both feature and target |
/// | [`IoError::NoFeatureColumns`] | No feature column remains |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Selected cell is NaN, Inf, or unparseable |
/// | [`IoError::DuplicateSampleId`] | Same sample ID appears twice |
pub struct DatasetReader {
    path: PathBuf,
    target_columns: Vec<String>,
    feature_columns: Option<Vec<String>>,
}

impl DatasetReader {
    /// Create a new reader for the given CSV file path.
    ///
    /// By default no targets are read and every column after the ID is a feature.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            target_columns: Vec::new(),
            feature_columns: None,
        }
    }

    /// Select the target columns by header name, in output order.
    #[must_use]
    pub fn with_target_columns(mut self, names: &[String]) -> Self {
        self.target_columns = names.to_vec();
        self
    }

    /// Select the feature columns by header name, in output order.
    #[must_use]
    pub fn with_feature_columns(mut self, names: &[String]) -> Self {
        self.feature_columns = Some(names.to_vec());
        self
    }

    /// Read and validate the CSV file, returning a [`MixedDataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<MixedDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets InconsistentRowLength fire instead of a CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");

        let (target_idx, feature_idx) = self.select_columns(&header)?;
        let target_names: Vec<String> = target_idx.iter().map(|&c| header[c].to_string()).collect();
        let feature_names: Vec<String> = feature_idx.iter().map(|&c| header[c].to_string()).collect();

        let mut sample_ids = Vec::new();
        let mut features = Vec::new();
        let mut targets = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            let sample_id = record.get(0).unwrap_or("").to_string();

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    sample_id,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            if let Some(&first_row) = seen.get(&sample_id) {
                return Err(IoError::DuplicateSampleId {
                    path: self.path.clone(),
                    sample_id,
                    first_row,
                    second_row: row_index,
                });
            }
            seen.insert(sample_id.clone(), row_index);

            let parse_row = |columns: &[usize]| -> Result<Vec<f64>, IoError> {
                columns
                    .iter()
                    .map(|&c| self.parse_cell(&record[c], row_index, &header[c]))
                    .collect()
            };
            features.push(parse_row(&feature_idx)?);
            targets.push(parse_row(&target_idx)?);
            sample_ids.push(SampleId::new(sample_id));
        }

        if sample_ids.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_samples = sample_ids.len(),
            n_features = feature_names.len(),
            n_targets = target_names.len(),
            "dataset loaded"
        );

        Ok(MixedDataset::new(sample_ids, feature_names, target_names, features, targets))
    }

    /// Resolve target and feature header positions, skipping the ID column.
    fn select_columns(&self, header: &csv::StringRecord) -> Result<(Vec<usize>, Vec<usize>), IoError> {
        let position = |name: &str| -> Result<usize, IoError> {
            header
                .iter()
                .skip(1)
                .position(|h| h == name)
                .map(|p| p + 1)
                .ok_or_else(|| IoError::MissingColumn {
                    path: self.path.clone(),
                    column: name.to_string(),
                })
        };

        let target_idx = self
            .target_columns
            .iter()
            .map(|name| position(name))
            .collect::<Result<Vec<_>, _>>()?;

        let feature_idx = match &self.feature_columns {
            Some(names) => {
                let idx = names
                    .iter()
                    .map(|name| position(name))
                    .collect::<Result<Vec<_>, _>>()?;
                if let Some(&c) = idx.iter().find(|c| target_idx.contains(c)) {
                    return Err(IoError::OverlappingColumn {
                        path: self.path.clone(),
                        column: header[c].to_string(),
                    });
                }
                idx
            }
            None => (1..header.len()).filter(|c| !target_idx.contains(c)).collect(),
        };

        if feature_idx.is_empty() {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }
        Ok((target_idx, feature_idx))
    }

    fn parse_cell(&self, raw: &str, row_index: usize, column: &str) -> Result<f64, IoError> {
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(IoError::NonFiniteValue {
                path: self.path.clone(),
                row_index,
                column: column.to_string(),
                raw: raw.to_string(),
            }),
        }
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    const VALID: &str = "sample_id,soil_ph,rainfall,crop,yield\nP01,6.5,800.0,0,3.2\nP02,7.1,650.0,1,2.8\nP03,5.9,900.0,2,4.1\n";

    #[test]
    fn read_targets_and_remaining_features() {
        let f = write_csv(VALID);
        let ds = DatasetReader::new(f.path())
            .with_target_columns(&names(&["crop", "yield"]))
            .read()
            .unwrap();
        assert_eq!(ds.n_samples(), 3);
        assert_eq!(ds.feature_names(), &["soil_ph", "rainfall"]);
        assert_eq!(ds.target_names(), &["crop", "yield"]);
        assert_eq!(ds.sample_ids()[2].as_str(), "P03");
        assert_eq!(ds.features()[1], vec![7.1, 650.0]);
        assert_eq!(ds.targets()[2], vec![2.0, 4.1]);
    }

    #[test]
    fn explicit_feature_order() {
        let f = write_csv(VALID);
        let ds = DatasetReader::new(f.path())
            .with_feature_columns(&names(&["rainfall", "soil_ph"]))
            .read()
            .unwrap();
        assert_eq!(ds.feature_names(), &["rainfall", "soil_ph"]);
        assert_eq!(ds.features()[0], vec![800.0, 6.5]);
        assert_eq!(ds.n_targets(), 0);
        assert!(ds.targets().iter().all(Vec::is_empty));
    }

    #[test]
    fn unselected_columns_not_parsed() {
        let csv = "id,x,note\nA,1.0,hello\nB,2.0,world\n";
        let f = write_csv(csv);
        let ds = DatasetReader::new(f.path())
            .with_feature_columns(&names(&["x"]))
            .read()
            .unwrap();
        assert_eq!(ds.features(), &[vec![1.0], vec![2.0]]);
    }

    #[test]
    fn missing_column_error() {
        let f = write_csv(VALID);
        let err = DatasetReader::new(f.path())
            .with_target_columns(&names(&["biomass"]))
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { column, .. } if column == "biomass"));
    }

    #[test]
    fn id_column_cannot_be_selected() {
        let f = write_csv(VALID);
        let err = DatasetReader::new(f.path())
            .with_target_columns(&names(&["sample_id"]))
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { .. }));
    }

    #[test]
    fn overlapping_column_error() {
        let f = write_csv(VALID);
        let err = DatasetReader::new(f.path())
            .with_target_columns(&names(&["yield"]))
            .with_feature_columns(&names(&["soil_ph", "yield"]))
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::OverlappingColumn { .. }));
    }

    #[test]
    fn no_feature_columns_error() {
        let csv = "sample_id,yield\nP01,1.0\n";
        let f = write_csv(csv);
        let err = DatasetReader::new(f.path())
            .with_target_columns(&names(&["yield"]))
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::NoFeatureColumns { .. }));
    }

    #[test]
    fn empty_dataset_error() {
        let f = write_csv("sample_id,a,b\n");
        let err = DatasetReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::EmptyDataset { .. }));
    }

    #[test]
    fn duplicate_sample_id_error() {
        let f = write_csv("sample_id,a\nP01,1.0\nP01,2.0\n");
        let err = DatasetReader::new(f.path()).read().unwrap_err();
        assert!(matches!(
            err,
            IoError::DuplicateSampleId { first_row: 0, second_row: 1, .. }
        ));
    }

    #[test]
    fn inconsistent_row_length_error() {
        let f = write_csv("sample_id,a,b\nP01,1.0,2.0\nP02,3.0\n");
        let err = DatasetReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::InconsistentRowLength { row_index: 1, .. }));
    }

    #[test]
    fn non_finite_value_error() {
        let f = write_csv("sample_id,a\nP01,inf\n");
        let err = DatasetReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::NonFiniteValue { column, .. } if column == "a"));
    }

    #[test]
    fn unparseable_value_error() {
        let f = write_csv("sample_id,a\nP01,abc\n");
        let err = DatasetReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::NonFiniteValue { .. }));
    }

    #[test]
    fn file_not_found_error() {
        let err = DatasetReader::new(Path::new("/nonexistent/morfist/data.csv"))
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }
}
