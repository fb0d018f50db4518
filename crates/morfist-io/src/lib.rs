//! CSV dataset reading, validation, and JSON result writing for morfist.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ExperimentName, MixedDataset, SampleId};
pub use error::IoError;
pub use reader::DatasetReader;
pub use writer::{ResultWriter, TargetPrediction, TargetScoreRecord};
