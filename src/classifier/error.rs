use std::fmt;
use std::io;

use crate::preprocess::PreprocessError;
use crate::taxonomy::TaxonomyError;

/// Represents the different types of errors that can occur in the module classifier.
#[derive(Debug)]
pub enum ClassifierError {
    /// Error occurred while loading or saving the fastText model
    ModelError(String),
    /// Error occurred while preparing training data or training
    TrainingError(String),
    /// Error occurred while making predictions
    PredictionError(String),
    /// Error occurred due to invalid input parameters
    ValidationError(String),
    /// Error occurred while reading or writing CSV data
    CsvError(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
            Self::TrainingError(msg) => write!(f, "Training error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::CsvError(msg) => write!(f, "CSV error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl From<PreprocessError> for ClassifierError {
    fn from(err: PreprocessError) -> Self {
        ClassifierError::ValidationError(err.to_string())
    }
}

impl From<TaxonomyError> for ClassifierError {
    fn from(err: TaxonomyError) -> Self {
        ClassifierError::ValidationError(err.to_string())
    }
}

impl From<csv::Error> for ClassifierError {
    fn from(err: csv::Error) -> Self {
        ClassifierError::CsvError(err.to_string())
    }
}

impl From<io::Error> for ClassifierError {
    fn from(err: io::Error) -> Self {
        ClassifierError::TrainingError(err.to_string())
    }
}
