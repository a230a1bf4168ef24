mod classifier;
mod error;
mod trainer;

pub use classifier::{Classifier, Prediction};
pub use error::ClassifierError;
pub use trainer::{Evaluation, Trainer, TrainingParams};

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the fastText model file
    pub model_path: String,
    /// Columns read for text when assembling lines from rows
    pub text_fields: Vec<String>,
    /// Column holding the module code
    pub class_field: String,
    /// Prefix on the model's label tokens
    pub label_prefix: String,
}
