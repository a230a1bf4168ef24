use std::path::Path;

use fasttext::FastText;
use log::info;

use super::error::ClassifierError;
use crate::preprocess::{fasttext_line, Row, TextConfig};
use crate::taxonomy::Module;

/// A single decoded prediction: the module plus the model confidence.
///
/// Confidences are probability-like but not renormalized; a top-k slice is
/// not an exhaustive distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub module: Module,
    pub prob: f32,
}

/// A module classifier backed by a trained fastText model.
///
/// The classifier cleans its input with the same normalizer the trainer
/// used, so callers hand it raw text or raw CSV rows.
pub struct Classifier {
    model_path: String,
    model: FastText,
    config: TextConfig,
}

impl Classifier {
    /// Loads a trained model with the default text configuration.
    pub fn from_file(model_path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        Self::with_config(model_path, TextConfig::default())
    }

    /// Loads a trained model with an explicit text configuration.
    ///
    /// The configuration must match the one used at training time, or label
    /// decoding will reject the model's output.
    pub fn with_config(
        model_path: impl AsRef<Path>,
        config: TextConfig,
    ) -> Result<Self, ClassifierError> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(ClassifierError::ModelError(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }
        let model_path = model_path.to_string_lossy().to_string();
        let mut model = FastText::new();
        model
            .load_model(&model_path)
            .map_err(|e| ClassifierError::ModelError(e.to_string()))?;
        info!("Loaded model from '{}'", model_path);
        Ok(Self {
            model_path,
            model,
            config,
        })
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            text_fields: self.config.text_fields().to_vec(),
            class_field: self.config.class_field().to_string(),
            label_prefix: self.config.label_prefix().to_string(),
        }
    }

    /// Predicts the top-k modules for a text.
    ///
    /// The text is cleaned before prediction. Predictions come back in
    /// descending confidence order, as ranked by the model.
    pub fn predict_text(&self, text: &str, k: i32) -> Result<Vec<Prediction>, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::ValidationError(
                "Input text cannot be empty".into(),
            ));
        }
        self.predict_line(&self.config.clean(text), k)
    }

    /// Predicts the top-k modules for a CSV row.
    ///
    /// The inference line is assembled from the configured text fields, or
    /// from every column of the row when none are configured.
    pub fn predict_row(&self, row: &Row, k: i32) -> Result<Vec<Prediction>, ClassifierError> {
        let line = fasttext_line(row, &self.config)?;
        self.predict_line(&line, k)
    }

    fn predict_line(&self, line: &str, k: i32) -> Result<Vec<Prediction>, ClassifierError> {
        let predictions = self
            .model
            .predict(line, k, 0.0)
            .map_err(|e| ClassifierError::PredictionError(e.to_string()))?;

        predictions
            .into_iter()
            .map(|p| {
                // A label the codec cannot decode means the model was
                // trained with a different label convention; surface it.
                let module = self
                    .config
                    .parse_label(p.label.trim())
                    .map_err(|e| ClassifierError::PredictionError(e.to_string()))?;
                Ok(Prediction {
                    module,
                    prob: p.prob,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let result = Classifier::from_file("/does/not/exist");
        assert!(matches!(result, Err(ClassifierError::ModelError(_))));
    }
}
