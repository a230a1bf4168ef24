use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use fasttext::{Args, FastText, ModelName};
use log::info;
use serde::Serialize;
use tempfile::NamedTempFile;

use super::classifier::Classifier;
use super::error::ClassifierError;
use crate::preprocess::{fasttext_line, Row, TextConfig};

/// Supervised training hyperparameters passed through to fastText.
///
/// The defaults are the ones the production module classifier was tuned
/// with; character n-grams (`minn`/`maxn`) matter because author names and
/// publication titles share subword structure across rows.
#[derive(Debug, Clone)]
pub struct TrainingParams {
    pub lr: f64,
    pub dim: i32,
    pub min_count: i32,
    pub word_ngrams: i32,
    pub minn: i32,
    pub maxn: i32,
    pub epoch: i32,
    /// Number of training threads; `None` lets fastText decide.
    pub thread: Option<i32>,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            lr: 1.0,
            dim: 100,
            min_count: 1,
            word_ngrams: 2,
            minn: 2,
            maxn: 5,
            epoch: 20,
            thread: None,
        }
    }
}

/// Evaluation summary for a labeled CSV file.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// Number of labeled rows evaluated
    pub examples: usize,
    /// Rows whose gold module appeared in the top-k predictions
    pub hits: usize,
}

impl Evaluation {
    pub fn precision(&self) -> f64 {
        if self.examples == 0 {
            0.0
        } else {
            self.hits as f64 / self.examples as f64
        }
    }
}

/// Trains module classification models from labeled CSV files.
pub struct Trainer {
    params: TrainingParams,
    config: TextConfig,
    quantize: bool,
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Trainer {
    pub fn new() -> Self {
        Self {
            params: TrainingParams::default(),
            config: TextConfig::default(),
            quantize: true,
        }
    }

    pub fn with_params(mut self, params: TrainingParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_config(mut self, config: TextConfig) -> Self {
        self.config = config;
        self
    }

    /// Disables quantization; the saved model is larger but training is
    /// faster.
    pub fn without_quantization(mut self) -> Self {
        self.quantize = false;
        self
    }

    /// Trains a model from a CSV file and writes it to `target_file`.
    ///
    /// Rows without a class-field value are skipped; a row with a malformed
    /// value aborts the run, since a mislabeled example would corrupt the
    /// model silently.
    pub fn train(&self, input_file: &Path, target_file: &Path) -> Result<(), ClassifierError> {
        let temp_file = NamedTempFile::new()?;
        let written = self.write_training_file(input_file, temp_file.path())?;
        info!(
            "Wrote {} training lines to '{}'",
            written,
            temp_file.path().display()
        );

        let training_path = temp_file.path().to_string_lossy().to_string();
        let mut model = FastText::new();
        info!("Training model. Arguments: {:?}", self.params);
        model
            .train(&self.training_args(&training_path))
            .map_err(|e| ClassifierError::TrainingError(e.to_string()))?;

        if self.quantize {
            info!("Compressing model...");
            let mut args = Args::new();
            args.set_input(&training_path);
            args.set_retrain(true);
            model
                .quantize(&args)
                .map_err(|e| ClassifierError::TrainingError(e.to_string()))?;
        }

        let target = target_file.to_string_lossy();
        info!("Writing trained model to file '{}'...", target);
        model
            .save_model(&target)
            .map_err(|e| ClassifierError::ModelError(e.to_string()))?;
        Ok(())
    }

    /// Replays a labeled CSV with the label column withheld and counts how
    /// often the gold module appears in the top-k predictions.
    ///
    /// Gold and predicted labels are compared as decoded modules, so the
    /// delimiter convention of the input never has to match the model's.
    pub fn evaluate(
        &self,
        input_file: &Path,
        model_file: &Path,
        k: i32,
    ) -> Result<Evaluation, ClassifierError> {
        let classifier = Classifier::with_config(model_file, self.config.clone())?;
        let mut reader = csv::Reader::from_path(input_file)?;
        let headers = reader.headers()?.clone();

        let mut examples = 0;
        let mut hits = 0;
        for record in reader.records() {
            let row = Row::from_record(&headers, &record?);
            let gold = match row.get(self.config.class_field()) {
                Some(value) if !value.is_empty() => self.config.parse_module(value)?,
                _ => continue,
            };

            let unlabeled: Row = row
                .iter()
                .filter(|(field, _)| *field != self.config.class_field())
                .collect();
            let predictions = classifier.predict_row(&unlabeled, k)?;

            examples += 1;
            if predictions.iter().any(|p| p.module == gold) {
                hits += 1;
            }
        }
        info!("Evaluated {} labeled examples", examples);
        Ok(Evaluation { examples, hits })
    }

    fn training_args(&self, input: &str) -> Args {
        let mut args = Args::new();
        args.set_input(input);
        args.set_model(ModelName::SUP);
        args.set_lr(self.params.lr);
        args.set_dim(self.params.dim);
        args.set_min_count(self.params.min_count);
        args.set_word_ngrams(self.params.word_ngrams);
        args.set_minn(self.params.minn);
        args.set_maxn(self.params.maxn);
        args.set_epoch(self.params.epoch);
        if let Some(thread) = self.params.thread {
            args.set_thread(thread);
        }
        args
    }

    fn write_training_file(
        &self,
        input_file: &Path,
        target: &Path,
    ) -> Result<usize, ClassifierError> {
        info!("Reading input file '{}'...", input_file.display());
        let mut reader = csv::Reader::from_path(input_file)?;
        let headers = reader.headers()?.clone();
        let mut writer = BufWriter::new(File::create(target)?);

        let mut written = 0;
        for record in reader.records() {
            let row = Row::from_record(&headers, &record?);
            match row.get(self.config.class_field()) {
                Some(value) if !value.is_empty() => {
                    writeln!(writer, "{}", fasttext_line(&row, &self.config)?)?;
                    written += 1;
                }
                _ => {}
            }
        }
        writer.flush()?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(path: &Path, rows: &[Row]) {
        let mut fields: Vec<String> = Vec::new();
        for row in rows {
            for (field, _) in row.iter() {
                if !fields.iter().any(|f| f == field) {
                    fields.push(field.to_string());
                }
            }
        }
        let mut writer = csv::Writer::from_path(path).unwrap();
        writer.write_record(&fields).unwrap();
        for row in rows {
            let record: Vec<&str> = fields
                .iter()
                .map(|field| row.get(field).unwrap_or(""))
                .collect();
            writer.write_record(&record).unwrap();
        }
        writer.flush().unwrap();
    }

    fn article_row(suffix: &str, code: &str) -> Row {
        Row::from_iter(
            [
                ("item_title", format!("test title{}", suffix)),
                ("authors", format!("test authors{}", suffix)),
                ("publication_name", format!("test publication{}", suffix)),
                ("abstract_description", format!("test abstract{}", suffix)),
                ("excerpts_ts", format!("test excerpt{}", suffix)),
                ("yt_description", format!("test yt description{}", suffix)),
                ("module_id_for_all", code.to_string()),
            ]
            .map(|(field, value)| (field.to_string(), value)),
        )
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| line.to_string())
            .collect()
    }

    #[test]
    fn test_write_training_file_skips_unlabeled_rows() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.csv");
        let target = dir.path().join("train.txt");
        write_csv(
            &input,
            &[Row::from_iter([
                ("item_title", "text"),
                ("module_id_for_all", ""),
            ])],
        );

        let trainer = Trainer::new();
        let written = trainer.write_training_file(&input, &target).unwrap();
        assert_eq!(written, 0);
        assert!(read_lines(&target).is_empty());
    }

    #[test]
    fn test_write_training_file_lines() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.csv");
        let target = dir.path().join("train.txt");
        write_csv(
            &input,
            &[article_row("", "s1.m1"), article_row(" two", "s2.m2")],
        );

        let trainer = Trainer::new();
        let written = trainer.write_training_file(&input, &target).unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            read_lines(&target),
            vec![
                "__label__S1_M1 test title test authors test publication test abstract \
                 test excerpt test description",
                "__label__S2_M2 test title two test authors two test publication two \
                 test abstract two test excerpt two test description two",
            ]
        );
    }

    #[test]
    fn test_write_training_file_rejects_bad_code() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.csv");
        let target = dir.path().join("train.txt");
        write_csv(&input, &[article_row("", "s1-m1")]);

        let trainer = Trainer::new();
        let result = trainer.write_training_file(&input, &target);
        assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_default_params() {
        let params = TrainingParams::default();
        assert_eq!(params.dim, 100);
        assert_eq!(params.epoch, 20);
        assert_eq!(params.word_ngrams, 2);
    }

    #[test]
    fn test_empty_evaluation_precision() {
        let evaluation = Evaluation {
            examples: 0,
            hits: 0,
        };
        assert_eq!(evaluation.precision(), 0.0);
    }
}
