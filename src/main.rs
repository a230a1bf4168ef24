use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;

use taxoclass::preprocess::DEFAULT_CLASS_FIELD;
use taxoclass::{
    BuiltinModel, Classifier, ModelManager, Row, TextConfig, Trainer, TrainingParams,
};

#[derive(Parser)]
#[command(author, version, about = "Train and serve the taxonomy module classifier", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download the published classifier model into the local cache
    Fetch {
        /// Force a fresh download of the model file
        #[arg(short, long)]
        fresh: bool,
    },
    /// Train a classifier model from a labeled CSV file
    Train {
        /// The CSV file to read training data from
        #[arg(short, long)]
        input: PathBuf,
        /// The file to write the trained model to
        #[arg(short, long)]
        model: PathBuf,
        /// CSV columns to read text from (defaults to the standard article
        /// metadata columns)
        #[arg(long, value_delimiter = ',')]
        text_fields: Vec<String>,
        /// CSV column holding the module code
        #[arg(long, default_value = DEFAULT_CLASS_FIELD)]
        class_field: String,
        /// Save the full model instead of quantizing it
        #[arg(long)]
        no_quantize: bool,
        /// The learning rate
        #[arg(long, default_value = "1.0")]
        lr: f64,
        /// The size of word vectors
        #[arg(long, default_value = "100")]
        dim: i32,
        /// The number of training epochs
        #[arg(long, default_value = "20")]
        epoch: i32,
        /// Minimal number of word occurrences
        #[arg(long, default_value = "1")]
        min_count: i32,
        /// Max length of word n-grams
        #[arg(long, default_value = "2")]
        word_ngrams: i32,
        /// Min length of char n-grams
        #[arg(long, default_value = "2")]
        minn: i32,
        /// Max length of char n-grams
        #[arg(long, default_value = "5")]
        maxn: i32,
        /// The number of training threads
        #[arg(long)]
        thread: Option<i32>,
    },
    /// Predict modules for each row of a CSV file
    Predict {
        /// The CSV file to read rows from
        #[arg(short, long)]
        input: PathBuf,
        /// Trained model file; omit to use the cached published model
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// The CSV file to write predictions to
        #[arg(short, long)]
        output: PathBuf,
        /// Number of predictions to output per row
        #[arg(short, default_value = "3")]
        k: i32,
        /// CSV columns to read text from (defaults to every column)
        #[arg(long, value_delimiter = ',')]
        text_fields: Vec<String>,
    },
    /// Evaluate a trained model against a labeled CSV file
    Evaluate {
        /// The labeled CSV file to evaluate against
        #[arg(short, long)]
        input: PathBuf,
        /// Trained model file
        #[arg(short, long)]
        model: PathBuf,
        /// Count a hit when the gold module appears in the top k predictions
        #[arg(short, default_value = "1")]
        k: i32,
        /// CSV column holding the module code
        #[arg(long, default_value = DEFAULT_CLASS_FIELD)]
        class_field: String,
    },
    /// Merge CSV files on an id column
    Merge {
        /// The column to use for identifying corresponding rows
        #[arg(short = 'f', long, default_value = "item_title")]
        id_field: String,
        /// The input files
        #[arg(short, long, num_args = 1.., required = true)]
        input: Vec<PathBuf>,
        /// The output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Fetch { fresh } => fetch(fresh).await,
        Command::Train {
            input,
            model,
            text_fields,
            class_field,
            no_quantize,
            lr,
            dim,
            epoch,
            min_count,
            word_ngrams,
            minn,
            maxn,
            thread,
        } => {
            let params = TrainingParams {
                lr,
                dim,
                min_count,
                word_ngrams,
                minn,
                maxn,
                epoch,
                thread,
            };
            let mut config = TextConfig::default().with_class_field(class_field);
            if !text_fields.is_empty() {
                config = config.with_text_fields(text_fields);
            }
            let mut trainer = Trainer::new().with_params(params).with_config(config);
            if no_quantize {
                trainer = trainer.without_quantization();
            }
            trainer.train(&input, &model)?;
            println!("Wrote model to {}", model.display());
            Ok(())
        }
        Command::Predict {
            input,
            model,
            output,
            k,
            text_fields,
        } => {
            let model = resolve_model(model).await?;
            let config = TextConfig::default().with_text_fields(text_fields);
            predict(&input, &model, &output, k, config)
        }
        Command::Evaluate {
            input,
            model,
            k,
            class_field,
        } => {
            let config = TextConfig::default().with_class_field(class_field);
            let trainer = Trainer::new().with_config(config);
            let evaluation = trainer.evaluate(&input, &model, k)?;
            println!("Examples:      {}", evaluation.examples);
            println!("P@{}:          {:.4}", k, evaluation.precision());
            Ok(())
        }
        Command::Merge {
            id_field,
            input,
            output,
        } => merge(&input, &output, &id_field),
    }
}

async fn fetch(fresh: bool) -> Result<()> {
    let manager = ModelManager::new_default()?;
    let model = BuiltinModel::ModuleClassifier;

    if fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove_download(model)?;
    }
    manager.ensure_model_downloaded(model).await?;
    println!(
        "Model available at {}",
        manager.get_model_path(model).display()
    );
    Ok(())
}

async fn resolve_model(model: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(model) = model {
        return Ok(model);
    }
    let manager = ModelManager::new_default()?;
    let builtin = BuiltinModel::ModuleClassifier;
    manager.ensure_model_downloaded(builtin).await?;
    Ok(manager.get_model_path(builtin))
}

#[derive(Serialize)]
struct PredictionRecord {
    row: usize,
    rank: usize,
    module: String,
    prob: f32,
}

fn predict(
    input: &Path,
    model: &Path,
    output: &Path,
    k: i32,
    config: TextConfig,
) -> Result<()> {
    let classifier = Classifier::with_config(model, config)?;

    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let headers = reader.headers()?.clone();
    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("writing {}", output.display()))?;

    let mut rows = 0;
    for (index, record) in reader.records().enumerate() {
        let row = Row::from_record(&headers, &record?);
        // One malformed row is one skipped row, not a dead batch.
        let predictions = match classifier.predict_row(&row, k) {
            Ok(predictions) => predictions,
            Err(e) => {
                warn!("Skipping row {}: {}", index, e);
                continue;
            }
        };
        for (rank, prediction) in predictions.iter().enumerate() {
            writer.serialize(PredictionRecord {
                row: index,
                rank: rank + 1,
                module: prediction.module.to_string(),
                prob: prediction.prob,
            })?;
        }
        rows += 1;
    }
    writer.flush()?;
    info!("Predicted {} rows", rows);
    Ok(())
}

struct CsvFile {
    fieldnames: Vec<String>,
    rows: Vec<Row>,
}

fn read_csv_file(path: &Path) -> Result<CsvFile> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("reading {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let fieldnames: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let rows = reader
        .records()
        .map(|record| Ok(Row::from_record(&headers, &record?)))
        .collect::<Result<Vec<_>>>()?;
    info!("Read {} rows from {}", rows.len(), path.display());
    Ok(CsvFile { fieldnames, rows })
}

fn merge_csv_files(left: CsvFile, right: CsvFile, id_field: &str) -> CsvFile {
    let mut fieldnames = left.fieldnames;
    for field in &right.fieldnames {
        if !fieldnames.contains(field) {
            fieldnames.push(field.clone());
        }
    }

    let mut right_by_id: HashMap<String, Row> = right
        .rows
        .into_iter()
        .map(|row| (row.get(id_field).unwrap_or("").to_string(), row))
        .collect();

    let mut rows = Vec::new();
    for mut row in left.rows {
        let id = row.get(id_field).unwrap_or("").to_string();
        if let Some(other) = right_by_id.remove(&id) {
            for (field, value) in other.iter() {
                row.insert(field, value);
            }
        }
        rows.push(row);
    }
    // Right-only rows are appended, ordered by id to keep output stable.
    let mut leftovers: Vec<Row> = right_by_id.into_values().collect();
    leftovers.sort_by(|a, b| a.get(id_field).cmp(&b.get(id_field)));
    rows.extend(leftovers);

    CsvFile { fieldnames, rows }
}

fn merge(inputs: &[PathBuf], output: &Path, id_field: &str) -> Result<()> {
    let mut files = inputs.iter().map(|path| read_csv_file(path));
    let first = files
        .next()
        .context("at least one input file is required")??;
    let merged = files.try_fold(first, |merged, file| {
        Ok::<_, anyhow::Error>(merge_csv_files(merged, file?, id_field))
    })?;

    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("writing {}", output.display()))?;
    writer.write_record(&merged.fieldnames)?;
    for row in &merged.rows {
        let record: Vec<&str> = merged
            .fieldnames
            .iter()
            .map(|field| row.get(field).unwrap_or(""))
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    println!("Wrote {} rows to {}", merged.rows.len(), output.display());
    Ok(())
}
